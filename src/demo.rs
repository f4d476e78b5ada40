//! Disconnected mode: a built-in catalogue and a deterministic lead
//! generator used when no search API is configured.

use crate::models::{
    BusinessCategory, CompetitorAnalysis, DerivedAnalytics, Lead, LeadSource, LeadType, Level,
    LocalSeoFactors, LocalSeoScore, Location, SearchParams, SearchResult, SearchSnippet,
    SearchTrendData, TopCompetitor, Trend,
};
use crate::models::LeadSource::{Both, GoogleMaps, GoogleSearch};
use crate::models::LeadType::{Excellent, Good, Medium, Poor, ResearchNeeded};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// A city offered in demo mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoCity {
    pub id: &'static str,
    pub name: &'static str,
    pub state: &'static str,
}

pub const BUSINESS_TYPES: &[(&str, &str)] = &[
    ("hair-salon", "Hair Salon"),
    ("bakery", "Bakery"),
    ("dentist", "Dentist"),
    ("restaurant", "Restaurant"),
    ("gym", "Gym"),
    ("plumber", "Plumber"),
    ("lawyer", "Lawyer"),
    ("accountant", "Accountant"),
    ("auto-mechanic", "Auto Mechanic"),
    ("florist", "Florist"),
    ("photographer", "Photographer"),
    ("contractor", "Contractor"),
];

pub const CITIES: &[DemoCity] = &[
    DemoCity { id: "atlanta", name: "Atlanta", state: "GA" },
    DemoCity { id: "austin", name: "Austin", state: "TX" },
    DemoCity { id: "boston", name: "Boston", state: "MA" },
    DemoCity { id: "chicago", name: "Chicago", state: "IL" },
    DemoCity { id: "denver", name: "Denver", state: "CO" },
    DemoCity { id: "miami", name: "Miami", state: "FL" },
    DemoCity { id: "nashville", name: "Nashville", state: "TN" },
    DemoCity { id: "new-york", name: "New York", state: "NY" },
    DemoCity { id: "phoenix", name: "Phoenix", state: "AZ" },
    DemoCity { id: "portland", name: "Portland", state: "OR" },
    DemoCity { id: "san-diego", name: "San Diego", state: "CA" },
    DemoCity { id: "seattle", name: "Seattle", state: "WA" },
];

const DEFAULT_CITY: DemoCity = DemoCity {
    id: "atlanta",
    name: "Atlanta",
    state: "GA",
};

pub fn categories() -> Vec<BusinessCategory> {
    BUSINESS_TYPES
        .iter()
        .map(|(id, name)| BusinessCategory {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect()
}

pub fn locations() -> Vec<Location> {
    CITIES
        .iter()
        .map(|c| Location {
            id: c.id.to_string(),
            name: format!("{}, {}", c.name, c.state),
        })
        .collect()
}

pub fn find_city(id: &str) -> Option<DemoCity> {
    CITIES.iter().copied().find(|c| c.id == id)
}

/// Display name of a business type id; unknown ids are returned unchanged.
pub fn business_type_name(id: &str) -> &str {
    BUSINESS_TYPES
        .iter()
        .find(|(type_id, _)| *type_id == id)
        .map(|(_, name)| *name)
        .unwrap_or(id)
}

struct BaseLead {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    street: &'static str,
    zip: &'static str,
    website: Option<&'static str>,
    phone: Option<&'static str>,
    email: Option<&'static str>,
    lighthouse: Option<u8>,
    score: i64,
    lead_type: LeadType,
    source: LeadSource,
    maps: bool,
    ranking: Option<u32>,
}

#[allow(clippy::too_many_arguments)]
const fn base(
    id: &'static str,
    name: &'static str,
    category: &'static str,
    street: &'static str,
    zip: &'static str,
    website: Option<&'static str>,
    phone: Option<&'static str>,
    email: Option<&'static str>,
    lighthouse: Option<u8>,
    score: i64,
    lead_type: LeadType,
    source: LeadSource,
    maps: bool,
    ranking: Option<u32>,
) -> BaseLead {
    BaseLead {
        id,
        name,
        category,
        street,
        zip,
        website,
        phone,
        email,
        lighthouse,
        score,
        lead_type,
        source,
        maps,
        ranking,
    }
}

const HAIR_SALON: &[BaseLead] = &[
    base("salon-1", "Elite Hair Studio", "Hair Salon", "321 Elm St", "30306",
        Some("https://elitehairstudio.com"), Some("(555) 321-0987"), None,
        Some(88), 45, Poor, GoogleMaps, true, None),
    base("salon-2", "Glamour Hair Lounge", "Hair Salon", "789 Beauty Ave", "30307",
        None, Some("(555) 456-7890"), Some("info@glamourhair.com"),
        None, 92, Excellent, GoogleMaps, true, None),
    base("salon-3", "Trendy Cuts & Color", "Hair Salon", "456 Style St", "30308",
        Some("https://trendycuts.com"), Some("(555) 234-5678"), None,
        Some(42), 78, Good, Both, true, Some(2)),
    base("salon-4", "Classic Hair Design", "Hair Salon", "123 Main St", "30309",
        Some("https://classichairdesign.com"), None, None,
        Some(65), 68, Medium, GoogleSearch, false, Some(4)),
    base("salon-5", "Salon Bella Vista", "Hair Salon", "987 Fashion Blvd", "30310",
        None, Some("(555) 567-8901"), Some("hello@salonbellavista.com"),
        None, 85, Excellent, GoogleMaps, true, None),
    base("salon-6", "Hair Haven Spa", "Hair Salon", "654 Wellness Way", "30311",
        Some("https://hairhavenspa.com"), Some("(555) 678-9012"), None,
        Some(35), 82, Good, Both, true, Some(1)),
    base("salon-7", "Modern Hair Studio", "Hair Salon", "321 Contemporary Ct", "30312",
        None, None, None,
        None, 28, ResearchNeeded, GoogleMaps, true, None),
    base("salon-8", "Luxury Hair Boutique", "Hair Salon", "555 Upscale Ave", "30313",
        Some("https://luxuryhairboutique.com"), Some("(555) 789-0123"), Some("contact@luxuryhair.com"),
        Some(72), 75, Medium, GoogleSearch, false, Some(3)),
];

const BAKERY: &[BaseLead] = &[
    base("bakery-1", "Sweet Dreams Bakery", "Bakery", "123 Main St", "30309",
        None, Some("(555) 123-4567"), Some("info@sweetdreamsbakery.com"),
        None, 95, Excellent, GoogleMaps, true, None),
    base("bakery-2", "Artisan Bread Co", "Bakery", "456 Flour St", "30308",
        Some("https://artisanbread.com"), Some("(555) 234-5678"), None,
        Some(45), 82, Good, Both, true, Some(2)),
];

const DENTIST: &[BaseLead] = &[
    base("dentist-1", "Downtown Dental Care", "Dentist", "456 Oak Ave", "30308",
        Some("https://downtowndental.com"), Some("(555) 987-6543"), None,
        Some(35), 82, Good, Both, true, Some(3)),
    base("dentist-2", "Smile Bright Dental", "Dentist", "789 Tooth Lane", "30307",
        None, Some("(555) 345-6789"), Some("info@smilebright.com"),
        None, 88, Excellent, GoogleMaps, true, None),
];

const RESTAURANT: &[BaseLead] = &[
    base("restaurant-1", "Bella Vista Restaurant", "Restaurant", "789 Pine St", "30307",
        Some("https://bellavista.com"), Some("(555) 456-7890"), Some("contact@bellavista.com"),
        Some(65), 71, Medium, Both, true, Some(1)),
    base("restaurant-2", "The Local Bistro", "Restaurant", "321 Food Court", "30306",
        None, Some("(555) 567-8901"), None,
        None, 90, Excellent, GoogleMaps, true, None),
];

const GYM: &[BaseLead] = &[
    base("gym-1", "City Fitness Center", "Gym", "654 Maple Ave", "30305",
        None, None, None,
        None, 25, ResearchNeeded, GoogleMaps, true, None),
    base("gym-2", "PowerHouse Gym", "Gym", "987 Strength St", "30304",
        Some("https://powerhousegym.com"), Some("(555) 678-9012"), None,
        Some(55), 72, Medium, Both, true, Some(2)),
];

const PLUMBER: &[BaseLead] = &[
    base("plumber-1", "Perfect Plumbing Solutions", "Plumber", "987 Water St", "30304",
        None, Some("(555) 789-0123"), None,
        None, 88, Excellent, GoogleMaps, true, None),
    base("plumber-2", "Quick Fix Plumbing", "Plumber", "123 Pipe Ave", "30303",
        Some("https://quickfixplumbing.com"), Some("(555) 890-1234"), Some("service@quickfix.com"),
        Some(38), 85, Good, Both, true, Some(1)),
];

fn base_leads(business_type: &str) -> &'static [BaseLead] {
    match business_type {
        "bakery" => BAKERY,
        "dentist" => DENTIST,
        "restaurant" => RESTAURANT,
        "gym" => GYM,
        "plumber" => PLUMBER,
        _ => HAIR_SALON,
    }
}

/// Local SEO assessment computed from a lead's own fields.
pub fn local_seo_score(lead: &Lead) -> LocalSeoScore {
    let has_website = lead.website.is_some();
    let overall_score = match (has_website, lead.lighthouse_score) {
        (true, Some(lh)) => (i64::from(lh) + 15).min(85),
        (true, None) => 65,
        (false, _) => (lead.lead_score - 20).max(25),
    };

    let recommendations: &[&str] = if has_website {
        &[
            "Improve website loading speed",
            "Add more local service pages",
            "Optimize for mobile users",
        ]
    } else {
        &[
            "Create a professional website",
            "Set up Google My Business properly",
            "Start collecting customer reviews",
            "Build local citations",
        ]
    };

    LocalSeoScore {
        overall_score,
        factors: LocalSeoFactors {
            google_my_business: if lead.google_maps_listing.unwrap_or(false) { 85 } else { 20 },
            local_keywords: if has_website { 70 } else { 30 },
            reviews: (lead.lead_score + 10).min(90),
            citations: if lead.phone.is_some() { 65 } else { 25 },
            website_optimization: if has_website {
                lead.lighthouse_score.map(i64::from).unwrap_or(50)
            } else {
                0
            },
        },
        recommendations: recommendations.iter().map(|s| s.to_string()).collect(),
    }
}

fn search_snippet(lead: &Lead, type_name: &str, city: &str) -> Option<SearchSnippet> {
    let website = lead.website.as_ref()?;
    let call_to_action = if lead.phone.is_some() {
        "Call today for appointment."
    } else {
        "Visit us for consultation."
    };
    Some(SearchSnippet {
        title: format!("{} - Professional {} Services", lead.business_name, type_name),
        description: format!(
            "Quality {} services in {}. {}",
            type_name.to_lowercase(),
            city,
            call_to_action
        ),
        url: website.clone(),
        display_url: website.trim_start_matches("https://").to_string(),
    })
}

/// Synthesizes leads for `params`.
///
/// Leads are placed in the first selected city. Search-only leads are
/// dropped unless Google Search is included, then the list is cut to the
/// requested count.
pub fn generate_leads(params: &SearchParams) -> Vec<Lead> {
    let city = params
        .locations
        .first()
        .and_then(|id| find_city(id))
        .unwrap_or(DEFAULT_CITY);
    let type_name = business_type_name(&params.business_type);

    base_leads(&params.business_type)
        .iter()
        .filter(|b| params.include_google_search || b.source != LeadSource::GoogleSearch)
        .take(params.number_of_businesses as usize)
        .map(|b| {
            let mut lead = Lead {
                id: b.id.to_string(),
                business_name: b.name.to_string(),
                category: b.category.to_string(),
                address: format!("{}, {}, {} {}", b.street, city.name, city.state, b.zip),
                website: b.website.map(str::to_string),
                phone: b.phone.map(str::to_string),
                email: b.email.map(str::to_string),
                lead_score: b.score,
                lead_type: b.lead_type,
                source: b.source,
                lighthouse_score: b.lighthouse,
                google_maps_listing: b.maps.then_some(true),
                google_search_ranking: b.ranking,
                search_snippet: None,
                local_seo_score: None,
                notes: None,
                is_in_zoho: false,
            };
            lead.search_snippet = search_snippet(&lead, type_name, city.name);
            lead.local_seo_score = Some(local_seo_score(&lead));
            lead
        })
        .collect()
}

/// Byte stream drawn from a SHA-256 of the params.
struct ParamsRng {
    digest: [u8; 32],
    cursor: usize,
}

impl ParamsRng {
    fn new(params: &SearchParams) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(params).unwrap_or_default());
        Self {
            digest: hasher.finalize().into(),
            cursor: 0,
        }
    }

    fn next_u16(&mut self) -> u16 {
        let hi = self.digest[self.cursor % 32];
        let lo = self.digest[(self.cursor + 1) % 32];
        self.cursor += 2;
        u16::from_be_bytes([hi, lo])
    }

    fn below(&mut self, bound: u32) -> u32 {
        u32::from(self.next_u16()) % bound
    }

    fn level(&mut self) -> Level {
        [Level::Low, Level::Medium, Level::High][self.below(3) as usize]
    }
}

/// Trend and competitor analytics for the requested flags. Identical params
/// always yield identical analytics.
pub fn derive_analytics(params: &SearchParams) -> DerivedAnalytics {
    let mut rng = ParamsRng::new(params);

    let trend_data = params.include_trend_analysis.then(|| SearchTrendData {
        search_volume: 5000 + rng.below(20000),
        trend: [Trend::Increasing, Trend::Stable, Trend::Decreasing][rng.below(3) as usize],
        seasonality: Some("Higher demand in Q4 (holiday season)".to_string()),
        competition_level: rng.level(),
    });

    let competitor_analysis = params.include_competitor_analysis.then(|| CompetitorAnalysis {
        total_competitors: 20 + rng.below(50),
        top_competitors: vec![
            TopCompetitor {
                name: "Top Competitor 1".to_string(),
                ranking: 1,
                has_website: true,
                estimated_traffic: Some("2.5K/month".to_string()),
            },
            TopCompetitor {
                name: "Top Competitor 2".to_string(),
                ranking: 2,
                has_website: false,
                estimated_traffic: None,
            },
            TopCompetitor {
                name: "Top Competitor 3".to_string(),
                ranking: 3,
                has_website: true,
                estimated_traffic: Some("1.8K/month".to_string()),
            },
        ],
        market_saturation: rng.level(),
    });

    DerivedAnalytics {
        trend_data,
        competitor_analysis,
    }
}

fn fixed_date(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// The two demonstration entries, most recent first. They carry only their
/// recorded lead totals, not the leads themselves.
pub fn seed_history() -> Vec<SearchResult> {
    vec![
        SearchResult {
            id: "search_1".to_string(),
            search_params: SearchParams {
                business_type: "bakery".to_string(),
                locations: vec!["atlanta".to_string(), "austin".to_string()],
                number_of_businesses: 50,
                include_google_search: true,
                custom_search_query: Some("artisan bakery".to_string()),
                include_competitor_analysis: true,
                include_trend_analysis: true,
            },
            leads: Vec::new(),
            date: fixed_date("2024-01-15T10:30:00Z"),
            total_leads: 25,
            trend_data: Some(SearchTrendData {
                search_volume: 12500,
                trend: Trend::Increasing,
                seasonality: Some("Higher demand in Q4 (holiday season)".to_string()),
                competition_level: Level::Medium,
            }),
            competitor_analysis: Some(CompetitorAnalysis {
                total_competitors: 47,
                top_competitors: vec![
                    TopCompetitor {
                        name: "Sweet Treats Bakery".to_string(),
                        ranking: 1,
                        has_website: true,
                        estimated_traffic: Some("2.5K/month".to_string()),
                    },
                    TopCompetitor {
                        name: "Corner Bakehouse".to_string(),
                        ranking: 2,
                        has_website: false,
                        estimated_traffic: None,
                    },
                    TopCompetitor {
                        name: "Artisan Bread Co".to_string(),
                        ranking: 3,
                        has_website: true,
                        estimated_traffic: Some("1.8K/month".to_string()),
                    },
                ],
                market_saturation: Level::Medium,
            }),
        },
        SearchResult {
            id: "search_2".to_string(),
            search_params: SearchParams {
                business_type: "dentist".to_string(),
                locations: vec!["chicago".to_string(), "denver".to_string()],
                number_of_businesses: 25,
                include_google_search: false,
                custom_search_query: None,
                include_competitor_analysis: false,
                include_trend_analysis: false,
            },
            leads: Vec::new(),
            date: fixed_date("2024-01-10T14:20:00Z"),
            total_leads: 18,
            trend_data: None,
            competitor_analysis: None,
        },
    ]
}
