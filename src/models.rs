use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============ Lead Models ============

/// Qualitative bucket assigned to a lead.
///
/// Supplied independently of `lead_score`; the two are never derived from
/// each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeadType {
    Excellent,
    Good,
    Medium,
    Poor,
    ResearchNeeded,
}

impl LeadType {
    /// All lead types in display order.
    pub const ALL: [LeadType; 5] = [
        LeadType::Excellent,
        LeadType::Good,
        LeadType::Medium,
        LeadType::Poor,
        LeadType::ResearchNeeded,
    ];

    /// Wire id of the lead type (e.g. `"research-needed"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadType::Excellent => "excellent",
            LeadType::Good => "good",
            LeadType::Medium => "medium",
            LeadType::Poor => "poor",
            LeadType::ResearchNeeded => "research-needed",
        }
    }

    /// Human-readable label used in exports.
    pub fn label(&self) -> &'static str {
        match self {
            LeadType::Excellent => "Excellent Lead",
            LeadType::Good => "Good Lead",
            LeadType::Medium => "Medium Lead",
            LeadType::Poor => "Poor Lead",
            LeadType::ResearchNeeded => "Research Needed",
        }
    }

    /// Parses a wire id. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

/// Where a lead was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeadSource {
    GoogleMaps,
    GoogleSearch,
    Both,
}

impl LeadSource {
    /// Wire id of the source.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::GoogleMaps => "google-maps",
            LeadSource::GoogleSearch => "google-search",
            LeadSource::Both => "both",
        }
    }

    /// Human-readable label used in exports.
    pub fn label(&self) -> &'static str {
        match self {
            LeadSource::GoogleMaps => "Google Maps",
            LeadSource::GoogleSearch => "Google Search",
            LeadSource::Both => "Maps + Search",
        }
    }

    /// Parses a wire id. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "google-maps" => Some(LeadSource::GoogleMaps),
            "google-search" => Some(LeadSource::GoogleSearch),
            "both" => Some(LeadSource::Both),
            _ => None,
        }
    }
}

/// Organic search result snippet for a lead's website.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    /// Page title.
    pub title: String,
    /// Meta description.
    pub description: String,
    /// Full URL.
    pub url: String,
    /// URL without scheme, as shown in the search result.
    pub display_url: String,
}

/// Named sub-factors of the local SEO score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSeoFactors {
    pub google_my_business: i64,
    pub local_keywords: i64,
    pub reviews: i64,
    pub citations: i64,
    pub website_optimization: i64,
}

/// Local SEO assessment attached to a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSeoScore {
    /// Overall score.
    pub overall_score: i64,
    /// Sub-factor breakdown.
    pub factors: LocalSeoFactors,
    /// Suggested improvements.
    pub recommendations: Vec<String>,
}

/// A discovered business record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// Unique within a result set.
    pub id: String,
    /// Business display name.
    pub business_name: String,
    /// Business category display name (e.g. "Bakery").
    pub category: String,
    /// Free-form postal address.
    pub address: String,
    /// Website URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Contact phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Externally computed ordinal score. No range is enforced.
    pub lead_score: i64,
    /// Qualitative bucket.
    pub lead_type: LeadType,
    /// Provenance of the record.
    pub source: LeadSource,
    /// Website performance score (0-100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighthouse_score: Option<u8>,
    /// Whether the business has a Google Maps listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_maps_listing: Option<bool>,
    /// Position in organic Google results (1-based).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_search_ranking: Option<u32>,
    /// Organic search snippet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_snippet: Option<SearchSnippet>,
    /// Local SEO assessment.
    #[serde(
        default,
        rename = "localSEOScore",
        skip_serializing_if = "Option::is_none"
    )]
    pub local_seo_score: Option<LocalSeoScore>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Whether the lead was pushed to the CRM. Only ever flips false -> true.
    #[serde(default)]
    pub is_in_zoho: bool,
}

/// A lead projected for the all-leads table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadTableItem {
    #[serde(flatten)]
    pub lead: Lead,
    /// When the lead entered the system.
    pub date_added: DateTime<Utc>,
    /// City, from a dedicated upstream field or derived from the address.
    pub city: String,
    /// State code, from a dedicated upstream field or derived from the address.
    pub state: String,
}

// ============ Search Models ============

fn default_number_of_businesses() -> u32 {
    50
}

/// The inputs to a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Business category id (e.g. "bakery").
    pub business_type: String,
    /// Ordered location ids. At least one is required to execute.
    #[serde(default)]
    pub locations: Vec<String>,
    /// Requested number of businesses.
    #[serde(default = "default_number_of_businesses")]
    pub number_of_businesses: u32,
    /// Also include organic Google Search results.
    #[serde(default)]
    pub include_google_search: bool,
    /// Free-text query overriding the business type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_search_query: Option<String>,
    #[serde(default)]
    pub include_competitor_analysis: bool,
    #[serde(default)]
    pub include_trend_analysis: bool,
}

/// Relative level used by trend and competitor analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

/// Search-demand direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Stable,
    Decreasing,
}

/// Search demand for the searched category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTrendData {
    pub search_volume: u32,
    pub trend: Trend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonality: Option<String>,
    pub competition_level: Level,
}

/// A competitor ranked in the searched market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCompetitor {
    pub name: String,
    pub ranking: u32,
    pub has_website: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_traffic: Option<String>,
}

/// Competitive landscape for the searched market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorAnalysis {
    pub total_competitors: u32,
    pub top_competitors: Vec<TopCompetitor>,
    pub market_saturation: Level,
}

/// Optional analytics derived alongside a search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedAnalytics {
    pub trend_data: Option<SearchTrendData>,
    pub competitor_analysis: Option<CompetitorAnalysis>,
}

/// One executed search and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// `search_<millis>_<suffix>`.
    pub id: String,
    /// Owned copy of the inputs.
    pub search_params: SearchParams,
    /// Leads in source order.
    pub leads: Vec<Lead>,
    /// Creation time.
    pub date: DateTime<Utc>,
    /// `leads.len()` at creation time. Not recomputed.
    pub total_leads: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_data: Option<SearchTrendData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_analysis: Option<CompetitorAnalysis>,
}

impl SearchResult {
    /// Short id suffix shown in listings (`search_<millis>_...` -> `<millis>`).
    pub fn short_id(&self) -> &str {
        self.id.split('_').nth(1).unwrap_or(&self.id)
    }
}

// ============ Lookup Models ============

/// A business category offered as a search target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessCategory {
    pub id: String,
    pub name: String,
}

/// A searchable location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    /// Display name, e.g. "Atlanta, GA".
    pub name: String,
}

// ============ Detail Models ============

/// Opening hours by weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub monday: String,
    pub tuesday: String,
    pub wednesday: String,
    pub thursday: String,
    pub friday: String,
    pub saturday: String,
    pub sunday: String,
}

/// Social media profile links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialMedia {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub author: String,
    pub rating: u8,
    pub text: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub google_reviews: u32,
    pub average_rating: f64,
    pub total_reviews: u32,
    pub recent_reviews: Vec<Review>,
}

/// A nearby competitor shown on the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyCompetitor {
    pub name: String,
    pub distance: String,
    pub rating: f64,
    pub has_website: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketPosition {
    Leader,
    Challenger,
    Follower,
    Niche,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInsights {
    pub market_position: MarketPosition,
    pub strengths: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
}

/// A lead with the enrichment shown on the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedLead {
    #[serde(flatten)]
    pub lead: Lead,
    pub description: String,
    pub services: Vec<String>,
    pub business_hours: BusinessHours,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_media: Option<SocialMedia>,
    pub year_established: i32,
    pub employee_count: String,
    pub specialties: Vec<String>,
    pub certifications: Vec<String>,
    pub payment_methods: Vec<String>,
    pub service_area: Vec<String>,
    pub reviews: ReviewSummary,
    pub competitors: Vec<NearbyCompetitor>,
    pub market_insights: MarketInsights,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_type_wire_ids_round_trip_through_parse() {
        for t in LeadType::ALL {
            assert_eq!(LeadType::parse(t.as_str()), Some(t));
        }
        assert_eq!(LeadType::parse("all"), None);
    }

    #[test]
    fn lead_deserializes_from_camel_case_json() {
        let lead: Lead = serde_json::from_value(serde_json::json!({
            "id": "bakery-1",
            "businessName": "Sweet Dreams Bakery",
            "category": "Bakery",
            "address": "123 Main St, Atlanta, GA 30309",
            "leadScore": 95,
            "leadType": "research-needed",
            "source": "both",
            "localSEOScore": {
                "overallScore": 75,
                "factors": {
                    "googleMyBusiness": 85,
                    "localKeywords": 30,
                    "reviews": 90,
                    "citations": 65,
                    "websiteOptimization": 0
                },
                "recommendations": []
            }
        }))
        .unwrap();

        assert_eq!(lead.lead_type, LeadType::ResearchNeeded);
        assert_eq!(lead.source, LeadSource::Both);
        assert!(!lead.is_in_zoho);
        assert_eq!(lead.local_seo_score.unwrap().overall_score, 75);
    }

    #[test]
    fn search_params_default_count_is_fifty() {
        let params: SearchParams =
            serde_json::from_value(serde_json::json!({ "businessType": "bakery" })).unwrap();
        assert_eq!(params.number_of_businesses, 50);
        assert!(params.locations.is_empty());
    }

    #[test]
    fn short_id_is_the_timestamp_segment() {
        let result = SearchResult {
            id: "search_1700000000000_ab12cd345".to_string(),
            search_params: serde_json::from_value(serde_json::json!({ "businessType": "x" }))
                .unwrap(),
            leads: vec![],
            date: Utc::now(),
            total_leads: 0,
            trend_data: None,
            competitor_analysis: None,
        };
        assert_eq!(result.short_id(), "1700000000000");
    }
}
