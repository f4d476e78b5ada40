//! Detail-view enrichment.
//!
//! Every value is derived from the lead id, so the same lead always gets
//! the same enrichment no matter how often it is viewed.

use crate::list_engine::city_and_state;
use crate::models::{
    BusinessHours, ExtendedLead, Lead, MarketInsights, MarketPosition, NearbyCompetitor, Review,
    ReviewSummary, SocialMedia,
};
use moka::future::Cache;

/// Reference year for "years in business".
const BASE_YEAR: i32 = 2024;

/// Pseudo-random values fixed by a lead id.
///
/// The seed is the sum of the id's UTF-16 code units pushed once through
/// the LCG `(seed * 9301 + 49297) mod 233280`; every draw scales that same
/// fraction into the requested range.
#[derive(Debug, Clone, Copy)]
pub struct LeadSeed {
    fraction: f64,
}

impl LeadSeed {
    pub fn new(lead_id: &str) -> Self {
        let seed: u64 = lead_id.encode_utf16().map(u64::from).sum();
        let step = (seed * 9301 + 49297) % 233_280;
        Self {
            fraction: step as f64 / 233_280.0,
        }
    }

    /// Value in `min..=max`.
    pub fn random(&self, min: i64, max: i64) -> i64 {
        (self.fraction * (max - min + 1) as f64).floor() as i64 + min
    }
}

struct Profile {
    description: fn(&str) -> String,
    services: &'static [&'static str],
    specialties: &'static [&'static str],
    hours: [&'static str; 7],
    certifications: &'static [&'static str],
}

fn profile(category: &str) -> Profile {
    match category {
        "hair salon" => Profile {
            description: |name| format!("{} is a full-service hair salon offering cutting-edge styles and professional hair care services. Our experienced stylists stay current with the latest trends and techniques to give you the perfect look.", name),
            services: &["Hair Cuts", "Hair Coloring", "Highlights", "Perms", "Hair Styling", "Hair Treatments", "Blowouts", "Wedding Hair"],
            specialties: &["Color Correction", "Balayage", "Keratin Treatments", "Bridal Styling"],
            hours: ["Closed", "9:00 AM - 7:00 PM", "9:00 AM - 7:00 PM", "9:00 AM - 8:00 PM", "9:00 AM - 8:00 PM", "8:00 AM - 6:00 PM", "10:00 AM - 5:00 PM"],
            certifications: &["Licensed Cosmetologists", "Redken Certified", "L'Oreal Professional"],
        },
        "bakery" => Profile {
            description: |name| format!("{} is a local bakery specializing in fresh-baked goods, custom cakes, and artisanal breads. We use only the finest ingredients to create delicious treats for every occasion.", name),
            services: &["Fresh Bread", "Custom Cakes", "Pastries", "Cookies", "Wedding Cakes", "Birthday Cakes", "Catering", "Special Orders"],
            specialties: &["Artisan Breads", "Custom Decorating", "Gluten-Free Options", "Vegan Treats"],
            hours: ["6:00 AM - 6:00 PM", "6:00 AM - 6:00 PM", "6:00 AM - 6:00 PM", "6:00 AM - 6:00 PM", "6:00 AM - 7:00 PM", "6:00 AM - 7:00 PM", "7:00 AM - 5:00 PM"],
            certifications: &["Food Safety Certified", "ServSafe Certified"],
        },
        "dentist" => Profile {
            description: |name| format!("{} provides comprehensive dental care for patients of all ages. Our modern facility and experienced team ensure comfortable, quality dental treatment in a welcoming environment.", name),
            services: &["General Dentistry", "Teeth Cleaning", "Fillings", "Crowns", "Root Canals", "Teeth Whitening", "Oral Surgery", "Pediatric Dentistry"],
            specialties: &["Cosmetic Dentistry", "Implants", "Orthodontics", "Emergency Care"],
            hours: ["8:00 AM - 5:00 PM", "8:00 AM - 5:00 PM", "8:00 AM - 5:00 PM", "8:00 AM - 5:00 PM", "8:00 AM - 3:00 PM", "8:00 AM - 2:00 PM", "Closed"],
            certifications: &["DDS Licensed", "ADA Member", "Board Certified"],
        },
        "restaurant" => Profile {
            description: |name| format!("{} offers a unique dining experience with fresh, locally-sourced ingredients and exceptional service. Our menu features both classic favorites and innovative dishes.", name),
            services: &["Dine-In", "Takeout", "Delivery", "Catering", "Private Events", "Happy Hour", "Weekend Brunch"],
            specialties: &["Farm-to-Table", "Craft Cocktails", "Wine Selection", "Seasonal Menu"],
            hours: ["11:00 AM - 9:00 PM", "11:00 AM - 9:00 PM", "11:00 AM - 9:00 PM", "11:00 AM - 10:00 PM", "11:00 AM - 11:00 PM", "10:00 AM - 11:00 PM", "10:00 AM - 9:00 PM"],
            certifications: &["Food Service License", "Liquor License", "Health Department Certified"],
        },
        "gym" => Profile {
            description: |name| format!("{} is a full-service fitness center dedicated to helping you achieve your health and fitness goals. We offer state-of-the-art equipment and expert guidance.", name),
            services: &["Gym Membership", "Personal Training", "Group Classes", "Cardio Equipment", "Weight Training", "Yoga Classes", "Nutrition Counseling"],
            specialties: &["Strength Training", "HIIT Classes", "Functional Fitness", "Senior Fitness"],
            hours: ["5:00 AM - 10:00 PM", "5:00 AM - 10:00 PM", "5:00 AM - 10:00 PM", "5:00 AM - 10:00 PM", "5:00 AM - 9:00 PM", "6:00 AM - 8:00 PM", "7:00 AM - 8:00 PM"],
            certifications: &["ACSM Certified", "CPR/AED Certified", "NASM Certified Trainers"],
        },
        "plumber" => Profile {
            description: |name| format!("{} provides reliable plumbing services for residential and commercial properties. Our licensed plumbers are available for emergency repairs and routine maintenance.", name),
            services: &["Emergency Repairs", "Pipe Installation", "Drain Cleaning", "Water Heater Service", "Bathroom Remodeling", "Kitchen Plumbing", "Leak Detection"],
            specialties: &["24/7 Emergency Service", "Trenchless Repair", "Green Plumbing Solutions", "Commercial Plumbing"],
            hours: ["7:00 AM - 6:00 PM", "7:00 AM - 6:00 PM", "7:00 AM - 6:00 PM", "7:00 AM - 6:00 PM", "7:00 AM - 6:00 PM", "8:00 AM - 4:00 PM", "Emergency Only"],
            certifications: &["Licensed Plumber", "Bonded & Insured", "Master Plumber Certified"],
        },
        "lawyer" => Profile {
            description: |name| format!("{} provides experienced legal representation and counsel. Our attorneys are committed to protecting your rights and achieving the best possible outcomes.", name),
            services: &["Legal Consultation", "Personal Injury", "Family Law", "Criminal Defense", "Business Law", "Estate Planning", "Real Estate Law"],
            specialties: &["Trial Advocacy", "Mediation", "Contract Law", "Immigration Law"],
            hours: ["8:00 AM - 6:00 PM", "8:00 AM - 6:00 PM", "8:00 AM - 6:00 PM", "8:00 AM - 6:00 PM", "8:00 AM - 5:00 PM", "By Appointment", "Closed"],
            certifications: &["State Bar Licensed", "ABA Member", "Board Certified Specialist"],
        },
        "accountant" => Profile {
            description: |name| format!("{} offers comprehensive accounting and tax services for individuals and businesses. Our certified professionals ensure accurate financial management and tax compliance.", name),
            services: &["Tax Preparation", "Bookkeeping", "Payroll Services", "Business Consulting", "Audit Support", "Financial Planning", "QuickBooks Setup"],
            specialties: &["Small Business Accounting", "Tax Planning", "IRS Representation", "Financial Analysis"],
            hours: ["8:00 AM - 6:00 PM", "8:00 AM - 6:00 PM", "8:00 AM - 6:00 PM", "8:00 AM - 6:00 PM", "8:00 AM - 5:00 PM", "9:00 AM - 2:00 PM", "Closed"],
            certifications: &["CPA Licensed", "IRS Enrolled Agent", "QuickBooks ProAdvisor"],
        },
        "auto mechanic" => Profile {
            description: |name| format!("{} provides expert automotive repair and maintenance services. Our ASE-certified technicians use the latest diagnostic equipment to keep your vehicle running smoothly.", name),
            services: &["Oil Changes", "Brake Repair", "Engine Diagnostics", "Transmission Service", "AC Repair", "Tire Service", "State Inspections", "Preventive Maintenance"],
            specialties: &["Import Vehicles", "Diesel Engines", "Hybrid Vehicles", "Classic Cars"],
            hours: ["7:00 AM - 6:00 PM", "7:00 AM - 6:00 PM", "7:00 AM - 6:00 PM", "7:00 AM - 6:00 PM", "7:00 AM - 6:00 PM", "8:00 AM - 4:00 PM", "Closed"],
            certifications: &["ASE Certified", "State Licensed", "Manufacturer Certified"],
        },
        "florist" => Profile {
            description: |name| format!("{} creates beautiful floral arrangements for all occasions. From weddings to sympathy flowers, we provide fresh, high-quality blooms with artistic flair.", name),
            services: &["Wedding Flowers", "Funeral Arrangements", "Birthday Bouquets", "Corporate Events", "Delivery Service", "Plant Care", "Custom Arrangements"],
            specialties: &["Bridal Bouquets", "Seasonal Arrangements", "Exotic Flowers", "Event Decorating"],
            hours: ["9:00 AM - 6:00 PM", "9:00 AM - 6:00 PM", "9:00 AM - 6:00 PM", "9:00 AM - 6:00 PM", "9:00 AM - 7:00 PM", "8:00 AM - 6:00 PM", "10:00 AM - 4:00 PM"],
            certifications: &["Certified Floral Designer", "Wedding Specialist Certified"],
        },
        "photographer" => Profile {
            description: |name| format!("{} captures life's precious moments with artistic vision and professional expertise. We specialize in creating timeless images that tell your unique story.", name),
            services: &["Wedding Photography", "Portrait Sessions", "Event Photography", "Corporate Headshots", "Family Photos", "Senior Portraits", "Product Photography"],
            specialties: &["Natural Light Photography", "Digital Editing", "Album Design", "Drone Photography"],
            hours: ["10:00 AM - 6:00 PM", "10:00 AM - 6:00 PM", "10:00 AM - 6:00 PM", "10:00 AM - 6:00 PM", "10:00 AM - 6:00 PM", "9:00 AM - 8:00 PM", "12:00 PM - 6:00 PM"],
            certifications: &["Professional Photographers Association", "Certified Professional Photographer"],
        },
        "contractor" => Profile {
            description: |name| format!("{} provides comprehensive construction and remodeling services. Our licensed contractors deliver quality workmanship and reliable service for residential and commercial projects.", name),
            services: &["Home Remodeling", "Kitchen Renovation", "Bathroom Remodel", "Roofing", "Flooring", "Painting", "Electrical Work", "Plumbing"],
            specialties: &["Custom Homes", "Historic Restoration", "Green Building", "Commercial Construction"],
            hours: ["7:00 AM - 5:00 PM", "7:00 AM - 5:00 PM", "7:00 AM - 5:00 PM", "7:00 AM - 5:00 PM", "7:00 AM - 5:00 PM", "8:00 AM - 2:00 PM", "Closed"],
            certifications: &["Licensed Contractor", "Bonded & Insured", "Better Business Bureau A+"],
        },
        _ => Profile {
            description: |name| format!("{} is a professional service provider committed to excellence and customer satisfaction.", name),
            services: &["Professional Services", "Consultation", "Customer Support"],
            specialties: &[],
            hours: ["9:00 AM - 5:00 PM", "9:00 AM - 5:00 PM", "9:00 AM - 5:00 PM", "9:00 AM - 5:00 PM", "9:00 AM - 5:00 PM", "Closed", "Closed"],
            certifications: &[],
        },
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn employee_count(seed: LeadSeed) -> &'static str {
    match seed.random(1, 50) {
        n if n < 5 => "1-5",
        n if n < 15 => "6-15",
        n if n < 30 => "16-30",
        _ => "30+",
    }
}

fn social_handle(business_name: &str) -> String {
    business_name
        .to_lowercase()
        .split_whitespace()
        .collect::<String>()
}

fn social_media(lead: &Lead, seed: LeadSeed) -> Option<SocialMedia> {
    if lead.website.is_none() && seed.random(1, 10) <= 6 {
        return None;
    }
    let handle = social_handle(&lead.business_name);
    Some(SocialMedia {
        facebook: (seed.random(1, 10) > 3).then(|| format!("https://facebook.com/{}", handle)),
        instagram: (seed.random(1, 10) > 5).then(|| format!("https://instagram.com/{}", handle)),
        twitter: (seed.random(1, 10) > 7).then(|| format!("https://twitter.com/{}", handle)),
    })
}

fn reviews(seed: LeadSeed) -> ReviewSummary {
    let review = |author: &str, rating: i64, text: &str, date: &str| Review {
        author: author.to_string(),
        rating: rating as u8,
        text: text.to_string(),
        date: date.to_string(),
    };
    ReviewSummary {
        google_reviews: seed.random(10, 150) as u32,
        average_rating: seed.random(30, 50) as f64 / 10.0,
        total_reviews: seed.random(15, 200) as u32,
        recent_reviews: vec![
            review("Sarah M.", seed.random(4, 5), "Great service and professional staff. Highly recommend!", "2024-01-10"),
            review("Mike R.", seed.random(3, 5), "Good experience overall. Will come back again.", "2024-01-05"),
            review("Jennifer L.", seed.random(4, 5), "Excellent quality and attention to detail.", "2023-12-28"),
        ],
    }
}

fn competitors(category: &str, city: &str, seed: LeadSeed) -> Vec<NearbyCompetitor> {
    let names: [(&str, &str); 3] = match category {
        "hair salon" => [("Style", "Studio"), ("Hair", "Salon"), ("Elegant", "Hair Design")],
        "bakery" => [("Fresh", "Bakery"), ("Bread", "Company"), ("Corner", "Bakehouse")],
        "dentist" => [("Smile", "Dental"), ("Family Dental", "Care"), ("Modern", "Dentistry")],
        _ => [("Pro", "Services"), ("Professional", "Group"), ("Elite", "Solutions")],
    };
    let distance = |lo: i64, hi: i64| format!("{}.{} miles", seed.random(lo, hi), seed.random(1, 9));

    vec![
        NearbyCompetitor {
            name: format!("{} {}", names[0].0, names[0].1),
            distance: distance(1, 5),
            rating: seed.random(35, 48) as f64 / 10.0,
            has_website: seed.random(1, 10) > 4,
        },
        NearbyCompetitor {
            name: format!("{} {} {}", city, names[1].0, names[1].1),
            distance: distance(2, 8),
            rating: seed.random(30, 45) as f64 / 10.0,
            has_website: seed.random(1, 10) > 6,
        },
        NearbyCompetitor {
            name: format!("{} {}", names[2].0, names[2].1),
            distance: distance(3, 10),
            rating: seed.random(25, 42) as f64 / 10.0,
            has_website: seed.random(1, 10) > 3,
        },
    ]
}

pub fn market_position(lead_score: i64) -> MarketPosition {
    match lead_score {
        s if s >= 85 => MarketPosition::Leader,
        s if s >= 70 => MarketPosition::Challenger,
        s if s >= 50 => MarketPosition::Follower,
        _ => MarketPosition::Niche,
    }
}

fn market_insights(lead: &Lead) -> MarketInsights {
    let strengths: &[&str] = match lead.lead_score {
        s if s >= 80 => &["Strong local presence", "Excellent customer service", "Competitive pricing"],
        s if s >= 60 => &["Good reputation", "Convenient location", "Quality services"],
        _ => &["Niche specialization", "Personal attention", "Flexible scheduling"],
    };
    let opportunities: &[&str] = if lead.website.is_some() {
        &["Social media marketing", "Online reviews management", "SEO optimization"]
    } else {
        &["Website development", "Online presence", "Digital marketing", "Google My Business optimization"]
    };

    MarketInsights {
        market_position: market_position(lead.lead_score),
        strengths: strings(strengths),
        opportunities: strings(opportunities),
        threats: strings(&["New competitors", "Economic downturn", "Changing consumer preferences"]),
    }
}

/// Builds the detail view of `lead`.
pub fn extend_lead(lead: &Lead) -> ExtendedLead {
    let seed = LeadSeed::new(&lead.id);
    let category = lead.category.to_lowercase();
    let profile = profile(&category);
    let (city, state) = city_and_state(&lead.address).unwrap_or(("", ""));

    let mut payment_methods = strings(&["Cash", "Credit Cards", "Debit Cards"]);
    if seed.random(1, 10) > 5 {
        payment_methods.extend(strings(&["PayPal", "Venmo"]));
    }

    let mut service_area = vec![
        city.to_string(),
        format!("{} Metro Area", city),
        format!("{} Statewide", state),
    ];
    if seed.random(1, 10) > 5 {
        service_area.push("Surrounding Counties".to_string());
    }

    let [monday, tuesday, wednesday, thursday, friday, saturday, sunday] =
        profile.hours.map(str::to_string);

    ExtendedLead {
        description: (profile.description)(&lead.business_name),
        services: strings(profile.services),
        business_hours: BusinessHours {
            monday,
            tuesday,
            wednesday,
            thursday,
            friday,
            saturday,
            sunday,
        },
        social_media: social_media(lead, seed),
        year_established: BASE_YEAR - seed.random(5, 25) as i32,
        employee_count: employee_count(seed).to_string(),
        specialties: strings(profile.specialties),
        certifications: strings(profile.certifications),
        payment_methods,
        service_area,
        reviews: reviews(seed),
        competitors: competitors(&category, city, seed),
        market_insights: market_insights(lead),
        lead: lead.clone(),
    }
}

/// Cache of detail enrichments keyed by lead id.
pub type DetailCache = Cache<String, ExtendedLead>;

/// Enrichment for `lead`, computed once per id and then served from
/// `cache`. The base lead fields are always the caller's current copy.
pub async fn cached_extend(cache: &DetailCache, lead: Lead) -> ExtendedLead {
    let key = lead.id.clone();
    let mut extended = match cache.get(&key).await {
        Some(hit) => {
            tracing::debug!("Lead detail cache HIT: {}", key);
            hit
        }
        None => {
            let computed = extend_lead(&lead);
            cache.insert(key, computed.clone()).await;
            computed
        }
    };
    extended.lead = lead;
    extended
}
