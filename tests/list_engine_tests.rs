/// Integration tests for filtering, sorting and paging lead lists
use chrono::{TimeZone, Utc};
use leadgen_dashboard::list_engine::{
    paginate, render, unique_categories, unique_locations, FilterSpec, Page, SortField,
    SortOrder, SortSpec, TextField, ZohoStatus,
};
use leadgen_dashboard::models::{Lead, LeadSource, LeadTableItem, LeadType};

fn lead(id: &str, name: &str, score: i64, lead_type: LeadType, address: &str) -> Lead {
    Lead {
        id: id.to_string(),
        business_name: name.to_string(),
        category: "Bakery".to_string(),
        address: address.to_string(),
        website: None,
        phone: None,
        email: None,
        lead_score: score,
        lead_type,
        source: LeadSource::GoogleMaps,
        lighthouse_score: None,
        google_maps_listing: Some(true),
        google_search_ranking: None,
        search_snippet: None,
        local_seo_score: None,
        notes: None,
        is_in_zoho: false,
    }
}

fn sample() -> Vec<Lead> {
    vec![
        lead("a", "Alpha Bakery", 95, LeadType::Excellent, "1 Main St, Atlanta, GA 30309"),
        lead("b", "Beta Breads", 60, LeadType::Medium, "2 Oak Ave, Denver, CO 80202"),
        lead("c", "Gamma Cakes", 82, LeadType::Good, "3 Pine Rd, Atlanta, GA 30308"),
    ]
}

fn ids(leads: &[Lead]) -> Vec<&str> {
    leads.iter().map(|l| l.id.as_str()).collect()
}

#[test]
fn default_sort_is_score_descending() {
    let rendered = render(&sample(), &FilterSpec::default(), &SortSpec::default());

    let scores: Vec<i64> = rendered.iter().map(|l| l.lead_score).collect();
    assert_eq!(scores, vec![95, 82, 60]);
}

#[test]
fn location_filter_keeps_only_selected_cities() {
    let filter = FilterSpec {
        locations: ["Atlanta, GA".to_string()].into_iter().collect(),
        ..FilterSpec::default()
    };

    let rendered = render(&sample(), &filter, &SortSpec::default());

    assert_eq!(ids(&rendered), vec!["a", "c"]);
    assert!(rendered.iter().all(|l| l.address.contains("Atlanta")));
}

#[test]
fn clauses_are_conjunctive() {
    let filter = FilterSpec {
        query: Some("bake".to_string()),
        lead_type: Some(LeadType::Excellent),
        locations: ["Atlanta, GA".to_string(), "Denver, CO".to_string()]
            .into_iter()
            .collect(),
        ..FilterSpec::default()
    };

    let rendered = render(&sample(), &filter, &SortSpec::default());

    assert_eq!(ids(&rendered), vec!["a"]);
}

#[test]
fn query_only_searches_selected_fields() {
    let leads = sample();
    let by_city = FilterSpec {
        query: Some("denver".to_string()),
        search_fields: vec![TextField::City],
        ..FilterSpec::default()
    };
    let by_name = FilterSpec {
        query: Some("denver".to_string()),
        search_fields: vec![TextField::BusinessName],
        ..FilterSpec::default()
    };

    assert_eq!(ids(&render(&leads, &by_city, &SortSpec::default())), vec!["b"]);
    assert!(render(&leads, &by_name, &SortSpec::default()).is_empty());
}

#[test]
fn zoho_filter_splits_the_list() {
    let mut leads = sample();
    leads[1].is_in_zoho = true;

    let in_zoho = FilterSpec {
        zoho_status: ZohoStatus::InZoho,
        ..FilterSpec::default()
    };
    let not_in_zoho = FilterSpec {
        zoho_status: ZohoStatus::NotInZoho,
        ..FilterSpec::default()
    };

    assert_eq!(ids(&render(&leads, &in_zoho, &SortSpec::default())), vec!["b"]);
    assert_eq!(
        ids(&render(&leads, &not_in_zoho, &SortSpec::default())),
        vec!["a", "c"]
    );
}

#[test]
fn render_does_not_mutate_its_input() {
    let leads = sample();
    let before = leads.clone();

    let _ = render(
        &leads,
        &FilterSpec::default(),
        &SortSpec::new(SortField::BusinessName, SortOrder::Desc),
    );

    assert_eq!(leads, before);
}

#[test]
fn name_sort_ignores_case() {
    let mut leads = sample();
    leads[0].business_name = "alpha bakery".to_string();

    let rendered = render(
        &leads,
        &FilterSpec::default(),
        &SortSpec::new(SortField::BusinessName, SortOrder::Asc),
    );

    assert_eq!(ids(&rendered), vec!["a", "b", "c"]);
}

#[test]
fn table_items_sort_by_date_added() {
    let items: Vec<LeadTableItem> = sample()
        .into_iter()
        .enumerate()
        .map(|(i, lead)| LeadTableItem {
            lead,
            date_added: Utc.with_ymd_and_hms(2024, 1, 10 + i as u32, 9, 0, 0).unwrap(),
            city: String::new(),
            state: String::new(),
        })
        .collect();

    let newest_first = render(
        &items,
        &FilterSpec::default(),
        &SortSpec::new(SortField::DateAdded, SortOrder::Desc),
    );

    let order: Vec<&str> = newest_first.iter().map(|i| i.lead.id.as_str()).collect();
    assert_eq!(order, vec!["c", "b", "a"]);
}

#[test]
fn paging_reports_total_and_more() {
    let rendered = render(&sample(), &FilterSpec::default(), &SortSpec::default());

    let first = paginate(rendered.clone(), Page::new(1, 2));
    let second = paginate(rendered, Page::new(2, 2));

    assert_eq!(first.total, 3);
    assert!(first.has_more);
    assert_eq!(first.items.len(), 2);
    assert_eq!(second.items.len(), 1);
    assert!(!second.has_more);
}

#[test]
fn filter_choices_come_from_the_data() {
    let leads = sample();

    assert_eq!(unique_locations(&leads), vec!["Atlanta, GA", "Denver, CO"]);
    assert_eq!(unique_categories(&leads), vec!["Bakery"]);
}

#[test]
fn lead_type_sorts_by_wire_id() {
    let leads = vec![
        lead("a", "A", 50, LeadType::ResearchNeeded, "x"),
        lead("b", "B", 50, LeadType::Excellent, "x"),
        lead("c", "C", 50, LeadType::Poor, "x"),
        lead("d", "D", 50, LeadType::Good, "x"),
        lead("e", "E", 50, LeadType::Medium, "x"),
    ];

    let asc = render(
        &leads,
        &FilterSpec::default(),
        &SortSpec::new(SortField::LeadType, SortOrder::Asc),
    );
    let types: Vec<&str> = asc.iter().map(|l| l.lead_type.as_str()).collect();
    assert_eq!(types, vec!["excellent", "good", "medium", "poor", "research-needed"]);

    let desc = render(
        &leads,
        &FilterSpec::default(),
        &SortSpec::new(SortField::LeadType, SortOrder::Desc),
    );
    assert_eq!(ids(&desc), vec!["a", "c", "e", "d", "b"]);
}

#[test]
fn equal_keys_keep_input_order_in_both_directions() {
    let leads = vec![
        lead("a", "Same", 70, LeadType::Good, "x"),
        lead("b", "Same", 70, LeadType::Good, "x"),
        lead("c", "Same", 70, LeadType::Good, "x"),
        lead("d", "Same", 70, LeadType::Good, "x"),
    ];

    for order in [SortOrder::Asc, SortOrder::Desc] {
        for field in [SortField::LeadScore, SortField::BusinessName, SortField::LeadType] {
            let rendered = render(&leads, &FilterSpec::default(), &SortSpec::new(field, order));
            assert_eq!(ids(&rendered), vec!["a", "b", "c", "d"], "{:?} {:?}", field, order);
        }
    }
}

#[test]
fn ties_stay_in_input_order_among_sorted_scores() {
    let leads = vec![
        lead("a", "A", 60, LeadType::Good, "x"),
        lead("b", "B", 90, LeadType::Good, "x"),
        lead("c", "C", 60, LeadType::Good, "x"),
        lead("d", "D", 90, LeadType::Good, "x"),
    ];

    let desc = render(&leads, &FilterSpec::default(), &SortSpec::default());
    assert_eq!(ids(&desc), vec!["b", "d", "a", "c"]);

    let asc = render(
        &leads,
        &FilterSpec::default(),
        &SortSpec::new(SortField::LeadScore, SortOrder::Asc),
    );
    assert_eq!(ids(&asc), vec!["a", "c", "b", "d"]);
}
