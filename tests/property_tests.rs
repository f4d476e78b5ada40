/// Property-based tests using proptest
/// Tests invariants of the list engine and history store that should hold for all inputs
use leadgen_dashboard::history_store::HistoryStore;
use leadgen_dashboard::list_engine::{
    location_label, matches, paginate, render, FilterSpec, Page, SortField, SortOrder, SortSpec,
    TextField, ZohoStatus,
};
use leadgen_dashboard::models::{Lead, LeadSource, LeadType, SearchParams};
use proptest::prelude::*;

fn lead_strategy() -> impl Strategy<Value = Lead> {
    (
        "[a-z0-9]{1,8}",
        "[A-Za-z ]{1,16}",
        prop_oneof![Just("Bakery"), Just("Dentist"), Just("Gym")],
        prop_oneof![
            Just("1 Main St, Atlanta, GA 30309"),
            Just("2 Oak Ave, Denver, CO 80202"),
            Just("no commas here"),
        ],
        0i64..=100,
        prop::sample::select(LeadType::ALL.to_vec()),
        any::<bool>(),
    )
        .prop_map(|(id, name, category, address, score, lead_type, in_zoho)| Lead {
            id,
            business_name: name,
            category: category.to_string(),
            address: address.to_string(),
            website: None,
            phone: None,
            email: None,
            lead_score: score,
            lead_type,
            source: LeadSource::GoogleMaps,
            lighthouse_score: None,
            google_maps_listing: None,
            google_search_ranking: None,
            search_snippet: None,
            local_seo_score: None,
            notes: None,
            is_in_zoho: in_zoho,
        })
}

fn filter_strategy() -> impl Strategy<Value = FilterSpec> {
    (
        prop::option::of("[a-z]{0,3}"),
        prop::sample::subsequence(
            vec![TextField::BusinessName, TextField::Category, TextField::Address],
            1..=3,
        ),
        prop::option::of(prop::sample::select(LeadType::ALL.to_vec())),
        prop::option::of(prop_oneof![Just("Bakery"), Just("Gym")]),
        prop::sample::subsequence(vec!["Atlanta, GA", "Denver, CO"], 0..=2),
        prop_oneof![
            Just(ZohoStatus::All),
            Just(ZohoStatus::InZoho),
            Just(ZohoStatus::NotInZoho),
        ],
    )
        .prop_map(
            |(query, search_fields, lead_type, category, locations, zoho_status)| FilterSpec {
                query,
                search_fields,
                lead_type,
                category: category.map(str::to_string),
                locations: locations.into_iter().map(str::to_string).collect(),
                zoho_status,
            },
        )
}

/// "City, ST" of the addresses `lead_strategy` draws from.
fn expected_label(address: &str) -> Option<&'static str> {
    match address {
        "1 Main St, Atlanta, GA 30309" => Some("Atlanta, GA"),
        "2 Oak Ave, Denver, CO 80202" => Some("Denver, CO"),
        _ => None,
    }
}

/// Evaluates every active clause on its own and requires all of them.
fn satisfies_every_clause(lead: &Lead, filter: &FilterSpec) -> bool {
    let query_ok = match filter.query.as_deref() {
        None | Some("") => true,
        Some(query) => filter.search_fields.iter().any(|field| {
            let value = match field {
                TextField::BusinessName => &lead.business_name,
                TextField::Category => &lead.category,
                TextField::Address => &lead.address,
                _ => return false,
            };
            value.to_lowercase().contains(query)
        }),
    };
    let type_ok = filter.lead_type.map_or(true, |t| lead.lead_type == t);
    let category_ok = filter.category.as_ref().map_or(true, |c| &lead.category == c);
    let location_ok = filter.locations.is_empty()
        || expected_label(&lead.address).map_or(false, |label| filter.locations.contains(label));
    let zoho_ok = match filter.zoho_status {
        ZohoStatus::All => true,
        ZohoStatus::InZoho => lead.is_in_zoho,
        ZohoStatus::NotInZoho => !lead.is_in_zoho,
    };

    query_ok && type_ok && category_ok && location_ok && zoho_ok
}

fn sort_strategy() -> impl Strategy<Value = SortSpec> {
    (
        prop_oneof![
            Just(SortField::BusinessName),
            Just(SortField::LeadScore),
            Just(SortField::LeadType),
        ],
        prop_oneof![Just(SortOrder::Asc), Just(SortOrder::Desc)],
    )
        .prop_map(|(field, order)| SortSpec::new(field, order))
}

// Property: rendering is a pure function of its inputs
proptest! {
    #[test]
    fn render_is_deterministic(
        leads in prop::collection::vec(lead_strategy(), 0..30),
        filter in filter_strategy(),
        sort in sort_strategy()
    ) {
        prop_assert_eq!(render(&leads, &filter, &sort), render(&leads, &filter, &sort));
    }

    #[test]
    fn render_keeps_exactly_the_leads_passing_every_clause(
        leads in prop::collection::vec(lead_strategy(), 0..30),
        filter in filter_strategy(),
        sort in sort_strategy()
    ) {
        let rendered = render(&leads, &filter, &sort);
        let mut expected: Vec<&str> = leads
            .iter()
            .filter(|l| satisfies_every_clause(l, &filter))
            .map(|l| l.id.as_str())
            .collect();
        let mut kept: Vec<&str> = rendered.iter().map(|l| l.id.as_str()).collect();
        expected.sort_unstable();
        kept.sort_unstable();

        prop_assert_eq!(kept, expected);
        prop_assert!(rendered.iter().all(|l| matches(l, &filter)));
    }

    #[test]
    fn scores_come_out_ordered(
        leads in prop::collection::vec(lead_strategy(), 0..30),
        ascending in any::<bool>()
    ) {
        let order = if ascending { SortOrder::Asc } else { SortOrder::Desc };
        let rendered = render(&leads, &FilterSpec::default(), &SortSpec::new(SortField::LeadScore, order));

        for pair in rendered.windows(2) {
            if ascending {
                prop_assert!(pair[0].lead_score <= pair[1].lead_score);
            } else {
                prop_assert!(pair[0].lead_score >= pair[1].lead_score);
            }
        }
    }

    #[test]
    fn pages_cover_the_list_without_overlap(
        leads in prop::collection::vec(lead_strategy(), 0..40),
        per_page in 1usize..12
    ) {
        let total = leads.len();
        let mut seen = 0;
        let mut page = 1;
        loop {
            let chunk = paginate(leads.clone(), Page::new(page, per_page));
            prop_assert_eq!(chunk.total, total);
            seen += chunk.items.len();
            if !chunk.has_more {
                break;
            }
            page += 1;
        }
        prop_assert_eq!(seen, total);
    }
}

// Property: address parsing should never panic
proptest! {
    #[test]
    fn location_label_never_panics(address in "\\PC*") {
        let _ = location_label(&address);
    }

    #[test]
    fn well_formed_addresses_yield_city_and_state(
        street in "[A-Za-z0-9 ]{1,20}",
        city in "[A-Za-z]{1,12}",
        state in "[A-Z]{2}",
        zip in "[0-9]{5}"
    ) {
        let address = format!("{}, {}, {} {}", street, city, state, zip);
        prop_assert_eq!(location_label(&address), Some(format!("{}, {}", city, state)));
    }
}

// Property: the history never exceeds its capacity and stays most-recent-first
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn history_is_bounded(capacity in 1usize..8, saves in 0usize..20) {
        let store = HistoryStore::new(capacity);
        let mut last = None;
        for i in 0..saves {
            let params = SearchParams {
                business_type: format!("type-{}", i),
                locations: vec!["atlanta".to_string()],
                number_of_businesses: 10,
                include_google_search: false,
                custom_search_query: None,
                include_competitor_analysis: false,
                include_trend_analysis: false,
            };
            last = Some(store.save(params, vec![], None).id);
        }

        prop_assert_eq!(store.len(), saves.min(capacity));
        prop_assert_eq!(store.list().first().map(|e| e.id.clone()), last);
    }
}
