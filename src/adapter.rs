//! Mapping between the external lead-search API's shapes and the canonical
//! models.
//!
//! Upstream naming (`title`, `category_name`, `phones`, `evaluation_score`,
//! ...) stops here; nothing past this module sees it.

use crate::csv_export::HistoryRow;
use crate::list_engine::{SortField, SortOrder, SortSpec, ZohoStatus};
use crate::models::{
    BusinessCategory, Lead, LeadSource, LeadTableItem, LeadType, Location, SearchParams,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Upstream ids arrive as either JSON strings or numbers.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "id_string")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(s)| s))
}

/// A list response: a bare array, or one wrapped in `data` / `results`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Bare(Vec<T>),
    Data { data: Vec<T> },
    Results { results: Vec<T> },
}

impl<T> ListEnvelope<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) => items,
            ListEnvelope::Data { data } => data,
            ListEnvelope::Results { results } => results,
        }
    }
}

// ============ Leads ============

/// A lead as served by `/search-results` and `/search/execute`.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteLead {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub title: Option<String>,
    pub category_name: Option<String>,
    #[serde(default)]
    pub phones: Option<Vec<String>>,
    #[serde(default)]
    pub emails: Option<Vec<String>>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub is_in_zoho: Option<bool>,
    pub in_zoho_crm: Option<bool>,
    pub source: Option<String>,
    pub evaluation_score: Option<f64>,
    pub evaluation_qualitative: Option<String>,
    pub website: Option<String>,
    pub lighthouse_score: Option<u8>,
    pub google_search_ranking: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn first_non_empty(values: Option<Vec<String>>) -> Option<String> {
    values?.into_iter().find(|v| !v.trim().is_empty())
}

/// Lenient lead-type parsing: case and `_`/`-` are ignored, anything
/// unrecognised needs research.
pub fn parse_lead_type(value: Option<&str>) -> LeadType {
    value
        .map(|v| v.trim().to_ascii_lowercase().replace('_', "-"))
        .and_then(|v| LeadType::parse(&v))
        .unwrap_or(LeadType::ResearchNeeded)
}

pub fn parse_lead_source(value: Option<&str>) -> LeadSource {
    value
        .map(|v| v.trim().to_ascii_lowercase().replace('_', "-"))
        .and_then(|v| LeadSource::parse(&v))
        .unwrap_or(LeadSource::GoogleMaps)
}

impl RemoteLead {
    pub fn into_lead(self) -> Lead {
        self.into_parts().0
    }

    /// Projects the lead for the all-leads table. `created_at` becomes
    /// `dateAdded`, falling back to `now` when upstream omits it.
    pub fn into_table_item(self, now: DateTime<Utc>) -> LeadTableItem {
        let (lead, city, state, created_at) = self.into_parts();
        LeadTableItem {
            lead,
            date_added: created_at.unwrap_or(now),
            city: city.unwrap_or_default(),
            state: state.unwrap_or_default(),
        }
    }

    fn into_parts(self) -> (Lead, Option<String>, Option<String>, Option<DateTime<Utc>>) {
        let city = non_empty(self.city);
        let state = non_empty(self.state);
        let address = match non_empty(self.address) {
            Some(address) => address,
            None => [city.clone(), state.clone(), non_empty(self.country)]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(", "),
        };

        let lead = Lead {
            id: self.id,
            business_name: self.title.unwrap_or_default(),
            category: self.category_name.unwrap_or_default(),
            address,
            website: non_empty(self.website),
            phone: first_non_empty(self.phones),
            email: first_non_empty(self.emails),
            lead_score: self.evaluation_score.map(|s| s.round() as i64).unwrap_or(0),
            lead_type: parse_lead_type(self.evaluation_qualitative.as_deref()),
            source: parse_lead_source(self.source.as_deref()),
            lighthouse_score: self.lighthouse_score,
            google_maps_listing: None,
            google_search_ranking: self.google_search_ranking,
            search_snippet: None,
            local_seo_score: None,
            notes: None,
            is_in_zoho: self.is_in_zoho.or(self.in_zoho_crm).unwrap_or(false),
        };
        (lead, city, state, self.created_at)
    }
}

// ============ Search execution ============

/// Body of `POST /search/execute`. One request covers one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteSearchRequest {
    pub location_id: String,
    pub max_results: u32,
    pub query: String,
    pub search_google: bool,
    pub search_local: bool,
    pub search_maps: bool,
}

impl RemoteSearchRequest {
    /// The custom query wins over the business type when it is not blank.
    pub fn for_location(params: &SearchParams, location_id: &str) -> Self {
        let query = params
            .custom_search_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(&params.business_type)
            .to_string();

        Self {
            location_id: location_id.to_string(),
            max_results: params.number_of_businesses,
            query,
            search_google: params.include_google_search,
            search_local: false,
            search_maps: true,
        }
    }
}

// ============ Lead listing ============

/// Sort keys understood by the lead listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteSort {
    CreatedAtDesc,
    CreatedAtAsc,
    ScoreDesc,
    ScoreAsc,
    TitleAsc,
    TitleDesc,
}

impl RemoteSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteSort::CreatedAtDesc => "created_at_desc",
            RemoteSort::CreatedAtAsc => "created_at_asc",
            RemoteSort::ScoreDesc => "score_desc",
            RemoteSort::ScoreAsc => "score_asc",
            RemoteSort::TitleAsc => "title_asc",
            RemoteSort::TitleDesc => "title_desc",
        }
    }

    /// Lead-type ordering has no upstream counterpart and falls back to
    /// newest first.
    pub fn from_sort(sort: SortSpec) -> Self {
        match (sort.field, sort.order) {
            (SortField::DateAdded, SortOrder::Asc) => RemoteSort::CreatedAtAsc,
            (SortField::LeadScore, SortOrder::Desc) => RemoteSort::ScoreDesc,
            (SortField::LeadScore, SortOrder::Asc) => RemoteSort::ScoreAsc,
            (SortField::BusinessName, SortOrder::Asc) => RemoteSort::TitleAsc,
            (SortField::BusinessName, SortOrder::Desc) => RemoteSort::TitleDesc,
            _ => RemoteSort::CreatedAtDesc,
        }
    }
}

/// Filters for `GET /search-results`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteLeadQuery {
    pub words: Option<String>,
    pub lead_type: Option<LeadType>,
    pub category_id: Option<String>,
    pub location_id: Option<String>,
    pub zoho: ZohoStatus,
    pub sort_by: RemoteSort,
    pub skip: usize,
    pub limit: usize,
}

impl Default for RemoteLeadQuery {
    fn default() -> Self {
        Self {
            words: None,
            lead_type: None,
            category_id: None,
            location_id: None,
            zoho: ZohoStatus::All,
            sort_by: RemoteSort::CreatedAtDesc,
            skip: 0,
            limit: 1000,
        }
    }
}

impl RemoteLeadQuery {
    /// Query-string pairs; inactive filters are omitted.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("skip", self.skip.to_string()),
            ("limit", self.limit.to_string()),
            ("sort_by", self.sort_by.as_str().to_string()),
        ];
        if let Some(words) = self.words.as_deref().filter(|w| !w.is_empty()) {
            pairs.push(("words", words.to_string()));
        }
        if let Some(lead_type) = self.lead_type {
            pairs.push(("evaluation_qualitative", lead_type.as_str().to_string()));
        }
        if let Some(ref category_id) = self.category_id {
            pairs.push(("category_id", category_id.clone()));
        }
        if let Some(ref location_id) = self.location_id {
            pairs.push(("location_id", location_id.clone()));
        }
        match self.zoho {
            ZohoStatus::InZoho => pairs.push(("in_zoho_crm", "true".to_string())),
            ZohoStatus::NotInZoho => pairs.push(("in_zoho_crm", "false".to_string())),
            ZohoStatus::All => {}
        }
        pairs
    }
}

// ============ Search history ============

/// A row of `GET /search/params`.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteHistoryRow {
    #[serde(default)]
    pub query: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub location_id: Option<String>,
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub search_google: bool,
    #[serde(default)]
    pub search_local: bool,
    #[serde(default)]
    pub search_maps: bool,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub category_id: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<RemoteHistoryRow> for HistoryRow {
    fn from(row: RemoteHistoryRow) -> Self {
        Self {
            query: row.query,
            location: row.location_id.unwrap_or_default(),
            max_results: row.max_results,
            search_google: row.search_google,
            search_local: row.search_local,
            search_maps: row.search_maps,
            category: row.category_id.unwrap_or_default(),
            status: row.status.unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

// ============ Lookups ============

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCategory {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
}

impl From<RemoteCategory> for BusinessCategory {
    fn from(c: RemoteCategory) -> Self {
        Self {
            id: c.id,
            name: c.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteLocation {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub formatted: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl From<RemoteLocation> for Location {
    fn from(l: RemoteLocation) -> Self {
        let name = non_empty(l.formatted).unwrap_or_else(|| {
            [l.city, l.state, l.country]
                .into_iter()
                .flatten()
                .filter(|s| !s.trim().is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        });
        Self { id: l.id, name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn remote_lead_maps_upstream_names() {
        let remote: RemoteLead = serde_json::from_value(json!({
            "id": 42,
            "title": "Sweet Dreams Bakery",
            "category_name": "Bakery",
            "phones": ["", "(555) 123-4567", "(555) 000-0000"],
            "emails": [],
            "address": "123 Main St, Atlanta, GA 30309",
            "city": "Atlanta",
            "state": "GA",
            "in_zoho_crm": true,
            "source": "google_search",
            "evaluation_score": 94.6,
            "evaluation_qualitative": "Excellent",
            "created_at": "2024-01-15T10:30:00Z"
        }))
        .unwrap();

        let item = remote.into_table_item(Utc::now());
        assert_eq!(item.lead.id, "42");
        assert_eq!(item.lead.business_name, "Sweet Dreams Bakery");
        assert_eq!(item.lead.phone.as_deref(), Some("(555) 123-4567"));
        assert_eq!(item.lead.email, None);
        assert_eq!(item.lead.lead_score, 95);
        assert_eq!(item.lead.lead_type, LeadType::Excellent);
        assert_eq!(item.lead.source, LeadSource::GoogleSearch);
        assert!(item.lead.is_in_zoho);
        assert_eq!(item.city, "Atlanta");
        assert_eq!(item.date_added.to_rfc3339(), "2024-01-15T10:30:00+00:00");
    }

    #[test]
    fn unknown_enums_fall_back() {
        let remote: RemoteLead = serde_json::from_value(json!({
            "id": "x",
            "evaluation_qualitative": "amazing",
            "source": "yelp",
            "city": "Denver",
            "state": "CO"
        }))
        .unwrap();

        let lead = remote.into_lead();
        assert_eq!(lead.lead_type, LeadType::ResearchNeeded);
        assert_eq!(lead.source, LeadSource::GoogleMaps);
        assert_eq!(lead.address, "Denver, CO");
        assert!(!lead.is_in_zoho);
    }

    #[test]
    fn envelopes_unwrap() {
        let bare: ListEnvelope<RemoteCategory> =
            serde_json::from_value(json!([{ "id": 1, "name": "Bakery" }])).unwrap();
        let data: ListEnvelope<RemoteCategory> =
            serde_json::from_value(json!({ "data": [{ "id": "2", "name": "Gym" }] })).unwrap();
        let results: ListEnvelope<RemoteCategory> =
            serde_json::from_value(json!({ "results": [] })).unwrap();

        assert_eq!(bare.into_vec()[0].id, "1");
        assert_eq!(data.into_vec()[0].name, "Gym");
        assert!(results.into_vec().is_empty());
    }

    #[test]
    fn search_request_prefers_custom_query() {
        let mut params = SearchParams {
            business_type: "bakery".to_string(),
            locations: vec!["atlanta".to_string()],
            number_of_businesses: 25,
            include_google_search: true,
            custom_search_query: Some("  artisan bakery ".to_string()),
            include_competitor_analysis: false,
            include_trend_analysis: false,
        };
        let request = RemoteSearchRequest::for_location(&params, "atlanta");
        assert_eq!(request.query, "artisan bakery");
        assert!(request.search_maps);
        assert!(!request.search_local);

        params.custom_search_query = Some("   ".to_string());
        assert_eq!(RemoteSearchRequest::for_location(&params, "atlanta").query, "bakery");
    }

    #[test]
    fn lead_query_omits_inactive_filters() {
        let query = RemoteLeadQuery {
            words: Some("bakery".to_string()),
            zoho: ZohoStatus::NotInZoho,
            sort_by: RemoteSort::from_sort(SortSpec::new(SortField::LeadScore, SortOrder::Asc)),
            ..RemoteLeadQuery::default()
        };
        let pairs = query.to_pairs();

        assert!(pairs.contains(&("words", "bakery".to_string())));
        assert!(pairs.contains(&("in_zoho_crm", "false".to_string())));
        assert!(pairs.contains(&("sort_by", "score_asc".to_string())));
        assert!(!pairs.iter().any(|(k, _)| *k == "category_id"));
    }

    #[test]
    fn lead_type_sort_falls_back_to_newest() {
        let sort = SortSpec::new(SortField::LeadType, SortOrder::Asc);
        assert_eq!(RemoteSort::from_sort(sort), RemoteSort::CreatedAtDesc);
    }

    #[test]
    fn history_row_maps_numeric_ids() {
        let row: RemoteHistoryRow = serde_json::from_value(json!({
            "query": "bakery",
            "location_id": 7,
            "max_results": 20,
            "search_google": true,
            "search_maps": true,
            "category_id": null,
            "status": "COMPLETED",
            "created_at": "2024-01-15T10:30:00Z"
        }))
        .unwrap();

        let row = HistoryRow::from(row);
        assert_eq!(row.location, "7");
        assert_eq!(row.category, "");
        assert!(!row.search_local);
    }
}
