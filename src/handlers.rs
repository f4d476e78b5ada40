use crate::adapter::{RemoteLeadQuery, RemoteSort};
use crate::config::Config;
use crate::csv_export::{self, CsvFile, HistoryRow, LeadColumnExtras};
use crate::demo;
use crate::errors::AppError;
use crate::history_store::HistoryStore;
use crate::lead_details::{cached_extend, DetailCache};
use crate::list_engine::{
    self, FilterSpec, Page, Paginated, SortField, SortOrder, SortSpec, TextField, ZohoStatus,
    DEFAULT_PER_PAGE,
};
use crate::models::*;
use crate::orchestrator::{SearchBackend, SearchOrchestrator};
use crate::search_client::SearchApiClient;
use crate::snapshot::ValidatedSnapshot;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Search history shared with the orchestrator.
    pub history: Arc<HistoryStore>,
    /// Runs searches and writes them to `history`.
    pub orchestrator: Arc<SearchOrchestrator>,
    /// Client for the external search API (`None` in demo mode).
    pub search_client: Option<SearchApiClient>,
    /// Detail enrichment per lead id (24 hour TTL).
    pub detail_cache: DetailCache,
    /// Category/location lookups as checksummed JSON (1 hour TTL).
    /// Key: "categories" or "locations".
    pub lookup_cache: Cache<String, String>,
}

impl AppState {
    /// Builds the state from configuration: opens the history store, seeds
    /// it when asked to, and picks the search backend.
    ///
    /// Seeding only happens for a store without a prior snapshot, so entries
    /// the user deleted stay deleted across restarts.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let history = Arc::new(HistoryStore::from_config(&config));
        if config.seed_demo_history && history.is_fresh() {
            for entry in demo::seed_history().into_iter().rev() {
                history.insert(entry);
            }
            tracing::info!("Seeded {} demo history entries", history.len());
        }

        let search_client = SearchApiClient::from_config(&config)?;
        let backend = match search_client {
            Some(ref client) => {
                tracing::info!("✓ Search API client initialized: {}", client.base_url());
                SearchBackend::Remote(client.clone())
            }
            None => {
                tracing::info!("Search backend: built-in demo generator");
                SearchBackend::Demo
            }
        };
        let orchestrator = Arc::new(SearchOrchestrator::new(backend, history.clone()));

        let detail_cache = Cache::builder()
            .time_to_live(Duration::from_secs(86400))
            .max_capacity(50_000)
            .build();
        tracing::info!("Lead detail cache initialized (24h TTL, 50k capacity)");

        let lookup_cache = Cache::builder()
            .time_to_live(Duration::from_secs(3600))
            .max_capacity(100)
            .build();
        tracing::info!("Lookup cache initialized (1h TTL)");

        Ok(Self {
            config,
            history,
            orchestrator,
            search_client,
            detail_cache,
            lookup_cache,
        })
    }

    fn require_client(&self) -> Result<&SearchApiClient, AppError> {
        self.search_client.as_ref().ok_or_else(|| {
            AppError::BadRequest("Not available in demo mode: SEARCH_API_URL is not set".to_string())
        })
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Health check endpoint.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "leadgen-dashboard",
            "version": env!("CARGO_PKG_VERSION"),
            "mode": if state.orchestrator.is_demo() { "demo" } else { "remote" },
            "historyEntries": state.history.len(),
            "historyCapacity": state.config.history_capacity,
        })),
    )
}

// ============ Query parsing ============

/// Query string of the lead listing endpoints.
///
/// Enumerated values are validated; an unknown value is a 400.
#[derive(Debug, Default, Deserialize)]
pub struct LeadListQuery {
    pub query: Option<String>,
    /// Comma-separated text fields the query is matched against.
    pub fields: Option<String>,
    pub lead_type: Option<String>,
    pub category: Option<String>,
    /// `|`-separated "City, ST" labels.
    pub locations: Option<String>,
    pub zoho: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `None` for absent, blank or `"all"`.
fn choice(value: &Option<String>) -> Option<&str> {
    non_blank(value).filter(|v| *v != "all")
}

fn invalid(name: &str, value: &str) -> AppError {
    AppError::BadRequest(format!("invalid {}: '{}'", name, value))
}

impl LeadListQuery {
    pub fn filter_spec(&self) -> Result<FilterSpec, AppError> {
        let mut filter = FilterSpec {
            query: non_blank(&self.query).map(str::to_string),
            ..FilterSpec::default()
        };

        if let Some(fields) = non_blank(&self.fields) {
            filter.search_fields = fields
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(|f| TextField::parse(f).ok_or_else(|| invalid("field", f)))
                .collect::<Result<_, _>>()?;
        }
        if let Some(lead_type) = choice(&self.lead_type) {
            filter.lead_type =
                Some(LeadType::parse(lead_type).ok_or_else(|| invalid("lead_type", lead_type))?);
        }
        filter.category = choice(&self.category).map(str::to_string);
        if let Some(locations) = non_blank(&self.locations) {
            filter.locations = locations
                .split('|')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(zoho) = non_blank(&self.zoho) {
            filter.zoho_status = ZohoStatus::parse(zoho).ok_or_else(|| invalid("zoho", zoho))?;
        }

        Ok(filter)
    }

    pub fn sort_spec(&self) -> Result<SortSpec, AppError> {
        let default = SortSpec::default();
        let field = match non_blank(&self.sort_by) {
            Some(f) => SortField::parse(f).ok_or_else(|| invalid("sort_by", f))?,
            None => default.field,
        };
        let order = match non_blank(&self.order) {
            Some(o) => SortOrder::parse(o).ok_or_else(|| invalid("order", o))?,
            None => default.order,
        };
        Ok(SortSpec::new(field, order))
    }

    pub fn page(&self) -> Page {
        Page::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
    }
}

// ============ Searches ============

/// POST /api/v1/searches
///
/// Executes a search and records it in history.
///
/// # Returns
///
/// * `Result<Json<SearchResult>, AppError>` - The saved search result or an error.
pub async fn execute_search(
    State(state): State<Arc<AppState>>,
    Json(params): Json<SearchParams>,
) -> Result<Json<SearchResult>, AppError> {
    tracing::info!("POST /searches - {:?}", params);
    let result = state.orchestrator.execute(params).await?;
    Ok(Json(result))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Case-insensitive substring over the custom query and business type.
    pub query: Option<String>,
    /// `YYYY-MM-DD`; keeps entries created on that (UTC) day.
    pub date: Option<String>,
}

fn history_matches(entry: &SearchResult, needle: Option<&str>, day: Option<NaiveDate>) -> bool {
    let text_ok = needle.map_or(true, |needle| {
        let params = &entry.search_params;
        params.business_type.to_lowercase().contains(needle)
            || params
                .custom_search_query
                .as_deref()
                .is_some_and(|q| q.to_lowercase().contains(needle))
    });
    let day_ok = day.map_or(true, |day| entry.date.date_naive() == day);
    text_ok && day_ok
}

/// GET /api/v1/searches
pub async fn list_searches(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<SearchResult>>, AppError> {
    let needle = non_blank(&params.query).map(str::to_lowercase);
    let day = non_blank(&params.date)
        .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|_| invalid("date", d)))
        .transpose()?;

    let entries = state
        .history
        .list()
        .into_iter()
        .filter(|e| history_matches(e, needle.as_deref(), day))
        .collect();
    Ok(Json(entries))
}

/// DELETE /api/v1/searches
pub async fn clear_searches(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let removed = state.history.len();
    state.history.clear();
    Json(json!({ "cleared": removed }))
}

/// GET /api/v1/searches/export
pub async fn export_searches(State(state): State<Arc<AppState>>) -> CsvFile {
    let rows: Vec<HistoryRow> = state.history.list().iter().map(HistoryRow::from).collect();
    CsvFile::new(
        csv_export::history_filename(today()),
        csv_export::serialize(&rows, &csv_export::history_columns()),
    )
}

fn find_search(state: &AppState, id: &str) -> Result<SearchResult, AppError> {
    state
        .history
        .get_by_id(id)
        .ok_or_else(|| AppError::NotFound(format!("Search {} not found", id)))
}

/// GET /api/v1/searches/:id
pub async fn get_search(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SearchResult>, AppError> {
    find_search(&state, &id).map(Json)
}

/// DELETE /api/v1/searches/:id
///
/// Deleting an unknown id is not an error; the body reports `deleted: false`.
pub async fn delete_search(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let deleted = state.history.delete_by_id(&id);
    Json(json!({ "id": id, "deleted": deleted }))
}

/// POST /api/v1/searches/:id/rerun
pub async fn rerun_search(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SearchResult>, AppError> {
    let result = state.orchestrator.rerun(&id).await?;
    Ok(Json(result))
}

/// GET /api/v1/searches/:id/leads
pub async fn search_leads(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<LeadListQuery>,
) -> Result<Json<Paginated<Lead>>, AppError> {
    let search = find_search(&state, &id)?;
    let rendered = list_engine::render(&search.leads, &query.filter_spec()?, &query.sort_spec()?);
    Ok(Json(list_engine::paginate(rendered, query.page())))
}

/// GET /api/v1/searches/:id/leads/export
///
/// Exports every lead that passes the filters, in display order.
pub async fn export_search_leads(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<LeadListQuery>,
) -> Result<CsvFile, AppError> {
    let search = find_search(&state, &id)?;
    let rendered = list_engine::render(&search.leads, &query.filter_spec()?, &query.sort_spec()?);
    let content = csv_export::serialize(
        &rendered,
        &csv_export::result_columns(LeadColumnExtras::all()),
    );
    Ok(CsvFile::new(
        csv_export::leads_filename(&search.search_params.business_type, today()),
        content,
    ))
}

/// GET /api/v1/searches/:id/export
///
/// Exports the stored leads of a history entry as saved, without filters.
pub async fn export_search(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<CsvFile, AppError> {
    let search = find_search(&state, &id)?;
    Ok(CsvFile::new(
        csv_export::search_filename(&search.id, today()),
        csv_export::serialize(&search.leads, &csv_export::search_entry_columns()),
    ))
}

// ============ Leads ============

/// GET /api/v1/leads
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeadListQuery>,
) -> Result<Json<Paginated<LeadTableItem>>, AppError> {
    let leads = state.history.all_leads();
    let rendered = list_engine::render(&leads, &query.filter_spec()?, &query.sort_spec()?);
    Ok(Json(list_engine::paginate(rendered, query.page())))
}

/// GET /api/v1/leads/export
pub async fn export_leads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeadListQuery>,
) -> Result<CsvFile, AppError> {
    let leads = state.history.all_leads();
    let rendered = list_engine::render(&leads, &query.filter_spec()?, &query.sort_spec()?);
    let content = csv_export::serialize(&rendered, &csv_export::all_leads_columns());
    Ok(CsvFile::new(csv_export::all_leads_filename(today()), content))
}

/// Choices for the location and category filters, in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub locations: Vec<String>,
    pub categories: Vec<String>,
}

impl FilterOptions {
    fn collect<T: list_engine::ListItem>(items: &[T]) -> Self {
        Self {
            locations: list_engine::unique_locations(items),
            categories: list_engine::unique_categories(items),
        }
    }
}

/// GET /api/v1/searches/:id/filters
pub async fn search_filter_options(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FilterOptions>, AppError> {
    let search = find_search(&state, &id)?;
    Ok(Json(FilterOptions::collect(&search.leads)))
}

/// GET /api/v1/leads/filters
pub async fn lead_filter_options(State(state): State<Arc<AppState>>) -> Json<FilterOptions> {
    Json(FilterOptions::collect(&state.history.all_leads()))
}

/// GET /api/v1/leads/:id
///
/// Looks the lead up in history first, then in the search API.
///
/// # Returns
///
/// * `Result<Json<ExtendedLead>, AppError>` - The enriched lead, or 404.
pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ExtendedLead>, AppError> {
    let mut lead = state.history.find_lead(&id);
    if lead.is_none() {
        if let Some(ref client) = state.search_client {
            lead = client.get_lead(&id).await?;
        }
    }
    let lead = lead.ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))?;

    Ok(Json(cached_extend(&state.detail_cache, lead).await))
}

/// POST /api/v1/leads/:id/crm
///
/// Pushes the lead to the CRM (when a search API is configured) and flags
/// every stored copy as `isInZoho`.
pub async fn add_lead_to_crm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    match state.search_client {
        Some(ref client) => client.add_to_crm(&id).await?,
        None => {
            if state.history.find_lead(&id).is_none() {
                return Err(AppError::NotFound(format!("Lead {} not found", id)));
            }
        }
    }

    let updated = state.history.mark_in_crm(&id);
    tracing::info!("Lead {} added to CRM ({} stored copies updated)", id, updated);
    Ok(Json(json!({ "leadId": id, "isInZoho": true, "updated": updated })))
}

/// DELETE /api/v1/leads/:id/crm
///
/// Removes the lead from the CRM. The local `isInZoho` flag is left as is.
pub async fn remove_lead_from_crm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.require_client()?.remove_from_crm(&id).await?;
    Ok(Json(json!({ "leadId": id, "removed": true })))
}

// ============ Lookups ============

/// Serves `key` from the lookup cache, or fetches and caches it.
///
/// Cached entries carry a checksum; an entry that fails validation is
/// treated as a miss.
async fn cached_lookup<T, F, Fut>(
    cache: &Cache<String, String>,
    key: &str,
    fetch: F,
) -> Result<Vec<T>, AppError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, AppError>>,
{
    if let Some(cached) = cache.get(key).await {
        if let Some(values) = ValidatedSnapshot::decode::<Vec<T>>(&cached) {
            tracing::debug!("Lookup cache HIT (validated): {}", key);
            return Ok(values);
        }
        tracing::warn!("Cache validation failed for {}, refetching", key);
    }

    tracing::info!("Lookup cache MISS - fetching {}", key);
    let values = fetch().await?;
    if let Ok(entry) = ValidatedSnapshot::from_value(&values) {
        cache.insert(key.to_string(), entry.serialize()).await;
    }
    Ok(values)
}

/// GET /api/v1/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BusinessCategory>>, AppError> {
    let categories = match state.search_client {
        Some(ref client) => {
            cached_lookup(&state.lookup_cache, "categories", || client.list_categories()).await?
        }
        None => demo::categories(),
    };
    Ok(Json(categories))
}

/// GET /api/v1/locations
pub async fn list_locations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Location>>, AppError> {
    let locations = match state.search_client {
        Some(ref client) => {
            cached_lookup(&state.lookup_cache, "locations", || client.list_locations()).await?
        }
        None => demo::locations(),
    };
    Ok(Json(locations))
}

// ============ Remote read APIs ============

/// Query string of `GET /api/v1/remote/leads`. Category and location are
/// upstream ids.
#[derive(Debug, Default, Deserialize)]
pub struct RemoteLeadsQuery {
    pub query: Option<String>,
    pub lead_type: Option<String>,
    pub category_id: Option<String>,
    pub location_id: Option<String>,
    pub zoho: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl RemoteLeadsQuery {
    pub fn to_remote(&self) -> Result<RemoteLeadQuery, AppError> {
        let list = LeadListQuery {
            lead_type: self.lead_type.clone(),
            zoho: self.zoho.clone(),
            sort_by: self.sort_by.clone(),
            order: self.order.clone(),
            page: self.page,
            per_page: self.per_page,
            ..LeadListQuery::default()
        };
        let filter = list.filter_spec()?;
        let page = list.page();

        Ok(RemoteLeadQuery {
            words: non_blank(&self.query).map(str::to_string),
            lead_type: filter.lead_type,
            category_id: choice(&self.category_id).map(str::to_string),
            location_id: choice(&self.location_id).map(str::to_string),
            zoho: filter.zoho_status,
            sort_by: RemoteSort::from_sort(list.sort_spec()?),
            skip: page.skip(),
            limit: page.per_page,
        })
    }
}

/// GET /api/v1/remote/leads
pub async fn remote_leads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RemoteLeadsQuery>,
) -> Result<Json<Vec<LeadTableItem>>, AppError> {
    let remote_query = query.to_remote()?;
    let leads = state.require_client()?.list_leads(&remote_query).await?;
    Ok(Json(leads))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// GET /api/v1/remote/history
pub async fn remote_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<HistoryRow>>, AppError> {
    let page = Page::new(query.page.unwrap_or(1), query.per_page.unwrap_or(10));
    let rows = state
        .require_client()?
        .search_history(page.skip(), page.per_page)
        .await?;
    Ok(Json(rows))
}
