//! Runs searches and records their outcome.
//!
//! This is the only component that performs search I/O. A search either
//! completes and is saved to history, or fails and leaves history untouched.

use crate::adapter::RemoteSearchRequest;
use crate::circuit_breaker::{create_search_circuit_breaker, SearchCircuitBreaker};
use crate::demo;
use crate::errors::{AppError, ResultExt};
use crate::history_store::HistoryStore;
use crate::models::{Lead, SearchParams, SearchResult};
use crate::search_client::SearchApiClient;
use failsafe::futures::CircuitBreaker;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Upper bound on `numberOfBusinesses`; larger requests are clamped.
pub const MAX_BUSINESSES: u32 = 500;

/// Where leads come from.
#[derive(Clone)]
pub enum SearchBackend {
    /// The external search API.
    Remote(SearchApiClient),
    /// The built-in deterministic generator.
    Demo,
}

pub struct SearchOrchestrator {
    backend: SearchBackend,
    history: Arc<HistoryStore>,
    /// Ticket of the most recently started search.
    latest: AtomicU64,
    breaker: SearchCircuitBreaker,
}

impl SearchOrchestrator {
    pub fn new(backend: SearchBackend, history: Arc<HistoryStore>) -> Self {
        Self {
            backend,
            history,
            latest: AtomicU64::new(0),
            breaker: create_search_circuit_breaker(),
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self.backend, SearchBackend::Demo)
    }

    /// Executes a search and saves it to history.
    ///
    /// # Errors
    ///
    /// * `BadRequest` - invalid parameters.
    /// * `ExternalApiError` / `Unauthorized` - the search API failed.
    /// * `Superseded` - a newer search started before this one finished;
    ///   the result was discarded.
    pub async fn execute(&self, params: SearchParams) -> Result<SearchResult, AppError> {
        let params = validate(params)?;
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(
            "Search #{} started: {} in {:?} (max {})",
            ticket,
            params.business_type,
            params.locations,
            params.number_of_businesses
        );

        let leads = match self.backend {
            SearchBackend::Remote(ref client) => self
                .fetch_remote(client, &params)
                .await
                .with_context(|| format!("search #{}", ticket))?,
            SearchBackend::Demo => demo::generate_leads(&params),
        };

        let latest = self.latest.load(Ordering::SeqCst);
        if latest != ticket {
            tracing::warn!(
                "Search #{} finished after newer search #{} started, discarding {} leads",
                ticket,
                latest,
                leads.len()
            );
            return Err(AppError::Superseded(format!(
                "search #{} was superseded by search #{}",
                ticket, latest
            )));
        }

        let analytics = wants_analytics(&params).then(|| demo::derive_analytics(&params));
        let result = self.history.save(params, leads, analytics);
        tracing::info!(
            "Search #{} completed as {} (#{})",
            ticket,
            result.id,
            result.short_id()
        );
        Ok(result)
    }

    /// Runs the stored parameters of history entry `id` as a new search.
    pub async fn rerun(&self, id: &str) -> Result<SearchResult, AppError> {
        let entry = self
            .history
            .get_by_id(id)
            .ok_or_else(|| AppError::NotFound(format!("search {}", id)))?;
        tracing::info!("Re-running search {}", id);
        self.execute(entry.search_params).await
    }

    /// One request per location, in order. Results are concatenated,
    /// de-duplicated by lead id and cut to the requested count. Any failed
    /// request fails the whole search.
    async fn fetch_remote(
        &self,
        client: &SearchApiClient,
        params: &SearchParams,
    ) -> Result<Vec<Lead>, AppError> {
        let mut seen = HashSet::new();
        let mut leads = Vec::new();

        for location_id in &params.locations {
            let request = RemoteSearchRequest::for_location(params, location_id);
            let batch = self
                .breaker
                .call(client.execute_search(&request))
                .await
                .map_err(|e| match e {
                    failsafe::Error::Inner(inner) => inner,
                    failsafe::Error::Rejected => AppError::ExternalApiError(
                        "Search API circuit breaker is open, rejecting request".to_string(),
                    ),
                })?;

            leads.extend(batch.into_iter().filter(|l| seen.insert(l.id.clone())));
        }

        leads.truncate(params.number_of_businesses as usize);
        Ok(leads)
    }
}

fn wants_analytics(params: &SearchParams) -> bool {
    params.include_trend_analysis || params.include_competitor_analysis
}

/// Checks and normalizes search parameters.
pub fn validate(mut params: SearchParams) -> Result<SearchParams, AppError> {
    params.business_type = params.business_type.trim().to_string();
    if params.business_type.is_empty() {
        return Err(AppError::BadRequest("businessType is required".to_string()));
    }

    params.locations.retain(|l| !l.trim().is_empty());
    if params.locations.is_empty() {
        return Err(AppError::BadRequest(
            "at least one location is required".to_string(),
        ));
    }

    if params.number_of_businesses == 0 {
        return Err(AppError::BadRequest(
            "numberOfBusinesses must be at least 1".to_string(),
        ));
    }
    if params.number_of_businesses > MAX_BUSINESSES {
        tracing::warn!(
            "numberOfBusinesses {} exceeds {}, clamping",
            params.number_of_businesses,
            MAX_BUSINESSES
        );
        params.number_of_businesses = MAX_BUSINESSES;
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SearchParams {
        SearchParams {
            business_type: "bakery".to_string(),
            locations: vec!["atlanta".to_string()],
            number_of_businesses: 50,
            include_google_search: true,
            custom_search_query: None,
            include_competitor_analysis: false,
            include_trend_analysis: true,
        }
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let mut p = params();
        p.business_type = "  ".to_string();
        assert!(matches!(validate(p), Err(AppError::BadRequest(_))));

        let mut p = params();
        p.locations = vec!["".to_string()];
        assert!(matches!(validate(p), Err(AppError::BadRequest(_))));

        let mut p = params();
        p.number_of_businesses = 0;
        assert!(matches!(validate(p), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn validate_clamps_large_counts() {
        let mut p = params();
        p.number_of_businesses = 10_000;
        assert_eq!(validate(p).unwrap().number_of_businesses, MAX_BUSINESSES);
    }

    #[tokio::test]
    async fn demo_search_is_saved_with_analytics() {
        let history = Arc::new(HistoryStore::new(50));
        let orchestrator = SearchOrchestrator::new(SearchBackend::Demo, history.clone());

        let result = orchestrator.execute(params()).await.unwrap();

        assert_eq!(result.total_leads, 2);
        assert!(result.trend_data.is_some());
        assert!(result.competitor_analysis.is_none());
        assert_eq!(history.list()[0].id, result.id);
    }

    #[tokio::test]
    async fn invalid_search_is_not_saved() {
        let history = Arc::new(HistoryStore::new(50));
        let orchestrator = SearchOrchestrator::new(SearchBackend::Demo, history.clone());
        let mut p = params();
        p.locations.clear();

        assert!(orchestrator.execute(p).await.is_err());
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn rerun_creates_a_new_entry() {
        let history = Arc::new(HistoryStore::new(50));
        let orchestrator = SearchOrchestrator::new(SearchBackend::Demo, history.clone());
        let first = orchestrator.execute(params()).await.unwrap();

        let second = orchestrator.rerun(&first.id).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.search_params, second.search_params);
        assert_eq!(history.len(), 2);
        assert!(matches!(
            orchestrator.rerun("search_missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
