use crate::adapter::{
    ListEnvelope, RemoteCategory, RemoteHistoryRow, RemoteLead, RemoteLeadQuery, RemoteLocation,
    RemoteSearchRequest,
};
use crate::config::Config;
use crate::csv_export::HistoryRow;
use crate::errors::AppError;
use crate::models::{BusinessCategory, Lead, LeadTableItem, Location};
use chrono::Utc;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Client for the external lead-search backend.
#[derive(Clone)]
pub struct SearchApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl SearchApiClient {
    /// Creates a new `SearchApiClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the search API, without a trailing slash.
    /// * `token` - Optional bearer token.
    /// * `timeout` - Per-request timeout.
    pub fn new(base_url: String, token: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create search API client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Builds a client from configuration. Returns `None` in demo mode.
    pub fn from_config(config: &Config) -> Result<Option<Self>, AppError> {
        config
            .search_api_url
            .clone()
            .map(|url| {
                Self::new(
                    url,
                    config.search_api_token.clone(),
                    Duration::from_secs(config.search_api_timeout_secs),
                )
            })
            .transpose()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Sends `request` and turns non-2xx statuses into errors.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, AppError> {
        let response = self.send_raw(request, what).await?;
        Self::check(response, what).await
    }

    async fn send_raw(&self, request: RequestBuilder, what: &str) -> Result<Response, AppError> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("{} request failed: {}", what, e)))
    }

    /// Passes 2xx responses through. A 401 becomes `Unauthorized`, any other
    /// status an `ExternalApiError` carrying the body.
    async fn check(response: Response, what: &str) -> Result<Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized(format!("{} returned 401: {}", what, error_text)));
        }
        Err(AppError::ExternalApiError(format!(
            "{} returned {}: {}",
            what, status, error_text
        )))
    }

    async fn parse<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, AppError> {
        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse {} response: {}", what, e))
        })
    }

    /// Runs a search for one location.
    ///
    /// # Returns
    ///
    /// * `Result<Vec<Lead>, AppError>` - Leads in the order the backend returned them.
    pub async fn execute_search(&self, request: &RemoteSearchRequest) -> Result<Vec<Lead>, AppError> {
        let url = format!("{}/search/execute", self.base_url);
        tracing::info!(
            "Executing search '{}' in location {} (max {})",
            request.query,
            request.location_id,
            request.max_results
        );

        let response = self
            .send(self.client.post(&url).json(request), "Search execution")
            .await?;
        let leads: ListEnvelope<RemoteLead> = Self::parse(response, "search execution").await?;
        let leads: Vec<Lead> = leads.into_vec().into_iter().map(RemoteLead::into_lead).collect();

        tracing::info!("✓ Search returned {} leads", leads.len());
        Ok(leads)
    }

    pub async fn list_categories(&self) -> Result<Vec<BusinessCategory>, AppError> {
        let url = format!("{}/business-categories", self.base_url);
        tracing::debug!("Fetching business categories: {}", url);

        let response = self
            .send(self.client.get(&url).query(&[("limit", "1000")]), "Category list")
            .await?;
        let categories: ListEnvelope<RemoteCategory> = Self::parse(response, "category list").await?;
        Ok(categories.into_vec().into_iter().map(Into::into).collect())
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>, AppError> {
        let url = format!("{}/locations", self.base_url);
        tracing::debug!("Fetching locations: {}", url);

        let response = self
            .send(self.client.get(&url).query(&[("limit", "10000")]), "Location list")
            .await?;
        let locations: ListEnvelope<RemoteLocation> = Self::parse(response, "location list").await?;
        Ok(locations.into_vec().into_iter().map(Into::into).collect())
    }

    /// Lists stored leads with server-side filtering, sorting and paging.
    pub async fn list_leads(&self, query: &RemoteLeadQuery) -> Result<Vec<LeadTableItem>, AppError> {
        let url = format!("{}/search-results", self.base_url);
        tracing::info!("Listing remote leads: {:?}", query);

        let response = self
            .send(self.client.get(&url).query(&query.to_pairs()), "Lead list")
            .await?;
        let leads: ListEnvelope<RemoteLead> = Self::parse(response, "lead list").await?;
        let now = Utc::now();
        Ok(leads
            .into_vec()
            .into_iter()
            .map(|l| l.into_table_item(now))
            .collect())
    }

    /// Fetches a single lead. A 404 is reported as `Ok(None)`.
    pub async fn get_lead(&self, lead_id: &str) -> Result<Option<Lead>, AppError> {
        let url = format!("{}/search-results/{}", self.base_url, lead_id);
        tracing::info!("Fetching lead {} from search API: {}", lead_id, url);

        let response = self.send_raw(self.client.get(&url), "Lead lookup").await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Lead {} not found upstream", lead_id);
            return Ok(None);
        }
        let response = Self::check(response, "Lead lookup").await?;

        let lead: RemoteLead = Self::parse(response, "lead").await?;
        Ok(Some(lead.into_lead()))
    }

    /// One page of the backend's own search history.
    pub async fn search_history(&self, skip: usize, limit: usize) -> Result<Vec<HistoryRow>, AppError> {
        let url = format!("{}/search/params", self.base_url);
        tracing::debug!("Fetching remote search history skip={} limit={}", skip, limit);

        let response = self
            .send(
                self.client
                    .get(&url)
                    .query(&[("skip", skip.to_string()), ("limit", limit.to_string())]),
                "Search history",
            )
            .await?;
        let rows: ListEnvelope<RemoteHistoryRow> = Self::parse(response, "search history").await?;
        Ok(rows.into_vec().into_iter().map(Into::into).collect())
    }

    /// Pushes a lead to the CRM.
    pub async fn add_to_crm(&self, lead_id: &str) -> Result<(), AppError> {
        let url = format!("{}/leads/{}/export-zoho", self.base_url, lead_id);
        tracing::info!("Adding lead {} to CRM", lead_id);

        self.send(self.client.post(&url), "CRM export").await?;

        tracing::info!("✓ Lead {} added to CRM", lead_id);
        Ok(())
    }

    /// Removes a lead from the CRM.
    pub async fn remove_from_crm(&self, lead_id: &str) -> Result<(), AppError> {
        let url = format!("{}/leads/{}/export-zoho", self.base_url, lead_id);
        tracing::info!("Removing lead {} from CRM", lead_id);

        self.send(self.client.delete(&url), "CRM removal").await?;

        tracing::info!("✓ Lead {} removed from CRM", lead_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = SearchApiClient::new(
            "https://example.com/".to_string(),
            Some("token".to_string()),
            Duration::from_secs(30),
        );
        assert_eq!(client.unwrap().base_url(), "https://example.com");
    }

    #[test]
    fn test_demo_mode_has_no_client() {
        let client = SearchApiClient::from_config(&Config::default()).unwrap();
        assert!(client.is_none());
    }
}
