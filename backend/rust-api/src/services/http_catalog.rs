use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::catalog::{CatalogError, QuizCatalog};
use crate::metrics::track_catalog_operation;
use crate::models::{Quiz, QuizDraft};
use crate::utils::retry::{retry_when, RetryConfig};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Quiz catalog served by another instance of the storage API
/// (`GET/POST {base}/results`, `GET/PUT {base}/results/{id}`).
pub struct HttpCatalog {
    http_client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn results_url(&self) -> String {
        format!("{}/results", self.base_url)
    }

    fn quiz_url(&self, id: i64) -> String {
        format!("{}/results/{}", self.base_url, id)
    }

    /// Reads are idempotent, so they get the retry budget.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, id: Option<i64>) -> Result<T, CatalogError> {
        retry_when(&self.retry, CatalogError::is_transient, || async {
            tracing::debug!("Fetching quiz catalog resource: {}", url);
            send(self.http_client.get(url), id).await
        })
        .await
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder, id: Option<i64>) -> Result<T, CatalogError> {
    let response = request
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await
        .map_err(|e| CatalogError::Unavailable(format!("catalog request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(map_status(status, id, error_text));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| CatalogError::Unavailable(format!("failed to parse catalog response: {}", e)))
}

fn map_status(status: StatusCode, id: Option<i64>, body: String) -> CatalogError {
    match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => CatalogError::NotFound(id),
        (StatusCode::CONFLICT, Some(id)) => CatalogError::Conflict(id),
        (StatusCode::UNPROCESSABLE_ENTITY, _) | (StatusCode::BAD_REQUEST, _) => {
            CatalogError::Invalid(body)
        }
        _ => CatalogError::Unavailable(format!("catalog returned {}: {}", status, body)),
    }
}

#[async_trait]
impl QuizCatalog for HttpCatalog {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, CatalogError> {
        let url = self.results_url();
        track_catalog_operation("list", self.get_json(&url, None)).await
    }

    async fn fetch_quiz(&self, id: i64) -> Result<Quiz, CatalogError> {
        let url = self.quiz_url(id);
        track_catalog_operation("fetch", self.get_json(&url, Some(id))).await
    }

    async fn create_quiz(&self, draft: QuizDraft) -> Result<Quiz, CatalogError> {
        let id = draft.id;
        let request = self.http_client.post(self.results_url()).json(&draft);
        track_catalog_operation("create", send(request, id)).await
    }

    async fn update_quiz(&self, id: i64, draft: QuizDraft) -> Result<Quiz, CatalogError> {
        let request = self.http_client.put(self.quiz_url(id)).json(&draft);
        track_catalog_operation("update", send(request, Some(id))).await
    }
}
