use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use super::token::{TokenError, TokenProvider};
use crate::models::Expense;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Connection failed")]
    Network(#[from] reqwest::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{}", describe_validation(.message, .field_errors))]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}

fn describe_validation(message: &str, field_errors: &HashMap<String, String>) -> String {
    if field_errors.is_empty() {
        return message.to_string();
    }
    let sorted: BTreeMap<_, _> = field_errors.iter().collect();
    let details: Vec<String> = sorted.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
    format!("{} ({})", message, details.join("; "))
}

/// Fields sent on create and update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseDraft {
    pub title: String,
    pub category: String,
    pub value: f64,
}

/// The five remote operations the client state container relies on
#[async_trait]
pub trait ExpenseApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Expense>, ClientError>;
    async fn get(&self, id: Uuid) -> Result<Expense, ClientError>;
    async fn create(&self, draft: &ExpenseDraft) -> Result<Expense, ClientError>;
    async fn update(&self, id: Uuid, draft: &ExpenseDraft) -> Result<Expense, ClientError>;
    async fn delete(&self, id: Uuid) -> Result<(), ClientError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    #[serde(default)]
    field_errors: HashMap<String, String>,
}

/// HTTP client for the expense API
#[derive(Clone)]
pub struct ExpenseClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenProvider>,
}

impl ExpenseClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenProvider>) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        // Keep any path prefix when joining relative routes
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            tokens,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let mut builder = self.http.request(method, self.url(path)?);
        if let Some(token) = self.tokens.token()? {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    /// GET /health; true when the server and its store answer
    pub async fn health(&self) -> Result<bool, ClientError> {
        let response = self
            .http
            .get(self.url("health")?)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

async fn read_data<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
    Ok(envelope.data)
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let bytes = response.bytes().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
    let message = body
        .error
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    Err(match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ClientError::Validation {
            message,
            field_errors: body.field_errors,
        },
        other => ClientError::Server {
            status: other.as_u16(),
            message,
        },
    })
}

#[async_trait]
impl ExpenseApi for ExpenseClient {
    async fn list(&self) -> Result<Vec<Expense>, ClientError> {
        let response = self.request(Method::GET, "api/expenses")?.send().await?;
        read_data(response).await
    }

    async fn get(&self, id: Uuid) -> Result<Expense, ClientError> {
        let response = self
            .request(Method::GET, &format!("api/expenses/{}", id))?
            .send()
            .await?;
        read_data(response).await
    }

    async fn create(&self, draft: &ExpenseDraft) -> Result<Expense, ClientError> {
        let response = self
            .request(Method::POST, "api/expenses")?
            .json(draft)
            .send()
            .await?;
        read_data(response).await
    }

    async fn update(&self, id: Uuid, draft: &ExpenseDraft) -> Result<Expense, ClientError> {
        let response = self
            .request(Method::PUT, &format!("api/expenses/{}", id))?
            .json(draft)
            .send()
            .await?;
        read_data(response).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &format!("api/expenses/{}", id))?
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
