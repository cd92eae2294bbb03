use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::common::http::{HttpClient, RetryPolicy};
use crate::configs::QinglongConfig;
use crate::error::ApiClientError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    data: Option<TokenData>,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    token: String,
}

#[derive(Debug, Deserialize)]
struct EnvListResponse {
    #[serde(default)]
    data: Vec<EnvItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Client for the Qinglong scheduler's open API. Tokens are short-lived
/// and fetched per operation, matching how the open API is meant to be
/// used by external pushers.
pub struct QinglongClient {
    http: HttpClient,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl QinglongClient {
    pub fn new(config: &QinglongConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: HttpClient::with_user_agent(RetryPolicy::default())?,
            base_url: config.url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }

    async fn token(&self) -> Result<String, ApiClientError> {
        let request = self
            .http
            .inner()
            .get(format!("{}/open/auth/token", self.base_url))
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ]);
        let response = self.http.execute(request).await?.error_for_status()?;
        let body: TokenResponse = response.json().await?;
        body.data
            .map(|d| d.token)
            .ok_or_else(|| ApiClientError::Malformed("token response carried no token".into()))
    }

    pub async fn search_envs(&self, name: &str) -> Result<Vec<EnvItem>, ApiClientError> {
        let token = self.token().await?;
        let request = self
            .http
            .inner()
            .get(format!("{}/open/envs", self.base_url))
            .bearer_auth(token)
            .query(&[("searchValue", name)]);
        let response = self.http.execute(request).await?.error_for_status()?;
        let body: EnvListResponse = response.json().await?;
        Ok(body.data)
    }

    pub async fn create_env(&self, name: &str, value: &str) -> Result<(), ApiClientError> {
        let token = self.token().await?;
        let request = self
            .http
            .inner()
            .post(format!("{}/open/envs", self.base_url))
            .bearer_auth(token)
            .json(&json!([{ "name": name, "value": value }]));
        self.http.execute(request).await?.error_for_status()?;
        debug!("created env {}", name);
        Ok(())
    }

    pub async fn update_env(&self, id: i64, name: &str, value: &str) -> Result<(), ApiClientError> {
        let token = self.token().await?;
        let request = self
            .http
            .inner()
            .put(format!("{}/open/envs", self.base_url))
            .bearer_auth(token)
            .json(&json!({ "id": id, "name": name, "value": value }));
        self.http.execute(request).await?.error_for_status()?;
        debug!("updated env {} (id {})", name, id);
        Ok(())
    }

    /// Create-or-replace: the first match by name is updated in place,
    /// otherwise a fresh variable is created.
    pub async fn upsert_env(&self, name: &str, value: &str) -> Result<(), ApiClientError> {
        let existing = self.search_envs(name).await?;
        match existing.first() {
            Some(env) => self.update_env(env.id, name, value).await?,
            None => self.create_env(name, value).await?,
        }
        info!("pushed credentials into env {}", name);
        Ok(())
    }
}
