use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::Result;

pub const AUTH_ENDPOINT: &str = "https://auth.atlassian.com";
pub const API_ENDPOINT: &str = "https://api.atlassian.com";

/// Base URLs of the authorization server and the REST gateway.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub auth: String,
    pub api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth: AUTH_ENDPOINT.to_string(),
            api: API_ENDPOINT.to_string(),
        }
    }
}

impl Endpoints {
    pub fn authorize_url(&self) -> String {
        format!("{}/authorize", self.auth.trim_end_matches('/'))
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.auth.trim_end_matches('/'))
    }

    pub fn accessible_resources_url(&self) -> String {
        format!(
            "{}/oauth/token/accessible-resources",
            self.api.trim_end_matches('/')
        )
    }

    pub fn search_url(&self, cloud_id: &str) -> String {
        format!(
            "{}/ex/jira/{cloud_id}/rest/api/3/search",
            self.api.trim_end_matches('/')
        )
    }
}

/// Bearer-authenticated client for the Jira Cloud REST gateway.
pub struct JiraClient {
    http: Client,
    access_token: String,
    endpoints: Endpoints,
}

impl JiraClient {
    pub fn new(access_token: String, endpoints: Endpoints) -> Self {
        Self {
            http: Client::new(),
            access_token,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// GET with bearer auth. Status handling is left to the caller.
    pub async fn get(&self, url: &str) -> Result<Response> {
        debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
            .send()
            .await?;
        Ok(response)
    }

    /// POST a JSON body with bearer auth. Status handling is left to the caller.
    pub async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<Response> {
        debug!("POST {url}");
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;
        Ok(response)
    }
}

/// Read a response body, falling back to a placeholder when it can't be read.
pub async fn body_text(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read response body>".to_string())
}

pub async fn json_body<T: DeserializeOwned>(response: Response) -> Result<T> {
    Ok(response.json().await?)
}
