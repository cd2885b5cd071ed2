use async_trait::async_trait;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE } };
use serde::{ Deserialize, Serialize };
use std::time::Duration;
use super::{ SearchClient, SearchHit };
use crate::error::SearchError;

pub struct SerperClient {
    http: HttpClient,
    base_url: String,
}

#[derive(Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchHit>,
}

impl SerperClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, SearchError> {
        if api_key.trim().is_empty() {
            return Err(SearchError::MissingApiKey);
        }
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", HeaderValue::from_str(&api_key)?);

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { http, base_url })
    }
}

#[async_trait]
impl SearchClient for SerperClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let resp = self.http
            .post(&self.base_url)
            .json(&SerperRequest { q: query })
            .send().await?
            .error_for_status()?
            .json::<SerperResponse>().await?;
        Ok(resp.organic)
    }
}
