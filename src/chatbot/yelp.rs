//! Yelp Fusion business search client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::chatbot::directory::{Business, DirectorySearch, Error};
use crate::chatbot::flow::SearchQuery;

const YELP_API_URL: &str = "https://api.yelp.com";

/// How many candidates to request. Only the first is shown.
const SEARCH_LIMIT: u32 = 5;

pub struct YelpClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    businesses: Vec<Business>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    description: String,
}

impl YelpClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, Error> {
        Self::with_base_url(api_key, YELP_API_URL.to_string(), timeout)
    }

    pub fn with_base_url(api_key: String, base_url: String, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl DirectorySearch for YelpClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Business>, Error> {
        info!("🔎 Searching \"{}\" near \"{}\"", query.term, query.location);

        let limit = SEARCH_LIMIT.to_string();
        let response = self
            .http
            .get(format!("{}/v3/businesses/search", self.base_url))
            .bearer_auth(&self.api_key)
            .query(&[
                ("term", query.term.as_str()),
                ("location", query.location.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("failed to read response: {e}")))?;

        debug!("Yelp response status: {status}");

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(parsed) => Error::Api(format!(
                    "{status}: {} {}",
                    parsed.error.code, parsed.error.description
                )),
                Err(_) => Error::Api(format!("{status}: {body}")),
            });
        }

        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| Error::Parse(e.to_string()))?;

        info!("🔎 {} result(s)", parsed.businesses.len());
        Ok(parsed.businesses)
    }
}
