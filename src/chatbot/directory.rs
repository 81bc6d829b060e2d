//! Capability seam to the business directory.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use crate::chatbot::flow::SearchQuery;
use crate::chatbot::message::Attachment;

/// One business listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Business {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_url: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

impl From<&Business> for Attachment {
    fn from(business: &Business) -> Self {
        Attachment {
            title: business.name.clone(),
            title_link: business.url.clone(),
            text: business.rating.to_string(),
            image_url: business.image_url.clone(),
        }
    }
}

/// Ranked business search, best match first.
#[async_trait]
pub trait DirectorySearch: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Business>, Error>;
}

#[derive(Debug)]
pub enum Error {
    Http(String),
    Api(String),
    Parse(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Api(e) => write!(f, "API error: {e}"),
            Error::Parse(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for Error {}
