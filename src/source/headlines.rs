//! Headlines generated by the backend from the live stream.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Backend, DataSource};
use crate::error::FetchError;

const PATH: &str = "/get_headlines";

/// One headline; the backend sends them as a bare JSON array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headline(pub String);

impl Headline {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub struct HeadlinesSource {
    backend: Backend,
}

impl HeadlinesSource {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Parse a `/get_headlines` body.  Pure, so tests need no network.
    pub fn parse(body: &str) -> Result<Vec<Headline>, FetchError> {
        Ok(serde_json::from_str(body)?)
    }
}

#[async_trait]
impl DataSource for HeadlinesSource {
    type Record = Headline;

    fn name(&self) -> &str {
        "headlines"
    }

    async fn fetch(&self) -> Result<Vec<Headline>, FetchError> {
        let body = self.backend.get_text(PATH).await?;
        Self::parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_array() {
        let items = HeadlinesSource::parse(r#"["Fed holds rates", "BTC tops 100k"]"#).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_str(), "Fed holds rates");
        assert_eq!(items[1], Headline("BTC tops 100k".into()));
    }

    #[test]
    fn empty_array_is_empty_batch() {
        assert!(HeadlinesSource::parse("[]").unwrap().is_empty());
    }

    #[test]
    fn object_body_is_decode_error() {
        let err = HeadlinesSource::parse(r#"{"error": "nope"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
