use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Backend, DataSource};
use crate::error::FetchError;

const PATH: &str = "/api/data";

/// One row of the market table, e.g. `{"name": "Market A", "value": "Up 2%"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketRow {
    pub name: String,
    pub value: String,
}

pub struct MarketDataSource {
    backend: Backend,
}

impl MarketDataSource {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn parse(body: &str) -> Result<Vec<MarketRow>, FetchError> {
        Ok(serde_json::from_str(body)?)
    }
}

#[async_trait]
impl DataSource for MarketDataSource {
    type Record = MarketRow;

    fn name(&self) -> &str {
        "market"
    }

    async fn fetch(&self) -> Result<Vec<MarketRow>, FetchError> {
        let body = self.backend.get_text(PATH).await?;
        Self::parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows() {
        let rows = MarketDataSource::parse(
            r#"[{"name": "Market A", "value": "Up 2%"}, {"name": "Market B", "value": "Down 1%"}]"#,
        )
        .unwrap();
        assert_eq!(
            rows,
            vec![
                MarketRow { name: "Market A".into(), value: "Up 2%".into() },
                MarketRow { name: "Market B".into(), value: "Down 1%".into() },
            ]
        );
    }

    #[test]
    fn row_missing_value_is_decode_error() {
        let err = MarketDataSource::parse(r#"[{"name": "Market A"}]"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
