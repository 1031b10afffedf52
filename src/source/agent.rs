//! Research agent progress.
//!
//! `/agent_status` returns a single object.  The dashboard keeps it as a log
//! (append policy), so a status is only appended when it differs from the
//! last one already in the log.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Backend, DataSource};
use crate::error::FetchError;

const PATH: &str = "/agent_status";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatus {
    #[serde(default = "default_state")]
    pub state: String,
    pub progress: String,
    #[serde(default)]
    pub final_response: Option<Value>,
}

fn default_state() -> String {
    "idle".to_string()
}

pub struct AgentStatusSource {
    backend: Backend,
}

impl AgentStatusSource {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn parse(body: &str) -> Result<AgentStatus, FetchError> {
        Ok(serde_json::from_str(body)?)
    }
}

#[async_trait]
impl DataSource for AgentStatusSource {
    type Record = AgentStatus;

    fn name(&self) -> &str {
        "agent"
    }

    async fn fetch(&self) -> Result<Vec<AgentStatus>, FetchError> {
        let body = self.backend.get_text(PATH).await?;
        Ok(vec![Self::parse(&body)?])
    }

    /// Drop statuses equal to the one logged just before them.
    fn dedupe_appended(&self, held: &[AgentStatus], batch: Vec<AgentStatus>) -> Vec<AgentStatus> {
        let mut last = held.last().cloned();
        batch
            .into_iter()
            .filter(|status| {
                if last.as_ref() == Some(status) {
                    return false;
                }
                last = Some(status.clone());
                true
            })
            .collect()
    }
}
