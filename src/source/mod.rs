//! Data source abstraction layer.
//!
//! This module defines the [`DataSource`] trait, which is the fetch function
//! a [`PollingStore`](crate::poll::PollingStore) is built around, and the
//! HTTP sources for the three backend feeds.  They share one [`Backend`]
//! client.
//!
//! ## For contributors — adding a new feed
//!
//! 1. Create a new file in this directory (e.g. `portfolio.rs`).
//! 2. Define the record type and a source struct holding a [`Backend`].
//! 3. Keep parsing in a pure `parse` function so it can be tested offline.
//! 4. Implement [`DataSource`] and re-export both types below.
//! 5. Build a store for it in `main.rs` and give it a panel.

mod agent;
mod backend;
mod headlines;
mod market;

pub use agent::{AgentStatus, AgentStatusSource};
pub use backend::Backend;
pub use headlines::{Headline, HeadlinesSource};
pub use market::{MarketDataSource, MarketRow};

use async_trait::async_trait;

use crate::error::FetchError;

/// Trait that every data source must implement.
///
/// The polling store calls [`fetch()`](DataSource::fetch) from its own tokio
/// tasks, possibly several at once, so implementations must be
/// [`Send`] + [`Sync`].
///
/// ```ignore
/// pub struct MySource { backend: Backend }
///
/// #[async_trait]
/// impl DataSource for MySource {
///     type Record = MyRow;
///
///     fn name(&self) -> &str { "my-source" }
///
///     async fn fetch(&self) -> Result<Vec<MyRow>, FetchError> {
///         let body = self.backend.get_text("/my_rows").await?;
///         Ok(serde_json::from_str(&body)?)
///     }
/// }
/// ```
#[async_trait]
pub trait DataSource: Send + Sync {
    type Record: Send + 'static;

    /// Label used in logs and panel titles.
    fn name(&self) -> &str;

    /// Fetch the latest batch of records.
    async fn fetch(&self) -> Result<Vec<Self::Record>, FetchError>;

    /// Filter a batch the store is about to append after `held`.
    ///
    /// Runs only for completions that passed the stale check, so it sees
    /// exactly the records subscribers see.  The default keeps every record.
    fn dedupe_appended(
        &self,
        _held: &[Self::Record],
        batch: Vec<Self::Record>,
    ) -> Vec<Self::Record> {
        batch
    }
}
