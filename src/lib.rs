//! pollboard — a live terminal dashboard over a market-agent backend.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌────────────┐  fetch()  ┌──────────────┐  watch   ┌──────────┐  draw()  ┌──────────┐
//! │ source/    │ ◄──────── │ poll.rs      │ ───────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (HTTP)     │           │ PollingStore │ Snapshot │ (panels) │          │ (render) │
//! └────────────┘           └──────────────┘          └──────────┘          └──────────┘
//!                                                         ▲
//!                                                         │ handle_key_event()
//!                                                    ┌──────────┐
//!                                                    │ input.rs │
//!                                                    └──────────┘
//! ```
//!
//! * **`poll`** — the generic [`PollingStore`](poll::PollingStore): interval
//!   loop, merge policy, fetch state, stale-response handling.
//! * **`source/`** — the [`DataSource`](source::DataSource) trait and the
//!   backend feeds (headlines, agent status, market data).
//! * **`config`** — TOML configuration for the backend and each panel.
//! * **`app`** — per-panel state pulled from store snapshots.
//! * **`ui`** — pure rendering: reads `App` state and draws widgets.
//! * **`input`** — maps key events to `App` mutations and commands.

pub mod app;
pub mod config;
pub mod error;
pub mod input;
pub mod poll;
pub mod source;
pub mod ui;
