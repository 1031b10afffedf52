//! Application state.
//!
//! [`App`] holds one [`Panel`] per feed.  A panel never talks to the network:
//! it only reads the latest [`Snapshot`] its store published and tracks the
//! user's selection.  Rendering lives in [`crate::ui`].

use tokio::sync::watch;

use crate::poll::Snapshot;
use crate::source::{AgentStatus, Headline, MarketRow};

/// Which panel receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Headlines,
    Agent,
    Market,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Headlines => Focus::Agent,
            Focus::Agent => Focus::Market,
            Focus::Market => Focus::Headlines,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Focus::Headlines => Focus::Market,
            Focus::Agent => Focus::Headlines,
            Focus::Market => Focus::Agent,
        }
    }
}

/// Results of one-shot backend actions, sent back to the UI thread.
pub enum ActionMsg {
    AgentStarted { headline: String },
    ProcessingStarted { url: String },
    Failed(String),
}

/// Selection movement, shared by every panel regardless of record type.
pub trait Navigate {
    fn select_next(&mut self);
    fn select_previous(&mut self);
    fn select_first(&mut self);
    fn select_last(&mut self);
}

/// A live view over one store.
pub struct Panel<T> {
    pub title: &'static str,
    rx: watch::Receiver<Snapshot<T>>,
    /// Copy of the last snapshot pulled from the store.
    pub snapshot: Snapshot<T>,
    pub selected: Option<usize>,
}

impl<T: Clone> Panel<T> {
    pub fn new(title: &'static str, rx: watch::Receiver<Snapshot<T>>) -> Self {
        let snapshot = rx.borrow().clone();
        Self {
            title,
            rx,
            snapshot,
            selected: None,
        }
    }

    /// Pull the store's latest snapshot.  Returns whether anything changed.
    pub fn sync(&mut self) -> bool {
        if !self.rx.has_changed().unwrap_or(false) {
            return false;
        }
        self.snapshot = self.rx.borrow_and_update().clone();

        // A replace can shrink the list under the cursor.
        let len = self.snapshot.records.len();
        self.selected = match self.selected {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => None,
        };
        true
    }

    pub fn records(&self) -> &[T] {
        &self.snapshot.records
    }

    pub fn selected_record(&self) -> Option<&T> {
        self.selected.and_then(|i| self.snapshot.records.get(i))
    }
}

impl<T> Navigate for Panel<T> {
    fn select_next(&mut self) {
        let len = self.snapshot.records.len();
        if len == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        });
    }

    fn select_previous(&mut self) {
        if self.snapshot.records.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => i.saturating_sub(1),
            None => 0,
        });
    }

    fn select_first(&mut self) {
        if !self.snapshot.records.is_empty() {
            self.selected = Some(0);
        }
    }

    fn select_last(&mut self) {
        let len = self.snapshot.records.len();
        if len > 0 {
            self.selected = Some(len - 1);
        }
    }
}

pub struct App {
    pub headlines: Panel<Headline>,
    pub agent: Panel<AgentStatus>,
    pub market: Panel<MarketRow>,
    pub focus: Focus,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last action message.
    pub status: String,
}

impl App {
    pub fn new(
        headlines: watch::Receiver<Snapshot<Headline>>,
        agent: watch::Receiver<Snapshot<AgentStatus>>,
        market: watch::Receiver<Snapshot<MarketRow>>,
    ) -> Self {
        Self {
            headlines: Panel::new("Headlines", headlines),
            agent: Panel::new("Agent", agent),
            market: Panel::new("Market data", market),
            focus: Focus::Headlines,
            quit: false,
            status: "Starting…".into(),
        }
    }

    /// Refresh every panel from its store.
    pub fn sync(&mut self) {
        self.headlines.sync();
        self.agent.sync();
        self.market.sync();
    }

    pub fn focused_mut(&mut self) -> &mut dyn Navigate {
        match self.focus {
            Focus::Headlines => &mut self.headlines,
            Focus::Agent => &mut self.agent,
            Focus::Market => &mut self.market,
        }
    }

    pub fn apply_action(&mut self, msg: ActionMsg) {
        self.status = match msg {
            ActionMsg::AgentStarted { headline } => format!("Agent started: {headline}"),
            ActionMsg::ProcessingStarted { url } => format!("Processing {url}"),
            ActionMsg::Failed(e) => format!("Error: {e}"),
        };
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::poll::FetchState;

    pub(crate) fn snapshot<T>(records: Vec<T>) -> Snapshot<T> {
        Snapshot {
            records,
            state: FetchState::Ready,
            updated_at: None,
            generation: 1,
        }
    }

    pub(crate) fn headlines(titles: &[&str]) -> Vec<Headline> {
        titles.iter().map(|t| Headline(t.to_string())).collect()
    }

    fn panel(titles: &[&str]) -> (watch::Sender<Snapshot<Headline>>, Panel<Headline>) {
        let (tx, rx) = watch::channel(snapshot(headlines(titles)));
        (tx, Panel::new("test", rx))
    }

    // -- syncing -------------------------------------------------------------

    #[test]
    fn new_panel_starts_from_current_snapshot() {
        let (_tx, panel) = panel(&["a", "b"]);
        assert_eq!(panel.records().len(), 2);
        assert!(panel.selected.is_none());
    }

    #[test]
    fn sync_pulls_new_snapshot_once() {
        let (tx, mut panel) = panel(&[]);
        assert!(!panel.sync());

        tx.send(snapshot(headlines(&["x"]))).unwrap();
        assert!(panel.sync());
        assert_eq!(panel.records()[0].as_str(), "x");
        assert!(!panel.sync());
    }

    #[test]
    fn sync_clamps_selection_when_list_shrinks() {
        let (tx, mut panel) = panel(&["a", "b", "c"]);
        panel.select_last();

        tx.send(snapshot(headlines(&["z"]))).unwrap();
        panel.sync();
        assert_eq!(panel.selected, Some(0));

        tx.send(snapshot(Vec::new())).unwrap();
        panel.sync();
        assert!(panel.selected.is_none());
    }

    #[test]
    fn sync_after_store_dropped_is_noop() {
        let (tx, mut panel) = panel(&["a"]);
        drop(tx);
        assert!(!panel.sync());
        assert_eq!(panel.records().len(), 1);
    }

    // -- navigation ----------------------------------------------------------

    #[test]
    fn navigation_on_empty_is_noop() {
        let (_tx, mut panel) = panel(&[]);
        panel.select_next();
        panel.select_previous();
        panel.select_first();
        panel.select_last();
        assert!(panel.selected.is_none());
    }

    #[test]
    fn select_next_starts_at_zero_then_clamps() {
        let (_tx, mut panel) = panel(&["a", "b", "c"]);
        panel.select_next();
        assert_eq!(panel.selected, Some(0));
        panel.select_next();
        panel.select_next();
        panel.select_next();
        assert_eq!(panel.selected, Some(2));
    }

    #[test]
    fn select_previous_clamps_at_zero() {
        let (_tx, mut panel) = panel(&["a", "b", "c"]);
        panel.select_last();
        panel.select_previous();
        assert_eq!(panel.selected, Some(1));
        panel.select_first();
        panel.select_previous();
        assert_eq!(panel.selected, Some(0));
    }

    #[test]
    fn selected_record_follows_cursor() {
        let (_tx, mut panel) = panel(&["a", "b"]);
        assert!(panel.selected_record().is_none());
        panel.select_last();
        assert_eq!(panel.selected_record().map(Headline::as_str), Some("b"));
    }

    // -- app -----------------------------------------------------------------

    #[test]
    fn focus_cycles_both_ways() {
        assert_eq!(Focus::Headlines.next(), Focus::Agent);
        assert_eq!(Focus::Market.next(), Focus::Headlines);
        assert_eq!(Focus::Headlines.previous(), Focus::Market);
        assert_eq!(Focus::Agent.previous().next(), Focus::Agent);
    }

    #[test]
    fn focused_panel_receives_navigation() {
        let (_h, h_rx) = watch::channel(snapshot(headlines(&["a", "b"])));
        let (_a, a_rx) = watch::channel(Snapshot::default());
        let (_m, m_rx) = watch::channel(snapshot(vec![MarketRow {
            name: "Market A".into(),
            value: "Up 2%".into(),
        }]));
        let mut app = App::new(h_rx, a_rx, m_rx);

        app.focus = Focus::Market;
        app.focused_mut().select_last();
        assert_eq!(app.market.selected, Some(0));
        assert!(app.headlines.selected.is_none());
    }

    #[test]
    fn apply_action_sets_status() {
        let (_h, h_rx) = watch::channel(Snapshot::default());
        let (_a, a_rx) = watch::channel(Snapshot::default());
        let (_m, m_rx) = watch::channel(Snapshot::default());
        let mut app = App::new(h_rx, a_rx, m_rx);

        app.apply_action(ActionMsg::AgentStarted {
            headline: "Fed holds".into(),
        });
        assert_eq!(app.status, "Agent started: Fed holds");

        app.apply_action(ActionMsg::Failed("HTTP 400: busy".into()));
        assert_eq!(app.status, "Error: HTTP 400: busy");
    }
}
