//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] mutations.  Keys that need the
//! network (refresh, start agent) are returned as a [`Command`] for the main
//! loop to carry out, since the app state has no access to the stores.
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on [`App`] or a [`Command`] variant for the action.
//! 2. Add a `KeyCode` match arm in [`handle_key_event`].
//! 3. Update the help text in the status bar (`ui::draw_status_bar`).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::{App, Focus};

/// Work the main loop must do on behalf of a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch the given panel's feed now.
    Refresh(Focus),
    /// `POST /start_agent` for this headline.
    StartAgent(String),
}

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.previous(),
        KeyCode::Down | KeyCode::Char('j') => app.focused_mut().select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.focused_mut().select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.focused_mut().select_first(),
        KeyCode::End | KeyCode::Char('G') => app.focused_mut().select_last(),
        KeyCode::Char('r') => return Some(Command::Refresh(app.focus)),
        KeyCode::Enter if app.focus == Focus::Headlines => {
            return app
                .headlines
                .selected_record()
                .map(|h| Command::StartAgent(h.as_str().to_string()));
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{headlines, snapshot};
    use crate::app::Navigate;
    use crate::poll::Snapshot;
    use crossterm::event::{KeyEventState, KeyModifiers};
    use tokio::sync::watch;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(titles: &[&str]) -> App {
        // Dropped senders are fine: panels keep their initial snapshot.
        let (_h, h_rx) = watch::channel(snapshot(headlines(titles)));
        let (_a, a_rx) = watch::channel(Snapshot::default());
        let (_m, m_rx) = watch::channel(Snapshot::default());
        App::new(h_rx, a_rx, m_rx)
    }

    #[test]
    fn q_and_esc_quit() {
        let mut a = app(&[]);
        handle_key_event(&mut a, press(KeyCode::Char('q')));
        assert!(a.quit);

        let mut a = app(&[]);
        handle_key_event(&mut a, press(KeyCode::Esc));
        assert!(a.quit);
    }

    #[test]
    fn release_events_are_ignored() {
        let mut a = app(&[]);
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert!(handle_key_event(&mut a, release).is_none());
        assert!(!a.quit);
    }

    #[test]
    fn tab_moves_focus() {
        let mut a = app(&[]);
        handle_key_event(&mut a, press(KeyCode::Tab));
        assert_eq!(a.focus, Focus::Agent);
        handle_key_event(&mut a, press(KeyCode::BackTab));
        assert_eq!(a.focus, Focus::Headlines);
    }

    #[test]
    fn j_moves_selection_in_focused_panel() {
        let mut a = app(&["a", "b"]);
        handle_key_event(&mut a, press(KeyCode::Char('j')));
        handle_key_event(&mut a, press(KeyCode::Char('j')));
        assert_eq!(a.headlines.selected, Some(1));
    }

    #[test]
    fn r_requests_refresh_of_focused_panel() {
        let mut a = app(&[]);
        a.focus = Focus::Market;
        assert_eq!(
            handle_key_event(&mut a, press(KeyCode::Char('r'))),
            Some(Command::Refresh(Focus::Market))
        );
    }

    #[test]
    fn enter_starts_agent_for_selected_headline() {
        let mut a = app(&["Fed holds rates", "BTC tops 100k"]);
        assert!(handle_key_event(&mut a, press(KeyCode::Enter)).is_none());

        handle_key_event(&mut a, press(KeyCode::End));
        assert_eq!(
            handle_key_event(&mut a, press(KeyCode::Enter)),
            Some(Command::StartAgent("BTC tops 100k".into()))
        );
    }

    #[test]
    fn enter_outside_headlines_does_nothing() {
        let mut a = app(&["Fed holds rates"]);
        a.headlines.select_first();
        a.focus = Focus::Agent;
        assert!(handle_key_event(&mut a, press(KeyCode::Enter)).is_none());
    }
}
