//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! Layout: headlines and the agent log side by side on top, the market
//! table below, and a one-line status bar at the bottom.  Each panel title
//! carries its store's fetch state and last update time.

use chrono::Local;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, Focus, Panel};
use crate::poll::FetchState;

/// Draw the complete UI for one frame.
pub fn draw(app: &App, frame: &mut Frame) {
    let [top_area, market_area, status_area] = Layout::vertical([
        Constraint::Percentage(60),
        Constraint::Min(4),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let [headlines_area, agent_area] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
            .areas(top_area);

    draw_headlines(app, frame, headlines_area);
    draw_agent_log(app, frame, agent_area);
    draw_market_table(app, frame, market_area);
    draw_status_bar(app, frame, status_area);
}

/// Border + title showing fetch state, highlighted when focused.
fn panel_block<T>(panel: &Panel<T>, focused: bool) -> Block<'static> {
    let snap = &panel.snapshot;
    let state_style = match snap.state {
        FetchState::Ready => Style::default().fg(Color::Green),
        FetchState::Error(_) => Style::default().fg(Color::Red),
        FetchState::Idle | FetchState::Loading => Style::default().fg(Color::Yellow),
    };
    let updated = snap
        .updated_at
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".into());

    let title = Line::from(vec![
        Span::raw(format!(" {} ", panel.title)),
        Span::styled(format!("[{}]", snap.state), state_style),
        Span::styled(format!(" {updated} "), Style::default().fg(Color::DarkGray)),
    ]);

    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

fn highlight() -> Style {
    Style::default()
        .add_modifier(Modifier::BOLD)
        .bg(Color::DarkGray)
}

fn draw_headlines(app: &App, frame: &mut Frame, area: Rect) {
    let panel = &app.headlines;
    let items: Vec<ListItem> = panel
        .records()
        .iter()
        .enumerate()
        .map(|(i, headline)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>3}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(headline.as_str(), Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(panel_block(panel, app.focus == Focus::Headlines))
        .highlight_style(highlight())
        .highlight_symbol("▸ ");

    let mut state = ListState::default().with_selected(panel.selected);
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_agent_log(app: &App, frame: &mut Frame, area: Rect) {
    let panel = &app.agent;
    let items: Vec<ListItem> = panel
        .records()
        .iter()
        .map(|status| {
            let state_color = match status.state.as_str() {
                "completed" | "done" => Color::Green,
                "error" | "failed" => Color::Red,
                "idle" => Color::DarkGray,
                _ => Color::Yellow,
            };
            let mut spans = vec![
                Span::styled(format!("{:<10}", status.state), Style::default().fg(state_color)),
                Span::raw(" "),
                Span::raw(status.progress.as_str()),
            ];
            if status.final_response.is_some() {
                spans.push(Span::styled("  ✓ response", Style::default().fg(Color::Green)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(panel_block(panel, app.focus == Focus::Agent))
        .highlight_style(highlight())
        .highlight_symbol("▸ ");

    let mut state = ListState::default().with_selected(panel.selected);
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_market_table(app: &App, frame: &mut Frame, area: Rect) {
    let panel = &app.market;
    let rows: Vec<Row> = panel
        .records()
        .iter()
        .map(|row| {
            let value_color = if row.value.starts_with("Up") || row.value.starts_with('+') {
                Color::Green
            } else if row.value.starts_with("Down") || row.value.starts_with('-') {
                Color::Red
            } else {
                Color::White
            };
            Row::new(vec![
                Span::raw(row.name.as_str()),
                Span::styled(row.value.as_str(), Style::default().fg(value_color)),
            ])
        })
        .collect();

    let header = Row::new(vec!["Name", "Value"])
        .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan));

    let table = Table::new(rows, [Constraint::Percentage(60), Constraint::Percentage(40)])
        .header(header)
        .block(panel_block(panel, app.focus == Focus::Market))
        .row_highlight_style(highlight())
        .highlight_symbol("▸ ");

    let mut state = TableState::default().with_selected(panel.selected);
    frame.render_stateful_widget(table, area, &mut state);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} headlines", app.headlines.records().len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  q: quit  tab: panel  ↑/↓: scroll  r: refresh  enter: start agent"),
    ]));
    frame.render_widget(status, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{headlines, snapshot};
    use crate::app::Navigate;
    use crate::poll::Snapshot;
    use crate::source::{AgentStatus, MarketRow};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tokio::sync::watch;

    fn app_with(
        titles: &[&str],
        statuses: Vec<AgentStatus>,
        rows: Vec<MarketRow>,
    ) -> (
        App,
        (
            watch::Sender<Snapshot<crate::source::Headline>>,
            watch::Sender<Snapshot<AgentStatus>>,
            watch::Sender<Snapshot<MarketRow>>,
        ),
    ) {
        let (h_tx, h_rx) = watch::channel(snapshot(headlines(titles)));
        let (a_tx, a_rx) = watch::channel(snapshot(statuses));
        let (m_tx, m_rx) = watch::channel(snapshot(rows));
        (App::new(h_rx, a_rx, m_rx), (h_tx, a_tx, m_tx))
    }

    fn render(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        let buf = terminal.backend().buffer().clone();
        buf.content()
            .iter()
            .map(|c| c.symbol().chars().next().unwrap_or(' '))
            .collect()
    }

    #[test]
    fn draw_does_not_panic_when_empty() {
        let (app, _senders) = app_with(&[], Vec::new(), Vec::new());
        render(&app);
    }

    #[test]
    fn draw_shows_records_from_every_panel() {
        let (mut app, _senders) = app_with(
            &["Fed holds rates"],
            vec![AgentStatus {
                state: "running".into(),
                progress: "Searching news".into(),
                final_response: None,
            }],
            vec![MarketRow {
                name: "Market A".into(),
                value: "Up 2%".into(),
            }],
        );
        app.headlines.select_first();

        let text = render(&app);
        assert!(text.contains("Fed holds rates"));
        assert!(text.contains("Searching news"));
        assert!(text.contains("Market A"));
        assert!(text.contains("1 headlines"), "status bar should show headline count");
    }

    #[test]
    fn error_state_appears_in_panel_title() {
        let (mut app, (h_tx, _a, _m)) = app_with(&["kept"], Vec::new(), Vec::new());
        let mut snap = snapshot(headlines(&["kept"]));
        snap.state = FetchState::Error("HTTP 500".into());
        h_tx.send(snap).unwrap();
        app.sync();

        let text = render(&app);
        assert!(text.contains("error: HTTP 500"));
        assert!(text.contains("kept"), "records survive a failed fetch");
    }
}
