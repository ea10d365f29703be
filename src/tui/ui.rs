use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame,
};

use crate::health::ConnectionHealth;
use crate::state::snapshot::FieldValue;
use crate::tui::app::TuiApp;

fn health_style(health: ConnectionHealth) -> Style {
    let color = match health {
        ConnectionHealth::Live => Color::Green,
        ConnectionHealth::Connecting | ConnectionHealth::Degraded => Color::Yellow,
        ConnectionHealth::Inactive | ConnectionHealth::Disconnected => Color::Red,
    };
    Style::default().fg(color)
}

pub fn draw(f: &mut Frame, app: &TuiApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // health
            Constraint::Length(7), // position
            Constraint::Min(8),    // fields
            Constraint::Length(7), // notifications
            Constraint::Length(3), // footer
        ])
        .split(f.size());

    let Some(view) = &app.view else {
        let waiting = Paragraph::new("waiting for client runtime...")
            .block(Block::default().title("pitview").borders(Borders::ALL));
        f.render_widget(waiting, chunks[0]);
        return;
    };

    // --- HEALTH ---
    let age = view
        .last_commit_age
        .map(|d| format!("{:.1}s ago", d.as_secs_f64()))
        .unwrap_or_else(|| "never".into());
    let health = Paragraph::new(format!("{}   last update: {}", view.health, age))
        .style(health_style(view.health))
        .block(Block::default().title("Connection").borders(Borders::ALL));
    f.render_widget(health, chunks[0]);

    // --- POSITION ---
    let field = |name: &str| {
        view.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.to_string())
            .unwrap_or_else(|| "-".into())
    };
    let position = Paragraph::new(format!(
        "Side: {}\nSize: {}\nRealized PnL: {}\nUnrealized PnL: {}\nConfidence: {}",
        field("position_side"),
        field("position_size"),
        field("realized_pnl"),
        field("unrealized_pnl"),
        field("model_confidence"),
    ))
    .block(Block::default().title("Position").borders(Borders::ALL));
    f.render_widget(position, chunks[1]);

    // --- FIELDS ---
    let rows = view.fields.iter().map(|(name, value)| {
        let kind = match value {
            FieldValue::Number(_) => "num",
            FieldValue::Text(_) => "text",
            FieldValue::Flag(_) => "flag",
        };
        Row::new(vec![name.clone(), value.to_string(), kind.to_string()])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(24), // field
            Constraint::Length(20), // value
            Constraint::Length(6),  // type
        ],
    )
    .block(Block::default().title("Strategy State").borders(Borders::ALL));
    f.render_widget(table, chunks[2]);

    // --- NOTIFICATIONS ---
    let lines: Vec<String> = view
        .notifications
        .iter()
        .map(|n| format!("[{}] {}", n.severity, n.message))
        .collect();
    let notes = Paragraph::new(lines.join("\n"))
        .block(Block::default().title("Notifications").borders(Borders::ALL));
    f.render_widget(notes, chunks[3]);

    // --- FOOTER ---
    let last = app
        .last_command
        .as_deref()
        .map(|c| format!("   last: {c}"))
        .unwrap_or_default();
    let footer = Paragraph::new(format!(
        "[l] long  [s] short  [f] flatten  [q] quit{last}"
    ))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[4]);
}
