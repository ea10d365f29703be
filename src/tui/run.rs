use std::io::stdout;
use std::time::Duration;

use ratatui::crossterm::event::{self, Event, KeyCode};
use ratatui::crossterm::{execute, terminal};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, oneshot};

use crate::client::event::ClientEvent;
use crate::transport::types::Command;
use crate::tui::{app::TuiApp, ui::draw};

async fn fetch_view(client_tx: &mpsc::Sender<ClientEvent>, app: &mut TuiApp) {
    let (tx, rx) = oneshot::channel();
    let _ = client_tx.send(ClientEvent::GetView { reply: tx }).await;
    if let Ok(view) = rx.await {
        app.view = Some(view);
    }
}

fn fire_command(client_tx: &mpsc::Sender<ClientEvent>, command: Command) {
    // fire-and-forget; failures come back through the notification queue
    let client_tx = client_tx.clone();
    tokio::spawn(async move {
        let (tx, rx) = oneshot::channel();
        let _ = client_tx
            .send(ClientEvent::Command { command, reply: tx })
            .await;
        let _ = rx.await;
    });
}

pub async fn run_tui(client_tx: mpsc::Sender<ClientEvent>) -> anyhow::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(stdout(), terminal::EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut app = TuiApp::default();

    let res = loop {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break Ok(()),
                    KeyCode::Char('c')
                        if key.modifiers.contains(event::KeyModifiers::CONTROL) =>
                    {
                        break Ok(());
                    }
                    KeyCode::Char('l') => {
                        app.last_command = Some("enter long".into());
                        fire_command(&client_tx, Command::EnterLong);
                    }
                    KeyCode::Char('s') => {
                        app.last_command = Some("enter short".into());
                        fire_command(&client_tx, Command::EnterShort);
                    }
                    KeyCode::Char('f') => {
                        app.last_command = Some("close position".into());
                        fire_command(&client_tx, Command::ClosePosition);
                    }
                    _ => {}
                }
            }
        }

        fetch_view(&client_tx, &mut app).await;

        terminal.draw(|f| draw(f, &app))?;

        tokio::time::sleep(Duration::from_millis(100)).await;
    };

    let _ = client_tx.send(ClientEvent::Shutdown).await;

    terminal::disable_raw_mode()?;
    execute!(stdout(), terminal::LeaveAlternateScreen)?;
    res
}
