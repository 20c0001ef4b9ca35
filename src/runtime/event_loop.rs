use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info};

use crate::app::App;
use crate::config;
use crate::library::TrackCatalog;
use crate::session::{SessionError, SessionHandle, SessionUpdate};
use crate::ui;

/// How long `H`/`L` must stay untouched before the drag is committed.
const SEEK_DRAG_IDLE: Duration = Duration::from_millis(600);
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Main terminal event loop: folds session updates into `app`, draws, and
/// turns keys into session commands. Returns `Ok(())` when quit is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    session: &SessionHandle,
    updates: &Receiver<SessionUpdate>,
    catalog: &dyn TrackCatalog,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        while let Ok(update) = updates.try_recv() {
            app.apply_update(&update);
        }

        if let Some(target) = app.take_idle_drag(Instant::now(), SEEK_DRAG_IDLE) {
            report(app, session.end_seek_drag(target as i64))?;
        }

        terminal.draw(|f| ui::draw(f, app, &settings.ui))?;

        if event::poll(INPUT_POLL)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if handle_key_event(key, settings, app, session, catalog)? {
                break;
            }
        }
    }

    Ok(())
}

/// Show a rejected command in the status line. A dead session ends the loop.
fn report(app: &mut App, result: Result<(), SessionError>) -> Result<(), SessionError> {
    match result {
        Ok(()) => Ok(()),
        Err(SessionError::Disconnected) => Err(SessionError::Disconnected),
        Err(e) => {
            debug!(error = %e, "command rejected");
            app.set_status(e.to_string());
            Ok(())
        }
    }
}

fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    session: &SessionHandle,
    catalog: &dyn TrackCatalog,
) -> Result<bool, Box<dyn std::error::Error>> {
    let step_ms = settings.ui.seek_step_seconds.saturating_mul(1000).min(i64::MAX as u64) as i64;

    match key.code {
        KeyCode::Char('q') => return Ok(true),
        KeyCode::Char('j') => app.next(),
        KeyCode::Char('k') => app.prev(),
        KeyCode::Enter => {
            if app.has_tracks() {
                app.status_message = None;
                report(app, session.play_at(app.selected))?;
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => report(app, session.toggle_play_pause())?,
        KeyCode::Char('l') => report(app, session.play_next())?,
        KeyCode::Char('h') => report(app, session.play_previous())?,
        KeyCode::Char('s') => report(app, session.stop())?,
        KeyCode::Char('L') => scrub(app, session, step_ms)?,
        KeyCode::Char('H') => scrub(app, session, -step_ms)?,
        KeyCode::Char('R') => {
            let tracks = catalog.load_catalog();
            info!(count = tracks.len(), "catalog reloaded");
            app.set_tracks(tracks.clone());
            report(app, session.set_playlist(tracks))?;
            app.set_status(format!("{} tracks", app.tracks.len()));
        }
        _ => {}
    }

    Ok(false)
}

fn scrub(app: &mut App, session: &SessionHandle, delta_ms: i64) -> Result<(), SessionError> {
    if app.scrub(delta_ms, Instant::now()) {
        report(app, session.begin_seek_drag())?;
    }
    Ok(())
}
