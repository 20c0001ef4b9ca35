use std::env;
use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::config;
use crate::library::{Catalog, TrackCatalog};
use crate::session::SessionUpdate;

mod cli;
mod event_loop;
mod logging;
mod settings;
mod startup;

use cli::Invocation;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let invocation = cli::parse_args(env::args().skip(1))?;
    if invocation == Invocation::Help {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    let (settings, settings_warning) = settings::load_settings();
    let data_dir = settings
        .library
        .resolve_data_dir()
        .ok_or("cannot determine a data directory; set library.data_dir or HOME")?;
    if let Some(path) = logging::init_logging(&data_dir, &settings.logging) {
        info!(log = %path.display(), "carmusic starting");
    }
    if let Some(msg) = settings_warning {
        warn!("{msg}");
    }

    let mut catalog = Catalog::new(&data_dir, &settings.library, &settings.audio.extensions);

    match invocation {
        Invocation::Import(paths) => exit_on_failures(cli::import(&mut catalog, &paths)),
        Invocation::Remove(names) => exit_on_failures(cli::remove(&mut catalog, &names)),
        Invocation::List => {
            cli::list(&catalog);
            Ok(())
        }
        Invocation::Player | Invocation::Help => run_player(&settings, &catalog),
    }
}

fn exit_on_failures(failed: usize) -> Result<(), Box<dyn std::error::Error>> {
    if failed == 0 {
        Ok(())
    } else {
        Err(format!("{failed} file(s) failed").into())
    }
}

fn run_player(settings: &config::Settings, catalog: &Catalog) -> Result<(), Box<dyn std::error::Error>> {
    let service = startup::start_session(settings)?;
    let session = service.connect()?;

    let tracks = catalog.load_catalog();
    let mut app = App::new(tracks.clone());
    let (update_tx, update_rx) = mpsc::channel::<SessionUpdate>();
    let subscription = session.subscribe(update_tx)?;
    session.set_playlist(tracks)?;

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, settings, &mut app, &session, &update_rx, catalog);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let _ = session.unsubscribe(subscription);
    service.shutdown();
    info!("carmusic stopped");

    run_result
}
