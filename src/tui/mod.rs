//! Terminal dashboard over a running energy API.
//!
//! Feature-gated behind `tui`. Launch with `--dashboard <url>` on the CLI.

mod controls;
mod layout;
/// Dashboard application state.
pub mod runtime;
mod style;

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::runtime::Runtime;
use tracing::warn;

use crate::client::{ClientResult, EnergyClient};
use crate::model::{DocumentId, EnergyData};
use runtime::{App, Command};

/// How often the selected building's data is refetched.
const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Upper bound on one input poll, so refreshes are not starved.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launches the dashboard against `client`.
///
/// Sets up the terminal (raw mode, alternate screen), runs the event loop,
/// and restores the terminal on exit. Network calls run on `rt`.
///
/// # Errors
///
/// Returns an `io::Error` if the terminal cannot be set up or drawn.
pub fn run(client: &EnergyClient, rt: &Runtime) -> io::Result<()> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e);
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            let _ = disable_raw_mode();
            return Err(e);
        }
    };

    let mut app = App::new();
    let result = event_loop(&mut terminal, &mut app, client, rt);

    // Teardown, always restore terminal state
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();

    result
}

/// Core event loop: run queued work, draw, poll input.
fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    client: &EnergyClient,
    rt: &Runtime,
) -> io::Result<()> {
    loop {
        while let Some(command) = app.take_command() {
            terminal.draw(|frame| layout::render(frame, app))?;
            rt.block_on(run_command(client, app, command));
        }

        terminal.draw(|frame| layout::render(frame, app))?;

        if app.quit {
            return Ok(());
        }

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                controls::handle_key(app, key);
            }
        }

        if app.last_refresh.elapsed() >= REFRESH_INTERVAL {
            app.refresh();
        }
    }
}

/// Runs one command against the API and applies the outcome.
async fn run_command(client: &EnergyClient, app: &mut App, command: Command) {
    match command {
        Command::LoadBuildings => match client.fetch_buildings().await {
            Ok(buildings) => app.apply_buildings(buildings),
            Err(e) => {
                warn!(error = %e, "Failed to load buildings");
                app.load_failed();
            }
        },
        Command::LoadReadings(id) => match load_readings(client, id).await {
            Ok((data, predictions)) => app.apply_readings(data, predictions),
            Err(e) => {
                warn!(building_id = %id, error = %e, "Failed to load readings");
                app.load_failed();
            }
        },
        Command::Optimize(id) => match optimize_and_reload(client, id).await {
            Ok(data) => app.apply_optimized(data),
            Err(e) => {
                warn!(building_id = %id, error = %e, "Optimize failed");
                app.optimize_failed();
            }
        },
        Command::SaveSettings(input) => match client.create_building(&input).await {
            Ok(building) => app.apply_saved(building),
            Err(e) => {
                warn!(error = %e, "Failed to save settings");
                app.save_failed();
            }
        },
    }
}

async fn load_readings(
    client: &EnergyClient,
    id: DocumentId,
) -> ClientResult<(Vec<EnergyData>, Vec<EnergyData>)> {
    let data = client.fetch_energy_data(id, None, None).await?;
    let predictions = client.fetch_predictions(id).await?;
    Ok((data, predictions))
}

async fn optimize_and_reload(
    client: &EnergyClient,
    id: DocumentId,
) -> ClientResult<Vec<EnergyData>> {
    client.optimize_energy(id).await?;
    client.fetch_energy_data(id, None, None).await
}
