use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::Sender;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use log::{info, warn, LevelFilter};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::fs::File;
use std::io::{self, Stdout};
use std::panic;
use std::thread::JoinHandle;
use std::time::Duration;

use spacemap::app::{App, Step};
use spacemap::args::Args;
use spacemap::cancel::{self, CancelFlag};
use spacemap::config::Config;
use spacemap::presenter::Presenter;
use spacemap::recovery::Recovery;
use spacemap::state::{Action, State};
use spacemap::walker;

const INPUT_POLL: Duration = Duration::from_millis(100);

type Tui = Terminal<CrosstermBackend<Stdout>>;

fn init_logging(config: &Config) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    match &config.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            builder
                .filter_level(LevelFilter::Debug)
                .parse_env("RUST_LOG")
                .target(env_logger::Target::Pipe(Box::new(file)));
        }
        // the terminal belongs to the treemap
        None => {
            builder.filter_level(LevelFilter::Off);
        }
    }
    builder.init();
    Ok(())
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("failed to enable raw mode")?;
    crossterm::execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)
        .context("failed to enter alternate screen")?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout())).context("failed to create terminal")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn send_to_background(terminal: &mut Tui) -> Result<()> {
    restore_terminal(terminal)?;
    stop_self();
    enable_raw_mode().context("failed to enable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), EnterAlternateScreen, EnableMouseCapture)
        .context("failed to enter alternate screen")?;
    terminal.clear()?;
    Ok(())
}

#[cfg(unix)]
fn stop_self() {
    let pid = std::process::id();
    info!("Stopping pid {pid}");
    // SAFETY: raise only delivers a signal to the calling process.
    if unsafe { libc::raise(libc::SIGTSTP) } != 0 {
        warn!("Could not stop pid {pid}");
    } else {
        info!("Pid {pid} woke up");
    }
}

#[cfg(not(unix))]
fn stop_self() {
    warn!("Job control is not available on this platform");
}

fn read_terminal(events: Sender<Event>, cancel: CancelFlag) {
    while !cancel.is_cancelled() {
        match event::poll(INPUT_POLL) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if cancel::send(&cancel, &events, ev).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    warn!("Reading terminal input failed: {err}");
                    return;
                }
            },
            Ok(false) => {}
            Err(err) => {
                warn!("Polling terminal input failed: {err}");
                return;
            }
        }
    }
}

fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    terminal.draw(|frame| app.draw(frame))?;
    loop {
        match app.step() {
            Step::Idle => {}
            Step::Quit => return Ok(()),
            Step::Redraw(action) => {
                match action {
                    Action::None => {}
                    Action::Refresh => terminal.clear()?,
                    Action::Background => send_to_background(terminal)?,
                    Action::Resize => terminal.autoresize()?,
                }
                terminal.draw(|frame| app.draw(frame))?;
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.resolve_config()?;
    init_logging(&config)?;
    info!("Starting spacemap on {} with {config:?}", args.directory.display());

    let cancel = CancelFlag::new();
    let recovery = Recovery::new(cancel.clone());

    let (file_tx, file_rx) = crossbeam_channel::bounded(0);
    let (command_tx, command_rx) = crossbeam_channel::bounded(0);
    let (state_tx, state_rx) = crossbeam_channel::bounded(0);
    let (terminal_tx, terminal_rx) = crossbeam_channel::bounded(0);

    let mut terminal = setup_terminal()?;
    let size = terminal.size().context("failed to read terminal size")?;

    let mut app = App::new(cancel.clone(), state_rx, terminal_rx, command_tx);
    app.resize(size.width, size.height);

    let initial = State {
        max_depth: config.max_depth,
        is_walking_files: true,
        ..State::default()
    };
    let shutdown_cancel = cancel.clone();
    let mut presenter = Presenter::new(
        cancel.clone(),
        Box::new(move || shutdown_cancel.cancel()),
        file_rx,
        command_rx,
        state_tx,
        initial,
        config.tiler(),
    );

    let mut handles: Vec<JoinHandle<()>> = Vec::new();
    let spawned = (|| -> Result<()> {
        handles.push(recovery.spawn("presenter", move || presenter.run())?);

        let root = args.directory.clone();
        let walk_cancel = cancel.clone();
        handles.push(recovery.spawn("walker", move || walker::walk(&root, file_tx, &walk_cancel))?);

        let input_cancel = cancel.clone();
        handles.push(recovery.spawn("input", move || read_terminal(terminal_tx, input_cancel))?);
        Ok(())
    })();

    let result = spawned.and_then(|()| run(&mut terminal, &mut app));

    let restored = restore_terminal(&mut terminal);
    cancel.cancel();
    recovery.release();

    let mut first_panic = None;
    for handle in handles {
        if let Err(payload) = handle.join() {
            first_panic.get_or_insert(payload);
        }
    }
    if let Some(payload) = first_panic {
        panic::resume_unwind(payload);
    }

    info!("Exiting");
    result.and(restored)
}
