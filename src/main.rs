//! user-admin binary entry point.
//!
//! Parses flags, sets up file logging, picks a backend, initializes the
//! terminal in raw mode, runs the TUI event loop, and restores the
//! terminal state on exit.
//!
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use user_admin::app::settings::{Overrides, Settings};
use user_admin::app::{self, AppState, config_path, default_config_dir, worker};
use user_admin::model::UserModel;
use user_admin::service::UserService;
use user_admin::service::http::HttpService;
use user_admin::service::memory::MemoryService;

#[derive(Debug, Parser)]
#[command(
    name = "user-admin",
    version,
    about = "Page through users, search by phone, toggle roles"
)]
struct Cli {
    /// Base URL of the admin API.
    #[arg(long, env = "USER_ADMIN_ENDPOINT")]
    endpoint: Option<String>,

    /// Bearer token for the admin API.
    #[arg(long, env = "USER_ADMIN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Users fetched per page.
    #[arg(long)]
    page_size: Option<usize>,

    /// Serve users and roles from a JSON fixture instead of the API.
    #[arg(long, value_name = "FIXTURE")]
    demo: Option<PathBuf>,

    /// Directory holding user-admin.conf, theme.conf and keybinds.conf.
    #[arg(long, value_name = "DIR")]
    config: Option<PathBuf>,

    /// Log file (overrides `log_file` in user-admin.conf).
    #[arg(long)]
    log_file: Option<String>,
}

fn init_logging(path: &str) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {path}"))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn build_service(cli: &Cli, settings: &Settings) -> Result<Box<dyn UserService>> {
    if let Some(fixture) = &cli.demo {
        let svc = MemoryService::from_fixture(fixture)
            .map_err(anyhow::Error::from_boxed)
            .with_context(|| format!("load fixture {}", fixture.display()))?;
        return Ok(Box::new(svc));
    }
    let Some(endpoint) = settings.endpoint.as_deref() else {
        bail!(
            "no endpoint configured: pass --endpoint, set USER_ADMIN_ENDPOINT, \
             or use --demo <fixture>"
        );
    };
    tracing::info!(endpoint, "using HTTP backend");
    let svc = HttpService::new(endpoint, settings.token.clone(), settings.timeout())?;
    Ok(Box::new(svc))
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_dir = cli.config.clone().unwrap_or_else(default_config_dir);

    let mut settings = Settings::load_or_init(&config_path(&config_dir, "user-admin.conf"));
    settings.apply_overrides(Overrides {
        endpoint: cli.endpoint.clone(),
        token: cli.token.clone(),
        page_size: cli.page_size,
        log_file: cli.log_file.clone(),
    });
    init_logging(&settings.log_file)?;
    tracing::info!(config = %config_dir.display(), page_size = settings.page_size, "starting");

    let service = build_service(&cli, &settings)?;
    let link = worker::start(UserModel::new(service, settings.page_size));
    let mut state = AppState::from_config_dir(&config_dir);

    let mut terminal = init_terminal().context("init terminal")?;

    let res = app::run(&mut terminal, &mut state, &link);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture).ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        tracing::error!(error = %err, "application error");
        eprintln!("application error: {err}");
    }
    Ok(())
}
