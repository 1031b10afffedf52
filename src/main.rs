use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use pollboard::app::{ActionMsg, App, Focus};
use pollboard::config::DashConfig;
use pollboard::input::{self, Command};
use pollboard::poll::PollingStore;
use pollboard::source::{
    AgentStatus, AgentStatusSource, Backend, Headline, HeadlinesSource, MarketDataSource,
    MarketRow,
};
use pollboard::ui;

#[derive(Parser, Debug)]
#[command(
    name = "pollboard",
    about = "Live terminal dashboard for headlines, agent status and market data"
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Poll interval in milliseconds for every panel (overrides the config file)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Where to write logs; the terminal itself is taken by the UI
    #[arg(long, default_value = "pollboard.log")]
    log_file: PathBuf,

    /// Ask the backend to start processing this YouTube stream on launch
    #[arg(long)]
    youtube_url: Option<String>,
}

// ---------------------------------------------------------------------------
// RAII terminal guard — idiomatic cleanup even on panic
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the default hook prints the panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pollboard=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<DashConfig> {
    let mut config = match &cli.config {
        Some(path) => DashConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => DashConfig::default(),
    };
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(ms) = cli.interval_ms {
        config.interval_ms = ms;
    }
    config.validate()?;
    Ok(config)
}

/// One store per panel.
struct Stores {
    headlines: PollingStore<Headline>,
    agent: PollingStore<AgentStatus>,
    market: PollingStore<MarketRow>,
}

impl Stores {
    fn new(config: &DashConfig, backend: &Backend) -> Result<Self> {
        Ok(Self {
            headlines: PollingStore::<Headline>::new(
                config.headlines_store(),
                Arc::new(HeadlinesSource::new(backend.clone())),
            )?,
            agent: PollingStore::<AgentStatus>::new(
                config.agent_status_store(),
                Arc::new(AgentStatusSource::new(backend.clone())),
            )?,
            market: PollingStore::<MarketRow>::new(
                config.market_data_store(),
                Arc::new(MarketDataSource::new(backend.clone())),
            )?,
        })
    }

    fn start(&self) -> Result<()> {
        self.headlines.start()?;
        self.agent.start()?;
        self.market.start()?;
        Ok(())
    }

    fn refresh(&self, focus: Focus) {
        match focus {
            Focus::Headlines => self.headlines.fetch_now(),
            Focus::Agent => self.agent.fetch_now(),
            Focus::Market => self.market.fetch_now(),
        }
    }

    fn stop(&self) {
        self.headlines.stop();
        self.agent.stop();
        self.market.stop();
    }
}

fn spawn_start_agent(backend: &Backend, headline: String, tx: &mpsc::Sender<ActionMsg>) {
    let backend = backend.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let msg = match backend.start_agent(&headline).await {
            Ok(_) => {
                tracing::info!(%headline, "agent started");
                ActionMsg::AgentStarted { headline }
            }
            Err(e) => {
                tracing::warn!(%headline, error = %e, "start_agent failed");
                ActionMsg::Failed(e.to_string())
            }
        };
        // The UI may already be gone.
        let _ = tx.send(msg);
    });
}

fn spawn_start_processing(backend: &Backend, url: String, tx: &mpsc::Sender<ActionMsg>) {
    let backend = backend.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let msg = match backend.start_processing(&url).await {
            Ok(_) => ActionMsg::ProcessingStarted { url },
            Err(e) => {
                tracing::warn!(%url, error = %e, "start processing failed");
                ActionMsg::Failed(e.to_string())
            }
        };
        let _ = tx.send(msg);
    });
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;
    let config = load_config(&cli)?;

    // Stores and actions run on the runtime's workers; the UI loop below
    // stays on the main thread inside the runtime context.
    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let enter = runtime.enter();

    let backend = Backend::new(&config.base_url, config.timeout())
        .context("Failed to build HTTP client")?;
    let stores = Stores::new(&config, &backend)?;
    stores.start()?;
    tracing::info!(base_url = backend.base_url(), "dashboard started");

    let (action_tx, action_rx) = mpsc::channel();
    if let Some(url) = cli.youtube_url.clone() {
        spawn_start_processing(&backend, url, &action_tx);
    }

    install_panic_hook();
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(
        stores.headlines.subscribe(),
        stores.agent.subscribe(),
        stores.market.subscribe(),
    );

    // ~10 fps.  Each iteration:
    //   1. Pull fresh snapshots and action results.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        app.sync();
        while let Ok(msg) = action_rx.try_recv() {
            app.apply_action(msg);
        }

        guard.terminal.draw(|f| ui::draw(&app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                match input::handle_key_event(&mut app, key) {
                    Some(Command::Refresh(focus)) => {
                        stores.refresh(focus);
                        app.status = "Refreshing…".into();
                    }
                    Some(Command::StartAgent(headline)) => {
                        app.status = format!("Starting agent: {headline}");
                        spawn_start_agent(&backend, headline, &action_tx);
                    }
                    None => {}
                }
            }
        }

        if app.quit {
            break;
        }
    }

    stores.stop();
    drop(guard);
    drop(enter);
    // Don't wait on requests still in flight.
    runtime.shutdown_background();
    tracing::info!("dashboard stopped");
    Ok(())
}
