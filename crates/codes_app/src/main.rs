use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use codes_core::Msg;
use codes_engine::ensure_state_dir;
use codes_logging::codes_info;
use codes_mailbox::{Mailbox, DEFAULT_CAPACITY};

mod platform;

use platform::app::App;
use platform::logging::{initialize, LogDestination};

#[derive(Parser)]
#[command(name = "codes", about = "Verification code viewer for a mailbox endpoint")]
struct Cli {
    /// Directory holding `.codes_settings.ron` and `codes.log`.
    #[arg(long, global = true, default_value = ".")]
    state_dir: PathBuf,
    /// Log info to stderr and codes.log.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch once and print the codes, newest first.
    List {
        /// Print normalized records as JSON.
        #[arg(long)]
        json: bool,
        /// Leave out a code by id; repeatable.
        #[arg(long, value_name = "ID")]
        dismiss: Vec<String>,
    },
    /// Keep the list on screen, refreshing on the configured interval.
    Watch,
    /// Fetch once and print one code (the newest by default) for piping.
    Copy { id: Option<String> },
    /// Delete every email on the server.
    Clear,
    /// Show or edit saved settings.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Run the mailbox HTTP API.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8787")]
        bind: SocketAddr,
        #[arg(long, default_value_t = DEFAULT_CAPACITY)]
        capacity: usize,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    Set {
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        delete_endpoint: Option<String>,
        #[arg(long, value_enum)]
        dark_mode: Option<DarkMode>,
        /// Seconds between refreshes in `watch`; 0 disables.
        #[arg(long)]
        auto_refresh: Option<u32>,
    },
    /// Check an endpoint and save it if the check passes.
    Test {
        /// URL to check; the saved one when omitted.
        url: Option<String>,
        /// Check the delete endpoint. This performs a real bulk delete.
        #[arg(long)]
        delete: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DarkMode {
    On,
    Off,
    System,
}

impl From<DarkMode> for Option<bool> {
    fn from(mode: DarkMode) -> Self {
        match mode {
            DarkMode::On => Some(true),
            DarkMode::Off => Some(false),
            DarkMode::System => None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    ensure_state_dir(&cli.state_dir)
        .with_context(|| format!("cannot use state dir {:?}", cli.state_dir))?;
    let destination = if cli.verbose {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    initialize(destination, &cli.state_dir);

    match cli.command {
        Command::List { json, dismiss } => {
            let mut app = App::new(cli.state_dir, false);
            app.refresh_once()?;
            app.dismiss(dismiss);
            if json {
                println!("{}", serde_json::to_string_pretty(app.state().codes())?);
            } else if let Some(text) = app.take_render() {
                print!("{text}");
            }
        }
        Command::Watch => App::new(cli.state_dir, true).watch()?,
        Command::Copy { id } => {
            let mut app = App::new(cli.state_dir, false);
            app.refresh_once()?;
            app.copy(id)?;
        }
        Command::Clear => {
            let mut app = App::new(cli.state_dir, false);
            app.clear_once()?;
            eprintln!("all codes deleted");
        }
        Command::Config { action } => run_config(App::new(cli.state_dir, false), action)?,
        Command::Serve { bind, capacity } => serve(bind, capacity)?,
    }

    Ok(())
}

fn run_config(mut app: App, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {}
        ConfigAction::Set {
            endpoint,
            delete_endpoint,
            dark_mode,
            auto_refresh,
        } => {
            if let Some(url) = endpoint {
                app.dispatch(Msg::EndpointChanged(url));
            }
            if let Some(url) = delete_endpoint {
                app.dispatch(Msg::DeleteEndpointChanged(url));
            }
            if let Some(mode) = dark_mode {
                app.dispatch(Msg::DarkModeChanged(mode.into()));
            }
            if let Some(secs) = auto_refresh {
                app.dispatch(Msg::AutoRefreshChanged(secs));
            }
        }
        ConfigAction::Test { url, delete } => {
            println!("{}", app.test_connection(url, delete)?);
            return Ok(());
        }
    }

    let settings = app.settings();
    let dark_mode = match settings.dark_mode {
        Some(true) => "on",
        Some(false) => "off",
        None => "system",
    };
    println!("endpoint:        {}", settings.endpoint_url);
    println!("delete endpoint: {}", settings.delete_url);
    println!("dark mode:       {dark_mode}");
    println!("auto refresh:    {}s", settings.auto_refresh_secs);
    Ok(())
}

fn serve(bind: SocketAddr, capacity: usize) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(bind)
            .await
            .with_context(|| format!("cannot bind {bind}"))?;
        codes_info!("mailbox listening on {}", bind);
        eprintln!("mailbox listening on http://{bind}");
        let mailbox = Arc::new(Mutex::new(Mailbox::with_capacity(capacity)));
        codes_mailbox::serve(listener, mailbox).await?;
        Ok::<(), anyhow::Error>(())
    })
}
