//! Break Reminder CLI
//!
//! Reminds you to take a break every N minutes:
//! - `run` keeps the timer in the foreground and reads commands from stdin
//! - `settings` shows and changes the stored preferences
//! - `autostart` registers the reminder to launch at login

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tokio::task::JoinHandle;

use break_reminder::autostart;
use break_reminder::cli::{AutostartCommand, Cli, Commands, Display, RunArgs, SettingsCommand};
use break_reminder::daemon::{DaemonCommand, Runner, SystemClock};
use break_reminder::notification::{NotificationDispatcher, TerminalAttention};
use break_reminder::popup::{PopupSurface, TerminalPopup};
use break_reminder::settings::{LayeredPersistence, SettingsStore};
use break_reminder::sound::{get_default_sound, try_create_player};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins; otherwise warnings only, or everything with `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let Cli {
        command,
        config_dir,
        ..
    } = cli;
    let config_dir = config_dir.as_deref();

    match command {
        Some(Commands::Run(args)) => run_reminder(config_dir, args).await?,
        Some(Commands::Settings(command)) => settings_command(config_dir, command).await?,
        Some(Commands::Autostart(command)) => autostart_command(config_dir, command).await?,
        Some(Commands::Completions { shell }) => generate_completions(shell),
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Loads the settings store and starts its writer.
fn open_store(config_dir: Option<&Path>) -> (SettingsStore, JoinHandle<()>) {
    let persistence = Arc::new(LayeredPersistence::for_app(config_dir));
    let (store, writer) = SettingsStore::load(persistence);
    (store, tokio::spawn(writer.run()))
}

/// Drops the store and waits for the last write.
async fn close_store(store: SettingsStore, writer: JoinHandle<()>) -> Result<()> {
    drop(store);
    writer.await.context("設定の保存タスクが異常終了しました")
}

/// Runs the reminder in the foreground.
async fn run_reminder(config_dir: Option<&Path>, args: RunArgs) -> Result<()> {
    let (store, writer) = open_store(config_dir);
    let settings = store.snapshot();

    let surface: Arc<dyn PopupSurface> = Arc::new(TerminalPopup);
    let mut dispatcher = NotificationDispatcher::new(
        store.subscribe(),
        Arc::new(TerminalAttention),
        Arc::clone(&surface),
    );
    if let Some(player) = try_create_player() {
        dispatcher = dispatcher.with_sound(player, get_default_sound());
    }

    let mut runner = Runner::new(store, Arc::new(SystemClock), dispatcher, surface);
    if !args.paused {
        runner.handle_command(DaemonCommand::Start);
    }
    Display::show_run_banner(&settings, !args.paused);

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    runner
        .run(input)
        .await
        .context("入力の読み込みに失敗しました")?;

    writer.await.context("設定の保存タスクが異常終了しました")
}

/// Handles `settings show|set|reset`.
async fn settings_command(config_dir: Option<&Path>, command: SettingsCommand) -> Result<()> {
    let (store, writer) = open_store(config_dir);

    let result = match command {
        SettingsCommand::Show => {
            match autostart::platform_manager() {
                Ok(manager) => {
                    autostart::refresh(&store, manager.as_ref());
                }
                Err(e) => tracing::warn!("自動起動の状態を確認できませんでした: {}", e),
            }
            Display::show_settings(&store.snapshot());
            Ok(())
        }
        SettingsCommand::Set(args) => {
            let patch = args.to_patch();
            if patch.is_empty() {
                Err(anyhow::anyhow!(
                    "変更する設定を指定してください（--interval, --mode など）"
                ))
            } else {
                Display::show_settings_updated(&store.update(&patch));
                Ok(())
            }
        }
        SettingsCommand::Reset => {
            store.reset_to_defaults();
            Display::show_settings_reset();
            Ok(())
        }
    };

    close_store(store, writer).await?;
    result
}

/// Handles `autostart enable|disable|status`.
async fn autostart_command(config_dir: Option<&Path>, command: AutostartCommand) -> Result<()> {
    let manager = autostart::platform_manager().context("自動起動を利用できません")?;
    let (store, writer) = open_store(config_dir);

    let result = match command {
        AutostartCommand::Enable | AutostartCommand::Disable => {
            let enabled = command == AutostartCommand::Enable;
            autostart::set_autostart(&store, manager.as_ref(), enabled)
                .map(|()| Display::show_autostart_changed(enabled))
                .context("自動起動の登録を変更できませんでした")
        }
        AutostartCommand::Status => autostart::reconcile(&store, manager.as_ref())
            .map(Display::show_autostart_status)
            .context("自動起動の状態を確認できませんでした"),
    };

    close_store(store, writer).await?;
    result
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
