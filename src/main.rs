// Lovi - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Configuration loading and logging initialisation
// 3. Choosing the files to monitor (CLI arguments or the previous run's list)
// 4. Scheduler start and eframe GUI launch

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod gui;

// Re-export the library modules so `gui.rs` can use `crate::app::...` etc.
pub use lovi::app;

pub use lovi::core;
pub use lovi::platform;
pub use lovi::ui;
pub use lovi::util;

use clap::Parser;
use std::path::PathBuf;

/// Lovi - tail growing log files and highlight errors and warnings.
///
/// Each file opens in its own tab showing its last few hundred lines, then
/// follows new lines as they are written, surviving log rotation.
#[derive(Parser, Debug)]
#[command(name = "lovi", version, about)]
struct Cli {
    /// Log files to monitor. Glob patterns are expanded. When omitted, the
    /// files monitored in the previous run are reopened.
    files: Vec<String>,

    /// Configuration file to use instead of the platform default.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Number of existing lines to show when a file is opened.
    #[arg(long = "backlog", value_name = "N")]
    backlog: Option<usize>,
}

fn main() {
    let cli = Cli::parse();

    let platform_paths = platform::config::PlatformPaths::resolve();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| platform_paths.config_file());
    let (mut config, config_warnings) = platform::config::load_config(&config_path);

    util::logging::init(
        cli.debug,
        config.log_level.as_deref(),
        config.log_file.as_deref(),
    );

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        config = %config_path.display(),
        "Lovi starting"
    );
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Configuration warning");
    }

    if let Some(backlog) = cli.backlog {
        let clamped = backlog.clamp(
            util::constants::MIN_BACKLOG_LINES,
            util::constants::MAX_BACKLOG_LINES,
        );
        if clamped != backlog {
            tracing::warn!(requested = backlog, used = clamped, "--backlog out of range");
        }
        config.monitor.backlog_lines = clamped;
    }

    let session_path = app::persist::session_path(&platform_paths.data_dir);
    let previous = app::persist::load(&session_path);

    let files = if cli.files.is_empty() {
        previous
            .as_ref()
            .map(|s| s.files.clone())
            .unwrap_or_default()
    } else {
        platform::fs::expand_paths(&cli.files)
    };

    let mut state = app::state::AppState::new(
        config.monitor.max_lines,
        config.markers.clone(),
        config.font_size,
        cli.debug,
    );
    state.session_path = Some(session_path);
    state.font = config.font;
    if let Some(previous) = previous {
        state.restore_font(&previous);
        if let Some(dir) = previous.last_dir {
            state.last_dir = dir;
        }
    }
    state.pending_open = files;

    let mut monitor = app::scheduler::MonitorManager::new();
    monitor.start(config.monitor, config.markers);

    tracing::info!(files = state.pending_open.len(), "Ready to launch GUI");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(state.caption())
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };

    let repaint_interval = config.monitor.poll_interval;
    let result = eframe::run_native(
        util::constants::APP_NAME,
        native_options,
        Box::new(move |_cc| {
            Ok(Box::new(gui::LoviApp::new(
                state,
                monitor,
                repaint_interval,
            )))
        }),
    );

    if let Err(e) = result {
        tracing::error!(error = %e, "Failed to launch GUI");
        eprintln!("Error: Failed to launch Lovi GUI: {e}");
        std::process::exit(1);
    }
}
