//! Tracing setup for the `chatbox` binary.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use chatbox_engine::config::APP_DIR;
use tracing_subscriber::EnvFilter;

/// Log file used while the terminal UI owns the screen.
pub fn log_file_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("chatbox.log")
}

/// Map `-v` count to a filter, unless `RUST_LOG` is set.
fn filter(verbose_level: u8) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    let directives = match verbose_level {
        0 => "warn,chatbox=info,chatbox_engine=info,chatbox_tui=info",
        1 => "info,chatbox=debug,chatbox_engine=debug,chatbox_tui=debug",
        _ => "debug,chatbox=trace,chatbox_engine=trace,chatbox_tui=trace",
    };
    EnvFilter::new(directives)
}

/// Log to stderr, for one-shot commands.
pub fn setup_logging(verbose_level: u8) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log to a file so output never lands on the terminal UI.
///
/// Logging is dropped when the file cannot be opened.
pub fn setup_logging_for_terminal_ui(verbose_level: u8) {
    let path = log_file_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose_level))
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}
