//! Structured console logging for staketally
//!
//! Small tagged logger with standard levels (Error/Warning/Info/Debug) and
//! colored output. Debug output is gated behind the `--debug` flag; the flag
//! is stored once at startup and read by every call site.
//!
//! Call `logger::init(debug)` once in main before any logging occurs.

use chrono::Utc;
use colored::*;
use once_cell::sync::Lazy;
use std::sync::RwLock;

/// Logger configuration, set once at startup
#[derive(Debug, Clone, Default)]
struct LoggerConfig {
    debug: bool,
}

static CONFIG: Lazy<RwLock<LoggerConfig>> = Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Subsystem tag attached to every log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    System,
    Loader,
    Rpc,
    Stake,
    Classifier,
    History,
    Tally,
}

impl LogTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Loader => "LOADER",
            LogTag::Rpc => "RPC",
            LogTag::Stake => "STAKE",
            LogTag::Classifier => "CLASSIFIER",
            LogTag::History => "HISTORY",
            LogTag::Tally => "TALLY",
        }
    }
}

/// Initialize the logger system
///
/// Must be called once at application startup, before any logging occurs.
pub fn init(debug: bool) {
    if let Ok(mut config) = CONFIG.write() {
        config.debug = debug;
    }
}

fn debug_enabled() -> bool {
    CONFIG.read().map(|c| c.debug).unwrap_or(false)
}

fn timestamp() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    println!(
        "{} {} {} {}",
        format!("[{}]", timestamp()).dimmed(),
        "ERROR".red().bold(),
        tag.as_str().red().bold(),
        message.red()
    );
}

/// Log at WARNING level (important issues that do not stop the run)
pub fn warning(tag: LogTag, message: &str) {
    println!(
        "{} {} {} {}",
        format!("[{}]", timestamp()).dimmed(),
        "WARN".yellow().bold(),
        tag.as_str().yellow().bold(),
        message.yellow()
    );
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    println!(
        "{} {} {} {}",
        format!("[{}]", timestamp()).dimmed(),
        "INFO".blue().bold(),
        tag.as_str().blue().bold(),
        message
    );
}

/// Log at DEBUG level (only shown with `--debug`)
pub fn debug(tag: LogTag, message: &str) {
    if !debug_enabled() {
        return;
    }
    println!(
        "{} {} {} {}",
        format!("[{}]", timestamp()).dimmed(),
        "DEBUG".purple().bold(),
        tag.as_str().purple().bold(),
        message.dimmed()
    );
}
