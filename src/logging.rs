use env_logger::{Builder, Env};
use log::LevelFilter;
use chrono::Local;
use std::io::Write;
use yansi::Paint;

/// Initializes the application's logging system with the specified log level
///
/// `RUST_LOG` still wins when it is set. Valid log levels are: error, warn,
/// info, debug, trace. Calling this twice is harmless.
pub fn init(log_level: &str) {
    let level = parse_log_level(log_level);
    let env = Env::default()
        .filter_or("RUST_LOG", level.as_str().to_lowercase())
        .write_style_or("RUST_LOG_STYLE", "auto");

    let _ = Builder::from_env(env)
        .format(|buf, record| writeln!(buf, "{}", format_log(record)))
        .try_init();
}

/// Formats a log record into a structured string
///
/// Returns a formatted string with timestamp, level, target and message
pub fn format_log(record: &log::Record) -> String {
    let level = match record.level() {
        log::Level::Error => Paint::red("ERROR").bold(),
        log::Level::Warn => Paint::yellow("WARN ").bold(),
        log::Level::Info => Paint::cyan("INFO ").bold(),
        log::Level::Debug => Paint::blue("DEBUG").bold(),
        log::Level::Trace => Paint::new("TRACE"),
    };

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let target = if !record.target().is_empty() {
        record.target()
    } else {
        record.module_path().unwrap_or("unknown")
    };

    format!("[{}] {} [{}] {}", timestamp, level, target, record.args())
}

/// Parses a log level string into a LevelFilter
///
/// Returns the corresponding LevelFilter, defaulting to Info for invalid strings
pub fn parse_log_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}
