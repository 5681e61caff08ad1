//! Quarry logging.
//!
//! Small, environment-controlled logging used by the quarry crates. Nothing
//! is installed globally; the first macro call reads the environment once.
//!
//! ```rust
//! use quarry_log::{debug, event, info, Level};
//!
//! info!("connected to {}", "http://localhost:9200");
//! debug!(target: "quarry::scroll", "advancing cursor");
//! event!(Level::Debug, "batch delivered"; size = 1000, total = 2500);
//! ```
//!
//! # Environment Variables
//!
//! - `QUARRY_DEBUG=1` - Enable debug logging
//! - `QUARRY_LOG_LEVEL=trace|debug|info|warn|error|off` - Minimum level
//! - `QUARRY_LOG_FORMAT=pretty|compact|json` - Output format (default `json`)
//! - `QUARRY_LOG_TIMESTAMPS=1|0` - Include timestamps in text formats

use once_cell::sync::Lazy;
use std::env;
use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    /// Most verbose.
    Trace = 0,
    /// Diagnostics.
    Debug = 1,
    /// Lifecycle events.
    Info = 2,
    /// Recoverable problems.
    Warn = 3,
    /// Failures.
    Error = 4,
    /// Nothing is emitted.
    Off = 5,
}

impl Level {
    /// Parse a level name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "off" | "none" => Some(Level::Off),
            _ => None,
        }
    }

    /// Upper-case name used in output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            _ => Level::Off,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human readable, one record per line with full timestamp.
    Pretty,
    /// Terse single-letter level and short timestamp.
    Compact,
    /// One JSON object per line.
    Json,
}

impl Format {
    /// Parse a format name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);
static CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::from_env);

/// Logging configuration, read from the environment on first use.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `QUARRY_DEBUG` was set.
    pub debug: bool,
    /// Minimum level at startup.
    pub level: Level,
    /// Output format.
    pub format: Format,
    /// Include timestamps in text formats.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Info,
            format: Format::Json,
            timestamps: true,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

impl LogConfig {
    /// Build the configuration from `QUARRY_*` variables and publish the
    /// level to the global atomics.
    pub fn from_env() -> Self {
        let debug = env_flag("QUARRY_DEBUG").unwrap_or(false);
        let level = env::var("QUARRY_LOG_LEVEL")
            .ok()
            .and_then(|s| Level::parse(&s))
            .unwrap_or(if debug { Level::Debug } else { Level::Info });
        let format = env::var("QUARRY_LOG_FORMAT")
            .ok()
            .and_then(|s| Format::parse(&s))
            .unwrap_or(Format::Json);
        let timestamps = env_flag("QUARRY_LOG_TIMESTAMPS").unwrap_or(true);

        DEBUG_ENABLED.store(debug, Ordering::SeqCst);
        LOG_LEVEL.store(level as u8, Ordering::SeqCst);

        Self {
            debug,
            level,
            format,
            timestamps,
        }
    }
}

/// Force the environment to be read now instead of on the first record.
pub fn init() {
    Lazy::force(&CONFIG);
}

/// Global configuration.
pub fn config() -> &'static LogConfig {
    &CONFIG
}

/// Whether debug mode is on.
#[inline]
pub fn is_debug_enabled() -> bool {
    init();
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Whether records at `level` are emitted. Reads the environment first if
/// no record has been logged yet.
#[inline]
pub fn is_level_enabled(level: Level) -> bool {
    init();
    if level == Level::Off {
        return false;
    }
    if level == Level::Debug && is_debug_enabled() {
        return true;
    }
    level as u8 >= LOG_LEVEL.load(Ordering::Relaxed)
}

/// Current minimum level.
pub fn current_level() -> Level {
    init();
    Level::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Change the minimum level at runtime.
pub fn set_level(level: Level) {
    init();
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Toggle debug mode at runtime. Enabling it lowers the level to `Debug`.
pub fn set_debug(enabled: bool) {
    init();
    DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    if enabled && current_level() > Level::Debug {
        LOG_LEVEL.store(Level::Debug as u8, Ordering::SeqCst);
    }
}

/// Emit a plain record. Used by the macros.
#[doc(hidden)]
pub fn log(level: Level, target: &str, message: &str) {
    log_fields(level, target, message, &[]);
}

/// Emit a record with structured key/value fields.
pub fn log_fields(level: Level, target: &str, message: &str, fields: &[(&str, String)]) {
    let config = config();
    if !is_level_enabled(level) {
        return;
    }

    let line = match config.format {
        Format::Pretty => render_pretty(level, target, message, fields, config.timestamps),
        Format::Compact => render_compact(level, target, message, fields, config.timestamps),
        Format::Json => render_json(level, target, message, fields),
    };

    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{}", line);
}

fn push_fields(out: &mut String, fields: &[(&str, String)]) {
    for (key, value) in fields {
        out.push(' ');
        out.push_str(key);
        out.push('=');
        out.push_str(value);
    }
}

fn render_pretty(
    level: Level,
    target: &str,
    message: &str,
    fields: &[(&str, String)],
    timestamps: bool,
) -> String {
    let mut out = String::new();
    if timestamps {
        out.push_str(&chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f ").to_string());
    }

    #[cfg(feature = "color")]
    {
        use colored::Colorize;
        let name = match level {
            Level::Trace => level.as_str().magenta(),
            Level::Debug => level.as_str().blue(),
            Level::Info => level.as_str().green(),
            Level::Warn => level.as_str().yellow(),
            Level::Error => level.as_str().red().bold(),
            Level::Off => level.as_str().normal(),
        };
        out.push_str(&format!("{:5} ", name));
    }
    #[cfg(not(feature = "color"))]
    out.push_str(&format!("{:5} ", level.as_str()));

    if !target.is_empty() {
        out.push_str(&format!("[{}] ", target));
    }
    out.push_str(message);
    push_fields(&mut out, fields);
    out
}

fn render_compact(
    level: Level,
    target: &str,
    message: &str,
    fields: &[(&str, String)],
    timestamps: bool,
) -> String {
    let mut out = String::new();
    if timestamps {
        out.push_str(&chrono::Local::now().format("%H:%M:%S ").to_string());
    }
    out.push_str(&level.as_str()[..1]);
    out.push(' ');
    if !target.is_empty() {
        out.push_str(target);
        out.push_str(": ");
    }
    out.push_str(message);
    push_fields(&mut out, fields);
    out
}

#[cfg(feature = "json")]
fn render_json(level: Level, target: &str, message: &str, fields: &[(&str, String)]) -> String {
    let mut record = serde_json::Map::new();
    record.insert(
        "timestamp".to_string(),
        serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
    );
    record.insert("level".to_string(), level.as_str().into());
    record.insert("target".to_string(), target.into());
    record.insert("message".to_string(), message.into());
    if !fields.is_empty() {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
            .collect();
        record.insert("fields".to_string(), serde_json::Value::Object(fields));
    }
    serde_json::Value::Object(record).to_string()
}

#[cfg(not(feature = "json"))]
fn render_json(level: Level, target: &str, message: &str, fields: &[(&str, String)]) -> String {
    let mut out = format!(
        r#"{{"timestamp":"{}","level":"{}","target":"{}","message":"{}""#,
        chrono::Utc::now().to_rfc3339(),
        level.as_str(),
        escape_json(target),
        escape_json(message)
    );
    if !fields.is_empty() {
        let rendered: Vec<String> = fields
            .iter()
            .map(|(k, v)| format!(r#""{}":"{}""#, escape_json(k), escape_json(v)))
            .collect();
        out.push_str(&format!(r#","fields":{{{}}}"#, rendered.join(",")));
    }
    out.push('}');
    out
}

#[cfg(not(feature = "json"))]
fn escape_json(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c.is_control() => escaped.push_str(&format!("\\u{:04x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Emit a record at an explicit level with structured fields.
///
/// ```rust
/// use quarry_log::{event, Level};
///
/// let id = "c2Nhbjs";
/// event!(Level::Debug, "cursor released"; scroll_id = id);
/// event!(Level::Info, "indexed {} documents", 3; index = "articles");
/// ```
#[macro_export]
macro_rules! event {
    ($level:expr, $fmt:literal $(, $arg:expr)* ; $($key:ident = $value:expr),+ $(,)?) => {
        if $crate::is_level_enabled($level) {
            $crate::log_fields(
                $level,
                module_path!(),
                &format!($fmt $(, $arg)*),
                &[$((stringify!($key), format!("{}", $value))),+],
            );
        }
    };
    ($level:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($level) {
            $crate::log($level, module_path!(), &format!($($arg)+));
        }
    };
}

/// Log at `Trace`.
#[macro_export]
macro_rules! trace {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Trace) {
            $crate::log($crate::Level::Trace, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Trace) {
            $crate::log($crate::Level::Trace, module_path!(), &format!($($arg)+));
        }
    };
}

/// Log at `Debug`. Enabled by `QUARRY_DEBUG=1` or `QUARRY_LOG_LEVEL=debug`.
#[macro_export]
macro_rules! debug {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Debug) {
            $crate::log($crate::Level::Debug, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Debug) {
            $crate::log($crate::Level::Debug, module_path!(), &format!($($arg)+));
        }
    };
}

/// Log at `Info`.
#[macro_export]
macro_rules! info {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Info) {
            $crate::log($crate::Level::Info, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Info) {
            $crate::log($crate::Level::Info, module_path!(), &format!($($arg)+));
        }
    };
}

/// Log at `Warn`.
#[macro_export]
macro_rules! warn {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Warn) {
            $crate::log($crate::Level::Warn, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Warn) {
            $crate::log($crate::Level::Warn, module_path!(), &format!($($arg)+));
        }
    };
}

/// Log at `Error`.
#[macro_export]
macro_rules! error {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Error) {
            $crate::log($crate::Level::Error, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Error) {
            $crate::log($crate::Level::Error, module_path!(), &format!($($arg)+));
        }
    };
}
