//! Structured Logging with Sensitive Data Redaction
//!
//! Writes `[timestamp] LEVEL [module] message | key=value` lines to stderr.
//! Field values are redacted according to their key:
//! - secrets (private keys, seeds, passwords) are fully hidden
//! - addresses keep their leading and trailing characters
//! - digests and signatures are shortened

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable debug logging
pub fn enable_debug() {
    DEBUG_ENABLED.store(true, Ordering::SeqCst);
}

/// Disable debug logging
pub fn disable_debug() {
    DEBUG_ENABLED.store(false, Ordering::SeqCst);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const SECRET_KEYS: &[&str] = &[
    "private_key", "privatekey", "secret", "seed", "password", "passphrase", "private",
    "key_hex", "signing_key",
];
const ADDRESS_KEYS: &[&str] = &["address", "signer", "referrer", "executor"];
const HASH_KEYS: &[&str] = &["hash", "digest", "separator", "signature"];

/// How a field value is rendered in log output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redaction {
    Full,
    Address,
    Hash,
    Plain,
}

impl Redaction {
    /// Choose a redaction from the field name. Secrets win over addresses,
    /// addresses over hashes.
    pub fn for_key(key: &str) -> Self {
        let key = key.to_lowercase();
        let matches = |names: &[&str]| names.iter().any(|name| key.contains(name));

        if matches(SECRET_KEYS) {
            Redaction::Full
        } else if matches(ADDRESS_KEYS) {
            Redaction::Address
        } else if matches(HASH_KEYS) {
            Redaction::Hash
        } else {
            Redaction::Plain
        }
    }

    pub fn apply(self, value: &str) -> String {
        let value = value.trim();
        if value.is_empty() {
            return "[EMPTY]".to_string();
        }

        match self {
            Redaction::Full => hide(value),
            // 0x + 6 hex chars ... 4 hex chars
            Redaction::Address => shorten(value, 6, 4).unwrap_or_else(|| hide(value)),
            // 0x + 10 hex chars ... 6 hex chars
            Redaction::Hash => shorten(value, 10, 6).unwrap_or_else(|| value.to_string()),
            Redaction::Plain => value.to_string(),
        }
    }
}

fn hide(value: &str) -> String {
    if value.len() <= 4 {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED:{}chars]", value.len())
    }
}

/// Keep `head` characters after an optional `0x` and the last `tail`
/// characters. `None` when the value is too short to shorten meaningfully.
fn shorten(value: &str, head: usize, tail: usize) -> Option<String> {
    if !value.is_ascii() {
        return None;
    }
    let prefix = if value.starts_with("0x") { 2 } else { 0 };
    let keep = prefix + head;
    if value.len() <= keep + tail + 3 {
        return None;
    }

    Some(format!("{}...{}", &value[..keep], &value[value.len() - tail..]))
}

/// Structured log entry
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field, redacted according to its key
    pub fn field(self, key: &'static str, value: impl fmt::Display) -> Self {
        self.with_redaction(key, value, Redaction::for_key(key))
    }

    /// Add a field that is always fully redacted
    pub fn redacted_field(self, key: &'static str, value: impl fmt::Display) -> Self {
        self.with_redaction(key, value, Redaction::Full)
    }

    fn with_redaction(mut self, key: &'static str, value: impl fmt::Display, redaction: Redaction) -> Self {
        self.fields.push((key, redaction.apply(&value.to_string())));
        self
    }

    /// Render the line without the timestamp
    pub fn render(&self) -> String {
        let mut line = format!("{} [{}] {}", self.level, self.module, self.message);
        for (i, (key, value)) in self.fields.iter().enumerate() {
            line.push_str(if i == 0 { " | " } else { " " });
            line.push_str(key);
            line.push('=');
            line.push_str(value);
        }
        line
    }

    pub fn log(self) {
        if self.level == LogLevel::Debug && !is_debug_enabled() {
            return;
        }

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        eprintln!("[{}] {}", timestamp, self.render());
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    ($level:ident, $module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::$level,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Log at debug level; dropped unless debug logging is enabled
#[macro_export]
macro_rules! log_debug {
    ($($args:tt)*) => { $crate::__log_at!(Debug, $($args)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($args:tt)*) => { $crate::__log_at!(Info, $($args)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($args:tt)*) => { $crate::__log_at!(Warn, $($args)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($args:tt)*) => { $crate::__log_at!(Error, $($args)*) };
}
