//! Per-graph logging level (spec §4, REDESIGN FLAGS: "a per-thread error
//! stack and a per-graph logging level" in place of process-global
//! verbose/debug flags).
//!
//! The core never calls `tracing_subscriber::fmt::init()` itself — an
//! embedding application wires up its own subscriber, the way the
//! teacher's binary does in `main`. What the core owns is the
//! *threshold* each graph logs at, since that is graph-scoped state a
//! plug-in needs to consult, not global configuration.

use std::cell::Cell;
use std::str::FromStr;

/// Mirrors the teacher's own `LoggingLevel` CLI option: a level below
/// which a graph's own log statements are skipped, independent of
/// whatever filter the embedding application's subscriber applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoggingLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    None,
}

impl Default for LoggingLevel {
    fn default() -> Self {
        LoggingLevel::Warn
    }
}

impl FromStr for LoggingLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LoggingLevel::Trace),
            "debug" => Ok(LoggingLevel::Debug),
            "info" => Ok(LoggingLevel::Info),
            "warn" | "warning" => Ok(LoggingLevel::Warn),
            "error" => Ok(LoggingLevel::Error),
            "none" | "off" => Ok(LoggingLevel::None),
            other => Err(format!("unrecognized logging level `{other}`")),
        }
    }
}

/// A graph's current logging threshold. Plain `Cell` rather than
/// anything fancier: read/written only from the single thread that
/// owns the graph, matching the crate's cooperative, single-threaded
/// scheduling model (spec §5).
#[derive(Debug, Default)]
pub struct GraphLogLevel(Cell<LoggingLevel>);

impl GraphLogLevel {
    pub fn new(level: LoggingLevel) -> Self {
        Self(Cell::new(level))
    }

    pub fn get(&self) -> LoggingLevel {
        self.0.get()
    }

    pub fn set(&self, level: LoggingLevel) {
        self.0.set(level);
    }

    pub fn enabled(&self, level: LoggingLevel) -> bool {
        level >= self.0.get()
    }
}

/// Emits `tracing::event!` at `$level` only if `$threshold` (a
/// [`LoggingLevel`]) allows it, so a noisy source/filter can be
/// silenced per graph without touching the process-wide subscriber
/// filter.
macro_rules! graph_log {
    ($threshold:expr, $level:expr, $($arg:tt)*) => {
        if $level >= $threshold {
            match $level {
                $crate::log::LoggingLevel::Trace => ::tracing::trace!($($arg)*),
                $crate::log::LoggingLevel::Debug => ::tracing::debug!($($arg)*),
                $crate::log::LoggingLevel::Info => ::tracing::info!($($arg)*),
                $crate::log::LoggingLevel::Warn => ::tracing::warn!($($arg)*),
                $crate::log::LoggingLevel::Error => ::tracing::error!($($arg)*),
                $crate::log::LoggingLevel::None => {}
            }
        }
    };
}
pub(crate) use graph_log;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_is_warn() {
        assert_eq!(LoggingLevel::default(), LoggingLevel::Warn);
    }

    #[test]
    fn enabled_respects_ordering() {
        let level = GraphLogLevel::new(LoggingLevel::Warn);
        assert!(level.enabled(LoggingLevel::Error));
        assert!(!level.enabled(LoggingLevel::Debug));
    }

    #[test]
    fn parses_recognized_names_case_insensitively() {
        assert_eq!("WARN".parse::<LoggingLevel>().unwrap(), LoggingLevel::Warn);
        assert_eq!("Info".parse::<LoggingLevel>().unwrap(), LoggingLevel::Info);
        assert!("bogus".parse::<LoggingLevel>().is_err());
    }
}
