use std::fmt;
use std::str::FromStr;

/// Embed color used for `Panic`, `Fatal` and `Error` events.
pub const COLOR_ERROR: u32 = 16725591;
/// Embed color used for `Warn` events.
pub const COLOR_WARN: u32 = 16760630;
/// Embed color used for every other level.
pub const COLOR_INFO: u32 = 12434877;

/// Levels a hook subscribes to when the caller does not pick any.
pub const DEFAULT_LEVELS: [Level; 4] = [Level::Panic, Level::Fatal, Level::Error, Level::Warn];

/// Severity of a log event, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Panic,
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Level {
    pub const ALL: [Level; 7] = [
        Level::Panic,
        Level::Fatal,
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
        Level::Trace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Panic => "panic",
            Level::Fatal => "fatal",
            Level::Error => "error",
            Level::Warn => "warning",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        }
    }

    /// Embed color for this level.
    pub fn color(self) -> u32 {
        match self {
            Level::Panic | Level::Fatal | Level::Error => COLOR_ERROR,
            Level::Warn => COLOR_WARN,
            _ => COLOR_INFO,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG => Level::Debug,
            _ => Level::Trace,
        }
    }
}

/// Error returned when a level name cannot be parsed.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("not a valid log level: {0:?}")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "panic" => Ok(Level::Panic),
            "fatal" => Ok(Level::Fatal),
            "error" => Ok(Level::Error),
            "warn" | "warning" => Ok(Level::Warn),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            "trace" => Ok(Level::Trace),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Outcome of classifying a level against a subscription set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub color: u32,
    pub subscribed: bool,
}

/// Map `level` to its embed color and whether `subscribed` includes it.
pub fn classify(level: Level, subscribed: &[Level]) -> Classification {
    Classification {
        color: level.color(),
        subscribed: subscribed.contains(&level),
    }
}

/// Resolve the effective subscription set: an empty selection means the
/// default set, anything else replaces it.
pub fn effective_levels(levels: &[Level]) -> Vec<Level> {
    if levels.is_empty() {
        DEFAULT_LEVELS.to_vec()
    } else {
        levels.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_follow_severity_families() {
        for level in [Level::Panic, Level::Fatal, Level::Error] {
            assert_eq!(level.color(), COLOR_ERROR);
        }
        assert_eq!(Level::Warn.color(), COLOR_WARN);
        for level in [Level::Info, Level::Debug, Level::Trace] {
            assert_eq!(level.color(), COLOR_INFO);
        }
    }

    #[test]
    fn explicit_levels_replace_defaults() {
        assert_eq!(effective_levels(&[]), DEFAULT_LEVELS.to_vec());
        assert_eq!(effective_levels(&[Level::Info]), vec![Level::Info]);
    }

    #[test]
    fn classify_reports_subscription() {
        let c = classify(Level::Info, &DEFAULT_LEVELS);
        assert!(!c.subscribed);
        assert_eq!(c.color, COLOR_INFO);
        assert!(classify(Level::Warn, &DEFAULT_LEVELS).subscribed);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("WARN".parse::<Level>(), Ok(Level::Warn));
        assert_eq!("warning".parse::<Level>(), Ok(Level::Warn));
        assert_eq!(" Error ".parse::<Level>(), Ok(Level::Error));
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn maps_tracing_levels() {
        assert_eq!(Level::from(&tracing::Level::ERROR), Level::Error);
        assert_eq!(Level::from(&tracing::Level::WARN), Level::Warn);
        assert_eq!(Level::from(&tracing::Level::TRACE), Level::Trace);
    }
}
