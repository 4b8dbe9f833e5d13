//! Log level plumbing for the `log` facade
//!
//! The crate logs through `log::debug!` and friends; the host application
//! installs whatever logger it likes. [`apply`] caps the global level.

/// Log levels, ordered from quietest to noisiest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Nothing,
    Error,
    Warning,
    Info,
    Debug,
    All,
}

impl LogLevel {
    /// Parse a level name as written in an options file
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "off" | "nothing" | "none" => Some(LogLevel::Nothing),
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warning),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" | "all" => Some(LogLevel::All),
            _ => None,
        }
    }

    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Nothing => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::All => log::LevelFilter::Trace,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

/// Set the global `log` ceiling to `level`
pub fn apply(level: LogLevel) {
    log::set_max_level(level.to_level_filter());
}
