use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::logging::{self, LogLevel};

/// Options controlling how a WAVE stream is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Step over chunks such as `LIST` instead of failing on them
    pub skip_unknown_chunks: bool,
    /// Upper bound on the declared `data` payload, `None` for no limit
    pub max_data_bytes: Option<usize>,
    /// Global log ceiling. Decoding never touches it; [`load_options`] and
    /// [`DecoderOptions::apply_log_level`] install it.
    pub log_level: LogLevel,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            skip_unknown_chunks: false,
            max_data_bytes: None,
            log_level: LogLevel::Info,
        }
    }
}

impl DecoderOptions {
    /// Set the global `log` ceiling to `log_level`
    pub fn apply_log_level(&self) {
        logging::apply(self.log_level);
    }
}

/// Load options from a `key = value` file and apply its log level
pub fn load_options(path: &Path) -> Result<DecoderOptions> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read options file {}", path.display()))?;
    let opts = parse_options(&text)
        .with_context(|| format!("Invalid options file {}", path.display()))?;
    opts.apply_log_level();
    Ok(opts)
}

/// Parse options from `key = value` lines; `#` starts a comment.
///
/// Keys not listed here are logged and ignored.
pub fn parse_options(text: &str) -> Result<DecoderOptions> {
    let mut opts = DecoderOptions::default();

    for (lineno, line) in text.lines().enumerate() {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            anyhow::bail!("Line {}: key without value", lineno + 1);
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "skip_unknown_chunks" => {
                opts.skip_unknown_chunks = parse_bool(value)
                    .with_context(|| format!("Line {}: skip_unknown_chunks", lineno + 1))?;
            }
            "max_data_bytes" => {
                opts.max_data_bytes = parse_size(value)
                    .with_context(|| format!("Line {}: max_data_bytes", lineno + 1))?;
            }
            "log_level" => {
                opts.log_level = LogLevel::from_name(value).with_context(|| {
                    format!("Line {}: unknown log level '{}'", lineno + 1, value)
                })?;
            }
            other => log::warn!("Ignoring unknown option '{}'", other),
        }
    }

    Ok(opts)
}

/// Parse a boolean option value
pub fn parse_bool(s: &str) -> Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => anyhow::bail!("Expected a boolean, got '{}'", s),
    }
}

/// Parse a byte count with an optional `K`/`M`/`G` suffix; `none` means unlimited
pub fn parse_size(s: &str) -> Result<Option<usize>> {
    if s.eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    let (digits, scale) = match s.chars().last().map(|c| c.to_ascii_uppercase()) {
        Some('K') => (&s[..s.len() - 1], 1usize << 10),
        Some('M') => (&s[..s.len() - 1], 1 << 20),
        Some('G') => (&s[..s.len() - 1], 1 << 30),
        _ => (s, 1),
    };
    let count: usize = digits.trim().parse().context("Invalid size value")?;
    let bytes = count
        .checked_mul(scale)
        .with_context(|| format!("Size '{}' overflows", s))?;
    Ok(Some(bytes))
}
