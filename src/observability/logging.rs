//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable holding a log filter directive.
pub const LOG_ENV: &str = "PROMPTLEDGER_LOG";

/// Directive used when nothing else is configured.
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Directive used with `--verbose`.
pub const VERBOSE_DIRECTIVE: &str = "debug";

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown log format '{other}' (expected 'pretty' or 'json')"
            ))),
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive.
    pub directive: String,
    /// Line format.
    pub format: LogFormat,
    /// Log file; stderr when `None`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directive: DEFAULT_DIRECTIVE.to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds the config from file settings and the process environment.
    ///
    /// `PROMPTLEDGER_LOG` is consulted first, then `RUST_LOG`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] for an unknown log format.
    pub fn from_env(settings: &LoggingSettings, verbose: bool) -> crate::Result<Self> {
        let env_directive = std::env::var(LOG_ENV)
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .filter(|d| !d.trim().is_empty());
        Self::from_settings(settings, verbose, env_directive)
    }

    /// Builds the config from explicit inputs.
    ///
    /// Directive precedence: environment, then `--verbose`, then the
    /// configured level, then `warn`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] for an unknown log format.
    pub fn from_settings(
        settings: &LoggingSettings,
        verbose: bool,
        env_directive: Option<String>,
    ) -> crate::Result<Self> {
        let directive = env_directive
            .or_else(|| verbose.then(|| VERBOSE_DIRECTIVE.to_string()))
            .or_else(|| settings.level.clone())
            .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string());
        let format = settings
            .format
            .as_deref()
            .map(LogFormat::from_str)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            directive,
            format,
            file: settings.file.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("json", LogFormat::Json ; "json")]
    #[test_case("Pretty", LogFormat::Pretty ; "pretty mixed case")]
    #[test_case("text", LogFormat::Pretty ; "text alias")]
    fn test_log_format_parse(input: &str, expected: LogFormat) {
        assert_eq!(input.parse::<LogFormat>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_format() {
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_directive_precedence() {
        let settings = LoggingSettings {
            level: Some("info".to_string()),
            ..LoggingSettings::default()
        };

        let from_env =
            LoggingConfig::from_settings(&settings, true, Some("trace".to_string())).unwrap();
        assert_eq!(from_env.directive, "trace");

        let verbose = LoggingConfig::from_settings(&settings, true, None).unwrap();
        assert_eq!(verbose.directive, VERBOSE_DIRECTIVE);

        let configured = LoggingConfig::from_settings(&settings, false, None).unwrap();
        assert_eq!(configured.directive, "info");

        let fallback =
            LoggingConfig::from_settings(&LoggingSettings::default(), false, None).unwrap();
        assert_eq!(fallback, LoggingConfig::default());
    }
}
