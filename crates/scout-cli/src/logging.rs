//! Logging configuration and initialization.
//!
//! Presets map to `EnvFilter` directives over the `scout::*` targets, with
//! per-target overrides from the command line. `RUST_LOG` wins when set.
//! Logs are written to stderr so they never mix with chat output.

use clap::ValueEnum;
use std::collections::HashMap;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging preset levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Connection lifecycle and warnings only
    #[default]
    Production,
    Verbose,
    /// Everything except raw frames
    Debug,
    /// Everything, including every frame sent and received
    Trace,
    /// Warnings and errors only
    Quiet,
}

/// Logging configuration built from CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Per-target level overrides (e.g., "scout::reconnect" -> DEBUG)
    pub overrides: HashMap<String, Level>,
    pub format: LogFormat,
}

impl LogConfig {
    /// Create a new LogConfig from CLI arguments.
    pub fn from_cli(
        verbose: bool,
        debug: bool,
        trace: bool,
        quiet: bool,
        log_overrides: Vec<String>,
        format: LogFormat,
    ) -> Self {
        let preset = if quiet {
            LogPreset::Quiet
        } else if trace {
            LogPreset::Trace
        } else if debug {
            LogPreset::Debug
        } else if verbose {
            LogPreset::Verbose
        } else {
            LogPreset::Production
        };

        // "reconnect=debug" or "ws::frame=trace,session=info"
        let mut overrides = HashMap::new();
        for override_str in log_overrides {
            for part in override_str.split(',') {
                let Some((target, level_str)) = part.split_once('=') else {
                    continue;
                };
                let target = target.trim();
                if let Ok(level) = level_str.trim().parse::<Level>() {
                    overrides.insert(full_target(target), level);
                }
            }
        }

        Self {
            preset,
            overrides,
            format,
        }
    }

    /// Build an EnvFilter from this configuration.
    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }
        EnvFilter::try_new(self.directives().join(","))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    }

    fn directives(&self) -> Vec<String> {
        let mut directives: Vec<String> = match self.preset {
            LogPreset::Production => vec![
                "scout::startup=info".into(),
                "scout::ws=warn".into(),
                "scout::ws::frame=off".into(),
                "scout::reconnect=info".into(),
                "scout::session=warn".into(),
                "scout::timeline=warn".into(),
                "tungstenite=error".into(),
                "tokio_tungstenite=error".into(),
            ],
            LogPreset::Verbose => vec![
                "scout=info".into(),
                "scout::ws::frame=off".into(),
                "tungstenite=warn".into(),
                "tokio_tungstenite=warn".into(),
            ],
            LogPreset::Debug => vec![
                "scout=debug".into(),
                "scout::ws::frame=off".into(),
                "tungstenite=info".into(),
                "tokio_tungstenite=info".into(),
            ],
            LogPreset::Trace => vec![
                "scout=trace".into(),
                "tungstenite=trace".into(),
                "tokio_tungstenite=trace".into(),
            ],
            LogPreset::Quiet => vec![
                "scout=warn".into(),
                "tungstenite=error".into(),
                "tokio_tungstenite=error".into(),
            ],
        };

        for (target, level) in &self.overrides {
            directives.push(format!("{}={}", target, level.as_str().to_ascii_lowercase()));
        }
        directives
    }
}

/// "reconnect" -> "scout::reconnect"; dependency targets pass through.
fn full_target(target: &str) -> String {
    if target.starts_with("scout::")
        || target == "scout"
        || target.starts_with("tungstenite")
        || target.starts_with("tokio_tungstenite")
    {
        target.to_string()
    } else {
        format!("scout::{}", target)
    }
}

/// Install the global subscriber. Output goes to stderr.
pub fn init(config: &LogConfig) {
    let registry = tracing_subscriber::registry().with(config.build_filter());
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
    match config.format {
        LogFormat::Text => registry.with(layer.compact()).init(),
        LogFormat::Json => registry.with(layer.json()).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!(LogFormat::from_str("text", true).unwrap(), LogFormat::Text);
        assert_eq!(LogFormat::from_str("JSON", true).unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("yaml", true).is_err());
    }

    #[test]
    fn test_config_from_cli_preset_priority() {
        let config = LogConfig::from_cli(true, true, true, true, vec![], LogFormat::Text);
        assert_eq!(config.preset, LogPreset::Quiet);

        let config = LogConfig::from_cli(true, true, true, false, vec![], LogFormat::Text);
        assert_eq!(config.preset, LogPreset::Trace);

        let config = LogConfig::from_cli(true, true, false, false, vec![], LogFormat::Text);
        assert_eq!(config.preset, LogPreset::Debug);

        let config = LogConfig::from_cli(true, false, false, false, vec![], LogFormat::Text);
        assert_eq!(config.preset, LogPreset::Verbose);

        let config = LogConfig::from_cli(false, false, false, false, vec![], LogFormat::Text);
        assert_eq!(config.preset, LogPreset::Production);
    }

    #[test]
    fn test_config_overrides_parsing() {
        let config = LogConfig::from_cli(
            false,
            false,
            false,
            false,
            vec!["reconnect=debug".into(), "ws::frame=trace, session=info".into(), "bogus".into()],
            LogFormat::Text,
        );

        assert_eq!(config.overrides.get("scout::reconnect"), Some(&Level::DEBUG));
        assert_eq!(config.overrides.get("scout::ws::frame"), Some(&Level::TRACE));
        assert_eq!(config.overrides.get("scout::session"), Some(&Level::INFO));
        assert_eq!(config.overrides.len(), 3);
    }

    #[test]
    fn test_full_targets_pass_through() {
        let config = LogConfig::from_cli(
            false,
            false,
            false,
            false,
            vec!["scout::timeline=debug".into(), "tungstenite=trace".into()],
            LogFormat::Text,
        );

        assert_eq!(config.overrides.get("scout::timeline"), Some(&Level::DEBUG));
        assert_eq!(config.overrides.get("tungstenite"), Some(&Level::TRACE));
    }

    #[test]
    fn test_overrides_come_after_preset() {
        let config = LogConfig::from_cli(
            false,
            false,
            false,
            false,
            vec!["ws::frame=trace".into()],
            LogFormat::Text,
        );
        let directives = config.directives();
        assert_eq!(directives.last().map(String::as_str), Some("scout::ws::frame=trace"));
        assert!(directives.contains(&"scout::ws::frame=off".to_string()));
    }
}
