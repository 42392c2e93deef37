use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Chatty dependency targets held at `warn` unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: &[&str] = &["hyper=warn", "reqwest=warn", "h2=warn", "rustls=warn"];

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "invalid log level/filter '{value}': unable to build EnvFilter")
            }
            TelemetryError::Subscriber(err) => write!(f, "telemetry error: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Filter directive for the configured level with dependency noise suppressed.
pub fn filter_directive(log_level: &str) -> String {
    let mut directives = vec![log_level.trim().to_string()];
    directives.extend(
        QUIET_TARGETS
            .iter()
            .filter(|quiet| {
                let target = quiet.split('=').next().unwrap_or_default();
                !log_level.contains(target)
            })
            .map(|quiet| quiet.to_string()),
    );
    directives.join(",")
}

fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directive = filter_directive(&config.log_level);
    EnvFilter::try_new(&directive).map_err(|source| TelemetryError::EnvFilter {
        value: config.log_level.clone(),
        source,
    })
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_appends_quiet_targets() {
        assert_eq!(
            filter_directive("debug"),
            "debug,hyper=warn,reqwest=warn,h2=warn,rustls=warn"
        );
    }

    #[test]
    fn explicit_target_levels_are_kept() {
        let directive = filter_directive("info,reqwest=trace");
        assert!(directive.starts_with("info,reqwest=trace"));
        assert!(!directive.contains("reqwest=warn"));
    }

    #[test]
    fn rejects_malformed_level() {
        let config = TelemetryConfig {
            log_level: "energy_ai=verbose".to_string(),
        };
        if std::env::var("RUST_LOG").is_err() {
            assert!(matches!(
                build_filter(&config),
                Err(TelemetryError::EnvFilter { .. })
            ));
        }
    }
}
