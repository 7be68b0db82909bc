use anyhow::{Context, Result};
use sentry::{types::Dsn, ClientInitGuard, ClientOptions, Level};

/// Starts the Sentry client when a DSN is configured. Keep the guard alive until shutdown so
/// queued events are flushed.
pub fn init(dsn: Option<&str>) -> Result<Option<ClientInitGuard>> {
    let Some(raw) = dsn else {
        tracing::info!("error reporting disabled");
        return Ok(None);
    };
    let dsn: Dsn = raw.trim().parse().context("invalid SENTRY_URL")?;
    let guard = sentry::init(ClientOptions { dsn: Some(dsn), release: sentry::release_name!(), ..Default::default() });
    tracing::info!(enabled = guard.is_enabled(), "error reporting initialised");
    Ok(Some(guard))
}

// Both are no-ops while no client is bound.
pub fn capture_error(error: &anyhow::Error) { sentry::integrations::anyhow::capture_anyhow(error); }

pub fn capture_panic(detail: &str) { sentry::capture_message(&format!("handler panicked: {detail}"), Level::Fatal); }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dsn_leaves_reporting_off() {
        assert!(init(None).unwrap().is_none());
        assert!(sentry::Hub::current().client().is_none());
    }

    #[test]
    fn malformed_dsn_fails_startup() {
        assert!(init(Some("not a dsn")).is_err());
    }

    #[test]
    fn captures_errors_and_panics() {
        let events = sentry::test::with_captured_events(|| {
            capture_error(&anyhow::anyhow!("disk full"));
            capture_panic("kaboom");
        });
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].level, Level::Fatal);
        assert!(events[1].message.as_deref().unwrap_or_default().contains("kaboom"));
    }
}
