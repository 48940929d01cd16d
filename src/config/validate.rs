// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{DisplaySection, HarnessConfig, RawConfigFile, SessionSection};
use crate::errors::{InteractError, Result};

const MAX_PADDING: usize = 200;
const MAX_POLL_INTERVAL_MS: u64 = 1000;

impl TryFrom<RawConfigFile> for HarnessConfig {
    type Error = InteractError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let timeout = validate_timeout(&raw.session)?;
        let poll_interval = validate_poll_interval(&raw.session)?;
        validate_display(&raw.display)?;
        Ok(HarnessConfig::new_unchecked(
            timeout,
            poll_interval,
            raw.display,
        ))
    }
}

fn validate_timeout(session: &SessionSection) -> Result<Duration> {
    let secs = session.timeout;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(InteractError::ConfigError(format!(
            "[session].timeout must be a positive number of seconds (got {secs})"
        )));
    }

    Duration::try_from_secs_f64(secs).map_err(|e| {
        InteractError::ConfigError(format!("[session].timeout {secs} is out of range: {e}"))
    })
}

fn validate_poll_interval(session: &SessionSection) -> Result<Duration> {
    if session.poll_interval_ms > MAX_POLL_INTERVAL_MS {
        return Err(InteractError::ConfigError(format!(
            "[session].poll_interval_ms must be <= {MAX_POLL_INTERVAL_MS} (got {})",
            session.poll_interval_ms
        )));
    }
    Ok(Duration::from_millis(session.poll_interval_ms))
}

fn validate_display(display: &DisplaySection) -> Result<()> {
    if display.padding > MAX_PADDING {
        return Err(InteractError::ConfigError(format!(
            "[display].padding must be <= {MAX_PADDING} (got {})",
            display.padding
        )));
    }
    Ok(())
}
