// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::Rgb;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [session]
/// timeout = 10.0
/// poll_interval_ms = 1
///
/// [display]
/// color = true
/// padding = 24
/// interactor_color = [255, 255, 0]
/// error_color = [255, 70, 0]
/// ```
///
/// All sections are optional and have the defaults shown above.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub session: SessionSection,

    #[serde(default)]
    pub display: DisplaySection,
}

/// `[session]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSection {
    /// Wall-clock budget for the whole interaction, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout: f64,

    /// How long the relay loop sleeps after an iteration that moved no data.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_timeout_secs() -> f64 {
    10.0
}

fn default_poll_interval_ms() -> u64 {
    1
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            timeout: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// `[display]` section: how the transcript is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplaySection {
    #[serde(default = "default_color")]
    pub color: bool,

    /// Column offset of interactor lines.
    #[serde(default = "default_padding")]
    pub padding: usize,

    #[serde(default = "default_interactor_color")]
    pub interactor_color: Rgb,

    #[serde(default = "default_error_color")]
    pub error_color: Rgb,
}

fn default_color() -> bool {
    true
}

fn default_padding() -> usize {
    24
}

fn default_interactor_color() -> Rgb {
    Rgb::new(255, 255, 0)
}

fn default_error_color() -> Rgb {
    Rgb::new(255, 70, 0)
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            color: default_color(),
            padding: default_padding(),
            interactor_color: default_interactor_color(),
            error_color: default_error_color(),
        }
    }
}

/// Validated harness configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// so every instance has a positive finite timeout and sane display values.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    timeout: Duration,
    poll_interval: Duration,
    display: DisplaySection,
}

impl HarnessConfig {
    pub(crate) fn new_unchecked(
        timeout: Duration,
        poll_interval: Duration,
        display: DisplaySection,
    ) -> Self {
        Self {
            timeout,
            poll_interval,
            display,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn display(&self) -> &DisplaySection {
        &self.display
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new_unchecked(
            Duration::from_secs_f64(default_timeout_secs()),
            Duration::from_millis(default_poll_interval_ms()),
            DisplaySection::default(),
        )
    }
}
