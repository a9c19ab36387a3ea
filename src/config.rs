//! Container options.
//!
//! Options are plain data: build them in code, read them from the
//! environment with [`ContainerOptions::from_env`], or, with the `config`
//! feature, deserialize them from any serde source.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Environment variable naming the container in log events.
pub const ENV_NAME: &str = "FERROUS_IOC_NAME";
/// Environment variable enabling per-resolution tracing.
pub const ENV_DEBUG: &str = "FERROUS_IOC_DEBUG";

const UNNAMED: &str = "ioc";

/// Options applied when a container is built.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, ContainerOptions};
///
/// let options = ContainerOptions::new().with_name("request").with_trace_resolution(true);
/// assert_eq!(options.label(), "request");
///
/// let container = Container::with_options(options);
/// assert_eq!(container.options().label(), "request");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerOptions {
    /// Label carried by every log event of the container.
    pub name: Option<String>,
    /// Emit a `trace` event with timings for every resolution.
    pub trace_resolution: bool,
}

impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads [`ENV_NAME`] and [`ENV_DEBUG`]. Unset or unparsable values keep
    /// their defaults.
    pub fn from_env() -> Self {
        let name = env::var(ENV_NAME).ok().filter(|n| !n.trim().is_empty());
        let trace_resolution = env::var(ENV_DEBUG)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        Self { name, trace_resolution }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_trace_resolution(mut self, enabled: bool) -> Self {
        self.trace_resolution = enabled;
        self
    }

    /// The configured name, or `"ioc"`.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
