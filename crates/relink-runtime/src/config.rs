#![forbid(unsafe_code)]

//! Connection configuration.
//!
//! With the `config` feature, a [`ConnectionConfig`] can be loaded from TOML:
//!
//! ```toml
//! label = "settings-screen"
//! emit_current_on_subscribe = true
//! ```
//!
//! Missing keys fall back to [`ConnectionConfig::default`].

use std::borrow::Cow;

/// Behavior knobs for a [`Connection`](crate::Connection).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ConnectionConfig {
    /// Name recorded on log records and spans for this connection.
    pub label: Cow<'static, str>,
    /// Whether new subscriptions and bindings receive the current field value
    /// immediately, before the next change. Off by default: a subscription
    /// first fires on the next state change.
    pub emit_current_on_subscribe: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            label: Cow::Borrowed("connection"),
            emit_current_on_subscribe: false,
        }
    }
}

impl ConnectionConfig {
    #[must_use]
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_emit_current_on_subscribe(mut self, emit: bool) -> Self {
        self.emit_current_on_subscribe = emit;
        self
    }

    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid TOML or has
    /// keys of the wrong type.
    #[cfg(feature = "config")]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))
    }
}

/// Error type for configuration loading.
#[cfg(feature = "config")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration text could not be parsed.
    Parse(String),
}

#[cfg(feature = "config")]
impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "invalid connection config: {msg}"),
        }
    }
}

#[cfg(feature = "config")]
impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.label, "connection");
        assert!(!config.emit_current_on_subscribe);
    }

    #[test]
    fn builder_methods() {
        let config = ConnectionConfig::default()
            .with_label("profile")
            .with_emit_current_on_subscribe(true);
        assert_eq!(config.label, "profile");
        assert!(config.emit_current_on_subscribe);
    }

    #[cfg(feature = "config")]
    #[test]
    fn parses_toml() {
        let config = ConnectionConfig::from_toml_str(
            "label = \"settings\"\nemit_current_on_subscribe = true\n",
        )
        .unwrap();
        assert_eq!(config.label, "settings");
        assert!(config.emit_current_on_subscribe);
    }

    #[cfg(feature = "config")]
    #[test]
    fn missing_keys_use_defaults() {
        let config = ConnectionConfig::from_toml_str("label = \"only\"").unwrap();
        assert!(!config.emit_current_on_subscribe);
    }

    #[cfg(feature = "config")]
    #[test]
    fn rejects_wrong_types() {
        let err = ConnectionConfig::from_toml_str("emit_current_on_subscribe = \"yes\"")
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid connection config"));
    }
}
