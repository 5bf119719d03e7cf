//! Centralized configuration for acidlens.
//!
//! - `AcidConfig::from_env()` reads ACID_* environment variables.
//! - Fluent `with_*` setters override single fields.
//!
//! Env:
//! - ACID_ALLOW_ORIGINALS = 0|1|true|false|on|off|yes|no (default true)
//! - ACID_DEFAULT_TRANSACTIONAL_TYPE = none|insert_only (default none)

use std::fmt;

use log::warn;

use crate::props::TransactionalType;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcidConfig {
    /// Read pre-upgrade files (outside base/delta dirs) while no valid base exists.
    /// When false such files are never returned.
    pub allow_originals: bool,

    /// Mode applied by `set_transactional_properties` for new tables.
    pub default_transactional_type: TransactionalType,
}

impl Default for AcidConfig {
    fn default() -> Self {
        Self {
            allow_originals: true,
            default_transactional_type: TransactionalType::None,
        }
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl AcidConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("ACID_ALLOW_ORIGINALS") {
            match parse_bool(&v) {
                Some(b) => cfg.allow_originals = b,
                None => warn!("ACID_ALLOW_ORIGINALS: ignoring unrecognized value '{v}'"),
            }
        }

        if let Ok(v) = std::env::var("ACID_DEFAULT_TRANSACTIONAL_TYPE") {
            match v.parse::<TransactionalType>() {
                Ok(t) => cfg.default_transactional_type = t,
                Err(e) => warn!("ACID_DEFAULT_TRANSACTIONAL_TYPE: {e}"),
            }
        }

        cfg
    }

    pub fn with_allow_originals(mut self, on: bool) -> Self {
        self.allow_originals = on;
        self
    }

    pub fn with_default_transactional_type(mut self, t: TransactionalType) -> Self {
        self.default_transactional_type = t;
        self
    }
}

impl fmt::Display for AcidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AcidConfig {{ allow_originals: {}, default_transactional_type: {} }}",
            self.allow_originals, self.default_transactional_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_values() {
        assert_eq!(parse_bool(" Yes "), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn builder_overrides() {
        let cfg = AcidConfig::default()
            .with_allow_originals(false)
            .with_default_transactional_type(TransactionalType::InsertOnly);
        assert!(!cfg.allow_originals);
        assert_eq!(cfg.default_transactional_type, TransactionalType::InsertOnly);
        assert_eq!(
            cfg.to_string(),
            "AcidConfig { allow_originals: false, default_transactional_type: insert_only }"
        );
    }
}
