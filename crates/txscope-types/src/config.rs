//! Configuration types for the persistence plugin.
//!
//! Three layers feed a session factory:
//!
//! - [`AppProperties`]: the host application's flat key-value properties
//!   (`plugin.<name>.config.<key>`).
//! - [`PluginConfig`]: the plugin's keys extracted from those properties.
//! - [`PersistenceUnitDef`]: a named data source + entity mapping group,
//!   declared in `persistence.toml`. Plugin keys override unit defaults.

use std::collections::BTreeMap;
use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, InitError};

pub const KEY_DRIVER: &str = "driver";
pub const KEY_URL: &str = "url";
pub const KEY_USER: &str = "user";
pub const KEY_PASSWORD: &str = "password";
pub const KEY_PERSISTENCE_UNIT: &str = "persistenceUnit";
pub const KEY_ROLLBACK_ON_ERROR: &str = "rollbackOnError";

/// The only driver the infrastructure layer ships.
pub const DRIVER_SQLITE: &str = "sqlite";

/// Flat, dotted-key application properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppProperties {
    entries: BTreeMap<String, String>,
}

impl AppProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Full property key for a plugin setting: `plugin.<name>.config.<key>`.
    pub fn plugin_key(plugin: &str, key: &str) -> String {
        format!("plugin.{plugin}.config.{key}")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AppProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Settings read by the persistence plugin registered under `name`.
///
/// Every key except `persistenceUnit` is optional; absent keys leave the
/// persistence unit's own defaults in place.
#[derive(Clone)]
pub struct PluginConfig {
    pub name: String,
    pub driver: Option<String>,
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub persistence_unit: String,
    /// Mark the transaction rollback-only when the handler answers with a 5xx.
    pub rollback_on_error: bool,
}

impl PluginConfig {
    /// Extract the plugin's settings from application properties.
    ///
    /// Fails with [`InitError::MissingPersistenceUnit`] when `persistenceUnit`
    /// is absent, empty, or whitespace.
    pub fn from_properties(name: &str, props: &AppProperties) -> Result<Self, InitError> {
        let lookup = |key: &str| props.get(&AppProperties::plugin_key(name, key));

        let persistence_unit = lookup(KEY_PERSISTENCE_UNIT)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| InitError::MissingPersistenceUnit {
                plugin: name.to_string(),
            })?
            .to_string();

        let rollback_on_error = match lookup(KEY_ROLLBACK_ON_ERROR) {
            None => false,
            Some(raw) => parse_bool(raw).ok_or_else(|| ConfigError::InvalidValue {
                key: AppProperties::plugin_key(name, KEY_ROLLBACK_ON_ERROR),
                value: raw.to_string(),
            })?,
        };

        Ok(Self {
            name: name.to_string(),
            driver: lookup(KEY_DRIVER).map(str::to_string),
            url: lookup(KEY_URL).map(str::to_string),
            user: lookup(KEY_USER).map(str::to_string),
            password: lookup(KEY_PASSWORD).map(|p| SecretString::from(p.to_string())),
            persistence_unit,
            rollback_on_error,
        })
    }
}

impl fmt::Debug for PluginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginConfig")
            .field("name", &self.name)
            .field("driver", &self.driver)
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("persistence_unit", &self.persistence_unit)
            .field("rollback_on_error", &self.rollback_on_error)
            .finish()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// A named persistence unit: data source defaults plus its schema group.
#[derive(Clone, Serialize, Deserialize)]
pub struct PersistenceUnitDef {
    pub name: String,
    #[serde(default = "default_driver")]
    pub driver: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Apply the embedded schema migrations when the factory is built.
    #[serde(default = "default_migrate")]
    pub migrate: bool,
}

fn default_driver() -> String {
    DRIVER_SQLITE.to_string()
}

fn default_max_connections() -> u32 {
    8
}

fn default_migrate() -> bool {
    true
}

impl PersistenceUnitDef {
    /// A SQLite unit with default pool settings.
    pub fn sqlite(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: default_driver(),
            url: Some(url.into()),
            user: None,
            password: None,
            max_connections: default_max_connections(),
            migrate: default_migrate(),
        }
    }
}

impl fmt::Debug for PersistenceUnitDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceUnitDef")
            .field("name", &self.name)
            .field("driver", &self.driver)
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("max_connections", &self.max_connections)
            .field("migrate", &self.migrate)
            .finish()
    }
}

/// The set of declared persistence units (`persistence.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistenceUnits {
    #[serde(default, rename = "unit")]
    pub units: Vec<PersistenceUnitDef>,
}

impl PersistenceUnits {
    pub fn new(units: Vec<PersistenceUnitDef>) -> Result<Self, ConfigError> {
        let this = Self { units };
        this.validate()?;
        Ok(this)
    }

    /// Reject duplicate unit names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::BTreeSet::new();
        for unit in &self.units {
            if !seen.insert(unit.name.as_str()) {
                return Err(ConfigError::DuplicateUnit(unit.name.clone()));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PersistenceUnitDef> {
        self.units.iter().find(|u| u.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.name.as_str()).collect()
    }
}

/// A persistence unit after plugin overrides have been applied.
#[derive(Clone)]
pub struct ResolvedUnit {
    pub name: String,
    pub driver: String,
    pub url: String,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub max_connections: u32,
    pub migrate: bool,
}

impl ResolvedUnit {
    /// Merge plugin overrides over the named unit's defaults.
    pub fn resolve(plugin: &PluginConfig, units: &PersistenceUnits) -> Result<Self, InitError> {
        let unit = units
            .get(&plugin.persistence_unit)
            .ok_or_else(|| InitError::UnknownPersistenceUnit(plugin.persistence_unit.clone()))?;

        let driver = plugin.driver.clone().unwrap_or_else(|| unit.driver.clone());
        if !driver.eq_ignore_ascii_case(DRIVER_SQLITE) {
            return Err(InitError::UnsupportedDriver(driver));
        }

        let url = plugin
            .url
            .clone()
            .or_else(|| unit.url.clone())
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| InitError::MissingUrl(unit.name.clone()))?;

        Ok(Self {
            name: unit.name.clone(),
            driver: DRIVER_SQLITE.to_string(),
            url,
            user: plugin.user.clone().or_else(|| unit.user.clone()),
            password: plugin
                .password
                .clone()
                .or_else(|| unit.password.clone().map(SecretString::from)),
            max_connections: unit.max_connections.max(1),
            migrate: unit.migrate,
        })
    }

    /// Resolve a unit definition on its own, with no plugin overrides.
    pub fn from_def(unit: &PersistenceUnitDef) -> Result<Self, InitError> {
        let plugin = PluginConfig {
            name: String::new(),
            driver: None,
            url: None,
            user: None,
            password: None,
            persistence_unit: unit.name.clone(),
            rollback_on_error: false,
        };
        let units = PersistenceUnits {
            units: vec![unit.clone()],
        };
        Self::resolve(&plugin, &units)
    }
}

impl fmt::Debug for ResolvedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedUnit")
            .field("name", &self.name)
            .field("driver", &self.driver)
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("max_connections", &self.max_connections)
            .field("migrate", &self.migrate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn props(pairs: &[(&str, &str)]) -> AppProperties {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_plugin_config_reads_prefixed_keys() {
        let props = props(&[
            ("plugin.jpa.config.driver", "sqlite"),
            ("plugin.jpa.config.url", "sqlite::memory:"),
            ("plugin.jpa.config.user", "app"),
            ("plugin.jpa.config.password", "hunter2"),
            ("plugin.jpa.config.persistenceUnit", "notes"),
            ("plugin.other.config.persistenceUnit", "ignored"),
        ]);

        let config = PluginConfig::from_properties("jpa", &props).unwrap();
        assert_eq!(config.name, "jpa");
        assert_eq!(config.driver.as_deref(), Some("sqlite"));
        assert_eq!(config.url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.user.as_deref(), Some("app"));
        assert_eq!(config.password.as_ref().unwrap().expose_secret(), "hunter2");
        assert_eq!(config.persistence_unit, "notes");
        assert!(!config.rollback_on_error);
    }

    #[test]
    fn test_missing_persistence_unit_is_fatal() {
        let props = props(&[("plugin.jpa.config.url", "sqlite::memory:")]);
        let err = PluginConfig::from_properties("jpa", &props).unwrap_err();
        assert!(matches!(err, InitError::MissingPersistenceUnit { ref plugin } if plugin == "jpa"));
    }

    #[test]
    fn test_empty_persistence_unit_is_fatal() {
        for value in ["", "   "] {
            let props = props(&[("plugin.jpa.config.persistenceUnit", value)]);
            let err = PluginConfig::from_properties("jpa", &props).unwrap_err();
            assert!(matches!(err, InitError::MissingPersistenceUnit { .. }));
        }
    }

    #[test]
    fn test_rollback_on_error_parsing() {
        let ok = props(&[
            ("plugin.jpa.config.persistenceUnit", "notes"),
            ("plugin.jpa.config.rollbackOnError", "TRUE"),
        ]);
        assert!(PluginConfig::from_properties("jpa", &ok).unwrap().rollback_on_error);

        let bad = props(&[
            ("plugin.jpa.config.persistenceUnit", "notes"),
            ("plugin.jpa.config.rollbackOnError", "sometimes"),
        ]);
        let err = PluginConfig::from_properties("jpa", &bad).unwrap_err();
        assert!(matches!(err, InitError::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_debug_redacts_password() {
        let props = props(&[
            ("plugin.jpa.config.persistenceUnit", "notes"),
            ("plugin.jpa.config.password", "hunter2"),
        ]);
        let config = PluginConfig::from_properties("jpa", &props).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_resolve_applies_overrides() {
        let units = PersistenceUnits::new(vec![PersistenceUnitDef::sqlite(
            "notes",
            "sqlite://default.db",
        )])
        .unwrap();
        let props = props(&[
            ("plugin.jpa.config.persistenceUnit", "notes"),
            ("plugin.jpa.config.url", "sqlite://override.db"),
        ]);
        let plugin = PluginConfig::from_properties("jpa", &props).unwrap();

        let resolved = ResolvedUnit::resolve(&plugin, &units).unwrap();
        assert_eq!(resolved.url, "sqlite://override.db");
        assert_eq!(resolved.max_connections, 8);
        assert!(resolved.migrate);
    }

    #[test]
    fn test_resolve_unknown_unit() {
        let units = PersistenceUnits::default();
        let props = props(&[("plugin.jpa.config.persistenceUnit", "ghost")]);
        let plugin = PluginConfig::from_properties("jpa", &props).unwrap();
        let err = ResolvedUnit::resolve(&plugin, &units).unwrap_err();
        assert!(matches!(err, InitError::UnknownPersistenceUnit(ref n) if n == "ghost"));
    }

    #[test]
    fn test_resolve_rejects_other_drivers() {
        let units =
            PersistenceUnits::new(vec![PersistenceUnitDef::sqlite("notes", "sqlite::memory:")])
                .unwrap();
        let props = props(&[
            ("plugin.jpa.config.persistenceUnit", "notes"),
            ("plugin.jpa.config.driver", "postgres"),
        ]);
        let plugin = PluginConfig::from_properties("jpa", &props).unwrap();
        let err = ResolvedUnit::resolve(&plugin, &units).unwrap_err();
        assert!(matches!(err, InitError::UnsupportedDriver(ref d) if d == "postgres"));
    }

    #[test]
    fn test_resolve_requires_url() {
        let mut unit = PersistenceUnitDef::sqlite("notes", "");
        unit.url = None;
        let units = PersistenceUnits::new(vec![unit]).unwrap();
        let props = props(&[("plugin.jpa.config.persistenceUnit", "notes")]);
        let plugin = PluginConfig::from_properties("jpa", &props).unwrap();
        let err = ResolvedUnit::resolve(&plugin, &units).unwrap_err();
        assert!(matches!(err, InitError::MissingUrl(_)));
    }

    #[test]
    fn test_duplicate_units_rejected() {
        let err = PersistenceUnits::new(vec![
            PersistenceUnitDef::sqlite("notes", "sqlite::memory:"),
            PersistenceUnitDef::sqlite("notes", "sqlite::memory:"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateUnit(ref n) if n == "notes"));
    }
}
