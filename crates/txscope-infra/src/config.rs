//! Configuration loading for txscope.
//!
//! - `txscope.toml`: application properties. Nested tables are flattened into
//!   dotted keys, so `[plugin.jpa.config] url = "..."` becomes
//!   `plugin.jpa.config.url`.
//! - `persistence.toml`: `[[unit]]` persistence unit declarations.
//!
//! Unlike optional tuning files, both are required inputs for plugin
//! initialization: read and parse failures are returned, not defaulted.

use std::path::{Path, PathBuf};

use txscope_types::config::{AppProperties, PersistenceUnits};
use txscope_types::error::ConfigError;

/// Default application properties file name.
pub const APP_CONFIG_FILE: &str = "txscope.toml";

/// Default persistence unit declarations file name.
pub const PERSISTENCE_FILE: &str = "persistence.toml";

/// Resolve a config path: explicit value, else `TXSCOPE_HOME/<file>`, else `./<file>`.
pub fn resolve_config_path(explicit: Option<&Path>, file: &str) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var("TXSCOPE_HOME") {
        Ok(home) if !home.is_empty() => PathBuf::from(home).join(file),
        _ => PathBuf::from(file),
    }
}

/// Load and flatten application properties from a TOML file.
pub async fn load_app_properties(path: &Path) -> Result<AppProperties, ConfigError> {
    let content = read(path).await?;
    parse_app_properties(&content).map_err(|e| match e {
        ConfigError::Parse { message, .. } => ConfigError::Parse {
            path: path.display().to_string(),
            message,
        },
        other => other,
    })
}

/// Parse and flatten application properties from TOML text.
pub fn parse_app_properties(content: &str) -> Result<AppProperties, ConfigError> {
    let table: toml::Table = toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: APP_CONFIG_FILE.to_string(),
        message: e.to_string(),
    })?;

    let mut props = AppProperties::new();
    flatten_into(&mut props, "", &table)?;
    Ok(props)
}

fn flatten_into(props: &mut AppProperties, prefix: &str, table: &toml::Table) -> Result<(), ConfigError> {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match value {
            toml::Value::Table(nested) => flatten_into(props, &full_key, nested)?,
            toml::Value::String(s) => props.insert(full_key, s.clone()),
            toml::Value::Integer(i) => props.insert(full_key, i.to_string()),
            toml::Value::Float(f) => props.insert(full_key, f.to_string()),
            toml::Value::Boolean(b) => props.insert(full_key, b.to_string()),
            toml::Value::Datetime(dt) => props.insert(full_key, dt.to_string()),
            toml::Value::Array(_) => {
                return Err(ConfigError::UnsupportedValue {
                    key: full_key,
                    message: "arrays cannot be expressed as a flat property".to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Load persistence unit declarations from a TOML file.
pub async fn load_persistence_units(path: &Path) -> Result<PersistenceUnits, ConfigError> {
    let content = read(path).await?;
    let units: PersistenceUnits = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    units.validate()?;
    tracing::debug!(path = %path.display(), units = ?units.names(), "persistence units loaded");
    Ok(units)
}

async fn read(path: &Path) -> Result<String, ConfigError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_app_properties_flattens_tables() {
        let props = parse_app_properties(
            r#"
name = "notes-app"
port = 8080

[plugin.jpa.config]
driver = "sqlite"
url = "sqlite://notes.db?mode=rwc"
persistenceUnit = "notes"
rollbackOnError = true
"#,
        )
        .unwrap();

        assert_eq!(props.get("name"), Some("notes-app"));
        assert_eq!(props.get("port"), Some("8080"));
        assert_eq!(props.get("plugin.jpa.config.driver"), Some("sqlite"));
        assert_eq!(props.get("plugin.jpa.config.persistenceUnit"), Some("notes"));
        assert_eq!(props.get("plugin.jpa.config.rollbackOnError"), Some("true"));
    }

    #[test]
    fn parse_app_properties_rejects_arrays() {
        let err = parse_app_properties("hosts = [\"a\", \"b\"]").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedValue { ref key, .. } if key == "hosts"));
    }

    #[tokio::test]
    async fn load_app_properties_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_app_properties(&tmp.path().join("txscope.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[tokio::test]
    async fn load_app_properties_invalid_toml_reports_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("txscope.toml");
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let err = load_app_properties(&path).await.unwrap_err();
        match err {
            ConfigError::Parse { path: p, .. } => assert!(p.ends_with("txscope.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn load_persistence_units_with_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("persistence.toml");
        tokio::fs::write(
            &path,
            r#"
[[unit]]
name = "notes"
url = "sqlite://notes.db?mode=rwc"

[[unit]]
name = "archive"
url = "sqlite://archive.db?mode=rwc"
max_connections = 2
migrate = false
"#,
        )
        .await
        .unwrap();

        let units = load_persistence_units(&path).await.unwrap();
        assert_eq!(units.names(), vec!["notes", "archive"]);

        let notes = units.get("notes").unwrap();
        assert_eq!(notes.driver, "sqlite");
        assert_eq!(notes.max_connections, 8);
        assert!(notes.migrate);

        let archive = units.get("archive").unwrap();
        assert_eq!(archive.max_connections, 2);
        assert!(!archive.migrate);
    }

    #[tokio::test]
    async fn load_persistence_units_rejects_duplicates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("persistence.toml");
        tokio::fs::write(
            &path,
            "[[unit]]\nname = \"notes\"\n\n[[unit]]\nname = \"notes\"\n",
        )
        .await
        .unwrap();

        let err = load_persistence_units(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateUnit(ref n) if n == "notes"));
    }

    #[test]
    fn resolve_config_path_prefers_explicit() {
        let explicit = Path::new("/etc/txscope/custom.toml");
        assert_eq!(
            resolve_config_path(Some(explicit), APP_CONFIG_FILE),
            PathBuf::from("/etc/txscope/custom.toml")
        );
    }
}
