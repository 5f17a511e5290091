use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use blobcas_store::{StoreError, StoreOptions, StoreResult};

use crate::path::canonicalize_root;

/// Option key for the object name prefix.
pub const ROOT_KEY: &str = "root";
/// Option key for the list stream buffer capacity.
pub const LIST_BUFFER_KEY: &str = "list_buffer";
/// Option key for the backend listing page size.
pub const LIST_PAGE_SIZE_KEY: &str = "list_page_size";

pub const DEFAULT_ROOT: &str = "/";
pub const DEFAULT_LIST_BUFFER: usize = 1024;
/// Largest page most blob services return per listing request.
pub const DEFAULT_LIST_PAGE_SIZE: usize = 5000;

/// Configuration for an [`AzureBlockStore`](crate::AzureBlockStore).
///
/// Unrecognized options are kept in `options` and carried along with the
/// store, untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Object name prefix, in any of its accepted spellings.
    pub root: String,
    /// Capacity of the buffer between the listing task and its consumer.
    pub list_buffer: usize,
    /// Objects requested per backend listing call.
    pub list_page_size: usize,
    /// Pass-through options.
    #[serde(flatten)]
    pub options: BTreeMap<String, String>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            list_buffer: DEFAULT_LIST_BUFFER,
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
            options: BTreeMap::new(),
        }
    }
}

impl AdapterConfig {
    /// Configuration with the given root and defaults elsewhere.
    pub fn with_root(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Build from a string option map.
    pub fn from_options(options: &StoreOptions) -> StoreResult<Self> {
        let mut config = Self::default();
        for (key, value) in options {
            match key.as_str() {
                ROOT_KEY => config.root = value.clone(),
                LIST_BUFFER_KEY => config.list_buffer = parse_count(key, value)?,
                LIST_PAGE_SIZE_KEY => config.list_page_size = parse_count(key, value)?,
                _ => {
                    config.options.insert(key.clone(), value.clone());
                }
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Build from a TOML document of `key = value` pairs.
    ///
    /// Non-string scalars are accepted and converted to their TOML text.
    pub fn from_toml(source: &str) -> StoreResult<Self> {
        let table: toml::Table = toml::from_str(source)
            .map_err(|e| StoreError::Config(format!("invalid store config: {e}")))?;
        let mut options = StoreOptions::new();
        for (key, value) in table {
            let text = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Float(f) => f.to_string(),
                other => {
                    return Err(StoreError::Config(format!(
                        "option {key} must be a scalar, got {}",
                        other.type_str()
                    )))
                }
            };
            options.insert(key, text);
        }
        Self::from_options(&options)
    }

    /// Check value ranges.
    pub fn validate(&self) -> StoreResult<()> {
        if self.list_buffer == 0 {
            return Err(StoreError::Config(format!("{LIST_BUFFER_KEY} must be positive")));
        }
        if self.list_page_size == 0 {
            return Err(StoreError::Config(format!("{LIST_PAGE_SIZE_KEY} must be positive")));
        }
        Ok(())
    }

    /// The canonical form of `root`.
    pub fn canonical_root(&self) -> String {
        canonicalize_root(&self.root)
    }

    /// A pass-through option.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

fn parse_count(key: &str, value: &str) -> StoreResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| StoreError::Config(format!("{key} must be a positive integer, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, &str)]) -> StoreOptions {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn default_config() {
        let c = AdapterConfig::default();
        assert_eq!(c.root, "/");
        assert_eq!(c.canonical_root(), "");
        assert_eq!(c.list_buffer, 1024);
        assert_eq!(c.list_page_size, 5000);
        assert!(c.options.is_empty());
    }

    #[test]
    fn from_options_reads_known_keys() {
        let c = AdapterConfig::from_options(&options(&[
            ("root", "/blocks/v1"),
            ("list_buffer", "16"),
            ("list_page_size", "100"),
        ]))
        .unwrap();
        assert_eq!(c.canonical_root(), "blocks/v1/");
        assert_eq!(c.list_buffer, 16);
        assert_eq!(c.list_page_size, 100);
    }

    #[test]
    fn unknown_options_pass_through() {
        let c = AdapterConfig::from_options(&options(&[("tier", "cool"), ("root", "x")])).unwrap();
        assert_eq!(c.option("tier"), Some("cool"));
        assert_eq!(c.option("root"), None);
    }

    #[test]
    fn invalid_counts_are_rejected() {
        for (key, value) in [("list_buffer", "0"), ("list_page_size", "lots"), ("list_buffer", "-1")] {
            let err = AdapterConfig::from_options(&options(&[(key, value)])).unwrap_err();
            assert!(matches!(err, StoreError::Config(_)), "{key}={value}");
        }
    }

    #[test]
    fn from_toml_accepts_scalars() {
        let c = AdapterConfig::from_toml(
            r#"
            root = "/tenant-a"
            list_buffer = 8
            verbose = true
            "#,
        )
        .unwrap();
        assert_eq!(c.canonical_root(), "tenant-a/");
        assert_eq!(c.list_buffer, 8);
        assert_eq!(c.option("verbose"), Some("true"));
    }

    #[test]
    fn from_toml_rejects_tables_and_syntax_errors() {
        assert!(AdapterConfig::from_toml("[nested]\nkey = 1").is_err());
        assert!(AdapterConfig::from_toml("root = ").is_err());
    }

    #[test]
    fn serde_flattens_options() {
        let mut c = AdapterConfig::with_root("/r");
        c.options.insert("tier".into(), "hot".into());
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["root"], "/r");
        assert_eq!(json["tier"], "hot");
    }
}
