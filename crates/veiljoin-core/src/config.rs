//! Join configuration loaded from TOML.

use crate::{
    codec::frame::FRAME_PREFIX_BYTES,
    error::InternalError,
    join::policy::{KeyColumnsPolicy, OpCode, PolicyError, PolicyRegistry},
    model::schema::{ColumnDef, Schema},
};
use serde::Deserialize;
use std::{collections::BTreeMap, path::Path};
use thiserror::Error as ThisError;
use veiljoin_primitives::ColumnKind;

pub const DEFAULT_MAX_ROWS_PER_CALL: u32 = 1 << 20;
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid limit: {0}")]
    InvalidLimit(&'static str),

    #[error("upper_bound = \"schema\" requires [schema.primary] and [schema.foreign]")]
    MissingSchema,

    #[error("column '{column}' has unknown kind '{kind}'")]
    UnknownKind { column: String, kind: String },

    #[error("op code '{0}' is not an unsigned 32-bit integer")]
    InvalidOpCode(String),

    #[error("op code {op}: {source}")]
    Policy {
        op: String,
        #[source]
        source: PolicyError,
    },
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::config_invalid(err.to_string())
    }
}

///
/// UpperBoundMode
///
/// How the preprocessor picks the fixed record width.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum UpperBoundMode {
    /// Probe the first row of each non-empty input.
    #[default]
    Sample,
    /// Derive the width from the configured table schemas.
    Schema,
}

///
/// Limits
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    pub max_rows_per_call: u32,
    pub max_frame_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_rows_per_call: DEFAULT_MAX_ROWS_PER_CALL,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

///
/// ColumnConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ColumnConfig {
    pub name: String,
    pub kind: String,
}

///
/// TableSchemaConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TableSchemaConfig {
    pub name: Option<String>,
    pub columns: Vec<ColumnConfig>,
}

impl TableSchemaConfig {
    fn to_schema(&self, default_name: &str) -> Result<Schema, ConfigError> {
        let columns = self
            .columns
            .iter()
            .map(|col| {
                ColumnKind::from_name(&col.kind)
                    .map(|kind| ColumnDef::new(col.name.clone(), kind))
                    .ok_or_else(|| ConfigError::UnknownKind {
                        column: col.name.clone(),
                        kind: col.kind.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let name = self.name.as_deref().unwrap_or(default_name);

        Ok(Schema::new(name, columns))
    }
}

///
/// SchemaPairConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SchemaPairConfig {
    pub primary: TableSchemaConfig,
    pub foreign: TableSchemaConfig,
}

///
/// OpConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OpConfig {
    pub primary_key: Vec<usize>,
    pub foreign_key: Vec<usize>,
}

///
/// JoinConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct JoinConfig {
    pub limits: Limits,
    pub upper_bound: UpperBoundMode,
    pub verify_sorted: bool,
    pub schema: Option<SchemaPairConfig>,
    pub ops: BTreeMap<String, OpConfig>,
}

impl JoinConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;

        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_rows_per_call == 0 {
            return Err(ConfigError::InvalidLimit("max_rows_per_call must be positive"));
        }
        if self.limits.max_frame_bytes <= FRAME_PREFIX_BYTES {
            return Err(ConfigError::InvalidLimit(
                "max_frame_bytes must exceed the frame prefix",
            ));
        }
        if self.upper_bound == UpperBoundMode::Schema && self.schema.is_none() {
            return Err(ConfigError::MissingSchema);
        }
        self.schemas()?;
        self.policy_registry()?;

        Ok(())
    }

    /// Resolve the configured `(primary, foreign)` schemas, if any.
    pub fn schemas(&self) -> Result<Option<(Schema, Schema)>, ConfigError> {
        self.schema
            .as_ref()
            .map(|pair| {
                Ok((
                    pair.primary.to_schema("primary")?,
                    pair.foreign.to_schema("foreign")?,
                ))
            })
            .transpose()
    }

    /// Build the op-code → policy registry.
    pub fn policy_registry(&self) -> Result<PolicyRegistry, ConfigError> {
        let mut registry = PolicyRegistry::new();
        for (op, keys) in &self.ops {
            let code = op
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidOpCode(op.clone()))?;
            let policy = KeyColumnsPolicy::new(keys.primary_key.clone(), keys.foreign_key.clone())
                .map_err(|source| ConfigError::Policy {
                    op: op.clone(),
                    source,
                })?;
            registry.register(OpCode(code), policy);
        }

        Ok(registry)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
upper_bound = "schema"
verify_sorted = true

[limits]
max_rows_per_call = 1000

[schema.primary]
name = "customers"
columns = [
    { name = "id", kind = "int" },
    { name = "name", kind = "text" },
]

[schema.foreign]
columns = [
    { name = "customer_id", kind = "int" },
    { name = "url", kind = "url" },
]

[ops.3]
primary_key = [0]
foreign_key = [0]
"#;

    #[test]
    fn parses_full_document() {
        let config = JoinConfig::from_toml_str(SAMPLE).expect("sample config should parse");

        assert_eq!(config.upper_bound, UpperBoundMode::Schema);
        assert!(config.verify_sorted);
        assert_eq!(config.limits.max_rows_per_call, 1000);
        assert_eq!(config.limits.max_frame_bytes, DEFAULT_MAX_FRAME_BYTES);

        let (primary, foreign) = config.schemas().unwrap().expect("schemas configured");
        assert_eq!(primary.name(), "customers");
        assert_eq!(foreign.name(), "foreign");
        assert_eq!(foreign.kinds(), vec![ColumnKind::Int, ColumnKind::Url]);

        let registry = config.policy_registry().unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get(OpCode(3)).is_ok());
        assert!(registry.get(OpCode(4)).is_err());
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = JoinConfig::from_toml_str("").expect("empty config is valid");
        assert_eq!(config, JoinConfig::default());
        assert_eq!(config.upper_bound, UpperBoundMode::Sample);
    }

    #[test]
    fn schema_mode_without_schema_is_rejected() {
        let err = JoinConfig::from_toml_str("upper_bound = \"schema\"").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSchema));
    }

    #[test]
    fn unknown_kind_and_bad_op_codes_are_rejected() {
        let err = JoinConfig::from_toml_str(
            "[schema.primary]\ncolumns = [{ name = \"a\", kind = \"blob\" }]\n[schema.foreign]\ncolumns = []\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKind { .. }));

        let err = JoinConfig::from_toml_str("[ops.x]\nprimary_key = [0]\nforeign_key = [0]\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOpCode(_)));

        let err = JoinConfig::from_toml_str("[ops.1]\nprimary_key = [0, 1]\nforeign_key = [0]\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Policy {
                source: PolicyError::ArityMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = JoinConfig::from_toml_str("mode = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
