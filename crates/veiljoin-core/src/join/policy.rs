use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::{record::TableSide, row::Row},
    value::Value,
};
use derive_more::{Deref, Display};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// JoinAttribute
///
/// Projection of a row's key columns compared for equality across tables.
///

#[derive(Clone, Debug, Deref, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct JoinAttribute(Vec<Value>);

impl JoinAttribute {
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self(values)
    }
}

///
/// PolicyFingerprint
///
/// Stable digest of a policy's projection, safe to emit in traces.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PolicyFingerprint([u8; 32]);

impl PolicyFingerprint {
    #[must_use]
    pub fn as_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for byte in self.0 {
            use std::fmt::Write as _;
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl std::fmt::Display for PolicyFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_hex())
    }
}

///
/// JoinPolicy
///
/// Per-query capability that extracts join attributes and combines a
/// matching primary/foreign pair into one output row.
///

pub trait JoinPolicy {
    fn join_attribute(&self, side: TableSide, row: &Row) -> Result<JoinAttribute, InternalError>;

    fn merge(&self, primary: &Row, foreign: &Row) -> Result<Row, InternalError>;

    fn fingerprint(&self) -> PolicyFingerprint;
}

///
/// PolicyError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum PolicyError {
    #[error("join key must name at least one column")]
    EmptyKey,

    #[error("join key arity mismatch: primary has {primary} columns, foreign has {foreign}")]
    ArityMismatch { primary: usize, foreign: usize },

    #[error("join key repeats column {column}")]
    DuplicateColumn { column: usize },
}

impl From<PolicyError> for InternalError {
    fn from(err: PolicyError) -> Self {
        Self::config_invalid(err.to_string())
    }
}

///
/// KeyColumnsPolicy
///
/// Equi-join on positional key columns. Merged rows hold every primary
/// column followed by the foreign columns that are not part of the key.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyColumnsPolicy {
    primary_key: Vec<usize>,
    foreign_key: Vec<usize>,
}

impl KeyColumnsPolicy {
    pub fn new(primary_key: Vec<usize>, foreign_key: Vec<usize>) -> Result<Self, PolicyError> {
        if primary_key.is_empty() || foreign_key.is_empty() {
            return Err(PolicyError::EmptyKey);
        }
        if primary_key.len() != foreign_key.len() {
            return Err(PolicyError::ArityMismatch {
                primary: primary_key.len(),
                foreign: foreign_key.len(),
            });
        }
        for key in [&primary_key, &foreign_key] {
            for (i, column) in key.iter().enumerate() {
                if key[..i].contains(column) {
                    return Err(PolicyError::DuplicateColumn { column: *column });
                }
            }
        }

        Ok(Self {
            primary_key,
            foreign_key,
        })
    }

    /// Single-column key at the same position in both tables.
    pub fn single(column: usize) -> Self {
        Self {
            primary_key: vec![column],
            foreign_key: vec![column],
        }
    }

    #[must_use]
    pub fn key_columns(&self, side: TableSide) -> &[usize] {
        match side {
            TableSide::Primary => &self.primary_key,
            TableSide::Foreign => &self.foreign_key,
        }
    }
}

impl JoinPolicy for KeyColumnsPolicy {
    fn join_attribute(&self, side: TableSide, row: &Row) -> Result<JoinAttribute, InternalError> {
        let columns = self.key_columns(side);
        row.project(columns).map(JoinAttribute::new).ok_or_else(|| {
            InternalError::precondition(
                ErrorOrigin::Merge,
                format!(
                    "row with {} columns cannot supply join key columns {columns:?}",
                    row.len()
                ),
            )
        })
    }

    fn merge(&self, primary: &Row, foreign: &Row) -> Result<Row, InternalError> {
        let kept = foreign
            .iter()
            .enumerate()
            .filter(|(idx, _)| !self.foreign_key.contains(idx))
            .map(|(_, value)| value.clone());

        Ok(primary.iter().cloned().chain(kept).collect())
    }

    fn fingerprint(&self) -> PolicyFingerprint {
        let mut hasher = Sha256::new();
        hasher.update(b"policyfp:v1:key_columns");
        for key in [&self.primary_key, &self.foreign_key] {
            write_u32(&mut hasher, key.len());
            for column in key {
                write_u32(&mut hasher, *column);
            }
        }

        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        PolicyFingerprint(out)
    }
}

fn write_u32(hasher: &mut Sha256, value: usize) {
    let value = u32::try_from(value).unwrap_or(u32::MAX);
    hasher.update(value.to_be_bytes());
}

///
/// OpCode
///
/// Numeric operation identifier selecting a registered policy.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("op#{_0}")]
pub struct OpCode(pub u32);

///
/// PolicyRegistry
///
/// Maps operation identifiers to join policies so callers that still think
/// in op codes get the same selection semantics.
///

#[derive(Clone, Debug, Default)]
pub struct PolicyRegistry {
    policies: BTreeMap<OpCode, KeyColumnsPolicy>,
}

impl PolicyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a policy, replacing any previous one for `op`.
    pub fn register(&mut self, op: OpCode, policy: KeyColumnsPolicy) -> Option<KeyColumnsPolicy> {
        self.policies.insert(op, policy)
    }

    pub fn get(&self, op: OpCode) -> Result<&KeyColumnsPolicy, InternalError> {
        self.policies.get(&op).ok_or_else(|| {
            InternalError::new(
                ErrorClass::Unsupported,
                ErrorOrigin::Config,
                format!("no join policy registered for {op}"),
            )
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
