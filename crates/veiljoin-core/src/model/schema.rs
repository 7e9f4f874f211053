use crate::{codec::RowCodec, model::row::Row};
use thiserror::Error as ThisError;
use veiljoin_primitives::ColumnKind;

///
/// SchemaError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum SchemaError {
    #[error("row has {found} columns, schema '{schema}' expects {expected}")]
    ArityMismatch {
        schema: String,
        expected: usize,
        found: usize,
    },

    #[error("column '{column}' of schema '{schema}' expects {expected}, found {found}")]
    KindMismatch {
        schema: String,
        column: String,
        expected: ColumnKind,
        found: ColumnKind,
    },
}

///
/// ColumnDef
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

///
/// Schema
///
/// Ordered column definitions for one table.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Schema {
    name: String,
    columns: Vec<ColumnDef>,
}

impl Schema {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<ColumnKind> {
        self.columns.iter().map(|col| col.kind).collect()
    }

    /// Largest encoding `codec` can produce for a row of this schema.
    #[must_use]
    pub fn max_encoded_size<C: RowCodec + ?Sized>(&self, codec: &C) -> usize {
        codec.max_encoded_size(&self.kinds())
    }

    /// Check that a row's column kinds match this schema exactly.
    pub fn check_row(&self, row: &Row) -> Result<(), SchemaError> {
        if row.len() != self.columns.len() {
            return Err(SchemaError::ArityMismatch {
                schema: self.name.clone(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }

        for (col, value) in self.columns.iter().zip(row.iter()) {
            if col.kind != value.kind() {
                return Err(SchemaError::KindMismatch {
                    schema: self.name.clone(),
                    column: col.name.clone(),
                    expected: col.kind,
                    found: value.kind(),
                });
            }
        }

        Ok(())
    }
}
