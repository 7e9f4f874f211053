//! Join-table-agnostic data model: rows, schemas, and tagged join records.

pub mod record;
pub mod row;
pub mod schema;
