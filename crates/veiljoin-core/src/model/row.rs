use crate::value::Value;
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use veiljoin_primitives::ColumnKind;

///
/// Row
///
/// Opaque schema-typed tuple. The join core only projects columns out of it
/// and concatenates rows; everything else is the codec's business.
///

#[derive(Clone, Debug, Default, Deref, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row(Vec<Value>);

impl Row {
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    /// Column kinds in column order.
    #[must_use]
    pub fn kinds(&self) -> Vec<ColumnKind> {
        self.0.iter().map(Value::kind).collect()
    }

    /// Clone the values at `columns`, or `None` if any index is out of range.
    #[must_use]
    pub fn project(&self, columns: &[usize]) -> Option<Vec<Value>> {
        columns
            .iter()
            .map(|&idx| self.0.get(idx).cloned())
            .collect()
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for Row {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
