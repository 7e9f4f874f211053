use crate::model::row::Row;

///
/// TableSide
///
/// Provenance of a join record: the unique-keyed primary table or the
/// foreign table referencing it.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TableSide {
    Primary,
    Foreign,
}

impl TableSide {
    /// Sort rank within one join-attribute group: primary rows come first.
    #[must_use]
    pub const fn group_rank(self) -> u8 {
        match self {
            Self::Primary => 0,
            Self::Foreign => 1,
        }
    }
}

///
/// JoinRecord
///
/// One element of a join-record stream. `Dummy` carries no row at all; it
/// stands in for "no real row" both as padding and as uninitialized
/// boundary state.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum JoinRecord {
    #[default]
    Dummy,
    Real {
        side: TableSide,
        row: Row,
    },
}

impl JoinRecord {
    #[must_use]
    pub const fn primary(row: Row) -> Self {
        Self::Real {
            side: TableSide::Primary,
            row,
        }
    }

    #[must_use]
    pub const fn foreign(row: Row) -> Self {
        Self::Real {
            side: TableSide::Foreign,
            row,
        }
    }

    #[must_use]
    pub const fn is_dummy(&self) -> bool {
        matches!(self, Self::Dummy)
    }

    #[must_use]
    pub const fn is_primary(&self) -> bool {
        matches!(
            self,
            Self::Real {
                side: TableSide::Primary,
                ..
            }
        )
    }

    #[must_use]
    pub const fn side(&self) -> Option<TableSide> {
        match self {
            Self::Dummy => None,
            Self::Real { side, .. } => Some(*side),
        }
    }

    #[must_use]
    pub const fn row(&self) -> Option<&Row> {
        match self {
            Self::Dummy => None,
            Self::Real { row, .. } => Some(row),
        }
    }
}

///
/// OutputRecord
///
/// One merge-output element: a merged primary+foreign row, or padding.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum OutputRecord {
    #[default]
    Dummy,
    Merged(Row),
}

impl OutputRecord {
    #[must_use]
    pub const fn is_dummy(&self) -> bool {
        matches!(self, Self::Dummy)
    }

    #[must_use]
    pub fn into_row(self) -> Option<Row> {
        match self {
            Self::Dummy => None,
            Self::Merged(row) => Some(row),
        }
    }
}
