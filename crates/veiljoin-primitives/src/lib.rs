#[macro_use]
mod macros;

///
/// ColumnKind
///
/// Canonical column vocabulary shared by schemas, values, and the row codec.
/// Each kind carries a stable wire tag and a maximum payload size so record
/// widths can be derived from a schema without inspecting any row.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ColumnKind {
    CountryCode,
    Date,
    Float,
    Int,
    Ip,
    LanguageCode,
    Long,
    SearchWord,
    Text,
    Url,
    UserAgent,
}

impl ColumnKind {
    /// Return the full metadata descriptor for one column kind.
    #[must_use]
    pub const fn metadata(self) -> ColumnMetadata {
        column_kind_registry!(metadata_from_registry, self)
    }

    /// Resolve a kind from its stable wire tag.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        column_kind_registry!(kind_from_tag_registry, tag)
    }

    /// Resolve a kind from its registry name (case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_COLUMN_KINDS
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.metadata().name
    }

    #[must_use]
    pub const fn tag(self) -> u8 {
        self.metadata().tag
    }

    #[must_use]
    pub const fn family(self) -> ColumnFamily {
        self.metadata().family
    }

    /// Largest raw payload a value of this kind may carry.
    ///
    /// Fixed-width kinds report their byte width; textual kinds report the
    /// maximum UTF-8 length accepted by the codec.
    #[must_use]
    pub const fn max_payload_bytes(self) -> usize {
        self.metadata().max_payload_bytes
    }

    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(self.family(), ColumnFamily::Textual)
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// ColumnMetadata
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ColumnMetadata {
    pub name: &'static str,
    pub tag: u8,
    pub family: ColumnFamily,
    pub max_payload_bytes: usize,
}

///
/// ColumnFamily
///
/// Coarse routing family; numeric kinds have a fixed payload width.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ColumnFamily {
    Numeric,
    Textual,
}

/// Wire tag reserved for dummy records; never assigned to a column kind.
pub const DUMMY_TAG: u8 = 0;

/// Ordered list of all column kinds in registry order.
pub const ALL_COLUMN_KINDS: [ColumnKind; 11] = column_kind_registry!(all_kinds_from_registry);

///
/// TESTS
///
