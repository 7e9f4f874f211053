mod float;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use veiljoin_primitives::ColumnKind;

// re-exports
pub use float::{Float32, Float32Error};

///
/// ValueError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum ValueError {
    #[error("{kind} value exceeds max length: {len} bytes (limit {max})")]
    TooLong {
        kind: ColumnKind,
        len: usize,
        max: usize,
    },
}

///
/// Value
///
/// One typed column value. Variants mirror `ColumnKind` one-to-one so the
/// codec can bound every value's encoded size from its kind alone.
///

#[remain::sorted]
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Value {
    CountryCode(String),
    Date(i64),
    Float(Float32),
    Int(i32),
    Ip(String),
    LanguageCode(String),
    Long(i64),
    SearchWord(String),
    Text(String),
    Url(String),
    UserAgent(String),
}

impl Value {
    #[must_use]
    pub const fn kind(&self) -> ColumnKind {
        match self {
            Self::CountryCode(_) => ColumnKind::CountryCode,
            Self::Date(_) => ColumnKind::Date,
            Self::Float(_) => ColumnKind::Float,
            Self::Int(_) => ColumnKind::Int,
            Self::Ip(_) => ColumnKind::Ip,
            Self::LanguageCode(_) => ColumnKind::LanguageCode,
            Self::Long(_) => ColumnKind::Long,
            Self::SearchWord(_) => ColumnKind::SearchWord,
            Self::Text(_) => ColumnKind::Text,
            Self::Url(_) => ColumnKind::Url,
            Self::UserAgent(_) => ColumnKind::UserAgent,
        }
    }

    /// Borrow the textual payload, if this is a textual kind.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::CountryCode(s)
            | Self::Ip(s)
            | Self::LanguageCode(s)
            | Self::SearchWord(s)
            | Self::Text(s)
            | Self::Url(s)
            | Self::UserAgent(s) => Some(s),
            Self::Date(_) | Self::Float(_) | Self::Int(_) | Self::Long(_) => None,
        }
    }

    /// Check the value fits its kind's maximum payload.
    pub fn validate(&self) -> Result<(), ValueError> {
        let kind = self.kind();
        if let Some(text) = self.as_text() {
            let max = kind.max_payload_bytes();
            if text.len() > max {
                return Err(ValueError::TooLong {
                    kind,
                    len: text.len(),
                    max,
                });
            }
        }

        Ok(())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}
