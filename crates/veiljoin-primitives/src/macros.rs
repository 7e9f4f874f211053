// Registry columns: (kind, wire tag, family, max payload bytes).
// Entries stay sorted by kind name; wire tags are stable and never reused.
macro_rules! column_kind_registry {
    ($macro:ident) => {
        column_kind_registry!(@emit $macro;)
    };
    ($macro:ident, $arg:expr) => {
        column_kind_registry!(@emit $macro; @args $arg;)
    };
    (@emit $macro:ident; $($prefix:tt)*) => {
        $macro! {
            $($prefix)*
            @entries
            (CountryCode, 6, Textual, 3),
            (Date, 4, Numeric, 8),
            (Float, 3, Numeric, 4),
            (Int, 1, Numeric, 4),
            (Ip, 9, Textual, 15),
            (LanguageCode, 7, Textual, 6),
            (Long, 8, Numeric, 8),
            (SearchWord, 11, Textual, 32),
            (Text, 2, Textual, 1024),
            (Url, 5, Textual, 100),
            (UserAgent, 10, Textual, 256),
        }
    };
}

macro_rules! metadata_from_registry {
    ( @args $kind:expr; @entries $( ($name:ident, $tag:literal, $family:ident, $max:literal) ),* $(,)? ) => {
        match $kind {
            $(
                $crate::ColumnKind::$name => $crate::ColumnMetadata {
                    name: stringify!($name),
                    tag: $tag,
                    family: $crate::ColumnFamily::$family,
                    max_payload_bytes: $max,
                },
            )*
        }
    };
}

macro_rules! kind_from_tag_registry {
    ( @args $tag:expr; @entries $( ($name:ident, $tag_value:literal, $family:ident, $max:literal) ),* $(,)? ) => {
        match $tag {
            $( $tag_value => Some($crate::ColumnKind::$name), )*
            _ => None,
        }
    };
}

macro_rules! all_kinds_from_registry {
    ( @entries $( ($name:ident, $tag:literal, $family:ident, $max:literal) ),* $(,)? ) => {
        [ $( $crate::ColumnKind::$name ),* ]
    };
}
