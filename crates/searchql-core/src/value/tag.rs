use std::fmt;

///
/// ValueTag
///
/// Stable value-variant tag used by diagnostics and type errors.
///

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueTag {
    Null = 1,
    Boolean = 2,
    Byte = 3,
    Short = 4,
    Integer = 5,
    Long = 6,
    Float = 7,
    Double = 8,
    String = 9,
    Date = 10,
    Time = 11,
    Timestamp = 12,
    Ip = 13,
    Binary = 14,
    Array = 15,
    Struct = 16,
}

impl ValueTag {
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Stable human-readable label for diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Boolean => "BOOLEAN",
            Self::Byte => "BYTE",
            Self::Short => "SHORT",
            Self::Integer => "INTEGER",
            Self::Long => "LONG",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::String => "STRING",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Ip => "IP",
            Self::Binary => "BINARY",
            Self::Array => "ARRAY",
            Self::Struct => "STRUCT",
        }
    }
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
