use std::fmt;

///
/// ExprType
///
/// Static type of an expression node. Mirrors the `Value` tags; `Undefined`
/// is the type of an untyped `NULL` literal and unifies with every type.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ExprType {
    Undefined,
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    String,
    Date,
    Time,
    Timestamp,
    Ip,
    Binary,
    Array(Box<Self>),
    Struct(Vec<(String, Self)>),
}

impl ExprType {
    #[must_use]
    pub fn array_of(element: Self) -> Self {
        Self::Array(Box::new(element))
    }

    #[must_use]
    pub const fn is_integral(&self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Integer | Self::Long)
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        self.is_integral() || matches!(self, Self::Float | Self::Double)
    }

    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::Timestamp)
    }

    /// Domain-only types have no direct native counterpart and travel as
    /// derived representations at the backend boundary.
    #[must_use]
    pub const fn is_domain_only(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::Time | Self::Timestamp | Self::Ip | Self::Binary
        )
    }

    /// Whether values of this type admit an ordering.
    #[must_use]
    pub const fn is_orderable(&self) -> bool {
        !matches!(self, Self::Struct(_))
    }

    /// Widening rank for numeric types; `None` for non-numerics.
    #[must_use]
    pub(crate) const fn numeric_rank(&self) -> Option<u8> {
        match self {
            Self::Byte => Some(1),
            Self::Short => Some(2),
            Self::Integer => Some(3),
            Self::Long => Some(4),
            Self::Float => Some(5),
            Self::Double => Some(6),
            _ => None,
        }
    }

    /// Backend column type for this domain type.
    #[must_use]
    pub fn native_type(&self) -> NativeType {
        match self {
            Self::Undefined => NativeType::Null,
            Self::Boolean => NativeType::Boolean,
            Self::Byte => NativeType::TinyInt,
            Self::Short => NativeType::SmallInt,
            Self::Integer => NativeType::Integer,
            Self::Long => NativeType::BigInt,
            Self::Float => NativeType::Real,
            Self::Double => NativeType::Double,
            Self::String => NativeType::Varchar,
            Self::Date => NativeType::Date,
            Self::Time => NativeType::Time,
            Self::Timestamp => NativeType::Timestamp,
            // No native IP type exists; it is carried opaquely.
            Self::Ip => NativeType::Other,
            Self::Binary => NativeType::Varbinary,
            Self::Array(element) => NativeType::Array(Box::new(element.native_type())),
            Self::Struct(fields) => NativeType::Row(
                fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.native_type()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("UNDEFINED"),
            Self::Boolean => f.write_str("BOOLEAN"),
            Self::Byte => f.write_str("BYTE"),
            Self::Short => f.write_str("SHORT"),
            Self::Integer => f.write_str("INTEGER"),
            Self::Long => f.write_str("LONG"),
            Self::Float => f.write_str("FLOAT"),
            Self::Double => f.write_str("DOUBLE"),
            Self::String => f.write_str("STRING"),
            Self::Date => f.write_str("DATE"),
            Self::Time => f.write_str("TIME"),
            Self::Timestamp => f.write_str("TIMESTAMP"),
            Self::Ip => f.write_str("IP"),
            Self::Binary => f.write_str("BINARY"),
            Self::Array(element) => write!(f, "ARRAY<{element}>"),
            Self::Struct(fields) => {
                f.write_str("STRUCT<")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                f.write_str(">")
            }
        }
    }
}

///
/// TypeDescriptor
///
/// Static type plus nullability, as declared by the schema or inferred by
/// the binder.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TypeDescriptor {
    pub ty: ExprType,
    pub nullable: bool,
}

impl TypeDescriptor {
    #[must_use]
    pub const fn new(ty: ExprType, nullable: bool) -> Self {
        Self { ty, nullable }
    }

    #[must_use]
    pub const fn nullable(ty: ExprType) -> Self {
        Self::new(ty, true)
    }

    #[must_use]
    pub const fn not_null(ty: ExprType) -> Self {
        Self::new(ty, false)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}", self.ty)
        } else {
            write!(f, "{} NOT NULL", self.ty)
        }
    }
}

///
/// NativeType
///
/// Backend column type tags. Domain-only types map onto `Date`, `Time`,
/// `Timestamp`, `Other`, and `Varbinary`.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum NativeType {
    Null,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Varchar,
    Date,
    Time,
    Timestamp,
    Other,
    Varbinary,
    Array(Box<Self>),
    Row(Vec<(String, Self)>),
}
