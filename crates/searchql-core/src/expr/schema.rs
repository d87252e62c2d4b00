use crate::value::{ExprType, TypeDescriptor};

///
/// FieldOrigin
///
/// Whether a column exists in the backend index or is produced by an
/// upstream computation (e.g. an `eval` alias).
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FieldOrigin {
    Indexed,
    Derived,
}

///
/// FieldSchema
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub ty: TypeDescriptor,
    pub origin: FieldOrigin,
}

impl FieldSchema {
    #[must_use]
    pub const fn is_indexed(&self) -> bool {
        matches!(self.origin, FieldOrigin::Indexed)
    }

    /// Text-bearing columns searched by all-field relevance calls.
    #[must_use]
    pub fn is_text(&self) -> bool {
        match &self.ty.ty {
            ExprType::String => true,
            ExprType::Array(element) => **element == ExprType::String,
            _ => false,
        }
    }
}

///
/// Schema
///
/// Ordered field → type descriptor + origin table for one query input.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Schema {
    fields: Vec<FieldSchema>,
}

impl Schema {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add (or replace) a field.
    #[must_use]
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        ty: TypeDescriptor,
        origin: FieldOrigin,
    ) -> Self {
        let field = FieldSchema {
            name: name.into(),
            ty,
            origin,
        };
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Add a nullable indexed field.
    #[must_use]
    pub fn indexed(self, name: impl Into<String>, ty: ExprType) -> Self {
        self.with_field(name, TypeDescriptor::nullable(ty), FieldOrigin::Indexed)
    }

    /// Add a nullable derived field.
    #[must_use]
    pub fn derived(self, name: impl Into<String>, ty: ExprType) -> Self {
        self.with_field(name, TypeDescriptor::nullable(ty), FieldOrigin::Derived)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Fields whose names match a `*` pattern, in schema order.
    pub fn matching<'a>(&'a self, pattern: &'a str) -> impl Iterator<Item = &'a FieldSchema> {
        self.fields
            .iter()
            .filter(move |f| glob_matches(&f.name, pattern))
    }
}

/// `*`-only glob used for field-name patterns.
pub(crate) fn glob_matches(text: &str, pattern: &str) -> bool {
    let Some((head, rest)) = pattern.split_once('*') else {
        return text == pattern;
    };
    let Some(mut remaining) = text.strip_prefix(head) else {
        return false;
    };

    let mut parts: Vec<&str> = rest.split('*').collect();
    let tail = parts.pop().unwrap_or_default();
    for part in parts {
        match remaining.find(part) {
            Some(at) => remaining = &remaining[at + part.len()..],
            None => return false,
        }
    }

    remaining.len() >= tail.len() && remaining.ends_with(tail)
}
