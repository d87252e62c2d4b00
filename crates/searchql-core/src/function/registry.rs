use crate::{function::library, udf::DomainFunction};
use std::{collections::BTreeMap, sync::Arc, sync::OnceLock};

///
/// FunctionRegistry
///
/// Read-only name → function table. The built-in table is populated once
/// per process and never mutated; custom tables are assembled up front
/// and then shared.
///

#[derive(Clone, Debug, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<&'static str, Arc<DomainFunction>>,
}

impl FunctionRegistry {
    /// Shared built-in registry.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static BUILTIN: OnceLock<FunctionRegistry> = OnceLock::new();

        BUILTIN.get_or_init(|| Self::from_functions(library::builtin_functions()))
    }

    #[must_use]
    pub fn from_functions(functions: impl IntoIterator<Item = DomainFunction>) -> Self {
        Self {
            functions: functions
                .into_iter()
                .map(|function| (function.id().name, Arc::new(function)))
                .collect(),
        }
    }

    /// Copy of this registry extended with `function`, replacing any
    /// function of the same name.
    #[must_use]
    pub fn with_function(mut self, function: DomainFunction) -> Self {
        self.functions
            .insert(function.id().name, Arc::new(function));
        self
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<DomainFunction>> {
        self.functions.get(name.to_ascii_lowercase().as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }
}
