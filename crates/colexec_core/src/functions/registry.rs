use std::sync::Arc;

use colexec_error::{DbError, ErrorKind, Result};
use indexmap::IndexMap;
use tracing::debug;

use super::ScalarFunction;
use super::scalar::builtin_functions;

type FunctionMap<V> = IndexMap<String, V, ahash::RandomState>;

/// Maps function names (and aliases) to scalar functions.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: FunctionMap<Arc<dyn ScalarFunction>>,
    /// Alias -> canonical name.
    aliases: FunctionMap<String>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry containing all builtin functions.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        for func in builtin_functions() {
            registry.register(func)?;
        }
        Ok(registry)
    }

    /// Register a function under its name and aliases.
    ///
    /// Errors if the name or any alias is already taken.
    pub fn register(&mut self, func: Arc<dyn ScalarFunction>) -> Result<()> {
        let name = func.name();
        for candidate in std::iter::once(name).chain(func.aliases().iter().copied()) {
            if self.contains(candidate) {
                return Err(DbError::with_kind(
                    ErrorKind::InvalidName,
                    format!("Function '{candidate}' already registered"),
                )
                .with_field("function", name));
            }
        }

        for alias in func.aliases() {
            self.aliases.insert(alias.to_string(), name.to_string());
        }
        debug!(function = name, aliases = ?func.aliases(), "registered scalar function");
        self.functions.insert(name.to_string(), func);

        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name) || self.aliases.contains_key(name)
    }

    /// Get a function by name or alias.
    pub fn get_opt(&self, name: &str) -> Option<&Arc<dyn ScalarFunction>> {
        match self.functions.get(name) {
            Some(func) => Some(func),
            None => {
                let canonical = self.aliases.get(name)?;
                self.functions.get(canonical)
            }
        }
    }

    /// Get a function by name or alias, erroring if it doesn't exist.
    ///
    /// The error includes the closest matching name if there is one.
    pub fn get(&self, name: &str) -> Result<&Arc<dyn ScalarFunction>> {
        if let Some(func) = self.get_opt(name) {
            return Ok(func);
        }

        let mut err = DbError::with_kind(
            ErrorKind::UnknownFunction,
            format!("Unknown function '{name}'"),
        );
        if let Some(similar) = self.find_similar(name) {
            err = err.with_field("similar", similar);
        }
        Err(err)
    }

    /// Names of all registered functions in registration order. Aliases are
    /// not included.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn find_similar(&self, name: &str) -> Option<&str> {
        let mut similar: Option<SimilarName> = None;
        for candidate in self.functions.keys().chain(self.aliases.keys()) {
            SimilarName::maybe_update(&mut similar, candidate, name);
        }
        similar.map(|s| s.name)
    }
}

#[derive(Debug, Clone, Copy)]
struct SimilarName<'a> {
    score: f64,
    name: &'a str,
}

impl<'a> SimilarName<'a> {
    /// Maybe updates `current` with `candidate` if it scores higher in
    /// similarity with `name`.
    fn maybe_update(current: &mut Option<Self>, candidate: &'a str, name: &str) {
        const SIMILARITY_THRESHOLD: f64 = 0.7;

        let score = strsim::jaro(candidate, name);
        if score > SIMILARITY_THRESHOLD {
            match current {
                Some(existing) if existing.score >= score => (),
                _ => {
                    *current = Some(SimilarName {
                        score,
                        name: candidate,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::scalar::arith::{AddOp, BinaryArithmetic};

    #[test]
    fn builtins_in_order() {
        let registry = FunctionRegistry::with_builtins().unwrap();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            vec![
                "plus",
                "minus",
                "multiply",
                "divide",
                "length",
                "char_length",
                "empty",
                "notEmpty"
            ],
            names
        );
    }

    #[test]
    fn lookup_by_alias() {
        let registry = FunctionRegistry::with_builtins().unwrap();
        assert_eq!("plus", registry.get("+").unwrap().name());
        assert_eq!("char_length", registry.get("lengthUTF8").unwrap().name());
    }

    #[test]
    fn duplicate_rejected() {
        let mut registry = FunctionRegistry::with_builtins().unwrap();
        let err = registry
            .register(Arc::new(BinaryArithmetic::<AddOp>::new()))
            .unwrap_err();
        assert_eq!(ErrorKind::InvalidName, err.kind());
        assert_eq!(8, registry.len());
    }

    #[test]
    fn unknown_suggests_similar() {
        let registry = FunctionRegistry::with_builtins().unwrap();

        let err = registry.get("lenght").unwrap_err();
        assert_eq!(ErrorKind::UnknownFunction, err.kind());
        assert_eq!(Some("length"), err.get_field("similar"));

        let err = registry.get("zzzzzz").unwrap_err();
        assert_eq!(None, err.get_field("similar"));
    }
}
