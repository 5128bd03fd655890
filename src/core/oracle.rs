//! Type-introspection oracle interface.
//!
//! Class hierarchy and member-layout facts come from the host language's
//! run-time type system, which the core treats as an external oracle: given
//! a class name it answers with the ordered direct superclass names and the
//! class's own instance-structure layout. The core never reimplements a
//! type system; it only walks these answers.

use indexmap::IndexMap;
use thiserror::Error;

use crate::core::typedesc::RuntimeValue;

/// Failure signal from an oracle query.
#[derive(Debug, Error)]
#[error("introspection failed for class '{class}': {message}")]
pub struct OracleError {
    /// Class name that was queried.
    pub class: String,
    /// Reason the structure could not be produced.
    pub message: String,
}

impl OracleError {
    /// Create a new oracle failure for the given class.
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
        }
    }
}

/// External type-introspection capability.
///
/// Queries are case-insensitive on class name. An empty superclass list
/// means the class is a root class.
pub trait TypeOracle {
    /// Ordered list of direct superclass names, empty if none.
    fn superclasses(&self, class_name: &str) -> Vec<String>;

    /// Ordered list of (member name, run-time value) pairs describing the
    /// class's complete own instance structure, or a failure signal when the
    /// definition cannot be found.
    fn own_structure(
        &self,
        class_name: &str,
    ) -> std::result::Result<Vec<(String, RuntimeValue)>, OracleError>;
}

/// Oracle that knows no classes. Every class resolves as a root class with
/// an empty structure.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOracle;

impl TypeOracle for NullOracle {
    fn superclasses(&self, _class_name: &str) -> Vec<String> {
        Vec::new()
    }

    fn own_structure(
        &self,
        _class_name: &str,
    ) -> std::result::Result<Vec<(String, RuntimeValue)>, OracleError> {
        Ok(Vec::new())
    }
}

/// In-memory oracle backed by a class table. Used by tests and by callers
/// that snapshot type facts ahead of a run.
#[derive(Debug, Default, Clone)]
pub struct TableOracle {
    classes: IndexMap<String, ClassFacts>,
}

#[derive(Debug, Clone, Default)]
struct ClassFacts {
    parents: Vec<String>,
    members: Vec<(String, RuntimeValue)>,
}

impl TableOracle {
    /// Create an empty oracle table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class with its direct parents and own structure members.
    /// Member lists must be the complete instance layout, inherited members
    /// included, exactly as the run-time structure reports them.
    pub fn insert(
        &mut self,
        class: impl Into<String>,
        parents: Vec<String>,
        members: Vec<(String, RuntimeValue)>,
    ) {
        self.classes
            .insert(class.into().to_lowercase(), ClassFacts { parents, members });
    }
}

impl TypeOracle for TableOracle {
    fn superclasses(&self, class_name: &str) -> Vec<String> {
        self.classes
            .get(&class_name.to_lowercase())
            .map(|facts| facts.parents.clone())
            .unwrap_or_default()
    }

    fn own_structure(
        &self,
        class_name: &str,
    ) -> std::result::Result<Vec<(String, RuntimeValue)>, OracleError> {
        self.classes
            .get(&class_name.to_lowercase())
            .map(|facts| facts.members.clone())
            .ok_or_else(|| OracleError::new(class_name, "definition not found on search path"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::typedesc::Scalar;

    #[test]
    fn test_null_oracle() {
        assert!(NullOracle.superclasses("anything").is_empty());
        assert!(NullOracle.own_structure("anything").unwrap().is_empty());
    }

    #[test]
    fn test_table_oracle_case_insensitive() {
        let mut oracle = TableOracle::new();
        oracle.insert(
            "MGcoList",
            vec!["MGcoAbstractList".to_string()],
            vec![("count".to_string(), RuntimeValue::Scalar(Scalar::Long(0)))],
        );

        assert_eq!(
            oracle.superclasses("mgcolist"),
            vec!["MGcoAbstractList".to_string()]
        );
        assert_eq!(oracle.own_structure("MGCOLIST").unwrap().len(), 1);
        assert!(oracle.own_structure("unknown").is_err());
    }
}
