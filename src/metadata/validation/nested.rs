//! Validation of nested type relationships.
//!
//! A nested type names its enclosing type by index. The enclosing type must exist and
//! differ from the nested one. With nesting validation enabled the enclosing chains must
//! also be acyclic, no deeper than the configured limit, and a type may not contain two
//! nested types of the same name, since nested type references are resolved by name.

use std::collections::HashSet;

use crate::{
    metadata::tables::{MetadataTable, TypeDef},
    Result,
};

/// Nested class validator
pub(crate) struct NestedClassValidator;

impl NestedClassValidator {
    /// Validate the enclosing type of every nested type.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidMetadata`] if an enclosing type is missing or the
    /// type itself, and, when `full` is set, for nesting cycles, chains deeper than
    /// `max_depth` and duplicate nested names.
    pub fn validate_nesting(
        types: &MetadataTable<TypeDef>,
        full: bool,
        max_depth: usize,
    ) -> Result<()> {
        let mut nested_names = HashSet::new();

        for (index, def) in types.iter() {
            let Some(enclosing) = def.enclosing else {
                continue;
            };

            if enclosing == index {
                return Err(invalid_metadata!(
                    "Type '{}' cannot be nested within itself",
                    def.fullname()
                ));
            }

            if !types.is_populated(enclosing) {
                return Err(invalid_metadata!(
                    "Type '{}' is nested in missing type {}",
                    def.fullname(),
                    enclosing
                ));
            }

            if !full {
                continue;
            }

            if !nested_names.insert((enclosing, def.name.as_str())) {
                return Err(invalid_metadata!(
                    "Type {} contains more than one nested type named '{}'",
                    enclosing,
                    def.name
                ));
            }

            Self::validate_chain(types, index, max_depth)?;
        }

        Ok(())
    }

    /// Walk from `start` to its outermost enclosing type
    fn validate_chain(types: &MetadataTable<TypeDef>, start: u32, max_depth: usize) -> Result<()> {
        let mut visited = HashSet::from([start]);
        let mut current = start;
        let mut depth = 0usize;

        while let Some(enclosing) = types.get(current)?.enclosing {
            if !visited.insert(enclosing) {
                return Err(invalid_metadata!(
                    "Circular nesting detected at type {}",
                    enclosing
                ));
            }

            depth += 1;
            if depth > max_depth {
                return Err(invalid_metadata!(
                    "Nesting depth of type {} exceeds the limit of {}",
                    start,
                    max_depth
                ));
            }

            current = enclosing;
        }

        Ok(())
    }
}
