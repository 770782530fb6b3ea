//! Publication checks for an assembly.
//!
//! The [`Orchestrator`] runs every check an assembly has to pass before it is shared with
//! other threads, in the order population errors are most useful to a loader: missing
//! rows first, then member ranges, nesting, the entry point and finally the dependency
//! chain.

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;

use crate::{
    metadata::{
        assembly::Assembly,
        identity::AssemblyIdentity,
        tables::MetadataTable,
        validation::{
            member::{MemberOwnership, MemberValidator},
            nested::NestedClassValidator,
            ValidationConfig,
        },
    },
    Error, Result,
};

/// Runs the publication checks configured by a [`ValidationConfig`]
pub(crate) struct Orchestrator;

impl Orchestrator {
    /// Validate `assembly` for publication and compute the owner of each member.
    ///
    /// # Errors
    /// Returns [`Error::InvalidMetadata`] for structural problems and
    /// [`Error::CircularDependency`] if the assembly would depend on itself.
    pub fn validate_assembly(
        assembly: &Assembly,
        config: ValidationConfig,
    ) -> Result<MemberOwnership> {
        if config.require_complete_tables {
            Self::validate_complete(assembly.assembly_refs())?;
            Self::validate_complete(assembly.type_refs())?;
            Self::validate_complete(assembly.type_defs())?;
            Self::validate_complete(assembly.method_defs())?;
            Self::validate_complete(assembly.fields())?;
            Self::validate_complete(assembly.exported_types())?;
        }

        let ownership = MemberValidator::validate_member_ranges(
            assembly.type_defs(),
            assembly.method_defs().len(),
            assembly.fields().len(),
            config.enable_ownership_validation,
        )?;

        NestedClassValidator::validate_nesting(
            assembly.type_defs(),
            config.enable_nesting_validation,
            config.max_nesting_depth,
        )?;

        if let Some(index) = assembly.entry_point_index() {
            Self::validate_entry_point(assembly, index, config)?;
        }

        Self::validate_dependencies(assembly)?;

        debug!(
            "Validated {} ({} types, {} methods, {} fields)",
            assembly.identity().name,
            assembly.type_defs().len(),
            assembly.method_defs().len(),
            assembly.fields().len()
        );

        Ok(ownership)
    }

    fn validate_complete<T>(table: &MetadataTable<T>) -> Result<()> {
        match table.first_unpopulated() {
            Some(index) => Err(invalid_metadata!(
                "{} row {} was never populated",
                table.id(),
                index
            )),
            None => Ok(()),
        }
    }

    fn validate_entry_point(
        assembly: &Assembly,
        index: u32,
        config: ValidationConfig,
    ) -> Result<()> {
        let Ok(method) = assembly.method_def(index) else {
            return Err(invalid_metadata!(
                "Entry point method {} was never populated",
                index
            ));
        };

        if config.enable_entry_point_validation && !method.is_static() {
            return Err(invalid_metadata!(
                "Entry point '{}' must be a static method",
                method.name
            ));
        }

        Ok(())
    }

    /// Reject assemblies whose reference chain leads back to their own identity
    fn validate_dependencies(assembly: &Assembly) -> Result<()> {
        let target = assembly.identity();
        let mut visited = HashSet::new();
        let mut path = vec![target.name.clone()];

        if Self::find_dependency_path(assembly, target, &mut visited, &mut path) {
            return Err(Error::CircularDependency(path.join(" -> ")));
        }

        Ok(())
    }

    fn find_dependency_path(
        current: &Assembly,
        target: &AssemblyIdentity,
        visited: &mut HashSet<*const Assembly>,
        path: &mut Vec<String>,
    ) -> bool {
        for (_, dependency) in current.assembly_refs().iter() {
            path.push(dependency.identity().name.clone());

            if dependency.identity() == target {
                return true;
            }

            if visited.insert(Arc::as_ptr(dependency))
                && Self::find_dependency_path(dependency, target, visited, path)
            {
                return true;
            }

            path.pop();
        }

        false
    }
}
