//! The execution context owning loaded assemblies.
//!
//! A [`LoadContext`] is the registry a runtime keeps for one execution context. Assemblies
//! enter it through [`LoadContext::publish`], which enforces that the load relation stays
//! acyclic: every dependency must already be part of the context, and an assembly whose
//! references lead back to itself is rejected before anyone else can observe it.
//! Dropping the context unloads all of its assemblies.
//!
//! Assemblies are registered under their name compared case-insensitively, together with
//! version and culture, the same way [`LoadContext::resolve_assembly`] binds names. Two
//! identities differing only in the case of their name cannot both be loaded.
//!
//! # Examples
//!
//! ```rust
//! use assemblymeta::prelude::*;
//!
//! let context = LoadContext::new();
//!
//! let mut core = Assembly::new(
//!     AssemblyIdentity::parse("Core, Version=1.2.0.0")?,
//!     TableCounts::new(0, 0, 1, 0, 0),
//! )?;
//! core.set_type_def(0, TypeDef::new("Core", "Point", TypeAttributes::PUBLIC))?;
//! let core = context.publish(core)?;
//!
//! let found = context.resolve_assembly("Core", &AssemblyVersion::new(1, 0, 0, 0));
//! assert!(found.is_some_and(|found| std::sync::Arc::ptr_eq(&found, &core)));
//! # Ok::<(), assemblymeta::Error>(())
//! ```

use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use log::debug;

use crate::{
    metadata::{
        assembly::Assembly,
        dependencies::AssemblyDependencyGraph,
        identity::{AssemblyIdentity, AssemblyVersion},
        validation::ValidationConfig,
    },
    Error, Result,
};

/// Case-folded name, version and culture of a loaded assembly
type RegistryKey = (String, AssemblyVersion, Option<String>);

fn registry_key(identity: &AssemblyIdentity) -> RegistryKey {
    (
        identity.name.to_ascii_lowercase(),
        identity.version,
        identity.culture.clone(),
    )
}

/// Registry of the assemblies loaded into one execution context
pub struct LoadContext {
    assemblies: DashMap<RegistryKey, Arc<Assembly>>,
    graph: AssemblyDependencyGraph,
    config: ValidationConfig,
}

impl LoadContext {
    /// Create an empty context publishing with the default [`ValidationConfig`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ValidationConfig::default())
    }

    /// Create an empty context publishing with `config`
    #[must_use]
    pub fn with_config(config: ValidationConfig) -> Self {
        LoadContext {
            assemblies: DashMap::new(),
            graph: AssemblyDependencyGraph::new(),
            config,
        }
    }

    /// Publish a populated assembly into this context.
    ///
    /// # Errors
    /// - [`Error::AssemblyNotLoaded`] if an assembly ref is not the instance registered in
    ///   this context under its identity
    /// - [`Error::DuplicateAssembly`] if an assembly with the same identity is loaded,
    ///   names compared case-insensitively
    /// - [`Error::CircularDependency`] if the assembly would (transitively) depend on itself
    /// - any error of [`Assembly::publish_with`]
    pub fn publish(&self, assembly: Assembly) -> Result<Arc<Assembly>> {
        let mut dependencies = Vec::with_capacity(assembly.assembly_refs().len() as usize);
        for (_, dependency) in assembly.assembly_refs().iter() {
            let registered = self
                .assemblies
                .get(&registry_key(dependency.identity()))
                .is_some_and(|loaded| Arc::ptr_eq(loaded.value(), dependency));
            if !registered {
                return Err(Error::AssemblyNotLoaded(dependency.identity().display_name()));
            }
            dependencies.push(dependency.identity().clone());
        }

        let assembly = assembly.publish_with(self.config)?;
        let identity = assembly.identity().clone();

        match self.assemblies.entry(registry_key(&identity)) {
            Entry::Occupied(_) => return Err(Error::DuplicateAssembly(identity.display_name())),
            Entry::Vacant(entry) => {
                entry.insert(assembly.clone());
            }
        }

        self.graph.add_assembly(identity.clone());
        // Dependencies were registered before `identity`, so no new edge can close a cycle
        for dependency in dependencies {
            self.graph.add_dependency(identity.clone(), dependency);
        }

        debug!(
            "Loaded {} into context ({} assemblies)",
            identity.display_name(),
            self.assemblies.len()
        );

        Ok(assembly)
    }

    /// The assembly loaded under `identity`, the name compared case-insensitively
    #[must_use]
    pub fn get(&self, identity: &AssemblyIdentity) -> Option<Arc<Assembly>> {
        self.assemblies
            .get(&registry_key(identity))
            .map(|entry| entry.value().clone())
    }

    /// The highest loaded version of `name` which satisfies a reference to `version`.
    ///
    /// Names compare case-insensitively; only culture-neutral assemblies are considered.
    /// A compatible version has the same major version and is at least `version`.
    #[must_use]
    pub fn resolve_assembly(&self, name: &str, version: &AssemblyVersion) -> Option<Arc<Assembly>> {
        let required = AssemblyIdentity::new(name, *version, None, None);

        self.assemblies
            .iter()
            .filter(|entry| entry.value().identity().satisfies(&required))
            .max_by_key(|entry| entry.value().identity().version)
            .map(|entry| entry.value().clone())
    }

    /// All loaded assemblies, every one after the assemblies it depends on
    ///
    /// # Errors
    /// Returns [`Error::LockError`] if the ordering cache is poisoned.
    pub fn load_order(&self) -> Result<Vec<Arc<Assembly>>> {
        Ok(self
            .graph
            .topological_order()?
            .iter()
            .filter_map(|identity| self.get(identity))
            .collect())
    }

    /// Loaded assemblies directly referencing `identity`
    #[must_use]
    pub fn dependents_of(&self, identity: &AssemblyIdentity) -> Vec<Arc<Assembly>> {
        self.graph
            .get_dependents(identity)
            .iter()
            .filter_map(|dependent| self.get(dependent))
            .collect()
    }

    /// The dependency graph between the loaded assemblies
    #[must_use]
    pub fn dependency_graph(&self) -> &AssemblyDependencyGraph {
        &self.graph
    }

    /// Number of loaded assemblies
    #[must_use]
    pub fn len(&self) -> usize {
        self.assemblies.len()
    }

    /// Whether no assembly is loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assemblies.is_empty()
    }
}

impl Default for LoadContext {
    fn default() -> Self {
        Self::new()
    }
}
