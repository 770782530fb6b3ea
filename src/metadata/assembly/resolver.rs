//! Type reference resolution.
//!
//! A reference is resolved according to its [`ResolutionScope`]:
//!
//! - **`Module`**: by name among this assembly's own top-level types
//! - **`AssemblyRef`**: by name among the referenced assembly's top-level types. The
//!   dependency's own type references are never consulted.
//! - **`TypeRef`**: the enclosing reference is resolved first, then the nested type is
//!   looked up by name inside the definition it resolved to.
//!
//! Name lookups which miss the searched assembly's definitions follow its type forwarders,
//! at most `max_forwarding_depth` hops.
//!
//! Chains of nested references are walked before any resolution slot is claimed, so a
//! reference cycle is reported as [`Error::CircularReference`] and can never leave two
//! threads waiting on each other.

use std::collections::HashSet;

use log::{trace, warn};
use rayon::prelude::*;

use crate::{
    metadata::{
        assembly::Assembly,
        tables::{ResolutionScope, TypeDefRc, TypeRef},
    },
    Error, Result,
};

impl Assembly {
    /// Resolve the type reference at `index` to the definition it names.
    ///
    /// The first successful resolution is memoized in the reference; later calls return
    /// the same `Arc` without performing any lookup. Concurrent first-time callers are
    /// serialized on the reference so the lookup runs once.
    ///
    /// Intended for published assemblies: nested types are only linked to their enclosing
    /// type by [`Assembly::publish`].
    ///
    /// # Errors
    /// - [`Error::IndexOutOfRange`] if `index` is outside the `TypeRef` table
    /// - [`Error::Unpopulated`] if the loader never filled the slot, or the scope names an
    ///   unpopulated assembly ref
    /// - [`Error::UnresolvedTypeReference`] if the named type does not exist in its scope
    /// - [`Error::CircularReference`] if the resolution path loops back on itself
    /// - [`Error::InvalidMetadata`] if a nested reference chain exceeds `max_nesting_depth`
    pub fn resolve_type_ref(&self, index: u32) -> Result<TypeDefRc> {
        let reference = self.type_refs.get(index)?;
        if let Some(resolved) = reference.resolved() {
            return Ok(resolved.clone());
        }

        self.check_scope_chain(index)?;
        reference.resolve_with(|reference| self.lookup_type_ref(reference))
    }

    /// Eagerly resolve every type reference in parallel.
    ///
    /// Returns the references that failed to resolve together with their error, ordered
    /// by index. Every failure is also logged as a warning.
    #[must_use]
    pub fn resolve_all(&self) -> Vec<(u32, Error)> {
        let failures: Vec<(u32, Error)> = (0..self.type_refs.len())
            .into_par_iter()
            .filter_map(|index| self.resolve_type_ref(index).err().map(|err| (index, err)))
            .collect();

        for (index, err) in &failures {
            warn!(
                "{}: failed to resolve {}: {}",
                self.identity.name,
                self.type_refs.token(*index),
                err
            );
        }

        failures
    }

    /// Walk the enclosing references of `index` up to the first one which is resolved or
    /// not nested
    fn check_scope_chain(&self, index: u32) -> Result<()> {
        let mut visited = HashSet::from([index]);
        let mut current = self.type_refs.get(index)?;

        while let ResolutionScope::TypeRef(enclosing) = current.scope {
            if !visited.insert(enclosing) {
                return Err(Error::CircularReference(self.type_refs.token(enclosing)));
            }

            if visited.len() > self.config.max_nesting_depth + 1 {
                return Err(invalid_metadata!(
                    "Nested type reference {} exceeds the nesting limit of {}",
                    self.type_refs.token(index),
                    self.config.max_nesting_depth
                ));
            }

            current = self.type_refs.get(enclosing)?;
            if current.is_resolved() {
                break;
            }
        }

        Ok(())
    }

    /// The lookup behind a resolution slot, runs at most once per successful resolution
    fn lookup_type_ref(&self, reference: &TypeRef) -> Result<TypeDefRc> {
        self.record_lookup();

        let found = match reference.scope {
            ResolutionScope::Module => self.lookup_type(
                &reference.namespace,
                &reference.name,
                self.config.max_forwarding_depth,
            )?,
            ResolutionScope::AssemblyRef(target) => self.assembly_ref(target)?.lookup_type(
                &reference.namespace,
                &reference.name,
                self.config.max_forwarding_depth,
            )?,
            ResolutionScope::TypeRef(enclosing) => self
                .resolve_type_ref(enclosing)?
                .nested_type(&reference.name),
        };

        match found {
            Some(definition) => {
                trace!(
                    "Resolved {} '{}' to {}",
                    reference.token,
                    reference.fullname(),
                    definition.token
                );
                Ok(definition)
            }
            None => Err(Error::UnresolvedTypeReference {
                reference: reference.fullname(),
                scope: self.scope_name(reference.scope),
            }),
        }
    }

    /// Find a top-level type by name, following type forwarders with `hops` remaining
    pub(crate) fn lookup_type(
        &self,
        namespace: &str,
        name: &str,
        hops: usize,
    ) -> Result<Option<TypeDefRc>> {
        if let Some(definition) = self.find_type(namespace, name) {
            return Ok(Some(definition));
        }

        let Some(forwarder) = self
            .forwarders
            .get(&(namespace.to_string(), name.to_string()))
        else {
            return Ok(None);
        };
        let forwarder = forwarder.value();

        if hops == 0 {
            return Err(Error::CircularReference(forwarder.token));
        }

        self.assembly_ref(forwarder.implementation)?
            .lookup_type(namespace, name, hops - 1)
    }

    fn scope_name(&self, scope: ResolutionScope) -> String {
        match scope {
            ResolutionScope::Module => self.identity.display_name(),
            ResolutionScope::AssemblyRef(target) => self
                .assembly_refs
                .get(target)
                .map(|dependency| dependency.identity().display_name())
                .unwrap_or_else(|_| format!("{}", self.assembly_refs.token(target))),
            ResolutionScope::TypeRef(enclosing) => self
                .type_refs
                .get(enclosing)
                .map(|outer| outer.fullname())
                .unwrap_or_else(|_| format!("{}", self.type_refs.token(enclosing))),
        }
    }
}
