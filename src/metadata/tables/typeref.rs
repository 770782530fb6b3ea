//! `TypeRef` rows and their memoized resolution slot.
//!
//! A [`TypeRef`] names a type by namespace, name and [`ResolutionScope`]. It starts out
//! unresolved and is bound to exactly one [`TypeDefRc`] the first time somebody resolves
//! it. The binding never changes afterwards.
//!
//! # Thread Safety
//!
//! The resolved value lives in a [`OnceLock`], so the memoized path is a single atomic
//! load. First-time resolution is guarded per slot: one thread performs the lookup while
//! concurrent callers wait on a condition variable and then observe the memoized value.
//! A lookup that fails leaves the slot unresolved; waiters retry and observe the same
//! deterministic error. A thread that re-enters the resolution of a slot it is already
//! resolving gets [`Error::CircularReference`] instead of recursing.

use std::fmt;
use std::sync::{Condvar, Mutex, OnceLock};
use std::thread::{self, ThreadId};

use crate::{
    metadata::{
        tables::typedef::{full_name, TypeDefRc},
        token::Token,
    },
    Error, Result,
};

/// Reference to a `TypeRef`
pub type TypeRefRc = std::sync::Arc<TypeRef>;

/// Where the definition of a referenced type is to be found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionScope {
    /// The assembly holding the reference
    Module,
    /// The assembly at this index of the `AssemblyRef` table
    AssemblyRef(u32),
    /// A nested type, enclosed by the type the reference at this index names
    TypeRef(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Unresolved,
    Resolving(ThreadId),
}

/// A reference to a type defined elsewhere
pub struct TypeRef {
    /// Token, assigned by the owning assembly when the row is populated
    pub token: Token,
    /// `TypeNamespace` (empty for nested types)
    pub namespace: String,
    /// `TypeName`
    pub name: String,
    /// Where the definition lives
    pub scope: ResolutionScope,
    resolved: OnceLock<TypeDefRc>,
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl TypeRef {
    /// Create a new, unresolved reference
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        scope: ResolutionScope,
    ) -> Self {
        TypeRef {
            token: Token::new(0),
            namespace: namespace.into(),
            name: name.into(),
            scope,
            resolved: OnceLock::new(),
            state: Mutex::new(SlotState::Unresolved),
            ready: Condvar::new(),
        }
    }

    /// Returns the full name (Namespace.Name) of the referenced type
    #[must_use]
    pub fn fullname(&self) -> String {
        full_name(&self.namespace, &self.name)
    }

    /// The memoized definition, if this reference has been resolved
    #[must_use]
    pub fn resolved(&self) -> Option<&TypeDefRc> {
        self.resolved.get()
    }

    /// Whether this reference has been resolved
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Resolve this reference, running `lookup` at most once across all threads.
    ///
    /// # Errors
    /// Returns [`Error::CircularReference`] if the calling thread is already resolving this
    /// slot, [`Error::LockError`] if the slot lock is poisoned, or whatever `lookup` fails
    /// with.
    pub(crate) fn resolve_with<F>(&self, lookup: F) -> Result<TypeDefRc>
    where
        F: FnOnce(&TypeRef) -> Result<TypeDefRc>,
    {
        if let Some(resolved) = self.resolved.get() {
            return Ok(resolved.clone());
        }

        let current = thread::current().id();
        let mut state = self.state.lock().map_err(|_| Error::LockError)?;
        loop {
            if let Some(resolved) = self.resolved.get() {
                return Ok(resolved.clone());
            }

            let observed = *state;
            match observed {
                SlotState::Unresolved => break,
                SlotState::Resolving(owner) if owner == current => {
                    return Err(Error::CircularReference(self.token));
                }
                SlotState::Resolving(_) => {
                    state = self.ready.wait(state).map_err(|_| Error::LockError)?;
                }
            }
        }
        *state = SlotState::Resolving(current);
        drop(state);

        let _guard = ResolvingGuard { slot: self };
        let outcome = lookup(self);
        if let Ok(resolved) = &outcome {
            // Only the thread owning the `Resolving` state writes, so this cannot fail
            let _ = self.resolved.set(resolved.clone());
        }

        outcome
    }
}

/// Releases the slot once its owner is done, even if the lookup panicked
struct ResolvingGuard<'a> {
    slot: &'a TypeRef,
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        let mut state = match self.slot.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        *state = SlotState::Unresolved;
        drop(state);

        self.slot.ready.notify_all();
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRef")
            .field("token", &self.token)
            .field("name", &self.fullname())
            .field("scope", &self.scope)
            .field("resolved", &self.resolved.get().map(|def| def.token))
            .finish()
    }
}
