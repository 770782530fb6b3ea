//! `ExportedType` rows: type forwarders.
//!
//! When a type moves from one assembly to another, the old assembly keeps an exported
//! type entry pointing at the dependency that now defines it. Name lookups which miss the
//! assembly's own definitions follow these entries.

use std::sync::Arc;

use crate::metadata::{tables::typedef::full_name, token::Token};

/// Reference to an `ExportedType`
pub type ExportedTypeRc = Arc<ExportedType>;

/// A type forwarded to one of the assembly's dependencies
#[derive(Debug)]
pub struct ExportedType {
    /// Token, assigned by the owning assembly when the row is populated
    pub token: Token,
    /// Namespace of the forwarded type
    pub namespace: String,
    /// Name of the forwarded type
    pub name: String,
    /// Index into the `AssemblyRef` table of the assembly now defining the type
    pub implementation: u32,
}

impl ExportedType {
    /// Create a new forwarder to the assembly ref at `implementation`
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, implementation: u32) -> Self {
        ExportedType {
            token: Token::new(0),
            namespace: namespace.into(),
            name: name.into(),
            implementation,
        }
    }

    /// Returns the full name (Namespace.Name) of the forwarded type
    #[must_use]
    pub fn fullname(&self) -> String {
        full_name(&self.namespace, &self.name)
    }
}
