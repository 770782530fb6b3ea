//! Metadata of loaded assemblies.
//!
//! # Key Components
//!
//! - [`assembly`] - The [`crate::Assembly`] container, its population API and type
//!   reference resolution
//! - [`tables`] - Set-once rows for types, methods, fields, type references and forwarders
//! - [`token`] - Metadata tokens addressing table rows
//! - [`identity`] - Assembly identities and version compatibility
//! - [`validation`] - Publication checks
//! - [`dependencies`] - Dependency graph between assemblies
//! - [`context`] - The registry of loaded assemblies

/// Implementation of the assembly metadata container
pub mod assembly;
/// Implementation of the registry of loaded assemblies
pub mod context;
/// Implementation of dependency tracking between assemblies
pub mod dependencies;
/// Implementation of assembly identities
pub mod identity;
/// Implementation of the metadata tables
pub mod tables;
/// Implementation of metadata tokens
pub mod token;
/// Implementation of the publication checks
pub mod validation;
