//! # assemblymeta Prelude
//!
//! The most commonly used types, for glob imports.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all assemblymeta operations
pub use crate::Error;

/// The result type used throughout assemblymeta
pub use crate::Result;

/// Configuration for the checks performed at publication
pub use crate::ValidationConfig;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The metadata container of one loaded assembly
pub use crate::{Assembly, TableCounts};

/// The registry of loaded assemblies
pub use crate::LoadContext;

// ================================================================================================
// Identity
// ================================================================================================

/// Assembly names and versions
pub use crate::metadata::identity::{AssemblyIdentity, AssemblyVersion, Identity};

// ================================================================================================
// Tables
// ================================================================================================

/// Metadata tokens and table identifiers
pub use crate::metadata::token::{TableId, Token};

/// Table rows
pub use crate::metadata::tables::{
    ExportedType, FieldAttributes, FieldDef, MethodAccessFlags, MethodDef, MethodModifiers,
    ResolutionScope, TypeAttributes, TypeDef, TypeDefRc, TypeRef,
};
