//! Metadata tables held by an assembly.
//!
//! Each table is a fixed-size [`MetadataTable`] whose rows are reserved up front and
//! populated exactly once by the loader. Rows are shared as `Arc`s, so handing a definition
//! to a caller never copies it.
//!
//! # Tables
//!
//! - [`TypeRef`] - References to types defined elsewhere, with a memoized resolution slot
//! - [`TypeDef`] - Types owned by the assembly
//! - [`MethodDef`] - Methods owned by the assembly's types
//! - [`FieldDef`] - Fields owned by the assembly's types
//! - [`ExportedType`] - Types forwarded to a dependency
//!
//! The `AssemblyRef` table is a `MetadataTable<Assembly>` holding the already published
//! dependencies themselves.

mod exportedtype;
mod field;
mod methoddef;
mod table;
mod typedef;
mod typeref;

pub use exportedtype::{ExportedType, ExportedTypeRc};
pub use field::{FieldAttributes, FieldDef, FieldDefRc};
pub use methoddef::{
    MethodAccessFlags, MethodDef, MethodDefRc, MethodModifiers, METHOD_ACCESS_MASK,
    METHOD_VTABLE_LAYOUT_MASK,
};
pub use table::MetadataTable;
pub use typedef::{TypeAttributes, TypeDef, TypeDefList, TypeDefRc};
pub use typeref::{ResolutionScope, TypeRef, TypeRefRc};
