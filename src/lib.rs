// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # assemblymeta
//!
//! In-memory metadata of loaded assemblies for a managed runtime, with lazy, memoized
//! resolution of type references across assembly boundaries.
//!
//! An assembly owns flat, index-addressed tables of the types, methods and fields it
//! defines, the dependencies it references, and the type references it resolves against
//! them. Every type reference is bound to exactly one definition the first time it is
//! resolved and stays bound; concurrent first-time resolution performs the lookup once.
//!
//! ## Architecture
//!
//! - [`metadata::token`] - Metadata tokens and table identifiers
//! - [`metadata::identity`] - Assembly names, versions and strong names
//! - [`metadata::tables`] - Set-once table rows (`TypeRef`, `TypeDef`, `MethodDef`, ...)
//! - [`metadata::assembly`] - The [`Assembly`] container and type reference resolution
//! - [`metadata::validation`] - Checks performed when an assembly is published
//! - [`metadata::dependencies`] - The dependency graph between loaded assemblies
//! - [`metadata::context`] - The [`LoadContext`] owning the loaded assemblies
//!
//! ## Quick Start
//!
//! ```rust
//! use assemblymeta::prelude::*;
//!
//! let context = LoadContext::new();
//!
//! // A loader reserves the tables, fills every slot once and publishes the assembly
//! let mut core = Assembly::new(
//!     AssemblyIdentity::parse("Core, Version=1.0.0.0")?,
//!     TableCounts::new(0, 0, 1, 0, 0),
//! )?;
//! core.set_type_def(0, TypeDef::new("Core", "Point", TypeAttributes::PUBLIC))?;
//! let core = context.publish(core)?;
//!
//! let mut app = Assembly::new(
//!     AssemblyIdentity::parse("App, Version=1.0.0.0")?,
//!     TableCounts::new(1, 2, 0, 0, 0),
//! )?;
//! app.set_assembly_ref(0, core.clone())?;
//! app.set_type_ref(0, TypeRef::new("Core", "Point", ResolutionScope::AssemblyRef(0)))?;
//! app.set_type_ref(1, TypeRef::new("Core", "Vector", ResolutionScope::AssemblyRef(0)))?;
//! let app = context.publish(app)?;
//!
//! // Published assemblies resolve their references on demand, from any thread
//! assert_eq!(app.resolve_type_ref(0)?.fullname(), "Core.Point");
//! assert!(matches!(
//!     app.resolve_type_ref(1),
//!     Err(Error::UnresolvedTypeReference { .. })
//! ));
//! # Ok::<(), assemblymeta::Error>(())
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: publication at `debug`, each first-time
//! resolution at `trace`, and failures of [`Assembly::resolve_all`] at `warn`. No logger
//! is installed by the library.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use assemblymeta::prelude::*;
///
/// let identity = AssemblyIdentity::parse("MyLibrary, Version=1.0.0.0")?;
/// let assembly = Assembly::new(identity, TableCounts::default())?.publish()?;
/// assert!(assembly.entry_point().is_none());
/// # Ok::<(), assemblymeta::Error>(())
/// ```
pub mod prelude;

/// Assembly metadata: tables, identities, validation and the load context
pub mod metadata;

/// `assemblymeta` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `assemblymeta` Error type
///
/// Every fallible operation of this crate returns this error.
pub use error::Error;

/// The metadata container of one loaded assembly
pub use metadata::assembly::{Assembly, TableCounts};

/// The registry of loaded assemblies
pub use metadata::context::LoadContext;

/// Configuration for the checks performed at publication
pub use metadata::validation::ValidationConfig;
