//! Dependency tracking between loaded assemblies.
//!
//! The [`AssemblyDependencyGraph`] records which assembly references which. A
//! [`crate::LoadContext`] consults it before publishing an assembly so the load relation
//! never becomes cyclic, and uses it to compute loading orders.

mod graph;

pub use graph::AssemblyDependencyGraph;
