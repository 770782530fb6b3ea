//! The assembly metadata container.
//!
//! An [`Assembly`] owns the metadata tables of one loaded assembly: the dependencies it
//! references, the type references it resolves against them, and the types, methods,
//! fields and type forwarders it defines.
//!
//! # Lifecycle
//!
//! 1. **Construction**: [`Assembly::new`] reserves every table with the row counts the
//!    loader read from the binary. No resolution happens here.
//! 2. **Population**: the loader fills each slot exactly once through the `set_*` methods.
//!    These take `&mut self`, so population is single-threaded by construction.
//! 3. **Publication**: [`Assembly::publish`] validates the tables, links nested types and
//!    hands out the shared, read-only `Arc<Assembly>`. Nothing can be populated afterwards.
//! 4. **Resolution**: any thread may call [`Assembly::resolve_type_ref`] on the published
//!    assembly. Each reference is looked up at most once and memoized forever.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use assemblymeta::prelude::*;
//!
//! let mut core = Assembly::new(
//!     AssemblyIdentity::parse("Core, Version=1.0.0.0")?,
//!     TableCounts::new(0, 0, 1, 0, 0),
//! )?;
//! core.set_type_def(0, TypeDef::new("Core", "Point", TypeAttributes::PUBLIC))?;
//! let core = core.publish()?;
//!
//! let mut app = Assembly::new(
//!     AssemblyIdentity::parse("App, Version=1.0.0.0")?,
//!     TableCounts::new(1, 1, 0, 0, 0),
//! )?;
//! app.set_assembly_ref(0, core.clone())?;
//! app.set_type_ref(0, TypeRef::new("Core", "Point", ResolutionScope::AssemblyRef(0)))?;
//! let app = app.publish()?;
//!
//! let point = app.resolve_type_ref(0)?;
//! assert!(Arc::ptr_eq(&point, core.type_def(0)?));
//! # Ok::<(), assemblymeta::Error>(())
//! ```

mod resolver;

use std::fmt;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crossbeam_skiplist::SkipMap;
use log::debug;

use crate::{
    metadata::{
        identity::AssemblyIdentity,
        tables::{
            ExportedType, ExportedTypeRc, FieldDef, FieldDefRc, MetadataTable, MethodDef,
            MethodDefRc, ResolutionScope, TypeDef, TypeDefRc, TypeRef, TypeRefRc,
        },
        token::{TableId, Token},
        validation::{MemberOwnership, Orchestrator, ValidationConfig},
    },
    Error, Result,
};

/// Number of rows reserved for each table of an [`Assembly`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    /// Rows of the `AssemblyRef` table
    pub assembly_refs: u32,
    /// Rows of the `TypeRef` table
    pub type_refs: u32,
    /// Rows of the `TypeDef` table
    pub type_defs: u32,
    /// Rows of the `MethodDef` table
    pub method_defs: u32,
    /// Rows of the `Field` table
    pub fields: u32,
    /// Rows of the `ExportedType` table
    pub exported_types: u32,
}

impl TableCounts {
    /// Row counts for an assembly without type forwarders
    #[must_use]
    pub fn new(
        assembly_refs: u32,
        type_refs: u32,
        type_defs: u32,
        method_defs: u32,
        fields: u32,
    ) -> Self {
        TableCounts {
            assembly_refs,
            type_refs,
            type_defs,
            method_defs,
            fields,
            exported_types: 0,
        }
    }

    /// Reserve `count` rows for the `ExportedType` table
    #[must_use]
    pub fn with_exported_types(mut self, count: u32) -> Self {
        self.exported_types = count;
        self
    }

    fn validate(&self) -> Result<()> {
        let counts = [
            (TableId::AssemblyRef, self.assembly_refs),
            (TableId::TypeRef, self.type_refs),
            (TableId::TypeDef, self.type_defs),
            (TableId::MethodDef, self.method_defs),
            (TableId::Field, self.fields),
            (TableId::ExportedType, self.exported_types),
        ];

        for (table, count) in counts {
            if count > Token::MAX_ROW {
                return Err(invalid_metadata!(
                    "Table {} declares {} rows, the limit is {}",
                    table,
                    count,
                    Token::MAX_ROW
                ));
            }
        }

        Ok(())
    }
}

/// The metadata of one loaded assembly.
///
/// See the [module documentation](self) for the lifecycle. All accessors address rows by
/// their 0-based index and fail with [`Error::IndexOutOfRange`] outside the reserved
/// range, or with [`Error::Unpopulated`] for rows the loader never filled.
pub struct Assembly {
    identity: AssemblyIdentity,
    assembly_refs: MetadataTable<Assembly>,
    type_refs: MetadataTable<TypeRef>,
    type_defs: MetadataTable<TypeDef>,
    method_defs: MetadataTable<MethodDef>,
    fields: MetadataTable<FieldDef>,
    exported_types: MetadataTable<ExportedType>,
    entry_point: Option<u32>,
    /// Top-level types keyed by (namespace, name)
    types_by_name: SkipMap<(String, String), TypeDefRc>,
    /// Type forwarders keyed by (namespace, name)
    forwarders: SkipMap<(String, String), ExportedTypeRc>,
    ownership: MemberOwnership,
    config: ValidationConfig,
    lookups: AtomicUsize,
}

impl Assembly {
    /// Reserve the tables of a new assembly.
    ///
    /// # Errors
    /// Returns [`Error::InvalidMetadata`] if the identity is malformed or a table declares
    /// more rows than a metadata token can address.
    pub fn new(identity: AssemblyIdentity, counts: TableCounts) -> Result<Self> {
        identity.validate()?;
        counts.validate()?;

        Ok(Assembly {
            identity,
            assembly_refs: MetadataTable::new(TableId::AssemblyRef, counts.assembly_refs),
            type_refs: MetadataTable::new(TableId::TypeRef, counts.type_refs),
            type_defs: MetadataTable::new(TableId::TypeDef, counts.type_defs),
            method_defs: MetadataTable::new(TableId::MethodDef, counts.method_defs),
            fields: MetadataTable::new(TableId::Field, counts.fields),
            exported_types: MetadataTable::new(TableId::ExportedType, counts.exported_types),
            entry_point: None,
            types_by_name: SkipMap::new(),
            forwarders: SkipMap::new(),
            ownership: MemberOwnership::default(),
            config: ValidationConfig::default(),
            lookups: AtomicUsize::new(0),
        })
    }

    /// Populate the assembly reference at `index` with an already published dependency.
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] or [`Error::DuplicateDefinition`].
    pub fn set_assembly_ref(&mut self, index: u32, assembly: Arc<Assembly>) -> Result<()> {
        self.assembly_refs.set_shared(index, assembly)?;
        Ok(())
    }

    /// Populate the type reference at `index`.
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] or [`Error::DuplicateDefinition`] for the slot,
    /// and [`Error::InvalidMetadata`] if the resolution scope names a row outside its table.
    pub fn set_type_ref(&mut self, index: u32, mut type_ref: TypeRef) -> Result<()> {
        type_ref.token = self.type_refs.check_vacant(index)?;

        match type_ref.scope {
            ResolutionScope::Module => {}
            ResolutionScope::AssemblyRef(target) => {
                if target >= self.assembly_refs.len() {
                    return Err(invalid_metadata!(
                        "TypeRef '{}' is scoped to missing assembly ref {}",
                        type_ref.fullname(),
                        target
                    ));
                }
            }
            ResolutionScope::TypeRef(enclosing) => {
                if enclosing >= self.type_refs.len() {
                    return Err(invalid_metadata!(
                        "TypeRef '{}' is nested in missing type ref {}",
                        type_ref.fullname(),
                        enclosing
                    ));
                }
            }
        }

        self.type_refs.set(index, type_ref)?;
        Ok(())
    }

    /// Populate the type definition at `index`.
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] or [`Error::DuplicateDefinition`] for the slot,
    /// and [`Error::InvalidMetadata`] if a top-level type of the same name already exists.
    pub fn set_type_def(&mut self, index: u32, mut type_def: TypeDef) -> Result<()> {
        type_def.token = self.type_defs.check_vacant(index)?;

        let key = (type_def.namespace.clone(), type_def.name.clone());
        if !type_def.is_nested() && self.types_by_name.contains_key(&key) {
            return Err(invalid_metadata!(
                "Type '{}' is defined more than once",
                type_def.fullname()
            ));
        }

        let row = self.type_defs.set(index, type_def)?;
        if !row.is_nested() {
            self.types_by_name.insert(key, row.clone());
        }

        Ok(())
    }

    /// Populate the method definition at `index`.
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] or [`Error::DuplicateDefinition`].
    pub fn set_method_def(&mut self, index: u32, mut method: MethodDef) -> Result<()> {
        method.token = self.method_defs.check_vacant(index)?;
        self.method_defs.set(index, method)?;
        Ok(())
    }

    /// Populate the field definition at `index`.
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] or [`Error::DuplicateDefinition`].
    pub fn set_field(&mut self, index: u32, mut field: FieldDef) -> Result<()> {
        field.token = self.fields.check_vacant(index)?;
        self.fields.set(index, field)?;
        Ok(())
    }

    /// Populate the type forwarder at `index`.
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] or [`Error::DuplicateDefinition`] for the slot,
    /// and [`Error::InvalidMetadata`] if the forwarder targets a missing assembly ref or
    /// the same name is forwarded twice.
    pub fn set_exported_type(&mut self, index: u32, mut exported: ExportedType) -> Result<()> {
        exported.token = self.exported_types.check_vacant(index)?;

        if exported.implementation >= self.assembly_refs.len() {
            return Err(invalid_metadata!(
                "Exported type '{}' forwards to missing assembly ref {}",
                exported.fullname(),
                exported.implementation
            ));
        }

        let key = (exported.namespace.clone(), exported.name.clone());
        if self.forwarders.contains_key(&key) {
            return Err(invalid_metadata!(
                "Type '{}' is forwarded more than once",
                exported.fullname()
            ));
        }

        let row = self.exported_types.set(index, exported)?;
        self.forwarders.insert(key, row.clone());
        Ok(())
    }

    /// Designate the method at `index` of this assembly's own method table as entry point.
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] if no such method row is reserved, and
    /// [`Error::DuplicateDefinition`] if an entry point was already designated.
    pub fn set_entry_point(&mut self, index: u32) -> Result<()> {
        if index >= self.method_defs.len() {
            return Err(Error::IndexOutOfRange {
                table: TableId::MethodDef,
                index,
                count: self.method_defs.len(),
            });
        }

        if let Some(existing) = self.entry_point {
            return Err(Error::DuplicateDefinition(self.method_defs.token(existing)));
        }

        self.entry_point = Some(index);
        Ok(())
    }

    /// Publish the assembly with the default [`ValidationConfig`].
    ///
    /// # Errors
    /// See [`Assembly::publish_with`].
    pub fn publish(self) -> Result<Arc<Assembly>> {
        self.publish_with(ValidationConfig::default())
    }

    /// Validate the populated tables, link nested types and share the assembly.
    ///
    /// This is the visibility barrier between the loader and every other thread: the
    /// returned handle is read-only and the `set_*` methods can no longer be reached.
    ///
    /// # Errors
    /// Returns [`Error::InvalidMetadata`] if a check enabled in `config` fails or the
    /// tables are structurally inconsistent, and [`Error::CircularDependency`] if the
    /// assembly (transitively) references itself.
    pub fn publish_with(mut self, config: ValidationConfig) -> Result<Arc<Assembly>> {
        self.ownership = Orchestrator::validate_assembly(&self, config)?;
        self.config = config;

        for (_, nested) in self.type_defs.iter() {
            if let Some(enclosing) = nested.enclosing {
                let outer = self.type_defs.get(enclosing)?;
                outer.nested_types.push(nested.clone());
            }
        }

        debug!(
            "Published {} with {} assembly refs and {} type refs",
            self.identity.display_name(),
            self.assembly_refs.len(),
            self.type_refs.len()
        );

        Ok(Arc::new(self))
    }

    /// The identity of this assembly
    #[must_use]
    pub fn identity(&self) -> &AssemblyIdentity {
        &self.identity
    }

    /// The configuration this assembly was published with
    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Row counts of all tables
    #[must_use]
    pub fn counts(&self) -> TableCounts {
        TableCounts {
            assembly_refs: self.assembly_refs.len(),
            type_refs: self.type_refs.len(),
            type_defs: self.type_defs.len(),
            method_defs: self.method_defs.len(),
            fields: self.fields.len(),
            exported_types: self.exported_types.len(),
        }
    }

    /// The referenced assembly at `index`
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] or [`Error::Unpopulated`].
    pub fn assembly_ref(&self, index: u32) -> Result<&Arc<Assembly>> {
        self.assembly_refs.get(index)
    }

    /// The type reference at `index`
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] or [`Error::Unpopulated`].
    pub fn type_ref(&self, index: u32) -> Result<&TypeRefRc> {
        self.type_refs.get(index)
    }

    /// The type definition at `index`
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] or [`Error::Unpopulated`].
    pub fn type_def(&self, index: u32) -> Result<&TypeDefRc> {
        self.type_defs.get(index)
    }

    /// The method definition at `index`
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] or [`Error::Unpopulated`].
    pub fn method_def(&self, index: u32) -> Result<&MethodDefRc> {
        self.method_defs.get(index)
    }

    /// The field definition at `index`
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] or [`Error::Unpopulated`].
    pub fn field(&self, index: u32) -> Result<&FieldDefRc> {
        self.fields.get(index)
    }

    /// The type forwarder at `index`
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] or [`Error::Unpopulated`].
    pub fn exported_type(&self, index: u32) -> Result<&ExportedTypeRc> {
        self.exported_types.get(index)
    }

    /// The `AssemblyRef` table
    #[must_use]
    pub fn assembly_refs(&self) -> &MetadataTable<Assembly> {
        &self.assembly_refs
    }

    /// The `TypeRef` table
    #[must_use]
    pub fn type_refs(&self) -> &MetadataTable<TypeRef> {
        &self.type_refs
    }

    /// The `TypeDef` table
    #[must_use]
    pub fn type_defs(&self) -> &MetadataTable<TypeDef> {
        &self.type_defs
    }

    /// The `MethodDef` table
    #[must_use]
    pub fn method_defs(&self) -> &MetadataTable<MethodDef> {
        &self.method_defs
    }

    /// The `Field` table
    #[must_use]
    pub fn fields(&self) -> &MetadataTable<FieldDef> {
        &self.fields
    }

    /// The `ExportedType` table
    #[must_use]
    pub fn exported_types(&self) -> &MetadataTable<ExportedType> {
        &self.exported_types
    }

    /// The entry point, `None` for libraries
    #[must_use]
    pub fn entry_point(&self) -> Option<&MethodDefRc> {
        self.entry_point
            .and_then(|index| self.method_defs.get(index).ok())
    }

    pub(crate) fn entry_point_index(&self) -> Option<u32> {
        self.entry_point
    }

    /// Find a top-level type defined in this assembly by namespace and name.
    ///
    /// Type forwarders are not followed, see [`Assembly::resolve_type_ref`].
    #[must_use]
    pub fn find_type(&self, namespace: &str, name: &str) -> Option<TypeDefRc> {
        self.types_by_name
            .get(&(namespace.to_string(), name.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// All top-level types of `namespace`, ordered by name
    #[must_use]
    pub fn types_in_namespace(&self, namespace: &str) -> Vec<TypeDefRc> {
        self.types_by_name
            .range((namespace.to_string(), String::new())..)
            .take_while(|entry| entry.key().0 == namespace)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// The type owning the method at `index`, `None` before publication or for orphans
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] if no such method row is reserved.
    pub fn method_owner(&self, index: u32) -> Result<Option<TypeDefRc>> {
        self.owner(&self.ownership.methods, TableId::MethodDef, self.method_defs.len(), index)
    }

    /// The type owning the field at `index`, `None` before publication or for orphans
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] if no such field row is reserved.
    pub fn field_owner(&self, index: u32) -> Result<Option<TypeDefRc>> {
        self.owner(&self.ownership.fields, TableId::Field, self.fields.len(), index)
    }

    fn owner(
        &self,
        owners: &[Option<u32>],
        table: TableId,
        count: u32,
        index: u32,
    ) -> Result<Option<TypeDefRc>> {
        if index >= count {
            return Err(Error::IndexOutOfRange {
                table,
                index,
                count,
            });
        }

        Ok(owners
            .get(index as usize)
            .copied()
            .flatten()
            .and_then(|owner| self.type_defs.get(owner).ok())
            .cloned())
    }

    /// Number of underlying lookups type reference resolution has performed
    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Debug for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assembly")
            .field("identity", &self.identity.display_name())
            .field("counts", &self.counts())
            .field("entry_point", &self.entry_point)
            .finish_non_exhaustive()
    }
}
