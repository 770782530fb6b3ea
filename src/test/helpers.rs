//! Factory functions for test assemblies and their rows.

use std::sync::Arc;

use crate::metadata::{
    assembly::{Assembly, TableCounts},
    identity::{AssemblyIdentity, AssemblyVersion},
    tables::{
        FieldAttributes, FieldDef, MethodAccessFlags, MethodDef, MethodModifiers, TypeAttributes,
        TypeDef,
    },
};

/// Create a test assembly identity with basic version information.
pub fn create_test_identity(name: &str, major: u16, minor: u16) -> AssemblyIdentity {
    AssemblyIdentity::new(name, AssemblyVersion::new(major, minor, 0, 0), None, None)
}

/// Create an unpublished assembly without any rows.
pub fn empty_assembly(name: &str, major: u16, minor: u16) -> Assembly {
    Assembly::new(create_test_identity(name, major, minor), TableCounts::default()).unwrap()
}

/// Builder for `MethodDef` rows, public instance methods by default.
pub struct MethodBuilder {
    name: String,
    access: MethodAccessFlags,
    modifiers: MethodModifiers,
}

impl MethodBuilder {
    pub fn new(name: &str) -> Self {
        let modifiers = if name == ".ctor" {
            MethodModifiers::SPECIAL_NAME | MethodModifiers::RTSPECIAL_NAME
        } else {
            MethodModifiers::HIDE_BY_SIG
        };

        MethodBuilder {
            name: name.to_string(),
            access: MethodAccessFlags::PUBLIC,
            modifiers,
        }
    }

    pub fn with_static(mut self) -> Self {
        self.modifiers |= MethodModifiers::STATIC;
        self
    }

    pub fn build(self) -> MethodDef {
        MethodDef::new(self.name, self.access.bits() | self.modifiers.bits())
    }
}

/// `Core` 1.0: `Core.Point` (2 fields, 2 methods) and `Core.List` with the nested
/// `Enumerator` (1 method each).
pub fn create_core_assembly() -> Arc<Assembly> {
    let mut core = Assembly::new(
        create_test_identity("Core", 1, 0),
        TableCounts::new(0, 0, 3, 4, 2),
    )
    .unwrap();

    core.set_type_def(
        0,
        TypeDef::new("Core", "Point", TypeAttributes::PUBLIC | TypeAttributes::SEALED)
            .with_methods(0..2)
            .with_fields(0..2),
    )
    .unwrap();
    core.set_type_def(
        1,
        TypeDef::new("Core", "List", TypeAttributes::PUBLIC).with_methods(2..3),
    )
    .unwrap();
    core.set_type_def(
        2,
        TypeDef::new("", "Enumerator", TypeAttributes::NESTED_PUBLIC)
            .with_methods(3..4)
            .nested_in(1),
    )
    .unwrap();

    core.set_method_def(0, MethodBuilder::new(".ctor").build()).unwrap();
    core.set_method_def(1, MethodBuilder::new("ToString").build()).unwrap();
    core.set_method_def(2, MethodBuilder::new("Add").build()).unwrap();
    core.set_method_def(3, MethodBuilder::new("MoveNext").build()).unwrap();

    core.set_field(0, FieldDef::new("X", FieldAttributes::PUBLIC)).unwrap();
    core.set_field(1, FieldDef::new("Y", FieldAttributes::PUBLIC)).unwrap();

    core.publish().unwrap()
}
