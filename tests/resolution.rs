//! Integration tests for cross-assembly type reference resolution.
//!
//! These tests drive the public population API the way a loader would: reserve the
//! tables, populate every slot once, publish, and then resolve references from one or
//! more threads.

use std::sync::{Arc, Barrier};
use std::thread;

use assemblymeta::prelude::*;

fn identity(name: &str) -> AssemblyIdentity {
    AssemblyIdentity::parse(&format!("{name}, Version=1.0.0.0")).unwrap()
}

/// `Core` defines `Core.Point` with two fields and a constructor
fn core_assembly() -> Result<Arc<Assembly>> {
    let mut core = Assembly::new(identity("Core"), TableCounts::new(0, 0, 1, 1, 2))?;
    core.set_type_def(
        0,
        TypeDef::new("Core", "Point", TypeAttributes::PUBLIC)
            .with_methods(0..1)
            .with_fields(0..2),
    )?;
    core.set_method_def(
        0,
        MethodDef::new(
            ".ctor",
            MethodAccessFlags::PUBLIC.bits()
                | MethodModifiers::SPECIAL_NAME.bits()
                | MethodModifiers::RTSPECIAL_NAME.bits(),
        ),
    )?;
    core.set_field(0, FieldDef::new("X", FieldAttributes::PUBLIC))?;
    core.set_field(1, FieldDef::new("Y", FieldAttributes::PUBLIC))?;
    core.publish()
}

/// `App` references `Core` and names each of `types` in it
fn app_assembly(core: &Arc<Assembly>, types: &[&str]) -> Result<Arc<Assembly>> {
    let mut app = Assembly::new(
        identity("App"),
        TableCounts::new(1, types.len() as u32, 0, 0, 0),
    )?;
    app.set_assembly_ref(0, core.clone())?;
    for (index, name) in types.iter().enumerate() {
        app.set_type_ref(
            index as u32,
            TypeRef::new("Core", *name, ResolutionScope::AssemblyRef(0)),
        )?;
    }
    app.publish()
}

#[test]
fn test_app_resolves_point_from_core() -> Result<()> {
    let core = core_assembly()?;
    let app = app_assembly(&core, &["Point"])?;

    let point = app.resolve_type_ref(0)?;

    assert!(Arc::ptr_eq(&point, core.type_def(0)?));
    assert_eq!(point.fullname(), "Core.Point");
    assert_eq!(point.token, Token::new(0x0200_0001));
    Ok(())
}

#[test]
fn test_app_fails_to_resolve_vector() -> Result<()> {
    let core = core_assembly()?;
    let app = app_assembly(&core, &["Vector"])?;

    match app.resolve_type_ref(0) {
        Err(Error::UnresolvedTypeReference { reference, .. }) => {
            assert_eq!(reference, "Core.Vector");
        }
        other => panic!("Expected UnresolvedTypeReference, got {other:?}"),
    }

    // The slot is not left partially filled, a retry fails the same way
    assert!(app.type_ref(0)?.resolved().is_none());
    assert!(matches!(
        app.resolve_type_ref(0),
        Err(Error::UnresolvedTypeReference { .. })
    ));
    Ok(())
}

#[test]
fn test_resolution_is_idempotent() -> Result<()> {
    let core = core_assembly()?;
    let app = app_assembly(&core, &["Point"])?;

    let first = app.resolve_type_ref(0)?;
    let second = app.resolve_type_ref(0)?;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(app.lookup_count(), 1);
    Ok(())
}

#[test]
fn test_circular_type_references() -> Result<()> {
    let core = core_assembly()?;

    // R1 is nested in what R2 names, R2 is nested in what R1 names
    let mut app = Assembly::new(identity("App"), TableCounts::new(1, 2, 0, 0, 0))?;
    app.set_assembly_ref(0, core)?;
    app.set_type_ref(0, TypeRef::new("", "R1", ResolutionScope::TypeRef(1)))?;
    app.set_type_ref(1, TypeRef::new("", "R2", ResolutionScope::TypeRef(0)))?;
    let app = app.publish()?;

    for index in 0..2 {
        assert!(matches!(
            app.resolve_type_ref(index),
            Err(Error::CircularReference(_))
        ));
    }
    assert!(app
        .resolve_all()
        .iter()
        .all(|(_, err)| matches!(err, Error::CircularReference(_))));
    Ok(())
}

#[test]
fn test_duplicate_population_keeps_original() -> Result<()> {
    let core = core_assembly()?;
    let other = Assembly::new(identity("Other"), TableCounts::default())?.publish()?;

    let mut app = Assembly::new(identity("App"), TableCounts::new(1, 1, 1, 1, 1))?;
    app.set_assembly_ref(0, core.clone())?;
    app.set_type_ref(0, TypeRef::new("Core", "Point", ResolutionScope::AssemblyRef(0)))?;
    app.set_type_def(
        0,
        TypeDef::new("App", "Program", TypeAttributes::PUBLIC)
            .with_methods(0..1)
            .with_fields(0..1),
    )?;
    app.set_method_def(0, MethodDef::new("Main", MethodModifiers::STATIC.bits()))?;
    app.set_field(0, FieldDef::new("count", FieldAttributes::STATIC))?;

    assert!(matches!(
        app.set_assembly_ref(0, other),
        Err(Error::DuplicateDefinition(_))
    ));
    assert!(matches!(
        app.set_type_ref(0, TypeRef::new("Core", "Vector", ResolutionScope::AssemblyRef(0))),
        Err(Error::DuplicateDefinition(_))
    ));
    assert!(matches!(
        app.set_type_def(0, TypeDef::new("App", "Other", TypeAttributes::PUBLIC)),
        Err(Error::DuplicateDefinition(_))
    ));
    assert!(matches!(
        app.set_method_def(0, MethodDef::new("Other", 0)),
        Err(Error::DuplicateDefinition(_))
    ));
    assert!(matches!(
        app.set_field(0, FieldDef::new("other", 0)),
        Err(Error::DuplicateDefinition(_))
    ));

    assert!(Arc::ptr_eq(app.assembly_ref(0)?, &core));
    assert_eq!(app.type_ref(0)?.name, "Point");
    assert_eq!(app.type_def(0)?.name, "Program");
    assert_eq!(app.method_def(0)?.name, "Main");
    assert_eq!(app.field(0)?.name, "count");
    Ok(())
}

#[test]
fn test_out_of_range_access() -> Result<()> {
    let core = core_assembly()?;
    let app = app_assembly(&core, &["Point"])?;

    assert!(matches!(
        app.resolve_type_ref(1),
        Err(Error::IndexOutOfRange { table: TableId::TypeRef, index: 1, count: 1 })
    ));
    assert!(matches!(app.assembly_ref(1), Err(Error::IndexOutOfRange { .. })));
    assert!(matches!(app.type_ref(5), Err(Error::IndexOutOfRange { .. })));
    assert!(matches!(core.type_def(1), Err(Error::IndexOutOfRange { .. })));
    assert!(matches!(core.method_def(1), Err(Error::IndexOutOfRange { .. })));
    assert!(matches!(core.field(2), Err(Error::IndexOutOfRange { .. })));

    let mut loading = Assembly::new(
        identity("Loading"),
        TableCounts::new(1, 1, 1, 1, 1).with_exported_types(1),
    )?;
    assert!(matches!(
        loading.set_assembly_ref(1, core.clone()),
        Err(Error::IndexOutOfRange { table: TableId::AssemblyRef, index: 1, count: 1 })
    ));
    assert!(matches!(
        loading.set_type_ref(1, TypeRef::new("Core", "Point", ResolutionScope::Module)),
        Err(Error::IndexOutOfRange { table: TableId::TypeRef, index: 1, count: 1 })
    ));
    assert!(matches!(
        loading.set_type_def(1, TypeDef::new("Loading", "Program", TypeAttributes::PUBLIC)),
        Err(Error::IndexOutOfRange { table: TableId::TypeDef, index: 1, count: 1 })
    ));
    assert!(matches!(
        loading.set_method_def(1, MethodDef::new("Main", MethodModifiers::STATIC.bits())),
        Err(Error::IndexOutOfRange { table: TableId::MethodDef, index: 1, count: 1 })
    ));
    assert!(matches!(
        loading.set_field(1, FieldDef::new("count", FieldAttributes::STATIC)),
        Err(Error::IndexOutOfRange { table: TableId::Field, index: 1, count: 1 })
    ));
    assert!(matches!(
        loading.set_exported_type(1, ExportedType::new("Core", "Point", 0)),
        Err(Error::IndexOutOfRange { table: TableId::ExportedType, index: 1, count: 1 })
    ));
    assert!(matches!(
        loading.set_entry_point(1),
        Err(Error::IndexOutOfRange { table: TableId::MethodDef, index: 1, count: 1 })
    ));

    // None of the rejected rows was stored
    assert!(loading.type_defs().iter().next().is_none());
    assert!(loading.find_type("Loading", "Program").is_none());
    assert!(loading.entry_point().is_none());
    Ok(())
}

#[test]
fn test_concurrent_first_resolution() -> Result<()> {
    const THREADS: usize = 16;

    let core = core_assembly()?;
    let app = app_assembly(&core, &["Point"])?;
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let app = app.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                app.resolve_type_ref(0)
            })
        })
        .collect();

    let results: Vec<TypeDefRc> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect::<Result<_>>()?;

    for result in &results {
        assert!(Arc::ptr_eq(result, &results[0]));
    }
    assert!(Arc::ptr_eq(&results[0], core.type_def(0)?));
    assert_eq!(app.lookup_count(), 1);
    Ok(())
}

#[test]
fn test_concurrent_resolution_of_distinct_references() -> Result<()> {
    let core = core_assembly()?;
    let names = ["Point", "Vector", "Point", "Vector", "Point", "Vector"];
    let app = app_assembly(&core, &names)?;

    let handles: Vec<_> = (0..names.len() as u32)
        .map(|index| {
            let app = app.clone();
            thread::spawn(move || (index, app.resolve_type_ref(index)))
        })
        .collect();

    for handle in handles {
        let (index, result) = handle.join().unwrap();
        if index % 2 == 0 {
            assert!(Arc::ptr_eq(&result?, core.type_def(0)?));
        } else {
            assert!(matches!(result, Err(Error::UnresolvedTypeReference { .. })));
        }
    }

    assert_eq!(app.resolve_all().len(), 3);
    Ok(())
}

#[test]
fn test_entry_point() -> Result<()> {
    let core = core_assembly()?;
    assert!(core.entry_point().is_none());

    let mut app = Assembly::new(identity("App"), TableCounts::new(0, 0, 1, 2, 0))?;
    app.set_type_def(0, TypeDef::new("App", "Program", TypeAttributes::PUBLIC).with_methods(0..2))?;
    app.set_method_def(0, MethodDef::new("Helper", MethodAccessFlags::PRIVATE.bits()))?;
    app.set_method_def(
        1,
        MethodDef::new("Main", MethodAccessFlags::PUBLIC.bits() | MethodModifiers::STATIC.bits()),
    )?;
    app.set_entry_point(1)?;
    let app = app.publish()?;

    let main = app.entry_point().unwrap();
    assert_eq!(main.name, "Main");
    assert!(Arc::ptr_eq(main, app.method_def(1)?));
    assert_eq!(app.method_owner(1)?.unwrap().name, "Program");
    Ok(())
}
