//! Integration tests for handle lifetimes and dispatch
//!
//! Tests cover:
//! - Checked retrieval and tag safety
//! - Pool release and bulk teardown
//! - Collector finalization, including re-pushed handles
//! - Strict record marshaling

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mlua::{Function, Lua, Value};
use rocket_bridge::{
    box_named, box_native, intern_tag, number_field, register, unwrap, unwrap_checked,
    BridgeError, ClassBuilder, Finalizer, MethodTable, NativeRef, Ownership, ResourcePool,
};

struct Widget {
    width: f64,
}

fn counting_widget(count: &Rc<Cell<u32>>) -> NativeRef<Widget> {
    let count = count.clone();
    NativeRef::with_finalizer(
        Widget { width: 1.0 },
        Finalizer::new(move |_| count.set(count.get() + 1)),
    )
}

fn collect(lua: &Lua) {
    lua.gc_collect().unwrap();
    lua.gc_collect().unwrap();
}

// ────────────────────────────────────────────────────────────────────────────
// Tags and dispatch
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_registered_widget_round_trips() {
    let lua = Lua::new();
    let methods = MethodTable::new()
        .add(&lua, "draw", |_, _: Value| Ok("drawn"))
        .unwrap()
        .add(&lua, "resize", |_, (this, width): (Value, f64)| {
            unwrap::<Widget>(&this)?.with_mut(|w| w.width = width)?;
            Ok(())
        })
        .unwrap();
    let tag = register(&lua, "Widget", &methods).unwrap();

    let native = NativeRef::new(Widget { width: 1.0 });
    let handle = box_native(&lua, &tag, Some(&native), Ownership::Borrowed).unwrap();
    let back = unwrap_checked::<Widget>(&handle, &tag).unwrap();
    assert!(back.ptr_eq(&native));
    assert_eq!(back.address(), native.address());

    lua.globals().set("w", handle).unwrap();
    let drawn: String = lua.load("w:resize(4); return w:draw()").eval().unwrap();
    assert_eq!(drawn, "drawn");
    assert_eq!(native.with(|w| w.width), Ok(4.0));
}

#[test]
fn test_tag_mismatch_is_rejected_without_side_effects() {
    let lua = Lua::new();
    let sound = intern_tag(&lua, "Sound");
    let image = intern_tag(&lua, "Image");
    let native = NativeRef::new(Widget { width: 2.0 });
    let handle = box_native(&lua, &sound, Some(&native), Ownership::Borrowed).unwrap();

    let err = unwrap_checked::<Widget>(&handle, &image).unwrap_err();
    assert_eq!(
        err,
        BridgeError::InvalidHandle {
            expected: "Image".to_string(),
            found: "Sound".to_string(),
        }
    );
    assert!(unwrap_checked::<Widget>(&handle, &sound).is_ok());
}

#[test]
fn test_methods_survive_reregistration() {
    let lua = Lua::new();
    let draw = MethodTable::new().add(&lua, "draw", |_, _: Value| Ok(1)).unwrap();
    let resize = MethodTable::new().add(&lua, "resize", |_, _: Value| Ok(2)).unwrap();
    let tag = register(&lua, "Widget", &draw).unwrap();
    register(&lua, "Widget", &resize).unwrap();
    register(&lua, "Widget", &draw).unwrap();

    let native = NativeRef::new(Widget { width: 0.0 });
    let handle = box_native(&lua, &tag, Some(&native), Ownership::Borrowed).unwrap();
    lua.globals().set("w", handle).unwrap();
    let (a, b): (i64, i64) = lua.load("return w:draw(), w:resize()").eval().unwrap();
    assert_eq!((a, b), (1, 2));
}

#[test]
fn test_unknown_method_raises() {
    let lua = Lua::new();
    let native = NativeRef::new(Widget { width: 0.0 });
    let handle = box_named(&lua, "Widget", Some(&native), Ownership::Borrowed).unwrap();
    lua.globals().set("w", handle).unwrap();
    assert!(lua.load("w:explode()").exec().is_err());
}

// ────────────────────────────────────────────────────────────────────────────
// Pools
// ────────────────────────────────────────────────────────────────────────────

fn logging_pool(log: &Rc<RefCell<Vec<String>>>) -> ResourcePool<String> {
    let log = log.clone();
    ResourcePool::new(
        "media",
        Finalizer::new(move |value: Box<String>| log.borrow_mut().push(*value)),
    )
}

#[test]
fn test_pool_release_twice_tears_down_once() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut pool = logging_pool(&log);
    let a = pool.track("A".to_string());

    assert!(pool.release(&a));
    assert!(!pool.contains(&a));
    assert!(!pool.release(&a));
    assert_eq!(*log.borrow(), vec!["A".to_string()]);
}

#[test]
fn test_release_all_empties_pool() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut pool = logging_pool(&log);
    let a = pool.track("A".to_string());
    let b = pool.track("B".to_string());

    assert_eq!(pool.release_all(), 2);
    assert!(pool.is_empty());
    assert!(!a.is_live());
    assert!(!b.is_live());
    assert!(!pool.release(&a));
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn test_adopted_cell_is_released_with_pool() {
    let lua = Lua::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut pool = logging_pool(&log);
    let native = NativeRef::new("outside".to_string());
    let handle = box_named(&lua, "Note", Some(&native), Ownership::Pool).unwrap();

    assert!(pool.adopt(unwrap::<String>(&handle).unwrap()));
    assert!(!pool.adopt(native.clone()));
    assert_eq!(pool.release_all(), 1);
    assert!(!native.is_live());
    assert!(log.borrow().is_empty());
}

#[test]
fn test_pool_owned_handle_reports_released() {
    let lua = Lua::new();
    let pool = Rc::new(RefCell::new(ResourcePool::new("media", Finalizer::dropping())));
    let native = pool.borrow_mut().track(Widget { width: 3.0 });
    let handle = box_named(&lua, "Widget", Some(&native), Ownership::Pool).unwrap();

    pool.borrow_mut().release_all();
    let err = unwrap::<Widget>(&handle).unwrap().with(|w| w.width).unwrap_err();
    assert_eq!(err, BridgeError::Released);

    drop(handle);
    collect(&lua);
    assert!(pool.borrow().is_empty());
}

// ────────────────────────────────────────────────────────────────────────────
// Collector finalization
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_collector_finalizes_exactly_once() {
    let lua = Lua::new();
    let count = Rc::new(Cell::new(0));
    let native = counting_widget(&count);

    let handle = box_named(&lua, "Widget", Some(&native), Ownership::Collector).unwrap();
    drop(handle);
    collect(&lua);
    assert_eq!(count.get(), 1);

    collect(&lua);
    assert_eq!(count.get(), 1);
}

#[test]
fn test_repushed_handle_finalizes_once() {
    let lua = Lua::new();
    let count = Rc::new(Cell::new(0));
    let native = counting_widget(&count);

    let methods = MethodTable::new()
        .add(&lua, "width", |_, this: Value| Ok(unwrap::<Widget>(&this)?.with(|w| w.width)?))
        .unwrap();
    register(&lua, "Widget", &methods).unwrap();

    let first = box_named(&lua, "Widget", Some(&native), Ownership::Collector).unwrap();
    let again = unwrap::<Widget>(&first).unwrap();
    let second = box_named(&lua, "Widget", Some(&again), Ownership::Collector).unwrap();
    drop(again);
    lua.globals().set("a", first).unwrap();
    lua.globals().set("b", second).unwrap();

    lua.load("a = nil").exec().unwrap();
    collect(&lua);
    assert_eq!(count.get(), 0);
    let width: f64 = lua.load("return b:width()").eval().unwrap();
    assert_eq!(width, 1.0);

    lua.load("b = nil").exec().unwrap();
    collect(&lua);
    assert_eq!(count.get(), 1);
}

#[test]
fn test_explicit_free_before_collection() {
    let lua = Lua::new();
    let count = Rc::new(Cell::new(0));
    let native = counting_widget(&count);
    let handle = box_named(&lua, "Widget", Some(&native), Ownership::Collector).unwrap();

    assert!(native.destroy());
    drop(handle);
    collect(&lua);
    assert_eq!(count.get(), 1);
}

#[test]
fn test_class_constructor_objects_are_collected() {
    let lua = Lua::new();
    let count = Rc::new(Cell::new(0));
    let made = count.clone();
    let ctor_tag = intern_tag(&lua, "Widget");
    let constructor: Function = lua
        .create_function(move |lua, ()| {
            let native = counting_widget(&made);
            box_native(lua, &ctor_tag, Some(&native), Ownership::Collector)
        })
        .unwrap();
    ClassBuilder::new("Widget")
        .constructor(constructor)
        .register(&lua)
        .unwrap();

    lua.load("for i = 1, 5 do local w = Widget.new() end").exec().unwrap();
    collect(&lua);
    assert_eq!(count.get(), 5);
}

// ────────────────────────────────────────────────────────────────────────────
// Marshaling
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_height_is_named() {
    let lua = Lua::new();
    let arg: Value = lua.load("return { x = 1, y = 2, width = 3 }").eval().unwrap();
    assert_eq!(number_field(&arg, "width"), Ok(3.0));

    let err = number_field(&arg, "height").unwrap_err();
    assert!(err.to_string().contains("\"height\"") || err.to_string().contains("'height'"));
}
