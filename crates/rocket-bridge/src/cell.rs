//! Native cells and finalizer bindings
//!
//! A [`NativeCell`] owns one boxed native object plus the single teardown
//! function allowed to destroy it. The box is taken out of the cell exactly
//! once; that `Option` is the liveness marker every destructive path
//! (explicit unload, pool release, collector finalize) goes through.
//!
//! A cell also counts the collector-owned handles boxing it. The collector
//! tears the object down only when the last of them is finalized.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::error::{BridgeError, BridgeResult};

/// Typed destructor bound to a native cell.
pub struct Finalizer<T: 'static>(Rc<dyn Fn(Box<T>)>);

impl<T: 'static> Finalizer<T> {
    /// Wrap a teardown function
    pub fn new(teardown: impl Fn(Box<T>) + 'static) -> Self {
        Finalizer(Rc::new(teardown))
    }

    /// Teardown that simply drops the native value
    pub fn dropping() -> Self {
        Finalizer::new(drop)
    }

    fn run(&self, value: Box<T>) {
        (self.0)(value)
    }
}

impl<T: 'static> Clone for Finalizer<T> {
    fn clone(&self) -> Self {
        Finalizer(Rc::clone(&self.0))
    }
}

impl<T: 'static> Default for Finalizer<T> {
    fn default() -> Self {
        Finalizer::dropping()
    }
}

impl<T: 'static> fmt::Debug for Finalizer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Finalizer")
    }
}

/// Storage for one native object.
pub struct NativeCell<T: 'static> {
    slot: RefCell<Option<Box<T>>>,
    finalizer: Finalizer<T>,
    collectors: Cell<usize>,
}

impl<T: 'static> NativeCell<T> {
    fn is_live(&self) -> bool {
        self.slot.borrow().is_some()
    }

    fn address(&self) -> Option<NonNull<T>> {
        self.slot.borrow().as_deref().map(|value| NonNull::from(value))
    }

    fn add_collector(&self) {
        self.collectors.set(self.collectors.get() + 1);
    }

    fn drop_collector(&self) -> bool {
        let remaining = self.collectors.get().saturating_sub(1);
        self.collectors.set(remaining);
        remaining == 0
    }

    /// Take the object out and run the finalizer. Returns `false` when the
    /// object was already gone.
    fn destroy(&self) -> bool {
        let taken = match self.slot.try_borrow_mut() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                tracing::warn!("native object is borrowed; teardown skipped");
                return false;
            }
        };
        match taken {
            Some(value) => {
                self.finalizer.run(value);
                true
            }
            None => false,
        }
    }
}

/// Type-erased view of a cell, as stored in handles.
pub(crate) trait ErasedCell {
    fn is_live(&self) -> bool;
    fn destroy(&self) -> bool;
    fn address(&self) -> Option<NonNull<()>>;
    /// Register one more collector-owned handle.
    fn add_collector(&self);
    /// Unregister a collector-owned handle; `true` if it was the last one.
    fn drop_collector(&self) -> bool;
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: 'static> ErasedCell for NativeCell<T> {
    fn is_live(&self) -> bool {
        NativeCell::is_live(self)
    }

    fn destroy(&self) -> bool {
        NativeCell::destroy(self)
    }

    fn address(&self) -> Option<NonNull<()>> {
        NativeCell::address(self).map(NonNull::cast)
    }

    fn add_collector(&self) {
        NativeCell::add_collector(self)
    }

    fn drop_collector(&self) -> bool {
        NativeCell::drop_collector(self)
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Shared reference to a native cell.
///
/// Cloning shares the same object; no clone ever duplicates or destroys it.
pub struct NativeRef<T: 'static> {
    cell: Rc<NativeCell<T>>,
}

impl<T: 'static> NativeRef<T> {
    /// Wrap `value` with a teardown that drops it.
    pub fn new(value: T) -> Self {
        Self::with_finalizer(value, Finalizer::dropping())
    }

    /// Wrap `value` with a custom teardown.
    pub fn with_finalizer(value: T, finalizer: Finalizer<T>) -> Self {
        NativeRef {
            cell: Rc::new(NativeCell {
                slot: RefCell::new(Some(Box::new(value))),
                finalizer,
                collectors: Cell::new(0),
            }),
        }
    }

    /// Check whether the object is still alive
    pub fn is_live(&self) -> bool {
        self.cell.is_live()
    }

    /// Heap address of the object while it is alive
    pub fn address(&self) -> Option<NonNull<T>> {
        self.cell.address()
    }

    /// Borrow the object.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> BridgeResult<R> {
        let slot = self.cell.slot.borrow();
        slot.as_deref().map(f).ok_or(BridgeError::Released)
    }

    /// Mutably borrow the object.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> BridgeResult<R> {
        let mut slot = self.cell.slot.borrow_mut();
        slot.as_deref_mut().map(f).ok_or(BridgeError::Released)
    }

    /// Run the teardown if the object is still alive.
    ///
    /// Returns `true` only for the call that actually destroyed it.
    pub fn destroy(&self) -> bool {
        self.cell.destroy()
    }

    /// Check whether two references share one cell
    pub fn ptr_eq(&self, other: &NativeRef<T>) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    pub(crate) fn erase(&self) -> Rc<dyn ErasedCell> {
        self.cell.clone()
    }

    pub(crate) fn from_erased(cell: Rc<dyn ErasedCell>) -> Option<Self> {
        cell.into_any()
            .downcast::<NativeCell<T>>()
            .ok()
            .map(|cell| NativeRef { cell })
    }
}

impl<T: 'static> Clone for NativeRef<T> {
    fn clone(&self) -> Self {
        NativeRef {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: 'static> fmt::Debug for NativeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address() {
            Some(addr) => write!(f, "NativeRef({:p})", addr),
            None => f.write_str("NativeRef(released)"),
        }
    }
}
