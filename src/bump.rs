use std::alloc::{self, Layout};
use std::any::TypeId;
use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::ptr::NonNull;

use log::trace;
use thiserror::Error;

/// An error from a [`BumpAllocator`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum BumpError {
    /// Storage for a page or a payload could not be allocated.
    #[error("allocation failed")]
    OutOfMemory,
    /// More than [`MAX_TYPES`] distinct payload types were requested
    /// from a single allocator.
    #[error("more than {MAX_TYPES} distinct payload types")]
    TooManyTypes,
}

/// The most distinct payload types a single allocator supports; slot
/// descriptors store the destructor index in one byte.
pub const MAX_TYPES: usize = 256;

const PAGE_BYTES: usize = 4096;
const PAGE_SLOTS: usize = PAGE_BYTES / std::mem::size_of::<Slot>();

type DropFn = unsafe fn(*mut u8);

/// Describes one live allocation: where its payload lives, how to free
/// the payload's storage, and which destructor tears it down.
#[derive(Debug)]
struct Slot {
    ptr: NonNull<u8>,
    layout: Layout,
    dtor: u8,
}

/// A fixed-capacity run of slot descriptors. Descriptors are uniform,
/// so only the most recently opened page can have room left.
#[derive(Debug)]
struct Page {
    slots: Vec<Slot>,
}

impl Page {
    fn open() -> Result<Page, BumpError> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(PAGE_SLOTS)
            .map_err(|_| BumpError::OutOfMemory)?;
        Ok(Page { slots })
    }

    fn is_full(&self) -> bool {
        self.slots.len() == PAGE_SLOTS
    }
}

#[derive(Debug, Default)]
struct Inner {
    pages: Vec<Page>,
    dtors: Vec<(TypeId, DropFn)>,
}

impl Inner {
    /// Returns the destructor index for `T`, registering it on first
    /// use.
    fn dtor_index<T: 'static>(&mut self) -> Result<u8, BumpError> {
        let type_id = TypeId::of::<T>();
        if let Some(i) = self.dtors.iter().position(|(id, _)| *id == type_id) {
            return Ok(i as u8);
        }
        if self.dtors.len() == MAX_TYPES {
            return Err(BumpError::TooManyTypes);
        }
        self.dtors.push((type_id, drop_thunk::<T>));
        Ok((self.dtors.len() - 1) as u8)
    }

    fn writable_page(&mut self) -> Result<&mut Page, BumpError> {
        if self.pages.last().map_or(true, Page::is_full) {
            trace!("Opening page {}", self.pages.len());
            self.pages.push(Page::open()?);
        }
        Ok(self.pages.last_mut().unwrap())
    }
}

unsafe fn drop_thunk<T>(ptr: *mut u8) {
    std::ptr::drop_in_place(ptr as *mut T)
}

/// An allocator that hands out payloads at stable addresses and tears
/// every payload down exactly once when it is dropped.
///
/// Each payload is separately heap-allocated, so its address never
/// changes for the allocator's lifetime; the allocator keeps pages of
/// slot descriptors recording the payload pointer, its layout, and an
/// index into a per-allocator table of typed destructors. Allocation
/// takes `&self`, so references returned earlier stay usable while more
/// payloads are allocated.
///
/// # Example
/// ```
/// use eqsat::BumpAllocator;
///
/// let bump = BumpAllocator::new();
/// let five = bump.allocate(5_i32).unwrap();
/// let greeting = bump.allocate(String::from("hello")).unwrap();
/// assert_eq!(*five, 5);
/// assert_eq!(greeting, "hello");
/// ```
#[derive(Default)]
pub struct BumpAllocator {
    inner: RefCell<Inner>,
}

impl BumpAllocator {
    /// Creates a new, empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates `value`, returning a reference that stays valid for
    /// the allocator's lifetime.
    ///
    /// Fails with [`BumpError::TooManyTypes`] once [`MAX_TYPES`]
    /// distinct payload types have been requested from this allocator,
    /// and with [`BumpError::OutOfMemory`] if the underlying storage
    /// cannot be allocated.
    pub fn allocate<T: 'static>(&self, value: T) -> Result<&T, BumpError> {
        let mut inner = self.inner.borrow_mut();
        let dtor = inner.dtor_index::<T>()?;

        let layout = Layout::new::<T>();
        let ptr = if layout.size() == 0 {
            NonNull::<T>::dangling().cast::<u8>()
        } else {
            // Raw allocation so that exhaustion is reported, not aborted on.
            let raw = unsafe { alloc::alloc(layout) };
            NonNull::new(raw).ok_or(BumpError::OutOfMemory)?
        };
        unsafe { ptr.cast::<T>().as_ptr().write(value) };

        let page = match inner.writable_page() {
            Ok(page) => page,
            Err(e) => {
                // The payload is not yet tracked by any slot; reclaim it.
                unsafe {
                    std::ptr::drop_in_place(ptr.cast::<T>().as_ptr());
                    if layout.size() != 0 {
                        alloc::dealloc(ptr.as_ptr(), layout);
                    }
                }
                return Err(e);
            }
        };
        page.slots.push(Slot { ptr, layout, dtor });

        // Safety: the payload is heap-allocated and only freed when the
        // allocator drops, and `&self` keeps the allocator alive.
        Ok(unsafe { &*ptr.cast::<T>().as_ptr() })
    }

    /// Returns the number of live allocations.
    pub fn len(&self) -> usize {
        self.inner
            .borrow()
            .pages
            .iter()
            .map(|page| page.slots.len())
            .sum()
    }

    /// Returns `true` if nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for BumpAllocator {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        for page in &inner.pages {
            for slot in &page.slots {
                unsafe {
                    (inner.dtors[slot.dtor as usize].1)(slot.ptr.as_ptr());
                    if slot.layout.size() != 0 {
                        alloc::dealloc(slot.ptr.as_ptr(), slot.layout);
                    }
                }
            }
        }
    }
}

impl Debug for BumpAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("BumpAllocator")
            .field("allocations", &self.len())
            .field("pages", &inner.pages.len())
            .field("types", &inner.dtors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn allocate_a_couple_of_things() {
        let bump = BumpAllocator::new();

        let x = bump.allocate(5).unwrap();
        assert_eq!(*x, 5);

        let s = bump.allocate(String::from("hello")).unwrap();
        assert_eq!(s, "hello");

        // earlier references stay usable across later allocations
        let y = bump.allocate(7_i64).unwrap();
        assert_eq!(*x, 5);
        assert_eq!(*y, 7);
        assert_eq!(bump.len(), 3);
    }

    struct Observed(Rc<Cell<usize>>);

    impl Drop for Observed {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn dtor_fires_exactly_once() {
        let drops = Rc::new(Cell::new(0));

        {
            let bump = BumpAllocator::new();
            let observed = bump.allocate(Observed(drops.clone())).unwrap();
            assert!(Rc::ptr_eq(&observed.0, &drops));
            assert_eq!(drops.get(), 0);
        }

        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn dtors_run_for_every_slot() {
        let drops = Rc::new(Cell::new(0));
        let n = 100;

        {
            let bump = BumpAllocator::new();
            for _ in 0..n {
                bump.allocate(Observed(drops.clone())).unwrap();
            }
        }

        assert_eq!(drops.get(), n);
    }

    #[test]
    fn pages_roll_over() {
        let bump = BumpAllocator::new();
        let count = PAGE_SLOTS * 2 + 3;

        let values: Vec<&usize> = (0..count).map(|i| bump.allocate(i).unwrap()).collect();
        for (i, v) in values.iter().enumerate() {
            assert_eq!(**v, i);
        }

        assert_eq!(bump.len(), count);
        assert_eq!(bump.inner.borrow().pages.len(), 3);
    }

    #[test]
    fn zero_sized_payloads() {
        let bump = BumpAllocator::new();
        bump.allocate(()).unwrap();
        bump.allocate(()).unwrap();
        assert_eq!(bump.len(), 2);
    }

    #[test]
    fn too_many_types() {
        struct Marker;
        unsafe fn noop(_: *mut u8) {}

        let bump = BumpAllocator::new();
        bump.allocate(0_u8).unwrap();

        // fill the registry up to the limit with placeholder entries
        {
            let mut inner = bump.inner.borrow_mut();
            while inner.dtors.len() < MAX_TYPES {
                inner.dtors.push((TypeId::of::<Marker>(), noop));
            }
        }

        // already-registered types still allocate
        assert!(bump.allocate(1_u8).is_ok());
        // a fresh type cannot register a destructor anymore
        assert_eq!(bump.allocate(1_u16).unwrap_err(), BumpError::TooManyTypes);
    }
}
