//! Allocation failure tests for [`RawFunction`].
//!
//! The global allocator of this test binary refuses every request of one
//! chosen size while a refusal is armed on the current thread, which lets the
//! tests drive the fallible constructors into their error paths:
//!
//! - `test_try_new_reports_layout`: the failed layout is returned and the
//!   callable is dropped exactly once
//! - `test_try_clone_leaves_source_intact`: no clone is made and the source
//!   keeps working
//! - `test_inline_never_allocates`: inline construction and cloning succeed
//!   even while every allocation of the payload size is refused

use std::{
    alloc::{GlobalAlloc, Layout, System},
    cell::Cell,
    rc::Rc,
};

use erasedfn_internals::{RawFunction, invoke::Invoke, placement::Placement};

/// Allocator that fails requests of the armed size on the arming thread.
struct Refusing;

thread_local! {
    static REFUSED_SIZE: Cell<Option<usize>> = const { Cell::new(None) };
}

// SAFETY: Every request is either refused with a null pointer, which the
// `GlobalAlloc` contract allows, or forwarded unchanged to `System`.
unsafe impl GlobalAlloc for Refusing {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let refused = REFUSED_SIZE.try_with(Cell::get).ok().flatten();
        if refused == Some(layout.size()) {
            return std::ptr::null_mut();
        }
        // SAFETY: Forwarded with the caller's layout.
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: `ptr` was returned by `System.alloc` with this layout.
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static ALLOCATOR: Refusing = Refusing;

/// Runs `f` while allocations of `size` bytes fail on this thread.
fn refusing<T>(size: usize, f: impl FnOnce() -> T) -> T {
    REFUSED_SIZE.with(|refused| refused.set(Some(size)));
    let output = f();
    REFUSED_SIZE.with(|refused| refused.set(None));
    output
}

/// Heap-sized callable that counts its clones and drops.
struct Counted {
    clones: Rc<Cell<usize>>,
    drops: Rc<Cell<usize>>,
    table: [u8; 256],
}

impl Clone for Counted {
    fn clone(&self) -> Self {
        self.clones.set(self.clones.get() + 1);
        Self {
            clones: self.clones.clone(),
            drops: self.drops.clone(),
            table: self.table,
        }
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

impl Invoke<(usize,), u8> for Counted {
    fn invoke(&mut self, (index,): (usize,)) -> u8 {
        self.table[index]
    }
}

impl Counted {
    fn new() -> Self {
        Self {
            clones: Rc::new(Cell::new(0)),
            drops: Rc::new(Cell::new(0)),
            table: [5; 256],
        }
    }
}

/// Size of the heap payload for `Counted`: the vtable pointer plus the callable.
const PAYLOAD_SIZE: usize = size_of::<&()>() + size_of::<Counted>();

#[test]
fn test_try_new_reports_layout() {
    assert_eq!(Placement::of::<(usize,), u8, Counted>(), Placement::Heap);

    let counted = Counted::new();
    let drops = counted.drops.clone();
    let result = refusing(PAYLOAD_SIZE, || RawFunction::<(usize,), u8>::try_new(counted));

    let layout = match result {
        Ok(_) => panic!("allocation of {PAYLOAD_SIZE} bytes was expected to fail"),
        Err(layout) => layout,
    };
    assert_eq!(layout.size(), PAYLOAD_SIZE);
    assert_eq!(layout.align(), align_of::<Counted>().max(align_of::<&()>()));
    assert_eq!(drops.get(), 1);

    let counted = Counted::new();
    let drops = counted.drops.clone();
    let result = refusing(PAYLOAD_SIZE, || RawFunction::<(usize,), u8>::try_new_heap(counted));
    assert!(result.is_err());
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_try_clone_leaves_source_intact() {
    let counted = Counted::new();
    let clones = counted.clones.clone();
    let drops = counted.drops.clone();
    let mut source = RawFunction::<(usize,), u8>::new(counted);

    let result = refusing(PAYLOAD_SIZE, || source.try_clone());
    assert_eq!(result.err().map(|layout| layout.size()), Some(PAYLOAD_SIZE));
    assert_eq!(clones.get(), 0);
    assert_eq!(drops.get(), 0);

    assert_eq!(source.placement(), Some(Placement::Heap));
    assert_eq!(source.invoke((255,)), Some(5));

    let mut copy = source.clone();
    assert_eq!(copy.invoke((0,)), Some(5));
    drop(copy);
    drop(source);
    assert_eq!(clones.get(), 1);
    assert_eq!(drops.get(), 2);
}

#[test]
fn test_inline_never_allocates() {
    let offset = 3u64;
    let inline_size = size_of::<&()>() + size_of::<u64>();

    let result = refusing(inline_size, || {
        let f = RawFunction::<(u64,), u64>::try_new(move |x: u64| x + offset)?;
        let g = f.try_clone()?;
        Ok::<_, Layout>((f, g))
    });

    let (mut f, mut g) = match result {
        Ok(pair) => pair,
        Err(layout) => panic!("inline callable allocated {layout:?}"),
    };
    assert_eq!(f.placement(), Some(Placement::Inline));
    assert_eq!(f.invoke((1,)), Some(4));
    assert_eq!(g.invoke((2,)), Some(5));
}
