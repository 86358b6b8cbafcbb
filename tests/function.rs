//! Tests for the public contract of [`Function`].
//!
//! ## Callable shapes
//! - `test_callable_shapes_match_direct_calls`
//! - `test_user_function_object`
//!
//! ## Value semantics
//! - `test_four_copy_move_swap`: the zero-argument function returning 4
//! - `test_captured_sequence_survives_copy`
//! - `test_copy_does_not_alias`
//! - `test_swap_twice_restores`: every storage combination
//! - `test_boundary_round_trip`
//!
//! ## Errors
//! - `test_empty_invocation`
//! - `test_callable_errors_pass_through`
//! - `test_callable_panic_propagates`
//! - `test_try_new_and_try_clone`
//!
//! ## Logging
//! - `test_tracing_events`

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex},
};

use erasedfn::{
    MAX_INLINE_CALLABLE_SIZE,
    error::{EmptyInvocation, Signature},
    prelude::*,
};

fn four() -> i32 {
    4
}

fn five() -> i32 {
    5
}

fn six() -> i32 {
    6
}

fn add(a: i32, b: i32) -> i32 {
    a + b
}

#[derive(Clone)]
struct Adder {
    bias: i32,
}

impl Invoke<(i32, i32), i32> for Adder {
    fn invoke(&mut self, (a, b): (i32, i32)) -> i32 {
        add(a, b) + self.bias
    }
}

#[test]
fn test_callable_shapes_match_direct_calls() {
    let mut function: Function<(i32, i32), i32> = Function::new(add);
    let mut pointer: Function<(i32, i32), i32> = Function::new(add as fn(i32, i32) -> i32);
    let mut closure: Function<(i32, i32), i32> = Function::new(|a: i32, b: i32| a * b);
    let factor = 3;
    let mut capturing: Function<(i32, i32), i32> =
        Function::new(move |a: i32, b: i32| (a + b) * factor);
    let mut partial: Function<(i32, i32), i32> = Function::new(move |a: i32, _: i32| add(a, 10));

    for (a, b) in [(0, 0), (2, 2), (-7, 3)] {
        assert_eq!(function.call((a, b)), Ok(add(a, b)));
        assert_eq!(pointer.call((a, b)), Ok(add(a, b)));
        assert_eq!(closure.call((a, b)), Ok(a * b));
        assert_eq!(capturing.call((a, b)), Ok((a + b) * factor));
        assert_eq!(partial.call((a, b)), Ok(add(a, 10)));
    }
}

#[test]
fn test_user_function_object() {
    let mut f: Function<(i32, i32), i32> = Function::new(Adder { bias: 1 });
    assert_eq!(f.call((2, 2)), Ok(5));
    assert_eq!(f.target::<Adder>().map(|adder| adder.bias), Some(1));

    if let Some(adder) = f.target_mut::<Adder>() {
        adder.bias = 100;
    }
    assert_eq!(f.call((2, 2)), Ok(104));
}

#[test]
fn test_four_copy_move_swap() {
    let mut f: Function<(), i32> = Function::new(four);
    assert_eq!(f.call(()), Ok(4));

    let mut copy = f.clone();
    assert_eq!(copy.call(()), Ok(4));

    let mut moved = std::mem::take(&mut f);
    assert!(!f.is_bound());
    assert!(f.call(()).is_err());
    assert_eq!(moved.call(()), Ok(4));

    let mut a: Function<(), i32> = Function::new(five);
    let mut b: Function<(), i32> = Function::new(six);
    a.swap(&mut b);
    assert_eq!(a.call(()), Ok(6));
    assert_eq!(b.call(()), Ok(5));

    std::mem::swap(&mut a, &mut b);
    assert_eq!(a.call(()), Ok(5));
    assert_eq!(b.call(()), Ok(6));
}

#[test]
fn test_captured_sequence_survives_copy() {
    let sequence = vec![1, 2, 3];
    let mut first: Function<(), i32> = Function::new(move || sequence[1]);
    assert_eq!(first.call(()), Ok(2));

    let mut second = first.clone();
    assert_eq!(first.call(()), Ok(2));
    assert_eq!(second.call(()), Ok(2));

    drop(first);
    assert_eq!(second.call(()), Ok(2));
}

#[test]
fn test_copy_does_not_alias() {
    let mut calls = 0;
    let mut counter: Function<(), i32> = Function::new(move || {
        calls += 1;
        calls
    });
    assert_eq!(counter.call(()), Ok(1));

    let mut copy = counter.clone();
    assert_eq!(copy.call(()), Ok(2));
    assert_eq!(copy.call(()), Ok(3));
    assert_eq!(counter.call(()), Ok(2));
}

#[test]
fn test_swap_twice_restores() {
    fn make(kind: usize) -> Function<(), u8> {
        let large = [9u8; 64];
        match kind {
            0 => Function::empty(),
            1 => Function::new(|| 1),
            _ => Function::new(move || large[0]),
        }
    }

    for left_kind in 0..3 {
        for right_kind in 0..3 {
            let mut left = make(left_kind);
            let mut right = make(right_kind);
            let left_placement = left.placement();
            let right_placement = right.placement();
            let left_output = left.call(()).ok();
            let right_output = right.call(()).ok();

            left.swap(&mut right);
            assert_eq!(left.placement(), right_placement);
            assert_eq!(right.placement(), left_placement);
            assert_eq!(left.call(()).ok(), right_output);
            assert_eq!(right.call(()).ok(), left_output);

            left.swap(&mut right);
            assert_eq!(left.placement(), left_placement);
            assert_eq!(right.placement(), right_placement);
            assert_eq!(left.call(()).ok(), left_output);
            assert_eq!(right.call(()).ok(), right_output);
        }
    }
}

#[test]
fn test_boundary_round_trip() {
    fn round_trip<const N: usize>(expected: Placement) {
        let bytes = [7u8; N];
        let mut f: Function<(), usize> =
            Function::new(move || bytes.iter().map(|&b| usize::from(b)).sum::<usize>());
        let sum = 7 * N;
        assert_eq!(f.placement(), Some(expected), "{N} bytes");

        let mut copy = f.clone();
        assert_eq!(copy.placement(), Some(expected));
        assert_eq!(copy.call(()), Ok(sum));

        let mut moved = f.take();
        assert!(f.is_empty());
        assert_eq!(moved.placement(), Some(expected));
        assert_eq!(moved.call(()), Ok(sum));

        let mut other: Function<(), usize> = Function::new(|| 0);
        moved.swap(&mut other);
        assert_eq!(moved.call(()), Ok(0));
        assert_eq!(other.call(()), Ok(sum));
        assert_eq!(other.placement(), Some(expected));
    }

    round_trip::<MAX_INLINE_CALLABLE_SIZE>(Placement::Inline);
    round_trip::<{ MAX_INLINE_CALLABLE_SIZE + 1 }>(Placement::Heap);
}

#[test]
fn test_empty_invocation() {
    let mut default = Function::<(i32, i32), i32>::default();
    let mut null = Function::<(i32, i32), i32>::from(None::<fn(i32, i32) -> i32>);

    for f in [&mut default, &mut null] {
        let error = f.call((1, 2)).unwrap_err();
        assert_eq!(
            error,
            EmptyInvocation {
                signature: Signature::of::<(i32, i32), i32>()
            }
        );
        assert_eq!(
            error.to_string(),
            "called an empty Function with signature fn(i32, i32) -> i32"
        );
    }

    let mut cleared: Function<(i32, i32), i32> = Function::new(add);
    cleared.clear();
    assert!(cleared.is_empty());
    assert!(cleared.call((1, 2)).is_err());
}

#[test]
fn test_callable_errors_pass_through() {
    #[derive(Debug, PartialEq)]
    struct Rejected(i32);

    let mut checked: Function<(i32,), Result<i32, Rejected>> =
        Function::new(|x: i32| if x < 0 { Err(Rejected(x)) } else { Ok(x) });

    assert_eq!(checked.call((3,)), Ok(Ok(3)));
    assert_eq!(checked.call((-3,)), Ok(Err(Rejected(-3))));
}

#[test]
fn test_callable_panic_propagates() {
    let mut f: Function<(i32,), i32> = Function::new(|x: i32| {
        if x == 0 {
            panic!("division by zero");
        }
        100 / x
    });

    let payload = catch_unwind(AssertUnwindSafe(|| f.call((0,)))).unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"division by zero"));
    assert!(f.is_bound());
    assert_eq!(f.call((4,)), Ok(25));
}

#[test]
fn test_try_new_and_try_clone() {
    let table = [3u32; 32];
    let f: Function<(usize,), u32> = Function::try_new(move |i: usize| table[i]).unwrap();
    assert_eq!(f.placement(), Some(Placement::Heap));

    let mut copy = f.try_clone().unwrap();
    assert_eq!(copy.call((31,)), Ok(3));

    let boxed: Function<(usize,), u32> = Function::new_boxed(|i: usize| i as u32);
    assert_eq!(boxed.placement(), Some(Placement::Heap));
    assert_eq!(boxed.try_clone().unwrap().placement(), Some(Placement::Heap));
}

#[test]
fn test_functions_cross_threads() {
    let shared = Arc::new(Mutex::new(Vec::new()));
    let sink = shared.clone();
    let f: Function<(i32,), ()> = Function::new(move |x: i32| sink.lock().unwrap().push(x));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let mut f = f.clone();
            std::thread::spawn(move || f.call((i,)))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(()));
    }

    let mut seen = shared.lock().unwrap().clone();
    seen.sort_unstable();
    assert_eq!(seen, [0, 1, 2, 3]);
}

#[cfg(feature = "tracing")]
#[test]
fn test_tracing_events() {
    use std::io;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut f: Function<(), i32> = Function::new(four);
        assert_eq!(f.call(()), Ok(4));
        f.clear();
        assert!(f.call(()).is_err());
    });

    let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("bound callable"), "{output}");
    assert!(output.contains("placement=Some(Inline)"), "{output}");
    assert!(output.contains("called an empty Function"), "{output}");
    assert!(output.contains("signature=fn() -> i32"), "{output}");
}
