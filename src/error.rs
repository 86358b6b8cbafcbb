//! Errors reported by [`Function`](crate::Function).
//!
//! There are only two error types, because the wrapper itself can only fail
//! in two ways:
//!
//! - [`EmptyInvocation`]: [`Function::call`](crate::Function::call) was used
//!   on a wrapper that holds no callable.
//! - [`ConstructionFailure`]: the heap allocation for a large callable could
//!   not be made, reported by the fallible constructors such as
//!   [`Function::try_new`](crate::Function::try_new).
//!
//! Failures of the held callable are never wrapped. A callable returning
//! `Result<T, E>` hands its `Result` back unchanged as the successful output
//! of [`Function::call`](crate::Function::call), and a panicking callable
//! unwinds straight through it.

use core::{alloc::Layout, any::type_name, fmt};

/// The call shape a [`Function`](crate::Function) is bound to, as type names.
///
/// # Examples
///
/// ```
/// use erasedfn::error::Signature;
///
/// let signature = Signature::of::<(i32, i32), i32>();
/// assert_eq!(signature.to_string(), "fn(i32, i32) -> i32");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    arguments: &'static str,
    output: &'static str,
}

impl Signature {
    /// Returns the signature for the argument tuple `Args` and return type
    /// `R`.
    #[must_use]
    pub fn of<Args: 'static, R: 'static>() -> Self {
        Self {
            arguments: type_name::<Args>(),
            output: type_name::<R>(),
        }
    }

    /// The type name of the argument tuple.
    #[must_use]
    pub fn arguments(&self) -> &'static str {
        self.arguments
    }

    /// The type name of the return type.
    #[must_use]
    pub fn output(&self) -> &'static str {
        self.output
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arguments = self.arguments;
        // `(A,)` prints as `fn(A)`, `()` as `fn()`
        let arguments = arguments
            .strip_prefix('(')
            .and_then(|inner| inner.strip_suffix(')'))
            .map(|inner| inner.strip_suffix(',').unwrap_or(inner))
            .unwrap_or(arguments);
        write!(f, "fn({arguments})")?;
        if self.output != "()" {
            write!(f, " -> {}", self.output)?;
        }
        Ok(())
    }
}

/// A [`Function`](crate::Function) holding no callable was invoked.
///
/// # Examples
///
/// ```
/// use erasedfn::{Function, error::EmptyInvocation};
///
/// let mut f = Function::<(u8,), u8>::empty();
/// let error: EmptyInvocation = f.call((1,)).unwrap_err();
/// assert_eq!(
///     error.to_string(),
///     "called an empty Function with signature fn(u8) -> u8"
/// );
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[error("called an empty Function with signature {signature}")]
pub struct EmptyInvocation {
    /// The signature of the empty wrapper.
    pub signature: Signature,
}

/// The heap storage for a callable could not be allocated.
///
/// The wrapper that was being created or cloned does not exist, so no
/// partially initialized state is ever observable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[error(
    "failed to allocate {} bytes (alignment {}) for callable `{callable}`",
    .layout.size(),
    .layout.align()
)]
pub struct ConstructionFailure {
    /// The type name of the callable.
    pub callable: &'static str,
    /// The layout of the allocation that failed.
    pub layout: Layout,
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn test_signature_display() {
        assert_eq!(Signature::of::<(), ()>().to_string(), "fn()");
        assert_eq!(Signature::of::<(), i32>().to_string(), "fn() -> i32");
        assert_eq!(Signature::of::<(u8,), bool>().to_string(), "fn(u8) -> bool");
        assert_eq!(
            Signature::of::<(i32, i32), i32>().to_string(),
            "fn(i32, i32) -> i32"
        );
    }

    #[test]
    fn test_signature_parts() {
        let signature = Signature::of::<(u8,), bool>();
        assert_eq!(signature.arguments(), "(u8,)");
        assert_eq!(signature.output(), "bool");
    }

    #[test]
    fn test_construction_failure_display() {
        let error = ConstructionFailure {
            callable: "my::Callable",
            layout: Layout::from_size_align(64, 8).unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "failed to allocate 64 bytes (alignment 8) for callable `my::Callable`"
        );
    }
}
