//! Internal utility types.

/// Marker type used when type-erasing callables.
///
/// This zero-sized type serves as a placeholder in generic type parameters
/// when the actual concrete callable type has been erased. For example,
/// `FunctionData<Args, R, Erased>` represents a payload whose callable type
/// is unknown at the current scope.
///
/// Using a distinct marker type (rather than `()`) makes the intent clearer
/// in type signatures and error messages.
pub(crate) struct Erased;
