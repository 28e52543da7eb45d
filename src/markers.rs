//! Marker types passed to handlers.

pub use vari_internals::handlers::Empty;

/// A compile-time index, produced by index dispatch.
///
/// The [`MakeIdx`](crate::dispatch::MakeIdx) factory hands out values of this
/// type from [`dispatch`](crate::dispatch::dispatch), which lets a route select
/// behavior per index in the type system.
///
/// # Examples
///
/// ```
/// use vari::markers::Idx;
///
/// fn index_of<const J: usize>(_: Idx<J>) -> usize {
///     Idx::<J>::VALUE
/// }
///
/// assert_eq!(index_of(Idx::<3>), 3);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Idx<const J: usize>;

impl<const J: usize> Idx<J> {
    /// The index as a runtime value.
    pub const VALUE: usize = J;
}
