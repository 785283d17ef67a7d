//! Fallible counterparts to [`FromIterator`].

/// Equivalent of [`FromIterator`], but allows the conversion of each item to fail.
pub trait TryFromIterator<A>: Sized {
    type Error;

    fn try_from_iter<T: IntoIterator<Item = A>>(iter: T) -> Result<Self, Self::Error>;
}
