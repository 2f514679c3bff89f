//! Strategies for combining metric fields from the contributing fonts

use crate::{MergeError, Result};

/// Return the first value
pub fn first<T: Clone>(values: &[T]) -> Result<T> {
    values.first().cloned().ok_or(MergeError::NoSources)
}

/// Return the maximum value
pub fn max<T: Ord + Clone>(values: &[T]) -> Result<T> {
    values.iter().max().cloned().ok_or(MergeError::NoSources)
}

/// Return the minimum value
pub fn min<T: Ord + Clone>(values: &[T]) -> Result<T> {
    values.iter().min().cloned().ok_or(MergeError::NoSources)
}

/// Assert all values are equal, return the first
pub fn equal<T, E>(values: &[T], on_mismatch: E) -> Result<T>
where
    T: PartialEq + Clone,
    E: FnOnce(&T, &T) -> MergeError,
{
    let (first, rest) = values.split_first().ok_or(MergeError::NoSources)?;
    match rest.iter().find(|v| *v != first) {
        None => Ok(first.clone()),
        Some(odd) => Err(on_mismatch(first, odd)),
    }
}
