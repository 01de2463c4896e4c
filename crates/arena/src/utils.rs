//! Address arithmetic helpers

/// Aligns an address up to the nearest multiple of `alignment`
///
/// Returns `None` when rounding would overflow `usize`.
///
/// # Examples
/// ```
/// use nebula_arena::utils::checked_align_up;
///
/// assert_eq!(checked_align_up(9, 8), Some(16));
/// assert_eq!(checked_align_up(16, 8), Some(16));
/// assert_eq!(checked_align_up(usize::MAX, 8), None);
/// ```
#[inline(always)]
pub const fn checked_align_up(value: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    match value.checked_add(alignment - 1) {
        Some(bumped) => Some(bumped & !(alignment - 1)),
        None => None,
    }
}
