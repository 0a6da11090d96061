//! Ready-made inline capacities.
//!
//! Any sized type can serve as the `Space` of a [`SmallBox`](crate::SmallBox):
//! its size is the inline capacity and its alignment is the strictest payload
//! alignment that can be stored inline. The aliases below are `usize` arrays,
//! so `S4` holds 4 machine words aligned to a machine word.
//!
//! A payload type itself is also a valid space, which is what
//! [`small_box`](crate::small_box) uses to get an exactly sized buffer.

/// One machine word.
pub type S1 = [usize; 1];
/// Two machine words.
pub type S2 = [usize; 2];
/// Four machine words.
pub type S4 = [usize; 4];
/// Eight machine words.
pub type S8 = [usize; 8];
/// Sixteen machine words.
pub type S16 = [usize; 16];
/// Thirty-two machine words.
pub type S32 = [usize; 32];
/// Sixty-four machine words.
pub type S64 = [usize; 64];
