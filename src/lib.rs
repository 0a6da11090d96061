//! # relobox: a small-buffer owning pointer for trait objects
//!
//! [`SmallBox`] owns zero or one value seen through a capability `T`, usually a
//! trait object. Values that fit in the box's inline buffer are written straight
//! into it; larger ones get their own heap block, exactly like [`Box`].
//!
//! ## Quick Start
//!
//! ```rust
//! use relobox::{impl_relocate, impl_upcast, Relocate, SmallBox};
//! use relobox::space::{S1, S4};
//!
//! trait Sensor: Relocate {
//!     fn read(&self) -> i32;
//! }
//!
//! struct Constant(i32);
//! struct Averaged([i32; 16]);
//!
//! impl Sensor for Constant {
//!     fn read(&self) -> i32 {
//!         self.0
//!     }
//! }
//!
//! impl Sensor for Averaged {
//!     fn read(&self) -> i32 {
//!         self.0.iter().sum::<i32>() / 16
//!     }
//! }
//!
//! impl_relocate!(Constant, Averaged);
//! impl_upcast!(dyn Sensor);
//!
//! // Small values are stored inline
//! let small: SmallBox<dyn Sensor, S1> = SmallBox::new(Constant(42));
//! assert!(small.is_inline());
//!
//! // Large values fall back to the heap
//! let large: SmallBox<dyn Sensor, S1> = SmallBox::new(Averaged([2; 16]));
//! assert!(large.is_heap());
//!
//! // Moving into a box of another capacity relocates inline values only
//! let wider: SmallBox<dyn Sensor, S4> = small.resize();
//! assert!(wider.is_inline());
//! assert_eq!(wider.read() + large.read(), 44);
//! ```
//!
//! ## Capabilities
//!
//! Two traits describe what a payload can do:
//!
//! - [`Upcast<U>`] says that a `U` can be viewed as a `T`. Every type upcasts
//!   to itself, arrays upcast to slices, and [`impl_upcast!`] covers a trait
//!   object. Storing a payload that is not a `T` does not compile.
//! - [`Relocate`] lets a type-erased payload move itself to another address. It
//!   is needed to move an inline payload into a box of another capacity or out
//!   to the heap ([`SmallBox::transfer_from`], [`SmallBox::resize`],
//!   [`SmallBox::release`]). Make it a supertrait of the capability and use
//!   [`impl_relocate!`] on the concrete types.
//!
//! ## Inline capacity
//!
//! The `Space` parameter is the inline buffer. Its size is the capacity and its
//! alignment is the strictest alignment that can be stored inline; a value
//! with a stricter alignment goes to the heap whatever its size. The
//! [`space`] module has word-sized capacities, and [`small_box`] uses the
//! payload type itself as the space.
//!
//! ## Feature Flags
#![doc = document_features::document_features!()]
#![cfg_attr(feature = "nightly", feature(strict_provenance, set_ptr_value))]
#![cfg_attr(not(feature = "std"), no_std)]
#![allow(stable_features)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(missing_docs)]
#![deny(clippy::as_conversions)]

extern crate alloc;

mod relocate;
mod smallbox;
pub mod space;
mod sptr;
mod storage;
mod upcast;

pub use crate::relocate::Relocate;
pub use crate::smallbox::{small_box, SmallBox};
pub use crate::upcast::Upcast;
