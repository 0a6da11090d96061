use core::ptr::{self, NonNull};

/// A payload that can move itself to another address behind a type-erased
/// pointer.
///
/// A [`SmallBox`](crate::SmallBox) only knows its payload as `T`, typically a
/// trait object. Moving an inline payload into a box of a different capacity,
/// or out to the heap on [`release`](crate::SmallBox::release), goes through
/// this trait so the concrete type does the move.
///
/// Trait hierarchies opt in by making `Relocate` a supertrait; the trait object
/// then implements it too. Leaf types implement it with [`impl_relocate!`].
/// Types that are never moved between boxes do not need it, and a box whose `T`
/// lacks it simply does not offer the moving operations.
///
/// ```
/// use relobox::{impl_relocate, impl_upcast, Relocate, SmallBox};
/// use relobox::space::{S1, S4};
///
/// trait Counter: Relocate {
///     fn count(&self) -> u32;
/// }
///
/// struct Fixed(u32);
///
/// impl Counter for Fixed {
///     fn count(&self) -> u32 {
///         self.0
///     }
/// }
///
/// impl_relocate!(Fixed);
/// impl_upcast!(dyn Counter);
///
/// let wide: SmallBox<dyn Counter, S4> = SmallBox::new(Fixed(3));
/// let narrow: SmallBox<dyn Counter, S1> = wide.resize();
/// assert_eq!(narrow.count(), 3);
/// ```
///
/// # Safety
///
/// `relocate_to` must write a valid value of the concrete type of `self` to
/// `dst`, so that a pointer with the address `dst` and the metadata of `self`
/// points to a valid `Self`. The value left behind in `self` is considered
/// moved-out and is never dropped.
pub unsafe trait Relocate {
    /// Moves this value to `dst`.
    ///
    /// # Safety
    ///
    /// `dst` must be valid for writes of `size_of_val(self)` bytes and aligned
    /// to `align_of_val(self)`. After the call the value behind `self` must not
    /// be used or dropped.
    unsafe fn relocate_to(&mut self, dst: NonNull<u8>);
}

/// Implements [`Relocate`] for one or more sized types.
///
/// ```
/// use relobox::impl_relocate;
///
/// struct Circle(f32);
/// struct Square(f32);
/// struct Labelled<T>(T, &'static str);
///
/// impl_relocate!(Circle, Square, Labelled<Circle>);
/// ```
///
/// Generic types can be covered by writing the impl by hand; the body is the
/// same one the macro emits.
#[macro_export]
macro_rules! impl_relocate {
    ($($ty:ty),+ $(,)?) => {
        $(
            unsafe impl $crate::Relocate for $ty {
                unsafe fn relocate_to(&mut self, dst: ::core::ptr::NonNull<u8>) {
                    unsafe {
                        dst.cast::<Self>()
                            .as_ptr()
                            .write(::core::ptr::read(self))
                    }
                }
            }
        )+
    };
}

unsafe impl<E> Relocate for [E] {
    unsafe fn relocate_to(&mut self, dst: NonNull<u8>) {
        unsafe { ptr::copy_nonoverlapping(self.as_ptr(), dst.cast::<E>().as_ptr(), self.len()) }
    }
}

unsafe impl Relocate for str {
    unsafe fn relocate_to(&mut self, dst: NonNull<u8>) {
        unsafe { ptr::copy_nonoverlapping(self.as_ptr(), dst.as_ptr(), self.len()) }
    }
}
