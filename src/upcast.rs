/// Statically checked "`U` is a `Self`" relation.
///
/// `SmallBox<T, _>` accepts a payload of type `U` only when `T: Upcast<U>`,
/// which turns a pointer to the concrete `U` into a pointer to `T` (adding a
/// vtable or a length). A payload type that does not implement the capability
/// is rejected at compile time:
///
/// ```compile_fail
/// use relobox::{impl_upcast, SmallBox};
/// use relobox::space::S2;
///
/// trait Shape {}
/// impl_upcast!(dyn Shape);
///
/// struct NotAShape;
/// let b: SmallBox<dyn Shape, S2> = SmallBox::new(NotAShape);
/// ```
///
/// Every sized type upcasts to itself, arrays upcast to slices, and trait
/// objects get their impl from [`impl_upcast!`].
///
/// # Safety
///
/// `upcast` must return a pointer with the same address and provenance as
/// `thin`, carrying metadata that describes the `U` behind it.
pub unsafe trait Upcast<U> {
    /// Attaches the metadata of `Self` to a pointer to `U`.
    fn upcast(thin: *mut U) -> *mut Self;
}

/// Implements [`Upcast`] for a trait object type, for every `'static` type
/// implementing the trait.
///
/// The trait must be local to the invoking crate. Foreign traits such as
/// closures can be wrapped in a local trait with a blanket impl:
///
/// ```
/// use relobox::impl_upcast;
/// use relobox::space::S1;
/// use relobox::SmallBox;
///
/// trait Shape {
///     fn area(&self) -> f32;
/// }
///
/// impl_upcast!(dyn Shape);
/// impl_upcast!(dyn Shape + Send);
///
/// trait Predicate: Fn(u8) -> bool {}
/// impl<F: Fn(u8) -> bool> Predicate for F {}
/// impl_upcast!(dyn Predicate);
///
/// let is_even: SmallBox<dyn Predicate, S1> = SmallBox::new(|n: u8| n % 2 == 0);
/// assert!(is_even(4));
/// ```
#[macro_export]
macro_rules! impl_upcast {
    (dyn $($bounds:tt)+) => {
        unsafe impl<__U> $crate::Upcast<__U> for dyn $($bounds)+
        where
            __U: $($bounds)+,
            __U: 'static,
        {
            fn upcast(thin: *mut __U) -> *mut Self {
                thin
            }
        }
    };
}

unsafe impl<T> Upcast<T> for T {
    fn upcast(thin: *mut T) -> *mut T {
        thin
    }
}

unsafe impl<E, const N: usize> Upcast<[E; N]> for [E] {
    fn upcast(thin: *mut [E; N]) -> *mut [E] {
        thin
    }
}
