use core::convert::Infallible;
use core::fmt;
use core::hint;
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop, MaybeUninit};
use core::ops;
use core::ptr::{self, NonNull};

use alloc::alloc::Layout;
use alloc::boxed::Box;

use crate::relocate::Relocate;
use crate::sptr;
use crate::storage::{self, HeapBlock};
use crate::upcast::Upcast;

/// Where the payload of a box lives.
enum Payload<T: ?Sized> {
    Empty,
    /// Only the metadata is meaningful, the address is rebuilt from `space`
    /// because the box may have moved since the payload was written.
    Inline(NonNull<T>),
    Heap(NonNull<T>),
}

impl<T: ?Sized> Clone for Payload<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Payload<T> {}

/// An owning pointer that stores small payloads inline and larger ones on the
/// heap.
///
/// `T` is the capability the payload is seen through, usually a trait object.
/// `Space` is the inline buffer: a payload whose size and alignment fit in
/// `Space` is written straight into the box, anything else gets its own heap
/// block. See [`space`](crate::space) for ready-made capacities.
///
/// A box owns zero or one payload. It cannot be cloned, compared or hashed: the
/// address of an inline payload changes every time the box moves.
///
/// # Example
///
/// ```
/// use relobox::{impl_relocate, impl_upcast, Relocate, SmallBox};
/// use relobox::space::S1;
///
/// trait Shape: Relocate {
///     fn sides(&self) -> u32;
/// }
///
/// struct Triangle;
/// struct Polygon([u32; 8]);
///
/// impl Shape for Triangle {
///     fn sides(&self) -> u32 {
///         3
///     }
/// }
///
/// impl Shape for Polygon {
///     fn sides(&self) -> u32 {
///         self.0.len() as u32
///     }
/// }
///
/// impl_relocate!(Triangle, Polygon);
/// impl_upcast!(dyn Shape);
///
/// let mut shape: SmallBox<dyn Shape, S1> = SmallBox::new(Triangle);
/// assert!(shape.is_inline());
/// assert_eq!(shape.sides(), 3);
///
/// shape.emplace(Polygon([0; 8]));
/// assert!(shape.is_heap());
/// assert_eq!(shape.sides(), 8);
/// ```
pub struct SmallBox<T: ?Sized, Space> {
    space: MaybeUninit<Space>,
    payload: Payload<T>,
    _phantom: PhantomData<T>,
}

impl<T: ?Sized, Space> SmallBox<T, Space> {
    /// Creates a box that holds nothing.
    pub const fn empty() -> SmallBox<T, Space> {
        SmallBox::with_payload(Payload::Empty)
    }

    const fn with_payload(payload: Payload<T>) -> SmallBox<T, Space> {
        SmallBox {
            space: MaybeUninit::uninit(),
            payload,
            _phantom: PhantomData,
        }
    }

    /// Takes over a payload that is already on the heap.
    ///
    /// The payload stays where it is, whatever its size.
    ///
    /// # Example
    ///
    /// ```
    /// use relobox::SmallBox;
    /// use relobox::space::S4;
    ///
    /// let payload: Box<[u8]> = Box::new([1u8, 2]);
    /// let boxed: SmallBox<[u8], S4> = SmallBox::from_box(payload);
    /// assert!(boxed.is_heap());
    /// ```
    pub fn from_box(boxed: Box<T>) -> SmallBox<T, Space> {
        SmallBox::with_payload(Payload::Heap(NonNull::from(Box::leak(boxed))))
    }

    /// Takes over a raw payload pointer.
    ///
    /// # Safety
    ///
    /// `raw` must come from [`Box::into_raw`] and must not be used afterwards.
    pub unsafe fn from_raw(raw: *mut T) -> SmallBox<T, Space> {
        SmallBox::from_box(unsafe { Box::from_raw(raw) })
    }

    /// Boxes `val` inline if it fits in `Space`, on the heap otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// use relobox::SmallBox;
    /// use relobox::space::S4;
    ///
    /// let small: SmallBox<[usize], S4> = SmallBox::new([0usize; 2]);
    /// let large: SmallBox<[usize], S4> = SmallBox::new([1usize; 8]);
    ///
    /// assert!(small.is_inline());
    /// assert!(large.is_heap());
    /// assert_eq!(large[7], 1);
    /// ```
    pub fn new<U>(val: U) -> SmallBox<T, Space>
    where
        T: Upcast<U>,
    {
        SmallBox::new_with(|| val)
    }

    /// Builds the payload in place.
    ///
    /// The storage for `U` is picked first, then `f` produces the value that is
    /// written into it. If `f` panics, memory reserved for the payload is given
    /// back before the panic continues.
    pub fn new_with<U>(f: impl FnOnce() -> U) -> SmallBox<T, Space>
    where
        T: Upcast<U>,
    {
        let mut boxed: SmallBox<T, Space> = SmallBox::empty();
        boxed.build(f);
        boxed
    }

    /// Builds the payload in place from a fallible constructor.
    ///
    /// On `Err` nothing is leaked and the error is handed back unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use relobox::SmallBox;
    /// use relobox::space::S1;
    ///
    /// let parsed: Result<SmallBox<u64, S1>, _> = SmallBox::try_new_with(|| "42".parse::<u64>());
    /// assert_eq!(*parsed.unwrap(), 42);
    ///
    /// let failed: Result<SmallBox<[u64; 4], S1>, _> = SmallBox::try_new_with(|| {
    ///     let n = "x".parse::<u64>()?;
    ///     Ok::<_, std::num::ParseIntError>([n; 4])
    /// });
    /// assert!(failed.is_err());
    /// ```
    pub fn try_new_with<U, E>(f: impl FnOnce() -> Result<U, E>) -> Result<SmallBox<T, Space>, E>
    where
        T: Upcast<U>,
    {
        let mut boxed: SmallBox<T, Space> = SmallBox::empty();
        boxed.try_build(f)?;
        Ok(boxed)
    }

    /// Drops the current payload and stores `val` in its place.
    pub fn emplace<U>(&mut self, val: U)
    where
        T: Upcast<U>,
    {
        self.emplace_with(|| val)
    }

    /// Drops the current payload and builds a new one in place.
    ///
    /// If `f` panics the box is left empty.
    pub fn emplace_with<U>(&mut self, f: impl FnOnce() -> U)
    where
        T: Upcast<U>,
    {
        self.reset();
        self.build(f)
    }

    /// Drops the current payload and builds a new one from a fallible
    /// constructor. On `Err` the box is left empty.
    pub fn try_emplace_with<U, E>(&mut self, f: impl FnOnce() -> Result<U, E>) -> Result<(), E>
    where
        T: Upcast<U>,
    {
        self.reset();
        self.try_build(f)
    }

    fn build<U>(&mut self, f: impl FnOnce() -> U)
    where
        T: Upcast<U>,
    {
        match self.try_build(|| Ok::<U, Infallible>(f())) {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    // Expects an empty box.
    fn try_build<U, E>(&mut self, f: impl FnOnce() -> Result<U, E>) -> Result<(), E>
    where
        T: Upcast<U>,
    {
        debug_assert!(self.is_empty());

        if storage::fits::<U, Space>() {
            let val = f()?;
            let slot = self.space.as_mut_ptr().cast::<U>();
            unsafe { slot.write(val) };
            self.payload = Payload::Inline(upcast_non_null(slot));
        } else {
            let block = HeapBlock::new(Layout::new::<U>());
            let val = f()?;
            let slot = block.as_ptr().cast::<U>().as_ptr();
            unsafe { slot.write(val) };
            block.commit();
            self.payload = Payload::Heap(upcast_non_null(slot));
        }

        Ok(())
    }

    /// Drops the payload, leaving the box empty.
    pub fn reset(&mut self) {
        // Mark the box empty first so a panicking destructor cannot leave a
        // dangling payload behind.
        match mem::replace(&mut self.payload, Payload::Empty) {
            Payload::Empty => {}
            Payload::Inline(meta) => unsafe { ptr::drop_in_place(self.inline_ptr_mut(meta)) },
            Payload::Heap(ptr) => drop(unsafe { Box::from_raw(ptr.as_ptr()) }),
        }
    }

    /// Drops the payload and takes over `boxed` instead.
    pub fn reset_to_box(&mut self, boxed: Box<T>) {
        self.reset();
        self.payload = Payload::Heap(NonNull::from(Box::leak(boxed)));
    }

    /// Moves the whole box out, leaving an empty one behind.
    pub fn take(&mut self) -> SmallBox<T, Space> {
        mem::replace(self, SmallBox::empty())
    }

    /// Gives up the payload as a [`Box`], leaving this box empty.
    ///
    /// A heap payload is handed over as is. An inline payload is first moved to
    /// a new heap block, since the inline buffer dies with the box.
    ///
    /// # Example
    ///
    /// ```
    /// use relobox::SmallBox;
    /// use relobox::space::S2;
    ///
    /// let mut small: SmallBox<[u32], S2> = SmallBox::new([7u32, 8]);
    /// assert!(small.is_inline());
    ///
    /// let released = small.release().unwrap();
    /// assert!(small.is_empty());
    /// drop(small);
    /// assert_eq!(*released, [7, 8]);
    /// ```
    pub fn release(&mut self) -> Option<Box<T>>
    where
        T: Relocate,
    {
        let ptr = match mem::replace(&mut self.payload, Payload::Empty) {
            Payload::Empty => return None,
            Payload::Heap(ptr) => ptr,
            Payload::Inline(meta) => unsafe { relocate_to_heap(self.inline_ptr_mut(meta)) },
        };

        Some(unsafe { Box::from_raw(ptr.as_ptr()) })
    }

    /// Consuming form of [`release`](SmallBox::release).
    pub fn into_box(mut self) -> Option<Box<T>>
    where
        T: Relocate,
    {
        self.release()
    }

    /// Drops the current payload and moves the payload of `src` into this box,
    /// leaving `src` empty.
    ///
    /// `src` may have any capacity:
    ///
    /// * a heap payload is taken over without allocating or moving it;
    /// * an inline payload stays inline if the whole inline buffer of `src`
    ///   fits in this one, and is moved to the heap otherwise.
    ///
    /// A heap block created here is sized to the payload itself, not to `M`.
    ///
    /// # Example
    ///
    /// ```
    /// use relobox::SmallBox;
    /// use relobox::space::{S1, S4};
    ///
    /// let mut src: SmallBox<[u8], S1> = SmallBox::new([3u8, 4]);
    /// let mut dst: SmallBox<[u8], S4> = SmallBox::empty();
    ///
    /// dst.transfer_from(&mut src);
    /// assert!(src.is_empty());
    /// assert!(dst.is_inline());
    /// assert_eq!(*dst, [3, 4]);
    /// ```
    pub fn transfer_from<M>(&mut self, src: &mut SmallBox<T, M>)
    where
        T: Relocate,
    {
        self.reset();

        self.payload = match mem::replace(&mut src.payload, Payload::Empty) {
            Payload::Empty => Payload::Empty,
            Payload::Heap(ptr) => Payload::Heap(ptr),
            Payload::Inline(meta) => {
                let from = src.inline_ptr_mut(meta);
                if storage::fits::<M, Space>() {
                    unsafe { (*from).relocate_to(NonNull::from(&mut self.space).cast()) };
                    Payload::Inline(meta)
                } else {
                    Payload::Heap(unsafe { relocate_to_heap(from) })
                }
            }
        };
    }

    /// Moves the payload into a box with another capacity.
    ///
    /// Follows the rules of [`transfer_from`](SmallBox::transfer_from): once a
    /// payload is on the heap it is never moved again.
    ///
    /// ```
    /// use relobox::SmallBox;
    /// use relobox::space::{S2, S4};
    ///
    /// let s: SmallBox<[usize], S4> = SmallBox::new([0usize; 2]);
    /// let m: SmallBox<[usize], S2> = s.resize();
    /// assert!(m.is_heap());
    /// ```
    ///
    /// Only payloads that can [`Relocate`] can be moved between boxes:
    ///
    /// ```compile_fail
    /// use relobox::{impl_upcast, SmallBox};
    /// use relobox::space::{S1, S2};
    ///
    /// trait Pinned {}
    /// impl Pinned for u8 {}
    /// impl_upcast!(dyn Pinned);
    ///
    /// let b: SmallBox<dyn Pinned, S1> = SmallBox::new(1u8);
    /// let c: SmallBox<dyn Pinned, S2> = b.resize();
    /// ```
    pub fn resize<ToSpace>(mut self) -> SmallBox<T, ToSpace>
    where
        T: Relocate,
    {
        let mut resized: SmallBox<T, ToSpace> = SmallBox::empty();
        resized.transfer_from(&mut self);
        resized
    }

    /// Returns the payload, if any.
    pub fn get(&self) -> Option<&T> {
        match self.payload {
            Payload::Empty => None,
            Payload::Inline(meta) => Some(unsafe { &*self.inline_ptr(meta) }),
            Payload::Heap(ptr) => Some(unsafe { ptr.as_ref() }),
        }
    }

    /// Returns the payload mutably, if any.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self.payload {
            Payload::Empty => None,
            Payload::Inline(meta) => Some(unsafe { &mut *self.inline_ptr_mut(meta) }),
            Payload::Heap(mut ptr) => Some(unsafe { ptr.as_mut() }),
        }
    }

    /// Returns the payload without checking that there is one.
    ///
    /// # Safety
    ///
    /// The box must not be empty.
    pub unsafe fn get_unchecked(&self) -> &T {
        match self.get() {
            Some(val) => val,
            None => unsafe { hint::unreachable_unchecked() },
        }
    }

    /// Returns the payload mutably without checking that there is one.
    ///
    /// # Safety
    ///
    /// The box must not be empty.
    pub unsafe fn get_unchecked_mut(&mut self) -> &mut T {
        match self.get_mut() {
            Some(val) => val,
            None => unsafe { hint::unreachable_unchecked() },
        }
    }

    /// Returns true if the box holds nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self.payload, Payload::Empty)
    }

    /// Returns true if the box holds a payload.
    pub fn is_some(&self) -> bool {
        !self.is_empty()
    }

    /// Returns true if the payload lives in the inline buffer.
    ///
    /// An empty box is neither inline nor on the heap.
    pub fn is_inline(&self) -> bool {
        matches!(self.payload, Payload::Inline(_))
    }

    /// Returns true if the payload lives in its own heap block.
    pub fn is_heap(&self) -> bool {
        matches!(self.payload, Payload::Heap(_))
    }

    fn inline_ptr(&self, meta: NonNull<T>) -> *const T {
        sptr::rebase(self.space.as_ptr().cast::<u8>(), meta.as_ptr())
    }

    fn inline_ptr_mut(&mut self, meta: NonNull<T>) -> *mut T {
        sptr::rebase_mut(self.space.as_mut_ptr().cast::<u8>(), meta.as_ptr())
    }
}

impl<U, Space> SmallBox<U, Space> {
    /// Views the payload through a wider capability, e.g. from a concrete type
    /// to a trait object. The payload is not moved.
    ///
    /// ```
    /// use relobox::{impl_upcast, small_box, SmallBox};
    ///
    /// trait Named {
    ///     fn name(&self) -> &'static str;
    /// }
    ///
    /// struct Duck;
    ///
    /// impl Named for Duck {
    ///     fn name(&self) -> &'static str {
    ///         "duck"
    ///     }
    /// }
    ///
    /// impl_upcast!(dyn Named);
    ///
    /// let concrete = small_box::<Duck, _>(Duck);
    /// let named: SmallBox<dyn Named, Duck> = concrete.upcast();
    /// assert!(named.is_inline());
    /// assert_eq!(named.name(), "duck");
    /// ```
    pub fn upcast<T>(self) -> SmallBox<T, Space>
    where
        T: ?Sized + Upcast<U>,
    {
        let this = ManuallyDrop::new(self);
        let payload = match this.payload {
            Payload::Empty => Payload::Empty,
            Payload::Inline(ptr) => Payload::Inline(upcast_non_null(ptr.as_ptr())),
            Payload::Heap(ptr) => Payload::Heap(upcast_non_null(ptr.as_ptr())),
        };

        SmallBox {
            space: unsafe { ptr::read(&this.space) },
            payload,
            _phantom: PhantomData,
        }
    }
}

/// Boxes `val` with an inline buffer of exactly its own size, so it is always
/// stored inline.
///
/// ```
/// use relobox::small_box;
///
/// let boxed = small_box::<[u16], _>([1u16, 2, 3]);
/// assert!(boxed.is_inline());
/// assert_eq!(boxed.len(), 3);
/// ```
pub fn small_box<T, U>(val: U) -> SmallBox<T, U>
where
    T: ?Sized + Upcast<U>,
{
    SmallBox::new(val)
}

fn upcast_non_null<T, U>(thin: *mut U) -> NonNull<T>
where
    T: ?Sized + Upcast<U>,
{
    // `Upcast` keeps the address, which is never null here.
    unsafe { NonNull::new_unchecked(T::upcast(thin)) }
}

/// Moves the value behind `from` into a new heap block.
///
/// The value left at `from` is moved-out and must not be dropped.
unsafe fn relocate_to_heap<T: ?Sized + Relocate>(from: *mut T) -> NonNull<T> {
    let block = HeapBlock::new(Layout::for_value(unsafe { &*from }));
    unsafe { (*from).relocate_to(block.as_ptr()) };
    let to = block.commit();
    unsafe { NonNull::new_unchecked(sptr::rebase_mut(to.as_ptr(), from)) }
}

#[cold]
#[track_caller]
fn deref_empty() -> ! {
    panic!("dereferenced an empty SmallBox")
}

impl<T: ?Sized, Space> ops::Deref for SmallBox<T, Space> {
    type Target = T;

    /// # Panics
    ///
    /// Panics if the box is empty.
    fn deref(&self) -> &T {
        match self.get() {
            Some(val) => val,
            None => deref_empty(),
        }
    }
}

impl<T: ?Sized, Space> ops::DerefMut for SmallBox<T, Space> {
    fn deref_mut(&mut self) -> &mut T {
        match self.get_mut() {
            Some(val) => val,
            None => deref_empty(),
        }
    }
}

impl<T: ?Sized, Space> ops::Drop for SmallBox<T, Space> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: ?Sized, Space> Default for SmallBox<T, Space> {
    fn default() -> Self {
        SmallBox::empty()
    }
}

impl<T: ?Sized, Space> From<Box<T>> for SmallBox<T, Space> {
    fn from(boxed: Box<T>) -> Self {
        SmallBox::from_box(boxed)
    }
}

impl<T: ?Sized + fmt::Debug, Space> fmt::Debug for SmallBox<T, Space> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.get() {
            Some(val) => fmt::Debug::fmt(val, f),
            None => f.write_str("<empty>"),
        }
    }
}

unsafe impl<T: ?Sized + Send, Space> Send for SmallBox<T, Space> {}
unsafe impl<T: ?Sized + Sync, Space> Sync for SmallBox<T, Space> {}
