use relobox::space::*;
use relobox::{impl_relocate, impl_upcast, small_box, Relocate, SmallBox};

mod no_move {
    use super::*;

    pub trait Base {
        fn f(&self) -> i32;
    }

    pub struct SmallDerived(pub i32);

    pub struct BigDerived(pub [i32; 4]);

    impl Base for SmallDerived {
        fn f(&self) -> i32 {
            self.0
        }
    }

    impl Base for BigDerived {
        fn f(&self) -> i32 {
            -1
        }
    }

    impl_upcast!(dyn Base);
}

mod movable {
    use super::*;

    pub trait Base: Relocate {
        fn f(&self) -> i32;
    }

    pub struct SmallDerived(pub i32);

    pub struct BigDerived(pub [i32; 4]);

    impl Base for SmallDerived {
        fn f(&self) -> i32 {
            self.0
        }
    }

    impl Base for BigDerived {
        fn f(&self) -> i32 {
            -1
        }
    }

    impl_relocate!(SmallDerived, BigDerived);
    impl_upcast!(dyn Base);
}

// Half the size of `SmallDerived`.
type Half = [u16; 1];

#[test]
fn construction_and_access() {
    use no_move::*;

    let mut p: SmallBox<dyn Base, SmallDerived> = SmallBox::empty();
    assert!(p.get().is_none());
    assert!(p.is_empty());

    p.emplace(SmallDerived(42));
    assert!(p.is_some());
    assert!(p.is_inline());
    assert!(!p.is_heap());
    assert_eq!(p.f(), 42);

    p.emplace(BigDerived([0; 4]));
    assert!(p.is_some());
    assert!(!p.is_inline());
    assert!(p.is_heap());
    assert_eq!(p.f(), -1);

    let inplace: SmallBox<dyn Base, SmallDerived> = SmallBox::new_with(|| SmallDerived(4));
    assert!(inplace.is_inline());
    assert_eq!(inplace.f(), 4);

    let allocated: SmallBox<dyn Base, SmallDerived> = SmallBox::new_with(|| BigDerived([1; 4]));
    assert!(allocated.is_heap());
    assert_eq!(allocated.f(), -1);
}

#[test]
fn same_capacity_moves_stay_inline() {
    use no_move::*;

    // Plain Rust moves never need `Relocate`.
    let a: SmallBox<dyn Base, SmallDerived> = SmallBox::new(SmallDerived(1));
    let b = a;
    let boxes = vec![b];
    assert!(boxes[0].is_inline());
    assert_eq!(boxes[0].f(), 1);
}

#[test]
fn moves_and_releases() {
    use movable::*;

    let mut small: SmallBox<dyn Base, SmallDerived> = SmallBox::new(SmallDerived(1));
    assert_eq!(small.f(), 1);

    // Same capacity: stays inline
    let mut inplace: SmallBox<dyn Base, SmallDerived> = SmallBox::empty();
    inplace.transfer_from(&mut small);
    assert!(inplace.is_some());
    assert!(small.is_empty());
    assert!(inplace.is_inline());
    assert_eq!(inplace.f(), 1);

    // Buffer too small: must allocate
    let mut allocated: SmallBox<dyn Base, Half> = SmallBox::empty();
    allocated.transfer_from(&mut inplace);
    assert!(inplace.is_empty());
    assert!(allocated.is_heap());
    assert_eq!(allocated.f(), 1);
    allocated.reset();

    // Move assign inline to inline
    inplace.emplace(SmallDerived(5));
    let mut inplace2: SmallBox<dyn Base, SmallDerived> = SmallBox::empty();
    inplace2.transfer_from(&mut inplace);
    assert!(inplace.is_empty());
    assert!(inplace2.is_inline());
    assert_eq!(inplace2.f(), 5);
    inplace2.reset();

    // Move assign inline into a smaller box
    inplace.emplace(SmallDerived(6));
    assert!(allocated.is_empty());
    allocated.transfer_from(&mut inplace);
    assert!(inplace.is_empty());
    assert!(allocated.is_heap());
    assert_eq!(allocated.f(), 6);

    // Move assign heap to a bigger box: pointer is stolen
    inplace2.transfer_from(&mut allocated);
    assert!(allocated.is_empty());
    assert!(inplace2.is_heap());
    assert_eq!(inplace2.f(), 6);

    // Release from heap
    let raw = inplace2.release().unwrap();
    assert!(inplace2.is_empty());
    assert_eq!(raw.f(), 6);
    drop(raw);

    // Release from inline
    inplace.emplace(SmallDerived(7));
    let raw = inplace.release().unwrap();
    assert!(inplace.is_empty());
    assert_eq!(raw.f(), 7);
}

#[test]
fn allocated_box_moves_into_smaller_box() {
    use movable::*;

    let mut p: SmallBox<dyn Base, SmallDerived> = SmallBox::new(SmallDerived(42));
    assert!(p.is_inline());
    assert_eq!(p.f(), 42);

    p.emplace(BigDerived([7; 4]));
    assert!(p.is_heap());
    let heap_addr: *const dyn Base = &*p;

    let q: SmallBox<dyn Base, Half> = p.resize();
    assert!(q.is_heap());
    assert_eq!(q.f(), -1);
    let moved_addr: *const dyn Base = &*q;
    assert_eq!(moved_addr.cast::<u8>(), heap_addr.cast::<u8>());
}

#[test]
fn move_assign_between_inline_boxes() {
    use movable::*;

    let mut five: SmallBox<dyn Base, S1> = SmallBox::new(SmallDerived(5));
    let mut six: SmallBox<dyn Base, S1> = SmallBox::new(SmallDerived(6));
    six.transfer_from(&mut five);
    assert!(five.is_empty());
    assert!(six.is_inline());
    assert_eq!(six.f(), 5);
}

#[test]
fn conversion_and_small_box() {
    use movable::*;

    let p = small_box::<SmallDerived, _>(SmallDerived(42));
    let _: &SmallBox<SmallDerived, SmallDerived> = &p;
    assert!(p.is_inline());
    assert_eq!(p.f(), 42);

    let mut p2: SmallBox<dyn Base, SmallDerived> = p.upcast();
    assert!(p2.is_inline());
    assert_eq!(p2.f(), 42);

    p2 = small_box::<BigDerived, _>(BigDerived([0; 4]))
        .upcast::<dyn Base>()
        .resize();
    assert!(p2.is_heap());
    assert_eq!(p2.f(), -1);

    let direct = small_box::<dyn Base, _>(SmallDerived(3));
    assert!(direct.is_inline());
    assert_eq!(direct.f(), 3);
}

#[test]
fn released_box_outlives_source() {
    use movable::*;

    fn make() -> Box<dyn Base> {
        let mut local: SmallBox<dyn Base, S2> = SmallBox::new(SmallDerived(99));
        assert!(local.is_inline());
        local.release().unwrap()
    }

    let boxed = make();
    assert_eq!(boxed.f(), 99);
    let back: SmallBox<dyn Base, S2> = SmallBox::from(boxed);
    assert!(back.is_heap());
    assert_eq!(back.f(), 99);
}

#[test]
fn slices_and_strings() {
    let mut words: SmallBox<[u32], S2> = SmallBox::new([1u32, 2, 3, 4]);
    assert!(words.is_inline());
    words[3] = 40;
    assert_eq!(*words, [1, 2, 3, 40]);

    let words = words.resize::<S1>();
    assert!(words.is_heap());
    assert_eq!(words.iter().sum::<u32>(), 46);

    let text: Box<str> = "hello".into();
    let mut text: SmallBox<str, S1> = SmallBox::from_box(text);
    assert_eq!(&*text, "hello");
    assert_eq!(&*text.release().unwrap(), "hello");
}

#[test]
fn many_instances() {
    trait TestTrait {
        fn get_value(&self) -> u32;
    }

    impl_upcast!(dyn TestTrait);

    fn instance_one() -> SmallBox<dyn TestTrait, S1> {
        struct OneStruct(u32);
        impl TestTrait for OneStruct {
            fn get_value(&self) -> u32 {
                self.0
            }
        }
        SmallBox::new(OneStruct(12345))
    }

    fn instance_two() -> SmallBox<dyn TestTrait, S1> {
        struct TwoStruct;
        impl TestTrait for TwoStruct {
            fn get_value(&self) -> u32 {
                54321
            }
        }
        SmallBox::new(TwoStruct)
    }

    fn instance_three() -> SmallBox<dyn TestTrait, S1> {
        struct ThreeStruct([u32; 8]);
        impl TestTrait for ThreeStruct {
            fn get_value(&self) -> u32 {
                self.0.len() as u32
            }
        }
        SmallBox::new(ThreeStruct([0; 8]))
    }

    let boxes = [instance_one(), instance_two(), instance_three()];
    let values: Vec<u32> = boxes.iter().map(|b| b.get_value()).collect();
    assert_eq!(values, [12345, 54321, 8]);
    assert!(boxes[0].is_inline());
    assert!(boxes[1].is_inline());
    assert!(boxes[2].is_heap());
}

#[test]
fn closures() {
    trait Predicate: Fn(u8) -> bool {}
    impl<F: Fn(u8) -> bool> Predicate for F {}
    impl_upcast!(dyn Predicate);

    let is_even: SmallBox<dyn Predicate, S1> = SmallBox::new(|num: u8| num % 2 == 0);
    assert!(is_even.is_inline());
    assert!(!is_even(5));
    assert!(is_even(6));
}
