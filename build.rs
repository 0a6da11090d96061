use std::fmt::Debug;
use std::mem::{size_of, transmute_copy};
use std::ptr::addr_of;

/// Splits a fat pointer into its two words.
fn fat_words<P: Copy>(ptr: P) -> [usize; 2] {
    assert_eq!(size_of::<P>(), 2 * size_of::<usize>());
    unsafe { transmute_copy(&ptr) }
}

fn check(what: &str, holds: bool) {
    if !holds {
        panic!(
            "the data address is not the first word of a {what} pointer on this host, \
             build relobox with the `nightly` feature"
        );
    }
}

// On stable, `sptr` moves an inline payload pointer by overwriting the first
// word of the fat pointer. The host layout may differ from the target's.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    if std::env::var_os("CARGO_FEATURE_NIGHTLY").is_some() {
        return;
    }

    let value = 7u32;
    let object: *const dyn Debug = &value;
    let [addr, _] = fat_words(object);
    check("trait object", addr == addr_of!(value) as usize);

    let words = [1u16, 2, 3];
    let slice: *const [u16] = &words[..];
    let [addr, len] = fat_words(slice);
    check("slice", addr == words.as_ptr() as usize && len == words.len());
}
