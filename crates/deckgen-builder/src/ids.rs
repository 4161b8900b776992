//! Stable numeric identifiers.
//!
//! Model and deck IDs are derived from names with 64-bit FNV-1a over the
//! UTF-8 bytes, so the same name produces the same ID on every platform and
//! every run. The hash is masked to 47 bits to stay a positive `i64` in the
//! range Anki expects for millisecond-style IDs.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
const ID_MASK: u64 = 0x7FFF_FFFF_FFFF;

/// 64-bit FNV-1a hash of `input`.
pub fn fnv1a(input: &str) -> u64 {
    input.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Stable positive identifier for a name.
///
/// # Example
///
/// ```
/// use deckgen_builder::ids::stable_id;
///
/// assert_eq!(stable_id("spanish_verbs"), stable_id("spanish_verbs"));
/// assert!(stable_id("spanish_verbs") > 0);
/// ```
pub fn stable_id(name: &str) -> i64 {
    let id = (fnv1a(name) & ID_MASK) as i64;
    // zero is reserved by Anki for "no id"
    if id == 0 { 1 } else { id }
}
