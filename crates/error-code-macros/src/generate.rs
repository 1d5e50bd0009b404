//! Deterministic opaque code generation.
//!
//! Codes are derived from the seed `TypeName.caseName` with a djb2 variant
//! that squares each byte before folding it in and reseeds per output
//! position, so each character of the code is statistically independent of
//! the others for a fixed seed. The mapping is pure: the same
//! `(seed, length, alphabet)` triple yields the same code on any platform,
//! in any process, which is what lets a code reported from an old build
//! decode against a new one.

use proc_macro2::Span;

pub const DEFAULT_CODE_LENGTH: usize = 4;
pub const DEFAULT_DELIMITER: &str = "-";

/// Minimum number of unique characters a usable alphabet must have.
pub const MIN_ALPHABET_LEN: usize = 5;

/// The 62 alphanumeric ASCII characters in sorted order (`0-9A-Za-z`).
pub fn default_alphabet() -> Vec<char> {
    ('0'..='9').chain('A'..='Z').chain('a'..='z').collect()
}

/// Generates the opaque code for `seed`: exactly `length` characters drawn
/// from `alphabet`.
///
/// For each output position `i`, the hash starts at `5381 * (i + length)`
/// and folds in every UTF-8 byte of the seed with
/// `h = (h << 5) + h + byte * byte` on wrapping 64-bit signed arithmetic.
/// The character is `alphabet[|h| % alphabet.len()]`.
pub fn opaque_code(seed: &str, length: usize, alphabet: &[char]) -> String {
    debug_assert!(!alphabet.is_empty());
    let mut code = String::with_capacity(length);
    for position in 0..length {
        let mut hash = 5381i64.wrapping_mul((position + length) as i64);
        for byte in seed.bytes() {
            let squared = i64::from(byte) * i64::from(byte);
            hash = hash.wrapping_shl(5).wrapping_add(hash).wrapping_add(squared);
        }
        let index = (hash.unsigned_abs() % alphabet.len() as u64) as usize;
        code.push(alphabet[index]);
    }
    code
}

/// A group of cases whose generated codes coincide.
pub struct Collision {
    pub code: String,
    pub cases: Vec<syn::Ident>,
    pub span: Span,
}

/// Groups cases by generated code and returns every group of two or more,
/// in first-occurrence order. The generator itself never detects collisions;
/// this runs downstream over all cases of one type.
pub fn find_collisions(codes: &[(syn::Ident, String)]) -> Vec<Collision> {
    let mut groups: Vec<(String, Vec<syn::Ident>)> = Vec::new();
    for (ident, code) in codes {
        match groups.iter_mut().find(|(c, _)| c == code) {
            Some((_, idents)) => idents.push(ident.clone()),
            None => groups.push((code.clone(), vec![ident.clone()])),
        }
    }
    groups
        .into_iter()
        .filter(|(_, idents)| idents.len() > 1)
        .map(|(code, cases)| {
            let span = cases[0].span();
            Collision { code, cases, span }
        })
        .collect()
}
