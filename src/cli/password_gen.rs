//! Random password generation for the `generate` command.
//!
//! A class spec is a short string of class markers:
//!   `a` lowercase, `A` uppercase, `1` digits, `!` symbols.
//! The result always contains at least one character of every
//! requested class.

use rand::seq::SliceRandom;
use rand::Rng;
use zeroize::Zeroizing;

use crate::errors::{KeyTreeError, Result};

const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()-_=+[]{};:,.<>?";

/// Upper bound on generated length.
pub const MAX_LENGTH: usize = 1024;

/// Expand a class spec into the character sets it names.
fn parse_classes(spec: &str) -> Result<Vec<&'static [u8]>> {
    let mut sets: Vec<&'static [u8]> = Vec::new();
    for marker in spec.chars() {
        let set = match marker {
            'a' => LOWER,
            'A' => UPPER,
            '1' => DIGITS,
            '!' => SYMBOLS,
            other => {
                return Err(KeyTreeError::CommandFailed(format!(
                    "unknown character class '{other}' (use a, A, 1, !)"
                )))
            }
        };
        if !sets.contains(&set) {
            sets.push(set);
        }
    }
    if sets.is_empty() {
        return Err(KeyTreeError::CommandFailed(
            "at least one character class is required".into(),
        ));
    }
    Ok(sets)
}

/// Generate a `length`-character password drawn from `classes`.
pub fn generate(length: usize, classes: &str) -> Result<Zeroizing<String>> {
    let sets = parse_classes(classes)?;
    if length < sets.len() {
        return Err(KeyTreeError::CommandFailed(format!(
            "length {length} is too short for {} character classes",
            sets.len()
        )));
    }
    if length > MAX_LENGTH {
        return Err(KeyTreeError::CommandFailed(format!(
            "length {length} exceeds the maximum of {MAX_LENGTH}"
        )));
    }

    let pool: Vec<u8> = sets.iter().flat_map(|s| s.iter().copied()).collect();
    let mut rng = rand::rng();

    let mut chars = Zeroizing::new(Vec::with_capacity(length));
    for set in &sets {
        chars.push(set[rng.random_range(0..set.len())]);
    }
    while chars.len() < length {
        chars.push(pool[rng.random_range(0..pool.len())]);
    }
    chars.shuffle(&mut rng);

    // Every byte comes from the ASCII tables above.
    let password: String = chars.iter().map(|&b| b as char).collect();
    Ok(Zeroizing::new(password))
}
