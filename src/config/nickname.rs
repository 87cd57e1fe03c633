//! Random per-session nickname generator.
//!
//! Each transfer registers with a throwaway identity; nicknames look like
//! `DustyHeron7` and stay within IRC's traditional length limits.

use rand::RngExt;

const FIRST: &[&str] = &[
    "Dusty", "Quiet", "Amber", "Misty", "Rusty", "Pale", "Brisk", "Faded", "Murky", "Sly",
    "Drift", "Ember", "Slate", "Vivid", "Husky", "Loft", "Gale", "Moss", "Flint", "Birch",
];

const SECOND: &[&str] = &[
    "Heron", "Finch", "Stoat", "Marten", "Skink", "Tern", "Pike", "Vole", "Shrew", "Egret",
    "Loon", "Smelt", "Wren", "Adder", "Grouse", "Roach", "Stork", "Eft", "Koi", "Gull",
];

/// Generate a random nickname like `DustyHeron7`.
pub fn generate_nickname() -> String {
    let mut rng = rand::rng();
    let first = FIRST[rng.random_range(0..FIRST.len())];
    let second = SECOND[rng.random_range(0..SECOND.len())];
    let num: u8 = rng.random_range(0..10);
    format!("{}{}{}", first, second, num)
}
