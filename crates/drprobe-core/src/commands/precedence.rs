//! Option precedence rules, kept as data.
//!
//! Some tools accept options that silently cancel each other. Each rule
//! names the option that wins and the one it deactivates; command builders
//! drop the loser from the argument list when both are requested.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Override {
    pub winner: &'static str,
    pub loser: &'static str,
}

impl Override {
    pub const fn new(winner: &'static str, loser: &'static str) -> Self {
        Self { winner, loser }
    }
}

/// `-abs` replaces the fractional `-abf` absorption and `-fl` replaces `-dwf`.
pub const CELSLC_OVERRIDES: &[Override] = &[Override::new("abs", "abf"), Override::new("fl", "dwf")];

/// Options from `requested` that lose to another requested option.
pub fn suppressed_options(requested: &[&'static str], table: &[Override]) -> BTreeSet<&'static str> {
    let requested: BTreeSet<&str> = requested.iter().copied().collect();
    table
        .iter()
        .filter(|rule| requested.contains(rule.winner) && requested.contains(rule.loser))
        .map(|rule| rule.loser)
        .collect()
}
