// Ranking primitives for suggestion candidates.
// Pure functions only: no I/O, deterministic for a given input.

pub mod keywords;
pub mod mmr;
pub mod rrf;
pub mod similarity;
