//! Slot-packing search: exact reduction first, then a deduplicated,
//! deadline-bounded walk over the orderings of whatever is left.

pub mod evaluator;
pub mod permutations;
pub mod reducer;
pub mod runner;
pub mod trie;

pub use self::evaluator::{evaluate, Fit};
pub use self::permutations::Permutations;
pub use self::reducer::{reduce, Reduction};
pub use self::runner::{
    NoProgress, Optimizer, PackingResult, ProgressCallback, SearchOptions, SearchOutcome,
    SearchPhase, Termination,
};
pub use self::trie::SequenceTrie;
