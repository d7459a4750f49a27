use super::evaluator::{evaluate, Fit};
use super::permutations::Permutations;
use super::reducer::{reduce, Reduction};
use super::trie::SequenceTrie;
use crate::config::Config;
use crate::error::{SslcError, SslcResult};
use crate::layout::SLOT_CAPACITY;
use serde::Serialize;
use std::time::{Duration, Instant};
use strum::Display;
use tracing::{debug, trace};

pub struct SearchOptions {
    pub timeout: Duration,
    pub progress_interval: u64,
    /// Node budget of the duplicate filter. Past it, repeated value
    /// sequences are evaluated again instead of being remembered.
    pub max_trie_nodes: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SearchOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            timeout: cfg.search.timeout_duration(),
            progress_interval: cfg.search.progress_interval.max(1),
            max_trie_nodes: cfg.search.max_trie_nodes,
        }
    }
}

/// Lifecycle of one record's optimization. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SearchPhase {
    Idle,
    Reducing,
    ExactDone,
    Searching,
    Exhausted,
    TimedOut,
    Reported,
}

impl SearchPhase {
    pub fn can_advance_to(self, next: SearchPhase) -> bool {
        use SearchPhase::*;
        matches!(
            (self, next),
            (Idle, Reducing)
                | (Reducing, ExactDone)
                | (Reducing, Searching)
                | (Searching, Exhausted)
                | (Searching, TimedOut)
                | (ExactDone, Reported)
                | (Exhausted, Reported)
                | (TimedOut, Reported)
        )
    }
}

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Termination {
    /// Settled by exact reduction, no search needed.
    Exact,
    /// The best ordering met the theoretical minimum.
    LowerBound,
    /// Every distinct ordering was evaluated.
    Exhausted,
    /// The deadline passed first.
    TimedOut,
    /// A progress callback asked to stop.
    Cancelled,
}

impl Termination {
    pub fn timed_out(self) -> bool {
        matches!(self, Termination::TimedOut | Termination::Cancelled)
    }

    fn phase(self) -> SearchPhase {
        match self {
            Termination::Exact => SearchPhase::ExactDone,
            Termination::LowerBound | Termination::Exhausted => SearchPhase::Exhausted,
            Termination::TimedOut | Termination::Cancelled => SearchPhase::TimedOut,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingResult {
    pub slots_used: u32,
    pub timed_out: bool,
    pub termination: Termination,
    pub reduced_slots: u32,
    pub residual_items: usize,
    pub lower_bound: u32,
    pub orderings_evaluated: u64,
    pub orderings_skipped: u64,
}

/// Result of the brute-force phase over residual items only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub best: u32,
    pub lower_bound: u32,
    pub termination: Termination,
    pub evaluated: u64,
    pub skipped: u64,
}

/// Receives updates during the permutation search.
/// Returning `false` aborts the search with the best result found so far.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, evaluated: u64, best: u32) -> bool;
}

pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_progress(&self, _evaluated: u64, _best: u32) -> bool {
        true
    }
}

pub struct Optimizer {
    options: SearchOptions,
}

impl Optimizer {
    pub fn new(options: SearchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Minimum slot count over all orderings of `sizes`, bounded by the timeout.
    pub fn run<CB: ProgressCallback>(&self, sizes: &[u8], callback: &CB) -> SslcResult<PackingResult> {
        if let Some(&bad) = sizes
            .iter()
            .find(|&&s| s == 0 || s as u32 > SLOT_CAPACITY)
        {
            return Err(SslcError::InvalidSize(bad as u32));
        }

        let mut phase = SearchPhase::Idle;
        advance(&mut phase, SearchPhase::Reducing);

        let reduction = reduce(sizes);
        let Reduction {
            reduced_slots,
            residual,
            exact,
            ..
        } = reduction;

        let outcome = if exact {
            SearchOutcome {
                best: 0,
                lower_bound: 0,
                termination: Termination::Exact,
                evaluated: 0,
                skipped: 0,
            }
        } else {
            advance(&mut phase, SearchPhase::Searching);
            self.search_residual(&residual, callback)
        };
        advance(&mut phase, outcome.termination.phase());

        let result = PackingResult {
            slots_used: reduced_slots + outcome.best,
            timed_out: outcome.termination.timed_out(),
            termination: outcome.termination,
            reduced_slots,
            residual_items: residual.len(),
            lower_bound: reduced_slots + outcome.lower_bound,
            orderings_evaluated: outcome.evaluated,
            orderings_skipped: outcome.skipped,
        };
        advance(&mut phase, SearchPhase::Reported);

        debug!(
            "packed {} items: {} reduced + {} searched = {} slots ({}, {} evaluated, {} skipped)",
            sizes.len(),
            reduced_slots,
            outcome.best,
            result.slots_used,
            result.termination,
            result.orderings_evaluated,
            result.orderings_skipped
        );
        Ok(result)
    }

    /// Brute-force search over the orderings of `residual`.
    pub fn search_residual<CB: ProgressCallback>(
        &self,
        residual: &[u8],
        callback: &CB,
    ) -> SearchOutcome {
        let mut ctx = SearchContext::new(residual, &self.options);
        let termination = ctx.run(callback);
        SearchOutcome {
            best: ctx.best,
            lower_bound: ctx.lower_bound,
            termination,
            evaluated: ctx.evaluated,
            skipped: ctx.skipped,
        }
    }
}

fn advance(phase: &mut SearchPhase, next: SearchPhase) {
    debug_assert!(
        phase.can_advance_to(next),
        "illegal search transition {} -> {}",
        phase,
        next
    );
    trace!("search phase {} -> {}", phase, next);
    *phase = next;
}

/// All mutable state of one residual search.
struct SearchContext {
    items: Vec<u8>,
    best: u32,
    lower_bound: u32,
    deadline: Option<Instant>,
    progress_interval: u64,
    seen: Option<SequenceTrie>,
    max_trie_nodes: usize,
    evaluated: u64,
    skipped: u64,
}

impl SearchContext {
    fn new(residual: &[u8], options: &SearchOptions) -> Self {
        let mut items = residual.to_vec();
        items.sort_unstable_by(|a, b| b.cmp(a));

        let total: u32 = items.iter().map(|&s| s as u32).sum();
        let lower_bound = total.div_ceil(SLOT_CAPACITY);

        // Without repeated sizes every ordering is a distinct value sequence.
        let has_duplicates = items.windows(2).any(|w| w[0] == w[1]);

        Self {
            best: items.len() as u32,
            lower_bound,
            deadline: Instant::now().checked_add(options.timeout),
            progress_interval: options.progress_interval.max(1),
            seen: (has_duplicates && options.max_trie_nodes > 0).then(SequenceTrie::new),
            max_trie_nodes: options.max_trie_nodes,
            evaluated: 0,
            skipped: 0,
            items,
        }
    }

    fn run<CB: ProgressCallback>(&mut self, callback: &CB) -> Termination {
        if self.best <= self.lower_bound {
            return Termination::LowerBound;
        }

        let mut orderings = Permutations::new(self.items.clone());
        let mut produced = 0u64;

        loop {
            let Some(ordering) = orderings.next() else {
                return Termination::Exhausted;
            };
            produced += 1;

            if produced > 1 {
                if let Some(deadline) = self.deadline {
                    if Instant::now() >= deadline {
                        return Termination::TimedOut;
                    }
                }
            }

            if let Some(seen) = self.seen.as_mut() {
                if !seen.insert(&ordering) {
                    self.skipped += 1;
                    continue;
                }
                if seen.node_count() >= self.max_trie_nodes {
                    debug!(
                        "duplicate filter full at {} nodes ({} sequences), disabling it",
                        seen.node_count(),
                        seen.len()
                    );
                    self.seen = None;
                }
            }

            self.evaluated += 1;
            if let Fit::Slots(slots) = evaluate(&ordering, self.best) {
                self.best = slots;
                if self.best <= self.lower_bound {
                    return Termination::LowerBound;
                }
            }

            if self.evaluated % self.progress_interval == 0
                && !callback.on_progress(self.evaluated, self.best)
            {
                return Termination::Cancelled;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn optimizer(timeout: Duration) -> Optimizer {
        Optimizer::new(SearchOptions {
            timeout,
            progress_interval: 1,
            ..SearchOptions::default()
        })
    }

    #[test]
    fn test_exact_reduction_skips_search() {
        let result = Optimizer::new(SearchOptions::default())
            .run(&[32, 20, 12, 1, 31], &NoProgress)
            .unwrap();
        assert_eq!(result.slots_used, 3);
        assert_eq!(result.termination, Termination::Exact);
        assert_eq!(result.orderings_evaluated, 0);
        assert!(!result.timed_out);
    }

    #[test]
    fn test_empty_record_uses_no_slots() {
        let result = optimizer(Duration::ZERO).run(&[], &NoProgress).unwrap();
        assert_eq!(result.slots_used, 0);
        assert_eq!(result.termination, Termination::Exact);
        assert!(!result.timed_out);
    }

    #[test]
    fn test_repeated_sizes_are_evaluated_once() {
        let opt = optimizer(Duration::from_secs(10));
        let outcome = opt.search_residual(&[20, 20, 20], &NoProgress);
        assert_eq!(outcome.best, 3);
        assert_eq!(outcome.evaluated, 1);
        assert_eq!(outcome.skipped, 5);
        assert_eq!(outcome.termination, Termination::Exhausted);

        let outcome = opt.search_residual(&[4, 4, 4], &NoProgress);
        assert_eq!(outcome.evaluated, 1);
        assert_eq!(outcome.best, 1);
    }

    #[test]
    fn test_trie_budget_keeps_search_exact() {
        // Five distinct orderings out of 120, none reaching the lower bound of 3.
        let capped = Optimizer::new(SearchOptions {
            timeout: Duration::from_secs(10),
            progress_interval: 1,
            max_trie_nodes: 8,
        });
        let outcome = capped.search_residual(&[20, 20, 20, 20, 9], &NoProgress);
        let full = optimizer(Duration::from_secs(10)).search_residual(&[20, 20, 20, 20, 9], &NoProgress);

        assert_eq!(outcome.best, full.best);
        assert_eq!(outcome.termination, Termination::Exhausted);
        assert_eq!(full.evaluated, 5);
        assert!(outcome.evaluated > full.evaluated);
        assert_eq!(outcome.evaluated + outcome.skipped, 120);

        let unfiltered = Optimizer::new(SearchOptions {
            max_trie_nodes: 0,
            ..SearchOptions::default()
        })
        .search_residual(&[20, 20, 20, 20, 9], &NoProgress);
        assert_eq!(unfiltered.evaluated, 120);
        assert_eq!(unfiltered.skipped, 0);
    }

    #[test]
    fn test_sentinel_at_lower_bound_needs_no_search() {
        let outcome = optimizer(Duration::from_secs(10)).search_residual(&[20, 20], &NoProgress);
        assert_eq!(outcome.best, 2);
        assert_eq!(outcome.evaluated, 0);
        assert_eq!(outcome.termination, Termination::LowerBound);
    }

    #[test]
    fn test_zero_timeout_reports_timeout() {
        let result = optimizer(Duration::ZERO)
            .run(&[20, 20, 20, 1], &NoProgress)
            .unwrap();
        assert!(result.timed_out);
        assert_eq!(result.termination, Termination::TimedOut);
        assert_eq!(result.orderings_evaluated, 1);
        assert_eq!(result.slots_used, 3);
    }

    #[test]
    fn test_callback_can_cancel() {
        struct StopAfter(AtomicU64);
        impl ProgressCallback for StopAfter {
            fn on_progress(&self, _evaluated: u64, _best: u32) -> bool {
                self.0.fetch_add(1, Ordering::SeqCst) < 2
            }
        }

        let cb = StopAfter(AtomicU64::new(0));
        let outcome = optimizer(Duration::from_secs(10))
            .search_residual(&[20, 19, 18, 17, 3], &cb);
        assert_eq!(outcome.termination, Termination::Cancelled);
        assert_eq!(outcome.evaluated, 3);
        assert!(outcome.termination.timed_out());
    }

    #[test]
    fn test_invalid_sizes_rejected() {
        let opt = optimizer(Duration::from_secs(1));
        assert!(matches!(
            opt.run(&[0, 4], &NoProgress),
            Err(SslcError::InvalidSize(0))
        ));
        assert!(matches!(
            opt.run(&[33], &NoProgress),
            Err(SslcError::InvalidSize(33))
        ));
    }

    #[test]
    fn test_phase_transitions() {
        use SearchPhase::*;
        assert!(Idle.can_advance_to(Reducing));
        assert!(Reducing.can_advance_to(ExactDone));
        assert!(Searching.can_advance_to(TimedOut));
        assert!(TimedOut.can_advance_to(Reported));
        assert!(!Reported.can_advance_to(Idle));
        assert!(!Searching.can_advance_to(Reducing));
        assert!(!Idle.can_advance_to(Searching));
    }
}
