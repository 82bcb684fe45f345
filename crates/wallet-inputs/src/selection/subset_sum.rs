//! Bounded subset-sum search over address balances.
//!
//! # Algorithm
//!
//! Depth-first, strictly left-to-right: a branch rooted at index `i` only extends with
//! balances after `i`, so each combination is visited once, in index order. At each node:
//! - `sum == threshold` within the size limit records an exact match and ends the search
//! - `sum > threshold` within the size limit records an over-threshold candidate
//! - `sum >= threshold` never expands further
//!
//! The traversal keeps its own frame stack, so pool size never bounds stack depth.
//!
//! # Truncation
//!
//! The search visits at most `max_calls` nodes. Hitting the cap is not an error: whatever has
//! been recorded so far is returned with `truncated` set, so large pools yield incomplete
//! `exceeded` sets rather than unbounded CPU time.

/// Upper bound on search nodes visited by one [`solve`] call.
pub const MAX_SUBSET_SUM_CALLS: usize = 100_000;

/// Outcome of one bounded search.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubsetSumReport {
    /// At most one entry: the first exact combination found.
    pub exact_matches: Vec<Vec<u64>>,
    /// Over-threshold combinations within the size limit, in discovery order.
    pub exceeded: Vec<Vec<u64>>,
    pub calls: usize,
    pub truncated: bool,
}

struct SubsetSumSearch<'a> {
    balances: &'a [u64],
    threshold: u64,
    limit: usize,
    max_calls: usize,
    calls: usize,
    truncated: bool,
    partial: Vec<u64>,
    exact_matches: Vec<Vec<u64>>,
    exceeded: Vec<Vec<u64>>,
}

impl<'a> SubsetSumSearch<'a> {
    const fn new(balances: &'a [u64], threshold: u64, limit: usize, max_calls: usize) -> Self {
        Self {
            balances,
            threshold,
            limit,
            max_calls,
            calls: 0,
            truncated: false,
            partial: Vec::new(),
            exact_matches: Vec::new(),
            exceeded: Vec::new(),
        }
    }

    fn finished(&self) -> bool {
        self.truncated || !self.exact_matches.is_empty()
    }

    const fn mark_call(&mut self) -> bool {
        if self.calls >= self.max_calls {
            self.truncated = true;
            return false;
        }
        self.calls += 1;
        true
    }

    fn within_limit(&self) -> bool {
        self.limit == 0 || self.partial.len() <= self.limit
    }

    /// Count a visit to the node at `self.partial` and record it if it qualifies.
    ///
    /// Returns whether the node should be expanded with further balances.
    fn visit(&mut self, sum: u64) -> bool {
        if self.finished() || !self.mark_call() {
            return false;
        }

        if sum == self.threshold && self.within_limit() {
            self.exact_matches.push(self.partial.clone());
            return false;
        }
        if sum > self.threshold && self.within_limit() {
            self.exceeded.push(self.partial.clone());
        }
        sum < self.threshold
    }

    fn search(&mut self) {
        if !self.visit(0) {
            return;
        }

        // One frame per expanded node: the next index to try and the node's sum.
        // `partial` holds one balance per frame above the root.
        let mut frames = vec![SearchFrame { next: 0, sum: 0 }];
        while let Some(frame) = frames.last_mut() {
            if self.finished() || frame.next >= self.balances.len() {
                frames.pop();
                if !frames.is_empty() {
                    self.partial.pop();
                }
                continue;
            }

            let index = frame.next;
            frame.next += 1;
            let balance = self.balances[index];
            // A saturated sum is still above any threshold, which is all the search needs.
            let sum = frame.sum.saturating_add(balance);

            self.partial.push(balance);
            if self.visit(sum) {
                frames.push(SearchFrame {
                    next: index + 1,
                    sum,
                });
            } else {
                self.partial.pop();
            }
        }
    }
}

struct SearchFrame {
    next: usize,
    sum: u64,
}

/// Search `balances` for a combination hitting `threshold` exactly, collecting over-threshold
/// combinations on the way.
///
/// `limit` caps combination size (`0` = no cap). The traversal order is the order of
/// `balances` as given; callers pre-sort or deduplicate if they need to.
#[must_use]
pub fn solve(balances: &[u64], threshold: u64, limit: usize, max_calls: usize) -> SubsetSumReport {
    let mut search = SubsetSumSearch::new(balances, threshold, limit, max_calls);
    search.search();

    SubsetSumReport {
        exact_matches: search.exact_matches,
        exceeded: search.exceeded,
        calls: search.calls,
        truncated: search.truncated,
    }
}
