//! Nearest-remainder greedy selection with a subset-sum fallback for capped input counts.
//!
//! # Algorithm
//!
//! 1. Greedy: repeatedly take the unselected input whose balance is closest to the remaining
//!    deficit (`|remaining - balance|`, ties to the earlier pool position) until the deficit
//!    is closed. This favours few inputs and little remainder but is not optimal in count.
//! 2. If the greedy result exceeds the input limit, search the pool reduced to one input per
//!    distinct balance with [`solve`]:
//!    - the first exact combination wins
//!    - otherwise the smallest over-threshold combination (first found on ties)
//!    - otherwise the limit cannot be met
//!
//! # Sharp edge
//!
//! Reducing to distinct balances bounds the search but hides selections that need the same
//! balance twice: five inputs of 1 with threshold 3 and limit 2 cannot be served.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::balance::{accumulate_balance, inputs_balance};
use crate::error::InputSelectionError;
use crate::selection::subset_sum::{MAX_SUBSET_SUM_CALLS, solve};
use crate::types::{Input, InputsLimit, Selection, Threshold};

/// Strategy that produced a selection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SelectionStrategy {
    Greedy,
    SubsetSumExact,
    SubsetSumMinimalOvershoot,
}

const fn selection_strategy_label(strategy: SelectionStrategy) -> &'static str {
    match strategy {
        SelectionStrategy::Greedy => "greedy",
        SelectionStrategy::SubsetSumExact => "subset_sum_exact",
        SelectionStrategy::SubsetSumMinimalOvershoot => "subset_sum_minimal_overshoot",
    }
}

/// Inputs with a positive balance, first occurrence of each address kept, pool order preserved.
fn eligible_inputs(inputs: &[Input]) -> Vec<Input> {
    let mut seen = HashSet::new();
    inputs
        .iter()
        .filter(|input| input.balance > 0 && seen.insert(input.address.clone()))
        .cloned()
        .collect()
}

/// One input per distinct balance, first occurrence kept.
fn unique_by_balance(inputs: &[Input]) -> Vec<Input> {
    let mut seen = HashSet::new();
    inputs
        .iter()
        .filter(|input| seen.insert(input.balance))
        .cloned()
        .collect()
}

/// Indices picked by the nearest-remainder greedy pass, in pick order.
fn greedy_nearest_indices(
    inputs: &[Input],
    threshold: u64,
) -> Result<Vec<usize>, InputSelectionError> {
    let mut used = vec![false; inputs.len()];
    let mut selected = Vec::new();
    let mut total = 0u64;

    while total < threshold {
        let remaining = threshold - total;
        // `min_by_key` keeps the first of equal keys, so ties go to pool order.
        let Some((index, input)) = inputs
            .iter()
            .enumerate()
            .filter(|(index, _)| !used[*index])
            .min_by_key(|(_, input)| remaining.abs_diff(input.balance))
        else {
            return Err(InputSelectionError::InsufficientBalance {
                available: total,
                threshold,
            });
        };

        used[index] = true;
        selected.push(index);
        total = total.checked_add(input.balance).ok_or_else(|| {
            InputSelectionError::BalanceOverflow("accumulating greedy selection".to_string())
        })?;
    }

    Ok(selected)
}

/// Map solver balances back onto the distinct-balance inputs they came from.
fn inputs_for_balances(
    combination: &[u64],
    by_balance: &HashMap<u64, &Input>,
) -> Result<Vec<Input>, InputSelectionError> {
    combination
        .iter()
        .map(|balance| {
            by_balance.get(balance).map(|input| (*input).clone()).ok_or_else(|| {
                InputSelectionError::SelectionInvariantViolation(format!(
                    "solver returned balance {balance} absent from the candidate pool"
                ))
            })
        })
        .collect()
}

fn finish(
    inputs: Vec<Input>,
    strategy: SelectionStrategy,
) -> Result<Selection, InputSelectionError> {
    let balance = inputs_balance(&inputs)?;
    debug!(
        strategy = selection_strategy_label(strategy),
        inputs = inputs.len(),
        balance,
        "selected inputs"
    );

    Ok(Selection { inputs, balance })
}

/// Fall back to the bounded subset-sum search when the greedy pick is over the limit.
fn select_within_limit(
    eligible: &[Input],
    threshold: u64,
    limit: InputsLimit,
    max_calls: usize,
) -> Result<Selection, InputSelectionError> {
    let candidates = unique_by_balance(eligible);
    let balances = candidates
        .iter()
        .map(|input| input.balance)
        .collect::<Vec<_>>();
    let by_balance = candidates
        .iter()
        .map(|input| (input.balance, input))
        .collect::<HashMap<_, _>>();

    let report = solve(&balances, threshold, limit.get(), max_calls);
    debug!(
        candidates = balances.len(),
        calls = report.calls,
        exact = report.exact_matches.len(),
        exceeded = report.exceeded.len(),
        "subset-sum search finished"
    );
    if report.truncated {
        warn!(
            max_calls,
            candidates = balances.len(),
            "subset-sum search hit its call cap; over-threshold candidates may be incomplete"
        );
    }

    if let Some(exact) = report.exact_matches.first() {
        return finish(
            inputs_for_balances(exact, &by_balance)?,
            SelectionStrategy::SubsetSumExact,
        );
    }

    let Some(closest) = report.exceeded.iter().min_by_key(|combination| combination.len()) else {
        return Err(InputSelectionError::CannotMeetLimit {
            threshold,
            limit: limit.get(),
        });
    };

    let closest_balance = accumulate_balance(closest.iter().copied())?;
    if closest_balance <= threshold || !limit.admits(closest.len()) {
        return Err(InputSelectionError::SelectionInvariantViolation(format!(
            "over-threshold combination of {} inputs totals {closest_balance} for threshold {threshold} and limit {limit}",
            closest.len()
        )));
    }

    finish(
        inputs_for_balances(closest, &by_balance)?,
        SelectionStrategy::SubsetSumMinimalOvershoot,
    )
}

/// Select inputs covering `threshold` with at most `limit` inputs.
///
/// Zero-balance inputs and repeated addresses are ignored. Fails with `ZeroThreshold`,
/// `InsufficientBalance`, `CannotMeetLimit`, or `SelectionInvariantViolation` when the
/// fallback search returns an inconsistent result.
pub fn select(
    inputs: &[Input],
    threshold: u64,
    limit: InputsLimit,
) -> Result<Selection, InputSelectionError> {
    select_with_call_budget(inputs, threshold, limit, MAX_SUBSET_SUM_CALLS)
}

/// [`select`] with an explicit node budget for the subset-sum fallback.
pub fn select_with_call_budget(
    inputs: &[Input],
    threshold: u64,
    limit: InputsLimit,
    max_calls: usize,
) -> Result<Selection, InputSelectionError> {
    let threshold = Threshold::new(threshold)?.get();
    let eligible = eligible_inputs(inputs);

    let available = inputs_balance(&eligible)?;
    if available < threshold {
        return Err(InputSelectionError::InsufficientBalance {
            available,
            threshold,
        });
    }

    let greedy = greedy_nearest_indices(&eligible, threshold)?;
    if limit.admits(greedy.len()) {
        let picked = greedy
            .into_iter()
            .map(|index| eligible[index].clone())
            .collect();
        return finish(picked, SelectionStrategy::Greedy);
    }

    debug!(
        greedy_inputs = greedy.len(),
        %limit,
        "greedy selection exceeds input limit; falling back to subset-sum search"
    );
    select_within_limit(&eligible, threshold, limit, max_calls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HASH_TRYTES, Hash81, SecurityLevel, TRYTE_ALPHABET};

    fn address(index: usize) -> Hash81 {
        let first = char::from(TRYTE_ALPHABET[1 + index % 26]);
        let second = char::from(TRYTE_ALPHABET[1 + (index / 26) % 26]);
        let mut trytes = String::with_capacity(HASH_TRYTES);
        trytes.push(first);
        trytes.push(second);
        trytes.extend(std::iter::repeat_n('9', HASH_TRYTES - 2));
        trytes.parse().expect("valid hash")
    }

    fn inputs(balances: &[u64]) -> Vec<Input> {
        balances
            .iter()
            .enumerate()
            .map(|(index, balance)| Input {
                address: address(index),
                balance: *balance,
                security: SecurityLevel::Medium,
                key_index: u32::try_from(index).expect("small index"),
            })
            .collect()
    }

    fn balances(selection: &Selection) -> Vec<u64> {
        selection.inputs.iter().map(|input| input.balance).collect()
    }

    #[test]
    fn picks_single_exact_balance() {
        let selection = select(&inputs(&[5, 10, 15]), 10, InputsLimit::new(2)).expect("selects");

        assert_eq!(balances(&selection), vec![10]);
        assert_eq!(selection.balance, 10);
    }

    #[test]
    fn picks_nearest_to_remaining_deficit() {
        // remaining 12 -> 10 (diff 2); remaining 2 -> 3 (diff 1)
        let selection =
            select(&inputs(&[3, 10, 20, 1]), 12, InputsLimit::unlimited()).expect("selects");

        assert_eq!(balances(&selection), vec![10, 3]);
        assert_eq!(selection.balance, 13);
    }

    #[test]
    fn ties_go_to_pool_order() {
        // remaining 10: 8 and 12 are both 2 away; 8 comes first.
        let selection =
            select(&inputs(&[8, 12, 2]), 10, InputsLimit::unlimited()).expect("selects");

        assert_eq!(balances(&selection), vec![8, 2]);
        assert_eq!(selection.inputs[0].address, address(0));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let err = select(&inputs(&[5]), 0, InputsLimit::unlimited()).expect_err("zero threshold");
        assert!(matches!(err, InputSelectionError::ZeroThreshold));
    }

    #[test]
    fn insufficient_balance_is_rejected() {
        let err = select(&inputs(&[5, 0, 3]), 9, InputsLimit::unlimited()).expect_err("short");
        assert!(matches!(
            err,
            InputSelectionError::InsufficientBalance {
                available: 8,
                threshold: 9
            }
        ));
    }

    #[test]
    fn zero_balance_inputs_are_never_selected() {
        let selection =
            select(&inputs(&[0, 4, 0, 6]), 10, InputsLimit::unlimited()).expect("selects");

        assert!(selection.inputs.iter().all(|input| input.balance > 0));
        assert_eq!(selection.balance, 10);
    }

    #[test]
    fn duplicate_addresses_are_selected_once() {
        let mut pool = inputs(&[6, 6]);
        pool[1].address = pool[0].address.clone();
        pool.push(inputs(&[0, 0, 6])[2].clone());

        let selection = select(&pool, 12, InputsLimit::unlimited()).expect("selects");

        assert_eq!(selection.inputs.len(), 2);
        assert_ne!(selection.inputs[0].address, selection.inputs[1].address);
    }

    #[test]
    fn limit_falls_back_to_exact_subset() {
        // greedy takes 7, 2, 2 (three inputs); over distinct [7, 2, 4, 6] the first
        // exact pair in index order is [4, 6].
        let selection =
            select(&inputs(&[7, 2, 2, 4, 6]), 10, InputsLimit::new(2)).expect("selects");

        assert_eq!(balances(&selection), vec![4, 6]);
        assert_eq!(selection.balance, 10);
    }

    #[test]
    fn truncated_search_settles_for_recorded_overshoot() {
        // Seven nodes reach [7, 4] and [7, 6] but stop before the exact [4, 6].
        let pool = inputs(&[7, 2, 2, 4, 6]);
        let selection =
            select_with_call_budget(&pool, 10, InputsLimit::new(2), 7).expect("selects");

        assert_eq!(balances(&selection), vec![7, 4]);
        assert_eq!(selection.balance, 11);
        assert_eq!(selection.inputs[1].key_index, 3);

        let err = select_with_call_budget(&pool, 10, InputsLimit::new(2), 1)
            .expect_err("budget exhausted before any candidate");
        assert!(matches!(
            err,
            InputSelectionError::CannotMeetLimit {
                threshold: 10,
                limit: 2
            }
        ));
    }

    #[test]
    fn limit_falls_back_to_smallest_overshoot_combination() {
        // greedy takes 7, 2, 2; distinct [7, 2, 5] has no exact pair and [7, 5] is the
        // only over-threshold combination of at most two inputs.
        let selection =
            select(&inputs(&[7, 2, 2, 5, 5]), 10, InputsLimit::new(2)).expect("selects");

        assert_eq!(balances(&selection), vec![7, 5]);
        assert_eq!(selection.balance, 12);
    }

    #[test]
    fn single_input_limit_takes_one_large_balance() {
        // greedy takes 7 then 3; with one input allowed only 14 covers the threshold.
        let selection = select(&inputs(&[7, 3, 14]), 10, InputsLimit::new(1)).expect("selects");

        assert_eq!(balances(&selection), vec![14]);
        assert_eq!(selection.inputs[0].key_index, 2);
    }

    #[test]
    fn duplicate_balances_cannot_meet_limit() {
        let err = select(&inputs(&[1, 1, 1, 1, 1]), 3, InputsLimit::new(2)).expect_err("limit");

        assert!(matches!(
            err,
            InputSelectionError::CannotMeetLimit {
                threshold: 3,
                limit: 2
            }
        ));
    }

    #[test]
    fn selection_respects_limit() {
        let pool = inputs(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        for threshold in 1..=17 {
            let selection = select(&pool, threshold, InputsLimit::new(2)).expect("selects");
            assert!(selection.inputs.len() <= 2, "threshold {threshold}");
            assert!(selection.balance >= threshold, "threshold {threshold}");
        }
    }

    #[test]
    fn selection_is_deterministic() {
        let pool = inputs(&[13, 2, 40, 7, 7, 21, 5]);
        let first = select(&pool, 50, InputsLimit::new(3)).expect("selects");
        let second = select(&pool, 50, InputsLimit::new(3)).expect("selects");

        assert_eq!(first, second);
    }
}
