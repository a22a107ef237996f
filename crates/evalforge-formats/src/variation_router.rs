//! Variation router: pairwise-covering combinatorial expansion over
//! case-specific variation axes, padded to a configured minimum.

use std::collections::BTreeMap;

use evalforge_model::{AxisValue, Case};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::axes::{Axis, axes_for_case};

/// One generated combination: the chosen value per axis, plus the 2-3 axes
/// whose value is "interesting" (non-default) for this combination.
#[derive(Debug, Clone, PartialEq)]
pub struct VariationCombination {
    pub parameters: BTreeMap<String, AxisValue>,
    pub parameter_variation_axes: Vec<String>,
}

/// Cartesian product of every axis's value domain.
fn enumerate_all(axes: &[Axis]) -> Vec<BTreeMap<String, AxisValue>> {
    let mut combos: Vec<BTreeMap<String, AxisValue>> = vec![BTreeMap::new()];
    for axis in axes {
        let mut next = Vec::with_capacity(combos.len() * axis.values.len());
        for combo in &combos {
            for value in &axis.values {
                let mut extended = combo.clone();
                extended.insert(axis.name.to_string(), value.clone());
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

/// All (axis_a, axis_b, value_a, value_b) pairs a combo covers.
fn pairs_covered(
    combo: &BTreeMap<String, AxisValue>,
    axes: &[Axis],
) -> Vec<(usize, usize, String, String)> {
    let mut pairs = Vec::new();
    for i in 0..axes.len() {
        for j in (i + 1)..axes.len() {
            let vi = combo.get(axes[i].name).map(ToString::to_string).unwrap_or_default();
            let vj = combo.get(axes[j].name).map(ToString::to_string).unwrap_or_default();
            pairs.push((i, j, vi, vj));
        }
    }
    pairs
}

/// Greedy "cover the most uncovered pairs first" algorithm: simple,
/// deterministic given the enumeration order, and terminates once every
/// axis-value pair has appeared at least once.
fn greedy_pairwise_cover(axes: &[Axis]) -> Vec<BTreeMap<String, AxisValue>> {
    let all_combos = enumerate_all(axes);
    if axes.len() < 2 {
        return all_combos;
    }

    let mut uncovered: std::collections::HashSet<(usize, usize, String, String)> =
        std::collections::HashSet::new();
    for combo in &all_combos {
        for pair in pairs_covered(combo, axes) {
            uncovered.insert(pair);
        }
    }

    let mut selected = Vec::new();
    while !uncovered.is_empty() {
        let mut best_idx = 0;
        let mut best_new_pairs = 0usize;
        for (idx, combo) in all_combos.iter().enumerate() {
            let new_pairs = pairs_covered(combo, axes)
                .into_iter()
                .filter(|p| uncovered.contains(p))
                .count();
            if new_pairs > best_new_pairs {
                best_new_pairs = new_pairs;
                best_idx = idx;
            }
        }
        if best_new_pairs == 0 {
            break;
        }
        let chosen = &all_combos[best_idx];
        for pair in pairs_covered(chosen, axes) {
            uncovered.remove(&pair);
        }
        selected.push(chosen.clone());
    }

    selected
}

/// Compute `parameter_variation_axes` for one combination:
/// the 2-3 axes whose chosen value is non-default; if fewer than 2 are
/// non-default, fall back to the first 2 axes in declaration order.
fn variation_axes_for(combo: &BTreeMap<String, AxisValue>, axes: &[Axis]) -> Vec<String> {
    let non_default: Vec<String> = axes
        .iter()
        .filter(|axis| {
            combo
                .get(axis.name)
                .map(|v| !Axis::is_default_value(v))
                .unwrap_or(false)
        })
        .map(|axis| axis.name.to_string())
        .collect();

    if non_default.len() >= 2 {
        non_default.into_iter().take(3).collect()
    } else {
        axes.iter().take(2).map(|a| a.name.to_string()).collect()
    }
}

/// Generate at least `min_test_cases` combinations for `case`:
/// pairwise cover first, then deterministic padding from the seed.
#[must_use]
pub fn route(case: Case, min_test_cases: usize, seed: u64) -> Vec<VariationCombination> {
    let axes = axes_for_case(case);
    let all_combos = enumerate_all(&axes);
    let mut selected = greedy_pairwise_cover(&axes);

    if selected.len() < min_test_cases {
        let mut rng = StdRng::seed_from_u64(seed);
        let already: std::collections::HashSet<Vec<String>> = selected
            .iter()
            .map(|c| c.values().map(ToString::to_string).collect())
            .collect();
        let mut candidates: Vec<&BTreeMap<String, AxisValue>> = all_combos
            .iter()
            .filter(|c| {
                let key: Vec<String> = c.values().map(ToString::to_string).collect();
                !already.contains(&key)
            })
            .collect();

        while selected.len() < min_test_cases && !candidates.is_empty() {
            let pick_idx = rng.random_range(0..candidates.len());
            selected.push(candidates.remove(pick_idx).clone());
        }

        // Exhausted unique combos but still short: repeat deterministically
        // from the full set rather than leaving the run under-covered.
        while selected.len() < min_test_cases && !all_combos.is_empty() {
            let pick_idx = rng.random_range(0..all_combos.len());
            selected.push(all_combos[pick_idx].clone());
        }
    }

    selected
        .into_iter()
        .map(|combo| VariationCombination {
            parameter_variation_axes: variation_axes_for(&combo, &axes),
            parameters: combo,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_meets_minimum_even_when_pairwise_cover_is_smaller() {
        let combos = route(Case::SupportBot, 50, 7);
        assert!(combos.len() >= 50);
    }

    #[test]
    fn every_combination_has_2_to_3_variation_axes() {
        let combos = route(Case::OperatorQuality, 10, 1);
        for c in &combos {
            assert!(
                (2..=3).contains(&c.parameter_variation_axes.len()),
                "got {} axes",
                c.parameter_variation_axes.len()
            );
        }
    }

    #[test]
    fn same_seed_produces_same_padding_order() {
        let a = route(Case::SupportBot, 20, 42);
        let b = route(Case::SupportBot, 20, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn pairwise_cover_covers_all_axis_value_pairs() {
        let axes = axes_for_case(Case::SupportBot);
        let selected = greedy_pairwise_cover(&axes);
        let mut covered = std::collections::HashSet::new();
        for combo in &selected {
            for pair in pairs_covered(combo, &axes) {
                covered.insert(pair);
            }
        }
        let mut expected = std::collections::HashSet::new();
        for combo in enumerate_all(&axes) {
            for pair in pairs_covered(&combo, &axes) {
                expected.insert(pair);
            }
        }
        assert_eq!(covered, expected);
    }
}
