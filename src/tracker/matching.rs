//! Cost matrices and linear assignment for frame-to-frame linking.

use ndarray::Array2;

use crate::tracker::spot::Spot;

/// Alternative (birth/death) cost relative to the largest feasible link cost.
const ALTERNATIVE_COST_FACTOR: f64 = 1.05;

/// Relative size of the index tie-break perturbation.
const TIE_BREAK_SCALE: f64 = 1e-6;

/// Squared-distance cost matrix between two spot sets.
///
/// Pairs farther apart than `max_distance` are infeasible (`f64::INFINITY`).
pub fn distance_costs(sources: &[&Spot], targets: &[&Spot], max_distance: f64) -> Array2<f64> {
    let max_sq = max_distance * max_distance;
    let mut costs = Array2::from_elem((sources.len(), targets.len()), f64::INFINITY);
    for (i, s) in sources.iter().enumerate() {
        for (j, t) in targets.iter().enumerate() {
            let d2 = s.squared_distance(t);
            if d2 <= max_sq {
                costs[[i, j]] = d2;
            }
        }
    }
    costs
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_sources: Vec<usize>,
    pub unmatched_targets: Vec<usize>,
}

impl AssignmentResult {
    fn unmatched(num_rows: usize, num_cols: usize) -> Self {
        Self {
            matches: vec![],
            unmatched_sources: (0..num_rows).collect(),
            unmatched_targets: (0..num_cols).collect(),
        }
    }
}

/// Minimum-cost assignment over the finite entries of `cost_matrix`.
///
/// Solved with Jonker-Volgenant on the square LAP block matrix
///
/// ```text
/// | links        | death (diag) |
/// | birth (diag) | links^T      |
/// ```
///
/// so that any row or column may stay unassigned at the alternative cost.
/// Among equal-cost solutions, smaller source indices pair with smaller
/// target indices. The tie-break never trades away cost: the perturbed
/// solution is only kept when it is as cheap as the unperturbed one.
pub fn linear_assignment(cost_matrix: &Array2<f64>) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    let max_cost = cost_matrix
        .iter()
        .copied()
        .filter(|c| c.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if num_rows == 0 || num_cols == 0 || !max_cost.is_finite() {
        return AssignmentResult::unmatched(num_rows, num_cols);
    }

    let alternative = if max_cost > 0.0 {
        ALTERNATIVE_COST_FACTOR * max_cost
    } else {
        1.0
    };
    let size = num_rows + num_cols;
    let cells = (num_rows * num_cols) as f64;
    let blocked = 2.0 * (size as f64 + 1.0) * alternative + 1.0;

    // Total perturbation of any assignment stays below half the smallest gap
    let gap = min_cost_gap(cost_matrix, alternative).unwrap_or(alternative);
    let epsilon = (TIE_BREAK_SCALE * alternative).min(gap / (2.0 * size as f64)) / cells;
    let tie_break = |i: usize, j: usize| epsilon * (num_rows * num_cols - i * j) as f64;

    let mut padded = Array2::<f64>::from_elem((size, size), blocked);
    for i in 0..num_rows {
        for j in 0..num_cols {
            let cost = cost_matrix[[i, j]];
            if cost.is_finite() {
                padded[[i, j]] = cost;
                padded[[num_rows + j, num_cols + i]] = cost;
            }
        }
        padded[[i, num_cols + i]] = alternative;
    }
    for j in 0..num_cols {
        padded[[num_rows + j, j]] = alternative;
    }

    let mut perturbed = padded.clone();
    for i in 0..num_rows {
        for j in 0..num_cols {
            if cost_matrix[[i, j]].is_finite() {
                perturbed[[i, j]] += tie_break(i, j);
                perturbed[[num_rows + j, num_cols + i]] += tie_break(i, j);
            }
        }
    }

    let Some(tie_broken) = solve(&perturbed) else {
        return AssignmentResult::unmatched(num_rows, num_cols);
    };
    let tolerance = f64::EPSILON * size as f64 * blocked;
    let row_to_col = match solve(&padded) {
        Some(exact)
            if total_cost(&padded, &exact) + tolerance < total_cost(&padded, &tie_broken) =>
        {
            exact
        }
        _ => tie_broken,
    };

    let mut matches = vec![];
    let mut unmatched_sources = vec![];
    let mut target_matched = vec![false; num_cols];
    for (row_idx, &col_idx) in row_to_col.iter().take(num_rows).enumerate() {
        if col_idx < num_cols && cost_matrix[[row_idx, col_idx]].is_finite() {
            matches.push((row_idx, col_idx));
            target_matched[col_idx] = true;
        } else {
            unmatched_sources.push(row_idx);
        }
    }

    let unmatched_targets = target_matched
        .iter()
        .enumerate()
        .filter_map(|(j, &m)| if m { None } else { Some(j) })
        .collect();

    AssignmentResult {
        matches,
        unmatched_sources,
        unmatched_targets,
    }
}

fn solve(matrix: &Array2<f64>) -> Option<Vec<usize>> {
    match lapjv::lapjv(matrix) {
        Ok((row_to_col, _)) => Some(row_to_col),
        Err(e) => {
            tracing::warn!("linear assignment failed, treating all as unmatched: {:?}", e);
            None
        }
    }
}

fn total_cost(matrix: &Array2<f64>, row_to_col: &[usize]) -> f64 {
    row_to_col
        .iter()
        .enumerate()
        .map(|(row, &col)| matrix[[row, col]])
        .sum()
}

/// Smallest positive difference between distinct finite costs and the
/// alternative cost; `None` when they are all equal.
fn min_cost_gap(cost_matrix: &Array2<f64>, alternative: f64) -> Option<f64> {
    let mut values: Vec<f64> = cost_matrix
        .iter()
        .copied()
        .filter(|c| c.is_finite())
        .chain(std::iter::once(alternative))
        .collect();
    values.sort_by(f64::total_cmp);
    values
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&d| d > 0.0)
        .reduce(f64::min)
}
