//! Greedy set-cover minimization of the discovered suite.

use std::collections::BTreeSet;

use tessera_factors::{pairs_in_row, Pair, Row};

#[derive(Debug, thiserror::Error)]
pub enum MinimizeError {
    /// Some feasible pair is not covered by any discovered row. By
    /// construction every feasible pair was retired by an accepted row,
    /// so reaching this is a bookkeeping bug upstream.
    #[error("{0} feasible pair(s) not covered by any discovered row")]
    UncoveredPairs(usize),
}

/// Select a covering subset of `rows` over `feasible`, greedily taking
/// the row with the largest number of still-uncovered pairs. Ties go to
/// the earliest row, so the result is deterministic for a fixed
/// discovery order. Returns indices into `rows` in selection order.
pub fn greedy_minimize(
    rows: &[&Row],
    feasible: &BTreeSet<Pair>,
) -> Result<Vec<usize>, MinimizeError> {
    let row_pairs: Vec<BTreeSet<Pair>> = rows.iter().map(|r| pairs_in_row(r)).collect();

    let mut uncovered = feasible.clone();
    let mut selected = Vec::new();
    let mut taken = vec![false; rows.len()];

    while !uncovered.is_empty() {
        let mut best: Option<(usize, usize)> = None;
        for (idx, pairs) in row_pairs.iter().enumerate() {
            if taken[idx] {
                continue;
            }
            let gain = pairs.intersection(&uncovered).count();
            // Strictly greater, so the first row found wins ties.
            if gain > 0 && best.map_or(true, |(g, _)| gain > g) {
                best = Some((gain, idx));
            }
        }
        let (_, idx) = best.ok_or(MinimizeError::UncoveredPairs(uncovered.len()))?;
        taken[idx] = true;
        selected.push(idx);
        for pair in &row_pairs[idx] {
            uncovered.remove(pair);
        }
    }
    Ok(selected)
}
