//! Interval overlap detection within one report.
//!
//! Every ordered pair `(i, j)`, `i != j`, whose closed intervals intersect is
//! reported, so an overlapping unordered pair shows up twice: once as `(i, j)`
//! and once as `(j, i)`. Pairs come out row-major (by `i`, then `j`).

use crate::exposure::DrugExposure;

/// Ordered index pairs of overlapping exposures. O(N²) in the report size.
pub fn overlapping_pairs(exposures: &[DrugExposure]) -> Vec<(usize, usize)> {
    if exposures.len() < 2 {
        return Vec::new();
    }

    let mut pairs = Vec::new();
    for (i, left) in exposures.iter().enumerate() {
        for (j, right) in exposures.iter().enumerate() {
            if i != j && left.overlaps(right) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Overlapping ordered pairs resolved to drug names.
pub fn overlapping_drug_pairs(exposures: &[DrugExposure]) -> Vec<(&str, &str)> {
    overlapping_pairs(exposures)
        .into_iter()
        .map(|(i, j)| {
            (
                exposures[i].drug_name.as_str(),
                exposures[j].drug_name.as_str(),
            )
        })
        .collect()
}
