//! Per-position aggregation of substitution scores.
//!
//! A reference position usually carries up to 19 substitutions. They are
//! reduced to a single value, the arithmetic mean rounded to 3 decimals, which
//! is what gets transferred onto the structure.

use crate::libs::sequence::STANDARD_AA;
use crate::libs::variant::VariantScore;
use std::collections::BTreeMap;

/// Mean pathogenicity per 1-based reference position. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedScore {
    scores: BTreeMap<usize, f64>,
}

impl AggregatedScore {
    pub fn get(&self, position: usize) -> Option<f64> {
        self.scores.get(&position).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// No position has a score; every residue falls back to the sentinel.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Positions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.scores.iter().map(|(&p, &s)| (p, s))
    }

    pub fn max_position(&self) -> Option<usize> {
        self.scores.keys().next_back().copied()
    }
}

impl FromIterator<(usize, f64)> for AggregatedScore {
    fn from_iter<I: IntoIterator<Item = (usize, f64)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}

/// Rounds to 3 decimal places, halves away from zero.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Groups `variants` by position and averages each group.
///
/// Scores within a group are summed in sorted order, so the result does not
/// depend on the order of the input rows.
///
/// ```
/// use am2pdb::libs::aggregate::aggregate;
/// use am2pdb::libs::variant::VariantScore;
///
/// let rows: Vec<VariantScore> = [0.2, 0.4, 0.9]
///     .iter()
///     .map(|&score| VariantScore { position: 10, ref_aa: 'L', alt_aa: 'P', score })
///     .collect();
/// let agg = aggregate(&rows);
/// assert_eq!(agg.get(10), Some(0.5));
/// assert!(aggregate(&[]).is_empty());
/// ```
pub fn aggregate(variants: &[VariantScore]) -> AggregatedScore {
    let mut groups: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for v in variants {
        groups.entry(v.position).or_default().push(v.score);
    }

    groups
        .into_iter()
        .map(|(position, mut scores)| {
            scores.sort_by(|a, b| a.total_cmp(b));
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            (position, round3(mean))
        })
        .collect()
}

/// Scores of one position, one slot per alternative amino acid in
/// [`STANDARD_AA`] order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubstitutionRow {
    pub ref_aa: char,
    pub scores: [Option<f64>; 20],
}

/// Position × alternative amino acid table of pathogenicity scores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubstitutionMatrix {
    rows: BTreeMap<usize, SubstitutionRow>,
}

impl SubstitutionMatrix {
    pub fn get(&self, position: usize) -> Option<&SubstitutionRow> {
        self.rows.get(&position)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Positions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &SubstitutionRow)> + '_ {
        self.rows.iter().map(|(&p, r)| (p, r))
    }
}

/// Pivots `variants` into a [`SubstitutionMatrix`].
///
/// Repeated (position, alternative) pairs are averaged. Alternatives outside
/// the 20 standard amino acids have no column and are left out; so is the
/// reference residue itself unless the table scores it.
pub fn substitution_matrix(variants: &[VariantScore]) -> SubstitutionMatrix {
    let mut cells: BTreeMap<(usize, usize), Vec<f64>> = BTreeMap::new();
    let mut refs: BTreeMap<usize, char> = BTreeMap::new();

    for v in variants {
        refs.entry(v.position).or_insert(v.ref_aa);
        if let Some(col) = STANDARD_AA.iter().position(|&c| c as char == v.alt_aa) {
            cells.entry((v.position, col)).or_default().push(v.score);
        }
    }

    let mut rows: BTreeMap<usize, SubstitutionRow> = refs
        .into_iter()
        .map(|(position, ref_aa)| {
            (
                position,
                SubstitutionRow {
                    ref_aa,
                    scores: [None; 20],
                },
            )
        })
        .collect();
    for ((position, col), mut scores) in cells {
        scores.sort_by(|a, b| a.total_cmp(b));
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        if let Some(row) = rows.get_mut(&position) {
            row.scores[col] = Some(mean);
        }
    }

    SubstitutionMatrix { rows }
}
