//! Affine-gap local alignment (Gotoh) between a reference protein and a
//! structure-derived chain sequence.
//!
//! Three matrices are filled row by row:
//!
//! * `M` - the alignment ends with a residue pair
//! * `X` - ends with a reference residue against a gap in the query
//! * `Y` - ends with a query residue against a gap in the reference
//!
//! Only the current and previous score rows are kept. Traceback pointers for
//! all three matrices share one byte per cell.
//!
//! With the default parameters a mismatch (-100) costs far more than any gap,
//! so the optimum is in effect a set of exact-match runs joined by gaps.
//! Matched blocks are cut at every gap and every non-identical pair, which is
//! what makes a block safe for transferring per-residue scores.

use crate::libs::error::{AnnotateError, Result};
use crate::libs::sequence::{normalize_aa, UNKNOWN_AA};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignParams {
    pub match_score: i32,
    pub mismatch_score: i32,
    /// Score of the first position of a gap
    pub gap_open: i32,
    /// Score of every further position of the same gap
    pub gap_extend: i32,
}

impl Default for AlignParams {
    fn default() -> Self {
        Self {
            match_score: 1,
            mismatch_score: -100,
            gap_open: -10,
            gap_extend: -1,
        }
    }
}

/// A maximal run of identical residues, as two equal-length half-open ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedBlock {
    pub reference: Range<usize>,
    pub query: Range<usize>,
}

impl AlignedBlock {
    pub fn len(&self) -> usize {
        self.reference.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }
}

/// The optimal local alignment of a query against the reference.
///
/// All coordinates are 0-based. An alignment without blocks (score 0) means
/// no positive-scoring local alignment exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    pub score: i32,
    pub blocks: Vec<AlignedBlock>,
    /// Aligned reference residues with `-` for gaps
    pub aligned_reference: String,
    /// Aligned query residues with `-` for gaps
    pub aligned_query: String,
    /// Reference span covered by the alignment
    pub reference_range: Range<usize>,
    /// Query span covered by the alignment
    pub query_range: Range<usize>,
}

impl Alignment {
    pub fn is_degenerate(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of residue pairs inside blocks.
    pub fn matched(&self) -> usize {
        self.blocks.iter().map(|b| b.len()).sum()
    }
}

pub trait AlignmentEngine {
    fn align(&self, reference: &[u8], query: &[u8]) -> Result<Alignment>;
}

// Traceback states; 0 in a pointer field marks the start of the alignment
const START: u8 = 0;
const ST_M: u8 = 1;
const ST_X: u8 = 2;
const ST_Y: u8 = 3;

const NEG_INF: i32 = i32::MIN / 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Pair(usize, usize),
    GapInQuery(usize),
    GapInReference(usize),
}

/// Picks the best of three candidates; ties go to the earliest one.
fn pick3(m: i32, x: i32, y: i32) -> (i32, u8) {
    let mut best = (m, ST_M);
    if x > best.0 {
        best = (x, ST_X);
    }
    if y > best.0 {
        best = (y, ST_Y);
    }
    best
}

/// Identity of two residues; the unknown symbol is never identical to anything.
fn identical(a: u8, b: u8) -> bool {
    a == b && a != UNKNOWN_AA
}

#[derive(Debug, Clone, Default)]
pub struct LocalAligner {
    params: AlignParams,
}

impl LocalAligner {
    pub fn new(params: AlignParams) -> Self {
        Self { params }
    }

    fn substitution(&self, a: u8, b: u8) -> i32 {
        if identical(a, b) {
            self.params.match_score
        } else {
            self.params.mismatch_score
        }
    }

    /// Fills the matrices and returns the pointer table with the best end cell.
    ///
    /// The end cell is the first `M` cell, in row-major order, holding the
    /// highest score. A predecessor scoring 0 or less starts a new alignment.
    fn fill(&self, a: &[u8], b: &[u8]) -> (Vec<u8>, i32, usize, usize) {
        let n = a.len();
        let m = b.len();
        let width = m + 1;
        let open = self.params.gap_open;
        let extend = self.params.gap_extend;

        let mut trace = vec![0u8; (n + 1) * width];

        let mut prev_m = vec![NEG_INF; width];
        let mut prev_x = vec![NEG_INF; width];
        let mut prev_y = vec![NEG_INF; width];
        let mut cur_m = vec![NEG_INF; width];
        let mut cur_x = vec![NEG_INF; width];
        let mut cur_y = vec![NEG_INF; width];

        let mut best_score = 0;
        let mut best_i = 0;
        let mut best_j = 0;

        for i in 1..=n {
            cur_m[0] = NEG_INF;
            cur_x[0] = NEG_INF;
            cur_y[0] = NEG_INF;

            for j in 1..=m {
                // M: diagonal from (i-1, j-1), or a fresh start
                let (prev_best, from) = pick3(prev_m[j - 1], prev_x[j - 1], prev_y[j - 1]);
                let (base, m_ptr) = if prev_best > 0 {
                    (prev_best, from)
                } else {
                    (0, START)
                };
                cur_m[j] = base + self.substitution(a[i - 1], b[j - 1]);

                // X: consume a[i-1] against a gap, from (i-1, j)
                let (x, x_ptr) = pick3(
                    prev_m[j].saturating_add(open),
                    prev_x[j].saturating_add(extend),
                    prev_y[j].saturating_add(open),
                );
                cur_x[j] = x.max(NEG_INF);

                // Y: consume b[j-1] against a gap, from (i, j-1)
                let (y, y_ptr) = pick3(
                    cur_m[j - 1].saturating_add(open),
                    cur_x[j - 1].saturating_add(open),
                    cur_y[j - 1].saturating_add(extend),
                );
                cur_y[j] = y.max(NEG_INF);

                trace[i * width + j] = m_ptr | (x_ptr << 2) | (y_ptr << 4);

                if cur_m[j] > best_score {
                    best_score = cur_m[j];
                    best_i = i;
                    best_j = j;
                }
            }

            std::mem::swap(&mut prev_m, &mut cur_m);
            std::mem::swap(&mut prev_x, &mut cur_x);
            std::mem::swap(&mut prev_y, &mut cur_y);
        }

        (trace, best_score, best_i, best_j)
    }

    fn traceback(trace: &[u8], width: usize, end_i: usize, end_j: usize) -> Vec<Op> {
        let mut ops = Vec::new();
        let mut i = end_i;
        let mut j = end_j;
        let mut state = ST_M;

        loop {
            let ptr = trace[i * width + j];
            let from = match state {
                ST_M => {
                    ops.push(Op::Pair(i - 1, j - 1));
                    i -= 1;
                    j -= 1;
                    ptr & 0b11
                }
                ST_X => {
                    ops.push(Op::GapInQuery(i - 1));
                    i -= 1;
                    (ptr >> 2) & 0b11
                }
                _ => {
                    ops.push(Op::GapInReference(j - 1));
                    j -= 1;
                    (ptr >> 4) & 0b11
                }
            };
            if from == START || i == 0 || j == 0 {
                break;
            }
            state = from;
        }

        ops.reverse();
        ops
    }

    fn assemble(&self, a: &[u8], b: &[u8], score: i32, ops: &[Op]) -> Alignment {
        let mut aligned_reference = String::with_capacity(ops.len());
        let mut aligned_query = String::with_capacity(ops.len());
        let mut blocks: Vec<AlignedBlock> = Vec::new();
        // Start of the identical run being extended, if any
        let mut run: Option<(usize, usize, usize)> = None;

        let close = |run: &mut Option<(usize, usize, usize)>, blocks: &mut Vec<AlignedBlock>| {
            if let Some((rs, qs, len)) = run.take() {
                blocks.push(AlignedBlock {
                    reference: rs..rs + len,
                    query: qs..qs + len,
                });
            }
        };

        for op in ops {
            match *op {
                Op::Pair(ri, qi) => {
                    aligned_reference.push(a[ri] as char);
                    aligned_query.push(b[qi] as char);
                    if identical(a[ri], b[qi]) {
                        match run.as_mut() {
                            Some((_, _, len)) => *len += 1,
                            None => run = Some((ri, qi, 1)),
                        }
                    } else {
                        close(&mut run, &mut blocks);
                    }
                }
                Op::GapInQuery(ri) => {
                    aligned_reference.push(a[ri] as char);
                    aligned_query.push('-');
                    close(&mut run, &mut blocks);
                }
                Op::GapInReference(qi) => {
                    aligned_reference.push('-');
                    aligned_query.push(b[qi] as char);
                    close(&mut run, &mut blocks);
                }
            }
        }
        close(&mut run, &mut blocks);

        let (reference_range, query_range) = match (blocks.first(), blocks.last()) {
            (Some(first), Some(last)) => (
                first.reference.start..last.reference.end,
                first.query.start..last.query.end,
            ),
            _ => (0..0, 0..0),
        };

        Alignment {
            score,
            blocks,
            aligned_reference,
            aligned_query,
            reference_range,
            query_range,
        }
    }
}

impl AlignmentEngine for LocalAligner {
    fn align(&self, reference: &[u8], query: &[u8]) -> Result<Alignment> {
        if reference.is_empty() {
            return Err(AnnotateError::EmptySequence("reference"));
        }
        if query.is_empty() {
            return Err(AnnotateError::EmptySequence("query"));
        }

        let a: Vec<u8> = reference.iter().map(|&c| normalize_aa(c)).collect();
        let b: Vec<u8> = query.iter().map(|&c| normalize_aa(c)).collect();

        let (trace, score, end_i, end_j) = self.fill(&a, &b);
        if score <= 0 {
            return Ok(Alignment::default());
        }

        let ops = Self::traceback(&trace, b.len() + 1, end_i, end_j);
        Ok(self.assemble(&a, &b, score, &ops))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(r: Range<usize>, q: Range<usize>) -> AlignedBlock {
        AlignedBlock {
            reference: r,
            query: q,
        }
    }

    fn assert_blocks_ordered(aln: &Alignment, a: &[u8], b: &[u8]) {
        for w in aln.blocks.windows(2) {
            assert!(w[0].reference.end <= w[1].reference.start);
            assert!(w[0].query.end <= w[1].query.start);
        }
        for blk in &aln.blocks {
            assert_eq!(blk.reference.len(), blk.query.len());
            assert!(!blk.is_empty());
            assert_eq!(&a[blk.reference.clone()], &b[blk.query.clone()]);
        }
    }

    #[test]
    fn test_identical() {
        let aligner = LocalAligner::default();
        let aln = aligner.align(b"MKVL", b"MKVL").unwrap();

        assert_eq!(aln.score, 4);
        assert_eq!(aln.blocks, vec![block(0..4, 0..4)]);
        assert_eq!(aln.aligned_reference, "MKVL");
        assert_eq!(aln.aligned_query, "MKVL");
        assert_eq!(aln.matched(), 4);
    }

    #[test]
    fn test_identical_long() {
        let seq = b"MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQAPILSRV";
        let aln = LocalAligner::default().align(seq, seq).unwrap();
        assert_eq!(aln.score, seq.len() as i32);
        assert_eq!(aln.blocks, vec![block(0..40, 0..40)]);
    }

    #[test]
    fn test_deletion_short_flanks() {
        // One gap costs 10, more than either two-residue flank earns
        let aln = LocalAligner::default().align(b"MKVLA", b"MKLA").unwrap();
        assert_eq!(aln.score, 2);
        assert_eq!(aln.blocks, vec![block(0..2, 0..2)]);
    }

    #[test]
    fn test_deletion_cheap_gap() {
        let params = AlignParams {
            gap_open: -1,
            gap_extend: -1,
            ..Default::default()
        };
        let aln = LocalAligner::new(params).align(b"MKVLA", b"MKLA").unwrap();

        assert_eq!(aln.score, 3);
        assert_eq!(aln.blocks, vec![block(0..2, 0..2), block(3..5, 2..4)]);
        assert_eq!(aln.aligned_reference, "MKVLA");
        assert_eq!(aln.aligned_query, "MK-LA");
        assert_eq!(aln.reference_range, 0..5);
        assert_eq!(aln.query_range, 0..4);
    }

    #[test]
    fn test_deletion_long_flanks() {
        let reference = b"MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQAPILSRV";
        // residue 16 (K, index 15) unresolved
        let query = b"MKTAYIAKQRQISFVSHFSRQLEERLGLIEVQAPILSRV";
        let aln = LocalAligner::default().align(reference, query).unwrap();

        assert_eq!(aln.score, 39 - 10);
        assert_eq!(aln.blocks, vec![block(0..15, 0..15), block(16..40, 15..39)]);
        assert_blocks_ordered(&aln, reference, query);
    }

    #[test]
    fn test_insertion_in_query() {
        let reference = b"MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQAPILSRV";
        // two extra residues after index 19, e.g. an expression tag loop
        let query = b"MKTAYIAKQRQISFVKSHFSGGRQLEERLGLIEVQAPILSRV";
        let aln = LocalAligner::default().align(reference, query).unwrap();

        assert_eq!(aln.score, 40 - 11);
        assert_eq!(aln.blocks, vec![block(0..20, 0..20), block(20..40, 22..42)]);
        assert!(aln.aligned_reference.contains("HFS--RQ"));
    }

    #[test]
    fn test_mismatch_splits_block() {
        let params = AlignParams {
            match_score: 5,
            mismatch_score: -1,
            ..Default::default()
        };
        let aln = LocalAligner::new(params).align(b"MKVL", b"MKAL").unwrap();

        assert_eq!(aln.score, 14);
        assert_eq!(aln.blocks, vec![block(0..2, 0..2), block(3..4, 3..4)]);
        assert_eq!(aln.aligned_query, "MKAL");
    }

    #[test]
    fn test_no_alignment() {
        let aln = LocalAligner::default().align(b"WWWW", b"AAAA").unwrap();
        assert_eq!(aln.score, 0);
        assert!(aln.is_degenerate());
        assert!(aln.aligned_reference.is_empty());

        // unknown residues never match
        let aln = LocalAligner::default().align(b"XXXX", b"XBZX").unwrap();
        assert!(aln.is_degenerate());
    }

    #[test]
    fn test_empty_sequence() {
        let aligner = LocalAligner::default();
        assert!(matches!(
            aligner.align(b"", b"MKVL"),
            Err(AnnotateError::EmptySequence("reference"))
        ));
        assert!(matches!(
            aligner.align(b"MKVL", b""),
            Err(AnnotateError::EmptySequence("query"))
        ));
    }

    #[test]
    fn test_tie_first_in_row_major() {
        // "KV" occurs twice in the reference; the earlier end cell wins
        let aln = LocalAligner::default().align(b"AKVWWKVA", b"KV").unwrap();
        assert_eq!(aln.blocks, vec![block(1..3, 0..2)]);
    }

    #[test]
    fn test_lowercase_input() {
        let aln = LocalAligner::default().align(b"mkvl", b"MKVL").unwrap();
        assert_eq!(aln.blocks, vec![block(0..4, 0..4)]);
    }

    #[test]
    fn test_blocks_ordered_and_disjoint() {
        // Small LCG so the sequences are fixed across runs
        let alphabet = b"ACDEFGHIKLMNPQRSTVWY";
        let mut state: u64 = 42;
        let mut next = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            alphabet[((state >> 33) % 20) as usize]
        };

        for _ in 0..20 {
            let reference: Vec<u8> = (0..120).map(|_| next()).collect();
            // query: a window of the reference with a few residues removed
            let mut query: Vec<u8> = reference[10..110].to_vec();
            query.drain(30..33);
            query.remove(60);
            let aln = LocalAligner::default().align(&reference, &query).unwrap();

            assert!(aln.score > 0);
            assert_blocks_ordered(&aln, &reference, &query);
        }
    }
}
