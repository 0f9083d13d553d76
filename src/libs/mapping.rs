use crate::libs::align::Alignment;
use crate::libs::error::{AnnotateError, Result};
use crate::libs::structure::{ResidueId, StructureSequence};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Structure residue → 1-based reference position.
///
/// Only residues inside an alignment block are present, and no two residues
/// share a reference position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResidueMap {
    map: IndexMap<ResidueId, usize>,
    /// Residues in the structure sequence the map was built from
    total: usize,
}

impl ResidueMap {
    /// Expands the alignment blocks into residue pairs.
    ///
    /// Block `j`-th offsets map `residues[query.start + j]` to
    /// `reference.start + j + 1`; the `+ 1` turns the aligner's 0-based index
    /// into a 1-based reference position.
    pub fn from_blocks(alignment: &Alignment, seq: &StructureSequence) -> Result<Self> {
        let mut map = IndexMap::new();
        let mut used: HashSet<usize> = HashSet::new();

        for block in &alignment.blocks {
            if block.query.end > seq.residues.len() || block.query.len() != block.reference.len() {
                return Err(AnnotateError::BlockOutOfRange {
                    start: block.query.start,
                    end: block.query.end,
                    len: seq.residues.len(),
                });
            }

            for j in 0..block.len() {
                let residue = seq.residues[block.query.start + j];
                let position = block.reference.start + j + 1;
                if !used.insert(position) || map.insert(residue, position).is_some() {
                    return Err(AnnotateError::OverlappingBlocks {
                        residue: residue.to_string(),
                        position,
                    });
                }
            }
        }

        Ok(Self {
            map,
            total: seq.len(),
        })
    }

    /// Maps residues by their own sequence number, for models already numbered
    /// like the reference. Residues with an insertion code or a number below 1
    /// are left out.
    pub fn by_number(seq: &StructureSequence) -> Self {
        let map = seq
            .residues
            .iter()
            .filter(|r| r.icode.is_none() && r.seq >= 1)
            .map(|r| (*r, r.seq as usize))
            .collect();

        Self {
            map,
            total: seq.len(),
        }
    }

    pub fn get(&self, residue: &ResidueId) -> Option<usize> {
        self.map.get(residue).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Fraction of structure-sequence residues that received a position.
    pub fn coverage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.map.len() as f64 / self.total as f64
        }
    }

    /// Pairs in block order.
    pub fn iter(&self) -> impl Iterator<Item = (&ResidueId, &usize)> {
        self.map.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::align::{AlignParams, AlignedBlock, AlignmentEngine, LocalAligner};

    fn structure_seq(symbols: &[u8], first: i32) -> StructureSequence {
        StructureSequence {
            symbols: symbols.to_vec(),
            residues: (0..symbols.len())
                .map(|i| ResidueId::new(first + i as i32, None))
                .collect(),
        }
    }

    #[test]
    fn test_identical_mapping() {
        let seq = structure_seq(b"MKVL", 1);
        let aln = LocalAligner::default().align(b"MKVL", &seq.symbols).unwrap();
        let map = ResidueMap::from_blocks(&aln, &seq).unwrap();

        assert_eq!(map.len(), 4);
        for p in 1..=4 {
            assert_eq!(map.get(&ResidueId::new(p, None)), Some(p as usize));
        }
        assert_eq!(map.coverage(), 1.0);
    }

    #[test]
    fn test_gap_and_renumbering() {
        // structure numbered from 201 with an insertion code residue
        let mut seq = structure_seq(b"MKLA", 201);
        seq.residues[2] = ResidueId::new(202, Some('A'));
        let params = AlignParams {
            gap_open: -1,
            ..Default::default()
        };
        let aln = LocalAligner::new(params).align(b"MKVLA", &seq.symbols).unwrap();
        let map = ResidueMap::from_blocks(&aln, &seq).unwrap();

        let pairs: Vec<(String, usize)> = map.iter().map(|(r, p)| (r.to_string(), *p)).collect();
        assert_eq!(
            pairs,
            vec![
                ("201".to_string(), 1),
                ("202".to_string(), 2),
                ("202A".to_string(), 4),
                ("204".to_string(), 5),
            ]
        );
        // reference position 3 has no structure residue
        assert!(map.iter().all(|(_, &p)| p != 3));
    }

    #[test]
    fn test_unmapped_outside_blocks() {
        let seq = structure_seq(b"GGGMKVLGGG", 1);
        let aln = LocalAligner::default().align(b"WMKVLW", &seq.symbols).unwrap();
        let map = ResidueMap::from_blocks(&aln, &seq).unwrap();

        assert_eq!(map.len(), 4);
        assert_eq!(map.get(&ResidueId::new(1, None)), None);
        assert_eq!(map.get(&ResidueId::new(4, None)), Some(2));
        assert_eq!(map.get(&ResidueId::new(7, None)), Some(5));
        assert_eq!(map.get(&ResidueId::new(8, None)), None);
        assert!((map.coverage() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_injective() {
        let reference = b"MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQAPILSRV";
        let seq = structure_seq(b"MKTAYIAKQRQISFVSHFSRQLEERLGGGGLIEVQAPILSRV", 1);
        let aln = LocalAligner::default().align(reference, &seq.symbols).unwrap();
        let map = ResidueMap::from_blocks(&aln, &seq).unwrap();

        let positions: HashSet<usize> = map.iter().map(|(_, &p)| p).collect();
        assert_eq!(positions.len(), map.len());
        for (residue, &position) in map.iter() {
            let idx = seq.residues.iter().position(|r| r == residue).unwrap();
            assert_eq!(seq.symbols[idx], reference[position - 1]);
        }
    }

    #[test]
    fn test_degenerate() {
        let seq = structure_seq(b"WWW", 1);
        let aln = LocalAligner::default().align(b"MKVL", &seq.symbols).unwrap();
        let map = ResidueMap::from_blocks(&aln, &seq).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.coverage(), 0.0);

        let empty = ResidueMap::from_blocks(&Alignment::default(), &StructureSequence::default()).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.coverage(), 0.0);
    }

    #[test]
    fn test_block_out_of_range() {
        let seq = structure_seq(b"MK", 1);
        let aln = Alignment {
            score: 3,
            blocks: vec![AlignedBlock {
                reference: 0..3,
                query: 0..3,
            }],
            ..Default::default()
        };
        assert!(matches!(
            ResidueMap::from_blocks(&aln, &seq),
            Err(AnnotateError::BlockOutOfRange { len: 2, .. })
        ));
    }

    #[test]
    fn test_overlapping_blocks_rejected() {
        let seq = structure_seq(b"MKVL", 1);
        let aln = Alignment {
            score: 4,
            blocks: vec![
                AlignedBlock {
                    reference: 0..2,
                    query: 0..2,
                },
                AlignedBlock {
                    reference: 1..3,
                    query: 2..4,
                },
            ],
            ..Default::default()
        };
        assert!(matches!(
            ResidueMap::from_blocks(&aln, &seq),
            Err(AnnotateError::OverlappingBlocks { position: 2, .. })
        ));
    }

    #[test]
    fn test_by_number() {
        let mut seq = structure_seq(b"MKVL", -1);
        seq.residues[3] = ResidueId::new(1, Some('B'));
        let map = ResidueMap::by_number(&seq);

        // -1, 0 and 1B are skipped
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&ResidueId::new(1, None)), Some(1));
    }
}
