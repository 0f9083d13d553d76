use crate::libs::aggregate::AggregatedScore;
use crate::libs::mapping::ResidueMap;
use crate::libs::structure::ResidueId;

/// Value sentinel for residues without a transferred score.
pub const DEFAULT_SENTINEL: f64 = -1.0;

/// One value per residue of a chain, in residue order.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationArray {
    pub chain_id: String,
    pub residues: Vec<ResidueId>,
    pub values: Vec<f64>,
}

impl AnnotationArray {
    /// Residues that received a value other than `sentinel`.
    pub fn assigned(&self, sentinel: f64) -> usize {
        self.values.iter().filter(|&&v| v != sentinel).count()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Projects per-position scores onto the residues of a chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferEngine {
    sentinel: f64,
}

impl Default for TransferEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SENTINEL)
    }
}

impl TransferEngine {
    pub fn new(sentinel: f64) -> Self {
        Self { sentinel }
    }

    pub fn sentinel(&self) -> f64 {
        self.sentinel
    }

    /// Every residue in `residues` gets exactly one value: the score of its
    /// mapped reference position, or the sentinel when the residue is unmapped
    /// or its position has no score.
    ///
    /// ```
    /// use am2pdb::libs::aggregate::AggregatedScore;
    /// use am2pdb::libs::mapping::ResidueMap;
    /// use am2pdb::libs::structure::{ResidueId, StructureSequence};
    /// use am2pdb::libs::transfer::TransferEngine;
    ///
    /// let seq = StructureSequence {
    ///     symbols: b"MK".to_vec(),
    ///     residues: vec![ResidueId::new(1, None), ResidueId::new(2, None)],
    /// };
    /// let map = ResidueMap::by_number(&seq);
    /// let scores: AggregatedScore = vec![(2, 0.75)].into_iter().collect();
    ///
    /// let array = TransferEngine::default().transfer("A", &seq.residues, &map, &scores);
    /// assert_eq!(array.values, vec![-1.0, 0.75]);
    /// ```
    pub fn transfer(
        &self,
        chain_id: &str,
        residues: &[ResidueId],
        map: &ResidueMap,
        scores: &AggregatedScore,
    ) -> AnnotationArray {
        let values = residues
            .iter()
            .map(|r| {
                map.get(r)
                    .and_then(|position| scores.get(position))
                    .unwrap_or(self.sentinel)
            })
            .collect();

        AnnotationArray {
            chain_id: chain_id.to_string(),
            residues: residues.to_vec(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::align::{AlignmentEngine, LocalAligner};
    use crate::libs::structure::StructureSequence;

    fn ids(range: std::ops::Range<i32>) -> Vec<ResidueId> {
        range.map(|s| ResidueId::new(s, None)).collect()
    }

    #[test]
    fn test_transfer_aligned() {
        // residues 10..14 are MKVL; 14 is a ligand with no place in the sequence
        let residues = ids(10..15);
        let seq = StructureSequence {
            symbols: b"MKVL".to_vec(),
            residues: residues[..4].to_vec(),
        };
        let aln = LocalAligner::default().align(b"AMKVL", &seq.symbols).unwrap();
        let map = ResidueMap::from_blocks(&aln, &seq).unwrap();
        let scores: AggregatedScore = vec![(2, 0.1), (3, 0.2), (5, 0.4)].into_iter().collect();

        let array = TransferEngine::default().transfer("A", &residues, &map, &scores);
        assert_eq!(array.chain_id, "A");
        assert_eq!(array.residues, residues);
        // position 4 has no score
        assert_eq!(array.values, vec![0.1, 0.2, -1.0, 0.4, -1.0]);
        assert_eq!(array.assigned(-1.0), 3);
    }

    #[test]
    fn test_custom_sentinel() {
        let residues = ids(1..4);
        let engine = TransferEngine::new(-9.99);
        let array = engine.transfer("B", &residues, &ResidueMap::default(), &AggregatedScore::default());

        assert_eq!(engine.sentinel(), -9.99);
        assert_eq!(array.len(), 3);
        assert!(array.values.iter().all(|&v| v == -9.99));
        assert_eq!(array.assigned(-9.99), 0);
    }

    #[test]
    fn test_empty_chain() {
        let array = TransferEngine::default().transfer(
            "C",
            &[],
            &ResidueMap::default(),
            &AggregatedScore::default(),
        );
        assert!(array.is_empty());
    }
}
