//! Per-chain orchestration: structure sequence, alignment, residue map, transfer.
//!
//! The reference and the aggregated scores are built once and shared read-only;
//! chains are processed in parallel and collected in the requested order.

use crate::libs::aggregate::AggregatedScore;
use crate::libs::align::{AlignParams, Alignment, AlignmentEngine, LocalAligner};
use crate::libs::error::Result;
use crate::libs::mapping::ResidueMap;
use crate::libs::sequence::ReferenceSequence;
use crate::libs::structure::{Chain, Structure, StructureSequence};
use crate::libs::transfer::{AnnotationArray, TransferEngine, DEFAULT_SENTINEL};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Settings of one annotation run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotateConfig {
    pub align: AlignParams,
    /// Value for residues without a transferred score
    pub sentinel: f64,
    /// Chains whose mapped fraction falls below this are reported as low coverage
    pub min_coverage: f64,
    /// `None` annotates every chain of the first model
    pub chains: Option<Vec<String>>,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            align: AlignParams::default(),
            sentinel: DEFAULT_SENTINEL,
            min_coverage: 0.5,
            chains: None,
        }
    }
}

/// Everything computed for one chain.
#[derive(Debug, Clone)]
pub struct ChainAnnotation {
    pub chain_id: String,
    pub sequence: StructureSequence,
    pub alignment: Alignment,
    pub map: ResidueMap,
    pub annotation: AnnotationArray,
}

impl ChainAnnotation {
    /// No residue of the chain could be placed on the reference.
    pub fn is_degenerate(&self) -> bool {
        self.map.is_empty()
    }

    pub fn coverage(&self) -> f64 {
        self.map.coverage()
    }
}

/// Resolves the chain selection against the structure.
///
/// Requested chains that do not exist are logged and skipped; the order of the
/// request is kept.
pub fn select_chains(structure: &Structure, requested: Option<&[String]>) -> Vec<String> {
    match requested {
        None => structure.chain_ids(),
        Some(ids) => ids
            .iter()
            .filter(|id| {
                let found = structure.chain(id).is_some();
                if !found {
                    warn!("Chain {} not found in structure, skipped", id);
                }
                found
            })
            .cloned()
            .collect(),
    }
}

/// Aligns one chain against the reference and transfers the scores.
pub fn annotate_chain(
    chain: &Chain,
    reference: &ReferenceSequence,
    scores: &AggregatedScore,
    config: &AnnotateConfig,
) -> Result<ChainAnnotation> {
    let sequence = chain.sequence();

    let alignment = if sequence.is_empty() {
        warn!("Chain {}: no standard residues to align", chain.id);
        Alignment::default()
    } else {
        LocalAligner::new(config.align).align(reference.as_bytes(), &sequence.symbols)?
    };
    if alignment.is_degenerate() {
        warn!(
            "Chain {}: no positive-scoring alignment, all residues get {:.2}",
            chain.id, config.sentinel
        );
    }

    let map = ResidueMap::from_blocks(&alignment, &sequence)?;
    let result = finish(chain, sequence, alignment, map, scores, config.sentinel);

    if !result.sequence.is_empty() && result.coverage() < config.min_coverage {
        warn!(
            "Chain {}: low coverage, {} of {} residues mapped",
            chain.id,
            result.map.len(),
            result.sequence.len()
        );
    }
    Ok(result)
}

/// Annotates one chain whose residue numbers already are reference positions.
pub fn annotate_chain_by_number(
    chain: &Chain,
    scores: &AggregatedScore,
    sentinel: f64,
) -> ChainAnnotation {
    let sequence = chain.sequence();
    let map = ResidueMap::by_number(&sequence);
    finish(chain, sequence, Alignment::default(), map, scores, sentinel)
}

fn finish(
    chain: &Chain,
    sequence: StructureSequence,
    alignment: Alignment,
    map: ResidueMap,
    scores: &AggregatedScore,
    sentinel: f64,
) -> ChainAnnotation {
    let annotation =
        TransferEngine::new(sentinel).transfer(&chain.id, &chain.residue_ids(), &map, scores);

    info!(
        "Chain {}: {} residues, {} mapped, {} annotated",
        chain.id,
        annotation.len(),
        map.len(),
        annotation.assigned(sentinel)
    );
    debug!("Chain {}: {:?}", chain.id, alignment.blocks);

    ChainAnnotation {
        chain_id: chain.id.clone(),
        sequence,
        alignment,
        map,
        annotation,
    }
}

/// Runs [`annotate_chain`] over the selected chains in parallel.
pub fn annotate_structure(
    structure: &Structure,
    reference: &ReferenceSequence,
    scores: &AggregatedScore,
    config: &AnnotateConfig,
) -> Result<Vec<ChainAnnotation>> {
    let ids = select_chains(structure, config.chains.as_deref());
    ids.par_iter()
        .filter_map(|id| structure.chain(id))
        .map(|chain| annotate_chain(chain, reference, scores, config))
        .collect()
}

/// Direct-numbering counterpart of [`annotate_structure`].
pub fn annotate_structure_by_number(
    structure: &Structure,
    scores: &AggregatedScore,
    chains: Option<&[String]>,
    sentinel: f64,
) -> Vec<ChainAnnotation> {
    let ids = select_chains(structure, chains);
    ids.par_iter()
        .filter_map(|id| structure.chain(id))
        .map(|chain| annotate_chain_by_number(chain, scores, sentinel))
        .collect()
}

/// Resets every annotation slot to `sentinel`, then writes the chain results.
pub fn apply_annotations(
    structure: &mut Structure,
    results: &[ChainAnnotation],
    sentinel: f64,
) -> Result<()> {
    structure.reset_annotations(sentinel);
    for result in results {
        structure.apply_annotation(&result.annotation)?;
    }
    Ok(())
}
