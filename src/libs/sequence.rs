use crate::libs::error::{AnnotateError, Result};
use std::io::BufRead;

/// Symbol used for residues outside the 20 standard amino acids.
pub const UNKNOWN_AA: u8 = b'X';

/// One-letter codes of the 20 standard amino acids.
pub const STANDARD_AA: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

/// Maps a three-letter residue name to its one-letter code.
/// Only the 20 standard amino acids are recognised.
///
/// ```
/// use am2pdb::libs::sequence::three_to_one;
/// assert_eq!(three_to_one("TRP"), Some(b'W'));
/// assert_eq!(three_to_one("hoh"), None);
/// assert_eq!(three_to_one("MSE"), None);
/// ```
pub fn three_to_one(name: &str) -> Option<u8> {
    let code = match name.trim().to_ascii_uppercase().as_str() {
        "ALA" => b'A',
        "ARG" => b'R',
        "ASN" => b'N',
        "ASP" => b'D',
        "CYS" => b'C',
        "GLN" => b'Q',
        "GLU" => b'E',
        "GLY" => b'G',
        "HIS" => b'H',
        "ILE" => b'I',
        "LEU" => b'L',
        "LYS" => b'K',
        "MET" => b'M',
        "PHE" => b'F',
        "PRO" => b'P',
        "SER" => b'S',
        "THR" => b'T',
        "TRP" => b'W',
        "TYR" => b'Y',
        "VAL" => b'V',
        _ => return None,
    };
    Some(code)
}

/// Uppercases `b` and folds everything outside the standard alphabet into `X`.
pub fn normalize_aa(b: u8) -> u8 {
    let up = b.to_ascii_uppercase();
    if STANDARD_AA.contains(&up) {
        up
    } else {
        UNKNOWN_AA
    }
}

/// The canonical protein sequence that variant positions refer to.
///
/// Positions are 1-based in the public API; the aligner works on the raw
/// 0-based bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSequence {
    name: String,
    residues: Vec<u8>,
}

impl ReferenceSequence {
    pub fn new(name: &str, seq: &[u8]) -> Result<Self> {
        let residues: Vec<u8> = seq
            .iter()
            .filter(|b| !b.is_ascii_whitespace() && **b != b'*')
            .map(|&b| normalize_aa(b))
            .collect();
        if residues.is_empty() {
            return Err(AnnotateError::Input(format!(
                "reference sequence {} is empty",
                name
            )));
        }

        Ok(Self {
            name: name.to_string(),
            residues,
        })
    }

    /// Reads the first record of a FASTA stream.
    pub fn from_fasta<R: BufRead>(reader: R) -> Result<Self> {
        let mut fa_in = noodles_fasta::io::Reader::new(reader);

        match fa_in.records().next() {
            Some(result) => {
                let record = result?;
                let name = String::from_utf8_lossy(record.name().as_ref()).to_string();
                Self::new(&name, record.sequence().as_ref())
            }
            None => Err(AnnotateError::Input(
                "no FASTA record found for the reference".to_string(),
            )),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Residue at a 1-based position.
    pub fn get(&self, position: usize) -> Option<u8> {
        if position == 0 {
            return None;
        }
        self.residues.get(position - 1).copied()
    }
}
