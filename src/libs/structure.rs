//! Fixed-column PDB records and the chain/residue hierarchy built from them.
//!
//! Only the columns needed here are interpreted:
//!
//! ```text
//! 1-6    record name   ATOM / HETATM
//! 13-16  atom name
//! 18-20  residue name
//! 22     chain identifier
//! 23-26  residue sequence number
//! 27     insertion code
//! 61-66  temperature factor, reused as the annotation slot
//! ```
//!
//! Every other byte of every line is kept as read and written back unchanged.

use crate::libs::error::{AnnotateError, Result};
use crate::libs::sequence::three_to_one;
use crate::libs::transfer::AnnotationArray;
use indexmap::IndexMap;
use std::fmt;
use std::io::{BufRead, Write};
use tracing::warn;

/// 0-based byte range of the annotation slot (columns 61-66).
const SLOT: std::ops::Range<usize> = 60..66;

/// Residue identifier within a chain: sequence number plus insertion code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueId {
    pub seq: i32,
    pub icode: Option<char>,
}

impl ResidueId {
    pub fn new(seq: i32, icode: Option<char>) -> Self {
        Self { seq, icode }
    }
}

impl fmt::Display for ResidueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.icode {
            Some(c) => write!(f, "{}{}", self.seq, c),
            None => write!(f, "{}", self.seq),
        }
    }
}

/// The fields of an `ATOM`/`HETATM` line used for grouping atoms into residues.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub hetero: bool,
    pub name: String,
    pub res_name: String,
    pub chain_id: String,
    pub res_id: ResidueId,
    pub b_factor: Option<f64>,
}

/// Whether `line` is an atom record carrying an annotation slot.
pub fn is_atom_line(line: &str) -> bool {
    line.starts_with("ATOM") || line.starts_with("HETATM")
}

impl AtomRecord {
    /// Parses the fixed columns of an atom line.
    ///
    /// ```
    /// use am2pdb::libs::structure::AtomRecord;
    /// let line = "ATOM      2  CA  MET A 101A     11.104   6.134  -6.504  1.00 87.50           C";
    /// let atom = AtomRecord::parse(line).unwrap();
    /// assert_eq!(atom.res_name, "MET");
    /// assert_eq!(atom.chain_id, "A");
    /// assert_eq!(atom.res_id.to_string(), "101A");
    /// assert_eq!(atom.b_factor, Some(87.5));
    /// ```
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        if !is_atom_line(line) {
            return Err("not an ATOM/HETATM record".to_string());
        }
        let field = |range: std::ops::Range<usize>| -> &str {
            line.get(range.start..range.end.min(line.len()))
                .unwrap_or("")
        };

        let seq_text = field(22..26).trim();
        let seq = seq_text
            .parse::<i32>()
            .map_err(|_| format!("invalid residue number '{}'", seq_text))?;
        let icode = field(26..27).chars().next().filter(|c| !c.is_whitespace());

        Ok(Self {
            hetero: line.starts_with("HETATM"),
            name: field(12..16).trim().to_string(),
            res_name: field(17..20).trim().to_string(),
            chain_id: field(21..22).to_string(),
            res_id: ResidueId::new(seq, icode),
            b_factor: field(SLOT).trim().parse::<f64>().ok(),
        })
    }
}

/// Whether `value` prints into the 6-column slot with two decimals,
/// i.e. lies within -99.99..=999.99.
///
/// ```
/// use am2pdb::libs::structure::fits_slot;
/// assert!(fits_slot(-1.0));
/// assert!(fits_slot(999.99));
/// assert!(!fits_slot(-100.0));
/// assert!(!fits_slot(f64::NAN));
/// ```
pub fn fits_slot(value: f64) -> bool {
    value.is_finite() && format!("{:.2}", value).len() <= SLOT.len()
}

/// The slot can be replaced without splitting a multi-byte character.
fn slot_editable(line: &str) -> bool {
    line.is_char_boundary(SLOT.start.min(line.len()))
        && line.is_char_boundary(SLOT.end.min(line.len()))
}

/// Rewrites the annotation slot of an atom line, leaving all other bytes as they are.
///
/// A line whose slot boundaries fall inside a multi-byte character is returned
/// unchanged.
///
/// ```
/// use am2pdb::libs::structure::rewrite_slot;
/// let line = "ATOM      1  N   MET A   1      11.104   6.134  -6.504  1.00 87.50           N";
/// let out = rewrite_slot(line, 0.456).unwrap();
/// assert_eq!(&out[60..66], "  0.46");
/// assert_eq!(&out[..60], &line[..60]);
/// assert_eq!(&out[66..], &line[66..]);
///
/// assert!(rewrite_slot(line, -100.0).is_err());
/// ```
pub fn rewrite_slot(line: &str, value: f64) -> Result<String> {
    if !fits_slot(value) {
        return Err(AnnotateError::SlotOverflow(value));
    }
    if !slot_editable(line) {
        return Ok(line.to_string());
    }

    let mut out = String::with_capacity(line.len().max(SLOT.end));
    let head = &line[..SLOT.start.min(line.len())];
    out.push_str(head);
    for _ in head.len()..SLOT.start {
        out.push(' ');
    }
    out.push_str(&format!("{:>6.2}", value));
    if line.len() > SLOT.end {
        out.push_str(&line[SLOT.end..]);
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub id: ResidueId,
    pub name: String,
    pub hetero: bool,
    /// Line indices of the residue's atoms
    pub atoms: Vec<usize>,
    has_ca: bool,
    ca_b_factor: Option<f64>,
    first_b_factor: Option<f64>,
}

impl Residue {
    /// One-letter code for standard residues: an `ATOM` residue with one of the
    /// 20 standard names and a `CA` atom.
    pub fn one_letter(&self) -> Option<u8> {
        if self.hetero || !self.has_ca {
            return None;
        }
        three_to_one(&self.name)
    }

    /// B-factor of the `CA` atom, or of the first atom without one.
    pub fn b_factor(&self) -> Option<f64> {
        self.ca_b_factor.or(self.first_b_factor)
    }
}

/// Standard residues of a chain as a sequence, each symbol carrying its residue id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureSequence {
    pub symbols: Vec<u8>,
    pub residues: Vec<ResidueId>,
}

impl StructureSequence {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn as_str(&self) -> String {
        String::from_utf8_lossy(&self.symbols).to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub id: String,
    /// All residues in file order
    pub residues: Vec<Residue>,
}

impl Chain {
    pub fn residue_ids(&self) -> Vec<ResidueId> {
        self.residues.iter().map(|r| r.id).collect()
    }

    /// The sequence handed to the aligner, derived from the same residue list
    /// that receives the annotations.
    pub fn sequence(&self) -> StructureSequence {
        let mut seq = StructureSequence::default();
        for residue in &self.residues {
            if let Some(code) = residue.one_letter() {
                seq.symbols.push(code);
                seq.residues.push(residue.id);
            }
        }
        seq
    }
}

/// A PDB file held as its lines, the residue hierarchy of its first model, and
/// one annotation slot per atom line.
#[derive(Debug)]
pub struct Structure {
    lines: Vec<String>,
    chains: IndexMap<String, Chain>,
    /// `None` keeps the line's original value
    slots: Vec<Option<f64>>,
    /// Atom lines skipped because of unreadable fields
    pub malformed: Vec<AnnotateError>,
}

impl Structure {
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = Vec::new();
        for line in reader.lines() {
            lines.push(line?);
        }
        Ok(Self::from_lines(lines))
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        let mut chains: IndexMap<String, Chain> = IndexMap::new();
        let mut index_of: IndexMap<(String, ResidueId), usize> = IndexMap::new();
        let mut malformed = Vec::new();
        let mut model = 0usize;
        let mut seen_model = false;

        for (idx, line) in lines.iter().enumerate() {
            if line.starts_with("MODEL") {
                if seen_model {
                    model += 1;
                }
                seen_model = true;
                continue;
            }
            if !is_atom_line(line) || model > 0 {
                continue;
            }
            if !slot_editable(line) {
                warn!("Skipping atom record at line {}: B-factor columns split a character", idx + 1);
                malformed.push(AnnotateError::MalformedRecord {
                    line: idx + 1,
                    message: "B-factor columns split a multi-byte character".to_string(),
                });
                continue;
            }

            let atom = match AtomRecord::parse(line) {
                Ok(atom) => atom,
                Err(message) => {
                    warn!("Skipping atom record at line {}: {}", idx + 1, message);
                    malformed.push(AnnotateError::MalformedRecord {
                        line: idx + 1,
                        message,
                    });
                    continue;
                }
            };

            let chain = chains
                .entry(atom.chain_id.clone())
                .or_insert_with(|| Chain {
                    id: atom.chain_id.clone(),
                    residues: vec![],
                });
            let key = (atom.chain_id.clone(), atom.res_id);
            let pos = *index_of.entry(key).or_insert_with(|| {
                chain.residues.push(Residue {
                    id: atom.res_id,
                    name: atom.res_name.clone(),
                    hetero: atom.hetero,
                    atoms: vec![],
                    has_ca: false,
                    ca_b_factor: None,
                    first_b_factor: None,
                });
                chain.residues.len() - 1
            });

            let residue = &mut chain.residues[pos];
            residue.atoms.push(idx);
            if residue.first_b_factor.is_none() {
                residue.first_b_factor = atom.b_factor;
            }
            if atom.name == "CA" && !residue.has_ca {
                residue.has_ca = true;
                residue.ca_b_factor = atom.b_factor;
            }
        }

        let slots = vec![None; lines.len()];
        Self {
            lines,
            chains,
            slots,
            malformed,
        }
    }

    /// Chain identifiers of the first model, in file order.
    pub fn chain_ids(&self) -> Vec<String> {
        self.chains.keys().cloned().collect()
    }

    pub fn chain(&self, id: &str) -> Option<&Chain> {
        self.chains.get(id)
    }

    pub fn chains(&self) -> impl Iterator<Item = &Chain> {
        self.chains.values()
    }

    /// Sets every annotation slot of every model to `sentinel`.
    pub fn reset_annotations(&mut self, sentinel: f64) {
        for (slot, line) in self.slots.iter_mut().zip(self.lines.iter()) {
            if is_atom_line(line) && slot_editable(line) {
                *slot = Some(sentinel);
            }
        }
    }

    /// Writes each residue's value into all of its atoms.
    pub fn apply_annotation(&mut self, annotation: &AnnotationArray) -> Result<()> {
        let chain = self.chains.get(&annotation.chain_id).ok_or_else(|| {
            AnnotateError::Input(format!("chain {} not in structure", annotation.chain_id))
        })?;
        if chain.residues.len() != annotation.values.len() {
            return Err(AnnotateError::Input(format!(
                "chain {} has {} residues but {} annotations",
                annotation.chain_id,
                chain.residues.len(),
                annotation.values.len()
            )));
        }

        for (residue, &value) in chain.residues.iter().zip(annotation.values.iter()) {
            for &line in &residue.atoms {
                self.slots[line] = Some(value);
            }
        }
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for (line, slot) in self.lines.iter().zip(self.slots.iter()) {
            match slot {
                Some(value) => writeln!(writer, "{}", rewrite_slot(line, *value)?)?,
                None => writeln!(writer, "{}", line)?,
            }
        }
        Ok(())
    }
}
