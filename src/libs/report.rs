//! Plain-text alignment evidence, one section per chain.
//!
//! ```text
//! ## Chain A
//! Residues: 40 (standard 39)
//! Score: 29
//! Reference: 1-40
//! Structure: 1-39
//! Mapped: 39 (100.0%)
//! Blocks: 0..15:0..15 16..40:15..39
//!
//! R      1 MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQAPILSRV
//!          ||||||||||||||| ||||||||||||||||||||||||
//! S      1 MKTAYIAKQRQISFV-SHFSRQLEERLGLIEVQAPILSRV
//! ```
//!
//! Ranges on the `Reference`/`Structure` lines are 1-based and inclusive;
//! the block list keeps the aligner's 0-based half-open coordinates.

use crate::libs::align::Alignment;
use crate::libs::pipeline::ChainAnnotation;
use crate::libs::sequence::ReferenceSequence;
use itertools::Itertools;
use std::io::Write;

/// Alignment columns per row.
pub const LINE_WIDTH: usize = 60;

pub fn write_header<W: Write>(writer: &mut W, reference: &ReferenceSequence) -> std::io::Result<()> {
    writeln!(writer, "# am2pdb alignment report")?;
    writeln!(
        writer,
        "# Reference: {} (len {})",
        reference.name(),
        reference.len()
    )?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_chain<W: Write>(writer: &mut W, result: &ChainAnnotation) -> std::io::Result<()> {
    let aln = &result.alignment;

    writeln!(writer, "## Chain {}", result.chain_id)?;
    writeln!(
        writer,
        "Residues: {} (standard {})",
        result.annotation.len(),
        result.sequence.len()
    )?;

    if aln.is_degenerate() {
        writeln!(writer, "Score: 0")?;
        writeln!(writer, "No positive-scoring alignment")?;
        writeln!(writer)?;
        return Ok(());
    }

    writeln!(writer, "Score: {}", aln.score)?;
    writeln!(
        writer,
        "Reference: {}-{}",
        aln.reference_range.start + 1,
        aln.reference_range.end
    )?;
    writeln!(
        writer,
        "Structure: {}-{}",
        aln.query_range.start + 1,
        aln.query_range.end
    )?;
    writeln!(
        writer,
        "Mapped: {} ({:.1}%)",
        result.map.len(),
        result.coverage() * 100.0
    )?;
    writeln!(writer, "Blocks: {}", block_list(aln))?;
    writeln!(writer)?;

    for row in alignment_rows(aln) {
        writeln!(writer, "{}", row)?;
    }
    Ok(())
}

/// Writes the header and every chain section.
pub fn write_report<W: Write>(
    writer: &mut W,
    reference: &ReferenceSequence,
    results: &[ChainAnnotation],
) -> std::io::Result<()> {
    write_header(writer, reference)?;
    for result in results {
        write_chain(writer, result)?;
    }
    Ok(())
}

/// `ref_start..ref_end:query_start..query_end` for every block, space separated.
pub fn block_list(alignment: &Alignment) -> String {
    alignment
        .blocks
        .iter()
        .map(|b| {
            format!(
                "{}..{}:{}..{}",
                b.reference.start, b.reference.end, b.query.start, b.query.end
            )
        })
        .join(" ")
}

/// Midline symbol for an aligned column.
fn midline(r: char, s: char) -> char {
    if r == '-' || s == '-' {
        ' '
    } else if r == s && r != 'X' {
        '|'
    } else {
        '.'
    }
}

/// The aligned strings cut into rows of [`LINE_WIDTH`] columns, each row a
/// reference line, a match line, a structure line and a blank line. Row
/// labels give the 1-based position of the row's first residue.
pub fn alignment_rows(alignment: &Alignment) -> Vec<String> {
    let r_chars: Vec<char> = alignment.aligned_reference.chars().collect();
    let s_chars: Vec<char> = alignment.aligned_query.chars().collect();

    let mut rows = vec![];
    let mut r_pos = alignment.reference_range.start + 1;
    let mut s_pos = alignment.query_range.start + 1;

    for (r_chunk, s_chunk) in r_chars.chunks(LINE_WIDTH).zip(s_chars.chunks(LINE_WIDTH)) {
        let mid: String = r_chunk
            .iter()
            .zip(s_chunk.iter())
            .map(|(&r, &s)| midline(r, s))
            .collect();

        rows.push(format!("R {:>6} {}", r_pos, r_chunk.iter().collect::<String>()));
        rows.push(format!("{:8} {}", "", mid));
        rows.push(format!("S {:>6} {}", s_pos, s_chunk.iter().collect::<String>()));
        rows.push(String::new());

        r_pos += r_chunk.iter().filter(|&&c| c != '-').count();
        s_pos += s_chunk.iter().filter(|&&c| c != '-').count();
    }

    rows
}
