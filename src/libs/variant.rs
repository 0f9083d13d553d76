use crate::libs::error::{AnnotateError, Result};
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use std::io::{BufRead, Read};
use std::str::FromStr;
use tracing::{debug, warn};

lazy_static! {
    static ref RE_VARIANT: Regex = Regex::new(r"^([A-Z])(\d+)([A-Z])$").unwrap();
}

/// Column holding the substitution code, e.g. `M1A`.
pub const COL_VARIANT: &str = "protein_variant";
/// Column holding the pathogenicity score.
pub const COL_SCORE: &str = "am_pathogenicity";

/// One observed amino-acid substitution with its pathogenicity score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantScore {
    /// 1-based position in the reference sequence
    pub position: usize,
    pub ref_aa: char,
    pub alt_aa: char,
    /// Pathogenicity in [0, 1]
    pub score: f64,
}

/// A parsed substitution code, `<RefAA><digits><AltAA>`.
///
/// ```
/// use am2pdb::libs::variant::ProteinVariant;
/// let v: ProteinVariant = "V600E".parse().unwrap();
/// assert_eq!(v.position, 600);
/// assert_eq!(v.ref_aa, 'V');
/// assert_eq!(v.alt_aa, 'E');
///
/// assert!("V0E".parse::<ProteinVariant>().is_err());
/// assert!("600E".parse::<ProteinVariant>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProteinVariant {
    pub position: usize,
    pub ref_aa: char,
    pub alt_aa: char,
}

impl FromStr for ProteinVariant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let caps = RE_VARIANT
            .captures(s.trim())
            .ok_or_else(|| format!("invalid variant code '{}'", s))?;

        let position = caps[2]
            .parse::<usize>()
            .map_err(|e| format!("invalid position in '{}': {}", s, e))?;
        if position == 0 {
            return Err(format!("position 0 in '{}', positions are 1-based", s));
        }

        // The regex guarantees single ASCII letters
        let ref_aa = caps[1].chars().next().unwrap_or('X');
        let alt_aa = caps[3].chars().next().unwrap_or('X');

        Ok(Self {
            position,
            ref_aa,
            alt_aa,
        })
    }
}

/// Parsed variant rows plus the rows that had to be dropped.
#[derive(Debug, Default)]
pub struct VariantTable {
    pub variants: Vec<VariantScore>,
    pub dropped: Vec<AnnotateError>,
}

impl VariantTable {
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// Reads an AlphaMissense table.
///
/// Both the per-protein CSV (`protein_variant,am_pathogenicity,am_class`) and
/// the genome-wide TSV are accepted; columns are located by header name, fields
/// may be quoted and `#` lines are skipped. Malformed rows are dropped with a
/// warning.
pub fn read_variants<R: BufRead>(mut reader: R) -> Result<VariantTable> {
    // Leading comments are consumed here so the header decides the delimiter
    let mut skipped = 0u64;
    let mut header = String::new();
    loop {
        header.clear();
        if reader.read_line(&mut header)? == 0 {
            return Err(AnnotateError::Input(
                "variant table has no header line".to_string(),
            ));
        }
        let trimmed = header.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            skipped += 1;
        } else {
            break;
        }
    }
    let delimiter = if header.contains('\t') { b'\t' } else { b',' };

    let mut tsv_rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(std::io::Cursor::new(header.into_bytes()).chain(reader));

    let headers = tsv_rdr.headers()?.clone();
    let col_variant = headers.iter().position(|f| f == COL_VARIANT);
    let col_score = headers.iter().position(|f| f == COL_SCORE);
    let (col_variant, col_score) = match (col_variant, col_score) {
        (Some(v), Some(s)) => (v, s),
        _ => {
            return Err(AnnotateError::Input(format!(
                "variant table header lacks '{}' and '{}' columns: {}",
                COL_VARIANT,
                COL_SCORE,
                headers.iter().join(",")
            )))
        }
    };

    let mut table = VariantTable::default();
    for result in tsv_rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                let line_no = err.position().map_or(0, |p| p.line()) + skipped;
                warn!("Dropping variant row {}: {}", line_no, err);
                table.dropped.push(AnnotateError::MalformedRecord {
                    line: line_no as usize,
                    message: err.to_string(),
                });
                continue;
            }
        };
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }

        let line_no = record.position().map_or(0, |p| p.line()) + skipped;
        match parse_record(&record, col_variant, col_score) {
            Ok(v) => table.variants.push(v),
            Err(message) => {
                warn!("Dropping variant row {}: {}", line_no, message);
                table.dropped.push(AnnotateError::MalformedRecord {
                    line: line_no as usize,
                    message,
                });
            }
        }
    }

    debug!(
        "Read {} variant rows, dropped {}",
        table.variants.len(),
        table.dropped.len()
    );

    Ok(table)
}

fn parse_record(
    record: &csv::StringRecord,
    col_variant: usize,
    col_score: usize,
) -> std::result::Result<VariantScore, String> {
    let code = record
        .get(col_variant)
        .ok_or_else(|| format!("missing column {}", COL_VARIANT))?;
    let variant: ProteinVariant = code.parse()?;

    let raw = record
        .get(col_score)
        .ok_or_else(|| format!("missing column {}", COL_SCORE))?;
    let score = raw
        .parse::<f64>()
        .map_err(|_| format!("invalid score '{}'", raw))?;
    if !(0.0..=1.0).contains(&score) {
        return Err(format!("score {} outside [0, 1]", score));
    }

    Ok(VariantScore {
        position: variant.position,
        ref_aa: variant.ref_aa,
        alt_aa: variant.alt_aa,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    fn read(text: &str) -> Result<VariantTable> {
        read_variants(BufReader::new(text.as_bytes()))
    }

    #[test]
    fn test_read_csv() {
        let table = read(
            "protein_variant,am_pathogenicity,am_class\n\
             M1A,0.3127,likely_benign\n\
             M1C,0.9,likely_pathogenic\n\
             K2E,0.05,likely_benign\n",
        )
        .unwrap();

        assert_eq!(table.variants.len(), 3);
        assert!(table.dropped.is_empty());
        assert_eq!(
            table.variants[0],
            VariantScore {
                position: 1,
                ref_aa: 'M',
                alt_aa: 'A',
                score: 0.3127
            }
        );
        assert_eq!(table.variants[2].position, 2);
    }

    #[test]
    fn test_read_tsv_with_comments() {
        let table = read(
            "# Copyright 2023 DeepMind\n\
             uniprot_id\tprotein_variant\tam_pathogenicity\tam_class\n\
             P04637\tV10I\t0.2\tlikely_benign\n",
        )
        .unwrap();

        assert_eq!(table.variants.len(), 1);
        assert_eq!(table.variants[0].position, 10);
        assert_eq!(table.variants[0].alt_aa, 'I');
    }

    #[test]
    fn test_malformed_rows_dropped() {
        let table = read(
            "protein_variant,am_pathogenicity\n\
             M1A,0.5\n\
             M?A,0.5\n\
             K2E,high\n\
             K2D,1.5\n\
             K0D,0.1\n\
             K2\n\
             L3P,0.25\n",
        )
        .unwrap();

        assert_eq!(table.variants.len(), 2);
        assert_eq!(table.dropped.len(), 5);
        assert!(matches!(
            table.dropped[0],
            AnnotateError::MalformedRecord { line: 3, .. }
        ));
    }

    #[test]
    fn test_header_required() {
        assert!(matches!(
            read("variant,score\nM1A,0.5\n"),
            Err(AnnotateError::Input(_))
        ));
        assert!(matches!(read(""), Err(AnnotateError::Input(_))));
    }

    #[test]
    fn test_quoted_fields() {
        let table = read(
            "\"protein_variant\",\"am_pathogenicity\",\"am_class\"\n\
             \"M1A\",0.5,likely_benign\n\
             \"K2E\",\"0.25\",\"likely, benign\"\n",
        )
        .unwrap();

        assert!(table.dropped.is_empty());
        assert_eq!(table.variants.len(), 2);
        assert_eq!(table.variants[0].position, 1);
        assert_eq!(table.variants[1].alt_aa, 'E');
        assert_eq!(table.variants[1].score, 0.25);
    }

    #[test]
    fn test_comments_between_rows() {
        let table = read(
            "protein_variant,am_pathogenicity\n\
             M1A,0.5\n\
             # interim comment\n\
             \n\
             L3P,0.25\n\
             L3Q,nan\n",
        )
        .unwrap();

        assert_eq!(table.variants.len(), 2);
        assert_eq!(table.variants[1].position, 3);
        // NaN is not a score in [0, 1]
        assert_eq!(table.dropped.len(), 1);
    }

    #[test]
    fn test_header_only() {
        let table = read("protein_variant,am_pathogenicity,am_class\n").unwrap();
        assert!(table.is_empty());
    }
}
