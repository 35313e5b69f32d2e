//! Input validation patterns.
//!
//! The pattern strings are the ones offered to the form for input masking.
//! They are advisory: the query controller only enforces the codon length.
//!
//! Edit lists follow the backend grammar `<aa><position>[-]<aa...>`, e.g.
//! `K12R`, `K12RH` (either R or H) or `K12-P` (anything but P).

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::model::AMINO_ACIDS;

/// IUPAC nucleotide codes, including ambiguity codes.
pub const CODON_CHARS: &str = "[ACGTMRWSYKVHDBN]";
/// The 20 standard amino acids.
pub const AA_CHARS: &str = "[ACDEFGHIKLMNPQRSTVWY]";

/// Pattern for a full codon field.
pub fn codon_pattern() -> String {
    format!("{CODON_CHARS}{{3}}")
}

/// Pattern for an amino-acid sequence.
pub fn aa_seq_pattern() -> String {
    format!("{AA_CHARS}+")
}

/// Pattern for a single edit, e.g. `A123G`.
pub fn edit_pattern() -> String {
    format!("{AA_CHARS}[0-9]+{AA_CHARS}")
}

/// Pattern for a comma-separated edit list.
pub fn edits_pattern() -> String {
    let edit = edit_pattern();
    format!("{edit}(,{edit})*")
}

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("(?i)^(?:{pattern})$")).expect("static pattern is valid")
}

static CODON_CHAR_RE: LazyLock<Regex> = LazyLock::new(|| anchored(CODON_CHARS));
static CODON_RE: LazyLock<Regex> = LazyLock::new(|| anchored(&codon_pattern()));
static AA_CHAR_RE: LazyLock<Regex> = LazyLock::new(|| anchored(AA_CHARS));
static AA_SEQ_RE: LazyLock<Regex> = LazyLock::new(|| anchored(&aa_seq_pattern()));
static EDITS_RE: LazyLock<Regex> = LazyLock::new(|| anchored(&edits_pattern()));
static BACKEND_EDIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z])(\d+)(-?)([A-Z]+)$").expect("static pattern is valid"));

pub fn is_codon_char(c: char) -> bool {
    CODON_CHAR_RE.is_match(c.encode_utf8(&mut [0; 4]))
}

pub fn is_amino_acid(c: char) -> bool {
    AA_CHAR_RE.is_match(c.encode_utf8(&mut [0; 4]))
}

pub fn is_codon(s: &str) -> bool {
    CODON_RE.is_match(s)
}

pub fn is_aa_seq(s: &str) -> bool {
    AA_SEQ_RE.is_match(s)
}

pub fn is_edits(s: &str) -> bool {
    EDITS_RE.is_match(s)
}

/// Errors reported for an edit list.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditError {
    #[error("Invalid edit: {0}")]
    Syntax(String),

    #[error("Edit '{0}' is invalid")]
    Mismatch(String),
}

/// A point substitution in an amino-acid sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Residue expected at the position
    pub original: char,
    /// Zero-based position in the sequence
    pub position: usize,
    /// Residues allowed at the position after the edit
    pub replacements: BTreeSet<char>,
}

fn parse_edit(edit: &str) -> Result<Edit, EditError> {
    let upper = edit.trim().to_ascii_uppercase();
    let caps = BACKEND_EDIT_RE
        .captures(&upper)
        .ok_or_else(|| EditError::Syntax(edit.to_string()))?;

    let original = caps[1].chars().next().unwrap_or_default();
    let position = caps[2]
        .parse::<usize>()
        .ok()
        .and_then(|p| p.checked_sub(1))
        .ok_or_else(|| EditError::Syntax(edit.to_string()))?;
    let listed: BTreeSet<char> = caps[4].chars().collect();
    let replacements = if &caps[3] == "-" {
        AMINO_ACIDS
            .iter()
            .copied()
            .filter(|aa| !listed.contains(aa))
            .collect()
    } else {
        listed
    };

    Ok(Edit {
        original,
        position,
        replacements,
    })
}

/// Parses an edit list and checks each edit against the sequence.
///
/// Empty entries are skipped, so an empty list yields no edits.
pub fn parse_edits(edits: &str, aa_seq: &str) -> Result<Vec<Edit>, EditError> {
    let residues: Vec<char> = aa_seq.to_ascii_uppercase().chars().collect();
    edits
        .split(',')
        .filter(|e| !e.trim().is_empty())
        .map(|e| {
            let edit = parse_edit(e)?;
            if residues.get(edit.position) != Some(&edit.original) {
                return Err(EditError::Mismatch(e.trim().to_string()));
            }
            Ok(edit)
        })
        .collect()
}
