//! Result formatting.
//!
//! Pure functions over a borrowed result set. The same lines feed the TUI
//! results panel and the CLI output.

use crate::model::{CodonResult, CodonUsage, QueryMode};

/// A read-only view of a result set for one query mode.
#[derive(Debug, Clone, Copy)]
pub struct ResultView<'a> {
    results: Option<&'a [CodonResult]>,
    mode: QueryMode,
}

impl<'a> ResultView<'a> {
    pub fn new(results: Option<&'a [CodonResult]>, mode: QueryMode) -> Self {
        Self { results, mode }
    }

    /// Formats codons as `"AAA (0.74), AAG (0.26)"`.
    pub fn to_string(entries: &[CodonUsage]) -> String {
        entries
            .iter()
            .map(|e| format!("{} ({:.2})", e.codon, e.probability))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Formats items as `"[a|b|c]"`.
    pub fn to_codon_string<S: AsRef<str>>(items: &[S]) -> String {
        let joined = items.iter().map(|s| s.as_ref()).collect::<Vec<&str>>().join("|");
        format!("[{joined}]")
    }

    /// Concatenates the ambiguous codons of all results, in result order.
    pub fn codon_sequence(&self) -> String {
        match self.results {
            Some(results) => results.iter().map(|r| r.ambiguous_codon.as_str()).collect(),
            None => String::new(),
        }
    }

    /// Returns true if there is a result set to show.
    pub fn has_results(&self) -> bool {
        self.results.is_some()
    }

    /// Renders the result set as display lines.
    pub fn lines(&self) -> Vec<String> {
        let Some(results) = self.results else {
            return Vec::new();
        };
        if results.is_empty() {
            return vec!["No codons found.".to_string()];
        }

        let mut lines = Vec::new();
        if self.mode == QueryMode::AaSeq {
            lines.push(format!("Codon sequence: {}", self.codon_sequence()));
            lines.push(String::new());
        }

        for result in results {
            let mut header = format!(
                "{}  {} -> {}",
                result.ambiguous_codon,
                Self::to_codon_string(&result.ambiguous_codon_nucleotides),
                Self::to_codon_string(&result.ambiguous_codon_expansion),
            );
            if let Some(score) = result.score {
                header.push_str(&format!("  score {score:.2}"));
            }
            lines.push(header);

            for aa in &result.amino_acids {
                let label = match aa.kind {
                    1 => "",
                    -1 => " (stop)",
                    _ => " (off-target)",
                };
                lines.push(format!(
                    "  {}{}: {}",
                    aa.amino_acid,
                    label,
                    Self::to_string(&aa.codons)
                ));
            }
        }
        lines
    }
}
