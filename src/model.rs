//! Data model for the codon finder.
//!
//! This module contains all data structures for representing:
//! - The editable query form and its input modes
//! - Request parameters sent to the `codons` endpoint
//! - Result sets returned by the backend
//! - Application state of the terminal UI
//!
//! The form keeps the fields of every mode so that switching back and forth
//! restores what the user typed; only the active mode is turned into a
//! [`Query`] when parameters are built.

use serde::{Deserialize, Serialize};

use crate::query::{LastError, QueryController, TextField};
use crate::ui::glyphs::Glyphs;

/// The 20 standard amino acids, in the order they are offered for selection.
pub const AMINO_ACIDS: [char; 20] = [
    'A', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'V',
    'W', 'Y',
];

/// Input mode of the query form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Amino-acid sequence plus an edit list
    #[default]
    AaSeq,
    /// A set of individual amino acids
    AminoAcids,
    /// A single (possibly ambiguous) codon
    Codon,
}

impl QueryMode {
    pub const ALL: [QueryMode; 3] = [QueryMode::AaSeq, QueryMode::AminoAcids, QueryMode::Codon];

    /// Returns the next mode, wrapping around.
    pub fn next(self) -> Self {
        match self {
            QueryMode::AaSeq => QueryMode::AminoAcids,
            QueryMode::AminoAcids => QueryMode::Codon,
            QueryMode::Codon => QueryMode::AaSeq,
        }
    }

    /// Returns the previous mode, wrapping around.
    pub fn previous(self) -> Self {
        match self {
            QueryMode::AaSeq => QueryMode::Codon,
            QueryMode::AminoAcids => QueryMode::AaSeq,
            QueryMode::Codon => QueryMode::AminoAcids,
        }
    }
}

impl std::fmt::Display for QueryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryMode::AaSeq => write!(f, "Sequence"),
            QueryMode::AminoAcids => write!(f, "Amino acids"),
            QueryMode::Codon => write!(f, "Codon"),
        }
    }
}

/// A codon usage table key, as known to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organism {
    /// NCBI taxonomy id
    pub id: u32,
    /// Display name
    pub name: String,
}

impl Organism {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// The organism selected when nothing else is configured.
    pub fn e_coli() -> Self {
        Self::new(37762, "Escherichia coli")
    }

    /// Organisms offered in the organism selector.
    pub fn builtin() -> Vec<Organism> {
        vec![
            Self::e_coli(),
            Self::new(4932, "Saccharomyces cerevisiae"),
            Self::new(1423, "Bacillus subtilis"),
            Self::new(9606, "Homo sapiens"),
            Self::new(10090, "Mus musculus"),
        ]
    }
}

/// A query ready to be sent, one variant per input mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    AaSeq { aa_seq: String, edits: String },
    AminoAcids { amino_acids: Vec<char> },
    Codon { codon: String },
}

impl Query {
    pub fn mode(&self) -> QueryMode {
        match self {
            Query::AaSeq { .. } => QueryMode::AaSeq,
            Query::AminoAcids { .. } => QueryMode::AminoAcids,
            Query::Codon { .. } => QueryMode::Codon,
        }
    }
}

/// Parameters of one request to the `codons` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParams {
    pub query: Query,
    pub organism_id: u32,
}

impl RequestParams {
    /// Returns the query-string pairs, in the order they are sent.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = match &self.query {
            Query::AaSeq { aa_seq, edits } => {
                vec![("aaSeq", aa_seq.clone()), ("edits", edits.clone())]
            }
            Query::AminoAcids { amino_acids } => {
                vec![("aminoAcids", amino_acids.iter().collect::<String>())]
            }
            Query::Codon { codon } => vec![("codon", codon.clone())],
        };
        pairs.push(("organism", self.organism_id.to_string()));
        pairs
    }
}

/// The editable query form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryForm {
    /// Active input mode
    pub mode: QueryMode,
    /// Selected amino acids, in toggle order
    pub amino_acids: Vec<char>,
    /// Ambiguous codon (IUPAC nucleotide codes)
    pub codon: String,
    /// Amino-acid sequence
    pub aa_seq: String,
    /// Comma-separated edit list
    pub edits: String,
    /// Selected organism, if any
    pub organism: Option<Organism>,
}

impl Default for QueryForm {
    fn default() -> Self {
        Self {
            mode: QueryMode::AaSeq,
            amino_acids: Vec::new(),
            codon: String::new(),
            aa_seq: String::new(),
            edits: String::new(),
            organism: Some(Organism::e_coli()),
        }
    }
}

impl QueryForm {
    /// Adds or removes an amino acid from the selection.
    ///
    /// Every occurrence is removed if the amino acid is already selected,
    /// otherwise it is appended once.
    pub fn toggle(&mut self, amino_acid: char) {
        if self.amino_acids.contains(&amino_acid) {
            self.amino_acids.retain(|&aa| aa != amino_acid);
        } else {
            self.amino_acids.push(amino_acid);
        }
    }

    /// Returns the query of the active mode, if its required fields are set.
    pub fn query(&self) -> Option<Query> {
        match self.mode {
            QueryMode::AaSeq if !self.aa_seq.is_empty() => Some(Query::AaSeq {
                aa_seq: self.aa_seq.clone(),
                edits: self.edits.clone(),
            }),
            QueryMode::AminoAcids if !self.amino_acids.is_empty() => Some(Query::AminoAcids {
                amino_acids: self.amino_acids.clone(),
            }),
            QueryMode::Codon if self.codon.chars().count() == 3 => Some(Query::Codon {
                codon: self.codon.clone(),
            }),
            _ => None,
        }
    }

    /// Builds the request parameters, or `None` if no request should be sent.
    pub fn request_params(&self) -> Option<RequestParams> {
        let organism = self.organism.as_ref()?;
        self.query().map(|query| RequestParams {
            query,
            organism_id: organism.id,
        })
    }
}

/// Usage statistics of one concrete codon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CodonUsage {
    #[serde(default)]
    pub codon: String,
    #[serde(default)]
    pub probability: f64,
    #[serde(default)]
    pub cai: f64,
}

/// The concrete codons of an ambiguous codon that encode one amino acid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AminoAcidUsage {
    #[serde(default)]
    pub amino_acid: String,
    /// 1 for a requested amino acid, 0 for an off-target one, -1 for stop
    #[serde(rename = "type", default)]
    pub kind: i8,
    #[serde(default)]
    pub codons: Vec<CodonUsage>,
}

/// One entry of the result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CodonResult {
    #[serde(default)]
    pub ambiguous_codon: String,
    #[serde(default)]
    pub ambiguous_codon_nucleotides: Vec<String>,
    #[serde(default)]
    pub ambiguous_codon_expansion: Vec<String>,
    #[serde(default)]
    pub amino_acids: Vec<AminoAcidUsage>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Error body returned by the backend on failure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// A focusable field of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Mode,
    Organism,
    AaSeq,
    Edits,
    AminoAcids,
    Codon,
}

impl Field {
    /// Returns the fields shown for a mode, in focus order.
    pub fn visible(mode: QueryMode) -> &'static [Field] {
        match mode {
            QueryMode::AaSeq => &[Field::Mode, Field::Organism, Field::AaSeq, Field::Edits],
            QueryMode::AminoAcids => &[Field::Mode, Field::Organism, Field::AminoAcids],
            QueryMode::Codon => &[Field::Mode, Field::Organism, Field::Codon],
        }
    }

    fn text_field(self) -> Option<TextField> {
        match self {
            Field::AaSeq => Some(TextField::AaSeq),
            Field::Edits => Some(TextField::Edits),
            Field::Codon => Some(TextField::Codon),
            _ => None,
        }
    }
}

/// The complete application state.
pub struct AppState {
    /// Form, requests and results
    pub controller: QueryController<LastError>,
    /// Focused form field
    pub focus: Field,
    /// Position of the cursor in the amino-acid selector
    pub aa_cursor: usize,
    /// Organisms offered in the organism selector
    pub organisms: Vec<Organism>,
    /// Whether the help overlay is shown
    pub show_help: bool,
    /// Whether the application should quit
    pub should_quit: bool,
    /// Glyph set used for rendering
    pub glyphs: Glyphs,
}

impl AppState {
    /// Creates a new application state around a controller.
    pub fn new(controller: QueryController<LastError>, organisms: Vec<Organism>, glyphs: Glyphs) -> Self {
        Self {
            controller,
            focus: Field::Mode,
            aa_cursor: 0,
            organisms,
            show_help: false,
            should_quit: false,
            glyphs,
        }
    }

    pub fn form(&self) -> &QueryForm {
        self.controller.form()
    }

    /// Returns the error message currently shown, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.controller.notifier().message.as_deref()
    }

    fn move_focus(&mut self, forward: bool) {
        let fields = Field::visible(self.form().mode);
        let current = fields.iter().position(|&f| f == self.focus).unwrap_or(0);
        let next = if forward {
            (current + 1) % fields.len()
        } else {
            (current + fields.len() - 1) % fields.len()
        };
        self.focus = fields[next];
    }

    /// Moves the focus to the next visible field.
    pub fn focus_next(&mut self) {
        self.move_focus(true);
    }

    /// Moves the focus to the previous visible field.
    pub fn focus_previous(&mut self) {
        self.move_focus(false);
    }

    /// Index of the selected organism; `organisms.len()` stands for none.
    fn organism_index(&self) -> usize {
        self.form()
            .organism
            .as_ref()
            .and_then(|o| self.organisms.iter().position(|x| x == o))
            .unwrap_or(self.organisms.len())
    }

    fn cycle_organism(&mut self, forward: bool) {
        let options = self.organisms.len() + 1;
        let current = self.organism_index();
        let next = if forward {
            (current + 1) % options
        } else {
            (current + options - 1) % options
        };
        let organism = self.organisms.get(next).cloned();
        self.controller.set_organism(organism);
    }

    fn step(&mut self, forward: bool) {
        match self.focus {
            Field::Mode => {
                let mode = self.form().mode;
                self.controller
                    .set_mode(if forward { mode.next() } else { mode.previous() });
            }
            Field::Organism => self.cycle_organism(forward),
            Field::AminoAcids => {
                let len = AMINO_ACIDS.len();
                self.aa_cursor = if forward {
                    (self.aa_cursor + 1) % len
                } else {
                    (self.aa_cursor + len - 1) % len
                };
            }
            _ => {}
        }
    }

    /// Handles the left key on the focused field.
    pub fn move_left(&mut self) {
        self.step(false);
    }

    /// Handles the right key on the focused field.
    pub fn move_right(&mut self) {
        self.step(true);
    }

    /// Handles a typed character on the focused field.
    pub fn input_char(&mut self, c: char) {
        if let Some(field) = self.focus.text_field() {
            self.controller.push_char(field, c);
            return;
        }
        if self.focus == Field::AminoAcids {
            if c == ' ' {
                self.controller.toggle(AMINO_ACIDS[self.aa_cursor]);
            } else if let Some(pos) = AMINO_ACIDS.iter().position(|&aa| aa == c.to_ascii_uppercase()) {
                self.aa_cursor = pos;
                self.controller.toggle(AMINO_ACIDS[pos]);
            }
        }
    }

    /// Deletes the last character of the focused text field.
    pub fn backspace(&mut self) {
        if let Some(field) = self.focus.text_field() {
            self.controller.pop_char(field);
        }
    }

    /// Submits the form without waiting for the debounce interval.
    pub fn submit_now(&mut self) {
        self.controller.submit();
    }

    pub fn dismiss_error(&mut self) {
        self.controller.notifier_mut().message = None;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn dismiss_help(&mut self) {
        self.show_help = false;
    }
}
