//! codonfinder - Terminal client for codon finder services
//!
//! Finds the (ambiguous) codons that encode an amino-acid sequence, a set of
//! amino acids, or analyses a single ambiguous codon.
//!
//! ## Usage
//!
//! ```bash
//! codonfinder                                    # interactive form
//! codonfinder --amino-acids KR                   # one query, print results
//! codonfinder --aa-seq MKV --edits M1A --organism-id 4932
//! codonfinder --codon NNK --server http://localhost:5000/
//! ```

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use codonfinder::backend::HttpCodonService;
use codonfinder::controller::run_app;
use codonfinder::logging::{self, LogTarget};
use codonfinder::model::{AppState, Organism, QueryForm, QueryMode};
use codonfinder::query::{LastError, QueryController};
use codonfinder::ui::glyphs;
use codonfinder::ui::result_view::ResultView;

/// Runs CLI mode: send one query and write the results to stdout.
fn run_cli_mode(service: HttpCodonService, form: QueryForm, timeout: Duration) -> Result<()> {
    let mode = form.mode;
    let mut controller = QueryController::new(service, form, Duration::ZERO, LastError::default());

    controller.submit();
    if controller.requests_sent() == 0 {
        anyhow::bail!("Query is incomplete: nothing to send");
    }
    if !controller.wait_for_response(timeout) {
        anyhow::bail!("No response within {} seconds", timeout.as_secs());
    }
    if let Some(message) = &controller.notifier().message {
        anyhow::bail!("{message}");
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for line in ResultView::new(controller.results(), mode).lines() {
        writeln!(handle, "{line}")?;
    }
    Ok(())
}

/// codonfinder - Find codons for amino acids with a codon finder service
///
/// When run without a query option, opens an interactive form.
/// With --aa-seq, --amino-acids or --codon, runs one query and prints the results.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the codon finder service
    #[arg(short = 's', long, env = "CODONFINDER_SERVER", default_value = "http://localhost:5000/")]
    server: String,

    /// NCBI taxonomy id of the organism (default: 37762, Escherichia coli)
    #[arg(short = 'O', long)]
    organism_id: Option<u32>,

    /// Display name for --organism-id
    #[arg(long, requires = "organism_id")]
    organism_name: Option<String>,

    /// Delay between the last edit and the query, in milliseconds
    #[arg(long, default_value = "300")]
    debounce_ms: u64,

    /// HTTP request timeout, in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Use Unicode glyphs in the interactive form
    #[arg(long)]
    fancy: bool,

    /// Log file for the interactive form (default: a new file in the temp directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Amino-acid sequence to query (CLI mode)
    #[arg(short = 'a', long, conflicts_with_all = ["amino_acids", "codon"])]
    aa_seq: Option<String>,

    /// Comma-separated edits for --aa-seq, e.g. K12R,A31G
    #[arg(short = 'e', long, requires = "aa_seq")]
    edits: Option<String>,

    /// Amino acids to encode with one ambiguous codon, e.g. KR (CLI mode)
    #[arg(short = 'm', long, conflicts_with = "codon")]
    amino_acids: Option<String>,

    /// Ambiguous codon to analyse, e.g. NNK (CLI mode)
    #[arg(short = 'c', long)]
    codon: Option<String>,
}

impl Args {
    fn is_cli_mode(&self) -> bool {
        self.aa_seq.is_some() || self.amino_acids.is_some() || self.codon.is_some()
    }

    /// Returns the organisms to offer and the one to preselect.
    fn organisms(&self) -> (Vec<Organism>, Organism) {
        let mut organisms = Organism::builtin();
        let Some(id) = self.organism_id else {
            return (organisms, Organism::e_coli());
        };

        match organisms.iter_mut().find(|o| o.id == id) {
            Some(known) => {
                if let Some(name) = &self.organism_name {
                    known.name = name.clone();
                }
                let selected = known.clone();
                (organisms, selected)
            }
            None => {
                let name = self
                    .organism_name
                    .clone()
                    .unwrap_or_else(|| format!("taxon {id}"));
                let custom = Organism::new(id, name);
                organisms.insert(0, custom.clone());
                (organisms, custom)
            }
        }
    }

    /// Builds the initial form from the query options.
    fn form(&self, organism: Organism) -> QueryForm {
        let mut form = QueryForm {
            organism: Some(organism),
            ..QueryForm::default()
        };

        if let Some(aa_seq) = &self.aa_seq {
            form.mode = QueryMode::AaSeq;
            form.aa_seq = aa_seq.to_ascii_uppercase();
            form.edits = self.edits.clone().unwrap_or_default();
        } else if let Some(amino_acids) = &self.amino_acids {
            form.mode = QueryMode::AminoAcids;
            for aa in amino_acids.chars().map(|c| c.to_ascii_uppercase()) {
                if !form.amino_acids.contains(&aa) {
                    form.amino_acids.push(aa);
                }
            }
        } else if let Some(codon) = &self.codon {
            form.mode = QueryMode::Codon;
            form.codon = codon.to_ascii_uppercase();
        }
        form
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.timeout_secs == 0 {
        anyhow::bail!("Timeout must be at least 1 second");
    }

    let log_target = if args.is_cli_mode() {
        LogTarget::Stderr
    } else {
        LogTarget::File(
            args.log_file
                .clone()
                .unwrap_or_else(|| logging::default_log_path(&std::env::temp_dir())),
        )
    };
    logging::init(&log_target)?;

    let timeout = Duration::from_secs(args.timeout_secs);
    let service = HttpCodonService::new(&args.server, timeout)?;
    tracing::info!(endpoint = %service.endpoint(), "using codon service");

    let (organisms, selected) = args.organisms();
    let form = args.form(selected);

    if args.is_cli_mode() {
        // Allow the worker a moment beyond the HTTP timeout to report back
        run_cli_mode(service, form, timeout + Duration::from_secs(1))?;
    } else {
        let controller = QueryController::new(
            service,
            form,
            Duration::from_millis(args.debounce_ms),
            LastError::default(),
        );
        let state = AppState::new(controller, organisms, glyphs::select(args.fancy));
        run_app(state)?;
    }

    Ok(())
}
