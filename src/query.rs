//! Query controller.
//!
//! Owns the query form, turns it into requests and keeps the latest result
//! set. Requests run on a background worker so the UI never blocks:
//! - every form mutation schedules a debounced submit
//! - every issued request carries a generation number
//! - only the response of the latest generation is applied
//!
//! Request failures are logged and handed to an [`ErrorNotifier`]; they never
//! reach the caller.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::backend::{BackendError, CodonService};
use crate::model::{CodonResult, Organism, QueryForm, QueryMode, RequestParams};

/// Receives error messages for display to the user.
pub trait ErrorNotifier {
    fn open(&mut self, message: &str);
}

/// Keeps the most recent error message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LastError {
    pub message: Option<String>,
}

impl ErrorNotifier for LastError {
    fn open(&mut self, message: &str) {
        self.message = Some(message.to_string());
    }
}

/// A text field of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    AaSeq,
    Edits,
    Codon,
}

struct Job {
    generation: u64,
    params: RequestParams,
}

struct Outcome {
    generation: u64,
    result: Result<Vec<CodonResult>, BackendError>,
}

/// Runs requests on a dedicated thread.
///
/// Jobs queued while a request is running are coalesced: only the newest one
/// is executed.
fn spawn_worker<S>(service: S) -> (Sender<Job>, Receiver<Outcome>)
where
    S: CodonService + Send + 'static,
{
    let (job_tx, job_rx) = mpsc::channel::<Job>();
    let (outcome_tx, outcome_rx) = mpsc::channel();

    thread::spawn(move || {
        while let Ok(mut job) = job_rx.recv() {
            while let Ok(newer) = job_rx.try_recv() {
                tracing::debug!(generation = job.generation, "skipping superseded request");
                job = newer;
            }
            let result = service.find_codons(&job.params);
            let outcome = Outcome {
                generation: job.generation,
                result,
            };
            if outcome_tx.send(outcome).is_err() {
                break;
            }
        }
    });

    (job_tx, outcome_rx)
}

/// Maintains the query form and fetches results for it.
pub struct QueryController<N: ErrorNotifier> {
    form: QueryForm,
    results: Option<Vec<CodonResult>>,
    busy: bool,
    generation: u64,
    requests_sent: u64,
    pending_since: Option<Instant>,
    debounce: Duration,
    jobs: Sender<Job>,
    outcomes: Receiver<Outcome>,
    notifier: N,
}

impl<N: ErrorNotifier> QueryController<N> {
    /// Creates a controller that sends its requests to `service`.
    pub fn new<S>(service: S, form: QueryForm, debounce: Duration, notifier: N) -> Self
    where
        S: CodonService + Send + 'static,
    {
        let (jobs, outcomes) = spawn_worker(service);
        Self {
            form,
            results: None,
            busy: false,
            generation: 0,
            requests_sent: 0,
            pending_since: None,
            debounce,
            jobs,
            outcomes,
            notifier,
        }
    }

    pub fn form(&self) -> &QueryForm {
        &self.form
    }

    /// Returns the latest result set, `None` if there is none yet.
    pub fn results(&self) -> Option<&[CodonResult]> {
        self.results.as_deref()
    }

    /// Returns true while a request for the current form is running.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Returns the generation of the most recent submit.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the number of requests handed to the worker.
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent
    }

    /// Returns true if a debounced submit is waiting.
    pub fn has_pending_submit(&self) -> bool {
        self.pending_since.is_some()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    fn schedule(&mut self) {
        self.pending_since = Some(Instant::now());
    }

    /// Switches the active input mode.
    pub fn set_mode(&mut self, mode: QueryMode) {
        if self.form.mode != mode {
            self.form.mode = mode;
            self.schedule();
        }
    }

    /// Adds or removes an amino acid from the selection.
    pub fn toggle(&mut self, amino_acid: char) {
        self.form.toggle(amino_acid.to_ascii_uppercase());
        self.schedule();
    }

    pub fn set_organism(&mut self, organism: Option<Organism>) {
        if self.form.organism != organism {
            self.form.organism = organism;
            self.schedule();
        }
    }

    fn field_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::AaSeq => &mut self.form.aa_seq,
            TextField::Edits => &mut self.form.edits,
            TextField::Codon => &mut self.form.codon,
        }
    }

    /// Appends a character to a text field.
    pub fn push_char(&mut self, field: TextField, c: char) {
        let c = if field == TextField::Edits {
            c
        } else {
            c.to_ascii_uppercase()
        };
        self.field_mut(field).push(c);
        self.schedule();
    }

    /// Removes the last character of a text field.
    pub fn pop_char(&mut self, field: TextField) {
        if self.field_mut(field).pop().is_some() {
            self.schedule();
        }
    }

    /// Replaces the contents of a text field.
    pub fn set_text(&mut self, field: TextField, text: &str) {
        if self.field_mut(field).as_str() != text {
            *self.field_mut(field) = text.to_string();
            self.schedule();
        }
    }

    /// Fires the pending submit once the debounce interval has elapsed.
    ///
    /// Returns true if a submit was fired.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.debounce => {
                self.submit();
                true
            }
            _ => false,
        }
    }

    /// Clears the results and requests new ones for the current form.
    ///
    /// No request is issued if no organism is selected or the active mode's
    /// required field is missing; the results stay cleared in both cases.
    pub fn submit(&mut self) {
        self.pending_since = None;
        self.results = None;
        // Responses still in flight belong to an older form.
        self.generation += 1;
        self.busy = false;

        let Some(params) = self.form.request_params() else {
            tracing::debug!(mode = ?self.form.mode, "query incomplete, no request sent");
            return;
        };

        self.busy = true;
        tracing::info!(generation = self.generation, params = ?params.to_pairs(), "requesting codons");
        let job = Job {
            generation: self.generation,
            params,
        };
        if self.jobs.send(job).is_err() {
            self.fail("Request worker is not running");
        } else {
            self.requests_sent += 1;
        }
    }

    fn fail(&mut self, message: &str) {
        tracing::error!("{message}");
        self.notifier.open(message);
        self.busy = false;
    }

    fn apply(&mut self, outcome: Outcome) -> bool {
        if outcome.generation != self.generation {
            tracing::debug!(
                generation = outcome.generation,
                current = self.generation,
                "dropping stale response"
            );
            return false;
        }

        match outcome.result {
            Ok(results) => {
                tracing::info!(generation = outcome.generation, count = results.len(), "results received");
                self.results = Some(results);
                self.busy = false;
            }
            Err(err) => self.fail(&err.message()),
        }
        true
    }

    /// Applies finished responses without blocking.
    ///
    /// Returns true if the visible state changed.
    pub fn poll_responses(&mut self) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.outcomes.try_recv() {
            changed |= self.apply(outcome);
        }
        changed
    }

    /// Blocks until the current request has finished or `timeout` elapses.
    ///
    /// A worker that stopped without answering counts as a failed request.
    /// Returns false on timeout.
    pub fn wait_for_response(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.busy {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.outcomes.recv_timeout(remaining) {
                Ok(outcome) => {
                    self.apply(outcome);
                }
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => {
                    self.fail("Request worker stopped without a response");
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use reqwest::StatusCode;

    use super::*;
    use crate::model::{AminoAcidUsage, CodonUsage};

    const WAIT: Duration = Duration::from_secs(5);

    fn result(ambiguous_codon: &str) -> CodonResult {
        CodonResult {
            ambiguous_codon: ambiguous_codon.to_string(),
            amino_acids: vec![AminoAcidUsage {
                amino_acid: "K".to_string(),
                kind: 1,
                codons: vec![CodonUsage {
                    codon: "AAA".to_string(),
                    probability: 0.74,
                    cai: 1.0,
                }],
            }],
            ..CodonResult::default()
        }
    }

    /// Answers immediately and records every request.
    #[derive(Clone, Default)]
    struct RecordingService {
        calls: Arc<Mutex<Vec<RequestParams>>>,
        error: Option<String>,
    }

    impl CodonService for RecordingService {
        fn find_codons(&self, params: &RequestParams) -> Result<Vec<CodonResult>, BackendError> {
            self.calls.lock().unwrap().push(params.clone());
            match &self.error {
                Some(message) => Err(BackendError::Server {
                    status: StatusCode::BAD_REQUEST,
                    message: message.clone(),
                }),
                None => Ok(vec![result("AAR")]),
            }
        }
    }

    /// Announces each request and waits for the test to supply its answer.
    struct GatedService {
        started: Sender<RequestParams>,
        replies: Receiver<Result<Vec<CodonResult>, BackendError>>,
    }

    impl CodonService for GatedService {
        fn find_codons(&self, params: &RequestParams) -> Result<Vec<CodonResult>, BackendError> {
            self.started.send(params.clone()).unwrap();
            self.replies.recv().unwrap()
        }
    }

    /// Dies on the first request, taking the worker thread with it.
    struct CrashingService;

    impl CodonService for CrashingService {
        fn find_codons(&self, _params: &RequestParams) -> Result<Vec<CodonResult>, BackendError> {
            panic!("service crashed");
        }
    }

    fn controller(service: RecordingService, form: QueryForm) -> QueryController<LastError> {
        QueryController::new(service, form, Duration::from_millis(300), LastError::default())
    }

    fn codon_form(codon: &str) -> QueryForm {
        QueryForm {
            mode: QueryMode::Codon,
            codon: codon.to_string(),
            ..QueryForm::default()
        }
    }

    #[test]
    fn test_submit_stores_results() {
        let service = RecordingService::default();
        let mut c = controller(service.clone(), codon_form("AAR"));

        c.submit();
        assert!(c.is_busy());
        assert!(c.wait_for_response(WAIT));

        assert!(!c.is_busy());
        assert_eq!(c.results().unwrap()[0].ambiguous_codon, "AAR");
        assert_eq!(service.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_aa_seq_request_params() {
        let service = RecordingService::default();
        let form = QueryForm {
            mode: QueryMode::AaSeq,
            aa_seq: "MKV".to_string(),
            edits: "M1A".to_string(),
            ..QueryForm::default()
        };
        let mut c = controller(service.clone(), form);
        c.submit();
        assert!(c.wait_for_response(WAIT));

        let calls = service.calls.lock().unwrap();
        assert_eq!(
            calls[0].to_pairs(),
            vec![
                ("aaSeq", "MKV".to_string()),
                ("edits", "M1A".to_string()),
                ("organism", "37762".to_string()),
            ]
        );
    }

    #[test]
    fn test_short_codon_sends_nothing() {
        let mut c = controller(RecordingService::default(), codon_form("NN"));
        c.submit();
        assert!(!c.is_busy());
        assert_eq!(c.requests_sent(), 0);
        assert!(c.results().is_none());
    }

    #[test]
    fn test_empty_selection_sends_nothing() {
        let form = QueryForm {
            mode: QueryMode::AminoAcids,
            ..QueryForm::default()
        };
        let mut c = controller(RecordingService::default(), form);
        c.submit();
        assert!(!c.is_busy());
        assert_eq!(c.requests_sent(), 0);
    }

    #[test]
    fn test_no_organism_clears_results() {
        let mut c = controller(RecordingService::default(), codon_form("AAR"));
        c.submit();
        assert!(c.wait_for_response(WAIT));
        assert!(c.results().is_some());

        c.set_organism(None);
        c.submit();
        assert!(c.results().is_none());
        assert!(!c.is_busy());
        assert_eq!(c.requests_sent(), 1);
    }

    #[test]
    fn test_failure_is_notified() {
        let service = RecordingService {
            error: Some("Edit 'K1A' is invalid".to_string()),
            ..RecordingService::default()
        };
        let mut c = controller(service, codon_form("AAR"));
        c.submit();
        assert!(c.wait_for_response(WAIT));

        assert!(!c.is_busy());
        assert!(c.results().is_none());
        assert_eq!(c.notifier().message.as_deref(), Some("Edit 'K1A' is invalid"));
    }

    #[test]
    fn test_debounce_fires_once() {
        let mut c = controller(RecordingService::default(), codon_form(""));
        c.push_char(TextField::Codon, 'a');
        c.push_char(TextField::Codon, 'a');
        c.push_char(TextField::Codon, 'r');
        assert!(c.has_pending_submit());
        assert_eq!(c.form().codon, "AAR");

        assert!(!c.tick(Instant::now()));
        assert!(c.tick(Instant::now() + Duration::from_millis(300)));
        assert!(!c.tick(Instant::now() + Duration::from_millis(600)));
        assert_eq!(c.requests_sent(), 1);
    }

    #[test]
    fn test_unchanged_form_schedules_nothing() {
        let mut c = controller(RecordingService::default(), codon_form(""));
        c.set_mode(QueryMode::Codon);
        c.pop_char(TextField::Codon);
        c.set_organism(Some(Organism::e_coli()));
        c.set_text(TextField::Codon, "");
        assert!(!c.has_pending_submit());

        c.toggle('k');
        assert!(c.has_pending_submit());
        assert_eq!(c.form().amino_acids, vec!['K']);
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let (started_tx, started_rx) = mpsc::channel();
        let (reply_tx, reply_rx) = mpsc::channel();
        let service = GatedService {
            started: started_tx,
            replies: reply_rx,
        };
        let mut c = QueryController::new(
            service,
            codon_form("AAR"),
            Duration::from_millis(300),
            LastError::default(),
        );

        c.submit();
        let first = started_rx.recv_timeout(WAIT).unwrap();
        assert_eq!(first.to_pairs()[0], ("codon", "AAR".to_string()));

        c.set_text(TextField::Codon, "GAY");
        c.submit();

        reply_tx.send(Ok(vec![result("AAR")])).unwrap();
        let second = started_rx.recv_timeout(WAIT).unwrap();
        assert_eq!(second.to_pairs()[0], ("codon", "GAY".to_string()));

        assert!(!c.poll_responses());
        assert!(c.results().is_none());
        assert!(c.is_busy());

        reply_tx.send(Ok(vec![result("GAY")])).unwrap();
        assert!(c.wait_for_response(WAIT));
        assert_eq!(c.results().unwrap()[0].ambiguous_codon, "GAY");
        assert_eq!(c.generation(), 2);
    }

    #[test]
    fn test_dead_worker_is_reported() {
        let mut c = QueryController::new(
            CrashingService,
            codon_form("AAR"),
            Duration::from_millis(300),
            LastError::default(),
        );
        c.submit();

        let started = Instant::now();
        assert!(c.wait_for_response(WAIT));
        assert!(started.elapsed() < WAIT);
        assert!(!c.is_busy());
        assert_eq!(
            c.notifier().message.as_deref(),
            Some("Request worker stopped without a response")
        );
    }
}
