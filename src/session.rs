//! The session state machine: input → processing → results.
//!
//! One [`SessionMachine`] owns one [`Session`]. Every operation takes
//! `&self`, so a machine can be shared behind an `Arc`. Overlapping fetch or
//! generate calls get [`ScribeError::Busy`] instead of being queued. Failures
//! never escape: they land in [`Session::last_error`] and the phase stays put.

use crate::analysis::palette::is_hex_color;
use crate::analysis::{
    AnalysisResult, Analyzer, CreativeStyle, GenerationSettings, VariationCount,
};
use crate::error::{Result, ScribeError};
use crate::export;
use crate::image::{EncodedImage, HttpImageFetcher, ImageFetcher};
use crate::search::{ImageSearcher, SearchResult};
use crate::url_policy;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Coarse stage of the user flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for an image.
    #[default]
    Input,
    /// Image accepted; configuring and generating.
    Processing,
    /// Analysis attached.
    Results,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Processing => write!(f, "processing"),
            Self::Results => write!(f, "results"),
        }
    }
}

/// A change to the generation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    /// Set the writing style.
    Style(CreativeStyle),
    /// Set the number of outputs.
    Count(VariationCount),
    /// Set the custom instruction.
    Instruction(String),
}

/// What an operation did to the session.
#[derive(Debug)]
#[must_use]
pub enum Transition {
    /// The phase moved to the given phase.
    Advanced(Phase),
    /// Settings changed; phase unchanged.
    Applied,
    /// Not legal right now (wrong phase, no image, or superseded by a reset).
    Ignored,
    /// The operation failed. The session is unchanged apart from `last_error`,
    /// which is left alone for [`ScribeError::Busy`].
    Failed(ScribeError),
}

impl Transition {
    /// Returns true if the phase advanced.
    pub fn advanced(&self) -> bool {
        matches!(self, Self::Advanced(_))
    }

    /// Returns the error, if the operation failed.
    pub fn error(&self) -> Option<&ScribeError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// The single mutable record for one visit.
#[derive(Debug, Clone, Default)]
pub struct Session {
    phase: Phase,
    image_url: String,
    image_source: Option<String>,
    encoded_image: Option<Arc<EncodedImage>>,
    settings: GenerationSettings,
    result: Option<AnalysisResult>,
    last_error: Option<String>,
}

impl Session {
    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// URL of the accepted image; empty in `Input`.
    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    /// Provenance label of the accepted image.
    pub fn image_source(&self) -> Option<&str> {
        self.image_source.as_deref()
    }

    /// The encoded image; present only in `Processing` and `Results`.
    pub fn encoded_image(&self) -> Option<&EncodedImage> {
        self.encoded_image.as_deref()
    }

    /// Current generation settings.
    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// The analysis; present only in `Results`.
    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// User-facing message for the last failed operation.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn clear_image(&mut self) {
        self.image_url.clear();
        self.image_source = None;
        self.encoded_image = None;
        self.result = None;
    }
}

/// Builder for SessionMachine.
#[derive(Default)]
pub struct SessionMachineBuilder {
    fetcher: Option<Arc<dyn ImageFetcher>>,
    analyzer: Option<Arc<dyn Analyzer>>,
    searcher: Option<Arc<dyn ImageSearcher>>,
    timeout: Option<Duration>,
    settings: GenerationSettings,
}

impl SessionMachineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the image fetcher. Defaults to [`HttpImageFetcher`].
    pub fn fetcher(mut self, fetcher: impl ImageFetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Sets the analyzer (required).
    pub fn analyzer(mut self, analyzer: impl Analyzer + 'static) -> Self {
        self.analyzer = Some(Arc::new(analyzer));
        self
    }

    /// Sets the image searcher. Without one, [`SessionMachine::search`] fails
    /// with `Config`.
    pub fn searcher(mut self, searcher: impl ImageSearcher + 'static) -> Self {
        self.searcher = Some(Arc::new(searcher));
        self
    }

    /// Sets the deadline for each fetch, generate or search.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the initial generation settings.
    pub fn settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Builds the machine.
    pub fn build(self) -> Result<SessionMachine> {
        let analyzer = self
            .analyzer
            .ok_or_else(|| ScribeError::Config("session requires an analyzer".into()))?;
        let fetcher: Arc<dyn ImageFetcher> = match self.fetcher {
            Some(f) => f,
            None => Arc::new(HttpImageFetcher::builder().build()?),
        };

        Ok(SessionMachine {
            fetcher,
            analyzer,
            searcher: self.searcher,
            timeout: self.timeout.unwrap_or(SessionMachine::DEFAULT_TIMEOUT),
            session: Mutex::new(Session {
                settings: self.settings,
                ..Session::default()
            }),
            epoch: Mutex::new(0),
            busy: AtomicBool::new(false),
            searching: AtomicBool::new(false),
            in_flight: Mutex::new(None),
        })
    }
}

/// Orchestrates validation, fetching and analysis over one [`Session`].
pub struct SessionMachine {
    fetcher: Arc<dyn ImageFetcher>,
    analyzer: Arc<dyn Analyzer>,
    searcher: Option<Arc<dyn ImageSearcher>>,
    timeout: Duration,
    session: Mutex<Session>,
    /// Bumped by every reset; results from an older epoch are dropped.
    epoch: Mutex<u64>,
    busy: AtomicBool,
    searching: AtomicBool,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl SessionMachine {
    /// Default per-operation deadline.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

    /// Creates a new `SessionMachineBuilder`.
    pub fn builder() -> SessionMachineBuilder {
        SessionMachineBuilder::new()
    }

    /// Returns a copy of the session. The image payload is shared, not copied.
    pub fn snapshot(&self) -> Session {
        lock(&self.session).clone()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        lock(&self.session).phase
    }

    /// True while a fetch or generate is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// True while a search is in flight.
    pub fn is_searching(&self) -> bool {
        self.searching.load(Ordering::Acquire)
    }

    /// Validates, fetches and accepts an image. Legal only in `Input`.
    pub async fn submit_image(&self, url: &str, source: &str) -> Transition {
        let Some(op) = self.begin() else {
            return Transition::Failed(ScribeError::Busy);
        };

        let epoch = {
            let mut session = lock(&self.session);
            if session.phase != Phase::Input {
                return Transition::Ignored;
            }
            session.last_error = None;
            *lock(&self.epoch)
        };

        let parsed = match url_policy::check(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::info!(url, error = %e, "image URL rejected");
                return self.fail(e);
            }
        };

        let fetched = self.run(&op, self.fetcher.fetch(&parsed)).await;

        let mut session = lock(&self.session);
        if *lock(&self.epoch) != epoch || session.phase != Phase::Input {
            return Transition::Ignored;
        }
        match fetched {
            Ok(image) => {
                session.image_url = url.trim().to_string();
                session.image_source = Some(source.to_string());
                session.encoded_image = Some(Arc::new(image));
                session.last_error = None;
                session.phase = Phase::Processing;
                tracing::info!(url, source, "image accepted");
                Transition::Advanced(Phase::Processing)
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "image fetch failed");
                session.last_error = Some(e.user_message());
                Transition::Failed(e)
            }
        }
    }

    /// Changes one generation setting. Legal only in `Processing`.
    pub fn update_config(&self, change: ConfigChange) -> Transition {
        let mut session = lock(&self.session);
        if session.phase != Phase::Processing {
            return Transition::Ignored;
        }
        match change {
            ConfigChange::Style(style) => session.settings.style = style,
            ConfigChange::Count(count) => session.settings.variation_count = count,
            ConfigChange::Instruction(text) => session.settings.custom_instruction = text,
        }
        Transition::Applied
    }

    /// Runs the analysis. A no-op without an accepted image.
    pub async fn generate(&self) -> Transition {
        let (image, settings, epoch) = {
            let session = lock(&self.session);
            match (&session.encoded_image, session.phase) {
                (Some(image), Phase::Processing) => (
                    Arc::clone(image),
                    session.settings.clone(),
                    *lock(&self.epoch),
                ),
                _ => return Transition::Ignored,
            }
        };

        let Some(op) = self.begin() else {
            return Transition::Failed(ScribeError::Busy);
        };
        lock(&self.session).last_error = None;

        tracing::info!(
            analyzer = self.analyzer.name(),
            style = %settings.style,
            count = settings.variation_count.get(),
            "generating"
        );
        let analyzed = self
            .run(&op, self.analyzer.analyze(&image, &settings))
            .await
            .and_then(|result| verify_result(result, settings.variation_count));

        let mut session = lock(&self.session);
        if *lock(&self.epoch) != epoch || session.phase != Phase::Processing {
            return Transition::Ignored;
        }
        match analyzed {
            Ok(result) => {
                session.result = Some(result);
                session.last_error = None;
                session.phase = Phase::Results;
                tracing::info!("analysis attached");
                Transition::Advanced(Phase::Results)
            }
            Err(e) => {
                tracing::warn!(error = %e, "generation failed");
                session.last_error = Some(e.user_message());
                Transition::Failed(e)
            }
        }
    }

    /// Returns to `Input`, keeping the generation settings. Cancels any
    /// in-flight operation. Idempotent.
    pub fn reset(&self) {
        self.cancel();
        let mut session = lock(&self.session);
        *lock(&self.epoch) += 1;
        session.clear_image();
        session.last_error = None;
        if session.phase != Phase::Input {
            tracing::info!(from = %session.phase, "session reset");
        }
        session.phase = Phase::Input;
    }

    /// Cancels the in-flight fetch or generate, if any.
    pub fn cancel(&self) {
        if let Some(token) = lock(&self.in_flight).as_ref() {
            token.cancel();
        }
    }

    /// Searches for candidate images. A blank query returns nothing without
    /// calling the searcher. Failures are also recorded in `last_error`.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let searcher = self
            .searcher
            .as_ref()
            .ok_or_else(|| ScribeError::Config("image search is not configured".into()))?;
        let Some(_guard) = FlagGuard::acquire(&self.searching) else {
            return Err(ScribeError::Busy);
        };
        lock(&self.session).last_error = None;

        let outcome = tokio::time::timeout(self.timeout, searcher.search(query))
            .await
            .unwrap_or(Err(ScribeError::Timeout(self.timeout)));

        if let Err(ref e) = outcome {
            tracing::warn!(query, error = %e, "search failed");
            lock(&self.session).last_error = Some(e.user_message());
        }
        outcome
    }

    /// Renders the export document. `None` outside `Results`.
    pub fn export(&self) -> Option<String> {
        let session = lock(&self.session);
        session
            .result
            .as_ref()
            .map(|r| export::render(r, &session.image_url, session.image_source.as_deref()))
    }

    fn fail(&self, error: ScribeError) -> Transition {
        lock(&self.session).last_error = Some(error.user_message());
        Transition::Failed(error)
    }

    /// Marks the machine busy and installs a fresh cancellation token.
    ///
    /// Both happen under the `in_flight` lock, so a concurrent [`cancel`]
    /// either precedes the operation or reaches its token.
    ///
    /// [`cancel`]: SessionMachine::cancel
    fn begin(&self) -> Option<Operation<'_>> {
        let mut in_flight = lock(&self.in_flight);
        let flag = FlagGuard::acquire(&self.busy)?;
        let token = CancellationToken::new();
        *in_flight = Some(token.clone());
        Some(Operation {
            machine: self,
            token,
            _flag: flag,
        })
    }

    /// Runs `fut` under the deadline and the operation's cancellation token.
    async fn run<T>(&self, op: &Operation<'_>, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let timeout = self.timeout;
        tokio::select! {
            biased;
            _ = op.token.cancelled() => Err(ScribeError::Cancelled),
            res = tokio::time::timeout(timeout, fut) => {
                res.unwrap_or(Err(ScribeError::Timeout(timeout)))
            }
        }
    }
}

/// Checks what an [`Analyzer`] returned against the invariants every result
/// must hold, whichever analyzer produced it.
fn verify_result(result: AnalysisResult, expected: VariationCount) -> Result<AnalysisResult> {
    let got = result.creative_outputs.len();
    if got != expected.get() {
        return Err(ScribeError::AnalysisFailed(format!(
            "expected {} creative outputs, got {}",
            expected, got
        )));
    }
    if let Some(bad) = result.colors.iter().find(|c| !is_hex_color(c)) {
        return Err(ScribeError::AnalysisFailed(format!(
            "color is not #RRGGBB: {:?}",
            bad
        )));
    }
    Ok(result)
}

/// A running fetch or generate. Clears the token, then the busy flag, on drop.
struct Operation<'a> {
    machine: &'a SessionMachine,
    token: CancellationToken,
    _flag: FlagGuard<'a>,
}

impl Drop for Operation<'_> {
    fn drop(&mut self) {
        *lock(&self.machine.in_flight) = None;
    }
}

/// Holds a flag set for its lifetime.
struct FlagGuard<'a>(&'a AtomicBool);

impl<'a> FlagGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
