use std::iter::FusedIterator;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::history::ScanHistory;
use crate::types::{Notice, ScanHistoryItem, ScanPhase, ScanResult, ScanStatus};

/// Canned `(label, status, status text)` entries every scan reveals, in order.
pub const SUBDOMAIN_TEMPLATE: [(&str, u16, &str); 10] = [
    ("www", 200, "OK"),
    ("api", 200, "OK"),
    ("admin", 403, "Forbidden"),
    ("blog", 200, "OK"),
    ("mail", 301, "Moved Permanently"),
    ("dev", 404, "Not Found"),
    ("staging", 401, "Unauthorized"),
    ("ftp", 500, "Internal Server Error"),
    ("cdn", 200, "OK"),
    ("shop", 200, "OK"),
];

/// Number of records a single scan produces.
pub const SCAN_SIZE: usize = SUBDOMAIN_TEMPLATE.len();

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("domain must not be empty")]
    EmptyDomain,
    #[error("invalid delay range: min {min_ms}ms exceeds max {max_ms}ms")]
    InvalidDelay { min_ms: u64, max_ms: u64 },
}

/// Lazy sequence of the synthetic results for one domain.
///
/// Consumed once; a fresh scan builds a fresh `ScanSteps`.
#[derive(Debug, Clone)]
pub struct ScanSteps {
    domain: String,
    next: usize,
}

impl ScanSteps {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            next: 0,
        }
    }
}

impl Iterator for ScanSteps {
    type Item = ScanResult;

    fn next(&mut self) -> Option<ScanResult> {
        let (label, status, text) = SUBDOMAIN_TEMPLATE.get(self.next)?;
        self.next += 1;
        Some(ScanResult {
            subdomain: format!("{label}.{}", self.domain),
            status: *status,
            status_text: (*text).to_string(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = SCAN_SIZE.saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for ScanSteps {}
impl FusedIterator for ScanSteps {}

/// Every result a scan of `domain` would reveal, collected up front.
pub fn synthesize_results(domain: &str) -> Vec<ScanResult> {
    ScanSteps::new(domain).collect()
}

/// Uniform pause between simulated steps. Purely cosmetic pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min: Duration,
    max: Duration,
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Result<Self, ScanError> {
        if min > max {
            return Err(ScanError::InvalidDelay {
                min_ms: min.as_millis() as u64,
                max_ms: max.as_millis() as u64,
            });
        }
        Ok(Self { min, max })
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Result<Self, ScanError> {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    /// No pause at all; results land as fast as the runtime schedules them.
    pub const fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub const fn fixed(d: Duration) -> Self {
        Self { min: d, max: d }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(300),
            max: Duration::from_millis(800),
        }
    }
}

/// Identifies one scan run. Results carrying an outdated ticket are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTicket {
    generation: u64,
    domain: String,
}

impl ScanTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

/// Dashboard state: the Idle -> Scanning -> Complete machine plus history.
#[derive(Debug, Clone, Default)]
pub struct ScanSession {
    phase: ScanPhase,
    domain: Option<String>,
    progress: u8,
    results: Vec<ScanResult>,
    history: ScanHistory,
    generation: u64,
    notice: Option<Notice>,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter Scanning for `domain`, wiping the previous run's results and progress.
    pub fn begin(&mut self, domain: &str) -> Result<ScanTicket, ScanError> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(ScanError::EmptyDomain);
        }
        self.generation += 1;
        self.phase = ScanPhase::Scanning;
        self.domain = Some(domain.to_string());
        self.progress = 0;
        self.results.clear();
        self.notice = None;
        Ok(ScanTicket {
            generation: self.generation,
            domain: domain.to_string(),
        })
    }

    pub fn is_current(&self, ticket: &ScanTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Append one result. Returns false if the ticket is stale or the run is not scanning.
    pub fn record(&mut self, ticket: &ScanTicket, result: ScanResult) -> bool {
        if !self.is_current(ticket)
            || self.phase != ScanPhase::Scanning
            || self.results.len() >= SCAN_SIZE
        {
            return false;
        }
        self.results.push(result);
        self.progress = (self.results.len() * 100 / SCAN_SIZE) as u8;
        true
    }

    /// Finish the run once every template entry has been recorded.
    pub fn complete(&mut self, ticket: &ScanTicket, now: OffsetDateTime) -> Option<ScanHistoryItem> {
        if !self.is_current(ticket)
            || self.phase != ScanPhase::Scanning
            || self.results.len() != SCAN_SIZE
        {
            return None;
        }
        self.phase = ScanPhase::Complete;
        let item = ScanHistoryItem {
            id: format!("{}-{}", now.unix_timestamp_nanos() / 1_000_000, ticket.generation),
            domain: ticket.domain.clone(),
            timestamp: now,
            subdomain_count: self.results.len(),
        };
        self.history.push(item.clone());
        self.notice = Some(Notice::new(
            "Scan Complete",
            format!("Found {} subdomains for {}", item.subdomain_count, item.domain),
        ));
        Some(item)
    }

    /// Drop back to Idle if a run is in progress. Partial results stay visible.
    pub fn abort(&mut self) -> bool {
        if self.phase != ScanPhase::Scanning {
            return false;
        }
        self.generation += 1;
        self.phase = ScanPhase::Idle;
        true
    }

    /// Hand out the pending notice once; later renders see nothing.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == ScanPhase::Complete
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn results(&self) -> &[ScanResult] {
        &self.results
    }

    pub fn history(&self) -> &ScanHistory {
        &self.history
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn status(&self) -> ScanStatus {
        ScanStatus {
            state: self.phase,
            domain: self.domain.clone(),
            progress: self.progress,
            found: self.results.len(),
            total: SCAN_SIZE,
            complete: self.is_complete(),
            notice: self.notice.clone(),
        }
    }
}

/// Broadcast to subscribers as a scan moves along.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Started { domain: String },
    Progress { domain: String, progress: u8, result: ScanResult },
    Completed(ScanHistoryItem),
    Cancelled { domain: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed(ScanHistoryItem),
    Cancelled,
    /// The scan task panicked.
    Failed(String),
}

/// A spawned scan run.
#[derive(Debug)]
pub struct ScanHandle {
    ticket: ScanTicket,
    join: JoinHandle<ScanOutcome>,
}

impl ScanHandle {
    pub fn ticket(&self) -> &ScanTicket {
        &self.ticket
    }

    /// Wait for the run to finish or be superseded.
    pub async fn wait(self) -> ScanOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => ScanOutcome::Cancelled,
            Err(e) => {
                warn!(domain = self.ticket.domain(), error = %e, "scan task failed");
                ScanOutcome::Failed(e.to_string())
            }
        }
    }
}

#[derive(Debug)]
struct ScannerState {
    session: ScanSession,
    cancel: Option<CancellationToken>,
}

impl ScannerState {
    /// Reset the session for `domain` and cancel the previous run's token.
    fn begin(&mut self, domain: &str, cancel: &CancellationToken) -> Result<ScanTicket, ScanError> {
        let ticket = self.session.begin(domain)?;
        if let Some(prev) = self.cancel.replace(cancel.clone()) {
            prev.cancel();
        }
        Ok(ticket)
    }
}

/// Drives [`ScanSession`] from background tasks, one simulated step at a time.
///
/// - Starting a scan cancels the in-flight run before resetting state.
/// - Each step sleeps a sampled delay, racing the run's `CancellationToken`.
/// - Records carry a ticket so a superseded run can never append.
#[derive(Clone, Debug)]
pub struct Scanner {
    inner: Arc<RwLock<ScannerState>>,
    delay: DelayRange,
    events: broadcast::Sender<ScanEvent>,
}

impl Scanner {
    pub fn new(delay: DelayRange) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(RwLock::new(ScannerState {
                session: ScanSession::new(),
                cancel: None,
            })),
            delay,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.events.subscribe()
    }

    /// Start scanning `domain`, superseding whatever run is in flight.
    pub async fn start(&self, domain: &str) -> Result<ScanHandle, ScanError> {
        let cancel = CancellationToken::new();
        let ticket = {
            let mut s = self.inner.write().await;
            s.begin(domain, &cancel)?
        };
        Ok(self.spawn_run(ticket, cancel))
    }

    /// Start `domain` unless that same domain is already being scanned.
    ///
    /// The check and the reset happen under one write lock, so concurrent
    /// callers for the same domain start it at most once.
    pub async fn start_unless_running(&self, domain: &str) -> Result<Option<ScanHandle>, ScanError> {
        let cancel = CancellationToken::new();
        let ticket = {
            let mut s = self.inner.write().await;
            if s.session.phase() == ScanPhase::Scanning && s.session.domain() == Some(domain.trim()) {
                return Ok(None);
            }
            s.begin(domain, &cancel)?
        };
        Ok(Some(self.spawn_run(ticket, cancel)))
    }

    /// Picking an entry in the history sidebar re-runs that domain from scratch,
    /// even when it is the one currently scanning.
    pub async fn select_history(&self, domain: &str) -> Result<ScanHandle, ScanError> {
        self.start(domain).await
    }

    fn spawn_run(&self, ticket: ScanTicket, cancel: CancellationToken) -> ScanHandle {
        info!(domain = ticket.domain(), generation = ticket.generation(), "scan started");
        let _ = self.events.send(ScanEvent::Started {
            domain: ticket.domain().to_string(),
        });

        let this = self.clone();
        let run_ticket = ticket.clone();
        let join = tokio::spawn(async move { this.run(run_ticket, cancel).await });
        ScanHandle { ticket, join }
    }

    /// Stop the current run, if any. Returns true when something was cancelled.
    pub async fn cancel(&self) -> bool {
        let mut s = self.inner.write().await;
        let Some(token) = s.cancel.take() else {
            return false;
        };
        token.cancel();
        let aborted = s.session.abort();
        if aborted {
            let domain = s.session.domain().unwrap_or_default().to_string();
            info!(domain = %domain, "scan cancelled");
            let _ = self.events.send(ScanEvent::Cancelled { domain });
        }
        aborted
    }

    async fn run(&self, ticket: ScanTicket, cancel: CancellationToken) -> ScanOutcome {
        for result in ScanSteps::new(ticket.domain()) {
            let wait = self.delay.sample();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return ScanOutcome::Cancelled,
                _ = tokio::time::sleep(wait) => {}
            }

            let progress = {
                let mut s = self.inner.write().await;
                if cancel.is_cancelled() {
                    return ScanOutcome::Cancelled;
                }
                if !s.session.record(&ticket, result.clone()) {
                    warn!(domain = ticket.domain(), "dropping result from superseded scan");
                    return ScanOutcome::Cancelled;
                }
                s.session.progress()
            };
            debug!(subdomain = %result.subdomain, progress, "step");
            let _ = self.events.send(ScanEvent::Progress {
                domain: ticket.domain().to_string(),
                progress,
                result,
            });
        }

        let completed = {
            let mut s = self.inner.write().await;
            let completed = s.session.complete(&ticket, OffsetDateTime::now_utc());
            if completed.is_some() {
                s.cancel = None;
            }
            completed
        };
        match completed {
            Some(item) => {
                info!(domain = %item.domain, found = item.subdomain_count, "scan complete");
                let _ = self.events.send(ScanEvent::Completed(item.clone()));
                ScanOutcome::Completed(item)
            }
            None => ScanOutcome::Cancelled,
        }
    }

    pub async fn status(&self) -> ScanStatus {
        self.inner.read().await.session.status()
    }

    pub async fn results(&self) -> Vec<ScanResult> {
        self.inner.read().await.session.results().to_vec()
    }

    pub async fn history(&self) -> Vec<ScanHistoryItem> {
        self.inner.read().await.session.history().to_vec()
    }

    /// Copy of the whole session, for exports.
    pub async fn snapshot(&self) -> ScanSession {
        self.inner.read().await.session.clone()
    }

    /// Copy of the session for a page render. The pending notice moves into
    /// the copy, so it is shown exactly once.
    pub async fn snapshot_for_render(&self) -> ScanSession {
        let mut s = self.inner.write().await;
        let mut view = s.session.clone();
        view.notice = s.session.take_notice();
        view
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(DelayRange::default())
    }
}
