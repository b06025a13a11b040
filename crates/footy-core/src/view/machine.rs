use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::fetch::FetchError;

/// Load status of one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Idle,
    Fetching,
    Fetched,
    Errored,
}

impl QueryStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryStatus::Idle | QueryStatus::Fetching)
    }
}

/// Identifies one load cycle. Only the token of the current generation can
/// complete a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CycleToken(u64);

impl CycleToken {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// What happened to a completed cycle's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer cycle started (or this one already completed); result dropped.
    Superseded,
}

/// Everything a presentation layer needs to render a view.
#[derive(Debug, Clone)]
pub struct ViewSnapshot<P, T> {
    pub status: QueryStatus,
    pub generation: u64,
    pub params: Option<P>,
    pub data: Option<T>,
    pub error: Option<FetchError>,
}

impl<P, T> ViewSnapshot<P, T> {
    fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            generation: 0,
            params: None,
            data: None,
            error: None,
        }
    }
}

/// Idle → Fetching → Fetched | Errored, restarted by parameter changes.
///
/// Every accepted parameter change bumps the generation and resets to
/// `Fetching`, cache hit or not. Results carry the token of the cycle that
/// produced them; a token from an older generation is discarded so a slow,
/// superseded load can never overwrite a newer one.
///
/// Transitions are published on a `watch` channel.
pub struct ViewMachine<P, T> {
    snapshot: ViewSnapshot<P, T>,
    tx: watch::Sender<ViewSnapshot<P, T>>,
}

impl<P, T> ViewMachine<P, T>
where
    P: Clone + PartialEq + std::fmt::Debug,
    T: Clone,
{
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ViewSnapshot::idle());
        Self {
            snapshot: ViewSnapshot::idle(),
            tx,
        }
    }

    pub fn status(&self) -> QueryStatus {
        self.snapshot.status
    }

    pub fn generation(&self) -> u64 {
        self.snapshot.generation
    }

    pub fn snapshot(&self) -> &ViewSnapshot<P, T> {
        &self.snapshot
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot<P, T>> {
        self.tx.subscribe()
    }

    /// Start a cycle for `params`. Returns `None` when `params` equal those of
    /// the current cycle, which is left alone.
    pub fn begin(&mut self, params: P) -> Option<CycleToken> {
        if self.snapshot.status != QueryStatus::Idle && self.snapshot.params.as_ref() == Some(&params) {
            debug!(params = ?params, "Parameters unchanged, keeping current cycle");
            return None;
        }
        Some(self.start_cycle(params))
    }

    /// Start a fresh cycle with the current parameters, e.g. after an error.
    pub fn restart(&mut self) -> Option<CycleToken> {
        let params = self.snapshot.params.clone()?;
        Some(self.start_cycle(params))
    }

    pub fn complete(&mut self, token: CycleToken, result: Result<T, FetchError>) -> Completion {
        if token.0 != self.snapshot.generation || self.snapshot.status != QueryStatus::Fetching {
            debug!(
                token = token.0,
                current = self.snapshot.generation,
                "Discarding result of superseded cycle"
            );
            return Completion::Superseded;
        }

        match result {
            Ok(data) => {
                self.snapshot.status = QueryStatus::Fetched;
                self.snapshot.data = Some(data);
            }
            Err(e) => {
                e.log("view cycle");
                self.snapshot.status = QueryStatus::Errored;
                self.snapshot.error = Some(e);
            }
        }
        self.publish();
        Completion::Applied
    }

    fn start_cycle(&mut self, params: P) -> CycleToken {
        self.snapshot.generation += 1;
        debug!(generation = self.snapshot.generation, params = ?params, "Starting view cycle");
        self.snapshot.status = QueryStatus::Fetching;
        self.snapshot.params = Some(params);
        self.snapshot.data = None;
        self.snapshot.error = None;
        self.publish();
        CycleToken(self.snapshot.generation)
    }

    fn publish(&self) {
        self.tx.send_replace(self.snapshot.clone());
    }
}

impl<P, T> Default for ViewMachine<P, T>
where
    P: Clone + PartialEq + std::fmt::Debug,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
