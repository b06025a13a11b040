use std::fmt::Debug;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error};

use super::machine::{Completion, CycleToken, QueryStatus, ViewMachine, ViewSnapshot};
use crate::fetch::FetchError;

/// Buffer size for cycle results. Results of superseded cycles are drained
/// and dropped, so a handful is plenty.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Loads the data of one screen for one set of route parameters.
pub trait ViewLoader: Send + Sync + 'static {
    type Params: Clone + PartialEq + Debug + Send + Sync + 'static;
    type Output: Clone + Send + Sync + 'static;

    fn load(&self, params: Self::Params) -> BoxFuture<'static, Result<Self::Output, FetchError>>;
}

struct CycleResult<T> {
    token: CycleToken,
    result: Result<T, FetchError>,
}

/// Drives a [`ViewMachine`] with loads running as background tasks.
///
/// `navigate` starts a cycle and spawns its load; finished loads come back
/// over an mpsc channel and are applied by `check_background_tasks` (non
/// blocking) or `settle` (waits until the current cycle is done).
pub struct ViewRunner<L: ViewLoader> {
    loader: Arc<L>,
    machine: ViewMachine<L::Params, L::Output>,
    result_tx: mpsc::Sender<CycleResult<L::Output>>,
    result_rx: mpsc::Receiver<CycleResult<L::Output>>,
}

impl<L: ViewLoader> ViewRunner<L> {
    pub fn new(loader: L) -> Self {
        let (result_tx, result_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        Self {
            loader: Arc::new(loader),
            machine: ViewMachine::new(),
            result_tx,
            result_rx,
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn status(&self) -> QueryStatus {
        self.machine.status()
    }

    pub fn snapshot(&self) -> &ViewSnapshot<L::Params, L::Output> {
        self.machine.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot<L::Params, L::Output>> {
        self.machine.subscribe()
    }

    /// Route parameters changed. Returns whether a new cycle was started.
    pub fn navigate(&mut self, params: L::Params) -> bool {
        match self.machine.begin(params.clone()) {
            Some(token) => {
                self.spawn_cycle(token, params);
                true
            }
            None => false,
        }
    }

    /// Re-run the current parameters.
    pub fn retry(&mut self) -> bool {
        let Some(params) = self.machine.snapshot().params.clone() else {
            return false;
        };
        match self.machine.restart() {
            Some(token) => {
                self.spawn_cycle(token, params);
                true
            }
            None => false,
        }
    }

    fn spawn_cycle(&self, token: CycleToken, params: L::Params) {
        let loader = Arc::clone(&self.loader);
        let tx = self.result_tx.clone();

        tokio::spawn(async move {
            let result = loader.load(params).await;
            if let Err(e) = tx.send(CycleResult { token, result }).await {
                error!(error = %e, "Failed to send cycle result - view closed");
            }
        });
    }

    /// Apply every finished load without waiting. Returns how many results
    /// were applied (superseded ones are not counted).
    pub fn check_background_tasks(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(finished) = self.result_rx.try_recv() {
            if self.apply(finished) == Completion::Applied {
                applied += 1;
            }
        }
        applied
    }

    /// Wait until the current cycle has completed.
    pub async fn settle(&mut self) -> &ViewSnapshot<L::Params, L::Output> {
        while self.machine.status() == QueryStatus::Fetching {
            match self.result_rx.recv().await {
                Some(finished) => {
                    self.apply(finished);
                }
                None => break,
            }
        }
        self.machine.snapshot()
    }

    fn apply(&mut self, finished: CycleResult<L::Output>) -> Completion {
        let completion = self.machine.complete(finished.token, finished.result);
        if completion == Completion::Superseded {
            debug!(generation = finished.token.generation(), "Dropped superseded load");
        }
        completion
    }
}

// ============================================================================
// Tests
// ============================================================================
