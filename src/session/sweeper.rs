//! Background eviction and persistence sweeps.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::store::{PersistReport, SessionStore};

/// Periodic sweeps over a [`SessionStore`], stopped with [`shutdown`](Self::shutdown).
pub struct Sweeper {
    store: Arc<SessionStore>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawn the sweeps using the store's configured intervals.
    pub fn spawn(store: Arc<SessionStore>) -> Self {
        let settings = store.settings().clone();
        Self::spawn_with(store, settings.activity_timeout(), settings.flush_interval())
    }

    pub fn spawn_with(store: Arc<SessionStore>, evict_every: Duration, persist_every: Duration) -> Self {
        let cancel = CancellationToken::new();

        let evict = {
            let store = store.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut ticker = interval_after(evict_every);
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            store.evict_idle();
                        }
                    }
                }
            })
        };

        let persist = {
            let store = store.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut ticker = interval_after(persist_every);
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            store.persist().await;
                        }
                    }
                }
            })
        };

        info!(?evict_every, ?persist_every, "session sweeper started");
        Self {
            store,
            cancel,
            tasks: vec![evict, persist],
        }
    }

    /// Stop both sweeps and run one final persistence sweep.
    pub async fn shutdown(self) -> PersistReport {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "sweeper task ended abnormally");
            }
        }
        self.store.persist().await
    }
}

/// An interval whose first tick fires one period from now.
fn interval_after(period: Duration) -> tokio::time::Interval {
    let period = period.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
