use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use tokio::runtime::{Handle, Runtime};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::sink::DeliveryError;

/// Counters describing what happened to fired events.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    /// Deliveries handed to the supervisor.
    pub fired: AtomicU64,
    /// Deliveries accepted by the webhook.
    pub delivered: AtomicU64,
    /// Deliveries that failed or were cancelled at shutdown.
    pub failed: AtomicU64,
    /// Deliveries never started (in-flight bound reached or shut down).
    pub dropped: AtomicU64,
}

impl DeliveryStats {
    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Owns every delivery task spawned by a hook.
///
/// Tasks run on the caller's Tokio runtime when there is one, otherwise on
/// a process-wide fallback runtime. The supervisor can wait for in-flight
/// deliveries ([`drain`](Self::drain)) and stop them at shutdown
/// ([`shutdown`](Self::shutdown)). With `max_in_flight` set, deliveries
/// beyond the bound are dropped instead of queued.
#[derive(Debug)]
pub struct DeliverySupervisor {
    tracker: TaskTracker,
    cancel: CancellationToken,
    permits: Option<Arc<Semaphore>>,
    stats: Arc<DeliveryStats>,
    // Set once shutdown begins; guards `reopen` in `drain`.
    stopped: Mutex<bool>,
}

impl DeliverySupervisor {
    /// A bound of `Some(0)` is treated as `Some(1)`.
    pub fn new(max_in_flight: Option<usize>) -> Self {
        DeliverySupervisor {
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
            permits: max_in_flight.map(|n| Arc::new(Semaphore::new(n.max(1)))),
            stats: Arc::new(DeliveryStats::default()),
            stopped: Mutex::new(false),
        }
    }

    fn is_stopped(&self) -> bool {
        *self.stopped.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn stats(&self) -> &DeliveryStats {
        &self.stats
    }

    /// Number of deliveries currently running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Start `delivery` in the background. Returns `false` when it was
    /// dropped instead.
    pub fn spawn<F>(&self, delivery: F) -> bool
    where
        F: Future<Output = Result<(), DeliveryError>> + Send + 'static,
    {
        self.stats.fired.fetch_add(1, Ordering::Relaxed);

        if self.is_stopped() {
            return self.drop_delivery("hook is shut down");
        }

        let permit = match &self.permits {
            Some(permits) => match Arc::clone(permits).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => return self.drop_delivery("too many deliveries in flight"),
            },
            None => None,
        };

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => match fallback_runtime() {
                Some(rt) => rt.handle().clone(),
                None => return self.drop_delivery("no runtime available"),
            },
        };

        let stats = Arc::clone(&self.stats);
        let cancel = self.cancel.clone();
        self.tracker.spawn_on(
            async move {
                let _permit = permit;
                tokio::select! {
                    _ = cancel.cancelled() => {
                        stats.failed.fetch_add(1, Ordering::Relaxed);
                        warn!("log notification cancelled at shutdown");
                    }
                    result = delivery => match result {
                        Ok(()) => {
                            stats.delivered.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            warn!(error = %e, "failed to deliver log notification");
                        }
                    },
                }
            },
            &handle,
        );
        true
    }

    fn drop_delivery(&self, reason: &str) -> bool {
        self.stats.dropped.fetch_add(1, Ordering::Relaxed);
        warn!(reason, "dropping log notification");
        false
    }

    /// Wait until every delivery started so far has finished.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        let stopped = self.stopped.lock().unwrap_or_else(|e| e.into_inner());
        if !*stopped {
            self.tracker.reopen();
        }
    }

    /// Stop accepting deliveries, give running ones `grace` to finish and
    /// cancel whatever is left.
    pub async fn shutdown(&self, grace: Duration) {
        {
            let mut stopped = self.stopped.lock().unwrap_or_else(|e| e.into_inner());
            *stopped = true;
            self.tracker.close();
        }
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            debug!(in_flight = self.tracker.len(), "cancelling log deliveries");
        }
        self.cancel.cancel();
        self.tracker.wait().await;
    }
}

fn fallback_runtime() -> Option<&'static Runtime> {
    static RUNTIME: OnceLock<Option<Runtime>> = OnceLock::new();
    RUNTIME
        .get_or_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("discord-hook-delivery")
                .enable_all()
                .build()
                .map_err(|e| warn!(error = %e, "failed to start delivery runtime"))
                .ok()
        })
        .as_ref()
}
