//! Transfer coordinator - owns the background worker and the delivery slot

use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tokio::sync::mpsc;

use crate::cache::ModelCache;
use crate::types::{FetchRequest, ModelSource, ProgressSink, ResultSink, COMMAND_QUEUE_SIZE};
use crate::worker::{run_transfer_worker, ProgressSlot, SinkSlot, WorkerCommand};

/// Serializes fetches onto one long-lived background worker and relays
/// completions back to the submitting thread via an async message channel.
///
/// At most one fetch is dispatched at a time. Submitting again before the
/// previous fetch completes queues behind it and overwrites the registered
/// result sink; the earlier transfer keeps running unseen and its
/// completion goes to whichever sink is then current, tagged with its
/// request id so the consumer can discard it.
pub struct TransferCoordinator {
    commands: Option<mpsc::Sender<WorkerCommand>>,
    sink: SinkSlot,
    progress: ProgressSlot,
    next_request_id: AtomicU64,
    worker: Option<JoinHandle<()>>,
}

impl TransferCoordinator {
    /// Spawns the worker thread with its own single-threaded runtime.
    pub fn new(cache: ModelCache) -> Result<Self, String> {
        let (commands, receiver) = mpsc::channel(COMMAND_QUEUE_SIZE);
        let sink: SinkSlot = Arc::new(Mutex::new(None));
        let progress: ProgressSlot = Arc::new(Mutex::new(None));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to build worker runtime: {}", e))?;

        let worker_sink = sink.clone();
        let worker_progress = progress.clone();
        let worker = std::thread::Builder::new()
            .name("transfer-worker".to_string())
            .spawn(move || {
                runtime.block_on(run_transfer_worker(
                    receiver,
                    cache,
                    worker_sink,
                    worker_progress,
                ));
            })
            .map_err(|e| format!("Failed to spawn transfer worker: {}", e))?;

        Ok(Self {
            commands: Some(commands),
            sink,
            progress,
            next_request_id: AtomicU64::new(1),
            worker: Some(worker),
        })
    }

    /// Queues a fetch and registers `result_sink` as the delivery target.
    /// Returns the request id the completion message will carry. A
    /// rejected submit leaves the previously registered sink in place.
    pub fn submit(&self, source: ModelSource, result_sink: ResultSink) -> Result<u64, String> {
        let id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        let request = FetchRequest::new(id, source)?;
        let commands = self
            .commands
            .as_ref()
            .ok_or_else(|| "Coordinator is stopped".to_string())?;
        // The slot stays locked across try_send so an in-flight completion
        // cannot land in a sink whose request was never accepted.
        let mut slot = self.sink.lock().unwrap();
        let previous = slot.replace(result_sink);
        if let Err(e) = commands.try_send(WorkerCommand::Fetch(request)) {
            *slot = previous;
            return Err(match e {
                mpsc::error::TrySendError::Full(_) => "Fetch queue is full".to_string(),
                mpsc::error::TrySendError::Closed(_) => "Transfer worker is gone".to_string(),
            });
        }
        drop(slot);
        debug!("fetch_queued: id={}", id);
        Ok(id)
    }

    /// Registers a sink for download progress events.
    pub fn set_progress_sink(&self, sink: ProgressSink) {
        *self.progress.lock().unwrap() = Some(sink);
    }

    /// Drops the registered sinks so nothing is delivered after teardown,
    /// lets the worker drain its queue and exit, then joins it. There is
    /// no cancellation of an in-flight transfer. Idempotent.
    pub fn stop(&mut self) {
        *self.sink.lock().unwrap() = None;
        *self.progress.lock().unwrap() = None;
        if self.commands.take().is_some() {
            debug!("coordinator_stop");
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("transfer_worker_panicked");
            }
        }
    }
}

impl Drop for TransferCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}
