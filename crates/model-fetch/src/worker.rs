//! Transfer worker - serial fetch loop with cross-thread result delivery

use log::{debug, error, info};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::cache::ModelCache;
use crate::fetcher;
use crate::types::{FetchRequest, ProgressSink, ResultSink, TransferResult};

/// Single registered consumer slot. A later submit overwrites an earlier
/// one, so a completion is always delivered to whichever sink is current
/// when the fetch finishes (last-writer-wins; request ids let the consumer
/// discard a stale completion).
pub(crate) type SinkSlot = Arc<Mutex<Option<ResultSink>>>;
pub(crate) type ProgressSlot = Arc<Mutex<Option<ProgressSink>>>;

pub(crate) enum WorkerCommand {
    Fetch(FetchRequest),
}

/// Drains the command queue one fetch at a time until the coordinator
/// closes its sender side.
pub(crate) async fn run_transfer_worker(
    mut commands: mpsc::Receiver<WorkerCommand>,
    cache: ModelCache,
    sink: SinkSlot,
    progress: ProgressSlot,
) {
    while let Some(command) = commands.recv().await {
        match command {
            WorkerCommand::Fetch(request) => {
                let request_id = request.id();
                info!("fetch_start: id={} source={:?}", request_id, request.source);
                let progress_sink = progress.lock().unwrap().clone();
                let outcome = fetcher::fetch(request, &cache, progress_sink.as_ref()).await;
                if let Err(e) = &outcome {
                    error!("fetch_failed: id={} error={}", request_id, e);
                }
                deliver(&sink, TransferResult { request_id, outcome });
            }
        }
    }
    debug!("transfer_worker_exit");
}

/// Posts the result as a message; never invokes consumer code from this
/// thread. A gone or unregistered consumer just drops the result.
fn deliver(sink: &SinkSlot, result: TransferResult) {
    let guard = sink.lock().unwrap();
    match guard.as_ref() {
        Some(sender) => {
            if sender.send(result).is_err() {
                debug!("result_dropped: consumer gone");
            }
        }
        None => debug!("result_dropped: no sink registered"),
    }
}
