use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::app::evaluator_loop::EvaluatorLoop;
use crate::app::evictor_loop::EvictorLoop;
use crate::app::status::SchedulerStatus;

/// Handle to the two running loops.
/// - `request_shutdown()` で両ループに停止を通知（実行中の tick は最後まで走る）
/// - `shutdown_and_join()` で両ループの終了を待てる
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    status_rx: watch::Receiver<SchedulerStatus>,
    evaluator: JoinHandle<()>,
    evictor: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Spawn the evaluator and evictor loops as independent tasks.
    pub(crate) fn spawn(
        evaluator: EvaluatorLoop,
        evictor: EvictorLoop,
        status_rx: watch::Receiver<SchedulerStatus>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let evaluator = tokio::spawn(evaluator.run(shutdown_rx.clone()));
        let evictor = tokio::spawn(evictor.run(shutdown_rx));

        Self {
            shutdown_tx,
            status_rx,
            evaluator,
            evictor,
        }
    }

    /// Latest status snapshot.
    pub fn status(&self) -> SchedulerStatus {
        self.status_rx.borrow().clone()
    }

    /// Receiver that is notified on every pass / eviction.
    pub fn subscribe(&self) -> watch::Receiver<SchedulerStatus> {
        self.status_rx.clone()
    }

    /// Request shutdown for both loops.
    pub fn request_shutdown(&self) {
        // ignore send error: loops may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown, wait for both loops, and return the final status.
    pub async fn shutdown_and_join(self) -> SchedulerStatus {
        self.request_shutdown();
        for (name, join) in [("evaluator", self.evaluator), ("evictor", self.evictor)] {
            if let Err(e) = join.await {
                warn!(task = name, error = %e, "loop task ended abnormally");
            }
        }
        self.status_rx.borrow().clone()
    }
}
