// painel-core/src/tasks/queue_refresh.rs

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::trace;

use crate::console::input::ConsoleInput;

/// Spawns a background task that asks the console to re-request the queue
/// every `interval`. Ends by itself once the console is gone; otherwise the
/// console aborts it when the connection drops or a new one is armed.
pub fn spawn_queue_refresh_task(
    tx: UnboundedSender<ConsoleInput>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            sleep(interval).await;
            trace!("queue refresh tick");
            if tx.send(ConsoleInput::QueueRefreshDue).is_err() {
                break;
            }
        }
    })
}
