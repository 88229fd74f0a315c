// painel-core/src/tasks/deadline.rs

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::console::input::ConsoleInput;

/// Delivers `input` to the console once `deadline` is reached.
///
/// The deadline is fixed by the caller when the timer is armed, so aborting
/// the returned handle is the only way to cancel it.
pub fn spawn_deadline_task(
    deadline: Instant,
    tx: UnboundedSender<ConsoleInput>,
    input: ConsoleInput,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        sleep_until(deadline).await;
        let _ = tx.send(input);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn fires_once_at_the_deadline() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = Instant::now();
        spawn_deadline_task(
            start + Duration::from_secs(1),
            tx,
            ConsoleInput::SessionCloseDue { session_id: "s-1".into() },
        );

        match rx.recv().await {
            Some(ConsoleInput::SessionCloseDue { session_id }) => assert_eq!(session_id, "s-1"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_deadline_task(
            Instant::now() + Duration::from_secs(1),
            tx,
            ConsoleInput::QueueRefreshDue,
        );
        handle.abort();
        assert!(rx.recv().await.is_none());
    }
}
