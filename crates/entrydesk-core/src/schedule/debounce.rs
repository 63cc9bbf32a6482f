use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

enum Signal {
    Trigger(Instant),
    Cancel,
}

/// Defers an action until no trigger has arrived for `delay`.
///
/// Each [`trigger`](Self::trigger) re-arms the deadline, so a burst of
/// triggers runs the action once, `delay` after the last of them.
/// [`cancel`](Self::cancel) disarms a pending run.
///
/// The timer lives in a tokio task; dropping the debouncer stops it and
/// discards any pending run.
pub struct Debouncer {
    delay: Duration,
    tx: mpsc::UnboundedSender<Signal>,
    task: JoinHandle<()>,
}

impl Debouncer {
    /// Spawn the timer task on the current tokio runtime.
    pub fn spawn<F>(delay: Duration, mut action: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Signal>();

        let task = tokio::spawn(async move {
            let mut deadline: Option<Instant> = None;
            loop {
                // The sleep future is built even when disarmed; it is only polled when armed.
                let wake_at = deadline.unwrap_or_else(|| Instant::now() + delay);
                tokio::select! {
                    signal = rx.recv() => match signal {
                        Some(Signal::Trigger(at)) => deadline = Some(at + delay),
                        Some(Signal::Cancel) => deadline = None,
                        None => break,
                    },
                    _ = sleep_until(wake_at), if deadline.is_some() => {
                        deadline = None;
                        action();
                    }
                }
            }
        });

        Self { delay, tx, task }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(Signal::Trigger(Instant::now()));
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(Signal::Cancel);
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
