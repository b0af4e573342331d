//! Cancelable timers that report by posting a message.
//!
//! A timer is a tokio task owned through a [`TimerGuard`]; dropping the guard
//! aborts the task. Messages the task already posted stay in the mailbox, so
//! every timer carries a token the receiver compares against its live guard.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};

#[derive(Debug)]
pub struct TimerGuard {
    token: u64,
    task: JoinHandle<()>,
}

impl TimerGuard {
    /// Post `message` once after `delay`.
    pub fn once<M: Send + 'static>(
        token: u64,
        delay: Duration,
        mailbox: UnboundedSender<M>,
        message: M,
    ) -> Self {
        let task = tokio::spawn(async move {
            sleep(delay).await;
            let _ = mailbox.send(message);
        });

        Self { token, task }
    }

    /// Post `make()` every `period`, first one `period` from now. Stops on its
    /// own once the receiver is gone.
    pub fn repeating<M, F>(token: u64, period: Duration, mailbox: UnboundedSender<M>, make: F) -> Self
    where
        M: Send + 'static,
        F: Fn() -> M + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if mailbox.send(make()).is_err() {
                    break;
                }
            }
        });

        Self { token, task }
    }

    pub fn token(&self) -> u64 {
        self.token
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_once_fires_after_delay() {
        let (tx, mut rx) = unbounded_channel();
        let _guard = TimerGuard::once(1, Duration::from_millis(500), tx, "hide");

        sleep(Duration::from_millis(499)).await;
        assert!(rx.try_recv().is_err());

        sleep(Duration::from_millis(2)).await;
        assert_eq!(rx.try_recv(), Ok("hide"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (tx, mut rx) = unbounded_channel();
        let guard = TimerGuard::once(1, Duration::from_millis(500), tx, "hide");
        drop(guard);

        sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_skips_immediate_tick() {
        let (tx, mut rx) = unbounded_channel();
        let guard = TimerGuard::repeating(7, Duration::from_secs(1), tx, || 7u64);

        sleep(Duration::from_millis(3500)).await;
        drop(guard);

        let mut ticks = 0;
        while rx.try_recv().is_ok() {
            ticks += 1;
        }
        assert_eq!(ticks, 3);
    }
}
