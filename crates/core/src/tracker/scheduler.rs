use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use super::Message;
use crate::timer::TimerGuard;

pub const MIN_POLL_PERIOD: Duration = Duration::from_millis(100);

/// Drives periodic snapshot refreshes.
///
/// Each tick only posts [`Message::PollTick`]; the tracker does the fetch. A
/// tick is honored only while [`TrackingScheduler::accepts`] says its timer is
/// still the live one.
pub struct TrackingScheduler {
    period: Duration,
    generation: u64,
    timer: Option<TimerGuard>,
    mailbox: UnboundedSender<Message>,
}

impl TrackingScheduler {
    pub(crate) fn new(period: Duration, mailbox: UnboundedSender<Message>) -> Self {
        Self {
            period: clamp_period(period),
            generation: 0,
            timer: None,
            mailbox,
        }
    }

    /// Start ticking every `period`. Returns `false` if already running.
    pub fn start(&mut self, period: Duration) -> bool {
        if self.timer.is_some() {
            debug!("tracking already running, ignoring start");
            return false;
        }

        self.period = clamp_period(period);
        self.generation += 1;

        let generation = self.generation;
        self.timer = Some(TimerGuard::repeating(
            generation,
            self.period,
            self.mailbox.clone(),
            move || Message::PollTick { generation },
        ));

        debug!("tracking every {:?} (generation {generation})", self.period);
        true
    }

    /// Returns `false` if nothing was running.
    pub fn stop(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                debug!("tracking stopped (generation {})", timer.token());
                true
            }
            None => false,
        }
    }

    /// Restart with the new period if running, otherwise just remember it for
    /// the next start. Returns whether a timer was restarted.
    pub fn change_interval(&mut self, period: Duration) -> bool {
        if self.stop() {
            self.start(period)
        } else {
            self.period = clamp_period(period);
            false
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.timer.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether a tick from timer `generation` should trigger a fetch.
    pub fn accepts(&self, generation: u64) -> bool {
        self.timer
            .as_ref()
            .is_some_and(|timer| timer.token() == generation)
    }
}

fn clamp_period(period: Duration) -> Duration {
    if period < MIN_POLL_PERIOD {
        warn!("poll period {period:?} too short, using {MIN_POLL_PERIOD:?}");
        MIN_POLL_PERIOD
    } else {
        period
    }
}
