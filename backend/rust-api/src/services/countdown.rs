use futures::stream::{self, Stream, StreamExt};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::models::timer::TimerEvent;

/// Countdown as a stream: one `timer-tick` per `tick_interval` until the
/// remaining time hits zero, then a single `time-expired`, then the stream
/// ends. A zero duration yields the expiry straight away.
pub fn countdown_stream(total_seconds: u32, tick_interval: Duration) -> impl Stream<Item = TimerEvent> {
    stream::unfold((0u32, false), move |(elapsed, expired)| async move {
        if expired {
            return None;
        }

        if elapsed >= total_seconds {
            tracing::debug!("Countdown of {}s expired", total_seconds);
            return Some((TimerEvent::expired(total_seconds), (elapsed, true)));
        }

        sleep(tick_interval).await;
        let elapsed = elapsed + 1;
        Some((TimerEvent::tick(total_seconds, elapsed), (elapsed, false)))
    })
}

/// A running countdown. Events are pushed through `deliver` from a spawned
/// task; the task stops at expiry, when `deliver` reports the receiver gone,
/// on `cancel`, or when the handle is dropped.
pub struct Countdown {
    task: JoinHandle<()>,
}

impl Countdown {
    pub fn start<F>(total_seconds: u32, tick_interval: Duration, mut deliver: F) -> Self
    where
        F: FnMut(TimerEvent) -> bool + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let events = countdown_stream(total_seconds, tick_interval);
            futures::pin_mut!(events);
            while let Some(event) = events.next().await {
                if !deliver(event) {
                    tracing::debug!("Countdown receiver dropped, stopping timer");
                    break;
                }
            }
        });

        Self { task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}
