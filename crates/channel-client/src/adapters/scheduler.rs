//! Timer adapters.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::ports::{Scheduler, TimerEvent, TimerHandle};

/// [`Scheduler`] backed by tokio timer tasks.
///
/// Fires are sent over the channel returned by [`TokioScheduler::new`].
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct TokioScheduler {
    fires: mpsc::UnboundedSender<TimerEvent>,
    tasks: HashMap<TimerHandle, JoinHandle<()>>,
    next_id: u64,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (fires, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            fires,
            tasks: HashMap::new(),
            next_id: 0,
        };
        (scheduler, receiver)
    }

    /// Timers that have been scheduled and neither cancelled nor finished.
    pub fn pending(&self) -> usize {
        self.tasks.values().filter(|task| !task.is_finished()).count()
    }

    fn track(&mut self, task: JoinHandle<()>) -> TimerHandle {
        self.tasks.retain(|_, task| !task.is_finished());
        self.next_id += 1;
        let handle = TimerHandle::new(self.next_id);
        self.tasks.insert(handle, task);
        handle
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, interval: Duration, event: TimerEvent) -> TimerHandle {
        let fires = self.fires.clone();
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if fires.send(event).is_err() {
                    break;
                }
            }
        });
        self.track(task)
    }

    fn once_after(&mut self, delay: Duration, event: TimerEvent) -> TimerHandle {
        let fires = self.fires.clone();
        let task = tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = fires.send(event);
        });
        self.track(task)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

/// Scheduler for manual mode, where nothing drives timers. Handles are
/// issued but never fire.
#[derive(Debug, Default)]
pub struct NoopScheduler {
    next_id: u64,
}

impl NoopScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue(&mut self) -> TimerHandle {
        self.next_id += 1;
        TimerHandle::new(self.next_id)
    }
}

impl Scheduler for NoopScheduler {
    fn schedule(&mut self, _interval: Duration, _event: TimerEvent) -> TimerHandle {
        self.issue()
    }

    fn once_after(&mut self, _delay: Duration, _event: TimerEvent) -> TimerHandle {
        self.issue()
    }

    fn cancel(&mut self, _handle: TimerHandle) {}
}
