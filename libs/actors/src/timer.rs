//! Timers
//!
//! Each timer owns one OS thread that sleeps and then injects
//! `Timeout { id }` into the target's mailbox, with no sender. Cancellation
//! clears a flag that the driver checks before every sleep and again right
//! before every send, so at most one firing can follow a `cancel()`.

use crate::actor_ref::{ActorAddress, ActorRef};
use crate::messages::Timeout;
use crate::{ActorError, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, trace};

/// Timer identifier carried by `Timeout`
pub type TimerId = u64;

/// Source of unique timer ids
#[derive(Debug)]
pub struct TimerIds {
    next: AtomicU64,
}

impl TimerIds {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> TimerId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for TimerIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running one-shot or periodic timer
#[derive(Debug)]
pub struct Timer {
    id: TimerId,
    interval: Duration,
    periodic: bool,
    active: Arc<AtomicBool>,
}

impl Timer {
    /// Fire once after `delay`
    pub fn once(target: ActorRef, delay: Duration, id: TimerId) -> Result<Self> {
        Self::start(target, delay, id, false)
    }

    /// Fire every `interval` until cancelled
    pub fn periodic(target: ActorRef, interval: Duration, id: TimerId) -> Result<Self> {
        Self::start(target, interval, id, true)
    }

    fn start(target: ActorRef, interval: Duration, id: TimerId, periodic: bool) -> Result<Self> {
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);

        thread::Builder::new()
            .name(format!("timer-{id}"))
            .spawn(move || drive(target, interval, id, periodic, flag))
            .map_err(|e| ActorError::spawn(format!("timer {id}"), e))?;

        debug!(timer_id = id, interval_ms = interval.as_millis() as u64, periodic, "Timer started");

        Ok(Self {
            id,
            interval,
            periodic,
            active,
        })
    }

    /// Stop future firings. One already past its last check may still arrive.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
    }
}

fn drive(target: ActorRef, interval: Duration, id: TimerId, periodic: bool, active: Arc<AtomicBool>) {
    while active.load(Ordering::Acquire) {
        thread::sleep(interval);

        if !active.load(Ordering::Acquire) {
            break;
        }

        trace!(timer_id = id, target = %target, "Timer fired");
        if let Err(e) = target.send(Timeout { id }, None) {
            debug!(timer_id = id, target = %target, error = %e, "Timer target unreachable, stopping");
            break;
        }

        if !periodic {
            break;
        }
    }

    active.store(false, Ordering::Release);
    trace!(timer_id = id, "Timer thread finished");
}
