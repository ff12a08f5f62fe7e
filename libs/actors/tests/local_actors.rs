//! Single-process actor scenarios
//!
//! Everything here runs through a `Manager` with real actor threads.

use crossbeam_channel::{unbounded, Sender};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use switchyard::prelude::*;
use switchyard_config::ActorSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Ping {
    seq: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Pong {
    seq: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Silent;

switchyard::impl_message!(Ping, Pong, Silent);

const ROUNDS: u32 = 5;

fn quick_settings() -> ActorSettings {
    ActorSettings {
        mailbox_poll_ms: 10,
        run_poll_ms: 10,
        join_timeout_ms: 500,
    }
}

/// Answers every `Ping` with a matching `Pong`
#[derive(Default)]
struct Ponger {
    served: u32,
}

impl Ponger {
    fn on_ping(&mut self, ctx: &Context, mut envelope: Envelope<Ping>) -> Result<()> {
        self.served += 1;
        let seq = envelope.message.seq;
        ctx.reply(&mut envelope, Pong { seq });
        Ok(())
    }

    fn on_silent(&mut self, _ctx: &Context, _envelope: Envelope<Silent>) -> Result<()> {
        Ok(())
    }
}

impl Actor for Ponger {
    fn handlers(handlers: &mut Handlers<Self>) {
        handlers
            .on::<Ping, _>(Self::on_ping)
            .on::<Silent, _>(Self::on_silent);
    }
}

/// Starts a rally on `Start`, reports each `Pong` it sees and ends the
/// whole system once the last round is back
struct Pinger {
    peer: LocalRef,
    seen: Sender<u32>,
    handle: ManagerHandle,
}

impl Pinger {
    fn on_start(&mut self, ctx: &Context, _envelope: Envelope<Start>) -> Result<()> {
        self.peer.send(Ping { seq: 1 }, Some(ctx.myself_ref()))
    }

    fn on_pong(&mut self, ctx: &Context, envelope: Envelope<Pong>) -> Result<()> {
        let seq = envelope.message.seq;
        let _ = self.seen.send(seq);
        if seq >= ROUNDS {
            self.handle.terminate();
        } else {
            self.peer.send(Ping { seq: seq + 1 }, Some(ctx.myself_ref()))?;
        }
        Ok(())
    }
}

impl Actor for Pinger {
    fn handlers(handlers: &mut Handlers<Self>) {
        handlers
            .on::<Start, _>(Self::on_start)
            .on::<Pong, _>(Self::on_pong);
    }
}

/// Terminates `handle` after `after` unless something else did first
fn watchdog(handle: ManagerHandle, after: Duration) -> Arc<AtomicBool> {
    let fired = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&fired);
    thread::spawn(move || {
        let deadline = Instant::now() + after;
        while Instant::now() < deadline {
            if handle.is_terminated() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        flag.store(true, Ordering::SeqCst);
        handle.terminate();
    });
    fired
}

#[test_log::test]
fn test_local_ping_pong_rally() {
    let mut manager = Manager::with_settings(quick_settings());
    let handle = manager.get_handle();
    let (seen_tx, seen_rx) = unbounded();

    let ponger = manager.manage("ponger", Ponger::default());
    manager.manage(
        "pinger",
        Pinger {
            peer: ponger,
            seen: seen_tx,
            handle: handle.clone(),
        },
    );

    let timed_out = watchdog(handle.clone(), Duration::from_secs(5));
    manager.init().unwrap();
    manager.run();
    manager.end();

    assert!(!timed_out.load(Ordering::SeqCst), "pinger never terminated the manager");
    assert!(handle.is_terminated());
    assert_eq!(seen_rx.try_iter().collect::<Vec<_>>(), (1..=ROUNDS).collect::<Vec<_>>());
}

#[test_log::test]
fn test_fast_send_returns_the_reply() {
    let mut manager = Manager::with_settings(quick_settings());
    let ponger = manager.manage("ponger", Ponger::default());
    manager.init().unwrap();

    for seq in 0..3 {
        let reply = ponger.fast_send(Ping { seq }, None).unwrap();
        assert_eq!(reply.downcast::<Pong>().unwrap(), Pong { seq });
    }

    manager.end();
}

#[test_log::test]
fn test_fast_send_without_reply_keeps_blocking() {
    let mut manager = Manager::with_settings(quick_settings());
    let ponger = manager.manage("ponger", Ponger::default());
    manager.init().unwrap();

    let returned = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&returned);
    let caller = ponger.clone();
    thread::spawn(move || {
        let _ = caller.fast_send(Silent, None);
        flag.store(true, Ordering::SeqCst);
    });

    thread::sleep(Duration::from_millis(200));
    assert!(!returned.load(Ordering::SeqCst));

    manager.end();
}

#[test_log::test]
fn test_reply_without_sender_is_dropped() {
    let mut manager = Manager::with_settings(quick_settings());
    let ponger = manager.manage("ponger", Ponger::default());
    manager.init().unwrap();

    ponger.send(Ping { seq: 9 }, None).unwrap();
    // Still serving afterwards
    let reply = ponger.fast_send(Ping { seq: 10 }, None).unwrap();
    assert_eq!(reply.downcast_ref::<Pong>(), Some(&Pong { seq: 10 }));

    manager.end();
}

/// Fails on its first `Ping`
struct Fragile {
    ended: Arc<AtomicBool>,
    handled: Arc<AtomicUsize>,
}

impl Fragile {
    fn on_ping(&mut self, _ctx: &Context, envelope: Envelope<Ping>) -> Result<()> {
        self.handled.fetch_add(1, Ordering::SeqCst);
        Err(ActorError::handler(format!("cannot handle ping {}", envelope.message.seq)))
    }
}

impl Actor for Fragile {
    fn handlers(handlers: &mut Handlers<Self>) {
        handlers.on::<Ping, _>(Self::on_ping);
    }

    fn end(&mut self, _ctx: &Context) {
        self.ended.store(true, Ordering::SeqCst);
    }
}

#[test_log::test]
fn test_handler_error_stops_the_actor_without_end() {
    let mut manager = Manager::with_settings(quick_settings());
    let ended = Arc::new(AtomicBool::new(false));
    let handled = Arc::new(AtomicUsize::new(0));
    let fragile = manager.manage(
        "fragile",
        Fragile {
            ended: Arc::clone(&ended),
            handled: Arc::clone(&handled),
        },
    );
    manager.init().unwrap();

    fragile.send(Ping { seq: 1 }, None).unwrap();
    let deadline = Instant::now() + Duration::from_secs(2);
    while handled.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    thread::sleep(Duration::from_millis(50));

    // Mailbox receiver is gone with the thread
    assert!(fragile.send(Ping { seq: 2 }, None).is_err());

    manager.end();
    assert_eq!(handled.load(Ordering::SeqCst), 1);
    assert!(!ended.load(Ordering::SeqCst));
}
