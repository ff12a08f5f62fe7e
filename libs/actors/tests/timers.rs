//! Timer scenarios against a managed actor

use crossbeam_channel::{unbounded, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use switchyard::prelude::*;
use switchyard::TimerIds;
use switchyard_config::ActorSettings;

const PERIOD: Duration = Duration::from_millis(50);
const ONE_SHOT: Duration = Duration::from_millis(250);
const TICKS: u32 = 10;

#[derive(Debug, PartialEq)]
enum Fired {
    Tick { count: u32, elapsed: Duration },
    Once { elapsed: Duration },
}

/// Starts a periodic and a one-shot timer on itself. After the tenth
/// periodic tick it cancels that timer and ends the system.
struct Metronome {
    ids: Arc<TimerIds>,
    handle: ManagerHandle,
    fired: Sender<Fired>,
    started: Instant,
    periodic: Option<Timer>,
    once: Option<Timer>,
    ticks: u32,
}

impl Metronome {
    fn on_start(&mut self, ctx: &Context, _envelope: Envelope<Start>) -> Result<()> {
        self.started = Instant::now();
        self.periodic = Some(Timer::periodic(ctx.myself_ref(), PERIOD, self.ids.next_id())?);
        self.once = Some(Timer::once(ctx.myself_ref(), ONE_SHOT, self.ids.next_id())?);
        Ok(())
    }

    fn on_timeout(&mut self, _ctx: &Context, envelope: Envelope<Timeout>) -> Result<()> {
        let id = envelope.message.id;
        let elapsed = self.started.elapsed();

        if let Some(periodic) = self.periodic.as_ref().filter(|t| t.id() == id) {
            self.ticks += 1;
            let _ = self.fired.send(Fired::Tick {
                count: self.ticks,
                elapsed,
            });
            if self.ticks == TICKS {
                periodic.cancel();
                self.handle.terminate();
            }
        } else if self.once.as_ref().is_some_and(|t| t.id() == id) {
            let _ = self.fired.send(Fired::Once { elapsed });
        }
        Ok(())
    }
}

impl Actor for Metronome {
    fn handlers(handlers: &mut Handlers<Self>) {
        handlers
            .on::<Start, _>(Self::on_start)
            .on::<Timeout, _>(Self::on_timeout);
    }
}

fn settings() -> ActorSettings {
    ActorSettings {
        mailbox_poll_ms: 5,
        run_poll_ms: 10,
        join_timeout_ms: 500,
    }
}

#[test_log::test]
fn test_periodic_and_one_shot_timers_share_an_actor() {
    let mut manager = Manager::with_settings(settings());
    let handle = manager.get_handle();
    let ids = manager.timer_ids();
    let (tx, rx) = unbounded();
    manager.manage(
        "metronome",
        Metronome {
            ids,
            handle: handle.clone(),
            fired: tx,
            started: Instant::now(),
            periodic: None,
            once: None,
            ticks: 0,
        },
    );

    let timed_out = Arc::new(AtomicBool::new(false));
    let watchdog = {
        let handle = handle.clone();
        let flag = Arc::clone(&timed_out);
        move || {
            let deadline = Instant::now() + Duration::from_secs(5);
            while !handle.is_terminated() {
                if Instant::now() >= deadline {
                    flag.store(true, Ordering::SeqCst);
                    handle.terminate();
                }
                thread::sleep(Duration::from_millis(10));
            }
        }
    };
    thread::spawn(watchdog);

    manager.init().unwrap();
    manager.run();
    manager.end();
    assert!(!timed_out.load(Ordering::SeqCst), "metronome never terminated the manager");

    let fired: Vec<Fired> = rx.try_iter().collect();
    let ticks: Vec<(u32, Duration)> = fired
        .iter()
        .filter_map(|f| match f {
            Fired::Tick { count, elapsed } => Some((*count, *elapsed)),
            Fired::Once { .. } => None,
        })
        .collect();
    let once: Vec<Duration> = fired
        .iter()
        .filter_map(|f| match f {
            Fired::Once { elapsed } => Some(*elapsed),
            Fired::Tick { .. } => None,
        })
        .collect();

    // Cancelled from the tenth tick; at most one firing was already in flight
    assert!((TICKS as usize..=TICKS as usize + 1).contains(&ticks.len()), "{ticks:?}");
    assert_eq!(
        ticks.iter().map(|(count, _)| *count).take(TICKS as usize).collect::<Vec<_>>(),
        (1..=TICKS).collect::<Vec<_>>()
    );
    let (_, tenth) = ticks[TICKS as usize - 1];
    assert!(tenth >= PERIOD * TICKS);

    assert_eq!(once.len(), 1, "one-shot timer fired {} times", once.len());
    assert!(once[0] >= ONE_SHOT);
}

/// Forwards every timer id with its arrival time
struct Clock {
    ticks: Sender<(TimerId, Instant)>,
}

impl Clock {
    fn on_timeout(&mut self, _ctx: &Context, envelope: Envelope<Timeout>) -> Result<()> {
        let _ = self.ticks.send((envelope.message.id, Instant::now()));
        Ok(())
    }
}

impl Actor for Clock {
    fn handlers(handlers: &mut Handlers<Self>) {
        handlers.on::<Timeout, _>(Self::on_timeout);
    }
}

#[test_log::test]
fn test_timer_stops_when_actor_is_gone() {
    let mut manager = Manager::with_settings(settings());
    let (tx, _rx) = unbounded();
    let clock = ActorRef::Local(manager.manage("clock", Clock { ticks: tx }));
    manager.init().unwrap();

    let timer = Timer::periodic(clock, Duration::from_millis(10), 1).unwrap();
    manager.end();

    let deadline = Instant::now() + Duration::from_secs(2);
    while timer.is_running() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(!timer.is_running());
}
