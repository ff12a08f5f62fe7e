//! Actor Manager
//!
//! Owns the name to actor table and the lifecycle of every actor thread:
//!
//! - `manage`: bind an actor to a fresh mailbox under a name
//! - `init`: one named OS thread per actor, then `Start`
//! - `run`: block until the [`ManagerHandle`] is terminated
//! - `end`: `Shutdown` to everyone, clear running flags, bounded joins
//!
//! Threads that miss the join deadline are detached and left to finish on
//! their own.

use crate::actor::{Actor, Context, Handlers};
use crate::actor_ref::{ActorAddress, LocalRef};
use crate::mailbox::mailbox;
use crate::messages::{Shutdown, Start};
use crate::timer::TimerIds;
use crate::{ActorError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use switchyard_config::{ActorSettings, RuntimeConfig};
use switchyard_network::Endpoint;
use tracing::{debug, error, info, warn};

/// Step between `is_finished` checks while joining
const JOIN_POLL: Duration = Duration::from_millis(5);

/// Shared termination flag for a manager's run loop
#[derive(Debug, Clone, Default)]
pub struct ManagerHandle {
    terminated: Arc<AtomicBool>,
}

impl ManagerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run loop to return. Idempotent.
    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::Release);
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }
}

/// Name to local reference view shared with the inbound receiver
#[derive(Debug, Clone, Default)]
pub struct Directory {
    entries: Arc<RwLock<HashMap<String, LocalRef>>>,
}

impl Directory {
    pub fn get(&self, name: &str) -> Option<LocalRef> {
        self.entries.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.entries.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn insert(&self, local: LocalRef) -> Option<LocalRef> {
        self.entries.write().insert(local.name().to_string(), local)
    }
}

/// Object-safe body of an actor thread
trait Runnable: Send {
    fn run(self: Box<Self>);
}

struct ActorCell<A: Actor> {
    actor: A,
    ctx: Context,
}

impl<A: Actor> Runnable for ActorCell<A> {
    fn run(self: Box<Self>) {
        let ActorCell { mut actor, ctx } = *self;
        let handlers = Handlers::<A>::for_actor();
        let started = Instant::now();

        debug!(actor = ctx.name(), handlers = handlers.len(), "Actor thread started");

        match actor.run(&ctx, &handlers) {
            Ok(()) => info!(
                actor = ctx.name(),
                runtime_ms = started.elapsed().as_millis() as u64,
                "Actor stopped"
            ),
            Err(e) => error!(
                actor = ctx.name(),
                error = %e,
                category = e.category(),
                runtime_ms = started.elapsed().as_millis() as u64,
                "Actor terminated by handler failure"
            ),
        }
    }
}

enum ActorState {
    Pending(Box<dyn Runnable>),
    Running(JoinHandle<()>),
    Finished,
}

struct ManagedActor {
    myself: LocalRef,
    running: Arc<AtomicBool>,
    state: ActorState,
}

/// Registry and lifecycle controller for one process's actors
pub struct Manager {
    actors: HashMap<String, ManagedActor>,
    directory: Directory,
    handle: ManagerHandle,
    endpoint: Option<Endpoint>,
    settings: ActorSettings,
    timer_ids: Arc<TimerIds>,
}

impl Manager {
    pub fn new() -> Self {
        Self::with_settings(ActorSettings::default())
    }

    pub fn with_settings(settings: ActorSettings) -> Self {
        Self {
            actors: HashMap::new(),
            directory: Directory::default(),
            handle: ManagerHandle::new(),
            endpoint: None,
            settings,
            timer_ids: Arc::new(TimerIds::new()),
        }
    }

    /// Manager with actor timings and advertised endpoint from a loaded config
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        let mut manager = Self::with_settings(config.actors.clone());
        if let Some(endpoint) = &config.remote.endpoint {
            let endpoint = Endpoint::parse(endpoint)
                .map_err(|e| ActorError::configuration(format!("remote.endpoint: {e}")))?;
            manager.set_endpoint(endpoint);
        }
        Ok(manager)
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn set_endpoint(&mut self, endpoint: Endpoint) {
        self.endpoint = Some(endpoint);
    }

    pub fn get_endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    pub fn get_handle(&self) -> ManagerHandle {
        self.handle.clone()
    }

    pub fn directory(&self) -> Directory {
        self.directory.clone()
    }

    pub fn timer_ids(&self) -> Arc<TimerIds> {
        Arc::clone(&self.timer_ids)
    }

    pub fn settings(&self) -> &ActorSettings {
        &self.settings
    }

    /// Bind `actor` to a new mailbox under `name`.
    ///
    /// A name that is already taken is silently rebound to the new actor.
    pub fn manage<A: Actor>(&mut self, name: impl Into<String>, actor: A) -> LocalRef {
        let name = name.into();
        let (myself, inbox) = mailbox(name.clone());
        let running = Arc::new(AtomicBool::new(true));
        let ctx = Context::new(
            myself.clone(),
            inbox,
            Arc::clone(&running),
            self.settings.mailbox_poll(),
        );

        self.directory.insert(myself.clone());
        let previous = self.actors.insert(
            name.clone(),
            ManagedActor {
                myself: myself.clone(),
                running,
                state: ActorState::Pending(Box::new(ActorCell { actor, ctx })),
            },
        );

        if previous.is_some() {
            debug!(actor = %name, "Rebound actor name");
        } else {
            debug!(actor = %name, "Managed actor");
        }

        myself
    }

    pub fn get_ref(&self, name: &str) -> Option<LocalRef> {
        self.directory.get(name)
    }

    /// Managed names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.actors.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Start a thread for every actor not yet started, then send it `Start`
    pub fn init(&mut self) -> Result<()> {
        for (name, managed) in self.actors.iter_mut() {
            let runnable = match std::mem::replace(&mut managed.state, ActorState::Finished) {
                ActorState::Pending(runnable) => runnable,
                other => {
                    managed.state = other;
                    continue;
                }
            };

            let handle = thread::Builder::new()
                .name(format!("actor-{name}"))
                .spawn(move || runnable.run())
                .map_err(|e| ActorError::spawn(format!("actor thread for '{name}'"), e))?;
            managed.state = ActorState::Running(handle);

            if let Err(e) = managed.myself.send(Start, None) {
                warn!(actor = %name, error = %e, "Start could not be delivered");
            }
            info!(actor = %name, "Actor started");
        }

        Ok(())
    }

    /// Block until the handle is terminated
    pub fn run(&self) {
        let poll = self.settings.run_poll();
        while !self.handle.is_terminated() {
            thread::sleep(poll);
        }
        debug!("Manager run loop finished");
    }

    /// Broadcast `Shutdown`, stop every actor and join with a bounded wait
    pub fn end(&mut self) {
        for (name, managed) in &self.actors {
            if let Err(e) = managed.myself.send(Shutdown, None) {
                debug!(actor = %name, error = %e, "Shutdown not delivered");
            }
            managed.running.store(false, Ordering::Release);
        }

        let timeout = self.settings.join_timeout();
        for (name, managed) in self.actors.iter_mut() {
            let state = std::mem::replace(&mut managed.state, ActorState::Finished);
            if let ActorState::Running(handle) = state {
                join_bounded(name, handle, timeout);
            }
        }

        info!(actors = self.actors.len(), "Manager shut down");
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("actors", &self.names())
            .field("endpoint", &self.endpoint)
            .field("terminated", &self.handle.is_terminated())
            .finish()
    }
}

fn join_bounded(name: &str, handle: JoinHandle<()>, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            warn!(
                actor = %name,
                timeout_ms = timeout.as_millis() as u64,
                "Actor thread did not stop in time, detaching"
            );
            return;
        }
        thread::sleep(JOIN_POLL);
    }

    if handle.join().is_err() {
        error!(actor = %name, "Actor thread panicked");
    }
}
