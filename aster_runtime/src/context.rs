use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use serde::Serialize;

use crate::clock::{Clock, TimeSource};
use crate::entity::{EntityId, EntityStore};
use crate::events::{EngineEvent, Listener};
use crate::host::{InputService, PhysicsService, RenderService, SceneService};
use crate::journal::JournalHandle;
use crate::registry::ListenerRegistry;
use crate::trigger::TriggerSet;

/// Host device bundle handed to the context at construction.
pub struct HostServices {
    pub time: Box<dyn TimeSource>,
    pub physics: Box<dyn PhysicsService>,
    pub render: Box<dyn RenderService>,
    pub scene: Box<dyn SceneService>,
    pub input: Box<dyn InputService>,
}

/// The slice of engine state a script may touch during a broadcast.
///
/// The listener registry is deliberately absent: a callback cannot
/// register or unregister listeners while a broadcast is iterating them.
pub struct ScriptContext<'a> {
    pub clock: &'a Clock,
    pub journal: &'a JournalHandle,
    pub physics: &'a mut dyn PhysicsService,
    pub render: &'a mut dyn RenderService,
    pub entities: &'a mut EntityStore,
    pub triggers: &'a mut TriggerSet,
}

/// Everything the runtime owns: host devices, clock, listener registry,
/// trigger arena, entity store, and the run journal. There are no ambient
/// globals; whoever drives the frame loop owns exactly one of these.
pub struct EngineContext {
    pub time: Box<dyn TimeSource>,
    pub physics: Box<dyn PhysicsService>,
    pub render: Box<dyn RenderService>,
    pub scene: Box<dyn SceneService>,
    pub input: Box<dyn InputService>,
    pub clock: Clock,
    pub registry: ListenerRegistry,
    pub triggers: TriggerSet,
    pub entities: EntityStore,
    pub journal: JournalHandle,
}

impl EngineContext {
    pub fn new(services: HostServices) -> Self {
        EngineContext {
            time: services.time,
            physics: services.physics,
            render: services.render,
            scene: services.scene,
            input: services.input,
            clock: Clock::new(),
            registry: ListenerRegistry::new(),
            triggers: TriggerSet::new(),
            entities: EntityStore::new(1),
            journal: JournalHandle::new(),
        }
    }

    /// Splits the context into the registry and the script-visible
    /// remainder; the two borrows are disjoint, so the registry can iterate
    /// listeners while they mutate the rest.
    fn split_for_dispatch(&mut self) -> (&mut ListenerRegistry, ScriptContext<'_>) {
        let EngineContext {
            registry,
            clock,
            journal,
            physics,
            render,
            entities,
            triggers,
            ..
        } = self;
        (
            registry,
            ScriptContext {
                clock,
                journal,
                physics: physics.as_mut(),
                render: render.as_mut(),
                entities,
                triggers,
            },
        )
    }

    /// Broadcasts one event through the registry with script access to the
    /// rest of the context.
    pub fn dispatch(&mut self, event: &EngineEvent) -> Result<()> {
        let (registry, mut scope) = self.split_for_dispatch();
        registry.dispatch(event, &mut scope)
    }

    /// Registers a free-standing listener (one not owned by an entity).
    pub fn register_listener(&mut self, listener: &Rc<RefCell<dyn Listener>>) -> Result<()> {
        let (registry, mut scope) = self.split_for_dispatch();
        registry.register(listener, &mut scope)
    }

    /// Attaches a behavior to an entity and wires it into the broadcast
    /// order. After launch, Awake and Start are delivered before this
    /// returns.
    pub fn add_behavior(
        &mut self,
        id: EntityId,
        behavior: Rc<RefCell<dyn Listener>>,
    ) -> Result<()> {
        self.entities.attach(id, behavior.clone())?;
        self.register_listener(&behavior)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frame_count: self.clock.frame_count(),
            elapsed_seconds: self.clock.elapsed().as_secs_f64(),
            entities: self.entities.len(),
            journal_entries: self.journal.len(),
        }
    }
}

/// End-of-run totals, serialized by drivers next to the journal.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub frame_count: u64,
    pub elapsed_seconds: f64,
    pub entities: usize,
    pub journal_entries: usize,
}
