use std::cell::RefCell;
use std::rc::{Rc, Weak};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::context::ScriptContext;
use crate::events::{EngineEvent, Listener};

/// A listener callback failed mid-broadcast. Listeners earlier in
/// registration order have already run; the rest were never reached.
#[derive(Debug, Error)]
#[error("listener {index} failed during {event} broadcast")]
pub struct DispatchError {
    pub event: &'static str,
    pub index: usize,
    #[source]
    pub source: anyhow::Error,
}

struct ListenerEntry {
    listener: Weak<RefCell<dyn Listener>>,
    // Awake and Start were already delivered through late-registration
    // catch-up; broadcasts of those phases skip this entry.
    caught_up: bool,
}

/// Ordered set of registered listeners plus the launch latch.
///
/// Broadcast order is registration order. The registry holds weak
/// references; entries whose listener has been dropped are pruned as
/// dispatch walks past them.
#[derive(Default)]
pub struct ListenerRegistry {
    entries: Vec<ListenerEntry>,
    launched: bool,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        ListenerRegistry::default()
    }

    /// True once `ProgramStart` has been dispatched. Never reverts.
    pub fn launched(&self) -> bool {
        self.launched
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends the listener to the broadcast order.
    ///
    /// When the program has already launched, Awake and Start are delivered
    /// synchronously before this returns, so a late-created script does not
    /// start life uninitialized. Those two phases are then skipped for this
    /// listener in any later broadcast.
    pub fn register(
        &mut self,
        listener: &Rc<RefCell<dyn Listener>>,
        ctx: &mut ScriptContext<'_>,
    ) -> Result<()> {
        let mut caught_up = false;
        if self.launched {
            let mut guard = listener.borrow_mut();
            guard
                .on_awake(ctx)
                .context("delivering catch-up awake to a late listener")?;
            guard
                .on_start(ctx)
                .context("delivering catch-up start to a late listener")?;
            caught_up = true;
        }
        self.entries.push(ListenerEntry {
            listener: Rc::downgrade(listener),
            caught_up,
        });
        Ok(())
    }

    /// Notifies every live listener in registration order.
    ///
    /// Dispatching `ProgramStart` flips the launch latch before any
    /// listener is notified. A callback error aborts the remainder of the
    /// broadcast and surfaces as a [`DispatchError`].
    pub fn dispatch(&mut self, event: &EngineEvent, ctx: &mut ScriptContext<'_>) -> Result<()> {
        if matches!(event, EngineEvent::ProgramStart) {
            self.launched = true;
        }
        let skip_caught_up = matches!(event, EngineEvent::Awake | EngineEvent::Start);

        let mut index = 0;
        while index < self.entries.len() {
            let Some(listener) = self.entries[index].listener.upgrade() else {
                self.entries.remove(index);
                continue;
            };
            if skip_caught_up && self.entries[index].caught_up {
                index += 1;
                continue;
            }
            let outcome = deliver(&mut *listener.borrow_mut(), event, ctx);
            if let Err(source) = outcome {
                return Err(DispatchError {
                    event: event.label(),
                    index,
                    source,
                }
                .into());
            }
            index += 1;
        }
        Ok(())
    }
}

fn deliver(
    listener: &mut dyn Listener,
    event: &EngineEvent,
    ctx: &mut ScriptContext<'_>,
) -> Result<()> {
    match event {
        EngineEvent::ProgramStart => listener.on_program_start(ctx),
        EngineEvent::Awake => listener.on_awake(ctx),
        EngineEvent::Start => listener.on_start(ctx),
        EngineEvent::PostStart => listener.on_post_start(ctx),
        EngineEvent::Update => listener.on_update(ctx),
        EngineEvent::Render => listener.on_render(ctx),
        EngineEvent::ResolutionChange => listener.on_resolution_change(ctx),
        EngineEvent::ExternalMessage { topic, payload } => {
            listener.on_external_message(ctx, topic, payload)
        }
        EngineEvent::ApplicationQuit => listener.on_application_quit(ctx),
        EngineEvent::AssetUpdated { path } => listener.on_asset_updated(ctx, path),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use serde_json::{json, Value};

    use super::*;
    use crate::clock::Clock;
    use crate::entity::EntityStore;
    use crate::headless::{NullPhysics, NullRender};
    use crate::journal::JournalHandle;
    use crate::trigger::TriggerSet;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Scope {
        clock: Clock,
        journal: JournalHandle,
        physics: NullPhysics,
        render: NullRender,
        entities: EntityStore,
        triggers: TriggerSet,
    }

    impl Scope {
        fn new() -> Self {
            Scope {
                clock: Clock::new(),
                journal: JournalHandle::new(),
                physics: NullPhysics::default(),
                render: NullRender::default(),
                entities: EntityStore::new(1),
                triggers: TriggerSet::new(),
            }
        }

        fn ctx(&mut self) -> ScriptContext<'_> {
            ScriptContext {
                clock: &self.clock,
                journal: &self.journal,
                physics: &mut self.physics,
                render: &mut self.render,
                entities: &mut self.entities,
                triggers: &mut self.triggers,
            }
        }
    }

    struct Recorder {
        name: &'static str,
        log: Log,
    }

    impl Recorder {
        fn shared(name: &'static str, log: &Log) -> Rc<RefCell<dyn Listener>> {
            Rc::new(RefCell::new(Recorder {
                name,
                log: log.clone(),
            }))
        }

        fn push(&self, phase: &str) {
            self.log.borrow_mut().push(format!("{}:{}", self.name, phase));
        }
    }

    impl Listener for Recorder {
        fn on_program_start(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
            self.push("program_start");
            Ok(())
        }

        fn on_awake(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
            self.push("awake");
            Ok(())
        }

        fn on_start(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
            self.push("start");
            Ok(())
        }

        fn on_update(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
            self.push("update");
            Ok(())
        }

        fn on_external_message(
            &mut self,
            _ctx: &mut ScriptContext<'_>,
            topic: &str,
            payload: &Value,
        ) -> Result<()> {
            self.log
                .borrow_mut()
                .push(format!("{}:message {} {}", self.name, topic, payload));
            Ok(())
        }
    }

    #[test]
    fn program_start_runs_in_registration_order() {
        let mut scope = Scope::new();
        let mut registry = ListenerRegistry::new();
        let log: Log = Rc::default();
        let first = Recorder::shared("first", &log);
        let second = Recorder::shared("second", &log);

        registry.register(&first, &mut scope.ctx()).expect("register");
        registry.register(&second, &mut scope.ctx()).expect("register");
        registry
            .dispatch(&EngineEvent::ProgramStart, &mut scope.ctx())
            .expect("dispatch");

        assert!(registry.launched());
        assert_eq!(
            log.borrow().as_slice(),
            ["first:program_start", "second:program_start"]
        );
    }

    #[test]
    fn late_registration_catches_up_exactly_once() {
        let mut scope = Scope::new();
        let mut registry = ListenerRegistry::new();
        let log: Log = Rc::default();
        let early = Recorder::shared("early", &log);

        registry.register(&early, &mut scope.ctx()).expect("register");
        for event in [EngineEvent::ProgramStart, EngineEvent::Awake, EngineEvent::Start] {
            registry.dispatch(&event, &mut scope.ctx()).expect("dispatch");
        }
        log.borrow_mut().clear();

        let late = Recorder::shared("late", &log);
        registry.register(&late, &mut scope.ctx()).expect("register");
        assert_eq!(log.borrow().as_slice(), ["late:awake", "late:start"]);

        // A later broadcast of either phase must not reach the caught-up
        // listener again.
        registry
            .dispatch(&EngineEvent::Awake, &mut scope.ctx())
            .expect("dispatch");
        registry
            .dispatch(&EngineEvent::Start, &mut scope.ctx())
            .expect("dispatch");
        assert_eq!(
            log.borrow().as_slice(),
            ["late:awake", "late:start", "early:awake", "early:start"]
        );
    }

    #[test]
    fn dispatch_without_listeners_is_a_noop() {
        let mut scope = Scope::new();
        let mut registry = ListenerRegistry::new();
        registry
            .dispatch(&EngineEvent::Update, &mut scope.ctx())
            .expect("empty dispatch should not fail");
    }

    #[test]
    fn unimplemented_phases_are_silent() {
        struct UpdateOnly {
            log: Log,
        }

        impl Listener for UpdateOnly {
            fn on_update(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
                self.log.borrow_mut().push("update".to_string());
                Ok(())
            }
        }

        let mut scope = Scope::new();
        let mut registry = ListenerRegistry::new();
        let log: Log = Rc::default();
        let listener: Rc<RefCell<dyn Listener>> =
            Rc::new(RefCell::new(UpdateOnly { log: log.clone() }));
        registry.register(&listener, &mut scope.ctx()).expect("register");

        for event in [EngineEvent::Awake, EngineEvent::Start, EngineEvent::Update] {
            registry.dispatch(&event, &mut scope.ctx()).expect("dispatch");
        }
        assert_eq!(log.borrow().as_slice(), ["update"]);
    }

    #[test]
    fn payloads_reach_message_listeners() {
        let mut scope = Scope::new();
        let mut registry = ListenerRegistry::new();
        let log: Log = Rc::default();
        let listener = Recorder::shared("hud", &log);
        registry.register(&listener, &mut scope.ctx()).expect("register");

        registry
            .dispatch(
                &EngineEvent::ExternalMessage {
                    topic: "ping".to_string(),
                    payload: json!({"frame": 3}),
                },
                &mut scope.ctx(),
            )
            .expect("dispatch");

        assert_eq!(log.borrow().as_slice(), [r#"hud:message ping {"frame":3}"#]);
    }

    #[test]
    fn dropped_listeners_are_pruned_during_dispatch() {
        let mut scope = Scope::new();
        let mut registry = ListenerRegistry::new();
        let log: Log = Rc::default();
        let keeper = Recorder::shared("keeper", &log);
        let goner = Recorder::shared("goner", &log);

        registry.register(&goner, &mut scope.ctx()).expect("register");
        registry.register(&keeper, &mut scope.ctx()).expect("register");
        drop(goner);

        registry
            .dispatch(&EngineEvent::Update, &mut scope.ctx())
            .expect("dispatch");
        assert_eq!(log.borrow().as_slice(), ["keeper:update"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn a_failing_listener_aborts_the_broadcast() {
        struct Failing;

        impl Listener for Failing {
            fn on_update(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
                Err(anyhow!("script blew up"))
            }
        }

        let mut scope = Scope::new();
        let mut registry = ListenerRegistry::new();
        let log: Log = Rc::default();
        let first = Recorder::shared("first", &log);
        let failing: Rc<RefCell<dyn Listener>> = Rc::new(RefCell::new(Failing));
        let unreached = Recorder::shared("unreached", &log);

        registry.register(&first, &mut scope.ctx()).expect("register");
        registry.register(&failing, &mut scope.ctx()).expect("register");
        registry.register(&unreached, &mut scope.ctx()).expect("register");

        let err = registry
            .dispatch(&EngineEvent::Update, &mut scope.ctx())
            .expect_err("broadcast should fail");
        let dispatch_err = err.downcast_ref::<DispatchError>().expect("typed error");
        assert_eq!(dispatch_err.event, "update");
        assert_eq!(dispatch_err.index, 1);
        assert_eq!(log.borrow().as_slice(), ["first:update"]);
    }
}
