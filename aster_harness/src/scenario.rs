//! The demo scene: the per-object scripts the runtime exists to drive.
//!
//! A trigger zone that journals enter/exit episodes, a platform spawner
//! that requests a new entity every couple of seconds, and a HUD overlay
//! that queues a status line per rendered frame.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use glam::Vec3;
use serde_json::Value;

use aster_runtime::{
    BodyTag, EngineContext, EntityId, Listener, ScriptContext, TriggerId, TriggerShapeDesc,
};

use crate::stubs::{ContactCue, ContactTimeline};

pub type SpawnQueue = Rc<RefCell<Vec<String>>>;

/// Requests a platform spawn every `interval` update phases.
///
/// Spawning itself is deferred to the driver between frames: creating the
/// entity is harmless mid-broadcast, but attaching behaviors to it would
/// need the registry, which scripts deliberately cannot reach.
pub struct PlatformSpawner {
    queue: SpawnQueue,
    interval: u64,
    countdown: u64,
    serial: u64,
}

impl PlatformSpawner {
    pub fn new(queue: SpawnQueue, interval: u64) -> Self {
        PlatformSpawner {
            queue,
            interval,
            countdown: interval,
            serial: 0,
        }
    }
}

impl Listener for PlatformSpawner {
    fn on_update(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
        self.countdown -= 1;
        if self.countdown == 0 {
            self.countdown = self.interval;
            self.serial += 1;
            self.queue
                .borrow_mut()
                .push(format!("platform-{}", self.serial));
        }
        Ok(())
    }
}

/// HUD script: one status line per rendered frame, plus markers for the
/// host notifications it observes.
pub struct OverlayScript;

impl Listener for OverlayScript {
    fn on_start(&mut self, ctx: &mut ScriptContext<'_>) -> Result<()> {
        ctx.journal.record("overlay.ready");
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut ScriptContext<'_>) -> Result<()> {
        let line = format!(
            "frame {:>5}  t={:.2}s",
            ctx.clock.frame_count(),
            ctx.clock.elapsed().as_secs_f32()
        );
        ctx.render.queue_text(&line);
        Ok(())
    }

    fn on_resolution_change(&mut self, ctx: &mut ScriptContext<'_>) -> Result<()> {
        let viewport = ctx.render.viewport();
        ctx.journal
            .record(format!("overlay.resize {}x{}", viewport.width, viewport.height));
        Ok(())
    }

    fn on_external_message(
        &mut self,
        ctx: &mut ScriptContext<'_>,
        topic: &str,
        _payload: &Value,
    ) -> Result<()> {
        ctx.journal.record(format!("message.received {topic}"));
        Ok(())
    }

    fn on_asset_updated(&mut self, ctx: &mut ScriptContext<'_>, path: &str) -> Result<()> {
        ctx.journal.record(format!("asset.updated {path}"));
        Ok(())
    }

    fn on_application_quit(&mut self, ctx: &mut ScriptContext<'_>) -> Result<()> {
        ctx.journal.record("overlay.quit");
        Ok(())
    }
}

/// Arms a unit trigger volume at the origin and journals its episodes.
pub struct TriggerZoneScript {
    name: String,
    zone: Option<TriggerId>,
}

impl TriggerZoneScript {
    pub fn new(name: impl Into<String>) -> Self {
        TriggerZoneScript {
            name: name.into(),
            zone: None,
        }
    }
}

impl Listener for TriggerZoneScript {
    fn on_start(&mut self, ctx: &mut ScriptContext<'_>) -> Result<()> {
        let id = ctx.triggers.create();
        let enter_journal = ctx.journal.clone();
        let exit_journal = ctx.journal.clone();
        let enter_name = self.name.clone();
        let exit_name = self.name.clone();
        ctx.triggers.init(
            id,
            &mut *ctx.physics,
            TriggerShapeDesc::new(Vec3::ZERO, Vec3::ONE),
            Box::new(move |entity| {
                enter_journal.record(format!("trigger.enter {} {}", enter_name, entity.0));
            }),
            Some(Box::new(move |entity| {
                exit_journal.record(format!("trigger.exit {} {}", exit_name, entity.0));
            })),
        );
        self.zone = Some(id);
        ctx.journal.record(format!("trigger.armed {}", self.name));
        Ok(())
    }

    fn on_application_quit(&mut self, ctx: &mut ScriptContext<'_>) -> Result<()> {
        if let Some(id) = self.zone.take() {
            ctx.triggers.destroy(id, &mut *ctx.physics);
            ctx.journal.record(format!("trigger.disarmed {}", self.name));
        }
        Ok(())
    }
}

/// Entities and shared queues created by [`install`].
pub struct Scenario {
    pub spawn_queue: SpawnQueue,
    pub spawner: EntityId,
    pub probe: EntityId,
}

impl Scenario {
    /// Applies deferred spawn requests between frames.
    pub fn apply_spawns(&self, ctx: &mut EngineContext) {
        for name in self.spawn_queue.borrow_mut().drain(..) {
            let id = ctx.entities.create(&name, Some(self.spawner));
            ctx.journal.record(format!("spawn.platform {} {}", name, id.0));
        }
    }
}

/// Creates the demo entities and wires their scripts into dispatch.
pub fn install(ctx: &mut EngineContext) -> Result<Scenario> {
    let zone = ctx.entities.create("trigger-zone", None);
    ctx.add_behavior(zone, Rc::new(RefCell::new(TriggerZoneScript::new("gate"))))?;

    let spawner = ctx.entities.create("platform-spawner", None);
    let spawn_queue = SpawnQueue::default();
    ctx.add_behavior(
        spawner,
        Rc::new(RefCell::new(PlatformSpawner::new(spawn_queue.clone(), 24))),
    )?;

    let overlay = ctx.entities.create("hud-overlay", None);
    ctx.add_behavior(overlay, Rc::new(RefCell::new(OverlayScript)))?;

    let probe = ctx.entities.create("probe", None);

    Ok(Scenario {
        spawn_queue,
        spawner,
        probe,
    })
}

/// Scripts the probe's flight through the gate volume: enter with two
/// contact points, leave, then a second clean pass. The zone script arms
/// the arena's first trigger slot during Start.
pub fn script_probe_flight(timeline: &ContactTimeline, probe: EntityId) {
    let zone = BodyTag::Trigger(TriggerId(0));
    let probe = BodyTag::Entity(probe);

    let added = |first, second| ContactCue::Added { first, second };
    let removed = |first, second, remaining| ContactCue::Removed {
        first,
        second,
        remaining,
    };

    timeline.push(10, added(zone, probe));
    // A second contact point for the same pair; must not re-enter.
    timeline.push(12, added(zone, probe));
    timeline.push(40, removed(zone, probe, 1));
    timeline.push(41, removed(zone, probe, 0));
    // Second pass, with the operands swapped the way the physics engine
    // sometimes reports them.
    timeline.push(70, added(probe, zone));
    timeline.push(90, removed(probe, zone, 0));
}
