use anyhow::{Context, Result};

use crate::context::EngineContext;
use crate::events::EngineEvent;
use crate::host::ViewportSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerState {
    Uninitialized,
    Running,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerOptions {
    /// Draw the physics debug overlay on every rendered frame.
    pub debug_physics: bool,
}

/// Drives one full frame per [`FrameScheduler::advance`] call.
///
/// The first call performs first-frame clock setup and moves the scheduler
/// to `Running`, where it stays; there is no terminal state. Phase order
/// within a frame is fixed and must not be reordered:
/// viewport sample, clock, physics, animation, scene, Update broadcast,
/// camera, render block, input edge reset.
pub struct FrameScheduler {
    state: SchedulerState,
    options: SchedulerOptions,
    last_viewport: Option<ViewportSize>,
}

impl FrameScheduler {
    pub fn new(options: SchedulerOptions) -> Self {
        FrameScheduler {
            state: SchedulerState::Uninitialized,
            options,
            last_viewport: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Runs one frame to completion. A listener failure in the Update or
    /// Render broadcast propagates immediately; there is no partial-frame
    /// recovery, and the caller decides whether to keep advancing.
    pub fn advance(&mut self, ctx: &mut EngineContext) -> Result<()> {
        let viewport = ctx.render.viewport();
        let resized = self
            .last_viewport
            .map(|previous| previous != viewport)
            .unwrap_or(false);
        self.last_viewport = Some(viewport);

        let now = ctx.time.now();
        match self.state {
            SchedulerState::Uninitialized => {
                ctx.clock.on_first_frame(now);
                self.state = SchedulerState::Running;
            }
            SchedulerState::Running => ctx.clock.on_next_frame(now),
        }
        let delta = ctx.clock.delta();
        ctx.journal.set_frame(ctx.clock.frame_count());

        // Trigger enter/exit callbacks fire from inside the step.
        ctx.physics.step(delta, &mut ctx.triggers);

        ctx.scene.visit_skinned_nodes(&mut |node| {
            if !node.is_disabled() {
                node.advance(delta);
                node.update();
            }
        });
        ctx.scene.update(delta);

        ctx.dispatch(&EngineEvent::Update)
            .context("broadcasting the update phase")?;

        ctx.render.update_camera();

        if ctx.render.begin_frame() {
            ctx.render.clear();
            if resized {
                ctx.dispatch(&EngineEvent::ResolutionChange)
                    .context("broadcasting the resolution change")?;
                ctx.render.resize_backdrop(viewport);
            }
            ctx.render.begin_sprite_pass();
            ctx.render.draw_backdrop();
            ctx.render.end_sprite_pass();
            ctx.render.update_and_draw();
            if self.options.debug_physics {
                ctx.render.draw_physics_debug();
            }
            ctx.dispatch(&EngineEvent::Render)
                .context("broadcasting the render phase")?;
            ctx.render.flush_text();
            ctx.render.end_frame();
        }

        ctx.input.reset_pressed_edges();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

    use anyhow::Result;

    use super::*;
    use crate::context::{HostServices, ScriptContext};
    use crate::events::Listener;
    use crate::headless::FixedStepTime;
    use crate::host::{
        BodyHandle, BodyTag, ContactSink, InputService, PhysicsService, RenderService,
        SceneService, SkinnedNode, TriggerShapeDesc,
    };

    type Log = Rc<RefCell<Vec<String>>>;

    fn push(log: &Log, label: &str) {
        log.borrow_mut().push(label.to_string());
    }

    struct RecordingPhysics {
        log: Log,
    }

    impl PhysicsService for RecordingPhysics {
        fn create_trigger_body(&mut self, _desc: &TriggerShapeDesc, _tag: BodyTag) -> BodyHandle {
            BodyHandle(1)
        }

        fn add_body(&mut self, _body: BodyHandle) {}
        fn remove_body(&mut self, _body: BodyHandle) {}

        fn step(&mut self, _delta: Duration, _contacts: &mut dyn ContactSink) {
            push(&self.log, "physics.step");
        }
    }

    struct RecordingRender {
        log: Log,
        viewport: Rc<Cell<ViewportSize>>,
        accept: Rc<Cell<bool>>,
    }

    impl RenderService for RecordingRender {
        fn viewport(&self) -> ViewportSize {
            self.viewport.get()
        }

        fn begin_frame(&mut self) -> bool {
            let accepted = self.accept.get();
            push(
                &self.log,
                if accepted {
                    "render.begin"
                } else {
                    "render.rejected"
                },
            );
            accepted
        }

        fn clear(&mut self) {
            push(&self.log, "render.clear");
        }

        fn update_camera(&mut self) {
            push(&self.log, "render.camera");
        }

        fn resize_backdrop(&mut self, _size: ViewportSize) {
            push(&self.log, "render.resize_backdrop");
        }

        fn begin_sprite_pass(&mut self) {
            push(&self.log, "render.sprite_begin");
        }

        fn draw_backdrop(&mut self) {
            push(&self.log, "render.backdrop");
        }

        fn end_sprite_pass(&mut self) {
            push(&self.log, "render.sprite_end");
        }

        fn update_and_draw(&mut self) {
            push(&self.log, "render.draw");
        }

        fn draw_physics_debug(&mut self) {
            push(&self.log, "render.debug");
        }

        fn queue_text(&mut self, _text: &str) {}

        fn flush_text(&mut self) {
            push(&self.log, "render.flush_text");
        }

        fn end_frame(&mut self) {
            push(&self.log, "render.end");
        }
    }

    struct RecordingNode {
        log: Log,
        disabled: bool,
    }

    impl SkinnedNode for RecordingNode {
        fn is_disabled(&self) -> bool {
            self.disabled
        }

        fn advance(&mut self, _delta: Duration) {
            push(&self.log, "node.advance");
        }

        fn update(&mut self) {
            push(&self.log, "node.update");
        }
    }

    struct RecordingScene {
        log: Log,
        nodes: Vec<RecordingNode>,
    }

    impl SceneService for RecordingScene {
        fn update(&mut self, _delta: Duration) {
            push(&self.log, "scene.update");
        }

        fn visit_skinned_nodes(&mut self, visit: &mut dyn FnMut(&mut dyn SkinnedNode)) {
            for node in &mut self.nodes {
                visit(node);
            }
        }
    }

    struct RecordingInput {
        log: Log,
    }

    impl InputService for RecordingInput {
        fn reset_pressed_edges(&mut self) {
            push(&self.log, "input.reset");
        }
    }

    struct PhaseEcho {
        log: Log,
    }

    impl Listener for PhaseEcho {
        fn on_update(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
            push(&self.log, "script.update");
            Ok(())
        }

        fn on_render(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
            push(&self.log, "script.render");
            Ok(())
        }

        fn on_resolution_change(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
            push(&self.log, "script.resolution");
            Ok(())
        }
    }

    struct Rig {
        ctx: EngineContext,
        log: Log,
        viewport: Rc<Cell<ViewportSize>>,
        accept: Rc<Cell<bool>>,
        _echo: Rc<RefCell<dyn Listener>>,
    }

    fn rig() -> Rig {
        let log: Log = Rc::default();
        let viewport = Rc::new(Cell::new(ViewportSize {
            width: 640,
            height: 360,
        }));
        let accept = Rc::new(Cell::new(true));
        let services = HostServices {
            time: Box::new(FixedStepTime::new(Duration::from_millis(16))),
            physics: Box::new(RecordingPhysics { log: log.clone() }),
            render: Box::new(RecordingRender {
                log: log.clone(),
                viewport: viewport.clone(),
                accept: accept.clone(),
            }),
            scene: Box::new(RecordingScene {
                log: log.clone(),
                nodes: vec![
                    RecordingNode {
                        log: log.clone(),
                        disabled: false,
                    },
                    RecordingNode {
                        log: log.clone(),
                        disabled: true,
                    },
                ],
            }),
            input: Box::new(RecordingInput { log: log.clone() }),
        };
        let mut ctx = EngineContext::new(services);
        let echo: Rc<RefCell<dyn Listener>> = Rc::new(RefCell::new(PhaseEcho { log: log.clone() }));
        ctx.register_listener(&echo).expect("register echo");
        Rig {
            ctx,
            log,
            viewport,
            accept,
            _echo: echo,
        }
    }

    const FULL_FRAME: [&str; 13] = [
        "physics.step",
        "node.advance",
        "node.update",
        "scene.update",
        "script.update",
        "render.camera",
        "render.begin",
        "render.clear",
        "render.sprite_begin",
        "render.backdrop",
        "render.sprite_end",
        "render.draw",
        "script.render",
    ];

    #[test]
    fn frame_phases_run_in_fixed_order() {
        let mut rig = rig();
        let mut scheduler = FrameScheduler::new(SchedulerOptions::default());
        scheduler.advance(&mut rig.ctx).expect("frame");

        let mut expected: Vec<&str> = FULL_FRAME.to_vec();
        expected.extend(["render.flush_text", "render.end", "input.reset"]);
        assert_eq!(rig.log.borrow().as_slice(), expected.as_slice());
        assert!(scheduler.is_running());
    }

    #[test]
    fn first_frame_initializes_the_clock() {
        let mut rig = rig();
        let mut scheduler = FrameScheduler::new(SchedulerOptions::default());

        scheduler.advance(&mut rig.ctx).expect("frame");
        assert_eq!(rig.ctx.clock.frame_count(), 0);
        assert_eq!(rig.ctx.clock.delta(), Duration::ZERO);

        scheduler.advance(&mut rig.ctx).expect("frame");
        assert_eq!(rig.ctx.clock.frame_count(), 1);
        assert_eq!(rig.ctx.clock.delta(), Duration::from_millis(16));
    }

    #[test]
    fn rejected_frames_skip_the_render_block_only() {
        let mut rig = rig();
        let mut scheduler = FrameScheduler::new(SchedulerOptions::default());
        rig.accept.set(false);
        scheduler.advance(&mut rig.ctx).expect("frame");

        assert_eq!(
            rig.log.borrow().as_slice(),
            [
                "physics.step",
                "node.advance",
                "node.update",
                "scene.update",
                "script.update",
                "render.camera",
                "render.rejected",
                "input.reset",
            ]
        );
    }

    #[test]
    fn resolution_change_fires_once_per_actual_change() {
        let mut rig = rig();
        let mut scheduler = FrameScheduler::new(SchedulerOptions::default());
        scheduler.advance(&mut rig.ctx).expect("frame");

        rig.viewport.set(ViewportSize {
            width: 1024,
            height: 576,
        });
        rig.log.borrow_mut().clear();
        scheduler.advance(&mut rig.ctx).expect("frame");

        let log = rig.log.borrow();
        let resolution_events = log.iter().filter(|l| *l == "script.resolution").count();
        assert_eq!(resolution_events, 1);
        let clear_at = log.iter().position(|l| l == "render.clear").expect("clear");
        let change_at = log
            .iter()
            .position(|l| l == "script.resolution")
            .expect("change");
        let resize_at = log
            .iter()
            .position(|l| l == "render.resize_backdrop")
            .expect("resize");
        assert!(clear_at < change_at && change_at < resize_at);
        drop(log);

        // Stable viewport afterwards: no further notifications.
        rig.log.borrow_mut().clear();
        scheduler.advance(&mut rig.ctx).expect("frame");
        assert!(!rig.log.borrow().iter().any(|l| l == "script.resolution"));
    }

    #[test]
    fn debug_overlay_draws_when_enabled() {
        let mut rig = rig();
        let mut scheduler = FrameScheduler::new(SchedulerOptions {
            debug_physics: true,
        });
        scheduler.advance(&mut rig.ctx).expect("frame");
        assert!(rig.log.borrow().iter().any(|l| l == "render.debug"));
    }
}
