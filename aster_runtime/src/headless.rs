//! Stand-in host services for headless runs and tests.
//!
//! Every implementation here satisfies its contract with the cheapest
//! possible behavior: the renderer accepts every frame and draws nothing,
//! the physics world reports no contacts, the scene holds no nodes.

use std::time::Duration;

use crate::clock::TimeSource;
use crate::context::HostServices;
use crate::host::{
    BodyHandle, BodyTag, ContactSink, InputService, PhysicsService, RenderService, SceneService,
    SkinnedNode, TriggerShapeDesc, ViewportSize,
};

/// Deterministic time source that advances by a fixed step on every
/// reading, starting from zero.
#[derive(Debug)]
pub struct FixedStepTime {
    current: Duration,
    step: Duration,
}

impl FixedStepTime {
    pub fn new(step: Duration) -> Self {
        FixedStepTime {
            current: Duration::ZERO,
            step,
        }
    }
}

impl TimeSource for FixedStepTime {
    fn now(&mut self) -> Duration {
        let reading = self.current;
        self.current += self.step;
        reading
    }
}

/// Physics service that allocates handles but never reports contacts.
#[derive(Debug, Default)]
pub struct NullPhysics {
    next_body: u64,
}

impl PhysicsService for NullPhysics {
    fn create_trigger_body(&mut self, _desc: &TriggerShapeDesc, _tag: BodyTag) -> BodyHandle {
        self.next_body += 1;
        BodyHandle(self.next_body)
    }

    fn add_body(&mut self, _body: BodyHandle) {}

    fn remove_body(&mut self, _body: BodyHandle) {}

    fn step(&mut self, _delta: Duration, _contacts: &mut dyn ContactSink) {}
}

/// Renderer that accepts every frame and discards all draw calls.
#[derive(Debug)]
pub struct NullRender {
    viewport: ViewportSize,
}

impl NullRender {
    pub fn new(viewport: ViewportSize) -> Self {
        NullRender { viewport }
    }
}

impl Default for NullRender {
    fn default() -> Self {
        NullRender::new(ViewportSize {
            width: 1280,
            height: 720,
        })
    }
}

impl RenderService for NullRender {
    fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    fn begin_frame(&mut self) -> bool {
        true
    }

    fn clear(&mut self) {}
    fn update_camera(&mut self) {}
    fn resize_backdrop(&mut self, _size: ViewportSize) {}
    fn begin_sprite_pass(&mut self) {}
    fn draw_backdrop(&mut self) {}
    fn end_sprite_pass(&mut self) {}
    fn update_and_draw(&mut self) {}
    fn draw_physics_debug(&mut self) {}
    fn queue_text(&mut self, _text: &str) {}
    fn flush_text(&mut self) {}
    fn end_frame(&mut self) {}
}

#[derive(Debug, Default)]
pub struct NullScene;

impl SceneService for NullScene {
    fn update(&mut self, _delta: Duration) {}

    fn visit_skinned_nodes(&mut self, _visit: &mut dyn FnMut(&mut dyn SkinnedNode)) {}
}

#[derive(Debug, Default)]
pub struct NullInput;

impl InputService for NullInput {
    fn reset_pressed_edges(&mut self) {}
}

/// Full headless service bundle with a 16ms fixed-step clock.
pub fn headless_services() -> HostServices {
    HostServices {
        time: Box::new(FixedStepTime::new(Duration::from_millis(16))),
        physics: Box::new(NullPhysics::default()),
        render: Box::new(NullRender::default()),
        scene: Box::new(NullScene),
        input: Box::new(NullInput),
    }
}
