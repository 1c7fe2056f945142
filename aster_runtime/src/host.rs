//! Trait contracts for the host engine's devices.
//!
//! The runtime never links against a renderer or a physics library; the
//! embedding application hands it one implementation of each trait below
//! and the scheduler calls them in a fixed order every frame.

use std::time::Duration;

use glam::Vec3;
use serde::Serialize;

use crate::entity::EntityId;
use crate::trigger::TriggerId;

/// Role marker carried in a collision object's user-data slot.
///
/// Contact routing tests these tags for equality; a body without a tag
/// never produces gameplay notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyTag {
    Trigger(TriggerId),
    Entity(EntityId),
    Untagged,
}

/// Opaque handle to a collision object owned by the physics service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub u64);

/// Construction parameters for a trigger-flagged box collision object.
#[derive(Debug, Clone, Copy)]
pub struct TriggerShapeDesc {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub margin: f32,
    pub filter_group: u16,
    pub filter_mask: u16,
}

impl TriggerShapeDesc {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        TriggerShapeDesc {
            center,
            half_extents,
            margin: 0.04,
            filter_group: 1,
            filter_mask: u16::MAX,
        }
    }
}

/// Receives raw contact transitions while the physics world steps.
///
/// The trigger arena implements this; the physics service must call it
/// synchronously from inside [`PhysicsService::step`].
pub trait ContactSink {
    fn contact_added(&mut self, first: BodyTag, second: BodyTag);

    /// `remaining` is the number of contact points still reported for the
    /// pair after this removal.
    fn contact_removed(&mut self, first: BodyTag, second: BodyTag, remaining: u32);
}

pub trait PhysicsService {
    fn create_trigger_body(&mut self, desc: &TriggerShapeDesc, tag: BodyTag) -> BodyHandle;
    fn add_body(&mut self, body: BodyHandle);
    fn remove_body(&mut self, body: BodyHandle);
    fn step(&mut self, delta: Duration, contacts: &mut dyn ContactSink);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

pub trait RenderService {
    fn viewport(&self) -> ViewportSize;

    /// Returns false when the device refuses a frame (occluded window,
    /// lost surface); the scheduler then skips the whole render block.
    fn begin_frame(&mut self) -> bool;

    fn clear(&mut self);
    fn update_camera(&mut self);
    fn resize_backdrop(&mut self, size: ViewportSize);
    fn begin_sprite_pass(&mut self);
    fn draw_backdrop(&mut self);
    fn end_sprite_pass(&mut self);
    fn update_and_draw(&mut self);
    fn draw_physics_debug(&mut self);
    fn queue_text(&mut self, text: &str);
    fn flush_text(&mut self);
    fn end_frame(&mut self);
}

/// One skinned scene node eligible for per-frame animation advancement.
pub trait SkinnedNode {
    fn is_disabled(&self) -> bool;
    fn advance(&mut self, delta: Duration);
    fn update(&mut self);
}

pub trait SceneService {
    fn update(&mut self, delta: Duration);
    fn visit_skinned_nodes(&mut self, visit: &mut dyn FnMut(&mut dyn SkinnedNode));
}

pub trait InputService {
    /// Clears the per-frame "just pressed" edge flags at end of frame.
    fn reset_pressed_edges(&mut self);
}
