use std::collections::BTreeMap;

use log::warn;
use serde::Serialize;

use crate::entity::EntityId;
use crate::host::{BodyHandle, BodyTag, ContactSink, PhysicsService, TriggerShapeDesc};

/// Index into the trigger arena. Carried as physics user data so raw
/// contact events route back to the owning volume without a back-pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TriggerId(pub u32);

pub type EnterCallback = Box<dyn FnMut(EntityId)>;
pub type ExitCallback = Box<dyn FnMut(EntityId)>;

struct TriggerVolume {
    enabled: bool,
    body: BodyHandle,
    on_enter: EnterCallback,
    on_exit: Option<ExitCallback>,
    // Boolean-like occupancy: 1 while inside, 0 after leaving. Entries are
    // cleared to 0 rather than removed; presence is `> 0` everywhere, so a
    // stored 0 and an absent entry are interchangeable.
    occupants: BTreeMap<EntityId, u32>,
}

enum TriggerSlot {
    Uninitialized,
    Live(TriggerVolume),
    Destroyed,
}

/// Arena of trigger volumes, fed contact transitions by the physics
/// service during the world step.
#[derive(Default)]
pub struct TriggerSet {
    slots: Vec<TriggerSlot>,
}

impl TriggerSet {
    pub fn new() -> Self {
        TriggerSet::default()
    }

    /// Allocates a fresh, uninitialized volume slot.
    pub fn create(&mut self) -> TriggerId {
        let id = TriggerId(self.slots.len() as u32);
        self.slots.push(TriggerSlot::Uninitialized);
        id
    }

    /// Builds the volume's collision body, stores its callbacks, enables
    /// it, and registers the body with the physics world.
    ///
    /// Re-initializing warns and leaves the existing volume untouched.
    pub fn init(
        &mut self,
        id: TriggerId,
        physics: &mut dyn PhysicsService,
        desc: TriggerShapeDesc,
        on_enter: EnterCallback,
        on_exit: Option<ExitCallback>,
    ) {
        let Some(slot) = self.slots.get_mut(id.0 as usize) else {
            warn!("trigger {}: init on unknown id", id.0);
            return;
        };
        match slot {
            TriggerSlot::Uninitialized => {
                let body = physics.create_trigger_body(&desc, BodyTag::Trigger(id));
                physics.add_body(body);
                *slot = TriggerSlot::Live(TriggerVolume {
                    enabled: true,
                    body,
                    on_enter,
                    on_exit,
                    occupants: BTreeMap::new(),
                });
            }
            TriggerSlot::Live(_) | TriggerSlot::Destroyed => {
                warn!("trigger {}: already initialized, ignoring re-init", id.0);
            }
        }
    }

    /// While disabled, enter notifications are suppressed; exit bookkeeping
    /// continues so occupancy stays truthful.
    pub fn set_enabled(&mut self, id: TriggerId, enabled: bool) {
        if let Some(volume) = self.live_mut(id) {
            volume.enabled = enabled;
        }
    }

    pub fn is_enabled(&self, id: TriggerId) -> bool {
        matches!(
            self.slots.get(id.0 as usize),
            Some(TriggerSlot::Live(volume)) if volume.enabled
        )
    }

    pub fn is_inside(&self, id: TriggerId, entity: EntityId) -> bool {
        match self.slots.get(id.0 as usize) {
            Some(TriggerSlot::Live(volume)) => {
                volume.occupants.get(&entity).copied().unwrap_or(0) > 0
            }
            _ => false,
        }
    }

    /// Disables the volume and removes its body from the physics world.
    /// Terminal: the slot never becomes live again.
    pub fn destroy(&mut self, id: TriggerId, physics: &mut dyn PhysicsService) {
        let Some(slot) = self.slots.get_mut(id.0 as usize) else {
            return;
        };
        if let TriggerSlot::Live(volume) = slot {
            volume.enabled = false;
            physics.remove_body(volume.body);
        }
        *slot = TriggerSlot::Destroyed;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn live_mut(&mut self, id: TriggerId) -> Option<&mut TriggerVolume> {
        match self.slots.get_mut(id.0 as usize) {
            Some(TriggerSlot::Live(volume)) => Some(volume),
            _ => None,
        }
    }
}

/// Orders a contact pair so the trigger volume is the first operand.
/// Returns `None` when neither side is a trigger.
fn canonicalize(first: BodyTag, second: BodyTag) -> Option<(TriggerId, BodyTag)> {
    match (first, second) {
        (BodyTag::Trigger(id), other) => Some((id, other)),
        (other, BodyTag::Trigger(id)) => Some((id, other)),
        _ => None,
    }
}

impl ContactSink for TriggerSet {
    fn contact_added(&mut self, first: BodyTag, second: BodyTag) {
        let Some((id, other)) = canonicalize(first, second) else {
            return;
        };
        let BodyTag::Entity(entity) = other else {
            return;
        };
        let Some(volume) = self.live_mut(id) else {
            return;
        };
        if !volume.enabled {
            return;
        }
        let occupancy = volume.occupants.entry(entity).or_insert(0);
        if *occupancy > 0 {
            // Another contact point for a pair already inside.
            return;
        }
        *occupancy = 1;
        (volume.on_enter)(entity);
    }

    fn contact_removed(&mut self, first: BodyTag, second: BodyTag, remaining: u32) {
        let Some((id, other)) = canonicalize(first, second) else {
            return;
        };
        let BodyTag::Entity(entity) = other else {
            return;
        };
        let Some(volume) = self.live_mut(id) else {
            return;
        };
        if remaining > 0 {
            // The pair is still touching through another contact point.
            return;
        }
        let was_inside = volume.occupants.get(&entity).copied().unwrap_or(0) > 0;
        volume.occupants.insert(entity, 0);
        if !was_inside || !volume.enabled {
            return;
        }
        if let Some(on_exit) = volume.on_exit.as_mut() {
            on_exit(entity);
        }
    }
}
