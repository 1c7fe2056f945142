use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::events::Listener;

/// Stable identity for a composite object. Ids are monotonic within a
/// store and never reused, even after the entity is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityId(pub u64);

/// A named scene object owning the behavior scripts attached to it.
///
/// The parent link is a back-reference by id, never ownership; parents are
/// created before their children, so the chain is acyclic by construction.
pub struct GameObject {
    id: EntityId,
    name: String,
    parent: Option<EntityId>,
    active_self: bool,
    behaviors: Vec<Rc<RefCell<dyn Listener>>>,
}

impl GameObject {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn active_self(&self) -> bool {
        self.active_self
    }

    pub fn behaviors(&self) -> &[Rc<RefCell<dyn Listener>>] {
        &self.behaviors
    }
}

/// Owns every live entity and allocates their identities.
pub struct EntityStore {
    next_id: u64,
    objects: BTreeMap<EntityId, GameObject>,
}

impl EntityStore {
    pub fn new(first_id: u64) -> Self {
        EntityStore {
            next_id: first_id,
            objects: BTreeMap::new(),
        }
    }

    pub fn create(&mut self, name: impl Into<String>, parent: Option<EntityId>) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.objects.insert(
            id,
            GameObject {
                id,
                name: name.into(),
                parent,
                active_self: true,
                behaviors: Vec::new(),
            },
        );
        id
    }

    /// Appends a behavior to the entity's owned list. Registration with the
    /// listener registry is handled by `EngineContext::add_behavior`, which
    /// callers normally go through.
    pub fn attach(&mut self, id: EntityId, behavior: Rc<RefCell<dyn Listener>>) -> Result<()> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or_else(|| anyhow!("no entity with id {}", id.0))?;
        object.behaviors.push(behavior);
        Ok(())
    }

    pub fn set_active(&mut self, id: EntityId, active: bool) -> Result<()> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or_else(|| anyhow!("no entity with id {}", id.0))?;
        object.active_self = active;
        Ok(())
    }

    /// True when the entity and every ancestor up the parent chain are
    /// active. Unknown ids (including destroyed entities) read as inactive.
    pub fn is_active_in_hierarchy(&self, id: EntityId) -> bool {
        let mut current = id;
        loop {
            let Some(object) = self.objects.get(&current) else {
                return false;
            };
            if !object.active_self {
                return false;
            }
            match object.parent {
                Some(parent) => current = parent,
                None => return true,
            }
        }
    }

    /// Removes the entity, dropping its behaviors. The listener registry
    /// retires their entries on its next dispatch.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        self.objects.remove(&id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
