//! Scripting-runtime core for a host 3-D engine.
//!
//! The host supplies its devices (physics world, renderer, scene graph,
//! input) behind the trait contracts in [`host`]; this crate supplies the
//! glue that sits between them and gameplay scripts: lifecycle/frame
//! broadcasting in a fixed phase order, wall-clock-derived frame timing,
//! trigger-volume contact tracking, and entity/behavior wiring. Everything
//! runs single-threaded and frame-stepped; one [`scheduler::FrameScheduler`]
//! invocation is one complete frame.

pub mod boot;
pub mod clock;
pub mod context;
pub mod entity;
pub mod events;
pub mod headless;
pub mod host;
pub mod journal;
pub mod registry;
pub mod scheduler;
pub mod trigger;

pub use boot::run_launch_sequence;
pub use clock::{Clock, MonotonicTime, TimeSource};
pub use context::{EngineContext, HostServices, RunSummary, ScriptContext};
pub use entity::{EntityId, EntityStore, GameObject};
pub use events::{EngineEvent, Listener};
pub use host::{
    BodyHandle, BodyTag, ContactSink, InputService, PhysicsService, RenderService, SceneService,
    SkinnedNode, TriggerShapeDesc, ViewportSize,
};
pub use journal::{Journal, JournalEntry, JournalHandle};
pub use registry::{DispatchError, ListenerRegistry};
pub use scheduler::{FrameScheduler, SchedulerOptions};
pub use trigger::{EnterCallback, ExitCallback, TriggerId, TriggerSet};
