//! Scripted stand-ins for the host engine's devices.
//!
//! Each stub records how often the scheduler calls it, so regression runs
//! can assert the per-phase call counts, and the physics stub replays a
//! pre-scripted contact timeline into the trigger arena.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;

use aster_runtime::headless::FixedStepTime;
use aster_runtime::{
    BodyHandle, BodyTag, ContactSink, HostServices, InputService, PhysicsService, RenderService,
    SceneService, SkinnedNode, TriggerShapeDesc, ViewportSize,
};

use crate::cli::Args;

/// Per-phase call totals across one run, serialized into the summary
/// artifact.
#[derive(Debug, Default, Clone, Serialize)]
pub struct HostCounters {
    pub physics_steps: u64,
    pub bodies_created: u64,
    pub bodies_removed: u64,
    pub frames_begun: u64,
    pub frames_rejected: u64,
    pub camera_updates: u64,
    pub backdrop_resizes: u64,
    pub debug_draws: u64,
    pub text_lines_flushed: u64,
    pub scene_updates: u64,
    pub node_advances: u64,
    pub input_edge_resets: u64,
}

pub type CountersHandle = Rc<RefCell<HostCounters>>;

pub fn new_counters() -> CountersHandle {
    Rc::new(RefCell::new(HostCounters::default()))
}

/// One scripted contact transition, replayed on a fixed frame.
#[derive(Debug, Clone, Copy)]
pub enum ContactCue {
    Added {
        first: BodyTag,
        second: BodyTag,
    },
    Removed {
        first: BodyTag,
        second: BodyTag,
        remaining: u32,
    },
}

/// Frame-indexed contact script shared between the driver (which writes
/// it) and the physics stub (which replays it).
#[derive(Debug, Clone, Default)]
pub struct ContactTimeline {
    cues: Rc<RefCell<BTreeMap<u64, Vec<ContactCue>>>>,
}

impl ContactTimeline {
    pub fn push(&self, frame: u64, cue: ContactCue) {
        self.cues.borrow_mut().entry(frame).or_default().push(cue);
    }

    fn take(&self, frame: u64) -> Vec<ContactCue> {
        self.cues.borrow_mut().remove(&frame).unwrap_or_default()
    }
}

/// Physics stub: allocates body handles and replays the contact timeline.
pub struct ScriptedPhysics {
    counters: CountersHandle,
    timeline: ContactTimeline,
    frame: u64,
    next_body: u64,
}

impl ScriptedPhysics {
    pub fn new(counters: CountersHandle, timeline: ContactTimeline) -> Self {
        ScriptedPhysics {
            counters,
            timeline,
            frame: 0,
            next_body: 0,
        }
    }
}

impl PhysicsService for ScriptedPhysics {
    fn create_trigger_body(&mut self, _desc: &TriggerShapeDesc, _tag: BodyTag) -> BodyHandle {
        self.next_body += 1;
        self.counters.borrow_mut().bodies_created += 1;
        BodyHandle(self.next_body)
    }

    fn add_body(&mut self, _body: BodyHandle) {}

    fn remove_body(&mut self, _body: BodyHandle) {
        self.counters.borrow_mut().bodies_removed += 1;
    }

    fn step(&mut self, _delta: Duration, contacts: &mut dyn ContactSink) {
        self.counters.borrow_mut().physics_steps += 1;
        for cue in self.timeline.take(self.frame) {
            match cue {
                ContactCue::Added { first, second } => contacts.contact_added(first, second),
                ContactCue::Removed {
                    first,
                    second,
                    remaining,
                } => contacts.contact_removed(first, second, remaining),
            }
        }
        self.frame += 1;
    }
}

/// Renderer stub with an accept/reject schedule and a scripted viewport
/// growth step.
pub struct RecordingRender {
    counters: CountersHandle,
    base: ViewportSize,
    grown: ViewportSize,
    resize_at: Option<u64>,
    reject: BTreeSet<u64>,
    begin_calls: u64,
    text_queue: Vec<String>,
}

impl RecordingRender {
    pub fn new(counters: CountersHandle, resize_at: Option<u64>, reject: BTreeSet<u64>) -> Self {
        RecordingRender {
            counters,
            base: ViewportSize {
                width: 1280,
                height: 720,
            },
            grown: ViewportSize {
                width: 1600,
                height: 900,
            },
            resize_at,
            reject,
            begin_calls: 0,
            text_queue: Vec::new(),
        }
    }
}

impl RenderService for RecordingRender {
    fn viewport(&self) -> ViewportSize {
        // `begin_calls` equals the number of fully processed frames, so the
        // sample taken at the top of frame N sees the grown size iff
        // N >= resize_at.
        match self.resize_at {
            Some(frame) if self.begin_calls >= frame => self.grown,
            _ => self.base,
        }
    }

    fn begin_frame(&mut self) -> bool {
        let frame = self.begin_calls;
        self.begin_calls += 1;
        if self.reject.contains(&frame) {
            self.counters.borrow_mut().frames_rejected += 1;
            false
        } else {
            self.counters.borrow_mut().frames_begun += 1;
            true
        }
    }

    fn clear(&mut self) {}

    fn update_camera(&mut self) {
        self.counters.borrow_mut().camera_updates += 1;
    }

    fn resize_backdrop(&mut self, _size: ViewportSize) {
        self.counters.borrow_mut().backdrop_resizes += 1;
    }

    fn begin_sprite_pass(&mut self) {}
    fn draw_backdrop(&mut self) {}
    fn end_sprite_pass(&mut self) {}
    fn update_and_draw(&mut self) {}

    fn draw_physics_debug(&mut self) {
        self.counters.borrow_mut().debug_draws += 1;
    }

    fn queue_text(&mut self, text: &str) {
        self.text_queue.push(text.to_string());
    }

    fn flush_text(&mut self) {
        self.counters.borrow_mut().text_lines_flushed += self.text_queue.len() as u64;
        self.text_queue.clear();
    }

    fn end_frame(&mut self) {}
}

struct StubNode {
    counters: CountersHandle,
    disabled: bool,
}

impl SkinnedNode for StubNode {
    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn advance(&mut self, _delta: Duration) {
        self.counters.borrow_mut().node_advances += 1;
    }

    fn update(&mut self) {}
}

/// Scene stub with one animated node and one disabled node.
pub struct StubScene {
    counters: CountersHandle,
    nodes: Vec<StubNode>,
}

impl StubScene {
    pub fn new(counters: CountersHandle) -> Self {
        let nodes = vec![
            StubNode {
                counters: counters.clone(),
                disabled: false,
            },
            StubNode {
                counters: counters.clone(),
                disabled: true,
            },
        ];
        StubScene { counters, nodes }
    }
}

impl SceneService for StubScene {
    fn update(&mut self, _delta: Duration) {
        self.counters.borrow_mut().scene_updates += 1;
    }

    fn visit_skinned_nodes(&mut self, visit: &mut dyn FnMut(&mut dyn SkinnedNode)) {
        for node in &mut self.nodes {
            visit(node);
        }
    }
}

pub struct CountingInput {
    counters: CountersHandle,
}

impl CountingInput {
    pub fn new(counters: CountersHandle) -> Self {
        CountingInput { counters }
    }
}

impl InputService for CountingInput {
    fn reset_pressed_edges(&mut self) {
        self.counters.borrow_mut().input_edge_resets += 1;
    }
}

/// Assembles the full stub bundle for one run. Time advances 16ms per
/// frame regardless of wall clock, so journals are reproducible.
pub fn scripted_services(
    args: &Args,
    counters: CountersHandle,
    timeline: ContactTimeline,
) -> HostServices {
    let reject: BTreeSet<u64> = args.reject_frames.iter().copied().collect();
    HostServices {
        time: Box::new(FixedStepTime::new(Duration::from_millis(16))),
        physics: Box::new(ScriptedPhysics::new(counters.clone(), timeline)),
        render: Box::new(RecordingRender::new(counters.clone(), args.resize_at, reject)),
        scene: Box::new(StubScene::new(counters.clone())),
        input: Box::new(CountingInput::new(counters)),
    }
}
