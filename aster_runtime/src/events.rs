use anyhow::Result;
use serde_json::Value;

use crate::context::ScriptContext;

/// Lifecycle and frame phases broadcast through the listener registry.
///
/// Each phase is a separate, explicit broadcast; only `ExternalMessage` and
/// `AssetUpdated` carry data.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ProgramStart,
    Awake,
    Start,
    PostStart,
    Update,
    Render,
    ResolutionChange,
    ExternalMessage { topic: String, payload: Value },
    ApplicationQuit,
    AssetUpdated { path: String },
}

impl EngineEvent {
    /// Stable label used in dispatch errors and journal markers.
    pub fn label(&self) -> &'static str {
        match self {
            EngineEvent::ProgramStart => "program_start",
            EngineEvent::Awake => "awake",
            EngineEvent::Start => "start",
            EngineEvent::PostStart => "post_start",
            EngineEvent::Update => "update",
            EngineEvent::Render => "render",
            EngineEvent::ResolutionChange => "resolution_change",
            EngineEvent::ExternalMessage { .. } => "external_message",
            EngineEvent::ApplicationQuit => "application_quit",
            EngineEvent::AssetUpdated { .. } => "asset_updated",
        }
    }
}

/// A behavior script observing some subset of the broadcast phases.
///
/// Every method defaults to a no-op, so implementors override only the
/// phases they care about. Callbacks run synchronously on the frame thread;
/// an `Err` aborts the remainder of the broadcast that invoked it.
///
/// The [`ScriptContext`] argument is the slice of engine state a script may
/// touch mid-broadcast. It deliberately omits the listener registry, so a
/// callback cannot register or unregister listeners while a broadcast is
/// iterating them.
pub trait Listener {
    fn on_program_start(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_awake(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_start(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_post_start(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_render(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_resolution_change(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_external_message(
        &mut self,
        _ctx: &mut ScriptContext<'_>,
        _topic: &str,
        _payload: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_application_quit(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_asset_updated(&mut self, _ctx: &mut ScriptContext<'_>, _path: &str) -> Result<()> {
        Ok(())
    }
}
