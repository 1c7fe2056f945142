use anyhow::{Context, Result};

use crate::context::EngineContext;
use crate::events::EngineEvent;

/// Runs the one-time launch broadcasts, in order: ProgramStart, Awake,
/// Start, PostStart. Drivers call this once, before the first frame.
///
/// ProgramStart flips the registry's launch latch, so every listener
/// registered after this returns receives Awake and Start synchronously at
/// registration instead.
pub fn run_launch_sequence(ctx: &mut EngineContext) -> Result<()> {
    ctx.dispatch(&EngineEvent::ProgramStart)
        .context("broadcasting program start")?;
    ctx.dispatch(&EngineEvent::Awake)
        .context("broadcasting awake")?;
    ctx.dispatch(&EngineEvent::Start)
        .context("broadcasting start")?;
    ctx.dispatch(&EngineEvent::PostStart)
        .context("broadcasting post start")?;
    Ok(())
}
