use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::json;

use aster_runtime::{
    run_launch_sequence, EngineContext, EngineEvent, FrameScheduler, RunSummary, SchedulerOptions,
};

mod cli;
mod scenario;
mod stubs;

use cli::Args;
use stubs::HostCounters;

#[derive(Serialize)]
struct HarnessSummary {
    runtime: RunSummary,
    host: HostCounters,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> Result<()> {
    let counters = stubs::new_counters();
    let timeline = stubs::ContactTimeline::default();
    let services = stubs::scripted_services(&args, counters.clone(), timeline.clone());

    let mut ctx = EngineContext::new(services);
    let mut scheduler = FrameScheduler::new(SchedulerOptions {
        debug_physics: args.debug_physics,
    });

    let scene = scenario::install(&mut ctx).context("installing the demo scenario")?;
    scenario::script_probe_flight(&timeline, scene.probe);

    run_launch_sequence(&mut ctx).context("running the launch sequence")?;
    log::info!(
        "launch sequence complete with {} registered listeners",
        ctx.registry.len()
    );

    let message_frame = args.frames / 2;
    let asset_frame = args.frames.saturating_mul(3) / 4;

    for frame in 0..args.frames {
        scheduler
            .advance(&mut ctx)
            .with_context(|| format!("advancing frame {frame}"))?;
        scene.apply_spawns(&mut ctx);

        if let Some(topic) = args.message_topic.as_deref() {
            if frame == message_frame {
                ctx.dispatch(&EngineEvent::ExternalMessage {
                    topic: topic.to_string(),
                    payload: json!({ "frame": frame }),
                })
                .context("broadcasting the external message")?;
            }
        }
        if let Some(path) = args.asset_updated.as_deref() {
            if frame == asset_frame {
                ctx.dispatch(&EngineEvent::AssetUpdated {
                    path: path.to_string(),
                })
                .context("broadcasting the asset update")?;
            }
        }
        if args.verbose {
            eprintln!(
                "[aster_harness] frame {} journal entries: {}",
                frame,
                ctx.journal.len()
            );
        }
    }

    ctx.dispatch(&EngineEvent::ApplicationQuit)
        .context("broadcasting application quit")?;

    if let Some(path) = args.event_log_json.as_ref() {
        let snapshot = ctx.journal.snapshot();
        let encoded = serde_json::to_string_pretty(&snapshot)
            .context("serializing the run journal to JSON")?;
        fs::write(path, &encoded)
            .with_context(|| format!("writing the run journal to {}", path.display()))?;
        println!("Saved run journal to {}", path.display());
    }

    if let Some(path) = args.summary_json.as_ref() {
        let summary = HarnessSummary {
            runtime: ctx.summary(),
            host: counters.borrow().clone(),
        };
        let encoded = serde_json::to_string_pretty(&summary)
            .context("serializing the run summary to JSON")?;
        fs::write(path, &encoded)
            .with_context(|| format!("writing the run summary to {}", path.display()))?;
        println!("Saved run summary to {}", path.display());
    }

    let summary = ctx.summary();
    println!(
        "aster harness: advanced {} frames, {} entities live, {} journal entries",
        args.frames, summary.entities, summary.journal_entries
    );
    Ok(())
}
