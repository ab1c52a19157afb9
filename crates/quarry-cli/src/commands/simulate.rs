//! Headless moving-shapes simulation

use crate::commands::{index_sizes, load_config};
use crate::systems::{vec2, FrameTally, MovableSystem, RenderTally, TimeoutSystem};
use anyhow::{Context, Result};
use log::info;
use quarry_ecs::{Record, Store};
use quarry_runtime::{Schedule, TickClock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

const SPEED_MULTIPLIER: f64 = 0.1;

pub struct SimulateArgs {
    pub entities: usize,
    pub ticks: u64,
    pub seed: u64,
    pub expiring: usize,
    pub width: f64,
    pub height: f64,
    pub config: Option<PathBuf>,
    pub format: String,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub entities: usize,
    pub ticks: u64,
    pub elapsed_ms: f64,
    pub last_frame: FrameTally,
    pub indices: BTreeMap<String, usize>,
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let summary = simulate(&args)?;

    let output = match args.format.as_str() {
        "json" => serde_json::to_string_pretty(&summary)?,
        "text" => format_text(&summary),
        _ => anyhow::bail!("Unknown format: {}", args.format),
    };
    println!("{}", output);
    Ok(())
}

pub fn simulate(args: &SimulateArgs) -> Result<Summary> {
    let config = load_config(args.config.as_deref())?;
    let mut store = Store::with_config(config);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut clock = TickClock::new();

    // One add per entity, as the consumer loop does
    for i in 0..args.entities {
        let mut record = Record::new()
            .with("velocity", random_velocity(&mut rng))
            .with("shape", if rng.gen_bool(0.5) { "circle" } else { "box" })
            .with(
                "position",
                vec2(rng.gen::<f64>() * args.width, rng.gen::<f64>() * args.height),
            )
            .with("renderable", true);
        if i < args.expiring {
            // Expire within the first half of the run
            let horizon = clock.step * args.ticks.max(1) as f64 / 2.0;
            record.set("timeout", rng.gen::<f64>() * horizon);
        }
        store.add([record]).context("Failed to add entity")?;
    }
    info!("populated store with {} entities", store.len());

    let tally = Rc::new(RefCell::new(FrameTally::default()));
    let mut schedule = Schedule::new();
    schedule.add_system(&mut store, Box::new(TimeoutSystem))?;
    schedule.add_system(
        &mut store,
        Box::new(MovableSystem {
            width: args.width,
            height: args.height,
        }),
    )?;
    schedule.add_system(&mut store, Box::new(RenderTally::new(Rc::clone(&tally))))?;

    schedule
        .run_for(&mut store, &mut clock, args.ticks)
        .context("Simulation failed")?;
    info!("ran {} ticks", clock.tick_count());

    let last_frame = *tally.borrow();
    Ok(Summary {
        entities: store.len(),
        ticks: clock.tick_count(),
        elapsed_ms: clock.elapsed(),
        last_frame,
        indices: index_sizes(&store),
    })
}

fn random_velocity(rng: &mut StdRng) -> quarry_core::Value {
    vec2(
        SPEED_MULTIPLIER * (2.0 * rng.gen::<f64>() - 1.0),
        SPEED_MULTIPLIER * (2.0 * rng.gen::<f64>() - 1.0),
    )
}

fn format_text(summary: &Summary) -> String {
    let mut out = format!(
        "{} entities, {} ticks ({:.1} ms)\nlast frame: {} circles, {} boxes\n",
        summary.entities,
        summary.ticks,
        summary.elapsed_ms,
        summary.last_frame.circles,
        summary.last_frame.boxes
    );
    for (name, len) in &summary.indices {
        out.push_str(&format!("  {:<12} {}\n", name, len));
    }
    out.trim_end().to_string()
}
