//! Demo systems for the moving-shapes simulation

use quarry_core::{QuarryError, Result, Value};
use quarry_ecs::Store;
use quarry_runtime::{System, TickContext};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

pub const SHAPE_HALF_SIZE: f64 = 10.0;

/// Read an integer or float value as `f64`
pub fn num(v: &Value) -> Option<f64> {
    v.as_float().or_else(|| v.as_integer().map(|i| i as f64))
}

/// Read an `{x, y}` table (or `[x, y]` array) as a pair of floats
pub fn parse_vec2(value: &Value) -> Option<(f64, f64)> {
    if let Some(table) = value.as_table() {
        let x = table.get("x").and_then(num).unwrap_or(0.0);
        let y = table.get("y").and_then(num).unwrap_or(0.0);
        return Some((x, y));
    }

    if let Some(arr) = value.as_array() {
        if arr.len() >= 2 {
            return Some((num(&arr[0])?, num(&arr[1])?));
        }
    }

    None
}

pub fn vec2(x: f64, y: f64) -> Value {
    let mut table = toml::Table::new();
    table.insert("x".into(), Value::Float(x));
    table.insert("y".into(), Value::Float(y));
    Value::Table(table)
}

/// Integrates `position` by `velocity`, wrapping around the playfield edges
pub struct MovableSystem {
    pub width: f64,
    pub height: f64,
}

impl MovableSystem {
    fn wrap(&self, (mut x, mut y): (f64, f64)) -> (f64, f64) {
        let h = SHAPE_HALF_SIZE;
        if x > self.width + h {
            x = -h;
        }
        if x < -h {
            x = self.width + h;
        }
        if y > self.height + h {
            y = -h;
        }
        if y < -h {
            y = self.height + h;
        }
        (x, y)
    }
}

impl System for MovableSystem {
    fn name(&self) -> &str {
        "movable"
    }

    fn run(&mut self, store: &mut Store, ctx: &TickContext) -> Result<()> {
        for entity in store.index_of("velocity").iter_rev() {
            let Some((vx, vy)) = entity.get("velocity").as_ref().and_then(parse_vec2) else {
                continue;
            };
            entity.update("position", |position| {
                if let Some((x, y)) = parse_vec2(position) {
                    let (x, y) = self.wrap((x + vx * ctx.delta, y + vy * ctx.delta));
                    *position = vec2(x, y);
                }
            });
        }
        Ok(())
    }
}

/// Shapes seen by the last render pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameTally {
    pub circles: usize,
    pub boxes: usize,
}

/// Headless stand-in for a renderer: walks `renderable` and counts shapes
pub struct RenderTally {
    tally: Rc<RefCell<FrameTally>>,
}

impl RenderTally {
    pub fn new(tally: Rc<RefCell<FrameTally>>) -> Self {
        Self { tally }
    }
}

impl System for RenderTally {
    fn name(&self) -> &str {
        "render_tally"
    }

    fn run(&mut self, store: &mut Store, _ctx: &TickContext) -> Result<()> {
        let mut frame = FrameTally::default();
        for entity in store.index_of("renderable").iter_rev() {
            if !entity.has("position") {
                continue;
            }
            match entity.get("shape").as_ref().and_then(Value::as_str) {
                Some("box") => frame.boxes += 1,
                Some(_) => frame.circles += 1,
                None => {}
            }
        }
        *self.tally.borrow_mut() = frame;
        Ok(())
    }
}

/// Counts `timeout` down by the tick delta; expired entities lose both
/// `timeout` and `velocity` and gain `stopped`. A non-numeric `timeout`
/// fails the tick.
pub struct TimeoutSystem;

impl System for TimeoutSystem {
    fn name(&self) -> &str {
        "timeout"
    }

    fn run(&mut self, store: &mut Store, ctx: &TickContext) -> Result<()> {
        for entity in store.index_of("timeout").iter_rev() {
            let remaining = entity.update("timeout", |timeout| {
                let left = num(timeout)? - ctx.delta;
                *timeout = Value::Float(left);
                Some(left)
            });
            let Some(left) = remaining else {
                continue;
            };
            let left = left.ok_or_else(|| QuarryError::SystemFailed {
                system: self.name().to_string(),
                message: format!("entity {} has a non-numeric timeout", entity.id()),
            })?;
            if left <= 0.0 {
                entity.delete("timeout")?;
                entity.delete("velocity")?;
                entity.set("stopped", true)?;
            }
        }
        Ok(())
    }
}
