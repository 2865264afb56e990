use glam::Vec2;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
  SimOptions,
  engine::Bundle,
  entities::{
    aircraft::{Aircraft, Category},
    airport::Airport,
  },
};

/// Projection stops once an arrival on the ILS is this low, in feet.
pub const PROJECTION_FLOOR: f32 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProjectedPoint {
  #[ts(as = "(f32, f32)")]
  pub pos: Vec2,
  pub altitude: f32,
  pub heading: f32,
  pub time: f32,
}

/// Flies a copy of `aircraft` forward on its current clearances and returns
/// where it ends up after each step. Nothing is written back and any events
/// the copy raises are dropped.
pub fn project(
  aircraft: &Aircraft,
  airport: &Airport,
  options: &SimOptions,
  time: f32,
) -> Vec<ProjectedPoint> {
  if aircraft.is_taxiing() {
    return Vec::new();
  }

  let mut ghost = aircraft.clone();
  let mut points = Vec::with_capacity(options.projection_steps);
  let mut time = time;

  for _ in 0..options.projection_steps {
    if ghost.category == Category::Arrival
      && ghost.is_precision_guided()
      && ghost.altitude < PROJECTION_FLOOR
    {
      break;
    }

    time += options.projection_dt;
    let mut bundle = Bundle::new(airport, options, options.projection_dt, time);
    ghost.update(&mut bundle);

    points.push(ProjectedPoint {
      pos: ghost.pos,
      altitude: ghost.altitude,
      heading: ghost.heading,
      time,
    });
  }

  points
}
