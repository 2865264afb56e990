use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod command;
pub mod engine;
pub mod entities;
pub mod error;
pub mod geometry;
pub mod parser;
pub mod projection;
pub mod ring;
pub mod score;
pub mod wordify;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::Error;
pub use geometry::*;

pub const DEFAULT_TICK_RATE_TPS: usize = 15;

/// One knot expressed in kilometres per second.
pub const KNOT_TO_KM_PER_SECOND: f32 = 0.000514444;
pub const KNOT_TO_METERS_PER_SECOND: f32 = 0.514444;
pub const KM_TO_FEET: f32 = 3280.0;
pub const KM_TO_MILES: f32 = 0.62;

pub const GRAVITY: f32 = 9.81;
pub const BANK_ANGLE: f32 = 25.0;

pub const MIN_CLEARED_ALTITUDE: f32 = 1000.0;
pub const SPEED_LIMIT_ALTITUDE: f32 = 10000.0;
pub const SPEED_LIMIT: f32 = 250.0;

pub const FLY_AWAY_ALTITUDE: f32 = 20000.0;
pub const FLY_AWAY_SPEED: f32 = 350.0;

/// ILS range used when a runway end has no published one.
pub const DEFAULT_ILS_DISTANCE: f32 = 40.0;

/// Seconds of simulation time between history samples.
pub const HISTORY_INTERVAL: f32 = 4.0;

/// Tunables for a running simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct SimOptions {
  /// Fly indicated airspeed with no wind or altitude correction.
  pub simplify_speeds: bool,
  /// Allow altitude clearances 1000 ft above the CTR ceiling.
  pub soft_ceiling: bool,
  pub history_length: usize,
  pub projection_steps: usize,
  pub projection_dt: f32,
}

impl Default for SimOptions {
  fn default() -> Self {
    Self {
      simplify_speeds: false,
      soft_ceiling: false,
      history_length: 10,
      projection_steps: 60,
      projection_dt: 5.0,
    }
  }
}

pub fn sign3(x: f32) -> f32 {
  if x > 0.0 {
    1.0
  } else if x < 0.0 {
    -1.0
  } else {
    0.0
  }
}

/// Clamped linear remap of `value` from `[in_low, in_high]` onto
/// `[out_low, out_high]`.
pub fn crange(
  in_low: f32,
  value: f32,
  in_high: f32,
  out_low: f32,
  out_high: f32,
) -> f32 {
  if in_low == in_high {
    return out_low;
  }

  let t = ((value - in_low) / (in_high - in_low)).clamp(0.0, 1.0);
  out_low + (out_high - out_low) * t
}

/// Parses the leading integer of a token the way a controller types it:
/// optional sign, then digits, ignoring anything after.
pub fn parse_leading_int(token: &str) -> Option<i32> {
  let token = token.trim_start();
  let (sign, rest) = match token.strip_prefix('-') {
    Some(rest) => (-1, rest),
    None => (1, token.strip_prefix('+').unwrap_or(token)),
  };

  let digits: String =
    rest.chars().take_while(|c| c.is_ascii_digit()).collect();
  digits.parse::<i32>().ok().map(|n| n * sign)
}

/// Three digit radio heading, with north spoken as 360.
pub fn heading_to_string(heading: f32) -> String {
  let mut heading = heading.to_degrees().rem_euclid(360.0).round() as u32;
  if heading == 0 {
    heading = 360;
  }

  format!("{heading:03}")
}

pub fn heading_to_direction(heading: f32) -> &'static str {
  let normalized_heading = heading.to_degrees().rem_euclid(360.0);

  match normalized_heading {
    h if h <= 22.5 => "north",
    h if h <= 67.5 => "northeast",
    h if h <= 112.5 => "east",
    h if h <= 157.5 => "southeast",
    h if h <= 202.5 => "south",
    h if h <= 247.5 => "southwest",
    h if h <= 292.5 => "west",
    h if h <= 337.5 => "northwest",
    _ => "north",
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendCategory {
  Altitude,
  Speed,
}

/// Radio verb for moving `current` towards `target`.
pub fn radio_trend(
  category: TrendCategory,
  current: f32,
  target: f32,
) -> &'static str {
  let trend = sign3(target - current);
  match (category, trend) {
    (TrendCategory::Altitude, t) if t > 0.0 => "climb and maintain",
    (TrendCategory::Altitude, t) if t < 0.0 => "descend and maintain",
    (TrendCategory::Altitude, _) => "maintain",
    (TrendCategory::Speed, t) if t > 0.0 => "increase speed to",
    (TrendCategory::Speed, t) if t < 0.0 => "reduce speed to",
    (TrendCategory::Speed, _) => "maintain present speed of",
  }
}

pub fn abbreviate_altitude(altitude: f32) -> String {
  if altitude >= 18000.0 {
    format!("flight level {}", (altitude / 100.0).round() as u32)
  } else {
    format!("{} feet", (altitude / 100.0).round() as u32 * 100)
  }
}
