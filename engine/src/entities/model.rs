use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::Error;

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub enum WeightClass {
  #[serde(rename = "S")]
  Small,
  #[default]
  #[serde(rename = "M")]
  Medium,
  #[serde(rename = "H")]
  Heavy,
  #[serde(rename = "U")]
  Super,
}

/// Performance rates, all per second.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rates {
  /// Radians per second.
  pub turn: f32,
  /// Feet per second.
  pub ascent: f32,
  /// Feet per second.
  pub descent: f32,
  /// Knots per second.
  pub accelerate: f32,
  /// Knots per second.
  pub decelerate: f32,
}

/// Runway length requirements in kilometres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunwayRequirement {
  pub takeoff: f32,
  pub landing: f32,
}

/// Speeds in knots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Speeds {
  pub min: f32,
  pub max: f32,
  pub landing: f32,
  pub cruise: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "ModelData")]
pub struct Model {
  pub name: String,
  pub icao: String,
  pub weight_class: WeightClass,
  pub rate: Rates,
  pub runway: RunwayRequirement,
  pub speed: Speeds,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RateData {
  /// Degrees per second.
  turn: f32,
  /// Feet per minute.
  climb: f32,
  /// Feet per minute.
  descent: f32,
  accelerate: f32,
  decelerate: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct ModelData {
  name: String,
  icao: String,
  #[serde(default, rename = "weightclass")]
  weight_class: WeightClass,
  rate: RateData,
  runway: RunwayRequirement,
  speed: Speeds,
}

impl From<ModelData> for Model {
  fn from(value: ModelData) -> Self {
    Self {
      name: value.name,
      icao: value.icao.to_uppercase(),
      weight_class: value.weight_class,
      rate: Rates {
        turn: value.rate.turn.to_radians(),
        ascent: value.rate.climb / 60.0,
        descent: value.rate.descent / 60.0,
        accelerate: value.rate.accelerate,
        decelerate: value.rate.decelerate,
      },
      runway: value.runway,
      speed: value.speed,
    }
  }
}

impl Model {
  pub fn from_json(json: &str) -> Result<Self, Error> {
    Ok(serde_json::from_str(json)?)
  }

  pub fn clamp_speed(&self, speed: f32) -> f32 {
    speed.clamp(self.speed.min, self.speed.max)
  }
}
