use core::fmt;

use internment::Intern;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum WindOperation {
  Takeoff,
  Landing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum WindComponent {
  Crosswind,
  MajorCrosswind,
  Tailwind,
  MajorTailwind,
}

impl fmt::Display for WindComponent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Crosswind => write!(f, "crosswind"),
      Self::MajorCrosswind => write!(f, "major crosswind"),
      Self::Tailwind => write!(f, "tailwind"),
      Self::MajorTailwind => write!(f, "major tailwind"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type", content = "value")]
#[ts(export)]
pub enum EventKind {
  /// Something the aircraft said on frequency.
  RadioCall {
    text: String,
    alert: bool,
  },
  /// Readback of a controller instruction.
  Acknowledgement(String),
  ReadyForDeparture {
    #[ts(as = "String")]
    runway: Intern<String>,
  },

  Collision {
    #[ts(as = "String")]
    other: Intern<String>,
  },
  TerrainImpact,
  RunwayCollisionCourse {
    #[ts(as = "String")]
    other: Intern<String>,
  },
  InterceptTooSteep,
  LostIls,
  RestrictedAreaEntry {
    area: String,
  },
  WindPenalty {
    operation: WindOperation,
    component: WindComponent,
    points: u32,
  },

  Arrived,
  Departed {
    on_course: bool,
  },
  FailedArrival,
  LostContact,
}

/// Something that happened to an aircraft that scoring and logging care
/// about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Event {
  #[ts(as = "String")]
  pub id: Intern<String>,
  pub kind: EventKind,
}

impl Event {
  pub fn new(id: Intern<String>, kind: EventKind) -> Self {
    Self { id, kind }
  }

  pub fn is_alert(&self) -> bool {
    match &self.kind {
      EventKind::RadioCall { alert, .. } => *alert,
      EventKind::Acknowledgement(_)
      | EventKind::ReadyForDeparture { .. }
      | EventKind::Arrived
      | EventKind::Departed { on_course: true }
      | EventKind::LostContact => false,
      _ => true,
    }
  }
}

impl fmt::Display for Event {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let id = self.id;
    match &self.kind {
      EventKind::RadioCall { text, .. } => write!(f, "{text}"),
      EventKind::Acknowledgement(text) => write!(f, "{text}"),
      EventKind::ReadyForDeparture { runway } => {
        write!(f, "{id} ready for departure runway {runway}")
      }
      EventKind::Collision { other } => write!(f, "{id} collided with {other}"),
      EventKind::TerrainImpact => write!(f, "{id} collided with terrain"),
      EventKind::RunwayCollisionCourse { other } => {
        write!(f, "{id} and {other} on collision course on the same runway")
      }
      EventKind::InterceptTooSteep => {
        write!(f, "{id} localizer intercept angle over 30 degrees")
      }
      EventKind::LostIls => write!(f, "{id} aborting landing, lost ILS"),
      EventKind::RestrictedAreaEntry { area } => {
        write!(f, "{id} infringed restricted area {area}")
      }
      EventKind::WindPenalty {
        operation: WindOperation::Takeoff,
        component,
        ..
      } => write!(f, "{id} took off with a {component}"),
      EventKind::WindPenalty {
        operation: WindOperation::Landing,
        component,
        ..
      } => write!(f, "{id} landed with a {component}"),
      EventKind::Arrived => write!(f, "{id} landed"),
      EventKind::Departed { on_course: true } => {
        write!(f, "{id} departed on course")
      }
      EventKind::Departed { on_course: false } => {
        write!(f, "{id} left controlled airspace away from its destination")
      }
      EventKind::FailedArrival => {
        write!(f, "{id} left controlled airspace as an arrival")
      }
      EventKind::LostContact => write!(f, "{id} lost radar contact"),
    }
  }
}
