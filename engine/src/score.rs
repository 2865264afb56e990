use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entities::aircraft::events::{Event, EventKind, WindOperation};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Aborts {
  pub landing: u32,
}

/// Running tally of how well the controller is doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Score {
  pub arrival: u32,
  pub departure: i32,
  pub failed_arrival: u32,
  pub hit: u32,
  pub warning: u32,
  pub violation: u32,
  pub restrictions: u32,
  pub windy_landing: u32,
  pub windy_takeoff: u32,
  pub abort: Aborts,
}

impl Score {
  pub fn apply(&mut self, event: &Event) {
    match &event.kind {
      EventKind::Collision { .. } | EventKind::TerrainImpact => self.hit += 1,
      EventKind::RunwayCollisionCourse { .. } => self.warning += 1,
      EventKind::InterceptTooSteep => self.violation += 1,
      EventKind::LostIls => self.abort.landing += 1,
      EventKind::RestrictedAreaEntry { .. } => self.restrictions += 1,
      EventKind::WindPenalty {
        operation, points, ..
      } => match operation {
        WindOperation::Takeoff => self.windy_takeoff += points,
        WindOperation::Landing => self.windy_landing += points,
      },
      EventKind::Arrived => self.arrival += 1,
      EventKind::Departed { on_course: true } => self.departure += 1,
      EventKind::Departed { on_course: false } => self.departure -= 1,
      EventKind::FailedArrival => self.failed_arrival += 1,
      EventKind::RadioCall { .. }
      | EventKind::Acknowledgement(_)
      | EventKind::ReadyForDeparture { .. }
      | EventKind::LostContact => {}
    }
  }
}
