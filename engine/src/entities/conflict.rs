use std::collections::{HashMap, hash_map};

use internment::Intern;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::angle_offset;

use super::{
  aircraft::{
    Aircraft,
    events::{Event, EventKind},
  },
  airport::Airport,
};

/// Pairs closer than this on both axes get a conflict record.
pub const PREFILTER_DISTANCE: f32 = 10.0;
/// Records are dropped once the pair is further apart than this.
pub const RETAIN_DISTANCE: f32 = 14.2;

pub const COLLISION_DISTANCE: f32 = 0.05;
pub const COLLISION_ALTITUDE: f32 = 160.0;

pub const RUNWAY_COLLISION_ANGLE: f32 = 0.5236;
pub const RUNWAY_COLLISION_DISTANCE: f32 = 10.0;

/// Below this altitude nothing is checked for proximity.
pub const PROXIMITY_FLOOR: f32 = 990.0;
pub const VERTICAL_SEPARATION: f32 = 1000.0;

/// Conflict and violation distances in km.
pub const STANDARD_MINIMA: (f32, f32) = (7.4, 5.6);
pub const SAME_RUNWAY_MINIMA: (f32, f32) = (5.2, 4.6);
pub const ADJACENT_VIOLATION_FACTOR: f32 = 0.85;

/// Unordered pair of aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConflictKey(Intern<String>, Intern<String>);

impl ConflictKey {
  pub fn new(a: Intern<String>, b: Intern<String>) -> Self {
    if a.as_str() <= b.as_str() {
      Self(a, b)
    } else {
      Self(b, a)
    }
  }

  pub fn contains(&self, id: Intern<String>) -> bool {
    self.0 == id || self.1 == id
  }

  pub fn other(&self, id: Intern<String>) -> Intern<String> {
    if self.0 == id { self.1 } else { self.0 }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum ConflictFlag {
  RunwayCollision,
  ProximityConflict,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum ViolationFlag {
  ProximityViolation,
}

/// Result of updating a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictStatus {
  Active,
  Separated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
  pub key: ConflictKey,
  /// Horizontal distance in km.
  pub distance: f32,
  /// Vertical separation in feet.
  pub altitude: f32,
  pub collided: bool,
  pub conflicts: HashMap<ConflictFlag, bool>,
  pub violations: HashMap<ViolationFlag, bool>,
}

impl Conflict {
  pub fn new(key: ConflictKey) -> Self {
    Self {
      key,
      distance: 0.0,
      altitude: 0.0,
      collided: false,
      conflicts: HashMap::new(),
      violations: HashMap::new(),
    }
  }

  pub fn flag(&self, flag: ConflictFlag) -> bool {
    self.conflicts.get(&flag).copied().unwrap_or(false)
  }

  pub fn violation(&self, flag: ViolationFlag) -> bool {
    self.violations.get(&flag).copied().unwrap_or(false)
  }

  pub fn has_conflict(&self) -> bool {
    self.conflicts.values().any(|f| *f)
  }

  pub fn has_violation(&self) -> bool {
    self.violations.values().any(|f| *f)
  }

  pub fn update(
    &mut self,
    a: &mut Aircraft,
    b: &mut Aircraft,
    airport: &Airport,
    events: &mut Vec<Event>,
  ) -> ConflictStatus {
    if self.collided {
      return ConflictStatus::Active;
    }

    self.distance = a.pos.distance(b.pos);
    self.altitude = (a.altitude - b.altitude).abs();

    if self.distance > RETAIN_DISTANCE {
      return ConflictStatus::Separated;
    }

    self.check_collision(a, b, airport, events);
    if self.collided {
      return ConflictStatus::Active;
    }

    self.check_runway_collision(a, b, airport, events);

    // Aircraft manoeuvring near the ground are left alone.
    if a.altitude < PROXIMITY_FLOOR || b.altitude < PROXIMITY_FLOOR {
      self.conflicts.insert(ConflictFlag::ProximityConflict, false);
      self
        .violations
        .insert(ViolationFlag::ProximityViolation, false);
      return ConflictStatus::Active;
    }

    self.check_proximity(a, b, airport);
    ConflictStatus::Active
  }

  fn check_collision(
    &mut self,
    a: &mut Aircraft,
    b: &mut Aircraft,
    airport: &Airport,
    events: &mut Vec<Event>,
  ) {
    if self.distance < COLLISION_DISTANCE
      && self.altitude < COLLISION_ALTITUDE
      && a.is_visible(airport)
      && b.is_visible(airport)
    {
      self.collided = true;
      a.hit = true;
      b.hit = true;
      events.push(Event::new(a.id, EventKind::Collision { other: b.id }));
    }
  }

  fn check_runway_collision(
    &mut self,
    a: &Aircraft,
    b: &Aircraft,
    airport: &Airport,
    events: &mut Vec<Event>,
  ) {
    let same_runway = match (a.requested.runway, b.requested.runway) {
      (Some(ra), Some(rb)) => airport.same_runway(&ra, &rb),
      _ => false,
    };

    let on_course = !a.is_taxiing()
      && !b.is_taxiing()
      && same_runway
      && angle_offset(a.heading, b.heading).abs() > RUNWAY_COLLISION_ANGLE
      && self.distance < RUNWAY_COLLISION_DISTANCE;

    if on_course && !self.flag(ConflictFlag::RunwayCollision) {
      events.push(Event::new(
        a.id,
        EventKind::RunwayCollisionCourse { other: b.id },
      ));
    }

    self.conflicts.insert(ConflictFlag::RunwayCollision, on_course);
  }

  /// Separation minima for this pair. Two aircraft established on an ILS get
  /// reduced minima.
  fn minima(a: &Aircraft, b: &Aircraft, airport: &Airport) -> (f32, f32) {
    let guided = a.is_precision_guided()
      && b.is_precision_guided()
      && a.is_established()
      && b.is_established();
    if !guided {
      return STANDARD_MINIMA;
    }

    let runways = (
      a.requested.runway.and_then(|r| airport.runway(&r)),
      b.requested.runway.and_then(|r| airport.runway(&r)),
    );

    match runways {
      (Some(ra), Some(rb)) if ra.index == rb.index => SAME_RUNWAY_MINIMA,
      (Some(ra), Some(rb)) => {
        let separation = ra.runway.separation.max(rb.runway.separation);
        (separation, separation * ADJACENT_VIOLATION_FACTOR)
      }
      _ => STANDARD_MINIMA,
    }
  }

  fn check_proximity(&mut self, a: &Aircraft, b: &Aircraft, airport: &Airport) {
    let (conflict, violation) = if self.altitude >= VERTICAL_SEPARATION {
      (false, false)
    } else {
      let (conflict, violation) = Self::minima(a, b, airport);
      (self.distance < conflict, self.distance < violation)
    };

    self.conflicts.insert(ConflictFlag::ProximityConflict, conflict);
    self
      .violations
      .insert(ViolationFlag::ProximityViolation, violation);
  }
}

/// Every live conflict record, keyed by the pair it links. Aircraft only
/// carry the keys.
#[derive(Debug, Clone, Default)]
pub struct Conflicts {
  records: HashMap<ConflictKey, Conflict>,
}

impl Conflicts {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn get(&self, key: &ConflictKey) -> Option<&Conflict> {
    self.records.get(key)
  }

  pub fn get_mut(&mut self, key: &ConflictKey) -> Option<&mut Conflict> {
    self.records.get_mut(key)
  }

  pub fn between(
    &self,
    a: Intern<String>,
    b: Intern<String>,
  ) -> Option<&Conflict> {
    self.records.get(&ConflictKey::new(a, b))
  }

  pub fn iter(&self) -> hash_map::Values<'_, ConflictKey, Conflict> {
    self.records.values()
  }

  /// Updates the record for a pair, creating one when the pair is close
  /// enough and dropping it once they have separated.
  pub fn check(
    &mut self,
    a: &mut Aircraft,
    b: &mut Aircraft,
    airport: &Airport,
    events: &mut Vec<Event>,
  ) {
    let key = ConflictKey::new(a.id, b.id);

    let status = match self.records.get_mut(&key) {
      Some(conflict) => conflict.update(a, b, airport, events),
      None => {
        let delta = (a.pos - b.pos).abs();
        if delta.x > PREFILTER_DISTANCE || delta.y > PREFILTER_DISTANCE {
          return;
        }

        let mut conflict = Conflict::new(key);
        a.conflicts.insert(key);
        b.conflicts.insert(key);
        let status = conflict.update(a, b, airport, events);
        self.records.insert(key, conflict);
        status
      }
    };

    if status == ConflictStatus::Separated {
      self.detach(key, a, b);
    }
  }

  fn detach(&mut self, key: ConflictKey, a: &mut Aircraft, b: &mut Aircraft) {
    self.records.remove(&key);
    a.conflicts.remove(&key);
    b.conflicts.remove(&key);
  }

  /// Drops every record involving `id`, unlinking it from the other aircraft.
  pub fn remove_aircraft(
    &mut self,
    id: Intern<String>,
    aircraft: &mut [Aircraft],
  ) {
    self.records.retain(|key, _| !key.contains(id));
    for other in aircraft.iter_mut() {
      other.conflicts.retain(|key| !key.contains(id));
    }
  }

  pub fn has_conflict(&self, aircraft: &Aircraft) -> bool {
    aircraft
      .conflicts
      .iter()
      .filter_map(|key| self.records.get(key))
      .any(|c| c.has_conflict())
  }

  pub fn has_violation(&self, aircraft: &Aircraft) -> bool {
    aircraft
      .conflicts
      .iter()
      .filter_map(|key| self.records.get(key))
      .any(|c| c.has_violation())
  }
}
