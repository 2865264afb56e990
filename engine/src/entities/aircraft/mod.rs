pub mod commands;
pub mod effects;
pub mod events;
pub mod physics;
pub mod warnings;

use std::{
  collections::{BTreeMap, HashSet},
  f32::consts::PI,
};

use events::{Event, EventKind};
use glam::Vec2;
use internment::Intern;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use turborand::rng::Rng;

use crate::{
  HISTORY_INTERVAL, KM_TO_MILES, MIN_CLEARED_ALTITUDE, abbreviate_altitude,
  heading_to_direction, normalize_angle, radial,
  ring::RingBuffer,
  wordify::wordify_flight_number,
};

use super::{
  airport::Airport,
  conflict::{ConflictKey, Conflicts},
  model::{Model, WeightClass},
};

/// Lateral offset from the localizer, in km, inside which an aircraft is
/// established.
pub const ESTABLISHED_OFFSET: f32 = 0.048;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Category {
  Arrival,
  Departure,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Mode {
  Apron,
  Taxi,
  Waiting,
  Takeoff,
  Cruise,
  Landing,
}

impl Mode {
  /// Forward along apron, taxi, waiting, takeoff, cruise, plus the
  /// cruise/landing pair in both directions.
  pub fn can_transition_to(self, next: Mode) -> bool {
    use Mode::*;

    self == next
      || matches!(
        (self, next),
        (Apron, Taxi)
          | (Taxi, Waiting)
          | (Waiting, Takeoff)
          | (Takeoff, Cruise)
          | (Cruise, Landing)
          | (Landing, Cruise)
      )
  }

  pub fn is_taxiing(self) -> bool {
    matches!(self, Mode::Apron | Mode::Taxi | Mode::Waiting)
  }
}

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum NavMode {
  #[default]
  None,
  Fix,
  Heading,
  Hold,
  Rwy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TurnDirection {
  Left,
  Right,
}

impl TurnDirection {
  /// Reads any prefix of "left" or "right".
  pub fn from_word(word: &str) -> Option<Self> {
    let word = word.to_lowercase();
    if word.is_empty() {
      None
    } else if "left".starts_with(&word) {
      Some(Self::Left)
    } else if "right".starts_with(&word) {
      Some(Self::Right)
    } else {
      None
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Left => "left",
      Self::Right => "right",
    }
  }
}

/// What the controller asked for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Requested {
  pub navmode: NavMode,
  pub heading: Option<f32>,
  pub turn: Option<TurnDirection>,
  pub fix: Vec<Intern<String>>,
  pub altitude: f32,
  pub expedite: bool,
  pub speed: f32,
  pub runway: Option<Intern<String>>,
  /// Speed when the approach clearance was given.
  pub start_speed: f32,
}

/// What the aircraft is flying towards this instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Target {
  pub heading: f32,
  pub turn: Option<TurnDirection>,
  pub altitude: f32,
  pub expedite: bool,
  pub speed: f32,
}

/// Distance budget before a restricted area is checked again.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RestrictedStatus {
  pub range: Option<f32>,
  pub inside: bool,
}

#[derive(Debug, Clone)]
pub struct AircraftOptions {
  pub airline: Intern<String>,
  /// Telephony designator of the airline.
  pub airline_callsign: String,
  pub flight_number: String,
  pub model: Model,
  pub category: Category,
  pub position: Vec2,
  pub heading: f32,
  pub altitude: f32,
  pub speed: Option<f32>,
  /// Radial the aircraft should leave the CTR on.
  pub destination: Option<f32>,
  pub fixes: Vec<Intern<String>>,
}

#[derive(Debug, Clone)]
pub struct Aircraft {
  pub id: Intern<String>,
  pub airline: Intern<String>,
  pub airline_callsign: String,
  pub flight_number: String,
  pub category: Category,
  pub model: Model,

  pub pos: Vec2,
  pub heading: f32,
  pub altitude: f32,
  pub speed: f32,
  pub ground_speed: f32,
  pub ground_track: f32,
  /// Ground distance covered last tick, in km.
  pub ds: f32,
  /// Sign of the last altitude change.
  pub trend: f32,

  /// Distance and bearing from the field.
  pub distance: f32,
  pub radial: f32,
  pub destination: Option<f32>,

  pub approach_offset: Option<f32>,
  pub approach_distance: Option<f32>,

  pub mode: Mode,
  pub requested: Requested,
  pub target: Target,

  pub inside_ctr: bool,
  pub hit: bool,
  pub warning: bool,
  pub restricted: Vec<RestrictedStatus>,
  pub terrain_level: u32,
  pub terrain_ranges: BTreeMap<u32, Vec<f32>>,

  pub taxi_start: f32,
  pub taxi_delay: f32,
  pub ready_announced: bool,

  pub conflicts: HashSet<ConflictKey>,
  pub history: RingBuffer<Vec2>,
  pub last_history: Option<f32>,
}

impl Aircraft {
  pub fn new(options: AircraftOptions, history_length: usize) -> Self {
    let model = options.model;
    let speed = model.clamp_speed(options.speed.unwrap_or(model.speed.cruise));
    let id = Intern::from(
      format!("{}{}", options.airline, options.flight_number).to_uppercase(),
    );

    let mut aircraft = Self {
      id,
      airline: options.airline,
      airline_callsign: options.airline_callsign,
      flight_number: options.flight_number,
      category: options.category,

      pos: options.position,
      heading: normalize_angle(options.heading),
      altitude: options.altitude.max(0.0),
      speed,
      ground_speed: 0.0,
      ground_track: normalize_angle(options.heading),
      ds: 0.0,
      trend: 0.0,

      distance: options.position.length(),
      radial: radial(options.position),
      destination: options.destination,

      approach_offset: None,
      approach_distance: None,

      mode: Mode::Cruise,
      requested: Requested {
        navmode: NavMode::None,
        heading: Some(normalize_angle(options.heading)),
        altitude: options.altitude.max(0.0),
        speed,
        fix: options.fixes,
        ..Default::default()
      },
      target: Target {
        heading: normalize_angle(options.heading),
        altitude: options.altitude.max(0.0),
        speed,
        ..Default::default()
      },

      inside_ctr: false,
      hit: false,
      warning: false,
      restricted: Vec::new(),
      terrain_level: 0,
      terrain_ranges: BTreeMap::new(),

      taxi_start: 0.0,
      taxi_delay: 0.0,
      ready_announced: false,

      conflicts: HashSet::new(),
      history: RingBuffer::new(history_length),
      last_history: None,

      model,
    };

    if aircraft.category == Category::Departure && aircraft.is_landed() {
      aircraft.mode = Mode::Apron;
      aircraft.speed = 0.0;
      aircraft.target.speed = 0.0;
      aircraft.requested.heading = None;
    }

    aircraft
  }

  /// Finishes setting up a freshly spawned aircraft against its airport:
  /// trims arrival routes, picks a departure runway, and prepares the
  /// warning budgets.
  pub fn complete(&mut self, airport: &Airport, rng: &mut Rng) -> Vec<Event> {
    let mut events = Vec::new();

    self.restricted =
      vec![RestrictedStatus::default(); airport.restricted_areas.len()];
    self.terrain_ranges = airport
      .terrain
      .iter()
      .map(|(level, areas)| (*level, vec![f32::INFINITY; areas.len()]))
      .collect();

    match self.category {
      Category::Arrival => {
        let own_distance = self.pos.length();
        let fixes = core::mem::take(&mut self.requested.fix)
          .into_iter()
          .filter(|f| {
            airport
              .fix(f)
              .is_some_and(|pos| pos.length() < own_distance)
          })
          .collect::<Vec<_>>();

        if fixes.is_empty() {
          self.requested.navmode = NavMode::Heading;
          self.requested.heading = Some(normalize_angle(radial(self.pos) + PI));
        } else {
          self.requested.navmode = NavMode::Fix;
          self.requested.fix = fixes;
        }

        self.distance = self.pos.length();
        self.radial = radial(self.pos);
        if self.is_inside_ctr(airport) {
          self.inside_ctr = true;
          events.push(Event::new(
            self.id,
            EventKind::RadioCall {
              text: format!(
                "{}, {}, in your airspace {}, over",
                airport.radio,
                self.radio_callsign(),
                self.radio_position()
              ),
              alert: false,
            },
          ));
        }
      }
      Category::Departure => {
        self.inside_ctr = true;
        if self.is_landed() {
          self.select_runway(airport, rng, None);
        }
      }
    }

    events
  }

  /// Assigns a departure runway, either the named one or the airport's pick
  /// for this model's takeoff roll.
  pub fn select_runway(
    &mut self,
    airport: &Airport,
    rng: &mut Rng,
    name: Option<&str>,
  ) -> bool {
    let runway = match name {
      Some(name) => airport.runway(name),
      None => airport
        .select_runway(self.model.runway.takeoff)
        .and_then(|name| airport.runway(&name)),
    };

    match runway {
      Some(runway) => {
        self.requested.runway = Some(runway.name());
        self.taxi_delay = runway.taxi_delay(rng);
        true
      }
      None => false,
    }
  }

  pub fn radio_callsign(&self) -> String {
    let mut callsign = format!(
      "{} {}",
      self.airline_callsign,
      wordify_flight_number(&self.flight_number)
    );

    match self.model.weight_class {
      WeightClass::Heavy => callsign.push_str(" heavy"),
      WeightClass::Super => callsign.push_str(" super"),
      WeightClass::Small | WeightClass::Medium => {}
    }

    callsign
  }

  /// "12 miles northeast at 8000 feet".
  pub fn radio_position(&self) -> String {
    let miles = (self.pos.length() * KM_TO_MILES).round() as u32;
    format!(
      "{} mile{} {} at {}",
      miles,
      if miles == 1 { "" } else { "s" },
      heading_to_direction(radial(self.pos)),
      abbreviate_altitude(self.altitude)
    )
  }

  /// Moves to `next` when the mode graph allows it.
  pub fn transition(&mut self, next: Mode) -> bool {
    if self.mode.can_transition_to(next) {
      self.mode = next;
      true
    } else {
      tracing::warn!(
        "{} refused mode change from {:?} to {:?}",
        self.id,
        self.mode,
        next
      );
      false
    }
  }

  pub fn is_inside_ctr(&self, airport: &Airport) -> bool {
    self.distance <= airport.ctr_radius && self.altitude <= airport.ctr_ceiling
  }

  pub fn is_landed(&self) -> bool {
    self.altitude < 5.0
  }

  pub fn is_stopped(&self) -> bool {
    self.is_landed() && self.speed < 5.0
  }

  pub fn is_taxiing(&self) -> bool {
    self.mode.is_taxiing()
  }

  pub fn is_takeoff(&self) -> bool {
    self.is_taxiing() || self.mode == Mode::Takeoff
  }

  pub fn is_precision_guided(&self) -> bool {
    self.mode == Mode::Landing
  }

  pub fn is_established(&self) -> bool {
    self.mode == Mode::Landing
      && self
        .approach_offset
        .is_some_and(|offset| offset <= ESTABLISHED_OFFSET)
  }

  /// Whether the aircraft shows up on the scope. Aircraft on the ground only
  /// show once they hold first in line on their runway.
  pub fn is_visible(&self, airport: &Airport) -> bool {
    if matches!(self.mode, Mode::Landing | Mode::Cruise) {
      return true;
    }

    let Some(runway) = self.requested.runway else {
      return false;
    };

    if self.is_taxiing() {
      self.mode == Mode::Waiting
        && airport.queue_position(&runway, self.id) == Some(0)
    } else {
      true
    }
  }

  /// Drops the route and flies the current heading.
  pub fn cancel_fix(&mut self) -> bool {
    if self.requested.navmode != NavMode::Fix {
      return false;
    }

    self.requested.fix.clear();
    self.requested.heading = Some(self.heading);
    self.requested.navmode = NavMode::Heading;
    true
  }

  /// Drops an approach clearance. An aircraft already on the glideslope
  /// goes around on runway heading at a safe altitude.
  pub fn cancel_landing(&mut self, airport: &Airport) -> bool {
    if self.requested.navmode != NavMode::Rwy {
      self.requested.runway = None;
      return false;
    }

    if self.mode == Mode::Landing {
      self.requested.altitude = ((self.altitude / 1000.0).round() * 1000.0)
        .max(2.0 * MIN_CLEARED_ALTITUDE);
      if let Some(runway) =
        self.requested.runway.and_then(|r| airport.runway(&r))
      {
        self.requested.heading = Some(runway.heading());
      }
      self.transition(Mode::Cruise);
    }

    self.requested.navmode = NavMode::Heading;
    self.requested.runway = None;
    true
  }

  pub fn record_history(&mut self, time: f32) {
    if self
      .last_history
      .is_some_and(|last| time - last < HISTORY_INTERVAL)
    {
      return;
    }

    self.history.push(self.pos);
    self.last_history = Some(time);
  }

  pub fn snapshot(&self, conflicts: &Conflicts) -> AircraftSnapshot {
    AircraftSnapshot {
      id: self.id,
      radio_callsign: self.radio_callsign(),
      model: self.model.icao.clone(),
      category: self.category,
      mode: self.mode,
      navmode: self.requested.navmode,
      pos: self.pos,
      heading: self.heading,
      altitude: self.altitude,
      speed: self.speed,
      ground_speed: self.ground_speed,
      ground_track: self.ground_track,
      target_altitude: self.target.altitude,
      target_speed: self.target.speed,
      runway: self.requested.runway,
      fixes: self.requested.fix.clone(),
      history: self.history.iter().copied().collect(),
      inside_ctr: self.inside_ctr,
      hit: self.hit,
      warning: self.warning,
      conflict: conflicts.has_conflict(self),
      violation: conflicts.has_violation(self),
    }
  }
}

/// Read-only view of an aircraft handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AircraftSnapshot {
  #[ts(as = "String")]
  pub id: Intern<String>,
  pub radio_callsign: String,
  pub model: String,
  pub category: Category,
  pub mode: Mode,
  pub navmode: NavMode,

  #[ts(as = "(f32, f32)")]
  pub pos: Vec2,
  pub heading: f32,
  pub altitude: f32,
  pub speed: f32,
  pub ground_speed: f32,
  pub ground_track: f32,
  pub target_altitude: f32,
  pub target_speed: f32,

  #[ts(as = "Option<String>")]
  pub runway: Option<Intern<String>>,
  #[ts(as = "Vec<String>")]
  pub fixes: Vec<Intern<String>>,
  #[ts(as = "Vec<(f32, f32)>")]
  pub history: Vec<Vec2>,

  pub inside_ctr: bool,
  pub hit: bool,
  pub warning: bool,
  pub conflict: bool,
  pub violation: bool,
}

#[cfg(test)]
mod tests {
  use super::*;
  use turborand::SeededCore;
  use crate::fixtures::{arrival, departure, test_airport};

  mod mode {
    use super::*;

    #[test]
    fn test_forward_edges() {
      assert!(Mode::Apron.can_transition_to(Mode::Taxi));
      assert!(Mode::Taxi.can_transition_to(Mode::Waiting));
      assert!(Mode::Waiting.can_transition_to(Mode::Takeoff));
      assert!(Mode::Takeoff.can_transition_to(Mode::Cruise));
      assert!(Mode::Cruise.can_transition_to(Mode::Landing));
      assert!(Mode::Landing.can_transition_to(Mode::Cruise));
    }

    #[test]
    fn test_no_skips_or_reversals() {
      assert!(!Mode::Apron.can_transition_to(Mode::Waiting));
      assert!(!Mode::Taxi.can_transition_to(Mode::Apron));
      assert!(!Mode::Waiting.can_transition_to(Mode::Taxi));
      assert!(!Mode::Cruise.can_transition_to(Mode::Takeoff));
      assert!(!Mode::Landing.can_transition_to(Mode::Apron));
    }

    #[test]
    fn test_transition_refuses_invalid_edge() {
      let mut aircraft = departure("BAW1");
      assert!(!aircraft.transition(Mode::Waiting));
      assert_eq!(aircraft.mode, Mode::Apron);
      assert!(aircraft.transition(Mode::Taxi));
      assert_eq!(aircraft.mode, Mode::Taxi);
    }
  }

  mod spawn {
    use super::*;

    #[test]
    fn test_departure_starts_on_apron() {
      let aircraft = departure("BAW1");

      assert_eq!(aircraft.mode, Mode::Apron);
      assert_eq!(aircraft.speed, 0.0);
      assert_eq!(aircraft.requested.altitude, 0.0);
      assert!(aircraft.requested.runway.is_some());
      assert!(aircraft.inside_ctr);
    }

    #[test]
    fn test_arrival_speed_clamped() {
      let aircraft = arrival("BAW2", Vec2::new(0.0, 30.0), PI, 8000.0);

      assert_eq!(aircraft.mode, Mode::Cruise);
      assert!(aircraft.speed >= aircraft.model.speed.min);
      assert!(aircraft.speed <= aircraft.model.speed.max);
    }

    #[test]
    fn test_arrival_route_trimmed_to_closer_fixes() {
      let airport = test_airport();
      let mut rng = Rng::with_seed(1);
      let mut aircraft = arrival("BAW3", Vec2::new(0.0, 25.0), PI, 8000.0);
      aircraft.requested.fix = ["CHARLIE", "ALPHA", "DELTA"]
        .iter()
        .map(|f| Intern::from_ref(*f))
        .collect();

      aircraft.complete(&airport, &mut rng);

      // CHARLIE is further out than the aircraft.
      assert_eq!(aircraft.requested.navmode, NavMode::Fix);
      assert_eq!(
        aircraft.requested.fix,
        vec![Intern::from_ref("ALPHA"), Intern::from_ref("DELTA")]
      );
    }

    #[test]
    fn test_arrival_without_route_heads_for_field() {
      let airport = test_airport();
      let mut rng = Rng::with_seed(1);
      let mut aircraft =
        arrival("BAW4", Vec2::new(30.0, 0.0), 0.0, 8000.0);
      aircraft.requested.fix.clear();

      let events = aircraft.complete(&airport, &mut rng);

      assert_eq!(aircraft.requested.navmode, NavMode::Heading);
      let heading = aircraft.requested.heading.unwrap();
      assert!((heading - 1.5 * PI).abs() < 1e-4);
      assert!(aircraft.inside_ctr);
      assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_radio_callsign() {
      let aircraft = departure("BAW1");
      assert_eq!(aircraft.radio_callsign(), "Speedbird one");
    }
  }

  mod predicates {
    use super::*;

    #[test]
    fn test_stopped_requires_landed() {
      let mut aircraft = arrival("BAW5", Vec2::ZERO, 0.0, 0.0);
      aircraft.speed = 3.0;
      assert!(aircraft.is_stopped());

      aircraft.altitude = 100.0;
      assert!(!aircraft.is_stopped());
    }

    #[test]
    fn test_taxiing_not_visible_until_first_in_line() {
      let mut airport = test_airport();
      let mut a = departure("BAW6");
      let mut b = departure("BAW7");
      let runway = a.requested.runway.unwrap();
      b.requested.runway = Some(runway);

      for aircraft in [&mut a, &mut b] {
        airport.enqueue(&runway, aircraft.id);
        aircraft.mode = Mode::Waiting;
      }

      assert!(a.is_visible(&airport));
      assert!(!b.is_visible(&airport));
    }

    #[test]
    fn test_cruise_always_visible() {
      let airport = test_airport();
      let aircraft = arrival("BAW8", Vec2::new(0.0, 10.0), PI, 4000.0);
      assert!(aircraft.is_visible(&airport));
    }
  }

  mod cancel {
    use super::*;

    #[test]
    fn test_cancel_fix_holds_heading() {
      let mut aircraft = arrival("BAW9", Vec2::new(0.0, 10.0), 1.0, 4000.0);
      aircraft.requested.navmode = NavMode::Fix;
      aircraft.requested.fix = vec![Intern::from_ref("ALPHA")];

      assert!(aircraft.cancel_fix());
      assert_eq!(aircraft.requested.navmode, NavMode::Heading);
      assert_eq!(aircraft.requested.heading, Some(aircraft.heading));
      assert!(aircraft.requested.fix.is_empty());
      assert!(!aircraft.cancel_fix());
    }

    #[test]
    fn test_cancel_landing_goes_around() {
      let airport = test_airport();
      let mut aircraft =
        arrival("BAW10", Vec2::new(0.0, -10.0), 0.0, 1400.0);
      aircraft.requested.navmode = NavMode::Rwy;
      aircraft.requested.runway = Some(Intern::from_ref("36"));
      aircraft.mode = Mode::Landing;

      assert!(aircraft.cancel_landing(&airport));
      assert_eq!(aircraft.mode, Mode::Cruise);
      assert_eq!(aircraft.requested.altitude, 2000.0);
      assert_eq!(aircraft.requested.navmode, NavMode::Heading);
      assert_eq!(aircraft.requested.runway, None);
      assert_eq!(aircraft.requested.heading, Some(0.0));
    }
  }

  #[test]
  fn test_history_samples_every_interval() {
    let mut aircraft = arrival("BAW11", Vec2::ZERO, 0.0, 4000.0);
    aircraft.history = RingBuffer::new(3);

    for tick in 0..40 {
      aircraft.pos = Vec2::new(tick as f32, 0.0);
      aircraft.record_history(tick as f32);
    }

    assert_eq!(aircraft.history.len(), 3);
    assert_eq!(aircraft.history.last(), Some(&Vec2::new(36.0, 0.0)));
  }
}
