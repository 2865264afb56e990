use core::f32::consts::PI;

use crate::{
  FLY_AWAY_ALTITUDE, FLY_AWAY_SPEED, KNOT_TO_KM_PER_SECOND, angle_offset,
  crange, engine::Bundle, heading_vector, normalize_angle, radial,
};

use super::{
  Aircraft, Category, Mode, NavMode, TurnDirection,
  effects::AircraftEffect,
  events::{Event, EventKind},
};

/// Fastest turn anyone flies, 3°/s.
pub const STANDARD_RATE_TURN: f32 = 0.0523598776;
/// Turn rate in rad/s at one knot for a 25° bank. Divide by the speed.
pub const BANK_TURN_FACTOR: f32 = 8.883031;
/// Below this an aircraft cannot turn.
pub const MIN_TURN_ALTITUDE: f32 = 10.0;

pub const NORMAL_RATE_FACTOR: f32 = 1.7;
pub const LANDING_DESCENT_FACTOR: f32 = 3.0;
pub const LANDING_ASCENT_FACTOR: f32 = 1.5;
pub const LANDED_BRAKING_FACTOR: f32 = 3.5;

/// True airspeed gain per foot of altitude.
pub const TRUE_AIRSPEED_GAIN: f32 = 0.000016;

/// Feet per second a stricken aircraft falls.
pub const HIT_DESCENT_RATE: f32 = 90.0;

/// Angle from the assigned exit radial that still counts as on course.
pub const ON_COURSE_ANGLE: f32 = 0.08726;

/// Moves heading, altitude and speed towards the target.
pub struct AircraftUpdateFromTargetsEffect;
impl AircraftEffect for AircraftUpdateFromTargetsEffect {
  fn run(aircraft: &mut Aircraft, bundle: &mut Bundle) {
    let dt = bundle.dt;

    // Turning
    if aircraft.altitude > MIN_TURN_ALTITUDE
      && aircraft.heading != aircraft.target.heading
    {
      let rate = if aircraft.speed > 0.0 {
        (BANK_TURN_FACTOR / aircraft.speed).clamp(0.0, STANDARD_RATE_TURN)
      } else {
        STANDARD_RATE_TURN
      };
      let amount = rate * dt;
      let offset = angle_offset(aircraft.target.heading, aircraft.heading);

      if offset.abs() < amount {
        aircraft.heading = normalize_angle(aircraft.target.heading);
      } else {
        let left = match aircraft.target.turn {
          Some(turn) => turn == TurnDirection::Left,
          None => offset < 0.0,
        };
        let amount = if left { -amount } else { amount };
        aircraft.heading = normalize_angle(aircraft.heading + amount);
      }
    }

    // Altitude
    let offset = aircraft.target.altitude - aircraft.altitude;
    if offset.abs() < 0.02 {
      aircraft.trend = 0.0;
    } else {
      let landing = aircraft.mode == Mode::Landing;
      let (rate, factor) = match (offset < 0.0, landing) {
        (true, true) => (aircraft.model.rate.descent, LANDING_DESCENT_FACTOR),
        (true, false) => (aircraft.model.rate.descent, 1.0),
        (false, true) => (aircraft.model.rate.ascent, LANDING_ASCENT_FACTOR),
        (false, false) => (aircraft.model.rate.ascent, 1.0),
      };

      let mut step = rate * dt / NORMAL_RATE_FACTOR * factor;
      if aircraft.target.expedite {
        step *= NORMAL_RATE_FACTOR;
      }

      if offset.abs() <= step {
        aircraft.altitude = aircraft.target.altitude;
      } else {
        aircraft.altitude += step.copysign(offset);
      }
      aircraft.altitude = aircraft.altitude.max(0.0);
      aircraft.trend = offset.signum();
    }

    // Speed
    let offset = aircraft.target.speed - aircraft.speed;
    if offset.abs() >= 0.01 {
      let step = if offset < 0.0 {
        let braking = if aircraft.is_landed() {
          LANDED_BRAKING_FACTOR
        } else {
          1.0
        };
        aircraft.model.rate.decelerate * dt / 2.0 * braking
      } else {
        // Light aircraft pick up speed quicker on the roll.
        aircraft.model.rate.accelerate * dt / 2.0
          * crange(0.0, aircraft.speed, aircraft.model.speed.min, 2.0, 1.0)
      };

      if offset.abs() <= step {
        aircraft.speed = aircraft.target.speed;
      } else {
        aircraft.speed += step.copysign(offset);
      }
      aircraft.speed = aircraft.speed.max(0.0);
    }
  }
}

/// Moves the aircraft over the ground, drifting with the wind.
pub struct AircraftUpdatePositionEffect;
impl AircraftEffect for AircraftUpdatePositionEffect {
  fn run(aircraft: &mut Aircraft, bundle: &mut Bundle) {
    let dt = bundle.dt;
    let before = aircraft.pos;
    let mut scale = aircraft.speed * KNOT_TO_KM_PER_SECOND * dt;

    if bundle.options.simplify_speeds {
      aircraft.pos += heading_vector(aircraft.heading) * scale;
      aircraft.ground_speed = aircraft.speed;
      aircraft.ground_track = aircraft.heading;
    } else {
      scale *= 1.0 + aircraft.altitude * TRUE_AIRSPEED_GAIN;

      let displacement = if aircraft.is_landed() {
        heading_vector(aircraft.heading) * scale
      } else {
        let wind = bundle.airport.wind;
        let wind_speed = wind.speed_at(aircraft.altitude);
        let wind_heading = normalize_angle(wind.angle + PI);

        let crab = if aircraft.speed > 0.0
          && (aircraft.requested.navmode == NavMode::Fix
            || aircraft.mode == Mode::Landing)
        {
          let cross = wind_speed
            * angle_offset(aircraft.heading, wind_heading).sin()
            / aircraft.speed;
          cross.clamp(-1.0, 1.0).asin()
        } else {
          0.0
        };

        heading_vector(wind_heading) * wind_speed * KNOT_TO_KM_PER_SECOND * dt
          + heading_vector(aircraft.heading + crab) * scale
      };

      aircraft.pos += displacement;
      if dt > 0.0 {
        aircraft.ground_speed =
          displacement.length() / KNOT_TO_KM_PER_SECOND / dt;
      }
      if displacement.length_squared() > 0.0 {
        aircraft.ground_track = radial(displacement);
      }
    }

    aircraft.ds = aircraft.pos.distance(before);
    aircraft.distance = aircraft.pos.length();
    aircraft.radial = radial(aircraft.pos);
  }
}

/// Hands aircraft over when they enter or leave the controlled region.
pub struct AircraftUpdateBoundaryEffect;
impl AircraftEffect for AircraftUpdateBoundaryEffect {
  fn run(aircraft: &mut Aircraft, bundle: &mut Bundle) {
    let inside = aircraft.is_inside_ctr(bundle.airport);
    if inside == aircraft.inside_ctr {
      return;
    }

    aircraft.inside_ctr = inside;
    if inside {
      let text = format!(
        "{}, {}, in your airspace {}, over",
        bundle.airport.radio,
        aircraft.radio_callsign(),
        aircraft.radio_position()
      );
      bundle.events.push(Event::new(
        aircraft.id,
        EventKind::RadioCall { text, alert: false },
      ));
      return;
    }

    aircraft.fly_away();
    let kind = match aircraft.category {
      Category::Departure => EventKind::Departed {
        on_course: aircraft.destination.is_none_or(|destination| {
          angle_offset(aircraft.radial, destination).abs() < ON_COURSE_ANGLE
        }),
      },
      Category::Arrival => EventKind::FailedArrival,
    };
    bundle.events.push(Event::new(aircraft.id, kind));
  }
}

impl Aircraft {
  /// Climbs out on the current radial once handed off.
  pub fn fly_away(&mut self) {
    self.requested.navmode = NavMode::Heading;
    self.requested.heading = Some(self.radial);
    self.requested.turn = None;
    self.requested.fix.clear();
    self.requested.altitude = FLY_AWAY_ALTITUDE;
    self.requested.speed = self.model.speed.max.min(FLY_AWAY_SPEED);
  }

  /// Advances the aircraft by one step of `bundle.dt` seconds.
  pub fn integrate(&mut self, bundle: &mut Bundle) {
    if self.is_taxiing() {
      return;
    }

    if self.hit {
      self.altitude = (self.altitude - HIT_DESCENT_RATE * bundle.dt).max(0.0);
      self.speed *= 0.99;
      return;
    }

    AircraftUpdateFromTargetsEffect::run(self, bundle);
    AircraftUpdatePositionEffect::run(self, bundle);
    AircraftUpdateBoundaryEffect::run(self, bundle);
    self.record_history(bundle.time);
  }

  /// Resolves the target, then flies towards it.
  pub fn update(&mut self, bundle: &mut Bundle) {
    if !self.hit {
      self.resolve(bundle);
    }
    self.integrate(bundle);
  }
}
