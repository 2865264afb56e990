use core::f32::consts::FRAC_PI_4;

use glam::Vec2;

use crate::{
  BANK_ANGLE, GRAVITY, KNOT_TO_METERS_PER_SECOND, MIN_CLEARED_ALTITUDE,
  SPEED_LIMIT, SPEED_LIMIT_ALTITUDE, angle_offset, crange, engine::Bundle,
  normalize_angle, radial,
};

use super::{
  Aircraft, Mode, NavMode, TurnDirection,
  events::{Event, EventKind},
};

/// Widest localizer intercept that is not written up.
pub const MAX_INTERCEPT_ANGLE: f32 = 0.5236;
/// Lateral angle from the threshold inside which the localizer is captured.
pub const LOCALIZER_CAPTURE_ANGLE: f32 = 0.17453;
/// Largest correction towards the centerline while established.
pub const MAX_LOCALIZER_CORRECTION: f32 = 0.5236;
pub const LOCALIZER_GAIN: f32 = 12.0;
/// Below this, losing the glideslope no longer aborts the landing.
pub const GO_AROUND_FLOOR: f32 = 300.0;

/// Fixes closer than this count as passed.
pub const FIX_PASSED_DISTANCE: f32 = 0.5;
/// Turns are only anticipated this close to a fix.
pub const FIX_ANTICIPATION_DISTANCE: f32 = 10.0;

pub trait AircraftEffect {
  fn run(aircraft: &mut Aircraft, bundle: &mut Bundle);
}

/// Turns the controller's clearance into this tick's target.
pub struct AircraftUpdateNavigationEffect;
impl AircraftEffect for AircraftUpdateNavigationEffect {
  fn run(aircraft: &mut Aircraft, bundle: &mut Bundle) {
    if aircraft.requested.altitude > 0.0 {
      aircraft.requested.altitude =
        aircraft.requested.altitude.max(MIN_CLEARED_ALTITUDE);
    }

    match aircraft.requested.navmode {
      NavMode::Rwy => resolve_runway(aircraft, bundle),
      NavMode::Fix => resolve_fix(aircraft, bundle),
      NavMode::Hold => resolve_hold(aircraft),
      NavMode::Heading | NavMode::None => mirror_requested(aircraft),
    }

    if aircraft.mode != Mode::Landing {
      aircraft.target.altitude =
        aircraft.requested.altitude.max(MIN_CLEARED_ALTITUDE);
      aircraft.target.expedite = aircraft.requested.expedite;

      let speed = if aircraft.altitude <= SPEED_LIMIT_ALTITUDE {
        aircraft.requested.speed.min(SPEED_LIMIT)
      } else {
        aircraft.requested.speed
      };
      aircraft.target.speed = aircraft.model.clamp_speed(speed);
    }

    // Too slow to fly.
    if aircraft.speed < aircraft.model.speed.min {
      aircraft.target.altitude = 0.0;
    }
  }
}

/// Ground movement: taxiing, holding short and the takeoff roll.
pub struct AircraftUpdateGroundEffect;
impl AircraftEffect for AircraftUpdateGroundEffect {
  fn run(aircraft: &mut Aircraft, bundle: &mut Bundle) {
    let runway = aircraft
      .requested
      .runway
      .and_then(|r| bundle.airport.runway(&r));

    if aircraft.mode == Mode::Taxi
      && bundle.time - aircraft.taxi_start > aircraft.taxi_delay
    {
      aircraft.transition(Mode::Waiting);
    }

    match aircraft.mode {
      Mode::Waiting => {
        let Some(runway) = runway else {
          return;
        };

        aircraft.pos = runway.threshold();
        aircraft.heading = runway.heading();
        aircraft.target.heading = runway.heading();

        if !aircraft.ready_announced
          && runway.queue_position(aircraft.id) == Some(0)
        {
          aircraft.ready_announced = true;
          bundle.events.push(Event::new(
            aircraft.id,
            EventKind::ReadyForDeparture {
              runway: runway.name(),
            },
          ));
        }
      }
      Mode::Takeoff => {
        if let Some(runway) = runway {
          aircraft.target.heading = runway.heading();
          aircraft.target.turn = None;
        }

        if aircraft.speed < aircraft.model.speed.min {
          aircraft.target.altitude = 0.0;
          aircraft.altitude = 0.0;
        } else {
          aircraft.target.altitude = aircraft.requested.altitude;
        }

        aircraft.target.speed = aircraft.model.speed.cruise;

        if aircraft.altitude > 200.0
          && aircraft.speed > aircraft.model.speed.min
          && aircraft.transition(Mode::Cruise)
        {
          aircraft.requested.runway = None;
        }
      }
      _ => {}
    }
  }
}

fn mirror_requested(aircraft: &mut Aircraft) {
  aircraft.target.heading =
    normalize_angle(aircraft.requested.heading.unwrap_or(aircraft.heading));
  aircraft.target.turn = aircraft.requested.turn;
}

fn resolve_runway(aircraft: &mut Aircraft, bundle: &mut Bundle) {
  let Some(runway) = aircraft
    .requested
    .runway
    .and_then(|r| bundle.airport.runway(&r))
  else {
    mirror_requested(aircraft);
    return;
  };

  let offset = runway.offset(aircraft.pos);
  let offset_angle = offset.x.atan2(offset.y);
  let angle = runway.heading();

  aircraft.approach_offset = Some(offset.x.abs());
  aircraft.approach_distance = Some(offset.y);

  // Aim past the threshold, further on longer runways.
  let landing_zone = crange(1.0, runway.length(), 5.0, 0.1, 0.5);
  let reference = offset.y + landing_zone;
  let glideslope_altitude = runway
    .glideslope_altitude(reference, None)
    .clamp(0.0, aircraft.altitude.max(0.0));
  let glideslope_window = runway
    .glideslope_altitude(reference, Some(1f32.to_radians()))
    .abs();

  if aircraft.mode == Mode::Landing {
    aircraft.target.altitude = glideslope_altitude;
  }

  let captured = (aircraft.altitude - glideslope_altitude).abs()
    < glideslope_window
    && offset_angle.abs() < LOCALIZER_CAPTURE_ANGLE
    && offset.y < runway.ils_distance();

  if captured {
    if aircraft.mode != Mode::Landing && aircraft.transition(Mode::Landing) {
      let intercept = aircraft.requested.heading.unwrap_or(aircraft.heading);
      if angle_offset(intercept, angle).abs() > MAX_INTERCEPT_ANGLE {
        bundle
          .events
          .push(Event::new(aircraft.id, EventKind::InterceptTooSteep));
      }

      aircraft.requested.turn = None;
      aircraft.requested.heading = Some(angle);
    }

    aircraft.target.turn = None;
    aircraft.target.heading = if offset.y > 0.2 {
      let correction = (-LOCALIZER_GAIN * offset_angle)
        .clamp(-MAX_LOCALIZER_CORRECTION, MAX_LOCALIZER_CORRECTION);
      normalize_angle(angle + correction)
    } else {
      angle
    };
    aircraft.target.altitude = glideslope_altitude;

    if aircraft.requested.speed > 0.0 {
      aircraft.requested.start_speed = aircraft.requested.speed;
    }
    aircraft.target.speed = crange(
      3.0,
      offset.y,
      10.0,
      aircraft.model.speed.landing,
      aircraft.requested.start_speed,
    );
  } else if aircraft.altitude >= GO_AROUND_FLOOR
    && aircraft.mode == Mode::Landing
  {
    aircraft.cancel_landing(bundle.airport);
    bundle.events.push(Event::new(aircraft.id, EventKind::LostIls));
    mirror_requested(aircraft);
  } else {
    mirror_requested(aircraft);
  }

  if aircraft.altitude < 10.0 {
    aircraft.target.speed = 0.0;
  }
}

fn resolve_fix(aircraft: &mut Aircraft, bundle: &mut Bundle) {
  let fix = aircraft
    .requested
    .fix
    .first()
    .and_then(|f| bundle.airport.fix(f));
  let Some(fix) = fix else {
    aircraft.cancel_fix();
    mirror_requested(aircraft);
    return;
  };

  let distance = aircraft.pos.distance(fix);
  let passed = distance < FIX_PASSED_DISTANCE
    || (distance < FIX_ANTICIPATION_DISTANCE
      && distance < aircraft.turn_initiation_distance(fix, bundle));

  if passed {
    if aircraft.requested.fix.len() > 1 {
      aircraft.requested.fix.remove(0);
    } else {
      aircraft.cancel_fix();
      mirror_requested(aircraft);
    }
  } else {
    aircraft.target.heading = radial(fix - aircraft.pos);
    aircraft.target.turn = None;
  }
}

fn resolve_hold(aircraft: &mut Aircraft) {
  let Some(turn) = aircraft.requested.turn else {
    return;
  };

  let offset = match turn {
    TurnDirection::Left => -FRAC_PI_4,
    TurnDirection::Right => FRAC_PI_4,
  };

  aircraft.target.heading = normalize_angle(aircraft.heading + offset);
  aircraft.target.turn = Some(turn);
}

impl Aircraft {
  /// Resolves this tick's target from the clearance and position.
  pub fn resolve(&mut self, bundle: &mut Bundle) {
    AircraftUpdateNavigationEffect::run(self, bundle);
    AircraftUpdateGroundEffect::run(self, bundle);
  }

  /// How far before `fix` the turn onto the following leg has to start, in
  /// km. Zero when there is no following leg.
  pub fn turn_initiation_distance(&self, fix: Vec2, bundle: &Bundle) -> f32 {
    let Some(next) = self
      .requested
      .fix
      .get(1)
      .and_then(|f| bundle.airport.fix(f))
    else {
      return 0.0;
    };

    let speed = self.ground_speed * KNOT_TO_METERS_PER_SECOND;
    let course_change = angle_offset(radial(next - fix), self.heading).abs();
    let turn_radius = speed.powi(2) / (GRAVITY * BANK_ANGLE.to_radians().tan());

    // One second of reaction time on top of the turn itself.
    (turn_radius * (course_change / 2.0).tan() + speed) / 1000.0
  }
}

#[cfg(test)]
mod tests {
  use core::f32::consts::PI;

  use internment::Intern;

  use super::*;
  use crate::{
    KM_TO_FEET, SimOptions,
    entities::airport::Airport,
    fixtures::{arrival, departure, test_airport},
  };

  fn resolve(
    aircraft: &mut Aircraft,
    airport: &Airport,
    time: f32,
  ) -> Vec<Event> {
    let options = SimOptions::default();
    let mut bundle = Bundle::new(airport, &options, 1.0, time);
    aircraft.resolve(&mut bundle);
    bundle.events
  }

  /// Aircraft on a 36 approach `distance` km out, `angle` off the
  /// centerline, sitting on the glideslope.
  fn on_approach(distance: f32, angle: f32) -> Aircraft {
    let lateral = distance * angle.tan();
    let altitude = 3f32.to_radians().tan() * (distance + 0.3) * KM_TO_FEET;
    let mut aircraft =
      arrival("BAW1", Vec2::new(lateral, -1.5 - distance), 0.0, altitude);
    aircraft.requested.navmode = NavMode::Rwy;
    aircraft.requested.runway = Some(Intern::from_ref("36"));
    aircraft.requested.start_speed = aircraft.speed;
    aircraft
  }

  mod heading {
    use super::*;

    #[test]
    fn test_mirrors_requested() {
      let airport = test_airport();
      let mut aircraft = arrival("BAW1", Vec2::new(0.0, 20.0), PI, 6000.0);
      aircraft.requested.navmode = NavMode::Heading;
      aircraft.requested.heading = Some(1.0);
      aircraft.requested.turn = Some(TurnDirection::Left);

      resolve(&mut aircraft, &airport, 0.0);

      assert_eq!(aircraft.target.heading, 1.0);
      assert_eq!(aircraft.target.turn, Some(TurnDirection::Left));
    }

    #[test]
    fn test_altitude_floor_and_speed_limit() {
      let airport = test_airport();
      let mut aircraft = arrival("BAW1", Vec2::new(0.0, 20.0), PI, 6000.0);
      aircraft.requested.altitude = 400.0;
      aircraft.requested.speed = 320.0;

      resolve(&mut aircraft, &airport, 0.0);

      assert_eq!(aircraft.requested.altitude, 1000.0);
      assert_eq!(aircraft.target.altitude, 1000.0);
      assert_eq!(aircraft.target.speed, 250.0);
    }

    #[test]
    fn test_no_speed_limit_up_high() {
      let airport = test_airport();
      let mut aircraft = arrival("BAW1", Vec2::new(0.0, 20.0), PI, 12000.0);
      aircraft.requested.speed = 320.0;

      resolve(&mut aircraft, &airport, 0.0);

      assert_eq!(aircraft.target.speed, 320.0);
    }

    #[test]
    fn test_idempotent() {
      let airport = test_airport();
      let mut aircraft = arrival("BAW1", Vec2::new(3.0, 20.0), PI, 6000.0);
      aircraft.requested.navmode = NavMode::Fix;
      aircraft.requested.fix = vec![Intern::from_ref("DELTA")];

      resolve(&mut aircraft, &airport, 0.0);
      let first = aircraft.target.clone();
      resolve(&mut aircraft, &airport, 0.0);

      assert_eq!(aircraft.target, first);
    }
  }

  mod fix {
    use super::*;

    #[test]
    fn test_steers_towards_fix() {
      let airport = test_airport();
      let mut aircraft = arrival("BAW1", Vec2::new(0.0, 0.0), PI, 6000.0);
      aircraft.requested.navmode = NavMode::Fix;
      aircraft.requested.fix = vec![Intern::from_ref("BRAVO")];

      resolve(&mut aircraft, &airport, 0.0);

      let expected = radial(Vec2::new(10.0, 20.0));
      assert!((aircraft.target.heading - expected).abs() < 1e-5);
    }

    #[test]
    fn test_sequences_to_next_fix() {
      let airport = test_airport();
      let mut aircraft = arrival("BAW1", Vec2::new(0.0, 19.8), 0.0, 6000.0);
      aircraft.requested.navmode = NavMode::Fix;
      aircraft.requested.fix =
        vec![Intern::from_ref("ALPHA"), Intern::from_ref("BRAVO")];

      resolve(&mut aircraft, &airport, 0.0);

      assert_eq!(aircraft.requested.fix, vec![Intern::from_ref("BRAVO")]);
      assert_eq!(aircraft.requested.navmode, NavMode::Fix);
    }

    #[test]
    fn test_last_fix_reverts_to_heading() {
      let airport = test_airport();
      let mut aircraft = arrival("BAW1", Vec2::new(0.0, 19.8), 0.3, 6000.0);
      aircraft.requested.navmode = NavMode::Fix;
      aircraft.requested.fix = vec![Intern::from_ref("ALPHA")];

      resolve(&mut aircraft, &airport, 0.0);

      assert_eq!(aircraft.requested.navmode, NavMode::Heading);
      assert_eq!(aircraft.requested.heading, Some(0.3));
      assert!(aircraft.requested.fix.is_empty());
    }

    #[test]
    fn test_turn_anticipated_before_fix() {
      let airport = test_airport();
      let options = SimOptions::default();
      let bundle = Bundle::new(&airport, &options, 1.0, 0.0);

      // Flying north to ALPHA, then a right angle turn to BRAVO.
      let mut aircraft = arrival("BAW1", Vec2::new(0.0, 17.0), 0.0, 6000.0);
      aircraft.requested.fix =
        vec![Intern::from_ref("ALPHA"), Intern::from_ref("BRAVO")];
      aircraft.ground_speed = 250.0;

      let fix = airport.fix("ALPHA").unwrap();
      let distance = aircraft.turn_initiation_distance(fix, &bundle);

      // r = v² / (g tan 25°) with v ≈ 128.6 m/s gives roughly 3.6 km.
      assert!(distance > 3.5 && distance < 4.0, "{distance}");
    }

    #[test]
    fn test_no_anticipation_for_last_fix() {
      let airport = test_airport();
      let options = SimOptions::default();
      let bundle = Bundle::new(&airport, &options, 1.0, 0.0);
      let mut aircraft = arrival("BAW1", Vec2::new(0.0, 17.0), 0.0, 6000.0);
      aircraft.requested.fix = vec![Intern::from_ref("ALPHA")];
      aircraft.ground_speed = 250.0;

      let fix = airport.fix("ALPHA").unwrap();
      assert_eq!(aircraft.turn_initiation_distance(fix, &bundle), 0.0);
    }
  }

  #[test]
  fn test_hold_offsets_heading() {
    let airport = test_airport();
    let mut aircraft = arrival("BAW1", Vec2::new(0.0, 20.0), 1.0, 6000.0);
    aircraft.requested.navmode = NavMode::Hold;
    aircraft.requested.turn = Some(TurnDirection::Right);

    resolve(&mut aircraft, &airport, 0.0);
    assert!((aircraft.target.heading - (1.0 + FRAC_PI_4)).abs() < 1e-5);

    aircraft.requested.turn = Some(TurnDirection::Left);
    resolve(&mut aircraft, &airport, 0.0);
    assert!((aircraft.target.heading - (1.0 - FRAC_PI_4)).abs() < 1e-5);
  }

  #[test]
  fn test_too_slow_forces_descent() {
    let airport = test_airport();
    let mut aircraft = arrival("BAW1", Vec2::new(0.0, 20.0), 1.0, 6000.0);
    aircraft.speed = 100.0;

    resolve(&mut aircraft, &airport, 0.0);
    assert_eq!(aircraft.target.altitude, 0.0);
  }

  mod runway {
    use super::*;

    #[test]
    fn test_captures_once() {
      let airport = test_airport();
      let mut aircraft = on_approach(15.0, 0.2f32.to_radians());
      // Cleared on a steep intercept heading.
      aircraft.requested.heading = Some(PI / 2.0);

      let mut events = Vec::new();
      let mut transitions = 0;
      for tick in 0..5 {
        let before = aircraft.mode;
        events.extend(resolve(&mut aircraft, &airport, tick as f32));
        if before != aircraft.mode {
          transitions += 1;
        }
        assert_eq!(aircraft.mode, Mode::Landing);
      }

      assert_eq!(transitions, 1);
      assert_eq!(events.len(), 1);
      assert_eq!(events[0].kind, EventKind::InterceptTooSteep);
      assert_eq!(aircraft.requested.heading, Some(0.0));
    }

    #[test]
    fn test_gentle_intercept_is_silent() {
      let airport = test_airport();
      let mut aircraft = on_approach(15.0, 0.2f32.to_radians());
      aircraft.requested.heading = Some(20f32.to_radians());

      let events = resolve(&mut aircraft, &airport, 0.0);

      assert_eq!(aircraft.mode, Mode::Landing);
      assert!(events.is_empty());
    }

    #[test]
    fn test_not_captured_far_above_glideslope() {
      let airport = test_airport();
      let mut aircraft = on_approach(15.0, 0.0);
      aircraft.altitude += 2000.0;

      resolve(&mut aircraft, &airport, 0.0);

      assert_eq!(aircraft.mode, Mode::Cruise);
    }

    #[test]
    fn test_not_captured_outside_ils_range() {
      let airport = test_airport();
      let mut aircraft = on_approach(35.0, 0.0);

      resolve(&mut aircraft, &airport, 0.0);

      assert_eq!(aircraft.mode, Mode::Cruise);
    }

    #[test]
    fn test_steers_towards_centerline() {
      let airport = test_airport();
      let mut aircraft = on_approach(10.0, 2f32.to_radians());

      resolve(&mut aircraft, &airport, 0.0);

      // Right of the centerline, so the target turns left of 360.
      let correction = angle_offset(aircraft.target.heading, 0.0);
      assert!(correction < 0.0);
      assert!(correction >= -MAX_LOCALIZER_CORRECTION);
    }

    #[test]
    fn test_speed_interpolates_to_landing_speed() {
      let airport = test_airport();
      let mut aircraft = on_approach(2.0, 0.0);
      aircraft.requested.speed = 0.0;
      aircraft.requested.start_speed = 200.0;

      resolve(&mut aircraft, &airport, 0.0);
      assert_eq!(aircraft.target.speed, aircraft.model.speed.landing);

      let mut aircraft = on_approach(12.0, 0.0);
      aircraft.requested.speed = 0.0;
      aircraft.requested.start_speed = 200.0;

      resolve(&mut aircraft, &airport, 0.0);
      assert_eq!(aircraft.target.speed, 200.0);
    }

    #[test]
    fn test_lost_ils_goes_around() {
      let airport = test_airport();
      let mut aircraft = on_approach(10.0, 0.0);
      resolve(&mut aircraft, &airport, 0.0);
      assert_eq!(aircraft.mode, Mode::Landing);

      // Blown well off the localizer.
      aircraft.pos.x += 5.0;
      let events = resolve(&mut aircraft, &airport, 1.0);

      assert_eq!(aircraft.mode, Mode::Cruise);
      assert_eq!(aircraft.requested.navmode, NavMode::Heading);
      assert_eq!(aircraft.requested.runway, None);
      assert_eq!(events.len(), 1);
      assert_eq!(events[0].kind, EventKind::LostIls);
    }

    #[test]
    fn test_rollout_stops() {
      let airport = test_airport();
      let mut aircraft = on_approach(0.0, 0.0);
      aircraft.mode = Mode::Landing;
      aircraft.altitude = 0.0;
      aircraft.pos = Vec2::new(0.0, -0.5);

      resolve(&mut aircraft, &airport, 0.0);

      assert_eq!(aircraft.target.speed, 0.0);
      assert_eq!(aircraft.target.altitude, 0.0);
      assert_eq!(aircraft.mode, Mode::Landing);
    }
  }

  mod ground {
    use super::*;

    #[test]
    fn test_taxi_promotes_after_delay() {
      let mut airport = test_airport();
      let mut aircraft = departure("BAW1");
      let runway = aircraft.requested.runway.unwrap();
      airport.enqueue(&runway, aircraft.id);
      aircraft.transition(Mode::Taxi);
      aircraft.taxi_start = 0.0;
      aircraft.taxi_delay = 4.0;

      resolve(&mut aircraft, &airport, 2.0);
      assert_eq!(aircraft.mode, Mode::Taxi);

      let events = resolve(&mut aircraft, &airport, 5.0);
      assert_eq!(aircraft.mode, Mode::Waiting);
      assert_eq!(
        aircraft.pos,
        airport.runway(&runway).unwrap().threshold()
      );
      assert_eq!(events.len(), 1);

      // Only announced once.
      assert!(resolve(&mut aircraft, &airport, 6.0).is_empty());
    }

    #[test]
    fn test_second_in_line_waits_quietly() {
      let mut airport = test_airport();
      let mut first = departure("BAW1");
      let mut second = departure("BAW2");
      let runway = first.requested.runway.unwrap();
      second.requested.runway = Some(runway);
      airport.enqueue(&runway, first.id);
      airport.enqueue(&runway, second.id);
      first.mode = Mode::Waiting;
      second.mode = Mode::Waiting;

      assert_eq!(resolve(&mut first, &airport, 0.0).len(), 1);
      assert!(resolve(&mut second, &airport, 0.0).is_empty());

      airport.dequeue(&runway, first.id);
      assert_eq!(resolve(&mut second, &airport, 1.0).len(), 1);
    }

    #[test]
    fn test_takeoff_roll_then_cruise() {
      let airport = test_airport();
      let mut aircraft = departure("BAW1");
      aircraft.mode = Mode::Takeoff;
      aircraft.requested.altitude = 5000.0;

      resolve(&mut aircraft, &airport, 0.0);
      assert_eq!(aircraft.target.altitude, 0.0);
      assert_eq!(aircraft.target.speed, aircraft.model.speed.cruise);

      aircraft.speed = 180.0;
      aircraft.altitude = 250.0;
      resolve(&mut aircraft, &airport, 1.0);
      assert_eq!(aircraft.mode, Mode::Cruise);
      assert_eq!(aircraft.requested.runway, None);
    }
  }
}
