use glam::Vec2;
use internment::Intern;
use turborand::{SeededCore, rng::Rng};

use crate::entities::{
  aircraft::{Aircraft, AircraftOptions, Category},
  airport::{Airport, RestrictedArea, Runway},
  model::{Model, Rates, RunwayRequirement, Speeds, WeightClass},
};

/// A field at the origin with a 3 km north/south runway (ILS on 36), a
/// short east/west runway north of it, a few fixes and one restricted area.
pub fn test_airport() -> Airport {
  let mut airport = Airport::new("TEST", "Test Tower", 80.0, 10000.0);

  airport.runways.push(
    Runway::new(["36", "18"], Vec2::ZERO, 0.0, 3.0).with_ils(0, Some(30.0)),
  );
  airport.runways.push(Runway::new(
    ["09L", "27R"],
    Vec2::new(0.0, 5.0),
    90f32.to_radians(),
    2.0,
  ));

  airport.add_fix("ALPHA", Vec2::new(0.0, 20.0));
  airport.add_fix("BRAVO", Vec2::new(10.0, 20.0));
  airport.add_fix("CHARLIE", Vec2::new(20.0, 20.0));
  airport.add_fix("DELTA", Vec2::new(0.0, -20.0));
  airport.add_sid("NORTH1", &["ALPHA", "BRAVO"]);

  airport.restricted_areas.push(RestrictedArea {
    name: "R-1".into(),
    height: 5000.0,
    coordinates: vec![
      Vec2::new(30.0, 30.0),
      Vec2::new(40.0, 30.0),
      Vec2::new(40.0, 40.0),
      Vec2::new(30.0, 40.0),
    ],
  });

  airport
}

pub fn test_model() -> Model {
  Model {
    name: "Boeing 737-800".into(),
    icao: "B738".into(),
    weight_class: WeightClass::Medium,
    rate: Rates {
      turn: 3f32.to_radians(),
      ascent: 45.0,
      descent: 30.0,
      accelerate: 7.0,
      decelerate: 3.0,
    },
    runway: RunwayRequirement {
      takeoff: 2.5,
      landing: 1.6,
    },
    speed: Speeds {
      min: 135.0,
      max: 340.0,
      landing: 140.0,
      cruise: 290.0,
    },
  }
}

fn options(
  id: &str,
  category: Category,
  position: Vec2,
  heading: f32,
  altitude: f32,
  speed: Option<f32>,
) -> AircraftOptions {
  let (airline, flight_number) = id.split_at(3);
  let airline_callsign = match airline {
    "BAW" => "Speedbird",
    "AAL" => "American",
    _ => "Test",
  };

  AircraftOptions {
    airline: Intern::from_ref(airline),
    airline_callsign: airline_callsign.into(),
    flight_number: flight_number.into(),
    model: test_model(),
    category,
    position,
    heading,
    altitude,
    speed,
    destination: None,
    fixes: Vec::new(),
  }
}

/// An arrival flying at 250 kt, not yet completed against an airport.
pub fn arrival(
  id: &str,
  position: Vec2,
  heading: f32,
  altitude: f32,
) -> Aircraft {
  let mut aircraft = Aircraft::new(
    options(id, Category::Arrival, position, heading, altitude, Some(250.0)),
    10,
  );
  aircraft.inside_ctr = aircraft.is_inside_ctr(&test_airport());
  aircraft
}

/// A departure parked on the apron with a runway assigned.
pub fn departure(id: &str) -> Aircraft {
  let airport = test_airport();
  let mut rng = Rng::with_seed(3);
  let mut aircraft = Aircraft::new(
    options(id, Category::Departure, Vec2::ZERO, 0.0, 0.0, None),
    10,
  );
  aircraft.complete(&airport, &mut rng);
  aircraft
}
