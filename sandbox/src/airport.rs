use core::f32::consts::{PI, TAU};

use glam::Vec2;
use internment::Intern;
use turborand::{TurboRand, rng::Rng};

use engine::{
  entities::{
    aircraft::{AircraftOptions, Category},
    airline::Airline,
    airport::{Airport, RestrictedArea, Runway, Wind},
    model::Model,
  },
  heading_vector, radial,
};

const MODELS: &str = include_str!("../data/models.json");

/// Fraction of the CTR radius arrivals appear at.
pub const SPAWN_RADIUS_FACTOR: f32 = 0.95;

/// A two runway field with westerly wind, a handful of fixes and SIDs, one
/// restricted area and a ridge to the north east.
pub fn setup() -> Airport {
  let mut airport = Airport::new("EGKX", "Kingsway Tower", 60.0, 10000.0);
  airport.name = "Kingsway International".into();
  airport.wind = Wind {
    angle: 260f32.to_radians(),
    speed: 12.0,
  };

  let mut south = Runway::new(
    ["27L", "09R"],
    Vec2::new(0.0, -0.7),
    270f32.to_radians(),
    3.6,
  )
  .with_ils(0, None)
  .with_ils(1, Some(30.0));
  south.delay = [3.0, 6.0];

  let mut north = Runway::new(
    ["27R", "09L"],
    Vec2::new(0.0, 0.7),
    270f32.to_radians(),
    3.9,
  )
  .with_ils(0, None)
  .with_ils(1, Some(30.0));
  north.delay = [5.0, 2.0];

  airport.runways.push(south);
  airport.runways.push(north);

  for (name, position) in [
    ("LAMBO", Vec2::new(45.0, 20.0)),
    ("BIGGN", Vec2::new(40.0, -25.0)),
    ("OCKHM", Vec2::new(-40.0, -30.0)),
    ("BOVVA", Vec2::new(-35.0, 35.0)),
    ("DETLN", Vec2::new(0.0, 45.0)),
    ("MAYFD", Vec2::new(0.0, -45.0)),
    ("KXE01", Vec2::new(20.0, 0.0)),
    ("KXW01", Vec2::new(-20.0, 0.0)),
  ] {
    airport.add_fix(name, position);
  }

  airport.add_sid("DETLN1", &["KXW01", "DETLN"]);
  airport.add_sid("MAYFD1", &["KXW01", "MAYFD"]);
  airport.add_sid("LAMBO1", &["KXE01", "LAMBO"]);
  airport.add_sid("BIGGN1", &["KXE01", "BIGGN"]);

  airport.restricted_areas.push(RestrictedArea {
    name: "EG R-157".into(),
    height: 2500.0,
    coordinates: vec![
      Vec2::new(-12.0, 8.0),
      Vec2::new(-6.0, 8.0),
      Vec2::new(-6.0, 14.0),
      Vec2::new(-12.0, 14.0),
    ],
  });

  airport.terrain.insert(
    2000,
    vec![vec![vec![vec![
      Vec2::new(25.0, 30.0),
      Vec2::new(38.0, 34.0),
      Vec2::new(36.0, 44.0),
      Vec2::new(22.0, 40.0),
    ]]]],
  );

  airport
}

/// Who flies and what they fly.
#[derive(Debug, Clone)]
pub struct Roster {
  pub airlines: Vec<Airline>,
  pub models: Vec<Model>,
}

impl Roster {
  pub fn demo() -> Result<Self, engine::Error> {
    let models: Vec<Model> = serde_json::from_str(MODELS)?;
    let airlines = vec![
      Airline::new("BAW", "British Airways", "Speedbird"),
      Airline::new("EZY", "easyJet", "Easy"),
      Airline::new("DLH", "Lufthansa", "Lufthansa"),
      Airline::new("AFR", "Air France", "Airfrance"),
      Airline::new("UAE", "Emirates", "Emirates"),
      Airline::new("RYR", "Ryanair", "Ryanair"),
    ];

    Ok(Self { airlines, models })
  }

  /// Looks up an airline by ICAO code.
  pub fn airline(&self, icao: &str) -> Option<&Airline> {
    let icao = Intern::from_ref(&icao.to_uppercase());
    self.airlines.iter().find(|a| a.icao == icao)
  }

  /// An arrival somewhere on the edge of the CTR, routed via the fix
  /// nearest to where it appears.
  pub fn arrival(
    &self,
    airport: &Airport,
    airline: &Airline,
    flight_number: String,
    rng: &mut Rng,
  ) -> Option<AircraftOptions> {
    let model = rng.sample(&self.models)?;
    let bearing = rng.f32() * TAU;
    let position =
      heading_vector(bearing) * airport.ctr_radius * SPAWN_RADIUS_FACTOR;

    let fix = airport
      .fixes
      .iter()
      .min_by(|a, b| a.1.distance(position).total_cmp(&b.1.distance(position)))
      .map(|(name, _)| *name);

    Some(AircraftOptions {
      airline: airline.icao,
      airline_callsign: airline.callsign.clone(),
      flight_number,
      model: model.clone(),
      category: Category::Arrival,
      position,
      heading: bearing + PI,
      altitude: 7000.0 + (rng.u8(0..=4) as f32) * 500.0,
      speed: Some(250.0),
      destination: None,
      fixes: fix.into_iter().collect(),
    })
  }

  /// A departure parked at the apron, bound for the end of a random SID.
  pub fn departure(
    &self,
    airport: &Airport,
    airline: &Airline,
    flight_number: String,
    rng: &mut Rng,
  ) -> Option<AircraftOptions> {
    let model = rng.sample(&self.models)?;
    let sids = airport.sids.values().collect::<Vec<_>>();
    let destination = rng
      .sample(&sids)
      .and_then(|fixes| fixes.last())
      .and_then(|fix| airport.fix(fix))
      .map(radial);

    Some(AircraftOptions {
      airline: airline.icao,
      airline_callsign: airline.callsign.clone(),
      flight_number,
      model: model.clone(),
      category: Category::Departure,
      position: Vec2::ZERO,
      heading: 0.0,
      altitude: 0.0,
      speed: None,
      destination,
      fixes: Vec::new(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use turborand::SeededCore;

  #[test]
  fn test_demo_airport_is_valid() {
    let airport = setup();
    assert!(airport.validate().is_ok());
    assert!(airport.runway("27l").is_some());
    assert!(airport.runway("09L").is_some());
    assert_eq!(airport.sids.len(), 4);
  }

  #[test]
  fn test_models_load() {
    let roster = Roster::demo().unwrap();
    assert_eq!(roster.models.len(), 5);
    assert!(roster.models.iter().all(|m| m.speed.min < m.speed.max));
    assert_eq!(roster.models[1].icao, "A320");
  }

  #[test]
  fn test_every_model_fits_a_runway() {
    let airport = setup();
    let roster = Roster::demo().unwrap();
    let longest = airport
      .runways
      .iter()
      .map(|r| r.length)
      .fold(0.0, f32::max);

    for model in roster.models.iter() {
      assert!(model.runway.takeoff <= longest, "{}", model.icao);
    }
  }

  #[test]
  fn test_arrival_on_the_edge() {
    let airport = setup();
    let roster = Roster::demo().unwrap();
    let mut rng = Rng::with_seed(5);

    for _ in 0..10 {
      let options = roster
        .arrival(&airport, &roster.airlines[0], "123".into(), &mut rng)
        .unwrap();
      let distance = options.position.length();
      assert!((distance - 57.0).abs() < 0.01);
      assert_eq!(options.fixes.len(), 1);
      assert!(options.altitude < airport.ctr_ceiling);
    }
  }

  #[test]
  fn test_departure_has_destination() {
    let airport = setup();
    let roster = Roster::demo().unwrap();
    let mut rng = Rng::with_seed(5);

    let options = roster
      .departure(&airport, &roster.airlines[1], "456".into(), &mut rng)
      .unwrap();
    assert_eq!(options.category, Category::Departure);
    assert_eq!(options.airline_callsign, "Easy");
    assert!(options.destination.is_some());
  }

  #[test]
  fn test_airline_lookup() {
    let roster = Roster::demo().unwrap();
    assert_eq!(roster.airline("baw").unwrap().callsign, "Speedbird");
    assert!(roster.airline("XXX").is_none());
  }
}
