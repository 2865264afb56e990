use std::{
  collections::{BTreeMap, HashMap, HashSet},
  f32::consts::PI,
};

use glam::Vec2;
use internment::Intern;
use serde::{Deserialize, Serialize};
use turborand::{TurboRand, rng::Rng};

use crate::{
  DEFAULT_ILS_DISTANCE, Error, KM_TO_FEET, MultiPolygon, Ring, angle_offset,
  heading_vector, normalize_angle,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
  /// Direction the wind blows from, in radians.
  pub angle: f32,
  /// Knots at the surface.
  pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindComponents {
  pub cross: f32,
  /// Negative for a tailwind.
  pub head: f32,
}

impl Wind {
  /// Wind strengthens by 2% every 1000 ft.
  pub fn speed_at(&self, altitude: f32) -> f32 {
    self.speed * (1.0 + altitude.max(0.0) * 0.00002)
  }

  pub fn components(&self, heading: f32) -> WindComponents {
    let angle = angle_offset(heading, self.angle).abs();
    WindComponents {
      cross: angle.sin() * self.speed,
      head: angle.cos() * self.speed,
    }
  }
}

fn default_glideslope() -> [f32; 2] {
  [3f32.to_radians(); 2]
}

fn default_delay() -> [f32; 2] {
  [2.0; 2]
}

fn default_separation() -> f32 {
  5.556
}

/// A strip of pavement usable from either end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Runway {
  pub names: [Intern<String>; 2],
  /// Center of the runway in km.
  pub position: Vec2,
  /// Heading when landing on the first end.
  pub angle: f32,
  /// Kilometres.
  pub length: f32,
  #[serde(default)]
  pub ils: [bool; 2],
  #[serde(default)]
  pub ils_distance: [Option<f32>; 2],
  #[serde(default = "default_glideslope")]
  pub glideslope: [f32; 2],
  /// Base taxi time to each end, in seconds.
  #[serde(default = "default_delay")]
  pub delay: [f32; 2],
  /// Published separation for approaches to adjacent runways, in km.
  #[serde(default = "default_separation")]
  pub separation: f32,

  #[serde(skip)]
  pub queue: [Vec<Intern<String>>; 2],
}

impl Runway {
  pub fn new(
    names: [&str; 2],
    position: Vec2,
    angle: f32,
    length: f32,
  ) -> Self {
    Self {
      names: names.map(|n| Intern::from_ref(&n.to_uppercase())),
      position,
      angle: normalize_angle(angle),
      length,
      ils: [false; 2],
      ils_distance: [None; 2],
      glideslope: default_glideslope(),
      delay: default_delay(),
      separation: default_separation(),
      queue: Default::default(),
    }
  }

  pub fn with_ils(mut self, end: usize, distance: Option<f32>) -> Self {
    self.ils[end] = true;
    self.ils_distance[end] = distance;
    self
  }

  fn end_of(&self, name: &str) -> Option<usize> {
    self.names.iter().position(|n| n.eq_ignore_ascii_case(name))
  }
}

/// One usable end of a runway.
#[derive(Debug, Clone, Copy)]
pub struct RunwayEnd<'a> {
  pub index: usize,
  pub end: usize,
  pub runway: &'a Runway,
}

impl RunwayEnd<'_> {
  pub fn name(&self) -> Intern<String> {
    self.runway.names[self.end]
  }

  pub fn heading(&self) -> f32 {
    normalize_angle(self.runway.angle + PI * self.end as f32)
  }

  pub fn length(&self) -> f32 {
    self.runway.length
  }

  /// Touchdown end of the pavement when landing on this end.
  pub fn threshold(&self) -> Vec2 {
    self.runway.position - heading_vector(self.heading()) * self.length() / 2.0
  }

  pub fn has_ils(&self) -> bool {
    self.runway.ils[self.end]
  }

  pub fn ils_distance(&self) -> f32 {
    match (self.has_ils(), self.runway.ils_distance[self.end]) {
      (true, Some(distance)) => distance,
      _ => DEFAULT_ILS_DISTANCE,
    }
  }

  /// Altitude in feet of a glideslope at `distance` km from the threshold.
  pub fn glideslope_altitude(&self, distance: f32, angle: Option<f32>) -> f32 {
    let angle = angle.unwrap_or(self.runway.glideslope[self.end]);
    angle.abs().tan() * distance.max(0.0) * KM_TO_FEET
  }

  /// Position relative to the approach: `x` is km right of the extended
  /// centerline, `y` is km before the threshold.
  pub fn offset(&self, position: Vec2) -> Vec2 {
    let heading = self.heading();
    let along = heading_vector(heading);
    let right = Vec2::new(heading.cos(), -heading.sin());
    let relative = position - self.threshold();

    Vec2::new(relative.dot(right), -relative.dot(along))
  }

  pub fn taxi_delay(&self, rng: &mut Rng) -> f32 {
    self.runway.delay[self.end] + rng.f32() * 3.0
  }

  pub fn queue(&self) -> &[Intern<String>] {
    &self.runway.queue[self.end]
  }

  pub fn queue_position(&self, id: Intern<String>) -> Option<usize> {
    self.queue().iter().position(|q| *q == id)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestrictedArea {
  pub name: String,
  /// Ceiling of the area in feet.
  pub height: f32,
  pub coordinates: Ring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
  pub name: String,
  pub icao: Intern<String>,
  /// Name used when aircraft call the tower.
  pub radio: String,
  /// Radius of the controlled traffic region in km.
  pub ctr_radius: f32,
  /// Ceiling of the controlled traffic region in feet.
  pub ctr_ceiling: f32,
  #[serde(default)]
  pub wind: Wind,

  #[serde(default)]
  pub fixes: HashMap<Intern<String>, Vec2>,
  #[serde(default)]
  pub sids: HashMap<Intern<String>, Vec<Intern<String>>>,
  #[serde(default)]
  pub runways: Vec<Runway>,
  #[serde(default)]
  pub restricted_areas: Vec<RestrictedArea>,
  /// Elevation in feet to the areas rising to it.
  #[serde(default)]
  pub terrain: BTreeMap<u32, Vec<MultiPolygon>>,
}

impl Airport {
  pub fn new(
    icao: &str,
    radio: &str,
    ctr_radius: f32,
    ctr_ceiling: f32,
  ) -> Self {
    Self {
      name: radio.to_owned(),
      icao: Intern::from_ref(&icao.to_uppercase()),
      radio: radio.to_owned(),
      ctr_radius,
      ctr_ceiling,
      wind: Wind::default(),
      fixes: HashMap::new(),
      sids: HashMap::new(),
      runways: Vec::new(),
      restricted_areas: Vec::new(),
      terrain: BTreeMap::new(),
    }
  }

  pub fn from_json(json: &str) -> Result<Self, Error> {
    let airport: Airport = serde_json::from_str(json)?;
    airport.validate()?;
    Ok(airport)
  }

  pub fn validate(&self) -> Result<(), Error> {
    for (sid, fixes) in self.sids.iter() {
      if let Some(fix) = fixes.iter().find(|f| !self.fixes.contains_key(*f)) {
        return Err(Error::UnknownSidFix {
          sid: sid.to_string(),
          fix: fix.to_string(),
        });
      }
    }

    let mut seen = HashSet::new();
    for name in self.runways.iter().flat_map(|r| r.names.iter()) {
      if !seen.insert(name.to_uppercase()) {
        return Err(Error::DuplicateRunway(name.to_string()));
      }
    }

    if let Some(area) = self
      .restricted_areas
      .iter()
      .find(|a| a.coordinates.is_empty())
    {
      return Err(Error::EmptyRestrictedArea(area.name.clone()));
    }

    Ok(())
  }

  pub fn add_fix(&mut self, name: &str, position: Vec2) {
    self.fixes.insert(Intern::from_ref(&name.to_uppercase()), position);
  }

  pub fn add_sid(&mut self, name: &str, fixes: &[&str]) {
    self.sids.insert(
      Intern::from_ref(&name.to_uppercase()),
      fixes
        .iter()
        .map(|f| Intern::from_ref(&f.to_uppercase()))
        .collect(),
    );
  }

  pub fn fix(&self, name: &str) -> Option<Vec2> {
    self.fixes.get(&Intern::from_ref(&name.to_uppercase())).copied()
  }

  pub fn sid(&self, name: &str) -> Option<&[Intern<String>]> {
    self
      .sids
      .get(&Intern::from_ref(&name.to_uppercase()))
      .map(|s| s.as_slice())
  }

  pub fn runway(&self, name: &str) -> Option<RunwayEnd<'_>> {
    self.runways.iter().enumerate().find_map(|(index, runway)| {
      runway.end_of(name).map(|end| RunwayEnd { index, end, runway })
    })
  }

  /// Whether two runway names refer to the same strip of pavement.
  pub fn same_runway(&self, a: &str, b: &str) -> bool {
    match (self.runway(a), self.runway(b)) {
      (Some(a), Some(b)) => a.index == b.index,
      _ => false,
    }
  }

  fn queue_mut(&mut self, name: &str) -> Option<&mut Vec<Intern<String>>> {
    self.runways.iter_mut().find_map(|runway| {
      runway.end_of(name).map(move |end| &mut runway.queue[end])
    })
  }

  pub fn enqueue(&mut self, name: &str, id: Intern<String>) -> bool {
    match self.queue_mut(name) {
      Some(queue) => {
        if !queue.contains(&id) {
          queue.push(id);
        }
        true
      }
      None => false,
    }
  }

  /// Removes `id` from the runway queue only when it is first in line.
  pub fn dequeue(&mut self, name: &str, id: Intern<String>) -> bool {
    match self.queue_mut(name) {
      Some(queue) if queue.first() == Some(&id) => {
        queue.remove(0);
        true
      }
      _ => false,
    }
  }

  pub fn queue_position(
    &self,
    name: &str,
    id: Intern<String>,
  ) -> Option<usize> {
    self.runway(name).and_then(|r| r.queue_position(id))
  }

  pub fn remove_from_queues(&mut self, id: Intern<String>) {
    for queue in self.runways.iter_mut().flat_map(|r| r.queue.iter_mut()) {
      queue.retain(|q| *q != id);
    }
  }

  /// Runway end with the strongest headwind that is long enough for
  /// `length` km of takeoff roll.
  pub fn select_runway(&self, length: f32) -> Option<Intern<String>> {
    let ends = || {
      self.runways.iter().enumerate().flat_map(|(index, runway)| {
        (0..2).map(move |end| RunwayEnd { index, end, runway })
      })
    };

    let long_enough = ends().any(|r| r.length() >= length);
    ends()
      .filter(|r| !long_enough || r.length() >= length)
      .max_by(|a, b| {
        let a = self.wind.components(a.heading()).head;
        let b = self.wind.components(b.heading()).head;
        a.total_cmp(&b)
      })
      .map(|r| r.name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fixtures::test_airport;

  mod runway_end {
    use super::*;

    #[test]
    fn test_headings_are_opposite() {
      let airport = test_airport();
      let a = airport.runway("36").unwrap();
      let b = airport.runway("18").unwrap();

      assert_eq!(a.index, b.index);
      assert!((angle_offset(a.heading(), b.heading()).abs() - PI).abs() < 1e-5);
    }

    #[test]
    fn test_threshold_is_behind_center() {
      let airport = test_airport();
      let end = airport.runway("36").unwrap();

      assert!((end.threshold() - Vec2::new(0.0, -1.5)).length() < 1e-5);
    }

    #[test]
    fn test_offset_on_final() {
      let airport = test_airport();
      let end = airport.runway("36").unwrap();

      // 10 km south of the threshold, 1 km east of the centerline.
      let offset = end.offset(Vec2::new(1.0, -11.5));
      assert!((offset.x - 1.0).abs() < 1e-4);
      assert!((offset.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_glideslope_altitude() {
      let airport = test_airport();
      let end = airport.runway("36").unwrap();

      let altitude = end.glideslope_altitude(10.0, None);
      let expected = 3f32.to_radians().tan() * 10.0 * KM_TO_FEET;
      assert!((altitude - expected).abs() < 0.1);
      assert_eq!(end.glideslope_altitude(-3.0, None), 0.0);
    }

    #[test]
    fn test_ils_distance_defaults() {
      let airport = test_airport();

      assert_eq!(airport.runway("36").unwrap().ils_distance(), 30.0);
      assert_eq!(
        airport.runway("18").unwrap().ils_distance(),
        DEFAULT_ILS_DISTANCE
      );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
      let airport = test_airport();

      assert!(airport.runway("09l").is_some());
      assert!(airport.runway("22").is_none());
      assert!(airport.same_runway("09L", "27R"));
      assert!(!airport.same_runway("09L", "36"));
    }
  }

  mod queue {
    use super::*;

    #[test]
    fn test_dequeue_only_first() {
      let mut airport = test_airport();
      let a = Intern::from_ref("AAL1");
      let b = Intern::from_ref("AAL2");

      assert!(airport.enqueue("36", a));
      assert!(airport.enqueue("36", b));
      assert_eq!(airport.queue_position("36", b), Some(1));

      assert!(!airport.dequeue("36", b));
      assert!(airport.dequeue("36", a));
      assert_eq!(airport.queue_position("36", b), Some(0));
    }

    #[test]
    fn test_unknown_runway() {
      let mut airport = test_airport();
      assert!(!airport.enqueue("99", Intern::from_ref("AAL1")));
    }

    #[test]
    fn test_remove_from_queues() {
      let mut airport = test_airport();
      let a = Intern::from_ref("AAL1");
      airport.enqueue("18", a);
      airport.remove_from_queues(a);

      assert_eq!(airport.queue_position("18", a), None);
    }
  }

  mod wind {
    use super::*;

    #[test]
    fn test_components() {
      let wind = Wind {
        angle: 0.0,
        speed: 20.0,
      };

      let head = wind.components(0.0);
      assert!((head.head - 20.0).abs() < 1e-4);
      assert!(head.cross.abs() < 1e-4);

      let tail = wind.components(PI);
      assert!((tail.head + 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_speed_at_altitude() {
      let wind = Wind {
        angle: 0.0,
        speed: 10.0,
      };
      assert!((wind.speed_at(10000.0) - 12.0).abs() < 1e-4);
    }
  }

  #[test]
  fn test_select_runway_prefers_headwind() {
    let mut airport = test_airport();
    airport.wind = Wind {
      angle: PI,
      speed: 15.0,
    };

    assert_eq!(
      airport.select_runway(1.0).map(|r| r.to_string()),
      Some("18".into())
    );
  }

  #[test]
  fn test_select_runway_respects_length() {
    let mut airport = test_airport();
    airport.wind = Wind {
      angle: PI / 2.0,
      speed: 15.0,
    };

    assert_eq!(
      airport.select_runway(1.0).map(|r| r.to_string()),
      Some("09L".into())
    );

    // Only the 3 km runway is long enough.
    let selected = airport.select_runway(2.8).unwrap();
    assert!(["36", "18"].contains(&selected.as_str()));
  }

  #[test]
  fn test_from_json_validates_sids() {
    let json = r#"{
      "name": "Test",
      "icao": "TEST",
      "radio": "Test",
      "ctr_radius": 80,
      "ctr_ceiling": 10000,
      "fixes": { "ALPHA": [0, 10] },
      "sids": { "NORTH1": ["ALPHA", "BRAVO"] }
    }"#;

    assert!(matches!(
      Airport::from_json(json),
      Err(Error::UnknownSidFix { .. })
    ));
  }

  #[test]
  fn test_from_json_loads() {
    let json = r#"{
      "name": "Test",
      "icao": "test",
      "radio": "Test",
      "ctr_radius": 80,
      "ctr_ceiling": 10000,
      "wind": { "angle": 0, "speed": 5 },
      "fixes": { "ALPHA": [0, 10] },
      "runways": [
        { "names": ["36", "18"], "position": [0, 0], "angle": 0, "length": 3 }
      ],
      "terrain": { "2000": [[[[0, 0], [1, 0], [1, 1]]]] }
    }"#;

    let airport = Airport::from_json(json).unwrap();
    assert_eq!(airport.fix("alpha"), Some(Vec2::new(0.0, 10.0)));
    assert_eq!(airport.runway("18").unwrap().end, 1);
    assert_eq!(airport.terrain.get(&2000).map(|t| t.len()), Some(1));
  }
}
