use crate::{
  distance_to_ring, engine::Bundle, point_in_ring, point_to_multipolygon,
};

use super::{
  Aircraft, RestrictedStatus,
  effects::AircraftEffect,
  events::{Event, EventKind},
};

/// Seconds of flight before an aircraft inside a restricted area is checked
/// again.
pub const RESTRICTED_RECHECK_TIME: f32 = 50.0;
/// Smallest distance budget towards terrain, in km.
pub const MIN_TERRAIN_RANGE: f32 = 0.2;

/// Kilometres flown in `seconds` at `speed` knots.
fn distance_flown(speed: f32, seconds: f32) -> f32 {
  speed * 1.85 / 3.6 * seconds / 1000.0
}

fn terrain_level(altitude: f32) -> u32 {
  ((altitude.max(0.0) / 1000.0).ceil() * 1000.0) as u32
}

/// Flags aircraft below the ceiling of a restricted area. Each area keeps a
/// distance budget so the polygon test only runs once the aircraft could
/// have reached it.
pub struct AircraftUpdateRestrictedEffect;
impl AircraftEffect for AircraftUpdateRestrictedEffect {
  fn run(aircraft: &mut Aircraft, bundle: &mut Bundle) {
    let areas = &bundle.airport.restricted_areas;
    if aircraft.restricted.len() != areas.len() {
      aircraft
        .restricted
        .resize(areas.len(), RestrictedStatus::default());
    }

    for (area, status) in areas.iter().zip(aircraft.restricted.iter_mut()) {
      if aircraft.altitude >= area.height {
        *status = RestrictedStatus::default();
        continue;
      }

      status.range = status.range.map(|range| range - aircraft.ds);
      if status.range.is_some_and(|range| range > 0.0) {
        continue;
      }

      if point_in_ring(aircraft.pos, &area.coordinates) {
        if !status.inside {
          bundle.events.push(Event::new(
            aircraft.id,
            EventKind::RestrictedAreaEntry {
              area: area.name.clone(),
            },
          ));
        }

        status.inside = true;
        status.range =
          Some(distance_flown(aircraft.speed, RESTRICTED_RECHECK_TIME));
      } else {
        status.inside = false;
        status.range = Some(
          distance_flown(aircraft.speed, 1.0)
            .max(distance_to_ring(aircraft.pos, &area.coordinates)),
        );
      }
    }

    aircraft.warning = aircraft.restricted.iter().any(|s| s.inside);
  }
}

/// Brings down aircraft flying into terrain higher than they are.
pub struct AircraftUpdateTerrainEffect;
impl AircraftEffect for AircraftUpdateTerrainEffect {
  fn run(aircraft: &mut Aircraft, bundle: &mut Bundle) {
    let level = terrain_level(aircraft.altitude);
    aircraft.terrain_level = level;

    for (elevation, areas) in bundle.airport.terrain.iter() {
      let ranges = aircraft
        .terrain_ranges
        .entry(*elevation)
        .or_insert_with(Vec::new);
      ranges.resize(areas.len(), f32::INFINITY);

      // Budgets go stale while the aircraft is above the terrain.
      if *elevation < level {
        ranges.fill(f32::INFINITY);
        continue;
      }

      for (area, range) in areas.iter().zip(ranges.iter_mut()) {
        *range -= aircraft.ds;
        if *range >= 0.0 && range.is_finite() {
          continue;
        }

        let test = point_to_multipolygon(aircraft.pos, area);
        if test.inside {
          *range = 0.0;
          if !aircraft.hit {
            aircraft.hit = true;
            aircraft.altitude = 0.0;
            bundle
              .events
              .push(Event::new(aircraft.id, EventKind::TerrainImpact));
          }
        } else {
          *range = test.distance.max(MIN_TERRAIN_RANGE);
        }
      }
    }
  }
}

impl Aircraft {
  pub fn update_warnings(&mut self, bundle: &mut Bundle) {
    if self.is_taxiing() {
      return;
    }

    AircraftUpdateRestrictedEffect::run(self, bundle);
    if !self.is_landed() {
      AircraftUpdateTerrainEffect::run(self, bundle);
    }
  }
}
