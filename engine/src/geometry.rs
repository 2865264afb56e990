use std::f32::consts::{PI, TAU};

use glam::Vec2;

/// Ring of a polygon, not necessarily closed.
pub type Ring = Vec<Vec2>;
/// Outer ring followed by any holes.
pub type Polygon = Vec<Ring>;
pub type MultiPolygon = Vec<Polygon>;

/// Wraps a heading into `[0, 2π)`.
pub fn normalize_angle(angle: f32) -> f32 {
  angle.rem_euclid(TAU)
}

/// Signed offset `a - b` wrapped into `(-π, π]`.
pub fn angle_offset(a: f32, b: f32) -> f32 {
  let offset = (a - b).rem_euclid(TAU);
  if offset > PI { offset - TAU } else { offset }
}

/// Signed turn from `current` to `target`, negative to the left.
pub fn delta_angle(current: f32, target: f32) -> f32 {
  angle_offset(target, current)
}

/// Unit vector for a heading measured clockwise from north.
pub fn heading_vector(heading: f32) -> Vec2 {
  Vec2::new(heading.sin(), heading.cos())
}

/// Heading of a vector, clockwise from north, in `[0, 2π)`.
pub fn radial(vector: Vec2) -> f32 {
  normalize_angle(vector.x.atan2(vector.y))
}

pub fn move_point(point: Vec2, heading: f32, length: f32) -> Vec2 {
  point + heading_vector(heading) * length
}

pub fn angle_between_points(a: Vec2, b: Vec2) -> f32 {
  radial(b - a)
}

pub fn closest_point_on_segment(point: Vec2, start: Vec2, end: Vec2) -> Vec2 {
  let segment = end - start;
  let length_squared = segment.length_squared();
  if length_squared <= f32::EPSILON {
    return start;
  }

  let t = ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0);
  start + segment * t
}

fn ring_edges(ring: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
  ring
    .iter()
    .enumerate()
    .map(|(i, a)| (*a, ring[(i + 1) % ring.len()]))
}

/// Even-odd containment test.
pub fn point_in_ring(point: Vec2, ring: &[Vec2]) -> bool {
  if ring.len() < 3 {
    return false;
  }

  let mut inside = false;
  for (a, b) in ring_edges(ring) {
    if (a.y > point.y) != (b.y > point.y)
      && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
    {
      inside = !inside;
    }
  }

  inside
}

/// Shortest distance from `point` to any edge of `ring`.
pub fn distance_to_ring(point: Vec2, ring: &[Vec2]) -> f32 {
  match ring.len() {
    0 => f32::INFINITY,
    1 => point.distance(ring[0]),
    _ => ring_edges(ring)
      .map(|(a, b)| point.distance(closest_point_on_segment(point, a, b)))
      .fold(f32::INFINITY, f32::min),
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaTest {
  pub inside: bool,
  pub distance: f32,
}

pub fn point_to_polygon(point: Vec2, polygon: &[Ring]) -> AreaTest {
  let Some((outer, holes)) = polygon.split_first() else {
    return AreaTest {
      inside: false,
      distance: f32::INFINITY,
    };
  };

  let inside = point_in_ring(point, outer)
    && !holes.iter().any(|hole| point_in_ring(point, hole));
  let distance = polygon
    .iter()
    .map(|ring| distance_to_ring(point, ring))
    .fold(f32::INFINITY, f32::min);

  AreaTest { inside, distance }
}

pub fn point_to_multipolygon(point: Vec2, area: &[Polygon]) -> AreaTest {
  area.iter().map(|polygon| point_to_polygon(point, polygon)).fold(
    AreaTest {
      inside: false,
      distance: f32::INFINITY,
    },
    |acc, test| AreaTest {
      inside: acc.inside || test.inside,
      distance: acc.distance.min(test.distance),
    },
  )
}
