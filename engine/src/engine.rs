use core::mem;

use internment::Intern;
use itertools::Itertools;
use turborand::{SeededCore, rng::Rng};

use crate::{
  SimOptions,
  command::CommandResponse,
  entities::{
    aircraft::{
      Aircraft, AircraftOptions, AircraftSnapshot, Category,
      commands::CommandContext,
      events::{Event, EventKind, WindOperation},
    },
    airline::Airline,
    airport::Airport,
    conflict::Conflicts,
  },
  projection::{ProjectedPoint, project},
  score::Score,
};

/// How many flight numbers are drawn before giving up on a unique callsign.
const CALLSIGN_ATTEMPTS: usize = 100;

/// What one aircraft can see of the simulation while it is being updated.
#[derive(Debug)]
pub struct Bundle<'a> {
  pub airport: &'a Airport,
  pub options: &'a SimOptions,
  pub dt: f32,
  pub time: f32,
  pub events: Vec<Event>,
}

impl<'a> Bundle<'a> {
  pub fn new(
    airport: &'a Airport,
    options: &'a SimOptions,
    dt: f32,
    time: f32,
  ) -> Self {
    Self {
      airport,
      options,
      dt,
      time,
      events: Vec::new(),
    }
  }
}

/// Mutable references to two different aircraft.
fn pair_mut(
  aircraft: &mut [Aircraft],
  a: usize,
  b: usize,
) -> (&mut Aircraft, &mut Aircraft) {
  debug_assert!(a < b);
  let (left, right) = aircraft.split_at_mut(b);
  (&mut left[a], &mut right[0])
}

fn log_event(event: &Event) {
  if event.is_alert() {
    tracing::warn!(id = %event.id, "{event}");
  } else {
    tracing::info!(id = %event.id, "{event}");
  }
}

/// Owns every aircraft at one airport and steps them together.
pub struct Engine {
  pub airport: Airport,
  pub aircraft: Vec<Aircraft>,
  pub conflicts: Conflicts,
  pub score: Score,
  pub options: SimOptions,
  pub time: f32,
  pub rng: Rng,

  events: Vec<Event>,
}

impl Engine {
  pub fn new(airport: Airport, options: SimOptions, seed: u64) -> Self {
    Self {
      airport,
      aircraft: Vec::new(),
      conflicts: Conflicts::new(),
      score: Score::default(),
      options,
      time: 0.0,
      rng: Rng::with_seed(seed),

      events: Vec::new(),
    }
  }

  pub fn get(&self, id: &str) -> Option<&Aircraft> {
    self.aircraft.iter().find(|a| a.id.eq_ignore_ascii_case(id))
  }

  /// Events recorded since the last drain.
  pub fn drain_events(&mut self) -> Vec<Event> {
    mem::take(&mut self.events)
  }

  fn record(&mut self, events: Vec<Event>) {
    for event in events {
      log_event(&event);
      self.score.apply(&event);
      self.events.push(event);
    }
  }

  /// Draws a flight number for `airline` that no aircraft is using yet.
  pub fn new_callsign(&mut self, airline: &Airline) -> Option<String> {
    for _ in 0..CALLSIGN_ATTEMPTS {
      let flight_number = airline.generate_flight_number(&mut self.rng);
      let id = format!("{}{}", airline.icao, flight_number);
      if self.get(&id).is_none() {
        return Some(flight_number);
      }
    }

    tracing::warn!("no free flight number for {}", airline.icao);
    None
  }

  /// Adds an aircraft, refusing duplicate callsigns.
  pub fn spawn(&mut self, options: AircraftOptions) -> Option<Intern<String>> {
    let mut aircraft = Aircraft::new(options, self.options.history_length);
    if self.get(&aircraft.id).is_some() {
      tracing::warn!("{} already exists", aircraft.id);
      return None;
    }

    let events = aircraft.complete(&self.airport, &mut self.rng);
    tracing::info!(
      "spawned {:?} {} ({}) at {:.1} km",
      aircraft.category,
      aircraft.id,
      aircraft.model.icao,
      aircraft.distance
    );

    let id = aircraft.id;
    self.aircraft.push(aircraft);
    self.record(events);
    Some(id)
  }

  /// Gives `text` to the aircraft called `id`. `None` if there is no such
  /// aircraft.
  pub fn execute_command(
    &mut self,
    id: &str,
    text: &str,
  ) -> Option<CommandResponse> {
    let aircraft = self
      .aircraft
      .iter_mut()
      .find(|a| a.id.eq_ignore_ascii_case(id))?;

    let mut ctx = CommandContext::new(
      &mut self.airport,
      &self.options,
      &mut self.rng,
      self.time,
    );
    let response = aircraft.run_commands(text, &mut ctx);
    let events = ctx.events;

    self.record(events);
    Some(response)
  }

  /// Steps the simulation by `dt` seconds: every aircraft flies, then
  /// warnings, then conflicts, then finished aircraft leave.
  pub fn tick(&mut self, dt: f32) {
    self.time += dt;

    let mut bundle = Bundle::new(&self.airport, &self.options, dt, self.time);
    for aircraft in self.aircraft.iter_mut() {
      aircraft.update(&mut bundle);
    }
    for aircraft in self.aircraft.iter_mut() {
      aircraft.update_warnings(&mut bundle);
    }
    let mut events = bundle.events;

    for (a, b) in (0..self.aircraft.len()).tuple_combinations() {
      let (a, b) = pair_mut(&mut self.aircraft, a, b);
      self.conflicts.check(a, b, &self.airport, &mut events);
    }

    self.remove_finished(&mut events);
    self.record(events);
  }

  fn remove_finished(&mut self, events: &mut Vec<Event>) {
    let mut removed = Vec::new();

    for aircraft in self.aircraft.iter() {
      if aircraft.hit {
        if aircraft.is_landed() {
          events.push(Event::new(aircraft.id, EventKind::LostContact));
          removed.push(aircraft.id);
        }
      } else if aircraft.category == Category::Arrival && aircraft.is_stopped()
      {
        events.extend(
          aircraft.wind_penalties(&self.airport, WindOperation::Landing),
        );
        events.push(Event::new(
          aircraft.id,
          EventKind::RadioCall {
            text: format!(
              "{}, switching to ground, good day",
              aircraft.radio_callsign()
            ),
            alert: false,
          },
        ));
        events.push(Event::new(aircraft.id, EventKind::Arrived));
        removed.push(aircraft.id);
      } else if !aircraft.inside_ctr
        && aircraft.distance > 2.0 * self.airport.ctr_radius
      {
        tracing::debug!("{} left radar coverage", aircraft.id);
        removed.push(aircraft.id);
      }
    }

    for id in removed {
      self.airport.remove_from_queues(id);
      self.conflicts.remove_aircraft(id, &mut self.aircraft);
      self.aircraft.retain(|a| a.id != id);
    }
  }

  /// Aircraft that show up on the scope.
  pub fn snapshots(&self) -> Vec<AircraftSnapshot> {
    self
      .aircraft
      .iter()
      .filter(|a| a.is_visible(&self.airport))
      .map(|a| a.snapshot(&self.conflicts))
      .collect()
  }

  /// Where the aircraft called `id` will be if left alone.
  pub fn project(&self, id: &str) -> Option<Vec<ProjectedPoint>> {
    self
      .get(id)
      .map(|a| project(a, &self.airport, &self.options, self.time))
  }
}
