use std::time::Duration;

use async_channel::TryRecvError;
use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;
use turborand::TurboRand;

use engine::{
  command::CommandResponse,
  engine::Engine,
  entities::aircraft::{AircraftSnapshot, Category, events::Event},
  score::Score,
};

use crate::airport::Roster;

/// Most aircraft the runner spawns on its own.
pub const SPAWN_LIMIT: usize = 20;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type", content = "value")]
pub enum OutgoingUpdate {
  Reply(CommandResponse),
  /// A command for a callsign nobody is using.
  Unknown(String),
  Events(Vec<Event>),
  Aircraft(Vec<AircraftSnapshot>),
  Score(Score),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IncomingUpdate {
  Command { id: String, text: String },
  Spawn {
    category: Category,
    airline: Option<String>,
  },
  Score,
  Pause,
  Quit,
}

impl IncomingUpdate {
  /// Reads one line typed at the console. `/` starts a meta command,
  /// anything else is `<callsign> <instruction>`.
  pub fn parse(line: &str) -> Option<Self> {
    let line = line.trim();
    if let Some(meta) = line.strip_prefix('/') {
      let mut words = meta.split_whitespace();
      return match words.next()? {
        "spawn" => {
          let category = match words.next() {
            Some("departure" | "dep") => Category::Departure,
            Some("arrival" | "arr") | None => Category::Arrival,
            Some(_) => return None,
          };
          Some(Self::Spawn {
            category,
            airline: words.next().map(str::to_owned),
          })
        }
        "score" => Some(Self::Score),
        "pause" => Some(Self::Pause),
        "quit" | "exit" => Some(Self::Quit),
        _ => None,
      };
    }

    let (id, text) = line.split_once(char::is_whitespace)?;
    Some(Self::Command {
      id: id.to_owned(),
      text: text.trim().to_owned(),
    })
  }
}

pub struct Runner {
  pub engine: Engine,
  pub roster: Roster,

  pub receiver: async_channel::Receiver<IncomingUpdate>,
  pub sender: async_broadcast::Sender<OutgoingUpdate>,

  /// Seconds of simulation time between automatic spawns.
  pub spawn_interval: f32,
  pub paused: bool,

  last_spawn: f32,
  rate: usize,
}

impl Runner {
  pub fn new(
    engine: Engine,
    roster: Roster,
    receiver: async_channel::Receiver<IncomingUpdate>,
    sender: async_broadcast::Sender<OutgoingUpdate>,
    rate: usize,
    spawn_interval: f32,
  ) -> Self {
    Self {
      engine,
      roster,

      receiver,
      sender,

      spawn_interval,
      paused: false,

      last_spawn: f32::NEG_INFINITY,
      rate: rate.max(1),
    }
  }

  fn broadcast(&self, update: OutgoingUpdate) {
    let _ = self
      .sender
      .try_broadcast(update)
      .inspect_err(|e| tracing::warn!("failed to broadcast update: {}", e));
  }

  pub fn spawn(&mut self, category: Category, icao: Option<&str>) -> bool {
    let airline = match icao {
      Some(icao) => self.roster.airline(icao),
      None => self.engine.rng.sample(&self.roster.airlines),
    };
    let Some(airline) = airline.cloned() else {
      tracing::warn!("no such airline: {icao:?}");
      return false;
    };
    let Some(flight_number) = self.engine.new_callsign(&airline) else {
      return false;
    };

    let engine = &mut self.engine;
    let options = match category {
      Category::Arrival => self.roster.arrival(
        &engine.airport,
        &airline,
        flight_number,
        &mut engine.rng,
      ),
      Category::Departure => self.roster.departure(
        &engine.airport,
        &airline,
        flight_number,
        &mut engine.rng,
      ),
    };

    options.and_then(|o| engine.spawn(o)).is_some()
  }

  /// Handles one message from the console. Returns `false` to stop.
  pub fn handle(&mut self, update: IncomingUpdate) -> bool {
    match update {
      IncomingUpdate::Command { id, text } => {
        match self.engine.execute_command(&id, &text) {
          Some(response) => self.broadcast(OutgoingUpdate::Reply(response)),
          None => self.broadcast(OutgoingUpdate::Unknown(id)),
        }
      }
      IncomingUpdate::Spawn { category, airline } => {
        self.spawn(category, airline.as_deref());
      }
      IncomingUpdate::Score => {
        self.broadcast(OutgoingUpdate::Score(self.engine.score));
      }
      IncomingUpdate::Pause => {
        self.paused = !self.paused;
        tracing::info!(paused = self.paused, "toggled pause");
      }
      IncomingUpdate::Quit => return false,
    }

    true
  }

  /// Advances the simulation by `dt` seconds and publishes what happened.
  pub fn step(&mut self, dt: f32) {
    if self.paused {
      return;
    }

    if self.engine.aircraft.len() < SPAWN_LIMIT
      && self.engine.time - self.last_spawn >= self.spawn_interval
    {
      self.last_spawn = self.engine.time;
      let category = if self.engine.rng.bool() {
        Category::Arrival
      } else {
        Category::Departure
      };
      self.spawn(category, None);
    }

    self.engine.tick(dt);

    let events = self.engine.drain_events();
    if !events.is_empty() {
      self.broadcast(OutgoingUpdate::Events(events));
    }
    self.broadcast(OutgoingUpdate::Aircraft(self.engine.snapshots()));
  }

  pub async fn begin_loop(&mut self) {
    let period = Duration::from_secs_f32(1.0 / self.rate as f32);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    'main_loop: loop {
      interval.tick().await;

      loop {
        let incoming = match self.receiver.try_recv() {
          Ok(incoming) => incoming,
          Err(TryRecvError::Closed) => break 'main_loop,
          Err(TryRecvError::Empty) => break,
        };

        if !self.handle(incoming) {
          break 'main_loop;
        }
      }

      self.step(period.as_secs_f32());
    }

    tracing::info!("simulation stopped at {:.0}s", self.engine.time);
  }
}
