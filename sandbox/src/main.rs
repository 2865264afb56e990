use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use turborand::{GenCore, rng::Rng};

use engine::{
  DEFAULT_TICK_RATE_TPS,
  engine::Engine,
  entities::aircraft::events::EventKind,
};
use sandbox::{
  Cli,
  airport::{Roster, setup},
  config::{Config, DEFAULT_SPAWN_INTERVAL},
  logging::{DEFAULT_LEVEL, init_logging},
  runner::{IncomingUpdate, OutgoingUpdate, Runner},
};

#[tokio::main]
async fn main() {
  let cli = Cli::parse();

  let (config, config_error) = match cli.config_path.as_deref() {
    Some(path) => match Config::from_path(path) {
      Ok(config) => (config, None),
      Err(e) => (Config::default(), Some(e)),
    },
    None => (Config::default(), None),
  };

  let level = cli
    .log_level
    .clone()
    .or_else(|| config.logging.level.clone())
    .unwrap_or_else(|| DEFAULT_LEVEL.to_owned());
  let _guard = init_logging(&level, config.logging.directory.as_deref());

  if let Some(e) = config_error {
    tracing::error!("Unable to load config: {e}");
    std::process::exit(1);
  }

  let roster = match Roster::demo() {
    Ok(roster) => roster,
    Err(e) => {
      tracing::error!("Unable to load aircraft models: {e}");
      std::process::exit(1);
    }
  };

  let airport = setup();
  if let Err(e) = airport.validate() {
    tracing::error!("Invalid airport: {e}");
    std::process::exit(1);
  }

  let seed = cli
    .seed
    .or(config.simulation.seed)
    .unwrap_or_else(|| Rng::new().gen_u64());
  let rate = cli
    .tick_rate
    .or(config.simulation.tick_rate)
    .unwrap_or(DEFAULT_TICK_RATE_TPS);
  let spawn_interval = config
    .simulation
    .spawn_interval
    .unwrap_or(DEFAULT_SPAWN_INTERVAL);

  tracing::info!(
    "{} ({}) seed {seed}, {rate} ticks per second",
    airport.name,
    airport.icao
  );

  let (command_tx, command_rx) = async_channel::unbounded::<IncomingUpdate>();
  let (mut update_tx, update_rx) =
    async_broadcast::broadcast::<OutgoingUpdate>(256);
  update_tx.set_overflow(true);

  let engine = Engine::new(airport, config.simulation.options, seed);
  let mut runner =
    Runner::new(engine, roster, command_rx, update_tx, rate, spawn_interval);

  let runner_handle = tokio::spawn(async move {
    runner.begin_loop().await;
  });

  tokio::spawn(async move {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
      let line = match lines.next_line().await {
        Ok(Some(line)) => line,
        Ok(None) => break,
        Err(e) => {
          tracing::error!("Unable to read input: {e}");
          break;
        }
      };

      match IncomingUpdate::parse(&line) {
        Some(update) => {
          if command_tx.send(update).await.is_err() {
            break;
          }
        }
        None if line.trim().is_empty() => {}
        None => tracing::warn!("Unrecognised input: {line}"),
      }
    }

    let _ = command_tx.send(IncomingUpdate::Quit).await;
  });

  let print_handle = tokio::spawn(async move {
    let mut update_rx = update_rx;
    loop {
      let update = match update_rx.recv().await {
        Ok(update) => update,
        Err(async_broadcast::RecvError::Overflowed(_)) => continue,
        Err(async_broadcast::RecvError::Closed) => break,
      };

      match update {
        OutgoingUpdate::Reply(response) => {
          if let Some(text) = response.acknowledgement {
            println!("{text}");
          }
        }
        OutgoingUpdate::Unknown(id) => println!("{id} is not on frequency"),
        OutgoingUpdate::Events(events) => {
          for event in events {
            if let EventKind::RadioCall { text, .. } = &event.kind {
              println!("{text}");
            }
          }
        }
        OutgoingUpdate::Score(score) => match serde_json::to_string(&score) {
          Ok(score) => println!("{score}"),
          Err(e) => tracing::error!("Unable to serialise score: {e}"),
        },
        OutgoingUpdate::Aircraft(aircraft) => {
          tracing::trace!("{} aircraft on scope", aircraft.len());
        }
      }
    }
  });

  tokio::select! {
    _ = runner_handle => tracing::info!("runner exit"),
    _ = print_handle => tracing::info!("printer exit"),
  };
}
