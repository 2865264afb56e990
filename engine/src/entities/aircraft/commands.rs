use internment::Intern;
use turborand::rng::Rng;

use crate::{
  MIN_CLEARED_ALTITUDE, SPEED_LIMIT, SPEED_LIMIT_ALTITUDE, SimOptions,
  TrendCategory,
  command::{CommandKind, CommandResponse, CommandResult, Reply},
  entities::airport::Airport,
  heading_to_string, normalize_angle, parse_leading_int,
  parser::parse_commands,
  radio_trend,
  wordify::wordify_runway,
};

use super::{
  Aircraft, Category, Mode, NavMode, TurnDirection,
  events::{Event, EventKind, WindComponent, WindOperation},
};

/// Everything a command handler may read or change besides the aircraft.
pub struct CommandContext<'a> {
  pub airport: &'a mut Airport,
  pub options: &'a SimOptions,
  pub rng: &'a mut Rng,
  pub time: f32,
  pub events: Vec<Event>,
}

impl<'a> CommandContext<'a> {
  pub fn new(
    airport: &'a mut Airport,
    options: &'a SimOptions,
    rng: &'a mut Rng,
    time: f32,
  ) -> Self {
    Self {
      airport,
      options,
      rng,
      time,
      events: Vec::new(),
    }
  }
}

fn is_expedite(word: &str) -> bool {
  word == "x" || (!word.is_empty() && "expedite".starts_with(word))
}

fn winds(airport: &Airport) -> String {
  format!(
    "winds {} at {} knots",
    airport.wind.angle.to_degrees().round() as i32,
    airport.wind.speed.round() as i32
  )
}

impl Aircraft {
  /// Runs a controller instruction against this aircraft and returns the
  /// readback. Takeoff clearances are applied after everything else in the
  /// same instruction.
  pub fn run_commands(
    &mut self,
    input: &str,
    ctx: &mut CommandContext,
  ) -> CommandResponse {
    if !self.inside_ctr {
      return CommandResponse::silent();
    }

    let commands = parse_commands(input);
    let mut results = Vec::with_capacity(commands.len().max(1));

    if commands.is_empty() {
      results.push(CommandResult {
        kind: None,
        reply: Reply::say_again("not understood"),
      });
    }

    let (deferred, immediate): (Vec<_>, Vec<_>) = commands
      .into_iter()
      .partition(|c| c.kind.is_some_and(|k| k.is_deferred()));

    for command in immediate.into_iter().chain(deferred) {
      let reply = match command.kind {
        Some(kind) => self.run_command(kind, &command.data, ctx),
        None => Reply::say_again("not understood"),
      };
      results.push(CommandResult {
        kind: command.kind,
        reply,
      });
    }

    let response = CommandResponse::new(&self.radio_callsign(), results);
    if let Some(acknowledgement) = response.acknowledgement.clone() {
      ctx.events.push(Event::new(
        self.id,
        EventKind::Acknowledgement(acknowledgement),
      ));
    }

    response
  }

  pub fn run_command(
    &mut self,
    kind: CommandKind,
    data: &str,
    ctx: &mut CommandContext,
  ) -> Reply {
    match kind {
      CommandKind::Abort => self.run_abort(ctx),
      CommandKind::Altitude => self.run_altitude(data, ctx),
      CommandKind::Debug => self.run_debug(data),
      CommandKind::Direct => self.run_direct(data, ctx),
      CommandKind::Fix => self.run_fix(data, ctx),
      CommandKind::Heading => self.run_heading(data, ctx),
      CommandKind::Hold => self.run_hold(data, ctx),
      CommandKind::Land => self.run_land(data, ctx),
      CommandKind::Proceed => self.run_proceed(data, ctx),
      CommandKind::Sid => self.run_sid(data, ctx),
      CommandKind::Speed => self.run_speed(data),
      CommandKind::Takeoff => self.run_takeoff(ctx),
      CommandKind::Wait => self.run_wait(data, ctx),
    }
  }

  fn after_departure(&self, text: String) -> String {
    if self.is_takeoff() {
      format!("after departure, {text}")
    } else {
      text
    }
  }

  fn run_heading(&mut self, data: &str, ctx: &mut CommandContext) -> Reply {
    let words = data.split_whitespace().collect::<Vec<_>>();
    let direction = match words.as_slice() {
      [first, _, ..] => TurnDirection::from_word(first),
      _ => None,
    };
    let Some(heading) = words.last().and_then(|w| parse_leading_int(w)) else {
      return Reply::say_again("heading not understood");
    };

    if self.requested.navmode == NavMode::Rwy {
      self.cancel_landing(ctx.airport);
    }
    self.cancel_fix();

    self.requested.navmode = NavMode::Heading;
    self.requested.heading =
      Some(normalize_angle((heading as f32).to_radians()));
    self.requested.turn = direction;

    let direction = direction
      .map(|d| format!("{} ", d.as_str()))
      .unwrap_or_default();
    Reply::ok(self.after_departure(format!(
      "turn {direction}heading {}",
      heading_to_string((heading as f32).to_radians())
    )))
  }

  fn run_altitude(&mut self, data: &str, ctx: &mut CommandContext) -> Reply {
    let words = data.split_whitespace().collect::<Vec<_>>();
    let Some(first) = words.first() else {
      return Reply::say_again("altitude not understood");
    };

    let Some(altitude) = parse_leading_int(first) else {
      if is_expedite(first) {
        self.requested.expedite = true;
        return Reply::ok(self.after_departure(format!(
          "{} {} expedite",
          radio_trend(
            TrendCategory::Altitude,
            self.altitude,
            self.requested.altitude
          ),
          self.requested.altitude
        )));
      }

      return Reply::say_again("altitude not understood");
    };
    let expedite = words.get(1).is_some_and(|w| is_expedite(w));

    if self.mode == Mode::Landing {
      self.cancel_landing(ctx.airport);
    }

    // Two digits or fewer are thousands of feet.
    let factor = if first.len() <= 2 { 1000.0 } else { 1.0 };
    let mut ceiling = ctx.airport.ctr_ceiling;
    if ctx.options.soft_ceiling {
      ceiling += 1000.0;
    }

    self.requested.altitude = (altitude as f32 * factor)
      .min(ceiling)
      .max(MIN_CLEARED_ALTITUDE);
    self.requested.expedite = expedite;

    Reply::ok(self.after_departure(format!(
      "{} {}{}",
      radio_trend(
        TrendCategory::Altitude,
        self.altitude,
        self.requested.altitude
      ),
      self.requested.altitude,
      if expedite { " expedite" } else { "" }
    )))
  }

  fn run_speed(&mut self, data: &str) -> Reply {
    let Some(speed) = data.split_whitespace().next().and_then(parse_leading_int)
    else {
      return Reply::say_again("speed not understood");
    };

    let mut speed = speed as f32;
    if self.requested.altitude <= SPEED_LIMIT_ALTITUDE {
      speed = speed.min(SPEED_LIMIT);
    }
    self.requested.speed = self.model.clamp_speed(speed);

    Reply::ok(format!(
      "{} {} knots",
      radio_trend(TrendCategory::Speed, self.speed, self.requested.speed),
      self.requested.speed
    ))
  }

  fn run_hold(&mut self, data: &str, ctx: &mut CommandContext) -> Reply {
    let Some(turn) = data
      .split_whitespace()
      .next()
      .and_then(TurnDirection::from_word)
    else {
      return Reply::say_again("hold direction not understood");
    };

    self.cancel_fix();
    if self.requested.navmode == NavMode::Rwy {
      self.cancel_landing(ctx.airport);
    }
    self.requested.navmode = NavMode::Hold;
    self.requested.turn = Some(turn);

    if self.is_takeoff() {
      Reply::ok(format!(
        "after departure, will circle towards the {}",
        turn.as_str()
      ))
    } else {
      Reply::ok(format!(
        "circling towards the {} at {} feet",
        turn.as_str(),
        self.requested.altitude
      ))
    }
  }

  fn run_direct(&mut self, data: &str, ctx: &mut CommandContext) -> Reply {
    let names = data.split_whitespace().collect::<Vec<_>>();
    let Some(first) = names.first() else {
      return Reply::fail("fix name not understood");
    };

    let name = first.to_uppercase();
    if ctx.airport.fix(&name).is_none() {
      return Reply::say_again(format!("no fix found with name of {name}"));
    }

    // Outside a route, or with several names, this is a new route.
    if self.requested.navmode != NavMode::Fix || names.len() > 1 {
      return self.run_fix(data, ctx);
    }

    match self.requested.fix.iter().position(|f| **f == name) {
      None => Reply::fail(format!("not navigating to fix {name}")),
      Some(0) => Reply::fail(format!("already going to {name}")),
      Some(index) => {
        self.requested.fix.drain(..index);
        Reply::ok(format!("cleared direct {name}"))
      }
    }
  }

  fn run_fix(&mut self, data: &str, ctx: &mut CommandContext) -> Reply {
    let names = data
      .split_whitespace()
      .map(|n| n.to_uppercase())
      .collect::<Vec<_>>();
    if names.is_empty() {
      return Reply::say_again("fix name not understood");
    }

    let mut fixes = Vec::with_capacity(names.len());
    for name in names {
      let fix = Intern::from_ref(&name);
      if !ctx.airport.fixes.contains_key(&fix) {
        return Reply::say_again(format!("no fix found with name of {name}"));
      }

      if fixes.last() != Some(&fix) {
        fixes.push(fix);
      }
    }

    self.cancel_fix();
    if !self.is_takeoff() && self.requested.navmode == NavMode::Rwy {
      self.cancel_landing(ctx.airport);
    }

    self.requested.fix = fixes;
    self.requested.navmode = NavMode::Fix;
    self.requested.turn = None;

    Reply::ok(format!(
      "navigate to {}",
      self
        .requested
        .fix
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
    ))
  }

  fn run_sid(&mut self, data: &str, ctx: &mut CommandContext) -> Reply {
    if self.category != Category::Departure {
      return Reply::fail_with("inbound", "over");
    }

    let name = data.trim().to_uppercase();
    if name.is_empty() {
      return Reply::say_again("SID name not understood");
    }

    let Some(fixes) = ctx.airport.sid(&name).map(|s| s.to_vec()) else {
      return Reply::say_again(format!("no SID found with name of {name}"));
    };

    self.cancel_fix();
    self.requested.fix = fixes;
    self.requested.navmode = NavMode::Fix;
    self.requested.turn = None;

    Reply::ok(format!("cleared to destination via {name}"))
  }

  fn run_proceed(&mut self, data: &str, ctx: &mut CommandContext) -> Reply {
    if self.requested.navmode != NavMode::Fix {
      return Reply::fail("not navigating to any fix");
    }

    let data = data.trim().to_uppercase();
    if data.is_empty() {
      return Reply::fail("fix name not understood");
    }

    let previous = self.requested.fix.clone();
    let route = previous
      .iter()
      .map(|f| f.as_str())
      .chain(data.split_whitespace())
      .collect::<Vec<_>>()
      .join(" ");

    let reply = self.run_fix(&route, ctx);
    if !reply.is_ok() {
      return reply;
    }

    if self.requested.fix.len() == previous.len() {
      return Reply::fail(format!("already navigating to {data}"));
    }

    let added = self.requested.fix[previous.len()..]
      .iter()
      .map(|f| f.as_str())
      .collect::<Vec<_>>()
      .join(" ");
    match previous.last() {
      Some(last) => {
        Reply::ok(format!("cleared to proceed to {added} after {last}"))
      }
      None => Reply::ok(format!("cleared to proceed to {added}")),
    }
  }

  fn run_wait(&mut self, data: &str, ctx: &mut CommandContext) -> Reply {
    if self.category != Category::Departure {
      return Reply::fail("inbound");
    }

    match self.mode {
      Mode::Taxi => {
        let runway = self.requested.runway.map(|r| wordify_runway(&r));
        return Reply::fail_with(
          format!("already taxiing to {}", runway.unwrap_or_default()),
          "over",
        );
      }
      Mode::Waiting => return Reply::fail("already waiting"),
      Mode::Apron => {}
      _ => return Reply::fail("wrong mode"),
    }

    let data = data.trim();
    if !data.is_empty()
      && !self.select_runway(ctx.airport, ctx.rng, Some(data))
    {
      return Reply::fail(format!("no runway {}", data.to_uppercase()));
    }

    let Some(runway) = self.requested.runway else {
      return Reply::fail_with("no runway selected", "over");
    };

    ctx.airport.enqueue(&runway, self.id);
    self.transition(Mode::Taxi);
    self.taxi_start = ctx.time;
    self.ready_announced = false;

    Reply::ok(format!("taxi to runway {}", wordify_runway(&runway)))
  }

  fn run_takeoff(&mut self, ctx: &mut CommandContext) -> Reply {
    if self.category != Category::Departure {
      return Reply::fail_with("inbound", "over");
    }
    if !self.is_landed() {
      return Reply::fail_with("already airborne", "over");
    }

    let runway = self.requested.runway;
    let spoken = runway.map(|r| wordify_runway(&r)).unwrap_or_default();
    match self.mode {
      Mode::Apron => {
        return Reply::fail_with("no runway selected. taxi first", "over");
      }
      Mode::Taxi => {
        return Reply::fail_with(
          format!("taxi to runway {spoken} not yet complete"),
          "over",
        );
      }
      Mode::Takeoff => return Reply::fail("already cleared for takeoff"),
      _ => {}
    }

    if self.requested.altitude <= 0.0 {
      return Reply::fail_with("no altitude clearance assigned", "over");
    }

    let Some(runway) = runway else {
      return Reply::fail_with("no runway selected. taxi first", "over");
    };

    if !ctx.airport.dequeue(&runway, self.id) {
      let position = ctx.airport.queue_position(&runway, self.id);
      let ahead = position
        .filter(|p| *p > 0)
        .and_then(|p| ctx.airport.runway(&runway).map(|r| r.queue()[p - 1]));

      return match (position, ahead) {
        (Some(position), Some(ahead)) => {
          Reply::fail(format!("number {position} behind {ahead}"))
        }
        _ => Reply::fail_with("not in line for departure", "over"),
      };
    }

    self.transition(Mode::Takeoff);
    ctx
      .events
      .extend(self.wind_penalties(ctx.airport, WindOperation::Takeoff));

    if self.requested.heading.is_none() {
      self.requested.heading = ctx.airport.runway(&runway).map(|r| r.heading());
    }

    Reply::ok(format!(
      "{}, runway {spoken} cleared for takeoff",
      winds(ctx.airport)
    ))
  }

  fn run_land(&mut self, data: &str, ctx: &mut CommandContext) -> Reply {
    let data = data.trim();
    if data.is_empty() {
      return Reply::say_again("runway not understood");
    }

    let Some(runway) = ctx.airport.runway(data) else {
      return Reply::say_again(format!("no runway {}", wordify_runway(data)));
    };
    let name = runway.name();
    let spoken = wordify_runway(&name);

    if self.is_takeoff() {
      return Reply::fail_with("not airborne", "over");
    }
    if self.requested.runway == Some(name) {
      return Reply::fail_with(
        format!("already landing on runway {spoken}"),
        "over",
      );
    }

    self.cancel_fix();
    self.requested.navmode = NavMode::Rwy;
    self.requested.runway = Some(name);
    self.requested.turn = None;
    self.requested.start_speed = self.speed;

    Reply::ok(format!(
      "{}, runway {spoken} cleared to land",
      winds(ctx.airport)
    ))
  }

  fn run_abort(&mut self, ctx: &mut CommandContext) -> Reply {
    let heading = |aircraft: &Aircraft| {
      heading_to_string(aircraft.requested.heading.unwrap_or(aircraft.heading))
    };

    match (self.mode, self.requested.navmode) {
      (Mode::Taxi | Mode::Waiting, _) => {
        Reply::fail("cannot taxi back to terminal")
      }
      (Mode::Landing, _) => {
        self.cancel_landing(ctx.airport);
        Reply::ok(format!(
          "go around, hold heading {} at {} feet",
          heading(self),
          self.requested.altitude
        ))
      }
      (Mode::Cruise, NavMode::Rwy) => {
        self.cancel_landing(ctx.airport);
        Reply::ok(format!(
          "continue along heading {} at {} feet",
          heading(self),
          self.requested.altitude
        ))
      }
      (Mode::Cruise, NavMode::Fix) => {
        self.cancel_fix();
        Reply::ok(format!(
          "maintain heading {} at {} feet",
          heading(self),
          self.requested.altitude
        ))
      }
      _ => Reply::fail("nothing to abort"),
    }
  }

  fn run_debug(&mut self, data: &str) -> Reply {
    if data.trim() != "log" {
      return Reply::say_again("debug not understood");
    }

    tracing::debug!(aircraft = ?self, "{} state", self.id);
    Reply::ok_with("state written to the log", "over")
  }

  /// Penalties for taking off or landing with too much crosswind or any
  /// tailwind.
  pub fn wind_penalties(
    &self,
    airport: &Airport,
    operation: WindOperation,
  ) -> Vec<Event> {
    let wind = airport.wind.components(self.heading);

    let cross = if wind.cross >= 20.0 {
      Some((WindComponent::MajorCrosswind, 2))
    } else if wind.cross >= 10.0 {
      Some((WindComponent::Crosswind, 1))
    } else {
      None
    };
    let tail = if wind.head <= -10.0 {
      Some((WindComponent::MajorTailwind, 2))
    } else if wind.head <= -1.0 {
      Some((WindComponent::Tailwind, 1))
    } else {
      None
    };

    cross
      .into_iter()
      .chain(tail)
      .map(|(component, points)| {
        Event::new(
          self.id,
          EventKind::WindPenalty {
            operation,
            component,
            points,
          },
        )
      })
      .collect()
  }
}
