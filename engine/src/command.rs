use core::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CommandKind {
  Abort,
  Altitude,
  Debug,
  Direct,
  Fix,
  Heading,
  Hold,
  Land,
  Proceed,
  Sid,
  Speed,
  Takeoff,
  Wait,
}

impl CommandKind {
  pub const ALL: [CommandKind; 13] = [
    Self::Abort,
    Self::Altitude,
    Self::Debug,
    Self::Direct,
    Self::Fix,
    Self::Heading,
    Self::Hold,
    Self::Land,
    Self::Proceed,
    Self::Sid,
    Self::Speed,
    Self::Takeoff,
    Self::Wait,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Self::Abort => "abort",
      Self::Altitude => "altitude",
      Self::Debug => "debug",
      Self::Direct => "direct",
      Self::Fix => "fix",
      Self::Heading => "heading",
      Self::Hold => "hold",
      Self::Land => "land",
      Self::Proceed => "proceed",
      Self::Sid => "sid",
      Self::Speed => "speed",
      Self::Takeoff => "takeoff",
      Self::Wait => "wait",
    }
  }

  pub fn synonyms(&self) -> &'static [&'static str] {
    match self {
      Self::Abort => &[],
      Self::Altitude => &["a", "c", "climb", "clear", "descend"],
      Self::Debug => &[],
      Self::Direct => &["dct"],
      Self::Fix => &["f", "track"],
      Self::Heading => &["t", "h", "turn"],
      Self::Hold => &["circle"],
      Self::Land => &["l"],
      Self::Proceed => &["pr"],
      Self::Sid => &[],
      Self::Speed => &["slow", "sp"],
      Self::Takeoff => &["to"],
      Self::Wait => &["w", "taxi"],
    }
  }

  /// Resolves a lowercase token to its command.
  pub fn from_token(token: &str) -> Option<Self> {
    Self::ALL
      .into_iter()
      .find(|kind| kind.name() == token || kind.synonyms().contains(&token))
  }

  /// Runs after every other command in the same instruction.
  pub fn is_deferred(&self) -> bool {
    matches!(self, Self::Takeoff)
  }
}

impl fmt::Display for CommandKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
#[ts(export)]
pub enum Reply {
  Ok {
    text: String,
    remark: Option<String>,
  },
  Fail {
    reason: String,
    remark: Option<String>,
  },
}

impl Reply {
  pub fn ok(text: impl Into<String>) -> Self {
    Self::Ok {
      text: text.into(),
      remark: None,
    }
  }

  pub fn ok_with(text: impl Into<String>, remark: impl Into<String>) -> Self {
    Self::Ok {
      text: text.into(),
      remark: Some(remark.into()),
    }
  }

  pub fn fail(reason: impl Into<String>) -> Self {
    Self::Fail {
      reason: reason.into(),
      remark: None,
    }
  }

  pub fn fail_with(
    reason: impl Into<String>,
    remark: impl Into<String>,
  ) -> Self {
    Self::Fail {
      reason: reason.into(),
      remark: Some(remark.into()),
    }
  }

  pub fn say_again(reason: impl Into<String>) -> Self {
    Self::fail_with(reason, "say again")
  }

  pub fn is_ok(&self) -> bool {
    matches!(self, Self::Ok { .. })
  }

  pub fn text(&self) -> &str {
    match self {
      Self::Ok { text, .. } => text,
      Self::Fail { reason, .. } => reason,
    }
  }

  pub fn remark(&self) -> Option<&str> {
    match self {
      Self::Ok { remark, .. } | Self::Fail { remark, .. } => {
        remark.as_deref().filter(|r| !r.is_empty())
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommandResult {
  /// `None` for words that did not belong to any command.
  pub kind: Option<CommandKind>,
  pub reply: Reply,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommandResponse {
  pub results: Vec<CommandResult>,
  /// The readback, `None` when the aircraft did not answer.
  pub acknowledgement: Option<String>,
}

impl CommandResponse {
  /// Joins every reply into one readback line after `callsign`, ending with
  /// the last remark any reply made.
  pub fn new(callsign: &str, results: Vec<CommandResult>) -> Self {
    let mut line = String::from(callsign);
    for result in results.iter() {
      line.push_str(", ");
      line.push_str(result.reply.text());
    }

    if let Some(remark) = results.iter().rev().find_map(|r| r.reply.remark()) {
      line.push_str(", ");
      line.push_str(remark);
    }

    Self {
      results,
      acknowledgement: Some(line),
    }
  }

  pub fn silent() -> Self {
    Self::default()
  }

  pub fn is_ok(&self) -> bool {
    !self.results.is_empty() && self.results.iter().all(|r| r.reply.is_ok())
  }
}
