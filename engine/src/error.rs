use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("failed to decode: {0}")]
  Json(#[from] serde_json::Error),

  #[error("SID {sid} references unknown fix {fix}")]
  UnknownSidFix { sid: String, fix: String },

  #[error("unknown runway {0}")]
  UnknownRunway(String),

  #[error("runway name {0} is used more than once")]
  DuplicateRunway(String),

  #[error("restricted area {0} has no coordinates")]
  EmptyRestrictedArea(String),
}
