use internment::Intern;
use serde::{Deserialize, Serialize};
use turborand::{TurboRand, rng::Rng};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airline {
  pub icao: Intern<String>,
  pub name: String,
  /// Telephony designator, e.g. "Speedbird".
  pub callsign: String,
  #[serde(default = "default_flight_number_length")]
  pub flight_number_length: usize,
}

fn default_flight_number_length() -> usize {
  3
}

impl Airline {
  pub fn new(icao: &str, name: &str, callsign: &str) -> Self {
    Self {
      icao: Intern::from_ref(&icao.to_uppercase()),
      name: name.to_owned(),
      callsign: callsign.to_owned(),
      flight_number_length: default_flight_number_length(),
    }
  }

  /// Random flight number that never starts with a zero.
  pub fn generate_flight_number(&self, rng: &mut Rng) -> String {
    let mut string = String::new();
    string.push_str(&rng.u8(1..=9).to_string());
    for _ in 1..self.flight_number_length.max(1) {
      string.push_str(&rng.u8(0..=9).to_string());
    }

    string
  }
}
