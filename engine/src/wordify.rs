fn wordify_digit(digit: char) -> Option<&'static str> {
  Some(match digit {
    '0' => "zero",
    '1' => "one",
    '2' => "two",
    '3' => "three",
    '4' => "four",
    '5' => "five",
    '6' => "six",
    '7' => "seven",
    '8' => "eight",
    '9' => "niner",
    _ => return None,
  })
}

fn wordify_letter(letter: char) -> Option<&'static str> {
  Some(match letter.to_ascii_uppercase() {
    'L' => "left",
    'C' => "center",
    'R' => "right",
    _ => return None,
  })
}

/// Spoken form of a flight number: "1234" becomes "one two three four".
pub fn wordify_flight_number(flight_number: &str) -> String {
  flight_number
    .chars()
    .map(|c| match wordify_digit(c) {
      Some(word) => word.to_owned(),
      None => c.to_ascii_uppercase().to_string(),
    })
    .collect::<Vec<_>>()
    .join(" ")
}

/// Spoken form of a runway name: "28R" becomes "two eight right".
pub fn wordify_runway(runway: &str) -> String {
  runway
    .chars()
    .filter_map(|c| wordify_digit(c).or_else(|| wordify_letter(c)))
    .collect::<Vec<_>>()
    .join(" ")
}
