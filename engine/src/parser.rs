use crate::command::CommandKind;

/// A command keyword and the words that followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
  /// `None` holds words that came before any command keyword.
  pub kind: Option<CommandKind>,
  pub data: String,
}

impl ParsedCommand {
  fn new(kind: Option<CommandKind>) -> Self {
    Self {
      kind,
      data: String::new(),
    }
  }

  fn push(&mut self, word: &str) {
    if !self.data.is_empty() {
      self.data.push(' ');
    }
    self.data.push_str(word);
  }
}

fn is_direction_word(previous: Option<&str>, word: &str) -> bool {
  previous.is_some_and(|p| p.starts_with('t'))
    && (word.starts_with('l') || word.starts_with('r'))
}

/// Splits a controller instruction into commands.
///
/// A word beginning with `l` or `r` straight after a word beginning with `t`
/// is a turn direction, not a command, so "t l 270" turns left instead of
/// clearing a landing. A `heading` straight after such a direction belongs
/// to the turn as well.
pub fn parse_commands<T>(input: T) -> Vec<ParsedCommand>
where
  T: AsRef<str>,
{
  let input = input.as_ref().to_lowercase().replace(',', " ");

  let mut stray: Option<ParsedCommand> = None;
  let mut commands: Vec<ParsedCommand> = Vec::new();
  let mut previous: Option<&str> = None;
  let mut after_direction = false;

  for word in input.split_whitespace() {
    let is_direction = is_direction_word(previous, word);
    let is_filler = after_direction && matches!(word, "heading" | "h");

    let kind = if is_direction || is_filler {
      None
    } else {
      CommandKind::from_token(word)
    };

    if kind.is_some() {
      commands.push(ParsedCommand::new(kind));
    } else if let Some(command) = commands.last_mut() {
      command.push(word);
    } else {
      stray
        .get_or_insert_with(|| ParsedCommand::new(None))
        .push(word);
    }

    after_direction = is_direction;
    previous = Some(word);
  }

  stray.into_iter().chain(commands).collect()
}
