/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "characters",
    aliases: &["c", "list", "home"],
    description: "Browse characters from page 1",
  },
  Command {
    name: "page",
    aliases: &["p"],
    description: "Jump to a page: page <n>",
  },
  Command {
    name: "character",
    aliases: &["char", "show"],
    description: "Open a character: character <id>",
  },
  Command {
    name: "open",
    aliases: &["o", "goto", "route"],
    description: "Open a route: open /?page=2",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit rmtui",
  },
];

/// A submitted command line resolved to an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  Characters,
  Page(String),
  Character(String),
  Open(String),
  Quit,
}

/// Get autocomplete suggestions for a given input.
///
/// Only the first word is matched; arguments are ignored.
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input
    .split_whitespace()
    .next()
    .unwrap_or("")
    .to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Resolve a command line (`name [argument]`) into an action.
pub fn parse(line: &str) -> Option<Action> {
  let line = line.trim();
  let (name, arg) = match line.split_once(char::is_whitespace) {
    Some((name, arg)) => (name, arg.trim().to_string()),
    None => (line, String::new()),
  };

  let cmd = get_suggestions(name).into_iter().next()?;
  match cmd.name {
    "characters" => Some(Action::Characters),
    "page" => Some(Action::Page(arg)),
    "character" => Some(Action::Character(arg)),
    "open" => Some(Action::Open(arg)),
    "quit" => Some(Action::Quit),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("character");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "character");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("p");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "page");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("chara");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "characters");
  }

  #[test]
  fn test_suggestions_ignore_arguments() {
    let suggestions = get_suggestions("page 12");
    assert_eq!(suggestions[0].name, "page");
  }

  #[test]
  fn test_parse_with_argument() {
    assert_eq!(parse("page 3"), Some(Action::Page("3".into())));
    assert_eq!(parse("char 42"), Some(Action::Character("42".into())));
    assert_eq!(
      parse("open /character/1"),
      Some(Action::Open("/character/1".into()))
    );
  }

  #[test]
  fn test_parse_without_argument() {
    assert_eq!(parse("characters"), Some(Action::Characters));
    assert_eq!(parse("q"), Some(Action::Quit));
    assert_eq!(parse("page"), Some(Action::Page(String::new())));
  }

  #[test]
  fn test_parse_unknown() {
    assert_eq!(parse("zzz"), None);
  }
}
