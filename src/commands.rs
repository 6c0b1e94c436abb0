//! Command palette entries and autocomplete logic

/// What a palette command does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  AddPhone,
  ExportJson,
  ExportCsv,
  RetryWrite,
  Quit,
}

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  pub action: Action,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "add",
    aliases: &["a", "new"],
    description: "Add a phone",
    action: Action::AddPhone,
  },
  Command {
    name: "json",
    aliases: &["export-json", "backup"],
    description: "Export inventory as JSON",
    action: Action::ExportJson,
  },
  Command {
    name: "csv",
    aliases: &["export-csv", "spreadsheet", "excel"],
    description: "Export inventory as CSV",
    action: Action::ExportCsv,
  },
  Command {
    name: "write",
    aliases: &["w", "save"],
    description: "Retry saving the inventory",
    action: Action::RetryWrite,
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit phonestock",
    action: Action::Quit,
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let needle = input.trim().to_lowercase();

  if needle.is_empty() {
    return COMMANDS.iter().collect();
  }

  // Lower rank sorts first; sort_by_key is stable so ties keep table order
  let mut ranked: Vec<(&Command, u8)> = COMMANDS
    .iter()
    .filter_map(|cmd| rank(cmd, &needle).map(|r| (cmd, r)))
    .collect();
  ranked.sort_by_key(|(_, r)| *r);

  ranked.into_iter().map(|(cmd, _)| cmd).collect()
}

fn rank(cmd: &Command, needle: &str) -> Option<u8> {
  let alias = |test: &dyn Fn(&str) -> bool| cmd.aliases.iter().any(|a| test(a));

  if cmd.name == needle {
    Some(0)
  } else if alias(&|a| a == needle) {
    Some(1)
  } else if cmd.name.starts_with(needle) {
    Some(2)
  } else if alias(&|a| a.starts_with(needle)) {
    Some(3)
  } else if cmd.name.contains(needle) {
    Some(4)
  } else if alias(&|a| a.contains(needle)) {
    Some(5)
  } else {
    None
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
    let suggestions = get_suggestions("csv");
    assert_eq!(suggestions[0].name, "csv");
  }

  #[test]
  fn test_alias_match() {
    assert_eq!(get_suggestions("w")[0].name, "write");
    assert_eq!(get_suggestions("excel")[0].name, "csv");
  }

  #[test]
  fn test_prefix_match() {
    assert_eq!(get_suggestions("qu")[0].name, "quit");
    assert_eq!(get_suggestions("js")[0].name, "json");
  }

  #[test]
  fn test_fuzzy_match() {
    assert_eq!(get_suggestions("rit")[0].name, "write");
  }

  #[test]
  fn test_no_match() {
    assert!(get_suggestions("zzz").is_empty());
  }
}
