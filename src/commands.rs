//! `:` commands and their autocomplete.

/// What a command does once submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
  Dashboard,
  Jobs,
  Analytics,
  Scrape,
  Refresh,
  Quit,
}

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  pub kind: CommandKind,
}

pub const COMMANDS: &[Command] = &[
  Command {
    name: "dashboard",
    aliases: &["d", "home"],
    description: "Market overview",
    kind: CommandKind::Dashboard,
  },
  Command {
    name: "jobs",
    aliases: &["j", "job", "search"],
    description: "Browse and filter job postings",
    kind: CommandKind::Jobs,
  },
  Command {
    name: "analytics",
    aliases: &["a", "insights", "salary"],
    description: "Distributions, trends and salary insights",
    kind: CommandKind::Analytics,
  },
  Command {
    name: "scrape",
    aliases: &["s", "trigger"],
    description: "Ask the backend to scrape job boards",
    kind: CommandKind::Scrape,
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    description: "Refetch everything on screen",
    kind: CommandKind::Refresh,
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit jobpulse",
    kind: CommandKind::Quit,
  },
];

/// Rank of `input` against one command, lower is better
fn match_rank(cmd: &Command, input: &str) -> Option<u32> {
  let alias = |pred: &dyn Fn(&str) -> bool| cmd.aliases.iter().any(|a| pred(a));

  if cmd.name == input {
    Some(0)
  } else if alias(&|a: &str| a == input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if alias(&|a: &str| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if alias(&|a: &str| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

/// Autocomplete suggestions for `input`, best match first
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.trim().to_lowercase();
  if input.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_rank(cmd, &input).map(|rank| (cmd, rank)))
    .collect();
  // Stable, so ties keep declaration order
  matches.sort_by_key(|(_, rank)| *rank);
  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
