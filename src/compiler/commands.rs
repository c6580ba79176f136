use regex::Regex;

use super::types::Command;

/// Turn a block body into its ordered command list.
///
/// Each line with at least one word token becomes one command: the first
/// token is the name, the rest are raw argument strings. Blank lines (and
/// lines already blanked by comment removal) are skipped. No semantic
/// validation happens here; arity and type checking belong to the object
/// that consumes the command.
pub fn parse_commands(body: &str) -> Vec<Command> {
    let word_re = Regex::new(r"[\w.]+").expect("pattern is valid");
    let mut commands = Vec::new();

    for (line, text) in body.split('\n').enumerate() {
        let mut tokens = word_re.find_iter(text).map(|m| m.as_str().to_string());
        let Some(name) = tokens.next() else {
            continue;
        };
        commands.push(Command {
            name,
            args: tokens.collect(),
            line,
        });
    }

    commands
}
