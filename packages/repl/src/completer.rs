use std::sync::Arc;

use parking_lot::RwLock;
use reedline::{Completer, Span, Suggestion};

use crate::commands::META_COMMANDS;

/// Names the completer offers besides meta commands: `module.function`
/// targets and variables. The REPL refreshes them after each line.
pub type Candidates = Arc<RwLock<Vec<String>>>;

/// Completes the word under the cursor.
pub struct ReplCompleter {
    candidates: Candidates,
}

impl ReplCompleter {
    pub fn new(candidates: Candidates) -> Self {
        Self { candidates }
    }
}

impl Completer for ReplCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let line_to_pos = &line[..pos];
        let start = line_to_pos
            .rfind(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .map(|i| i + 1)
            .unwrap_or(0);
        let prefix = &line_to_pos[start..];
        let first_word = line_to_pos[..start].trim().is_empty();

        let mut suggestions = Vec::new();
        if first_word {
            for cmd in META_COMMANDS.iter().filter(|cmd| cmd.starts_with(prefix)) {
                suggestions.push(suggestion(cmd, Some("command"), start, pos, true));
            }
        }
        if prefix.is_empty() {
            return suggestions;
        }

        for name in self.candidates.read().iter() {
            if name.starts_with(prefix) {
                let description = if name.contains('.') {
                    "function"
                } else {
                    "variable"
                };
                suggestions.push(suggestion(name, Some(description), start, pos, false));
            }
        }
        suggestions
    }
}

fn suggestion(
    value: &str,
    description: Option<&str>,
    start: usize,
    end: usize,
    append_whitespace: bool,
) -> Suggestion {
    Suggestion {
        value: value.to_string(),
        description: description.map(str::to_string),
        style: None,
        extra: None,
        span: Span::new(start, end),
        append_whitespace,
        match_indices: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completer(names: &[&str]) -> ReplCompleter {
        ReplCompleter::new(Arc::new(RwLock::new(
            names.iter().map(|n| n.to_string()).collect(),
        )))
    }

    fn values(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.value.as_str()).collect()
    }

    #[test]
    fn completes_meta_commands_at_line_start() {
        let mut completer = completer(&[]);
        let suggestions = completer.complete("mo", 2);
        assert_eq!(values(&suggestions), vec!["modules"]);
        assert_eq!(suggestions[0].span, Span::new(0, 2));
    }

    #[test]
    fn completes_call_targets_inside_expressions() {
        let mut completer = completer(&["math_ops.add", "math_ops.mul", "sys.version"]);
        let line = "x = math_ops.a";
        let suggestions = completer.complete(line, line.len());
        assert_eq!(values(&suggestions), vec!["math_ops.add"]);
        assert_eq!(suggestions[0].span, Span::new(4, line.len()));
        assert_eq!(suggestions[0].description.as_deref(), Some("function"));
    }

    #[test]
    fn completes_arguments_after_paren() {
        let mut completer = completer(&["total"]);
        let line = "math_ops.add(to";
        let suggestions = completer.complete(line, line.len());
        assert_eq!(values(&suggestions), vec!["total"]);
        assert_eq!(suggestions[0].description.as_deref(), Some("variable"));
    }

    #[test]
    fn sees_refreshed_candidates() {
        let candidates: Candidates = Arc::new(RwLock::new(Vec::new()));
        let mut completer = ReplCompleter::new(candidates.clone());
        assert!(completer.complete("x = ge", 6).is_empty());

        candidates.write().push("geometry.area".to_string());
        assert_eq!(values(&completer.complete("x = ge", 6)), vec!["geometry.area"]);
    }
}
