use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

use crate::commands::META_COMMANDS;

const KEYWORDS: &[&str] = &["None", "null", "True", "true", "False", "false"];

/// Colors meta commands and the tokens of statements.
#[derive(Debug, Default)]
pub struct ReplHighlighter;

impl ReplHighlighter {
    pub fn new() -> Self {
        Self
    }
}

impl Highlighter for ReplHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();
        if line.is_empty() {
            return styled;
        }

        if META_COMMANDS.contains(&line.trim()) {
            styled.push((Style::new().bold().fg(Color::Cyan), line.to_string()));
            return styled;
        }

        let chars: Vec<(usize, char)> = line.char_indices().collect();
        let end_of = |i: usize| chars.get(i).map(|(pos, _)| *pos).unwrap_or(line.len());
        let mut i = 0;
        while i < chars.len() {
            let (start, c) = chars[i];
            let (next, style) = if c == '"' || c == '\'' {
                (string_end(&chars, i), Style::new().fg(Color::Green))
            } else if c.is_ascii_digit()
                || (c == '-' && chars.get(i + 1).is_some_and(|(_, d)| d.is_ascii_digit()))
            {
                let mut j = i + 1;
                while j < chars.len()
                    && (chars[j].1.is_ascii_alphanumeric() || matches!(chars[j].1, '.' | '_' | '-'))
                {
                    j += 1;
                }
                (j, Style::new().fg(Color::Yellow))
            } else if c.is_alphabetic() || c == '_' {
                let mut j = i + 1;
                while j < chars.len() && (chars[j].1.is_alphanumeric() || matches!(chars[j].1, '_' | '.')) {
                    j += 1;
                }
                let word = &line[start..end_of(j)];
                let style = if KEYWORDS.contains(&word) {
                    Style::new().fg(Color::Magenta)
                } else if word.contains('.') {
                    Style::new().bold().fg(Color::Cyan)
                } else {
                    Style::new()
                };
                (j, style)
            } else {
                (i + 1, Style::new())
            };

            styled.push((style, line[start..end_of(next)].to_string()));
            i = next;
        }

        styled
    }
}

/// Index just past the closing quote, or the end of the line.
fn string_end(chars: &[(usize, char)], open: usize) -> usize {
    let quote = chars[open].1;
    let mut j = open + 1;
    while j < chars.len() {
        match chars[j].1 {
            '\\' => j += 2,
            c if c == quote => return j + 1,
            _ => j += 1,
        }
    }
    chars.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(line: &str) -> Vec<(String, Option<Color>)> {
        ReplHighlighter::new()
            .highlight(line, 0)
            .buffer
            .into_iter()
            .map(|(style, text)| (text, style.foreground))
            .collect()
    }

    #[test]
    fn highlight_empty_returns_empty() {
        assert!(ReplHighlighter::new().highlight("", 0).buffer.is_empty());
    }

    #[test]
    fn highlight_meta_command() {
        let styled = ReplHighlighter::new().highlight("modules", 0);
        assert_eq!(styled.buffer.len(), 1);
        assert_eq!(styled.buffer[0].0.foreground, Some(Color::Cyan));
        assert!(styled.buffer[0].0.is_bold);
    }

    #[test]
    fn highlight_call_statement() {
        let pieces = pieces("x = math_ops.add(-2, 'a b', None)");
        let colored: Vec<(&str, Color)> = pieces
            .iter()
            .filter_map(|(text, color)| color.map(|c| (text.as_str(), c)))
            .collect();
        assert_eq!(
            colored,
            vec![
                ("math_ops.add", Color::Cyan),
                ("-2", Color::Yellow),
                ("'a b'", Color::Green),
                ("None", Color::Magenta),
            ]
        );
    }

    #[test]
    fn highlight_keeps_every_character() {
        let line = "total = m.f([1, 2.5e3], key=\"q\\\"x\")  ";
        let joined: String = pieces(line).into_iter().map(|(text, _)| text).collect();
        assert_eq!(joined, line);
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        let pieces = pieces("m.f('open");
        assert_eq!(pieces.last().unwrap(), &("'open".to_string(), Some(Color::Green)));
    }
}
