//! Reedline-backed terminal host.

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::PathBuf;

use nu_ansi_term::{Color, Style};
use reedline::{
    default_emacs_keybindings, default_vi_insert_keybindings, default_vi_normal_keybindings,
    ColumnarMenu, DefaultHinter, EditCommand, EditMode, Emacs, FileBackedHistory, KeyCode,
    KeyModifiers, Keybindings, MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch,
    PromptHistorySearchStatus, PromptViMode, Reedline, ReedlineEvent, ReedlineMenu,
    Signal as ReedlineSignal, Vi,
};

use crate::completer::{Candidates, ReplCompleter};
use crate::highlighter::ReplHighlighter;
use crate::io::{InputLine, IoError, IoHost, Output, OutputStyle, PromptConfig, Signal};

const MENU: &str = "completion_menu";

pub struct TerminalHost {
    editor: Reedline,
    input: Option<InputLine>,
    signal: Option<Signal>,
    prompt: PromptConfig,
}

impl TerminalHost {
    /// Create a terminal host that completes from `candidates`.
    pub fn new(candidates: Candidates) -> io::Result<Self> {
        let menu = ColumnarMenu::default()
            .with_name(MENU)
            .with_text_style(Style::new().fg(Color::Cyan))
            .with_selected_text_style(Style::new().fg(Color::Black).on(Color::Cyan).bold());

        let mut editor = Reedline::create()
            .with_completer(Box::new(ReplCompleter::new(candidates)))
            .with_highlighter(Box::new(ReplHighlighter::new()))
            .with_hinter(Box::new(
                DefaultHinter::default().with_style(Style::new().fg(Color::DarkGray)),
            ))
            .with_menu(ReedlineMenu::EngineCompleter(Box::new(menu)))
            .with_edit_mode(edit_mode());

        if let Some(history) = open_history() {
            editor = editor.with_history(Box::new(history));
        }

        Ok(Self {
            editor,
            input: None,
            signal: None,
            prompt: PromptConfig::default(),
        })
    }
}

/// Tab opens the completion menu, then cycles through it.
fn bind_tab(keybindings: &mut Keybindings) {
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu(MENU.to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );
}

fn edit_mode() -> Box<dyn EditMode> {
    if should_use_vi_mode() {
        let mut insert = default_vi_insert_keybindings();
        bind_tab(&mut insert);
        Box::new(Vi::new(insert, default_vi_normal_keybindings()))
    } else {
        let mut keybindings = default_emacs_keybindings();
        bind_tab(&mut keybindings);
        keybindings.add_binding(
            KeyModifiers::CONTROL,
            KeyCode::Char('d'),
            ReedlineEvent::Edit(vec![EditCommand::Clear]),
        );
        Box::new(Emacs::new(keybindings))
    }
}

/// History is optional; a missing data directory only disables it.
fn open_history() -> Option<FileBackedHistory> {
    let path = history_path()?;
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::debug!(error = %e, "cannot create history directory");
        }
    }
    match FileBackedHistory::with_file(HISTORY_SIZE, path) {
        Ok(history) => Some(history),
        Err(e) => {
            tracing::debug!(error = %e, "history disabled");
            None
        }
    }
}

impl IoHost for TerminalHost {
    fn wait_for_input(&mut self) -> Result<(), IoError> {
        let prompt = TerminalPrompt::from_config(&self.prompt);
        match self.editor.read_line(&prompt) {
            Ok(ReedlineSignal::Success(line)) => self.input = Some(InputLine { line }),
            Ok(ReedlineSignal::CtrlC) => self.signal = Some(Signal::Interrupt),
            Ok(ReedlineSignal::CtrlD) => self.signal = Some(Signal::Eof),
            Err(e) => return Err(IoError::Io(format!("line editor: {}", e))),
        }
        Ok(())
    }

    fn read_input(&mut self) -> Result<Option<InputLine>, IoError> {
        Ok(self.input.take())
    }

    fn read_signal(&mut self) -> Result<Option<Signal>, IoError> {
        Ok(self.signal.take())
    }

    fn write_output(&mut self, output: Output) -> Result<(), IoError> {
        let text = match output.style {
            OutputStyle::Normal => output.text,
            OutputStyle::Error => Color::Red.paint(output.text).to_string(),
            OutputStyle::Info => Color::DarkGray.paint(output.text).to_string(),
            OutputStyle::Banner => Color::Cyan.bold().paint(output.text).to_string(),
        };
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", text).map_err(|e| IoError::Io(e.to_string()))
    }

    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError> {
        self.prompt = config;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        io::stdout().flush().map_err(|e| IoError::Io(e.to_string()))
    }
}

/// `embedlink [ready] 2 var(s)`
struct TerminalPrompt {
    state: String,
    variable_count: usize,
}

impl TerminalPrompt {
    fn from_config(config: &PromptConfig) -> Self {
        Self {
            state: config.runtime_state.clone(),
            variable_count: config.variable_count,
        }
    }
}

impl Prompt for TerminalPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        let state_color = if self.state == "ready" {
            Color::Green
        } else {
            Color::Yellow
        };
        let mut prompt = format!(
            "{} {}",
            Color::Blue.bold().paint("embedlink"),
            state_color.paint(format!("[{}]", self.state))
        );
        if self.variable_count > 0 {
            prompt.push_str(&format!(
                " {}",
                Color::Magenta.paint(format!("{} var(s)", self.variable_count))
            ));
        }
        Cow::Owned(prompt)
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        let marker = match edit_mode {
            PromptEditMode::Vi(PromptViMode::Normal) => Color::Blue.bold().paint(" : "),
            PromptEditMode::Vi(PromptViMode::Insert) => Color::Green.bold().paint(" > "),
            _ => Color::Green.bold().paint(" > "),
        };
        Cow::Owned(marker.to_string())
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let status = match search.status {
            PromptHistorySearchStatus::Passing => "search",
            PromptHistorySearchStatus::Failing => "no match",
        };
        Cow::Owned(format!("({}: {}) ", status, search.term))
    }
}

const HISTORY_SIZE: usize = 1000;

/// Environment variable that forces the edit mode (`vi` or `emacs`).
pub const EDIT_MODE_ENV: &str = "EMBEDLINK_EDIT_MODE";

fn history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("embedlink").join("history.txt"))
}

/// Vi mode when forced by [`EDIT_MODE_ENV`], or when the user's editor or
/// inputrc asks for it.
fn should_use_vi_mode() -> bool {
    if let Ok(mode) = std::env::var(EDIT_MODE_ENV) {
        return is_vi_name(&mode);
    }
    ["EDITOR", "VISUAL"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .any(|editor| is_vi_name(&editor))
        || inputrc_wants_vi()
}

fn is_vi_name(name: &str) -> bool {
    let name = name.to_lowercase();
    let program = name.rsplit('/').next().unwrap_or(&name);
    matches!(program, "vi" | "vim" | "nvim")
}

fn inputrc_wants_vi() -> bool {
    let candidates = [
        std::env::var("INPUTRC").ok().map(PathBuf::from),
        dirs::home_dir().map(|p| p.join(".inputrc")),
        Some(PathBuf::from("/etc/inputrc")),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .any(|content| {
            content.lines().any(|line| {
                let words: Vec<&str> = line.split_whitespace().collect();
                words == ["set", "editing-mode", "vi"]
            })
        })
}
