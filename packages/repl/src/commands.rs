//! Meta commands and statement dispatch.

use embedlink::{BridgeError, Evaluator, ScriptError};
use nu_ansi_term::{Color, Style};

/// Result of running one line.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Success, with optional text to print.
    Ok { display: Option<String> },
    /// Failure, formatted `Kind: message`.
    Error(String),
    /// Leave the REPL.
    Exit,
    /// Print the help text.
    Help,
}

impl CommandResult {
    fn ok_display(display: impl Into<String>) -> Self {
        CommandResult::Ok {
            display: Some(display.into()),
        }
    }

    fn ok_none() -> Self {
        CommandResult::Ok { display: None }
    }
}

/// Meta command names, for completion and highlighting.
pub const META_COMMANDS: &[&str] = &["help", "modules", "vars", "reset", "exit", "quit"];

/// Run one line of input.
///
/// Meta commands are handled here; anything else is a statement for the
/// evaluator.
pub fn execute(input: &str, evaluator: &mut Evaluator) -> CommandResult {
    match input.trim() {
        "help" | "?" => CommandResult::Help,
        "exit" | "quit" | "q" => CommandResult::Exit,
        "modules" => cmd_modules(evaluator),
        "vars" => cmd_vars(evaluator),
        "reset" => {
            evaluator.clear();
            CommandResult::ok_display(format!("{}", Color::Green.paint("namespace cleared")))
        }
        line => match evaluator.execute(line) {
            Ok(Some(value)) => CommandResult::ok_display(value.to_string()),
            Ok(None) => CommandResult::ok_none(),
            Err(e) => CommandResult::Error(format_error(&e)),
        },
    }
}

/// `Kind: message`, followed by the runtime traceback when there is one.
fn format_error(error: &ScriptError) -> String {
    match error {
        ScriptError::Bridge(bridge @ BridgeError::NativeException { .. }) => {
            match bridge.trace() {
                Some(trace) => format!("{}\n{}", bridge, Color::DarkGray.paint(trace)),
                None => bridge.to_string(),
            }
        }
        other => other.to_string(),
    }
}

/// One line per module: name, kind, and exported functions.
pub fn module_listing(evaluator: &Evaluator) -> Result<Vec<(String, String, Vec<String>)>, BridgeError> {
    evaluator.handle().with_interpreter(|interpreter| {
        let mut names = interpreter.registered();
        names.extend(interpreter.imported());
        names.sort();
        names.dedup();

        names
            .into_iter()
            .filter_map(|name| {
                let module = interpreter.import(&name).ok()?;
                Some((name, module.kind().to_string(), module.functions()))
            })
            .collect()
    })
}

fn cmd_modules(evaluator: &Evaluator) -> CommandResult {
    let modules = match module_listing(evaluator) {
        Ok(modules) => modules,
        Err(e) => return CommandResult::Error(e.to_string()),
    };

    let lines: Vec<String> = modules
        .iter()
        .map(|(name, kind, functions)| {
            format!(
                "  {} {} {}",
                Color::Cyan.bold().paint(name),
                Color::DarkGray.paint(format!("({})", kind)),
                functions.join(", ")
            )
        })
        .collect();
    CommandResult::ok_display(lines.join("\n"))
}

fn cmd_vars(evaluator: &Evaluator) -> CommandResult {
    let variables = evaluator.variables();
    if variables.is_empty() {
        return CommandResult::ok_display(format!("{}", Color::Yellow.paint("no variables")));
    }

    let lines: Vec<String> = variables
        .iter()
        .map(|(name, value)| format!("  {} = {}", Color::Magenta.paint(name), value))
        .collect();
    CommandResult::ok_display(lines.join("\n"))
}

/// Styled help text.
pub fn format_help() -> String {
    let cmd_style = Style::new().bold().fg(Color::Cyan);
    let arg_style = Style::new().fg(Color::Yellow);

    let mut help = format!("{}\n\n", Style::new().bold().paint("Statements"));
    let statements = [
        ("module.function", "(args, key=value)", "Call a function and print the result"),
        ("name = ", "<expression>", "Bind a result to a variable"),
        ("name", "", "Print a variable"),
    ];
    for (cmd, args, desc) in statements {
        help.push_str(&format!(
            "  {}{:<24} {}\n",
            cmd_style.paint(cmd),
            arg_style.paint(args),
            desc
        ));
    }
    help.push_str(&format!(
        "\n  Literals: {} {} {} {} {}\n",
        arg_style.paint("None"),
        arg_style.paint("True/False"),
        arg_style.paint("42 -1.5"),
        arg_style.paint("'text'"),
        arg_style.paint("[1, 2] {\"k\": 1}")
    ));

    help.push_str(&format!("\n{}\n\n", Style::new().bold().paint("Commands")));
    let commands = [
        ("modules", "List loaded modules and their functions"),
        ("vars", "List variables"),
        ("reset", "Clear all variables"),
        ("help, ?", "Show this help"),
        ("exit, quit", "Leave the REPL"),
    ];
    for (cmd, desc) in commands {
        help.push_str(&format!("  {:<20} {}\n", cmd_style.paint(cmd), desc));
    }

    help
}
