//! One-line statements evaluated against a runtime handle.
//!
//! ```text
//! stmt  := IDENT '=' expr | expr
//! expr  := dotted '(' args ')' | '[' exprs ']' | '{' STRING ':' expr, ... '}'
//!        | literal | IDENT
//! args  := (IDENT '=' expr | expr) (',' ...)*
//! ```
//!
//! Literals are JSON values plus `None`, `True` and `False`. Strings may use
//! single or double quotes. A call `a.b.f(...)` calls function `f` of
//! module `a.b`.

use std::collections::BTreeMap;
use std::sync::Arc;

use embedlink_value::{Value, DEFAULT_MAX_DEPTH};
use thiserror::Error;

use crate::error::BridgeError;
use crate::handle::RuntimeHandle;
use crate::request::CallRequest;

/// Errors from evaluating a statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("SyntaxError: {message} (column {column})")]
    Syntax { message: String, column: usize },

    #[error("NameError: name '{0}' is not defined")]
    UndefinedName(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Name(String),
    List(Vec<Expr>),
    Map(Vec<(String, Expr)>),
    Call {
        module: String,
        function: String,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
}

/// A parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assign { name: String, expr: Expr },
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    Punct(char),
}

/// Parse a line. Blank lines and `#` comments parse to `None`.
///
/// Lists and maps may nest [`DEFAULT_MAX_DEPTH`] levels deep.
pub fn parse(line: &str) -> Result<Option<Statement>, ScriptError> {
    parse_with_limit(line, DEFAULT_MAX_DEPTH)
}

/// [`parse`] with an explicit nesting limit for lists and maps. Nested
/// calls are held to the same limit.
pub fn parse_with_limit(line: &str, max_depth: usize) -> Result<Option<Statement>, ScriptError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let tokens = tokenize(line)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: line.chars().count() + 1,
        max_depth,
        containers: 0,
        calls: 0,
    };
    let statement = parser.statement()?;
    if let Some((_, column)) = parser.tokens.get(parser.pos) {
        return Err(syntax("unexpected trailing input", *column));
    }
    Ok(Some(statement))
}

fn syntax(message: impl Into<String>, column: usize) -> ScriptError {
    ScriptError::Syntax {
        message: message.into(),
        column,
    }
}

fn tokenize(line: &str) -> Result<Vec<(Token, usize)>, ScriptError> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let column = i + 1;

        if c.is_whitespace() {
            i += 1;
        } else if c == '"' || c == '\'' {
            let (s, next) = string_literal(&chars, i)?;
            tokens.push((Token::Str(s), column));
            i = next;
        } else if c.is_ascii_digit()
            || (c == '-' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()))
        {
            let (token, next) = number_literal(&chars, i)?;
            tokens.push((token, column));
            i = next;
        } else if unicode_start(c) {
            let start = i;
            while i < chars.len() && unicode_continue(chars[i]) {
                i += 1;
            }
            tokens.push((Token::Ident(chars[start..i].iter().collect()), column));
        } else if "()[]{},:=.".contains(c) {
            tokens.push((Token::Punct(c), column));
            i += 1;
        } else {
            return Err(syntax(format!("unexpected character '{}'", c), column));
        }
    }

    Ok(tokens)
}

fn unicode_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn unicode_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn string_literal(chars: &[char], start: usize) -> Result<(String, usize), ScriptError> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            c if c == quote => return Ok((out, i + 1)),
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| syntax("unterminated escape", i + 1))?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => *other,
                });
                i += 2;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    Err(syntax("unterminated string", start + 1))
}

fn number_literal(chars: &[char], start: usize) -> Result<(Token, usize), ScriptError> {
    let mut i = start;
    if chars[i] == '-' {
        i += 1;
    }
    let mut is_float = false;
    while i < chars.len() {
        match chars[i] {
            '0'..='9' | '_' => i += 1,
            '.' if !is_float && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()) => {
                is_float = true;
                i += 1;
            }
            'e' | 'E' => {
                is_float = true;
                i += 1;
                if matches!(chars.get(i), Some('+') | Some('-')) {
                    i += 1;
                }
            }
            _ => break,
        }
    }

    let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
    let token = if is_float {
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| syntax(format!("invalid number '{}'", text), start + 1))?
    } else {
        text.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| syntax(format!("integer '{}' out of range", text), start + 1))?
    };
    Ok((token, i))
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    /// Column reported for errors at end of input.
    end: usize,
    max_depth: usize,
    /// Open `[` and `{`.
    containers: usize,
    /// Open call argument lists.
    calls: usize,
}

fn descend(open: &mut usize, max_depth: usize, column: usize) -> Result<(), ScriptError> {
    *open += 1;
    if *open > max_depth {
        Err(syntax("expression nested too deeply", column))
    } else {
        Ok(())
    }
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(t, _)| t)
    }

    fn column(&self) -> usize {
        self.tokens.get(self.pos).map(|(_, c)| *c).unwrap_or(self.end)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, punct: char) -> bool {
        if self.peek() == Some(&Token::Punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: char) -> Result<(), ScriptError> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(syntax(format!("expected '{}'", punct), self.column()))
        }
    }

    fn statement(&mut self) -> Result<Statement, ScriptError> {
        if let (Some(Token::Ident(name)), Some(Token::Punct('='))) = (self.peek(), self.peek_at(1))
        {
            let name = name.clone();
            if literal_keyword(&name).is_some() {
                return Err(syntax(
                    format!("cannot assign to '{}'", name),
                    self.column(),
                ));
            }
            self.pos += 2;
            let expr = self.expr()?;
            return Ok(Statement::Assign { name, expr });
        }
        Ok(Statement::Expr(self.expr()?))
    }

    fn expr(&mut self) -> Result<Expr, ScriptError> {
        let column = self.column();
        match self.next() {
            Some(Token::Int(i)) => Ok(Expr::Literal(Value::Int(i))),
            Some(Token::Float(f)) => Ok(Expr::Literal(Value::Float(f))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Punct('[')) => {
                descend(&mut self.containers, self.max_depth, column)?;
                let list = self.list();
                self.containers -= 1;
                list
            }
            Some(Token::Punct('{')) => {
                descend(&mut self.containers, self.max_depth, column)?;
                let map = self.map();
                self.containers -= 1;
                map
            }
            Some(Token::Ident(name)) => self.name_or_call(name, column),
            Some(Token::Punct(c)) => Err(syntax(format!("unexpected '{}'", c), column)),
            None => Err(syntax("unexpected end of input", column)),
        }
    }

    fn list(&mut self) -> Result<Expr, ScriptError> {
        let mut items = Vec::new();
        while !self.eat(']') {
            items.push(self.expr()?);
            if !self.eat(',') {
                self.expect(']')?;
                break;
            }
        }
        Ok(Expr::List(items))
    }

    fn map(&mut self) -> Result<Expr, ScriptError> {
        let mut entries = Vec::new();
        while !self.eat('}') {
            let column = self.column();
            let key = match self.next() {
                Some(Token::Str(s)) => s,
                _ => return Err(syntax("map keys must be strings", column)),
            };
            self.expect(':')?;
            entries.push((key, self.expr()?));
            if !self.eat(',') {
                self.expect('}')?;
                break;
            }
        }
        Ok(Expr::Map(entries))
    }

    fn name_or_call(&mut self, first: String, column: usize) -> Result<Expr, ScriptError> {
        let mut path = vec![first];
        while self.eat('.') {
            match self.next() {
                Some(Token::Ident(part)) => path.push(part),
                _ => return Err(syntax("expected a name after '.'", self.column())),
            }
        }

        if !self.eat('(') {
            if path.len() > 1 {
                return Err(syntax(
                    format!("expected '(' after '{}'", path.join(".")),
                    self.column(),
                ));
            }
            let name = path.remove(0);
            return Ok(match literal_keyword(&name) {
                Some(value) => Expr::Literal(value),
                None => Expr::Name(name),
            });
        }

        let function = match path.pop() {
            Some(f) if !path.is_empty() => f,
            _ => {
                return Err(syntax(
                    "calls must name a module: module.function(...)",
                    column,
                ))
            }
        };
        descend(&mut self.calls, self.max_depth, column)?;
        let arguments = self.arguments();
        self.calls -= 1;
        let (args, kwargs) = arguments?;
        Ok(Expr::Call {
            module: path.join("."),
            function,
            args,
            kwargs,
        })
    }

    fn arguments(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), ScriptError> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();

        while !self.eat(')') {
            let column = self.column();
            if let (Some(Token::Ident(name)), Some(Token::Punct('='))) =
                (self.peek(), self.peek_at(1))
            {
                let name = name.clone();
                if kwargs.iter().any(|(k, _)| *k == name) {
                    return Err(syntax(
                        format!("keyword argument '{}' repeated", name),
                        column,
                    ));
                }
                self.pos += 2;
                kwargs.push((name, self.expr()?));
            } else if !kwargs.is_empty() {
                return Err(syntax(
                    "positional argument follows keyword argument",
                    column,
                ));
            } else {
                args.push(self.expr()?);
            }

            if !self.eat(',') {
                self.expect(')')?;
                break;
            }
        }

        Ok((args, kwargs))
    }
}

fn literal_keyword(name: &str) -> Option<Value> {
    match name {
        "None" | "null" => Some(Value::Null),
        "True" | "true" => Some(Value::Bool(true)),
        "False" | "false" => Some(Value::Bool(false)),
        _ => None,
    }
}

/// Evaluates statements with a namespace that persists between lines.
pub struct Evaluator {
    handle: Arc<RuntimeHandle>,
    namespace: BTreeMap<String, Value>,
}

impl Evaluator {
    pub fn new(handle: Arc<RuntimeHandle>) -> Self {
        Self {
            handle,
            namespace: BTreeMap::new(),
        }
    }

    pub fn handle(&self) -> &Arc<RuntimeHandle> {
        &self.handle
    }

    /// Variables assigned so far.
    pub fn variables(&self) -> &BTreeMap<String, Value> {
        &self.namespace
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.namespace.insert(name.into(), value);
    }

    pub fn clear(&mut self) {
        self.namespace.clear();
    }

    /// Run one line.
    ///
    /// Returns the value of an expression statement when it is not null.
    /// Assignments, blank lines and comments return `None`.
    pub fn execute(&mut self, line: &str) -> Result<Option<Value>, ScriptError> {
        match parse_with_limit(line, self.handle.codec().max_depth())? {
            None => Ok(None),
            Some(Statement::Assign { name, expr }) => {
                let value = self.eval(&expr)?;
                self.namespace.insert(name, value);
                Ok(None)
            }
            Some(Statement::Expr(expr)) => {
                let value = self.eval(&expr)?;
                Ok((!value.is_null()).then_some(value))
            }
        }
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value, ScriptError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Name(name) => self
                .namespace
                .get(name)
                .cloned()
                .ok_or_else(|| ScriptError::UndefinedName(name.clone())),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expr::Map(entries) => entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), self.eval(v)?)))
                .collect::<Result<BTreeMap<_, _>, ScriptError>>()
                .map(Value::Map),
            Expr::Call {
                module,
                function,
                args,
                kwargs,
            } => {
                let mut request = CallRequest::new(module.as_str(), function.as_str());
                for arg in args {
                    request = request.with_arg(self.eval(arg)?);
                }
                for (name, arg) in kwargs {
                    request = request.with_kwarg(name.as_str(), self.eval(arg)?);
                }
                Ok(self.handle.invoke(&request)?)
            }
        }
    }
}
