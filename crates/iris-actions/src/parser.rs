// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Call-syntax parser: fenced-block extraction, `agent.<verb>(…)` scanning,
//! and argument binding into [`AgentAction`] values.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::{AgentAction, CellValue, MouseButton, ParseError};

// ─── Code block extraction ────────────────────────────────────────────────────

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Optional language tag after the opening fence, body matched non-greedily
    // with dot-matches-newline.
    RE.get_or_init(|| Regex::new(r"(?s)```(?:[A-Za-z0-9_+-]+)?[ \t]*\n?(.*?)```").unwrap())
}

/// Extract the body of the *last* fenced code block in `model_output`.
///
/// Returns `None` when no complete fenced block is present.
pub fn parse_code_block(model_output: &str) -> Option<String> {
    fence_regex()
        .captures_iter(model_output)
        .last()
        .map(|c| c[1].trim().to_string())
}

// ─── Call extraction ──────────────────────────────────────────────────────────

/// Find every substring of `code` shaped like `agent.<name>( … )` where the
/// parentheses are balanced.  String literals (single or double quoted) are
/// opaque to paren counting, so `agent.type("say (hi)")` is one call.
///
/// Substrings whose parens never close are skipped, never returned partially.
pub fn extract_calls(code: &str) -> Vec<String> {
    let bytes = code.as_bytes();
    let mut calls = Vec::new();
    let mut i = 0;

    while let Some(rel) = code[i..].find("agent.") {
        let start = i + rel;
        let mut j = start + "agent.".len();
        // Verb identifier
        while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
            j += 1;
        }
        if j >= bytes.len() || bytes[j] != b'(' || j == start + "agent.".len() {
            i = start + "agent.".len();
            continue;
        }
        match find_balanced_close(code, j) {
            Some(close) => {
                calls.push(code[start..=close].to_string());
                i = close + 1;
            }
            None => {
                // Unbalanced to end of input; no further complete call can start
                // inside this one's argument text either.
                i = j + 1;
            }
        }
    }
    calls
}

/// Index of the `)` matching the `(` at `open`, counting parens outside string
/// literals only.  Returns `None` when the input ends first.
fn find_balanced_close(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in s[open..].char_indices() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(open + idx);
                    }
                }
                _ => {}
            },
        }
    }
    None
}

// ─── Literals ─────────────────────────────────────────────────────────────────

/// A literal value in the call micro-language.
#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
    List(Vec<Literal>),
    Map(Vec<(String, Literal)>),
}

impl Literal {
    fn type_name(&self) -> &'static str {
        match self {
            Literal::Str(_) => "string",
            Literal::Int(_) => "integer",
            Literal::Float(_) => "number",
            Literal::Bool(_) => "boolean",
            Literal::None => "None",
            Literal::List(_) => "list",
            Literal::Map(_) => "map",
        }
    }
}

/// Character-cursor scanner over a call's argument text.
struct Scanner<'a> {
    chars: Vec<char>,
    pos: usize,
    src: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { chars: src.chars().collect(), pos: 0, src }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.pos >= self.chars.len()
    }

    fn error(&self, detail: impl Into<String>) -> ParseError {
        ParseError::MalformedCall {
            detail: format!("{} (in `{}`)", detail.into(), self.src.trim()),
        }
    }

    /// A quoted string.  No escape handling beyond the surrounding quotes.
    fn string(&mut self, quote: char) -> Result<Literal, ParseError> {
        self.bump(); // opening quote
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(Literal::Str(out)),
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string literal")),
            }
        }
    }

    fn number(&mut self) -> Result<Literal, ParseError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.pos += 1;
        }
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => self.pos += 1,
                '.' | 'e' | 'E' => {
                    is_float = true;
                    self.pos += 1;
                }
                '-' | '+' if is_float => self.pos += 1,
                _ => break,
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if is_float {
            text.parse::<f64>()
                .map(Literal::Float)
                .map_err(|_| self.error(format!("invalid number `{text}`")))
        } else {
            text.parse::<i64>()
                .map(Literal::Int)
                .map_err(|_| self.error(format!("invalid integer `{text}`")))
        }
    }

    fn word(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn list(&mut self) -> Result<Literal, ParseError> {
        self.bump(); // `[`
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.pos += 1;
                return Ok(Literal::List(items));
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some(']') => {}
                _ => return Err(self.error("expected `,` or `]` in list literal")),
            }
        }
    }

    fn map(&mut self) -> Result<Literal, ParseError> {
        self.bump(); // `{`
        let mut entries = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Literal::Map(entries));
            }
            let key = match self.value()? {
                Literal::Str(s) => s,
                other => {
                    return Err(self.error(format!(
                        "map keys must be strings, got {}",
                        other.type_name()
                    )))
                }
            };
            self.skip_ws();
            if self.bump() != Some(':') {
                return Err(self.error("expected `:` after map key"));
            }
            let value = self.value()?;
            entries.push((key, value));
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some('}') => {}
                _ => return Err(self.error("expected `,` or `}` in map literal")),
            }
        }
    }

    fn value(&mut self) -> Result<Literal, ParseError> {
        self.skip_ws();
        match self.peek() {
            Some(q @ ('\'' | '"')) => self.string(q),
            Some('[') => self.list(),
            Some('{') => self.map(),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' => self.number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let w = self.word();
                match w.as_str() {
                    "True" | "true" => Ok(Literal::Bool(true)),
                    "False" | "false" => Ok(Literal::Bool(false)),
                    "None" => Ok(Literal::None),
                    other => Err(self.error(format!("unexpected bare word `{other}`"))),
                }
            }
            Some(c) => Err(self.error(format!("unexpected character `{c}`"))),
            None => Err(self.error("expected a value")),
        }
    }
}

// ─── Argument binding ─────────────────────────────────────────────────────────

/// Lowercase `camelCase` keyword names into `snake_case` so both spellings
/// bind to the same parameter.
fn to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

struct Args {
    verb: &'static str,
    positional: Vec<Literal>,
    keyword: Vec<(String, Literal)>,
}

impl Args {
    /// Fetch the parameter at position `idx` / keyword `name`, honouring both
    /// snake_case and camelCase spellings.  Returns `None` when omitted.
    fn take(&mut self, idx: usize, name: &'static str) -> Result<Option<Literal>, ParseError> {
        let kw_pos = self.keyword.iter().position(|(k, _)| to_snake(k) == name);
        let from_positional = idx < self.positional.len();
        if from_positional && kw_pos.is_some() {
            return Err(ParseError::BadArgument {
                verb: self.verb,
                arg: name,
                detail: "given both positionally and by keyword".into(),
            });
        }
        if from_positional {
            return Ok(Some(std::mem::replace(
                &mut self.positional[idx],
                Literal::None,
            )));
        }
        Ok(kw_pos.map(|p| self.keyword.remove(p).1))
    }

    /// Reject leftovers after all declared parameters were bound.
    fn finish(self, declared: usize) -> Result<(), ParseError> {
        if self.positional.len() > declared {
            return Err(ParseError::MalformedCall {
                detail: format!(
                    "agent.{} takes at most {declared} positional arguments, got {}",
                    self.verb,
                    self.positional.len()
                ),
            });
        }
        if let Some((k, _)) = self.keyword.first() {
            return Err(ParseError::MalformedCall {
                detail: format!("unexpected keyword `{k}` for agent.{}", self.verb),
            });
        }
        Ok(())
    }
}

fn split_args(verb: &'static str, body: &str) -> Result<Args, ParseError> {
    let mut sc = Scanner::new(body);
    let mut positional = Vec::new();
    let mut keyword: Vec<(String, Literal)> = Vec::new();

    while !sc.at_end() {
        // Keyword form: identifier `=` value (but not `==`).
        let mark = sc.pos;
        let is_kw = {
            let w = sc.word();
            sc.skip_ws();
            if !w.is_empty() && sc.peek() == Some('=') && sc.chars.get(sc.pos + 1) != Some(&'=') {
                sc.pos += 1;
                Some(w)
            } else {
                sc.pos = mark;
                None
            }
        };
        let value = sc.value()?;
        match is_kw {
            Some(name) => keyword.push((name, value)),
            None => {
                if !keyword.is_empty() {
                    return Err(sc.error("positional argument after keyword argument"));
                }
                positional.push(value);
            }
        }
        sc.skip_ws();
        match sc.peek() {
            Some(',') => {
                sc.pos += 1;
            }
            None => break,
            Some(c) => return Err(sc.error(format!("expected `,` between arguments, got `{c}`"))),
        }
    }

    Ok(Args { verb, positional, keyword })
}

// ─── Typed extraction helpers ─────────────────────────────────────────────────

fn bad(verb: &'static str, arg: &'static str, detail: impl Into<String>) -> ParseError {
    ParseError::BadArgument { verb, arg, detail: detail.into() }
}

fn want_str(verb: &'static str, arg: &'static str, lit: Literal) -> Result<String, ParseError> {
    match lit {
        Literal::Str(s) => Ok(s),
        other => Err(bad(verb, arg, format!("expected a string, got {}", other.type_name()))),
    }
}

fn want_bool(verb: &'static str, arg: &'static str, lit: Literal) -> Result<bool, ParseError> {
    match lit {
        Literal::Bool(b) => Ok(b),
        other => Err(bad(verb, arg, format!("expected a boolean, got {}", other.type_name()))),
    }
}

fn want_int(verb: &'static str, arg: &'static str, lit: Literal) -> Result<i64, ParseError> {
    match lit {
        Literal::Int(i) => Ok(i),
        other => Err(bad(verb, arg, format!("expected an integer, got {}", other.type_name()))),
    }
}

fn want_f64(verb: &'static str, arg: &'static str, lit: Literal) -> Result<f64, ParseError> {
    match lit {
        Literal::Int(i) => Ok(i as f64),
        Literal::Float(f) => Ok(f),
        other => Err(bad(verb, arg, format!("expected a number, got {}", other.type_name()))),
    }
}

fn want_str_list(
    verb: &'static str,
    arg: &'static str,
    lit: Literal,
) -> Result<Vec<String>, ParseError> {
    match lit {
        Literal::List(items) => items
            .into_iter()
            .map(|l| want_str(verb, arg, l))
            .collect(),
        // A bare string is accepted as a one-element list.
        Literal::Str(s) => Ok(vec![s]),
        other => Err(bad(verb, arg, format!("expected a list of strings, got {}", other.type_name()))),
    }
}

fn want_button(verb: &'static str, arg: &'static str, lit: Literal) -> Result<MouseButton, ParseError> {
    let s = want_str(verb, arg, lit)?;
    MouseButton::parse(&s)
        .ok_or_else(|| bad(verb, arg, format!("expected left|right|middle, got `{s}`")))
}

fn want_cell_map(
    verb: &'static str,
    arg: &'static str,
    lit: Literal,
) -> Result<BTreeMap<String, CellValue>, ParseError> {
    let entries = match lit {
        Literal::Map(e) => e,
        other => {
            return Err(bad(verb, arg, format!("expected a map literal, got {}", other.type_name())))
        }
    };
    let mut out = BTreeMap::new();
    for (k, v) in entries {
        let value = match v {
            Literal::Str(s) => CellValue::Text(s),
            Literal::Int(i) => CellValue::Int(i),
            Literal::Float(f) => CellValue::Float(f),
            Literal::Bool(b) => CellValue::Bool(b),
            other => {
                return Err(bad(
                    verb,
                    arg,
                    format!("cell `{k}` must be a scalar, got {}", other.type_name()),
                ))
            }
        };
        out.insert(k, value);
    }
    Ok(out)
}

// ─── Call parsing ─────────────────────────────────────────────────────────────

/// Parse one extracted call into a typed [`AgentAction`].
pub fn parse_call(call_text: &str) -> Result<AgentAction, ParseError> {
    let trimmed = call_text.trim();
    let rest = trimmed.strip_prefix("agent.").ok_or_else(|| ParseError::MalformedCall {
        detail: "calls must be of the form agent.<verb>(…)".into(),
    })?;
    let open = rest.find('(').ok_or_else(|| ParseError::MalformedCall {
        detail: "missing `(` after verb name".into(),
    })?;
    let verb_name = rest[..open].trim();
    let close = find_balanced_close(rest, open).ok_or_else(|| ParseError::MalformedCall {
        detail: "unbalanced parentheses".into(),
    })?;
    let body = &rest[open + 1..close];

    // Closed verb set; anything else is refused with feedback.
    let verb: &'static str = match verb_name {
        "click" => "click",
        "type" => "type",
        "scroll" => "scroll",
        "drag_and_drop" => "drag_and_drop",
        "highlight_text_span" => "highlight_text_span",
        "hotkey" => "hotkey",
        "hold_and_press" => "hold_and_press",
        "wait" => "wait",
        "done" => "done",
        "fail" => "fail",
        "call_code_agent" => "call_code_agent",
        "switch_applications" => "switch_applications",
        "open" => "open",
        "save_to_knowledge" => "save_to_knowledge",
        "set_cell_values" => "set_cell_values",
        other => {
            return Err(ParseError::UnknownVerb { verb: other.to_string() });
        }
    };

    let mut args = split_args(verb, body)?;

    macro_rules! required {
        ($idx:expr, $name:literal) => {
            args.take($idx, $name)?
                .ok_or(ParseError::MissingRequired { verb, arg: $name })?
        };
    }

    let action = match verb {
        "click" => {
            let description = want_str(verb, "description", required!(0, "description"))?;
            let num_clicks = match args.take(1, "num_clicks")? {
                Some(l) => {
                    let n = want_int(verb, "num_clicks", l)?;
                    if n < 1 {
                        return Err(bad(verb, "num_clicks", "must be at least 1"));
                    }
                    n as u32
                }
                None => 1,
            };
            let button = match args.take(2, "button")? {
                Some(l) => want_button(verb, "button", l)?,
                None => MouseButton::Left,
            };
            let hold_keys = match args.take(3, "hold_keys")? {
                Some(l) => want_str_list(verb, "hold_keys", l)?,
                None => Vec::new(),
            };
            args.finish(4)?;
            AgentAction::Click { description, num_clicks, button, hold_keys }
        }
        "type" => {
            let description = match args.take(0, "description")? {
                Some(Literal::None) | None => None,
                Some(l) => Some(want_str(verb, "description", l)?),
            };
            let text = want_str(verb, "text", required!(1, "text"))?;
            let overwrite = match args.take(2, "overwrite")? {
                Some(l) => want_bool(verb, "overwrite", l)?,
                None => false,
            };
            let enter = match args.take(3, "enter")? {
                Some(l) => want_bool(verb, "enter", l)?,
                None => false,
            };
            args.finish(4)?;
            AgentAction::Type { description, text, overwrite, enter }
        }
        "scroll" => {
            let description = want_str(verb, "description", required!(0, "description"))?;
            let clicks = want_int(verb, "clicks", required!(1, "clicks"))? as i32;
            let horizontal = match args.take(2, "horizontal")? {
                Some(l) => want_bool(verb, "horizontal", l)?,
                None => false,
            };
            args.finish(3)?;
            AgentAction::Scroll { description, clicks, horizontal }
        }
        "drag_and_drop" => {
            let start_desc = want_str(verb, "start_desc", required!(0, "start_desc"))?;
            let end_desc = want_str(verb, "end_desc", required!(1, "end_desc"))?;
            let hold_keys = match args.take(2, "hold_keys")? {
                Some(l) => want_str_list(verb, "hold_keys", l)?,
                None => Vec::new(),
            };
            args.finish(3)?;
            AgentAction::DragAndDrop { start_desc, end_desc, hold_keys }
        }
        "highlight_text_span" => {
            let start_phrase = want_str(verb, "start_phrase", required!(0, "start_phrase"))?;
            let end_phrase = want_str(verb, "end_phrase", required!(1, "end_phrase"))?;
            let button = match args.take(2, "button")? {
                Some(l) => want_button(verb, "button", l)?,
                None => MouseButton::Left,
            };
            args.finish(3)?;
            AgentAction::HighlightTextSpan { start_phrase, end_phrase, button }
        }
        "hotkey" => {
            // Accept both agent.hotkey(["ctrl","t"]) and agent.hotkey("ctrl","t").
            let keys = if args.positional.len() > 1 {
                let lits = std::mem::take(&mut args.positional);
                lits.into_iter()
                    .map(|l| want_str(verb, "keys", l))
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                want_str_list(verb, "keys", required!(0, "keys"))?
            };
            args.finish(usize::MAX)?;
            if keys.is_empty() {
                return Err(bad(verb, "keys", "must not be empty"));
            }
            AgentAction::Hotkey { keys }
        }
        "hold_and_press" => {
            let hold_keys = want_str_list(verb, "hold_keys", required!(0, "hold_keys"))?;
            let press_keys = want_str_list(verb, "press_keys", required!(1, "press_keys"))?;
            args.finish(2)?;
            AgentAction::HoldAndPress { hold_keys, press_keys }
        }
        "wait" => {
            let seconds = want_f64(verb, "seconds", required!(0, "seconds"))?;
            if !(seconds >= 0.0) {
                return Err(bad(verb, "seconds", "must be non-negative"));
            }
            args.finish(1)?;
            AgentAction::Wait { seconds }
        }
        "done" => {
            args.finish(0)?;
            AgentAction::Done
        }
        "fail" => {
            args.finish(0)?;
            AgentAction::Fail
        }
        "call_code_agent" => {
            let task = match args.take(0, "task")? {
                Some(Literal::None) | None => None,
                Some(l) => Some(want_str(verb, "task", l)?),
            };
            args.finish(1)?;
            AgentAction::CallCodeAgent { task }
        }
        "switch_applications" => {
            let app_code = want_str(verb, "app_code", required!(0, "app_code"))?;
            args.finish(1)?;
            AgentAction::SwitchApplications { app_code }
        }
        "open" => {
            let app_or_filename =
                want_str(verb, "app_or_filename", required!(0, "app_or_filename"))?;
            args.finish(1)?;
            AgentAction::Open { app_or_filename }
        }
        "save_to_knowledge" => {
            let notes = want_str_list(verb, "notes", required!(0, "notes"))?;
            args.finish(1)?;
            AgentAction::SaveToKnowledge { notes }
        }
        "set_cell_values" => {
            let values = want_cell_map(verb, "values", required!(0, "values"))?;
            let app = want_str(verb, "app", required!(1, "app"))?;
            let sheet = want_str(verb, "sheet", required!(2, "sheet"))?;
            args.finish(3)?;
            AgentAction::SetCellValues { values, app, sheet }
        }
        _ => unreachable!("verb set is closed"),
    };

    Ok(action)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_code_block ──────────────────────────────────────────────────────

    #[test]
    fn code_block_simple() {
        let out = "Plan: click it.\n```python\nagent.done()\n```";
        assert_eq!(parse_code_block(out).as_deref(), Some("agent.done()"));
    }

    #[test]
    fn code_block_without_language_tag() {
        let out = "```\nagent.fail()\n```";
        assert_eq!(parse_code_block(out).as_deref(), Some("agent.fail()"));
    }

    #[test]
    fn code_block_returns_last_of_many() {
        let out = "```python\nagent.wait(1)\n```\ntext\n```python\nagent.done()\n```";
        assert_eq!(parse_code_block(out).as_deref(), Some("agent.done()"));
    }

    #[test]
    fn code_block_none_when_unfenced() {
        assert_eq!(parse_code_block("agent.done()"), None);
    }

    #[test]
    fn code_block_multiline_body() {
        let out = "```python\n# comment\nagent.click(\"ok\")\n```";
        let body = parse_code_block(out).unwrap();
        assert!(body.contains("agent.click"));
        assert!(body.contains("# comment"));
    }

    // ── extract_calls ─────────────────────────────────────────────────────────

    #[test]
    fn extract_single_call() {
        let calls = extract_calls("agent.done()");
        assert_eq!(calls, vec!["agent.done()"]);
    }

    #[test]
    fn extract_multiple_calls() {
        let calls = extract_calls("agent.wait(1)\nagent.done()");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], "agent.done()");
    }

    #[test]
    fn extract_parens_inside_strings_are_opaque() {
        let calls = extract_calls(r#"agent.type(None, "smile :) and (wave)")"#);
        assert_eq!(calls.len(), 1);
        assert!(calls[0].ends_with(r#""smile :) and (wave)")"#));
    }

    #[test]
    fn extract_nested_parens_balance() {
        let calls = extract_calls("agent.click(\"the (big) button\", 2)");
        assert_eq!(calls, vec!["agent.click(\"the (big) button\", 2)"]);
    }

    #[test]
    fn extract_skips_unbalanced_tail() {
        let calls = extract_calls("agent.click(\"oops\"");
        assert!(calls.is_empty());
    }

    #[test]
    fn extract_every_result_has_balanced_parens() {
        let code = "x agent.wait(1) garbage agent.click(\"a (b)\") agent.broken(";
        for call in extract_calls(&code) {
            let mut depth = 0i32;
            let mut quote: Option<char> = None;
            for c in call.chars() {
                match quote {
                    Some(q) if c == q => quote = None,
                    Some(_) => {}
                    None => match c {
                        '\'' | '"' => quote = Some(c),
                        '(' => depth += 1,
                        ')' => depth -= 1,
                        _ => {}
                    },
                }
            }
            assert_eq!(depth, 0, "unbalanced call returned: {call}");
            assert!(quote.is_none());
        }
    }

    // ── parse_call: verbs and defaults ────────────────────────────────────────

    #[test]
    fn unknown_verb_is_refused_with_feedback() {
        let err = parse_call("agent.fly(1)").unwrap_err();
        match &err {
            ParseError::UnknownVerb { verb } => assert_eq!(verb, "fly"),
            other => panic!("expected UnknownVerb, got {other:?}"),
        }
        assert!(!err.feedback().is_empty());
    }

    #[test]
    fn click_defaults_match_explicit_form() {
        let short = parse_call(r#"agent.click("the button")"#).unwrap();
        let long = parse_call(
            r#"agent.click("the button", num_clicks=1, button="left", hold_keys=[])"#,
        )
        .unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn click_camel_case_keywords_bind() {
        let a = parse_call(r#"agent.click("x", numClicks=2, holdKeys=["shift"])"#).unwrap();
        match a {
            AgentAction::Click { num_clicks, hold_keys, .. } => {
                assert_eq!(num_clicks, 2);
                assert_eq!(hold_keys, vec!["shift"]);
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn click_zero_clicks_is_bad_argument() {
        let err = parse_call(r#"agent.click("x", num_clicks=0)"#).unwrap_err();
        assert!(matches!(err, ParseError::BadArgument { arg: "num_clicks", .. }));
    }

    #[test]
    fn click_missing_description_is_missing_required() {
        let err = parse_call("agent.click()").unwrap_err();
        assert!(matches!(err, ParseError::MissingRequired { arg: "description", .. }));
    }

    #[test]
    fn type_defaults_match_explicit_form() {
        let short = parse_call(r#"agent.type(None, "hello")"#).unwrap();
        let long =
            parse_call(r#"agent.type(None, "hello", overwrite=False, enter=false)"#).unwrap();
        assert_eq!(short, long);
        match short {
            AgentAction::Type { description, overwrite, enter, .. } => {
                assert!(description.is_none());
                assert!(!overwrite);
                assert!(!enter);
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn type_with_target_description() {
        let a = parse_call(r#"agent.type("the text field", "résumé")"#).unwrap();
        match a {
            AgentAction::Type { description, text, .. } => {
                assert_eq!(description.as_deref(), Some("the text field"));
                assert_eq!(text, "résumé");
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn scroll_sign_carries_direction() {
        let a = parse_call(r#"agent.scroll("the list", -5)"#).unwrap();
        assert_eq!(
            a,
            AgentAction::Scroll { description: "the list".into(), clicks: -5, horizontal: false }
        );
    }

    #[test]
    fn drag_and_drop_binds_both_descriptions() {
        let a = parse_call(r#"agent.drag_and_drop("file icon", "trash can")"#).unwrap();
        match a {
            AgentAction::DragAndDrop { start_desc, end_desc, hold_keys } => {
                assert_eq!(start_desc, "file icon");
                assert_eq!(end_desc, "trash can");
                assert!(hold_keys.is_empty());
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn highlight_text_span_defaults_left_button() {
        let a = parse_call(r#"agent.highlight_text_span("The quick", "lazy dog")"#).unwrap();
        assert_eq!(
            a,
            AgentAction::HighlightTextSpan {
                start_phrase: "The quick".into(),
                end_phrase: "lazy dog".into(),
                button: MouseButton::Left,
            }
        );
    }

    #[test]
    fn hotkey_list_form() {
        let a = parse_call(r#"agent.hotkey(["cmd", "space"])"#).unwrap();
        assert_eq!(a, AgentAction::Hotkey { keys: vec!["cmd".into(), "space".into()] });
    }

    #[test]
    fn hotkey_vararg_form() {
        let a = parse_call(r#"agent.hotkey("ctrl", "shift", "t")"#).unwrap();
        assert_eq!(
            a,
            AgentAction::Hotkey { keys: vec!["ctrl".into(), "shift".into(), "t".into()] }
        );
    }

    #[test]
    fn hotkey_empty_list_is_bad_argument() {
        let err = parse_call("agent.hotkey([])").unwrap_err();
        assert!(matches!(err, ParseError::BadArgument { arg: "keys", .. }));
    }

    #[test]
    fn wait_accepts_int_and_float() {
        assert_eq!(parse_call("agent.wait(1)").unwrap(), AgentAction::Wait { seconds: 1.0 });
        assert_eq!(
            parse_call("agent.wait(1.333)").unwrap(),
            AgentAction::Wait { seconds: 1.333 }
        );
    }

    #[test]
    fn wait_rejects_negative() {
        assert!(parse_call("agent.wait(-1)").is_err());
    }

    #[test]
    fn done_and_fail_take_no_arguments() {
        assert_eq!(parse_call("agent.done()").unwrap(), AgentAction::Done);
        assert_eq!(parse_call("agent.fail()").unwrap(), AgentAction::Fail);
        assert!(parse_call("agent.done(1)").is_err());
    }

    #[test]
    fn call_code_agent_task_defaults_to_none() {
        assert_eq!(
            parse_call("agent.call_code_agent()").unwrap(),
            AgentAction::CallCodeAgent { task: None }
        );
        assert_eq!(
            parse_call(r#"agent.call_code_agent("sort the csv")"#).unwrap(),
            AgentAction::CallCodeAgent { task: Some("sort the csv".into()) }
        );
    }

    #[test]
    fn save_to_knowledge_accepts_list() {
        let a = parse_call(r#"agent.save_to_knowledge(["user is Bob", "dark mode on"])"#).unwrap();
        assert_eq!(
            a,
            AgentAction::SaveToKnowledge {
                notes: vec!["user is Bob".into(), "dark mode on".into()]
            }
        );
    }

    #[test]
    fn set_cell_values_binds_scalar_map() {
        let a = parse_call(
            r#"agent.set_cell_values({"A1": 3, "B2": "total", "C3": 1.5}, "Calc", "Sheet1")"#,
        )
        .unwrap();
        match a {
            AgentAction::SetCellValues { values, app, sheet } => {
                assert_eq!(values["A1"], CellValue::Int(3));
                assert_eq!(values["B2"], CellValue::Text("total".into()));
                assert_eq!(values["C3"], CellValue::Float(1.5));
                assert_eq!(app, "Calc");
                assert_eq!(sheet, "Sheet1");
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn single_quoted_strings_parse() {
        let a = parse_call("agent.open('Safari')").unwrap();
        assert_eq!(a, AgentAction::Open { app_or_filename: "Safari".into() });
    }

    #[test]
    fn duplicate_argument_is_rejected() {
        let err = parse_call(r#"agent.click("a", description="b")"#).unwrap_err();
        assert!(matches!(err, ParseError::BadArgument { arg: "description", .. }));
    }

    #[test]
    fn unexpected_keyword_is_malformed() {
        let err = parse_call(r#"agent.wait(1, speed="fast")"#).unwrap_err();
        assert!(matches!(err, ParseError::MalformedCall { .. }));
    }

    #[test]
    fn unterminated_string_is_malformed() {
        let err = parse_call(r#"agent.open("Safari)"#).unwrap_err();
        assert!(matches!(err, ParseError::MalformedCall { .. }));
    }
}
