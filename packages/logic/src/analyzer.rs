//! Extraction of the `use<Name>Logic` hook contract from logic-file source.
//!
//! The analyzer scans tokens rather than building a full JS AST: the hook
//! convention constrains the shapes it needs to recognize (top-level
//! `useState` destructurings and function-valued bindings), and everything
//! else is skipped by nesting depth. Analysis fails only on unbalanced
//! delimiters; unusual but well-formed code degrades to `any`-typed entries.

use crate::error::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;
use vrn_parser::tokenizer::{string_value, tokenize, Token};

type Spanned<'src> = (Token<'src>, Range<usize>);

/// Contract exposed by a logic file's hook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicContract {
    pub hook_name: String,
    pub states: Vec<LogicState>,
    pub actions: Vec<LogicAction>,
    /// Imported module paths, in encounter order
    pub dependencies: Vec<String>,
    pub exports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicState {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicAction {
    pub name: String,
    pub parameters: Vec<ActionParameter>,
    pub return_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionParameter {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

/// Analyze logic-file source text into its hook contract.
///
/// A file with no `use<Name>Logic` function yields a contract with empty
/// states/actions and an empty hook name.
pub fn analyze(source: &str) -> AnalysisResult<LogicContract> {
    let tokens = tokenize(source);
    let mut contract = LogicContract::default();

    collect_module_info(&tokens, &mut contract);

    if let Some((hook_name, body)) = find_hook(&tokens)? {
        contract.hook_name = hook_name;
        contract.states = collect_states(body);
        contract.actions = collect_actions(body, &contract.states);
    }

    Ok(contract)
}

pub fn analyze_file(path: &Path) -> AnalysisResult<LogicContract> {
    let source = std::fs::read_to_string(path)?;
    analyze(&source)
}

/// Record top-level imports and export names
fn collect_module_info(tokens: &[Spanned<'_>], contract: &mut LogicContract) {
    let mut depth = 0i32;
    let mut i = 0;

    while i < tokens.len() {
        if depth == 0 {
            match &tokens[i].0 {
                Token::Import => {
                    let mut j = i + 1;
                    while j < tokens.len() {
                        match &tokens[j].0 {
                            Token::String(raw) => {
                                contract.dependencies.push(string_value(raw));
                                break;
                            }
                            Token::Semicolon | Token::Import | Token::Export => break,
                            _ => j += 1,
                        }
                    }
                    i = j + 1;
                    continue;
                }
                Token::Export => {
                    if let Some(name) = export_name(tokens, i + 1) {
                        contract.exports.push(name);
                    }
                }
                _ => {}
            }
        }
        depth += nesting_delta(&tokens[i].0);
        i += 1;
    }
}

fn export_name(tokens: &[Spanned<'_>], i: usize) -> Option<String> {
    match tokens.get(i).map(|(t, _)| t) {
        Some(Token::Default) => Some("default".to_string()),
        Some(Token::Async) => export_name(tokens, i + 1),
        Some(Token::Function) | Some(Token::Const) | Some(Token::Let) | Some(Token::Var) => {
            match tokens.get(i + 1).map(|(t, _)| t) {
                Some(Token::Ident(name)) => Some(name.to_string()),
                _ => None,
            }
        }
        _ => None,
    }
}

fn is_hook_name(name: &str) -> bool {
    name.starts_with("use") && name.ends_with("Logic")
}

/// Find the hook declaration and return its name plus body token slice
fn find_hook<'a, 'src>(
    tokens: &'a [Spanned<'src>],
) -> AnalysisResult<Option<(String, &'a [Spanned<'src>])>> {
    let mut depth = 0i32;
    let mut i = 0;

    while i < tokens.len() {
        if depth == 0 {
            // function useXxxLogic(...) { ... }
            if let (Token::Function, Some(Token::Ident(name))) =
                (&tokens[i].0, tokens.get(i + 1).map(|(t, _)| t))
            {
                if is_hook_name(name) {
                    let name = name.to_string();
                    let body = function_body(tokens, i + 2)?;
                    return Ok(Some((name, body)));
                }
            }

            // const useXxxLogic = [async] (...) => { ... }
            if let (Token::Const, Some(Token::Ident(name)), Some(Token::Eq)) = (
                &tokens[i].0,
                tokens.get(i + 1).map(|(t, _)| t),
                tokens.get(i + 2).map(|(t, _)| t),
            ) {
                if is_hook_name(name) {
                    let name = name.to_string();
                    let mut j = i + 3;
                    if matches!(tokens.get(j).map(|(t, _)| t), Some(Token::Async)) {
                        j += 1;
                    }
                    if matches!(tokens.get(j).map(|(t, _)| t), Some(Token::LParen)) {
                        let rp = find_matching(tokens, j, Token::LParen, Token::RParen)?;
                        if matches!(tokens.get(rp + 1).map(|(t, _)| t), Some(Token::Arrow)) {
                            let body = arrow_body(tokens, rp + 2)?;
                            return Ok(Some((name, body)));
                        }
                    }
                }
            }
        }
        depth += nesting_delta(&tokens[i].0);
        i += 1;
    }

    Ok(None)
}

/// From the opening paren of a parameter list, return the brace-delimited
/// body slice that follows
fn function_body<'a, 'src>(
    tokens: &'a [Spanned<'src>],
    params_start: usize,
) -> AnalysisResult<&'a [Spanned<'src>]> {
    let pos = tokens
        .get(params_start)
        .map(|(_, span)| span.start)
        .unwrap_or(0);
    if !matches!(tokens.get(params_start).map(|(t, _)| t), Some(Token::LParen)) {
        return Err(AnalysisError::syntax(pos, "expected parameter list"));
    }
    let rp = find_matching(tokens, params_start, Token::LParen, Token::RParen)?;
    arrow_body(tokens, rp + 1)
}

fn arrow_body<'a, 'src>(
    tokens: &'a [Spanned<'src>],
    i: usize,
) -> AnalysisResult<&'a [Spanned<'src>]> {
    match tokens.get(i).map(|(t, _)| t) {
        Some(Token::LBrace) => {
            let rb = find_matching(tokens, i, Token::LBrace, Token::RBrace)?;
            Ok(&tokens[i + 1..rb])
        }
        // Expression-bodied hook: nothing statement-shaped to analyze
        _ => Ok(&tokens[i..i]),
    }
}

fn find_matching(
    tokens: &[Spanned<'_>],
    open_index: usize,
    open: Token<'static>,
    close: Token<'static>,
) -> AnalysisResult<usize> {
    let mut depth = 1i32;
    let mut i = open_index + 1;
    while i < tokens.len() {
        if tokens[i].0 == open {
            depth += 1;
        } else if tokens[i].0 == close {
            depth -= 1;
            if depth == 0 {
                return Ok(i);
            }
        }
        i += 1;
    }
    Err(AnalysisError::syntax(
        tokens[open_index].1.start,
        format!("unbalanced {:?}", open),
    ))
}

fn nesting_delta(token: &Token<'_>) -> i32 {
    match token {
        Token::LBrace | Token::LParen | Token::LBracket => 1,
        Token::RBrace | Token::RParen | Token::RBracket => -1,
        _ => 0,
    }
}

/// First pass: `const [x, setX] = useState(initial)` declarations at the top
/// level of the hook body
fn collect_states(body: &[Spanned<'_>]) -> Vec<LogicState> {
    let mut states = Vec::new();
    let mut depth = 0i32;
    let mut i = 0;

    while i < body.len() {
        if depth == 0 {
            if let Some((state, next)) = match_use_state(body, i) {
                states.push(state);
                i = next;
                continue;
            }
        }
        depth += nesting_delta(&body[i].0);
        i += 1;
    }

    states
}

fn match_use_state(body: &[Spanned<'_>], i: usize) -> Option<(LogicState, usize)> {
    let tok = |offset: usize| body.get(i + offset).map(|(t, _)| t);

    if !matches!(tok(0), Some(Token::Const)) || !matches!(tok(1), Some(Token::LBracket)) {
        return None;
    }
    let name = match tok(2) {
        Some(Token::Ident(name)) => name.to_string(),
        _ => return None,
    };
    if !matches!(tok(3), Some(Token::Comma)) {
        return None;
    }
    if !matches!(tok(4), Some(Token::Ident(_))) {
        return None;
    }
    if !matches!(tok(5), Some(Token::RBracket))
        || !matches!(tok(6), Some(Token::Eq))
        || !matches!(tok(7), Some(Token::Ident("useState")))
        || !matches!(tok(8), Some(Token::LParen))
    {
        return None;
    }

    let close = find_matching(body, i + 8, Token::LParen, Token::RParen).ok()?;
    let (ty, default_value) = infer_literal(&body[i + 9..close]);

    Some((
        LogicState {
            name,
            ty,
            default_value,
            description: preceding_comment(body, i),
        },
        close + 1,
    ))
}

/// Second pass: top-level function-valued bindings, minus recognized state
/// setters (`set` + capitalized state name)
fn collect_actions(body: &[Spanned<'_>], states: &[LogicState]) -> Vec<LogicAction> {
    let setters: HashSet<String> = states
        .iter()
        .map(|state| format!("set{}", capitalize(&state.name)))
        .collect();

    let mut actions = Vec::new();
    let mut depth = 0i32;
    let mut i = 0;

    while i < body.len() {
        if depth == 0 {
            if let Some((action, next)) = match_action(body, i) {
                if !setters.contains(&action.name) {
                    actions.push(action);
                }
                i = next;
                continue;
            }
        }
        depth += nesting_delta(&body[i].0);
        i += 1;
    }

    actions
}

fn match_action(body: &[Spanned<'_>], i: usize) -> Option<(LogicAction, usize)> {
    let tok = |index: usize| body.get(index).map(|(t, _)| t);
    let description = preceding_comment(body, i);

    // const name = [async] <function value>
    if matches!(tok(i), Some(Token::Const) | Some(Token::Let) | Some(Token::Var)) {
        let name = match tok(i + 1) {
            Some(Token::Ident(name)) => name.to_string(),
            _ => return None,
        };
        if !matches!(tok(i + 2), Some(Token::Eq)) {
            return None;
        }

        let mut j = i + 3;
        let is_async = matches!(tok(j), Some(Token::Async));
        if is_async {
            j += 1;
        }

        match tok(j) {
            // (params) => ...
            Some(Token::LParen) => {
                let rp = find_matching(body, j, Token::LParen, Token::RParen).ok()?;
                if !matches!(tok(rp + 1), Some(Token::Arrow)) {
                    return None;
                }
                let parameters = parse_parameters(&body[j + 1..rp]);
                return Some((
                    action(name, parameters, is_async, description),
                    rp + 2,
                ));
            }
            // single-param arrow: x => ...
            Some(Token::Ident(param)) if matches!(tok(j + 1), Some(Token::Arrow)) => {
                let parameters = vec![ActionParameter {
                    name: param.to_string(),
                    ty: "any".to_string(),
                    optional: false,
                }];
                return Some((action(name, parameters, is_async, description), j + 2));
            }
            // function expression
            Some(Token::Function) => {
                let mut k = j + 1;
                if matches!(tok(k), Some(Token::Ident(_))) {
                    k += 1;
                }
                if !matches!(tok(k), Some(Token::LParen)) {
                    return None;
                }
                let rp = find_matching(body, k, Token::LParen, Token::RParen).ok()?;
                let parameters = parse_parameters(&body[k + 1..rp]);
                return Some((action(name, parameters, is_async, description), rp + 1));
            }
            _ => return None,
        }
    }

    // [async] function name(params) { ... }
    let mut j = i;
    let is_async = matches!(tok(j), Some(Token::Async));
    if is_async {
        j += 1;
    }
    if !matches!(tok(j), Some(Token::Function)) {
        return None;
    }
    let name = match tok(j + 1) {
        Some(Token::Ident(name)) => name.to_string(),
        _ => return None,
    };
    if !matches!(tok(j + 2), Some(Token::LParen)) {
        return None;
    }
    let rp = find_matching(body, j + 2, Token::LParen, Token::RParen).ok()?;
    let parameters = parse_parameters(&body[j + 3..rp]);
    Some((action(name, parameters, is_async, description), rp + 1))
}

fn action(
    name: String,
    parameters: Vec<ActionParameter>,
    is_async: bool,
    description: Option<String>,
) -> LogicAction {
    LogicAction {
        name,
        parameters,
        return_type: if is_async {
            "Promise<void>".to_string()
        } else {
            "void".to_string()
        },
        description,
    }
}

/// Best-effort parameter extraction: untyped parameters are `any`,
/// default-valued parameters are optional and typed from their default
fn parse_parameters(tokens: &[Spanned<'_>]) -> Vec<ActionParameter> {
    split_top_level(tokens)
        .into_iter()
        .map(|part| match part.first().map(|(t, _)| t) {
            Some(Token::Ident(name)) => {
                let name = name.to_string();
                match part.get(1).map(|(t, _)| t) {
                    Some(Token::Eq) => {
                        let (ty, _) = infer_literal(&part[2..]);
                        ActionParameter {
                            name,
                            ty,
                            optional: true,
                        }
                    }
                    _ => ActionParameter {
                        name,
                        ty: "any".to_string(),
                        optional: false,
                    },
                }
            }
            _ => ActionParameter {
                name: "unknown".to_string(),
                ty: "any".to_string(),
                optional: false,
            },
        })
        .collect()
}

/// Split a token slice on commas outside any nesting
fn split_top_level<'a, 'src>(tokens: &'a [Spanned<'src>]) -> Vec<&'a [Spanned<'src>]> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, (token, _)) in tokens.iter().enumerate() {
        if depth == 0 && *token == Token::Comma {
            if i > start {
                parts.push(&tokens[start..i]);
            }
            start = i + 1;
            continue;
        }
        depth += nesting_delta(token);
    }
    if start < tokens.len() {
        parts.push(&tokens[start..]);
    }
    parts
}

/// Infer a (type, value) pair from a literal initializer. Non-literal
/// initializers are `any` with no extractable value.
fn infer_literal(tokens: &[Spanned<'_>]) -> (String, Option<Value>) {
    match tokens {
        [] => ("any".to_string(), None),
        [(Token::String(raw), _)] => (
            "string".to_string(),
            Some(Value::String(string_value(raw))),
        ),
        [(Token::Number(n), _)] => ("number".to_string(), number_value(n, false)),
        [(Token::Minus, _), (Token::Number(n), _)] => {
            ("number".to_string(), number_value(n, true))
        }
        [(Token::True, _)] => ("boolean".to_string(), Some(Value::Bool(true))),
        [(Token::False, _)] => ("boolean".to_string(), Some(Value::Bool(false))),
        [(Token::Null, _)] => ("null".to_string(), Some(Value::Null)),
        _ => match tokens.first().map(|(t, _)| t) {
            Some(Token::LBracket) => infer_array(tokens),
            Some(Token::LBrace) => ("object".to_string(), None),
            _ => ("any".to_string(), None),
        },
    }
}

fn infer_array(tokens: &[Spanned<'_>]) -> (String, Option<Value>) {
    let close = match find_matching(tokens, 0, Token::LBracket, Token::RBracket) {
        Ok(close) if close == tokens.len() - 1 => close,
        _ => return ("any".to_string(), None),
    };

    let elements = split_top_level(&tokens[1..close]);
    if elements.is_empty() {
        return ("any[]".to_string(), Some(Value::Array(Vec::new())));
    }

    let mut values = Vec::with_capacity(elements.len());
    let mut element_ty = String::new();
    for (i, element) in elements.iter().enumerate() {
        let (ty, value) = infer_literal(element);
        if i == 0 {
            element_ty = ty;
        }
        values.push(value.unwrap_or(Value::Null));
    }

    (format!("{}[]", element_ty), Some(Value::Array(values)))
}

fn number_value(text: &str, negative: bool) -> Option<Value> {
    if text.contains('.') {
        let parsed: f64 = text.parse().ok()?;
        let value = if negative { -parsed } else { parsed };
        serde_json::Number::from_f64(value).map(Value::Number)
    } else {
        let parsed: i64 = text.parse().ok()?;
        let value = if negative { -parsed } else { parsed };
        Some(Value::Number(value.into()))
    }
}

fn preceding_comment(body: &[Spanned<'_>], i: usize) -> Option<String> {
    if i == 0 {
        return None;
    }
    match &body[i - 1].0 {
        Token::LineComment(text) => {
            Some(text.trim_start_matches('/').trim().to_string())
        }
        Token::BlockComment(text) => Some(clean_block_comment(text)),
        _ => None,
    }
}

fn clean_block_comment(text: &str) -> String {
    let inner = text
        .trim()
        .trim_start_matches('/')
        .trim_start_matches('*')
        .trim_end_matches('/')
        .trim_end_matches('*');

    inner
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
