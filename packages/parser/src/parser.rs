use crate::annotations;
use crate::ast::{Bindings, DocumentNode, NodeKind, NodeMetadata, PropEntry, PropValue};
use crate::error::{ParseError, ParseResult};
use crate::id_generator::IdGenerator;
use crate::tokenizer::{line_col, string_value, tokenize, Token};
use std::ops::Range;
use std::sync::Arc;

/// Result of parsing a view file
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedViewFile {
    pub tree: DocumentNode,
    pub bindings: Bindings,
    /// Imported module paths, in encounter order
    pub imports: Vec<String>,
    pub exports: Vec<String>,
    /// Name of the default-exported view function, when it has one
    pub component_name: Option<String>,
    /// Original source text
    pub raw: String,
}

/// Parse view-file source into a document tree plus extracted bindings
pub fn parse(source: &str) -> ParseResult<ParsedViewFile> {
    Parser::new(source).parse_view_file()
}

/// Parser for the constrained JSX subset used by view files
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
    id_generator: IdGenerator,
    component_name: Option<String>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            tokens: tokenize(source),
            pos: 0,
            id_generator: IdGenerator::new(),
            component_name: None,
        }
    }

    pub fn parse_view_file(&mut self) -> ParseResult<ParsedViewFile> {
        let mut imports = Vec::new();
        let mut exports = Vec::new();
        let mut bindings = Bindings::default();
        let mut tree: Option<DocumentNode> = None;

        while !self.is_at_end() {
            match self.peek() {
                Some((Token::Import, _)) => {
                    if let Some(path) = self.parse_import() {
                        imports.push(path);
                    }
                }
                Some((Token::BlockComment(text), _)) => {
                    if annotations::is_bindings_comment(text) {
                        bindings = annotations::parse_bindings_comment(text);
                    }
                    self.advance();
                }
                Some((Token::Export, _)) => {
                    self.advance();
                    if self.match_token(Token::Default) {
                        exports.push("default".to_string());
                        if tree.is_none() {
                            tree = Some(self.parse_default_export()?);
                        }
                    } else {
                        if let Some(name) = self.named_export_name() {
                            exports.push(name);
                        }
                    }
                }
                // Module-level code we don't model (style sheets, helpers)
                _ => {
                    self.advance();
                }
            }
        }

        let tree = tree.unwrap_or_else(|| DocumentNode::empty(self.id_generator.new_id()));

        Ok(ParsedViewFile {
            tree,
            bindings,
            imports,
            exports,
            component_name: self.component_name.take(),
            raw: self.source.to_string(),
        })
    }

    /// Consume an import statement and return its module path
    fn parse_import(&mut self) -> Option<String> {
        self.advance(); // consume 'import'

        let mut path = None;
        while let Some((token, _)) = self.peek() {
            match token {
                Token::String(raw) => {
                    path = Some(string_value(raw));
                    self.advance();
                    break;
                }
                Token::Semicolon | Token::Import | Token::Export => break,
                _ => {
                    self.advance();
                }
            }
        }
        self.match_token(Token::Semicolon);
        path
    }

    /// Record the name of an `export function f` / `export const f` binding
    fn named_export_name(&mut self) -> Option<String> {
        match self.peek() {
            Some((Token::Function, _)) => {
                self.advance();
                self.expect_ident_opt()
            }
            Some((Token::Const, _)) | Some((Token::Let, _)) | Some((Token::Var, _)) => {
                self.advance();
                self.expect_ident_opt()
            }
            Some((Token::Async, _)) => {
                self.advance();
                if self.match_token(Token::Function) {
                    self.expect_ident_opt()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Parse the declaration after `export default` into a document tree.
    ///
    /// Anything that is not a function whose return value is element-shaped
    /// yields a single `Empty` node; the document is valid but has no
    /// visible content yet.
    fn parse_default_export(&mut self) -> ParseResult<DocumentNode> {
        self.match_token(Token::Async);

        match self.peek() {
            Some((Token::Function, _)) => {
                self.advance();
                self.component_name = self.expect_ident_opt();
                self.skip_params()?;
                self.expect(Token::LBrace)?;
                self.parse_body_return()
            }
            Some((Token::LParen, _)) => {
                // Possible arrow: (params) => body
                self.skip_params()?;
                if self.match_token(Token::Arrow) {
                    self.parse_arrow_body()
                } else {
                    Ok(self.empty_node())
                }
            }
            _ => {
                // Identifier or other expression reference; not resolvable
                // statically, so the tree has no visible content
                self.advance();
                Ok(self.empty_node())
            }
        }
    }

    /// Skip a parenthesized parameter list, tracking nested parens
    fn skip_params(&mut self) -> ParseResult<()> {
        self.expect(Token::LParen)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                Some((Token::LParen, _)) => depth += 1,
                Some((Token::RParen, _)) => depth -= 1,
                None => return Err(ParseError::unexpected_eof(self.source.len())),
                _ => {}
            }
            self.advance();
        }
        Ok(())
    }

    /// Scan a function body (opening brace already consumed) for its return
    /// expression, then skip to the end of the body
    fn parse_body_return(&mut self) -> ParseResult<DocumentNode> {
        let mut depth = 1usize;
        let mut tree: Option<DocumentNode> = None;

        while depth > 0 {
            match self.peek() {
                Some((Token::LBrace, _)) => {
                    depth += 1;
                    self.advance();
                }
                Some((Token::RBrace, _)) => {
                    depth -= 1;
                    self.advance();
                }
                Some((Token::Return, _)) if depth == 1 && tree.is_none() => {
                    self.advance();
                    tree = Some(self.parse_return_expression()?);
                }
                None => return Err(ParseError::unexpected_eof(self.source.len())),
                _ => {
                    self.advance();
                }
            }
        }

        Ok(tree.unwrap_or_else(|| self.empty_node()))
    }

    /// Parse an arrow function body: either a block with a return statement
    /// or a bare (possibly parenthesized) expression
    fn parse_arrow_body(&mut self) -> ParseResult<DocumentNode> {
        match self.peek() {
            Some((Token::LBrace, _)) => {
                self.advance();
                self.parse_body_return()
            }
            _ => self.parse_return_expression(),
        }
    }

    /// Parse the expression following `return` (or an arrow body): a JSX
    /// element or fragment, optionally wrapped in parentheses
    fn parse_return_expression(&mut self) -> ParseResult<DocumentNode> {
        let parenthesized = self.match_token(Token::LParen);

        let node = match self.peek() {
            Some((Token::Lt, _)) => self.parse_jsx_node()?,
            _ => {
                // Return value is not element-shaped
                if parenthesized {
                    self.skip_to_matching_paren()?;
                    return Ok(self.empty_node());
                }
                self.empty_node()
            }
        };

        if parenthesized {
            self.expect(Token::RParen)?;
        }
        Ok(node)
    }

    fn skip_to_matching_paren(&mut self) -> ParseResult<()> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                Some((Token::LParen, _)) => depth += 1,
                Some((Token::RParen, _)) => depth -= 1,
                None => return Err(ParseError::unexpected_eof(self.source.len())),
                _ => {}
            }
            self.advance();
        }
        Ok(())
    }

    /// Parse a JSX element or fragment starting at `<`
    fn parse_jsx_node(&mut self) -> ParseResult<DocumentNode> {
        let (_, open_span) = self.expect(Token::Lt)?;
        let (line, column) = line_col(self.source, open_span.start);

        // Fragment: <>children</>
        if self.match_token(Token::Gt) {
            let children = self.parse_children()?;
            self.expect(Token::Lt)?;
            self.expect(Token::Slash)?;
            self.expect(Token::Gt)?;
            return Ok(self.fragment_node(children, line, column));
        }

        let name = self.parse_dotted_name()?;
        let props = self.parse_attributes()?;

        // Self-closing element
        if self.match_token(Token::Slash) {
            self.expect(Token::Gt)?;
            return Ok(self.element_node(name, props, Vec::new(), line, column));
        }

        self.expect(Token::Gt)?;
        let children = self.parse_children()?;

        let (_, close_span) = self.expect(Token::Lt)?;
        self.expect(Token::Slash)?;
        let closing = self.parse_dotted_name()?;
        if closing != name {
            return Err(ParseError::MismatchedClosingTag {
                pos: close_span.start,
                expected: name,
                found: closing,
            });
        }
        self.expect(Token::Gt)?;

        Ok(self.element_node(name, props, children, line, column))
    }

    /// Parse children until the closing `</` is reached. Nodes reducing to
    /// `Empty` (expression children, text runs) are dropped.
    fn parse_children(&mut self) -> ParseResult<Vec<Arc<DocumentNode>>> {
        let mut children = Vec::new();

        loop {
            match (self.peek(), self.peek_ahead(1)) {
                (Some((Token::Lt, _)), Some((Token::Slash, _))) => break,
                (Some((Token::Lt, _)), _) => {
                    let child = self.parse_jsx_node()?;
                    if child.kind != NodeKind::Empty {
                        children.push(Arc::new(child));
                    }
                }
                (Some((Token::LBrace, _)), _) => {
                    // Expression child; contributes nothing observable
                    self.skip_expression_container()?;
                }
                (None, _) => return Err(ParseError::unexpected_eof(self.source.len())),
                // Text runs and stray tokens between tags
                _ => {
                    self.advance();
                }
            }
        }

        Ok(children)
    }

    fn skip_expression_container(&mut self) -> ParseResult<()> {
        let (_, span) = self.expect(Token::LBrace)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                Some((Token::LBrace, _)) => depth += 1,
                Some((Token::RBrace, _)) => depth -= 1,
                None => return Err(ParseError::UnterminatedExpression { pos: span.start }),
                _ => {}
            }
            self.advance();
        }
        Ok(())
    }

    /// Parse a possibly dotted tag name like `Namespace.Member`
    fn parse_dotted_name(&mut self) -> ParseResult<String> {
        let mut name = self.expect_ident()?;
        while self.match_token(Token::Dot) {
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Ok(name)
    }

    /// Parse JSX attributes until `/` or `>`
    fn parse_attributes(&mut self) -> ParseResult<Vec<PropEntry>> {
        let mut props = Vec::new();

        loop {
            match self.peek() {
                Some((Token::Slash, _)) | Some((Token::Gt, _)) => break,
                Some((Token::Ident(name), _)) => {
                    let name = name.to_string();
                    self.advance();

                    let value = if self.match_token(Token::Eq) {
                        self.parse_attribute_value()?
                    } else {
                        PropValue::BooleanShorthand
                    };

                    props.push(PropEntry { name, value });
                }
                Some((token, span)) => {
                    return Err(ParseError::unexpected_token(
                        span.start,
                        "attribute name, '/' or '>'",
                        format!("{}", token),
                    ));
                }
                None => return Err(ParseError::unexpected_eof(self.source.len())),
            }
        }

        Ok(props)
    }

    /// Classify an attribute value into a `PropValue`
    fn parse_attribute_value(&mut self) -> ParseResult<PropValue> {
        match self.peek() {
            Some((Token::String(raw), _)) => {
                let value = string_value(raw);
                self.advance();
                // Strings shaped like `state.x` / `actions.x` are bindings
                // written in string form
                match binding_path_from_str(&value) {
                    Some(path) => Ok(PropValue::BindingExpression { path }),
                    None => Ok(PropValue::StringLiteral { value }),
                }
            }
            Some((Token::LBrace, _)) => self.parse_expression_value(),
            Some((token, span)) => Err(ParseError::unexpected_token(
                span.start,
                "string or expression",
                format!("{}", token),
            )),
            None => Err(ParseError::unexpected_eof(self.source.len())),
        }
    }

    /// Parse `{expression}` and classify the contained expression
    fn parse_expression_value(&mut self) -> ParseResult<PropValue> {
        let (_, open_span) = self.expect(Token::LBrace)?;
        let start_index = self.pos;

        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                Some((Token::LBrace, _)) => depth += 1,
                Some((Token::RBrace, _)) => depth -= 1,
                None => {
                    return Err(ParseError::UnterminatedExpression {
                        pos: open_span.start,
                    })
                }
                _ => {}
            }
            if depth > 0 {
                self.advance();
            }
        }

        let end_index = self.pos;
        let (_, close_span) = self.expect(Token::RBrace)?;

        let raw = self.source[open_span.end..close_span.start].trim().to_string();
        Ok(classify_expression(
            &self.tokens[start_index..end_index],
            raw,
        ))
    }

    fn element_node(
        &mut self,
        name: String,
        props: Vec<PropEntry>,
        children: Vec<Arc<DocumentNode>>,
        line: u32,
        column: u32,
    ) -> DocumentNode {
        let bindings = DocumentNode::compute_bindings(&props);
        DocumentNode {
            id: self.id_generator.new_id(),
            kind: NodeKind::Element,
            name,
            props,
            children,
            bindings,
            metadata: NodeMetadata {
                line,
                column,
                editable: true,
            },
        }
    }

    fn fragment_node(
        &mut self,
        children: Vec<Arc<DocumentNode>>,
        line: u32,
        column: u32,
    ) -> DocumentNode {
        DocumentNode {
            id: self.id_generator.new_id(),
            kind: NodeKind::Fragment,
            name: String::new(),
            props: Vec::new(),
            children,
            bindings: Default::default(),
            metadata: NodeMetadata {
                line,
                column,
                editable: true,
            },
        }
    }

    fn empty_node(&mut self) -> DocumentNode {
        DocumentNode::empty(self.id_generator.new_id())
    }

    // Token cursor helpers

    fn peek(&self) -> Option<&(Token<'src>, Range<usize>)> {
        self.tokens.get(self.pos)
    }

    fn peek_ahead(&self, n: usize) -> Option<&(Token<'src>, Range<usize>)> {
        self.tokens.get(self.pos + n)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn match_token(&mut self, expected: Token<'src>) -> bool {
        if let Some((token, _)) = self.peek() {
            if *token == expected {
                self.advance();
                return true;
            }
        }
        false
    }

    fn expect(&mut self, expected: Token<'src>) -> ParseResult<(Token<'src>, Range<usize>)> {
        match self.peek() {
            Some((token, span)) if *token == expected => {
                let result = (token.clone(), span.clone());
                self.advance();
                Ok(result)
            }
            Some((token, span)) => Err(ParseError::unexpected_token(
                span.start,
                format!("{:?}", expected),
                format!("{}", token),
            )),
            None => Err(ParseError::unexpected_eof(self.source.len())),
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some((Token::Ident(name), _)) => {
                let name = name.to_string();
                self.advance();
                Ok(name)
            }
            Some((token, span)) => Err(ParseError::unexpected_token(
                span.start,
                "identifier",
                format!("{}", token),
            )),
            None => Err(ParseError::unexpected_eof(self.source.len())),
        }
    }

    fn expect_ident_opt(&mut self) -> Option<String> {
        if let Some((Token::Ident(name), _)) = self.peek() {
            let name = name.to_string();
            self.advance();
            return Some(name);
        }
        None
    }
}

/// Classify an expression between attribute braces.
///
/// Classification order: literal string/number/boolean/null, then
/// `state.*` / `actions.*` member paths, then raw fallback.
fn classify_expression(tokens: &[(Token<'_>, Range<usize>)], raw: String) -> PropValue {
    match tokens {
        [(Token::String(s), _)] => PropValue::StringLiteral {
            value: string_value(s),
        },
        [(Token::Number(n), _)] => match n.parse::<f64>() {
            Ok(value) => PropValue::NumberLiteral { value },
            Err(_) => PropValue::RawExpression { source: raw },
        },
        [(Token::Minus, _), (Token::Number(n), _)] => match n.parse::<f64>() {
            Ok(value) => PropValue::NumberLiteral { value: -value },
            Err(_) => PropValue::RawExpression { source: raw },
        },
        [(Token::True, _)] => PropValue::BooleanLiteral { value: true },
        [(Token::False, _)] => PropValue::BooleanLiteral { value: false },
        [(Token::Null, _)] => PropValue::NullLiteral,
        _ => match binding_path(tokens) {
            Some(path) => PropValue::BindingExpression { path },
            None => PropValue::RawExpression { source: raw },
        },
    }
}

/// Recognize `state.<path>` / `actions.<path>` member expressions
fn binding_path(tokens: &[(Token<'_>, Range<usize>)]) -> Option<String> {
    if tokens.len() < 3 || tokens.len() % 2 == 0 {
        return None;
    }

    let mut parts = Vec::with_capacity(tokens.len() / 2 + 1);
    for (i, (token, _)) in tokens.iter().enumerate() {
        if i % 2 == 0 {
            match token {
                Token::Ident(name) => parts.push(*name),
                _ => return None,
            }
        } else if *token != Token::Dot {
            return None;
        }
    }

    match parts.first() {
        Some(&"state") | Some(&"actions") => Some(parts.join(".")),
        _ => None,
    }
}

/// Recognize binding paths written in string form, e.g. `"actions.handleClick"`
fn binding_path_from_str(value: &str) -> Option<String> {
    let parts: Vec<&str> = value.split('.').collect();
    if parts.len() < 2 {
        return None;
    }
    if parts.first() != Some(&"state") && parts.first() != Some(&"actions") {
        return None;
    }
    if !parts.iter().all(|part| is_identifier(part)) {
        return None;
    }
    Some(value.to_string())
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(ch) if ch.is_ascii_alphabetic() || ch == '_' || ch == '$' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
}
