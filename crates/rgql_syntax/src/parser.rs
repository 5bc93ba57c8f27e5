//! Recursive descent parser for executable GraphQL documents.

use crate::ast::*;
use crate::error::{codes, SyntaxError, SyntaxErrors};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parser for operation documents.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    /// End offset of the last consumed token.
    last_end: u32,
    errors: Vec<SyntaxError>,
}

/// Result of parsing.
#[derive(Debug)]
pub struct ParseResult {
    pub document: Document,
    pub errors: Vec<SyntaxError>,
}

impl ParseResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the document if parsing produced no errors.
    pub fn into_result(self) -> Result<Document, SyntaxErrors> {
        if self.errors.is_empty() {
            Ok(self.document)
        } else {
            Err(SyntaxErrors {
                errors: self.errors,
            })
        }
    }
}

/// Parses a source string into a document.
pub fn parse(source: &str) -> ParseResult {
    let mut parser = Parser::new(source);
    let document = parser.parse_document();
    ParseResult {
        document,
        errors: parser.errors,
    }
}

impl<'a> Parser<'a> {
    /// Creates a new parser.
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            last_end: 0,
            errors: Vec::new(),
        }
    }

    #[inline]
    fn at(&self) -> TokenKind {
        self.current.kind
    }

    #[inline]
    fn at_kind(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn advance(&mut self) {
        if self.at_kind(TokenKind::Error) {
            self.errors.push(SyntaxError::new(
                codes::INVALID_TOKEN,
                self.current.span,
                format!("invalid token `{}`", self.current_text()),
            ));
        }
        self.last_end = self.current.span.end;
        self.current = self.lexer.next_token();
    }

    /// Consumes the given kind or reports an error.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.at_kind(kind) {
            self.advance();
            true
        } else {
            self.error_expected(&kind.to_string());
            false
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at_kind(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current_text(&self) -> &'a str {
        self.lexer.span_text(self.current.span)
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.last_end.max(start))
    }

    fn error(&mut self, code: &'static str, message: impl Into<String>) {
        self.errors
            .push(SyntaxError::new(code, self.current.span, message));
    }

    fn error_expected(&mut self, expected: &str) {
        let found = self.at();
        self.errors.push(
            SyntaxError::new(
                codes::UNEXPECTED_TOKEN,
                self.current.span,
                format!("expected {expected}, found {found}"),
            )
            .with_label(format!("expected {expected}")),
        );
    }

    /// Parses a document.
    pub fn parse_document(&mut self) -> Document {
        let start = self.current.span.start;
        let mut definitions = Vec::new();

        if self.at_kind(TokenKind::Eof) {
            self.error(codes::INVALID_SYNTAX, "document does not contain any definitions");
        }

        while !self.at_kind(TokenKind::Eof) {
            let before = self.lexer.pos();
            match self.parse_definition() {
                Some(def) => definitions.push(def),
                None => self.recover_to_definition(),
            }
            if self.lexer.pos() == before && !self.at_kind(TokenKind::Eof) {
                self.advance();
            }
        }

        Document {
            definitions,
            span: self.span_from(start),
        }
    }

    /// Skips tokens until something that can start a definition.
    fn recover_to_definition(&mut self) {
        while !matches!(
            self.at(),
            TokenKind::Eof
                | TokenKind::Query
                | TokenKind::Mutation
                | TokenKind::Subscription
                | TokenKind::Fragment
        ) {
            self.advance();
        }
    }

    fn parse_definition(&mut self) -> Option<Definition> {
        match self.at() {
            TokenKind::Query | TokenKind::Mutation | TokenKind::Subscription | TokenKind::LBrace => {
                Some(Definition::Operation(self.parse_operation()))
            }
            TokenKind::Fragment => Some(Definition::Fragment(self.parse_fragment_definition())),
            _ => {
                self.error_expected("operation or fragment definition");
                None
            }
        }
    }

    fn parse_name(&mut self) -> Name {
        let span = self.current.span;
        if self.at_kind(TokenKind::Name) || self.at().is_keyword() {
            let value = self.current_text().to_string();
            self.advance();
            Name::new(value, span)
        } else {
            self.error_expected("name");
            Name::new(String::new(), span)
        }
    }

    fn parse_operation(&mut self) -> OperationDefinition {
        let start = self.current.span.start;

        if self.at_kind(TokenKind::LBrace) {
            let selection_set = self.parse_selection_set();
            return OperationDefinition {
                operation: OperationType::Query,
                name: None,
                variables: Vec::new(),
                directives: Vec::new(),
                selection_set,
                span: self.span_from(start),
            };
        }

        let operation = match self.at() {
            TokenKind::Mutation => OperationType::Mutation,
            TokenKind::Subscription => OperationType::Subscription,
            _ => OperationType::Query,
        };
        self.advance();

        let name = if self.at_kind(TokenKind::Name) || self.at().is_keyword() {
            Some(self.parse_name())
        } else {
            None
        };

        let variables = if self.eat(TokenKind::LParen) {
            let vars = self.parse_variable_definitions();
            self.expect(TokenKind::RParen);
            vars
        } else {
            Vec::new()
        };

        let directives = self.parse_directives(false);
        let selection_set = self.parse_selection_set();

        OperationDefinition {
            operation,
            name,
            variables,
            directives,
            selection_set,
            span: self.span_from(start),
        }
    }

    fn parse_variable_definitions(&mut self) -> Vec<VariableDefinition> {
        let mut vars = Vec::new();
        while !self.at_kind(TokenKind::RParen) && !self.at_kind(TokenKind::Eof) {
            let before = self.lexer.pos();
            vars.push(self.parse_variable_definition());
            if self.lexer.pos() == before {
                self.advance();
            }
        }
        vars
    }

    fn parse_variable_definition(&mut self) -> VariableDefinition {
        let start = self.current.span.start;
        self.expect(TokenKind::Dollar);
        let name = self.parse_name();
        self.expect(TokenKind::Colon);
        let ty = self.parse_type();

        let default_value = if self.eat(TokenKind::Eq) {
            Some(self.parse_value(true))
        } else {
            None
        };
        // Variable directives are accepted and ignored.
        self.parse_directives(true);

        VariableDefinition {
            name,
            ty,
            default_value,
            span: self.span_from(start),
        }
    }

    fn parse_type(&mut self) -> Type {
        let start = self.current.span.start;
        let base = if self.eat(TokenKind::LBracket) {
            let inner = self.parse_type();
            self.expect(TokenKind::RBracket);
            Type::List(Box::new(inner), self.span_from(start))
        } else {
            Type::Named(self.parse_name())
        };

        if self.eat(TokenKind::Bang) {
            Type::NonNull(Box::new(base), self.span_from(start))
        } else {
            base
        }
    }

    fn parse_fragment_definition(&mut self) -> FragmentDefinition {
        let start = self.current.span.start;
        self.advance(); // fragment

        let name = self.parse_name();
        if name.value == "on" {
            self.errors.push(SyntaxError::new(
                codes::INVALID_SYNTAX,
                name.span,
                "fragment cannot be named `on`",
            ));
        }
        self.expect(TokenKind::On);
        let type_condition = self.parse_name();
        let directives = self.parse_directives(false);
        let selection_set = self.parse_selection_set();

        FragmentDefinition {
            name,
            type_condition,
            directives,
            selection_set,
            span: self.span_from(start),
        }
    }

    fn parse_selection_set(&mut self) -> SelectionSet {
        let start = self.current.span.start;
        if !self.expect(TokenKind::LBrace) {
            return SelectionSet {
                selections: Vec::new(),
                span: Span::new(start, start),
            };
        }

        let mut selections = Vec::new();
        while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
            let before = self.lexer.pos();
            selections.push(self.parse_selection());
            if self.lexer.pos() == before {
                self.advance();
            }
        }
        self.expect(TokenKind::RBrace);

        if selections.is_empty() {
            self.errors.push(SyntaxError::new(
                codes::INVALID_SYNTAX,
                self.span_from(start),
                "selection set cannot be empty",
            ));
        }

        SelectionSet {
            selections,
            span: self.span_from(start),
        }
    }

    fn parse_selection(&mut self) -> Selection {
        let start = self.current.span.start;
        if !self.eat(TokenKind::Spread) {
            return Selection::Field(self.parse_field());
        }

        if self.eat(TokenKind::On) {
            let type_condition = Some(self.parse_name());
            let directives = self.parse_directives(false);
            let selection_set = self.parse_selection_set();
            Selection::InlineFragment(InlineFragment {
                type_condition,
                directives,
                selection_set,
                span: self.span_from(start),
            })
        } else if self.at_kind(TokenKind::LBrace) || self.at_kind(TokenKind::At) {
            let directives = self.parse_directives(false);
            let selection_set = self.parse_selection_set();
            Selection::InlineFragment(InlineFragment {
                type_condition: None,
                directives,
                selection_set,
                span: self.span_from(start),
            })
        } else {
            let name = self.parse_name();
            let directives = self.parse_directives(false);
            Selection::FragmentSpread(FragmentSpread {
                name,
                directives,
                span: self.span_from(start),
            })
        }
    }

    fn parse_field(&mut self) -> Field {
        let start = self.current.span.start;

        let first = self.parse_name();
        let (alias, name) = if self.eat(TokenKind::Colon) {
            (Some(first), self.parse_name())
        } else {
            (None, first)
        };

        let arguments = self.parse_arguments(false);
        let directives = self.parse_directives(false);
        let selection_set = if self.at_kind(TokenKind::LBrace) {
            Some(self.parse_selection_set())
        } else {
            None
        };

        Field {
            alias,
            name,
            arguments,
            directives,
            selection_set,
            span: self.span_from(start),
        }
    }

    fn parse_arguments(&mut self, is_const: bool) -> Vec<Argument> {
        let mut args = Vec::new();
        if !self.eat(TokenKind::LParen) {
            return args;
        }
        while !self.at_kind(TokenKind::RParen) && !self.at_kind(TokenKind::Eof) {
            let before = self.lexer.pos();
            let start = self.current.span.start;
            let name = self.parse_name();
            self.expect(TokenKind::Colon);
            let value = self.parse_value(is_const);
            args.push(Argument {
                name,
                value,
                span: self.span_from(start),
            });
            if self.lexer.pos() == before {
                self.advance();
            }
        }
        self.expect(TokenKind::RParen);
        args
    }

    fn parse_directives(&mut self, is_const: bool) -> Vec<Directive> {
        let mut directives = Vec::new();
        while self.at_kind(TokenKind::At) {
            let start = self.current.span.start;
            self.advance(); // @
            let name = self.parse_name();
            let arguments = self.parse_arguments(is_const);
            directives.push(Directive {
                name,
                arguments,
                span: self.span_from(start),
            });
        }
        directives
    }

    /// Parses a value. Constant contexts (variable defaults) reject variables.
    fn parse_value(&mut self, is_const: bool) -> Value {
        match self.at() {
            TokenKind::Dollar => {
                let dollar = self.current.span;
                self.advance();
                let name = self.parse_name();
                if is_const {
                    self.errors.push(SyntaxError::new(
                        codes::INVALID_SYNTAX,
                        dollar.merge(name.span),
                        "variables are not allowed in constant values",
                    ));
                }
                Value::Variable(name)
            }
            TokenKind::IntLiteral => {
                let text = self.current_text();
                let value = match text.parse::<i64>() {
                    Ok(v) => Value::Int(v),
                    Err(_) => {
                        self.error(
                            codes::INVALID_LITERAL,
                            format!("integer literal `{text}` is out of range"),
                        );
                        Value::Null
                    }
                };
                self.advance();
                value
            }
            TokenKind::FloatLiteral => {
                let text = self.current_text();
                let value = Value::Float(text.parse().unwrap_or(f64::NAN));
                self.advance();
                value
            }
            TokenKind::StringLiteral => {
                let text = self.current_text();
                let value = match unescape(&text[1..text.len() - 1]) {
                    Ok(s) => Value::String(s),
                    Err(message) => {
                        self.error(codes::INVALID_LITERAL, message);
                        Value::Null
                    }
                };
                self.advance();
                value
            }
            TokenKind::BlockStringLiteral => {
                let text = self.current_text();
                let value = Value::String(block_string_value(&text[3..text.len() - 3]));
                self.advance();
                value
            }
            TokenKind::True => {
                self.advance();
                Value::Boolean(true)
            }
            TokenKind::False => {
                self.advance();
                Value::Boolean(false)
            }
            TokenKind::Null => {
                self.advance();
                Value::Null
            }
            TokenKind::LBracket => {
                self.advance();
                let mut values = Vec::new();
                while !self.at_kind(TokenKind::RBracket) && !self.at_kind(TokenKind::Eof) {
                    let before = self.lexer.pos();
                    values.push(self.parse_value(is_const));
                    if self.lexer.pos() == before {
                        self.advance();
                    }
                }
                self.expect(TokenKind::RBracket);
                Value::List(values)
            }
            TokenKind::LBrace => {
                self.advance();
                let mut fields = Vec::new();
                while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
                    let before = self.lexer.pos();
                    let name = self.parse_name();
                    self.expect(TokenKind::Colon);
                    let value = self.parse_value(is_const);
                    fields.push((name, value));
                    if self.lexer.pos() == before {
                        self.advance();
                    }
                }
                self.expect(TokenKind::RBrace);
                Value::Object(fields)
            }
            TokenKind::Name | TokenKind::Query | TokenKind::Mutation | TokenKind::Subscription
            | TokenKind::Fragment | TokenKind::On => {
                let value = self.current_text().to_string();
                self.advance();
                Value::Enum(value)
            }
            _ => {
                self.error_expected("value");
                Value::Null
            }
        }
    }
}

/// Resolves escape sequences in a quoted string body.
fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("invalid unicode escape `\\u{hex}`"))?;
                out.push(decoded);
            }
            Some(other) => return Err(format!("invalid escape sequence `\\{other}`")),
            None => return Err("unterminated escape sequence".to_string()),
        }
    }
    Ok(out)
}

/// Computes the value of a block string: common indentation and blank
/// leading/trailing lines are removed.
fn block_string_value(raw: &str) -> String {
    let raw = raw.replace("\\\"\"\"", "\"\"\"");
    let lines: Vec<&str> = raw.lines().collect();

    let indent = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let mut trimmed: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.len() < indent {
                *line
            } else {
                &line[indent..]
            }
        })
        .collect();

    while trimmed.first().is_some_and(|l| l.trim().is_empty()) {
        trimmed.remove(0);
    }
    while trimmed.last().is_some_and(|l| l.trim().is_empty()) {
        trimmed.pop();
    }
    trimmed.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Document {
        let result = parse(source);
        assert!(!result.has_errors(), "unexpected errors: {:?}", result.errors);
        result.document
    }

    fn first_field(doc: &Document) -> &Field {
        let op = doc.operation(None).unwrap();
        match &op.selection_set.selections[0] {
            Selection::Field(field) => field,
            other => panic!("expected field, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_anonymous_query() {
        let doc = parse_ok("{ employees { id firstName } }");
        let field = first_field(&doc);
        assert_eq!(field.name.value, "employees");
        assert_eq!(field.selection_set.as_ref().unwrap().selections.len(), 2);
    }

    #[test]
    fn test_parse_arguments_and_alias() {
        let doc = parse_ok(
            r#"query Q($name: String = "Agatha") {
                matches: employees(filter: { firstName: { eq: $name } }, page: { size: 10 }) { id }
            }"#,
        );
        let op = doc.operation(Some("Q")).unwrap();
        assert_eq!(op.variables.len(), 1);
        assert_eq!(op.variables[0].ty.to_string(), "String");
        assert_eq!(
            op.variables[0].default_value,
            Some(Value::String("Agatha".to_string()))
        );

        let field = first_field(&doc);
        assert_eq!(field.response_key(), "matches");
        assert_eq!(field.arguments.len(), 2);
        let filter = field.argument("filter").unwrap();
        let vars = op.coerce_variables(&serde_json::Map::new());
        assert_eq!(
            filter.value.to_json(&vars),
            serde_json::json!({ "firstName": { "eq": "Agatha" } })
        );
    }

    #[test]
    fn test_parse_fragments() {
        let doc = parse_ok(
            r#"
            query {
                creditCards {
                    ...CardFields
                    ... on Visa { transactions { amount } }
                    ... @include(if: true) { id }
                }
            }
            fragment CardFields on CreditCard { number }
            "#,
        );
        assert_eq!(doc.fragments().len(), 1);
        let selections = &first_field(&doc).selection_set.as_ref().unwrap().selections;
        assert!(matches!(selections[0], Selection::FragmentSpread(_)));
        match &selections[1] {
            Selection::InlineFragment(inline) => {
                assert_eq!(inline.type_condition.as_ref().unwrap().value, "Visa");
            }
            other => panic!("expected inline fragment, got {other:?}"),
        }
        match &selections[2] {
            Selection::InlineFragment(inline) => {
                assert!(inline.type_condition.is_none());
                assert_eq!(inline.directives[0].name.value, "include");
            }
            other => panic!("expected inline fragment, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_variable_types() {
        let doc = parse_ok("query($ids: [ID!]!, $page: Page) { employees { id } }");
        let op = doc.operation(None).unwrap();
        assert_eq!(op.variables[0].ty.to_string(), "[ID!]!");
        assert_eq!(op.variables[1].ty.to_string(), "Page");
    }

    #[test]
    fn test_string_escapes() {
        let doc = parse_ok(r#"{ employees(filter: { firstName: { eq: "A\"gatha\n" } }) { id } }"#);
        let arg = first_field(&doc).argument("filter").unwrap();
        assert_eq!(
            arg.value.to_json(&serde_json::Map::new())["firstName"]["eq"],
            "A\"gatha\n"
        );
    }

    #[test]
    fn test_block_string() {
        assert_eq!(block_string_value("\n    hello\n      world\n  "), "hello\n  world");
    }

    #[test]
    fn test_syntax_errors_are_collected() {
        let result = parse("{ employees( { id } }");
        assert!(result.has_errors());
        let errors = result.into_result().unwrap_err();
        assert!(errors.first().unwrap().message.contains("expected"));
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        assert!(parse("{ employees { } }").has_errors());
    }

    #[test]
    fn test_constant_defaults_reject_variables() {
        assert!(parse("query($a: Int = $b) { employees { id } }").has_errors());
    }

    #[test]
    fn test_operation_lookup() {
        let doc = parse_ok("query A { a { id } } query B { b { id } }");
        assert_eq!(
            doc.operation(None).unwrap_err(),
            OperationLookupError::Ambiguous(2)
        );
        assert!(doc.operation(Some("B")).is_ok());
        assert_eq!(
            doc.operation(Some("C")).unwrap_err(),
            OperationLookupError::Unknown("C".to_string())
        );
    }
}
