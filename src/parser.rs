// SPDX-License-Identifier: PMPL-1.0-or-later

//! Parser for constraint rule text and queries
//!
//! The accepted grammar is the small fragment the constraint system needs:
//! facts and `:-` rules, conjunction, disjunction, negation as failure,
//! `=`/`\=`, lists, quoted atoms, integers, strings, and `%` or `/* */`
//! comments. Every error carries the line and column it was raised at.

use crate::term::Term;

/// A consulted clause. A fact when `body` is `None`.
#[derive(Debug, Clone)]
pub struct Clause {
    pub head: Term,
    pub body: Option<Term>,
}

/// A parsed query: the goal plus its reportable variables in
/// first-occurrence order. Variables starting with `_` are not reported.
#[derive(Debug, Clone)]
pub struct Query {
    pub goal: Term,
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parses a whole program into clauses.
pub fn parse_program(source: &str) -> Result<Vec<Clause>, ParseError> {
    let mut parser = Parser::new(source)?;
    let mut clauses = Vec::new();
    while !parser.at_end() {
        clauses.push(parser.clause()?);
    }
    Ok(clauses)
}

/// Parses a query. The trailing `.` is accepted but not required.
pub fn parse_query(source: &str) -> Result<Query, ParseError> {
    let mut parser = Parser::new(source)?;
    if parser.at_end() {
        return Err(parser.error_here("empty query"));
    }
    let goal = parser.disjunction()?;
    parser.eat(&Token::Dot);
    if !parser.at_end() {
        return Err(parser.error_here("unexpected input after query"));
    }
    let mut variables = Vec::new();
    collect_variables(&goal, &mut variables);
    Ok(Query { goal, variables })
}

fn collect_variables(term: &Term, out: &mut Vec<String>) {
    match term {
        Term::Var(name) => {
            if !name.starts_with('_') && !out.iter().any(|existing| existing == name) {
                out.push(name.clone());
            }
        }
        Term::Compound(_, args) => {
            for arg in args {
                collect_variables(arg, out);
            }
        }
        _ => {}
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Atom(String),
    Var(String),
    Int(i64),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Bar,
    Semicolon,
    Dot,
    Neck,
    Eq,
    Neq,
    Naf,
}

fn describe(token: &Token) -> &'static str {
    match token {
        Token::Atom(_) => "atom",
        Token::Var(_) => "variable",
        Token::Int(_) => "integer",
        Token::Str(_) => "string",
        Token::LParen => "'('",
        Token::RParen => "')'",
        Token::LBracket => "'['",
        Token::RBracket => "']'",
        Token::Comma => "','",
        Token::Bar => "'|'",
        Token::Semicolon => "';'",
        Token::Dot => "'.'",
        Token::Neck => "':-'",
        Token::Eq => "'='",
        Token::Neq => "'\\='",
        Token::Naf => "'\\+'",
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> ParseError {
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }

    fn ident(&mut self, first: char) -> String {
        let mut text = String::new();
        text.push(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
                text.push(c);
            } else {
                break;
            }
        }
        text
    }

    fn number(&mut self, line: usize, column: usize, first: char) -> Result<i64, ParseError> {
        let mut text = String::new();
        text.push(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.bump();
                text.push(c);
            } else {
                break;
            }
        }
        text.parse::<i64>()
            .map_err(|_| self.error(line, column, "integer literal out of range"))
    }

    fn quoted(&mut self, line: usize, column: usize, quote: char) -> Result<String, ParseError> {
        let what = if quote == '\'' { "quoted atom" } else { "string" };
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(line, column, format!("unterminated {what}"))),
                Some(c) if c == quote => return Ok(text),
                Some('\\') => match self.bump() {
                    Some('\\') => text.push('\\'),
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c @ ('\'' | '"')) => text.push(c),
                    Some(other) => {
                        return Err(self.error(
                            self.line,
                            self.column,
                            format!("unknown escape sequence '\\{other}'"),
                        ))
                    }
                    None => return Err(self.error(line, column, format!("unterminated {what}"))),
                },
                Some(c) => text.push(c),
            }
        }
    }

    fn tokenize(mut self) -> Result<(Vec<Spanned>, (usize, usize)), ParseError> {
        let mut tokens = Vec::new();
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                    continue;
                }
                Some('%') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                    continue;
                }
                Some('/') if self.peek_next() == Some('*') => {
                    let (line, column) = (self.line, self.column);
                    self.bump();
                    self.bump();
                    let mut closed = false;
                    while let Some(c) = self.bump() {
                        if c == '*' && self.peek() == Some('/') {
                            self.bump();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(self.error(line, column, "unterminated block comment"));
                    }
                    continue;
                }
                None => break,
                _ => {}
            }

            let line = self.line;
            let column = self.column;
            let Some(c) = self.bump() else { break };
            let token = match c {
                '(' => Token::LParen,
                ')' => Token::RParen,
                '[' => Token::LBracket,
                ']' => Token::RBracket,
                ',' => Token::Comma,
                '|' => Token::Bar,
                ';' => Token::Semicolon,
                '.' => Token::Dot,
                '=' => Token::Eq,
                ':' => {
                    if self.peek() == Some('-') {
                        self.bump();
                        Token::Neck
                    } else {
                        return Err(self.error(line, column, "unexpected character ':'"));
                    }
                }
                '\\' => match self.peek() {
                    Some('=') => {
                        self.bump();
                        Token::Neq
                    }
                    Some('+') => {
                        self.bump();
                        Token::Naf
                    }
                    _ => return Err(self.error(line, column, "unexpected character '\\'")),
                },
                '\'' => Token::Atom(self.quoted(line, column, '\'')?),
                '"' => Token::Str(self.quoted(line, column, '"')?),
                '-' if matches!(self.peek(), Some(d) if d.is_ascii_digit()) => {
                    let Some(first) = self.bump() else { break };
                    Token::Int(-self.number(line, column, first)?)
                }
                c if c.is_ascii_digit() => Token::Int(self.number(line, column, c)?),
                c if c.is_ascii_lowercase() => Token::Atom(self.ident(c)),
                c if c.is_ascii_uppercase() || c == '_' => Token::Var(self.ident(c)),
                other => return Err(self.error(line, column, format!("unexpected character '{other}'"))),
            };
            tokens.push(Spanned { token, line, column });
        }
        Ok((tokens, (self.line, self.column)))
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: (usize, usize),
    fresh: u32,
}

impl Parser {
    fn new(source: &str) -> Result<Self, ParseError> {
        let (tokens, end) = Lexer::new(source).tokenize()?;
        Ok(Self {
            tokens,
            pos: 0,
            end,
            fresh: 0,
        })
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|spanned| &spanned.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.pos).cloned();
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    fn here(&self) -> (usize, usize) {
        self.tokens
            .get(self.pos)
            .map(|spanned| (spanned.line, spanned.column))
            .unwrap_or(self.end)
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let (line, column) = self.here();
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), ParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            match self.peek() {
                Some(found) => {
                    let found = describe(found);
                    Err(self.error_here(format!("expected {what}, found {found}")))
                }
                None => Err(self.error_here(format!("expected {what}, found end of input"))),
            }
        }
    }

    fn fresh_var(&mut self) -> Term {
        let name = format!("_A{}", self.fresh);
        self.fresh += 1;
        Term::Var(name)
    }

    fn clause(&mut self) -> Result<Clause, ParseError> {
        let (line, column) = self.here();
        let head = self.term()?;
        if head.indicator().is_none() {
            return Err(ParseError {
                line,
                column,
                message: "clause head must be an atom or a compound term".to_string(),
            });
        }
        let body = if self.eat(&Token::Neck) {
            Some(self.disjunction()?)
        } else {
            None
        };
        self.expect(&Token::Dot, "'.' at end of clause")?;
        Ok(Clause { head, body })
    }

    fn disjunction(&mut self) -> Result<Term, ParseError> {
        let first = self.conjunction()?;
        if self.eat(&Token::Semicolon) {
            let rest = self.disjunction()?;
            Ok(Term::Compound(";".to_string(), vec![first, rest]))
        } else {
            Ok(first)
        }
    }

    fn conjunction(&mut self) -> Result<Term, ParseError> {
        let first = self.goal()?;
        if self.eat(&Token::Comma) {
            let rest = self.conjunction()?;
            Ok(Term::Compound(",".to_string(), vec![first, rest]))
        } else {
            Ok(first)
        }
    }

    fn goal(&mut self) -> Result<Term, ParseError> {
        if self.eat(&Token::Naf) {
            let negated = self.goal()?;
            return Ok(Term::Compound("\\+".to_string(), vec![negated]));
        }
        let left = self.term()?;
        if self.eat(&Token::Eq) {
            let right = self.term()?;
            Ok(Term::Compound("=".to_string(), vec![left, right]))
        } else if self.eat(&Token::Neq) {
            let right = self.term()?;
            Ok(Term::Compound("\\=".to_string(), vec![left, right]))
        } else {
            Ok(left)
        }
    }

    fn term(&mut self) -> Result<Term, ParseError> {
        let Some(spanned) = self.advance() else {
            return Err(ParseError {
                line: self.end.0,
                column: self.end.1,
                message: "unexpected end of input, expected a term".to_string(),
            });
        };
        match spanned.token {
            Token::Int(value) => Ok(Term::Int(value)),
            Token::Str(text) => Ok(Term::Str(text)),
            Token::Var(name) => {
                if name == "_" {
                    Ok(self.fresh_var())
                } else {
                    Ok(Term::Var(name))
                }
            }
            Token::LParen => {
                let inner = self.disjunction()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::LBracket => self.list_tail(),
            Token::Atom(name) => {
                if self.eat(&Token::LParen) {
                    let mut args = vec![self.term()?];
                    while self.eat(&Token::Comma) {
                        args.push(self.term()?);
                    }
                    self.expect(&Token::RParen, "')' after arguments")?;
                    Ok(Term::Compound(name, args))
                } else {
                    Ok(Term::Atom(name))
                }
            }
            other => {
                let found = describe(&other);
                Err(ParseError {
                    line: spanned.line,
                    column: spanned.column,
                    message: format!("unexpected {found}"),
                })
            }
        }
    }

    fn list_tail(&mut self) -> Result<Term, ParseError> {
        if self.eat(&Token::RBracket) {
            return Ok(Term::nil());
        }
        let mut items = vec![self.term()?];
        while self.eat(&Token::Comma) {
            items.push(self.term()?);
        }
        let tail = if self.eat(&Token::Bar) {
            self.term()?
        } else {
            Term::nil()
        };
        self.expect(&Token::RBracket, "']' to close the list")?;
        Ok(items
            .into_iter()
            .rev()
            .fold(tail, |tail, head| Term::cons(head, tail)))
    }
}
