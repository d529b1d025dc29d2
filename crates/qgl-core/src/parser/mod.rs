//! QGL Parser - tokenizer, AST types, and recursive descent parser
//!
//! Converts QGL text into a structural [`Program`](ast::Program).
//!
//! ```text
//! program      := (container | statespace | choicepoint)*
//! container    := "boundary" IDENT "{" (IDENT ("," IDENT)*)? "}"
//! statespace   := "domain" IDENT "{" (label ("," label)*)? "}"
//! label        := LABEL ("⊕" LABEL)?
//! choicepoint  := "qubit" IDENT "=" "{" LABEL "⊕" LABEL "}"
//! LABEL        := IDENT | KET
//! ```
//!
//! Single forward pass, one token of lookahead, no backtracking.

pub mod ast;
pub mod tokenizer;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};
use ast::{compound_label, Boundary, Domain, Program, Qubit};
use tokenizer::{Span, SpannedToken, Token};

/// Parser behaviour switches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Reject stray tokens between declarations instead of skipping them
    pub strict_top_level: bool,
}

/// Tokenize and parse QGL text with default options
///
/// # Errors
/// Lexical errors from the tokenizer, `Syntax` for grammar violations,
/// `StructuralViolation` for a boundary listing itself.
///
/// # Example
/// ```
/// let program = qgl_core::parser::parse_source("boundary A { b }").unwrap();
/// assert_eq!(program.boundaries.len(), 1);
/// ```
pub fn parse_source(text: &str) -> Result<Program> {
    parse_source_with(text, &ParseOptions::default())
}

/// Tokenize and parse QGL text
pub fn parse_source_with(text: &str, options: &ParseOptions) -> Result<Program> {
    let tokens = tokenizer::tokenize(text)?;
    parse_with(&tokens, options)
}

/// Parse a token stream with default options
pub fn parse(tokens: &[SpannedToken]) -> Result<Program> {
    parse_with(tokens, &ParseOptions::default())
}

/// Parse a token stream into a program
pub fn parse_with(tokens: &[SpannedToken], options: &ParseOptions) -> Result<Program> {
    let program = Parser::new(tokens, options).parse_program()?;
    tracing::debug!(
        boundaries = program.boundaries.len(),
        domains = program.domains.len(),
        qubits = program.qubits.len(),
        "parsed QGL program"
    );
    Ok(program)
}

/// The closed set of top-level declarations
#[derive(Debug)]
enum Declaration {
    Boundary(Boundary),
    Domain(Domain),
    Qubit(Qubit),
}

static EOF: SpannedToken = SpannedToken {
    token: Token::Eof,
    span: Span {
        line: 1,
        column: 1,
        offset: 0,
    },
};

struct Parser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
    options: &'a ParseOptions,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [SpannedToken], options: &'a ParseOptions) -> Self {
        Parser {
            tokens,
            pos: 0,
            options,
        }
    }

    // ── Token helpers ──────────────────────────────────────

    fn current(&self) -> &'a SpannedToken {
        self.tokens.get(self.pos).unwrap_or(&EOF)
    }

    fn peek(&self) -> &'a Token {
        &self.current().token
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn error(&self, expected: &str) -> Error {
        let current = self.current();
        Error::Syntax {
            expected: expected.to_string(),
            found: current.token.to_string(),
            span: current.span.clone(),
        }
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<()> {
        if *self.peek() == token {
            self.advance();
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<String> {
        match self.peek() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name.clone())
            }
            _ => Err(self.error(expected)),
        }
    }

    /// Identifier or quantum-notation literal
    fn expect_label(&mut self, expected: &str) -> Result<String> {
        match self.peek() {
            Token::Identifier(label) | Token::QuantumState(label) => {
                self.advance();
                Ok(label.clone())
            }
            _ => Err(self.error(expected)),
        }
    }

    // ── Program ────────────────────────────────────────────

    fn parse_program(&mut self) -> Result<Program> {
        let mut program = Program::new();

        while let Some(declaration) = self.parse_declaration()? {
            match declaration {
                Declaration::Boundary(b) => program.boundaries.push(b),
                Declaration::Domain(d) => program.domains.push(d),
                Declaration::Qubit(q) => program.qubits.push(q),
            }
        }

        Ok(program)
    }

    /// Next declaration, or `None` at end of input
    fn parse_declaration(&mut self) -> Result<Option<Declaration>> {
        loop {
            match self.peek() {
                Token::Eof => return Ok(None),
                Token::Boundary => return self.parse_boundary().map(Declaration::Boundary).map(Some),
                Token::Domain => return self.parse_domain().map(Declaration::Domain).map(Some),
                Token::Qubit => return self.parse_qubit().map(Declaration::Qubit).map(Some),
                other => {
                    if self.options.strict_top_level {
                        return Err(self.error("declaration keyword ('boundary', 'domain' or 'qubit')"));
                    }
                    tracing::debug!(token = %other, span = %self.current().span, "skipping top-level token");
                    self.advance();
                }
            }
        }
    }

    /// `{ item (, item)* }` or `{ }`; the opening brace is already consumed
    fn parse_list<F>(&mut self, mut item: F) -> Result<Vec<String>>
    where
        F: FnMut(&mut Self) -> Result<String>,
    {
        let mut items = Vec::new();

        if *self.peek() == Token::RBrace {
            self.advance();
            return Ok(items);
        }

        loop {
            items.push(item(self)?);
            match self.peek() {
                Token::Comma => self.advance(),
                Token::RBrace => {
                    self.advance();
                    return Ok(items);
                }
                _ => return Err(self.error("',' or '}'")),
            }
        }
    }

    // ── Declarations ───────────────────────────────────────

    fn parse_boundary(&mut self) -> Result<Boundary> {
        self.advance(); // boundary
        let name = self.expect_identifier("boundary name")?;
        self.expect(Token::LBrace, "'{' after boundary name")?;
        let members = self.parse_list(|p| p.expect_identifier("boundary member"))?;
        Boundary::new(name, members)
    }

    fn parse_domain(&mut self) -> Result<Domain> {
        self.advance(); // domain
        let name = self.expect_identifier("domain name")?;
        self.expect(Token::LBrace, "'{' after domain name")?;
        let labels = self.parse_list(Self::parse_domain_label)?;
        Ok(Domain::new(name, labels))
    }

    fn parse_domain_label(&mut self) -> Result<String> {
        let first = self.expect_label("domain label")?;
        if *self.peek() == Token::Superpose {
            self.advance();
            let second = self.expect_label("second label after '⊕'")?;
            return Ok(compound_label(&first, &second));
        }
        Ok(first)
    }

    fn parse_qubit(&mut self) -> Result<Qubit> {
        self.advance(); // qubit
        let name = self.expect_identifier("qubit name")?;
        self.expect(Token::Equals, "'=' after qubit name")?;
        self.expect(Token::LBrace, "'{' after '='")?;
        let state_a = self.expect_label("first qubit state")?;
        self.expect(Token::Superpose, "'⊕' between qubit states")?;
        let state_b = self.expect_label("second qubit state")?;
        self.expect(Token::RBrace, "'}' after qubit states")?;
        Ok(Qubit::new(name, state_a, state_b))
    }
}
