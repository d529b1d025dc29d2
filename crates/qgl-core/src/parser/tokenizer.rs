//! QGL Tokenizer - converts QGL text into token stream
//!
//! Handles: declaration keywords, identifiers, quantum-notation literals
//! (`|0⟩`, `|+⟩`, `|ψ⟩`), the superposition marker `⊕` and punctuation.
//! Comments (//) and whitespace are discarded.
//!
//! Before any token is produced the whole comment-free text is scanned for
//! denylisted words. QGL describes structure, so iteration, time, search,
//! optimization and membership vocabulary is rejected outright.
//!
//! Guarantees:
//! - Deterministic: same input always produces same token stream
//! - line:column for every error, measured in the normalized text

/// Infix marker joining two labels into one unresolved label
pub const SUPERPOSITION_MARKER: char = '⊕';

/// Canonical closing glyph of a quantum-notation literal
pub const KET_CLOSE: char = '⟩';

/// Whole words that may never appear outside a comment, with their category
const FORBIDDEN_WORDS: &[(&str, &str)] = &[
    // Iteration
    ("for", "iteration"),
    ("while", "iteration"),
    ("repeat", "iteration"),
    ("iterate", "iteration"),
    ("loop", "iteration"),
    // Time
    ("time", "time"),
    ("step", "time"),
    ("clock", "time"),
    ("tick", "time"),
    ("second", "time"),
    ("minute", "time"),
    // Search
    ("search", "search"),
    ("find", "search"),
    ("compute", "search"),
    ("calculate", "search"),
    ("solve", "search"),
    // Optimization
    ("evolve", "optimization"),
    ("simulate", "optimization"),
    ("optimize", "optimization"),
    ("minimize", "optimization"),
    ("maximize", "optimization"),
    // Set membership
    ("member", "membership"),
    ("contains", "membership"),
    ("in", "membership"),
];

/// Symbols rejected wherever they appear outside a comment
const FORBIDDEN_SYMBOLS: &[(char, &str)] = &[('∈', "membership")];

/// Token types for QGL syntax
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Token {
    // Declaration keywords
    Boundary,
    Domain,
    Qubit,

    // Names and labels
    Identifier(String),
    QuantumState(String),

    // Symbols
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Equals,    // =
    Comma,     // ,
    Superpose, // ⊕

    Eof,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Token::Boundary => write!(f, "keyword 'boundary'"),
            Token::Domain => write!(f, "keyword 'domain'"),
            Token::Qubit => write!(f, "keyword 'qubit'"),
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::QuantumState(state) => write!(f, "quantum state '{}'", state),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::Equals => write!(f, "'='"),
            Token::Comma => write!(f, "','"),
            Token::Superpose => write!(f, "'{}'", SUPERPOSITION_MARKER),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// Position in source text for error reporting
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Token with source position
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Tokenize QGL source text in one call
pub fn tokenize(source: &str) -> crate::Result<Vec<SpannedToken>> {
    Tokenizer::new(source).tokenize()
}

/// Tokenizer for QGL source text
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Tokenizer {
    /// Create a new tokenizer; quantum notation is normalized up front
    pub fn new(text: &str) -> Self {
        Tokenizer {
            input: normalize_quantum_notation(text).chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input into a stream of spanned tokens
    pub fn tokenize(&mut self) -> crate::Result<Vec<SpannedToken>> {
        scan_forbidden(&self.input)?;

        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();

            if self.is_at_end() {
                tokens.push(SpannedToken {
                    token: Token::Eof,
                    span: self.current_span(),
                });
                break;
            }

            let token = self.next_token()?;
            tokens.push(token);
        }

        tracing::debug!(tokens = tokens.len(), "tokenized QGL source");
        Ok(tokens)
    }

    // ── Character helpers ──────────────────────────────────

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied();
        if let Some(c) = ch {
            self.position += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        ch
    }

    fn current_span(&self) -> Span {
        Span {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }

    /// Up to 20 characters on either side of `offset`
    fn context_at(&self, offset: usize) -> String {
        let start = offset.saturating_sub(20);
        let end = (offset + 20).min(self.input.len());
        self.input[start..end].iter().collect()
    }

    fn unexpected(&self, found: char, span: Span) -> crate::Error {
        crate::Error::UnexpectedCharacter {
            found,
            context: self.context_at(span.offset),
            span,
        }
    }

    // ── Whitespace & Comments ──────────────────────────────

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while let Some(ch) = self.peek() {
                if ch.is_whitespace() {
                    self.advance();
                } else {
                    break;
                }
            }

            if self.peek() == Some('/') && self.peek_ahead(1) == Some('/') {
                while let Some(ch) = self.peek() {
                    if ch == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            break;
        }
    }

    // ── Main dispatch ──────────────────────────────────────

    fn next_token(&mut self) -> crate::Result<SpannedToken> {
        let span = self.current_span();
        let ch = match self.peek() {
            Some(c) => c,
            None => return Ok(SpannedToken { token: Token::Eof, span }),
        };

        let token = match ch {
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '=' => Token::Equals,
            ',' => Token::Comma,
            SUPERPOSITION_MARKER => Token::Superpose,
            '|' => return self.read_quantum_state(span),
            c if c.is_ascii_alphabetic() || c == '_' => {
                return Ok(self.read_identifier_or_keyword(span))
            }
            _ => return Err(self.unexpected(ch, span)),
        };

        self.advance();
        Ok(SpannedToken { token, span })
    }

    // ── Quantum-notation literals ──────────────────────────

    /// Read a canonical `|…⟩` literal; normalization already rewrote `>`
    fn read_quantum_state(&mut self, span: Span) -> crate::Result<SpannedToken> {
        let start = self.position;
        self.advance(); // consume |

        while let Some(ch) = self.peek() {
            if is_ket_char(ch) {
                self.advance();
            } else {
                break;
            }
        }

        if self.position == start + 1 || self.peek() != Some(KET_CLOSE) {
            return Err(self.unexpected('|', span));
        }
        self.advance(); // consume ⟩

        let text: String = self.input[start..self.position].iter().collect();
        Ok(SpannedToken {
            token: Token::QuantumState(text),
            span,
        })
    }

    // ── Identifiers & Keywords ─────────────────────────────

    fn read_identifier_or_keyword(&mut self, span: Span) -> SpannedToken {
        let start = self.position;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.input[start..self.position].iter().collect();

        let token = match text.as_str() {
            "boundary" => Token::Boundary,
            "domain" => Token::Domain,
            "qubit" => Token::Qubit,
            _ => Token::Identifier(text),
        };

        SpannedToken { token, span }
    }
}

// ── Quantum notation normalization ────────────────────────

/// Rewrite `|0>`, `| + >`, `|ψ >` and friends to the canonical `|0⟩` form.
///
/// A bar only counts as a literal opener when ket characters and a closing
/// `>` or `⟩` follow on the same line; any other bar is left untouched.
pub fn normalize_quantum_notation(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '|' {
            if let Some((ket, end)) = match_ket(&chars, i) {
                out.push('|');
                out.push_str(&ket);
                out.push(KET_CLOSE);
                i = end;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

fn match_ket(chars: &[char], bar: usize) -> Option<(String, usize)> {
    let mut ket = String::new();
    let mut i = bar + 1;

    loop {
        match chars.get(i).copied() {
            Some(' ') | Some('\t') => i += 1,
            Some(c) if is_ket_char(c) => {
                ket.push(c);
                i += 1;
            }
            Some('>') | Some(KET_CLOSE) if !ket.is_empty() => return Some((ket, i + 1)),
            _ => return None,
        }
    }
}

fn is_ket_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '+' | '-' | '↑' | '↓')
}

// ── Denylist gate ─────────────────────────────────────────

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Fail on the first denylisted word or symbol outside a comment
fn scan_forbidden(input: &[char]) -> crate::Result<()> {
    let mut i = 0;
    let mut line = 1;
    let mut column = 1;

    while i < input.len() {
        let c = input[i];

        if c == '/' && input.get(i + 1) == Some(&'/') {
            while i < input.len() && input[i] != '\n' {
                i += 1;
                column += 1;
            }
            continue;
        }

        if is_word_char(c) {
            let span = Span { line, column, offset: i };
            let start = i;
            while i < input.len() && is_word_char(input[i]) {
                i += 1;
                column += 1;
            }
            let word: String = input[start..i].iter().collect();
            if let Some(&(forbidden, category)) =
                FORBIDDEN_WORDS.iter().find(|(w, _)| *w == word)
            {
                return Err(crate::Error::ForbiddenSyntax {
                    word: forbidden.to_string(),
                    category: category.to_string(),
                    span,
                });
            }
            continue;
        }

        if let Some(&(symbol, category)) = FORBIDDEN_SYMBOLS.iter().find(|(s, _)| *s == c) {
            return Err(crate::Error::ForbiddenSyntax {
                word: symbol.to_string(),
                category: category.to_string(),
                span: Span { line, column, offset: i },
            });
        }

        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
        i += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn tokens_of(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|st| st.token)
            .collect()
    }

    fn tokenize_err(input: &str) -> Error {
        tokenize(input).unwrap_err()
    }

    fn ident(s: &str) -> Token {
        Token::Identifier(s.to_string())
    }

    // ── Keywords ───────────────────────────────────────

    #[test]
    fn test_tokenize_declaration_keywords() {
        let tokens = tokens_of("boundary domain qubit");
        assert_eq!(tokens, vec![Token::Boundary, Token::Domain, Token::Qubit, Token::Eof]);
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let tokens = tokens_of("boundaryX domains qubit_1");
        assert_eq!(
            tokens,
            vec![ident("boundaryX"), ident("domains"), ident("qubit_1"), Token::Eof]
        );
    }

    // ── Symbols ────────────────────────────────────────

    #[test]
    fn test_tokenize_symbols() {
        let tokens = tokens_of("{ } [ ] = , ⊕");
        assert_eq!(
            tokens,
            vec![
                Token::LBrace,
                Token::RBrace,
                Token::LBracket,
                Token::RBracket,
                Token::Equals,
                Token::Comma,
                Token::Superpose,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_boundary_declaration() {
        let tokens = tokens_of("boundary Outer { Inner, element }");
        assert_eq!(
            tokens,
            vec![
                Token::Boundary,
                ident("Outer"),
                Token::LBrace,
                ident("Inner"),
                Token::Comma,
                ident("element"),
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_qubit_declaration_without_spaces() {
        let tokens = tokens_of("qubit q={a⊕b}");
        assert_eq!(
            tokens,
            vec![
                Token::Qubit,
                ident("q"),
                Token::Equals,
                Token::LBrace,
                ident("a"),
                Token::Superpose,
                ident("b"),
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    // ── Quantum notation ───────────────────────────────

    #[test]
    fn test_tokenize_canonical_kets() {
        let tokens = tokens_of("|0⟩ |1⟩ |+⟩ |-⟩ |ψ⟩");
        assert_eq!(
            tokens,
            vec![
                Token::QuantumState("|0⟩".into()),
                Token::QuantumState("|1⟩".into()),
                Token::QuantumState("|+⟩".into()),
                Token::QuantumState("|-⟩".into()),
                Token::QuantumState("|ψ⟩".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_ascii_kets_are_normalized() {
        let tokens = tokens_of("|0> | 1 > |+ > |ψ>");
        assert_eq!(
            tokens,
            vec![
                Token::QuantumState("|0⟩".into()),
                Token::QuantumState("|1⟩".into()),
                Token::QuantumState("|+⟩".into()),
                Token::QuantumState("|ψ⟩".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_superposed_kets() {
        let tokens = tokens_of("|0>⊕|1>");
        assert_eq!(
            tokens,
            vec![
                Token::QuantumState("|0⟩".into()),
                Token::Superpose,
                Token::QuantumState("|1⟩".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_normalize_leaves_stray_bars() {
        assert_eq!(normalize_quantum_notation("a | b"), "a | b");
        assert_eq!(normalize_quantum_notation("|0 >"), "|0⟩");
        assert_eq!(normalize_quantum_notation("x|>"), "x|>");
    }

    #[test]
    fn test_unterminated_ket_rejected() {
        let err = tokenize_err("domain D { |0 }");
        assert!(matches!(err, Error::UnexpectedCharacter { found: '|', .. }));
    }

    // ── Comments & whitespace ──────────────────────────

    #[test]
    fn test_skip_line_comments() {
        let tokens = tokens_of("boundary // a comment\nA");
        assert_eq!(tokens, vec![Token::Boundary, ident("A"), Token::Eof]);
    }

    #[test]
    fn test_only_comments_and_whitespace() {
        assert_eq!(tokens_of("// nothing\n   \n\t// more\n"), vec![Token::Eof]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(tokens_of(""), vec![Token::Eof]);
    }

    // ── Denylist ───────────────────────────────────────

    #[test]
    fn test_forbidden_iteration_word() {
        let err = tokenize_err("boundary Test { elements }\nfor i in elements");
        match err {
            Error::ForbiddenSyntax { word, category, span } => {
                assert_eq!(word, "for");
                assert_eq!(category, "iteration");
                assert_eq!(span.line, 2);
                assert_eq!(span.column, 1);
            }
            other => panic!("expected forbidden syntax, got {:?}", other),
        }
    }

    #[test]
    fn test_forbidden_time_word_message() {
        let msg = tokenize_err("boundary System { states }\ntime = 0").to_string();
        assert!(msg.to_lowercase().contains("forbidden"));
        assert!(msg.contains("time"));
    }

    #[test]
    fn test_forbidden_words_in_comments_are_ignored() {
        let tokens = tokens_of("// for while time search\nboundary A { b } // optimize");
        assert_eq!(tokens.first(), Some(&Token::Boundary));
    }

    #[test]
    fn test_forbidden_requires_whole_word() {
        let tokens = tokens_of("boundary inner { timeline, forest, member_list }");
        assert_eq!(tokens.len(), 10);
    }

    #[test]
    fn test_forbidden_membership_symbol() {
        let err = tokenize_err("boundary A { b } a∈b");
        match err {
            Error::ForbiddenSyntax { word, category, .. } => {
                assert_eq!(word, "∈");
                assert_eq!(category, "membership");
            }
            other => panic!("expected forbidden syntax, got {:?}", other),
        }
    }

    #[test]
    fn test_denylist_precedes_pattern_matching() {
        // '@' would be an unexpected character, but the gate fires first
        let err = tokenize_err("@ while");
        assert!(matches!(err, Error::ForbiddenSyntax { .. }));
    }

    #[test]
    fn test_first_forbidden_word_in_source_order() {
        let err = tokenize_err("solve then loop");
        assert!(matches!(err, Error::ForbiddenSyntax { ref word, .. } if word == "solve"));
    }

    // ── Errors ─────────────────────────────────────────

    #[test]
    fn test_unexpected_character_reports_context() {
        let err = tokenize_err("boundary A { b; c }");
        match err {
            Error::UnexpectedCharacter { found, span, context } => {
                assert_eq!(found, ';');
                assert_eq!(span, Span { line: 1, column: 15, offset: 14 });
                assert!(context.contains("b; c"));
            }
            other => panic!("expected unexpected character, got {:?}", other),
        }
    }

    #[test]
    fn test_leading_digit_rejected() {
        let err = tokenize_err("boundary 9lives { }");
        assert!(matches!(err, Error::UnexpectedCharacter { found: '9', .. }));
    }

    // ── Span tracking ──────────────────────────────────

    #[test]
    fn test_span_tracking() {
        let tokens = tokenize("boundary A {\n  b\n}").unwrap();
        assert_eq!(tokens[0].span, Span { line: 1, column: 1, offset: 0 });
        assert_eq!(tokens[1].span, Span { line: 1, column: 10, offset: 9 });
        assert_eq!(tokens[2].span, Span { line: 1, column: 12, offset: 11 });
        assert_eq!(tokens[3].span, Span { line: 2, column: 3, offset: 15 });
        assert_eq!(tokens[4].span, Span { line: 3, column: 1, offset: 17 });
        assert_eq!(tokens[5].token, Token::Eof);
    }

    // ── Determinism proof ──────────────────────────────

    #[test]
    fn test_tokenize_determinism_100_iterations() {
        let input = "boundary System { D, q }\ndomain D { a ⊕ b, |0> }\nqubit q = { a ⊕ |0> }";
        let first = tokenize(input).unwrap();

        for i in 0..100 {
            let result = tokenize(input).unwrap();
            assert_eq!(first, result, "Determinism failure at iteration {}", i);
        }
    }
}
