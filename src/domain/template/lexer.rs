// Expression tokenizer

use crate::error::{Error, Result};

const SENDER: &str = "lexer";

/// Multi-character symbols must come before their single-character prefixes
const SYMBOLS: &[&str] = &["}}", "%}", "|", ":", ".", ",", "(", ")", "-"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    String,
    Symbol,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub val: String,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn is(&self, kind: TokenKind, val: &str) -> bool {
        self.kind == kind && self.val == val
    }
}

/// Splits an expression such as `name|upper|truncatechars:5` into tokens
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn tokenize(input: &'a str) -> Result<Vec<Token>> {
        let mut lexer = Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
        };
        lexer.run()
    }

    fn run(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let Some(ch) = self.peek_char() else {
                break;
            };

            let token = if ch.is_ascii_alphabetic() || ch == '_' {
                self.lex_identifier()
            } else if ch.is_ascii_digit() {
                // A number right after an accessor dot is a path segment, never a float
                let after_accessor = tokens
                    .last()
                    .is_some_and(|t: &Token| t.is(TokenKind::Symbol, "."));
                self.lex_number(!after_accessor)
            } else if ch == '"' || ch == '\'' {
                self.lex_string(ch)?
            } else {
                self.lex_symbol()?
            };
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn lex_identifier(&mut self) -> Token {
        let (line, col) = (self.line, self.col);
        let mut val = String::new();

        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                val.push(ch);
                self.advance(ch);
            } else {
                break;
            }
        }

        Token { kind: TokenKind::Identifier, val, line, col }
    }

    fn lex_number(&mut self, allow_fraction: bool) -> Token {
        let (line, col) = (self.line, self.col);
        let mut val = String::new();
        let mut seen_dot = !allow_fraction;

        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                val.push(ch);
                self.advance(ch);
            } else if ch == '.'
                && !seen_dot
                && self.peek_ahead(1).is_some_and(|next| next.is_ascii_digit())
            {
                // `list.0.name` keeps the dot as an accessor; `1.5` is a float
                seen_dot = true;
                val.push(ch);
                self.advance(ch);
            } else {
                break;
            }
        }

        Token { kind: TokenKind::Number, val, line, col }
    }

    fn lex_string(&mut self, quote: char) -> Result<Token> {
        let (line, col) = (self.line, self.col);
        self.advance(quote);
        let mut val = String::new();

        loop {
            match self.peek_char() {
                Some(ch) if ch == quote => {
                    self.advance(ch);
                    break;
                }
                Some('\\') => {
                    self.advance('\\');
                    let escaped = self.peek_char().ok_or_else(|| self.unterminated(line, col))?;
                    self.advance(escaped);
                    val.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                }
                Some(ch) => {
                    val.push(ch);
                    self.advance(ch);
                }
                None => return Err(self.unterminated(line, col)),
            }
        }

        Ok(Token { kind: TokenKind::String, val, line, col })
    }

    fn lex_symbol(&mut self) -> Result<Token> {
        let (line, col) = (self.line, self.col);
        let rest = &self.input[self.pos..];

        let Some(symbol) = SYMBOLS.iter().find(|s| rest.starts_with(**s)) else {
            let ch = self.peek_char().unwrap_or_default();
            let token = Token {
                kind: TokenKind::Symbol,
                val: ch.to_string(),
                line,
                col,
            };
            return Err(Error::syntax(SENDER, format!("Unexpected character '{}'.", ch)).at(&token));
        };

        for ch in symbol.chars() {
            self.advance(ch);
        }

        Ok(Token {
            kind: TokenKind::Symbol,
            val: symbol.to_string(),
            line,
            col,
        })
    }

    fn unterminated(&self, line: usize, col: usize) -> Error {
        let token = Token {
            kind: TokenKind::String,
            val: self.input[self.pos..].chars().take(10).collect(),
            line,
            col,
        };
        Error::syntax(SENDER, "Unterminated string literal.").at(&token)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance(ch);
            } else {
                break;
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_ahead(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self, ch: char) {
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
    }
}
