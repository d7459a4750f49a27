//! Just enough of a Solidity tokenizer to find type declarations.
//!
//! Comments are dropped, string literals are kept opaque and everything that
//! is not an identifier or a number becomes a single-character punctuation
//! token. Line numbers are 1-based.

use crate::error::{SslcError, SslcResult};
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Number(String),
    Str,
    Punct(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl Token {
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_ident(&self, word: &str) -> bool {
        self.ident() == Some(word)
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn take_while(&mut self, first: char, pred: fn(char) -> bool) -> String {
        let mut out = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out
    }

    fn skip_line_comment(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.chars.next();
        }
    }

    fn skip_block_comment(&mut self, start_line: usize) -> SslcResult<()> {
        let mut prev = '\0';
        while let Some(c) = self.bump() {
            if prev == '*' && c == '/' {
                return Ok(());
            }
            prev = c;
        }
        Err(SslcError::Parse {
            line: start_line,
            message: "unterminated block comment".to_string(),
        })
    }

    fn skip_string(&mut self, quote: char, start_line: usize) -> SslcResult<()> {
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    self.bump();
                }
                '\n' => break,
                c if c == quote => return Ok(()),
                _ => {}
            }
        }
        Err(SslcError::Parse {
            line: start_line,
            message: "unterminated string literal".to_string(),
        })
    }
}

pub fn tokenize(source: &str) -> SslcResult<Vec<Token>> {
    let mut lexer = Lexer {
        chars: source.chars().peekable(),
        line: 1,
    };
    let mut tokens = Vec::new();

    while let Some(c) = lexer.bump() {
        let line = if c == '\n' { lexer.line - 1 } else { lexer.line };
        let kind = match c {
            c if c.is_whitespace() => continue,
            '/' if lexer.chars.peek() == Some(&'/') => {
                lexer.skip_line_comment();
                continue;
            }
            '/' if lexer.chars.peek() == Some(&'*') => {
                lexer.chars.next();
                lexer.skip_block_comment(line)?;
                continue;
            }
            '"' | '\'' => {
                lexer.skip_string(c, line)?;
                TokenKind::Str
            }
            c if is_ident_start(c) => TokenKind::Ident(lexer.take_while(c, is_ident_continue)),
            c if c.is_ascii_digit() => {
                TokenKind::Number(lexer.take_while(c, |c| c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            }
            c => TokenKind::Punct(c),
        };
        tokens.push(Token { kind, line });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idents(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().filter_map(|t| t.ident()).collect()
    }

    #[test]
    fn test_comments_are_skipped() {
        let src = "uint8 a; // uint256 hidden\n/* bool\n gone */ bool b;";
        let tokens = tokenize(src).unwrap();
        assert_eq!(idents(&tokens), vec!["uint8", "a", "bool", "b"]);
        assert_eq!(tokens.last().unwrap().line, 3);
    }

    #[test]
    fn test_line_numbers() {
        let tokens = tokenize("a\n\nb\n  c").unwrap();
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 3, 4]);
    }

    #[test]
    fn test_strings_are_opaque() {
        let tokens = tokenize(r#"x = "struct { \" }"; y"#).unwrap();
        assert_eq!(idents(&tokens), vec!["x", "y"]);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Str));
    }

    #[test]
    fn test_punctuation_and_numbers() {
        let tokens = tokenize("uint[3] x = 0x1f;").unwrap();
        assert!(tokens[1].is_punct('['));
        assert_eq!(tokens[2].kind, TokenKind::Number("3".to_string()));
        assert_eq!(tokens[6].kind, TokenKind::Number("0x1f".to_string()));
    }

    #[test]
    fn test_unterminated_comment_is_an_error() {
        let err = tokenize("a /* never closed").unwrap_err();
        assert!(matches!(err, SslcError::Parse { line: 1, .. }));
    }
}
