//! Lexer for MVM64 assembly text.
//!
//! The source format is line-oriented: one instruction, label, or
//! directive per line. Tokens are separated by spaces and commas, `;`
//! starts a comment running to the end of the line, `name:` defines a
//! label, and `@name` references a symbol. Token text is never
//! case-adjusted here; mnemonics are upper-cased at lookup and register
//! names stay case-sensitive.

use logos::Logos;

use crate::error::AsmError;

#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
#[logos(skip r"[ \t,]+")]
#[logos(skip r";[^\n\r\f]*")]
pub enum TokenType {
    #[regex(r"\r\n|[\n\r\f]")]
    Newline,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*:")]
    LabelDef,

    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*")]
    SymbolRef,

    #[regex(r"[^ \t\n\r\f,;:@]+")]
    Word,
}

/// A token with its source text and 1-based line number.
#[derive(Clone, Debug)]
pub struct Token {
    pub token_type: TokenType,
    pub text: String,
    pub line: usize,
}

/// The tokens of one non-empty source line.
#[derive(Debug)]
pub struct SourceLine {
    pub number: usize,
    pub tokens: Vec<Token>,
}

/// Tokenizes assembly source into per-line token groups.
///
/// Blank lines and comment-only lines produce no group. Text that cannot
/// form a token (a stray `:` or a bare `@`) is an error.
pub fn tokenize(source: &str) -> Result<Vec<SourceLine>, AsmError> {
    let mut lexer = TokenType::lexer(source);
    let mut lines = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut line = 1usize;

    while let Some(token) = lexer.next() {
        match token {
            Ok(TokenType::Newline) => {
                if !current.is_empty() {
                    lines.push(SourceLine {
                        number: line,
                        tokens: std::mem::take(&mut current),
                    });
                }
                line += 1;
            }
            Ok(token_type) => {
                current.push(Token {
                    token_type,
                    text: lexer.slice().into(),
                    line,
                });
            }
            Err(_) => {
                return Err(AsmError::UnexpectedToken {
                    line,
                    text: lexer.slice().into(),
                });
            }
        }
    }

    if !current.is_empty() {
        lines.push(SourceLine {
            number: line,
            tokens: current,
        });
    }

    Ok(lines)
}
