use crate::TextError;

/// Tokens of the RTR document language.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
    Eof,
    Ident(String),
    Int { lit: String, hex: bool },
    Float(String),
    Str(String),
    // keywords
    Let,
    Struct,
    Enum,
    Ts,
    Array,
    Map,
    Null,
    True,
    False,
    None_,
    // symbols
    Eq,
    Colon,
    Semi,
    Comma,
    LBrace,
    RBrace,
    LBrack,
    RBrack,
    LParen,
    RParen,
    Lt,
    Gt,
}

pub(crate) fn describe(tok: &Tok) -> String {
    match tok {
        Tok::Eof => "end of input".to_string(),
        Tok::Ident(s) => format!("identifier `{s}`"),
        Tok::Int { lit, .. } => format!("integer `{lit}`"),
        Tok::Float(lit) => format!("float `{lit}`"),
        Tok::Str(_) => "string literal".to_string(),
        Tok::Let => "`let`".to_string(),
        Tok::Struct => "`struct`".to_string(),
        Tok::Enum => "`enum`".to_string(),
        Tok::Ts => "`ts`".to_string(),
        Tok::Array => "`array`".to_string(),
        Tok::Map => "`map`".to_string(),
        Tok::Null => "`null`".to_string(),
        Tok::True => "`true`".to_string(),
        Tok::False => "`false`".to_string(),
        Tok::None_ => "`none`".to_string(),
        Tok::Eq => "`=`".to_string(),
        Tok::Colon => "`:`".to_string(),
        Tok::Semi => "`;`".to_string(),
        Tok::Comma => "`,`".to_string(),
        Tok::LBrace => "`{`".to_string(),
        Tok::RBrace => "`}`".to_string(),
        Tok::LBrack => "`[`".to_string(),
        Tok::RBrack => "`]`".to_string(),
        Tok::LParen => "`(`".to_string(),
        Tok::RParen => "`)`".to_string(),
        Tok::Lt => "`<`".to_string(),
        Tok::Gt => "`>`".to_string(),
    }
}

#[derive(Debug)]
pub(crate) struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    pub(crate) tok: Tok,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(src: &'a str) -> Result<Self, TextError> {
        let mut lx = Lexer {
            src,
            pos: 0,
            tok: Tok::Eof,
        };
        lx.bump()?;
        Ok(lx)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Advances to the next token.
    pub(crate) fn bump(&mut self) -> Result<(), TextError> {
        self.skip_trivia()?;

        let Some(c) = self.peek() else {
            self.tok = Tok::Eof;
            return Ok(());
        };

        if is_ident_start(c) {
            let start = self.pos;
            while let Some(c) = self.peek()
                && is_ident_part(c)
            {
                self.pos += c.len_utf8();
            }
            self.tok = keyword_or_ident(&self.src[start..self.pos]);
            return Ok(());
        }

        if c.is_ascii_digit() || (c == '-' && self.next_is_digit()) {
            return self.number();
        }

        if c == '"' {
            return self.string();
        }

        self.pos += c.len_utf8();
        self.tok = match c {
            '=' => Tok::Eq,
            ':' => Tok::Colon,
            ';' => Tok::Semi,
            ',' => Tok::Comma,
            '{' => Tok::LBrace,
            '}' => Tok::RBrace,
            '[' => Tok::LBrack,
            ']' => Tok::RBrack,
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            '<' => Tok::Lt,
            '>' => Tok::Gt,
            _ => return Err(TextError::Syntax(format!("unexpected character {c:?}"))),
        };
        Ok(())
    }

    fn skip_trivia(&mut self) -> Result<(), TextError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.pos += c.len_utf8();
                }
                Some('#') => self.line_comment(),
                Some('/') if self.rest().starts_with("//") => self.line_comment(),
                Some('/') if self.rest().starts_with("/*") => {
                    let Some(end) = self.rest().find("*/") else {
                        return Err(TextError::Syntax("unterminated block comment".to_string()));
                    };
                    self.pos += end + 2;
                }
                _ => return Ok(()),
            }
        }
    }

    fn line_comment(&mut self) {
        match self.rest().find('\n') {
            Some(end) => self.pos += end + 1,
            None => self.pos = self.src.len(),
        }
    }

    fn next_is_digit(&self) -> bool {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next().is_some_and(|c| c.is_ascii_digit())
    }

    fn number(&mut self) -> Result<(), TextError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }

        if self.rest().starts_with("0x") || self.rest().starts_with("0X") {
            self.pos += 2;
            let digits = self.pos;
            while let Some(c) = self.peek()
                && (c.is_ascii_hexdigit() || c == '_')
            {
                self.pos += 1;
            }
            if self.pos == digits {
                return Err(TextError::Syntax("hex literal without digits".to_string()));
            }
            self.tok = Tok::Int {
                lit: self.src[start..self.pos].to_string(),
                hex: true,
            };
            return Ok(());
        }

        let mut is_float = false;
        self.digits();
        if self.peek() == Some('.') {
            is_float = true;
            self.pos += 1;
            self.digits();
        }
        if let Some(c) = self.peek()
            && (c == 'e' || c == 'E')
        {
            is_float = true;
            self.pos += 1;
            if let Some(sign) = self.peek()
                && (sign == '+' || sign == '-')
            {
                self.pos += 1;
            }
            self.digits();
        }

        let lit = self.src[start..self.pos].to_string();
        self.tok = if is_float {
            Tok::Float(lit)
        } else {
            Tok::Int { lit, hex: false }
        };
        Ok(())
    }

    fn digits(&mut self) {
        while let Some(c) = self.peek()
            && (c.is_ascii_digit() || c == '_')
        {
            self.pos += 1;
        }
    }

    fn string(&mut self) -> Result<(), TextError> {
        self.pos += 1; // opening quote
        let mut out = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(TextError::Syntax("unterminated string literal".to_string()));
            };
            self.pos += c.len_utf8();
            match c {
                '"' => {
                    self.tok = Tok::Str(out);
                    return Ok(());
                }
                '\\' => out.push(self.escape()?),
                _ => out.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char, TextError> {
        let Some(c) = self.peek() else {
            return Err(TextError::Syntax("unterminated escape".to_string()));
        };
        self.pos += c.len_utf8();
        match c {
            '"' => Ok('"'),
            '\\' => Ok('\\'),
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            '0' => Ok('\0'),
            'x' => {
                let hex = self
                    .rest()
                    .get(..2)
                    .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
                    .ok_or_else(|| {
                        TextError::Syntax("\\x escape needs two hex digits".to_string())
                    })?;
                self.pos += 2;
                let code = u8::from_str_radix(hex, 16).unwrap();
                Ok(code as char)
            }
            'u' => {
                if self.peek() != Some('{') {
                    return Err(TextError::Syntax("\\u escape needs braces".to_string()));
                }
                self.pos += 1;
                let Some(end) = self.rest().find('}') else {
                    return Err(TextError::Syntax("unterminated \\u escape".to_string()));
                };
                let digits = &self.rest()[..end];
                let code = u32::from_str_radix(digits, 16)
                    .map_err(|_| TextError::Syntax("invalid \\u escape".to_string()))?;
                self.pos += end + 1;
                char::from_u32(code)
                    .ok_or_else(|| TextError::Syntax("invalid \\u code point".to_string()))
            }
            _ => Err(TextError::Syntax(format!("unknown escape \\{c}"))),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_part(c: char) -> bool {
    is_ident_start(c) || c.is_numeric()
}

fn keyword_or_ident(word: &str) -> Tok {
    match word {
        "let" => Tok::Let,
        "struct" => Tok::Struct,
        "enum" => Tok::Enum,
        "ts" => Tok::Ts,
        "array" => Tok::Array,
        "map" => Tok::Map,
        "null" => Tok::Null,
        "true" => Tok::True,
        "false" => Tok::False,
        "none" => Tok::None_,
        _ => Tok::Ident(word.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tokens(src: &str) -> Vec<Tok> {
        let mut lx = Lexer::new(src).unwrap();
        let mut out = Vec::new();
        while lx.tok != Tok::Eof {
            out.push(lx.tok.clone());
            lx.bump().unwrap();
        }
        out
    }

    #[test]
    fn test_keywords_and_symbols() {
        assert_eq!(
            all_tokens("let x = 1: u32;"),
            vec![
                Tok::Let,
                Tok::Ident("x".to_string()),
                Tok::Eq,
                Tok::Int {
                    lit: "1".to_string(),
                    hex: false,
                },
                Tok::Colon,
                Tok::Ident("u32".to_string()),
                Tok::Semi,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            all_tokens("42 -7 1_000 0xFF_FF 3.25 -1.5e-7 1e300"),
            vec![
                Tok::Int {
                    lit: "42".to_string(),
                    hex: false,
                },
                Tok::Int {
                    lit: "-7".to_string(),
                    hex: false,
                },
                Tok::Int {
                    lit: "1_000".to_string(),
                    hex: false,
                },
                Tok::Int {
                    lit: "0xFF_FF".to_string(),
                    hex: true,
                },
                Tok::Float("3.25".to_string()),
                Tok::Float("-1.5e-7".to_string()),
                Tok::Float("1e300".to_string()),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            all_tokens(r#""a\"b\n\t\\\x41\u{1F600}""#),
            vec![Tok::Str("a\"b\n\t\\A\u{1F600}".to_string())]
        );
    }

    #[test]
    fn test_comments() {
        let src = "# line\n// another\n/* block\nspanning */ 1";
        assert_eq!(
            all_tokens(src),
            vec![Tok::Int {
                lit: "1".to_string(),
                hex: false,
            }]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("\"abc").unwrap_err();
        assert!(matches!(err, TextError::Syntax(_)));
    }
}
