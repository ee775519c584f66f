#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Identifier,
    String,
    Number,
    /// Reserved. Dates travel as strings and are parsed at evaluation time.
    Date,
    Boolean,
    /// `= != > >= < <=`
    Operator,
    /// `AND` / `OR`, always upper-cased.
    Logical,
    /// `not` and the word operators, always lower-cased.
    Keyword,
    LParen,
    RParen,
    Comma,
    /// An identifier directly followed by `(`.
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset into the query string.
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            offset,
        }
    }

    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

const KEYWORDS: &[&str] = &[
    "not",
    "contains",
    "in",
    "after",
    "before",
    "within",
    "has",
    "starts_with",
    "ends_with",
    "matches",
    "between",
];

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        while let Some(c) = self.current_char() {
            match c {
                ' ' | '\t' | '\n' | '\r' => self.advance(c),
                '"' | '\'' => self.read_string(c),
                '0'..='9' => self.read_number(),
                '.' if self.peek_char(1).is_some_and(|n| n.is_ascii_digit()) => self.read_number(),
                '>' | '<' | '!' | '=' => self.read_operator(c),
                '(' => self.single(TokenKind::LParen, c),
                ')' => self.single(TokenKind::RParen, c),
                ',' => self.single(TokenKind::Comma, c),
                c if c.is_alphabetic() || c == '_' => self.read_identifier(),
                // Anything else is dropped without a diagnostic.
                _ => self.advance(c),
            }
        }
        self.tokens
            .push(Token::new(TokenKind::Eof, "", self.input.len()));
        self.tokens
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn advance(&mut self, c: char) {
        self.pos += c.len_utf8();
    }

    fn single(&mut self, kind: TokenKind, c: char) {
        self.tokens.push(Token::new(kind, c, self.pos));
        self.advance(c);
    }

    fn read_string(&mut self, quote: char) {
        let start = self.pos;
        self.advance(quote);
        let mut text = String::new();
        while let Some(c) = self.current_char() {
            self.advance(c);
            if c == quote {
                break;
            }
            if c == '\\' {
                if let Some(escaped) = self.current_char() {
                    text.push(escaped);
                    self.advance(escaped);
                }
                continue;
            }
            text.push(c);
        }
        self.tokens.push(Token::new(TokenKind::String, text, start));
    }

    fn read_number(&mut self) {
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if c.is_ascii_digit() || c == '.' {
                self.advance(c);
            } else {
                break;
            }
        }
        let text = &self.input[start..self.pos];
        self.tokens.push(Token::new(TokenKind::Number, text, start));
    }

    fn read_operator(&mut self, c: char) {
        let start = self.pos;
        if self.peek_char(1) == Some('=') && c != '=' {
            self.pos += 2;
            self.tokens
                .push(Token::new(TokenKind::Operator, &self.input[start..self.pos], start));
            return;
        }
        self.advance(c);
        if c != '!' {
            self.tokens.push(Token::new(TokenKind::Operator, c, start));
        }
    }

    fn read_identifier(&mut self) {
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if c.is_alphanumeric() || c == '_' {
                self.advance(c);
            } else {
                break;
            }
        }
        let text = &self.input[start..self.pos];
        let lower = text.to_lowercase();

        let token = match lower.as_str() {
            "and" | "or" => Token::new(TokenKind::Logical, lower.to_uppercase(), start),
            "true" | "false" => Token::new(TokenKind::Boolean, lower.clone(), start),
            kw if KEYWORDS.contains(&kw) => Token::new(TokenKind::Keyword, kw, start),
            _ if self.next_non_whitespace() == Some('(') => {
                Token::new(TokenKind::Function, text, start)
            }
            _ => Token::new(TokenKind::Identifier, text, start),
        };
        self.tokens.push(token);
    }

    fn next_non_whitespace(&self) -> Option<char> {
        self.input[self.pos..]
            .chars()
            .find(|c| !matches!(c, ' ' | '\t' | '\n' | '\r'))
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}
