//! Text surface of relevance calls:
//! `fn(field_or_field_list, 'query' [, option=value]*)`.

use crate::{
    relevance::{FieldBoost, FieldSpec, RelevanceCall, RelevanceError, RelevanceKind},
    value::Value,
};

///
/// Token
///

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Quoted { text: String, quote: char },
    Number(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Caret,
    Eq,
}

fn syntax(position: usize, reason: impl Into<String>) -> RelevanceError {
    RelevanceError::Syntax {
        position,
        reason: reason.into(),
    }
}

const fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '*' | '@' | '-')
}

fn tokenize(text: &str) -> Result<Vec<(usize, Token)>, RelevanceError> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while let Some(&(pos, c)) = chars.get(i) {
        let single = match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            ',' => Some(Token::Comma),
            '^' => Some(Token::Caret),
            '=' => Some(Token::Eq),
            _ => None,
        };
        if let Some(token) = single {
            tokens.push((pos, token));
            i += 1;
            continue;
        }

        if c.is_whitespace() {
            i += 1;
        } else if matches!(c, '\'' | '"' | '`') {
            // A doubled quote inside the literal stands for one quote.
            let mut literal = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => return Err(syntax(pos, "unterminated quoted literal")),
                    Some(&(_, q)) if q == c => {
                        if chars.get(i + 1).is_some_and(|&(_, next)| next == c) {
                            literal.push(c);
                            i += 2;
                        } else {
                            i += 1;
                            break;
                        }
                    }
                    Some(&(_, other)) => {
                        literal.push(other);
                        i += 1;
                    }
                }
            }
            tokens.push((pos, Token::Quoted { text: literal, quote: c }));
        } else if c.is_ascii_digit()
            || (matches!(c, '-' | '.')
                && chars.get(i + 1).is_some_and(|&(_, d)| d.is_ascii_digit()))
        {
            let start = i;
            i += 1;
            while chars.get(i).is_some_and(|&(_, d)| d.is_ascii_digit() || d == '.') {
                i += 1;
            }
            let number: String = chars[start..i].iter().map(|&(_, d)| d).collect();
            tokens.push((pos, Token::Number(number)));
        } else if is_ident_char(c) {
            let start = i;
            while chars.get(i).is_some_and(|&(_, d)| is_ident_char(d)) {
                i += 1;
            }
            let ident: String = chars[start..i].iter().map(|&(_, d)| d).collect();
            tokens.push((pos, Token::Ident(ident)));
        } else {
            return Err(syntax(pos, format!("unexpected character '{c}'")));
        }
    }

    Ok(tokens)
}

///
/// Parser
///

struct Parser {
    tokens: Vec<(usize, Token)>,
    cursor: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(_, token)| token)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.cursor).map_or(self.end, |(pos, _)| *pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).map(|(_, token)| token.clone());
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), RelevanceError> {
        let position = self.position();
        match self.advance() {
            Some(token) if token == *expected => Ok(()),
            _ => Err(syntax(position, format!("expected {what}"))),
        }
    }

    fn number(&mut self) -> Result<f64, RelevanceError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Number(text)) => text
                .parse()
                .map_err(|_| syntax(position, format!("invalid number '{text}'"))),
            _ => Err(syntax(position, "expected a number")),
        }
    }

    fn field_name(&mut self) -> Result<String, RelevanceError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Ident(name) | Token::Quoted { text: name, .. }) if !name.is_empty() => {
                Ok(name)
            }
            _ => Err(syntax(position, "expected a field name")),
        }
    }

    // name [ ['^'] number ]
    fn field(&mut self) -> Result<(String, Option<f64>), RelevanceError> {
        let name = self.field_name()?;
        let boost = match self.peek() {
            Some(Token::Caret) => {
                self.cursor += 1;
                Some(self.number()?)
            }
            Some(Token::Number(_)) => Some(self.number()?),
            _ => None,
        };

        Ok((name, boost))
    }

    fn field_spec(&mut self) -> Result<FieldSpec, RelevanceError> {
        if self.peek() != Some(&Token::LBracket) {
            let (field, boost) = self.field()?;
            return Ok(FieldSpec::Single { field, boost });
        }

        self.cursor += 1;
        let mut fields = Vec::new();
        if self.peek() == Some(&Token::RBracket) {
            self.cursor += 1;
            return Ok(FieldSpec::List(fields));
        }
        loop {
            let (field, boost) = self.field()?;
            fields.push(FieldBoost::new(field, boost));

            let position = self.position();
            match self.advance() {
                Some(Token::Comma) => {}
                Some(Token::RBracket) => break,
                _ => return Err(syntax(position, "expected ',' or ']' in field list")),
            }
        }

        Ok(FieldSpec::List(fields))
    }

    fn query_text(&mut self) -> Result<String, RelevanceError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Quoted { text, quote }) if quote != '`' => Ok(text),
            _ => Err(syntax(position, "expected a quoted query string")),
        }
    }

    fn literal(&mut self) -> Result<Value, RelevanceError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Quoted { text, .. }) => Ok(Value::String(text)),
            Some(Token::Number(text)) => {
                if let Ok(v) = text.parse::<i64>() {
                    Ok(i32::try_from(v).map_or(Value::Long(v), Value::Integer))
                } else {
                    text.parse::<f64>()
                        .map(Value::Double)
                        .map_err(|_| syntax(position, format!("invalid number '{text}'")))
                }
            }
            Some(Token::Ident(word)) => Ok(match word.to_ascii_lowercase().as_str() {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                _ => Value::String(word),
            }),
            _ => Err(syntax(position, "expected an option value")),
        }
    }
}

/// Parse a relevance call from its text surface.
///
/// Field lists accept `'f' ^ 1.5`, `f 1.5`, and single, double, or
/// back-quoted names. Shape and option rules are left to `translate`.
pub fn parse_relevance_call(text: &str) -> Result<RelevanceCall, RelevanceError> {
    let mut parser = Parser {
        tokens: tokenize(text)?,
        cursor: 0,
        end: text.len(),
    };

    let position = parser.position();
    let Some(Token::Ident(name)) = parser.advance() else {
        return Err(syntax(position, "expected a relevance function name"));
    };
    let kind =
        RelevanceKind::from_name(&name).ok_or(RelevanceError::UnknownFunction { name })?;

    parser.expect(&Token::LParen, "'('")?;
    let fields = parser.field_spec()?;
    parser.expect(&Token::Comma, "',' after the field specification")?;
    let query = parser.query_text()?;
    let mut call = RelevanceCall::new(kind, fields, query);

    loop {
        let position = parser.position();
        match parser.advance() {
            Some(Token::RParen) => break,
            Some(Token::Comma) => {
                let name = match parser.advance() {
                    Some(Token::Ident(name)) => name,
                    _ => return Err(syntax(position, "expected an option name")),
                };
                parser.expect(&Token::Eq, "'=' after option name")?;
                let value = parser.literal()?;
                call.options.push((name, value));
            }
            _ => return Err(syntax(position, "expected ',' or ')'")),
        }
    }

    if parser.peek().is_some() {
        return Err(syntax(parser.position(), "unexpected input after ')'"));
    }

    Ok(call)
}
