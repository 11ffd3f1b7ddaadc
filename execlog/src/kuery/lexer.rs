use super::RangeOp;
use crate::errors::KueryError;

/// Unquoted literal. `pattern` is set when the text carries an unescaped `*`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Word {
    pub text: String,
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    LParen,
    RParen,
    Colon,
    Range(RangeOp),
    And,
    Or,
    Not,
    Quoted(String),
    Word(Word),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub position: usize,
}

fn is_special(c: char) -> bool {
    matches!(c, '(' | ')' | ':' | '<' | '>' | '"' | '{' | '}')
}

/// Characters with meaning inside a query_string query
pub(crate) fn push_escaped(pattern: &mut String, c: char) {
    if c.is_whitespace()
        || matches!(
            c,
            '+' | '-' | '=' | '&' | '|' | '>' | '<' | '!' | '(' | ')' | '{' | '}' | '['
                | ']' | '^' | '"' | '~' | '*' | '?' | ':' | '\\' | '/'
        )
    {
        pattern.push('\\');
    }
    pattern.push(c);
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>, KueryError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let token = match c {
            '(' => {
                chars.next();
                Token::LParen
            }
            ')' => {
                chars.next();
                Token::RParen
            }
            ':' => {
                chars.next();
                Token::Colon
            }
            '>' | '<' => {
                chars.next();
                let inclusive = matches!(chars.peek(), Some((_, '=')));
                if inclusive {
                    chars.next();
                }
                Token::Range(match (c, inclusive) {
                    ('>', false) => RangeOp::Gt,
                    ('>', true) => RangeOp::Gte,
                    ('<', false) => RangeOp::Lt,
                    _ => RangeOp::Lte,
                })
            }
            '{' | '}' => {
                return Err(KueryError::UnexpectedToken {
                    found: c.to_string(),
                    position,
                });
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                while let Some((i, c)) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some((_, escaped)) => text.push(escaped),
                            None => return Err(KueryError::InvalidEscape(i)),
                        },
                        _ => text.push(c),
                    }
                }
                if !closed {
                    return Err(KueryError::UnterminatedString(position));
                }
                Token::Quoted(text)
            }
            _ => {
                let mut text = String::new();
                let mut pattern = String::new();
                let mut wildcard = false;
                let mut escaped_any = false;

                while let Some(&(i, c)) = chars.peek() {
                    if c.is_whitespace() || is_special(c) {
                        break;
                    }
                    chars.next();
                    match c {
                        '\\' => match chars.next() {
                            Some((_, escaped)) => {
                                escaped_any = true;
                                text.push(escaped);
                                push_escaped(&mut pattern, escaped);
                            }
                            None => return Err(KueryError::InvalidEscape(i)),
                        },
                        '*' => {
                            wildcard = true;
                            text.push('*');
                            pattern.push('*');
                        }
                        _ => {
                            text.push(c);
                            push_escaped(&mut pattern, c);
                        }
                    }
                }

                if escaped_any {
                    Token::Word(Word {
                        text,
                        pattern: wildcard.then_some(pattern),
                    })
                } else if text.eq_ignore_ascii_case("and") {
                    Token::And
                } else if text.eq_ignore_ascii_case("or") {
                    Token::Or
                } else if text.eq_ignore_ascii_case("not") {
                    Token::Not
                } else {
                    Token::Word(Word {
                        text,
                        pattern: wildcard.then_some(pattern),
                    })
                }
            }
        };

        tokens.push(Spanned { token, position });
    }

    Ok(tokens)
}
