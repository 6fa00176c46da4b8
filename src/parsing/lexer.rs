use super::ParseError;
use nom::{
    IResult, Parser,
    bytes::complete::take_while,
    character::complete::{char, satisfy, space0},
    combinator::{opt, recognize},
    error::{Error, ErrorKind},
    multi::separated_list0,
    sequence::{delimited, pair},
};

/// One line of text exposition format, tokenized but not interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum Line<'a> {
    Blank,
    Comment,
    Help { name: &'a str, text: String },
    Type { name: &'a str, type_name: &'a str },
    Sample(RawSample<'a>),
}

/// A sample line whose value and timestamp are still raw tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample<'a> {
    pub name: &'a str,
    pub labels: Vec<(&'a str, String)>,
    pub value: &'a str,
    pub timestamp: Option<&'a str>,
}

#[inline]
fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

pub fn metric_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_' || c == ':'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == ':'),
    ))
    .parse(input)
}

pub fn label_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// A double quoted label value, with `\\`, `\"` and `\n` escapes.
pub fn label_value(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"').parse(input)?;
    let mut value = String::new();
    let mut chars = input.char_indices();
    loop {
        match chars.next() {
            Some((position, '"')) => return Ok((&input[position + 1..], value)),
            Some((_, '\\')) => match chars.next() {
                Some((_, '\\')) => value.push('\\'),
                Some((_, '"')) => value.push('"'),
                Some((_, 'n')) => value.push('\n'),
                _ => return Err(nom::Err::Error(Error::new(input, ErrorKind::Escaped))),
            },
            Some((_, c)) => value.push(c),
            None => return Err(nom::Err::Error(Error::new(input, ErrorKind::Char))),
        }
    }
}

fn label_pair(input: &str) -> IResult<&str, (&str, String)> {
    (label_name, space0, char('='), space0, label_value)
        .map(|(name, _, _, _, value)| (name, value))
        .parse(input)
}

/// `{name="value",...}`, a trailing comma is tolerated.
pub fn label_set(input: &str) -> IResult<&str, Vec<(&str, String)>> {
    delimited(
        (char('{'), space0),
        separated_list0((space0, char(','), space0), label_pair),
        (space0, opt(char(',')), space0, char('}')),
    )
    .parse(input)
}

fn unescape_help(text: &str) -> Result<String, String> {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => unescaped.push('\\'),
            Some('n') => unescaped.push('\n'),
            Some(other) => return Err(format!("invalid escape sequence '\\{}' in HELP", other)),
            None => return Err("HELP text ends with a lone backslash".to_string()),
        }
    }
    Ok(unescaped)
}

fn lex_comment(line: &str) -> Result<Line<'_>, String> {
    let body = line[1..].trim_start_matches(is_blank);
    let (keyword, rest) = body.split_once(is_blank).unwrap_or((body, ""));
    let rest = rest.trim_start_matches(is_blank);

    match keyword {
        "HELP" => {
            let (after, name) = metric_name(rest)
                .map_err(|_| format!("HELP line without a valid metric name: {:?}", line))?;
            if !after.is_empty() && !after.starts_with(is_blank) {
                return Err(format!("invalid metric name in HELP line: {:?}", line));
            }
            let text = unescape_help(after.trim_start_matches(is_blank))?;
            Ok(Line::Help { name, text })
        }
        "TYPE" => {
            let (after, name) = metric_name(rest)
                .map_err(|_| format!("TYPE line without a valid metric name: {:?}", line))?;
            let mut fields = after.split_ascii_whitespace();
            match (fields.next(), fields.next()) {
                (Some(type_name), None) if after.starts_with(is_blank) => {
                    Ok(Line::Type { name, type_name })
                }
                (None, _) => Err(format!("TYPE line for {} has no type", name)),
                _ => Err(format!("malformed TYPE line: {:?}", line)),
            }
        }
        _ => Ok(Line::Comment),
    }
}

fn lex_sample(line: &str) -> Result<RawSample<'_>, String> {
    let (input, name) =
        metric_name(line).map_err(|_| format!("invalid metric name in line {:?}", line))?;

    let trimmed = input.trim_start_matches(is_blank);
    let (input, labels) = if trimmed.starts_with('{') {
        label_set(trimmed).map_err(|_| format!("malformed label set for metric {}", name))?
    } else if trimmed.len() == input.len() && !input.is_empty() {
        return Err(format!("unexpected character after metric name {}", name));
    } else {
        (trimmed, Vec::new())
    };

    let mut fields = input.split_ascii_whitespace();
    let value = fields
        .next()
        .ok_or_else(|| format!("missing value for metric {}", name))?;
    let timestamp = fields.next();
    if fields.next().is_some() {
        return Err(format!("unexpected content after the sample of metric {}", name));
    }

    Ok(RawSample {
        name,
        labels,
        value,
        timestamp,
    })
}

pub fn lex_line(line: &str) -> Result<Line<'_>, String> {
    let line = line.trim_start_matches(is_blank);
    if line.trim_end().is_empty() {
        Ok(Line::Blank)
    } else if line.starts_with('#') {
        lex_comment(line)
    } else {
        lex_sample(line).map(Line::Sample)
    }
}

/// Tokenizes a whole payload. Lines are numbered from 1.
pub fn lex(text: &str) -> Result<Vec<(usize, Line<'_>)>, ParseError> {
    text.lines()
        .enumerate()
        .map(|(index, line)| {
            lex_line(line)
                .map(|lexed| (index + 1, lexed))
                .map_err(|message| ParseError::new(index + 1, message))
        })
        .collect()
}
