//! JSON grammar for bmson, using chumsky.
//!
//! Unlike ordinary JSON decoders, objects keep their members in document order including repeated keys, so that the checker can tell which keys are repeated.

use std::ops::Range;

use chumsky::prelude::*;

/// A JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Json {
    /// Placeholder of a value which could not be parsed.
    Invalid,
    /// `null`.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// A string with escapes resolved.
    Str(String),
    /// A number. JSON does not distinguish integers.
    Number(f64),
    /// An array.
    Array(Vec<Json>),
    /// An object, members in document order.
    Object(Vec<(String, Json)>),
}

/// A syntax error in JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct JsonSyntaxError {
    /// Description of the error.
    pub message: String,
    /// Byte range of the error in the text.
    pub span: Range<usize>,
}

impl std::fmt::Display for JsonSyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

fn parser<'a>() -> impl Parser<'a, &'a str, Json, extra::Err<Rich<'a, char>>> {
    recursive(|value| {
        let digits = text::digits(10).to_slice();

        let frac = just('.').then(digits);

        let exp = just('e')
            .or(just('E'))
            .then(one_of("+-").or_not())
            .then(digits);

        let number = just('-')
            .or_not()
            .then(text::int(10))
            .then(frac.or_not())
            .then(exp.or_not())
            .to_slice()
            .validate(|s: &str, e, emitter| {
                s.parse::<f64>().unwrap_or_else(|_| {
                    emitter.emit(Rich::custom(e.span(), "invalid number"));
                    0.0
                })
            })
            .map(Json::Number)
            .boxed();

        let escape = just('\\')
            .ignore_then(choice((
                just('\\'),
                just('/'),
                just('"'),
                just('b').to('\x08'),
                just('f').to('\x0C'),
                just('n').to('\n'),
                just('r').to('\r'),
                just('t').to('\t'),
                just('u').ignore_then(text::digits(16).exactly(4).to_slice().validate(
                    |digits: &str, e, emitter| {
                        u32::from_str_radix(digits, 16)
                            .ok()
                            .and_then(char::from_u32)
                            .unwrap_or_else(|| {
                                emitter.emit(Rich::custom(e.span(), "invalid unicode character"));
                                '\u{FFFD}'
                            })
                    },
                )),
            )))
            .boxed();

        let string = none_of("\\\"")
            .or(escape)
            .repeated()
            .collect::<String>()
            .delimited_by(just('"'), just('"'))
            .boxed();

        let array = value
            .clone()
            .separated_by(just(',').padded().recover_with(skip_then_retry_until(
                any().ignored(),
                one_of(",]").ignored(),
            )))
            .allow_trailing()
            .collect()
            .padded()
            .delimited_by(
                just('['),
                just(']')
                    .ignored()
                    .recover_with(via_parser(end()))
                    .recover_with(skip_then_retry_until(any().ignored(), end())),
            )
            .boxed();

        let member = string.clone().then_ignore(just(':').padded()).then(value);
        let object = member
            .clone()
            .separated_by(just(',').padded().recover_with(skip_then_retry_until(
                any().ignored(),
                one_of(",}").ignored(),
            )))
            .collect()
            .padded()
            .delimited_by(
                just('{'),
                just('}')
                    .ignored()
                    .recover_with(via_parser(end()))
                    .recover_with(skip_then_retry_until(any().ignored(), end())),
            )
            .boxed();

        choice((
            just("null").to(Json::Null),
            just("true").to(Json::Bool(true)),
            just("false").to(Json::Bool(false)),
            number,
            string.map(Json::Str),
            array.map(Json::Array),
            object.map(Json::Object),
        ))
        .recover_with(via_parser(nested_delimiters(
            '{',
            '}',
            [('[', ']')],
            |_| Json::Invalid,
        )))
        .recover_with(via_parser(nested_delimiters(
            '[',
            ']',
            [('{', '}')],
            |_| Json::Invalid,
        )))
        .recover_with(skip_then_retry_until(
            any().ignored(),
            one_of(",]}").ignored(),
        ))
        .padded()
    })
}

/// Parses JSON text, returning the recovered value and the syntax errors.
///
/// The value is meaningful only if there are no errors.
///
/// ```
/// use bms_check::bmson::parser::{Json, parse_json};
///
/// let (json, errors) = parse_json(r#"{"a": 1, "a": "two"}"#);
/// assert!(errors.is_empty());
/// assert_eq!(
///     json,
///     Some(Json::Object(vec![
///         ("a".into(), Json::Number(1.0)),
///         ("a".into(), Json::Str("two".into())),
///     ]))
/// );
/// ```
#[must_use]
pub fn parse_json(src: &str) -> (Option<Json>, Vec<JsonSyntaxError>) {
    let (json, errors) = parser().parse(src).into_output_errors();
    let errors = errors
        .into_iter()
        .map(|error| JsonSyntaxError {
            message: error.to_string(),
            span: error.span().into_range(),
        })
        .collect();
    (json, errors)
}

/// Formats a float in its shortest representation, in exponent form if the exponent is less than -4 or at least 6.
///
/// ```
/// use bms_check::bmson::parser::format_float;
///
/// assert_eq!(format_float(1.5), "1.5");
/// assert_eq!(format_float(120.0), "120");
/// assert_eq!(format_float(1_000_000.0), "1e+06");
/// assert_eq!(format_float(0.00001), "1e-05");
/// ```
#[must_use]
pub fn format_float(value: f64) -> String {
    if !value.is_finite() {
        return match value {
            v if v.is_nan() => "NaN".to_string(),
            v if v > 0.0 => "+Inf".to_string(),
            _ => "-Inf".to_string(),
        };
    }
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if value != 0.0 && !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
    } else {
        value.to_string()
    }
}

fn write_escaped(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if u32::from(c) < 0x20 => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
}

impl Json {
    /// Renders as compact JSON text.
    #[must_use]
    pub fn to_compact(&self) -> String {
        let mut out = String::new();
        self.write_compact(&mut out);
        out
    }

    fn write_compact(&self, out: &mut String) {
        match self {
            Self::Invalid | Self::Null => out.push_str("null"),
            Self::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Self::Number(n) => out.push_str(&n.to_string()),
            Self::Str(s) => write_escaped(out, s),
            Self::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_compact(out);
                }
                out.push(']');
            }
            Self::Object(members) => {
                out.push('{');
                for (i, (key, value)) in members.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_escaped(out, key);
                    out.push(':');
                    value.write_compact(out);
                }
                out.push('}');
            }
        }
    }

    /// Renders loosely for messages: `<nil>`, bare strings, `[a b]` and `map[k:v]` with sorted keys.
    #[must_use]
    pub fn to_loose_string(&self) -> String {
        match self {
            Self::Invalid | Self::Null => "<nil>".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_float(*n),
            Self::Str(s) => s.clone(),
            Self::Array(items) => format!(
                "[{}]",
                items
                    .iter()
                    .map(Self::to_loose_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            ),
            Self::Object(members) => {
                let mut latest: Vec<(&str, &Self)> = Vec::new();
                for (key, value) in members {
                    match latest.iter().position(|(k, _)| *k == key.as_str()) {
                        Some(i) => {
                            if let Some(entry) = latest.get_mut(i) {
                                entry.1 = value;
                            }
                        }
                        None => latest.push((key, value)),
                    }
                }
                latest.sort_by(|a, b| a.0.cmp(b.0));
                format!(
                    "map[{}]",
                    latest
                        .iter()
                        .map(|(key, value)| format!("{key}:{}", value.to_loose_string()))
                        .collect::<Vec<_>>()
                        .join(" ")
                )
            }
        }
    }
}
