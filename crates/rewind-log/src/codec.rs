//! Value codec: the textual notation shared by the event log and the
//! persisted `objects.data` column.
//!
//! # Grammar
//!
//! | Form | Example | Value |
//! |------|---------|-------|
//! | integer | `-12` | [`Value::Integer`] |
//! | float | `1.5`, `2e-07`, `inf`, `nan` | [`Value::Float`] |
//! | text | `"a\"b"`, `'x\x00'` | [`Value::Text`] |
//! | boolean | `True`, `False` | [`Value::Boolean`] |
//! | null | `None` | [`Value::Null`] |
//! | heap reference | `*140235` | [`Value::HeapRef`] |
//!
//! Serialized objects additionally use `^id` for a nested object persisted
//! in the same mutation, `[a, b]` for sequences and sets, and `{k: v}` for
//! mappings. Nested references and containers only ever appear in stored
//! object text, never in log arguments, so the parser does not read them.

use rewind_types::{Object, ObjectId, SlotId, Value};

use crate::error::FormatError;

/// Parse one complete value token.
///
/// # Errors
///
/// Returns [`FormatError::Value`] if the token is not a single well-formed
/// value.
pub fn parse_value(token: &str) -> Result<Value, FormatError> {
    let (value, used) = scan_value(token).map_err(|reason| FormatError::Value {
        token: token.to_owned(),
        reason,
    })?;
    if used == token.len() {
        Ok(value)
    } else {
        Err(FormatError::Value {
            token: token.to_owned(),
            reason: format!("unexpected trailing input after byte {used}"),
        })
    }
}

/// Scan one value from the start of `input`.
///
/// Returns the value and the number of bytes it occupied, or a reason the
/// input does not start with a value.
pub(crate) fn scan_value(input: &str) -> Result<(Value, usize), String> {
    match input.as_bytes().first() {
        None => Err("expected a value".to_owned()),
        Some(b'*') => scan_heap_ref(input),
        Some(b'"' | b'\'') => scan_text(input),
        Some(b'-' | b'0'..=b'9') => scan_number(input),
        Some(_) => scan_word(input),
    }
}

/// Count leading ASCII digits.
fn digit_run(input: &str) -> usize {
    input.bytes().take_while(u8::is_ascii_digit).count()
}

fn scan_heap_ref(input: &str) -> Result<(Value, usize), String> {
    let rest = input.get(1..).unwrap_or_default();
    let digits = digit_run(rest);
    if digits == 0 {
        return Err("expected digits after `*`".to_owned());
    }
    let raw = rest.get(..digits).unwrap_or_default();
    let slot: u64 = raw
        .parse()
        .map_err(|e| format!("heap reference `*{raw}` out of range: {e}"))?;
    Ok((Value::HeapRef(SlotId(slot)), digits.saturating_add(1)))
}

fn scan_number(input: &str) -> Result<(Value, usize), String> {
    let sign = usize::from(input.starts_with('-'));
    let unsigned = input.get(sign..).unwrap_or_default();

    if unsigned.starts_with("inf") {
        let value = if sign == 1 { f64::NEG_INFINITY } else { f64::INFINITY };
        return Ok((Value::Float(value), sign.saturating_add(3)));
    }

    let int_digits = digit_run(unsigned);
    if int_digits == 0 {
        return Err("expected digits".to_owned());
    }
    let mut end = sign.saturating_add(int_digits);
    let mut is_float = false;

    // Optional fraction: `.` followed by at least one digit.
    if input.get(end..).is_some_and(|rest| rest.starts_with('.')) {
        let frac = digit_run(input.get(end.saturating_add(1)..).unwrap_or_default());
        if frac == 0 {
            return Err("expected digits after `.`".to_owned());
        }
        end = end.saturating_add(1).saturating_add(frac);
        is_float = true;
    }

    // Optional exponent: `e`/`E`, optional sign, at least one digit.
    let rest = input.get(end..).unwrap_or_default();
    if rest.starts_with('e') || rest.starts_with('E') {
        let after_e = rest.get(1..).unwrap_or_default();
        let exp_sign = usize::from(after_e.starts_with('+') || after_e.starts_with('-'));
        let exp_digits = digit_run(after_e.get(exp_sign..).unwrap_or_default());
        if exp_digits == 0 {
            return Err("expected digits in exponent".to_owned());
        }
        end = end
            .saturating_add(1)
            .saturating_add(exp_sign)
            .saturating_add(exp_digits);
        is_float = true;
    }

    let text = input.get(..end).unwrap_or_default();
    let value = if is_float {
        Value::Float(
            text.parse()
                .map_err(|e| format!("invalid float `{text}`: {e}"))?,
        )
    } else {
        Value::Integer(
            text.parse()
                .map_err(|e| format!("integer `{text}` out of range: {e}"))?,
        )
    };
    Ok((value, end))
}

fn scan_word(input: &str) -> Result<(Value, usize), String> {
    let len = input
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    let word = input.get(..len).unwrap_or_default();
    let value = match word {
        "True" => Value::Boolean(true),
        "False" => Value::Boolean(false),
        "None" => Value::Null,
        "inf" => Value::Float(f64::INFINITY),
        "nan" => Value::Float(f64::NAN),
        "" => {
            let found = input.chars().next().unwrap_or(' ');
            return Err(format!("unexpected character `{found}`"));
        }
        other => return Err(format!("unknown literal `{other}`")),
    };
    Ok((value, len))
}

fn scan_text(input: &str) -> Result<(Value, usize), String> {
    let mut chars = input.char_indices();
    let Some((_, quote)) = chars.next() else {
        return Err("expected a quote".to_owned());
    };
    let mut out = String::new();

    while let Some((pos, c)) = chars.next() {
        if c == quote {
            return Ok((Value::Text(out), pos.saturating_add(c.len_utf8())));
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some((_, escaped)) = chars.next() else {
            break;
        };
        match escaped {
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'x' => {
                let hex: String = chars.by_ref().take(2).map(|(_, h)| h).collect();
                let byte = u8::from_str_radix(&hex, 16)
                    .map_err(|e| format!("invalid escape `\\x{hex}`: {e}"))?;
                out.push(char::from(byte));
            }
            other => return Err(format!("unknown escape `\\{other}`")),
        }
    }
    Err("unterminated text literal".to_owned())
}

/// Render a value in log notation.
pub fn render_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Integer(n) => out.push_str(&n.to_string()),
        Value::Float(f) => out.push_str(&render_float(*f)),
        Value::Text(s) => write_text(out, s),
        Value::Boolean(true) => out.push_str("True"),
        Value::Boolean(false) => out.push_str("False"),
        Value::Null => out.push_str("None"),
        Value::HeapRef(slot) => {
            out.push('*');
            out.push_str(&slot.to_string());
        }
    }
}

/// Shortest round-tripping form; always distinguishable from an integer.
fn render_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_owned()
    } else if f.is_infinite() {
        if f.is_sign_positive() { "inf" } else { "-inf" }.to_owned()
    } else {
        format!("{f:?}")
    }
}

fn write_text(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_ascii_control() => {
                out.push_str(&format!("\\x{:02x}", u32::from(c)));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_members(out: &mut String, items: &[Value]) {
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_value(out, item);
    }
    out.push(']');
}

fn write_pairs(out: &mut String, pairs: &[(Value, Value)]) {
    out.push('{');
    for (i, (key, value)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_value(out, key);
        out.push_str(": ");
        write_value(out, value);
    }
    out.push('}');
}

/// Serialize an object to its persisted text form.
///
/// `nested` is called for every nested object that must be persisted first
/// (the attribute bag of an instance) and returns the id to reference with
/// `^id`. It runs within the same mutation call as the outer save.
///
/// # Errors
///
/// Propagates any error returned by `nested`.
pub fn serialize<E, F>(object: &Object, nested: &mut F) -> Result<String, E>
where
    F: FnMut(&Object) -> Result<ObjectId, E>,
{
    let mut out = String::new();
    match object {
        Object::List(items) | Object::Tuple(items) | Object::Set(items) => {
            write_members(&mut out, items);
        }
        Object::Dict(pairs) => write_pairs(&mut out, pairs),
        Object::Str(s) => write_text(&mut out, s),
        Object::Instance { type_ref, attrs } => {
            let attrs_id = nested(&Object::Dict(attrs.clone()))?;
            out.push_str("{\"__type__\": ");
            write_value(&mut out, type_ref);
            out.push_str(", \"__dict__\": ^");
            out.push_str(&attrs_id.to_string());
            out.push('}');
        }
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::panic)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Serialize an object that is known to have no nested members.
    fn flat(object: &Object) -> String {
        serialize(object, &mut |_: &Object| Err::<ObjectId, ()>(())).unwrap()
    }

    #[test]
    fn parses_scalars() {
        assert_eq!(parse_value("42").unwrap(), Value::Integer(42));
        assert_eq!(parse_value("-7").unwrap(), Value::Integer(-7));
        assert_eq!(parse_value("1.5").unwrap(), Value::Float(1.5));
        assert_eq!(parse_value("2e-07").unwrap(), Value::Float(2e-7));
        assert_eq!(parse_value("1.25E+3").unwrap(), Value::Float(1250.0));
        assert_eq!(parse_value("True").unwrap(), Value::Boolean(true));
        assert_eq!(parse_value("False").unwrap(), Value::Boolean(false));
        assert_eq!(parse_value("None").unwrap(), Value::Null);
        assert_eq!(parse_value("*99").unwrap(), Value::HeapRef(SlotId(99)));
    }

    #[test]
    fn parses_special_floats() {
        assert_eq!(parse_value("inf").unwrap(), Value::Float(f64::INFINITY));
        assert_eq!(parse_value("-inf").unwrap(), Value::Float(f64::NEG_INFINITY));
        let Value::Float(nan) = parse_value("nan").unwrap() else {
            panic!("expected float");
        };
        assert!(nan.is_nan());
    }

    #[test]
    fn parses_text_escapes() {
        assert_eq!(
            parse_value(r#""a\"b\\c\nd\te\rf""#).unwrap(),
            Value::Text("a\"b\\c\nd\te\rf".to_owned())
        );
        assert_eq!(
            parse_value(r"'it\'s'").unwrap(),
            Value::Text("it's".to_owned())
        );
        assert_eq!(
            parse_value(r#"'\x41\x00'"#).unwrap(),
            Value::Text("A\u{0}".to_owned())
        );
        assert_eq!(
            parse_value("\"h\u{e9}llo\"").unwrap(),
            Value::Text("h\u{e9}llo".to_owned())
        );
    }

    #[test]
    fn rejects_malformed_tokens() {
        for token in ["", "*", "*x", "1.", "1e", "\"open", "'bad\\q'", "true", "@", "12abc"] {
            assert!(
                matches!(parse_value(token), Err(FormatError::Value { .. })),
                "expected {token:?} to be rejected"
            );
        }
    }

    #[test]
    fn rejects_integer_overflow() {
        assert!(parse_value("99999999999999999999").is_err());
    }

    #[test]
    fn float_rendering_never_looks_like_integer() {
        assert_eq!(render_value(&Value::Float(1.0)), "1.0");
        assert_eq!(parse_value(&render_value(&Value::Float(1e21))).unwrap(), Value::Float(1e21));
        assert_eq!(render_value(&Value::Float(f64::NEG_INFINITY)), "-inf");
    }

    #[test]
    fn serializes_containers_byte_for_byte() {
        let list = Object::List(vec![
            Value::Integer(1),
            Value::Text("two".to_owned()),
            Value::HeapRef(SlotId(3)),
            Value::Null,
        ]);
        assert_eq!(flat(&list), r#"[1, "two", *3, None]"#);

        let dict = Object::Dict(vec![
            (Value::from("a"), Value::Integer(1)),
            (Value::Integer(2), Value::Boolean(false)),
        ]);
        assert_eq!(flat(&dict), r#"{"a": 1, 2: False}"#);

        assert_eq!(flat(&Object::Set(Vec::new())), "[]");
        assert_eq!(flat(&Object::Dict(Vec::new())), "{}");
        assert_eq!(flat(&Object::Str("x\ny".to_owned())), r#""x\ny""#);
    }

    #[test]
    fn instance_references_nested_attribute_bag() {
        let instance = Object::Instance {
            type_ref: Value::HeapRef(SlotId(500)),
            attrs: vec![(Value::from("x"), Value::Integer(1))],
        };
        let mut seen = Vec::new();
        let text = serialize(&instance, &mut |nested: &Object| {
            seen.push(nested.clone());
            Ok::<_, ()>(ObjectId(17))
        })
        .unwrap();
        assert_eq!(text, r#"{"__type__": *500, "__dict__": ^17}"#);
        assert_eq!(
            seen,
            vec![Object::Dict(vec![(Value::from("x"), Value::Integer(1))])]
        );
    }

    #[test]
    fn serialization_is_deterministic() {
        let obj = Object::Tuple(vec![Value::Float(0.1), Value::from("q\"")]);
        assert_eq!(flat(&obj), flat(&obj));
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::Integer),
            any::<f64>()
                .prop_filter("finite", |f| f.is_finite())
                .prop_map(Value::Float),
            any::<String>().prop_map(Value::Text),
            any::<bool>().prop_map(Value::Boolean),
            Just(Value::Null),
            any::<u64>().prop_map(|n| Value::HeapRef(SlotId(n))),
        ]
    }

    proptest! {
        #[test]
        fn prop_scalar_roundtrip(value in scalar()) {
            let text = render_value(&value);
            prop_assert_eq!(parse_value(&text).unwrap(), value);
        }
    }
}
