//! # Type String Parsing
//!
//! Parses the type strings carried by a row-stream header (for example
//! `Nullable(Array(Int32))`, `Map(String, UInt8)` or
//! `AggregateFunction(groupBitmap, UInt32)`) into [`Column`] descriptor
//! trees. The grammar is a small recursive one: a kind name optionally
//! followed by a parenthesized argument list, where arguments are themselves
//! types, numbers, quoted literals, or `name Type` pairs for tuple-like
//! kinds.
//!
//! Anything outside the closed kind set — including `LowCardinality(...)`,
//! which changes the wire encoding itself — fails with `UnsupportedType`.
//! Timezone arguments on `DateTime`/`DateTime64` are accepted and dropped:
//! they do not affect the byte layout.

use eyre::Result;

use super::{Column, ColumnKind};
use crate::error::WireError;

impl Column {
    /// Parses a header type string into a descriptor with the given name.
    pub fn parse(name: impl Into<String>, type_str: &str) -> Result<Column> {
        let column = parse_type(type_str.trim())?;
        Ok(column.renamed(name))
    }
}

fn unsupported(s: &str) -> eyre::Report {
    WireError::UnsupportedType(s.to_string()).into()
}

fn invalid(what: impl Into<String>) -> eyre::Report {
    WireError::InvalidData(what.into()).into()
}

/// Returns the argument list of `prefix(...)` when `s` has that shape.
fn wrapped<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() > prefix.len() + 1 && s.starts_with(prefix) && s.as_bytes()[prefix.len()] == b'(' && s.ends_with(')') {
        Some(&s[prefix.len() + 1..s.len() - 1])
    } else {
        None
    }
}

/// Splits `s` on top-level commas, respecting parentheses and single-quoted
/// literals with backslash escapes.
fn split_args(s: &str) -> Result<Vec<&str>> {
    let mut args = Vec::new();
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut escaped = false;
    let mut start = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if quoted => escaped = true,
            b'\'' => quoted = !quoted,
            b'(' if !quoted => depth += 1,
            b')' if !quoted => {
                if depth == 0 {
                    return Err(invalid(format!("unbalanced parentheses in type: {}", s)));
                }
                depth -= 1;
            }
            b',' if !quoted && depth == 0 => {
                args.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || quoted {
        return Err(invalid(format!("unterminated type argument list: {}", s)));
    }
    args.push(s[start..].trim());
    Ok(args)
}

/// A tuple-like argument is either a bare type or a `name Type` pair.
fn parse_field(s: &str) -> Result<Column> {
    match parse_type(s) {
        Ok(column) => Ok(column),
        Err(err) => {
            if let Some((name, rest)) = s.split_once(' ') {
                if !name.contains('(') && ColumnKind::from_name(name).is_none() {
                    return Ok(parse_type(rest.trim())?.renamed(name));
                }
            }
            Err(err)
        }
    }
}

fn parse_enum_values(args: &str) -> Result<Vec<(String, i16)>> {
    let mut values = Vec::new();
    for entry in split_args(args)? {
        let (name, value) = entry
            .rsplit_once('=')
            .ok_or_else(|| invalid(format!("enum entry without '=': {}", entry)))?;
        let name = name.trim();
        if name.len() < 2 || !name.starts_with('\'') || !name.ends_with('\'') {
            return Err(invalid(format!("enum entry name must be quoted: {}", entry)));
        }
        let unquoted = name[1..name.len() - 1].replace("\\'", "'");
        let ordinal: i16 = value
            .trim()
            .parse()
            .map_err(|_| invalid(format!("enum entry value is not an integer: {}", entry)))?;
        values.push((unquoted, ordinal));
    }
    Ok(values)
}

fn parse_scale(s: &str) -> Result<u8> {
    s.parse()
        .map_err(|_| invalid(format!("expected a scale, got: {}", s)))
}

fn parse_type(s: &str) -> Result<Column> {
    if s.is_empty() {
        return Err(invalid("empty type string"));
    }

    if let Some(inner) = wrapped(s, "Nullable") {
        return Ok(parse_type(inner.trim())?.nullable());
    }
    if wrapped(s, "LowCardinality").is_some() {
        return Err(unsupported(s));
    }
    if let Some(inner) = wrapped(s, "Array") {
        return Ok(Column::array("", parse_type(inner.trim())?));
    }
    if let Some(inner) = wrapped(s, "Map") {
        let args = split_args(inner)?;
        if args.len() != 2 {
            return Err(invalid(format!("Map expects 2 type arguments: {}", s)));
        }
        return Ok(Column::map("", parse_type(args[0])?, parse_type(args[1])?));
    }
    if let Some(inner) = wrapped(s, "Tuple") {
        let fields = split_args(inner)?
            .into_iter()
            .map(parse_field)
            .collect::<Result<Vec<_>>>()?;
        return Ok(Column::tuple("", fields));
    }
    if let Some(inner) = wrapped(s, "Nested") {
        let fields = split_args(inner)?
            .into_iter()
            .map(parse_field)
            .collect::<Result<Vec<_>>>()?;
        return Ok(Column::nested("", fields));
    }
    if let Some(inner) = wrapped(s, "FixedString") {
        let len: usize = inner
            .trim()
            .parse()
            .map_err(|_| invalid(format!("FixedString expects a length: {}", s)))?;
        return Ok(Column::fixed_string("", len));
    }
    if let Some(inner) = wrapped(s, "Decimal") {
        let args = split_args(inner)?;
        if args.len() != 2 {
            return Err(invalid(format!("Decimal expects (precision, scale): {}", s)));
        }
        let precision: u8 = args[0]
            .parse()
            .map_err(|_| invalid(format!("bad decimal precision: {}", s)))?;
        if precision == 0 || precision > 76 {
            return Err(unsupported(s));
        }
        return Ok(Column::decimal("", precision, parse_scale(args[1])?));
    }
    for (prefix, precision) in [
        ("Decimal32", 9u8),
        ("Decimal64", 18),
        ("Decimal128", 38),
        ("Decimal256", 76),
    ] {
        if let Some(inner) = wrapped(s, prefix) {
            return Ok(Column::decimal("", precision, parse_scale(inner.trim())?));
        }
    }
    if let Some(inner) = wrapped(s, "DateTime64") {
        let args = split_args(inner)?;
        // optional second argument is a timezone literal; wire-irrelevant
        return Ok(Column::datetime64("", parse_scale(args[0])?));
    }
    if wrapped(s, "DateTime").is_some() {
        return Ok(Column::new("", ColumnKind::DateTime));
    }
    if let Some(inner) = wrapped(s, "Enum8") {
        return Ok(Column::enum8("", parse_enum_values(inner)?));
    }
    if let Some(inner) = wrapped(s, "Enum16") {
        return Ok(Column::enum16("", parse_enum_values(inner)?));
    }
    if let Some(inner) = wrapped(s, "SimpleAggregateFunction") {
        let args = split_args(inner)?;
        if args.len() != 2 {
            return Err(invalid(format!(
                "SimpleAggregateFunction expects (function, type): {}",
                s
            )));
        }
        return Ok(Column::simple_aggregate("", args[0], parse_type(args[1])?));
    }
    if let Some(inner) = wrapped(s, "AggregateFunction") {
        let args = split_args(inner)?;
        if args.len() != 2 {
            return Err(invalid(format!(
                "AggregateFunction expects (function, type): {}",
                s
            )));
        }
        return Ok(Column::aggregate("", args[0], parse_type(args[1])?));
    }

    match ColumnKind::from_name(s) {
        Some(kind) => Ok(Column::new("", kind)),
        None => Err(unsupported(s)),
    }
}
