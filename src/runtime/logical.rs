//! Logical-type prepare/read transforms.
//!
//! Serialization calls `prepare_<logical>` to turn the logical value into a
//! primitive-ready one before the underlying primitive writer runs;
//! deserialization reads the primitive value and reconstructs the logical
//! value with `read_<logical>`.
//!
//! Value conventions: decimals are decimal strings (`"-123.45"`), dates are
//! `YYYY-MM-DD`, times are `HH:MM:SS.mmm`, timestamps are RFC 3339. Integer
//! inputs are passed through unchanged on the prepare side, so callers that
//! already hold wire-shaped values keep working.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeDelta, Timelike};
use serde_json::Value;

use super::{CodecError, bytes_value, value_bytes};

fn invalid(detail: impl Into<String>) -> CodecError {
    CodecError::InvalidValue(detail.into())
}

// ————————————————————————————————————————————————————————————————————————————
// DECIMAL
// ————————————————————————————————————————————————————————————————————————————

/// Parse a decimal string into its unscaled integer at the given scale.
fn unscaled_of(s: &str, scale: u32) -> Result<i128, CodecError> {
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, f),
        None => (rest, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid(format!("not a decimal: {s:?}")));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid(format!("not a decimal: {s:?}")));
    }
    if frac_part.len() as u32 > scale {
        return Err(invalid(format!(
            "decimal {s:?} has {} fraction digits, scale is {scale}",
            frac_part.len()
        )));
    }
    let mut unscaled: i128 = 0;
    for b in int_part.bytes().chain(frac_part.bytes()) {
        unscaled = unscaled
            .checked_mul(10)
            .and_then(|u| u.checked_add((b - b'0') as i128))
            .ok_or_else(|| invalid(format!("decimal {s:?} exceeds 38 digits")))?;
    }
    // Pad out to the declared scale.
    for _ in 0..(scale - frac_part.len() as u32) {
        unscaled = unscaled
            .checked_mul(10)
            .ok_or_else(|| invalid(format!("decimal {s:?} exceeds 38 digits")))?;
    }
    Ok(if negative { -unscaled } else { unscaled })
}

fn digit_count(mut u: i128) -> u32 {
    let mut digits = 1;
    u = u.abs();
    while u >= 10 {
        u /= 10;
        digits += 1;
    }
    digits
}

/// Big-endian two's complement with redundant leading bytes stripped.
fn minimal_be(unscaled: i128) -> Vec<u8> {
    let bytes = unscaled.to_be_bytes();
    let mut start = 0;
    while start < 15 {
        let sign_ext = bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0
            || bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0;
        if !sign_ext {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

/// Turn a decimal value into the primitive-ready byte string, minimal-length
/// for `bytes` or exactly `size` bytes (sign-extended) for `fixed`.
pub fn prepare_decimal(
    v: &Value,
    scale: u32,
    precision: u32,
    size: Option<usize>,
) -> Result<Value, CodecError> {
    let unscaled = match v {
        Value::String(s) => unscaled_of(s, scale)?,
        Value::Number(n) => {
            let i = n.as_i64().ok_or_else(|| invalid(format!("not a decimal: {n}")))?;
            (i as i128)
                .checked_mul(10i128.checked_pow(scale).ok_or_else(|| invalid("scale too large"))?)
                .ok_or_else(|| invalid("decimal exceeds 38 digits"))?
        }
        other => return Err(super::mismatch("decimal", other)),
    };
    if precision > 0 && digit_count(unscaled) > precision {
        return Err(invalid(format!(
            "decimal needs {} digits, precision is {precision}",
            digit_count(unscaled)
        )));
    }
    let minimal = minimal_be(unscaled);
    let bytes = match size {
        None => minimal,
        Some(size) => {
            if minimal.len() > size {
                return Err(invalid(format!(
                    "decimal needs {} bytes, fixed size is {size}",
                    minimal.len()
                )));
            }
            let sign = if unscaled < 0 { 0xff } else { 0x00 };
            let mut padded = vec![sign; size - minimal.len()];
            padded.extend_from_slice(&minimal);
            padded
        }
    };
    Ok(bytes_value(&bytes))
}

/// Reconstruct the decimal string from the primitive byte string.
pub fn read_decimal(v: &Value, scale: u32, precision: u32) -> Result<Value, CodecError> {
    let bytes = value_bytes(v)?;
    if bytes.is_empty() || bytes.len() > 16 {
        return Err(invalid(format!("decimal payload of {} bytes", bytes.len())));
    }
    let mut unscaled: i128 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
    for b in &bytes {
        unscaled = (unscaled << 8) | i128::from(*b);
    }
    if precision > 0 && digit_count(unscaled) > precision {
        return Err(invalid(format!(
            "decoded decimal needs {} digits, precision is {precision}",
            digit_count(unscaled)
        )));
    }
    let negative = unscaled < 0;
    let mut digits = unscaled.unsigned_abs().to_string();
    if (digits.len() as u32) <= scale {
        let pad = scale as usize - digits.len() + 1;
        digits = format!("{}{digits}", "0".repeat(pad));
    }
    let text = if scale == 0 {
        digits
    } else {
        let point = digits.len() - scale as usize;
        format!("{}.{}", &digits[..point], &digits[point..])
    };
    Ok(Value::String(if negative { format!("-{text}") } else { text }))
}

pub fn is_decimal_str(v: &Value) -> bool {
    match v {
        Value::Number(n) => n.as_i64().is_some(),
        Value::String(s) => {
            let rest = s.strip_prefix(['-', '+']).unwrap_or(s);
            let (i, f) = rest.split_once('.').unwrap_or((rest, "0"));
            !i.is_empty()
                && !f.is_empty()
                && i.bytes().all(|b| b.is_ascii_digit())
                && f.bytes().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}

// ————————————————————————————————————————————————————————————————————————————
// UUID
// ————————————————————————————————————————————————————————————————————————————

pub fn is_uuid_str(v: &Value) -> bool {
    v.as_str().is_some_and(|s| {
        s.len() == 36
            && s.char_indices().all(|(i, c)| match i {
                8 | 13 | 18 | 23 => c == '-',
                _ => c.is_ascii_hexdigit(),
            })
    })
}

pub fn prepare_uuid(v: &Value) -> Result<Value, CodecError> {
    if is_uuid_str(v) {
        Ok(v.clone())
    } else {
        Err(invalid(format!("not a uuid: {v}")))
    }
}

pub fn read_uuid(v: &Value) -> Result<Value, CodecError> {
    prepare_uuid(v)
}

// ————————————————————————————————————————————————————————————————————————————
// DATE / TIME / TIMESTAMP
// ————————————————————————————————————————————————————————————————————————————

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}

/// `YYYY-MM-DD` → days since the Unix epoch.
pub fn prepare_date(v: &Value) -> Result<Value, CodecError> {
    if v.is_i64() {
        return Ok(v.clone());
    }
    let s = v.as_str().ok_or_else(|| super::mismatch("date", v))?;
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| invalid(format!("date {s:?}: {e}")))?;
    Ok(Value::from((date - epoch()).num_days()))
}

pub fn read_date(v: &Value) -> Result<Value, CodecError> {
    let days = v.as_i64().ok_or_else(|| super::mismatch("date days", v))?;
    let date = epoch()
        .checked_add_signed(TimeDelta::days(days))
        .ok_or_else(|| invalid(format!("date out of range: {days} days")))?;
    Ok(Value::String(date.format("%Y-%m-%d").to_string()))
}

pub fn is_date_str(v: &Value) -> bool {
    v.is_i64() || v.as_str().is_some_and(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
}

/// `HH:MM:SS[.fff]` → milliseconds since midnight.
pub fn prepare_time_millis(v: &Value) -> Result<Value, CodecError> {
    if v.is_i64() {
        return Ok(v.clone());
    }
    let s = v.as_str().ok_or_else(|| super::mismatch("time", v))?;
    let t = NaiveTime::parse_from_str(s, "%H:%M:%S%.f").map_err(|e| invalid(format!("time {s:?}: {e}")))?;
    let millis = i64::from(t.num_seconds_from_midnight()) * 1000 + i64::from(t.nanosecond() / 1_000_000);
    Ok(Value::from(millis))
}

pub fn read_time_millis(v: &Value) -> Result<Value, CodecError> {
    let millis = v.as_i64().ok_or_else(|| super::mismatch("time millis", v))?;
    let t = NaiveTime::from_num_seconds_from_midnight_opt(
        (millis / 1000) as u32,
        ((millis % 1000) * 1_000_000) as u32,
    )
    .ok_or_else(|| invalid(format!("time out of range: {millis} ms")))?;
    Ok(Value::String(t.format("%H:%M:%S%.3f").to_string()))
}

pub fn is_time_str(v: &Value) -> bool {
    v.is_i64() || v.as_str().is_some_and(|s| NaiveTime::parse_from_str(s, "%H:%M:%S%.f").is_ok())
}

/// RFC 3339 → milliseconds since the Unix epoch.
pub fn prepare_timestamp_millis(v: &Value) -> Result<Value, CodecError> {
    if v.is_i64() {
        return Ok(v.clone());
    }
    let s = v.as_str().ok_or_else(|| super::mismatch("timestamp", v))?;
    let ts = DateTime::parse_from_rfc3339(s).map_err(|e| invalid(format!("timestamp {s:?}: {e}")))?;
    Ok(Value::from(ts.timestamp_millis()))
}

pub fn read_timestamp_millis(v: &Value) -> Result<Value, CodecError> {
    let millis = v.as_i64().ok_or_else(|| super::mismatch("timestamp millis", v))?;
    let ts = DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| invalid(format!("timestamp out of range: {millis} ms")))?;
    Ok(Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true)))
}

pub fn prepare_timestamp_micros(v: &Value) -> Result<Value, CodecError> {
    if v.is_i64() {
        return Ok(v.clone());
    }
    let s = v.as_str().ok_or_else(|| super::mismatch("timestamp", v))?;
    let ts = DateTime::parse_from_rfc3339(s).map_err(|e| invalid(format!("timestamp {s:?}: {e}")))?;
    Ok(Value::from(ts.timestamp_micros()))
}

pub fn read_timestamp_micros(v: &Value) -> Result<Value, CodecError> {
    let micros = v.as_i64().ok_or_else(|| super::mismatch("timestamp micros", v))?;
    let ts = DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| invalid(format!("timestamp out of range: {micros} us")))?;
    Ok(Value::String(ts.to_rfc3339_opts(SecondsFormat::Micros, true)))
}

pub fn is_timestamp_str(v: &Value) -> bool {
    v.is_i64() || v.as_str().is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok())
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
