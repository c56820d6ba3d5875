//! Conversion between failguard values and PostgreSQL wire values

use bytes::BytesMut;
use failguard_core::{FailguardError, Result, Value};
use postgres_types::{FromSql, IsNull, ToSql, Type, to_sql_checked};
use tokio_postgres::Row as PgRow;

type BoxError = Box<dyn std::error::Error + Sync + Send>;

/// Query parameter adapter; integers and floats are narrowed or widened to
/// the width of the target parameter type so the binary encoding matches.
#[derive(Debug)]
pub(crate) struct PgParam<'a>(pub &'a Value);

impl ToSql for PgParam<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
        match self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::Int16(v) => int_to_sql(*v as i64, ty, out),
            Value::Int32(v) => int_to_sql(*v as i64, ty, out),
            Value::Int64(v) => int_to_sql(*v, ty, out),
            Value::Float32(v) => float_to_sql(*v as f64, ty, out),
            Value::Float64(v) => float_to_sql(*v, ty, out),
            Value::Decimal(v) | Value::String(v) => v.to_sql(ty, out),
            Value::Bytes(v) => v.to_sql(ty, out),
            Value::Uuid(v) => v.to_sql(ty, out),
            Value::Date(v) => v.to_sql(ty, out),
            Value::Time(v) => v.to_sql(ty, out),
            Value::DateTime(v) => v.to_sql(ty, out),
            Value::DateTimeUtc(v) => v.to_sql(ty, out),
            Value::Json(v) => v.to_sql(ty, out),
            Value::Array(_) => self.0.to_string().to_sql(ty, out),
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn int_to_sql(value: i64, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(value)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(value)?.to_sql(ty, out),
        Type::FLOAT4 => (value as f32).to_sql(ty, out),
        Type::FLOAT8 => (value as f64).to_sql(ty, out),
        _ => value.to_sql(ty, out),
    }
}

fn float_to_sql(value: f64, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
    match *ty {
        Type::FLOAT4 => (value as f32).to_sql(ty, out),
        _ => value.to_sql(ty, out),
    }
}

/// NUMERIC rendered as its exact decimal text
struct PgNumeric(String);

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(_: &Type, raw: &'a [u8]) -> std::result::Result<Self, BoxError> {
        decode_numeric(raw).map(PgNumeric)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

/// Raw UTF-8 payload of any type without a dedicated mapping (enums, domains)
struct PgText(String);

impl<'a> FromSql<'a> for PgText {
    fn from_sql(_: &Type, raw: &'a [u8]) -> std::result::Result<Self, BoxError> {
        Ok(PgText(std::str::from_utf8(raw)?.to_string()))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Decode the binary NUMERIC format: base-10000 digit groups with a
/// weight (exponent of the first group) and a display scale.
fn decode_numeric(raw: &[u8]) -> std::result::Result<String, BoxError> {
    if raw.len() < 8 {
        return Err("NUMERIC payload too short".into());
    }
    let word = |offset: usize| u16::from_be_bytes([raw[offset], raw[offset + 1]]);

    let ndigits = word(0) as usize;
    let weight = word(2) as i16 as i64;
    let sign = word(4);
    let dscale = word(6) as usize;

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        _ => {}
    }
    if raw.len() < 8 + ndigits * 2 {
        return Err("NUMERIC payload truncated".into());
    }

    let group = |index: i64| -> u16 {
        if index >= 0 && (index as usize) < ndigits {
            word(8 + index as usize * 2)
        } else {
            0
        }
    };

    let mut text = String::new();
    if sign == NUMERIC_NEG && ndigits > 0 {
        text.push('-');
    }

    if weight < 0 {
        text.push('0');
    } else {
        text.push_str(&group(0).to_string());
        for index in 1..=weight {
            text.push_str(&format!("{:04}", group(index)));
        }
    }

    if dscale > 0 {
        let mut fraction = String::new();
        let mut index = weight + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", group(index)));
            index += 1;
        }
        fraction.truncate(dscale);
        text.push('.');
        text.push_str(&fraction);
    }

    Ok(text)
}

fn column<'a, T: FromSql<'a>>(row: &'a PgRow, idx: usize) -> Result<Option<T>> {
    row.try_get::<_, Option<T>>(idx).map_err(|e| {
        FailguardError::Query(format!(
            "failed to decode column {}: {}",
            row.columns()[idx].name(),
            e
        ))
    })
}

/// Convert one column of a result row into a [`Value`]
pub(crate) fn postgres_to_value(row: &PgRow, idx: usize) -> Result<Value> {
    let ty = row.columns()[idx].type_().clone();

    let value = match ty {
        Type::BOOL => column::<bool>(row, idx)?.map(Value::Bool),
        Type::INT2 => column::<i16>(row, idx)?.map(Value::Int16),
        Type::INT4 => column::<i32>(row, idx)?.map(Value::Int32),
        Type::INT8 => column::<i64>(row, idx)?.map(Value::Int64),
        Type::FLOAT4 => column::<f32>(row, idx)?.map(Value::Float32),
        Type::FLOAT8 => column::<f64>(row, idx)?.map(Value::Float64),
        Type::NUMERIC => column::<PgNumeric>(row, idx)?.map(|n| Value::Decimal(n.0)),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            column::<String>(row, idx)?.map(Value::String)
        }
        Type::BYTEA => column::<Vec<u8>>(row, idx)?.map(Value::Bytes),
        Type::UUID => column::<uuid::Uuid>(row, idx)?.map(Value::Uuid),
        Type::JSON | Type::JSONB => column::<serde_json::Value>(row, idx)?.map(Value::Json),
        Type::DATE => column::<chrono::NaiveDate>(row, idx)?.map(Value::Date),
        Type::TIME => column::<chrono::NaiveTime>(row, idx)?.map(Value::Time),
        Type::TIMESTAMP => column::<chrono::NaiveDateTime>(row, idx)?.map(Value::DateTime),
        Type::TIMESTAMPTZ => {
            column::<chrono::DateTime<chrono::Utc>>(row, idx)?.map(Value::DateTimeUtc)
        }
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY => column::<Vec<String>>(row, idx)?
            .map(|items| Value::Array(items.into_iter().map(Value::String).collect())),
        Type::INT4_ARRAY => column::<Vec<i32>>(row, idx)?
            .map(|items| Value::Array(items.into_iter().map(Value::Int32).collect())),
        Type::INT8_ARRAY => column::<Vec<i64>>(row, idx)?
            .map(|items| Value::Array(items.into_iter().map(Value::Int64).collect())),
        _ => column::<PgText>(row, idx)?.map(|text| Value::String(text.0)),
    };

    Ok(value.unwrap_or(Value::Null))
}
