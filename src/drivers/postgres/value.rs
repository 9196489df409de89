use std::error::Error;
use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use deadpool_postgres::PoolError;
use tokio_postgres::types::{to_sql_checked, FromSql, IsNull, ToSql, Type};
use tokio_postgres::Column;
use uuid::Uuid;

use crate::error::SqlerError;
use crate::types::{ColumnType, SqlValue};

impl From<tokio_postgres::Error> for SqlerError {
    fn from(error: tokio_postgres::Error) -> Self {
        SqlerError::Driver(Arc::new(error))
    }
}

impl From<PoolError> for SqlerError {
    fn from(error: PoolError) -> Self {
        match error {
            PoolError::Backend(error) => error.into(),
            PoolError::Closed => SqlerError::DatabaseClosed,
            other => SqlerError::Pool(other.to_string()),
        }
    }
}

pub(super) fn column_type(column: &Column) -> ColumnType {
    ColumnType::new(column.name(), column.type_().name().to_uppercase())
}

/// Parameters in the shape `query_raw` and `execute_raw` expect.
pub(super) fn params(args: &[SqlValue]) -> impl ExactSizeIterator<Item = &dyn ToSql> {
    args.iter().map(|arg| arg as &dyn ToSql)
}

pub(super) fn decode_row(row: &tokio_postgres::Row) -> Result<Vec<SqlValue>, SqlerError> {
    (0..row.len())
        .map(|index| row.try_get::<_, SqlValue>(index).map_err(SqlerError::from))
        .collect()
}

fn encode_integer(
    value: i64,
    type_: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    match *type_ {
        Type::INT2 => i16::try_from(value)?.to_sql(type_, out),
        Type::INT4 => i32::try_from(value)?.to_sql(type_, out),
        Type::INT8 => value.to_sql(type_, out),
        Type::OID => u32::try_from(value)?.to_sql(type_, out),
        Type::FLOAT4 => (value as f32).to_sql(type_, out),
        Type::FLOAT8 => (value as f64).to_sql(type_, out),
        _ => Err(format!("Cannot encode integer as type {}", type_).into()),
    }
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Text is converted to the column type when Postgres has no text coercion
/// for binary parameters.
fn encode_text(
    value: &str,
    type_: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    match *type_ {
        Type::DATE => value.parse::<NaiveDate>()?.to_sql(type_, out),
        Type::TIME => value.parse::<NaiveTime>()?.to_sql(type_, out),
        Type::TIMESTAMP => NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
            .or_else(|_| value.parse::<NaiveDateTime>())?
            .to_sql(type_, out),
        Type::TIMESTAMPTZ => DateTime::parse_from_rfc3339(value)?
            .with_timezone(&Utc)
            .to_sql(type_, out),
        Type::JSON | Type::JSONB => {
            serde_json::from_str::<serde_json::Value>(value)?.to_sql(type_, out)
        }
        Type::UUID => Uuid::parse_str(value)?.to_sql(type_, out),
        Type::NUMERIC => encode_numeric(value, out),
        _ => value.to_sql_checked(type_, out),
    }
}

/// Writes decimal text in the NUMERIC binary format: a header of digit
/// count, weight, sign and display scale followed by base 10000 digits.
fn encode_numeric(
    value: &str,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    let special = match value {
        "NaN" => Some(NUMERIC_NAN),
        "Infinity" | "+Infinity" => Some(NUMERIC_PINF),
        "-Infinity" => Some(NUMERIC_NINF),
        _ => None,
    };
    if let Some(sign) = special {
        out.put_i16(0);
        out.put_i16(0);
        out.put_u16(sign);
        out.put_u16(0);
        return Ok(IsNull::No);
    }

    let (sign, unsigned) = match value.strip_prefix('-') {
        Some(rest) => (NUMERIC_NEG, rest),
        None => (NUMERIC_POS, value.strip_prefix('+').unwrap_or(value)),
    };
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (integer.is_empty() && fraction.is_empty()) || !all_digits(integer) || !all_digits(fraction)
    {
        return Err(format!("invalid numeric value {value:?}").into());
    }

    let integer_pad = (4 - integer.len() % 4) % 4;
    let fraction_pad = (4 - fraction.len() % 4) % 4;
    let padded: Vec<u8> = std::iter::repeat(b'0')
        .take(integer_pad)
        .chain(integer.bytes())
        .chain(fraction.bytes())
        .chain(std::iter::repeat(b'0').take(fraction_pad))
        .collect();
    let mut groups: Vec<i16> = padded
        .chunks(4)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0i16, |acc, digit| acc * 10 + i16::from(digit - b'0'))
        })
        .collect();
    let mut weight = i16::try_from((integer.len() + integer_pad) / 4)? - 1;

    let leading = groups.iter().take_while(|group| **group == 0).count();
    groups.drain(..leading);
    weight -= i16::try_from(leading)?;
    while groups.last() == Some(&0) {
        groups.pop();
    }
    if groups.is_empty() {
        weight = 0;
    }

    out.put_i16(i16::try_from(groups.len())?);
    out.put_i16(weight);
    out.put_u16(if groups.is_empty() { NUMERIC_POS } else { sign });
    out.put_u16(u16::try_from(fraction.len())?);
    for group in groups {
        out.put_i16(group);
    }
    Ok(IsNull::No)
}

fn decode_numeric(raw: &[u8]) -> Result<String, Box<dyn Error + Sync + Send>> {
    let word = |index: usize| -> Result<[u8; 2], Box<dyn Error + Sync + Send>> {
        raw.get(index * 2..index * 2 + 2)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| "truncated numeric value".into())
    };
    let ndigits = usize::try_from(i16::from_be_bytes(word(0)?))?;
    let weight = i32::from(i16::from_be_bytes(word(1)?));
    let sign = u16::from_be_bytes(word(2)?);
    let dscale = usize::from(u16::from_be_bytes(word(3)?));
    let digits = (0..ndigits)
        .map(|index| word(4 + index).map(i16::from_be_bytes))
        .collect::<Result<Vec<_>, _>>()?;

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        NUMERIC_POS | NUMERIC_NEG => {}
        other => return Err(format!("invalid numeric sign {other:#x}").into()),
    }
    let digit = |index: i32| {
        usize::try_from(index)
            .ok()
            .and_then(|index| digits.get(index).copied())
            .unwrap_or(0)
    };

    let mut text = String::new();
    if sign == NUMERIC_NEG {
        text.push('-');
    }
    if weight < 0 {
        text.push('0');
    } else {
        text.push_str(&digit(0).to_string());
        for index in 1..=weight {
            text.push_str(&format!("{:04}", digit(index)));
        }
    }
    if dscale > 0 {
        let mut fraction = String::new();
        let mut index = weight + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", digit(index)));
            index += 1;
        }
        fraction.truncate(dscale);
        text.push('.');
        text.push_str(&fraction);
    }
    Ok(text)
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        type_: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>>
    where
        Self: Sized,
    {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(value) => value.to_sql_checked(type_, out),
            SqlValue::Int32(value) => encode_integer(i64::from(*value), type_, out),
            SqlValue::Int64(value) => encode_integer(*value, type_, out),
            SqlValue::Float64(value) => match *type_ {
                Type::FLOAT4 => (*value as f32).to_sql(type_, out),
                _ => value.to_sql_checked(type_, out),
            },
            SqlValue::Text(value) => encode_text(value, type_, out),
            SqlValue::Bytes(value) => value.to_sql_checked(type_, out),
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl<'a> FromSql<'a> for SqlValue {
    fn from_sql(type_: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let value = match *type_ {
            Type::BOOL => SqlValue::Bool(bool::from_sql(type_, raw)?),
            Type::INT2 => SqlValue::Int32(i32::from(i16::from_sql(type_, raw)?)),
            Type::INT4 => SqlValue::Int32(i32::from_sql(type_, raw)?),
            Type::INT8 => SqlValue::Int64(i64::from_sql(type_, raw)?),
            Type::OID => SqlValue::Int64(i64::from(u32::from_sql(type_, raw)?)),
            Type::FLOAT4 => SqlValue::Float64(f64::from(f32::from_sql(type_, raw)?)),
            Type::FLOAT8 => SqlValue::Float64(f64::from_sql(type_, raw)?),
            Type::BYTEA => SqlValue::Bytes(Vec::<u8>::from_sql(type_, raw)?),
            Type::DATE => SqlValue::Text(NaiveDate::from_sql(type_, raw)?.to_string()),
            Type::TIME => SqlValue::Text(NaiveTime::from_sql(type_, raw)?.to_string()),
            Type::TIMESTAMP => SqlValue::Text(
                NaiveDateTime::from_sql(type_, raw)?
                    .format(TIMESTAMP_FORMAT)
                    .to_string(),
            ),
            Type::TIMESTAMPTZ => {
                SqlValue::Text(DateTime::<Utc>::from_sql(type_, raw)?.to_rfc3339())
            }
            Type::JSON | Type::JSONB => {
                SqlValue::Text(serde_json::Value::from_sql(type_, raw)?.to_string())
            }
            Type::UUID => SqlValue::Text(Uuid::from_sql(type_, raw)?.to_string()),
            Type::NUMERIC => SqlValue::Text(decode_numeric(raw)?),
            _ if <String as FromSql>::accepts(type_) => {
                SqlValue::Text(String::from_sql(type_, raw)?)
            }
            _ => return Err(format!("unsupported column type {}", type_).into()),
        };
        Ok(value)
    }

    fn from_sql_null(_: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(SqlValue::Null)
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}
