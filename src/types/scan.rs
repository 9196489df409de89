use crate::error::{Result, SqlerError};
use crate::types::SqlValue;

/// A destination that a single column value can be scanned into.
///
/// Used as `rows.scan(&mut [&mut id, &mut name])`.
pub trait ScanDest: Send {
    fn scan_value(&mut self, value: &SqlValue) -> Result<()>;
}

fn unsupported(value: &SqlValue, expected: &'static str) -> SqlerError {
    let found = match value {
        SqlValue::Null | SqlValue::Bytes(_) => value.type_name().to_string(),
        SqlValue::Bool(v) => format!("{} {}", value.type_name(), v),
        SqlValue::Int32(v) => format!("{} {}", value.type_name(), v),
        SqlValue::Int64(v) => format!("{} {}", value.type_name(), v),
        SqlValue::Float64(v) => format!("{} {}", value.type_name(), v),
        SqlValue::Text(v) => format!("{} {:?}", value.type_name(), v),
    };
    SqlerError::Conversion { found, expected }
}

macro_rules! impl_scan_int {
    ($($t:ty),*) => {
        $(
            impl ScanDest for $t {
                fn scan_value(&mut self, value: &SqlValue) -> Result<()> {
                    let expected = stringify!($t);
                    *self = match value {
                        SqlValue::Int32(v) => <$t>::try_from(*v).map_err(|_| unsupported(value, expected))?,
                        SqlValue::Int64(v) => <$t>::try_from(*v).map_err(|_| unsupported(value, expected))?,
                        SqlValue::Text(s) => s.trim().parse().map_err(|_| unsupported(value, expected))?,
                        _ => return Err(unsupported(value, expected)),
                    };
                    Ok(())
                }
            }
        )*
    };
}

impl_scan_int!(i16, i32, i64);

impl ScanDest for f64 {
    fn scan_value(&mut self, value: &SqlValue) -> Result<()> {
        *self = match value {
            SqlValue::Float64(v) => *v,
            SqlValue::Int32(v) => f64::from(*v),
            SqlValue::Int64(v) => *v as f64,
            SqlValue::Text(s) => s.trim().parse().map_err(|_| unsupported(value, "f64"))?,
            _ => return Err(unsupported(value, "f64")),
        };
        Ok(())
    }
}

impl ScanDest for f32 {
    fn scan_value(&mut self, value: &SqlValue) -> Result<()> {
        let mut wide = 0f64;
        wide.scan_value(value).map_err(|_| unsupported(value, "f32"))?;
        *self = wide as f32;
        Ok(())
    }
}

impl ScanDest for bool {
    fn scan_value(&mut self, value: &SqlValue) -> Result<()> {
        *self = match value {
            SqlValue::Bool(v) => *v,
            SqlValue::Int32(0) | SqlValue::Int64(0) => false,
            SqlValue::Int32(1) | SqlValue::Int64(1) => true,
            SqlValue::Text(s) => match s.trim() {
                "1" | "t" | "T" | "true" | "TRUE" | "True" => true,
                "0" | "f" | "F" | "false" | "FALSE" | "False" => false,
                _ => return Err(unsupported(value, "bool")),
            },
            _ => return Err(unsupported(value, "bool")),
        };
        Ok(())
    }
}

impl ScanDest for String {
    fn scan_value(&mut self, value: &SqlValue) -> Result<()> {
        *self = match value {
            SqlValue::Text(s) => s.clone(),
            SqlValue::Bytes(b) => {
                String::from_utf8(b.clone()).map_err(|_| unsupported(value, "String"))?
            }
            SqlValue::Bool(v) => v.to_string(),
            SqlValue::Int32(v) => v.to_string(),
            SqlValue::Int64(v) => v.to_string(),
            SqlValue::Float64(v) => v.to_string(),
            SqlValue::Null => return Err(unsupported(value, "String")),
        };
        Ok(())
    }
}

impl ScanDest for Vec<u8> {
    fn scan_value(&mut self, value: &SqlValue) -> Result<()> {
        *self = match value {
            SqlValue::Bytes(b) => b.clone(),
            SqlValue::Text(s) => s.as_bytes().to_vec(),
            _ => return Err(unsupported(value, "Vec<u8>")),
        };
        Ok(())
    }
}

impl ScanDest for SqlValue {
    fn scan_value(&mut self, value: &SqlValue) -> Result<()> {
        *self = value.clone();
        Ok(())
    }
}

impl<T: ScanDest + Default> ScanDest for Option<T> {
    fn scan_value(&mut self, value: &SqlValue) -> Result<()> {
        if value.is_null() {
            *self = None;
            return Ok(());
        }
        let mut inner = T::default();
        inner.scan_value(value)?;
        *self = Some(inner);
        Ok(())
    }
}
