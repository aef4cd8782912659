//! Conversion between `mysql_async::Value` and [`SqlValue`].

use chrono::{Duration, NaiveDate, NaiveTime};
use mysql_async::consts::{ColumnFlags, ColumnType as MysqlType};
use mysql_async::{Column as MysqlColumn, Value};

use crate::core::{ColumnInfo, ColumnType, SqlValue};

/// Character set id MySQL reports for binary strings and blobs.
const BINARY_CHARSET: u16 = 63;

/// Per-column decoding hints derived from result set metadata.
#[derive(Debug, Clone, Copy)]
pub(super) struct Decode {
    binary: bool,
    date_only: bool,
}

/// Describe a MySQL result column.
pub(super) fn column_info(col: &MysqlColumn) -> (ColumnInfo, Decode) {
    let flags = col.flags();
    let info = ColumnInfo::new(
        col.name_str().into_owned(),
        ColumnType {
            name: format!("{:?}", col.column_type()),
            nullable: Some(!flags.contains(ColumnFlags::NOT_NULL_FLAG)),
            length: Some(u64::from(col.column_length())),
            decimals: Some(col.decimals()),
        },
    );
    let decode = Decode {
        binary: col.character_set() == BINARY_CHARSET,
        date_only: matches!(
            col.column_type(),
            MysqlType::MYSQL_TYPE_DATE | MysqlType::MYSQL_TYPE_NEWDATE
        ),
    };
    (info, decode)
}

/// Convert a scanned MySQL value into a [`SqlValue`].
///
/// Values are carried as-is: DECIMAL and JSON arrive as text, BIT and
/// binary strings as bytes. Zero dates, which have no calendar equivalent,
/// are kept as their text form.
pub(super) fn from_mysql(value: Value, decode: Decode) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        Value::Int(v) => SqlValue::I64(v),
        Value::UInt(v) => SqlValue::U64(v),
        Value::Float(v) => SqlValue::F32(v),
        Value::Double(v) => SqlValue::F64(v),
        Value::Bytes(b) if decode.binary => SqlValue::Bytes(b),
        Value::Bytes(b) => match String::from_utf8(b) {
            Ok(s) => SqlValue::Text(s),
            Err(e) => SqlValue::Bytes(e.into_bytes()),
        },
        Value::Date(y, m, d, h, mi, s, us) => {
            let date = NaiveDate::from_ymd_opt(i32::from(y), u32::from(m), u32::from(d));
            let time = NaiveTime::from_hms_micro_opt(u32::from(h), u32::from(mi), u32::from(s), us);
            match (date, time) {
                (Some(date), _) if decode.date_only => SqlValue::Date(date),
                (Some(date), Some(time)) => SqlValue::DateTime(date.and_time(time)),
                _ if decode.date_only => SqlValue::Text(format!("{:04}-{:02}-{:02}", y, m, d)),
                _ => SqlValue::Text(format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    y, m, d, h, mi, s
                )),
            }
        }
        Value::Time(negative, days, h, mi, s, us) => {
            let time = NaiveTime::from_hms_micro_opt(u32::from(h), u32::from(mi), u32::from(s), us);
            match time {
                Some(time) if !negative && days == 0 => SqlValue::Time(time),
                _ => {
                    let span = Duration::days(i64::from(days))
                        + Duration::hours(i64::from(h))
                        + Duration::minutes(i64::from(mi))
                        + Duration::seconds(i64::from(s))
                        + Duration::microseconds(i64::from(us));
                    SqlValue::Interval(if negative { -span } else { span })
                }
            }
        }
    }
}

/// Convert a [`SqlValue`] into a MySQL bind parameter.
pub(super) fn to_mysql(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::NULL,
        SqlValue::Bool(b) => Value::Int(i64::from(*b)),
        SqlValue::I64(v) => Value::Int(*v),
        SqlValue::U64(v) => Value::UInt(*v),
        SqlValue::F32(v) => Value::Float(*v),
        SqlValue::F64(v) => Value::Double(*v),
        SqlValue::Text(s) => Value::Bytes(s.as_bytes().to_vec()),
        SqlValue::Bytes(b) => Value::Bytes(b.clone()),
        SqlValue::Date(d) => Value::from(*d),
        SqlValue::DateTime(dt) => Value::from(*dt),
        SqlValue::Time(t) => Value::from(*t),
        SqlValue::Interval(span) => {
            let negative = *span < Duration::zero();
            let span = if negative { -*span } else { *span };
            let micros = span.num_microseconds().unwrap_or(i64::MAX);
            let secs = micros / 1_000_000;
            Value::Time(
                negative,
                (secs / 86_400) as u32,
                ((secs / 3_600) % 24) as u8,
                ((secs / 60) % 60) as u8,
                (secs % 60) as u8,
                (micros % 1_000_000) as u32,
            )
        }
    }
}
