//! Defines the [`Value`] type, the closed set of kinds a metadata field can
//! hold, and its conversion into template values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A metadata mapping: front-matter fields plus the fields stages derive.
pub type Metadata = BTreeMap<String, Value>;

/// A single metadata value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
    List(Vec<Value>),
}

impl Value {
    /// Parses a date in one of the formats front matter commonly uses:
    /// `2020-01-01`, `2020-01-01 10:30:00`, `2020-01-01T10:30:00`, or
    /// RFC 3339 (which is normalized to UTC).
    pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0);
        }
        for format in &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
                return Some(datetime);
            }
        }
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|datetime| datetime.naive_utc())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Orders two values of the same kind. Values of different kinds are
    /// compared by their displayed text.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(a, b)| a.compare(b))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    /// Displays a [`Value`] the way it would be written in front matter.
    /// Dates at midnight are shown without their time.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Date(d) => {
                if d.num_seconds_from_midnight() == 0 && d.nanosecond() == 0 {
                    write!(f, "{}", d.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", d.format("%Y-%m-%dT%H:%M:%S"))
                }
            }
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", items.join(", "))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Value {
        Value::Date(d)
    }
}

impl From<&Value> for gtmpl::Value {
    /// Converts a metadata [`Value`] into a template value. Dates become
    /// strings so templates can print them directly.
    fn from(v: &Value) -> gtmpl::Value {
        match v {
            Value::String(s) => gtmpl::Value::String(s.clone()),
            Value::Number(n) if n.fract() == 0.0 => gtmpl::Value::from(*n as i64),
            Value::Number(n) => gtmpl::Value::from(*n),
            Value::Bool(b) => gtmpl::Value::Bool(*b),
            Value::Date(_) => gtmpl::Value::String(v.to_string()),
            Value::List(items) => {
                gtmpl::Value::Array(items.iter().map(gtmpl::Value::from).collect())
            }
        }
    }
}

/// Converts a whole [`Metadata`] mapping into a template object.
pub fn to_object(metadata: &Metadata) -> HashMap<String, gtmpl::Value> {
    metadata
        .iter()
        .map(|(k, v)| (k.clone(), gtmpl::Value::from(v)))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, 0))
            .unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(
            Some(datetime(2017, 9, 5, 0, 0)),
            Value::parse_date("2017-09-05")
        );
        assert_eq!(
            Some(datetime(2017, 9, 5, 10, 30)),
            Value::parse_date("2017-09-05 10:30:00")
        );
        assert_eq!(
            Some(datetime(2017, 9, 5, 8, 30)),
            Value::parse_date("2017-09-05T10:30:00+02:00")
        );
        assert_eq!(None, Value::parse_date("September 5th"));
    }

    #[test]
    fn test_display_date() {
        let d = Value::parse_date("2016-08-27").unwrap();
        assert_eq!("2016-08-27", Value::Date(d).to_string());
        let d = Value::parse_date("2016-08-27T01:02:03").unwrap();
        assert_eq!("2016-08-27T01:02:03", Value::Date(d).to_string());
    }

    #[test]
    fn test_compare() {
        let older = Value::Date(Value::parse_date("2016-08-27").unwrap());
        let newer = Value::Date(Value::parse_date("2017-08-30").unwrap());
        assert_eq!(Ordering::Less, older.compare(&newer));
        assert_eq!(
            Ordering::Greater,
            Value::from("b").compare(&Value::from("a"))
        );
        assert_eq!(
            Ordering::Less,
            Value::Number(2.0).compare(&Value::Number(10.0))
        );
    }
}
