//! String → typed value conversion for bound parameters.
//!
//! | Target  | Rule                                                     |
//! |---------|----------------------------------------------------------|
//! | `Str`   | the string itself                                        |
//! | `Int`   | decimal `i64`, error otherwise                           |
//! | `Float` | decimal `f64`, error otherwise                           |
//! | `Bool`  | `true` iff `"true"` or `"on"`, any case; never an error  |
//! | `Date`  | `yyyy-MM-dd`, error otherwise                            |
//! | `List`  | a one-element list                                       |
//! | `Other` | the string itself                                        |

use chrono::NaiveDate;

use crate::args::Arg;
use crate::error::ConversionError;

/// Date format accepted for `Date` parameters and fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The declared type of a scalar parameter or field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScalarType {
    Str,
    Int,
    Float,
    Bool,
    Date,
    /// A sequence of strings (`String[]` / `Vec<String>` field).
    List,
    /// Any other type; receives the raw string.
    Other,
}

impl ScalarType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Str   => "string",
            Self::Int   => "integer",
            Self::Float => "float",
            Self::Bool  => "boolean",
            Self::Date  => "date",
            Self::List  => "list",
            Self::Other => "other",
        }
    }
}

/// Converts `raw` to `target` per the table in the module docs.
pub fn convert(raw: &str, target: ScalarType) -> Result<Arg, ConversionError> {
    Ok(match target {
        ScalarType::Str | ScalarType::Other => Arg::Str(raw.to_owned()),
        ScalarType::Int   => Arg::Int(parse_int(raw)?),
        ScalarType::Float => Arg::Float(parse_float(raw)?),
        ScalarType::Bool  => Arg::Bool(parse_bool(raw)),
        ScalarType::Date  => Arg::Date(parse_date(raw)?),
        ScalarType::List  => Arg::List(vec![raw.to_owned()]),
    })
}

pub fn parse_int(raw: &str) -> Result<i64, ConversionError> {
    raw.parse().map_err(|_| failed(raw, ScalarType::Int))
}

pub fn parse_float(raw: &str) -> Result<f64, ConversionError> {
    raw.parse().map_err(|_| failed(raw, ScalarType::Float))
}

pub fn parse_bool(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("on")
}

/// Parses a `yyyy-MM-dd` date. Every field has its full width: `2024-2-5`
/// and `24-01-05` are rejected.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ConversionError> {
    let shaped = raw.len() == 10
        && raw.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(failed(raw, ScalarType::Date));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| failed(raw, ScalarType::Date))
}

fn failed(raw: &str, target: ScalarType) -> ConversionError {
    ConversionError { value: raw.to_owned(), target: target.name() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_must_be_decimal() {
        assert_eq!(convert("42", ScalarType::Int), Ok(Arg::Int(42)));
        assert_eq!(convert("-7", ScalarType::Int), Ok(Arg::Int(-7)));
        let err = convert("abc", ScalarType::Int).unwrap_err();
        assert_eq!(err.value, "abc");
        assert_eq!(err.target, "integer");
    }

    #[test]
    fn floats_parse_decimal() {
        assert_eq!(convert("2.5", ScalarType::Float), Ok(Arg::Float(2.5)));
        assert!(convert("two", ScalarType::Float).is_err());
    }

    #[test]
    fn booleans_accept_true_and_on() {
        assert_eq!(convert("TRUE", ScalarType::Bool), Ok(Arg::Bool(true)));
        assert_eq!(convert("on", ScalarType::Bool), Ok(Arg::Bool(true)));
        assert_eq!(convert("yes", ScalarType::Bool), Ok(Arg::Bool(false)));
        assert_eq!(convert("", ScalarType::Bool), Ok(Arg::Bool(false)));
    }

    #[test]
    fn dates_use_fixed_format() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(convert("2024-02-29", ScalarType::Date), Ok(Arg::Date(date)));
        assert!(convert("29/02/2024", ScalarType::Date).is_err());
        assert!(convert("2023-02-29", ScalarType::Date).is_err());
    }

    #[test]
    fn dates_need_full_width_fields() {
        for raw in ["2024-2-5", "24-01-05", "2024-01-5", "2024-01-05 ", "+2024-01-05", "2024/01/05"] {
            let err = convert(raw, ScalarType::Date).unwrap_err();
            assert_eq!(err.target, "date", "{raw}");
        }
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_date("2024-01-05"), Ok(date));
    }

    #[test]
    fn unknown_types_keep_the_string() {
        assert_eq!(convert("RED", ScalarType::Other), Ok(Arg::Str("RED".into())));
        assert_eq!(convert("x", ScalarType::List), Ok(Arg::List(vec!["x".into()])));
    }
}
