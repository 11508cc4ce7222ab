//! Bound argument values handed to an action.
//!
//! [`BoundArguments`] holds one [`Arg`] per declared parameter, in
//! declaration order. Actions read them back by position through typed
//! accessors; a parameter that resolved to nothing reads as `None`, and
//! reading a value with the wrong accessor is an [`ArgumentError`].
//!
//! ```rust
//! use switchyard::{ActionError, BoundArguments, Reply};
//!
//! #[derive(Default)]
//! struct Users;
//!
//! impl Users {
//!     fn show(&mut self, args: BoundArguments) -> Result<Reply, ActionError> {
//!         let id = args.int(0)?.unwrap_or_default();
//!         Ok(Reply::text(format!("user {id}")))
//!     }
//! }
//! ```

use std::any::Any;
use std::fmt;

use chrono::NaiveDate;

use crate::DataMap;
use crate::error::ArgumentError;
use crate::upload::FileMap;

/// One resolved parameter value.
pub enum Arg {
    /// The parameter could not be resolved.
    None,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    List(Vec<String>),
    Map(DataMap),
    Files(FileMap),
    /// An auto-bound structured object.
    Object(Box<dyn Any + Send>),
}

impl Arg {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None      => "none",
            Self::Str(_)    => "string",
            Self::Int(_)    => "integer",
            Self::Float(_)  => "float",
            Self::Bool(_)   => "boolean",
            Self::Date(_)   => "date",
            Self::List(_)   => "list",
            Self::Map(_)    => "map",
            Self::Files(_)  => "files",
            Self::Object(_) => "object",
        }
    }

    pub fn is_none(&self) -> bool { matches!(self, Self::None) }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None      => f.write_str("None"),
            Self::Str(v)    => f.debug_tuple("Str").field(v).finish(),
            Self::Int(v)    => f.debug_tuple("Int").field(v).finish(),
            Self::Float(v)  => f.debug_tuple("Float").field(v).finish(),
            Self::Bool(v)   => f.debug_tuple("Bool").field(v).finish(),
            Self::Date(v)   => f.debug_tuple("Date").field(v).finish(),
            Self::List(v)   => f.debug_tuple("List").field(v).finish(),
            Self::Map(v)    => f.debug_tuple("Map").field(v).finish(),
            Self::Files(v)  => f.debug_tuple("Files").field(&v.keys().collect::<Vec<_>>()).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// Objects are never equal; everything else compares by value.
impl PartialEq for Arg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None)           => true,
            (Self::Str(a), Self::Str(b))       => a == b,
            (Self::Int(a), Self::Int(b))       => a == b,
            (Self::Float(a), Self::Float(b))   => a == b,
            (Self::Bool(a), Self::Bool(b))     => a == b,
            (Self::Date(a), Self::Date(b))     => a == b,
            (Self::List(a), Self::List(b))     => a == b,
            (Self::Map(a), Self::Map(b))       => a == b,
            (Self::Files(a), Self::Files(b))   => a == b,
            _ => false,
        }
    }
}

/// The arguments of one action call, produced fresh for each request.
#[derive(Debug, Default)]
pub struct BoundArguments(Vec<Arg>);

macro_rules! accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident -> $ty:ty, $expected:literal, |$v:ident| $out:expr) => {
        $(#[$doc])*
        pub fn $name(&self, index: usize) -> Result<Option<$ty>, ArgumentError> {
            match self.get(index)? {
                Arg::None => Ok(None),
                Arg::$variant($v) => Ok(Some($out)),
                other => Err(ArgumentError::Mismatch {
                    index,
                    expected: $expected,
                    found: other.kind(),
                }),
            }
        }
    };
}

impl BoundArguments {
    pub fn new(args: Vec<Arg>) -> Self { Self(args) }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// The raw value at `index`.
    pub fn get(&self, index: usize) -> Result<&Arg, ArgumentError> {
        self.0.get(index).ok_or(ArgumentError::Missing { index })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.0.iter()
    }

    accessor!(
        /// A string parameter. Request parameters declared as strings are
        /// never `None`; they read as `""` when absent.
        str, Str -> &str, "string", |v| v.as_str()
    );

    accessor!(int, Int -> i64, "integer", |v| *v);
    accessor!(float, Float -> f64, "float", |v| *v);
    accessor!(bool, Bool -> bool, "boolean", |v| *v);
    accessor!(date, Date -> NaiveDate, "date", |v| *v);

    accessor!(
        /// A string list parameter.
        list, List -> &Vec<String>, "list", |v| v
    );

    accessor!(
        /// A session or request-parameter snapshot.
        map, Map -> &DataMap, "map", |v| v
    );

    accessor!(
        /// Uploaded part contents keyed by part name.
        files, Files -> &FileMap, "files", |v| v
    );

    /// Moves an auto-bound object out of the arguments.
    ///
    /// The slot reads as `None` afterwards.
    pub fn take_object<T: Any>(&mut self, index: usize) -> Result<Option<T>, ArgumentError> {
        let slot = self.0.get_mut(index).ok_or(ArgumentError::Missing { index })?;
        match std::mem::replace(slot, Arg::None) {
            Arg::None => Ok(None),
            Arg::Object(obj) => match obj.downcast::<T>() {
                Ok(value) => Ok(Some(*value)),
                Err(obj) => {
                    *slot = Arg::Object(obj);
                    Err(ArgumentError::Mismatch {
                        index,
                        expected: std::any::type_name::<T>(),
                        found: "object",
                    })
                }
            },
            other => {
                let found = other.kind();
                *slot = other;
                Err(ArgumentError::Mismatch { index, expected: "object", found })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i64,
    }

    #[test]
    fn typed_accessors() {
        let args = BoundArguments::new(vec![Arg::Int(42), Arg::None, Arg::Str("hi".into())]);
        assert_eq!(args.int(0), Ok(Some(42)));
        assert_eq!(args.int(1), Ok(None));
        assert_eq!(args.str(2), Ok(Some("hi")));
        assert_eq!(args.int(3), Err(ArgumentError::Missing { index: 3 }));
        assert_eq!(
            args.int(2),
            Err(ArgumentError::Mismatch { index: 2, expected: "integer", found: "string" })
        );
    }

    #[test]
    fn every_accessor_reads_its_own_variant() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let args = BoundArguments::new(vec![
            Arg::Float(1.5),
            Arg::Bool(true),
            Arg::Date(date),
            Arg::List(vec!["a".into()]),
        ]);
        assert_eq!(args.float(0), Ok(Some(1.5)));
        assert_eq!(args.bool(1), Ok(Some(true)));
        assert_eq!(args.date(2), Ok(Some(date)));
        assert_eq!(args.list(3), Ok(Some(&vec!["a".to_owned()])));
        assert_eq!(
            args.str(3),
            Err(ArgumentError::Mismatch { index: 3, expected: "string", found: "list" })
        );
    }

    #[test]
    fn objects_are_moved_out() {
        let mut args = BoundArguments::new(vec![Arg::Object(Box::new(Point { x: 3 }))]);
        assert!(args.take_object::<String>(0).is_err());
        assert_eq!(args.take_object::<Point>(0), Ok(Some(Point { x: 3 })));
        assert_eq!(args.take_object::<Point>(0), Ok(None));
    }
}
