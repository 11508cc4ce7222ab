//! Auto-binding of request parameters onto structured types.
//!
//! There is no runtime reflection. Each bindable type gets a [`Descriptor`]
//! built once, at registration time, that maps field names to typed setters:
//!
//! ```rust
//! use switchyard::Descriptor;
//!
//! #[derive(Default)]
//! struct Address { city: String }
//!
//! #[derive(Default)]
//! struct Order {
//!     quantity: i64,
//!     colors: Vec<String>,
//!     shipping: Option<Address>,
//! }
//!
//! let address = Descriptor::<Address>::new("Address")
//!     .string("city", |a, v| a.city = v);
//!
//! let order = Descriptor::<Order>::new("Order")
//!     .int("quantity", |o, v| o.quantity = v)
//!     .list("colors", |o, v| o.colors = v)
//!     .nested("shipping", |o| &mut o.shipping, address);
//! ```
//!
//! Given `quantity=3&colors[]=red&colors[]=&colors[]=blue&shipping.city=Oslo`
//! the bound `Order` has `quantity == 3`, `colors == ["red", "blue"]` and a
//! freshly created `shipping` with `city == "Oslo"`.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::warn;

use crate::convert;
use crate::error::ConversionError;
use crate::request::Params;

/// Type-erased view of a [`Descriptor`], stored in a parameter spec.
pub trait ObjectBinder: Send + Sync {
    fn type_name(&self) -> &'static str;

    /// Builds a default instance and applies every parameter to it.
    fn bind(&self, params: &Params) -> Box<dyn Any + Send>;
}

/// The value offered to one field.
#[derive(Debug)]
pub(crate) enum Input<'a> {
    /// A plain key: its first value.
    One(&'a str),
    /// A `key[]` key: its non-empty values.
    Many(Vec<String>),
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum FieldError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("field takes a single value, got a list")]
    NotAList,

    #[error("field is an object and cannot take a value directly")]
    Object,
}

type Setter<T> = Box<dyn Fn(&mut T, Input<'_>) -> Result<(), FieldError> + Send + Sync>;
type Descend<T> = Box<dyn Fn(&mut T, &[&str], Input<'_>) -> Result<(), FieldError> + Send + Sync>;

enum Field<T> {
    Value(Setter<T>),
    Nested(Descend<T>),
}

/// Field-name → setter table for one structured type.
pub struct Descriptor<T> {
    name: &'static str,
    fields: HashMap<String, Field<T>>,
}

impl<T: Default + Send + 'static> Descriptor<T> {
    pub fn new(name: &'static str) -> Self {
        Self { name, fields: HashMap::new() }
    }

    pub fn name(&self) -> &'static str { self.name }

    pub fn string(self, field: &str, set: impl Fn(&mut T, String) + Send + Sync + 'static) -> Self {
        self.scalar(field, move |obj, raw| {
            set(obj, raw.to_owned());
            Ok(())
        })
    }

    pub fn int(self, field: &str, set: impl Fn(&mut T, i64) + Send + Sync + 'static) -> Self {
        self.scalar(field, move |obj, raw| {
            set(obj, convert::parse_int(raw)?);
            Ok(())
        })
    }

    pub fn float(self, field: &str, set: impl Fn(&mut T, f64) + Send + Sync + 'static) -> Self {
        self.scalar(field, move |obj, raw| {
            set(obj, convert::parse_float(raw)?);
            Ok(())
        })
    }

    pub fn boolean(self, field: &str, set: impl Fn(&mut T, bool) + Send + Sync + 'static) -> Self {
        self.scalar(field, move |obj, raw| {
            set(obj, convert::parse_bool(raw));
            Ok(())
        })
    }

    pub fn date(self, field: &str, set: impl Fn(&mut T, NaiveDate) + Send + Sync + 'static) -> Self {
        self.scalar(field, move |obj, raw| {
            set(obj, convert::parse_date(raw)?);
            Ok(())
        })
    }

    /// A list field. A plain key binds a one-element list.
    pub fn list(mut self, field: &str, set: impl Fn(&mut T, Vec<String>) + Send + Sync + 'static) -> Self {
        let setter: Setter<T> = Box::new(move |obj, input| {
            match input {
                Input::One(raw) => set(obj, vec![raw.to_owned()]),
                Input::Many(values) => set(obj, values),
            }
            Ok(())
        });
        self.fields.insert(field.to_owned(), Field::Value(setter));
        self
    }

    /// A nested object reached through dotted keys (`field.inner`).
    ///
    /// A missing object is created with `U::default()` and attached before
    /// descending into it.
    pub fn nested<U: Default + Send + 'static>(
        mut self,
        field: &str,
        slot: impl Fn(&mut T) -> &mut Option<U> + Send + Sync + 'static,
        inner: Descriptor<U>,
    ) -> Self {
        let descend: Descend<T> = Box::new(move |obj, path, input| {
            let child = slot(obj).get_or_insert_with(U::default);
            inner.assign(child, path, input)
        });
        self.fields.insert(field.to_owned(), Field::Nested(descend));
        self
    }

    fn scalar(
        mut self,
        field: &str,
        set: impl Fn(&mut T, &str) -> Result<(), FieldError> + Send + Sync + 'static,
    ) -> Self {
        let setter: Setter<T> = Box::new(move |obj, input| match input {
            Input::One(raw) => set(obj, raw),
            Input::Many(_) => Err(FieldError::NotAList),
        });
        self.fields.insert(field.to_owned(), Field::Value(setter));
        self
    }

    /// Applies `input` to the field at `path`. Unknown fields are ignored.
    pub(crate) fn assign(&self, obj: &mut T, path: &[&str], input: Input<'_>) -> Result<(), FieldError> {
        let Some((head, rest)) = path.split_first() else {
            return Ok(());
        };
        match (self.fields.get(*head), rest.is_empty()) {
            (Some(Field::Value(set)), true) => set(obj, input),
            (Some(Field::Nested(descend)), false) => descend(obj, rest, input),
            (Some(Field::Nested(_)), true) => Err(FieldError::Object),
            // A dotted key running through a scalar, or an unknown field.
            (Some(Field::Value(_)), false) | (None, _) => Ok(()),
        }
    }

    fn apply(&self, obj: &mut T, key: &str, input: Input<'_>) {
        let path: Vec<&str> = key.split('.').collect();
        if let Err(e) = self.assign(obj, &path, input) {
            warn!(object = self.name, field = key, "skipping field: {e}");
        }
    }

    /// Builds a `T` from request parameters.
    ///
    /// `key[]` keys bind their non-empty values as a list and are skipped when
    /// none remain; other keys bind their first non-empty value.
    pub fn bind_params(&self, params: &Params) -> T {
        let mut obj = T::default();
        for (key, values) in params.iter() {
            if let Some(base) = key.strip_suffix("[]") {
                let kept: Vec<String> = values.iter().filter(|v| !v.is_empty()).cloned().collect();
                if !kept.is_empty() {
                    self.apply(&mut obj, base, Input::Many(kept));
                }
            } else if let Some(first) = values.first().filter(|v| !v.is_empty()) {
                self.apply(&mut obj, key, Input::One(first));
            }
        }
        obj
    }

    /// Erases the type for storage in a parameter spec.
    pub fn into_binder(self) -> Arc<dyn ObjectBinder> {
        Arc::new(self)
    }
}

impl<T: Default + Send + 'static> ObjectBinder for Descriptor<T> {
    fn type_name(&self) -> &'static str {
        self.name
    }

    fn bind(&self, params: &Params) -> Box<dyn Any + Send> {
        Box::new(self.bind_params(params))
    }
}
