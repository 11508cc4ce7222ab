//! Resolution of action parameters from request data.
//!
//! Each [`ParameterSpec`] names one source:
//!
//! | Source            | Value                                                    |
//! |-------------------|----------------------------------------------------------|
//! | `PathVar(n)`      | path variable `n`, converted; `None` when absent         |
//! | `RequestParam(n)` | first value of `n`, converted; `""` for absent strings   |
//! | `SessionMap`      | snapshot of every session attribute                      |
//! | `RequestParamMap` | every parameter: one value → string, several → array     |
//! | `UploadMap`       | every multipart part, name → bytes                       |
//! | `AutoBind`        | a fresh object filled from the parameters                |
//!
//! Only scalar conversion of a path variable or request parameter can fail
//! the bind; everything else degrades to [`Arg::None`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::DataMap;
use crate::args::{Arg, BoundArguments};
use crate::convert::{self, ScalarType};
use crate::error::ConversionError;
use crate::handler::ActionHandle;
use crate::object::{Descriptor, ObjectBinder};
use crate::request::{Params, Request};
use crate::upload::UploadCollector;

/// Where a parameter's value comes from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BindingSource {
    PathVar(String),
    RequestParam(String),
    SessionMap,
    RequestParamMap,
    UploadMap,
    AutoBind,
}

/// The type an action declared for a parameter.
#[derive(Clone)]
pub enum DeclaredType {
    Scalar(ScalarType),
    DataMap,
    FileMap,
    Object(Arc<dyn ObjectBinder>),
}

impl fmt::Debug for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(t) => f.debug_tuple("Scalar").field(t).finish(),
            Self::DataMap   => f.write_str("DataMap"),
            Self::FileMap   => f.write_str("FileMap"),
            Self::Object(b) => f.debug_tuple("Object").field(&b.type_name()).finish(),
        }
    }
}

/// One declared action parameter.
#[derive(Clone, Debug)]
pub struct ParameterSpec {
    declared: DeclaredType,
    source: BindingSource,
}

impl ParameterSpec {
    pub fn new(declared: DeclaredType, source: BindingSource) -> Self {
        Self { declared, source }
    }

    /// A `{name}` path variable converted to `ty`.
    pub fn path_var(name: &str, ty: ScalarType) -> Self {
        Self::new(DeclaredType::Scalar(ty), BindingSource::PathVar(name.to_owned()))
    }

    /// A query or form parameter converted to `ty`.
    pub fn request_param(name: &str, ty: ScalarType) -> Self {
        Self::new(DeclaredType::Scalar(ty), BindingSource::RequestParam(name.to_owned()))
    }

    /// Snapshot of the session attributes.
    pub fn session() -> Self {
        Self::new(DeclaredType::DataMap, BindingSource::SessionMap)
    }

    /// Snapshot of all request parameters.
    pub fn params() -> Self {
        Self::new(DeclaredType::DataMap, BindingSource::RequestParamMap)
    }

    /// All multipart parts, name → bytes.
    pub fn uploads() -> Self {
        Self::new(DeclaredType::FileMap, BindingSource::UploadMap)
    }

    /// A structured object bound from the request parameters.
    pub fn object<T: Default + Send + 'static>(descriptor: Descriptor<T>) -> Self {
        Self::new(DeclaredType::Object(descriptor.into_binder()), BindingSource::AutoBind)
    }

    pub fn declared(&self) -> &DeclaredType { &self.declared }
    pub fn source(&self) -> &BindingSource { &self.source }

    fn is_string(&self) -> bool {
        matches!(self.declared, DeclaredType::Scalar(ScalarType::Str))
    }

    /// The scalar type a path variable or request parameter converts to.
    /// Non-scalar declarations receive the raw string.
    fn scalar_type(&self) -> ScalarType {
        match self.declared {
            DeclaredType::Scalar(t) => t,
            _ => ScalarType::Other,
        }
    }
}

/// Builds [`BoundArguments`] for an action from one request.
#[derive(Clone, Debug)]
pub struct ArgumentBinder {
    uploads: UploadCollector,
}

impl ArgumentBinder {
    pub fn new(uploads: UploadCollector) -> Self {
        Self { uploads }
    }

    /// Resolves every parameter of `action`, in declaration order.
    ///
    /// Fails only when a path variable or request parameter does not convert
    /// to its declared integer, float or date type.
    pub fn bind(
        &self,
        action: &ActionHandle,
        request: &Request,
        path_vars: &HashMap<String, String>,
    ) -> Result<BoundArguments, ConversionError> {
        let args = action
            .params()
            .iter()
            .map(|spec| self.resolve(spec, request, path_vars))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(action = action.name(), ?args, "arguments bound");
        Ok(BoundArguments::new(args))
    }

    fn resolve(
        &self,
        spec: &ParameterSpec,
        request: &Request,
        path_vars: &HashMap<String, String>,
    ) -> Result<Arg, ConversionError> {
        match &spec.source {
            BindingSource::PathVar(name) => match path_vars.get(name) {
                Some(raw) => convert::convert(raw, spec.scalar_type()),
                None => Ok(Arg::None),
            },
            BindingSource::RequestParam(name) => match request.param(name) {
                Some(raw) if !raw.is_empty() => convert::convert(raw, spec.scalar_type()),
                _ if spec.is_string() => Ok(Arg::Str(String::new())),
                _ => Ok(Arg::None),
            },
            BindingSource::SessionMap => Ok(Arg::Map(request.session().snapshot())),
            BindingSource::RequestParamMap => Ok(Arg::Map(param_snapshot(request.params()))),
            BindingSource::UploadMap => Ok(Arg::Files(self.uploads.collect(request.parts()))),
            BindingSource::AutoBind => Ok(match &spec.declared {
                DeclaredType::Object(binder) => Arg::Object(binder.bind(request.params())),
                // Built-in types are never auto-bound.
                _ => Arg::None,
            }),
        }
    }
}

/// Every parameter as a map: a single value stays a string, repeated values
/// become an array, so callers can tell a repeated field from a scalar one.
pub fn param_snapshot(params: &Params) -> DataMap {
    params
        .iter()
        .map(|(name, values)| {
            let value = match values {
                [single] => Value::String(single.clone()),
                many => Value::Array(many.iter().cloned().map(Value::String).collect()),
            };
            (name.to_owned(), value)
        })
        .collect()
}
