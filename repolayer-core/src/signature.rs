//! Method signature descriptors — the invocation side of the data model.
//!
//! A [`MethodSignature`] describes one method of a caller-declared repository
//! interface: its name, its ordered parameters, its declared return shape,
//! and an optional attached literal query. Signatures replace the runtime
//! reflection of proxy-based systems: whatever mechanism supplies the
//! repository implementation (hand-written stubs, build-time generation)
//! constructs one signature per method and passes it to
//! [`RepositoryInvoker::invoke`](crate::dispatch::RepositoryInvoker::invoke)
//! together with the call arguments.
//!
//! A signature is immutable once built and its shape never changes between
//! calls, which is what makes per-method classification cacheable.

/// The role a declared parameter plays in an invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    /// A bindable query parameter.
    Value,
    /// A completion callback. Only valid as the final parameter; never bound
    /// to a query and never counted toward derivation arity.
    Callback,
}

/// One declared parameter of a repository method.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    name: String,
    kind: ParamKind,
}

impl ParamSpec {
    /// Declares a bindable value parameter.
    pub fn value(name: impl Into<String>) -> Self {
        ParamSpec { name: name.into(), kind: ParamKind::Value }
    }

    /// Declares a trailing completion-callback parameter.
    pub fn callback(name: impl Into<String>) -> Self {
        ParamSpec { name: name.into(), kind: ParamKind::Callback }
    }

    /// Returns the declared parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parameter's role.
    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }
}

/// The declared return shape of a repository method.
///
/// The shape drives the result adapter: it decides how a raw record sequence
/// is reshaped into the caller's declared value.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnShape {
    /// No value; the caller only observes success or failure.
    Unit,
    /// Exactly one entity. Zero records is an error, as is more than one.
    Single,
    /// Zero or one entity.
    Optional,
    /// Any number of entities, in storage-manager return order.
    Collection,
    /// A numeric count.
    Count,
    /// A boolean existence check.
    Exists,
}

/// An immutable descriptor of one repository interface method.
///
/// # Example
///
/// ```ignore
/// use repolayer::signature::{MethodSignature, ParamSpec, ReturnShape};
///
/// let signature = MethodSignature::builder("find_by_name_and_active")
///     .with_param(ParamSpec::value("name"))
///     .with_param(ParamSpec::value("active"))
///     .with_return_shape(ReturnShape::Collection)
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    name: String,
    params: Vec<ParamSpec>,
    return_shape: ReturnShape,
    literal_query: Option<String>,
}

impl MethodSignature {
    /// Creates a builder for a method with the given name.
    pub fn builder(name: impl Into<String>) -> MethodSignatureBuilder {
        MethodSignatureBuilder {
            name: name.into(),
            params: Vec::new(),
            return_shape: ReturnShape::Unit,
            literal_query: None,
        }
    }

    /// Returns the method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the ordered declared parameters.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Returns the declared return shape.
    pub fn return_shape(&self) -> &ReturnShape {
        &self.return_shape
    }

    /// Returns the attached literal query, if any.
    pub fn literal_query(&self) -> Option<&str> {
        self.literal_query.as_deref()
    }

    /// Whether the final declared parameter is a completion callback.
    pub fn has_trailing_callback(&self) -> bool {
        matches!(
            self.params.last().map(ParamSpec::kind),
            Some(ParamKind::Callback)
        )
    }

    /// The declared parameters that bind to query values, in order.
    ///
    /// This excludes a trailing callback parameter; callbacks are a delivery
    /// channel, not query input.
    pub fn bindable_params(&self) -> &[ParamSpec] {
        if self.has_trailing_callback() {
            &self.params[..self.params.len() - 1]
        } else {
            &self.params
        }
    }
}

/// Builder for [`MethodSignature`] instances.
#[derive(Debug)]
pub struct MethodSignatureBuilder {
    name: String,
    params: Vec<ParamSpec>,
    return_shape: ReturnShape,
    literal_query: Option<String>,
}

impl MethodSignatureBuilder {
    /// Appends a declared parameter.
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Sets the declared return shape. Defaults to [`ReturnShape::Unit`].
    pub fn with_return_shape(mut self, shape: ReturnShape) -> Self {
        self.return_shape = shape;
        self
    }

    /// Attaches a literal query string, marking the method as a direct query.
    pub fn with_literal_query(mut self, query: impl Into<String>) -> Self {
        self.literal_query = Some(query.into());
        self
    }

    /// Builds the final signature.
    pub fn build(self) -> MethodSignature {
        MethodSignature {
            name: self.name,
            params: self.params,
            return_shape: self.return_shape,
            literal_query: self.literal_query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_callback_is_excluded_from_bindable_params() {
        let signature = MethodSignature::builder("find_by_name")
            .with_param(ParamSpec::value("name"))
            .with_param(ParamSpec::callback("on_complete"))
            .with_return_shape(ReturnShape::Collection)
            .build();

        assert!(signature.has_trailing_callback());
        let bindable = signature.bindable_params();
        assert_eq!(bindable.len(), 1);
        assert_eq!(bindable[0].name(), "name");
    }

    #[test]
    fn signature_without_callback_binds_all_params() {
        let signature = MethodSignature::builder("find_by_name_and_active")
            .with_param(ParamSpec::value("name"))
            .with_param(ParamSpec::value("active"))
            .with_return_shape(ReturnShape::Collection)
            .build();

        assert!(!signature.has_trailing_callback());
        assert_eq!(signature.bindable_params().len(), 2);
    }
}
