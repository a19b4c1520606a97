//! Parsing of `Module` and `Module::method` handler specs.

use std::fmt;
use std::str::FromStr;

use super::DecodeError;

/// Method called when the spec names only a module.
pub const DEFAULT_METHOD: &str = "handler";

const SEPARATOR: &str = "::";

/// Target module and method of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSpec {
    module: String,
    method: String,
}

impl HandlerSpec {
    /// Splits `handler` on `::`. The first segment names the module and the
    /// second the method; any further segments are ignored.
    pub fn parse(handler: &str) -> Result<Self, DecodeError> {
        let invalid = |reason| DecodeError::Handler {
            handler: handler.to_owned(),
            reason,
        };
        let mut segments = handler.split(SEPARATOR);
        let module = segments.next().unwrap_or_default();
        let method = segments.next().unwrap_or(DEFAULT_METHOD);
        if module.is_empty() {
            return Err(invalid("module name is empty"));
        }
        if method.is_empty() {
            return Err(invalid("method name is empty"));
        }
        Ok(Self {
            module: module.to_owned(),
            method: method.to_owned(),
        })
    }

    /// Fully-qualified module name.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl FromStr for HandlerSpec {
    type Err = DecodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl fmt::Display for HandlerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.module, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Foo", "Foo", "handler")]
    #[case("Foo::bar", "Foo", "bar")]
    #[case("com.example.Foo::run", "com.example.Foo", "run")]
    #[case("Foo::bar::baz", "Foo", "bar")]
    #[case("Foo::bar::", "Foo", "bar")]
    fn parses_module_and_method(#[case] input: &str, #[case] module: &str, #[case] method: &str) {
        let spec: HandlerSpec = input.parse().expect("valid handler spec");
        assert_eq!(spec.module(), module);
        assert_eq!(spec.method(), method);
    }

    #[rstest]
    #[case("")]
    #[case("::bar")]
    #[case("Foo::")]
    #[case("Foo::::baz")]
    fn rejects_empty_parts(#[case] input: &str) {
        let error = HandlerSpec::parse(input).expect_err("spec should be rejected");
        assert!(matches!(error, DecodeError::Handler { .. }));
    }

    #[test]
    fn displays_canonical_form() {
        let spec = HandlerSpec::parse("Foo").expect("valid handler spec");
        assert_eq!(spec.to_string(), "Foo::handler");
    }
}
