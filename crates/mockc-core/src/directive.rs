//! Marker-call directives and the generation descriptor they build.
//!
//! A generator function is a sequence of marker calls:
//!
//! ```go
//! func MockcCache() {
//!     mockc.Implement(Cache(nil))
//!     mockc.SetFieldNamePrefix("_")
//!     mockc.WithConstructor()
//! }
//! ```
//!
//! Each call becomes a [`Directive`]. The set is closed: a call to any other
//! `mockc` function is an `UnknownDirective` error, never ignored.
//! [`GenerationDescriptor::from_directives`] folds the directives into one
//! request and validates it.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::{MockcError, MockcResult};
use crate::index::{DirectiveCall, GeneratorEntry, InterfaceRef};
use crate::types::is_identifier;

/// Default field-name prefix.
pub const DEFAULT_FIELD_NAME_PREFIX: &str = "_";
/// Default field-name suffix.
pub const DEFAULT_FIELD_NAME_SUFFIX: &str = "";
/// Default destination file, relative to the module directory.
pub const DEFAULT_DESTINATION: &str = "mockc_gen.go";

// ============================================================================
// Directives
// ============================================================================

/// One configuration directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Implement(Vec<InterfaceRef>),
    SetFieldNamePrefix(String),
    SetFieldNameSuffix(String),
    SetDestination(String),
    WithConstructor,
    SetConstructorName(String),
}

impl Directive {
    /// Parse one marker call for `mock`.
    pub fn parse(mock: &str, call: &DirectiveCall) -> MockcResult<Self> {
        match call.directive.as_str() {
            "Implements" => {
                tracing::warn!(
                    mock,
                    "mockc.Implements is deprecated. Please use mockc.Implement instead."
                );
                implement(mock, call)
            }
            "Implement" => implement(mock, call),
            "SetFieldNamePrefix" => {
                string_arg(mock, "field name prefix", call).map(Directive::SetFieldNamePrefix)
            }
            "SetFieldNameSuffix" => {
                string_arg(mock, "field name suffix", call).map(Directive::SetFieldNameSuffix)
            }
            "SetDestination" => {
                string_arg(mock, "destination", call).map(Directive::SetDestination)
            }
            "WithConstructor" => {
                if !call.args.is_empty() {
                    return Err(MockcError::invalid_config(
                        mock,
                        "constructor",
                        format!("WithConstructor takes no arguments, got {}", call.args.len()),
                    ));
                }
                Ok(Directive::WithConstructor)
            }
            "SetConstructorName" => {
                string_arg(mock, "constructor name", call).map(Directive::SetConstructorName)
            }
            other => Err(MockcError::UnknownDirective {
                mock: mock.to_string(),
                directive: other.to_string(),
            }),
        }
    }
}

fn implement(mock: &str, call: &DirectiveCall) -> MockcResult<Directive> {
    call.args
        .iter()
        .map(|arg| {
            serde_json::from_value::<InterfaceRef>(arg.clone()).map_err(|_| {
                MockcError::InvalidReference {
                    mock: mock.to_string(),
                    reference: arg.to_string(),
                }
            })
        })
        .collect::<MockcResult<Vec<_>>>()
        .map(Directive::Implement)
}

fn string_arg(mock: &str, setting: &str, call: &DirectiveCall) -> MockcResult<String> {
    match call.args.as_slice() {
        [serde_json::Value::String(s)] => Ok(s.clone()),
        [other] => Err(MockcError::invalid_config(
            mock,
            setting,
            format!("expected a string literal, got {}", other),
        )),
        args => Err(MockcError::invalid_config(
            mock,
            setting,
            format!("expected exactly one argument, got {}", args.len()),
        )),
    }
}

// ============================================================================
// Field Name Formatter
// ============================================================================

/// Maps a method name to the name of its state field: `prefix + method + suffix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldNameFormatter {
    pub prefix: String,
    pub suffix: String,
}

impl FieldNameFormatter {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        FieldNameFormatter {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn format(&self, method: &str) -> String {
        format!("{}{}{}", self.prefix, method, self.suffix)
    }
}

impl Default for FieldNameFormatter {
    fn default() -> Self {
        FieldNameFormatter::new(DEFAULT_FIELD_NAME_PREFIX, DEFAULT_FIELD_NAME_SUFFIX)
    }
}

// ============================================================================
// Generation Descriptor
// ============================================================================

/// Everything needed to generate one mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationDescriptor {
    /// Mock type name.
    pub name: String,
    /// Constructor function name, when a constructor was requested.
    pub constructor: Option<String>,
    pub field_names: FieldNameFormatter,
    /// Interfaces to implement, in marker-call order.
    pub interfaces: Vec<InterfaceRef>,
    /// Destination file, relative to the module directory.
    pub destination: String,
}

impl GenerationDescriptor {
    /// A descriptor with default settings and no interfaces.
    pub fn new(name: impl Into<String>) -> Self {
        GenerationDescriptor {
            name: name.into(),
            constructor: None,
            field_names: FieldNameFormatter::default(),
            interfaces: Vec::new(),
            destination: DEFAULT_DESTINATION.to_string(),
        }
    }

    /// Parse and fold a generator's marker calls.
    pub fn from_generator(generator: &GeneratorEntry) -> MockcResult<Self> {
        let directives = generator
            .calls
            .iter()
            .map(|call| Directive::parse(&generator.name, call))
            .collect::<MockcResult<Vec<_>>>()?;
        Self::from_directives(&generator.name, directives)
    }

    /// Fold directives in order, then validate.
    ///
    /// `WithConstructor` only supplies the default name `New<Mock>`; an explicit
    /// `SetConstructorName` wins regardless of order.
    pub fn from_directives(
        name: &str,
        directives: impl IntoIterator<Item = Directive>,
    ) -> MockcResult<Self> {
        let mut desc = GenerationDescriptor::new(name);
        let mut explicit_constructor = false;

        for directive in directives {
            match directive {
                Directive::Implement(refs) => desc.interfaces.extend(refs),
                Directive::SetFieldNamePrefix(prefix) => desc.field_names.prefix = prefix,
                Directive::SetFieldNameSuffix(suffix) => desc.field_names.suffix = suffix,
                Directive::SetDestination(destination) => desc.destination = destination,
                Directive::WithConstructor => {
                    if !explicit_constructor {
                        desc.constructor = Some(format!("New{}", name));
                    }
                }
                Directive::SetConstructorName(constructor) => {
                    explicit_constructor = true;
                    desc.constructor = Some(constructor);
                }
            }
        }

        desc.destination = clean_destination(&desc.destination);
        desc.validate()?;
        Ok(desc)
    }

    /// Check the settings that can be checked before merging.
    pub fn validate(&self) -> MockcResult<()> {
        let prefix = &self.field_names.prefix;
        let suffix = &self.field_names.suffix;

        if !is_identifier(&self.name) {
            return Err(MockcError::invalid_config(
                &self.name,
                "mock name",
                format!("{:?} is not an identifier", self.name),
            ));
        }
        if prefix.is_empty() && suffix.is_empty() {
            return Err(MockcError::invalid_config(
                &self.name,
                "field name",
                format!(
                    "at least one of the field name prefix and field name suffix must not be an empty string: prefix({:?}) suffix({:?})",
                    prefix, suffix
                ),
            ));
        }
        // A representative method name stands in for the real method set.
        let probe = self.field_names.format("M");
        if !is_identifier(&probe) {
            return Err(MockcError::invalid_config(
                &self.name,
                "field name",
                format!(
                    "prefix({:?}) suffix({:?}) do not form identifiers",
                    prefix, suffix
                ),
            ));
        }
        if self.destination.is_empty() {
            return Err(MockcError::invalid_config(
                &self.name,
                "destination",
                "destination should not be an empty string",
            ));
        }
        if Path::new(&self.destination).extension().and_then(|e| e.to_str()) != Some("go") {
            return Err(MockcError::invalid_config(
                &self.name,
                "destination",
                format!("{:?} is not a go file", self.destination),
            ));
        }
        if let Some(constructor) = &self.constructor {
            if !is_identifier(constructor) {
                return Err(MockcError::invalid_config(
                    &self.name,
                    "constructor name",
                    format!("{:?} is not an identifier", constructor),
                ));
            }
        }
        Ok(())
    }
}

/// Lexically clean a destination so every spelling of one file is equal.
///
/// `.` components and repeated separators are dropped and `name/..` pairs
/// cancel; a leading `..` is kept.
fn clean_destination(destination: &str) -> String {
    let mut parts: Vec<Component> = Vec::new();
    for component in Path::new(destination).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    let cleaned: PathBuf = parts.iter().collect();
    cleaned.to_string_lossy().into_owned()
}

// ============================================================================
// Tests
// ============================================================================
