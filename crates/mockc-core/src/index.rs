//! The source index: resolved declarations handed to the engine.
//!
//! Loading packages, type-checking them, and finding marker calls is the job
//! of an external front end. What it produces is a [`ModuleIndex`], a JSON
//! document (`mockc.json`) describing one generation module:
//!
//! ```json
//! {
//!   "module": {"path": "example.com/cache", "name": "cache"},
//!   "declarations": [
//!     {"module": {"path": "example.com/cache", "name": "cache"},
//!      "name": "Cache", "kind": "interface",
//!      "methods": [{"name": "Del", "params": [{"type": {"kind": "basic", "name": "string"}}],
//!                   "results": [{"type": {"kind": "named", "name": "error"}}]}]}
//!   ],
//!   "generators": [
//!     {"name": "MockcCache", "calls": [
//!       {"directive": "Implement", "args": [{"module": "example.com/cache", "name": "Cache"}]}
//!     ]}
//!   ]
//! }
//! ```
//!
//! The engine only depends on the [`SourceIndex`] trait, so tests and other
//! front ends can provide declarations without going through JSON.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MockcError, MockcResult};
use crate::types::{MethodSignature, ModuleRef};

/// File name of an index document.
pub const INDEX_FILE_NAME: &str = "mockc.json";

// ============================================================================
// Interface References
// ============================================================================

/// An interface named by a marker call or by an embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InterfaceRef {
    /// A declared interface: `module.Name`.
    Named { module: String, name: String },
    /// An interface literal written inline:
    /// `mockc.Implement(interface{ Close() error }(nil))`.
    Literal {
        literal: InterfaceLiteral,
    },
}

/// Body of an inline interface literal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterfaceLiteral {
    #[serde(default)]
    pub methods: Vec<MethodSignature>,
    #[serde(default)]
    pub embeds: Vec<InterfaceRef>,
}

impl InterfaceRef {
    pub fn named(module: impl Into<String>, name: impl Into<String>) -> Self {
        InterfaceRef::Named {
            module: module.into(),
            name: name.into(),
        }
    }

    pub fn literal(methods: Vec<MethodSignature>, embeds: Vec<InterfaceRef>) -> Self {
        InterfaceRef::Literal {
            literal: InterfaceLiteral { methods, embeds },
        }
    }

    /// Parse a flag-mode pattern `{module-path}.{InterfaceName}`.
    ///
    /// The split is at the last `.`, so dotted module paths work.
    pub fn parse_pattern(mock: &str, pattern: &str) -> MockcResult<Self> {
        let invalid = || MockcError::InvalidReference {
            mock: mock.to_string(),
            reference: format!(
                "expected interface pattern {{module-path}}.{{interface-name}}: actual {}",
                pattern
            ),
        };
        let idx = pattern.rfind('.').ok_or_else(invalid)?;
        let (module, name) = (&pattern[..idx], &pattern[idx + 1..]);
        if module.is_empty() || name.is_empty() {
            return Err(invalid());
        }
        Ok(InterfaceRef::named(module, name))
    }
}

impl fmt::Display for InterfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceRef::Named { module, name } => write!(f, "{}.{}", module, name),
            InterfaceRef::Literal { literal } => {
                let names: Vec<&str> = literal.methods.iter().map(|m| m.name.as_str()).collect();
                write!(f, "interface{{{}}}", names.join("; "))
            }
        }
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// What kind of entity a declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Interface,
    Struct,
    Func,
    Basic,
    Alias,
    Other,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeclKind::Interface => "interface",
            DeclKind::Struct => "struct",
            DeclKind::Func => "func",
            DeclKind::Basic => "basic type",
            DeclKind::Alias => "alias",
            DeclKind::Other => "non-interface type",
        };
        f.write_str(s)
    }
}

/// A resolved type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub module: ModuleRef,
    pub name: String,
    pub kind: DeclKind,
    /// Methods declared directly on the interface (interfaces only).
    #[serde(default)]
    pub methods: Vec<MethodSignature>,
    /// Embedded interfaces, in declaration order (interfaces only).
    #[serde(default)]
    pub embeds: Vec<InterfaceRef>,
}

impl Declaration {
    /// An interface declaration.
    pub fn interface(
        module: ModuleRef,
        name: impl Into<String>,
        methods: Vec<MethodSignature>,
        embeds: Vec<InterfaceRef>,
    ) -> Self {
        Declaration {
            module,
            name: name.into(),
            kind: DeclKind::Interface,
            methods,
            embeds,
        }
    }

    /// A non-interface declaration of the given kind.
    pub fn other(module: ModuleRef, name: impl Into<String>, kind: DeclKind) -> Self {
        Declaration {
            module,
            name: name.into(),
            kind,
            methods: Vec::new(),
            embeds: Vec::new(),
        }
    }

    /// `module/path.Name`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module.path, self.name)
    }
}

/// Resolves interface references for the merger.
pub trait SourceIndex {
    /// The module mocks are generated into.
    fn local_module(&self) -> &ModuleRef;

    /// Find a declaration by module path and name.
    fn lookup(&self, module: &str, name: &str) -> Option<&Declaration>;
}

// ============================================================================
// Generators
// ============================================================================

/// One marker call inside a generator function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveCall {
    pub directive: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

impl DirectiveCall {
    pub fn new(directive: impl Into<String>, args: Vec<serde_json::Value>) -> Self {
        DirectiveCall {
            directive: directive.into(),
            args,
        }
    }
}

/// A mock generator function and its marker calls, in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorEntry {
    /// Name of the generator function, which becomes the mock's name.
    pub name: String,
    #[serde(default)]
    pub calls: Vec<DirectiveCall>,
}

// ============================================================================
// Module Index
// ============================================================================

/// Resolved declarations and generators for one generation module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleIndex {
    pub module: ModuleRef,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
    #[serde(default)]
    pub generators: Vec<GeneratorEntry>,
    #[serde(skip)]
    lookup: HashMap<(String, String), usize>,
}

impl ModuleIndex {
    /// Build an index from parts.
    pub fn new(
        module: ModuleRef,
        declarations: Vec<Declaration>,
        generators: Vec<GeneratorEntry>,
    ) -> Self {
        let mut index = ModuleIndex {
            module,
            declarations,
            generators,
            lookup: HashMap::new(),
        };
        index.rebuild_lookup();
        index
    }

    /// Parse an index document.
    pub fn from_json(text: &str) -> MockcResult<Self> {
        let mut index: ModuleIndex = serde_json::from_str(text)?;
        index.rebuild_lookup();
        Ok(index)
    }

    /// Read and parse an index file.
    pub fn load(path: &Path) -> MockcResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| MockcError::io(path, e))?;
        Self::from_json(&text).map_err(|err| match err {
            MockcError::InvalidArguments { message } => MockcError::InvalidArguments {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    fn rebuild_lookup(&mut self) {
        self.lookup = self
            .declarations
            .iter()
            .enumerate()
            .map(|(i, d)| ((d.module.path.clone(), d.name.clone()), i))
            .collect();
    }
}

impl SourceIndex for ModuleIndex {
    fn local_module(&self) -> &ModuleRef {
        &self.module
    }

    fn lookup(&self, module: &str, name: &str) -> Option<&Declaration> {
        self.lookup
            .get(&(module.to_string(), name.to_string()))
            .map(|&i| &self.declarations[i])
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CACHE_INDEX: &str = r#"{
        "module": {"path": "example.com/cache", "name": "cache"},
        "declarations": [
            {"module": {"path": "example.com/cache", "name": "cache"},
             "name": "Cache", "kind": "interface",
             "methods": [
                {"name": "Get",
                 "params": [{"name": "key", "type": {"kind": "basic", "name": "string"}}],
                 "results": [{"type": {"kind": "interface", "methods": []}},
                             {"type": {"kind": "named", "name": "error"}}]}
             ]},
            {"module": {"path": "example.com/cache", "name": "cache"},
             "name": "MapCache", "kind": "struct"}
        ],
        "generators": [
            {"name": "MockcCache", "calls": [
                {"directive": "Implement", "args": [{"module": "example.com/cache", "name": "Cache"}]},
                {"directive": "SetFieldNamePrefix", "args": ["_"]}
            ]}
        ]
    }"#;

    mod loading {
        use super::*;

        #[test]
        fn parses_declarations_and_generators() {
            let index = ModuleIndex::from_json(CACHE_INDEX).unwrap();
            assert_eq!(index.local_module().path, "example.com/cache");
            let cache = index.lookup("example.com/cache", "Cache").unwrap();
            assert_eq!(cache.kind, DeclKind::Interface);
            assert_eq!(cache.methods[0].name, "Get");
            assert_eq!(
                index.lookup("example.com/cache", "MapCache").unwrap().kind,
                DeclKind::Struct
            );
            assert!(index.lookup("example.com/cache", "Missing").is_none());
            assert_eq!(index.generators[0].calls.len(), 2);
        }

        #[test]
        fn malformed_json_is_invalid_arguments() {
            let err = ModuleIndex::from_json("{ not json").unwrap_err();
            assert!(matches!(err, MockcError::InvalidArguments { .. }));
        }

        #[test]
        fn interface_ref_shapes() {
            let named: InterfaceRef =
                serde_json::from_str(r#"{"module": "io", "name": "Reader"}"#).unwrap();
            assert_eq!(named, InterfaceRef::named("io", "Reader"));

            let literal: InterfaceRef =
                serde_json::from_str(r#"{"literal": {"methods": [{"name": "Close"}]}}"#).unwrap();
            match literal {
                InterfaceRef::Literal { literal } => assert_eq!(literal.methods[0].name, "Close"),
                _ => panic!("expected literal"),
            }
        }
    }

    mod patterns {
        use super::*;

        #[test]
        fn splits_at_last_dot() {
            let r = InterfaceRef::parse_pattern("M", "gopkg.in/cache.v2.Cache").unwrap();
            assert_eq!(r, InterfaceRef::named("gopkg.in/cache.v2", "Cache"));
        }

        #[test]
        fn rejects_malformed_patterns() {
            for pattern in ["Cache", ".Cache", "example.com/cache."] {
                let err = InterfaceRef::parse_pattern("M", pattern).unwrap_err();
                assert!(matches!(err, MockcError::InvalidReference { .. }), "{}", pattern);
            }
        }
    }
}
