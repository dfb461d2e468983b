//! Type and method signatures handed to the engine by the source index.
//!
//! These are pure values: built once while the index is loaded, never
//! mutated afterwards, and compared by content. Composite types recurse
//! through `Box<TypeSignature>`; the type graph is a finite DAG over
//! declared named types, so every traversal here terminates.
//!
//! Parameter and result names are carried for documentation only. They never
//! take part in canonical text (see [`crate::canonical`]), which is what
//! makes `Get(key string)` and `Get(k string)` the same method.

use serde::{Deserialize, Serialize};

// ============================================================================
// Module References
// ============================================================================

/// A module (Go package) identified by its import path and its own short name.
///
/// The short name is what the module calls itself in its package clause and
/// is not always the last path segment (`gopkg.in/yaml.v3` is `yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleRef {
    /// Full import path.
    pub path: String,
    /// Package clause name.
    pub name: String,
}

impl ModuleRef {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        ModuleRef {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Build a reference whose short name is the last path segment.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = last_path_segment(&path).to_string();
        ModuleRef { path, name }
    }
}

/// The final `/`-separated segment of an import path.
pub fn last_path_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Whether a name is visible outside its module.
///
/// Go's rule: the first character is an uppercase letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Whether `name` is a valid identifier for generated code.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

// ============================================================================
// Type Signatures
// ============================================================================

/// Direction of a channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChanDir {
    /// `chan T`
    #[default]
    Both,
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
}

/// A type, as a recursive tagged union.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeSignature {
    /// Predeclared basic type (`int`, `string`, `unsafe.Pointer` is a named type).
    Basic { name: String },
    Pointer { elem: Box<TypeSignature> },
    Slice { elem: Box<TypeSignature> },
    Array { len: u64, elem: Box<TypeSignature> },
    Map {
        key: Box<TypeSignature>,
        value: Box<TypeSignature>,
    },
    Chan {
        #[serde(default)]
        dir: ChanDir,
        elem: Box<TypeSignature>,
    },
    Func(FuncSignature),
    /// A declared type. `module` is `None` for universe-scope names such as `error`.
    Named {
        #[serde(default)]
        module: Option<ModuleRef>,
        name: String,
    },
    Struct { fields: Vec<StructField> },
    /// Interface literal with its already-flattened method set.
    Interface { methods: Vec<MethodSignature> },
}

impl TypeSignature {
    pub fn basic(name: impl Into<String>) -> Self {
        TypeSignature::Basic { name: name.into() }
    }

    pub fn pointer(elem: TypeSignature) -> Self {
        TypeSignature::Pointer {
            elem: Box::new(elem),
        }
    }

    pub fn slice(elem: TypeSignature) -> Self {
        TypeSignature::Slice {
            elem: Box::new(elem),
        }
    }

    pub fn array(len: u64, elem: TypeSignature) -> Self {
        TypeSignature::Array {
            len,
            elem: Box::new(elem),
        }
    }

    pub fn map(key: TypeSignature, value: TypeSignature) -> Self {
        TypeSignature::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn chan(dir: ChanDir, elem: TypeSignature) -> Self {
        TypeSignature::Chan {
            dir,
            elem: Box::new(elem),
        }
    }

    /// A named type declared in `module`.
    pub fn named(module: ModuleRef, name: impl Into<String>) -> Self {
        TypeSignature::Named {
            module: Some(module),
            name: name.into(),
        }
    }

    /// A universe-scope named type (`error`, `any`, `comparable`).
    pub fn universe(name: impl Into<String>) -> Self {
        TypeSignature::Named {
            module: None,
            name: name.into(),
        }
    }

    /// `interface{}`
    pub fn empty_interface() -> Self {
        TypeSignature::Interface {
            methods: Vec::new(),
        }
    }

    /// The `error` interface.
    pub fn error() -> Self {
        TypeSignature::universe("error")
    }
}

/// One field of a struct literal type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeSignature,
    /// Embedded field: rendered without an explicit field name.
    #[serde(default)]
    pub embedded: bool,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: TypeSignature) -> Self {
        StructField {
            name: name.into(),
            ty,
            embedded: false,
        }
    }

    /// An embedded field; its name is the type's own name.
    pub fn embedded(ty: TypeSignature) -> Self {
        let name = match &ty {
            TypeSignature::Named { name, .. } => name.clone(),
            TypeSignature::Pointer { elem } => match elem.as_ref() {
                TypeSignature::Named { name, .. } => name.clone(),
                _ => String::new(),
            },
            _ => String::new(),
        };
        StructField {
            name,
            ty,
            embedded: true,
        }
    }
}

// ============================================================================
// Function and Method Signatures
// ============================================================================

/// A parameter of a function or method.
///
/// A variadic parameter carries its slice type (`...int` is `[]int` here);
/// only the last parameter of a signature may be variadic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamSignature {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeSignature,
    #[serde(default)]
    pub is_variadic: bool,
}

impl ParamSignature {
    pub fn new(name: impl Into<String>, ty: TypeSignature) -> Self {
        ParamSignature {
            name: name.into(),
            ty,
            is_variadic: false,
        }
    }

    /// A variadic parameter of element type `elem`.
    pub fn variadic(name: impl Into<String>, elem: TypeSignature) -> Self {
        ParamSignature {
            name: name.into(),
            ty: TypeSignature::slice(elem),
            is_variadic: true,
        }
    }
}

/// A result of a function or method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultSignature {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeSignature,
}

impl ResultSignature {
    pub fn new(name: impl Into<String>, ty: TypeSignature) -> Self {
        ResultSignature {
            name: name.into(),
            ty,
        }
    }

    pub fn unnamed(ty: TypeSignature) -> Self {
        ResultSignature::new("", ty)
    }
}

/// Parameters and results of a function type or method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FuncSignature {
    #[serde(default)]
    pub params: Vec<ParamSignature>,
    #[serde(default)]
    pub results: Vec<ResultSignature>,
}

impl FuncSignature {
    pub fn new(params: Vec<ParamSignature>, results: Vec<ResultSignature>) -> Self {
        FuncSignature { params, results }
    }

    /// True when the final parameter is variadic.
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|p| p.is_variadic)
    }
}

/// A named method: `Get(key string) (interface{}, error)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,
    #[serde(flatten)]
    pub signature: FuncSignature,
}

impl MethodSignature {
    pub fn new(
        name: impl Into<String>,
        params: Vec<ParamSignature>,
        results: Vec<ResultSignature>,
    ) -> Self {
        MethodSignature {
            name: name.into(),
            signature: FuncSignature::new(params, results),
        }
    }

    pub fn params(&self) -> &[ParamSignature] {
        &self.signature.params
    }

    pub fn results(&self) -> &[ResultSignature] {
        &self.signature.results
    }
}

// ============================================================================
// Tests
// ============================================================================
