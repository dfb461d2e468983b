//! Canonical type text.
//!
//! [`Canonicalizer`] renders a [`TypeSignature`] as Go type syntax. The same
//! text serves two purposes:
//!
//! 1. **Equivalence.** Two method signatures are the same method exactly when
//!    their canonical text is equal. Parameter names are dropped and interface
//!    literal methods are sorted by name, so spelling differences that do not
//!    change the type do not change the text.
//! 2. **Emission.** The renderer writes the same strings into generated
//!    source, so the comparison and the output can never drift apart.
//!
//! Named types from the unit's own module render bare; named types from other
//! modules are qualified with an alias from the unit's [`ImportAliasTable`].
//!
//! # Function rendering
//!
//! | Results | Text |
//! |---------|------|
//! | none | `func(string, ...int)` |
//! | one | `func(string) error` |
//! | two or more | `func(string) (int, error)` |

use crate::alias::ImportAliasTable;
use crate::types::{ChanDir, FuncSignature, MethodSignature, ParamSignature, TypeSignature};

/// Renders types relative to one module, allocating import aliases as it goes.
pub struct Canonicalizer<'a> {
    local_module: &'a str,
    imports: &'a mut ImportAliasTable,
}

impl<'a> Canonicalizer<'a> {
    /// Create a canonicalizer for code generated into `local_module`.
    pub fn new(local_module: &'a str, imports: &'a mut ImportAliasTable) -> Self {
        Canonicalizer {
            local_module,
            imports,
        }
    }

    /// Canonical text of a type.
    pub fn type_text(&mut self, ty: &TypeSignature) -> String {
        match ty {
            TypeSignature::Basic { name } => name.clone(),
            TypeSignature::Pointer { elem } => format!("*{}", self.type_text(elem)),
            TypeSignature::Slice { elem } => format!("[]{}", self.type_text(elem)),
            TypeSignature::Array { len, elem } => format!("[{}]{}", len, self.type_text(elem)),
            TypeSignature::Map { key, value } => {
                let key = self.type_text(key);
                let value = self.type_text(value);
                format!("map[{}]{}", key, value)
            }
            TypeSignature::Chan { dir, elem } => {
                let elem_text = self.type_text(elem);
                match dir {
                    ChanDir::Both => {
                        // `chan (<-chan T)` needs parens or it parses as `chan<- chan T`.
                        if matches!(elem.as_ref(), TypeSignature::Chan { dir: ChanDir::Recv, .. }) {
                            format!("chan ({})", elem_text)
                        } else {
                            format!("chan {}", elem_text)
                        }
                    }
                    ChanDir::Send => format!("chan<- {}", elem_text),
                    ChanDir::Recv => format!("<-chan {}", elem_text),
                }
            }
            TypeSignature::Func(sig) => format!("func{}", self.signature_tail(sig)),
            TypeSignature::Named { module, name } => match module {
                Some(module) if module.path != self.local_module => {
                    let alias = self.imports.alias_for(&module.path, &module.name);
                    format!("{}.{}", alias, name)
                }
                _ => name.clone(),
            },
            TypeSignature::Struct { fields } => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|f| {
                        let ty = self.type_text(&f.ty);
                        if f.embedded {
                            ty
                        } else {
                            format!("{} {}", f.name, ty)
                        }
                    })
                    .collect();
                format!("struct{{{}}}", fields.join("; "))
            }
            TypeSignature::Interface { methods } => self.interface_text(methods),
        }
    }

    /// Canonical text of a method's type: `func(...) ...`.
    pub fn signature_text(&mut self, sig: &FuncSignature) -> String {
        format!("func{}", self.signature_tail(sig))
    }

    /// The comma-separated parameter list, without parentheses.
    ///
    /// A variadic final parameter renders as `...elem`.
    pub fn params_text(&mut self, params: &[ParamSignature]) -> String {
        params
            .iter()
            .map(|p| self.param_type_text(p))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Type text of one parameter as it appears in a parameter list.
    pub fn param_type_text(&mut self, param: &ParamSignature) -> String {
        if param.is_variadic {
            format!("...{}", self.variadic_elem_text(&param.ty))
        } else {
            self.type_text(&param.ty)
        }
    }

    /// Element type text of a variadic parameter's slice type.
    pub fn variadic_elem_text(&mut self, ty: &TypeSignature) -> String {
        match ty {
            TypeSignature::Slice { elem } => self.type_text(elem),
            other => self.type_text(other),
        }
    }

    /// The result clause: empty, a single type, or a parenthesized list.
    pub fn results_text(&mut self, sig: &FuncSignature) -> String {
        let results: Vec<String> = sig.results.iter().map(|r| self.type_text(&r.ty)).collect();
        match results.len() {
            0 => String::new(),
            1 => results.into_iter().next().unwrap_or_default(),
            _ => format!("({})", results.join(", ")),
        }
    }

    /// Canonical text of an interface literal with the given methods.
    pub fn interface_text(&mut self, methods: &[MethodSignature]) -> String {
        let mut sorted: Vec<&MethodSignature> = methods.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        let methods: Vec<String> = sorted
            .into_iter()
            .map(|m| format!("{}{}", m.name, self.signature_tail(&m.signature)))
            .collect();
        format!("interface{{{}}}", methods.join("; "))
    }

    /// `(params)` followed by ` results` when there are any.
    fn signature_tail(&mut self, sig: &FuncSignature) -> String {
        let params = self.params_text(&sig.params);
        let results = self.results_text(sig);
        if results.is_empty() {
            format!("({})", params)
        } else {
            format!("({}) {}", params, results)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
