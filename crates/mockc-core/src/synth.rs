//! Mock synthesis: from a merged method set to a concrete mock layout.
//!
//! A [`MockDescriptor`] fixes every name and type string the renderer needs.
//! For each merged method it records one [`MethodLayout`]:
//!
//! | Generated member | Present when |
//! |------------------|--------------|
//! | `mu sync.Mutex` | always |
//! | `Called bool`, `CallCount int` | always |
//! | `History []struct{Params; Results}` | at least one parameter or result |
//! | `Params struct{P0 ...}` | at least one parameter |
//! | `Results struct{R0 ...}` | at least one result |
//! | `Body func(...) ...` | always |
//!
//! Parameter and result slots are positional (`P0`, `R0`), so declared names
//! never leak into field names and unnamed parameters need no special case.

use std::collections::HashMap;

use serde::Serialize;

use crate::alias::ImportAliasTable;
use crate::canonical::Canonicalizer;
use crate::directive::{FieldNameFormatter, GenerationDescriptor};
use crate::error::{MockcError, MockcResult};
use crate::merge::{InterfaceDescriptor, MergedMethod};

/// One parameter or result slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    /// Field in the `Params`/`Results` struct: `P0`, `R1`, ...
    pub field: String,
    /// Local name in the generated method: `p0`, `r1`, ...
    pub local: String,
    /// Type of the slot field. Variadic parameters are stored as slices.
    pub type_text: String,
    /// Element type of a variadic parameter.
    pub variadic_elem: Option<String>,
}

impl Slot {
    pub fn is_variadic(&self) -> bool {
        self.variadic_elem.is_some()
    }
}

/// Generated state and call logic for one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodLayout {
    pub method: String,
    /// Name of the per-method state field on the mock struct.
    pub field: String,
    pub params: Vec<Slot>,
    pub results: Vec<Slot>,
    /// Whether a call-history list is generated.
    pub has_history: bool,
    /// Type of the override hook: exactly the method's signature.
    pub hook_type: String,
}

impl MethodLayout {
    /// Parameter list of the generated method: `p0 string, p1 ...int`.
    pub fn param_decls(&self) -> String {
        self.params
            .iter()
            .map(|s| match &s.variadic_elem {
                Some(elem) => format!("{} ...{}", s.local, elem),
                None => format!("{} {}", s.local, s.type_text),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Result clause of the generated method.
    pub fn result_decls(&self) -> String {
        match self.results.as_slice() {
            [] => String::new(),
            [single] => single.type_text.clone(),
            many => format!(
                "({})",
                many.iter()
                    .map(|s| s.type_text.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Arguments forwarded to the hook: `p0, p1...`.
    pub fn forward_args(&self) -> String {
        self.params
            .iter()
            .map(|s| {
                if s.is_variadic() {
                    format!("{}...", s.local)
                } else {
                    s.local.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A fully laid-out mock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MockDescriptor {
    pub name: String,
    pub constructor: Option<String>,
    pub field_names: FieldNameFormatter,
    /// Type text of the implemented interface, used by the assertion and the constructor.
    pub interface_type: String,
    pub interface: InterfaceDescriptor,
    /// One layout per method, sorted by method name.
    pub fields: Vec<MethodLayout>,
}

impl MockDescriptor {
    pub fn layout(&self, method: &str) -> Option<&MethodLayout> {
        self.fields.iter().find(|l| l.method == method)
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.fields.iter().map(|l| l.method.as_str()).collect()
    }
}

/// Lays out mocks for code generated into one module.
pub struct MockSynthesizer<'a> {
    local_module: &'a str,
}

impl<'a> MockSynthesizer<'a> {
    pub fn new(local_module: &'a str) -> Self {
        MockSynthesizer { local_module }
    }

    /// Build the layout for one mock.
    ///
    /// Fails with `FieldNameCollision` when the field-name formatter maps a
    /// method onto another method's field or onto any method name.
    pub fn synthesize(
        &self,
        desc: &GenerationDescriptor,
        interface: InterfaceDescriptor,
        imports: &mut ImportAliasTable,
    ) -> MockcResult<MockDescriptor> {
        self.check_field_names(desc, &interface)?;

        let mut canon = Canonicalizer::new(self.local_module, imports);
        let fields: Vec<MethodLayout> = interface
            .methods
            .values()
            .map(|m| layout_method(&mut canon, &desc.field_names, m))
            .collect();

        tracing::debug!(mock = %desc.name, methods = fields.len(), "synthesized mock");

        Ok(MockDescriptor {
            name: desc.name.clone(),
            constructor: desc.constructor.clone(),
            field_names: desc.field_names.clone(),
            interface_type: interface.type_text.clone(),
            interface,
            fields,
        })
    }

    fn check_field_names(
        &self,
        desc: &GenerationDescriptor,
        interface: &InterfaceDescriptor,
    ) -> MockcResult<()> {
        let mut owners: HashMap<String, &str> = HashMap::new();
        for method in interface.method_names() {
            let field = desc.field_names.format(method);
            let clash = owners
                .get(field.as_str())
                .copied()
                .or_else(|| interface.get(&field).map(|m| m.name()));
            if let Some(other) = clash {
                return Err(MockcError::FieldNameCollision {
                    mock: desc.name.clone(),
                    method: method.to_string(),
                    field,
                    other: other.to_string(),
                });
            }
            owners.insert(field, method);
        }
        Ok(())
    }
}

fn layout_method(
    canon: &mut Canonicalizer<'_>,
    field_names: &FieldNameFormatter,
    method: &MergedMethod,
) -> MethodLayout {
    let sig = &method.signature.signature;
    let params: Vec<Slot> = sig
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| Slot {
            field: format!("P{}", i),
            local: format!("p{}", i),
            type_text: canon.type_text(&p.ty),
            variadic_elem: p.is_variadic.then(|| canon.variadic_elem_text(&p.ty)),
        })
        .collect();
    let results: Vec<Slot> = sig
        .results
        .iter()
        .enumerate()
        .map(|(i, r)| Slot {
            field: format!("R{}", i),
            local: format!("r{}", i),
            type_text: canon.type_text(&r.ty),
            variadic_elem: None,
        })
        .collect();

    MethodLayout {
        method: method.name().to_string(),
        field: field_names.format(method.name()),
        has_history: !params.is_empty() || !results.is_empty(),
        hook_type: canon.signature_text(sig),
        params,
        results,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Declaration, InterfaceRef, ModuleIndex};
    use crate::merge::InterfaceMerger;
    use crate::types::{MethodSignature, ModuleRef, ParamSignature, ResultSignature, TypeSignature};

    const LOCAL: &str = "example.com/cache";

    fn cache_index(methods: Vec<MethodSignature>) -> ModuleIndex {
        let local = ModuleRef::new(LOCAL, "cache");
        ModuleIndex::new(
            local.clone(),
            vec![Declaration::interface(local, "Cache", methods, vec![])],
            vec![],
        )
    }

    fn synth(
        desc: &GenerationDescriptor,
        methods: Vec<MethodSignature>,
    ) -> MockcResult<MockDescriptor> {
        let index = cache_index(methods);
        let mut imports = ImportAliasTable::new();
        let merged = InterfaceMerger::new(&index, &desc.name)
            .merge(&[InterfaceRef::named(LOCAL, "Cache")], &mut imports)?;
        MockSynthesizer::new(LOCAL).synthesize(desc, merged, &mut imports)
    }

    fn get() -> MethodSignature {
        MethodSignature::new(
            "Get",
            vec![ParamSignature::new("key", TypeSignature::basic("string"))],
            vec![
                ResultSignature::new("val", TypeSignature::empty_interface()),
                ResultSignature::new("err", TypeSignature::error()),
            ],
        )
    }

    mod layout {
        use super::*;

        #[test]
        fn get_method_layout() {
            let desc = GenerationDescriptor::new("MockcCache");
            let mock = synth(&desc, vec![get()]).unwrap();
            let l = mock.layout("Get").unwrap();

            assert_eq!(l.field, "_Get");
            assert!(l.has_history);
            assert_eq!(l.params.len(), 1);
            assert_eq!(l.params[0].field, "P0");
            assert_eq!(l.params[0].type_text, "string");
            assert_eq!(l.results[1].field, "R1");
            assert_eq!(l.results[1].type_text, "error");
            assert_eq!(l.hook_type, "func(string) (interface{}, error)");
            assert_eq!(l.param_decls(), "p0 string");
            assert_eq!(l.result_decls(), "(interface{}, error)");
            assert_eq!(mock.interface_type, "Cache");
        }

        #[test]
        fn no_history_without_params_or_results() {
            let desc = GenerationDescriptor::new("MockcCache");
            let mock = synth(&desc, vec![MethodSignature::new("Reset", vec![], vec![])]).unwrap();
            let l = mock.layout("Reset").unwrap();
            assert!(!l.has_history);
            assert_eq!(l.result_decls(), "");
            assert_eq!(l.hook_type, "func()");
        }

        #[test]
        fn variadic_param_is_stored_as_slice() {
            let log = MethodSignature::new(
                "Log",
                vec![
                    ParamSignature::new("format", TypeSignature::basic("string")),
                    ParamSignature::variadic("args", TypeSignature::empty_interface()),
                ],
                vec![],
            );
            let mock = synth(&GenerationDescriptor::new("MockLogger"), vec![log]).unwrap();
            let l = mock.layout("Log").unwrap();
            assert_eq!(l.params[1].type_text, "[]interface{}");
            assert_eq!(l.params[1].variadic_elem.as_deref(), Some("interface{}"));
            assert_eq!(l.param_decls(), "p0 string, p1 ...interface{}");
            assert_eq!(l.forward_args(), "p0, p1...");
            assert_eq!(l.hook_type, "func(string, ...interface{})");
        }

        #[test]
        fn methods_are_sorted() {
            let del = MethodSignature::new("Del", vec![], vec![]);
            let mock = synth(&GenerationDescriptor::new("M"), vec![get(), del]).unwrap();
            assert_eq!(mock.method_names(), vec!["Del", "Get"]);
        }

        #[test]
        fn custom_prefix_and_suffix() {
            let mut desc = GenerationDescriptor::new("MockcCache");
            desc.field_names = FieldNameFormatter::new("", "Field");
            let mock = synth(&desc, vec![get()]).unwrap();
            assert_eq!(mock.layout("Get").unwrap().field, "GetField");
        }
    }

    mod collisions {
        use super::*;

        #[test]
        fn field_name_equal_to_method_name() {
            let mut desc = GenerationDescriptor::new("MockcCache");
            desc.field_names = FieldNameFormatter::new("", "X");
            let getx = MethodSignature::new("GetX", vec![], vec![]);
            let err = synth(&desc, vec![get(), getx]).unwrap_err();
            match err {
                MockcError::FieldNameCollision { method, field, other, .. } => {
                    assert_eq!(method, "Get");
                    assert_eq!(field, "GetX");
                    assert_eq!(other, "GetX");
                }
                other => panic!("expected FieldNameCollision, got {:?}", other),
            }
        }

        #[test]
        fn default_formatter_is_injective() {
            let del = MethodSignature::new("Del", vec![], vec![]);
            let underscore = MethodSignature::new("X_Del", vec![], vec![]);
            assert!(synth(&GenerationDescriptor::new("M"), vec![del, underscore]).is_ok());
        }
    }
}
