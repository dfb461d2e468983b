//! Rendering a synthesized unit as Go source.
//!
//! Output is laid out the way gofmt would leave it: tab indentation, one
//! declaration group per mock, and aligned columns for runs of simple field
//! declarations and composite-literal keys.

use mockc_core::synth::{MethodLayout, MockDescriptor, Slot};
use mockc_core::types::last_path_segment;
use mockc_core::unit::SynthesizedUnit;

/// First line of every generated file.
pub const GENERATED_HEADER: &str = "// Code generated by mockc. DO NOT EDIT.";

/// Build constraint that keeps generated mocks out of the generator's own build.
pub const BUILD_CONSTRAINT: &str = "//go:build !mockc";

const RECV: &str = "recv";

// ============================================================================
// Writer
// ============================================================================

/// Line-oriented writer with tab indentation.
#[derive(Debug, Default)]
struct GoWriter {
    out: String,
    depth: usize,
}

impl GoWriter {
    fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push('\t');
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Write `text` and indent what follows.
    fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.depth += 1;
    }

    /// Dedent and write `text`.
    fn close(&mut self, text: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    /// Dedent, write `text`, indent again: `}{`, `} else {`.
    fn reopen(&mut self, text: impl AsRef<str>) {
        self.close(text);
        self.depth += 1;
    }

    /// Write rows of two cells with the second column aligned.
    fn aligned<'a>(&mut self, rows: impl IntoIterator<Item = (&'a str, &'a str)>) {
        let rows: Vec<(&str, &str)> = rows.into_iter().collect();
        let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in rows {
            self.line(format!("{:width$} {}", key, value, width = width));
        }
    }

    fn finish(self) -> String {
        self.out
    }
}

// ============================================================================
// Unit
// ============================================================================

/// Render a whole output unit.
///
/// `regenerate` is the command recorded in the `//go:generate` line.
pub fn render_unit(unit: &SynthesizedUnit, regenerate: &str) -> String {
    let mut w = GoWriter::default();

    w.line(GENERATED_HEADER);
    w.blank();
    w.line(format!("//go:generate {}", regenerate));
    w.line(BUILD_CONSTRAINT);
    w.blank();
    w.line(format!("package {}", unit.package.name));
    w.blank();

    let specs: Vec<String> = unit
        .imports
        .iter()
        .map(|i| {
            if i.alias == last_path_segment(&i.path) {
                format!("{:?}", i.path)
            } else {
                format!("{} {:?}", i.alias, i.path)
            }
        })
        .collect();
    match specs.as_slice() {
        [] => {}
        [single] => {
            w.line(format!("import {}", single));
            w.blank();
        }
        many => {
            w.open("import (");
            for spec in many {
                w.line(spec);
            }
            w.close(")");
            w.blank();
        }
    }

    for (i, mock) in unit.mocks.iter().enumerate() {
        if i > 0 {
            w.blank();
        }
        render_mock(&mut w, mock);
    }

    let out = w.finish();
    tracing::debug!(
        destination = %unit.destination,
        mocks = unit.mocks.len(),
        bytes = out.len(),
        "rendered unit"
    );
    out
}

fn render_mock(w: &mut GoWriter, mock: &MockDescriptor) {
    w.line(format!("var _ {} = &{}{{}}", mock.interface_type, mock.name));
    w.blank();

    w.open(format!("type {} struct {{", mock.name));
    for layout in &mock.fields {
        render_state_field(w, layout);
    }
    w.close("}");

    if let Some(constructor) = &mock.constructor {
        w.blank();
        render_constructor(w, mock, constructor);
    }

    for layout in &mock.fields {
        w.blank();
        render_method(w, mock, layout);
    }
}

// ============================================================================
// State Struct
// ============================================================================

fn render_state_field(w: &mut GoWriter, layout: &MethodLayout) {
    w.line(format!("// method: {}", layout.method));
    w.open(format!("{} struct {{", layout.field));
    w.line("mu sync.Mutex");
    w.line("// basics");
    w.aligned([("Called", "bool"), ("CallCount", "int")]);
    if layout.has_history {
        w.line("// call history");
        w.open("History []struct {");
        snapshot_fields(w, layout);
        w.close("}");
    }
    if !layout.params.is_empty() {
        w.line("// params");
        slot_struct(w, "Params", &layout.params);
    }
    if !layout.results.is_empty() {
        w.line("// results");
        slot_struct(w, "Results", &layout.results);
    }
    w.line("// if it is not nil, it'll be called in the middle of the method.");
    w.line(format!("Body {}", layout.hook_type));
    w.close("}");
}

/// `Params struct{...}` and `Results struct{...}` as they appear in a history entry.
fn snapshot_fields(w: &mut GoWriter, layout: &MethodLayout) {
    if !layout.params.is_empty() {
        slot_struct(w, "Params", &layout.params);
    }
    if !layout.results.is_empty() {
        slot_struct(w, "Results", &layout.results);
    }
}

fn slot_struct(w: &mut GoWriter, name: &str, slots: &[Slot]) {
    w.open(format!("{} struct {{", name));
    w.aligned(slots.iter().map(|s| (s.field.as_str(), s.type_text.as_str())));
    w.close("}");
}

// ============================================================================
// Constructor
// ============================================================================

fn render_constructor(w: &mut GoWriter, mock: &MockDescriptor, constructor: &str) {
    w.open(format!(
        "func {}(v ...{}) *{} {{",
        constructor, mock.interface_type, mock.name
    ));
    w.open("if len(v) > 1 {");
    w.line(format!(
        "panic(\"{}: at most one implementation may be given\")",
        constructor
    ));
    w.close("}");
    w.line(format!("m := &{}{{}}", mock.name));
    if !mock.fields.is_empty() {
        w.open("if len(v) > 0 {");
        for layout in &mock.fields {
            w.line(format!("m.{}.Body = v[0].{}", layout.field, layout.method));
        }
        w.close("}");
    }
    w.line("return m");
    w.close("}");
}

// ============================================================================
// Methods
// ============================================================================

fn render_method(w: &mut GoWriter, mock: &MockDescriptor, layout: &MethodLayout) {
    let results = layout.result_decls();
    let header = if results.is_empty() {
        format!(
            "func ({} *{}) {}({}) {{",
            RECV,
            mock.name,
            layout.method,
            layout.param_decls()
        )
    } else {
        format!(
            "func ({} *{}) {}({}) {} {{",
            RECV,
            mock.name,
            layout.method,
            layout.param_decls(),
            results
        )
    };
    let field = format!("{}.{}", RECV, layout.field);

    w.open(header);
    w.line(format!("{}.mu.Lock()", field));
    w.line(format!("defer {}.mu.Unlock()", field));

    w.line("// basics");
    w.line(format!("{}.Called = true", field));
    w.line(format!("{}.CallCount++", field));

    if !layout.params.is_empty() {
        w.line("// params");
        for slot in &layout.params {
            w.line(format!("{}.Params.{} = {}", field, slot.field, slot.local));
        }
    }

    w.line("// body");
    w.open(format!("if {}.Body != nil {{", field));
    let call = format!("{}.Body({})", field, layout.forward_args());
    if layout.results.is_empty() {
        w.line(call);
    } else {
        w.line(format!("{} = {}", result_list(&field, &layout.results), call));
    }
    w.close("}");

    if layout.has_history {
        w.line("// call history");
        w.open(format!(
            "{}.History = append({}.History, struct {{",
            field, field
        ));
        snapshot_fields(w, layout);
        w.reopen("}{");
        let params = format!("{}.Params,", field);
        let results = format!("{}.Results,", field);
        let mut rows = Vec::new();
        if !layout.params.is_empty() {
            rows.push(("Params:", params.as_str()));
        }
        if !layout.results.is_empty() {
            rows.push(("Results:", results.as_str()));
        }
        w.aligned(rows);
        w.close("})");
    }

    if !layout.results.is_empty() {
        w.line("// results");
        w.line(format!("return {}", result_list(&field, &layout.results)));
    }
    w.close("}");
}

/// `recv._Get.Results.R0, recv._Get.Results.R1`
fn result_list(field: &str, results: &[Slot]) -> String {
    results
        .iter()
        .map(|s| format!("{}.Results.{}", field, s.field))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mockc_core::alias::ImportAliasTable;
    use mockc_core::directive::GenerationDescriptor;
    use mockc_core::index::{Declaration, InterfaceRef, ModuleIndex};
    use mockc_core::merge::InterfaceMerger;
    use mockc_core::synth::MockSynthesizer;
    use mockc_core::types::{
        MethodSignature, ModuleRef, ParamSignature, ResultSignature, TypeSignature,
    };
    use mockc_core::unit::{synthesize_unit, OutputUnit};

    const LOCAL: &str = "example.com/cache";

    fn local() -> ModuleRef {
        ModuleRef::new(LOCAL, "cache")
    }

    fn get() -> MethodSignature {
        MethodSignature::new(
            "Get",
            vec![ParamSignature::new("key", TypeSignature::basic("string"))],
            vec![
                ResultSignature::unnamed(TypeSignature::empty_interface()),
                ResultSignature::unnamed(TypeSignature::error()),
            ],
        )
    }

    fn render(methods: Vec<MethodSignature>, constructor: bool) -> String {
        let index = ModuleIndex::new(
            local(),
            vec![Declaration::interface(local(), "Cache", methods, vec![])],
            vec![],
        );
        let mut desc = GenerationDescriptor::new("MockcCache");
        desc.interfaces = vec![InterfaceRef::named(LOCAL, "Cache")];
        if constructor {
            desc.constructor = Some("NewMockcCache".to_string());
        }
        let mut unit = OutputUnit::new("mockc_gen.go");
        unit.mocks.push(desc);
        let unit = synthesize_unit(&index, &unit).unwrap();
        render_unit(&unit, "mockc")
    }

    #[test]
    fn renders_complete_file_for_one_method() {
        let src = render(vec![get()], false);
        let expected = r#"// Code generated by mockc. DO NOT EDIT.

//go:generate mockc
//go:build !mockc

package cache

import "sync"

var _ Cache = &MockcCache{}

type MockcCache struct {
	// method: Get
	_Get struct {
		mu sync.Mutex
		// basics
		Called    bool
		CallCount int
		// call history
		History []struct {
			Params struct {
				P0 string
			}
			Results struct {
				R0 interface{}
				R1 error
			}
		}
		// params
		Params struct {
			P0 string
		}
		// results
		Results struct {
			R0 interface{}
			R1 error
		}
		// if it is not nil, it'll be called in the middle of the method.
		Body func(string) (interface{}, error)
	}
}

func (recv *MockcCache) Get(p0 string) (interface{}, error) {
	recv._Get.mu.Lock()
	defer recv._Get.mu.Unlock()
	// basics
	recv._Get.Called = true
	recv._Get.CallCount++
	// params
	recv._Get.Params.P0 = p0
	// body
	if recv._Get.Body != nil {
		recv._Get.Results.R0, recv._Get.Results.R1 = recv._Get.Body(p0)
	}
	// call history
	recv._Get.History = append(recv._Get.History, struct {
		Params struct {
			P0 string
		}
		Results struct {
			R0 interface{}
			R1 error
		}
	}{
		Params:  recv._Get.Params,
		Results: recv._Get.Results,
	})
	// results
	return recv._Get.Results.R0, recv._Get.Results.R1
}
"#;
        assert_eq!(src, expected);
    }

    #[test]
    fn method_without_params_or_results_has_no_history() {
        let src = render(vec![MethodSignature::new("Reset", vec![], vec![])], false);
        assert!(!src.contains("History"));
        assert!(src.contains("func (recv *MockcCache) Reset() {\n"));
        assert!(src.contains("\t\trecv._Reset.Body()\n"));
        assert!(!src.contains("return"));
    }

    #[test]
    fn constructor_delegates_and_rejects_extra_arguments() {
        let src = render(vec![get(), MethodSignature::new("Reset", vec![], vec![])], true);
        let expected = "func NewMockcCache(v ...Cache) *MockcCache {
	if len(v) > 1 {
		panic(\"NewMockcCache: at most one implementation may be given\")
	}
	m := &MockcCache{}
	if len(v) > 0 {
		m._Get.Body = v[0].Get
		m._Reset.Body = v[0].Reset
	}
	return m
}
";
        assert!(src.contains(expected), "{}", src);
        // Methods are emitted in name order.
        assert!(src.find(") Get(").unwrap() < src.find(") Reset(").unwrap());
    }

    #[test]
    fn variadic_parameters_are_forwarded_with_ellipsis() {
        let log = MethodSignature::new(
            "Log",
            vec![
                ParamSignature::new("format", TypeSignature::basic("string")),
                ParamSignature::variadic("args", TypeSignature::empty_interface()),
            ],
            vec![],
        );
        let src = render(vec![log], false);
        assert!(src.contains("func (recv *MockcCache) Log(p0 string, p1 ...interface{}) {"));
        assert!(src.contains("recv._Log.Body(p0, p1...)"));
        assert!(src.contains("\t\t\t\tP1 []interface{}\n"));
        assert!(src.contains("Body func(string, ...interface{})"));
        assert!(src.contains("\t\tParams: recv._Log.Params,\n"));
    }

    #[test]
    fn external_types_get_import_aliases() {
        let ctx = ModuleRef::from_path("context");
        let other_ctx = ModuleRef::new("acme.io/ctx", "context");
        let fetch = MethodSignature::new(
            "Fetch",
            vec![
                ParamSignature::new("ctx", TypeSignature::named(ctx, "Context")),
                ParamSignature::new("octx", TypeSignature::named(other_ctx, "Context")),
            ],
            vec![ResultSignature::unnamed(TypeSignature::error())],
        );
        let src = render(vec![fetch], false);
        assert!(
            src.contains("import (\n\t\"sync\"\n\t\"context\"\n\tcontext1 \"acme.io/ctx\"\n)\n"),
            "{}",
            src
        );
        assert!(src.contains(
            "func (recv *MockcCache) Fetch(p0 context.Context, p1 context1.Context) error {"
        ));
    }

    #[test]
    fn merged_interfaces_assert_against_literal() {
        let index = ModuleIndex::new(
            local(),
            vec![
                Declaration::interface(local(), "Getter", vec![get()], vec![]),
                Declaration::interface(
                    local(),
                    "Resetter",
                    vec![MethodSignature::new("Reset", vec![], vec![])],
                    vec![],
                ),
            ],
            vec![],
        );
        let mut imports = ImportAliasTable::new();
        imports.alias_for("sync", "sync");
        let refs = [InterfaceRef::named(LOCAL, "Getter"), InterfaceRef::named(LOCAL, "Resetter")];
        let merged = InterfaceMerger::new(&index, "MockBoth").merge(&refs, &mut imports).unwrap();
        let mock = MockSynthesizer::new(LOCAL)
            .synthesize(&GenerationDescriptor::new("MockBoth"), merged, &mut imports)
            .unwrap();
        let unit = SynthesizedUnit {
            destination: "mockc_gen.go".to_string(),
            package: local(),
            imports: imports.imports().to_vec(),
            mocks: vec![mock],
        };
        let src = render_unit(&unit, "mockc");
        assert!(src.contains(
            "var _ interface{Get(string) (interface{}, error); Reset()} = &MockBoth{}"
        ));
    }

    #[test]
    fn aligned_rows_pad_to_widest_key() {
        let mut w = GoWriter::default();
        w.depth = 1;
        w.aligned([("R0", "int"), ("Results:", "x")]);
        assert_eq!(w.finish(), "\tR0       int\n\tResults: x\n");
    }
}
