//! Output units: grouping mocks by destination and generating each group.
//!
//! An output unit is one destination file and every mock written into it.
//! Units are independent: each gets its own [`ImportAliasTable`], and a
//! failure in one unit says nothing about the others.

use std::collections::HashSet;

use serde::Serialize;

use crate::alias::{ImportAlias, ImportAliasTable};
use crate::directive::GenerationDescriptor;
use crate::error::{MockcError, MockcResult};
use crate::index::{ModuleIndex, SourceIndex};
use crate::merge::InterfaceMerger;
use crate::synth::{MockDescriptor, MockSynthesizer};
use crate::types::ModuleRef;

/// Import path every generated file needs for `sync.Mutex`.
pub const SYNC_PACKAGE: &str = "sync";

/// Mocks sharing one destination, in generator order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    pub destination: String,
    pub mocks: Vec<GenerationDescriptor>,
}

impl OutputUnit {
    pub fn new(destination: impl Into<String>) -> Self {
        OutputUnit {
            destination: destination.into(),
            mocks: Vec::new(),
        }
    }

    pub fn mock_names(&self) -> Vec<String> {
        self.mocks.iter().map(|m| m.name.clone()).collect()
    }
}

/// A unit whose mocks have all been merged and laid out.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesizedUnit {
    pub destination: String,
    pub package: ModuleRef,
    /// Imports in allocation order, `sync` first.
    pub imports: Vec<ImportAlias>,
    pub mocks: Vec<MockDescriptor>,
}

/// Parse every generator of `index` and group the mocks by destination.
///
/// Destinations keep first-encounter order. Any directive error aborts
/// planning, since the failing mock's destination is unknown.
pub fn plan_units(index: &ModuleIndex) -> MockcResult<Vec<OutputUnit>> {
    let mut units: Vec<OutputUnit> = Vec::new();
    let mut seen = HashSet::new();

    for generator in &index.generators {
        let desc = GenerationDescriptor::from_generator(generator)?;
        if !seen.insert(desc.name.clone()) {
            return Err(MockcError::invalid_config(
                &desc.name,
                "mock name",
                "declared by more than one generator",
            ));
        }
        match units.iter_mut().find(|u| u.destination == desc.destination) {
            Some(unit) => unit.mocks.push(desc),
            None => {
                let mut unit = OutputUnit::new(desc.destination.clone());
                unit.mocks.push(desc);
                units.push(unit);
            }
        }
    }

    Ok(units)
}

/// Merge and lay out every mock of `unit`.
///
/// The first error aborts the unit.
pub fn synthesize_unit<I: SourceIndex + ?Sized>(
    index: &I,
    unit: &OutputUnit,
) -> MockcResult<SynthesizedUnit> {
    let local = index.local_module();
    let mut imports = ImportAliasTable::new();
    imports.alias_for(SYNC_PACKAGE, SYNC_PACKAGE);

    let synthesizer = MockSynthesizer::new(&local.path);
    let mut mocks = Vec::with_capacity(unit.mocks.len());
    for desc in &unit.mocks {
        if desc.interfaces.is_empty() {
            return Err(MockcError::invalid_config(
                &desc.name,
                "Implement",
                "no interface to implement",
            ));
        }
        let merged = InterfaceMerger::new(index, &desc.name).merge(&desc.interfaces, &mut imports)?;
        mocks.push(synthesizer.synthesize(desc, merged, &mut imports)?);
    }

    Ok(SynthesizedUnit {
        destination: unit.destination.clone(),
        package: local.clone(),
        imports: imports.imports().to_vec(),
        mocks,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Declaration, DirectiveCall, GeneratorEntry};
    use crate::types::{MethodSignature, ParamSignature, ResultSignature, TypeSignature};
    use serde_json::json;

    const LOCAL: &str = "example.com/cache";

    fn generator(name: &str, calls: Vec<DirectiveCall>) -> GeneratorEntry {
        GeneratorEntry {
            name: name.to_string(),
            calls,
        }
    }

    fn implement(module: &str, name: &str) -> DirectiveCall {
        DirectiveCall::new("Implement", vec![json!({"module": module, "name": name})])
    }

    fn destination(d: &str) -> DirectiveCall {
        DirectiveCall::new("SetDestination", vec![json!(d)])
    }

    fn index(generators: Vec<GeneratorEntry>) -> ModuleIndex {
        let local = ModuleRef::new(LOCAL, "cache");
        let ctx = ModuleRef::from_path("context");
        let get = MethodSignature::new(
            "Get",
            vec![
                ParamSignature::new("ctx", TypeSignature::named(ctx, "Context")),
                ParamSignature::new("key", TypeSignature::basic("string")),
            ],
            vec![ResultSignature::unnamed(TypeSignature::error())],
        );
        ModuleIndex::new(
            local.clone(),
            vec![
                Declaration::interface(local.clone(), "Cache", vec![get], vec![]),
                Declaration::interface(
                    local,
                    "Closer",
                    vec![MethodSignature::new("Close", vec![], vec![])],
                    vec![],
                ),
            ],
            generators,
        )
    }

    mod planning {
        use super::*;

        #[test]
        fn groups_by_destination_in_first_encounter_order() {
            let idx = index(vec![
                generator("MockA", vec![implement(LOCAL, "Cache"), destination("b_gen.go")]),
                generator("MockB", vec![implement(LOCAL, "Cache")]),
                generator("MockC", vec![implement(LOCAL, "Closer"), destination("b_gen.go")]),
            ]);
            let units = plan_units(&idx).unwrap();
            assert_eq!(units.len(), 2);
            assert_eq!(units[0].destination, "b_gen.go");
            assert_eq!(units[0].mock_names(), vec!["MockA", "MockC"]);
            assert_eq!(units[1].destination, "mockc_gen.go");
        }

        #[test]
        fn spellings_of_one_destination_share_a_unit() {
            let idx = index(vec![
                generator("MockA", vec![implement(LOCAL, "Cache")]),
                generator("MockB", vec![implement(LOCAL, "Closer"), destination("./mockc_gen.go")]),
                generator("MockC", vec![implement(LOCAL, "Closer"), destination("x.go")]),
                generator("MockD", vec![implement(LOCAL, "Cache"), destination("sub/../x.go")]),
            ]);
            let units = plan_units(&idx).unwrap();
            assert_eq!(units.len(), 2);
            assert_eq!(units[0].destination, "mockc_gen.go");
            assert_eq!(units[0].mock_names(), vec!["MockA", "MockB"]);
            assert_eq!(units[1].destination, "x.go");
            assert_eq!(units[1].mock_names(), vec!["MockC", "MockD"]);
        }

        #[test]
        fn directive_error_aborts_planning() {
            let idx = index(vec![
                generator("MockA", vec![implement(LOCAL, "Cache")]),
                generator("MockB", vec![DirectiveCall::new("Frobnicate", vec![])]),
            ]);
            let err = plan_units(&idx).unwrap_err();
            assert!(matches!(err, MockcError::UnknownDirective { .. }));
            assert_eq!(err.mock(), Some("MockB"));
        }

        #[test]
        fn duplicate_mock_names_are_rejected() {
            let idx = index(vec![
                generator("MockA", vec![implement(LOCAL, "Cache")]),
                generator("MockA", vec![implement(LOCAL, "Closer")]),
            ]);
            assert!(matches!(
                plan_units(&idx).unwrap_err(),
                MockcError::InvalidConfigValue { .. }
            ));
        }
    }

    mod synthesis {
        use super::*;

        #[test]
        fn sync_is_reserved_first() {
            let idx = index(vec![generator("MockA", vec![implement(LOCAL, "Cache")])]);
            let units = plan_units(&idx).unwrap();
            let unit = synthesize_unit(&idx, &units[0]).unwrap();
            let paths: Vec<_> = unit.imports.iter().map(|i| i.path.as_str()).collect();
            assert_eq!(paths, vec!["sync", "context"]);
            assert_eq!(unit.package.name, "cache");
            assert_eq!(unit.mocks[0].name, "MockA");
        }

        #[test]
        fn first_error_aborts_unit() {
            let idx = index(vec![
                generator("MockA", vec![implement(LOCAL, "Cache")]),
                generator("MockB", vec![implement(LOCAL, "Missing")]),
            ]);
            let units = plan_units(&idx).unwrap();
            let err = synthesize_unit(&idx, &units[0]).unwrap_err();
            assert!(matches!(err, MockcError::InvalidReference { .. }));
            assert_eq!(err.mock(), Some("MockB"));
        }

        #[test]
        fn units_do_not_share_alias_state() {
            let idx = index(vec![
                generator("MockA", vec![implement(LOCAL, "Closer"), destination("a_gen.go")]),
                generator("MockB", vec![implement(LOCAL, "Cache"), destination("b_gen.go")]),
            ]);
            let units = plan_units(&idx).unwrap();
            let a = synthesize_unit(&idx, &units[0]).unwrap();
            let b = synthesize_unit(&idx, &units[1]).unwrap();
            assert_eq!(a.imports.len(), 1);
            assert_eq!(b.imports.len(), 2);
        }

        #[test]
        fn mock_without_interfaces_is_rejected() {
            let idx = index(vec![generator("MockA", vec![])]);
            let units = plan_units(&idx).unwrap();
            assert!(matches!(
                synthesize_unit(&idx, &units[0]).unwrap_err(),
                MockcError::InvalidConfigValue { .. }
            ));
        }
    }
}
