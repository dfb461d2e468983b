//! Interface merging: embedded-interface flattening and method-set union.
//!
//! [`InterfaceMerger::merge`] turns the ordered interface references of one
//! mock request into a single [`InterfaceDescriptor`]:
//!
//! 1. Each reference is flattened depth-first through its embeds into a list
//!    of candidate methods, each remembering the module that declared it.
//!    A reference that re-enters itself while being flattened is a
//!    `MergeCycle`.
//! 2. A top-level reference is *external* when any of its candidates was
//!    declared outside the unit's own module. Every method of an external
//!    reference must be exported, and so must every named type reachable
//!    from its parameters and results (unexported struct fields and
//!    interface-literal methods included); otherwise `NonExportedMethod`.
//!    Methods of an interface literal belong to the module whose source
//!    contains the literal.
//! 3. Candidates are unioned by name. A repeated name whose canonical
//!    signature text matches the accepted one is a no-op; any difference is
//!    `DuplicateMethod`.
//!
//! Merging is all-or-nothing. Aliases allocated while canonicalizing go into
//! a scratch copy of the import table that is committed only on success.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::alias::ImportAliasTable;
use crate::canonical::Canonicalizer;
use crate::error::{MockcError, MockcResult};
use crate::index::{DeclKind, InterfaceRef, SourceIndex};
use crate::types::{is_exported, MethodSignature, ModuleRef, TypeSignature};

// ============================================================================
// Merged Interface
// ============================================================================

/// One method of a merged interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedMethod {
    pub signature: MethodSignature,
    /// Canonical `func(...) ...` text used for equivalence.
    pub canonical: String,
    /// Module that declared the method.
    pub declared_in: ModuleRef,
    /// Interface (qualified name or literal text) the method was first accepted from.
    pub source: String,
}

impl MergedMethod {
    pub fn name(&self) -> &str {
        &self.signature.name
    }
}

/// The merged method set of one mock request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceDescriptor {
    /// Methods keyed by name; iteration order is sorted by name.
    pub methods: BTreeMap<String, MergedMethod>,
    /// True if any contributing interface was declared outside the unit's module.
    pub external: bool,
    /// Type text that names the whole method set in generated code.
    pub type_text: String,
}

impl InterfaceDescriptor {
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&MergedMethod> {
        self.methods.get(name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

// ============================================================================
// Merger
// ============================================================================

/// A method found while flattening, with its origin.
#[derive(Debug, Clone)]
struct Candidate {
    method: MethodSignature,
    declared_in: ModuleRef,
    source: String,
}

/// Merges interface references for one mock against a source index.
pub struct InterfaceMerger<'a, I: SourceIndex + ?Sized> {
    index: &'a I,
    mock: &'a str,
}

impl<'a, I: SourceIndex + ?Sized> InterfaceMerger<'a, I> {
    pub fn new(index: &'a I, mock: &'a str) -> Self {
        InterfaceMerger { index, mock }
    }

    /// Merge `refs` into one method set.
    ///
    /// On success, aliases needed by the merged methods have been added to
    /// `imports`; on failure `imports` is unchanged.
    pub fn merge(
        &self,
        refs: &[InterfaceRef],
        imports: &mut ImportAliasTable,
    ) -> MockcResult<InterfaceDescriptor> {
        let local = self.index.local_module().clone();
        let mut scratch = imports.clone();
        let mut methods: BTreeMap<String, MergedMethod> = BTreeMap::new();
        let mut external = false;

        for r in refs {
            let mut candidates = Vec::new();
            let mut stack = Vec::new();
            self.flatten(r, &local, &mut stack, &mut candidates)?;

            let is_external = candidates
                .iter()
                .any(|c| c.declared_in.path != local.path);
            if is_external {
                external = true;
                for c in &candidates {
                    self.check_accessible(c, &local.path)?;
                }
            }

            let mut canon = Canonicalizer::new(&local.path, &mut scratch);
            for c in candidates {
                let canonical = canon.signature_text(&c.method.signature);
                let same = methods
                    .get(&c.method.name)
                    .map(|existing| existing.canonical == canonical);
                match same {
                    Some(false) => {
                        return Err(MockcError::DuplicateMethod {
                            mock: self.mock.to_string(),
                            method: c.method.name.clone(),
                        });
                    }
                    Some(true) => {}
                    None => {
                        methods.insert(
                            c.method.name.clone(),
                            MergedMethod {
                                signature: c.method,
                                canonical,
                                declared_in: c.declared_in,
                                source: c.source,
                            },
                        );
                    }
                }
            }
        }

        let type_text = {
            let mut canon = Canonicalizer::new(&local.path, &mut scratch);
            match refs {
                [InterfaceRef::Named { module, name }] => {
                    let decl_module = self
                        .index
                        .lookup(module, name)
                        .map(|d| d.module.clone())
                        .unwrap_or_else(|| ModuleRef::from_path(module.as_str()));
                    canon.type_text(&TypeSignature::named(decl_module, name.as_str()))
                }
                _ => {
                    let sigs: Vec<MethodSignature> =
                        methods.values().map(|m| m.signature.clone()).collect();
                    canon.interface_text(&sigs)
                }
            }
        };

        tracing::debug!(
            mock = self.mock,
            methods = methods.len(),
            external,
            "merged interfaces"
        );

        *imports = scratch;
        Ok(InterfaceDescriptor {
            methods,
            external,
            type_text,
        })
    }

    /// Depth-first flattening of one reference into `out`.
    ///
    /// `owner` is the module whose source contains `r`; methods of an
    /// interface literal are declared there.
    fn flatten(
        &self,
        r: &InterfaceRef,
        owner: &ModuleRef,
        stack: &mut Vec<String>,
        out: &mut Vec<Candidate>,
    ) -> MockcResult<()> {
        match r {
            InterfaceRef::Named { module, name } => {
                let qualified = r.to_string();
                if let Some(pos) = stack.iter().position(|s| *s == qualified) {
                    let mut cycle = stack[pos..].to_vec();
                    cycle.push(qualified);
                    return Err(MockcError::MergeCycle {
                        mock: self.mock.to_string(),
                        cycle,
                    });
                }

                let decl = self.index.lookup(module, name).ok_or_else(|| {
                    MockcError::InvalidReference {
                        mock: self.mock.to_string(),
                        reference: qualified.clone(),
                    }
                })?;
                if decl.kind != DeclKind::Interface {
                    return Err(MockcError::NonInterfaceType {
                        mock: self.mock.to_string(),
                        reference: qualified,
                        kind: decl.kind.to_string(),
                    });
                }

                stack.push(qualified.clone());
                for m in &decl.methods {
                    out.push(Candidate {
                        method: m.clone(),
                        declared_in: decl.module.clone(),
                        source: qualified.clone(),
                    });
                }
                for embed in &decl.embeds {
                    self.flatten(embed, &decl.module, stack, out)?;
                }
                stack.pop();
                Ok(())
            }
            InterfaceRef::Literal { literal } => {
                let source = r.to_string();
                for m in &literal.methods {
                    out.push(Candidate {
                        method: m.clone(),
                        declared_in: owner.clone(),
                        source: source.clone(),
                    });
                }
                for embed in &literal.embeds {
                    self.flatten(embed, owner, stack, out)?;
                }
                Ok(())
            }
        }
    }

    /// Accessibility of one method of an external interface.
    fn check_accessible(&self, c: &Candidate, local: &str) -> MockcResult<()> {
        let full_name = format!("{}.{}", c.source, c.method.name);
        let fail = |offending: String| MockcError::NonExportedMethod {
            mock: self.mock.to_string(),
            method: c.method.name.clone(),
            offending,
        };

        if !is_exported(&c.method.name) {
            return Err(fail(full_name));
        }

        let outside = c.declared_in.path != local;
        let types = c
            .method
            .params()
            .iter()
            .map(|p| &p.ty)
            .chain(c.method.results().iter().map(|r| &r.ty));
        for ty in types {
            if let Some(offending) = first_inaccessible(ty, local, outside) {
                return Err(fail(format!("{}: non-exported type {}", full_name, offending)));
            }
        }
        Ok(())
    }
}

/// Find the first part of `ty` that code in `local` cannot name.
///
/// `outside` is true when the type expression was written outside `local`;
/// struct fields and interface-literal methods are then owned by the
/// declaring module and must be exported too.
fn first_inaccessible(ty: &TypeSignature, local: &str, outside: bool) -> Option<String> {
    match ty {
        TypeSignature::Basic { .. } => None,
        TypeSignature::Pointer { elem }
        | TypeSignature::Slice { elem }
        | TypeSignature::Array { elem, .. }
        | TypeSignature::Chan { elem, .. } => first_inaccessible(elem, local, outside),
        TypeSignature::Map { key, value } => first_inaccessible(key, local, outside)
            .or_else(|| first_inaccessible(value, local, outside)),
        TypeSignature::Func(sig) => sig
            .params
            .iter()
            .map(|p| &p.ty)
            .chain(sig.results.iter().map(|r| &r.ty))
            .find_map(|t| first_inaccessible(t, local, outside)),
        TypeSignature::Named { module, name } => match module {
            Some(m) if m.path != local && !is_exported(name) => {
                Some(format!("{}.{}", m.path, name))
            }
            _ => None,
        },
        TypeSignature::Struct { fields } => fields.iter().find_map(|f| {
            if outside && !f.embedded && !is_exported(&f.name) {
                Some(format!("struct field {}", f.name))
            } else {
                first_inaccessible(&f.ty, local, outside)
            }
        }),
        TypeSignature::Interface { methods } => methods.iter().find_map(|m| {
            if outside && !is_exported(&m.name) {
                Some(format!("interface method {}", m.name))
            } else {
                m.params()
                    .iter()
                    .map(|p| &p.ty)
                    .chain(m.results().iter().map(|r| &r.ty))
                    .find_map(|t| first_inaccessible(t, local, outside))
            }
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================
