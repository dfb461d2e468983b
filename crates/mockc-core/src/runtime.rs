//! Executable model of a generated mock's call semantics.
//!
//! The emitted Go code cannot run inside this crate, so [`MockInstance`]
//! reproduces what it does, driven by the same [`MockDescriptor`]. Values are
//! JSON values; `null` plays the zero value.
//!
//! # Call semantics
//!
//! Each method owns one `Mutex`, held for the whole call:
//!
//! 1. `Called = true`, `CallCount += 1`
//! 2. parameters are copied into the last-call snapshot
//! 3. if a hook is set, its return values replace the result snapshot;
//!    otherwise the preset results are left as they are
//! 4. when the method has any parameter or result, one history entry is
//!    appended with the parameter and result snapshots
//! 5. the result snapshot is returned
//!
//! A failing hook ends the call after step 2: no history entry is appended
//! and the failure is returned once the lock is released. A hook that panics
//! poisons the lock; later calls recover the state and carry on.
//!
//! Calls to different methods never contend. Calls to one method serialize.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::{MockcError, MockcResult};
use crate::synth::{MethodLayout, MockDescriptor};

// ============================================================================
// Errors
// ============================================================================

/// Failure raised by an override hook or a delegated implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HookFailure {
    pub message: String,
}

impl HookFailure {
    pub fn new(message: impl Into<String>) -> Self {
        HookFailure {
            message: message.into(),
        }
    }
}

/// Errors from calling into a [`MockInstance`].
#[derive(Debug, Error)]
pub enum CallError {
    #[error("mock {mock:?} has no method {method:?}")]
    UnknownMethod { mock: String, method: String },

    #[error("method {method:?} takes {expected} {what}, got {actual}")]
    Arity {
        method: String,
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("method {method:?} hook failed: {source}")]
    Hook {
        method: String,
        #[source]
        source: HookFailure,
    },
}

// ============================================================================
// Hooks and Implementations
// ============================================================================

/// An override hook: receives the call's parameters, returns its results.
pub type Hook = Arc<dyn Fn(&[Value]) -> Result<Vec<Value>, HookFailure> + Send + Sync>;

/// A real implementation a constructed mock can delegate to.
pub trait Implementation: Send + Sync {
    /// Whether the implementation provides `method`.
    fn has_method(&self, method: &str) -> bool;

    /// Invoke `method` with `args`.
    fn invoke(&self, method: &str, args: &[Value]) -> Result<Vec<Value>, HookFailure>;
}

// ============================================================================
// State
// ============================================================================

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    pub params: Vec<Value>,
    pub results: Vec<Value>,
}

/// A copy of one method's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodSnapshot {
    pub called: bool,
    pub call_count: usize,
    pub params: Vec<Value>,
    pub results: Vec<Value>,
    pub history: Vec<CallRecord>,
    pub has_hook: bool,
}

struct MethodState {
    called: bool,
    call_count: usize,
    params: Vec<Value>,
    results: Vec<Value>,
    history: Vec<CallRecord>,
    hook: Option<Hook>,
}

struct MethodCell {
    param_count: usize,
    result_count: usize,
    has_history: bool,
    state: Mutex<MethodState>,
}

impl MethodCell {
    fn new(layout: &MethodLayout) -> Self {
        MethodCell {
            param_count: layout.params.len(),
            result_count: layout.results.len(),
            has_history: layout.has_history,
            state: Mutex::new(MethodState {
                called: false,
                call_count: 0,
                params: vec![Value::Null; layout.params.len()],
                results: vec![Value::Null; layout.results.len()],
                history: Vec::new(),
                hook: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MethodState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Mock Instance
// ============================================================================

/// A live mock built from a [`MockDescriptor`].
pub struct MockInstance {
    name: String,
    methods: BTreeMap<String, MethodCell>,
}

impl std::fmt::Debug for MockInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockInstance")
            .field("name", &self.name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MockInstance {
    /// A mock with all-default state, as from a struct literal.
    pub fn new(descriptor: &MockDescriptor) -> Self {
        MockInstance {
            name: descriptor.name.clone(),
            methods: descriptor
                .fields
                .iter()
                .map(|l| (l.method.clone(), MethodCell::new(l)))
                .collect(),
        }
    }

    /// Construct through the generated constructor.
    ///
    /// No argument yields a default mock; one argument becomes the hook of
    /// every method. Anything else is `ConstructionArityError`, as is calling
    /// a constructor that was never requested.
    pub fn construct(
        descriptor: &MockDescriptor,
        mut args: Vec<Arc<dyn Implementation>>,
    ) -> MockcResult<Self> {
        let arity_error = |reason: String| MockcError::ConstructionArityError {
            mock: descriptor.name.clone(),
            reason,
        };

        if descriptor.constructor.is_none() {
            return Err(arity_error("no constructor was requested".to_string()));
        }

        let delegate = match args.len() {
            0 => None,
            1 => args.pop(),
            n => {
                return Err(arity_error(format!(
                    "constructor takes at most one implementation, got {}",
                    n
                )))
            }
        };

        let mock = MockInstance::new(descriptor);
        if let Some(delegate) = delegate {
            if let Some(missing) = mock.methods.keys().find(|m| !delegate.has_method(m)) {
                return Err(arity_error(format!(
                    "implementation is missing method {:?}",
                    missing
                )));
            }
            for (method, cell) in &mock.methods {
                let delegate = Arc::clone(&delegate);
                let method_name = method.clone();
                let hook: Hook =
                    Arc::new(move |args: &[Value]| delegate.invoke(&method_name, args));
                cell.lock().hook = Some(hook);
            }
        }
        Ok(mock)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Invoke `method` with `args`.
    pub fn call(&self, method: &str, args: Vec<Value>) -> Result<Vec<Value>, CallError> {
        let cell = self.cell(method)?;
        if args.len() != cell.param_count {
            return Err(CallError::Arity {
                method: method.to_string(),
                what: "parameters",
                expected: cell.param_count,
                actual: args.len(),
            });
        }

        let mut state = cell.lock();
        state.called = true;
        state.call_count += 1;
        state.params = args;

        if let Some(hook) = state.hook.clone() {
            let results = hook(&state.params).map_err(|source| CallError::Hook {
                method: method.to_string(),
                source,
            })?;
            if results.len() != cell.result_count {
                return Err(CallError::Arity {
                    method: method.to_string(),
                    what: "results",
                    expected: cell.result_count,
                    actual: results.len(),
                });
            }
            state.results = results;
        }

        if cell.has_history {
            let record = CallRecord {
                params: state.params.clone(),
                results: state.results.clone(),
            };
            state.history.push(record);
        }

        Ok(state.results.clone())
    }

    /// Preset the results returned while no hook is set.
    pub fn set_results(&self, method: &str, results: Vec<Value>) -> Result<(), CallError> {
        let cell = self.cell(method)?;
        if results.len() != cell.result_count {
            return Err(CallError::Arity {
                method: method.to_string(),
                what: "results",
                expected: cell.result_count,
                actual: results.len(),
            });
        }
        cell.lock().results = results;
        Ok(())
    }

    /// Install an override hook.
    pub fn set_hook<F>(&self, method: &str, hook: F) -> Result<(), CallError>
    where
        F: Fn(&[Value]) -> Result<Vec<Value>, HookFailure> + Send + Sync + 'static,
    {
        self.cell(method)?.lock().hook = Some(Arc::new(hook));
        Ok(())
    }

    /// Remove the override hook, including one installed by the constructor.
    pub fn clear_hook(&self, method: &str) -> Result<(), CallError> {
        self.cell(method)?.lock().hook = None;
        Ok(())
    }

    /// Copy out one method's state.
    pub fn snapshot(&self, method: &str) -> Result<MethodSnapshot, CallError> {
        let state = self.cell(method)?.lock();
        Ok(MethodSnapshot {
            called: state.called,
            call_count: state.call_count,
            params: state.params.clone(),
            results: state.results.clone(),
            history: state.history.clone(),
            has_hook: state.hook.is_some(),
        })
    }

    fn cell(&self, method: &str) -> Result<&MethodCell, CallError> {
        self.methods.get(method).ok_or_else(|| CallError::UnknownMethod {
            mock: self.name.clone(),
            method: method.to_string(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
