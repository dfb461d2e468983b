//! Flag-mode configuration.
//!
//! In flag mode one mock is described entirely on the command line instead
//! of by a generator in an index file:
//!
//! ```bash
//! mockc --name MockcCache --destination cache/mock_gen.go \
//!       --index cache/mockc.json example.com/cache.Cache
//! ```
//!
//! The flags become the same [`Directive`]s a generator would produce, so
//! validation and defaults are shared with generator mode. The destination
//! is relative to the current directory; the package comes from the index.

use std::path::{Path, PathBuf};

use mockc_core::directive::{
    Directive, GenerationDescriptor, DEFAULT_FIELD_NAME_PREFIX, DEFAULT_FIELD_NAME_SUFFIX,
};
use mockc_core::error::{MockcError, MockcResult};
use mockc_core::index::{InterfaceRef, ModuleIndex};
use mockc_core::output::UnitReport;
use mockc_core::unit::OutputUnit;

use crate::driver::{generate_unit, GenerateOptions, GENERATOR_COMMAND};

/// A fully specified flag-mode request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagConfig {
    pub name: String,
    pub destination: String,
    pub field_name_prefix: String,
    pub field_name_suffix: String,
    pub constructor: Option<String>,
    pub index: PathBuf,
    /// `{module-path}.{InterfaceName}` patterns.
    pub interfaces: Vec<String>,
}

impl FlagConfig {
    /// Check the flags that clap cannot express.
    ///
    /// `name` and `destination` come in as options because either one
    /// switches the binary into flag mode; both are required once it has.
    pub fn from_parts(
        name: Option<String>,
        destination: Option<String>,
        field_name_prefix: Option<String>,
        field_name_suffix: Option<String>,
        constructor: Option<String>,
        index: Option<PathBuf>,
        interfaces: Vec<String>,
    ) -> MockcResult<Self> {
        let name = name.ok_or_else(|| {
            MockcError::invalid_args("--name is required in command line flags mode")
        })?;
        let destination = destination.ok_or_else(|| {
            MockcError::invalid_args("--destination is required in command line flags mode")
        })?;
        let index = index.ok_or_else(|| {
            MockcError::invalid_args("--index is required in command line flags mode")
        })?;
        if interfaces.is_empty() {
            return Err(MockcError::invalid_args(
                "at least one interface pattern is required in command line flags mode",
            ));
        }
        Ok(FlagConfig {
            name,
            destination,
            field_name_prefix: field_name_prefix
                .unwrap_or_else(|| DEFAULT_FIELD_NAME_PREFIX.to_string()),
            field_name_suffix: field_name_suffix
                .unwrap_or_else(|| DEFAULT_FIELD_NAME_SUFFIX.to_string()),
            constructor,
            index,
            interfaces,
        })
    }

    /// The directives equivalent to these flags, in generator order.
    pub fn directives(&self) -> MockcResult<Vec<Directive>> {
        let refs = self
            .interfaces
            .iter()
            .map(|p| InterfaceRef::parse_pattern(&self.name, p))
            .collect::<MockcResult<Vec<_>>>()?;

        let mut directives = vec![
            Directive::Implement(refs),
            Directive::SetFieldNamePrefix(self.field_name_prefix.clone()),
            Directive::SetFieldNameSuffix(self.field_name_suffix.clone()),
            Directive::SetDestination(self.destination.clone()),
        ];
        if let Some(constructor) = &self.constructor {
            directives.push(Directive::SetConstructorName(constructor.clone()));
        }
        Ok(directives)
    }

    pub fn descriptor(&self) -> MockcResult<GenerationDescriptor> {
        GenerationDescriptor::from_directives(&self.name, self.directives()?)
    }

    /// Command that reproduces this run, for the `//go:generate` line.
    pub fn regenerate_command(&self) -> String {
        let mut parts = vec![
            GENERATOR_COMMAND.to_string(),
            flag_word("name", &self.name),
            flag_word("destination", &self.destination),
            flag_word("field-name-prefix", &self.field_name_prefix),
            flag_word("field-name-suffix", &self.field_name_suffix),
        ];
        if let Some(constructor) = &self.constructor {
            parts.push(flag_word("constructor", constructor));
        }
        parts.push(flag_word("index", &self.index.display().to_string()));
        parts.extend(self.interfaces.iter().map(|p| generate_word(p.as_str())));
        parts.join(" ")
    }
}

/// `--flag=value` as one `go generate` word.
fn flag_word(flag: &str, value: &str) -> String {
    let word = format!("--{}={}", flag, value);
    if value.is_empty() {
        go_quote(&word)
    } else {
        generate_word(&word)
    }
}

/// Quote `word` if `go generate` would otherwise split or mangle it.
///
/// `go generate` splits on spaces and unquotes only words that start
/// with a double quote, so the whole word is quoted.
fn generate_word(word: &str) -> String {
    let plain = !word.is_empty()
        && !word
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\'' || c == '\\');
    if plain {
        word.to_string()
    } else {
        go_quote(word)
    }
}

/// A Go interpreted string literal.
fn go_quote(word: &str) -> String {
    let mut out = String::with_capacity(word.len() + 2);
    out.push('"');
    for c in word.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Generate the single mock described by `config`.
pub fn run_flag_mode(config: &FlagConfig, options: &GenerateOptions) -> MockcResult<UnitReport> {
    let index = ModuleIndex::load(&config.index)?;
    let desc = config.descriptor()?;

    let mut unit = OutputUnit::new(desc.destination.clone());
    unit.mocks.push(desc);

    let options = GenerateOptions {
        mode: options.mode,
        regenerate: config.regenerate_command(),
    };
    generate_unit(&index, Path::new("."), &unit, &options)
}

// ============================================================================
// Tests
// ============================================================================
