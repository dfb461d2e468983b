//! End-to-end generation tests.
//!
//! Each test writes a `mockc.json` into a temp directory, runs the driver
//! (or the binary), and inspects the generated Go files and the JSON report.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

use mockc::driver::{generate_patterns, GenerateOptions, OutputMode};
use mockc_core::output::UnitStatus;

// ============================================================================
// Test Infrastructure
// ============================================================================

const CACHE_INDEX: &str = r#"{
  "module": {"path": "example.com/cache", "name": "cache"},
  "declarations": [
    {"module": {"path": "example.com/cache", "name": "cache"},
     "name": "Cache", "kind": "interface",
     "methods": [
       {"name": "Get",
        "params": [{"name": "key", "type": {"kind": "basic", "name": "string"}}],
        "results": [{"type": {"kind": "interface", "methods": []}},
                    {"type": {"kind": "named", "name": "error"}}]},
       {"name": "Set",
        "params": [{"name": "key", "type": {"kind": "basic", "name": "string"}},
                   {"name": "val", "type": {"kind": "interface", "methods": []}}],
        "results": [{"type": {"kind": "named", "name": "error"}}]}
     ]},
    {"module": {"path": "context", "name": "context"},
     "name": "Context", "kind": "interface",
     "methods": [{"name": "Done",
                  "results": [{"type": {"kind": "chan", "dir": "recv",
                                        "elem": {"kind": "struct", "fields": []}}}]}]},
    {"module": {"path": "example.com/store", "name": "store"},
     "name": "Store", "kind": "interface",
     "methods": [{"name": "flush"}]},
    {"module": {"path": "example.com/cache", "name": "cache"},
     "name": "MapCache", "kind": "struct"}
  ],
  "generators": [
    {"name": "MockcCache", "calls": [
      {"directive": "Implement", "args": [{"module": "example.com/cache", "name": "Cache"}]},
      {"directive": "WithConstructor"}
    ]},
    {"name": "MockContext", "calls": [
      {"directive": "Implement", "args": [{"module": "context", "name": "Context"}]},
      {"directive": "SetDestination", "args": ["context_mock_gen.go"]},
      {"directive": "SetFieldNameSuffix", "args": ["Field"]}
    ]}
  ]
}"#;

fn write_index(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("mockc.json");
    fs::write(&path, text).unwrap();
    path
}

fn with_generators(generators: Value) -> String {
    let mut index: Value = serde_json::from_str(CACHE_INDEX).unwrap();
    index["generators"] = generators;
    index.to_string()
}

fn options(mode: OutputMode) -> GenerateOptions {
    GenerateOptions {
        mode,
        ..GenerateOptions::default()
    }
}

// ============================================================================
// Driver
// ============================================================================

#[test]
fn generates_one_file_per_destination() {
    let dir = TempDir::new().unwrap();
    write_index(dir.path(), CACHE_INDEX);

    let reports =
        generate_patterns(&[dir.path().to_path_buf()], &options(OutputMode::Write)).unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.status == UnitStatus::Written));

    let cache = fs::read_to_string(dir.path().join("mockc_gen.go")).unwrap();
    assert!(cache.starts_with("// Code generated by mockc. DO NOT EDIT.\n"));
    assert!(cache.contains("//go:generate mockc\n"));
    assert!(cache.contains("//go:build !mockc\n"));
    assert!(cache.contains("package cache\n"));
    assert!(cache.contains("var _ Cache = &MockcCache{}"));
    assert!(cache.contains("func NewMockcCache(v ...Cache) *MockcCache {"));
    assert!(cache.contains("func (recv *MockcCache) Set(p0 string, p1 interface{}) error {"));

    let ctx = fs::read_to_string(dir.path().join("context_mock_gen.go")).unwrap();
    assert!(ctx.contains("import (\n\t\"sync\"\n\t\"context\"\n)\n"));
    assert!(ctx.contains("var _ context.Context = &MockContext{}"));
    assert!(ctx.contains("DoneField struct {"));
    assert!(ctx.contains("func (recv *MockContext) Done() <-chan struct{} {"));
}

#[test]
fn second_run_is_unchanged_and_check_passes() {
    let dir = TempDir::new().unwrap();
    write_index(dir.path(), CACHE_INDEX);
    let patterns = [dir.path().to_path_buf()];

    generate_patterns(&patterns, &options(OutputMode::Write)).unwrap();
    let again = generate_patterns(&patterns, &options(OutputMode::Write)).unwrap();
    assert!(again.iter().all(|r| r.status == UnitStatus::Unchanged));

    let check = generate_patterns(&patterns, &options(OutputMode::Check)).unwrap();
    assert!(check.iter().all(|r| r.status == UnitStatus::UpToDate));
}

#[test]
fn check_reports_stale_output() {
    let dir = TempDir::new().unwrap();
    write_index(dir.path(), CACHE_INDEX);
    let patterns = [dir.path().to_path_buf()];

    generate_patterns(&patterns, &options(OutputMode::Write)).unwrap();
    fs::write(dir.path().join("mockc_gen.go"), "package cache\n").unwrap();

    let check = generate_patterns(&patterns, &options(OutputMode::Check)).unwrap();
    let stale: Vec<_> = check.iter().filter(|r| r.status == UnitStatus::Stale).collect();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].error.as_ref().unwrap().code, 5);
    assert_eq!(fs::read_to_string(dir.path().join("mockc_gen.go")).unwrap(), "package cache\n");
}

#[test]
fn dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write_index(dir.path(), CACHE_INDEX);

    let reports =
        generate_patterns(&[dir.path().to_path_buf()], &options(OutputMode::DryRun)).unwrap();
    assert!(reports.iter().all(|r| r.status == UnitStatus::Rendered));
    assert!(reports[0].content.as_ref().unwrap().contains("type MockcCache struct {"));
    assert!(!dir.path().join("mockc_gen.go").exists());
}

#[test]
fn failing_unit_does_not_block_independent_unit() {
    let dir = TempDir::new().unwrap();
    let index = with_generators(serde_json::json!([
        {"name": "MockStore", "calls": [
            {"directive": "Implement", "args": [{"module": "example.com/store", "name": "Store"}]},
            {"directive": "SetDestination", "args": ["store_gen.go"]}
        ]},
        {"name": "MockcCache", "calls": [
            {"directive": "Implement", "args": [{"module": "example.com/cache", "name": "Cache"}]}
        ]}
    ]));
    write_index(dir.path(), &index);

    let reports =
        generate_patterns(&[dir.path().to_path_buf()], &options(OutputMode::Write)).unwrap();
    assert_eq!(reports[0].status, UnitStatus::Failed);
    let error = reports[0].error.as_ref().unwrap();
    assert_eq!(error.code, 4);
    assert_eq!(error.mock.as_deref(), Some("MockStore"));
    assert_eq!(error.method.as_deref(), Some("flush"));
    assert!(!dir.path().join("store_gen.go").exists());

    assert_eq!(reports[1].status, UnitStatus::Written);
    assert!(dir.path().join("mockc_gen.go").exists());
}

#[test]
fn failing_mock_aborts_its_whole_unit() {
    let dir = TempDir::new().unwrap();
    let index = with_generators(serde_json::json!([
        {"name": "MockcCache", "calls": [
            {"directive": "Implement", "args": [{"module": "example.com/cache", "name": "Cache"}]}
        ]},
        {"name": "MockMap", "calls": [
            {"directive": "Implement", "args": [{"module": "example.com/cache", "name": "MapCache"}]}
        ]}
    ]));
    write_index(dir.path(), &index);

    let reports =
        generate_patterns(&[dir.path().to_path_buf()], &options(OutputMode::Write)).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].status, UnitStatus::Failed);
    assert_eq!(reports[0].mocks, vec!["MockcCache", "MockMap"]);
    assert_eq!(reports[0].error.as_ref().unwrap().code, 3);
    assert!(!dir.path().join("mockc_gen.go").exists());
}

#[test]
fn spellings_of_one_destination_write_one_file() {
    let dir = TempDir::new().unwrap();
    let index = with_generators(serde_json::json!([
        {"name": "MockcCache", "calls": [
            {"directive": "Implement", "args": [{"module": "example.com/cache", "name": "Cache"}]}
        ]},
        {"name": "OtherCache", "calls": [
            {"directive": "Implement", "args": [{"module": "example.com/cache", "name": "Cache"}]},
            {"directive": "SetDestination", "args": ["./mockc_gen.go"]}
        ]}
    ]));
    write_index(dir.path(), &index);

    let reports =
        generate_patterns(&[dir.path().to_path_buf()], &options(OutputMode::Write)).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].mocks, vec!["MockcCache", "OtherCache"]);

    let src = fs::read_to_string(dir.path().join("mockc_gen.go")).unwrap();
    assert!(src.contains("type MockcCache struct {"));
    assert!(src.contains("type OtherCache struct {"));
}

#[test]
fn invalid_destination_fails_planning() {
    let dir = TempDir::new().unwrap();
    let index = with_generators(serde_json::json!([
        {"name": "MockcCache", "calls": [
            {"directive": "Implement", "args": [{"module": "example.com/cache", "name": "Cache"}]},
            {"directive": "SetDestination", "args": ["mock.txt"]}
        ]}
    ]));
    let path = write_index(dir.path(), &index);

    let reports = generate_patterns(&[path.clone()], &options(OutputMode::Write)).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].destination, path.display().to_string());
    assert_eq!(reports[0].error.as_ref().unwrap().code, 2);
}

// ============================================================================
// Binary
// ============================================================================

fn mockc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_mockc"))
}

#[test]
fn binary_prints_json_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    write_index(dir.path(), CACHE_INDEX);

    let output = mockc().arg(dir.path()).output().unwrap();
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["units"].as_array().unwrap().len(), 2);
    assert_eq!(json["units"][0]["mocks"][0], "MockcCache");
}

#[test]
fn binary_exit_code_follows_first_error() {
    let dir = TempDir::new().unwrap();
    write_index(dir.path(), CACHE_INDEX);

    let output = mockc().arg("--check").arg(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(5));
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["units"][0]["status"], "stale");
}

#[test]
fn binary_flag_mode() {
    let dir = TempDir::new().unwrap();
    let index = write_index(dir.path(), CACHE_INDEX);

    let output = mockc()
        .current_dir(dir.path())
        .args(["--name", "FlagCache", "--destination", "flag_gen.go"])
        .args(["--constructor", "NewFlagCache"])
        .arg("--index")
        .arg(&index)
        .arg("example.com/cache.Cache")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));

    let src = fs::read_to_string(dir.path().join("flag_gen.go")).unwrap();
    assert!(src.contains("//go:generate mockc --name=FlagCache --destination=flag_gen.go"));
    assert!(src.contains("func NewFlagCache(v ...Cache) *FlagCache {"));
}

#[test]
fn binary_flag_mode_requires_index() {
    let output = mockc()
        .args(["--name", "M", "--destination", "m_gen.go", "example.com/cache.Cache"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "error");
    assert!(json["error"]["message"].as_str().unwrap().contains("--index"));
}
