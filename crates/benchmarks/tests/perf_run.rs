//! End-to-end runs against a temporary corpus using the host shell.

#![cfg(unix)]

use search_bench::{
    run_benchmarks,
    BenchmarkResult,
    Outcome,
    OutputSummary,
    PerfError,
    RunConfig,
    Scenario,
    ScenarioRegistry,
    TerminalStage,
};
use std::env;
use std::fs;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

static CWD_LOCK: Mutex<()> = Mutex::new(());

fn lock_cwd() -> MutexGuard<'static, ()> {
    CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn corpus() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in ["alpha.cpp", "beta.rs", "gamma.txt"] {
        fs::write(dir.path().join(name), "test line\n").unwrap();
    }
    dir
}

fn registry(scenarios: Vec<Scenario>) -> ScenarioRegistry {
    let mut registry = ScenarioRegistry::new();
    for scenario in scenarios {
        registry.push(scenario).unwrap();
    }
    registry
}

fn run(config: RunConfig, registry: &ScenarioRegistry) -> (Vec<BenchmarkResult>, String) {
    let mut out = Vec::new();
    let results = run_benchmarks(config, registry, &mut out).unwrap();
    (results, String::from_utf8(out).unwrap())
}

fn count_all_files() -> Scenario {
    Scenario::new("count all files")
        .variant("ls", "ls -1")
        .variant("find", "find . -type f | sed 's|^\\./||'")
        .variant("glob", "for f in *; do echo \"$f\"; done")
}

#[test]
fn test_one_result_line_per_variant_in_order() {
    let _lock = lock_cwd();
    let dir = corpus();
    let registry = registry(vec![
        count_all_files(),
        Scenario::new("single tool").variant("echo", "echo hi"),
    ]);

    let (results, report) = run(RunConfig::new(dir.path()), &registry);

    assert_eq!(results.len(), 4);
    let tools: Vec<&str> = results.iter().map(|r| r.tool.as_str()).collect();
    assert_eq!(tools, ["ls", "find", "glob", "echo"]);

    let lines: Vec<&str> = report.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines[0], "Scenario: count all files");
    assert_eq!(lines[1], "  Running `ls -1 | wc`");
    assert!(lines[3].starts_with("  Running `find . -type f"));
    assert!(lines[5].starts_with("  Running `for f in *"));
    assert_eq!(lines[7], "Scenario: single tool");
    assert_eq!(lines.len(), 10);

    let result_lines = report
        .lines()
        .filter(|l| l.starts_with("    Elapsed time: "))
        .count();
    assert_eq!(result_lines, 4);

    for result in &results[..3] {
        assert_eq!(result.scenario, "count all files");
        assert!(result.elapsed_secs >= 0.0);
        match &result.summary {
            OutputSummary::Counts { lines, words, .. } => {
                assert_eq!(*lines, 3, "tool {}", result.tool);
                assert_eq!(*words, 3, "tool {}", result.tool);
            }
            other => panic!("expected counts for {}, got {other:?}", result.tool),
        }
    }
}

#[test]
fn test_missing_binary_does_not_abort_run() {
    let _lock = lock_cwd();
    let dir = corpus();
    let registry = registry(vec![
        Scenario::new("broken first")
            .variant("ghost", "search-bench-no-such-tool --files")
            .variant("ls", "ls -1"),
        Scenario::new("still runs").variant("echo", "echo ok"),
    ]);

    let (results, report) = run(RunConfig::new(dir.path()), &registry);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].tool, "ghost");
    assert!(report.contains("Running `search-bench-no-such-tool --files | wc`"));
    assert_eq!(
        results[1].summary,
        OutputSummary::Counts {
            lines: 3,
            words: 3,
            bytes: 28
        }
    );
    assert_eq!(results[2].scenario, "still runs");
    assert!(results[2].outcome.is_success());
}

#[test]
fn test_working_directory_restored_after_failures() {
    let _lock = lock_cwd();
    let dir = corpus();
    let before = env::current_dir().unwrap();
    let registry = registry(vec![Scenario::new("failing")
        .variant("exit", "exit 7")
        .variant("ghost", "search-bench-no-such-tool")]);

    let config = RunConfig::new(dir.path()).with_terminal(TerminalStage::Capture);
    let (results, _) = run(config, &registry);

    assert_eq!(results.len(), 2);
    assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
fn test_missing_corpus_fails_fast() {
    let _lock = lock_cwd();
    let before = env::current_dir().unwrap();
    let dir = corpus();
    let missing = dir.path().join("not-there");

    let mut out = Vec::new();
    let err = run_benchmarks(
        RunConfig::new(&missing),
        &registry(vec![count_all_files()]),
        &mut out,
    )
    .unwrap_err();

    assert!(matches!(err, PerfError::CorpusMissing { ref path } if path == &missing));
    assert!(out.is_empty());
    assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
fn test_capture_mode_writes_sorted_tool_file() {
    let _lock = lock_cwd();
    let dir = corpus();
    let registry = registry(vec![
        Scenario::new("three matches").variant("printer", "printf 'gamma\\nalpha\\nbeta\\n'")
    ]);

    let config = RunConfig::new(dir.path()).with_terminal(TerminalStage::Capture);
    let (results, report) = run(config, &registry);

    assert!(report.contains("Running `printf 'gamma\\nalpha\\nbeta\\n' | sort > printer.txt`"));
    assert!(report.contains("Output: -> printer.txt"));
    assert!(results[0].outcome.is_success());

    let captured = fs::read_to_string(dir.path().join("printer.txt")).unwrap();
    assert_eq!(captured, "alpha\nbeta\ngamma\n");
}

#[test]
fn test_switching_modes_only_changes_terminal_stage() {
    let _lock = lock_cwd();
    let dir = corpus();
    let registry = registry(vec![count_all_files()]);

    let (summarized, summary_report) = run(RunConfig::new(dir.path()), &registry);
    let (captured, capture_report) = run(
        RunConfig::new(dir.path()).with_terminal(TerminalStage::Capture),
        &registry,
    );

    let order = |results: &[BenchmarkResult]| {
        results.iter().map(|r| r.tool.clone()).collect::<Vec<_>>()
    };
    assert_eq!(order(&summarized), order(&captured));

    for (a, b) in summarized.iter().zip(&captured) {
        assert!(a.command.ends_with("| wc"));
        assert!(b.command.ends_with(&format!("| sort > {}.txt", b.tool)));
        assert_eq!(
            a.command.trim_end_matches(" | wc"),
            b.command.split(" | sort > ").next().unwrap()
        );
    }
    assert_eq!(
        summary_report.matches("Elapsed time:").count(),
        capture_report.matches("Elapsed time:").count()
    );
    assert!(dir.path().join("ls.txt").exists());
}

#[test]
fn test_elapsed_covers_artificial_delay() {
    let _lock = lock_cwd();
    let dir = corpus();
    let registry = registry(vec![Scenario::new("slow").variant("sleepy", "sleep 1; echo done")]);

    let (results, report) = run(RunConfig::new(dir.path()), &registry);

    assert!(results[0].elapsed_secs >= 1.0);
    assert!(report.contains("Elapsed time: 0:00:01."));
}

#[test]
fn test_timeout_kills_and_continues() {
    let _lock = lock_cwd();
    let dir = corpus();
    let registry = registry(vec![
        Scenario::new("hung")
            .variant("stuck", "sleep 5")
            .variant("staged", "(sleep 1; touch late_marker) | cat"),
        Scenario::new("after").variant("echo", "echo fine"),
    ]);

    let config = RunConfig::new(dir.path()).with_timeout(Duration::from_millis(300));
    let (results, report) = run(config, &registry);

    assert_eq!(results.len(), 3);
    assert!(matches!(results[0].outcome, Outcome::TimedOut { .. }));
    assert!(matches!(results[1].outcome, Outcome::TimedOut { .. }));
    assert!(results[0].elapsed_secs < 4.0);
    assert_eq!(report.matches("[timed out after 0.3s]").count(), 2);
    assert!(results[2].outcome.is_success());

    thread::sleep(Duration::from_millis(1800));
    assert!(!dir.path().join("late_marker").exists());
}

#[test]
fn test_timed_out_pipeline_does_not_outlive_variant() {
    let _lock = lock_cwd();
    let dir = corpus();
    let registry = registry(vec![
        Scenario::new("hung pipeline")
            .variant("stuck", "(sleep 1; echo late; touch late_marker) | cat"),
        Scenario::new("after").variant("echo", "echo fine"),
    ]);

    let config = RunConfig::new(dir.path())
        .with_terminal(TerminalStage::Capture)
        .with_timeout(Duration::from_millis(200));
    let (results, _) = run(config, &registry);

    assert!(matches!(results[0].outcome, Outcome::TimedOut { .. }));
    assert!(results[1].outcome.is_success());

    thread::sleep(Duration::from_millis(1800));
    assert!(
        !dir.path().join("late_marker").exists(),
        "a stage of the timed-out pipeline kept running"
    );
    let captured = fs::read_to_string(dir.path().join("stuck.txt")).unwrap_or_default();
    assert!(!captured.contains("late"));
}

#[test]
fn test_registry_loaded_from_file_runs_in_file_order() {
    let _lock = lock_cwd();
    let dir = corpus();
    let file = dir.path().join("scenarios.toml");
    fs::write(
        &file,
        r#"
[[scenario]]
name = "second alphabetically"
[[scenario.variant]]
tool = "b"
command = "echo b"

[[scenario]]
name = "first alphabetically"
[[scenario.variant]]
tool = "a"
command = "echo a"
"#,
    )
    .unwrap();

    let registry = ScenarioRegistry::load(&file).unwrap();
    let (results, report) = run(RunConfig::new(dir.path()), &registry);

    assert_eq!(results[0].scenario, "second alphabetically");
    assert_eq!(results[1].scenario, "first alphabetically");
    let second = report.find("Scenario: second alphabetically").unwrap();
    let first = report.find("Scenario: first alphabetically").unwrap();
    assert!(second < first);
}
