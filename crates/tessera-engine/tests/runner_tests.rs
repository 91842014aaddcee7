//! End-to-end generation runs against the scripted oracle.

use std::collections::{BTreeSet, HashSet};

use tessera_engine::{
    filename_for_row, run_generation, DefaultFillStrategy, DirectStrategy, GenerationConfig,
    IpoStreamStrategy, RunReport,
};
use tessera_factors::{pairs_in_row, FactorConfig, FactorValue, Pair, Row, RowKey};
use tessera_oracle::MockOracle;

const CONFIG: &str = r#"{
    "step_var": "step",
    "factors": [
        { "name": "a_flag", "var": "a", "ltl": "F(a = TRUE)" },
        { "name": "b_items", "var": "items", "values": [
            { "value": 3, "ltl": "F(items = 3)" },
            { "value": 4, "ltl": "F(items = 4)" },
            { "value": 5, "ltl": "F(items = 5)" }
        ]},
        { "name": "c_done", "var": "c", "ltl": "F(c = TRUE)" }
    ]
}"#;

fn config() -> FactorConfig {
    FactorConfig::from_json(CONFIG).unwrap()
}

/// Witness bindings for every predicate of the sample configuration.
/// The negated boolean tokens contain the positive ones as substrings,
/// so the negated bindings are registered last and win the override.
fn scripted_oracle() -> MockOracle {
    MockOracle::feasible(&[("a", "TRUE"), ("items", "4"), ("c", "TRUE"), ("step", "checkout")])
        .with_binding("F(a = TRUE)", &[("a", "TRUE")])
        .with_binding("!(F(a = TRUE))", &[("a", "FALSE")])
        .with_binding("F(c = TRUE)", &[("c", "TRUE")])
        .with_binding("!(F(c = TRUE))", &[("c", "FALSE")])
        .with_binding("F(items = 3)", &[("items", "3")])
        .with_binding("F(items = 4)", &[("items", "4")])
        .with_binding("F(items = 5)", &[("items", "5")])
}

fn covered_pairs(report: &RunReport, selected_only: bool) -> BTreeSet<Pair> {
    let indices: Vec<usize> = if selected_only {
        report.selected.clone()
    } else {
        (0..report.tests.len()).collect()
    };
    indices
        .iter()
        .flat_map(|&i| pairs_in_row(&report.tests[i].row))
        .collect()
}

fn row_keys(report: &RunReport) -> Vec<RowKey> {
    report.tests.iter().map(|t| RowKey::of(&t.row)).collect()
}

#[test]
fn test_default_fill_all_feasible_terminates_and_minimizes() {
    let cfg = config();
    let mut oracle = scripted_oracle();
    let run = GenerationConfig { seed: 11, output_dir: None };

    let report =
        run_generation(&cfg, &mut oracle, &mut DefaultFillStrategy, &run).unwrap();

    assert!(report.infeasible_pairs.is_empty());
    assert_eq!(report.feasible_pairs.len(), 16);

    // Retained tests never share a row key.
    let keys = row_keys(&report);
    let distinct: HashSet<&RowKey> = keys.iter().collect();
    assert_eq!(distinct.len(), keys.len());

    // The minimized subset still covers every feasible pair.
    assert_eq!(covered_pairs(&report, true), report.feasible_pairs);
    assert!(report.selected.len() <= report.tests.len());
}

#[test]
fn test_direct_strategy_is_deterministic_and_deduplicates() {
    let cfg = config();
    let run = GenerationConfig { seed: 5, output_dir: None };

    let mut oracle1 = scripted_oracle();
    let report1 = run_generation(&cfg, &mut oracle1, &mut DirectStrategy, &run).unwrap();
    let mut oracle2 = scripted_oracle();
    let report2 = run_generation(&cfg, &mut oracle2, &mut DirectStrategy, &run).unwrap();

    // Same seed, same discovery order.
    assert_eq!(row_keys(&report1), row_keys(&report2));
    assert_eq!(report1.selected, report2.selected);

    // Different probed pairs collapse onto the same witness row; the
    // duplicates retire pairs but never produce a second test.
    let keys = row_keys(&report1);
    let distinct: HashSet<&RowKey> = keys.iter().collect();
    assert_eq!(distinct.len(), keys.len());
    assert_eq!(covered_pairs(&report1, false), report1.feasible_pairs);
}

#[test]
fn test_ipo_stream_covers_universe() {
    let cfg = config();
    let mut oracle = scripted_oracle();
    let mut strategy = IpoStreamStrategy::for_factors(&cfg.factors).unwrap();
    let run = GenerationConfig { seed: 3, output_dir: None };

    let report = run_generation(&cfg, &mut oracle, &mut strategy, &run).unwrap();

    assert!(report.infeasible_pairs.is_empty());
    assert_eq!(covered_pairs(&report, true), report.feasible_pairs);
}

#[test]
fn test_diagnosis_localizes_pair_infeasibility() {
    let cfg = config();
    // a=false together with items=3 is impossible; each alone is fine.
    let mut oracle = scripted_oracle().with_conflict(&["!(F(a = TRUE))", "F(items = 3)"]);
    let run = GenerationConfig { seed: 11, output_dir: None };

    let report =
        run_generation(&cfg, &mut oracle, &mut DefaultFillStrategy, &run).unwrap();

    let bad = Pair::new(
        "a_flag",
        FactorValue::Bool(false),
        "b_items",
        FactorValue::Int(3),
    );
    assert_eq!(
        report.infeasible_pairs.iter().collect::<Vec<_>>(),
        vec![&bad]
    );
    assert_eq!(report.feasible_pairs.len(), 15);

    // The neighbours of the infeasible pair are still covered by other
    // rows.
    let covered = covered_pairs(&report, true);
    assert!(covered.contains(&Pair::new(
        "a_flag",
        FactorValue::Bool(false),
        "c_done",
        FactorValue::Bool(false),
    )));
    assert!(covered.contains(&Pair::new(
        "b_items",
        FactorValue::Int(3),
        "c_done",
        FactorValue::Bool(false),
    )));
    assert!(!covered.contains(&bad));
}

#[test]
fn test_higher_order_infeasibility_records_row_key() {
    let cfg = config();
    // The triple {a=false, items=3, c=false} is impossible although every
    // pair inside it is feasible.
    let mut oracle = scripted_oracle().with_conflict(&[
        "!(F(a = TRUE))",
        "F(items = 3)",
        "!(F(c = TRUE))",
    ]);
    let run = GenerationConfig { seed: 11, output_dir: None };

    let report =
        run_generation(&cfg, &mut oracle, &mut DefaultFillStrategy, &run).unwrap();

    // No pair-level infeasibility, full coverage anyway.
    assert!(report.infeasible_pairs.is_empty());
    assert_eq!(covered_pairs(&report, true), report.feasible_pairs);

    // The impossible row is never retained.
    let mut bad_row = Row::new();
    bad_row.insert("a_flag".to_string(), FactorValue::Bool(false));
    bad_row.insert("b_items".to_string(), FactorValue::Int(3));
    bad_row.insert("c_done".to_string(), FactorValue::Bool(false));
    let bad_key = RowKey::of(&bad_row);
    assert!(row_keys(&report).iter().all(|k| *k != bad_key));
}

#[test]
fn test_artifacts_mirror_minimized_suite() {
    let cfg = config();
    let mut oracle = scripted_oracle();
    let dir = tempfile::tempdir().unwrap();
    let run = GenerationConfig {
        seed: 11,
        output_dir: Some(dir.path().to_path_buf()),
    };

    let report =
        run_generation(&cfg, &mut oracle, &mut DefaultFillStrategy, &run).unwrap();

    let expected: HashSet<String> = report
        .selected
        .iter()
        .map(|&i| filename_for_row(&report.tests[i].row))
        .collect();

    let mut step_files = HashSet::new();
    let mut summaries = HashSet::new();
    for entry in std::fs::read_dir(dir.path()).unwrap() {
        let name = entry.unwrap().file_name().to_string_lossy().into_owned();
        if name.starts_with("run_") {
            step_files.insert(name);
        } else {
            summaries.insert(name);
        }
    }
    assert_eq!(step_files, expected);
    assert!(summaries.contains("feasible.txt"));
    assert!(summaries.contains("infeasible.txt"));

    // Every retained test extracted the witness's step sequence.
    let sample = &report.tests[report.selected[0]];
    assert_eq!(sample.steps, vec!["checkout"]);
    let text = std::fs::read_to_string(dir.path().join(filename_for_row(&sample.row))).unwrap();
    assert_eq!(text, "1. checkout\n");
}
