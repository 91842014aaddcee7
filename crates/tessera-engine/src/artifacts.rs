//! Deterministic artifact naming and materialization.
//!
//! One step file per retained test, named from its row; run-level
//! summaries listing the classified pairs; a pruning pass so the output
//! directory mirrors exactly the minimized suite.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use tessera_factors::{Pair, Row, RowKey};

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("rows {0} would collide on the same artifact filename")]
    FilenameCollision(String),

    #[error("I/O error writing artifacts: {0}")]
    Io(#[from] std::io::Error),
}

/// `run_A0_B3_C1.txt` style name: per factor in name order, the leading
/// character upper-cased followed by the value's numeric encoding.
pub fn filename_for_row(row: &Row) -> String {
    let mut parts = Vec::new();
    for (name, value) in row {
        let initial = name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('_');
        parts.push(format!("{initial}{}", value.filename_code()));
    }
    format!("run_{}.txt", parts.join("_"))
}

/// Writes step files and run summaries into one output directory, and
/// enforces filename injectivity across the rows of the run.
#[derive(Debug)]
pub struct ArtifactWriter {
    dir: PathBuf,
    names: HashMap<String, RowKey>,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            names: HashMap::new(),
        })
    }

    fn claim(&mut self, row: &Row) -> Result<String, ArtifactError> {
        let name = filename_for_row(row);
        let key = RowKey::of(row);
        match self.names.get(&name) {
            Some(existing) if *existing != key => {
                Err(ArtifactError::FilenameCollision(name))
            }
            _ => {
                self.names.insert(name.clone(), key);
                Ok(name)
            }
        }
    }

    /// Write the numbered step list for one row. Returns the filename
    /// the row was persisted under.
    pub fn write_steps(&mut self, row: &Row, steps: &[String]) -> Result<String, ArtifactError> {
        let name = self.claim(row)?;
        let mut file = std::fs::File::create(self.dir.join(&name))?;
        let mut n = 0;
        for step in steps {
            if step.is_empty() {
                continue;
            }
            n += 1;
            writeln!(file, "{n}. {step}")?;
        }
        Ok(name)
    }

    /// `feasible.txt` and `infeasible.txt`, one pair identifier per line.
    pub fn write_summaries(
        &self,
        feasible: &BTreeSet<Pair>,
        infeasible: &BTreeSet<Pair>,
    ) -> Result<(), ArtifactError> {
        write_pair_list(&self.dir.join("feasible.txt"), feasible)?;
        write_pair_list(&self.dir.join("infeasible.txt"), infeasible)?;
        Ok(())
    }

    /// Delete every `run_*.txt` artifact not in `keep`, so the directory
    /// mirrors exactly the minimized suite. Returns how many files were
    /// removed.
    pub fn prune(&self, keep: &HashSet<String>) -> Result<usize, ArtifactError> {
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with("run_") && name.ends_with(".txt") && !keep.contains(&name) {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn write_pair_list(path: &Path, pairs: &BTreeSet<Pair>) -> Result<(), ArtifactError> {
    let mut file = std::fs::File::create(path)?;
    for pair in pairs {
        writeln!(file, "{pair}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tessera_factors::FactorValue;

    fn row(a: bool, b: i64, c: bool) -> Row {
        let mut row = BTreeMap::new();
        row.insert("a_flag".to_string(), FactorValue::Bool(a));
        row.insert("b_items".to_string(), FactorValue::Int(b));
        row.insert("c_done".to_string(), FactorValue::Bool(c));
        row
    }

    #[test]
    fn test_filename_encoding() {
        assert_eq!(filename_for_row(&row(false, 3, true)), "run_A0_B3_C1.txt");
        assert_eq!(filename_for_row(&row(true, 5, false)), "run_A1_B5_C0.txt");
    }

    #[test]
    fn test_filename_injective_over_distinct_rows() {
        let rows = [row(false, 3, true), row(true, 3, true), row(false, 4, false)];
        let names: HashSet<String> = rows.iter().map(filename_for_row).collect();
        assert_eq!(names.len(), rows.len());
    }

    #[test]
    fn test_collision_detected() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ArtifactWriter::new(dir.path()).unwrap();

        // Two factors whose names share a leading letter and whose
        // values encode identically collide.
        let mut r1 = Row::new();
        r1.insert("alpha".to_string(), FactorValue::Bool(true));
        let mut r2 = Row::new();
        r2.insert("apex".to_string(), FactorValue::Int(1));

        writer.write_steps(&r1, &[]).unwrap();
        let err = writer.write_steps(&r2, &[]).unwrap_err();
        assert!(matches!(err, ArtifactError::FilenameCollision(_)));
    }

    #[test]
    fn test_same_row_may_be_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ArtifactWriter::new(dir.path()).unwrap();
        writer.write_steps(&row(false, 3, true), &["add".into()]).unwrap();
        writer.write_steps(&row(false, 3, true), &["add".into()]).unwrap();
    }

    #[test]
    fn test_step_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ArtifactWriter::new(dir.path()).unwrap();
        let name = writer
            .write_steps(&row(true, 4, true), &["add".into(), "".into(), "checkout".into()])
            .unwrap();
        let text = std::fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(text, "1. add\n2. checkout\n");
    }

    #[test]
    fn test_prune_keeps_only_selected() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ArtifactWriter::new(dir.path()).unwrap();
        let keep_name = writer.write_steps(&row(false, 3, true), &[]).unwrap();
        writer.write_steps(&row(true, 4, false), &[]).unwrap();
        writer
            .write_summaries(&BTreeSet::new(), &BTreeSet::new())
            .unwrap();

        let mut keep = HashSet::new();
        keep.insert(keep_name.clone());
        let removed = writer.prune(&keep).unwrap();
        assert_eq!(removed, 1);

        let mut left: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["feasible.txt", "infeasible.txt", &keep_name]);
    }
}
