use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::calendar::{PlanSummary, RenderedTable, StructuredCalendar};
use super::{PlanError, PlanResult};

pub const SUMMARY_FILE: &str = "plan_summary.json";
pub const CALENDAR_JSON_FILE: &str = "training_calendar.json";
pub const CALENDAR_TABLE_FILE: &str = "training_calendar.md";

/// Paths of one written plan, handed to a publisher afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenPlan {
    pub dir: PathBuf,
    pub summary_path: PathBuf,
    pub calendar_json_path: PathBuf,
    pub calendar_table_path: PathBuf,
    pub summary: PlanSummary,
}

/// Writes the calendar outputs into one plan-specific directory.
#[derive(Debug, Clone)]
pub struct PlanOutputWriter {
    dir: PathBuf,
}

impl PlanOutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, calendar: &StructuredCalendar) -> PlanResult<WrittenPlan> {
        fs::create_dir_all(&self.dir).map_err(|source| PlanError::io(&self.dir, source))?;

        let summary = PlanSummary::from_calendar(calendar);
        let table = RenderedTable::from_calendar(calendar);

        let summary_path = self.dir.join(SUMMARY_FILE);
        write_atomic(&summary_path, serde_json::to_string_pretty(&summary)?.as_bytes())?;
        let calendar_json_path = self.dir.join(CALENDAR_JSON_FILE);
        write_atomic(&calendar_json_path, calendar.to_json()?.as_bytes())?;
        let calendar_table_path = self.dir.join(CALENDAR_TABLE_FILE);
        write_atomic(&calendar_table_path, table.as_str().as_bytes())?;

        info!(
            target: "output",
            dir = %self.dir.display(),
            event_id = %calendar.event_id,
            tier = %calendar.tier,
            "plan outputs written"
        );
        Ok(WrittenPlan {
            dir: self.dir.clone(),
            summary_path,
            calendar_json_path,
            calendar_table_path,
            summary,
        })
    }
}

/// Writes through a temp file in the destination directory and renames it
/// into place. The temp file is removed on every failure path when it drops.
pub fn write_atomic(path: &Path, contents: &[u8]) -> PlanResult<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir).map_err(|source| PlanError::io(dir, source))?;
    file.write_all(contents)
        .and_then(|_| file.as_file().sync_all())
        .map_err(|source| PlanError::io(file.path(), source))?;
    file.persist(path)
        .map_err(|err| PlanError::io(path, err.error))?;
    debug!(target: "output", path = %path.display(), bytes = contents.len(), "file persisted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{CalendarAssembler, PhaseScheduleBuilder, PlanRequest};
    use crate::tables::SchedulerTables;
    use tempfile::TempDir;

    fn sample_calendar() -> StructuredCalendar {
        let tables = SchedulerTables::builtin().unwrap();
        let request = PlanRequest::parse("sbt_grvl", "compete", 12, "2025-06-22").unwrap();
        let schedule = PhaseScheduleBuilder::new(&tables)
            .build_request(&request)
            .unwrap();
        CalendarAssembler.assemble(&schedule).0
    }

    #[test]
    fn writes_three_outputs_without_leftovers() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("sbt_grvl/compete");
        let calendar = sample_calendar();
        let written = PlanOutputWriter::new(&dir).write(&calendar).unwrap();

        assert!(written.summary_path.ends_with(SUMMARY_FILE));
        let json = fs::read_to_string(&written.calendar_json_path).unwrap();
        assert_eq!(StructuredCalendar::from_json(&json).unwrap(), calendar);
        let table = fs::read_to_string(&written.calendar_table_path).unwrap();
        assert_eq!(table, RenderedTable::from_calendar(&calendar).as_str());
        let summary: PlanSummary =
            serde_json::from_str(&fs::read_to_string(&written.summary_path).unwrap()).unwrap();
        assert_eq!(summary, written.summary);

        let entries = fs::read_dir(&dir).unwrap().count();
        assert_eq!(entries, 3);
    }

    #[test]
    fn rewriting_replaces_previous_output() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file.txt");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn unwritable_destination_reports_path() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();
        let err = PlanOutputWriter::new(blocker.join("plan"))
            .write(&sample_calendar())
            .unwrap_err();
        match err {
            PlanError::Io { path, .. } => assert!(path.starts_with(&blocker)),
            other => panic!("unexpected error: {other}"),
        }
    }
}
