//! Local durable record of lesson completion.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error type for progress persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("failed to access progress file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode progress: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One (section, lesson) completion record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub section: String,
    pub lesson: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub success_count: u32,
}

/// JSON-file-backed store of [`LessonProgress`], keyed by (section, lesson).
///
/// The file is read and written wholesale, never incrementally. This store
/// is the sole writer of progress records; remote sync is a separate,
/// best-effort step that never feeds back into local state.
pub struct ProgressStore {
    path: PathBuf,
    records: Vec<LessonProgress>,
}

impl ProgressStore {
    /// Open the store at `path`. A missing file loads as empty; a corrupt
    /// file is logged and also loads as empty rather than failing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ProgressError> {
        let path = path.into();
        let records = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(records) => records,
                Err(err) => {
                    tracing::warn!(%err, path = %path.display(), "corrupt progress file, starting empty");
                    Vec::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, records })
    }

    /// Record a successful practice attempt.
    ///
    /// The completed flag only ever becomes true, but every call counts as
    /// a fresh attempt: `success_count` always increments and
    /// `completed_at` always refreshes, including on already-completed
    /// lessons (re-practice tracking).
    pub fn mark_complete(
        &mut self,
        section: &str,
        lesson: &str,
    ) -> Result<&LessonProgress, ProgressError> {
        let now = Utc::now();
        let idx = match self.position(section, lesson) {
            Some(idx) => {
                let record = &mut self.records[idx];
                record.completed = true;
                record.completed_at = Some(now);
                record.success_count += 1;
                idx
            }
            None => {
                self.records.push(LessonProgress {
                    section: section.to_owned(),
                    lesson: lesson.to_owned(),
                    completed: true,
                    completed_at: Some(now),
                    success_count: 1,
                });
                self.records.len() - 1
            }
        };
        self.persist()?;
        Ok(&self.records[idx])
    }

    /// Whether the lesson has been completed. Unknown keys are false.
    pub fn is_completed(&self, section: &str, lesson: &str) -> bool {
        self.lesson(section, lesson).is_some_and(|p| p.completed)
    }

    /// Look up one record.
    pub fn lesson(&self, section: &str, lesson: &str) -> Option<&LessonProgress> {
        self.position(section, lesson).map(|idx| &self.records[idx])
    }

    /// Snapshot of every record. Insertion order is not meaningful.
    pub fn all_progress(&self) -> &[LessonProgress] {
        &self.records
    }

    /// Completed lessons in `section` over `total_lessons`, rounded to the
    /// nearest whole percent. The caller supplies the catalog size.
    pub fn section_completion_percent(&self, section: &str, total_lessons: u32) -> u8 {
        if total_lessons == 0 {
            return 0;
        }
        let completed = self
            .records
            .iter()
            .filter(|p| p.section == section && p.completed)
            .count();
        (completed as f64 / total_lessons as f64 * 100.0).round() as u8
    }

    /// Drop every record and delete the backing file.
    pub fn reset_all(&mut self) -> Result<(), ProgressError> {
        self.records.clear();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn position(&self, section: &str, lesson: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|p| p.section == section && p.lesson == lesson)
    }

    fn persist(&self) -> Result<(), ProgressError> {
        fs::write(&self.path, serde_json::to_vec_pretty(&self.records)?)?;
        Ok(())
    }
}
