//! Practice-session state around the capture pipeline.
//!
//! The match/completion state machine watches detection batches for the
//! active lesson's target sign, the progress store keeps the local durable
//! completion record, and the sync client pushes best-effort updates to the
//! remote progress service.

mod machine;
mod progress;
mod sync;

pub use machine::{Completion, MatchMachine, MatchState, SessionSnapshot};
pub use progress::{LessonProgress, ProgressError, ProgressStore};
pub use sync::{CourseProgress, RemoteLesson, SyncClient, UserProgress, UserStats};
