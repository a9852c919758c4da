//! File move executor for stalesweep.
//!
//! Moves a selection of files from a source tree into a destination
//! directory, either keeping their layout relative to the source root or
//! flattening them into the destination. Each file is copied into a newly
//! created destination file (an existing destination is an error), keeps its
//! permissions and modification time, and is then removed from the source.

mod error;
mod move_op;
mod progress;

pub use error::MoveError;
pub use move_op::{MoveOptions, destination_for, move_files, move_files_with_progress};
pub use progress::{MoveProgress, MoveReport};
