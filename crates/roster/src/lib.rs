//! Character persistence.
//!
//! Repositories store one flattened row per character (see
//! [`character_core::record`]) and hand back fully restored characters:
//! - [`FileRoster`]: JSON-lines file with atomic rewrites
//! - [`InMemoryRoster`]: the same rows kept in memory
//!
//! [`level_up_all`] applies one level-up to many stored characters in turn.

mod batch;
mod error;
mod file;
mod memory;
mod rows;
mod traits;

pub use batch::{BatchOutcome, level_up_all};
pub use error::{BatchError, RepositoryError, Result};
pub use file::FileRoster;
pub use memory::InMemoryRoster;
pub use traits::CharacterRepository;
