//! MemStore - typed memory stores for the RFP drafting agent
//!
//! Three stores, each with a declared value type instead of an open map:
//!
//! - [`ShortTermMemory`] - bounded ring of recent request/reply exchanges
//! - [`LongTermMemory`] - file-backed store of successful drafting patterns
//! - [`WorkingMemory`] - state of the task currently being worked on
//!
//! # Layout
//!
//! ```text
//! <dir>/
//! ├── recent.json              # short-term interaction log
//! ├── patterns/
//! │   ├── {key}.json           # one pattern per file
//! │   └── ...
//! └── stats/
//!     └── pattern_stats.json   # totals and per-key save counts
//! ```

pub mod cli;
pub mod config;
mod long_term;
mod short_term;
mod working;

pub use long_term::{LongTermMemory, PatternRecord, PatternStats};
pub use short_term::{Interaction, ShortTermMemory};
pub use working::{ActiveTask, TaskStatus, WorkingMemory};

/// Default number of interactions kept in short-term memory
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Default maximum age of a short-term entry in seconds (one hour)
pub const DEFAULT_MAX_AGE_SECS: i64 = 3600;

/// Default bound on the long-term in-memory pattern cache
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;
