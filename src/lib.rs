//! # brc-solver
//!
//! Per-key min/mean/max over a large `key;value` measurements file.
//!
//! A pool of worker threads competes for byte ranges of the input through a
//! single shared cursor. Each worker reserves a chunk under the cursor's
//! lock, trims it to its last complete line, advances the cursor by exactly
//! that much and parses the bytes into a private table. The coordinator
//! merges the tables and prints them sorted by key:
//!
//! ```text
//! {Abha=-23.0/18.0/59.2, Abidjan=-16.2/26.0/67.3, ...}
//! ```

pub mod config;
pub mod cursor;
pub mod error;
pub mod input;
pub mod parse;
pub mod record;
pub mod solver;
pub mod sync;
pub mod worker;

pub use config::SolverConfig;
pub use error::{Result, SolveError};
pub use record::{Record, RecordTable};
pub use solver::{solve, RunReport, Solver};
