//! Configuration for a solver run
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, SolveError};

/// Bytes in a kibibyte
pub const KIB: usize = 1024;

/// Default chunk size each worker reserves per read
pub const DEFAULT_CHUNK_SIZE: usize = 64 * KIB;

/// Configuration for one run over one input file
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Measurements file, one `key;value` record per line
    pub input_path: PathBuf,

    /// Number of worker threads competing for chunks
    pub worker_count: usize,

    /// Upper bound, in bytes, of a single reservation. Must be large enough
    /// to hold the longest record including its line terminator.
    pub chunk_size: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("measurements.txt"),
            worker_count: num_cpus::get(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl SolverConfig {
    /// Create a new config builder
    pub fn builder() -> SolverConfigBuilder {
        SolverConfigBuilder::default()
    }

    /// Reject values no run could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(SolveError::Config("worker_count must be positive".into()));
        }
        if self.chunk_size == 0 {
            return Err(SolveError::Config("chunk_size must be positive".into()));
        }
        Ok(())
    }
}

/// Builder for SolverConfig
#[derive(Default)]
pub struct SolverConfigBuilder {
    config: SolverConfig,
}

impl SolverConfigBuilder {
    /// Set the measurements file
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.input_path = path.into();
        self
    }

    /// Set the number of workers
    pub fn worker_count(mut self, count: usize) -> Self {
        self.config.worker_count = count;
        self
    }

    /// Set the chunk size (in bytes)
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn build(self) -> SolverConfig {
        self.config
    }
}
