use serde::{Deserialize, Serialize};

/// Pool construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum uploads in flight. Must be at least 1.
    pub max_jobs: usize,
    /// Promote waiting jobs automatically on submit and on every completion.
    /// When off, callers drive activation with `Pool::cycle` or
    /// `Pool::activate_oldest_waiting_job`.
    #[serde(default = "default_auto_cycle")]
    pub auto_cycle: bool,
}

fn default_auto_cycle() -> bool {
    true
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_jobs: 4,
            auto_cycle: true,
        }
    }
}

impl PoolConfig {
    pub fn new(max_jobs: usize) -> Self {
        Self {
            max_jobs,
            ..Self::default()
        }
    }

    /// Same config with automatic cycling turned off.
    pub fn manual(mut self) -> Self {
        self.auto_cycle = false;
        self
    }
}
