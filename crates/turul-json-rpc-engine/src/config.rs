use serde::{Deserialize, Serialize};

use crate::buffer::DEFAULT_BUFFER_CAPACITY;

/// Tuning knobs for a [`Server`](crate::Server).
///
/// Every field has a default, so a partial config (e.g. from a TOML or JSON
/// file) only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Initial limit on parameters per signature
    pub param_capacity: usize,
    /// Hard limit on parameters per signature; the initial limit doubles up to this
    pub max_param_capacity: usize,
    /// Initial capacity of each pooled output buffer, in bytes
    pub buffer_capacity: usize,
    /// Idle output buffers kept between requests
    pub buffer_pool_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            param_capacity: 16,
            max_param_capacity: 1024,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            buffer_pool_size: 3,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param_capacity(mut self, initial: usize, max: usize) -> Self {
        self.param_capacity = initial;
        self.max_param_capacity = max;
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn with_buffer_pool_size(mut self, size: usize) -> Self {
        self.buffer_pool_size = size;
        self
    }
}
