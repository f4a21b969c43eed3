use serde::Serialize;

use crate::derived::percentage;

/// System memory and swap usage, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemorySnapshot {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    pub buffers_bytes: u64,
    pub cached_bytes: u64,
    pub swap_total_bytes: u64,
    pub swap_free_bytes: u64,
    pub swap_used_bytes: u64,
}

impl MemorySnapshot {
    pub fn used_percentage(&self) -> f64 {
        percentage(self.used_bytes, self.total_bytes)
    }

    pub fn available_percentage(&self) -> f64 {
        percentage(self.available_bytes, self.total_bytes)
    }

    pub fn swap_used_percentage(&self) -> f64 {
        percentage(self.swap_used_bytes, self.swap_total_bytes)
    }
}
