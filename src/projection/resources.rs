//! Resource normalization
//!
//! Upstream quantities are fractional and use negative values to mean
//! "unbounded". Views carry plain non-negative integers: CPU in millicores,
//! memory in bytes, GPU in whole devices.

use serde::{Deserialize, Serialize};

use crate::snapshot::ResourceQuantity;

/// Normalized resource amounts. All fields are >= 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStats {
    #[serde(rename = "milliCPU")]
    pub milli_cpu: i64,

    /// Bytes
    pub memory: i64,

    pub gpu: i64,
}

impl ResourceStats {
    pub fn new(milli_cpu: i64, memory: i64, gpu: i64) -> Self {
        Self {
            milli_cpu,
            memory,
            gpu,
        }
    }

    /// Add another record field by field
    pub fn accumulate(&mut self, other: &ResourceStats) {
        self.milli_cpu = self.milli_cpu.saturating_add(other.milli_cpu);
        self.memory = self.memory.saturating_add(other.memory);
        self.gpu = self.gpu.saturating_add(other.gpu);
    }

    pub fn is_zero(&self) -> bool {
        *self == ResourceStats::default()
    }
}

/// Map a negative ("unbounded") value to zero
pub fn clamp_unbounded(value: f64) -> f64 {
    if value < 0.0 || value.is_nan() {
        0.0
    } else {
        value
    }
}

/// Convert a raw quantity into stats.
///
/// Values are clamped before CPU is scaled to millicores, so an unbounded
/// limit reads as 0 here; check the source record before treating 0 as a
/// real zero quota.
pub fn to_stats(quantity: &ResourceQuantity) -> ResourceStats {
    ResourceStats {
        milli_cpu: (clamp_unbounded(quantity.cpu) * 1000.0) as i64,
        memory: clamp_unbounded(quantity.memory) as i64,
        gpu: clamp_unbounded(quantity.gpu) as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_scaled_to_millicores() {
        let stats = to_stats(&ResourceQuantity::new(2.5, 1024.0, 1.0));
        assert_eq!(stats, ResourceStats::new(2500, 1024, 1));
    }

    #[test]
    fn test_negative_values_clamped() {
        let stats = to_stats(&ResourceQuantity::new(-1.0, -1.0, -1.0));
        assert_eq!(stats, ResourceStats::default());
        assert!(stats.is_zero());
    }

    #[test]
    fn test_fractional_gpu_truncated() {
        let stats = to_stats(&ResourceQuantity::new(0.0, 0.0, 0.5));
        assert_eq!(stats.gpu, 0);
    }

    #[test]
    fn test_clamp_nan() {
        assert_eq!(clamp_unbounded(f64::NAN), 0.0);
        assert_eq!(clamp_unbounded(3.0), 3.0);
    }

    #[test]
    fn test_accumulate() {
        let mut total = ResourceStats::new(1000, 10, 1);
        total.accumulate(&ResourceStats::new(500, 5, 2));
        assert_eq!(total, ResourceStats::new(1500, 15, 3));
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(ResourceStats::new(1000, 2048, 1)).unwrap();
        assert_eq!(json["milliCPU"], 1000);
        assert_eq!(json["memory"], 2048);
        assert_eq!(json["gpu"], 1);
    }
}
