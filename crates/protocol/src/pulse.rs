//! Pulse classification
//!
//! Maps raw pulse durations (microseconds) captured by the RF bridge to
//! the symbolic roles the Somfy RTS sync machine operates on.

use tracing::debug;

/// Symbolic role of a single captured pulse duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseRole {
    Short,
    Long,
    HardwareSync,
    SoftwareSync,
    InterFrameGap,
    Unknown,
}

/// Classify a pulse duration into its symbolic role.
///
/// Pure and total: every duration maps to exactly one role, `Unknown`
/// included. Bounds are exclusive. The HardwareSync and SoftwareSync
/// ranges overlap on (3136, 3328); SoftwareSync wins there, matching
/// observed transmitter behavior.
pub fn classify(duration_us: u32) -> PulseRole {
    if duration_us > 25_000 {
        PulseRole::InterFrameGap
    } else if duration_us > 3136 && duration_us < 5824 {
        PulseRole::SoftwareSync
    } else if duration_us > 1792 && duration_us < 3328 {
        PulseRole::HardwareSync
    } else if duration_us > 896 && duration_us < 1664 {
        PulseRole::Long
    } else if duration_us > 448 && duration_us < 832 {
        PulseRole::Short
    } else {
        PulseRole::Unknown
    }
}

/// Bucket table: the distinct pulse durations of one capture, each
/// tagged with its derived role and referenced by index thereafter.
///
/// Built once per capture (or once per remote during initialization)
/// and immutable from then on.
#[derive(Debug, Clone)]
pub struct BucketTable {
    durations: Vec<u32>,
    roles: Vec<PulseRole>,
}

impl BucketTable {
    /// Build a bucket table from raw durations, classifying each one.
    pub fn from_durations(durations: &[u32]) -> Self {
        let roles: Vec<PulseRole> = durations.iter().map(|&d| classify(d)).collect();
        for (i, (&d, r)) in durations.iter().zip(&roles).enumerate() {
            debug!(bucket = i, duration_us = d, role = ?r, "classified bucket");
        }
        Self {
            durations: durations.to_vec(),
            roles,
        }
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Role of the bucket at `index`, if the index is in range.
    pub fn role(&self, index: usize) -> Option<PulseRole> {
        self.roles.get(index).copied()
    }

    /// Raw duration of the bucket at `index`.
    pub fn duration(&self, index: usize) -> Option<u32> {
        self.durations.get(index).copied()
    }

    /// All raw durations, in capture order.
    pub fn durations(&self) -> &[u32] {
        &self.durations
    }

    /// Bucket index (as a single hex-digit token) of the first bucket
    /// with the given role, if any. Used when assembling a transmit
    /// command from a calibrated table.
    pub fn token_for(&self, role: PulseRole) -> Option<String> {
        self.roles
            .iter()
            .position(|&r| r == role)
            .map(|i| format!("{:X}", i))
    }
}
