use crate::error::{Error, Result};

/// Upper bound on interleaver branches.
pub const MAX_INTERLEAVE_BRANCHES: usize = 1024;
/// Upper bound on the end-to-end interleaver delay in bytes (ATSC uses 10608).
pub const MAX_INTERLEAVE_LATENCY: usize = 1 << 22;

/// Configuration shared by the stream encoder and decoder.
#[derive(Debug, Clone)]
pub struct VsbConfig {
    /// Viterbi decision delay in symbols per trellis lane.
    /// `0` commits each dibit immediately from the current best state.
    /// Larger values trace back from the best state `traceback_depth`
    /// symbols later (clamped to the end of the block). Default: 0.
    pub traceback_depth: usize,
    /// Number of branches (B) of the convolutional byte interleaver. Default: 52.
    pub interleave_branches: usize,
    /// Delay increment per branch in bytes (M). Default: 4.
    pub interleave_unit: usize,
}

impl Default for VsbConfig {
    fn default() -> Self {
        Self {
            traceback_depth: 0,
            interleave_branches: 52,
            interleave_unit: 4,
        }
    }
}

impl VsbConfig {
    /// Configuration with the byte interleaver disabled (every branch delay is zero).
    pub fn without_interleaving() -> Self {
        Self {
            interleave_branches: 1,
            ..Self::default()
        }
    }

    /// End-to-end interleaver + deinterleaver delay in bytes, (B-1)*M*B.
    ///
    /// Returns `None` if the product does not fit in `usize`.
    pub fn interleave_latency(&self) -> Option<usize> {
        self.interleave_branches
            .saturating_sub(1)
            .checked_mul(self.interleave_unit)?
            .checked_mul(self.interleave_branches)
    }

    /// Check the configuration and return its interleaver latency.
    pub fn validate(&self) -> Result<usize> {
        if self.interleave_branches == 0 {
            return Err(Error::InvalidConfig(
                "interleave_branches must be at least 1".into(),
            ));
        }
        if self.interleave_branches > MAX_INTERLEAVE_BRANCHES {
            return Err(Error::InvalidConfig(format!(
                "interleave_branches {} exceeds {MAX_INTERLEAVE_BRANCHES}",
                self.interleave_branches
            )));
        }
        match self.interleave_latency() {
            Some(latency) if latency <= MAX_INTERLEAVE_LATENCY => Ok(latency),
            _ => Err(Error::InvalidConfig(format!(
                "interleaver latency of {} branches x {} bytes exceeds {MAX_INTERLEAVE_LATENCY} bytes",
                self.interleave_branches, self.interleave_unit
            ))),
        }
    }
}
