//! Resource limits for encoding and decoding.

use crate::error::{Error, Result};

/// Default maximum container nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Maximum declared length of a single string, blob or container (64 MB by default).
pub const DEFAULT_MAX_LENGTH: usize = 64 * 1024 * 1024;

/// Limits bounds the resources a single encode or decode call may use.
///
/// Depth is checked on every container entered. Length is checked against
/// each declared length or count before anything is allocated for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    max_depth: usize,
    max_length: usize,
}

impl Limits {
    /// Creates limits with the default values.
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    /// Sets the maximum container nesting depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the maximum declared length.
    pub fn max_length(mut self, length: usize) -> Self {
        self.max_length = length;
        self
    }

    /// Returns the configured nesting depth.
    pub fn depth_limit(&self) -> usize {
        self.max_depth
    }

    /// Returns the configured length limit.
    pub fn length_limit(&self) -> usize {
        self.max_length
    }

    pub(crate) fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(Error::DepthLimitExceeded(self.max_depth));
        }
        Ok(())
    }

    pub(crate) fn check_length(&self, length: usize) -> Result<()> {
        if length > self.max_length {
            return Err(Error::LengthLimitExceeded {
                length,
                limit: self.max_length,
            });
        }
        Ok(())
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new()
    }
}
