//! Re-entrancy guard

use std::cell::Cell;

use spp_common::errors::{SppError, SppResult};

/// Holds the engine's in-progress flag for the duration of one action.
///
/// The flag is cleared on drop, whichever way the action ends.
#[derive(Debug)]
pub struct ReentrancyGuard<'a> {
    locked: &'a Cell<bool>,
}

impl<'a> ReentrancyGuard<'a> {
    /// Set the flag, failing with `ReentrantCall` if it is already set
    pub fn acquire(locked: &'a Cell<bool>) -> SppResult<Self> {
        if locked.replace(true) {
            return Err(SppError::ReentrantCall);
        }
        Ok(Self { locked })
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.locked.set(false);
    }
}
