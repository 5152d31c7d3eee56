//! Size Accountant Module
//!
//! Tracks aggregate resident bytes and the configured bounds under one lock,
//! so an admission decision is atomic with the size update it implies.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CacheError, Result};

// == Cache Bounds ==
/// Byte limits that govern admission and reclaiming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheBounds {
    /// Hard ceiling on resident bytes
    pub max_cache_size: u64,
    /// Low-water mark a reclaim pass shrinks to
    pub min_cache_size: u64,
    /// Largest single object admitted
    pub largest_cacheable_size: u64,
}

impl CacheBounds {
    /// Soft watermark halfway between the low-water mark and the ceiling.
    pub fn trigger_size(&self) -> u64 {
        self.min_cache_size + (self.max_cache_size - self.min_cache_size) / 2
    }

    /// Checks `min <= max` and `largest <= max`.
    pub fn validate(&self) -> Result<()> {
        if self.min_cache_size > self.max_cache_size {
            return Err(CacheError::InvalidRequest(format!(
                "min cache size {} exceeds max cache size {}",
                self.min_cache_size, self.max_cache_size
            )));
        }
        if self.largest_cacheable_size > self.max_cache_size {
            return Err(CacheError::InvalidRequest(format!(
                "largest cacheable size {} exceeds max cache size {}",
                self.largest_cacheable_size, self.max_cache_size
            )));
        }
        Ok(())
    }
}

// == Admission ==
/// Outcome of a reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Bytes were committed; `wake_evictor` is set when resident size is now
    /// above the trigger size.
    Admitted { wake_evictor: bool },
    /// The reservation would pass the hard ceiling; nothing was committed.
    MustEvictFirst,
}

#[derive(Debug)]
struct AccountantState {
    resident_bytes: u64,
    bounds: CacheBounds,
    trigger_size: u64,
}

impl AccountantState {
    fn apply_bounds(&mut self, bounds: CacheBounds) -> Result<()> {
        bounds.validate()?;
        self.bounds = bounds;
        self.refresh_trigger();
        Ok(())
    }

    fn refresh_trigger(&mut self) {
        self.trigger_size = self.bounds.trigger_size();
        debug!(
            trigger_size = self.trigger_size,
            min_cache_size = self.bounds.min_cache_size,
            max_cache_size = self.bounds.max_cache_size,
            "trigger size updated"
        );
    }
}

// == Size Accountant ==
/// Resident byte counter plus bounds, guarded by a single mutex.
#[derive(Debug)]
pub struct SizeAccountant {
    state: Mutex<AccountantState>,
}

impl SizeAccountant {
    /// Creates an accountant with nothing resident.
    pub fn new(bounds: CacheBounds) -> Result<Self> {
        bounds.validate()?;
        Ok(Self {
            state: Mutex::new(AccountantState {
                resident_bytes: 0,
                trigger_size: bounds.trigger_size(),
                bounds,
            }),
        })
    }

    // == Try Reserve ==
    /// Commits `n` bytes unless doing so would pass the hard ceiling.
    pub fn try_reserve(&self, n: u64) -> Admission {
        let mut state = self.state.lock();
        let requested = state.resident_bytes.saturating_add(n);

        if requested > state.bounds.max_cache_size {
            debug!(resident = state.resident_bytes, requested = n, "reservation refused");
            return Admission::MustEvictFirst;
        }

        state.resident_bytes = requested;
        debug!(resident = state.resident_bytes, "reservation committed");
        Admission::Admitted {
            wake_evictor: requested > state.trigger_size,
        }
    }

    // == Release ==
    /// Returns `n` bytes to the pool.
    ///
    /// Releasing more than is resident clamps the counter to zero and reports
    /// the accounting mismatch.
    pub fn release(&self, n: u64) -> Result<()> {
        let mut state = self.state.lock();
        match state.resident_bytes.checked_sub(n) {
            Some(remaining) => {
                state.resident_bytes = remaining;
                Ok(())
            }
            None => {
                let resident = state.resident_bytes;
                state.resident_bytes = 0;
                Err(CacheError::Internal(format!(
                    "released {} bytes with only {} resident",
                    n, resident
                )))
            }
        }
    }

    /// Recomputes the trigger size from the current bounds and returns it.
    pub fn refresh_trigger(&self) -> u64 {
        let mut state = self.state.lock();
        state.refresh_trigger();
        state.trigger_size
    }

    // == Bounds Mutators ==
    /// Replaces all three bounds at once.
    pub fn replace_bounds(&self, bounds: CacheBounds) -> Result<()> {
        self.state.lock().apply_bounds(bounds)
    }

    /// Replaces the low-water mark and ceiling together.
    pub fn set_bounds(&self, min_cache_size: u64, max_cache_size: u64) -> Result<()> {
        let mut state = self.state.lock();
        let bounds = CacheBounds {
            min_cache_size,
            max_cache_size,
            ..state.bounds
        };
        state.apply_bounds(bounds)
    }

    pub fn set_max_cache_size(&self, size: u64) -> Result<()> {
        let mut state = self.state.lock();
        let bounds = CacheBounds {
            max_cache_size: size,
            ..state.bounds
        };
        state.apply_bounds(bounds)
    }

    pub fn set_min_cache_size(&self, size: u64) -> Result<()> {
        let mut state = self.state.lock();
        let bounds = CacheBounds {
            min_cache_size: size,
            ..state.bounds
        };
        state.apply_bounds(bounds)
    }

    pub fn set_largest_cacheable_size(&self, size: u64) -> Result<()> {
        let mut state = self.state.lock();
        let bounds = CacheBounds {
            largest_cacheable_size: size,
            ..state.bounds
        };
        state.apply_bounds(bounds)
    }

    // == Accessors ==
    pub fn bounds(&self) -> CacheBounds {
        self.state.lock().bounds
    }

    pub fn trigger_size(&self) -> u64 {
        self.state.lock().trigger_size
    }

    pub fn resident_bytes(&self) -> u64 {
        self.state.lock().resident_bytes
    }
}
