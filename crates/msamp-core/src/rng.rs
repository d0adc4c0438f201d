//! Seeding rules shared by the orchestrator and in-process generators.

use std::hash::Hasher;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use siphasher::sip::SipHasher13;

/// Seed of the job at table position `position` in a run seeded with `master_seed`.
///
/// SipHash-1-3 under zero keys over `(master_seed, position)`. The value only
/// depends on its two inputs, so a model keeps its seed when other models
/// are added to or dropped from the dispatch.
pub fn derive_substream_seed(master_seed: u64, position: u64) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(master_seed);
    hasher.write_u64(position);
    hasher.finish()
}

/// Reproducible random source for generators running inside the process.
#[derive(Debug, Clone)]
pub struct RngHandle(StdRng);

impl RngHandle {
    /// Seeds the handle directly.
    pub fn from_seed(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RngCore for RngHandle {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.try_fill_bytes(dest)
    }
}
