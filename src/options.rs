use std::sync::Arc;

use memindex_skiplist::{
    mem_allocator::block_arena::DEFAULT_BLOCK_SIZE, skip_list::DEFAULT_SEED,
};

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct MemTableOptions {
    pub(crate) arena_block_size: usize,

    pub(crate) rng_seed: Option<u64>,

    pub(crate) check_duplicates: bool,
}

impl Default for MemTableOptions {
    fn default() -> Self {
        Self {
            arena_block_size: DEFAULT_BLOCK_SIZE,
            rng_seed: Some(DEFAULT_SEED),
            check_duplicates: true,
        }
    }
}

#[derive(Debug)]
pub struct MemTableOpenOptions {
    arena_block_size: usize,

    rng_seed: Option<u64>,

    check_duplicates: bool,
}

impl Default for MemTableOpenOptions {
    fn default() -> Self {
        let opts = MemTableOptions::default();
        Self {
            arena_block_size: opts.arena_block_size,
            rng_seed: opts.rng_seed,
            check_duplicates: opts.check_duplicates,
        }
    }
}

impl MemTableOpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of each arena block; must be a non-zero multiple of 8.
    pub fn arena_block_size(&mut self, size: usize) -> &mut Self {
        self.arena_block_size = size;
        self
    }

    /// Seed for node heights. `None` draws one from the OS.
    pub fn rng_seed(&mut self, seed: Option<u64>) -> &mut Self {
        self.rng_seed = seed;
        self
    }

    /// Reject keys already present instead of leaving uniqueness to the caller.
    pub fn check_duplicates(&mut self, check: bool) -> &mut Self {
        self.check_duplicates = check;
        self
    }

    pub fn build(&self) -> Result<Arc<MemTableOptions>> {
        if self.arena_block_size == 0 || self.arena_block_size % 8 != 0 {
            return Err(Error::InvalidOptions(format!(
                "arena block size must be a non-zero multiple of 8, got {}",
                self.arena_block_size
            )));
        }

        let opts = MemTableOptions {
            arena_block_size: self.arena_block_size,
            rng_seed: self.rng_seed,
            check_duplicates: self.check_duplicates,
        };
        Ok(Arc::new(opts))
    }
}
