pub mod comparator;
pub mod error;
pub mod mem_allocator;
pub mod skip_list;

pub mod prelude {
    pub use crate::{
        comparator::prelude::*,
        error::{Error, Result},
        mem_allocator::prelude::*,
        skip_list::{MAX_HEIGHT, SkipList, SkipListIter},
    };
}
