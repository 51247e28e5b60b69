mod error;
mod traits;

pub mod memory;

#[cfg(feature = "sea-orm")]
pub mod database;
#[cfg(feature = "sea-orm")]
pub mod entity;

pub use error::StoreError;
pub use memory::MemoryFileStore;
pub use traits::FileStore;
