//! Cache store implementations

pub mod inmemory;
#[cfg(feature = "lru")]
pub mod lru;
pub mod ttl;

pub use inmemory::InMemoryCache;
#[cfg(feature = "lru")]
pub use self::lru::LruCache;
pub use ttl::TtlCache;
