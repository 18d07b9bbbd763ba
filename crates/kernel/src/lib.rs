pub mod cache;
pub mod debounce;
pub mod shutdown;

pub use cache::LruCache;
pub use debounce::Debouncer;
pub use shutdown::join_with_timeout;
