pub mod memory;

pub use memory::MemoryStore;

/// Failure reported by the shared key-value store or by value encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Unavailable(String),
    Encode(String),
    Decode(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::Encode(msg) => write!(f, "encode failed: {}", msg),
            StoreError::Decode(msg) => write!(f, "decode failed: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Capability set the spatial core needs from the shared store.
///
/// `set_if_absent` and `delete_if_equals` must each be a single indivisible
/// operation against the backing store. Tile locks depend on it.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Returns whether a value was removed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Writes `value` only if `key` holds nothing. Returns whether it wrote.
    fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Removes `key` only if it currently holds `expected`. Returns whether it removed.
    fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool, StoreError>;

    /// All entries whose key starts with `prefix`, ordered by key.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError>;
}
