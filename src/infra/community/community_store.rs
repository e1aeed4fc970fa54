// Implementations of the community store ports.

#[cfg(test)]
pub mod in_memory;
pub mod sqlite_content;
pub mod sqlite_penalties;
pub mod sqlite_reports;
pub mod sqlite_store;

// Re-export for convenience
#[cfg(test)]
pub use in_memory::InMemoryCommunityStore;
pub use sqlite_store::SqliteCommunityStore;
