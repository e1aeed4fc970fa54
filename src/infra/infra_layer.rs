// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "community/community_store.rs"]
pub mod community;

#[path = "audit/mod.rs"]
pub mod audit;

#[path = "classifier/mod.rs"]
pub mod classifier;
