// Core moderation module - the trust-enforcement pipeline.
// Models and ports first, then the services built on them.

pub mod audit;
pub mod moderation_gate;
pub mod moderation_models;
pub mod moderation_ports;
pub mod moderation_queries;
pub mod penalty_issuer;
pub mod report_lifecycle;

pub use audit::*;
pub use moderation_gate::*;
pub use moderation_models::*;
pub use moderation_ports::*;
pub use moderation_queries::*;
pub use penalty_issuer::*;
pub use report_lifecycle::*;
