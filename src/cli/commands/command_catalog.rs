// One module per command group. Each exposes a clap subcommand enum and an
// async `execute` that runs it against the shared `AppContext`.

pub mod content;
pub mod flagged;
pub mod penalties;
pub mod reports;
pub mod seed;
pub mod users;
