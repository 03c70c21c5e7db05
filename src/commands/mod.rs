//! Command implementations
//!
//! Each module corresponds to a subcommand in the CLI.

pub mod broadcast;
pub mod login;
pub mod prompt;
pub mod search;
pub mod selection;

pub use broadcast::{run as broadcast_run, BroadcastArgs};
pub use login::{logout, run as login_run};
pub use search::run as search_run;
pub use selection::{parse_selection, Selection};
