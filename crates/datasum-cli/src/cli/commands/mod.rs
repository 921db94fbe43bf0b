//! CLI command handlers, one file per command.

mod checksum;
mod print;
mod report;
mod size;
mod update;
mod verify;

pub use checksum::run_checksum;
pub use print::run_print;
pub use size::run_size;
pub use update::run_update;
pub use verify::run_verify;
