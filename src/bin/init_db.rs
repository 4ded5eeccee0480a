//! Create the race database tables.

use racelog::commands::{self, Command};
use std::process::ExitCode;

fn main() -> ExitCode {
    commands::run(Command::InitSchema)
}
