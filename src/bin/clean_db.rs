//! Remove every race and GPS point.

use racelog::commands::{self, Command};
use std::process::ExitCode;

fn main() -> ExitCode {
    commands::run(Command::Purge)
}
