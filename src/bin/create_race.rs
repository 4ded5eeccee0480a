//! Insert a new active race.

use racelog::commands::{self, Command};
use std::process::ExitCode;

fn main() -> ExitCode {
    commands::run(Command::CreateRace)
}
