use std::sync::Mutex;

use crate::builtins;
use crate::jobs::JobTable;
use crate::launcher;
use crate::parser::Command;

/// Route one tokenized command to a builtin handler or to the launcher.
pub fn execute(table: &Mutex<JobTable>, command: &Command) {
    let Some((name, args)) = command.argv.split_first() else {
        return;
    };

    match name.as_str() {
        "quit" => builtins::quit(args),
        "jobs" => builtins::jobs(table),
        "fg" => builtins::fg(table, args),
        "bg" => builtins::bg(table, args),
        "nuke" => builtins::nuke(table, args),
        _ => launcher::spawn(table, &command.argv, command.background),
    }
}
