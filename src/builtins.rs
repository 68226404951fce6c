use std::io::{self, Write};
use std::process;
use std::sync::Mutex;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::jobs::{self, JobStatus, JobTable};
use crate::launcher;

/// A job target as typed by the user: `%<jobNumber>` or a literal pid.
#[derive(Debug, PartialEq)]
enum Target {
    Number(usize),
    ProcessId(Pid),
}

fn parse_target(text: &str) -> Option<Target> {
    if let Some(digits) = text.strip_prefix('%') {
        digits
            .parse::<usize>()
            .ok()
            .filter(|number| *number > 0)
            .map(Target::Number)
    } else {
        text.parse::<i32>()
            .ok()
            .filter(|pid| *pid > 0)
            .map(|pid| Target::ProcessId(Pid::from_raw(pid)))
    }
}

/// Resolve a target to the number of a pending job. The error carries the
/// exact text to echo after `ERROR: no job `: the parsed number when the
/// target parses, the raw token otherwise.
fn resolve_target(table: &JobTable, text: &str) -> Result<usize, String> {
    match parse_target(text) {
        Some(Target::Number(number)) => match table.get(number) {
            Some(job) if job.valid => Ok(number),
            _ => Err(number.to_string()),
        },
        Some(Target::ProcessId(pid)) => {
            table.number_for_pid(pid).ok_or_else(|| pid.to_string())
        }
        None => Err(text.to_string()),
    }
}

/// `jobs`: the status line of every pending entry, ascending.
pub fn jobs(table: &Mutex<JobTable>) {
    let table = jobs::lock(table);
    for job in table.list() {
        println!("{}", job.status_line());
    }
}

/// `fg <target>`: blocking wait on the job, then report its final status.
/// The lock stays held across the wait so the reaper cannot race this reap.
pub fn fg(table: &Mutex<JobTable>, args: &[String]) {
    let Some(target) = args.first() else {
        eprintln!("ERROR: fg requires at least one argument");
        return;
    };

    let mut table = jobs::lock(table);
    let number = match resolve_target(&table, target) {
        Ok(number) => number,
        Err(text) => {
            println!("ERROR: no job {text}");
            return;
        }
    };
    let Some(pid) = table.get(number).map(|job| job.pid) else {
        return;
    };

    if let Err(err) = launcher::wait_for(pid) {
        eprintln!("ERROR: fg wait failed: {err}");
    }
    table.mark_terminal(number);
    if let Some(job) = table.get(number) {
        println!("{}", job.status_line());
    }
}

/// `bg <target>`: target must resolve, nothing blocks, the job stays
/// running as recorded. Suspend/resume is not supported.
pub fn bg(table: &Mutex<JobTable>, args: &[String]) {
    let Some(target) = args.first() else {
        eprintln!("ERROR: bg requires at least one argument");
        return;
    };

    let table = jobs::lock(table);
    if let Err(text) = resolve_target(&table, target) {
        println!("ERROR: no job {text}");
    }
}

/// `nuke [<target>...]`: with no targets, kill every running job; with
/// targets, resolve each independently — a bad target reports its error and
/// the rest are still processed.
pub fn nuke(table: &Mutex<JobTable>, args: &[String]) {
    let mut table = jobs::lock(table);

    if args.is_empty() {
        let running: Vec<usize> = table
            .list()
            .iter()
            .filter(|job| job.status == JobStatus::Running)
            .map(|job| job.number)
            .collect();
        for number in running {
            kill_job(&mut table, number);
        }
        return;
    }

    for target in args {
        match resolve_target(&table, target) {
            Ok(number) => kill_job(&mut table, number),
            Err(text) => println!("ERROR: no job {text}"),
        }
    }
}

/// Mark first, signal second: the reap that follows must record `killed`,
/// never `finished`, however the exit and the signal interleave.
fn kill_job(table: &mut JobTable, number: usize) {
    let Some(job) = table.get(number) else {
        return;
    };
    if job.status != JobStatus::Running {
        return;
    }
    let pid = job.pid;
    table.mark_killed(number);
    let _ = signal::kill(pid, Signal::SIGKILL);
}

/// `quit`: terminate the interpreter with status 0. Live children are
/// deliberately left running.
pub fn quit(args: &[String]) {
    if !args.is_empty() {
        eprintln!("ERROR: quit takes no arguments");
        return;
    }
    // process::exit skips the end-of-main stdout flush.
    let _ = io::stdout().flush();
    process::exit(0);
}
