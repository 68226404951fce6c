use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::thread;

use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use signal_hook::consts::signal::{SIGCHLD, SIGINT};
use signal_hook::iterator::Signals;

use crate::jobs::{self, JobTable};

/// Install the termination-notification route: a dedicated thread that
/// receives SIGCHLD and drains terminated children into the job table.
///
/// The thread also absorbs SIGINT so a stray Ctrl-C drops back to the
/// prompt instead of killing the interpreter. Installed once at startup;
/// failure here is fatal to the caller.
pub fn install(table: Arc<Mutex<JobTable>>) -> io::Result<()> {
    let mut signals = Signals::new([SIGCHLD, SIGINT])?;
    thread::Builder::new()
        .name("reaper".into())
        .spawn(move || {
            for signal in signals.forever() {
                match signal {
                    SIGCHLD => drain(&table),
                    SIGINT => println!(),
                    _ => {}
                }
            }
        })?;
    Ok(())
}

/// Non-blocking drain of every terminated child.
///
/// Multiple children may exit between two SIGCHLD deliveries, so this loops
/// until the check comes back empty. The table lock is held for the whole
/// drain; that is the mutual exclusion every synchronous table user relies
/// on, and it delays the drain past any in-flight registration or
/// kill-marking.
fn drain(table: &Mutex<JobTable>) {
    let mut table = jobs::lock(table);
    let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED;
    loop {
        let (pid, stopped) = match waitpid(Pid::from_raw(-1), Some(flags)) {
            Ok(WaitStatus::Exited(pid, _)) | Ok(WaitStatus::Signaled(pid, _, _)) => (pid, false),
            Ok(WaitStatus::Stopped(pid, _)) => (pid, true),
            Ok(WaitStatus::StillAlive) => break,
            Ok(_) => continue,
            // ECHILD: nothing left to reap, possibly because a foreground
            // wait already collected the child.
            Err(_) => break,
        };

        let Some(number) = table.number_for_pid(pid) else {
            continue;
        };
        if stopped {
            table.mark_suspended(number);
        } else {
            table.mark_terminal(number);
        }
        if let Some(job) = table.get(number) {
            println!("{}", job.status_line());
        }
    }
    let _ = io::stdout().flush();
}
