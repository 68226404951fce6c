use std::ffi::CString;
use std::io;
use std::sync::Mutex;

use nix::errno::Errno;
use nix::sys::wait::waitpid;
use nix::unistd::{self, ForkResult, Pid, fork};

use crate::jobs::{self, JobTable};

/// Fork-and-exec one command, registering it in the job table before any
/// reap of it can be observed.
///
/// The table lock is held from before the fork until the entry exists (and,
/// for foreground commands, across the whole wait), so the reaper cannot
/// process the child's termination against a missing entry.
pub fn spawn(table: &Mutex<JobTable>, argv: &[String], background: bool) {
    let mut table = jobs::lock(table);

    if table.is_full() {
        eprintln!("ERROR: job table full, cannot run {}", argv[0]);
        return;
    }

    // Everything the child needs is built up front: after forking a process
    // with other threads, only async-signal-safe calls are allowed in the
    // child, which rules out allocation.
    let Some(cells) = c_argv(argv) else {
        println!("ERROR: cannot run {}", argv[0]);
        return;
    };
    let exec_error = format!("ERROR: cannot run {}\n", argv[0]);

    let child = match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            let _ = unistd::execvp(&cells[0], &cells);
            // execvp only returns on failure. Raw write: the inherited
            // stdout buffer and its lock cannot be trusted here. The child
            // must never fall through into the interpreter loop.
            let _ = unistd::write(io::stdout(), exec_error.as_bytes());
            unsafe { libc::_exit(1) }
        }
        Ok(ForkResult::Parent { child }) => child,
        Err(err) => {
            eprintln!("ERROR: fork failed: {err}");
            return;
        }
    };

    let number = match table.allocate(child, &argv[0]) {
        Ok(number) => number,
        Err(err) => {
            // Capacity was checked before the fork, so this entry cannot be
            // lost to a full table; report and abandon the launch.
            eprintln!("ERROR: {err}");
            return;
        }
    };

    if background {
        if let Some(job) = table.get(number) {
            println!("{}", job.status_line());
        }
        return;
    }

    if let Err(err) = wait_for(child) {
        eprintln!("ERROR: wait failed for {}: {err}", argv[0]);
    }
    table.mark_terminal(number);
    if let Some(job) = table.get(number) {
        println!("{}", job.status_line());
    }
}

/// Blocking wait for one specific pid, retrying on EINTR.
pub(crate) fn wait_for(pid: Pid) -> nix::Result<()> {
    loop {
        match waitpid(pid, None) {
            Ok(_) => return Ok(()),
            Err(Errno::EINTR) => continue,
            Err(err) => return Err(err),
        }
    }
}

fn c_argv(argv: &[String]) -> Option<Vec<CString>> {
    argv.iter()
        .map(|arg| CString::new(arg.as_str()).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_argv_converts_whole_vector() {
        let argv = vec!["sleep".to_string(), "1".to_string()];
        let cells = c_argv(&argv).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].to_str().unwrap(), "sleep");
    }

    #[test]
    fn c_argv_rejects_interior_nul() {
        let argv = vec!["bad\0name".to_string()];
        assert!(c_argv(&argv).is_none());
    }
}
