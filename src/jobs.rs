use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use nix::unistd::Pid;

/// Hard cap on jobs tracked in one session. Entries are never removed, so
/// this bounds total launches, not just concurrently live jobs.
pub const MAX_JOBS: usize = 65536;

/// The lifecycle state of a tracked job. Transitions only move forward;
/// `Finished` and `Killed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Suspended,
    Finished,
    Killed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Suspended => "suspended",
            JobStatus::Finished => "finished",
            JobStatus::Killed => "killed",
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Killed)
    }
}

/// A single tracked child process. The job number is the stable handle:
/// the OS may recycle the pid once the child has been reaped.
pub struct Job {
    pub number: usize,
    pub pid: Pid,
    pub command: String,
    pub status: JobStatus,
    pub valid: bool,
}

impl Job {
    /// The status line reported for every job event:
    /// `[<number>] (<pid>)  <status>  <command>`.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] ({})  {}  {}",
            self.number,
            self.pid,
            self.status.as_str(),
            self.command
        )
    }
}

/// Returned by `allocate` when the session's job cap is reached.
#[derive(Debug)]
pub struct TableFull;

impl fmt::Display for TableFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job table full ({MAX_JOBS} jobs per session)")
    }
}

impl std::error::Error for TableFull {}

/// The shared job table. Every access path — launcher registration, the
/// reaper's drain, `fg`, `nuke` — runs under the table's mutex, which is
/// what keeps the asynchronous reap from observing a half-registered job
/// or downgrading an explicitly killed one.
pub struct JobTable {
    jobs: HashMap<usize, Job>,
    next_number: usize,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            jobs: HashMap::new(),
            next_number: 1,
        }
    }

    /// Capacity pre-check for the launcher, so a doomed launch is refused
    /// before anything is forked.
    pub fn is_full(&self) -> bool {
        self.next_number > MAX_JOBS
    }

    /// Insert a `Running` entry for a freshly forked child under the next
    /// job number. Numbers are monotonic and never reused in a session.
    pub fn allocate(&mut self, pid: Pid, command: &str) -> Result<usize, TableFull> {
        if self.is_full() {
            return Err(TableFull);
        }
        let number = self.next_number;
        self.next_number += 1;
        self.jobs.insert(
            number,
            Job {
                number,
                pid,
                command: command.to_string(),
                status: JobStatus::Running,
                valid: true,
            },
        );
        Ok(number)
    }

    pub fn get(&self, number: usize) -> Option<&Job> {
        self.jobs.get(&number)
    }

    /// Translate an OS pid back into a job number. Only pending (valid)
    /// entries qualify — once an entry is consumed its pid may belong to a
    /// later job — and the newest match wins.
    pub fn number_for_pid(&self, pid: Pid) -> Option<usize> {
        self.jobs
            .values()
            .filter(|job| job.valid && job.pid == pid)
            .map(|job| job.number)
            .max()
    }

    /// Record that a kill is about to be delivered. The entry stays valid:
    /// its `killed` status line is still owed to the user once it is reaped.
    pub fn mark_killed(&mut self, number: usize) {
        if let Some(job) = self.jobs.get_mut(&number) {
            if !job.status.is_terminal() {
                job.status = JobStatus::Killed;
            }
        }
    }

    /// Record an observed stop signal. Terminal states never regress.
    pub fn mark_suspended(&mut self, number: usize) {
        if let Some(job) = self.jobs.get_mut(&number) {
            if job.status == JobStatus::Running {
                job.status = JobStatus::Suspended;
            }
        }
    }

    /// Record an observed termination and consume the entry. An explicit
    /// kill always wins over a subsequently observed exit; anything else
    /// becomes `Finished`.
    pub fn mark_terminal(&mut self, number: usize) {
        if let Some(job) = self.jobs.get_mut(&number) {
            if job.status != JobStatus::Killed {
                job.status = JobStatus::Finished;
            }
            job.valid = false;
        }
    }

    /// All pending jobs in ascending job-number order.
    pub fn list(&self) -> Vec<&Job> {
        let mut list: Vec<&Job> = self.jobs.values().filter(|job| job.valid).collect();
        list.sort_by_key(|job| job.number);
        list
    }
}

/// Acquire the table lock, recovering from poisoning: a panicking thread
/// must not take the job table down with it.
pub fn lock(table: &Mutex<JobTable>) -> MutexGuard<'_, JobTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}
