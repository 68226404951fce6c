mod builtins;
mod executor;
mod jobs;
mod launcher;
mod parser;
mod reaper;

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use jobs::JobTable;

fn main() {
    let table = Arc::new(Mutex::new(JobTable::new()));

    if let Err(err) = reaper::install(Arc::clone(&table)) {
        eprintln!("ERROR: cannot install signal handling: {err}");
        std::process::exit(1);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("crash> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {
                for command in parser::parse_line(&line) {
                    executor::execute(&table, &command);
                }
                let _ = stdout.flush();
            }
            Err(err) => {
                eprintln!("ERROR: {err}");
                std::process::exit(1);
            }
        }
    }
}
