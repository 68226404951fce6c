/// One tokenized command: an argument vector (`argv[0]` is the program
/// name) and whether the command was terminated by `&`.
#[derive(Debug, PartialEq)]
pub struct Command {
    pub argv: Vec<String>,
    pub background: bool,
}

/// Split a raw input line into commands at `;` and `&`.
///
/// `&` marks the command it ends as background; words split on blanks;
/// empty commands (stray separators, blank lines) are dropped. No quoting
/// or expansion — the argument vector is handed to exec verbatim.
pub fn parse_line(line: &str) -> Vec<Command> {
    let mut commands = Vec::new();
    let mut argv: Vec<String> = Vec::new();
    let mut word = String::new();

    for ch in line.chars() {
        match ch {
            ' ' | '\t' | '\n' => {
                if !word.is_empty() {
                    argv.push(std::mem::take(&mut word));
                }
            }
            ';' | '&' => {
                if !word.is_empty() {
                    argv.push(std::mem::take(&mut word));
                }
                if !argv.is_empty() {
                    commands.push(Command {
                        argv: std::mem::take(&mut argv),
                        background: ch == '&',
                    });
                }
            }
            other => word.push(other),
        }
    }

    if !word.is_empty() {
        argv.push(word);
    }
    if !argv.is_empty() {
        commands.push(Command {
            argv,
            background: false,
        });
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn simple_command_is_foreground() {
        let commands = parse_line("echo hello world");
        assert_eq!(
            commands,
            vec![Command {
                argv: argv(&["echo", "hello", "world"]),
                background: false,
            }]
        );
    }

    #[test]
    fn ampersand_marks_background() {
        let commands = parse_line("sleep 1 &");
        assert_eq!(
            commands,
            vec![Command {
                argv: argv(&["sleep", "1"]),
                background: true,
            }]
        );
    }

    #[test]
    fn semicolon_separates_commands() {
        let commands = parse_line("echo a; echo b");
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].argv, argv(&["echo", "a"]));
        assert_eq!(commands[1].argv, argv(&["echo", "b"]));
        assert!(!commands[0].background);
        assert!(!commands[1].background);
    }

    #[test]
    fn background_flag_applies_only_to_its_command() {
        let commands = parse_line("sleep 1 & echo done");
        assert_eq!(commands.len(), 2);
        assert!(commands[0].background);
        assert!(!commands[1].background);
    }

    #[test]
    fn empty_segments_are_dropped() {
        assert!(parse_line("").is_empty());
        assert!(parse_line("   \t  ").is_empty());
        assert!(parse_line(";; & ;").is_empty());

        let commands = parse_line("; echo ok ;;");
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].argv, argv(&["echo", "ok"]));
    }

    #[test]
    fn separator_without_surrounding_spaces() {
        let commands = parse_line("echo a&echo b;echo c");
        assert_eq!(commands.len(), 3);
        assert!(commands[0].background);
        assert_eq!(commands[1].argv, argv(&["echo", "b"]));
        assert_eq!(commands[2].argv, argv(&["echo", "c"]));
    }

    #[test]
    fn trailing_newline_is_whitespace() {
        let commands = parse_line("ls\n");
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].argv, argv(&["ls"]));
    }
}
