use crate::console::command::{CommandFactory, Flow, Session};
use crate::console::lexer;
use anyhow::{Result, anyhow};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;
use tracing::debug;

/// Where the interpreter reads its lines from.
///
/// `Err(ReadlineError::Interrupted)` is Ctrl-C and `Err(ReadlineError::Eof)`
/// is Ctrl-D, as with rustyline.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<String, ReadlineError>;
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        let line = self.readline(prompt)?;
        if !line.trim().is_empty() {
            self.add_history_entry(line.as_str())?;
        }
        Ok(line)
    }
}

/// A numbered-menu console over one [`Session`].
///
/// Each line is split into words; the first one selects a command by name
/// or menu number and the rest are handed to that command's argh parser.
/// `help`/`menu` list the commands, `help <command>` prints its usage.
pub struct Interpreter<S> {
    session: S,
    commands: Vec<Box<dyn CommandFactory<S>>>,
}

impl<S: Session> Interpreter<S> {
    pub fn new(session: S, commands: Vec<Box<dyn CommandFactory<S>>>) -> Self {
        Self { session, commands }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn into_session(self) -> S {
        self.session
    }

    pub fn print_menu(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "=== {} ===", self.session.title())?;
        let mut entries: Vec<&dyn CommandFactory<S>> =
            self.commands.iter().map(|c| c.as_ref()).collect();
        // Exit (0) goes last, the way the menu is read.
        entries.sort_by_key(|c| (c.option() == 0, c.option()));
        for entry in entries {
            writeln!(
                out,
                "{:>3}. {:<12} {}",
                entry.option(),
                entry.name(),
                entry.summary()
            )?;
        }
        Ok(())
    }

    /// Run one console line.
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> Result<Flow> {
        let words = lexer::split_into_words(line)?;
        let Some((selector, rest)) = words.split_first() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();

        if selector.eq_ignore_ascii_case("help") || selector.eq_ignore_ascii_case("menu") {
            return self.help(args.first().copied(), out).map(|()| Flow::Continue);
        }

        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(selector, &args) {
                debug!(command = factory.name(), "executing");
                return cmd.execute(out, &mut self.session);
            }
        }
        Err(anyhow!(
            "invalid option '{selector}'; type 'help' to list the options"
        ))
    }

    fn help(&self, topic: Option<&str>, out: &mut dyn Write) -> Result<()> {
        let Some(topic) = topic else {
            self.print_menu(out)?;
            return Ok(());
        };
        let factory = self
            .commands
            .iter()
            .find(|c| {
                c.name().eq_ignore_ascii_case(topic)
                    || topic.parse::<u32>().is_ok_and(|n| n == c.option())
            })
            .ok_or_else(|| anyhow!("no command named '{topic}'"))?;
        writeln!(out, "{}", factory.usage().trim_end())?;
        Ok(())
    }

    /// Read-eval-print loop.
    ///
    /// Command errors are printed and the loop goes on. It ends on `exit`,
    /// on end of input, or on a confirmed Ctrl-C.
    pub fn repl(&mut self, lines: &mut dyn LineSource, out: &mut dyn Write) -> Result<()> {
        self.print_menu(out)?;
        loop {
            match lines.read_line("> ") {
                Ok(line) => match self.execute_line(&line, out) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Exit) => return Ok(()),
                    Err(err) => writeln!(out, "Error: {err:#}")?,
                },
                Err(ReadlineError::Interrupted) => {
                    if confirm_exit(lines, out)? {
                        self.session.summary(out)?;
                        return Ok(());
                    }
                }
                Err(ReadlineError::Eof) => {
                    self.session.summary(out)?;
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

fn confirm_exit(lines: &mut dyn LineSource, out: &mut dyn Write) -> Result<bool> {
    match lines.read_line("Exit? [y/N] ") {
        Ok(answer) => {
            let answer = answer.trim().to_lowercase();
            let confirmed = matches!(answer.as_str(), "y" | "yes" | "s" | "si" | "sí");
            if !confirmed {
                writeln!(out, "Continuing.")?;
            }
            Ok(confirmed)
        }
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(true),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::console::command::{Exit, Factory, MenuCommand};
    use argh::FromArgs;
    use std::collections::VecDeque;
    use std::io;

    /// Replays a fixed script; `None` stands for Ctrl-C. Runs dry as Eof.
    pub(crate) struct Script(pub VecDeque<Option<String>>);

    impl Script {
        pub(crate) fn new(lines: &[Option<&str>]) -> Self {
            Self(lines.iter().map(|l| l.map(str::to_string)).collect())
        }
    }

    impl LineSource for Script {
        fn read_line(&mut self, _prompt: &str) -> Result<String, ReadlineError> {
            match self.0.pop_front() {
                Some(Some(line)) => Ok(line),
                Some(None) => Err(ReadlineError::Interrupted),
                None => Err(ReadlineError::Eof),
            }
        }
    }

    #[derive(Default)]
    struct Counter {
        hits: u32,
    }

    impl Session for Counter {
        fn title(&self) -> &str {
            "Counter"
        }

        fn summary(&self, out: &mut dyn Write) -> io::Result<()> {
            writeln!(out, "hits: {}", self.hits)
        }
    }

    #[derive(FromArgs)]
    /// Add to the counter.
    struct Hit {
        #[argh(positional)]
        /// how much to add, one by default.
        by: Option<u32>,
    }

    impl MenuCommand<Counter> for Hit {
        const NAME: &'static str = "hit";
        const OPTION: u32 = 1;
        const SUMMARY: &'static str = "Add to the counter";

        fn execute(self, _out: &mut dyn Write, session: &mut Counter) -> Result<Flow> {
            session.hits += self.by.unwrap_or(1);
            Ok(Flow::Continue)
        }
    }

    fn interpreter() -> Interpreter<Counter> {
        Interpreter::new(
            Counter::default(),
            vec![
                Box::new(Factory::<Hit>::default()),
                Box::new(Factory::<Exit>::default()),
            ],
        )
    }

    fn run(script: &[Option<&str>]) -> (Interpreter<Counter>, String) {
        let mut sh = interpreter();
        let mut out = Vec::new();
        sh.repl(&mut Script::new(script), &mut out).unwrap();
        (sh, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_select_by_name_or_number() {
        let mut sh = interpreter();
        let mut out = Vec::new();
        assert_eq!(sh.execute_line("hit", &mut out).unwrap(), Flow::Continue);
        assert_eq!(sh.execute_line("1 4", &mut out).unwrap(), Flow::Continue);
        assert_eq!(sh.execute_line("HIT 2", &mut out).unwrap(), Flow::Continue);
        assert_eq!(sh.session().hits, 7);
        assert_eq!(sh.execute_line("0", &mut out).unwrap(), Flow::Exit);
    }

    #[test]
    fn test_invalid_option_is_an_error() {
        let mut sh = interpreter();
        let mut out = Vec::new();
        let err = sh.execute_line("7", &mut out).unwrap_err();
        assert!(err.to_string().contains("invalid option '7'"));
        assert!(sh.execute_line("hit many", &mut out).is_err());
        assert_eq!(sh.session().hits, 0);
    }

    #[test]
    fn test_blank_line_does_nothing() {
        let mut sh = interpreter();
        let mut out = Vec::new();
        assert_eq!(sh.execute_line("   ", &mut out).unwrap(), Flow::Continue);
        assert!(out.is_empty());
    }

    #[test]
    fn test_menu_lists_exit_last() {
        let mut sh = interpreter();
        let mut out = Vec::new();
        sh.execute_line("menu", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=== Counter ===");
        assert!(lines[1].contains("hit"));
        assert!(lines[2].contains("exit"));
    }

    #[test]
    fn test_help_for_command_shows_usage() {
        let mut sh = interpreter();
        let mut out = Vec::new();
        sh.execute_line("help hit", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Usage: hit"));
        assert!(sh.execute_line("help nope", &mut Vec::new()).is_err());
    }

    #[test]
    fn test_exit_usage_and_stray_arguments() {
        let mut sh = interpreter();
        let mut out = Vec::new();
        sh.execute_line("help exit", &mut out).unwrap();
        let usage = String::from_utf8(out).unwrap();
        assert!(usage.starts_with("Usage: exit\n"));
        assert!(!usage.contains("args"));

        assert!(sh.execute_line("exit now", &mut Vec::new()).is_err());
        assert_eq!(sh.execute_line("exit", &mut Vec::new()).unwrap(), Flow::Exit);
    }

    #[test]
    fn test_repl_reports_errors_and_continues() {
        let (sh, out) = run(&[Some("bogus"), Some("hit 3"), Some("exit")]);
        assert!(out.contains("Error: invalid option 'bogus'"));
        assert!(out.ends_with("hits: 3\n"));
        assert_eq!(sh.session().hits, 3);
    }

    #[test]
    fn test_repl_unfinished_quote_is_reported() {
        let (_, out) = run(&[Some("hit \"2"), Some("exit")]);
        assert!(out.contains("Error: unfinished quote"));
    }

    #[test]
    fn test_interrupt_declined_keeps_running() {
        let (sh, out) = run(&[None, Some("n"), Some("hit"), Some("exit")]);
        assert!(out.contains("Continuing."));
        assert_eq!(sh.session().hits, 1);
    }

    #[test]
    fn test_interrupt_confirmed_exits() {
        let (sh, out) = run(&[None, Some("y"), Some("hit")]);
        assert_eq!(sh.session().hits, 0);
        assert!(out.ends_with("hits: 0\n"));
    }

    #[test]
    fn test_eof_exits_with_summary() {
        let (_, out) = run(&[Some("hit")]);
        assert!(out.ends_with("hits: 1\n"));
    }
}
