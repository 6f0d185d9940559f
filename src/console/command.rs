use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::io::{self, Write};
use std::marker::PhantomData;

/// What the interpreter does after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// State a console works on, e.g. the inventory store or the shop.
pub trait Session {
    /// Heading printed above the menu.
    fn title(&self) -> &str;

    /// Printed once when the console closes.
    fn summary(&self, out: &mut dyn Write) -> io::Result<()>;
}

/// A parsed command ready to run against a session.
pub trait ExecutableCommand<S> {
    fn execute(self: Box<Self>, out: &mut dyn Write, session: &mut S) -> Result<Flow>;
}

/// Creates commands from a menu selection.
pub trait CommandFactory<S> {
    fn name(&self) -> &'static str;

    fn option(&self) -> u32;

    fn summary(&self) -> &'static str;

    /// argh usage text of the command.
    fn usage(&self) -> String;

    /// Returns `None` when `selector` is neither this command's name nor its
    /// menu number.
    fn try_create(&self, selector: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand<S>>>;
}

/// A menu entry whose arguments are parsed with [`argh`].
pub(crate) trait MenuCommand<S>: Sized + FromArgs {
    /// Name typed at the prompt, e.g. "add".
    const NAME: &'static str;

    /// Menu number; `0` is reserved for exit.
    const OPTION: u32;

    /// One line shown in the menu.
    const SUMMARY: &'static str;

    fn execute(self, out: &mut dyn Write, session: &mut S) -> Result<Flow>;
}

struct Parsed<T>(T);

impl<S, T: MenuCommand<S>> ExecutableCommand<S> for Parsed<T> {
    fn execute(self: Box<Self>, out: &mut dyn Write, session: &mut S) -> Result<Flow> {
        self.0.execute(out, session)
    }
}

/// Output of a failed argh parse, or of `--help`.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl<S> ExecutableCommand<S> for InvalidArgs {
    fn execute(self: Box<Self>, out: &mut dyn Write, _session: &mut S) -> Result<Flow> {
        if self.is_error {
            anyhow::bail!("{}", self.output.trim_end());
        }
        writeln!(out, "{}", self.output.trim_end())?;
        Ok(Flow::Continue)
    }
}

pub(crate) struct Factory<T> {
    _phantom: PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<S, T: MenuCommand<S> + 'static> CommandFactory<S> for Factory<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn option(&self) -> u32 {
        T::OPTION
    }

    fn summary(&self) -> &'static str {
        T::SUMMARY
    }

    fn usage(&self) -> String {
        match T::from_args(&[T::NAME], &["--help"]) {
            Ok(_) => String::new(),
            Err(EarlyExit { output, .. }) => output,
        }
    }

    fn try_create(&self, selector: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand<S>>> {
        let selected = selector.eq_ignore_ascii_case(T::NAME)
            || selector.parse::<u32>().is_ok_and(|n| n == T::OPTION);
        if !selected {
            return None;
        }
        Some(match T::from_args(&[T::NAME], args) {
            Ok(cmd) => Box::new(Parsed(cmd)),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        })
    }
}

#[derive(FromArgs)]
/// Leave the console and print the session summary.
pub struct Exit {}

impl<S: Session> MenuCommand<S> for Exit {
    const NAME: &'static str = "exit";
    const OPTION: u32 = 0;
    const SUMMARY: &'static str = "Exit";

    fn execute(self, out: &mut dyn Write, session: &mut S) -> Result<Flow> {
        session.summary(out)?;
        Ok(Flow::Exit)
    }
}
