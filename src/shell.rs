//! Colored, verbosity-gated status output on stderr/stdout.
//!
//! `MultiShell` wraps one `Shell` per stream, each of which degrades
//! gracefully to plain text when color output isn't available or wanted.
use std::fmt;
use std::io::{self, Write};

use is_terminal::IsTerminal;
use term::color::{Color, BRIGHT_GREEN, BRIGHT_RED, BRIGHT_YELLOW};
use term::Attr;

use crate::util::{human, CorralResult};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verbosity {
    Verbose,
    Normal,
    Quiet,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ColorConfig {
    Auto,
    Always,
    Never,
}

impl fmt::Display for ColorConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            ColorConfig::Auto => "auto",
            ColorConfig::Always => "always",
            ColorConfig::Never => "never",
        };
        s.fmt(f)
    }
}

impl std::str::FromStr for ColorConfig {
    type Err = Box<dyn crate::util::CorralError>;

    fn from_str(s: &str) -> CorralResult<ColorConfig> {
        match s {
            "auto" => Ok(ColorConfig::Auto),
            "always" => Ok(ColorConfig::Always),
            "never" => Ok(ColorConfig::Never),
            other => Err(human(format!(
                "argument for --color must be auto, always, or never, but found `{}`",
                other
            ))),
        }
    }
}

#[derive(Clone, Copy)]
pub struct ShellConfig {
    pub color_config: ColorConfig,
    pub tty: bool,
}

enum Terminal {
    Out(Box<term::StdoutTerminal>),
    Err(Box<term::StderrTerminal>),
    PlainOut,
    PlainErr,
}

pub struct Shell {
    terminal: Terminal,
    config: ShellConfig,
}

pub struct MultiShell {
    out: Shell,
    err: Shell,
    verbosity: Verbosity,
}

impl MultiShell {
    pub fn new(verbosity: Verbosity, color_config: ColorConfig) -> MultiShell {
        let out_config = ShellConfig {
            color_config,
            tty: io::stdout().is_terminal(),
        };
        let err_config = ShellConfig {
            color_config,
            tty: io::stderr().is_terminal(),
        };
        let out = Shell {
            terminal: term::stdout().map(Terminal::Out).unwrap_or(Terminal::PlainOut),
            config: out_config,
        };
        let err = Shell {
            terminal: term::stderr().map(Terminal::Err).unwrap_or(Terminal::PlainErr),
            config: err_config,
        };
        MultiShell { out, err, verbosity }
    }

    pub fn say<T: fmt::Display>(&mut self, message: T) -> CorralResult<()> {
        match self.verbosity {
            Verbosity::Quiet => Ok(()),
            _ => self.out.say(message, None),
        }
    }

    pub fn status<T, U>(&mut self, status: T, message: U) -> CorralResult<()>
    where
        T: fmt::Display,
        U: fmt::Display,
    {
        match self.verbosity {
            Verbosity::Quiet => Ok(()),
            _ => self
                .err
                .say_status(format!("[{}]", status), message, BRIGHT_GREEN),
        }
    }

    pub fn error<T: fmt::Display>(&mut self, message: T) -> CorralResult<()> {
        self.err.say_status("[ERR!]", message, BRIGHT_RED)
    }

    pub fn warn<T: fmt::Display>(&mut self, message: T) -> CorralResult<()> {
        match self.verbosity {
            Verbosity::Quiet => Ok(()),
            _ => self.err.say_status("[WARN]", message, BRIGHT_YELLOW),
        }
    }

    /// Brief-mode machine marker: `E\t<target>\t<message>`, meant for
    /// per-target failures that must not abort the pool.
    pub fn brief_error(&mut self, target: &str, message: &dyn fmt::Display) {
        let _ = writeln!(io::stderr(), "E\t{}\t{}", target, message);
    }

    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.verbosity = verbosity;
    }

    pub fn get_verbose(&self) -> Verbosity {
        self.verbosity
    }

    pub fn color_config(&self) -> ColorConfig {
        self.out.config.color_config
    }
}

impl Shell {
    fn colored(&self) -> bool {
        (self.config.tty && self.config.color_config == ColorConfig::Auto)
            || self.config.color_config == ColorConfig::Always
    }

    fn fg(&mut self, color: Color) {
        if !self.colored() {
            return;
        }
        match &mut self.terminal {
            Terminal::Out(t) => {
                let _ = t.fg(color);
            }
            Terminal::Err(t) => {
                let _ = t.fg(color);
            }
            Terminal::PlainOut | Terminal::PlainErr => {}
        }
    }

    fn bold(&mut self) {
        if !self.colored() {
            return;
        }
        match &mut self.terminal {
            Terminal::Out(t) => {
                let _ = t.attr(Attr::Bold);
            }
            Terminal::Err(t) => {
                let _ = t.attr(Attr::Bold);
            }
            Terminal::PlainOut | Terminal::PlainErr => {}
        }
    }

    fn reset(&mut self) {
        if !self.colored() {
            return;
        }
        match &mut self.terminal {
            Terminal::Out(t) => {
                let _ = t.reset();
            }
            Terminal::Err(t) => {
                let _ = t.reset();
            }
            Terminal::PlainOut | Terminal::PlainErr => {}
        }
    }

    fn write_str(&mut self, s: &str) -> CorralResult<()> {
        let res = match &mut self.terminal {
            Terminal::Out(t) => write!(t, "{}", s),
            Terminal::Err(t) => write!(t, "{}", s),
            Terminal::PlainOut => write!(io::stdout(), "{}", s),
            Terminal::PlainErr => write!(io::stderr(), "{}", s),
        };
        res.map_err(|e| human(format!("failed to write to shell: {}", e)))
    }

    fn say<T: fmt::Display>(&mut self, message: T, color: Option<Color>) -> CorralResult<()> {
        if let Some(color) = color {
            self.fg(color);
        }
        self.write_str(&format!("{}\n", message))?;
        self.reset();
        Ok(())
    }

    fn say_status<T, U>(&mut self, status: T, message: U, color: Color) -> CorralResult<()>
    where
        T: fmt::Display,
        U: fmt::Display,
    {
        self.fg(color);
        self.bold();
        self.write_str(&status.to_string())?;
        self.reset();
        self.write_str(&format!(" {}\n", message))?;
        Ok(())
    }
}
