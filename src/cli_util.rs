use std::io::{self, IsTerminal, Write};

use nu_ansi_term::Style;

use crate::loader::LoadError;
use crate::theme::catppuccin::Mocha;
use crate::InterpreterError;

/// Renders diagnostics for the CLI. Colors are only used when stderr is a
/// terminal.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics<'a> {
    program: &'a str,
    color: bool,
}

impl<'a> Diagnostics<'a> {
    pub fn new(program: &'a str) -> Self {
        Self { program, color: io::stderr().is_terminal() }
    }

    pub fn plain(program: &'a str) -> Self {
        Self { program, color: false }
    }

    fn prefix(&self) -> String {
        if self.color {
            Style::new().fg(Mocha::RED).bold().paint(format!("{}:", self.program)).to_string()
        } else {
            format!("{}:", self.program)
        }
    }

    /// One-line message, e.g. `bf: prog.bf: No such file or directory`.
    pub fn message(&self, msg: &str) -> String {
        format!("{} {msg}", self.prefix())
    }

    /// Print a one-line diagnostic to stderr.
    pub fn error(&self, msg: &str) {
        eprintln!("{}", self.message(msg));
        let _ = io::stderr().flush();
    }

    pub fn load_error(&self, err: &LoadError) {
        self.error(&err.to_string());
    }

    /// Print an interpreter error. With `context` the offending instruction is
    /// shown underneath with a caret.
    pub fn interpreter_error(&self, code: &[u8], err: &InterpreterError, context: bool) {
        self.error(&err.to_string());

        if !context {
            return;
        }
        match err {
            InterpreterError::UnmatchedBrackets { ip, .. } | InterpreterError::IoError { ip, .. } => {
                let [text, caret] = context_window(code, *ip);
                if self.color {
                    eprintln!("  {}", Style::new().fg(Mocha::SURFACE2).paint(text));
                    eprintln!("  {}", Style::new().fg(Mocha::YELLOW).bold().paint(caret));
                } else {
                    eprintln!("  {text}");
                    eprintln!("  {caret}");
                }
                let _ = io::stderr().flush();
            }
            InterpreterError::StepLimitExceeded { .. } | InterpreterError::Canceled => {}
        }
    }
}

/// Show a short window around the position for context: the program text
/// on one line and a caret under `pos`. Newlines and other control bytes are
/// rendered as spaces so the caret stays aligned.
pub fn context_window(code: &[u8], pos: usize) -> [String; 2] {
    const WINDOW: usize = 32;

    let start = pos.saturating_sub(WINDOW);
    let end = (pos + WINDOW + 1).min(code.len());

    let slice: String = code[start..end]
        .iter()
        .map(|&b| if b.is_ascii_graphic() { b as char } else { ' ' })
        .collect();

    let mut underline = " ".repeat(pos.saturating_sub(start));
    underline.push('^');

    [slice, underline]
}
