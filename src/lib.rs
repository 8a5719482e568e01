//! A Brainfuck interpreter over a tape that grows in both directions.
//!
//! Features and behaviors:
//! - Memory tape initialized to 0, starting at 64 cells with the head in the
//!   middle; moving past either edge grows the tape by another chunk instead
//!   of failing.
//! - Cells are bytes; `+` and `-` wrap around.
//! - Input `,` reads a single byte; on EOF the configured [`EofPolicy`]
//!   applies (store 0 by default).
//! - Output `.` writes the current cell as a raw byte.
//! - Brackets are matched when a jump is actually taken, so an unmatched
//!   bracket is only reported once execution evaluates it.
//! - Any byte outside `><+-.,[]` is ignored.
//!
//! Quick start:
//!
//! ```no_run
//! use bfa::Interpreter;
//!
//! // Classic "Hello World!" in Brainfuck
//! let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";
//! let mut bf = Interpreter::new(code);
//! bf.run().expect("program should run");
//! ```

pub mod cli_util;
pub mod commands;
pub mod loader;
pub mod reader;
pub mod tape;
pub mod theme;

pub use loader::{load, load_path, LoadError, Program};
pub use reader::{EofPolicy, Interpreter, InterpreterError, StepControl, UnmatchedBracketKind};
pub use tape::Tape;
