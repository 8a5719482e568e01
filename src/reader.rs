//! The execution engine.
//!
//! [`Interpreter`] walks the program byte by byte against a [`Tape`] that
//! grows in both directions. Loop brackets are matched lazily: a bracket is
//! only scanned for its partner when it actually causes a jump, so an
//! unbalanced bracket that is never evaluated is never reported. Resolved
//! pairs are remembered in a jump map so hot loops do not rescan their body.

use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::loader::Program;
use crate::tape::Tape;

/// Errors that can occur while interpreting a program.
#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    /// A loop delimiter was evaluated and no matching partner exists.
    #[error("syntax error: unmatched {kind} at instruction {ip}")]
    UnmatchedBrackets { ip: usize, kind: UnmatchedBracketKind },

    /// Reading input or writing output failed.
    #[error("I/O error at instruction {ip}: {source}")]
    IoError { ip: usize, #[source] source: io::Error },

    /// Execution aborted due to step limit.
    #[error("execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },

    /// Execution aborted because the cancel flag was raised (e.g. Ctrl-C).
    #[error("execution aborted: interrupted")]
    Canceled,
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedBracketKind {
    Open,
    Close,
}

impl fmt::Display for UnmatchedBracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedBracketKind::Open => write!(f, "'['"),
            UnmatchedBracketKind::Close => write!(f, "']'"),
        }
    }
}

/// What `,` stores when the input stream is exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum EofPolicy {
    /// Store 0 in the current cell.
    #[default]
    Zero,
    /// Leave the current cell as it was.
    Unchanged,
    /// Store 255 (all bits set).
    Max,
}

impl EofPolicy {
    fn apply(self, tape: &mut Tape) {
        match self {
            EofPolicy::Zero => tape.set_current(0),
            EofPolicy::Unchanged => {}
            EofPolicy::Max => tape.set_current(u8::MAX),
        }
    }
}

impl FromStr for EofPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" | "0" => Ok(EofPolicy::Zero),
            "unchanged" | "keep" => Ok(EofPolicy::Unchanged),
            "max" | "255" | "-1" => Ok(EofPolicy::Max),
            other => Err(format!(
                "invalid EOF policy '{other}', must be 'zero', 'unchanged' or 'max'"
            )),
        }
    }
}

/// Controls for cooperative cancellation and step limiting.
#[derive(Clone, Default)]
pub struct StepControl {
    pub max_steps: Option<usize>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self { max_steps, cancel_flag }
    }
}

/// A Brainfuck interpreter over a bidirectionally growing tape.
///
/// The interpreter owns:
/// - the program bytes,
/// - the tape and its head,
/// - a lazily-filled jump map of already matched brackets.
///
/// Each `run*` call starts from a fresh tape at instruction 0, so one
/// interpreter can be run any number of times.
pub struct Interpreter {
    program: Program,
    tape: Tape,
    // jump_map[i] holds the partner of the bracket at i once it has been scanned.
    jump_map: Vec<Option<usize>>,
    eof_policy: EofPolicy,
    steps: usize,
}

impl Interpreter {
    /// Create a new interpreter for `program` with the default EOF policy.
    pub fn new(program: impl Into<Program>) -> Self {
        let program = program.into();
        let jump_map = vec![None; program.len()];
        Self {
            program,
            tape: Tape::new(),
            jump_map,
            eof_policy: EofPolicy::default(),
            steps: 0,
        }
    }

    /// Choose what `,` stores on end of input.
    pub fn with_eof_policy(mut self, eof_policy: EofPolicy) -> Self {
        self.eof_policy = eof_policy;
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The tape as left by the most recent run.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Number of instructions executed by the most recent run.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Execute the program against stdin and stdout until completion.
    pub fn run(&mut self) -> Result<(), InterpreterError> {
        let stdin = io::stdin();
        let input = stdin.lock();
        let output = io::BufWriter::new(io::stdout().lock());
        self.run_with(input, output)
    }

    /// Execute the program with the given input and output streams.
    pub fn run_with<R: Read, W: Write>(
        &mut self,
        mut input: R,
        mut output: W,
    ) -> Result<(), InterpreterError> {
        self.execute(&mut input, &mut output, None, None)
    }

    /// Execute with cooperative cancellation and optional step limit.
    pub fn run_with_control<R: Read, W: Write>(
        &mut self,
        mut input: R,
        mut output: W,
        step_control: &StepControl,
    ) -> Result<(), InterpreterError> {
        self.execute(&mut input, &mut output, None, Some(step_control))
    }

    /// Like [`Interpreter::run_with_control`], additionally writing a
    /// step-by-step table of operations to `trace`. Program I/O is performed
    /// exactly as in a normal run.
    pub fn run_debug_with_control<R: Read, W: Write>(
        &mut self,
        mut input: R,
        mut output: W,
        trace: &mut dyn Write,
        step_control: &StepControl,
    ) -> Result<(), InterpreterError> {
        self.execute(&mut input, &mut output, Some(trace), Some(step_control))
    }

    /// Internal executor shared by every `run*` entry point. Output is flushed
    /// whether or not the run succeeds.
    fn execute<R: Read, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
        trace: Option<&mut dyn Write>,
        step_control: Option<&StepControl>,
    ) -> Result<(), InterpreterError> {
        self.tape = Tape::new();
        self.steps = 0;

        let result = self.interpret(input, output, trace, step_control);
        let flushed = output.flush();
        result?;
        flushed.map_err(|source| InterpreterError::IoError { ip: self.program.len(), source })
    }

    fn interpret<R: Read, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
        mut trace: Option<&mut dyn Write>,
        step_control: Option<&StepControl>,
    ) -> Result<(), InterpreterError> {
        let code_len = self.program.len();
        let mut code_ptr = 0;

        if let Some(t) = trace.as_mut() {
            write_trace_header(t).map_err(|source| InterpreterError::IoError { ip: 0, source })?;
        }

        while code_ptr < code_len {
            if let Some(ctrl) = step_control {
                if ctrl.cancel_flag.load(Ordering::Relaxed) {
                    return Err(InterpreterError::Canceled);
                }
                if let Some(max) = ctrl.max_steps {
                    if self.steps >= max {
                        return Err(InterpreterError::StepLimitExceeded { limit: max });
                    }
                }
            }

            let ip = code_ptr;
            let instr = self.program.as_bytes()[ip];
            let (pos_before, cell_before) = (self.tape.position(), self.tape.get_current());
            let mut action: Option<String> = if trace.is_some() { Some(String::new()) } else { None };

            match instr {
                b'>' => {
                    self.tape.move_right();
                    if let Some(a) = action.as_mut() { *a = format!("Moved head to cell {}", self.tape.position()); }
                }
                b'<' => {
                    self.tape.move_left();
                    if let Some(a) = action.as_mut() { *a = format!("Moved head to cell {}", self.tape.position()); }
                }
                b'+' => {
                    self.tape.increment();
                    if let Some(a) = action.as_mut() {
                        *a = format!("Increment cell[{}] from {} to {}", pos_before, cell_before, self.tape.get_current());
                    }
                }
                b'-' => {
                    self.tape.decrement();
                    if let Some(a) = action.as_mut() {
                        *a = format!("Decrement cell[{}] from {} to {}", pos_before, cell_before, self.tape.get_current());
                    }
                }
                b'.' => {
                    output
                        .write_all(&[cell_before])
                        .map_err(|source| InterpreterError::IoError { ip, source })?;
                    if let Some(a) = action.as_mut() { *a = format!("Output byte {}", cell_before); }
                }
                b',' => {
                    // Anything already written may be a prompt for this read.
                    output.flush().map_err(|source| InterpreterError::IoError { ip, source })?;
                    match read_byte(input).map_err(|source| InterpreterError::IoError { ip, source })? {
                        Some(b) => self.tape.set_current(b),
                        None => self.eof_policy.apply(&mut self.tape),
                    }
                    if let Some(a) = action.as_mut() { *a = format!("Read byte from input -> {}", self.tape.get_current()); }
                }
                b'[' => {
                    if cell_before == 0 {
                        let j = self.find_closing(ip)?;
                        if let Some(a) = action.as_mut() { *a = format!("Cell is 0; jump forward to matching ']' at IP {}", j); }
                        code_ptr = j;
                    } else if let Some(a) = action.as_mut() {
                        *a = "Enter loop (cell != 0)".to_string();
                    }
                }
                b']' => {
                    if cell_before != 0 {
                        let j = self.find_opening(ip)?;
                        if let Some(a) = action.as_mut() { *a = format!("Cell != 0; jump back to matching '[' at IP {}", j); }
                        code_ptr = j;
                    } else if let Some(a) = action.as_mut() {
                        *a = "Exit loop (cell is 0)".to_string();
                    }
                }
                _ => {
                    code_ptr += 1;
                    continue;
                }
            }

            if let (Some(t), Some(a)) = (trace.as_mut(), action) {
                writeln!(
                    t,
                    "{:<4} | {:<3} | {:<4} | {:<4} |  {}    | {}",
                    self.steps, ip, pos_before, cell_before, instr as char, a
                )
                .map_err(|source| InterpreterError::IoError { ip, source })?;
            }

            self.steps += 1;
            code_ptr += 1;
        }

        Ok(())
    }

    /// Partner of the `[` at `open`, scanning forward on first use.
    fn find_closing(&mut self, open: usize) -> Result<usize, InterpreterError> {
        if let Some(close) = self.jump_map[open] {
            return Ok(close);
        }
        let close = scan_forward(self.program.as_bytes(), open).ok_or(InterpreterError::UnmatchedBrackets {
            ip: open,
            kind: UnmatchedBracketKind::Open,
        })?;
        self.remember(open, close);
        Ok(close)
    }

    /// Partner of the `]` at `close`, scanning backward on first use.
    fn find_opening(&mut self, close: usize) -> Result<usize, InterpreterError> {
        if let Some(open) = self.jump_map[close] {
            return Ok(open);
        }
        let open = scan_backward(self.program.as_bytes(), close).ok_or(InterpreterError::UnmatchedBrackets {
            ip: close,
            kind: UnmatchedBracketKind::Close,
        })?;
        self.remember(open, close);
        Ok(open)
    }

    fn remember(&mut self, open: usize, close: usize) {
        self.jump_map[open] = Some(close);
        self.jump_map[close] = Some(open);
    }
}

/// Find the `]` matching the `[` at `open`. Only the two delimiters affect
/// nesting depth.
pub fn scan_forward(code: &[u8], open: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (i, &b) in code.iter().enumerate().skip(open + 1) {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Find the `[` matching the `]` at `close`.
pub fn scan_backward(code: &[u8], close: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (i, &b) in code[..close].iter().enumerate().rev() {
        match b {
            b']' => depth += 1,
            b'[' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn read_byte<R: Read>(input: &mut R) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match input.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

fn write_trace_header(trace: &mut dyn Write) -> io::Result<()> {
    writeln!(trace, "STEP | IP  | HEAD | CELL | INSTR | ACTION")?;
    writeln!(trace, "-----+-----+------+------+-------+------------------------------------------------")
}
