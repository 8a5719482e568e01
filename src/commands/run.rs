use clap::Args;
use std::env;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cli_util::Diagnostics;
use crate::loader::{load, load_path};
use crate::reader::{EofPolicy, StepControl};
use crate::{Interpreter, InterpreterError};

/// Environment fallback for `--eof`.
pub const EOF_ENV: &str = "BF_EOF";
/// Environment fallback for `--max-steps`.
pub const MAX_STEPS_ENV: &str = "BF_MAX_STEPS";

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Program file; the program is read from stdin when omitted
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Trace every executed instruction to stderr
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Value stored by ',' at end of input (fallback BF_EOF; default zero)
    #[arg(long = "eof", value_name = "POLICY", value_enum)]
    pub eof: Option<EofPolicy>,

    /// Maximum interpreter steps before abort (fallback BF_MAX_STEPS; default unlimited)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<usize>,
}

/// Execution settings after resolving flags -> env -> defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub eof: EofPolicy,
    pub max_steps: Option<usize>,
}

impl Settings {
    /// Resolve settings, consulting `lookup` for any value not given as a flag.
    pub fn resolve<F>(args: &RunArgs, lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let eof = match args.eof {
            Some(policy) => policy,
            None => match lookup(EOF_ENV) {
                Some(val) => val.parse::<EofPolicy>().map_err(|e| format!("{EOF_ENV}: {e}"))?,
                None => EofPolicy::default(),
            },
        };

        let max_steps = match args.max_steps {
            Some(n) => Some(n),
            None => match lookup(MAX_STEPS_ENV) {
                Some(val) => Some(val.trim().parse::<usize>().map_err(|_| {
                    format!("invalid {MAX_STEPS_ENV} value: {val}, must be a non-negative integer")
                })?),
                None => None,
            },
        };

        Ok(Self { eof, max_steps })
    }
}

/// Load the program, run it against stdin/stdout and return the exit code.
pub fn run(program: &str, args: RunArgs) -> i32 {
    let diag = Diagnostics::new(program);

    let settings = match Settings::resolve(&args, |key| env::var(key).ok()) {
        Ok(s) => s,
        Err(msg) => {
            diag.error(&msg);
            return 2;
        }
    };

    let loaded = match &args.file {
        Some(path) => load_path(path),
        None => load(io::stdin().lock()),
    };
    let code = match loaded {
        Ok(code) => code,
        Err(e) => {
            diag.load_error(&e);
            return 1;
        }
    };

    let cancel = Arc::new(AtomicBool::new(false));
    if let Err(e) = install_interrupt_handler(cancel.clone()) {
        diag.error(&format!("failed to set ctrl+c handler: {e}"));
        return 1;
    }

    let mut bf = Interpreter::new(code).with_eof_policy(settings.eof);
    let ctrl = StepControl::new(settings.max_steps, cancel);

    let stdin = io::stdin();
    let input = stdin.lock();
    let output = BufWriter::new(io::stdout().lock());

    let result = if args.debug {
        let mut trace = io::stderr().lock();
        bf.run_debug_with_control(input, output, &mut trace, &ctrl)
    } else {
        bf.run_with_control(input, output, &ctrl)
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            diag.interpreter_error(bf.program().as_bytes(), &err, args.debug);
            match err {
                InterpreterError::Canceled => 130,
                _ => 1,
            }
        }
    }
}

/// First ctrl+c asks the interpreter to stop at the next instruction; a second
/// one exits immediately (e.g. while blocked reading stdin).
fn install_interrupt_handler(cancel: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        if interrupt_requests_exit(&cancel) {
            // The main thread may hold the stdout/stderr locks; never take them
            // here. `process::exit` only try-locks stdout when flushing.
            std::process::exit(130);
        }
    })
}

/// Raise the cancel flag. True when it was already raised.
fn interrupt_requests_exit(cancel: &AtomicBool) -> bool {
    cancel.swap(true, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn second_interrupt_requests_exit() {
        let cancel = AtomicBool::new(false);
        assert!(!interrupt_requests_exit(&cancel));
        assert!(cancel.load(Ordering::Relaxed));
        assert!(interrupt_requests_exit(&cancel));
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let settings = Settings::resolve(&RunArgs::default(), env_of(&[])).unwrap();
        assert_eq!(settings, Settings { eof: EofPolicy::Zero, max_steps: None });
    }

    #[test]
    fn env_is_used_when_flags_are_absent() {
        let settings = Settings::resolve(
            &RunArgs::default(),
            env_of(&[(EOF_ENV, "unchanged"), (MAX_STEPS_ENV, " 500 ")]),
        )
        .unwrap();
        assert_eq!(settings, Settings { eof: EofPolicy::Unchanged, max_steps: Some(500) });
    }

    #[test]
    fn flags_override_env() {
        let args = RunArgs { eof: Some(EofPolicy::Max), max_steps: Some(7), ..RunArgs::default() };
        let settings =
            Settings::resolve(&args, env_of(&[(EOF_ENV, "zero"), (MAX_STEPS_ENV, "9")])).unwrap();
        assert_eq!(settings, Settings { eof: EofPolicy::Max, max_steps: Some(7) });
    }

    #[test]
    fn invalid_env_values_are_reported() {
        let err = Settings::resolve(&RunArgs::default(), env_of(&[(EOF_ENV, "maybe")])).unwrap_err();
        assert!(err.starts_with("BF_EOF: invalid EOF policy"));

        let err = Settings::resolve(&RunArgs::default(), env_of(&[(MAX_STEPS_ENV, "-3")])).unwrap_err();
        assert!(err.contains("BF_MAX_STEPS"));
    }
}
