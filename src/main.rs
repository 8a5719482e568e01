use bfa::commands::run::{self, RunArgs};
use clap::Parser;
use std::env;

/// Run a Brainfuck program read from FILE or, when omitted, from stdin.
#[derive(Parser, Debug)]
#[command(name = "bf", version, about)]
struct Cli {
    #[command(flatten)]
    args: RunArgs,
}

fn main() {
    // Diagnostics are prefixed with the name we were invoked as
    let program = env::args().next().unwrap_or_else(|| String::from("bf"));
    let program = std::path::Path::new(&program)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("bf")
        .to_string();

    let cli = Cli::parse();
    let code = run::run(&program, cli.args);

    std::process::exit(code);
}
