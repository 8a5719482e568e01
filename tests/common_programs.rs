use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::time::Duration;

const HELLO_WORLD: &str = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";

fn cargo_bin() -> Command { Command::cargo_bin("bf").unwrap() }

fn program_file(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}

#[test]
fn hello_world_from_file_prints_exactly_thirteen_bytes() {
    let tf = program_file(HELLO_WORLD);
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg(tf.path())
        .assert()
        .success()
        .stdout("Hello World!\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn hello_world_from_stdin() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .write_stdin(HELLO_WORLD)
        .assert()
        .success()
        .stdout("Hello World!\n");
}

#[test]
fn comments_and_newlines_are_ignored() {
    let tf = program_file("This program prints capital A\n++++++++[>++++++++<-]>+ .\nDone\n");
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg(tf.path())
        .assert()
        .success()
        .stdout("A");
}

#[test]
fn cat_program_echoes_stdin() {
    let tf = program_file(",[.,]");
    let input = "line one\nline two\n\tlast";
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg(tf.path())
        .write_stdin(input)
        .assert()
        .success()
        .stdout(input);
}

#[test]
fn long_excursions_in_both_directions() {
    let code = format!(
        "+++++{l}{r}.{r}{l}.",
        l = "<".repeat(1000),
        r = ">".repeat(1000)
    );
    let tf = program_file(&code);
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg(tf.path())
        .assert()
        .success()
        .stdout("\u{5}\u{5}");
}
