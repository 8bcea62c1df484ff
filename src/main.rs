use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser as ClapParser;

use rox::{Lox, Mode};

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for the Lox language", long_about = None)]
struct Cli {
    /// Script to execute; starts an interactive session when omitted.
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = Cli::parse();

    match args.script {
        Some(path) => run_file(&path),

        None => run_prompt(),
    }
}

fn run_file(path: &Path) -> anyhow::Result<()> {
    let source: Vec<u8> = fs::read(path)?;

    let mut stdout = io::stdout();
    let mut lox = Lox::new(&mut stdout);

    lox.run(&source, Mode::File);

    if lox.had_error() {
        process::exit(65);
    }

    if lox.had_runtime_error() {
        process::exit(70);
    }

    Ok(())
}

fn run_prompt() -> anyhow::Result<()> {
    let mut output = io::stdout();
    let mut lox = Lox::new(&mut output);

    let stdin = io::stdin();
    let mut line = String::with_capacity(1024);

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();

        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF (ctrl-D): leave the session.
            break;
        }

        lox.run(line.as_bytes(), Mode::Repl);
        lox.reset_error();
    }

    Ok(())
}
