#![doc = include_str!("../README.md")]

/// CLI module - command-line admin for surus
mod cli;

fn main() {
    cli::run_cli();
}
