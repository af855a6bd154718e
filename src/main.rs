use anyhow::Context;
use bulletin_tables::cli::{args::Args, commands};
use clap::Parser;
use std::process;

fn main() {
    let args = Args::parse();

    let result = commands::run(&args).with_context(|| format!("{:?} stage failed", args.command));

    match result {
        Ok(_summary) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
