use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("Split an audio file at the time marks of a cut list")
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(
            "Each non-blank cut-list line reads '<minutes>:<seconds> <title>', e.g.\n  \
             0:00 Intro\n  \
             1:30 Chapter One",
        )
        .arg(
            Arg::new("cutlist")
                .short('c')
                .long("cutlist")
                .value_name("CUTLIST")
                .help("Path to the cut-list file")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("INPUT")
                .help("Path to the audio file to split")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT_DIR")
                .help("Directory where the segments will be written; created if missing")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Allow overwriting existing files in the output directory")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Preview the generated segments without writing files")
                .action(ArgAction::SetTrue),
        )
}
