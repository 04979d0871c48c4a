#![allow(clippy::print_stderr)]
#![allow(clippy::implicit_return)]
#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::question_mark_used)]
#![allow(clippy::struct_excessive_bools)]

#[cfg(not(any(target_os = "linux", target_os = "android")))]
compile_error!("lsdirs reads directories with getdents64 and only builds for Linux and Android");

use clap::{ArgAction, CommandFactory, Parser, ValueHint, value_parser};
use clap_complete::aot::{Shell, generate};
use lsdirs::{THREAD_COUNT, WalkError, Walker};
use std::collections::{BTreeSet, HashSet};
use std::io::stdout;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod printer;
use printer::write_dirs;

#[cfg(all(feature = "mimalloc", any(target_os = "linux", target_os = "android")))]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"), about = "List sub-directories using raw getdents64")]
pub struct Args {
    #[arg(
        value_name = "PATH",
        help = "Directory to list",
        value_hint = ValueHint::DirPath,
        default_value = ".",
        index = 1
    )]
    directory: PathBuf,

    #[arg(short = 'r', long = "recursive", help = "Descend into every directory found")]
    recursive: bool,

    #[arg(
        short = 'j',
        long = "threads",
        default_value_t = THREAD_COUNT,
        help = "Worker threads for a recursive walk, defaults to available threads"
    )]
    threads: usize,

    #[arg(
        long = "resolve-unknown",
        help = "fstatat entries whose type the filesystem doesn't report"
    )]
    resolve_unknown: bool,

    #[arg(short = 's', long = "sort", help = "Print in sorted order")]
    sort: bool,

    #[arg(short = 'a', long = "absolute", help = "Prefix every result with PATH made absolute")]
    absolute: bool,

    #[arg(
        short = '0',
        long = "print0",
        help = "Terminate results with NUL instead of newline"
    )]
    print0: bool,

    #[arg(short = 'v', long = "verbose", help = "Log debug output to stderr")]
    verbose: bool,

    #[arg(
        long = "generate",
        action = ArgAction::Set,
        value_parser = value_parser!(Shell),
        help = "Generate shell completions"
    )]
    generate: Option<Shell>,
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("lsdirs=debug")
        } else {
            EnvFilter::new("lsdirs=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), WalkError> {
    let args = Args::parse();

    if let Some(generator) = args.generate {
        let mut cmd = Args::command();
        let name = cmd.get_name().to_owned();
        generate(generator, &mut cmd, name, &mut stdout());
        return Ok(());
    }

    setup_logging(args.verbose);

    let walker = Walker::init(&args.directory)
        .recursive(args.recursive)
        .resolve_unknown(args.resolve_unknown)
        .threads(args.threads)
        .build();

    let base = args
        .absolute
        .then(|| std::path::absolute(walker.root()).unwrap_or_else(|_| walker.root().to_path_buf()));

    if args.sort {
        let mut found = BTreeSet::new();
        walker.walk_into(&mut found)?;
        write_dirs(&found, base.as_deref(), args.print0)
    } else {
        let found: HashSet<PathBuf> = walker.walk()?;
        write_dirs(&found, base.as_deref(), args.print0)
    }
}
