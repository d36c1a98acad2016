use cfront::config::{Config, DirectivePolicy};
use cfront::utils::compilation::Compilation;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[clap(about, long_about = None)]
struct Args {
    /// Report preprocessor directives instead of skipping them
    #[clap(long, value_parser)]
    reject_directives: bool,

    /// Do not pre-declare the functions of included standard headers
    #[clap(long, value_parser)]
    no_builtins: bool,

    /// Allow calls to functions defined later in the file
    #[clap(long, value_parser)]
    forward_calls: bool,

    #[clap(value_parser)]
    input_source_files: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    if args.input_source_files.is_empty() {
        eprintln!("Error: at least one source file has to be provided");
        return ExitCode::from(2);
    }

    let config = Config {
        directives: if args.reject_directives {
            DirectivePolicy::Reject
        } else {
            DirectivePolicy::Skip
        },
        builtins: !args.no_builtins,
        forward_calls: args.forward_calls,
    };
    let compilation = Compilation::with_config(config);

    let mut sources = vec![];
    for filename in &args.input_source_files {
        match Compilation::read_source(Path::new(filename)) {
            Ok(source) => sources.push(source),
            Err(err) => {
                eprintln!("Error: {}", err);
                return ExitCode::from(2);
            }
        }
    }

    let mut accepted = true;
    let analyses = compilation.analyze_all(&sources);
    for (filename, analysis) in args.input_source_files.iter().zip(&analyses) {
        for diagnostic in &analysis.diagnostics {
            println!("{}:{}", filename, diagnostic);
        }
        accepted &= analysis.is_accepted();
    }

    if accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
