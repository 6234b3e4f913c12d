use std::fs;

use clap::Parser;
use miette::{IntoDiagnostic, NamedSource};

mod cli;

fn main() -> miette::Result<()> {
    let args = cli::Args::parse();

    let source = fs::read_to_string(&args.input_file).into_diagnostic()?;
    let input_file = args.input_file.display().to_string();

    match run(&args, &source) {
        Ok(()) => Ok(()),
        // The first error aborts the compilation; attach the source so the
        // report can render the offending lines.
        Err(report) => Err(report.with_source_code(NamedSource::new(input_file, source))),
    }
}

fn run(args: &cli::Args, source: &str) -> miette::Result<()> {
    let program = silt::parse(source)?;

    if args.mode == cli::Mode::Parse {
        program.pretty_print().into_diagnostic()?;
        return Ok(());
    }

    let mut root = silt::lower(program)?;
    silt::type_check(&mut root)?;
    let program = silt::generate(&root);

    if args.verbose {
        println!("============");
        println!("GENERATED IR");
        println!("============");
        print!("{program}");
    }

    fs::write("out.ir", program.to_string()).into_diagnostic()?;
    Ok(())
}
