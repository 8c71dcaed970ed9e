use clap::Parser;

fn main() {
    let cli = peakplanctl::Cli::parse();
    peakplanctl::init_tracing(cli.verbose);
    if let Err(err) = peakplanctl::run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
