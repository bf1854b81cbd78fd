use forgepatch::cli::{self, Cli};
use forgepatch::ui::{logging, output};

fn main() {
    let cli = Cli::parse_args();
    logging::init_logging(output::Verbosity::from_flags(cli.quiet, cli.debug));

    if let Err(err) = cli::run(cli) {
        output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
