use colored::Colorize;
use shape_schema::{cli, telemetry};

fn main() {
    let command_line_interface = cli::CommandLineInterface::load();
    if let Err(error) = telemetry::init_tracing(command_line_interface.verbosity()) {
        eprintln!("{} {error}", "warning:".yellow().bold());
    }
    if let Err(error) = command_line_interface.run() {
        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
