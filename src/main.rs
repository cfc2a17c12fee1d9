use clap::Parser;

use claimreel::cli::Cli;
use claimreel::commands::handle_command;
use claimreel::ui::{self, prelude::*};

fn main() {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    ui::init(format, !cli.no_color);
    ui::set_debug_mode(cli.debug);

    match handle_command(&cli) {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            emit(Level::Error, "reel.error", &format!("Error: {err:#}"), None);
            std::process::exit(1);
        }
    }
}
