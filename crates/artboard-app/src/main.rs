//! Main application entry point.

use clap::Parser;

fn main() {
    env_logger::init();
    log::debug!("Starting Artboard");

    let cli = artboard_app::Cli::parse();
    match artboard_app::run(cli) {
        Ok(output) => print!("{}", output),
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
