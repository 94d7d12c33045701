// blkscan - block file decoder CLI

use blkscan::{Cli, CliHandler};
use clap::Parser;

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let handler = CliHandler::new(cli.network, cli.datadir, cli.index);

    if let Err(e) = handler.handle(cli.command).await {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
