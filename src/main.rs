use coin_flip::{
    config::{
        self,
        Command,
    },
    logging,
};
use color_eyre::eyre::Result;
use tracing::info;

mod client;
mod ui;

fn print_usage_and_exit() -> ! {
    println!("{}", config::USAGE);
    std::process::exit(0);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let config = match config::parse_args(std::env::args().skip(1))? {
        Command::Help => print_usage_and_exit(),
        Command::Run(config) => config,
    };
    let _guard = logging::init(&config.log_dir)?;
    info!(
        storage = ?config.storage,
        seed = ?config.seed,
        "starting coin flip"
    );
    client::run_app(config).await
}
