use clap::Parser;

use vrmtex_app::{AppError, Cli};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::debug!("vrmtex v{}", vrmtex_app::VERSION);

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(AppError::Runtime)
        .and_then(|runtime| runtime.block_on(vrmtex_app::run(cli)));

    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}
