use anyhow::Result;
use std::io;
use tinysh::config::{Args, Config};
use tinysh::Shell;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    let config = Config::from_args(args);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    info!("starting tinysh v{}", env!("CARGO_PKG_VERSION"));

    let mut shell = Shell::from_config(&config);
    shell.run()?;
    Ok(())
}
