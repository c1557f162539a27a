// src/main.rs

use stepwise::{block_on, cli, demo, logging, run};

fn main() {
    if let Err(err) = block_on(run_main()).and_then(|result| result) {
        eprintln!("stepwise error: {err:#}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level, args.verbose)?;
    run(args, &demo::catalog()).await
}
