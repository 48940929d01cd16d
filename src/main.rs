// src/main.rs

use interact::present::{Presenter, colored};
use interact::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    let no_color = args.no_color;

    if let Err(err) = run_main(args).await {
        let message = err.to_string();
        if no_color {
            println!("{message}");
        } else {
            println!("{}", colored(&message, Presenter::default().error_color()));
        }
        std::process::exit(1);
    }
}

async fn run_main(args: cli::CliArgs) -> anyhow::Result<()> {
    logging::init_logging(args.log_level)?;
    // Session failures were already reported in the transcript; only
    // problems that prevented a session from running reach this point.
    run(args).await?;
    Ok(())
}
