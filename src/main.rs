use std::process::ExitCode;

use review_stats::{run, Args};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();
    let args = match Args::parse(std::env::args()) {
        Ok(args) => args,
        Err(usage) => {
            println!("{usage}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = run(&args).await {
        eprintln!("Error: {err:?}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
