use nodelink_cli_lib::{args::parse_args, runner::run};
use nodelink_core::{error, info, log::init_logger};

#[tokio::main]
async fn main() {
    let args = parse_args();
    if let Err(err) = init_logger(args.logdir.as_deref(), &args.log_level) {
        eprintln!("unable to set up the logger: {err}");
        std::process::exit(1);
    }

    if let Err(err) = run(args).await {
        error!("{}", err);
        std::process::exit(1);
    }
    info!("nodelink has stopped...");
}
