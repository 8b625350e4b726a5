//! Replay CLI entry point.

fn main() {
    env_logger::init();
    log::info!("Starting inkslate-replay");

    if let Err(error) = inkslate_replay::run(std::env::args_os()) {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
