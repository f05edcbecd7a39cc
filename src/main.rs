fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(error) = ndview::run_cli() {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
