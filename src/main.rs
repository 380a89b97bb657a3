use env_logger::Env;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    if let Err(e) = jstack_lens::cli::run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
