fn main() {
    if let Err(e) = authui::cli::run() {
        eprintln!("{e:#}"); // pretty anyhow chain
        std::process::exit(1);
    }
}
