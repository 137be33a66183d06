fn main() {
    if let Err(err) = csv2psql::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
