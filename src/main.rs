fn main() {
    if let Err(err) = supply_chain_insights::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
