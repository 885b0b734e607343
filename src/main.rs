fn main() {
    if let Err(e) = prgsketch::main() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
