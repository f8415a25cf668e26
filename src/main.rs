fn main() {
    if let Err(e) = colonaive_lib::run() {
        eprintln!("colonaive: {e}");
        std::process::exit(1);
    }
}
