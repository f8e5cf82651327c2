fn main() {
    if let Err(err) = lens_compare::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
