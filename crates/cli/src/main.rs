//! search-bench CLI entry point.

fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = search_bench_cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
