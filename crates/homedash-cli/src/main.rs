//! Thin entrypoint delegating to the library crate.

#[tokio::main]
async fn main() {
    std::process::exit(homedash_cli::run().await);
}
