//! Kryon command-line entry point.

fn main() -> anyhow::Result<()> {
    kryon_encoder::cli::run()
}
