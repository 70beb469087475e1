fn main() -> anyhow::Result<()> {
    appsearch::cli::run()
}
