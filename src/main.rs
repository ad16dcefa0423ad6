fn main() -> anyhow::Result<()> {
    person_api::cli::run_cli()
}
