fn main() -> anyhow::Result<()> {
    symptom_journal::cli::run()
}
