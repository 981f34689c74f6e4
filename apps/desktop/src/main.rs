fn main() -> anyhow::Result<()> {
    study_desktop_lib::run()
}
