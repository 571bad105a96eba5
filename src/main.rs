fn main() -> anyhow::Result<()> {
    fragpipe_runner::run()
}
