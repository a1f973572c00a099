fn main() -> anyhow::Result<()> {
    community_events_lib::run()
}
