#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bookvote::server::run().await
}
