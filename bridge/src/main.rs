mod device;
mod dispatch;
mod host;
mod ingest;
mod shutdown;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
