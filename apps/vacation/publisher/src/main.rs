//! Vacation Publisher - Entry Point
//!
//! Deploys the vacation process and publishes a record for every `put` job.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    vacation_publisher::run().await
}
