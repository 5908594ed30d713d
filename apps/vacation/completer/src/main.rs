//! Vacation Completer - Entry Point
//!
//! Consumes the `vacation` topic and completes the job each record names.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    vacation_completer::run().await
}
