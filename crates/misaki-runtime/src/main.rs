//! Invocation shim: read one JSON event from stdin, answer it, write the
//! response envelope to stdout.

use misaki_runtime::Handler;
use std::io::Read;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("misaki_runtime=info".parse().unwrap()),
        )
        .init();

    let handler = Handler::from_env().await?;

    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    let event: serde_json::Value = serde_json::from_str(raw.trim())?;

    let response = handler.handle(&event).await;
    println!("{response}");

    Ok(())
}
