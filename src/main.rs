use anyhow::Result;

use lsw3_bridge::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    lsw3_bridge::run(Options::new()).await
}
