use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let code = genmovelog::main_entry().await?;
    std::process::exit(code)
}
