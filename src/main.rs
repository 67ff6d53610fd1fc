// Findash - Financial Dashboard Backend

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = findash_lib::config::AppConfig::load()?;
    findash_lib::run(config).await
}
