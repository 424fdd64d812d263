use xledger::server::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일과 환경 변수 로드
    dotenv::dotenv().ok();
    env_logger::init();

    let config = ServerConfig::from_env();
    start_server(config).await
}
