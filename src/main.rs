use meditrack_lib::config::ServerConfig;

#[tokio::main]
async fn main() {
    meditrack_lib::init_tracing();

    let config = ServerConfig::from_env();
    if let Err(e) = meditrack_lib::run(config).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
