use pyroscan_server::config::ServerConfig;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pyroscan_server::init_tracing();

    let config = ServerConfig::from_env()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let gen_models = args.iter().any(|a| a == "--gen-models");
    let run = args.iter().any(|a| a == "--run");

    if gen_models {
        let written = pyroscan_models::generate_demo_models(&config.models_dir)?;
        for (name, path) in &written {
            tracing::info!("Generated demo model {}: {}", name, path.display());
        }
    }

    if run || !gen_models {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(pyroscan_server::run_server(config))?;
    }
    Ok(())
}
