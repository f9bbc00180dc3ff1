//! chat-db - ask natural-language questions about a relational database.

use std::sync::Arc;

use anyhow::Context;
use chat_db::cli::Cli;
use chat_db::config::Config;
use chat_db::connection::ConnectionManager;
use chat_db::db::{Connector, MockConnector, SqlxConnector};
use chat_db::llm::{create_client, Gateway};
use chat_db::logging;
use chat_db::pipeline::QueryPipeline;
use chat_db::repl::Repl;
use chat_db::session::Session;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // .env values feed the environment fallbacks in the config layer
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init(cli.log_stderr);

    if let Err(e) = run(cli).await {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    cli.apply_to(&mut config);

    let store = config.credential_store()?;
    let connector: Arc<dyn Connector> = if cli.mock_db {
        info!("Using mock database connector");
        Arc::new(MockConnector::new())
    } else {
        Arc::new(SqlxConnector)
    };
    let manager =
        ConnectionManager::new(connector, store).with_sample_rows(config.schema.sample_rows);

    let gateway = Gateway::new(create_client(&config.llm)?);
    info!("Using model: {}", gateway.model_name());
    let pipeline = QueryPipeline::new(gateway)
        .with_prompts(config.prompts()?)
        .with_read_only(config.safety.read_only);

    let mut repl = Repl::new(Session::new(manager, pipeline), std::io::stdout());
    repl.start(cli.url.clone()).await?;
    repl.run(tokio::io::BufReader::new(tokio::io::stdin())).await?;
    Ok(())
}
