use std::env;
use std::process;

use groundwork_core::GroundworkConfig;
use tracing_subscriber::EnvFilter;

mod commands;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = GroundworkConfig::load();

    match args.first().map(String::as_str) {
        Some("check") => commands::check(&config).await,
        Some("demo") => commands::demo(&config).await,
        Some("research") => match args.get(1) {
            Some(topic) => commands::research(&config, topic, &args[2..]).await,
            None => usage_exit("groundwork research \"<topic>\" [focus areas...]"),
        },
        Some("status") => match args.get(1) {
            Some(project) => commands::status(&config, project).await,
            None => usage_exit("groundwork status <project-name>"),
        },
        _ => {
            print_usage();
            process::exit(2);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("groundwork_core=info,groundwork=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn usage_exit(usage: &str) -> ! {
    eprintln!("usage: {usage}");
    process::exit(2);
}

fn print_usage() {
    eprintln!("groundwork: research a topic and seed a project from it");
    eprintln!();
    eprintln!("usage:");
    eprintln!("  groundwork check                               probe the MCP server and list its tools");
    eprintln!("  groundwork demo                                walk the MCP integration with a sample PRP");
    eprintln!("  groundwork research \"<topic>\" [focus areas]    search, write a PRP, seed the project");
    eprintln!("  groundwork status <project-name>               show a project's tasks and documentation");
    eprintln!();
    eprintln!("configuration comes from the environment (.env supported),");
    eprintln!("~/.groundwork/config.json, and a local .groundwork.json");
}
