use std::process::ExitCode;

use seratosync::{Config, Orchestrator};

fn print_usage() {
    eprintln!("usage: seratosync <sync|report|clean> [--dedupe] [--require-metadata]");
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .parse_lossy("seratosync=info"),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().cloned() else {
        print_usage();
        return ExitCode::FAILURE;
    };

    let remove_duplicates = args.iter().any(|a| a == "--dedupe");
    let require_metadata = args.iter().any(|a| a == "--require-metadata");

    let config = Config::load();
    let orchestrator = Orchestrator::new(config);

    let result = tokio::task::spawn_blocking(move || match command.as_str() {
        "sync" => orchestrator.sync_library().map(|s| s.to_string()),
        "report" => orchestrator.generate_report(),
        "clean" => orchestrator
            .clean_database(remove_duplicates, require_metadata)
            .map(|s| s.to_string()),
        other => {
            eprintln!("unknown command: {other}");
            print_usage();
            std::process::exit(2);
        }
    })
    .await
    .expect("orchestrator task panicked");

    match result {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("seratosync: {e}");
            ExitCode::FAILURE
        }
    }
}
