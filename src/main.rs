mod cli;

use clap::Parser;
use cli::{Cli, Commands, OutputFormat};
use colored::*;
use ndc340b::{
    eligibility::{DrugIdentifier, EligibilityResult, RelatedNdcs},
    error,
    server::{self, DrugToolServer},
    utils, Bootstrap, Config, DrugService,
};
use serde::Serialize;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // stdout carries the stdio transport, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ndc340b=info,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match Config::load_from(cli.config.as_deref().map(Path::new)) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let command = cli.command.unwrap_or(Commands::Serve { port: None });
    if let Commands::Serve { port: Some(port) } = &command {
        config.server.port = Some(*port);
    }

    let result = run(command, config, cli.format).await;

    if let Err(e) = result {
        if e.is_startup_fatal() {
            error!("Failed to initialize NDC cache: {}", e);
        }
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: Config, format: OutputFormat) -> error::Result<()> {
    let bootstrap = Bootstrap::new(config.clone())?;

    if let Commands::Ingest = command {
        return ingest(&bootstrap, format).await;
    }

    // Only commands that read the table wait for the download
    let service = if command.needs_cache() {
        bootstrap.activate().await?
    } else {
        bootstrap.without_cache()
    };

    match command {
        Commands::Serve { .. } => serve(service, &config).await,

        Commands::Check { ndc, rxcui, name } => {
            let id = DrugIdentifier::new(ndc.as_deref(), rxcui.as_deref(), name.as_deref());
            let result = service.check_eligibility(&id).await?;
            print_output(&result, format, print_eligibility)
        }

        Commands::Related { ndc, rxcui, name } => {
            let id = DrugIdentifier::new(ndc.as_deref(), rxcui.as_deref(), name.as_deref());
            let related = service.related_ndcs(&id).await?;
            print_output(&related, format, print_related)
        }

        Commands::Info { rxcui } => {
            let info = service.rx_info(&rxcui).await?;
            print_output(&info, format, |info| match info {
                Some(details) => {
                    println!("{}", "=== RxTerms Details ===".cyan().bold());
                    println!("RxCUI:        {}", details.rxcui);
                    println!("Display Name: {}", details.display_name);
                    println!("Brand Name:   {}", details.brand_name);
                    println!("Full Name:    {}", details.full_name);
                    println!("Strength:     {}", details.strength);
                    println!("Term Type:    {}", details.term_type);
                }
                None => println!("{}", format!("No RxTerms details for {}", rxcui).yellow()),
            })
        }

        Commands::Match { term, max_entries } => {
            let matches = service.approximate_match(&term, max_entries).await?;
            print_output(&matches, format, |matches| {
                if matches.is_empty() {
                    println!("{}", "No matches found".yellow());
                    return;
                }
                utils::print_table_border(70);
                utils::print_table_row(&["Name", "RxCUI", "Score"], &[48, 10, 8]);
                utils::print_table_border(70);
                for candidate in matches {
                    utils::print_table_row(
                        &[&candidate.name, &candidate.rxcui, &candidate.score],
                        &[48, 10, 8],
                    );
                }
                utils::print_table_border(70);
            })
        }

        Commands::BatchMatch { names } => {
            let summary = service.batch_approximate(&names).await;
            print_output(&summary, format, |summary| {
                utils::print_table_border(100);
                utils::print_table_row(&["Input", "Match", "RxCUI", "Score", "Error"], &[24, 36, 10, 8, 16]);
                utils::print_table_border(100);
                for item in &summary.results {
                    utils::print_table_row(
                        &[&item.original_name, &item.found_name, &item.rxcui, &item.score, &item.error],
                        &[24, 36, 10, 8, 16],
                    );
                }
                utils::print_table_border(100);
                println!("Processed: {}", summary.total_processed);
                println!("Success:   {:.1}%", summary.success_rate());
            })
        }

        Commands::BatchCheck { ndcs } => {
            let summary = service.batch_eligibility(&ndcs).await;
            print_output(&summary, format, |summary| {
                utils::print_table_border(100);
                utils::print_table_row(&["NDC", "340B", "Drug", "Manufacturer", "Error"], &[14, 5, 30, 24, 16]);
                utils::print_table_border(100);
                for item in &summary.results {
                    let flag = if item.is_340b { "yes" } else { "no" };
                    utils::print_table_row(
                        &[&item.ndc, flag, &item.drug_name, &item.manufacturer, &item.error],
                        &[14, 5, 30, 24, 16],
                    );
                }
                utils::print_table_border(100);
                println!("Processed: {}", summary.total_processed);
                println!("Success:   {:.1}%", summary.success_rate());
                println!("Cache:     {}", service.cache().describe());
            })
        }

        Commands::Ingest => Ok(()),
    }
}

async fn serve(service: DrugService, config: &Config) -> error::Result<()> {
    let server = DrugToolServer::new(service, &config.server);

    match config.http_address() {
        Some(address) => server::http::serve_http(server, &address).await,
        None => server::serve_stdio(server).await,
    }
}

async fn ingest(bootstrap: &Bootstrap, format: OutputFormat) -> error::Result<()> {
    info!("Downloading NDC spreadsheet...");
    let snapshot = bootstrap.dry_run_ingest().await?;

    if format == OutputFormat::Json {
        let value = serde_json::json!({
            "records": snapshot.records,
            "eligible": snapshot.eligible,
            "loaded_at": snapshot.loaded_at,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "=== NDC Spreadsheet ===".cyan().bold());
    println!("Records:   {}", snapshot.records);
    println!("Eligible:  {}", snapshot.eligible.to_string().green());
    println!("Parsed at: {}", utils::format_timestamp(&snapshot.loaded_at));
    Ok(())
}

fn print_output<T: Serialize>(value: &T, format: OutputFormat, table: impl FnOnce(&T)) -> error::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Table => table(value),
    }
    Ok(())
}

fn print_eligibility(result: &EligibilityResult) {
    println!("{}", "=== 340B Eligibility ===".cyan().bold());
    println!("Status: {}", utils::format_eligible(result.eligible));
    println!("Cache:  {}", result.cache_info);

    if let Some(related) = &result.related_ndcs {
        print_related(related);
    }

    if !result.matched_records.is_empty() {
        println!("\n{}", "Eligible NDCs:".yellow());
        utils::print_table_border(90);
        utils::print_table_row(&["NDC", "Drug", "Strength", "Manufacturer"], &[14, 32, 12, 24]);
        utils::print_table_border(90);
        for record in &result.matched_records {
            let strength = format!("{} {}", record.strength, record.unit_of_measure);
            utils::print_table_row(
                &[&record.ndc, &record.drug_name, strength.trim(), &record.manufacturer],
                &[14, 32, 12, 24],
            );
        }
        utils::print_table_border(90);
    }
}

fn print_related(related: &RelatedNdcs) {
    match related {
        RelatedNdcs::NameSearch { rxcui_search } => {
            println!("Name search: {}", utils::truncate(rxcui_search, 200));
        }
        _ => {
            let ndcs: Vec<&str> = related.candidates().collect();
            println!("Related NDCs ({}):", ndcs.len());
            for ndc in ndcs {
                println!("  {}", ndc);
            }
        }
    }
}

