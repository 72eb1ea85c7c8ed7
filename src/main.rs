use std::process::ExitCode;
use std::time::SystemTime;

use clap::Parser;

use xlevel_align::cli::Cli;
use xlevel_align::io::input::{read_data_input, read_vertex_input};
use xlevel_align::io::output::write_scores;
use xlevel_align::{align_all, build_edge_matrices, ingest};

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = cli.validate() {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), xlevel_align::error::AppError> {
    let start_time = SystemTime::now();

    let data_rows = read_data_input(&cli.data_input)?;
    log::info!("data input: {} rows", data_rows.len());

    let vertex_rows = cli
        .vertex_input
        .as_ref()
        .map(|path| read_vertex_input(path))
        .transpose()?;

    let ingested = ingest(data_rows, vertex_rows, cli.entity_diff.as_deref())?;
    log::info!(
        "ingested {} entities across {} levels in {} ms",
        ingested.registry.len(),
        ingested.levels.len(),
        millis_since(start_time)
    );

    let edges = build_edge_matrices(&ingested.levels);
    log::info!("built edge-similarity matrices for {} levels", edges.len());

    let scores = align_all(&ingested, &edges, cli)?;
    log::info!(
        "alignment finished in {} ms total",
        millis_since(start_time)
    );

    let stdout = std::io::stdout();
    write_scores(stdout.lock(), &ingested.registry, &scores)?;
    Ok(())
}

fn millis_since(start: SystemTime) -> u128 {
    start.elapsed().unwrap_or_default().as_millis()
}
