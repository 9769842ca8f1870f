use clap::Parser;
use humidor::cli::{
    handle_cigar_add, handle_cigar_get, handle_cigar_list, handle_cigar_search, handle_init,
    handle_serve, handle_stats, handle_tasting_delete, handle_tasting_finalize,
    handle_tasting_get, handle_tasting_list, handle_tasting_start, handle_tasting_update,
    CigarAction, Cli, Commands, TastingAction,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("humidor=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => handle_init(),
        Commands::Cigar(cigar_cmd) => match cigar_cmd.action {
            CigarAction::Add {
                name,
                gauge,
                country,
                price,
                acquired,
                stock,
                json,
            } => handle_cigar_add(name, gauge, country, price, acquired, stock, json),
            CigarAction::List { json } => handle_cigar_list(json),
            CigarAction::Get { id, json } => handle_cigar_get(id, json),
            CigarAction::Search { query, json } => handle_cigar_search(query, json),
        },
        Commands::Tasting(tasting_cmd) => match tasting_cmd.action {
            TastingAction::Start {
                cigar_id,
                date,
                moment,
                cut,
                draw,
                band_leaf,
                json,
            } => handle_tasting_start(cigar_id, date, moment, cut, draw, band_leaf, json),
            TastingAction::Finalize {
                id,
                fields,
                flavors,
                json,
            } => handle_tasting_finalize(id, fields, flavors, json),
            TastingAction::Update {
                id,
                date,
                moment,
                cut,
                draw,
                band_leaf,
                fields,
                add_flavors,
                remove_flavors,
                status,
                json,
            } => handle_tasting_update(
                id,
                date,
                moment,
                cut,
                draw,
                band_leaf,
                fields,
                add_flavors,
                remove_flavors,
                status,
                json,
            ),
            TastingAction::Delete { id, force } => handle_tasting_delete(id, force),
            TastingAction::List { status, json } => handle_tasting_list(status, json),
            TastingAction::Get { id, json } => handle_tasting_get(id, json),
        },
        Commands::Stats { json } => handle_stats(json),
        Commands::Serve { bind } => handle_serve(bind),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
