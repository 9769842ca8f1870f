use std::env;
use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

use super::commands::PhaseTwoArgs;
use crate::coerce::parse_date;
use crate::config::Project;
use crate::entity::{Cigar, Flavor, NewCigar, Tasting, TastingStatus, TastingView};
use crate::error::{HumidorError, Result};
use crate::http::{self, AppState};
use crate::input::{keys, FieldBag, FinalizeTasting, NewTasting, PhotoUpload, TastingPatch};
use crate::lifecycle::TastingEngine;
use crate::stats::compute_dashboard_stats;
use crate::storage::InventoryStore;

pub fn handle_init() -> Result<()> {
    let root = env::current_dir()?;
    let project = Project::init(&root)?;

    println!("Initialized humidor project in {}", root.display());
    println!("  database: {}", project.db_path().display());
    println!("  uploads:  {}", project.uploads_path().display());
    Ok(())
}

pub fn handle_cigar_add(
    name: String,
    gauge: Option<String>,
    country: Option<String>,
    price: Option<f64>,
    acquired: Option<String>,
    stock: i64,
    json: bool,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(HumidorError::validation("name required"));
    }
    let project = Project::discover()?;
    let store = project.open_store()?;

    let mut cigar = NewCigar::new(name, stock);
    cigar.gauge = gauge;
    cigar.country = country;
    cigar.price_paid = price;
    cigar.acquired_on = acquired.as_deref().map(parse_date).transpose()?;

    let cigar = store.insert_cigar(&cigar)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&cigar)?);
    } else {
        println!("Added cigar {:03} - {} (stock {})", cigar.id, cigar.name, cigar.stock);
    }
    Ok(())
}

pub fn handle_cigar_list(json: bool) -> Result<()> {
    let project = Project::discover()?;
    let store = project.open_store()?;
    print_cigars(&store.get_all_cigars()?, json)
}

pub fn handle_cigar_search(query: String, json: bool) -> Result<()> {
    let project = Project::discover()?;
    let store = project.open_store()?;
    print_cigars(&store.search_cigars(&query)?, json)
}

pub fn handle_cigar_get(id: i64, json: bool) -> Result<()> {
    let project = Project::discover()?;
    let store = project.open_store()?;
    let cigar = store
        .get_cigar_by_id(id)?
        .ok_or(HumidorError::CigarNotFound(id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cigar)?);
        return Ok(());
    }
    println!("Cigar {:03}", cigar.id);
    println!("Name: {}", cigar.name);
    if let Some(ref gauge) = cigar.gauge {
        println!("Gauge: {}", gauge);
    }
    if let Some(ref country) = cigar.country {
        println!("Country: {}", country);
    }
    if let Some(price) = cigar.price_paid {
        println!("Price: {:.2}", price);
    }
    if let Some(date) = cigar.acquired_on {
        println!("Acquired: {}", date);
    }
    println!("Stock: {}", cigar.stock);
    Ok(())
}

fn print_cigars(cigars: &[Cigar], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(cigars)?);
    } else if cigars.is_empty() {
        println!("No cigars found.");
    } else {
        println!("Cigars:\n");
        for c in cigars {
            let origin = c.country.as_deref().unwrap_or("-");
            println!("  {:03} {} [{}] stock:{}", c.id, c.name, origin, c.stock);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_tasting_start(
    cigar_id: String,
    date: Option<String>,
    moment: Option<String>,
    cut: Option<String>,
    draw: Option<String>,
    band_leaf: Option<String>,
    json: bool,
) -> Result<()> {
    let mut fields = FieldBag::new();
    fields.insert(keys::CIGAR_ID.to_string(), Value::String(cigar_id));
    put(&mut fields, keys::TASTING_DATE, date);
    put(&mut fields, keys::MOMENT, moment);
    put(&mut fields, keys::CUT, cut);
    put(&mut fields, keys::DRAW, draw);
    put(&mut fields, keys::BAND_LEAF, band_leaf);
    let input = NewTasting::from_fields(&fields)?;

    let project = Project::discover()?;
    let store = project.open_store()?;
    let photos = project.photo_store();
    let engine = TastingEngine::new(&store, &photos);

    let tasting = engine.create(input, None)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tasting)?);
    } else {
        println!(
            "Started tasting {:03} of cigar {:03} on {}",
            tasting.id, tasting.cigar_id, tasting.tasting_date
        );
    }
    Ok(())
}

pub fn handle_tasting_finalize(
    id: i64,
    args: PhaseTwoArgs,
    flavors: Vec<String>,
    json: bool,
) -> Result<()> {
    let mut fields = FieldBag::new();
    let photo = phase_two_fields(&mut fields, args)?;
    for name in &flavors {
        let flavor = parse_flavor(name)?;
        fields.insert(flavor.key().to_string(), Value::Bool(true));
    }
    let input = FinalizeTasting::from_fields(&fields)?;

    let project = Project::discover()?;
    let store = project.open_store()?;
    let photos = project.photo_store();
    let engine = TastingEngine::new(&store, &photos);

    let tasting = engine.finalize(id, input, photo)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tasting)?);
    } else {
        println!("Finalized tasting {:03}", tasting.id);
        print_phase_two(&tasting);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_tasting_update(
    id: i64,
    date: Option<String>,
    moment: Option<String>,
    cut: Option<String>,
    draw: Option<String>,
    band_leaf: Option<String>,
    args: PhaseTwoArgs,
    add_flavors: Vec<String>,
    remove_flavors: Vec<String>,
    status: Option<String>,
    json: bool,
) -> Result<()> {
    let mut fields = FieldBag::new();
    put(&mut fields, keys::TASTING_DATE, date);
    put(&mut fields, keys::MOMENT, moment);
    put(&mut fields, keys::CUT, cut);
    put(&mut fields, keys::DRAW, draw);
    put(&mut fields, keys::BAND_LEAF, band_leaf);
    put(&mut fields, keys::STATUS, status);
    let photo = phase_two_fields(&mut fields, args)?;
    for name in &add_flavors {
        fields.insert(parse_flavor(name)?.key().to_string(), Value::Bool(true));
    }
    for name in &remove_flavors {
        fields.insert(parse_flavor(name)?.key().to_string(), Value::Bool(false));
    }
    let patch = TastingPatch::from_fields(&fields)?;

    let project = Project::discover()?;
    let store = project.open_store()?;
    let photos = project.photo_store();
    let engine = TastingEngine::new(&store, &photos);

    let tasting = engine.update(id, patch, photo)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tasting)?);
    } else {
        println!("Updated tasting {:03} [{}]", tasting.id, tasting.status);
    }
    Ok(())
}

pub fn handle_tasting_delete(id: i64, force: bool) -> Result<()> {
    let project = Project::discover()?;
    let store = project.open_store()?;
    let photos = project.photo_store();
    let engine = TastingEngine::new(&store, &photos);

    let view = engine.get(id)?;

    // Confirm deletion unless --force is used
    if !force {
        eprintln!(
            "Delete tasting {:03} of {} on {}? [y/N] ",
            view.tasting.id,
            cigar_name(&view),
            view.tasting.tasting_date
        );

        if atty::is(atty::Stream::Stdin) {
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Cancelled.");
                return Ok(());
            }
        } else {
            eprintln!("Non-interactive mode: use --force to delete");
            return Ok(());
        }
    }

    engine.delete(id)?;
    println!("Deleted tasting {:03}", id);
    Ok(())
}

pub fn handle_tasting_list(status: Option<String>, json: bool) -> Result<()> {
    let status = status
        .as_deref()
        .map(str::parse::<TastingStatus>)
        .transpose()
        .map_err(HumidorError::Validation)?;

    let project = Project::discover()?;
    let store = project.open_store()?;
    let photos = project.photo_store();
    let engine = TastingEngine::new(&store, &photos);
    let views = engine.list(status)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else if views.is_empty() {
        println!("No tastings found.");
    } else {
        println!("Tastings:\n");
        for v in &views {
            let rating = v
                .tasting
                .rating
                .map(|r| format!(" {}/10", r))
                .unwrap_or_default();
            println!(
                "  {:03} {} [{}] {}{}",
                v.tasting.id,
                v.tasting.tasting_date,
                v.tasting.status,
                cigar_name(v),
                rating
            );
        }
    }
    Ok(())
}

pub fn handle_tasting_get(id: i64, json: bool) -> Result<()> {
    let project = Project::discover()?;
    let store = project.open_store()?;
    let photos = project.photo_store();
    let engine = TastingEngine::new(&store, &photos);
    let view = engine.get(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let t = &view.tasting;
    println!("Tasting {:03} of {}", t.id, cigar_name(&view));
    println!("Date: {}", t.tasting_date);
    println!("Status: {}", t.status);
    println!("Created: {}", t.created_at.format("%Y-%m-%d %H:%M"));
    for (label, value) in [
        ("Moment", &t.moment),
        ("Cut", &t.cut),
        ("Draw", &t.draw),
        ("Band leaf", &t.band_leaf),
    ] {
        if let Some(value) = value {
            println!("{}: {}", label, value);
        }
    }
    print_phase_two(t);
    Ok(())
}

pub fn handle_stats(json: bool) -> Result<()> {
    let project = Project::discover()?;
    let store = project.open_store()?;
    let stats = compute_dashboard_stats(&store)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Cigars in stock:    {}", stats.total_cigars);
    println!("Finalized tastings: {}", stats.total_tastings);
    println!("Average rating:     {:.1}", stats.average_rating);
    println!(
        "Favorite cigar:     {} ({})",
        stats.favorite_cigar.name, stats.favorite_cigar.count
    );
    println!("Flavors:");
    for (label, count) in &stats.flavor_frequency.0 {
        println!("  {:<10} {}", label, count);
    }
    Ok(())
}

pub fn handle_serve(bind: Option<String>) -> Result<()> {
    let project = Project::discover()?;
    let bind = bind.unwrap_or_else(|| project.config().bind.clone());
    let state = AppState::new(project.open_store()?, project.photo_store())
        .with_max_upload_bytes(project.config().max_upload_bytes);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(http::serve(state, &bind))
}

fn put(fields: &mut FieldBag, key: &str, value: Option<String>) {
    if let Some(value) = value {
        fields.insert(key.to_string(), Value::String(value));
    }
}

fn phase_two_fields(fields: &mut FieldBag, args: PhaseTwoArgs) -> Result<Option<PhotoUpload>> {
    put(fields, keys::DURATION, args.duration);
    put(fields, keys::RATING, args.rating);
    put(fields, keys::BURN, args.burn);
    put(fields, keys::WOULD_BUY_AGAIN, args.buy_again);
    put(fields, keys::NOTES, args.notes);
    put(fields, keys::BAND_NOTE, args.band_note);
    args.photo.as_deref().map(read_photo).transpose()
}

fn read_photo(path: &Path) -> Result<PhotoUpload> {
    let bytes = fs::read(path)?;
    let original_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(PhotoUpload {
        original_name,
        bytes,
    })
}

fn parse_flavor(name: &str) -> Result<Flavor> {
    name.parse().map_err(HumidorError::Validation)
}

fn cigar_name(view: &TastingView) -> String {
    view.cigar
        .as_ref()
        .map(|c| c.name.clone())
        .unwrap_or_else(|| format!("cigar {:03}", view.tasting.cigar_id))
}

fn print_phase_two(t: &Tasting) {
    if let Some(duration) = t.duration_minutes {
        println!("Duration: {} min", duration);
    }
    if let Some(rating) = t.rating {
        println!("Rating: {}/10", rating);
    }
    if let Some(ref burn) = t.burn {
        println!("Burn: {}", burn);
    }
    if let Some(ref again) = t.would_buy_again {
        println!("Would buy again: {}", again);
    }
    let flavors: Vec<String> = t.flavors.active().map(Flavor::label).collect();
    if !flavors.is_empty() {
        println!("Flavors: {}", flavors.join(", "));
    }
    if let Some(ref band_note) = t.band_note {
        println!("Band note: {}", band_note);
    }
    if let Some(ref photo) = t.band_photo {
        println!("Band photo: {}", photo);
    }
    if let Some(ref notes) = t.notes {
        println!("\n{}", notes);
    }
}
