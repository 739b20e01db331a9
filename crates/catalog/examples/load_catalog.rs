//! Load the sample catalog and print what was indexed.
//!
//! Run with: cargo run --package catalog --example load_catalog

use catalog::CatalogIndex;
use std::path::Path;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let data_dir = Path::new("data/catalog");

    println!("Loading film catalog...\n");

    let start = Instant::now();
    let index = CatalogIndex::load_from_files(data_dir)?;
    let elapsed = start.elapsed();

    let (films, actors, comments) = index.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Films: {}", films);
    println!("Actors: {}", actors);
    println!("Comments: {}", comments);

    let mut genres = index.genre_names();
    genres.sort_unstable();
    println!("Genres: {}", genres.join(", "));

    Ok(())
}
