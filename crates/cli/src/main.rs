use anyhow::{Context, Result, bail};
use catalog::{ActorId, CatalogIndex, FilmId, FilmSummary};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use search::{Page, RawSearchRequest};
use server::{CatalogService, Storage};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Films - film catalog explorer
#[derive(Parser)]
#[command(name = "films")]
#[command(about = "Search and browse a local film catalog", long_about = None)]
struct Cli {
    /// Path to the catalog directory (.dat files)
    #[arg(short, long, default_value = "data/catalog")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search films; every given option narrows the result
    Search {
        /// Case-insensitive title fragment
        #[arg(long)]
        title: Option<String>,

        /// Comma-separated genre names, any of them matches
        #[arg(long)]
        genre: Option<String>,

        /// Comma-separated actor names, any of them matches
        #[arg(long)]
        actors: Option<String>,

        #[arg(long)]
        rating_from: Option<String>,

        #[arg(long)]
        rating_to: Option<String>,

        /// Earliest release date (YYYY-MM-DD)
        #[arg(long)]
        date_from: Option<String>,

        /// Latest release date (YYYY-MM-DD)
        #[arg(long)]
        date_to: Option<String>,

        /// MPAA content rating, e.g. PG-13
        #[arg(long)]
        mpaa: Option<String>,

        #[arg(long, default_value = "1")]
        page: usize,

        #[arg(long, default_value_t = Page::DEFAULT_PER_PAGE)]
        per_page: usize,
    },

    /// Show a film with its genres, cast and rating
    Film {
        #[arg(long)]
        film_id: FilmId,
    },

    /// Show an actor and their films
    Actor {
        #[arg(long)]
        actor_id: ActorId,
    },

    /// Show the releases of a month
    Calendar {
        /// Month as YYYY-MM, defaults to the current month
        #[arg(long)]
        month: Option<String>,
    },

    /// Run random searches and report latency
    Benchmark {
        /// Number of searches to run
        #[arg(long, default_value = "1000")]
        requests: usize,

        /// Number of searches in flight at once
        #[arg(long, default_value = "10")]
        concurrent: usize,

        /// Seed for the query generator
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    println!("Loading catalog from {}...", cli.data_dir.display());
    let start = Instant::now();
    let index = Arc::new(
        CatalogIndex::load_from_files(&cli.data_dir).context("Failed to load catalog")?,
    );
    let (films, actors, comments) = index.counts();
    println!(
        "{} Loaded {} films, {} actors, {} comments in {:?}",
        "✓".green(),
        films,
        actors,
        comments,
        start.elapsed()
    );

    let storage = Storage::memory(index.clone());
    let service = CatalogService::new(storage.films, storage.favorites);

    match cli.command {
        Commands::Search {
            title,
            genre,
            actors,
            rating_from,
            rating_to,
            date_from,
            date_to,
            mpaa,
            page,
            per_page,
        } => {
            let request = RawSearchRequest {
                title,
                date_from,
                date_to,
                rating_from,
                rating_to,
                mpaa,
                genre,
                actors,
            };
            handle_search(&service, &request, Page::new(page, per_page)).await?
        }
        Commands::Film { film_id } => handle_film(&service, film_id).await?,
        Commands::Actor { actor_id } => handle_actor(&service, actor_id).await?,
        Commands::Calendar { month } => handle_calendar(&service, month.as_deref()).await?,
        Commands::Benchmark {
            requests,
            concurrent,
            seed,
        } => handle_benchmark(&service, &index, requests, concurrent, seed).await?,
    }

    Ok(())
}

async fn handle_search(service: &CatalogService, request: &RawSearchRequest, page: Page) -> Result<()> {
    let start = Instant::now();
    let films = service
        .search()
        .search(request, &CancellationToken::new())
        .await?;
    let total = films.len();
    let shown = page.apply(films);

    println!(
        "{}",
        format!("{} films matched in {:?}", total, start.elapsed())
            .bold()
            .blue()
    );
    if shown.is_empty() && total > 0 {
        println!("(page {} is past the end)", page.page);
    }
    print_films(&shown, page.offset());
    Ok(())
}

async fn handle_film(service: &CatalogService, film_id: FilmId) -> Result<()> {
    let details = service.film_details(film_id).await?;
    let film = &details.film;

    println!("{}", format!("{} ({})", film.title, film.release_date).bold().blue());
    println!("{}Country: {}", "• ".green(), film.country);
    println!("{}MPAA: {}", "• ".green(), film.mpaa);
    println!("{}Genres: {}", "• ".green(), details.genres.join(", "));
    if details.rating.count == 0 {
        println!("{}Rating: not rated yet", "• ".cyan());
    } else {
        println!(
            "{}Rating: {:.2} ({} ratings)",
            "• ".cyan(),
            details.rating.average,
            details.rating.count
        );
    }
    if !film.info.is_empty() {
        println!("\n{}", film.info);
    }

    println!("\nCast:");
    for member in &details.cast {
        if member.character.is_empty() {
            println!("  - {} [{}]", member.name, member.id);
        } else {
            println!("  - {} as {} [{}]", member.name, member.character, member.id);
        }
    }
    Ok(())
}

async fn handle_actor(service: &CatalogService, actor_id: ActorId) -> Result<()> {
    let details = service.actor_details(actor_id).await?;
    let actor = &details.actor;

    println!("{}", actor.name.bold().blue());
    if let Some(born) = actor.birth_date {
        println!("{}Born: {}", "• ".green(), born);
    }
    println!("{}Country: {}", "• ".green(), actor.country);
    println!("\nFilms:");
    print_films(&details.films, 0);
    Ok(())
}

async fn handle_calendar(service: &CatalogService, month: Option<&str>) -> Result<()> {
    let calendar = match month {
        Some(month) => service.calendar_for(parse_month(month)?).await?,
        None => service.calendar().await?,
    };

    println!(
        "{}",
        format!("Releases in {:04}-{:02}", calendar.year, calendar.month)
            .bold()
            .blue()
    );
    if calendar.days.is_empty() {
        println!("  nothing released this month");
    }
    for day in &calendar.days {
        println!("{}", format!("{:>2}", day.day).green());
        for film in &day.films {
            println!("    {}: {}", film.id, film.title);
        }
    }
    Ok(())
}

/// First day of a `YYYY-MM` month
fn parse_month(month: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
        .with_context(|| format!("invalid month '{month}', expected YYYY-MM"))
}

async fn handle_benchmark(
    service: &CatalogService,
    index: &CatalogIndex,
    requests: usize,
    concurrent: usize,
    seed: u64,
) -> Result<()> {
    if requests == 0 {
        bail!("benchmark needs at least one request");
    }

    let generator = QueryGenerator::from_index(index);
    debug!(
        genres = generator.genres.len(),
        actors = generator.actors.len(),
        years = ?generator.years,
        "query generator ready"
    );
    let mut rng = StdRng::seed_from_u64(seed);
    let queries: Vec<RawSearchRequest> = (0..requests).map(|_| generator.random(&mut rng)).collect();

    let limit = Arc::new(Semaphore::new(concurrent.max(1)));
    let start = Instant::now();
    let mut handles = Vec::with_capacity(requests);
    for query in queries {
        let search = service.search().clone();
        let permit = limit.clone().acquire_owned().await?;
        handles.push(tokio::spawn(async move {
            let _permit = permit;
            let start = Instant::now();
            let films = search.search(&query, &CancellationToken::new()).await?;
            Ok::<_, anyhow::Error>((start.elapsed(), films.len()))
        }));
    }

    let mut timings = Vec::with_capacity(requests);
    let mut matched = 0;
    for handle in handles {
        let (elapsed, found) = handle.await??;
        timings.push(elapsed);
        matched += found;
    }
    let wall_time = start.elapsed();

    timings.sort();
    let total: Duration = timings.iter().sum();
    let avg_latency = total / timings.len() as u32;
    let throughput = requests as f64 / wall_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent.max(1));
    println!("Wall time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(&timings, 0.50));
    println!("P95 latency: {:?}", percentile(&timings, 0.95));
    println!("P99 latency: {:?}", percentile(&timings, 0.99));
    println!("Average result size: {:.1}", matched as f64 / requests as f64);
    println!("Throughput: {:.2} searches/second", throughput);

    Ok(())
}

/// Nearest-rank percentile of an ascending, non-empty slice
fn percentile(sorted: &[Duration], p: f64) -> Duration {
    let rank = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

/// Builds random search requests from values present in the catalog
struct QueryGenerator {
    genres: Vec<String>,
    actors: Vec<String>,
    mpaa: Vec<String>,
    years: (i32, i32),
}

impl QueryGenerator {
    fn from_index(index: &CatalogIndex) -> Self {
        let mut genres: Vec<String> = index.genre_names().into_iter().map(String::from).collect();
        let mut actors: Vec<String> = index.actor_names().into_iter().map(String::from).collect();
        let mut mpaa: Vec<String> = index
            .films()
            .map(|film| film.mpaa.clone())
            .filter(|mpaa| !mpaa.is_empty())
            .collect();
        // Stable order so a seed always yields the same queries
        genres.sort();
        actors.sort();
        mpaa.sort();
        mpaa.dedup();

        let years = index
            .films()
            .map(|film| film.release_date.year())
            .fold(None, |acc: Option<(i32, i32)>, year| match acc {
                None => Some((year, year)),
                Some((lo, hi)) => Some((lo.min(year), hi.max(year))),
            })
            .unwrap_or((1990, 2020));

        Self {
            genres,
            actors,
            mpaa,
            years,
        }
    }

    fn random(&self, rng: &mut StdRng) -> RawSearchRequest {
        let mut request = RawSearchRequest::default();

        if !self.genres.is_empty() && rng.random_bool(0.6) {
            request.genre = Some(pick_list(&self.genres, rng));
        }
        if !self.actors.is_empty() && rng.random_bool(0.3) {
            request.actors = Some(pick_list(&self.actors, rng));
        }
        if !self.mpaa.is_empty() && rng.random_bool(0.2) {
            request.mpaa = Some(self.mpaa[rng.random_range(0..self.mpaa.len())].clone());
        }
        if rng.random_bool(0.4) {
            let min: f64 = rng.random_range(0.0..8.0);
            request.rating_from = Some(format!("{min:.1}"));
        }
        if rng.random_bool(0.3) {
            let (lo, hi) = self.years;
            let from = rng.random_range(lo..=hi);
            request.date_from = Some(format!("{from}-01-01"));
            request.date_to = Some(format!("{}-12-31", rng.random_range(from..=hi)));
        }
        request
    }
}

/// One to three distinct entries joined with the list delimiter
fn pick_list(pool: &[String], rng: &mut StdRng) -> String {
    let wanted = rng.random_range(1..=pool.len().min(3));
    let mut picked: Vec<&str> = Vec::with_capacity(wanted);
    while picked.len() < wanted {
        let candidate = pool[rng.random_range(0..pool.len())].as_str();
        if !picked.contains(&candidate) {
            picked.push(candidate);
        }
    }
    let delimiter = search::LIST_DELIMITER.to_string();
    picked.join(delimiter.as_str())
}

fn print_films(films: &[FilmSummary], offset: usize) {
    for (rank, film) in films.iter().enumerate() {
        println!(
            "{}. {} ({}) [{}]",
            (offset + rank + 1).to_string().green(),
            film.title,
            film.release_date,
            film.id
        );
    }
}
