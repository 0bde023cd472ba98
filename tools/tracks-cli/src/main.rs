use clap::{Args, Parser, Subcommand, ValueHint};
use serde::Serialize;
use spiral_config::tracing::{flush_chrome_trace, init_tracing};
use spiral_config::RecommenderSettings;
use st_tracks::sample::{sample_dataset, SampleConfig};
use st_tracks::{
    recommend_collaborative, recommend_content_based, CollaborativeParams, Dataset, MemoryStore,
    Outcome,
};
use std::error::Error;
use std::fs::{self, File};
use std::io::{self, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::debug;

type DynError = Box<dyn Error>;

type Result<T> = std::result::Result<T, DynError>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Track recommendations from a SpiralTorch JSON dataset"
)]
struct Cli {
    /// Dataset JSON file (falls back to SPIRAL_REC_DATASET)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    dataset: Option<PathBuf>,

    /// Emit JSON instead of plain lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the sample catalog with generated users and interactions
    Seed(SeedArgs),

    /// List tracks ordered by id
    Tracks(TracksArgs),

    /// Validate the dataset and print its counts
    Check,

    /// Rank tracks by feature similarity to a seed track
    Similar(SimilarArgs),

    /// Train implicit ALS and recommend unseen tracks for a user
    Recommend(RecommendArgs),
}

#[derive(Args)]
struct SeedArgs {
    /// Destination for the dataset JSON payload
    #[arg(long, value_hint = ValueHint::FilePath)]
    output: PathBuf,

    #[arg(long, default_value_t = 50)]
    users: usize,

    /// Interaction draws; repeated (user, track) pairs are dropped
    #[arg(long, default_value_t = 2000)]
    interactions: usize,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct TracksArgs {
    #[arg(long, default_value_t = 10)]
    limit: usize,
}

#[derive(Args)]
struct SimilarArgs {
    /// External track id (track_uuid)
    track: String,

    #[arg(long)]
    top_k: Option<usize>,
}

#[derive(Args)]
struct RecommendArgs {
    /// External user id (user_uuid)
    user: String,

    #[arg(long)]
    top_k: Option<usize>,

    #[arg(long)]
    factors: Option<usize>,

    #[arg(long)]
    iterations: Option<usize>,

    #[arg(long)]
    alpha: Option<f32>,

    #[arg(long)]
    regularization: Option<f32>,

    /// Use raw play counts instead of 1 + alpha * count
    #[arg(long)]
    raw: bool,

    /// Keep already-played tracks in the ranking
    #[arg(long)]
    include_seen: bool,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Serialize)]
struct TrackLine<'a> {
    id: u64,
    track_uuid: &'a str,
    title: Option<&'a str>,
    artist: Option<&'a str>,
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        flush_chrome_trace();
        std::process::exit(1);
    }
    flush_chrome_trace();
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;
    let settings = RecommenderSettings::from_env()?;
    let dataset_path = cli.dataset.clone().or_else(|| settings.dataset.clone());

    match cli.command {
        Command::Seed(args) => run_seed(args),
        Command::Tracks(args) => {
            let dataset = load_dataset(dataset_path.as_deref())?;
            run_tracks(&dataset, args, cli.json)
        }
        Command::Check => {
            let dataset = load_dataset(dataset_path.as_deref())?;
            let summary = dataset.validate()?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "tracks": summary.tracks,
                        "tracks_with_features": summary.tracks_with_features,
                        "users": summary.users,
                        "interactions": summary.interactions,
                    })
                );
            } else {
                println!("tracks: {}", summary.tracks);
                println!("tracks_with_features: {}", summary.tracks_with_features);
                println!("users: {}", summary.users);
                println!("interactions: {}", summary.interactions);
            }
            Ok(())
        }
        Command::Similar(args) => {
            let store = MemoryStore::new(load_dataset(dataset_path.as_deref())?);
            let top_k = args.top_k.unwrap_or(settings.top_k);
            let outcome = recommend_content_based(&store, &args.track, top_k)?;
            print_outcome(&outcome, cli.json)
        }
        Command::Recommend(args) => {
            let store = MemoryStore::new(load_dataset(dataset_path.as_deref())?);
            let top_k = args.top_k.unwrap_or(settings.top_k);
            let params = collaborative_params(&settings, &args);
            let outcome = recommend_collaborative(&store, &args.user, top_k, &params)?;
            print_outcome(&outcome, cli.json)
        }
    }
}

fn collaborative_params(
    settings: &RecommenderSettings,
    args: &RecommendArgs,
) -> CollaborativeParams {
    let defaults = CollaborativeParams::from(settings);
    CollaborativeParams {
        factors: args.factors.unwrap_or(defaults.factors),
        iterations: args.iterations.unwrap_or(defaults.iterations),
        alpha: args.alpha.unwrap_or(defaults.alpha),
        regularization: args.regularization.unwrap_or(defaults.regularization),
        use_confidence: !args.raw,
        filter_seen: !args.include_seen,
        seed: args.seed,
    }
}

fn load_dataset(path: Option<&Path>) -> Result<Dataset> {
    let Some(path) = path else {
        return Err(Box::new(io::Error::new(
            ErrorKind::InvalidInput,
            "no dataset given; pass --dataset or set SPIRAL_REC_DATASET",
        )));
    };
    let file = File::open(path).map_err(|err| {
        Box::new(io::Error::new(
            err.kind(),
            format!("failed to open {}: {err}", path.display()),
        )) as DynError
    })?;
    let dataset = Dataset::from_reader(BufReader::new(file))?;
    debug!(
        path = %path.display(),
        tracks = dataset.tracks.len(),
        users = dataset.users.len(),
        interactions = dataset.interactions.len(),
        "dataset loaded"
    );
    Ok(dataset)
}

fn run_seed(args: SeedArgs) -> Result<()> {
    let dataset = sample_dataset(&SampleConfig {
        users: args.users,
        interactions: args.interactions,
        seed: args.seed,
    });
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&args.output, dataset.to_json_pretty()?)?;
    println!(
        "wrote {} tracks, {} users, {} interactions to {}",
        dataset.tracks.len(),
        dataset.users.len(),
        dataset.interactions.len(),
        args.output.display()
    );
    Ok(())
}

fn run_tracks(dataset: &Dataset, args: TracksArgs, json: bool) -> Result<()> {
    let mut tracks: Vec<_> = dataset.tracks.iter().collect();
    tracks.sort_by_key(|track| track.id);
    let lines: Vec<TrackLine<'_>> = tracks
        .into_iter()
        .take(args.limit)
        .map(|track| TrackLine {
            id: track.id,
            track_uuid: &track.track_uuid,
            title: track.title.as_deref(),
            artist: track.artist.as_deref(),
        })
        .collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(());
    }
    for line in lines {
        println!(
            "{}\t{}\t{}\t{}",
            line.id,
            line.track_uuid,
            line.title.unwrap_or("-"),
            line.artist.unwrap_or("-")
        );
    }
    Ok(())
}

fn print_outcome(outcome: &Outcome, json: bool) -> Result<()> {
    // Reported on stderr so `--json` stdout stays a plain array.
    if let Some(reason) = outcome.empty_reason() {
        eprintln!("no recommendations: {reason:?}");
    }
    if json {
        println!("{}", serde_json::to_string_pretty(outcome.items())?);
        return Ok(());
    }
    for item in outcome.items() {
        println!("{}: {:.4}", item.item_id, item.score);
    }
    Ok(())
}
