use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use enginelib::db::Database;
use enginelib::db::models::{MetadataIntType, MetadataStrType};
use enginelib::db::schema::SchemaVersion;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "enginelib", version, about = "Engine Library database inspector")]
struct Cli {
    /// Path to the Engine Library directory (containing m.db and p.db)
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported schema versions
    Versions,

    /// Create a new, empty library
    Create {
        /// Schema version to create (defaults to config, then latest)
        #[arg(long)]
        schema: Option<SchemaVersion>,
    },

    /// Verify the library's structure against its schema version
    Verify,

    /// Show library statistics
    Stats,

    /// Show everything stored for one track
    Track {
        /// Track id
        id: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = enginelib::config::AppConfig::load();

    // Resolve library directory: CLI > config > platform default
    let library = cli
        .library
        .or(config.library_dir.clone())
        .unwrap_or_else(enginelib::config::default_library_dir);
    log::info!("Library: {}", library.display());

    match cli.command {
        Commands::Versions => {
            for version in SchemaVersion::ALL {
                let marker = if version == SchemaVersion::LATEST { " (latest)" } else { "" };
                println!("{:<8} {}{}", version.to_string(), version.name(), marker);
            }
        }

        Commands::Create { schema } => {
            let version = schema.unwrap_or_else(|| config.resolve_schema_version());
            std::fs::create_dir_all(&library)
                .with_context(|| format!("Failed to create {}", library.display()))?;
            let db = Database::create(&library, version).context("Failed to create library")?;
            println!(
                "Created {} library {} at {}",
                db.version(),
                db.uuid(),
                library.display()
            );
        }

        Commands::Verify => {
            let db = open(&library)?;
            db.verify().context("Verification failed")?;
            println!("OK: schema {} ({})", db.version(), db.version().name());
        }

        Commands::Stats => {
            let db = open(&library)?;
            let stats = db.stats().context("Failed to get stats")?;
            println!("Library Statistics");
            println!("==================");
            println!("Schema version:    {}", db.version());
            println!("UUID:              {}", db.uuid());
            println!("Total tracks:      {}", stats.total_tracks);
            println!("Performance rows:  {}", stats.performance_rows);
            println!("Analyzed tracks:   {}", stats.analyzed_tracks);
            println!("Rendered tracks:   {}", stats.rendered_tracks);
        }

        Commands::Track { id } => {
            let db = open(&library)?;
            print_track(&db, id).with_context(|| format!("Failed to read track {id}"))?;
        }
    }

    Ok(())
}

fn open(library: &Path) -> Result<Database> {
    Database::open(library).with_context(|| format!("Failed to open {}", library.display()))
}

/// Print metadata, cells and performance data of one track.
fn print_track(db: &Database, id: i64) -> Result<()> {
    let track = db.track(id);
    if !track.is_valid()? {
        anyhow::bail!("track {id} does not exist");
    }

    println!("Track {id}");
    println!("{}", "-".repeat(40));
    println!("{:<16} {}", "path", track.path()?.unwrap_or_default());
    for ty in MetadataStrType::ALL {
        if let Some(value) = track.metadata(ty)? {
            println!("{:<16} {}", ty.label(), value);
        }
    }
    if let Some(bpm) = track.bpm()? {
        println!("{:<16} {:.2}", "bpm", bpm);
    }
    for ty in MetadataIntType::ALL {
        let value = match ty {
            MetadataIntType::LastPlayedTs
            | MetadataIntType::LastModifiedTs
            | MetadataIntType::LastAccessedTs => db
                .get_metadata_time(id, ty)?
                .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string()),
            MetadataIntType::MusicalKey => track.key()?.map(|k| k.to_string()),
            MetadataIntType::Hash => track.hash()?.map(|h| h.to_string()),
        };
        if let Some(value) = value {
            println!("{:<16} {}", ty.label(), value);
        }
    }
    if let Some(info) = track.import_info()? {
        println!(
            "{:<16} track {} of {}",
            "imported from", info.external_track_id, info.external_db_uuid
        );
    }

    println!();
    match db.performance_flags(id)? {
        None => println!("No performance data"),
        Some(flags) => {
            println!(
                "analyzed={} rendered={} serato={} rekordbox={} traktor={}",
                flags.is_analyzed,
                flags.is_rendered,
                flags.has_serato_values,
                optional_flag(flags.has_rekordbox_values),
                optional_flag(flags.has_traktor_values),
            );
            if let Some(sampling) = track.sampling()? {
                println!(
                    "{:<16} {} Hz, {} samples",
                    "sampling", sampling.sample_rate, sampling.sample_count
                );
            }
            if let Some(ms) = track.duration_ms()? {
                println!("{:<16} {}:{:02}", "duration", ms / 60_000, (ms / 1000) % 60);
            }
            if let Some(loudness) = track.average_loudness()? {
                println!("{:<16} {:.3}", "loudness", loudness);
            }
            println!(
                "{:<16} {} default, {} adjusted markers",
                "beat grid",
                track.default_beatgrid()?.len(),
                track.adjusted_beatgrid()?.len()
            );
            println!("{:<16} {:.0}", "main cue", track.adjusted_main_cue()?);
            for (i, cue) in track.hot_cues()?.iter().enumerate() {
                if let Some(cue) = cue {
                    println!("  hot cue {}  {:>12.0}  {}", i + 1, cue.sample_offset, cue.label);
                }
            }
            for (i, l) in track.loops()?.iter().enumerate() {
                if let Some(l) = l {
                    println!(
                        "  loop {}     {:>12.0}..{:.0}  {}",
                        i + 1,
                        l.start_sample_offset,
                        l.end_sample_offset,
                        l.label
                    );
                }
            }
            println!("{:<16} {} entries", "waveform", track.waveform()?.len());
        }
    }
    Ok(())
}

fn optional_flag(flag: Option<bool>) -> String {
    flag.map_or_else(|| "n/a".to_string(), |f| f.to_string())
}
