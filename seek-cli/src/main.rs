//! # Hide and Seek - Ear Training for Violin
//!
//! Command-line front end. `play` runs the pitch-matching game through the
//! default microphone and speakers, `scale` runs Scale Detective, `listen`
//! records once and reports the pitch, and `notes` lists the violin range.

mod answers;
mod reporter;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use seek_core::audio::AudioIo;
use seek_core::report::{DetectiveEvent, GameEvent, Reporter};
use seek_core::{
    CpalAudio, DetectiveConfig, GameConfig, GameSession, Note, PitchEstimate, PitchEstimator,
    ScaleDetective, SeekError, cents, tuning,
};

use answers::LineAnswers;
use reporter::{ConsoleReporter, JsonReporter};

/// Beyond two semitones a detuned note is no longer subtle.
const CONFIRM_CENTS_ABOVE: f32 = 200.0;

#[derive(Parser)]
#[command(name = "hide-and-seek")]
#[command(version)]
#[command(about = "Hide and Seek - Ear Training for Violin Students", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Show diagnostic logs on stderr (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    play: PlayArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the hide-and-seek game (the default)
    Play(PlayArgs),

    /// Find the out-of-tune note in an A major scale
    Scale(ScaleArgs),

    /// Record once and show the detected pitch
    Listen {
        /// JSON file with game settings
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// List the notes in the violin range
    Notes,
}

#[derive(Args, Debug, Clone)]
struct PlayArgs {
    /// Number of notes to play in sequence
    #[arg(short = 'n', long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..))]
    num_notes: u32,

    /// Number of distinct notes to choose from the A major scale
    #[arg(short = 'd', long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=8))]
    distinct_notes: u32,

    /// Tolerance in cents for note matching [default: 40]
    #[arg(short = 't', long)]
    tolerance: Option<f32>,

    /// Play exactly these notes, e.g. A4,D5,E5
    #[arg(long, value_delimiter = ',', value_name = "NOTES")]
    notes: Option<Vec<String>>,

    /// Seed for a reproducible note draw
    #[arg(long)]
    seed: Option<u64>,

    /// Playback volume, 0.0 to 1.0
    #[arg(long, default_value_t = 0.3)]
    volume: f32,

    /// JSON file with game settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print events as JSON lines instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct ScaleArgs {
    /// How far the hidden note is detuned, in cents
    #[arg(short = 'c', long, default_value_t = 50.0)]
    cents: f32,

    /// Also name the direction: too high or too low
    #[arg(long)]
    hard: bool,

    /// Seed for a reproducible hidden note
    #[arg(long)]
    seed: Option<u64>,

    /// Playback volume, 0.0 to 1.0
    #[arg(long, default_value_t = 0.3)]
    volume: f32,

    /// Print events as JSON lines instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let result = match cli.command.unwrap_or(Commands::Play(cli.play)) {
        Commands::Play(args) => play_command(&args),
        Commands::Scale(args) => scale_command(&args),
        Commands::Listen { config } => listen_command(config.as_deref()),
        Commands::Notes => {
            notes_command();
            Ok(())
        }
    };

    if let Err(err) = &result {
        if matches!(err.downcast_ref::<SeekError>(), Some(SeekError::Device(_))) {
            eprintln!("Make sure your microphone and speakers are working properly.");
        }
    }
    result
}

fn init_logging(debug: bool) {
    let fallback = if debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Loads game settings from a JSON file. Missing fields keep their defaults.
fn load_config(path: &Path) -> Result<GameConfig> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let config: GameConfig = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    info!("Loaded settings from {}", path.display());
    Ok(config)
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn choose_notes(args: &PlayArgs) -> Result<Vec<Note>> {
    if let Some(names) = &args.notes {
        return names
            .iter()
            .map(|name| {
                tuning::find_note(name.trim())
                    .with_context(|| format!("Unknown note '{}'", name.trim()))
            })
            .collect();
    }
    let mut rng = seeded_rng(args.seed);
    let notes = tuning::draw_sequence(
        &mut rng,
        &tuning::a_major_scale(),
        args.distinct_notes as usize,
        args.num_notes as usize,
    )?;
    Ok(notes)
}

fn play_command(args: &PlayArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GameConfig::default(),
    };
    if let Some(tolerance) = args.tolerance {
        config.tolerance_cents = tolerance;
    }
    let mut session = GameSession::new(config)?;
    let notes = choose_notes(args)?;
    debug!(?notes, "Notes drawn");

    let mut reporter: Box<dyn Reporter<GameEvent>> = if args.json {
        Box::new(JsonReporter::new(io::stdout()))
    } else {
        println!("🎻 Welcome to Hide and Seek - Ear Training for Violin!");
        println!("{}", "=".repeat(50));
        Box::new(ConsoleReporter)
    };
    let mut audio = CpalAudio::new(args.volume);

    session.run(&mut audio, &mut *reporter, &notes)?;
    Ok(())
}

fn scale_command(args: &ScaleArgs) -> Result<()> {
    let config = DetectiveConfig {
        cents_off: args.cents,
        hard_mode: args.hard,
        ..DetectiveConfig::default()
    };
    let game = ScaleDetective::new(config)?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    if args.cents > CONFIRM_CENTS_ABOVE {
        eprintln!(
            "Warning: {} cents is very out of tune (more than 2 semitones)",
            args.cents
        );
        if !confirm(&mut input, "Continue anyway? (y/N): ")? {
            return Ok(());
        }
    }

    let (mut reporter, prompts): (Box<dyn Reporter<DetectiveEvent>>, Box<dyn Write>) = if args.json {
        (Box::new(JsonReporter::new(io::stdout())), Box::new(io::stderr()))
    } else {
        print_scale_welcome(&game, args);
        (Box::new(ConsoleReporter), Box::new(io::stdout()))
    };

    if !args.json {
        print!("Press Enter to start...");
        io::stdout().flush()?;
        let mut line = String::new();
        input.read_line(&mut line)?;
        println!();
    }

    let hidden = game.hide(&mut seeded_rng(args.seed));
    let mut answers = LineAnswers::new(input, prompts, args.hard);
    let mut audio = CpalAudio::new(args.volume);
    game.run(hidden, &mut audio, &mut answers, &mut *reporter)?;
    Ok(())
}

fn print_scale_welcome(game: &ScaleDetective, args: &ScaleArgs) {
    println!("🎻 Welcome to Scale Detective!");
    println!("{}", "=".repeat(40));
    println!(
        "I'll play an A major scale ({} notes), one note at a time.",
        game.scale().len()
    );
    println!("One note will be out of tune by {} cents.", args.cents);
    println!("After each note, type:");
    if args.hard {
        println!("  Enter = in tune");
        println!("  u     = too high");
        println!("  d     = too low");
    } else {
        println!("  Enter = in tune");
        println!("  /     = out of tune");
    }
    println!();
}

fn confirm<R: BufRead>(input: &mut R, question: &str) -> Result<bool> {
    eprint!("{question}");
    io::stderr().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("no answer on standard input");
    }
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn listen_command(config_path: Option<&Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => load_config(path)?,
        None => GameConfig::default(),
    };
    config.validate()?;

    let estimator = PitchEstimator::new(config.estimator.clone());
    let mut audio = CpalAudio::new(0.0);
    println!("🎤 Listening for {:.0} seconds...", config.record_secs);
    let buffer = audio.record(config.record_secs, config.sample_rate)?;

    match estimator.estimate(&buffer, config.min_hz, config.max_hz) {
        PitchEstimate::Detected { frequency, confidence } => {
            println!("Heard {frequency:.1} Hz (confidence {confidence:.2})");
            if let Some(note) = tuning::nearest_note(frequency) {
                let offset = cents::cents_offset(frequency, note.frequency());
                println!("Nearest note: {} ({offset:+.0} cents)", note.name());
            }
        }
        PitchEstimate::NotDetected => println!("No clear pitch heard."),
    }
    Ok(())
}

fn notes_command() {
    println!("Available notes in violin range:");
    for note in tuning::violin_range() {
        println!("  {}: {:.1} Hz", note.name(), note.frequency());
    }
}
