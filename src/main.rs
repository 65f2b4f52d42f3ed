//! Behavior Sentry CLI
//!
//! Continuous behavioral authentication agent.

use behavior_sentry::{
    capture::{check_permission, NoopWindowProbe},
    config::Config,
    engine::BehaviorEngine,
    gateway::AccessDecision,
    inference::InferenceError,
    model::Model,
    stats::{create_shared_stats_with_persistence, StatsSnapshot},
    store::EventLog,
    trainer::TrainingError,
    CaptureAgent, VERSION,
};
use chrono::{Duration as ChronoDuration, Local};
use clap::{Parser, Subcommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "behavior-sentry")]
#[command(version = VERSION)]
#[command(about = "Continuous behavioral authentication agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the capture agent in the foreground
    Start,

    /// Train the baseline model from recent history
    Train {
        /// Minutes of history to train on (defaults to the configured
        /// baseline duration)
        #[arg(long)]
        minutes: Option<u64>,
    },

    /// Score the newest closed window and print the access decision
    Check,

    /// Show model and capture status
    Status,

    /// Show configuration
    Config,
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();
    init_logging(&config);

    match cli.command {
        Commands::Start => cmd_start(config),
        Commands::Train { minutes } => cmd_train(config, minutes),
        Commands::Check => cmd_check(config),
        Commands::Status => cmd_status(config),
        Commands::Config => cmd_config(config),
    }
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.level));
    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn open_log(config: &Config) -> Arc<EventLog> {
    match EventLog::open(&config.event_log_path()) {
        Ok(log) => Arc::new(log),
        Err(e) => {
            eprintln!("Error opening event log: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_start(config: Config) {
    println!("Behavior Sentry v{VERSION}");
    println!();

    if !check_permission() {
        eprintln!("Error: input monitoring permission not granted.");
        std::process::exit(1);
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: could not create directories: {e}");
    }

    println!("Starting capture...");
    println!("  Window size: {}s", config.window_size.as_secs());
    println!(
        "  Focus poll interval: {}s",
        config.focus_poll_interval.as_secs()
    );
    println!(
        "  Resource sample interval: {}s",
        config.resource_sample_interval.as_secs()
    );
    println!(
        "  Retention horizon: {}s",
        config.retention_horizon.as_secs()
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let log = open_log(&config);
    let stats = create_shared_stats_with_persistence(config.stats_path());

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let agent = match CaptureAgent::start(
        log,
        &config,
        stats.clone(),
        Box::new(NoopWindowProbe),
        running.clone(),
    ) {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("Error starting capture: {e}");
            std::process::exit(1);
        }
    };

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));
    }

    println!();
    println!("Stopping capture...");
    agent.shutdown();

    if let Err(e) = stats.save() {
        eprintln!("Warning: could not save session stats: {e}");
    }

    println!();
    println!("{}", stats.summary());
}

fn cmd_train(config: Config, minutes: Option<u64>) {
    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: could not create directories: {e}");
    }

    let span = match minutes {
        Some(m) => ChronoDuration::minutes(m as i64),
        None => config.baseline_duration_chrono(),
    };

    // Train strictly in the past so no window is still filling.
    let end = Local::now().naive_local() - ChronoDuration::seconds(2);
    let start = end - span;

    let log = open_log(&config);
    let engine = BehaviorEngine::new(log, config);

    println!("Training baseline over the last {} minutes...", span.num_minutes());
    match engine.train_baseline(start, end) {
        Ok(model) => {
            println!("Baseline trained.");
            println!("  Trained at: {}", model.trained_at);
            println!("  Host: {}", model.host);
            println!("  Dimensionality: {}", model.dim);
            println!("  Trees: {}", model.forest.tree_count());
            println!("  Contamination: {}", model.contamination);
            println!("  Decision threshold: {:.4}", model.threshold);
        }
        Err(TrainingError::InsufficientBaseline {
            required_secs,
            actual_secs,
        }) => {
            eprintln!(
                "Insufficient baseline: span covers {actual_secs}s, need {required_secs}s."
            );
            eprintln!("Let the agent capture for longer, then retry.");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Training failed: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_check(config: Config) {
    let log = open_log(&config);
    let engine = BehaviorEngine::new(log, config);

    let now = Local::now().naive_local();
    match engine.evaluate_latest(now) {
        Ok(verdict) => {
            println!("Window: {}", verdict.window.label());
            println!("Anomaly score: {:.4}", verdict.anomaly_score);
            println!(
                "Verdict: {}",
                if verdict.is_normal {
                    "normal"
                } else {
                    "suspicious"
                }
            );
            match AccessDecision::from_verdict(&verdict) {
                AccessDecision::Grant => println!("Decision: grant"),
                AccessDecision::Challenge => println!("Decision: challenge (one-time passcode required)"),
            }
        }
        Err(InferenceError::ModelNotTrained) => {
            eprintln!("No baseline model. Run `behavior-sentry train` first.");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Evaluation failed: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_status(config: Config) {
    println!("Behavior Sentry Status");
    println!("======================");
    println!();

    let model_path = config.model_path();
    if Model::is_present(&model_path) {
        match Model::load(&model_path) {
            Ok(model) => {
                println!("Baseline model: present");
                println!("  Trained at: {}", model.trained_at);
                println!("  Host: {}", model.host);
                println!("  Dimensionality: {}", model.dim);
                println!("  Trees: {}", model.forest.tree_count());
                println!("  Contamination: {}", model.contamination);
            }
            Err(e) => println!("Baseline model: unreadable ({e})"),
        }
    } else {
        println!("Baseline model: not trained");
    }
    println!();

    if config.event_log_path().exists() {
        match EventLog::open(&config.event_log_path()) {
            Ok(log) => {
                let now = Local::now().naive_local();
                let horizon =
                    ChronoDuration::seconds(config.retention_horizon.as_secs() as i64);
                match log.count_between(now - horizon, now) {
                    Ok(count) => {
                        println!("Events in retention window: {count}")
                    }
                    Err(e) => println!("Event log: unreadable ({e})"),
                }
            }
            Err(e) => println!("Event log: unreadable ({e})"),
        }
    } else {
        println!("Event log: not created yet");
    }
    println!();

    let stats_path = config.stats_path();
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(snapshot) = serde_json::from_str::<StatsSnapshot>(&content) {
                println!("Last session:");
                println!("  Keyboard events: {}", snapshot.keyboard_events);
                println!("  Mouse events: {}", snapshot.mouse_events);
                println!("  Focus events: {}", snapshot.focus_events);
                println!("  Resource samples: {}", snapshot.resource_events);
                println!(
                    "  Stored: {} ({} failures, {} dropped)",
                    snapshot.events_stored, snapshot.write_failures, snapshot.events_dropped
                );
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_config(config: Config) {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
