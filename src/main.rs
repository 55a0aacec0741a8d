use std::env;
use std::fs;
use std::process;
use std::thread;

use tracing::{error, info};

const USAGE: &str = "Usage: motion [--json] [--wait] <motion.yaml>";

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut wait = false;
    let mut input_path: Option<&String> = None;

    // Parse flags
    for arg in &args {
        match arg.as_str() {
            "--json" => json = true,
            "--wait" => wait = true,
            flag if flag.starts_with("--") => {
                eprintln!("Unknown flag: {}", flag);
                eprintln!("{}", USAGE);
                process::exit(1);
            }
            _ if input_path.is_none() => input_path = Some(arg),
            _ => {
                eprintln!("{}", USAGE);
                process::exit(1);
            }
        }
    }

    let Some(input_path) = input_path else {
        eprintln!("{}", USAGE);
        process::exit(1);
    };

    // Read input file
    let source = match fs::read_to_string(input_path) {
        Ok(content) => content,
        Err(e) => {
            error!(path = %input_path, "cannot read motion document");
            eprintln!("Error reading file '{}': {}", input_path, e);
            process::exit(1);
        }
    };

    // Generate and play into a recorder
    let config = match motion::parse_config(&source) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Generation error: {}", e);
            process::exit(1);
        }
    };
    if let Some(title) = &config.title {
        info!(%title, "generating motion");
    }

    let mut player = motion::RecordingPlayer::new();
    let length = match config
        .motion
        .play(&mut player, config.tempo, config.meter, config.channel)
    {
        Ok(length) => length,
        Err(e) => {
            eprintln!("Generation error: {}", e);
            process::exit(1);
        }
    };

    // Output
    let Some(data) = player.played.first() else {
        eprintln!("Generation error: nothing was played");
        process::exit(1);
    };
    let rendered = if json {
        serde_json::to_string_pretty(data).map_err(|e| e.to_string())
    } else {
        serde_yaml::to_string(data).map_err(|e| e.to_string())
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error rendering schedule: {}", e);
            process::exit(1);
        }
    }

    if wait {
        info!(seconds = length.as_secs_f64(), "waiting for playback");
        thread::sleep(length);
    }
}
