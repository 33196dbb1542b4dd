//! gesture_swarm — interactive entry point.

use std::path::PathBuf;
use std::process;

use gesture_swarm::app::{run, AppConfig};

fn main() {
    env_logger::init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Gesture Swarm — formation-shifting particles          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("  Camera channel: idle (keyboard hover gestures drive the show)");
    println!("  Keys: F=tree  O=scatter  P=focus  1-5=text  U=photo  Q=quit");
    println!();

    let cfg = match parse_args() {
        Ok(cfg) => cfg,
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(2);
        }
    };

    if !cfg.photo_paths.is_empty() {
        println!("  {} photo(s) queued for the U key", cfg.photo_paths.len());
        println!();
    }

    if let Err(e) = run(cfg) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_args() -> Result<AppConfig, String> {
    let mut cfg = AppConfig::default();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                println!("{}", usage());
                process::exit(0);
            }
            "--count" => {
                let v = args.next().ok_or_else(usage)?;
                cfg.choreo.decoration_count = v
                    .parse()
                    .map_err(|_| format!("--count: not a number: {}", v))?;
            }
            "--seed" => {
                let v = args.next().ok_or_else(usage)?;
                cfg.seed = v.parse().map_err(|_| format!("--seed: not a number: {}", v))?;
            }
            _ if arg.starts_with('-') => {
                return Err(format!("unknown flag {}\n{}", arg, usage()));
            }
            // Positional arguments are photos for the upload key.
            _ => cfg.photo_paths.push(PathBuf::from(arg)),
        }
    }
    Ok(cfg)
}

fn usage() -> String {
    "usage: gesture_swarm [--count N] [--seed N] [photo.jpg ...]".to_string()
}
