// Songmatic snippet generator, CLI entry point.
//
// Resolves the request flags (falling back to randomized defaults for any
// that are missing or bad), composes one snippet and writes it to disk.
//
// Usage:
//   cargo run -p songmatic_music -- [output.midi] [--key N] [--tempo BPM]
//     [--type chords|drums|bass|melody] [--bars N] [--jazz] [--seed N]
//     [--config composer.json] [--modes [MODE]] [--print-config] [--verbose]
//
// Without an output path the file is named after the snippet, for example
// `chords_120_C.midi`. `--modes` prints the chord chart of every mode in
// the resolved key before generating, or only the named mode's chart.
// `--print-config` prints the effective composer config as JSON.

use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use songmatic_music::config::ComposerConfig;
use songmatic_music::error::Result;
use songmatic_music::generate_snippet;
use songmatic_music::generator::{Generator, entropy_seed};
use songmatic_music::mode::{Mode, chord_chart, describe_modes};
use songmatic_music::params::{RawParams, SongParams};
use songmatic_music::scale::Scale;
use std::path::Path;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    init_logging(has_flag(&args, "--verbose") || has_flag(&args, "-v"));

    if let Err(e) = run(&args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto).is_err() {
        eprintln!("logger already initialized");
    }
}

fn run(args: &[String]) -> Result<()> {
    let output_path = args
        .get(1)
        .filter(|s| !s.starts_with('-'))
        .map(|s| s.as_str());
    let seed: u64 = parse_flag(args, "--seed").unwrap_or_else(entropy_seed);
    log::info!("seed {seed}");

    let config = match flag_value(args, "--config") {
        Some(path) => ComposerConfig::load(Path::new(path))?,
        None => ComposerConfig::default(),
    };
    let mut generator = Generator::with_config(seed, config)?;

    let raw = RawParams {
        key: flag_value(args, "--key"),
        tempo: flag_value(args, "--tempo"),
        content: flag_value(args, "--type"),
        bars: flag_value(args, "--bars"),
        jazz: has_flag(args, "--jazz").then_some("true"),
    };
    let params = SongParams::resolve(&raw, &mut generator);

    if has_flag(args, "--print-config") {
        println!("{}", generator.config().to_json()?);
    }
    if has_flag(args, "--modes") {
        let scale = Scale::resolve(params.key)?;
        match flag_value(args, "--modes").filter(|v| !v.starts_with('-')) {
            Some(name) => {
                let mode = Mode::from_name(name)?;
                println!("{mode}\n{}", chord_chart(&scale, mode).join(" | "));
            }
            None => println!("{}", describe_modes(&scale)),
        }
    }

    let midi = generate_snippet(&params, &mut generator)?;
    let path = output_path.unwrap_or(&midi.filename);
    std::fs::write(path, &midi.bytes)?;
    log::info!("wrote {} ({} bytes, {})", path, midi.bytes.len(), midi.mime);
    Ok(())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    flag_value(args, flag).and_then(|v| v.parse().ok())
}
