use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};
use tracing::info;

use binary_explainer::{
    config::PlayerConfig,
    logging,
    player::Player,
    speech::{CommandSpeech, SilentSpeech, SpeechEngine},
    storyboard::{JsonFileSource, StoryboardDocument, StoryboardSource},
};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const PLAY_USAGE: &str =
    "binary-explainer play <storyboard.json> [--question <text>] [--mute] [--log <file>]";
const STANDBY_USAGE: &str = "binary-explainer standby [--mute] [--log <file>]";
const VALIDATE_USAGE: &str = "binary-explainer validate <storyboard.json>";

#[derive(Default)]
struct Flags {
    positional: Vec<String>,
    question: Option<String>,
    mute: bool,
    log: Option<PathBuf>,
}

fn parse_flags(mut args: impl Iterator<Item = String>, usage: &str) -> Result<Flags> {
    let mut flags = Flags::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mute" => flags.mute = true,
            "--log" => flags.log = Some(args.next().context(usage.to_string())?.into()),
            "--question" => flags.question = Some(args.next().context(usage.to_string())?),
            s if s.starts_with("--") => bail!("Unknown option {s}\n\nUsage:\n  {usage}"),
            _ => flags.positional.push(arg),
        }
    }
    Ok(flags)
}

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("play") => {
            let flags = parse_flags(args, PLAY_USAGE)?;
            let path = flags.positional.first().cloned().context(PLAY_USAGE)?;
            play(&path, flags)
        }
        Some("standby") => standby(parse_flags(args, STANDBY_USAGE)?),
        Some("validate") => {
            let flags = parse_flags(args, VALIDATE_USAGE)?;
            let path = flags.positional.first().cloned().context(VALIDATE_USAGE)?;
            validate(&path)
        }
        _ => bail!(
            "Binary Explainer — storyboard player for the terminal\n\nUsage:\n  {PLAY_USAGE}\n  {STANDBY_USAGE}\n  {VALIDATE_USAGE}"
        ),
    }
}

fn speech_engine(config: &PlayerConfig, mute: bool) -> Box<dyn SpeechEngine> {
    if mute || !config.speech.enabled {
        Box::new(SilentSpeech::new())
    } else {
        Box::new(CommandSpeech::new(config.speech.command.clone()))
    }
}

fn play(path: &str, flags: Flags) -> Result<()> {
    let loaded = PlayerConfig::load();
    logging::init_file(flags.log.as_deref().or(loaded.config.log_file.as_deref()))?;
    loaded.report();
    let config = loaded.config;

    let question = flags.question.unwrap_or_default();
    let source = JsonFileSource::new(path);
    let document = source
        .get_storyboard(&question)
        .with_context(|| format!("Failed to load {path}"))?;
    info!(path, scenes = document.scenes().len(), "storyboard loaded");

    let engine = speech_engine(&config, flags.mute);
    let mut player = Player::new(document, engine, Some(Box::new(source)), question, config);
    player.play()
}

fn standby(flags: Flags) -> Result<()> {
    let loaded = PlayerConfig::load();
    logging::init_file(flags.log.as_deref().or(loaded.config.log_file.as_deref()))?;
    loaded.report();
    let config = loaded.config;

    let engine = speech_engine(&config, flags.mute);
    let mut player = Player::new(StoryboardDocument::standby(), engine, None, "", config);
    player.play()
}

fn validate(path: &str) -> Result<()> {
    logging::init_stderr()?;
    let document = JsonFileSource::new(path)
        .get_storyboard("")
        .with_context(|| format!("Failed to load {path}"))?;

    let symbols = document
        .scenes()
        .iter()
        .filter(|s| s.symbol_art.is_some())
        .count();
    eprintln!(
        "{}: {} scenes, {} ms, {} with symbol art, narration {} chars",
        path,
        document.scenes().len(),
        document.total_duration_ms(),
        symbols,
        document.narration().len(),
    );
    Ok(())
}
