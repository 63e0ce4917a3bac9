use std::env;
use std::fs;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use galaxy_field::{
    ChangePhase, FieldController, FieldKind, GalaxyChange, Preset, RecordingSurface,
    StarFieldChange,
};

const FRAME_SECONDS: f32 = 1.0 / 60.0;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let preset = match options.preset.as_deref() {
        Some(path) => {
            let xml = fs::read_to_string(path)
                .with_context(|| format!("failed to read preset {path}"))?;
            let preset = Preset::from_xml(&xml)
                .with_context(|| format!("failed to parse preset {path}"))?;
            println!("Loaded preset {path}");
            preset
        }
        None => {
            println!("Using default parameters");
            Preset::default()
        }
    };

    let rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let surface = RecordingSurface::new();
    let mut controller = FieldController::new(surface.clone(), rng, preset.galaxy, preset.stars);
    controller.start().context("failed to generate fields")?;

    let galaxy = controller.galaxy_parameters();
    println!(
        "Galaxy: {} points, {} branches, radius {:.2}",
        galaxy.count, galaxy.branches, galaxy.radius
    );
    let stars = controller.star_parameters();
    println!("Stars: {} points, radius {:.2}", stars.count, stars.radius);

    for change in &options.changes {
        match change.apply(&mut controller) {
            Ok(()) => println!("Applied {}", change.source),
            Err(err) => return Err(err.context(format!("failed to apply {}", change.source))),
        }
    }

    for frame in 0..options.frames {
        controller.present(frame as f32 * FRAME_SECONDS);
    }
    if options.frames > 0 {
        println!("Presented {} frame(s)", options.frames);
    }

    print_final_state(&controller);
    println!(
        "Surface: {} publish(es), {} release(s), {} live",
        surface.publish_count(),
        surface.release_count(),
        surface.live_count()
    );
    controller.clear();
    info!("released all fields");
    Ok(())
}

fn print_final_state(controller: &FieldController<RecordingSurface, StdRng>) {
    println!("Final field states:");
    for kind in [FieldKind::Galaxy, FieldKind::Stars] {
        let Some(resource) = controller.current(kind) else {
            continue;
        };
        let buffers = resource.buffers();
        let (min, max) = buffers.bounds().unwrap_or((Vec3::ZERO, Vec3::ZERO));
        println!(
            " - {kind} points={} generation={} min=({:.2}, {:.2}, {:.2}) max=({:.2}, {:.2}, {:.2})",
            buffers.len(),
            controller.generation(kind),
            min.x,
            min.y,
            min.z,
            max.x,
            max.y,
            max.z
        );
    }
}

enum FieldChange {
    Galaxy(GalaxyChange),
    Stars(StarFieldChange),
}

struct ParsedChange {
    source: String,
    change: FieldChange,
}

impl ParsedChange {
    fn parse(text: &str) -> Result<Self> {
        let (target, value) = text
            .split_once('=')
            .ok_or_else(|| anyhow!("expected FIELD.KEY=VALUE, got `{text}`"))?;
        let change = match target.split_once('.') {
            Some(("galaxy", key)) => FieldChange::Galaxy(GalaxyChange::parse(key, value)?),
            Some(("stars", key)) => FieldChange::Stars(StarFieldChange::parse(key, value)?),
            _ => {
                return Err(anyhow!(
                    "unknown field in `{text}`; expected galaxy.KEY or stars.KEY"
                ))
            }
        };
        Ok(Self {
            source: text.to_string(),
            change,
        })
    }

    fn apply(&self, controller: &mut FieldController<RecordingSurface, StdRng>) -> Result<()> {
        match self.change {
            FieldChange::Galaxy(change) => {
                controller.apply_galaxy_change(change, ChangePhase::Settled)?;
            }
            FieldChange::Stars(change) => {
                controller.apply_stars_change(change, ChangePhase::Settled)?;
            }
        }
        Ok(())
    }
}

struct CliOptions {
    preset: Option<String>,
    seed: Option<u64>,
    frames: u32,
    changes: Vec<ParsedChange>,
}

impl CliOptions {
    const USAGE: &'static str =
        "Usage: galaxy-field [preset.xml] [--seed N] [--frames N] [--set galaxy.KEY=VALUE]...";

    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let mut options = Self {
            preset: None,
            seed: None,
            frames: 0,
            changes: Vec::new(),
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--seed" => {
                    let value = next_value(&mut args, "--seed")?;
                    options.seed = Some(
                        value
                            .parse()
                            .with_context(|| format!("invalid seed `{value}`"))?,
                    );
                }
                "--frames" => {
                    let value = next_value(&mut args, "--frames")?;
                    options.frames = value
                        .parse()
                        .with_context(|| format!("invalid frame count `{value}`"))?;
                }
                "--set" => {
                    let value = next_value(&mut args, "--set")?;
                    options.changes.push(ParsedChange::parse(&value)?);
                }
                "--help" | "-h" => return Err(anyhow!(Self::USAGE)),
                other if other.starts_with("--") => {
                    return Err(anyhow!("Unknown argument: {other}. {}", Self::USAGE));
                }
                path => {
                    if options.preset.replace(path.to_string()).is_some() {
                        return Err(anyhow!("only one preset file may be given"));
                    }
                }
            }
        }
        Ok(options)
    }
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{flag} expects a value. {}", CliOptions::USAGE))
}
