//! Build Sim - headless placement harness
//!
//! Drives the placement engine from a line-based script so building rules
//! can be exercised without a renderer.
//!
//! Run with: `cargo run --bin build_sim -- --script town.txt`
//!
//! Script commands (one per line, `#` starts a comment):
//! - `select <id>` / `next` / `prev`: choose the cursor template
//! - `rotate cw|ccw`: turn the cursor a quarter step
//! - `cursor <x> <z>`: move the cursor to a world position
//! - `player <x> <z>` / `player none`: set the occupant position
//! - `commit`: apply the cursor tool
//! - `place <id> <x> <z> [degrees]`: place directly
//! - `remove <x> <z>`: remove the structure under a position
//! - `map`: print the occupied area with doorway states
//!
//! Rejections are logged and the script continues; a consistency failure
//! stops the run with a non-zero exit code.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glam::Vec3;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use hearthgrid_engine::game::{
    BuildConfig, BuildCursor, ConfigError, DoorwaySink, DoorwayState, DoorwayUpdate,
    PlacementEngine, PlacementError, Structure, StructureId,
};
use hearthgrid_engine::world::{HalfGridIndex, Orientation};

#[derive(Parser, Debug)]
#[command(name = "build_sim", about = "Headless grid building simulation")]
struct Args {
    /// Build config JSON; the built-in catalogue is used when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Script file; commands are read from stdin when omitted
    #[arg(long)]
    script: Option<PathBuf>,
    /// Print the effective config as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

#[derive(Debug, Error)]
enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read script: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: {source}")]
    Internal {
        line: usize,
        #[source]
        source: PlacementError,
    },
}

/// Counts sink events; a long script keeps constant memory.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct TallySink {
    placed: usize,
    removed: usize,
    doorway_updates: usize,
    doorway_flips: usize,
}

impl DoorwaySink for TallySink {
    fn doorway_changed(&mut self, update: &DoorwayUpdate) {
        self.doorway_updates += 1;
        if update.changed {
            self.doorway_flips += 1;
        }
    }

    fn structure_placed(&mut self, _structure: &Structure) {
        self.placed += 1;
    }

    fn structure_removed(&mut self, _structure: StructureId) {
        self.removed += 1;
    }
}

struct Session {
    engine: PlacementEngine<TallySink>,
    cursor: BuildCursor,
    player: Option<Vec3>,
}

impl Session {
    fn new(config: &BuildConfig) -> Result<Self, SimError> {
        Ok(Self {
            engine: config.engine_with_sink(TallySink::default())?,
            cursor: BuildCursor::new(),
            player: None,
        })
    }

    fn execute(&mut self, line: usize, text: &str) -> Result<(), SimError> {
        let parse_err = |message: &str| SimError::Parse {
            line,
            message: message.to_string(),
        };
        let words: Vec<&str> = text.split_whitespace().collect();
        let Some((&command, rest)) = words.split_first() else {
            return Ok(());
        };

        let outcome = match (command, rest) {
            ("select", [id]) => {
                if !self.cursor.select(self.engine.library(), id) {
                    return Err(parse_err(&format!("unknown template '{id}'")));
                }
                Ok(())
            }
            ("next", []) => {
                self.cursor.select_next(self.engine.library());
                Ok(())
            }
            ("prev", []) => {
                self.cursor.select_previous(self.engine.library());
                Ok(())
            }
            ("rotate", ["cw"]) => {
                self.cursor.rotate_cw();
                Ok(())
            }
            ("rotate", ["ccw"]) => {
                self.cursor.rotate_ccw();
                Ok(())
            }
            ("cursor", [x, z]) => {
                let hit = parse_point(x, z).ok_or_else(|| parse_err("expected <x> <z>"))?;
                self.cursor.follow(self.engine.config(), hit);
                if let Some(target) = self.cursor.highlighted(&self.engine) {
                    info!(structure = %target.id(), template = target.template().id(), "cursor_highlight");
                }
                Ok(())
            }
            ("player", ["none"]) => {
                self.player = None;
                Ok(())
            }
            ("player", [x, z]) => {
                self.player = Some(parse_point(x, z).ok_or_else(|| parse_err("expected <x> <z>"))?);
                Ok(())
            }
            ("commit", []) => self.cursor.commit(&mut self.engine, self.player).map(|_| ()),
            ("place", [id, x, z, degrees @ ..]) => {
                let position = parse_point(x, z).ok_or_else(|| parse_err("expected <x> <z>"))?;
                let orientation = match degrees {
                    [] => Orientation::Deg0,
                    [d] => d
                        .parse()
                        .ok()
                        .and_then(Orientation::from_degrees)
                        .ok_or_else(|| parse_err("orientation must be a multiple of 90"))?,
                    _ => return Err(parse_err("too many arguments")),
                };
                self.engine
                    .attempt_place(id, position, orientation, self.player)
                    .map(|_| ())
            }
            ("remove", [x, z]) => {
                let position = parse_point(x, z).ok_or_else(|| parse_err("expected <x> <z>"))?;
                self.engine.attempt_remove(position).map(|_| ())
            }
            ("map", []) => {
                println!("{}", render_map(&self.engine));
                Ok(())
            }
            _ => return Err(parse_err(&format!("unrecognised command '{text}'"))),
        };

        match outcome {
            Ok(()) => Ok(()),
            Err(err) if err.is_rejection() => {
                warn!(line, reason = %err, "popup");
                Ok(())
            }
            Err(source) => Err(SimError::Internal { line, source }),
        }
    }
}

fn parse_point(x: &str, z: &str) -> Option<Vec3> {
    Some(Vec3::new(x.parse().ok()?, 0.0, z.parse().ok()?))
}

/// ASCII plan view in half-grid resolution, +z at the top.
///
/// Cells show the first letter of their template; doorways show `.` when
/// passable and `+` when blocked.
fn render_map<S: DoorwaySink>(engine: &PlacementEngine<S>) -> String {
    let mut glyphs: HashMap<HalfGridIndex, char> = HashMap::new();
    for structure in engine.structures() {
        let letter = structure
            .template()
            .name()
            .chars()
            .next()
            .unwrap_or('?')
            .to_ascii_uppercase();
        for cell in structure.occupied_cells() {
            glyphs.insert(HalfGridIndex::from_cell(cell), letter);
        }
        for doorway in structure.doorways() {
            let glyph = match doorway.state {
                DoorwayState::Passable => '.',
                DoorwayState::Blocked => '+',
            };
            // A blocked side wins over a passable one
            glyphs
                .entry(doorway.position)
                .and_modify(|g| {
                    if glyph == '+' {
                        *g = '+';
                    }
                })
                .or_insert(glyph);
        }
    }
    if glyphs.is_empty() {
        return "(empty)".to_string();
    }

    let min_x = glyphs.keys().map(|h| h.x).min().unwrap_or(0) - 1;
    let max_x = glyphs.keys().map(|h| h.x).max().unwrap_or(0) + 1;
    let min_z = glyphs.keys().map(|h| h.z).min().unwrap_or(0) - 1;
    let max_z = glyphs.keys().map(|h| h.z).max().unwrap_or(0) + 1;

    let mut out = String::new();
    for z in (min_z..=max_z).rev() {
        for x in min_x..=max_x {
            out.push(*glyphs.get(&HalfGridIndex::new(x, z)).unwrap_or(&' '));
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

fn run(args: Args) -> Result<(), SimError> {
    let config = match &args.config {
        Some(path) => BuildConfig::load(path)?,
        None => BuildConfig::default(),
    };
    if args.dump_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let mut session = Session::new(&config)?;
    let reader: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.split('#').next().unwrap_or("").trim();
        session.execute(number + 1, text)?;
    }

    let tally = session.engine.sink();
    info!(
        structures = session.engine.structures().len(),
        placed = tally.placed,
        removed = tally.removed,
        doorway_updates = tally.doorway_updates,
        doorway_flips = tally.doorway_flips,
        "sim_finished"
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "sim_failed");
            ExitCode::FAILURE
        }
    }
}
