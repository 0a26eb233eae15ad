//! Track feature patches through a recorded event-camera stream.
//!
//! Events are read from a plain text file (one `t x y polarity` line per
//! event), seeds from the command line or a seed file (`t,x,y,theta[,id]`
//! lines). One tracker per seed is run sequentially over the stream;
//! states are recorded on every state change and written out as
//! `t,x,y,theta,id` lines.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};

use patch_tracker::initialize::{initialize_tracker_centered, initialize_tracker_regular};
use patch_tracker::{
    CorrelationTracker, EventUpdate, HasteCorrelationTracker, HasteDifferenceStarTracker,
    HasteDifferenceTracker, HypothesisTracker, Location, PATCH_SIZE_HALF,
};
use patch_tracker_types::{Event, FeatureSeed, Polarity};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum TrackerType {
    Correlation,
    HasteCorrelation,
    HasteDifference,
    HasteDifferenceStar,
}

#[derive(Debug, Clone, Copy)]
struct CameraSize {
    width: u32,
    height: u32,
}

impl std::str::FromStr for CameraSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .with_context(|| format!("camera size must be WIDTHxHEIGHT, got \"{s}\""))?;
        Ok(CameraSize {
            width: w.trim().parse().context("camera width")?,
            height: h.trim().parse().context("camera height")?,
        })
    }
}

impl std::fmt::Display for CameraSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Parser)]
#[command(name = "patch-tracker-cli", version, about)]
struct Opt {
    /// Plain text event file; each line is `t x y polarity`.
    #[arg(long)]
    events_file: PathBuf,

    /// Single tracking seed as `t,x,y,theta[,id]`.
    #[arg(long, required_unless_present = "seeds_file", conflicts_with = "seeds_file")]
    seed: Option<FeatureSeed>,

    /// Plain text file with one seed per line.
    #[arg(long)]
    seeds_file: Option<PathBuf>,

    /// Load only the first n events from the event file.
    #[arg(long)]
    num_events: Option<usize>,

    /// Tracking algorithm.
    #[arg(long, value_enum)]
    tracker_type: TrackerType,

    /// Collect half the event window from before the seed so the tracker
    /// initializes as close to the seed as possible, instead of
    /// arbitrarily later.
    #[arg(long)]
    centered_initialization: bool,

    /// Image sensor resolution as WIDTHxHEIGHT.
    #[arg(long, default_value_t = CameraSize { width: 240, height: 180 })]
    camera_size: CameraSize,

    /// Write the recorded tracking states (t,x,y,theta,id) to this file.
    #[arg(long)]
    output_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    t: f64,
    x: f32,
    y: f32,
    p: u8,
}

fn load_events(path: &Path, limit: Option<usize>) -> anyhow::Result<Vec<Event>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b' ')
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening event file {}", path.display()))?;

    let mut events = Vec::new();
    for result in reader.deserialize() {
        let record: EventRecord =
            result.with_context(|| format!("parsing event file {}", path.display()))?;
        let p = Polarity::try_from(record.p)?;
        events.push(Event {
            t: record.t,
            x: record.x,
            y: record.y,
            p,
        });
        if Some(events.len()) == limit {
            break;
        }
    }
    Ok(events)
}

fn load_seeds(opt: &Opt) -> anyhow::Result<Vec<FeatureSeed>> {
    let mut seeds = if let Some(path) = &opt.seeds_file {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("opening seeds file {}", path.display()))?;
        buf.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                line.parse::<FeatureSeed>()
                    .with_context(|| format!("parsing seed line \"{line}\""))
            })
            .collect::<anyhow::Result<Vec<_>>>()?
    } else {
        vec![opt.seed.expect("clap enforces seed or seeds-file")]
    };

    // Seeds without an explicit id get their position in the file.
    for (i, seed) in seeds.iter_mut().enumerate() {
        if seed.id.is_none() {
            seed.id = Some(i as u64);
        }
    }
    Ok(seeds)
}

fn make_tracker(kind: TrackerType, seed: &FeatureSeed) -> Box<dyn HypothesisTracker> {
    match kind {
        TrackerType::Correlation => {
            Box::new(CorrelationTracker::new(seed.t, seed.x, seed.y, seed.theta))
        }
        TrackerType::HasteCorrelation => Box::new(HasteCorrelationTracker::new(
            seed.t, seed.x, seed.y, seed.theta,
        )),
        TrackerType::HasteDifference => Box::new(HasteDifferenceTracker::new(
            seed.t, seed.x, seed.y, seed.theta,
        )),
        TrackerType::HasteDifferenceStar => Box::new(HasteDifferenceStarTracker::new(
            seed.t, seed.x, seed.y, seed.theta,
        )),
    }
}

fn current_state(tracker: &dyn HypothesisTracker, id: u64) -> FeatureSeed {
    FeatureSeed::new(
        tracker.t(),
        tracker.x(),
        tracker.y(),
        tracker.theta(),
        Some(id),
    )
}

/// Stop tracking once the patch center leaves the image by its own half
/// size.
fn outside_frame(tracker: &dyn HypothesisTracker, camera: &CameraSize) -> bool {
    let margin = PATCH_SIZE_HALF as Location;
    !(tracker.x() >= margin
        && tracker.y() >= margin
        && tracker.x() + margin < camera.width as Location
        && tracker.y() + margin < camera.height as Location)
}

fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let opt = Opt::parse();

    let events = load_events(&opt.events_file, opt.num_events)?;
    anyhow::ensure!(!events.is_empty(), "no events were loaded");
    info!(count = events.len(), "loaded events");

    let seeds = load_seeds(&opt)?;
    info!(count = seeds.len(), "loaded seeds");

    let mut recorded: Vec<FeatureSeed> = Vec::new();

    for seed in &seeds {
        let id = seed.id.unwrap_or(0);
        let mut tracker = make_tracker(opt.tracker_type, seed);
        info!(
            id,
            tracker = tracker.name(),
            t = seed.t,
            x = seed.x,
            y = seed.y,
            theta = seed.theta,
            "starting tracker"
        );

        let init_result = if opt.centered_initialization {
            initialize_tracker_centered(&events, tracker.as_mut())
        } else {
            initialize_tracker_regular(&events, tracker.as_mut())
        };
        let next = match init_result {
            Ok(next) => next,
            Err(err) => {
                warn!(id, %err, "tracker could not be initialized; skipping seed");
                continue;
            }
        };
        info!(
            id,
            t = tracker.t(),
            x = tracker.x(),
            y = tracker.y(),
            theta = tracker.theta(),
            "tracker initialized"
        );
        recorded.push(current_state(tracker.as_ref(), id));

        for event in &events[next..] {
            if tracker.push_event(event.t, event.x, event.y) == EventUpdate::StateChange {
                recorded.push(current_state(tracker.as_ref(), id));
                if outside_frame(tracker.as_ref(), &opt.camera_size) {
                    info!(id, x = tracker.x(), y = tracker.y(), "feature left the image");
                    break;
                }
            }
        }
    }

    if let Some(path) = &opt.output_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating output file {}", path.display()))?;
        let mut writer = std::io::BufWriter::new(file);
        for state in &recorded {
            writeln!(writer, "{state}")?;
        }
        info!(count = recorded.len(), path = %path.display(), "wrote tracking states");
    }

    Ok(())
}
