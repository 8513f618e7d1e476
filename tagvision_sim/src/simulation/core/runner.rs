// tagvision_sim/src/simulation/core/runner.rs

use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tagvision_core::cache::DetectionCache;
use tagvision_core::mapping::FieldMap;
use tagvision_core::types::FrameSource;
use tagvision_core::vision::TagVision;

use crate::error::Result;
use crate::simulation::config::{load_scenario, ScenarioConfig, VisionConfig};
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::core::trajectory::Trajectory;
use crate::simulation::plugins::debugging::state_error::{ErrorStats, ErrorSummary};
use crate::simulation::plugins::sensors::camera::SyntheticCamera;

// =========================================================================
// == Run Options & Report ==
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Camera on its own thread, control loop on the caller's.
    #[default]
    Threaded,
    /// Single thread, frames released once their latency has elapsed.
    Lockstep,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub mode: RunMode,
    /// Overrides `duration_seconds * control_rate_hz`.
    pub cycles: Option<u64>,
    /// Overrides `simulation.time_scale` (threaded mode only).
    pub time_scale: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mode: RunMode,
    pub cycles: u64,
    pub frames_captured: u64,
    pub best_target_cycles: u64,
    pub translation: ErrorSummary,
    pub rotation_deg: ErrorSummary,
    pub no_estimate_cycles: u64,
    pub stale_cycles: u64,
    pub wall_time: Duration,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:?} run: {} cycles, {} frames captured, {:.3}s wall",
            self.mode,
            self.cycles,
            self.frames_captured,
            self.wall_time.as_secs_f64()
        )?;
        writeln!(f, "  position error (m):   {}", self.translation)?;
        writeln!(f, "  attitude error (deg): {}", self.rotation_deg)?;
        write!(
            f,
            "  best target: {} cycles | no estimate: {} | stale: {}",
            self.best_target_cycles, self.no_estimate_cycles, self.stale_cycles
        )
    }
}

// =========================================================================
// == Control Loop ==
// =========================================================================

/// What the robot program does once per period.
struct ControlLoop<'a> {
    vision: &'a TagVision,
    trajectory: &'a Trajectory,
    settings: &'a VisionConfig,
    stats: ErrorStats,
    cycles: u64,
    best_target_cycles: u64,
}

impl<'a> ControlLoop<'a> {
    fn new(vision: &'a TagVision, trajectory: &'a Trajectory, settings: &'a VisionConfig) -> Self {
        Self {
            vision,
            trajectory,
            settings,
            stats: ErrorStats::default(),
            cycles: 0,
            best_target_cycles: 0,
        }
    }

    fn step(&mut self, feed: &dyn FrameSource, now: f64) {
        self.cycles += 1;

        let Some(frame) = self.vision.update_from(feed) else {
            self.stats.record_no_estimate();
            return;
        };
        if frame.is_stale(now, self.settings.max_frame_age_s) {
            tracing::trace!(now, age = frame.age(now), "skipping stale frame");
            self.stats.record_stale();
            return;
        }

        let estimates = self.vision.robot_pose_estimates(self.settings.max_ambiguity);
        if estimates.is_empty() {
            self.stats.record_no_estimate();
            return;
        }
        for estimate in &estimates {
            let truth = self.trajectory.pose_at(estimate.timestamp);
            let (position_error, attitude_error) = self.stats.record(&truth, &estimate.robot_pose);
            tracing::trace!(
                tag_id = estimate.tag_id,
                position_error,
                attitude_error,
                "scored estimate"
            );
        }

        let best = self.vision.best_tag_with(
            self.settings.sort_mode,
            self.settings.max_ambiguity,
            self.settings.sort_extra,
        );
        if let Some(best) = best {
            if let Some(pose) = self.vision.robot_pose(&best) {
                self.best_target_cycles += 1;
                let planar = pose.to_isometry2();
                let heading = self.vision.face_target_angle(&best, &planar);
                tracing::debug!(
                    now,
                    tag_id = best.tag_id,
                    x = planar.translation.x,
                    y = planar.translation.y,
                    face_target_deg = heading.map(|h| h.angle().to_degrees()),
                    "best target"
                );
            }
        }
    }
}

// =========================================================================
// == Runner ==
// =========================================================================

/// One configured scenario, ready to run any number of times.
#[derive(Debug)]
pub struct SimulationRunner {
    config: ScenarioConfig,
    vision: TagVision,
    camera: SyntheticCamera,
}

impl SimulationRunner {
    pub fn new(config: ScenarioConfig, field: FieldMap) -> Result<Self> {
        let rng = SimulationRng::from_seed(config.simulation.seed);
        let camera = SyntheticCamera::new(&config.camera, &field, rng)?;
        let vision = TagVision::new(config.camera.mount.to_transform())?.with_field(field);
        Ok(Self {
            config,
            vision,
            camera,
        })
    }

    /// Loads the scenario at `path` (with env overrides) and its field map.
    pub fn from_scenario_file(path: &Path) -> Result<Self> {
        let config = load_scenario(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let field = config.field.build_field_map(base_dir)?;
        Self::new(config, field)
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn vision(&self) -> &TagVision {
        &self.vision
    }

    pub fn run(&mut self, options: &RunOptions) -> RunSummary {
        let sim = &self.config.simulation;
        let cycles = options
            .cycles
            .unwrap_or_else(|| (sim.duration_seconds * sim.control_rate_hz).ceil().max(1.0) as u64);
        let time_scale = options.time_scale.unwrap_or(sim.time_scale).max(0.0);

        tracing::info!(
            "Starting {:?} run: {} cycles at {} Hz, camera '{}' at {} Hz",
            options.mode,
            cycles,
            sim.control_rate_hz,
            self.camera.name(),
            self.config.camera.rate_hz
        );

        let started = Instant::now();
        let (control, frames_captured) = match options.mode {
            RunMode::Lockstep => self.run_lockstep(cycles),
            RunMode::Threaded => self.run_threaded(cycles, time_scale),
        };

        let summary = RunSummary {
            mode: options.mode,
            cycles: control.cycles,
            frames_captured,
            best_target_cycles: control.best_target_cycles,
            translation: control.stats.translation(),
            rotation_deg: control.stats.rotation_deg(),
            no_estimate_cycles: control.stats.no_estimate_cycles(),
            stale_cycles: control.stats.stale_cycles(),
            wall_time: started.elapsed(),
        };
        tracing::info!(
            "Run complete | Pos Err RMS: {:.3}m | Att Err RMS: {:.3}° | no estimate: {} | stale: {}",
            summary.translation.rms,
            summary.rotation_deg.rms,
            summary.no_estimate_cycles,
            summary.stale_cycles
        );
        summary
    }

    /// Deterministic: one thread, simulated clock, frames held back until
    /// `capture + latency <= now`.
    fn run_lockstep(&mut self, cycles: u64) -> (ControlLoop<'_>, u64) {
        let Self {
            config,
            vision,
            camera,
        } = self;
        let trajectory = &config.robot.trajectory;
        let dt = 1.0 / config.simulation.control_rate_hz;
        let period = camera.frame_period();

        let feed = DetectionCache::new();
        let mut control = ControlLoop::new(vision, trajectory, &config.vision);
        let mut in_flight = VecDeque::new();
        let mut captured: u64 = 0;

        for cycle in 0..cycles {
            let now = cycle as f64 * dt;

            loop {
                let capture_time = captured as f64 * period;
                if capture_time > now {
                    break;
                }
                in_flight.push_back(camera.capture(&trajectory.pose_at(capture_time), capture_time));
                captured += 1;
            }
            while in_flight
                .front()
                .is_some_and(|f| f.timestamp() + f.latency_ms() / 1000.0 <= now)
            {
                if let Some(frame) = in_flight.pop_front() {
                    feed.publish(frame);
                }
            }

            control.step(&feed, now);
        }

        (control, captured)
    }

    /// The camera publishes from its own thread while the control loop polls;
    /// both pace themselves by `time_scale` (0 = no pacing).
    fn run_threaded(&mut self, cycles: u64, time_scale: f64) -> (ControlLoop<'_>, u64) {
        let Self {
            config,
            vision,
            camera,
        } = self;
        let trajectory = &config.robot.trajectory;
        let dt = 1.0 / config.simulation.control_rate_hz;
        let horizon = cycles as f64 * dt;

        let feed = DetectionCache::new();
        let done = AtomicBool::new(false);
        let mut control = ControlLoop::new(vision, trajectory, &config.vision);

        let captured = thread::scope(|scope| {
            let camera_thread = scope.spawn(|| {
                let period = camera.frame_period();
                let mut captured: u64 = 0;
                loop {
                    let capture_time = captured as f64 * period;
                    if capture_time > horizon {
                        break;
                    }
                    let frame = camera.capture(&trajectory.pose_at(capture_time), capture_time);
                    let latency = frame.latency_ms() / 1000.0;
                    pause(latency, time_scale);
                    feed.publish(frame);
                    captured += 1;
                    if done.load(Ordering::Acquire) {
                        break;
                    }
                    pause((period - latency).max(0.0), time_scale);
                }
                captured
            });

            for cycle in 0..cycles {
                control.step(&feed, cycle as f64 * dt);
                pause(dt, time_scale);
            }
            done.store(true, Ordering::Release);

            camera_thread
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        });

        (control, captured)
    }
}

/// Sleeps for `sim_seconds` of simulated time at the given scale.
fn pause(sim_seconds: f64, time_scale: f64) {
    if time_scale <= 0.0 {
        return;
    }
    if let Ok(wait) = Duration::try_from_secs_f64(sim_seconds / time_scale) {
        if !wait.is_zero() {
            thread::sleep(wait);
        }
    }
}
