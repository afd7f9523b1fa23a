use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use drawconfig::CanvasConfig;
use ingest::StateCell;
use rand::prelude::*;
use refqueue::OperationQueue;
use scheduler::{render_channel, FrameScheduler, RenderWake, WakePacer};
use serde_json::json;

use crate::cli::{ParticleArgs, RunArgs};
use crate::run::Canvas;

/// Waits longer than this without a wake are treated as a lost request.
const STALL_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub color: String,
    pub size: f64,
}

fn direction(rng: &mut StdRng) -> f64 {
    if rng.gen_bool(0.5) {
        1.0
    } else {
        -1.0
    }
}

/// Scatters `count` particles over a `width`x`height` field.
pub fn spawn(count: usize, width: u32, height: u32, rng: &mut StdRng) -> Vec<Particle> {
    (0..count)
        .map(|_| Particle {
            x: f64::from(rng.gen_range(0..width)),
            y: f64::from(rng.gen_range(0..height)),
            vx: f64::from(rng.gen_range(1..=3u8)) * direction(rng),
            vy: f64::from(rng.gen_range(1..=3u8)) * direction(rng),
            color: format!(
                "rgba({}, {}, {}, 0.7)",
                rng.gen::<u8>(),
                rng.gen::<u8>(),
                rng.gen::<u8>()
            ),
            size: f64::from(rng.gen_range(3..=12u8)),
        })
        .collect()
}

/// Moves every particle one step and bounces it off the field edges.
pub fn step(particles: Vec<Particle>, width: f64, height: f64) -> Vec<Particle> {
    particles
        .into_iter()
        .map(|mut particle| {
            particle.x += particle.vx;
            particle.y += particle.vy;
            if particle.x <= 0.0 || particle.x >= width {
                particle.vx = -particle.vx;
            }
            if particle.y <= 0.0 || particle.y >= height {
                particle.vy = -particle.vy;
            }
            particle
        })
        .collect()
}

fn frame_ops(particles: &[Particle], width: f64, height: f64) -> OperationQueue {
    let mut queue = OperationQueue::new();
    queue.append(
        "clearRect",
        vec![json!(0), json!(0), json!(width), json!(height)],
    );
    for particle in particles {
        queue.append("fillStyle", vec![json!(particle.color)]);
        queue.append("beginPath", Vec::new());
        queue.append(
            "arc",
            vec![
                json!(particle.x),
                json!(particle.y),
                json!(particle.size),
                json!(0),
                json!(TAU),
            ],
        );
        queue.append("fill", Vec::new());
    }
    queue
}

fn elapsed_ticks(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

pub fn run(run_args: &RunArgs, config: &CanvasConfig, args: ParticleArgs) -> Result<()> {
    let mut config = config.clone();
    if let Some(count) = args.count {
        config.particles.count = count;
    }
    if let Some(interval) = args.min_interval {
        config.scheduler.min_interval_ticks = interval;
    }
    config.validate().context("invalid particle settings")?;

    let field = &config.particles;
    let (width, height) = (f64::from(field.width), f64::from(field.height));
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut particles = StateCell::new(spawn(field.count, field.width, field.height, &mut rng));
    tracing::info!(count = field.count, seed, frames = args.frames, "spawning particles");

    let mut canvas = Canvas::mount(
        "particles",
        field.width,
        field.height,
        &config,
        run_args.emit_ops,
    );
    let mut frames = FrameScheduler::from_config(&config);
    let (signal, requests) = render_channel();
    let pacer = WakePacer::from_config(&config, signal.clone());
    let started = Instant::now();
    let mut rendered = 0u64;

    signal.request();
    while rendered < args.frames {
        match requests.wait_timeout(STALL_TIMEOUT) {
            RenderWake::Requested => {}
            RenderWake::TimedOut => {
                tracing::warn!("no wake arrived in time; requesting a frame");
                signal.request();
                continue;
            }
            RenderWake::Closed => break,
        }

        let tick = elapsed_ticks(started);
        if !frames.request_frame(tick) {
            tracing::trace!(tick, "frame denied");
            pacer.schedule().context("failed to spawn wake thread")?;
            continue;
        }

        particles.update(|current| step(current, width, height));
        let report = canvas.draw(frame_ops(particles.get(), width, height))?;
        rendered += 1;
        tracing::debug!(
            frame = rendered,
            tick,
            failures = report.failures().count(),
            "particles drawn"
        );
        pacer.schedule().context("failed to spawn wake thread")?;
    }

    canvas.retire();
    println!("Frames: {rendered}");
    Ok(())
}
