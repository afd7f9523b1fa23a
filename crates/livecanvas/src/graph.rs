use std::f64::consts::TAU;
use std::fmt;
use std::io::{self, BufReader};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use drawconfig::{CanvasConfig, GraphSection};
use ingest::{IngestOutcome, IngestTarget, IngestWorker, StateCell};
use refqueue::{Operation, OperationQueue, REF_PREFIX};
use scheduler::render_channel;
use serde_json::{json, Value};

use crate::cli::{GraphArgs, RunArgs};
use crate::run::Canvas;

const BACKGROUND: &str = "background";
const GRID_LINES: u32 = 10;
const HEADROOM: f64 = 1.05;
const IDLE_POLL: Duration = Duration::from_millis(250);

const GRID_COLOR: &str = "#333333";
const AXIS_COLOR: &str = "#666666";
const DATA_COLOR: &str = "#4488ff";
const ERROR_COLOR: &str = "#ff5555";

/// Samples read so far, plus the read failure that ended ingest, if any.
#[derive(Debug, Default)]
pub struct Series {
    points: Vec<f64>,
    failure: Option<String>,
}

impl Series {
    pub fn points(&self) -> &[f64] {
        &self.points
    }
}

impl IngestTarget for Series {
    fn with_sample(mut self, value: f64) -> Self {
        self.points.push(value);
        self
    }

    fn with_failure(mut self, message: String) -> Self {
        self.failure = Some(message);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub count: usize,
    pub average: f64,
}

impl SeriesStats {
    pub fn of(points: &[f64]) -> Self {
        let count = points.len();
        let average = if count == 0 {
            0.0
        } else {
            points.iter().sum::<f64>() / count as f64
        };
        Self { count, average }
    }
}

impl fmt::Display for SeriesStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Points: {}   Average: {:.2}", self.count, self.average)
    }
}

#[derive(Debug, Clone, Copy)]
struct Layout {
    width: f64,
    height: f64,
    padding: f64,
    point_radius: f64,
}

impl Layout {
    fn from_section(section: &GraphSection) -> Self {
        Self {
            width: f64::from(section.width),
            height: f64::from(section.height),
            padding: f64::from(section.padding),
            point_radius: section.point_radius,
        }
    }

    fn plot_width(&self) -> f64 {
        self.width - 2.0 * self.padding
    }

    fn plot_height(&self) -> f64 {
        self.height - 2.0 * self.padding
    }

    fn baseline(&self) -> f64 {
        self.height - self.padding
    }
}

fn background_ref() -> Value {
    json!(format!("{REF_PREFIX}{BACKGROUND}"))
}

/// Creates the background gradient once and keeps it in the surface's
/// reference table for every later frame.
fn push_background(queue: &mut OperationQueue, layout: &Layout) {
    queue.push(
        Operation::new(
            "createLinearGradient",
            vec![json!(0), json!(0), json!(0), json!(layout.height)],
        )
        .capture(BACKGROUND),
    );
    queue.append("addColorStop", vec![background_ref(), json!(0), json!("#1c1f26")]);
    queue.append("addColorStop", vec![background_ref(), json!(1), json!("#0b0c10")]);
}

fn stroke_line(queue: &mut OperationQueue, from: (f64, f64), to: (f64, f64)) {
    queue.append("beginPath", Vec::new());
    queue.append("moveTo", vec![json!(from.0), json!(from.1)]);
    queue.append("lineTo", vec![json!(to.0), json!(to.1)]);
    queue.append("stroke", Vec::new());
}

fn push_frame(queue: &mut OperationQueue, layout: &Layout, series: &Series) {
    let (w, h, p) = (layout.width, layout.height, layout.padding);

    queue.append("clearRect", vec![json!(0), json!(0), json!(w), json!(h)]);
    queue.append("fillStyle", vec![background_ref()]);
    queue.append("fillRect", vec![json!(0), json!(0), json!(w), json!(h)]);

    if let Some(message) = &series.failure {
        queue.append("fillStyle", vec![json!(ERROR_COLOR)]);
        queue.append("font", vec![json!("14px sans-serif")]);
        queue.append(
            "fillText",
            vec![json!(format!("ingest failed: {message}")), json!(p), json!(p / 2.0)],
        );
    }

    let points = series.points();
    if points.is_empty() {
        return;
    }

    queue.append("strokeStyle", vec![json!(GRID_COLOR)]);
    queue.append("lineWidth", vec![json!(1)]);
    let steps = f64::from(GRID_LINES - 1);
    for i in 0..GRID_LINES {
        let x = p + f64::from(i) * layout.plot_width() / steps;
        stroke_line(queue, (x, p), (x, layout.baseline()));
    }
    for i in 0..GRID_LINES {
        let y = p + f64::from(i) * layout.plot_height() / steps;
        stroke_line(queue, (p, y), (w - p, y));
    }

    queue.append("beginPath", Vec::new());
    queue.append("strokeStyle", vec![json!(AXIS_COLOR)]);
    queue.append("lineWidth", vec![json!(2)]);
    queue.append("moveTo", vec![json!(p), json!(p)]);
    queue.append("lineTo", vec![json!(p), json!(layout.baseline())]);
    queue.append("moveTo", vec![json!(p), json!(layout.baseline())]);
    queue.append("lineTo", vec![json!(w - p), json!(layout.baseline())]);
    queue.append("stroke", Vec::new());

    let peak = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // A series with no positive value has no meaningful headroom.
    let ceiling = if peak > 0.0 { peak * HEADROOM } else { 1.0 };
    let x_scale = layout.plot_width() / (points.len().saturating_sub(1).max(1)) as f64;
    let y_scale = layout.plot_height() / ceiling;
    let position = |i: usize, value: f64| {
        (
            p + i as f64 * x_scale,
            layout.baseline() - value * y_scale,
        )
    };

    queue.append("beginPath", Vec::new());
    queue.append("strokeStyle", vec![json!(DATA_COLOR)]);
    queue.append("lineWidth", vec![json!(2)]);
    for (i, &value) in points.iter().enumerate() {
        let (x, y) = position(i, value);
        let primitive = if i == 0 { "moveTo" } else { "lineTo" };
        queue.append(primitive, vec![json!(x), json!(y)]);
    }
    queue.append("stroke", Vec::new());

    for (i, &value) in points.iter().enumerate() {
        let (x, y) = position(i, value);
        queue.append("beginPath", Vec::new());
        queue.append("fillStyle", vec![json!(DATA_COLOR)]);
        queue.append(
            "arc",
            vec![json!(x), json!(y), json!(layout.point_radius), json!(0), json!(TAU)],
        );
        queue.append("fill", Vec::new());
    }
}

struct GraphView {
    layout: Layout,
    canvas: Canvas,
    background_ready: bool,
    frames: u64,
}

impl GraphView {
    fn new(layout: Layout, canvas: Canvas) -> Self {
        Self {
            layout,
            canvas,
            background_ready: false,
            frames: 0,
        }
    }

    fn redraw(&mut self, series: &Series) -> Result<()> {
        let mut queue = OperationQueue::new();
        let creating_background = !self.background_ready;
        if creating_background {
            push_background(&mut queue, &self.layout);
        }
        push_frame(&mut queue, &self.layout, series);
        let queued = queue.len();

        let report = self.canvas.draw(queue)?;
        if creating_background {
            self.background_ready = report.results().first().is_some_and(|result| result.success);
        }
        self.frames += 1;
        tracing::debug!(
            frame = self.frames,
            points = series.points().len(),
            queued,
            executed = report.executed(),
            failures = report.failures().count(),
            "graph redrawn"
        );
        Ok(())
    }
}

pub fn run(run_args: &RunArgs, config: &CanvasConfig, args: GraphArgs) -> Result<()> {
    let mut config = config.clone();
    if let Some((width, height)) = args.size {
        config.graph.width = width;
        config.graph.height = height;
    }
    config.validate().context("invalid graph settings")?;

    let canvas = Canvas::mount(
        "graph",
        config.graph.width,
        config.graph.height,
        &config,
        run_args.emit_ops,
    );
    let mut view = GraphView::new(Layout::from_section(&config.graph), canvas);

    let mut series = StateCell::new(Series::default());
    let (signal, requests) = render_channel();
    let mut worker = IngestWorker::new(series.handle(), signal);
    worker
        .start(BufReader::new(io::stdin()))
        .context("failed to spawn ingest thread")?;
    tracing::info!("reading samples from stdin");

    loop {
        requests.wait_timeout(IDLE_POLL);
        // Read before applying: everything the worker sent is queued by the
        // time it reports itself finished.
        let finished = !worker.is_active();
        if series.apply_pending() > 0 {
            view.redraw(series.get())?;
        }
        if finished {
            break;
        }
    }

    let summary = worker.join().context("ingest worker was never started")?;
    tracing::info!(
        lines = summary.lines,
        skipped = summary.skipped,
        frames = view.frames,
        "input closed"
    );
    if let Some(surface) = view.canvas.retire() {
        tracing::debug!(
            fills = surface.fill_count(),
            strokes = surface.stroke_count(),
            "graph surface released"
        );
    }

    if let IngestOutcome::Failed(message) = summary.outcome {
        bail!("ingest failed: {message}");
    }
    println!("{}", SeriesStats::of(series.get().points()));
    Ok(())
}
