use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use drawconfig::CanvasConfig;
use refqueue::{CanvasSurface, DrainPolicy, DrainReport, OperationQueue, SurfaceHost, SurfaceId};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

pub fn load_config(args: &RunArgs) -> Result<CanvasConfig> {
    let mut config = match args.config.as_ref() {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            let config = CanvasConfig::from_toml_str(&raw)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded canvas configuration");
            config
        }
        None => CanvasConfig::default(),
    };

    if let Some(policy) = args.drain_policy {
        config.drain.policy = policy;
    }
    Ok(config)
}

/// One mounted canvas plus the optional stdout log of its calls.
pub struct Canvas {
    host: SurfaceHost<CanvasSurface>,
    id: SurfaceId,
    emit_ops: bool,
}

impl Canvas {
    pub fn mount(
        name: &str,
        width: u32,
        height: u32,
        config: &CanvasConfig,
        emit_ops: bool,
    ) -> Self {
        let mut host = SurfaceHost::new(DrainPolicy::from(config.drain.policy));
        let id = SurfaceId::new(name);
        host.mount(id.clone(), CanvasSurface::new(width, height));
        tracing::debug!(surface = %id, width, height, policy = ?host.policy(), "canvas mounted");
        Self { host, id, emit_ops }
    }

    /// Drains `queue` against the canvas and forwards the executed calls.
    pub fn draw(&mut self, queue: OperationQueue) -> Result<DrainReport> {
        let report = self.host.drain(&self.id, queue.freeze())?;
        let surface = self
            .host
            .surface_mut(&self.id)
            .with_context(|| format!("surface '{}' vanished during a draw", self.id))?;
        let calls = surface.take_calls();

        if self.emit_ops {
            let mut out = io::stdout().lock();
            for call in &calls {
                serde_json::to_writer(&mut out, call).context("failed to encode surface call")?;
                out.write_all(b"\n").context("failed to write surface call")?;
            }
            out.flush().context("failed to flush surface calls")?;
        }
        Ok(report)
    }

    /// Unmounts the canvas; its reference table goes with it.
    pub fn retire(mut self) -> Option<CanvasSurface> {
        let surface = self.host.retire(&self.id);
        tracing::debug!(surface = %self.id, "canvas retired");
        surface
    }
}
