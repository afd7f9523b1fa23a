use std::sync::Mutex;

use serde::Serialize;
use serde_json::{json, Value};

use crate::surface::{Surface, SurfaceError};
use crate::value::{Handle, RefValue};

const GRADIENT_KIND: &str = "linearGradient";

/// Paint used for fills and strokes.
#[derive(Debug, Clone, PartialEq)]
pub enum Style {
    Color(String),
    Gradient(Handle),
}

impl Default for Style {
    fn default() -> Self {
        Style::Color("#000000".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorStop {
    pub offset: f64,
    pub color: String,
}

/// Linear gradient created by `createLinearGradient`; lives behind a [`Handle`].
#[derive(Debug)]
pub struct Gradient {
    id: u64,
    line: [f64; 4],
    stops: Mutex<Vec<ColorStop>>,
}

impl Gradient {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn line(&self) -> [f64; 4] {
        self.line
    }

    pub fn stops(&self) -> Vec<ColorStop> {
        self.stops
            .lock()
            .map(|stops| stops.clone())
            .unwrap_or_default()
    }

    fn add_stop(&self, stop: ColorStop) -> Result<(), SurfaceError> {
        let mut stops = self
            .stops
            .lock()
            .map_err(|_| SurfaceError::InvalidArguments("gradient is poisoned".into()))?;
        stops.push(stop);
        stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start: f64,
        end: f64,
        counterclockwise: bool,
    },
    Close,
}

/// Drawing state affected by the style and path primitives.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasState {
    pub fill_style: Style,
    pub stroke_style: Style,
    pub line_width: f64,
    pub font: String,
    pub path: Vec<PathSegment>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            fill_style: Style::default(),
            stroke_style: Style::default(),
            line_width: 1.0,
            font: "10px sans-serif".to_string(),
            path: Vec::new(),
        }
    }
}

/// A primitive call as the surface saw it, with handles flattened to JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceCall {
    pub primitive: String,
    pub args: Vec<Value>,
}

/// In-memory 2D canvas modelled on the browser canvas API.
///
/// Nothing is rasterised; the surface tracks drawing state, counts paint
/// operations and keeps a log of every successful call.
#[derive(Debug)]
pub struct CanvasSurface {
    width: u32,
    height: u32,
    state: CanvasState,
    saved: Vec<CanvasState>,
    calls: Vec<SurfaceCall>,
    next_gradient: u64,
    fills: usize,
    strokes: usize,
    clears: usize,
}

impl CanvasSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: CanvasState::default(),
            saved: Vec::new(),
            calls: Vec::new(),
            next_gradient: 0,
            fills: 0,
            strokes: 0,
            clears: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<SurfaceCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn fill_count(&self) -> usize {
        self.fills
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes
    }

    pub fn clear_count(&self) -> usize {
        self.clears
    }

    fn apply(
        &mut self,
        primitive: &str,
        args: &Args<'_>,
    ) -> Result<Option<RefValue>, SurfaceError> {
        match primitive {
            "clearRect" => {
                args.rect()?;
                self.clears += 1;
            }
            "fillRect" => {
                args.rect()?;
                self.fills += 1;
            }
            "strokeRect" => {
                args.rect()?;
                self.strokes += 1;
            }
            "beginPath" => self.state.path.clear(),
            "closePath" => self.state.path.push(PathSegment::Close),
            "moveTo" => {
                let (x, y) = (args.number(0)?, args.number(1)?);
                self.state.path.push(PathSegment::MoveTo { x, y });
            }
            "lineTo" => {
                let (x, y) = (args.number(0)?, args.number(1)?);
                self.state.path.push(PathSegment::LineTo { x, y });
            }
            "arc" => {
                let radius = args.number(2)?;
                if radius < 0.0 {
                    return Err(args.invalid(format!("negative radius {radius}")));
                }
                let segment = PathSegment::Arc {
                    x: args.number(0)?,
                    y: args.number(1)?,
                    radius,
                    start: args.number(3)?,
                    end: args.number(4)?,
                    counterclockwise: args.optional_bool(5)?,
                };
                self.state.path.push(segment);
            }
            "stroke" => self.strokes += 1,
            "fill" => self.fills += 1,
            "fillStyle" => self.state.fill_style = args.style(0)?,
            "strokeStyle" => self.state.stroke_style = args.style(0)?,
            "lineWidth" => {
                let width = args.number(0)?;
                // Non-positive widths are ignored, as in the browser.
                if width > 0.0 {
                    self.state.line_width = width;
                }
            }
            "font" => self.state.font = args.string(0)?.to_string(),
            "fillText" => {
                args.string(0)?;
                args.number(1)?;
                args.number(2)?;
                self.fills += 1;
            }
            "save" => self.saved.push(self.state.clone()),
            "restore" => {
                if let Some(state) = self.saved.pop() {
                    self.state = state;
                }
            }
            "createLinearGradient" => {
                let line = [
                    args.number(0)?,
                    args.number(1)?,
                    args.number(2)?,
                    args.number(3)?,
                ];
                self.next_gradient += 1;
                let gradient = Gradient {
                    id: self.next_gradient,
                    line,
                    stops: Mutex::new(Vec::new()),
                };
                return Ok(Some(RefValue::Handle(Handle::new(GRADIENT_KIND, gradient))));
            }
            "addColorStop" => {
                let gradient = args.gradient(0)?;
                let offset = args.number(1)?;
                if !(0.0..=1.0).contains(&offset) {
                    return Err(args.invalid(format!("color stop offset {offset} outside 0..=1")));
                }
                gradient.add_stop(ColorStop {
                    offset,
                    color: args.string(2)?.to_string(),
                })?;
            }
            _ => return Err(SurfaceError::Unsupported),
        }
        Ok(None)
    }
}

impl Surface for CanvasSurface {
    fn invoke(
        &mut self,
        primitive: &str,
        args: &[RefValue],
    ) -> Result<Option<RefValue>, SurfaceError> {
        let value = self.apply(primitive, &Args { values: args })?;
        self.calls.push(SurfaceCall {
            primitive: primitive.to_string(),
            args: args.iter().map(flatten).collect(),
        });
        Ok(value)
    }
}

fn flatten(value: &RefValue) -> Value {
    match value {
        RefValue::Json(json) => json.clone(),
        RefValue::Handle(handle) => match handle.downcast_ref::<Gradient>() {
            Some(gradient) => json!({ "handle": handle.kind(), "id": gradient.id() }),
            None => json!({ "handle": handle.kind() }),
        },
    }
}

struct Args<'a> {
    values: &'a [RefValue],
}

impl<'a> Args<'a> {
    fn invalid(&self, reason: String) -> SurfaceError {
        SurfaceError::InvalidArguments(reason)
    }

    fn get(&self, index: usize) -> Result<&'a RefValue, SurfaceError> {
        self.values
            .get(index)
            .ok_or_else(|| self.invalid(format!("missing argument {index}")))
    }

    fn number(&self, index: usize) -> Result<f64, SurfaceError> {
        self.get(index)?
            .as_f64()
            .filter(|value| value.is_finite())
            .ok_or_else(|| self.invalid(format!("argument {index} must be a finite number")))
    }

    fn string(&self, index: usize) -> Result<&'a str, SurfaceError> {
        self.get(index)?
            .as_str()
            .ok_or_else(|| self.invalid(format!("argument {index} must be a string")))
    }

    fn optional_bool(&self, index: usize) -> Result<bool, SurfaceError> {
        match self.values.get(index) {
            None => Ok(false),
            Some(value) => value
                .as_json()
                .and_then(Value::as_bool)
                .ok_or_else(|| self.invalid(format!("argument {index} must be a boolean"))),
        }
    }

    fn rect(&self) -> Result<[f64; 4], SurfaceError> {
        Ok([
            self.number(0)?,
            self.number(1)?,
            self.number(2)?,
            self.number(3)?,
        ])
    }

    fn gradient(&self, index: usize) -> Result<&'a Gradient, SurfaceError> {
        self.get(index)?
            .as_handle()
            .and_then(|handle| handle.downcast_ref::<Gradient>())
            .ok_or_else(|| self.invalid(format!("argument {index} must be a gradient")))
    }

    fn style(&self, index: usize) -> Result<Style, SurfaceError> {
        match self.get(index)? {
            RefValue::Json(Value::String(color)) => Ok(Style::Color(color.clone())),
            RefValue::Handle(handle) if handle.downcast_ref::<Gradient>().is_some() => {
                Ok(Style::Gradient(handle.clone()))
            }
            _ => Err(self.invalid(format!(
                "argument {index} must be a color string or a gradient"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(
        canvas: &mut CanvasSurface,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Option<RefValue>, SurfaceError> {
        let args: Vec<RefValue> = args.into_iter().map(RefValue::Json).collect();
        canvas.invoke(name, &args)
    }

    #[test]
    fn path_primitives_build_the_current_path() {
        let mut canvas = CanvasSurface::new(300, 300);
        call(&mut canvas, "beginPath", vec![]).unwrap();
        call(&mut canvas, "moveTo", vec![json!(1), json!(2)]).unwrap();
        call(&mut canvas, "lineTo", vec![json!(3.5), json!(4)]).unwrap();
        call(&mut canvas, "stroke", vec![]).unwrap();

        assert_eq!(
            canvas.state().path,
            vec![
                PathSegment::MoveTo { x: 1.0, y: 2.0 },
                PathSegment::LineTo { x: 3.5, y: 4.0 },
            ]
        );
        assert_eq!(canvas.stroke_count(), 1);

        call(&mut canvas, "beginPath", vec![]).unwrap();
        assert!(canvas.state().path.is_empty());
    }

    #[test]
    fn rejects_bad_arguments() {
        let mut canvas = CanvasSurface::new(10, 10);
        assert!(matches!(
            call(&mut canvas, "moveTo", vec![json!("a"), json!(1)]),
            Err(SurfaceError::InvalidArguments(_))
        ));
        assert!(matches!(
            call(&mut canvas, "arc", vec![json!(1), json!(1), json!(-1), json!(0), json!(1)]),
            Err(SurfaceError::InvalidArguments(_))
        ));
        assert!(matches!(
            call(&mut canvas, "lineTo", vec![json!(1)]),
            Err(SurfaceError::InvalidArguments(_))
        ));
        assert_eq!(
            call(&mut canvas, "drawImage", vec![]),
            Err(SurfaceError::Unsupported)
        );
        assert!(canvas.calls().is_empty(), "failed calls are not logged");
    }

    #[test]
    fn styles_and_line_width() {
        let mut canvas = CanvasSurface::new(10, 10);
        call(&mut canvas, "fillStyle", vec![json!("#4488ff")]).unwrap();
        call(&mut canvas, "lineWidth", vec![json!(2)]).unwrap();
        call(&mut canvas, "lineWidth", vec![json!(0)]).unwrap();
        assert_eq!(canvas.state().fill_style, Style::Color("#4488ff".into()));
        assert_eq!(canvas.state().line_width, 2.0);
    }

    #[test]
    fn save_and_restore_round_the_state() {
        let mut canvas = CanvasSurface::new(10, 10);
        call(&mut canvas, "save", vec![]).unwrap();
        call(&mut canvas, "strokeStyle", vec![json!("red")]).unwrap();
        call(&mut canvas, "restore", vec![]).unwrap();
        call(&mut canvas, "restore", vec![]).unwrap();
        assert_eq!(canvas.state().stroke_style, Style::default());
    }

    #[test]
    fn gradients_are_handles_with_sorted_stops() {
        let mut canvas = CanvasSurface::new(100, 100);
        let handle = call(
            &mut canvas,
            "createLinearGradient",
            vec![json!(0), json!(0), json!(0), json!(100)],
        )
        .unwrap()
        .and_then(|value| value.as_handle().cloned())
        .expect("gradient handle");
        assert_eq!(handle.kind(), "linearGradient");

        let gradient_arg = RefValue::Handle(handle.clone());
        canvas
            .invoke(
                "addColorStop",
                &[gradient_arg.clone(), RefValue::Json(json!(1)), RefValue::Json(json!("#000"))],
            )
            .unwrap();
        canvas
            .invoke(
                "addColorStop",
                &[gradient_arg.clone(), RefValue::Json(json!(0)), RefValue::Json(json!("#222"))],
            )
            .unwrap();
        assert!(canvas
            .invoke(
                "addColorStop",
                &[gradient_arg.clone(), RefValue::Json(json!(2)), RefValue::Json(json!("#fff"))],
            )
            .is_err());
        canvas.invoke("fillStyle", &[gradient_arg]).unwrap();

        let gradient = handle.downcast_ref::<Gradient>().unwrap();
        let offsets: Vec<f64> = gradient.stops().iter().map(|stop| stop.offset).collect();
        assert_eq!(offsets, vec![0.0, 1.0]);
        assert_eq!(canvas.state().fill_style, Style::Gradient(handle));

        let logged = canvas.calls().last().unwrap();
        assert_eq!(logged.args, vec![json!({ "handle": "linearGradient", "id": 1 })]);
    }

    #[test]
    fn take_calls_empties_the_log() {
        let mut canvas = CanvasSurface::new(10, 10);
        call(&mut canvas, "clearRect", vec![json!(0), json!(0), json!(10), json!(10)]).unwrap();
        let calls = canvas.take_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].primitive, "clearRect");
        assert!(canvas.calls().is_empty());
        assert_eq!(canvas.clear_count(), 1);
    }
}
