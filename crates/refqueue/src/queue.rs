use drawconfig::DrainPolicySetting;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OpError;
use crate::refs::ReferenceTable;
use crate::resolve::resolve_params;
use crate::surface::Surface;
use crate::value::RefValue;

/// Pseudo-op storing data in the reference table without touching the surface.
pub const ADD_REF: &str = "addRef";
/// Pseudo-op removing an entry from the reference table.
pub const DROP_REF: &str = "dropRef";

/// One deferred drawing command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub op: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_as: Option<String>,
}

impl Operation {
    pub fn new(op: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            op: op.into(),
            params,
            capture_as: None,
        }
    }

    pub fn capture(mut self, id: impl Into<String>) -> Self {
        self.capture_as = Some(id.into());
        self
    }

    fn is_pseudo(&self) -> bool {
        matches!(self.op.as_str(), ADD_REF | DROP_REF)
    }
}

/// What a drain does once an operation has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainPolicy {
    /// Record the failure and keep going; visual output is best-effort.
    #[default]
    Continue,
    /// Stop at the first failure and mark the remainder as skipped.
    AbortQueue,
}

impl From<DrainPolicySetting> for DrainPolicy {
    fn from(setting: DrainPolicySetting) -> Self {
        match setting {
            DrainPolicySetting::Continue => DrainPolicy::Continue,
            DrainPolicySetting::Abort => DrainPolicy::AbortQueue,
        }
    }
}

/// Outcome of one drained operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OpResult {
    pub success: bool,
    pub value: Option<RefValue>,
    pub error: Option<OpError>,
}

impl OpResult {
    fn ok(value: Option<RefValue>) -> Self {
        Self {
            success: true,
            value,
            error: None,
        }
    }

    fn failed(error: OpError) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(error),
        }
    }
}

/// Append-only buffer of operations built during one update.
///
/// Appending never touches a surface or a reference table.
#[derive(Debug, Default, Clone)]
pub struct OperationQueue {
    ops: Vec<Operation>,
}

impl OperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: Operation) {
        self.ops.push(op);
    }

    pub fn append(&mut self, name: impl Into<String>, params: Vec<Value>) {
        self.push(Operation::new(name, params));
    }

    pub fn append_capture(
        &mut self,
        name: impl Into<String>,
        params: Vec<Value>,
        capture_as: impl Into<String>,
    ) {
        self.push(Operation::new(name, params).capture(capture_as));
    }

    pub fn add_ref(&mut self, id: impl Into<String>, data: Value) {
        self.push(Operation::new(ADD_REF, vec![data]).capture(id));
    }

    pub fn drop_ref(&mut self, id: impl Into<String>) {
        self.push(Operation::new(DROP_REF, vec![Value::String(id.into())]));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn freeze(self) -> FrozenQueue {
        FrozenQueue { ops: self.ops }
    }
}

impl FromIterator<Operation> for OperationQueue {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

/// A queue that can no longer grow. Draining consumes it.
#[derive(Debug, Clone)]
pub struct FrozenQueue {
    ops: Vec<Operation>,
}

impl FrozenQueue {
    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Runs every operation in append order against `surface`.
    ///
    /// Placeholders are resolved against `refs` immediately before each
    /// operation, so values captured earlier in the same queue are visible to
    /// later operations.
    pub fn drain<S: Surface + ?Sized>(
        self,
        surface: &mut S,
        refs: &mut ReferenceTable,
        policy: DrainPolicy,
    ) -> DrainReport {
        let mut results = Vec::with_capacity(self.ops.len());
        let mut aborted = false;
        for (index, op) in self.ops.iter().enumerate() {
            if aborted {
                results.push(OpResult::failed(OpError::Skipped));
                continue;
            }
            match execute(op, surface, refs) {
                Ok(value) => results.push(OpResult::ok(value)),
                Err(err) => {
                    tracing::warn!(index, op = %op.op, error = %err, "queued operation failed");
                    results.push(OpResult::failed(err));
                    aborted = policy == DrainPolicy::AbortQueue;
                }
            }
        }
        let names = self.ops.into_iter().map(|op| op.op).collect();
        let report = DrainReport { names, results };
        tracing::debug!(
            executed = report.executed(),
            failed = report.failures().count(),
            "queue drained"
        );
        report
    }
}

fn execute<S: Surface + ?Sized>(
    op: &Operation,
    surface: &mut S,
    refs: &mut ReferenceTable,
) -> Result<Option<RefValue>, OpError> {
    let args = resolve_params(&op.params, refs)?;
    if op.is_pseudo() {
        return execute_pseudo(op, args, refs);
    }

    let value = surface
        .invoke(&op.op, &args)
        .map_err(|err| err.into_op_error(&op.op))?;
    if let Some(id) = &op.capture_as {
        refs.add_ref(id.clone(), value.clone().unwrap_or_else(RefValue::null));
    }
    Ok(value)
}

fn execute_pseudo(
    op: &Operation,
    args: Vec<RefValue>,
    refs: &mut ReferenceTable,
) -> Result<Option<RefValue>, OpError> {
    let mut args = args.into_iter();
    match op.op.as_str() {
        ADD_REF => {
            let (id, data) = match &op.capture_as {
                Some(id) => (id.clone(), args.next()),
                None => (ref_id(op, args.next())?, args.next()),
            };
            let data = data.ok_or_else(|| OpError::malformed(&op.op, "missing data parameter"))?;
            refs.add_ref(id, data);
            Ok(None)
        }
        DROP_REF => {
            let id = ref_id(op, args.next())?;
            refs.drop_ref(&id);
            Ok(None)
        }
        other => Err(OpError::Unsupported(other.to_string())),
    }
}

fn ref_id(op: &Operation, value: Option<RefValue>) -> Result<String, OpError> {
    match value {
        Some(RefValue::Json(Value::String(id))) if !id.is_empty() => Ok(id),
        Some(_) => Err(OpError::malformed(&op.op, "reference id must be a non-empty string")),
        None => Err(OpError::malformed(&op.op, "missing reference id")),
    }
}

/// Per-operation results of one drain, in queue order.
#[derive(Debug, Clone, PartialEq)]
pub struct DrainReport {
    names: Vec<String>,
    results: Vec<OpResult>,
}

impl DrainReport {
    pub fn results(&self) -> &[OpResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<OpResult> {
        self.results
    }

    /// Operations that ran successfully.
    pub fn executed(&self) -> usize {
        self.results.iter().filter(|result| result.success).count()
    }

    /// `(index, op name, error)` for every failed operation.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &str, &OpError)> + '_ {
        self.results
            .iter()
            .zip(&self.names)
            .enumerate()
            .filter_map(|(index, (result, name))| {
                result
                    .error
                    .as_ref()
                    .map(|err| (index, name.as_str(), err))
            })
    }

    pub fn is_clean(&self) -> bool {
        self.results.iter().all(|result| result.success)
    }
}
