//! Member evaluation
//!
//! Evaluates one member at a time: resolver first, then the generic thunk,
//! else an unsupported placeholder. Failures and panics become the member's
//! value; nothing propagates out of [`MemberEvaluator::evaluate`].

use lookup_core::{
    Context, ExtensionEntry, Inspectable, InvocationError, MemberDef, MemberKind,
    SettingsSnapshot, Value,
};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, trace};

use crate::diagnostics::{Measurement, Probe};
use crate::metrics::InspectionMetrics;
use crate::panic_message;

/// Where a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The member returned an error
    Invocation,
    /// The member panicked
    Panic,
    /// Classifying or formatting an otherwise good value failed
    Classification,
}

/// A failure captured as data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Failure from a member error, unwrapping invocation wrappers
    pub fn invocation(err: &anyhow::Error) -> Self {
        Self::new(FailureKind::Invocation, failure_message(err))
    }

    pub fn panic(payload: &(dyn std::any::Any + Send)) -> Self {
        Self::new(FailureKind::Panic, panic_message(payload))
    }
}

/// Message of the member's own error, not of the layer that wrapped it
pub fn failure_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<InvocationError>() {
        Some(wrapper) => wrapper.inner.to_string(),
        None => err.to_string(),
    }
}

/// Result of evaluating one member; never absent once produced
#[derive(Debug, Clone)]
pub enum Evaluated {
    Value(Value),
    Unsupported { reason: String },
    Failed(Failure),
}

impl Evaluated {
    pub fn is_failure(&self) -> bool {
        matches!(self, Evaluated::Failed(_))
    }
}

/// An evaluated member together with its cost
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub result: Evaluated,
    pub measurement: Measurement,
    /// `true` when a resolver supplied the value
    pub resolved: bool,
}

/// Evaluates members strictly one after another
pub struct MemberEvaluator<'m> {
    settings: SettingsSnapshot,
    metrics: Option<&'m InspectionMetrics>,
}

impl<'m> MemberEvaluator<'m> {
    pub fn new(settings: SettingsSnapshot, metrics: Option<&'m InspectionMetrics>) -> Self {
        Self { settings, metrics }
    }

    /// Evaluate `member` of `object`; `None` means the member is omitted
    pub fn evaluate(
        &self,
        object: &dyn Inspectable,
        member: &MemberDef<'_>,
        context: &Context,
    ) -> Option<Evaluation> {
        let mut measurement = Measurement::default();
        let outcome = {
            let _probe = Probe::start(&mut measurement);
            self.run(object, member, context)
        };
        let (result, resolved) = outcome?;

        if let Some(metrics) = self.metrics {
            match &result {
                Evaluated::Unsupported { .. } => metrics.unsupported_member(),
                other => metrics.member_evaluated(measurement.elapsed, other.is_failure()),
            }
        }
        if let Evaluated::Failed(failure) = &result {
            debug!(member = %member.name, error = %failure.message, "Member evaluation failed");
        }
        trace!(
            member = %member.name,
            elapsed_us = measurement.elapsed.as_micros() as u64,
            allocated = measurement.allocated_bytes,
            "Member evaluated"
        );

        Some(Evaluation {
            result,
            measurement,
            resolved,
        })
    }

    fn run(
        &self,
        object: &dyn Inspectable,
        member: &MemberDef<'_>,
        context: &Context,
    ) -> Option<(Evaluated, bool)> {
        let resolved = catch_unwind(AssertUnwindSafe(|| {
            object
                .resolver()
                .and_then(|resolver| resolver.resolve(context, &member.name, &member.parameters))
        }));
        match resolved {
            Ok(Some(Ok(value))) => return Some((Evaluated::Value(value), true)),
            Ok(Some(Err(err))) => return Some((Evaluated::Failed(Failure::invocation(&err)), true)),
            Err(payload) => return Some((Evaluated::Failed(Failure::panic(payload.as_ref())), true)),
            Ok(None) => {}
        }

        if !member.is_invocable() {
            if !self.settings.include_unsupported {
                return None;
            }
            return Some((
                Evaluated::Unsupported {
                    reason: unsupported_reason(member).to_string(),
                },
                false,
            ));
        }

        let result = match catch_unwind(AssertUnwindSafe(|| member.invoke(context))) {
            Ok(Some(Ok(value))) => Evaluated::Value(value),
            Ok(Some(Err(err))) => Evaluated::Failed(Failure::invocation(&err)),
            Ok(None) => Evaluated::Unsupported {
                reason: unsupported_reason(member).to_string(),
            },
            Err(payload) => Evaluated::Failed(Failure::panic(payload.as_ref())),
        };
        Some((result, false))
    }

    /// Evaluate one extension entry in its own failure scope
    pub fn evaluate_extension(&self, entry: &ExtensionEntry<'_>, context: &Context) -> Evaluation {
        let mut measurement = Measurement::default();
        let result = {
            let _probe = Probe::start(&mut measurement);
            match catch_unwind(AssertUnwindSafe(|| entry.evaluate(context))) {
                Ok(Ok(value)) => Evaluated::Value(value),
                Ok(Err(err)) => Evaluated::Failed(Failure::invocation(&err)),
                Err(payload) => Evaluated::Failed(Failure::panic(payload.as_ref())),
            }
        };

        if let Some(metrics) = self.metrics {
            metrics.extension_evaluated(measurement.elapsed, result.is_failure());
        }

        Evaluation {
            result,
            measurement,
            resolved: false,
        }
    }
}

fn unsupported_reason(member: &MemberDef<'_>) -> &'static str {
    if !member.parameters.is_empty() {
        "Member requires parameters"
    } else if member.kind == MemberKind::Method && !member.returns_value {
        "Method has no return value"
    } else {
        "Member cannot be invoked"
    }
}
