//! lookup-introspection: descriptor building for inspected values
//!
//! This crate provides:
//! - Member enumeration under a settings snapshot
//! - Per-member evaluation with failure isolation and diagnostics
//! - Classification of values into display shapes
//! - `SnoopableObject`, the memoized inspectable unit
//! - Prometheus metrics for passes and evaluations
//!
//! A pass never fails as a whole: member failures, unsupported members and
//! formatting errors all end up as descriptor values.

pub mod builder;
pub mod descriptor;
pub mod diagnostics;
pub mod enumerator;
pub mod evaluator;
pub mod factory;
pub mod metrics;
pub mod snoopable;

pub use builder::DescriptorBuilder;
pub use descriptor::{presentation_order, sort_descriptors, Descriptor, DescriptorView};
pub use diagnostics::{CountingAllocator, Measurement, Probe};
pub use enumerator::{Candidates, MemberEnumerator, EXCLUDED_METHODS};
pub use evaluator::{Evaluated, Evaluation, Failure, FailureKind, MemberEvaluator};
pub use factory::{ClassifyScope, DescriptorFactory, Summary, ValueShape};
pub use metrics::InspectionMetrics;
pub use snoopable::{Inspection, Members, MembersState, SnoopableObject};

use std::any::Any;

/// Text of a caught panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        Descriptor, DescriptorView, Evaluated, Inspection, InspectionMetrics, Members,
        MembersState, SnoopableObject, Summary, ValueShape,
    };
}
