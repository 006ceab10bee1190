//! Descriptor records and their presentation order

use lookup_core::{MemberAttributes, MemberKind};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::factory::ValueShape;
use crate::snoopable::SnoopableObject;

/// One evaluated member of an inspected value
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub name: String,
    /// Display name of the declaring type
    pub type_name: String,
    pub type_full_name: String,
    /// Hierarchy level of the declaring type within this pass (root = 0)
    pub depth: usize,
    pub kind: MemberKind,
    pub attributes: MemberAttributes,
    pub value: Arc<SnoopableObject>,
    /// Zero when unmeasured
    pub computation_time: Duration,
    pub allocated_bytes: u64,
}

impl Descriptor {
    /// Text shown in the value column
    pub fn display_text(&self) -> &str {
        &self.value.summary().text
    }

    pub fn is_failure(&self) -> bool {
        self.value.summary().shape == ValueShape::Exception
    }

    /// Flat, serializable view for presentation layers
    pub fn view(&self) -> DescriptorView {
        let summary = self.value.summary();
        DescriptorView {
            name: self.name.clone(),
            declaring_type: self.type_name.clone(),
            kind: self.kind,
            attributes: self.attributes.to_string(),
            depth: self.depth,
            value: summary.text.clone(),
            value_type: summary.type_name.clone(),
            shape: summary.shape,
            has_children: summary.has_children,
            time_ms: self.computation_time.as_secs_f64() * 1000.0,
            allocated_bytes: self.allocated_bytes,
        }
    }
}

/// Serializable row of a descriptor list
#[derive(Debug, Clone, Serialize)]
pub struct DescriptorView {
    pub name: String,
    pub declaring_type: String,
    pub kind: MemberKind,
    pub attributes: String,
    pub depth: usize,
    pub value: String,
    pub value_type: String,
    pub shape: ValueShape,
    pub has_children: bool,
    pub time_ms: f64,
    pub allocated_bytes: u64,
}

/// Depth descending, attributes ascending, name, then declaring type.
pub fn presentation_order(a: &Descriptor, b: &Descriptor) -> Ordering {
    b.depth
        .cmp(&a.depth)
        .then(a.attributes.cmp(&b.attributes))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.type_full_name.cmp(&b.type_full_name))
        .then(a.kind.cmp(&b.kind))
}

pub fn sort_descriptors(descriptors: &mut [Descriptor]) {
    descriptors.sort_by(presentation_order);
}
