//! One member pass over an object
//!
//! Enumerate, evaluate each candidate in sequence, classify each result into
//! a child object, append extension entries, then sort.

use lookup_core::{ExtensionManager, Inspectable, MemberAttributes, MemberKind, TypeRef};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::descriptor::{sort_descriptors, Descriptor};
use crate::enumerator::MemberEnumerator;
use crate::evaluator::{Evaluated, Evaluation, MemberEvaluator};
use crate::factory::ClassifyScope;
use crate::panic_message;
use crate::snoopable::{Inspection, SnoopableObject};

pub struct DescriptorBuilder<'a> {
    object: &'a dyn Inspectable,
    inspection: &'a Inspection,
}

impl<'a> DescriptorBuilder<'a> {
    pub fn new(object: &'a dyn Inspectable, inspection: &'a Inspection) -> Self {
        Self { object, inspection }
    }

    /// Run the pass. Depth counts from zero again on every call.
    pub fn build(&self) -> Vec<Descriptor> {
        let started = Instant::now();
        let settings = self.inspection.settings;
        let context = &self.inspection.context;
        let metrics = self.inspection.metrics.as_ref();
        if let Some(metrics) = metrics {
            metrics.pass_started();
        }

        let candidates = MemberEnumerator::new(settings).enumerate(self.object);
        let hierarchy = candidates
            .type_info
            .as_ref()
            .map(|info| info.hierarchy())
            .unwrap_or_else(|| vec![TypeRef::root()]);
        let leaf_depth = hierarchy.len() - 1;
        let leaf = hierarchy[leaf_depth].clone();

        let evaluator = MemberEvaluator::new(settings, metrics);
        let mut descriptors = Vec::with_capacity(candidates.len());

        for member in candidates.into_members() {
            let Some(evaluation) = evaluator.evaluate(self.object, &member, context) else {
                continue;
            };
            let depth = hierarchy
                .iter()
                .position(|t| t.full_name == member.declaring_type.full_name)
                .unwrap_or(leaf_depth);
            let scope = ClassifyScope {
                member: Some(&member.name),
                identity_member: member.identity,
                context,
            };
            descriptors.push(self.descriptor(
                member.name.clone(),
                &member.declaring_type,
                depth,
                member.kind,
                member.attributes,
                evaluation,
                scope,
            ));
        }

        if settings.include_extensions {
            self.add_extensions(&evaluator, &leaf, leaf_depth, &mut descriptors);
        }

        sort_descriptors(&mut descriptors);
        debug!(
            type_name = %leaf.full_name,
            members = descriptors.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Member pass complete"
        );
        descriptors
    }

    fn add_extensions(
        &self,
        evaluator: &MemberEvaluator<'_>,
        leaf: &TypeRef,
        depth: usize,
        descriptors: &mut Vec<Descriptor>,
    ) {
        let mut manager = ExtensionManager::new();
        let registered = catch_unwind(AssertUnwindSafe(|| {
            if let Some(extension) = self.object.extension() {
                extension.register_extensions(&mut manager);
            }
        }));
        if let Err(payload) = registered {
            warn!(
                type_name = %leaf.full_name,
                error = %panic_message(payload.as_ref()),
                "Extension registration failed"
            );
        }

        let context = &self.inspection.context;
        for entry in manager.into_entries() {
            let evaluation = evaluator.evaluate_extension(&entry, context);
            if let Evaluated::Failed(failure) = &evaluation.result {
                warn!(extension = %entry.name, error = %failure.message, "Extension failed");
            }
            descriptors.push(self.descriptor(
                entry.name.clone(),
                leaf,
                depth,
                MemberKind::Extension,
                MemberAttributes::NONE,
                evaluation,
                ClassifyScope::member(&entry.name, context),
            ));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn descriptor(
        &self,
        name: String,
        declaring_type: &TypeRef,
        depth: usize,
        kind: MemberKind,
        attributes: MemberAttributes,
        evaluation: Evaluation,
        scope: ClassifyScope<'_>,
    ) -> Descriptor {
        let value =
            SnoopableObject::from_evaluated(evaluation.result, scope, self.inspection.clone());
        Descriptor {
            name,
            type_name: declaring_type.name.clone(),
            type_full_name: declaring_type.full_name.clone(),
            depth,
            kind,
            attributes,
            value: Arc::new(value),
            computation_time: evaluation.measurement.elapsed,
            allocated_bytes: evaluation.measurement.allocated_bytes,
        }
    }
}
