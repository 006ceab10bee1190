//! Inspector session
//!
//! Owns the roots of the last snoop, the navigation trail and the list on
//! display. Nothing here returns an error to the caller: failures are turned
//! into a single notification and the displayed list stays as it was.

use lookup_core::{Context, Error, Result, SettingsSnapshot, Value};
use lookup_introspection::{Descriptor, Inspection, InspectionMetrics, Members, SnoopableObject};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::host::{CancelSignal, HostCommandQueue, PickOutcome};
use crate::notification::Notifier;
use crate::search::{search, sections, Section};
use crate::target::{PickKind, SnoopTarget};

type PendingPick = Arc<Mutex<Option<CancelSignal>>>;

fn lock_pending(pending: &PendingPick) -> MutexGuard<'_, Option<CancelSignal>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cancels whatever pick the session is waiting on
#[derive(Clone)]
pub struct PickCanceller {
    pending: PendingPick,
}

impl PickCanceller {
    /// Returns `false` when no pick was pending
    pub fn cancel(&self) -> bool {
        match lock_pending(&self.pending).as_ref() {
            Some(signal) => {
                signal.cancel();
                true
            }
            None => false,
        }
    }
}

pub struct InspectorSession {
    queue: HostCommandQueue,
    inspection: Inspection,
    notifier: Notifier,
    roots: Vec<Arc<SnoopableObject>>,
    /// Selected root first, currently shown object last
    trail: Vec<Arc<SnoopableObject>>,
    displayed: Option<Members>,
    pending_pick: PendingPick,
}

impl InspectorSession {
    pub fn new(
        queue: HostCommandQueue,
        context: Context,
        settings: SettingsSnapshot,
        notifier: Notifier,
    ) -> Self {
        Self {
            queue,
            inspection: Inspection::new(context, settings),
            notifier,
            roots: Vec::new(),
            trail: Vec::new(),
            displayed: None,
            pending_pick: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_metrics(mut self, metrics: InspectionMetrics) -> Self {
        self.inspection = self.inspection.with_metrics(metrics);
        self
    }

    pub fn settings(&self) -> SettingsSnapshot {
        self.inspection.settings
    }

    pub fn roots(&self) -> &[Arc<SnoopableObject>] {
        &self.roots
    }

    pub fn current(&self) -> Option<&Arc<SnoopableObject>> {
        self.trail.last()
    }

    /// The list the presentation layer is showing
    pub fn displayed(&self) -> Option<&Members> {
        self.displayed.as_ref()
    }

    pub fn canceller(&self) -> PickCanceller {
        PickCanceller {
            pending: Arc::clone(&self.pending_pick),
        }
    }

    /// Replace the roots with the values behind `target` and show the first.
    /// Returns `false` when nothing changed; the previous roots and list are
    /// kept until the first new root has its members.
    pub async fn snoop(&mut self, target: SnoopTarget) -> bool {
        let values = match self.collect(target).await {
            Ok(Some(values)) => values,
            Ok(None) => {
                info!(snoop_target = %target, "Snoop cancelled");
                self.notifier.report(&Error::Cancelled);
                return false;
            }
            Err(e) => {
                self.notifier.report(&e);
                return false;
            }
        };
        if values.is_empty() {
            self.notifier.warning(format!("There are no objects to snoop for {}", target));
            return false;
        }

        let roots: Vec<_> = values
            .into_iter()
            .map(|value| Arc::new(SnoopableObject::new(value, self.inspection.clone())))
            .collect();
        let first = Arc::clone(&roots[0]);
        let members = match self.members_of(Arc::clone(&first), false).await {
            Ok(members) => members,
            Err(e) => {
                self.notifier.report(&e);
                return false;
            }
        };

        info!(snoop_target = %target, roots = roots.len(), "Snooped");
        self.roots = roots;
        self.trail = vec![first];
        self.displayed = Some(members);
        true
    }

    /// Show the members of root `index`
    pub async fn select(&mut self, index: usize) -> Option<Members> {
        let Some(root) = self.roots.get(index).cloned() else {
            self.notifier.report(&Error::not_found(format!("root #{}", index)));
            return None;
        };
        debug!(root = %root.summary().text, "Selected");
        let members = self.show(Arc::clone(&root), false).await?;
        self.trail = vec![root];
        Some(members)
    }

    /// Drill into a descriptor's value
    pub async fn navigate(&mut self, descriptor: &Descriptor) -> Option<Members> {
        if !descriptor.value.has_children() {
            return None;
        }
        debug!(member = %descriptor.name, "Navigating");
        let members = self.show(Arc::clone(&descriptor.value), false).await?;
        self.trail.push(Arc::clone(&descriptor.value));
        Some(members)
    }

    /// Return to the previous object on the trail
    pub async fn back(&mut self) -> Option<Members> {
        let parent = match self.trail.len() {
            0 | 1 => return None,
            len => Arc::clone(&self.trail[len - 2]),
        };
        let members = self.show(parent, false).await?;
        self.trail.pop();
        Some(members)
    }

    /// Rebuild the current object's members
    pub async fn refresh(&mut self) -> Option<Members> {
        self.show_current(true).await
    }

    /// Apply a new settings snapshot and rebuild the current object
    pub async fn set_settings(&mut self, settings: SettingsSnapshot) -> Option<Members> {
        self.inspection.settings = settings;
        self.show_current(false).await
    }

    /// Displayed members matching `query`
    pub fn search(&self, query: &str) -> Vec<Descriptor> {
        self.displayed
            .as_ref()
            .map(|members| search(members, query))
            .unwrap_or_default()
    }

    /// Displayed members grouped by declaring type
    pub fn sections(&self) -> Vec<Section> {
        self.displayed
            .as_ref()
            .map(|members| sections(members))
            .unwrap_or_default()
    }

    /// `Ok(None)` when an interactive pick was cancelled
    async fn collect(&self, target: SnoopTarget) -> Result<Option<Vec<Value>>> {
        match target.pick_kind() {
            Some(kind) => match self.pick(kind).await? {
                PickOutcome::Picked(value) => Ok(Some(vec![value])),
                PickOutcome::Cancelled => Ok(None),
            },
            None => self.queue.roots(target).await.map(Some),
        }
    }

    async fn pick(&self, kind: PickKind) -> Result<PickOutcome> {
        let ticket = self.queue.pick(kind).await?;
        *lock_pending(&self.pending_pick) = Some(ticket.cancel_signal());
        let outcome = ticket.outcome().await;
        lock_pending(&self.pending_pick).take();
        outcome
    }

    async fn show_current(&mut self, force: bool) -> Option<Members> {
        let current = Arc::clone(self.trail.last()?);
        self.show(current, force).await
    }

    /// Display `object`'s members; on failure notify and keep the list as is
    async fn show(&mut self, object: Arc<SnoopableObject>, force: bool) -> Option<Members> {
        match self.members_of(object, force).await {
            Ok(members) => {
                self.displayed = Some(Arc::clone(&members));
                Some(members)
            }
            Err(e) => {
                self.notifier.report(&e);
                None
            }
        }
    }

    async fn members_of(&self, object: Arc<SnoopableObject>, force: bool) -> Result<Members> {
        if object.is_stale() {
            return Err(Error::invalid_object(object.summary().text.clone()));
        }
        if !object.is_valid() {
            return Err(Error::invalid_object(format!(
                "{} is no longer valid",
                object.summary().text
            )));
        }

        let settings = self.inspection.settings;
        if object.settings() != settings {
            return tokio::task::spawn_blocking(move || object.refresh_with(settings))
                .await
                .map_err(|e| Error::internal(format!("Member pass aborted: {}", e)));
        }
        if force {
            object.refresh_async().await
        } else {
            object.get_members_async().await
        }
    }
}
