//! The inspectable unit and its member cache
//!
//! A [`SnoopableObject`] wraps one evaluated value, the context and settings
//! it was produced under, its cheap [`Summary`], and a memoized descriptor
//! list. The list is built at most once per cache generation; `refresh`
//! starts a new generation. Readers never observe a partially built list.

use lookup_core::{Context, Error, Result, SettingsSnapshot, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::debug;

use crate::builder::DescriptorBuilder;
use crate::descriptor::Descriptor;
use crate::evaluator::Evaluated;
use crate::factory::{expand_value, ClassifyScope, DescriptorFactory, Summary};
use crate::metrics::InspectionMetrics;

/// Everything a pass needs besides the value itself
#[derive(Clone, Default)]
pub struct Inspection {
    pub context: Context,
    pub settings: SettingsSnapshot,
    pub metrics: Option<InspectionMetrics>,
}

impl Inspection {
    pub fn new(context: Context, settings: SettingsSnapshot) -> Self {
        Self {
            context,
            settings,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: InspectionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Lifecycle of the member cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembersState {
    Uninitialized,
    Building,
    Ready,
}

const UNINITIALIZED: u8 = 0;
const BUILDING: u8 = 1;
const READY: u8 = 2;

pub type Members = Arc<Vec<Descriptor>>;

pub struct SnoopableObject {
    raw: Evaluated,
    summary: Summary,
    expansion: Option<Arc<dyn lookup_core::Inspectable>>,
    stale: bool,
    inspection: RwLock<Inspection>,
    state: AtomicU8,
    generation: AtomicU64,
    members: Mutex<Option<Members>>,
}

impl SnoopableObject {
    /// Wrap a root value selected by the user
    pub fn new(value: Value, inspection: Inspection) -> Self {
        let context = inspection.context.clone();
        Self::from_evaluated(Evaluated::Value(value), ClassifyScope::root(&context), inspection)
    }

    pub(crate) fn from_evaluated(
        evaluated: Evaluated,
        scope: ClassifyScope<'_>,
        inspection: Inspection,
    ) -> Self {
        let classification = DescriptorFactory::classify(evaluated, scope);
        Self {
            raw: classification.raw,
            summary: classification.summary,
            expansion: classification.expansion,
            stale: classification.stale,
            inspection: RwLock::new(inspection),
            state: AtomicU8::new(UNINITIALIZED),
            generation: AtomicU64::new(0),
            members: Mutex::new(None),
        }
    }

    pub fn raw(&self) -> &Evaluated {
        &self.raw
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn has_children(&self) -> bool {
        self.summary.has_children
    }

    /// `false` when the wrapped host object has been invalidated
    pub fn is_valid(&self) -> bool {
        !self.stale && self.expansion.as_ref().map_or(true, |object| object.is_valid())
    }

    /// The host object was already invalid when it was wrapped
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn settings(&self) -> SettingsSnapshot {
        self.inspection.read().unwrap_or_else(PoisonError::into_inner).settings
    }

    pub fn context(&self) -> Context {
        self.inspection.read().unwrap_or_else(PoisonError::into_inner).context.clone()
    }

    pub fn state(&self) -> MembersState {
        match self.state.load(Ordering::Acquire) {
            BUILDING => MembersState::Building,
            READY => MembersState::Ready,
            _ => MembersState::Uninitialized,
        }
    }

    /// Number of completed passes
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Cached members, building them on first use
    pub fn get_members(&self) -> Members {
        let mut cache = self.lock_members();
        if let Some(members) = cache.as_ref() {
            return Arc::clone(members);
        }
        self.rebuild(&mut cache)
    }

    /// Members if already built, without triggering a pass
    pub fn cached_members(&self) -> Option<Members> {
        self.lock_members().as_ref().map(Arc::clone)
    }

    /// Discard the cache and run a fresh pass
    pub fn refresh(&self) -> Members {
        let mut cache = self.lock_members();
        self.rebuild(&mut cache)
    }

    /// Replace the settings snapshot, then refresh
    pub fn refresh_with(&self, settings: SettingsSnapshot) -> Members {
        self.inspection.write().unwrap_or_else(PoisonError::into_inner).settings = settings;
        self.refresh()
    }

    /// [`get_members`](Self::get_members) on a blocking worker
    pub async fn get_members_async(self: &Arc<Self>) -> Result<Members> {
        let this = Arc::clone(self);
        tokio::task::spawn_blocking(move || this.get_members())
            .await
            .map_err(|e| Error::internal(format!("Member pass aborted: {}", e)))
    }

    /// [`refresh`](Self::refresh) on a blocking worker; the cache is swapped
    /// only once the new list is complete
    pub async fn refresh_async(self: &Arc<Self>) -> Result<Members> {
        let this = Arc::clone(self);
        tokio::task::spawn_blocking(move || this.refresh())
            .await
            .map_err(|e| Error::internal(format!("Member pass aborted: {}", e)))
    }

    fn lock_members(&self) -> MutexGuard<'_, Option<Members>> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn rebuild(&self, cache: &mut Option<Members>) -> Members {
        self.state.store(BUILDING, Ordering::Release);
        let inspection = self
            .inspection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let members = match &self.expansion {
            Some(object) => DescriptorBuilder::new(object.as_ref(), &inspection).build(),
            None => expand_value(&self.raw, &inspection),
        };
        let members = Arc::new(members);

        *cache = Some(Arc::clone(&members));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.state.store(READY, Ordering::Release);
        debug!(
            object = %self.summary.text,
            members = members.len(),
            generation,
            "Members ready"
        );
        members
    }
}

impl fmt::Debug for SnoopableObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnoopableObject")
            .field("summary", &self.summary)
            .field("state", &self.state())
            .finish()
    }
}
