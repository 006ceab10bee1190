//! Ambient session context threaded into member evaluation

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::inspect::Inspectable;
use crate::types::ElementId;

/// The host document that members may need to resolve against
pub trait HostDocument: Send + Sync {
    fn title(&self) -> String;

    /// Look up an element by id, `None` when the id does not resolve
    fn element(&self, id: ElementId) -> Option<Arc<dyn Inspectable>>;
}

/// Session-scoped context. Cheap to clone; never stored globally.
#[derive(Clone)]
pub struct Context {
    session_id: Uuid,
    document: Option<Arc<dyn HostDocument>>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            document: None,
        }
    }

    pub fn with_document(document: Arc<dyn HostDocument>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            document: Some(document),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn document(&self) -> Option<&Arc<dyn HostDocument>> {
        self.document.as_ref()
    }

    /// Resolve an element id through the active document
    pub fn resolve_element(&self, id: ElementId) -> Option<Arc<dyn Inspectable>> {
        if !id.is_valid() {
            return None;
        }
        self.document.as_ref()?.element(id)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("session_id", &self.session_id)
            .field("document", &self.document.as_ref().map(|d| d.title()))
            .finish()
    }
}
