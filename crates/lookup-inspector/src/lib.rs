//! lookup-inspector: the session boundary between the engine and a UI
//!
//! - [`InspectorSession`] keeps the roots, the navigation trail and the list
//!   on display, and turns every failure into a [`Notification`]
//! - [`HostCommandQueue`] serializes host calls onto one thread and supports
//!   cancelling interactive picks
//! - [`search`] and [`sections`] filter and group descriptor lists

pub mod host;
pub mod notification;
pub mod search;
pub mod session;
pub mod target;

pub use host::{CancelSignal, HostCommandQueue, HostModel, PickOutcome, PickTicket};
pub use notification::{Notification, NotificationLevel, Notifier};
pub use search::{search, sections, Section, SectionHeader};
pub use session::{InspectorSession, PickCanceller};
pub use target::{PickKind, SnoopTarget};
