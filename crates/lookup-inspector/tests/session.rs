//! Session behaviour against an in-memory host

use lookup_core::{
    Context, ElementId, HostDocument, Inspectable, MemberTable, SettingsSnapshot, TypeInfo, Value,
};
use lookup_inspector::{
    CancelSignal, HostCommandQueue, HostModel, InspectorSession, Notification, NotificationLevel,
    Notifier, PickKind, SnoopTarget,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

const WALL_ID: ElementId = ElementId(1001);
const LEVEL_ID: ElementId = ElementId(7);

struct Wall {
    deleted: Arc<AtomicBool>,
}

impl Inspectable for Wall {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::new("Wall", "DB.Wall").with_base("Element", "DB.Element")
    }

    fn title(&self) -> Option<String> {
        Some(format!("Wall, ID{}", WALL_ID))
    }

    fn is_valid(&self) -> bool {
        !self.deleted.load(Ordering::SeqCst)
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("Width", |_| Ok(0.2.into()));
        members.property("CurveElementType", |_| Ok("Basic".into())).private();
        members.declared_by("Element", "DB.Element");
        members.property("Id", |_| Ok(WALL_ID.into())).identity();
        members.property("LevelId", |_| Ok(LEVEL_ID.into()));
    }
}

struct Level;

impl Inspectable for Level {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::new("Level", "DB.Level").with_base("Element", "DB.Element")
    }

    fn title(&self) -> Option<String> {
        Some("Level 1".to_string())
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("Elevation", |_| Ok(3.0.into()));
    }
}

struct Model {
    deleted: Arc<AtomicBool>,
}

impl Model {
    fn wall(&self) -> Wall {
        Wall {
            deleted: Arc::clone(&self.deleted),
        }
    }
}

impl HostDocument for Model {
    fn title(&self) -> String {
        "Project1".to_string()
    }

    fn element(&self, id: ElementId) -> Option<Arc<dyn Inspectable>> {
        match id {
            WALL_ID => Some(Arc::new(self.wall())),
            LEVEL_ID => Some(Arc::new(Level)),
            _ => None,
        }
    }
}

impl HostModel for Model {
    fn roots(&self, target: SnoopTarget, _context: &Context) -> anyhow::Result<Vec<Value>> {
        match target {
            SnoopTarget::Selection => Ok(vec![Value::object(self.wall())]),
            SnoopTarget::Database => anyhow::bail!("No database is open"),
            SnoopTarget::Application => Ok(vec![Value::object(Wall {
                deleted: Arc::new(AtomicBool::new(true)),
            })]),
            _ => Ok(Vec::new()),
        }
    }

    fn pick(
        &self,
        _kind: PickKind,
        _context: &Context,
        cancel: &CancelSignal,
    ) -> anyhow::Result<Option<Value>> {
        while !cancel.is_cancelled() {
            std::thread::sleep(Duration::from_millis(2));
        }
        Ok(None)
    }
}

struct Fixture {
    session: InspectorSession,
    notifications: UnboundedReceiver<Notification>,
    deleted: Arc<AtomicBool>,
}

fn fixture() -> Fixture {
    let deleted = Arc::new(AtomicBool::new(false));
    let model = Arc::new(Model {
        deleted: Arc::clone(&deleted),
    });
    let context = Context::with_document(model.clone());
    let queue = HostCommandQueue::start(model, context.clone()).unwrap();
    let (notifier, notifications) = Notifier::channel();
    Fixture {
        session: InspectorSession::new(queue, context, SettingsSnapshot::default(), notifier),
        notifications,
        deleted,
    }
}

fn drain(receiver: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut drained = Vec::new();
    while let Ok(notification) = receiver.try_recv() {
        drained.push(notification);
    }
    drained
}

fn names(session: &InspectorSession) -> Vec<String> {
    session
        .displayed()
        .map(|members| members.iter().map(|d| d.name.clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_snoop_selection() {
    let mut fx = fixture();
    assert!(fx.session.snoop(SnoopTarget::Selection).await);
    assert_eq!(fx.session.roots().len(), 1);
    assert_eq!(fx.session.roots()[0].summary().text, "Wall, ID1001");
    assert_eq!(names(&fx.session), vec!["Width", "Id", "LevelId"]);
    assert!(drain(&mut fx.notifications).is_empty());
}

#[tokio::test]
async fn test_identifiers_resolve_through_document() {
    let mut fx = fixture();
    fx.session.snoop(SnoopTarget::Selection).await;
    let members = fx.session.displayed().cloned().unwrap();

    let id = members.iter().find(|d| d.name == "Id").unwrap();
    assert_eq!(id.display_text(), "1001");
    assert!(!id.value.has_children());
    assert!(fx.session.navigate(id).await.is_none());

    let level = members.iter().find(|d| d.name == "LevelId").unwrap();
    assert!(level.value.has_children());
    let level_members = fx.session.navigate(level).await.unwrap();
    assert_eq!(level_members[0].name, "Elevation");
    assert_eq!(level_members[0].display_text(), "3");

    let back = fx.session.back().await.unwrap();
    assert!(Arc::ptr_eq(&back, &members));
}

#[tokio::test]
async fn test_cancelled_pick_keeps_displayed_list() {
    let mut fx = fixture();
    fx.session.snoop(SnoopTarget::Selection).await;
    let before = fx.session.displayed().cloned().unwrap();
    drain(&mut fx.notifications);

    let canceller = fx.session.canceller();
    tokio::spawn(async move {
        while !canceller.cancel() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    });
    assert!(!fx.session.snoop(SnoopTarget::Face).await);

    let after = fx.session.displayed().cloned().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(fx.session.roots().len(), 1);

    let notifications = drain(&mut fx.notifications);
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Warning);
    assert_eq!(notifications[0].message, "Operation cancelled");
}

#[tokio::test]
async fn test_refresh_of_deleted_object() {
    let mut fx = fixture();
    fx.session.snoop(SnoopTarget::Selection).await;
    let before = fx.session.displayed().cloned().unwrap();

    let refreshed = fx.session.refresh().await.unwrap();
    assert!(!Arc::ptr_eq(&before, &refreshed));

    fx.deleted.store(true, Ordering::SeqCst);
    assert!(fx.session.refresh().await.is_none());
    assert!(Arc::ptr_eq(fx.session.displayed().unwrap(), &refreshed));

    let notifications = drain(&mut fx.notifications);
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Error);
    assert!(notifications[0].message.contains("no longer valid"));
}

#[tokio::test]
async fn test_snoop_of_deleted_root_keeps_previous_list() {
    let mut fx = fixture();
    assert!(fx.session.snoop(SnoopTarget::Selection).await);
    let before = fx.session.displayed().cloned().unwrap();
    drain(&mut fx.notifications);

    assert!(!fx.session.snoop(SnoopTarget::Application).await);
    assert!(Arc::ptr_eq(fx.session.displayed().unwrap(), &before));
    assert_eq!(fx.session.roots().len(), 1);
    assert_eq!(fx.session.current().unwrap().summary().text, "Wall, ID1001");

    let notifications = drain(&mut fx.notifications);
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Error);
    assert!(notifications[0].message.starts_with("Invalid object:"));
}

#[tokio::test]
async fn test_back_to_deleted_parent_stays_on_child() {
    let mut fx = fixture();
    fx.session.snoop(SnoopTarget::Selection).await;
    let members = fx.session.displayed().cloned().unwrap();
    let level = members.iter().find(|d| d.name == "LevelId").unwrap();
    let level_members = fx.session.navigate(level).await.unwrap();
    drain(&mut fx.notifications);

    fx.deleted.store(true, Ordering::SeqCst);
    assert!(fx.session.back().await.is_none());
    assert!(Arc::ptr_eq(fx.session.current().unwrap(), &level.value));
    assert!(Arc::ptr_eq(fx.session.displayed().unwrap(), &level_members));

    let refreshed = fx.session.refresh().await.unwrap();
    assert_eq!(refreshed[0].name, "Elevation");

    let notifications = drain(&mut fx.notifications);
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].message.contains("no longer valid"));
}

#[tokio::test]
async fn test_settings_change_rebuilds() {
    let mut fx = fixture();
    fx.session.snoop(SnoopTarget::Selection).await;
    assert!(!names(&fx.session).contains(&"CurveElementType".to_string()));

    let settings = SettingsSnapshot::default().with_private(true);
    fx.session.set_settings(settings).await.unwrap();
    assert_eq!(fx.session.settings(), settings);
    assert!(names(&fx.session).contains(&"CurveElementType".to_string()));
    assert_eq!(fx.session.current().unwrap().settings(), settings);
}

#[tokio::test]
async fn test_host_errors_become_notifications() {
    let mut fx = fixture();
    assert!(!fx.session.snoop(SnoopTarget::Database).await);
    assert!(!fx.session.snoop(SnoopTarget::ActiveView).await);
    assert!(fx.session.displayed().is_none());

    let notifications = drain(&mut fx.notifications);
    let levels: Vec<_> = notifications.iter().map(|n| n.level).collect();
    assert_eq!(levels, vec![NotificationLevel::Error, NotificationLevel::Warning]);
    assert_eq!(notifications[0].message, "Host error: No database is open");
}

#[tokio::test]
async fn test_search_and_sections() {
    let mut fx = fixture();
    fx.session.snoop(SnoopTarget::Selection).await;

    let hits: Vec<_> = fx.session.search("id").into_iter().map(|d| d.name).collect();
    assert_eq!(hits, vec!["Width", "Id", "LevelId"]);
    let hits: Vec<_> = fx.session.search("1001").into_iter().map(|d| d.name).collect();
    assert_eq!(hits, vec!["Id"]);

    let titles: Vec<_> = fx
        .session
        .sections()
        .iter()
        .map(|s| s.header().title)
        .collect();
    assert_eq!(titles, vec!["Wall", "Element"]);
}
