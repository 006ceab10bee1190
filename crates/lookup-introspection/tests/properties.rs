//! Behavioural tests for member passes

use lookup_core::{
    Context, Extension, ExtensionManager, Inspectable, MemberKind, MemberTable, ParameterInfo,
    Resolver, SettingsSnapshot, TypeInfo, Value,
};
use lookup_introspection::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn inspect(value: Value, settings: SettingsSnapshot) -> SnoopableObject {
    SnoopableObject::new(value, Inspection::new(Context::new(), settings))
}

fn names(members: &[Descriptor]) -> Vec<&str> {
    members.iter().map(|d| d.name.as_str()).collect()
}

/// One public numeric property and one private field
struct Sample;

impl Inspectable for Sample {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::new("Sample", "Tests.Sample")
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("P", |_| Ok(3.5.into()));
        members.field("F", |_| Ok(1.into())).private();
    }
}

#[test]
fn test_scenario_private_field_toggle() {
    let settings = SettingsSnapshot::default().with_fields(true);
    let object = inspect(Value::object(Sample), settings);

    let members = object.get_members();
    assert_eq!(names(&members), vec!["P"]);
    assert_eq!(members[0].display_text(), "3.5");

    let members = object.refresh_with(settings.with_private(true));
    assert_eq!(names(&members), vec!["P", "F"]);
}

/// Members of every attribute combination
struct Attributed;

impl Inspectable for Attributed {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::new("Attributed", "Tests.Attributed").with_base("Base", "Tests.Base")
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("Plain", |_| Ok(1.into()));
        members.property("Hidden", |_| Ok(2.into())).private();
        members.property("Shared", |_| Ok(3.into())).statik();
        members.method("Both", |_| Ok(4.into())).private().statik();
        members.declared_by("Base", "Tests.Base");
        members.field("base_field", |_| Ok(5.into())).private();
        members.event("Changed", |_| Ok(Value::Null)).statik();
    }
}

#[test]
fn test_private_and_static_filtered_out() {
    let settings = SettingsSnapshot::everything()
        .with_private(false)
        .with_static(false)
        .with_root_hierarchy(false);
    let members = inspect(Value::object(Attributed), settings).get_members();

    assert_eq!(names(&members), vec!["Plain"]);
    assert!(members
        .iter()
        .all(|d| !d.attributes.is_private() && !d.attributes.is_static()));
}

#[test]
fn test_plain_members_surface_first() {
    let members = inspect(Value::object(Attributed), SettingsSnapshot::everything()).get_members();
    let leaf: Vec<_> = members.iter().filter(|d| d.type_name == "Attributed").collect();
    let order: Vec<_> = leaf.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(order, vec!["Plain", "Hidden", "Shared", "Both"]);
}

/// Counts how often its property is read
struct Counting {
    reads: Arc<AtomicUsize>,
}

impl Inspectable for Counting {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::new("Counting", "Tests.Counting")
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("Reads", move |_| {
            Ok((self.reads.fetch_add(1, Ordering::SeqCst) as u64 + 1).into())
        });
    }
}

#[test]
fn test_memoized_until_refresh() {
    let reads = Arc::new(AtomicUsize::new(0));
    let object = inspect(
        Value::object(Counting {
            reads: Arc::clone(&reads),
        }),
        SettingsSnapshot::default(),
    );
    assert_eq!(object.state(), MembersState::Uninitialized);

    let first = object.get_members();
    let second = object.get_members();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(reads.load(Ordering::SeqCst), 1);
    assert_eq!(object.state(), MembersState::Ready);

    object.refresh();
    object.get_members();
    object.get_members();
    assert_eq!(reads.load(Ordering::SeqCst), 2);
}

#[test]
fn test_summary_does_not_evaluate_members() {
    let reads = Arc::new(AtomicUsize::new(0));
    let object = inspect(
        Value::object(Counting {
            reads: Arc::clone(&reads),
        }),
        SettingsSnapshot::default(),
    );
    assert_eq!(object.summary().text, "Counting");
    assert!(object.has_children());
    assert_eq!(reads.load(Ordering::SeqCst), 0);
}

/// Five members, one of which fails
struct Faulty;

impl Inspectable for Faulty {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::new("Faulty", "Tests.Faulty")
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("A", |_| Ok(1.into()));
        members.property("B", |_| Ok("b".into()));
        members.property("C", |_| Err(anyhow::anyhow!("Element is not valid")));
        members.property("D", |_| Ok(true.into()));
        members.method("E", |_| Ok(2.5.into()));
    }
}

#[test]
fn test_one_failing_member_is_isolated() {
    let members = inspect(Value::object(Faulty), SettingsSnapshot::default()).get_members();
    assert_eq!(members.len(), 5);

    let failed: Vec<_> = members.iter().filter(|d| d.is_failure()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].name, "C");
    assert_eq!(failed[0].display_text(), "Element is not valid");
    assert!(members
        .iter()
        .filter(|d| d.name != "C")
        .all(|d| matches!(d.value.raw(), Evaluated::Value(_))));
}

/// Member "Foo" is served by the resolver
struct Resolved {
    generic_calls: Arc<AtomicUsize>,
}

impl Inspectable for Resolved {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::new("Resolved", "Tests.Resolved")
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("Foo", move |_| {
            self.generic_calls.fetch_add(1, Ordering::SeqCst);
            Ok("generic".into())
        });
        members.property("Bar", move |_| {
            self.generic_calls.fetch_add(1, Ordering::SeqCst);
            Ok("generic".into())
        });
        members.method_with_params("GetBoundingBox", vec![ParameterInfo::new("view", "View")]);
    }

    fn resolver(&self) -> Option<&dyn Resolver> {
        Some(self)
    }
}

impl Resolver for Resolved {
    fn resolve(
        &self,
        _context: &Context,
        target: &str,
        parameters: &[ParameterInfo],
    ) -> Option<anyhow::Result<Value>> {
        match target {
            "Foo" => Some(Ok("resolved".into())),
            "GetBoundingBox" if parameters.len() == 1 => {
                Some(Err(anyhow::anyhow!("No active view")))
            }
            _ => None,
        }
    }
}

#[test]
fn test_resolver_takes_precedence() {
    let generic_calls = Arc::new(AtomicUsize::new(0));
    let members = inspect(
        Value::object(Resolved {
            generic_calls: Arc::clone(&generic_calls),
        }),
        SettingsSnapshot::default(),
    )
    .get_members();

    let foo = members.iter().find(|d| d.name == "Foo").unwrap();
    assert_eq!(foo.display_text(), "resolved");
    let bar = members.iter().find(|d| d.name == "Bar").unwrap();
    assert_eq!(bar.display_text(), "generic");
    assert_eq!(generic_calls.load(Ordering::SeqCst), 1);

    let bbox = members.iter().find(|d| d.name == "GetBoundingBox").unwrap();
    assert!(bbox.is_failure());
    assert_eq!(bbox.display_text(), "No active view");
}

/// Registers synthetic entries, one of which fails
struct Extended;

impl Inspectable for Extended {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::new("Extended", "Tests.Extended")
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("Name", |_| Ok("Room 1".into()));
    }

    fn extension(&self) -> Option<&dyn Extension> {
        Some(self)
    }
}

impl Extension for Extended {
    fn register_extensions<'a>(&'a self, manager: &mut ExtensionManager<'a>) {
        manager.register("Area", |_| Ok(12.0.into()));
        manager.register("Geometry", |_| Err(anyhow::anyhow!("Geometry unavailable")));
        manager.register("Perimeter", |_| Ok(14.0.into()));
    }
}

#[test]
fn test_extensions_are_gated() {
    let members = inspect(
        Value::object(Extended),
        SettingsSnapshot::default().with_extensions(false),
    )
    .get_members();
    assert_eq!(names(&members), vec!["Name"]);
    assert!(members.iter().all(|d| d.kind != MemberKind::Extension));
}

#[test]
fn test_failing_extension_keeps_the_others() {
    let members = inspect(
        Value::object(Extended),
        SettingsSnapshot::default().with_extensions(true),
    )
    .get_members();
    let extensions: Vec<_> = members
        .iter()
        .filter(|d| d.kind == MemberKind::Extension)
        .collect();
    assert_eq!(extensions.len(), 3);

    let geometry = extensions.iter().find(|d| d.name == "Geometry").unwrap();
    assert!(geometry.is_failure());
    let area = extensions.iter().find(|d| d.name == "Area").unwrap();
    assert_eq!(area.display_text(), "12");
    assert_eq!(area.type_name, "Extended");
}

/// Two void methods, one explicitly excluded
struct Transaction;

impl Inspectable for Transaction {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::new("Transaction", "Tests.Transaction")
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("Name", |_| Ok("Modify".into()));
        members.void_method("RollBack").excluded();
        members.void_method("Dispose");
        members.void_method("Regenerate");
    }
}

#[test]
fn test_scenario_void_methods() {
    let hidden = inspect(
        Value::object(Transaction),
        SettingsSnapshot::default().with_unsupported(false),
    )
    .get_members();
    assert_eq!(names(&hidden), vec!["Name"]);

    let shown = inspect(
        Value::object(Transaction),
        SettingsSnapshot::default().with_unsupported(true),
    )
    .get_members();
    assert_eq!(names(&shown), vec!["Name", "Regenerate"]);
    let regenerate = &shown[1];
    assert_eq!(regenerate.value.summary().shape, ValueShape::Unsupported);
    assert!(matches!(regenerate.value.raw(), Evaluated::Unsupported { .. }));
}

/// Parent exposing a deeper-hierarchy child object
struct Host;
struct Nested;

impl Inspectable for Host {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::new("Host", "Tests.Host")
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("Child", |_| Ok(Value::object(Nested)));
        members.property("Label", |_| Ok("host".into()));
    }
}

impl Inspectable for Nested {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::new("Nested", "Tests.Nested")
            .with_base("Middle", "Tests.Middle")
            .with_base("Bottom", "Tests.Bottom")
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("Own", |_| Ok(1.into()));
        members.declared_by("Bottom", "Tests.Bottom");
        members.property("Inherited", |_| Ok(2.into()));
    }
}

#[test]
fn test_depth_restarts_for_each_pass() {
    let root = inspect(Value::object(Host), SettingsSnapshot::default());
    let members = root.get_members();
    assert!(members.iter().all(|d| d.depth == members[0].depth));
    assert_eq!(members[0].depth, 1);

    let child = members.iter().find(|d| d.name == "Child").unwrap();
    assert_eq!(child.value.state(), MembersState::Uninitialized);
    let nested = child.value.get_members();
    let own = nested.iter().find(|d| d.name == "Own").unwrap();
    let inherited = nested.iter().find(|d| d.name == "Inherited").unwrap();
    assert_eq!(own.depth, 3);
    assert_eq!(inherited.depth, 1);
    assert_eq!(names(&nested), vec!["Own", "Inherited"]);
}

#[test]
fn test_metrics_count_passes() {
    let metrics = InspectionMetrics::new().unwrap();
    let object = SnoopableObject::new(
        Value::object(Faulty),
        Inspection::new(Context::new(), SettingsSnapshot::default()).with_metrics(metrics.clone()),
    );
    object.get_members();
    object.refresh();
    assert_eq!(metrics.passes(), 2);
    assert_eq!(metrics.members_evaluated(), 10);
    assert_eq!(metrics.member_failures(), 2);
}

#[tokio::test]
async fn test_async_refresh_swaps_whole_list() {
    let reads = Arc::new(AtomicUsize::new(0));
    let object = Arc::new(inspect(
        Value::object(Counting {
            reads: Arc::clone(&reads),
        }),
        SettingsSnapshot::default(),
    ));

    let first = object.get_members_async().await.unwrap();
    assert_eq!(first[0].display_text(), "1");
    assert!(object.cached_members().is_some());

    let refreshed = object.refresh_async().await.unwrap();
    assert_eq!(refreshed[0].display_text(), "2");
    assert!(Arc::ptr_eq(&refreshed, &object.cached_members().unwrap()));
    assert_eq!(object.generation(), 2);
}
