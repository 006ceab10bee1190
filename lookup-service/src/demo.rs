//! In-memory host model for the command-line inspector
//!
//! A small project with one level, a wall type, a material, two walls and a
//! floor plan. Walls carry a resolver for their parameterised methods and a
//! geometry extension.

use lookup_core::{
    Color, Context, ElementId, EnumValue, Extension, ExtensionManager, HostDocument, Inspectable,
    MemberTable, ParameterInfo, Resolver, TypeInfo, Uv, Value, Xyz,
};
use lookup_inspector::{CancelSignal, HostModel, PickKind, SnoopTarget};
use std::collections::BTreeMap;
use std::sync::Arc;

const NAMESPACE: &str = "Autodesk.Revit.DB";
const ELEMENT: &str = "Autodesk.Revit.DB.Element";
const GEOMETRY_OBJECT: &str = "Autodesk.Revit.DB.GeometryObject";

fn revit_type(name: &str, bases: &[&str]) -> TypeInfo {
    bases.iter().fold(
        TypeInfo::new(name, format!("{}.{}", NAMESPACE, name)),
        |info, base| info.with_base(*base, format!("{}.{}", NAMESPACE, base)),
    )
}

fn category(name: &str, value: i64) -> EnumValue {
    EnumValue::new("BuiltInCategory", name, value)
}

/// Members every element shares, declared by `Element`
fn element_members<'a>(
    members: &mut MemberTable<'a>,
    id: ElementId,
    name: &'a str,
    category: EnumValue,
) {
    members.declared_by("Element", ELEMENT);
    members.property("Id", move |_| Ok(id.into())).identity();
    members.property("Name", move |_| Ok(name.into()));
    members.property("Category", move |_| Ok(category.clone().into()));
    members.property("Pinned", |_| Ok(false.into()));
    members.property("Document", |context| {
        Ok(context.document().map(|document| document.title()).into())
    });
    members.method_with_params(
        "GetDependentElements",
        vec![ParameterInfo::new("filter", "ElementFilter")],
    );
    members.void_method("Dispose");
}

struct Level {
    id: ElementId,
    name: String,
    elevation: f64,
}

impl Inspectable for Level {
    fn type_info(&self) -> TypeInfo {
        revit_type("Level", &["Element"])
    }

    fn title(&self) -> Option<String> {
        Some(format!("{}, ID{}", self.name, self.id))
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("Elevation", move |_| Ok(self.elevation.into()));
        members.property("ProjectElevation", move |_| Ok(self.elevation.into()));
        element_members(members, self.id, &self.name, category("OST_Levels", -2000240));
    }
}

struct Material {
    id: ElementId,
    name: String,
    color: Color,
}

impl Inspectable for Material {
    fn type_info(&self) -> TypeInfo {
        revit_type("Material", &["Element"])
    }

    fn title(&self) -> Option<String> {
        Some(format!("{}, ID{}", self.name, self.id))
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("Color", move |_| Ok(self.color.into()));
        members.property("CutForegroundPatternColor", |_| Ok(Color::invalid().into()));
        members.property("Transparency", |_| Ok(0.into()));
        members.property("MaterialClass", |_| Ok("".into()));
        element_members(members, self.id, &self.name, category("OST_Materials", -2000700));
    }
}

struct WallType {
    id: ElementId,
    name: String,
    width: f64,
    material: ElementId,
}

impl Inspectable for WallType {
    fn type_info(&self) -> TypeInfo {
        revit_type("WallType", &["HostObjAttributes", "ElementType", "Element"])
    }

    fn title(&self) -> Option<String> {
        Some(format!("{}, ID{}", self.name, self.id))
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("Kind", |_| Ok(EnumValue::new("WallKind", "Basic", 1).into()));
        members.property("Width", move |_| Ok(self.width.into()));
        members.declared_by("ElementType", "Autodesk.Revit.DB.ElementType");
        members.property("FamilyName", |_| Ok("Basic Wall".into()));
        members.property("MaterialId", move |_| Ok(self.material.into()));
        element_members(members, self.id, &self.name, category("OST_Walls", -2000011));
    }
}

struct Wall {
    id: ElementId,
    name: String,
    level: ElementId,
    wall_type: ElementId,
    material: ElementId,
    width: f64,
    height: f64,
    start: Xyz,
    end: Xyz,
}

impl Wall {
    fn length(&self) -> f64 {
        let (dx, dy, dz) = (
            self.end.x - self.start.x,
            self.end.y - self.start.y,
            self.end.z - self.start.z,
        );
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    fn orientation(&self) -> Xyz {
        let length = self.length();
        if length == 0.0 {
            return Xyz::default();
        }
        Xyz::new(
            -(self.end.y - self.start.y) / length,
            (self.end.x - self.start.x) / length,
            0.0,
        )
    }

    fn faces(&self) -> Vec<Face> {
        let normal = self.orientation();
        [1.0, -1.0]
            .into_iter()
            .map(|side| Face {
                area: self.length() * self.height,
                origin: Xyz::new(
                    self.start.x + normal.x * side * self.width / 2.0,
                    self.start.y + normal.y * side * self.width / 2.0,
                    self.start.z,
                ),
                normal: Xyz::new(normal.x * side, normal.y * side, 0.0),
                material: self.material,
            })
            .collect()
    }

    fn edge(&self) -> Edge {
        Edge {
            start: self.start,
            end: self.end,
        }
    }
}

impl Inspectable for Wall {
    fn type_info(&self) -> TypeInfo {
        revit_type("Wall", &["HostObject", "Element"])
    }

    fn title(&self) -> Option<String> {
        Some(format!("{}, ID{}", self.name, self.id))
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("Width", move |_| Ok(self.width.into()));
        members.property("Flipped", |_| Ok(false.into()));
        members.property("Orientation", move |_| Ok(self.orientation().into()));
        members.property("WallType", move |_| Ok(self.wall_type.into()));
        members.property("StructuralUsage", |_| {
            Ok(EnumValue::new("StructuralWallUsage", "NonBearing", 0).into())
        });
        members.property("CurveElementType", |_| Ok("Basic Wall".into())).private();
        members.property("Location", move |_| {
            Ok(Value::Named(vec![
                ("Start".to_string(), self.start.into()),
                ("End".to_string(), self.end.into()),
            ]))
        });
        members.method_with_params(
            "GetMaterialIds",
            vec![ParameterInfo::new("returnPaintMaterials", "Boolean")],
        );
        members.method_with_params("get_BoundingBox", vec![ParameterInfo::new("view", "View")]);
        members.void_method("RemovePaint").excluded();
        members.void_method("Regenerate");

        members.declared_by("HostObject", "Autodesk.Revit.DB.HostObject");
        members.method("FindInserts", |_| Ok(Value::List(Vec::new())));

        element_members(members, self.id, &self.name, category("OST_Walls", -2000011));
        members.property("LevelId", move |_| Ok(self.level.into()));
        members.property("Parameters", move |_| {
            Ok(Value::Named(vec![
                ("Length".to_string(), self.length().into()),
                ("Unconnected Height".to_string(), self.height.into()),
                ("Comments".to_string(), "".into()),
            ]))
        });
    }

    fn resolver(&self) -> Option<&dyn Resolver> {
        Some(self)
    }

    fn extension(&self) -> Option<&dyn Extension> {
        Some(self)
    }
}

impl Resolver for Wall {
    fn resolve(
        &self,
        context: &Context,
        target: &str,
        _parameters: &[ParameterInfo],
    ) -> Option<anyhow::Result<Value>> {
        match target {
            "GetMaterialIds" => Some(Ok(Value::Named(vec![
                ("false".to_string(), Value::List(vec![self.material.into()])),
                ("true".to_string(), Value::List(Vec::new())),
            ]))),
            "get_BoundingBox" => Some(match context.document() {
                Some(_) => Ok(Value::Named(vec![
                    ("Min".to_string(), self.start.into()),
                    (
                        "Max".to_string(),
                        Xyz::new(self.end.x, self.end.y, self.end.z + self.height).into(),
                    ),
                ])),
                None => Err(anyhow::anyhow!("No active view")),
            }),
            _ => None,
        }
    }
}

impl Extension for Wall {
    fn register_extensions<'a>(&'a self, manager: &mut ExtensionManager<'a>) {
        manager.register("Geometry", move |_| {
            Ok(Value::List(
                self.faces().into_iter().map(Value::object).collect(),
            ))
        });
        manager.register("Area", move |_| Ok((self.length() * self.height).into()));
    }
}

#[derive(Clone)]
struct Face {
    area: f64,
    origin: Xyz,
    normal: Xyz,
    material: ElementId,
}

impl Inspectable for Face {
    fn type_info(&self) -> TypeInfo {
        revit_type("PlanarFace", &["Face", "GeometryObject", "APIObject"])
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("FaceNormal", move |_| Ok(self.normal.into()));
        members.property("Origin", move |_| Ok(self.origin.into()));
        members.declared_by("Face", "Autodesk.Revit.DB.Face");
        members.property("Area", move |_| Ok(self.area.into()));
        members.property("MaterialElementId", move |_| Ok(self.material.into()));
        members.property("IsTwoSided", |_| Ok(false.into()));
        members.method_with_params("Evaluate", vec![ParameterInfo::new("params", "UV")]);
        members.method("GetBoundingBox", |_| {
            Ok(Value::Named(vec![
                ("Min".to_string(), Uv::new(0.0, 0.0).into()),
                ("Max".to_string(), Uv::new(1.0, 1.0).into()),
            ]))
        });
        members.declared_by("GeometryObject", GEOMETRY_OBJECT);
        members.property("Visibility", |_| {
            Ok(EnumValue::new("Visibility", "Visible", 0).into())
        });
    }
}

struct Edge {
    start: Xyz,
    end: Xyz,
}

impl Inspectable for Edge {
    fn type_info(&self) -> TypeInfo {
        revit_type("Edge", &["GeometryObject", "APIObject"])
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("ApproximateLength", move |_| {
            let (dx, dy) = (self.end.x - self.start.x, self.end.y - self.start.y);
            Ok((dx * dx + dy * dy).sqrt().into())
        });
        members.method("Tessellate", move |_| {
            Ok(Value::List(vec![self.start.into(), self.end.into()]))
        });
        members.method_with_params("Evaluate", vec![ParameterInfo::new("param", "Double")]);
        members.declared_by("GeometryObject", GEOMETRY_OBJECT);
        members.property("Visibility", |_| {
            Ok(EnumValue::new("Visibility", "Visible", 0).into())
        });
    }
}

struct View {
    id: ElementId,
    name: String,
    level: ElementId,
}

impl Inspectable for View {
    fn type_info(&self) -> TypeInfo {
        revit_type("ViewPlan", &["View", "Element"])
    }

    fn title(&self) -> Option<String> {
        Some(format!("{}, ID{}", self.name, self.id))
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("GenLevel", move |_| Ok(self.level.into()));
        members.declared_by("View", "Autodesk.Revit.DB.View");
        members.property("ViewType", |_| Ok(EnumValue::new("ViewType", "FloorPlan", 1).into()));
        members.property("Scale", |_| Ok(100.into()));
        members.property("ViewDirection", |_| Ok(Xyz::new(0.0, 0.0, 1.0).into()));
        members.property("Outline", |_| {
            Ok(Value::Named(vec![
                ("Min".to_string(), Uv::new(-0.5, -0.3).into()),
                ("Max".to_string(), Uv::new(0.5, 0.3).into()),
            ]))
        });
        members.property("DetailLevel", |_| {
            Ok(EnumValue::new("ViewDetailLevel", "Medium", 2).into())
        });
        members.property("CropBox", |_| Err(anyhow::anyhow!("The view does not support a crop box")));
        element_members(members, self.id, &self.name, category("OST_Views", -2000279));
    }
}

struct Store {
    title: String,
    path: String,
    elements: BTreeMap<ElementId, Arc<dyn Inspectable>>,
    selection: Vec<ElementId>,
    active_view: ElementId,
    first_wall: Arc<Wall>,
}

impl Store {
    fn project() -> Self {
        let level = ElementId(311);
        let material = ElementId(1802);
        let wall_type = ElementId(2001);
        let view = ElementId(3405);

        let first_wall = Arc::new(Wall {
            id: ElementId(350122),
            name: "Basic Wall".to_string(),
            level,
            wall_type,
            material,
            width: 0.65,
            height: 10.0,
            start: Xyz::new(0.0, 0.0, 0.0),
            end: Xyz::new(20.0, 0.0, 0.0),
        });
        let second_wall = Wall {
            id: ElementId(350178),
            name: "Basic Wall".to_string(),
            level,
            wall_type,
            material,
            width: 0.65,
            height: 10.0,
            start: Xyz::new(20.0, 0.0, 0.0),
            end: Xyz::new(20.0, 12.5, 0.0),
        };

        let mut elements: BTreeMap<ElementId, Arc<dyn Inspectable>> = BTreeMap::new();
        elements.insert(
            level,
            Arc::new(Level {
                id: level,
                name: "Level 1".to_string(),
                elevation: 0.0,
            }),
        );
        elements.insert(
            material,
            Arc::new(Material {
                id: material,
                name: "Concrete".to_string(),
                color: Color::rgb(192, 192, 192),
            }),
        );
        elements.insert(
            wall_type,
            Arc::new(WallType {
                id: wall_type,
                name: "Generic - 200mm".to_string(),
                width: 0.65,
                material,
            }),
        );
        elements.insert(
            view,
            Arc::new(View {
                id: view,
                name: "Level 1".to_string(),
                level,
            }),
        );
        elements.insert(first_wall.id, first_wall.clone());
        elements.insert(second_wall.id, Arc::new(second_wall));

        Self {
            title: "Project1".to_string(),
            path: String::new(),
            selection: vec![first_wall.id],
            active_view: view,
            elements,
            first_wall,
        }
    }
}

struct Document {
    store: Arc<Store>,
}

impl Inspectable for Document {
    fn type_info(&self) -> TypeInfo {
        revit_type("Document", &["APIObject"])
    }

    fn title(&self) -> Option<String> {
        Some(self.store.title.clone())
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("Title", move |_| Ok(self.store.title.as_str().into()));
        members.property("PathName", move |_| Ok(self.store.path.as_str().into()));
        members.property("IsFamilyDocument", |_| Ok(false.into()));
        members.property("IsModified", |_| Ok(true.into()));
        members.property("ActiveView", move |_| Ok(self.store.active_view.into()));
        members.method("GetElementIds", move |_| {
            Ok(Value::List(
                self.store.elements.keys().map(|id| (*id).into()).collect(),
            ))
        });
        members.method_with_params("GetElement", vec![ParameterInfo::new("id", "ElementId")]);
        members.void_method("Regenerate");
        members.void_method("Close").excluded();
    }
}

struct Application {
    store: Arc<Store>,
}

impl Inspectable for Application {
    fn type_info(&self) -> TypeInfo {
        revit_type("Application", &[])
    }

    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
        members.property("VersionName", |_| Ok("Autodesk Revit 2025".into()));
        members.property("VersionNumber", |_| Ok("2025".into()));
        members.property("VersionBuild", |_| Ok("25.0.2.419".into()));
        members.property("Language", |_| Ok(EnumValue::new("LanguageType", "English_USA", 0).into()));
        members.property("Documents", move |_| {
            Ok(Value::List(vec![Value::object(Document {
                store: Arc::clone(&self.store),
            })]))
        });
        members.property("IsQuiescent", |_| Ok(true.into()));
        members.field("m_handle", |_| Ok(0x7ff6_2a40u64.into())).private();
        members.event("DocumentOpened", |_| Ok(Value::Null));
        members.event("ApplicationInitialized", |_| Ok(Value::Null)).statik();
        members.method("GetFailureDefinitionRegistry", |_| {
            Ok(Value::opaque("FailureDefinitionRegistry", "FailureDefinitionRegistry"))
        }).statik();
    }
}

/// The in-memory host behind the CLI
pub struct DemoHost {
    store: Arc<Store>,
}

impl DemoHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            store: Arc::new(Store::project()),
        })
    }

    fn lookup(&self, id: ElementId) -> Option<Value> {
        self.store.elements.get(&id).cloned().map(Value::Object)
    }
}

impl HostDocument for DemoHost {
    fn title(&self) -> String {
        self.store.title.clone()
    }

    fn element(&self, id: ElementId) -> Option<Arc<dyn Inspectable>> {
        self.store.elements.get(&id).cloned()
    }
}

impl HostModel for DemoHost {
    fn roots(&self, target: SnoopTarget, _context: &Context) -> anyhow::Result<Vec<Value>> {
        let roots = match target {
            SnoopTarget::Selection => self
                .store
                .selection
                .iter()
                .filter_map(|id| self.lookup(*id))
                .collect(),
            SnoopTarget::ActiveView => self.lookup(self.store.active_view).into_iter().collect(),
            SnoopTarget::ActiveDocument => vec![Value::object(Document {
                store: Arc::clone(&self.store),
            })],
            SnoopTarget::Application => vec![Value::object(Application {
                store: Arc::clone(&self.store),
            })],
            SnoopTarget::Database => self
                .store
                .elements
                .values()
                .cloned()
                .map(Value::Object)
                .collect(),
            other => anyhow::bail!("{} requires a pick", other),
        };
        Ok(roots)
    }

    fn pick(
        &self,
        kind: PickKind,
        _context: &Context,
        cancel: &CancelSignal,
    ) -> anyhow::Result<Option<Value>> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        let wall = &self.store.first_wall;
        let picked = match kind {
            PickKind::Face => wall.faces().into_iter().next().map(Value::object),
            PickKind::Edge => Some(Value::object(wall.edge())),
            PickKind::LinkedElement => self.lookup(wall.level),
            PickKind::Point => Some(Value::Xyz(Xyz::new(10.0, 0.0, 4.0))),
            // Nothing to pick in this model; behaves like the user pressing Escape
            PickKind::SubElement => None,
        };
        Ok(picked)
    }
}
