//! Common types used across revit-lookup

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use crate::inspect::Inspectable;

/// Host element identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub i64);

impl ElementId {
    pub const INVALID: ElementId = ElementId(-1);

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 3-D point or vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Xyz {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// 2-D parametric coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Uv {
    pub u: f64,
    pub v: f64,
}

impl Uv {
    pub fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }
}

/// RGB color; an invalid color refuses to expose its channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
    valid: bool,
}

impl Color {
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            valid: true,
        }
    }

    pub fn invalid() -> Self {
        Self {
            red: 0,
            green: 0,
            blue: 0,
            valid: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Channels as `(red, green, blue)`, `None` for an invalid color
    pub fn channels(&self) -> Option<(u8, u8, u8)> {
        self.valid.then_some((self.red, self.green, self.blue))
    }
}

/// Symbolic enumeration value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub type_name: String,
    pub name: String,
    pub value: i64,
}

impl EnumValue {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>, value: i64) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            value,
        }
    }
}

/// A value produced by evaluating a member.
///
/// The known shapes get their own variant; anything the host can describe
/// further goes through `Object`, and anything it cannot goes through
/// `Opaque` with only a text form.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Id(ElementId),
    Enum(EnumValue),
    Xyz(Xyz),
    Uv(Uv),
    Color(Color),
    Doubles(Vec<f64>),
    /// Collection of objects keyed by name
    Named(Vec<(String, Value)>),
    /// General enumerable
    List(Vec<Value>),
    Object(Arc<dyn Inspectable>),
    Opaque { type_name: String, text: String },
}

impl Value {
    pub fn object(object: impl Inspectable) -> Self {
        Value::Object(Arc::new(object))
    }

    pub fn opaque(type_name: impl Into<String>, text: impl Into<String>) -> Self {
        Value::Opaque {
            type_name: type_name.into(),
            text: text.into(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Display name of the value's runtime type
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "Null".to_string(),
            Value::Bool(_) => "Boolean".to_string(),
            Value::Int(_) => "Int64".to_string(),
            Value::UInt(_) => "UInt64".to_string(),
            Value::Float(_) => "Double".to_string(),
            Value::Text(_) => "String".to_string(),
            Value::Id(_) => "ElementId".to_string(),
            Value::Enum(e) => e.type_name.clone(),
            Value::Xyz(_) => "XYZ".to_string(),
            Value::Uv(_) => "UV".to_string(),
            Value::Color(_) => "Color".to_string(),
            Value::Doubles(_) => "Double[]".to_string(),
            Value::Named(_) => "Map".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Object(o) => o.type_info().name,
            Value::Opaque { type_name, .. } => type_name.clone(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(v) => write!(f, "Bool({})", v),
            Value::Int(v) => write!(f, "Int({})", v),
            Value::UInt(v) => write!(f, "UInt({})", v),
            Value::Float(v) => write!(f, "Float({})", v),
            Value::Text(v) => write!(f, "Text({:?})", v),
            Value::Id(v) => write!(f, "Id({})", v),
            Value::Enum(v) => write!(f, "Enum({}.{})", v.type_name, v.name),
            Value::Xyz(v) => write!(f, "{:?}", v),
            Value::Uv(v) => write!(f, "{:?}", v),
            Value::Color(v) => write!(f, "{:?}", v),
            Value::Doubles(v) => write!(f, "Doubles({:?})", v),
            Value::Named(v) => f.debug_map().entries(v.iter().map(|(k, v)| (k, v))).finish(),
            Value::List(v) => f.debug_list().entries(v).finish(),
            Value::Object(o) => write!(f, "Object({})", o.type_info().full_name),
            Value::Opaque { type_name, text } => write!(f, "Opaque({}: {})", type_name, text),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => UInt,
    u64 => UInt,
    f64 => Float,
    String => Text,
    &str => Text,
    ElementId => Id,
    EnumValue => Enum,
    Xyz => Xyz,
    Uv => Uv,
    Color => Color,
    Vec<f64> => Doubles,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Kind of member a descriptor was produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Property,
    Method,
    Field,
    Event,
    Extension,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemberKind::Property => "property",
            MemberKind::Method => "method",
            MemberKind::Field => "field",
            MemberKind::Event => "event",
            MemberKind::Extension => "extension",
        };
        f.write_str(name)
    }
}

/// Member attribute flags. Plain members compare lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct MemberAttributes(u8);

impl MemberAttributes {
    pub const NONE: MemberAttributes = MemberAttributes(0);
    pub const PRIVATE: MemberAttributes = MemberAttributes(1);
    pub const STATIC: MemberAttributes = MemberAttributes(2);

    pub fn contains(self, other: MemberAttributes) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for MemberAttributes {
    type Output = MemberAttributes;

    fn bitor(self, rhs: Self) -> Self::Output {
        MemberAttributes(self.0 | rhs.0)
    }
}

impl fmt::Display for MemberAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.is_private(), self.is_static()) {
            (false, false) => f.write_str("public"),
            (true, false) => f.write_str("private"),
            (false, true) => f.write_str("static"),
            (true, true) => f.write_str("private static"),
        }
    }
}

/// Declared parameter of a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    pub type_name: String,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A type in an inspectable value's hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
    pub full_name: String,
}

impl TypeRef {
    pub fn new(name: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
        }
    }

    /// The implicit root every inspectable type derives from
    pub fn root() -> Self {
        Self::new("Object", "Object")
    }

    pub fn is_root(&self) -> bool {
        *self == Self::root()
    }
}

/// Runtime type identity of an inspectable value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub name: String,
    pub full_name: String,
    /// Base types, nearest first, excluding the implicit root
    pub bases: Vec<TypeRef>,
}

impl TypeInfo {
    pub fn new(name: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            bases: Vec::new(),
        }
    }

    /// Append the next base type (call nearest base first)
    pub fn with_base(mut self, name: impl Into<String>, full_name: impl Into<String>) -> Self {
        self.bases.push(TypeRef::new(name, full_name));
        self
    }

    pub fn type_ref(&self) -> TypeRef {
        TypeRef::new(self.name.clone(), self.full_name.clone())
    }

    /// Full hierarchy from the root (index 0) down to this type
    pub fn hierarchy(&self) -> Vec<TypeRef> {
        let mut types = Vec::with_capacity(self.bases.len() + 2);
        types.push(TypeRef::root());
        types.extend(self.bases.iter().rev().cloned());
        types.push(self.type_ref());
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy_is_root_first() {
        let info = TypeInfo::new("Wall", "DB.Wall")
            .with_base("HostObject", "DB.HostObject")
            .with_base("Element", "DB.Element");
        let names: Vec<_> = info.hierarchy().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Object", "Element", "HostObject", "Wall"]);
    }

    #[test]
    fn test_attributes_order_plain_first() {
        let private_static = MemberAttributes::PRIVATE | MemberAttributes::STATIC;
        assert!(MemberAttributes::NONE < MemberAttributes::PRIVATE);
        assert!(MemberAttributes::PRIVATE < MemberAttributes::STATIC);
        assert!(private_static.is_private() && private_static.is_static());
        assert_eq!(private_static.to_string(), "private static");
    }

    #[test]
    fn test_value_conversions() {
        assert!(matches!(Value::from(3.5), Value::Float(v) if v == 3.5));
        assert!(matches!(Value::from("abc"), Value::Text(ref s) if s == "abc"));
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::from(ElementId(7)).type_name(), "ElementId");
    }

    #[test]
    fn test_invalid_color_hides_channels() {
        assert_eq!(Color::rgb(1, 2, 3).channels(), Some((1, 2, 3)));
        assert_eq!(Color::invalid().channels(), None);
    }
}
