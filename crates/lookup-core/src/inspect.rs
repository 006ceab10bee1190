//! Capability traits for inspectable host values
//!
//! Rust has no runtime member reflection, so every inspectable type fills a
//! [`MemberTable`] with `(name, kind, attributes, thunk)` entries. Only
//! registered entries are ever candidates.
//!
//! Two optional per-type capabilities sit on top of the table:
//! - [`Resolver`]: supplies a member's value instead of the generic thunk
//! - [`Extension`]: adds synthetic entries after the regular members

use std::fmt;

use crate::context::Context;
use crate::types::{ElementId, MemberAttributes, MemberKind, ParameterInfo, TypeInfo, TypeRef, Value};

/// Evaluation thunk for one member or extension entry
pub type MemberThunk<'a> = Box<dyn Fn(&Context) -> anyhow::Result<Value> + 'a>;

/// A host value that can be inspected member by member
pub trait Inspectable: Send + Sync + 'static {
    /// Runtime type identity, including base types
    fn type_info(&self) -> TypeInfo;

    /// Cheap display name; must not evaluate members
    fn title(&self) -> Option<String> {
        None
    }

    /// The object's own identifier, if it has one
    fn identity(&self) -> Option<ElementId> {
        None
    }

    /// `false` once the host has invalidated the underlying object
    fn is_valid(&self) -> bool {
        true
    }

    /// Register the members exposed for inspection
    fn register_members<'a>(&'a self, members: &mut MemberTable<'a>);

    fn resolver(&self) -> Option<&dyn Resolver> {
        None
    }

    fn extension(&self) -> Option<&dyn Extension> {
        None
    }
}

/// Intercepts specific members before generic invocation.
pub trait Resolver: Send + Sync {
    /// Return `Some` to take over evaluation of `target`; `None` falls through
    /// to the generic path.
    fn resolve(
        &self,
        context: &Context,
        target: &str,
        parameters: &[ParameterInfo],
    ) -> Option<anyhow::Result<Value>>;
}

/// Adds synthetic entries derived from the value.
pub trait Extension: Send + Sync {
    fn register_extensions<'a>(&'a self, manager: &mut ExtensionManager<'a>);
}

/// One registered member
pub struct MemberDef<'a> {
    pub name: String,
    pub kind: MemberKind,
    pub attributes: MemberAttributes,
    pub declaring_type: TypeRef,
    pub parameters: Vec<ParameterInfo>,
    pub returns_value: bool,
    pub excluded: bool,
    pub identity: bool,
    thunk: Option<MemberThunk<'a>>,
}

impl<'a> MemberDef<'a> {
    fn new(name: impl Into<String>, kind: MemberKind, declaring_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind,
            attributes: MemberAttributes::NONE,
            declaring_type,
            parameters: Vec::new(),
            returns_value: true,
            excluded: false,
            identity: false,
            thunk: None,
        }
    }

    pub fn private(&mut self) -> &mut Self {
        self.attributes = self.attributes | MemberAttributes::PRIVATE;
        self
    }

    pub fn statik(&mut self) -> &mut Self {
        self.attributes = self.attributes | MemberAttributes::STATIC;
        self
    }

    /// Never invoke this member generically, and never list it
    pub fn excluded(&mut self) -> &mut Self {
        self.excluded = true;
        self
    }

    /// Mark as the accessor returning the object's own identifier
    pub fn identity(&mut self) -> &mut Self {
        self.identity = true;
        self
    }

    /// Whether the generic path can invoke this member at all
    pub fn is_invocable(&self) -> bool {
        self.thunk.is_some()
            && self.parameters.is_empty()
            && (self.kind != MemberKind::Method || self.returns_value)
    }

    /// Run the thunk; `None` when the member has nothing to invoke
    pub fn invoke(&self, context: &Context) -> Option<anyhow::Result<Value>> {
        self.thunk.as_ref().map(|thunk| thunk(context))
    }
}

impl fmt::Debug for MemberDef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("attributes", &self.attributes)
            .field("declaring_type", &self.declaring_type.name)
            .field("parameters", &self.parameters.len())
            .field("returns_value", &self.returns_value)
            .finish()
    }
}

/// Registration table filled by [`Inspectable::register_members`]
pub struct MemberTable<'a> {
    declaring_type: TypeRef,
    members: Vec<MemberDef<'a>>,
}

impl<'a> MemberTable<'a> {
    pub fn new(type_info: &TypeInfo) -> Self {
        Self {
            declaring_type: type_info.type_ref(),
            members: Vec::new(),
        }
    }

    /// Members registered after this call are declared by `declaring_type`
    pub fn declared_by(&mut self, name: &str, full_name: &str) -> &mut Self {
        self.declaring_type = TypeRef::new(name, full_name);
        self
    }

    fn push(&mut self, def: MemberDef<'a>) -> &mut MemberDef<'a> {
        self.members.push(def);
        let last = self.members.len() - 1;
        &mut self.members[last]
    }

    fn member<F>(&mut self, name: &str, kind: MemberKind, thunk: F) -> &mut MemberDef<'a>
    where
        F: Fn(&Context) -> anyhow::Result<Value> + 'a,
    {
        let mut def = MemberDef::new(name, kind, self.declaring_type.clone());
        def.thunk = Some(Box::new(thunk));
        self.push(def)
    }

    pub fn property<F>(&mut self, name: &str, thunk: F) -> &mut MemberDef<'a>
    where
        F: Fn(&Context) -> anyhow::Result<Value> + 'a,
    {
        self.member(name, MemberKind::Property, thunk)
    }

    /// Parameterless method with a return value
    pub fn method<F>(&mut self, name: &str, thunk: F) -> &mut MemberDef<'a>
    where
        F: Fn(&Context) -> anyhow::Result<Value> + 'a,
    {
        self.member(name, MemberKind::Method, thunk)
    }

    /// Method declaring parameters; only a resolver can evaluate it
    pub fn method_with_params(
        &mut self,
        name: &str,
        parameters: Vec<ParameterInfo>,
    ) -> &mut MemberDef<'a> {
        let mut def = MemberDef::new(name, MemberKind::Method, self.declaring_type.clone());
        def.parameters = parameters;
        self.push(def)
    }

    /// Method without a return value
    pub fn void_method(&mut self, name: &str) -> &mut MemberDef<'a> {
        let mut def = MemberDef::new(name, MemberKind::Method, self.declaring_type.clone());
        def.returns_value = false;
        self.push(def)
    }

    pub fn field<F>(&mut self, name: &str, thunk: F) -> &mut MemberDef<'a>
    where
        F: Fn(&Context) -> anyhow::Result<Value> + 'a,
    {
        self.member(name, MemberKind::Field, thunk)
    }

    pub fn event<F>(&mut self, name: &str, thunk: F) -> &mut MemberDef<'a>
    where
        F: Fn(&Context) -> anyhow::Result<Value> + 'a,
    {
        self.member(name, MemberKind::Event, thunk)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberDef<'a>> {
        self.members.iter()
    }

    pub fn into_members(self) -> Vec<MemberDef<'a>> {
        self.members
    }
}

/// One synthetic entry registered by an [`Extension`]
pub struct ExtensionEntry<'a> {
    pub name: String,
    thunk: MemberThunk<'a>,
}

impl ExtensionEntry<'_> {
    pub fn evaluate(&self, context: &Context) -> anyhow::Result<Value> {
        (self.thunk)(context)
    }
}

/// Collects extension entries for one value
#[derive(Default)]
pub struct ExtensionManager<'a> {
    entries: Vec<ExtensionEntry<'a>>,
}

impl<'a> ExtensionManager<'a> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn register<F>(&mut self, name: &str, thunk: F)
    where
        F: Fn(&Context) -> anyhow::Result<Value> + 'a,
    {
        self.entries.push(ExtensionEntry {
            name: name.to_string(),
            thunk: Box::new(thunk),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<ExtensionEntry<'a>> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Level {
        elevation: f64,
    }

    impl Inspectable for Level {
        fn type_info(&self) -> TypeInfo {
            TypeInfo::new("Level", "DB.Level").with_base("Element", "DB.Element")
        }

        fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
            members.property("Elevation", move |_| Ok(self.elevation.into()));
            members.void_method("Dispose").excluded();
            members
                .method_with_params("GetParameter", vec![ParameterInfo::new("name", "String")]);
            members.declared_by("Element", "DB.Element");
            members.property("Id", |_| Ok(ElementId(30).into())).identity();
        }
    }

    #[test]
    fn test_member_table_registration() {
        let level = Level { elevation: 12.5 };
        let info = level.type_info();
        let mut table = MemberTable::new(&info);
        level.register_members(&mut table);

        let members = table.into_members();
        assert_eq!(members.len(), 4);
        assert_eq!(members[0].declaring_type.name, "Level");
        assert!(members[0].is_invocable());
        assert!(members[1].excluded && !members[1].is_invocable());
        assert!(!members[2].is_invocable());
        assert_eq!(members[3].declaring_type.name, "Element");
        assert!(members[3].identity);

        let value = members[0].invoke(&Context::new()).unwrap().unwrap();
        assert!(matches!(value, Value::Float(v) if v == 12.5));
        assert!(members[2].invoke(&Context::new()).is_none());
    }

    #[test]
    fn test_extension_manager_collects_entries() {
        let mut manager = ExtensionManager::new();
        manager.register("Area", |_| Ok(Value::Float(4.0)));
        manager.register("Broken", |_| Err(anyhow::anyhow!("no geometry")));
        assert_eq!(manager.len(), 2);

        let entries = manager.into_entries();
        assert!(entries[0].evaluate(&Context::new()).is_ok());
        assert!(entries[1].evaluate(&Context::new()).is_err());
    }
}
