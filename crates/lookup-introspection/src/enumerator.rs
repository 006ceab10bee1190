//! Member enumeration
//!
//! Lists the registered members of a value, split by kind and filtered by
//! the settings snapshot. Never fails: a type whose metadata cannot be read
//! yields an empty candidate set.

use lookup_core::{
    Inspectable, MemberDef, MemberKind, MemberTable, SettingsSnapshot, TypeInfo, TypeRef, Value,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

use crate::panic_message;

/// Methods that are never invoked generically, whatever the type
pub const EXCLUDED_METHODS: &[&str] = &[
    "Dispose",
    "ReleaseUnmanagedResources",
    "ReleaseManagedResources",
];

/// Members that survived filtering, by kind
pub struct Candidates<'a> {
    pub type_info: Option<TypeInfo>,
    pub properties: Vec<MemberDef<'a>>,
    pub methods: Vec<MemberDef<'a>>,
    pub fields: Vec<MemberDef<'a>>,
    pub events: Vec<MemberDef<'a>>,
}

impl<'a> Candidates<'a> {
    fn empty(type_info: Option<TypeInfo>) -> Self {
        Self {
            type_info,
            properties: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.properties.len() + self.methods.len() + self.fields.len() + self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All candidates, properties first, then methods, fields and events
    pub fn into_members(self) -> impl Iterator<Item = MemberDef<'a>> {
        self.properties
            .into_iter()
            .chain(self.methods)
            .chain(self.fields)
            .chain(self.events)
    }
}

/// Lists candidate members under a settings snapshot
pub struct MemberEnumerator {
    settings: SettingsSnapshot,
}

impl MemberEnumerator {
    pub fn new(settings: SettingsSnapshot) -> Self {
        Self { settings }
    }

    pub fn enumerate<'a>(&self, object: &'a dyn Inspectable) -> Candidates<'a> {
        let type_info = match catch_unwind(AssertUnwindSafe(|| object.type_info())) {
            Ok(info) => info,
            Err(payload) => {
                warn!(error = %panic_message(payload.as_ref()), "Type metadata is unreadable");
                return Candidates::empty(None);
            }
        };

        let mut table = MemberTable::new(&type_info);
        let registered =
            catch_unwind(AssertUnwindSafe(|| object.register_members(&mut table)));
        if let Err(payload) = registered {
            warn!(
                type_name = %type_info.full_name,
                error = %panic_message(payload.as_ref()),
                "Member registration failed"
            );
            return Candidates::empty(Some(type_info));
        }

        if self.settings.include_root_hierarchy {
            register_root_members(object, &mut table);
        }

        let mut candidates = Candidates::empty(None);
        let mut seen_identity = false;
        for mut member in table.into_members() {
            if !self.accepts(&member) {
                continue;
            }
            if member.identity {
                if seen_identity {
                    debug!(member = %member.name, "Ignoring additional identity accessor");
                    member.identity = false;
                }
                seen_identity = true;
            }
            match member.kind {
                MemberKind::Property => candidates.properties.push(member),
                MemberKind::Method => candidates.methods.push(member),
                MemberKind::Field => candidates.fields.push(member),
                MemberKind::Event => candidates.events.push(member),
                MemberKind::Extension => {}
            }
        }

        debug!(
            type_name = %type_info.full_name,
            candidates = candidates.len(),
            "Enumerated members"
        );
        candidates.type_info = Some(type_info);
        candidates
    }

    fn accepts(&self, member: &MemberDef<'_>) -> bool {
        if member.excluded {
            return false;
        }
        if member.kind == MemberKind::Method && EXCLUDED_METHODS.contains(&member.name.as_str()) {
            return false;
        }
        if member.declaring_type.is_root() && !self.settings.include_root_hierarchy {
            return false;
        }
        if member.attributes.is_static() && !self.settings.include_static {
            return false;
        }
        if member.attributes.is_private() && !self.settings.include_private {
            return false;
        }
        match member.kind {
            MemberKind::Field => self.settings.include_fields,
            MemberKind::Event => self.settings.include_events,
            _ => true,
        }
    }
}

/// Members every value inherits from the root type
fn register_root_members<'a>(object: &'a dyn Inspectable, table: &mut MemberTable<'a>) {
    let root = TypeRef::root();
    table.declared_by(&root.name, &root.full_name);
    table.method("ToString", move |_| {
        let text = object.title().unwrap_or_else(|| object.type_info().full_name);
        Ok(Value::Text(text))
    });
    table.method("GetType", move |_| Ok(Value::Text(object.type_info().full_name)));
}
