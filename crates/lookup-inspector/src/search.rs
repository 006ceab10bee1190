//! Filtering and grouping of descriptor lists

use lookup_introspection::Descriptor;
use serde::Serialize;

/// Descriptors whose name or value text contains `query`, ignoring case.
/// An empty query keeps everything. Order is preserved.
pub fn search(members: &[Descriptor], query: &str) -> Vec<Descriptor> {
    let query = query.trim().to_lowercase();
    members
        .iter()
        .filter(|d| {
            query.is_empty()
                || d.name.to_lowercase().contains(&query)
                || d.display_text().to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

/// Members declared by one type
#[derive(Debug, Clone)]
pub struct Section {
    pub type_name: String,
    pub type_full_name: String,
    pub depth: usize,
    pub members: Vec<Descriptor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionHeader {
    pub title: String,
    pub count: usize,
}

impl Section {
    pub fn header(&self) -> SectionHeader {
        SectionHeader {
            title: self.type_name.clone(),
            count: self.members.len(),
        }
    }
}

/// Group an ordered list into consecutive runs of the same declaring type
pub fn sections(members: &[Descriptor]) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    for descriptor in members {
        match sections.last_mut() {
            Some(section) if section.type_full_name == descriptor.type_full_name => {
                section.members.push(descriptor.clone());
            }
            _ => sections.push(Section {
                type_name: descriptor.type_name.clone(),
                type_full_name: descriptor.type_full_name.clone(),
                depth: descriptor.depth,
                members: vec![descriptor.clone()],
            }),
        }
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookup_core::{Context, Inspectable, MemberTable, SettingsSnapshot, TypeInfo, Value};
    use lookup_introspection::{Inspection, SnoopableObject};

    struct Door;

    impl Inspectable for Door {
        fn type_info(&self) -> TypeInfo {
            TypeInfo::new("FamilyInstance", "DB.FamilyInstance")
                .with_base("Element", "DB.Element")
        }

        fn register_members<'a>(&'a self, members: &mut MemberTable<'a>) {
            members.property("Host", |_| Ok("Basic Wall".into()));
            members.property("Mirrored", |_| Ok(false.into()));
            members.declared_by("Element", "DB.Element");
            members.property("Name", |_| Ok("Single-Flush".into()));
            members.property("Pinned", |_| Ok(false.into()));
        }
    }

    fn members() -> Vec<Descriptor> {
        let object = SnoopableObject::new(
            Value::object(Door),
            Inspection::new(Context::new(), SettingsSnapshot::default()),
        );
        object.get_members().as_ref().clone()
    }

    #[test]
    fn test_search_by_name_and_value() {
        let members = members();
        let by_name: Vec<_> = search(&members, "PIN").into_iter().map(|d| d.name).collect();
        assert_eq!(by_name, vec!["Pinned"]);

        let by_value: Vec<_> = search(&members, "flush").into_iter().map(|d| d.name).collect();
        assert_eq!(by_value, vec!["Name"]);

        assert_eq!(search(&members, "  ").len(), members.len());
    }

    #[test]
    fn test_sections_follow_hierarchy() {
        let sections = sections(&members());
        let headers: Vec<_> = sections.iter().map(|s| (s.type_name.as_str(), s.members.len())).collect();
        assert_eq!(headers, vec![("FamilyInstance", 2), ("Element", 2)]);
        assert!(sections[0].depth > sections[1].depth);
        assert_eq!(sections[1].header().title, "Element");
    }
}
