//! Descriptor factory
//!
//! Classifies an evaluated value into a display shape. The chain is fixed and
//! the first match wins:
//!
//! numeric, boolean, text, identifier, enumeration, structured values
//! (point, coordinate, color, number array, named collection), general
//! enumerable, then generic object.
//!
//! A failure while classifying or pre-formatting turns into an exception
//! shape; classification itself never fails.

use lookup_core::{Context, ElementId, Inspectable, MemberAttributes, MemberKind, Value};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use crate::descriptor::Descriptor;
use crate::evaluator::{Evaluated, Failure, FailureKind};
use crate::panic_message;
use crate::snoopable::{Inspection, SnoopableObject};

pub const NULL_TEXT: &str = "<null>";
pub const EMPTY_TEXT: &str = "<empty>";
pub const STALE_TEXT: &str = "The referenced object is not valid, or has been deleted";

/// Display shape of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    Null,
    Numeric,
    Boolean,
    Text,
    EmptyText,
    Identifier,
    Enumeration,
    Point,
    Coordinate,
    Color,
    NumberArray,
    NamedCollection,
    Enumerable,
    Object,
    Opaque,
    Unsupported,
    Exception,
}

/// Cheap self-description; computed without enumerating members
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub text: String,
    pub type_name: String,
    pub type_full_name: String,
    pub shape: ValueShape,
    pub has_children: bool,
}

impl Summary {
    fn leaf(shape: ValueShape, text: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            text: text.into(),
            type_full_name: type_name.clone(),
            type_name,
            shape,
            has_children: false,
        }
    }

    fn branch(shape: ValueShape, text: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            has_children: true,
            ..Self::leaf(shape, text, type_name)
        }
    }
}

/// Where a value came from, as far as classification cares
#[derive(Clone, Copy)]
pub struct ClassifyScope<'a> {
    pub member: Option<&'a str>,
    /// The member is the parent's own identity accessor
    pub identity_member: bool,
    pub context: &'a Context,
}

impl<'a> ClassifyScope<'a> {
    pub fn root(context: &'a Context) -> Self {
        Self {
            member: None,
            identity_member: false,
            context,
        }
    }

    pub fn member(name: &'a str, context: &'a Context) -> Self {
        Self {
            member: Some(name),
            identity_member: false,
            context,
        }
    }
}

/// Outcome of classification
pub struct Classification {
    /// The evaluated value, replaced by a failure if classification failed
    pub raw: Evaluated,
    pub summary: Summary,
    /// Object whose members a drill-down enumerates
    pub expansion: Option<Arc<dyn Inspectable>>,
    /// The value was a host object that had already been invalidated
    pub stale: bool,
}

enum Unclassified {
    Stale,
    Failed(String),
}

pub struct DescriptorFactory;

impl DescriptorFactory {
    pub fn classify(evaluated: Evaluated, scope: ClassifyScope<'_>) -> Classification {
        let value = match evaluated {
            Evaluated::Value(value) => value,
            Evaluated::Unsupported { reason } => {
                let summary = Summary::leaf(ValueShape::Unsupported, reason.clone(), "Unsupported");
                return Classification {
                    raw: Evaluated::Unsupported { reason },
                    summary,
                    expansion: None,
                    stale: false,
                };
            }
            Evaluated::Failed(failure) => return failed(failure),
        };

        let classified = catch_unwind(AssertUnwindSafe(|| classify_value(&value, scope)));
        match classified {
            Ok(Ok((summary, expansion))) => Classification {
                raw: Evaluated::Value(value),
                summary,
                expansion,
                stale: false,
            },
            Ok(Err(Unclassified::Stale)) => Classification {
                stale: true,
                ..failed(classification_failure(scope, STALE_TEXT))
            },
            Ok(Err(Unclassified::Failed(message))) => failed(classification_failure(scope, &message)),
            Err(payload) => failed(classification_failure(scope, &panic_message(payload.as_ref()))),
        }
    }
}

fn classification_failure(scope: ClassifyScope<'_>, message: &str) -> Failure {
    let message = match scope.member {
        Some(member) => format!("{}: {}", member, message),
        None => message.to_string(),
    };
    Failure::new(FailureKind::Classification, message)
}

fn failed(failure: Failure) -> Classification {
    let summary = Summary::leaf(ValueShape::Exception, failure.message.clone(), "Exception");
    Classification {
        raw: Evaluated::Failed(failure),
        summary,
        expansion: None,
        stale: false,
    }
}

type Classified = (Summary, Option<Arc<dyn Inspectable>>);

fn classify_value(value: &Value, scope: ClassifyScope<'_>) -> Result<Classified, Unclassified> {
    let type_name = value.type_name();
    let summary = match value {
        Value::Null => Summary::leaf(ValueShape::Null, NULL_TEXT, type_name),
        Value::Int(v) => Summary::leaf(ValueShape::Numeric, v.to_string(), type_name),
        Value::UInt(v) => Summary::leaf(ValueShape::Numeric, v.to_string(), type_name),
        Value::Float(v) => Summary::leaf(ValueShape::Numeric, format_number(*v), type_name),
        Value::Bool(v) => Summary::leaf(ValueShape::Boolean, v.to_string(), type_name),
        Value::Text(s) if s.is_empty() => Summary::leaf(ValueShape::EmptyText, EMPTY_TEXT, type_name),
        Value::Text(s) => Summary::leaf(ValueShape::Text, s.clone(), type_name),
        Value::Id(id) => return Ok(classify_id(*id, scope)),
        Value::Enum(e) => Summary {
            type_full_name: e.type_name.clone(),
            ..Summary::leaf(ValueShape::Enumeration, e.name.clone(), type_name)
        },
        Value::Xyz(p) => Summary::branch(
            ValueShape::Point,
            format!("{}, {}, {}", format_number(p.x), format_number(p.y), format_number(p.z)),
            type_name,
        ),
        Value::Uv(c) => Summary::branch(
            ValueShape::Coordinate,
            format!("{}, {}", format_number(c.u), format_number(c.v)),
            type_name,
        ),
        Value::Color(color) => {
            let (r, g, b) = color
                .channels()
                .ok_or_else(|| Unclassified::Failed("The color is not valid".to_string()))?;
            Summary::branch(ValueShape::Color, format!("{}, {}, {}", r, g, b), type_name)
        }
        Value::Doubles(values) => {
            let text = values
                .iter()
                .map(|v| format_number(*v))
                .collect::<Vec<_>>()
                .join(", ");
            Summary {
                has_children: !values.is_empty(),
                ..Summary::leaf(ValueShape::NumberArray, format!("[{}]", text), type_name)
            }
        }
        Value::Named(entries) => Summary {
            has_children: !entries.is_empty(),
            ..Summary::leaf(ValueShape::NamedCollection, count_text(entries.len()), type_name)
        },
        Value::List(items) => Summary {
            has_children: !items.is_empty(),
            ..Summary::leaf(ValueShape::Enumerable, count_text(items.len()), type_name)
        },
        Value::Object(object) => return classify_object(object),
        Value::Opaque { text, .. } => Summary::leaf(ValueShape::Opaque, text.clone(), type_name),
    };
    Ok((summary, None))
}

fn classify_id(id: ElementId, scope: ClassifyScope<'_>) -> Classified {
    let summary = Summary::leaf(ValueShape::Identifier, id.to_string(), "ElementId");
    if scope.identity_member {
        return (summary, None);
    }
    match scope.context.resolve_element(id) {
        Some(element) => (
            Summary {
                has_children: true,
                ..summary
            },
            Some(element),
        ),
        None => (summary, None),
    }
}

fn classify_object(object: &Arc<dyn Inspectable>) -> Result<Classified, Unclassified> {
    if !object.is_valid() {
        return Err(Unclassified::Stale);
    }
    let info = object.type_info();
    let text = object.title().unwrap_or_else(|| match object.identity() {
        Some(id) => format!("{}, ID{}", info.name, id),
        None => info.name.clone(),
    });
    let summary = Summary {
        text,
        type_name: info.name,
        type_full_name: info.full_name,
        shape: ValueShape::Object,
        has_children: true,
    };
    Ok((summary, Some(Arc::clone(object))))
}

/// Shortest text that parses back to the same number
pub fn format_number(value: f64) -> String {
    value.to_string()
}

fn count_text(count: usize) -> String {
    format!("Count = {}", count)
}

/// Children of a structured value that has no members of its own.
///
/// Children keep the collection's own order.
pub fn expand_value(raw: &Evaluated, inspection: &Inspection) -> Vec<Descriptor> {
    let Evaluated::Value(value) = raw else {
        return Vec::new();
    };

    let (owner, entries): (&str, Vec<(String, Value)>) = match value {
        Value::Xyz(p) => (
            "XYZ",
            vec![
                ("X".to_string(), p.x.into()),
                ("Y".to_string(), p.y.into()),
                ("Z".to_string(), p.z.into()),
            ],
        ),
        Value::Uv(c) => (
            "UV",
            vec![("U".to_string(), c.u.into()), ("V".to_string(), c.v.into())],
        ),
        Value::Color(color) => match color.channels() {
            Some((r, g, b)) => (
                "Color",
                vec![
                    ("Red".to_string(), u32::from(r).into()),
                    ("Green".to_string(), u32::from(g).into()),
                    ("Blue".to_string(), u32::from(b).into()),
                ],
            ),
            None => return Vec::new(),
        },
        Value::Doubles(values) => (
            "Double[]",
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("[{}]", i), Value::Float(*v)))
                .collect(),
        ),
        Value::Named(entries) => ("Map", entries.clone()),
        Value::List(items) => (
            "List",
            items
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("[{}]", i), v.clone()))
                .collect(),
        ),
        _ => return Vec::new(),
    };

    entries
        .into_iter()
        .map(|(name, value)| {
            let child = SnoopableObject::from_evaluated(
                Evaluated::Value(value),
                ClassifyScope::member(&name, &inspection.context),
                inspection.clone(),
            );
            Descriptor {
                type_name: owner.to_string(),
                type_full_name: owner.to_string(),
                depth: 0,
                kind: MemberKind::Property,
                attributes: MemberAttributes::NONE,
                value: Arc::new(child),
                computation_time: Duration::ZERO,
                allocated_bytes: 0,
                name,
            }
        })
        .collect()
}
