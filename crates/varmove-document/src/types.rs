//! Data model for collections, variables, values, and bindings.
//!
//! Identities are host-assigned opaque strings. The engine never holds live
//! object references across suspension points; it re-resolves by identity
//! through the [`DocumentHost`](crate::DocumentHost) trait instead.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a variable collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(pub String);

/// Identity of a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(pub String);

/// Identity of a mode within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModeId(pub String);

/// Identity of a document node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

/// Identity of a document page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub String);

macro_rules! impl_id {
    ($($ty:ident),*) => {
        $(
            impl $ty {
                /// Wrap a host-assigned identity string.
                pub fn new(id: impl Into<String>) -> Self {
                    Self(id.into())
                }

                /// The raw identity string.
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

impl_id!(CollectionId, VariableId, ModeId, NodeId, PageId);

/// A named axis value within a collection (e.g. "Light"/"Dark").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    /// Mode identity.
    pub id: ModeId,
    /// Display name.
    pub name: String,
}

/// A variable collection: ordered modes plus member variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    /// Collection identity.
    pub id: CollectionId,
    /// Display name.
    pub name: String,
    /// Ordered mode sequence. Mode order is load-bearing: value copies pair
    /// modes positionally across collections.
    pub modes: Vec<Mode>,
    /// Identities of the variables owned by this collection.
    pub variable_ids: Vec<VariableId>,
}

/// Resolved value type of a variable.
///
/// The host's raw tag for numbers is `FLOAT`; the user-facing display label
/// is `NUMBER` (see [`ResolvedType::display_label`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolvedType {
    Boolean,
    Color,
    Float,
    String,
}

impl ResolvedType {
    /// The host's raw type tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedType::Boolean => "BOOLEAN",
            ResolvedType::Color => "COLOR",
            ResolvedType::Float => "FLOAT",
            ResolvedType::String => "STRING",
        }
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A variable's value at one mode: a literal payload or an alias to another
/// variable, resolved at read time by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// RGBA color, channels in `0.0..=1.0`.
    Color { r: f64, g: f64, b: f64, a: f64 },
    /// Numeric literal.
    Number(f64),
    /// String literal.
    Text(String),
    /// Boolean literal.
    Boolean(bool),
    /// Reference by identity to another variable.
    Alias(VariableId),
}

impl Value {
    /// Whether this value is an alias reference.
    pub fn is_alias(&self) -> bool {
        matches!(self, Value::Alias(_))
    }
}

/// One (mode, value) entry of a variable. Entries are kept in the owning
/// collection's mode order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeValue {
    pub mode_id: ModeId,
    pub value: Value,
}

/// A typed, named design token living in exactly one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Stable host-assigned identity, unique within the document.
    pub id: VariableId,
    /// Name, unique within the owning collection (not globally).
    pub name: String,
    /// Owning collection.
    pub collection_id: CollectionId,
    /// Resolved value type.
    pub resolved_type: ResolvedType,
    /// Free-form description.
    pub description: String,
    /// Whether the variable is hidden from publishing.
    pub hidden_from_publishing: bool,
    /// Scope tags restricting which UI properties may bind this variable.
    pub scopes: Vec<String>,
    /// Per-platform code syntax entries (platform tag -> syntax string).
    pub code_syntax: BTreeMap<String, String>,
    /// Ordered per-mode values. Order matches the owning collection's mode
    /// order at write time; value copies pair entries positionally.
    pub values_by_mode: Vec<ModeValue>,
}

impl Variable {
    /// The value at the i-th mode position, if set.
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.values_by_mode.get(index).map(|mv| &mv.value)
    }
}

/// List-valued node properties whose entries may carry variable bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListProperty {
    Fills,
    Strokes,
    Effects,
}

impl ListProperty {
    /// Property name as reported by the host.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListProperty::Fills => "fills",
            ListProperty::Strokes => "strokes",
            ListProperty::Effects => "effects",
        }
    }

    /// Parse a host property name. Returns `None` for scalar properties.
    pub fn parse(property: &str) -> Option<Self> {
        match property {
            "fills" => Some(ListProperty::Fills),
            "strokes" => Some(ListProperty::Strokes),
            "effects" => Some(ListProperty::Effects),
            _ => None,
        }
    }
}

impl fmt::Display for ListProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a fills/strokes/effects list.
///
/// The literal payload is opaque to the migration; only the optional variable
/// binding is inspected or rewritten. The host treats these lists as
/// copy-on-write: mutation requires cloning the list and writing it back
/// whole.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    /// Host paint data, carried through untouched.
    pub payload: serde_json::Value,
    /// Variable bound to this entry, if any.
    pub bound_variable: Option<VariableId>,
}

impl Paint {
    /// A paint with the given payload and no binding.
    pub fn unbound(payload: serde_json::Value) -> Self {
        Self {
            payload,
            bound_variable: None,
        }
    }

    /// A copy of this paint re-bound to `variable`, payload untouched.
    pub fn with_binding(&self, variable: &VariableId) -> Self {
        Self {
            payload: self.payload.clone(),
            bound_variable: Some(variable.clone()),
        }
    }
}

/// What a node reports for one bound property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyBinding {
    /// A single variable reference (scalar property).
    Single(VariableId),
    /// An ordered sequence of references, index-aligned with the paint list.
    /// Unbound entries are `None`.
    List(Vec<Option<VariableId>>),
}

/// A located consumer reference: one (node, property) pair pointing at a
/// variable identity, with the entry index for list-valued properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Consuming node.
    pub node: NodeId,
    /// Bound property name.
    pub property: String,
    /// Referenced variable identity.
    pub variable: VariableId,
    /// Entry index within the paint list, for list-valued properties.
    pub index: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolved_type_raw_tags() {
        assert_eq!(ResolvedType::Float.as_str(), "FLOAT");
        assert_eq!(ResolvedType::Color.as_str(), "COLOR");
        assert_eq!(ResolvedType::Boolean.as_str(), "BOOLEAN");
        assert_eq!(ResolvedType::String.as_str(), "STRING");
    }

    #[test]
    fn paint_with_binding_preserves_payload() {
        let paint = Paint::unbound(json!({"type": "SOLID", "opacity": 0.5}));
        let var = VariableId::new("VariableID:1:2");

        let bound = paint.with_binding(&var);

        assert_eq!(bound.payload, paint.payload);
        assert_eq!(bound.bound_variable, Some(var));
        // The original is untouched
        assert!(paint.bound_variable.is_none());
    }

    #[test]
    fn list_property_parse_rejects_scalar_names() {
        assert_eq!(ListProperty::parse("fills"), Some(ListProperty::Fills));
        assert_eq!(ListProperty::parse("strokes"), Some(ListProperty::Strokes));
        assert_eq!(ListProperty::parse("effects"), Some(ListProperty::Effects));
        assert_eq!(ListProperty::parse("opacity"), None);
        assert_eq!(ListProperty::parse("cornerRadius"), None);
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = VariableId::new("VariableID:12:34");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""VariableID:12:34""#);

        let back: VariableId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn value_is_alias() {
        assert!(Value::Alias(VariableId::new("v")).is_alias());
        assert!(!Value::Number(4.0).is_alias());
        assert!(!Value::Text("x".into()).is_alias());
    }
}
