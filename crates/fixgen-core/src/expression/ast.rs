//! Parsed expression tree
//!
//! Each node owns its children; the tree mirrors the nesting of the source
//! expression exactly.

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    /// Text kept verbatim
    Literal(String),
    /// Non-string scalar taken from the definition as-is
    Constant(Value),
    /// `<name(arguments)>`
    Function {
        name: String,
        arguments: Vec<ValueNode>,
    },
    /// `<{name}>`
    Parameter(String),
    /// `$name`
    Variable(String),
    /// `@id`
    FixtureReference(String),
    /// `@self`
    SelfReference,
    /// `@prefix*`
    WildcardReference(String),
    /// `@prefix{from..to}`
    RangeReference { prefix: String, from: i64, to: i64 },
    /// `@prefix{a, b}`
    ListReference { prefix: String, items: Vec<String> },
    /// `<reference>->property`
    PropertyReference {
        reference: Box<ValueNode>,
        property: String,
    },
    /// `percentage%? first : second`
    Optional {
        percentage: Box<ValueNode>,
        first: Box<ValueNode>,
        second: Option<Box<ValueNode>>,
    },
    /// `quantifier x element`
    DynamicArray {
        quantifier: Box<ValueNode>,
        element: Box<ValueNode>,
    },
    /// `[a, b]` or a definition array
    Array(Vec<ValueNode>),
    /// Definition object, resolved entry by entry
    Map(Vec<(String, ValueNode)>),
    /// Several sub-patterns whose results are concatenated
    List(Vec<ValueNode>),
}

/// Discriminant of a `ValueNode`, used to dispatch to resolvers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Literal,
    Constant,
    Function,
    Parameter,
    Variable,
    FixtureReference,
    SelfReference,
    WildcardReference,
    RangeReference,
    ListReference,
    PropertyReference,
    Optional,
    DynamicArray,
    Array,
    Map,
    List,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Literal => "literal",
            NodeKind::Constant => "constant",
            NodeKind::Function => "function call",
            NodeKind::Parameter => "parameter",
            NodeKind::Variable => "variable",
            NodeKind::FixtureReference => "fixture reference",
            NodeKind::SelfReference => "self reference",
            NodeKind::WildcardReference => "wildcard reference",
            NodeKind::RangeReference => "range reference",
            NodeKind::ListReference => "list reference",
            NodeKind::PropertyReference => "property reference",
            NodeKind::Optional => "optional",
            NodeKind::DynamicArray => "dynamic array",
            NodeKind::Array => "array",
            NodeKind::Map => "map",
            NodeKind::List => "list",
        }
    }
}

impl ValueNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            ValueNode::Literal(_) => NodeKind::Literal,
            ValueNode::Constant(_) => NodeKind::Constant,
            ValueNode::Function { .. } => NodeKind::Function,
            ValueNode::Parameter(_) => NodeKind::Parameter,
            ValueNode::Variable(_) => NodeKind::Variable,
            ValueNode::FixtureReference(_) => NodeKind::FixtureReference,
            ValueNode::SelfReference => NodeKind::SelfReference,
            ValueNode::WildcardReference(_) => NodeKind::WildcardReference,
            ValueNode::RangeReference { .. } => NodeKind::RangeReference,
            ValueNode::ListReference { .. } => NodeKind::ListReference,
            ValueNode::PropertyReference { .. } => NodeKind::PropertyReference,
            ValueNode::Optional { .. } => NodeKind::Optional,
            ValueNode::DynamicArray { .. } => NodeKind::DynamicArray,
            ValueNode::Array(_) => NodeKind::Array,
            ValueNode::Map(_) => NodeKind::Map,
            ValueNode::List(_) => NodeKind::List,
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        ValueNode::Literal(value.into())
    }
}

impl std::fmt::Display for ValueNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueNode::Literal(s) => write!(f, "{:?}", s),
            ValueNode::Constant(v) => write!(f, "{}", v.to_json()),
            ValueNode::Function { name, arguments } => {
                write!(f, "{}(", name)?;
                write_list(f, arguments)?;
                write!(f, ")")
            }
            ValueNode::Parameter(name) => write!(f, "<{{{}}}>", name),
            ValueNode::Variable(name) => write!(f, "${}", name),
            ValueNode::FixtureReference(id) => write!(f, "@{}", id),
            ValueNode::SelfReference => write!(f, "@self"),
            ValueNode::WildcardReference(prefix) => write!(f, "@{}*", prefix),
            ValueNode::RangeReference { prefix, from, to } => {
                write!(f, "@{}{{{}..{}}}", prefix, from, to)
            }
            ValueNode::ListReference { prefix, items } => {
                write!(f, "@{}{{{}}}", prefix, items.join(", "))
            }
            ValueNode::PropertyReference {
                reference,
                property,
            } => write!(f, "{}->{}", reference, property),
            ValueNode::Optional {
                percentage,
                first,
                second,
            } => {
                write!(f, "optional({}%, {}", percentage, first)?;
                if let Some(second) = second {
                    write!(f, ", {}", second)?;
                }
                write!(f, ")")
            }
            ValueNode::DynamicArray {
                quantifier,
                element,
            } => write!(f, "repeat({}, {})", quantifier, element),
            ValueNode::Array(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            ValueNode::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, node)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, node)?;
                }
                write!(f, "}}")
            }
            ValueNode::List(items) => {
                write!(f, "concat(")?;
                write_list(f, items)?;
                write!(f, ")")
            }
        }
    }
}

fn write_list(f: &mut std::fmt::Formatter<'_>, items: &[ValueNode]) -> std::fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
