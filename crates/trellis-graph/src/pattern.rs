//! Graph patterns: nodes, relationships, and chained paths.
//!
//! Each pattern renders to ASCII-art Cypher plus the parameters referenced
//! from its property block. Parameters are aliased `id_field`, so every
//! entity in one statement needs a distinct id.

use trellis_core::{ParamMap, Value};

use crate::property::Property;

/// Anything that renders to pattern text.
pub trait Pattern {
    fn render(&self) -> (String, ParamMap);
}

/// Entities whose fields can be referenced in expressions.
pub trait HasProperties {
    /// Variable name the entity is bound to.
    fn entity_id(&self) -> &str;

    fn property(&self, field: &str) -> Property {
        Property::new(self.entity_id(), field)
    }

    fn properties(&self, fields: &[&str]) -> Vec<Property> {
        fields.iter().map(|field| self.property(field)).collect()
    }
}

// ── Node ─────────────────────────────────────────────────────────

/// A node pattern such as `(user:User{id: $user_id})`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    /// Variable name; empty for an anonymous node.
    pub id: String,
    pub labels: Vec<String>,
    pub properties: ParamMap,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn with_prop(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(field, value);
        self
    }

    pub fn with_props(mut self, properties: ParamMap) -> Self {
        self.properties = self.properties.merge(properties);
        self
    }
}

impl HasProperties for Node {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

impl Pattern for Node {
    fn render(&self) -> (String, ParamMap) {
        let labels: String = self.labels.iter().map(|label| format!(":{label}")).collect();
        let (block, params) = property_block(&self.id, &self.properties);
        (format!("({}{labels}{block})", self.id), params)
    }
}

impl Pattern for Option<Node> {
    fn render(&self) -> (String, ParamMap) {
        match self {
            Some(node) => node.render(),
            None => ("()".to_string(), ParamMap::new()),
        }
    }
}

// ── Relationship ─────────────────────────────────────────────────

/// Which way a relationship points, relative to the path it sits in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// `-[...]-`
    #[default]
    Undirected,
    /// `-[...]->`
    OriginToDestination,
    /// `<-[...]-`
    DestinationToOrigin,
}

/// A relationship pattern such as `-[owns:OWNS]->`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub properties: ParamMap,
    pub direction: Direction,
}

impl Relationship {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// An anonymous relationship with only a direction.
    pub fn directed(direction: Direction) -> Self {
        Self {
            direction,
            ..Default::default()
        }
    }

    pub fn with_type(mut self, rel_type: impl Into<String>) -> Self {
        self.rel_type = rel_type.into();
        self
    }

    pub fn with_prop(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(field, value);
        self
    }

    pub fn with_props(mut self, properties: ParamMap) -> Self {
        self.properties = self.properties.merge(properties);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

impl HasProperties for Relationship {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

impl Pattern for Relationship {
    fn render(&self) -> (String, ParamMap) {
        let rel_type = if self.rel_type.is_empty() {
            String::new()
        } else {
            format!(":{}", self.rel_type)
        };
        let (block, params) = property_block(&self.id, &self.properties);

        let body = if self.id.is_empty() && rel_type.is_empty() && block.is_empty() {
            String::new()
        } else {
            format!("[{}{rel_type}{block}]", self.id)
        };

        let arrow = match self.direction {
            Direction::Undirected => format!("-{body}-"),
            Direction::OriginToDestination => format!("-{body}->"),
            Direction::DestinationToOrigin => format!("<-{body}-"),
        };
        (arrow, params)
    }
}

impl Pattern for Option<Relationship> {
    fn render(&self) -> (String, ParamMap) {
        match self {
            Some(rel) => rel.render(),
            None => ("--".to_string(), ParamMap::new()),
        }
    }
}

// ── Path ─────────────────────────────────────────────────────────

/// What a path continues into: a final node or a further path.
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    Node(Node),
    Path(Box<Path>),
}

impl From<Node> for Destination {
    fn from(node: Node) -> Self {
        Destination::Node(node)
    }
}

impl From<Path> for Destination {
    fn from(path: Path) -> Self {
        Destination::Path(Box::new(path))
    }
}

impl Pattern for Destination {
    fn render(&self) -> (String, ParamMap) {
        match self {
            Destination::Node(node) => node.render(),
            Destination::Path(path) => path.render(),
        }
    }
}

/// `origin relationship destination`, where the destination may itself be a
/// path. Without a destination the path is just its origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    pub origin: Option<Node>,
    pub relationship: Option<Relationship>,
    pub destination: Option<Destination>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single hop from `origin` to `destination`.
    pub fn between(
        origin: Node,
        relationship: Relationship,
        destination: impl Into<Destination>,
    ) -> Self {
        Self {
            origin: Some(origin),
            relationship: Some(relationship),
            destination: Some(destination.into()),
        }
    }

    pub fn with_origin(mut self, origin: Node) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationship = Some(relationship);
        self
    }

    pub fn with_destination(mut self, destination: impl Into<Destination>) -> Self {
        self.destination = Some(destination.into());
        self
    }
}

impl Pattern for Path {
    fn render(&self) -> (String, ParamMap) {
        let (origin, origin_params) = self.origin.render();
        let Some(destination) = &self.destination else {
            return (origin, origin_params);
        };
        let (relationship, rel_params) = self.relationship.render();
        let (destination, dest_params) = destination.render();

        let params = origin_params.merge(rel_params).merge(dest_params);
        (format!("{origin}{relationship}{destination}"), params)
    }
}

impl Pattern for Option<Path> {
    fn render(&self) -> (String, ParamMap) {
        match self {
            Some(path) => path.render(),
            None => ("()".to_string(), ParamMap::new()),
        }
    }
}

/// Render `{field: $id_field, ...}` in sorted field order, or nothing when
/// there are no properties.
fn property_block(id: &str, properties: &ParamMap) -> (String, ParamMap) {
    if properties.is_empty() {
        return (String::new(), ParamMap::new());
    }
    let mut params = ParamMap::new();
    let fields: Vec<String> = properties
        .iter()
        .map(|(field, value)| {
            let alias = format!("{id}_{field}");
            let entry = format!("{field}: ${alias}");
            params.insert(alias, value.clone());
            entry
        })
        .collect();
    (format!("{{{}}}", fields.join(", ")), params)
}
