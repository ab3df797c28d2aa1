//! Property references and the comparison leaves they produce.

use trellis_core::Value;

use crate::expression::{Expression, Invertible};

/// A reference to one field of a named entity.
///
/// The expression name is `entity.field`; the parameter alias is
/// `entity_field`. Aliases are only unique when entity ids are unique within
/// a statement, which is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Property {
    name: String,
    alias: String,
}

impl Property {
    pub fn new(entity_id: &str, field: &str) -> Self {
        Self {
            name: format!("{entity_id}.{field}"),
            alias: format!("{entity_id}_{field}"),
        }
    }

    /// The expression name (`entity.field`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter alias (`entity_field`).
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Bare reference, as used in RETURN, ORDER BY, and WITH.
    pub fn get(&self) -> Expression {
        Expression::leaf(self.name.clone())
    }

    pub fn is_equal(&self, value: impl Into<Value>) -> Expression {
        self.apply("=", value.into())
    }

    pub fn is_not_equal(&self, value: impl Into<Value>) -> Expression {
        self.apply("<>", value.into())
    }

    pub fn less_than(&self, value: impl Into<Value>) -> Expression {
        self.apply("<", value.into())
    }

    pub fn less_equal(&self, value: impl Into<Value>) -> Expression {
        self.apply("<=", value.into())
    }

    pub fn greater_than(&self, value: impl Into<Value>) -> Expression {
        self.apply(">", value.into())
    }

    pub fn greater_equal(&self, value: impl Into<Value>) -> Expression {
        self.apply(">=", value.into())
    }

    pub fn starts_with(&self, prefix: &str) -> Expression {
        self.apply("STARTS WITH", Value::from(prefix))
    }

    pub fn ends_with(&self, suffix: &str) -> Expression {
        self.apply("ENDS WITH", Value::from(suffix))
    }

    pub fn contains(&self, value: impl Into<Value>) -> Expression {
        self.apply("CONTAINS", value.into())
    }

    /// List membership; the whole list is bound as one parameter.
    pub fn is_in<I, V>(&self, values: I) -> Expression
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let list = Value::List(values.into_iter().map(Into::into).collect());
        self.apply("IN", list)
    }

    /// Regular-expression match (`=~`).
    pub fn matches(&self, regex: &str) -> Expression {
        self.apply("=~", Value::from(regex))
    }

    pub fn is_null(&self) -> Expression {
        Expression::leaf(format!("{} IS NULL", self.name))
    }

    pub fn is_not_null(&self) -> Expression {
        Expression::leaf(format!("{} IS NOT NULL", self.name))
    }

    fn apply(&self, operator: &str, value: Value) -> Expression {
        Expression::bound(
            format!("{} {operator} ${}", self.name, self.alias),
            self.alias.clone(),
            value,
        )
    }
}

/// Negating a property tests a boolean field: `NOT entity.field`.
impl Invertible for Property {
    fn invert(self) -> Expression {
        (&self).invert()
    }
}

impl Invertible for &Property {
    fn invert(self) -> Expression {
        Expression::leaf(format!("NOT {}", self.name))
    }
}
