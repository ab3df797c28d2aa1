//! Boolean and list expressions built from property leaves.
//!
//! Cypher output has no implicit grouping between chained `AND`/`OR`/`XOR`,
//! so a composite child is wrapped in parentheses wherever it is nested in
//! another composition. Leaves and negations are never wrapped.

use std::fmt;

use trellis_core::{ParamMap, Value};

/// Separator placed between two composed expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// List separator (`, `), used by SET, ORDER BY, and RETURN.
    Then,
    And,
    Or,
    Xor,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Then => ", ",
            Operator::And => " AND ",
            Operator::Or => " OR ",
            Operator::Xor => " XOR ",
        }
    }
}

/// A renderable expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal text with at most one bound parameter.
    Leaf {
        text: String,
        param: Option<(String, Value)>,
    },
    /// A head expression followed by operator-separated children.
    ///
    /// `link` keeps `head` non-composite; a hand-built composite head is
    /// parenthesized like any other nested composite.
    Composite {
        head: Box<Expression>,
        links: Vec<(Operator, Expression)>,
    },
    /// `NOT ` followed by the wrapped expression.
    Negation(Box<Expression>),
    /// Explicitly parenthesized expression.
    Group(Box<Expression>),
}

impl Expression {
    /// A leaf with no parameter.
    pub fn leaf(text: impl Into<String>) -> Self {
        Expression::Leaf {
            text: text.into(),
            param: None,
        }
    }

    /// A leaf binding `value` under `alias`.
    pub fn bound(text: impl Into<String>, alias: impl Into<String>, value: Value) -> Self {
        Expression::Leaf {
            text: text.into(),
            param: Some((alias.into(), value)),
        }
    }

    /// Wrap an expression in parentheses regardless of context.
    pub fn group(expression: Expression) -> Self {
        Expression::Group(Box::new(expression))
    }

    pub fn then(self, next: Expression) -> Self {
        self.link(Operator::Then, next)
    }

    pub fn and(self, condition: Expression) -> Self {
        self.link(Operator::And, condition)
    }

    pub fn or(self, condition: Expression) -> Self {
        self.link(Operator::Or, condition)
    }

    pub fn xor(self, condition: Expression) -> Self {
        self.link(Operator::Xor, condition)
    }

    /// Append `child` after `operator`.
    ///
    /// Composing onto a composite extends its chain; anything else becomes
    /// the head of a new composite.
    pub fn link(self, operator: Operator, child: Expression) -> Self {
        match self {
            Expression::Composite { head, mut links } => {
                links.push((operator, child));
                Expression::Composite { head, links }
            }
            other => Expression::Composite {
                head: Box::new(other),
                links: vec![(operator, child)],
            },
        }
    }

    /// Join expressions with the list separator. `None` for an empty input.
    pub fn chain<I>(expressions: I) -> Option<Expression>
    where
        I: IntoIterator<Item = Expression>,
    {
        expressions.into_iter().reduce(Expression::then)
    }

    /// Whether this expression must be parenthesized when nested.
    pub fn is_composite(&self) -> bool {
        matches!(self, Expression::Composite { .. })
    }

    /// Render to statement text plus the parameters bound anywhere in the tree.
    pub fn eval(&self) -> (String, ParamMap) {
        let mut text = String::new();
        let mut params = ParamMap::new();
        self.render_into(&mut text, &mut params);
        (text, params)
    }

    fn render_into(&self, text: &mut String, params: &mut ParamMap) {
        match self {
            Expression::Leaf { text: own, param } => {
                text.push_str(own);
                if let Some((alias, value)) = param {
                    params.insert(alias.clone(), value.clone());
                }
            }
            Expression::Composite { head, links } => {
                head.render_nested(text, params);
                for (operator, child) in links {
                    text.push_str(operator.as_str());
                    child.render_nested(text, params);
                }
            }
            Expression::Negation(inner) => {
                text.push_str("NOT ");
                inner.render_into(text, params);
            }
            Expression::Group(inner) => {
                text.push('(');
                inner.render_into(text, params);
                text.push(')');
            }
        }
    }
}

impl Expression {
    // A composite nested anywhere inside another composite is parenthesized.
    fn render_nested(&self, text: &mut String, params: &mut ParamMap) {
        if self.is_composite() {
            text.push('(');
            self.render_into(text, params);
            text.push(')');
        } else {
            self.render_into(text, params);
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.eval().0)
    }
}

/// Anything that can be negated with [`not`].
pub trait Invertible {
    fn invert(self) -> Expression;
}

impl Invertible for Expression {
    fn invert(self) -> Expression {
        Expression::Negation(Box::new(self))
    }
}

/// Negate a property (boolean field) or a whole expression.
pub fn not(target: impl Invertible) -> Expression {
    target.invert()
}
