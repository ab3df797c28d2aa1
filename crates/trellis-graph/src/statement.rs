//! Fluent, immutable Cypher statement assembly.
//!
//! Every clause method returns a new `Statement` and leaves the receiver as
//! it was, so a partial statement can be branched and reused. Clauses live in
//! an `Arc`-linked list: appending is O(1) and branches share their prefix.
//!
//! Clause order is not validated. `on_create`, `on_match`, and `optional`
//! only emit their keyword; placing them before the right clause is up to
//! the caller.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use trellis_core::ParamMap;

use crate::expression::Expression;
use crate::pattern::{HasProperties, Pattern};
use crate::property::Property;

struct Clause {
    text: String,
    params: ParamMap,
    prev: Option<Arc<Clause>>,
}

impl Drop for Clause {
    // Unlink iteratively so long statements don't recurse on drop.
    fn drop(&mut self) {
        let mut prev = self.prev.take();
        while let Some(node) = prev {
            match Arc::try_unwrap(node) {
                Ok(mut clause) => prev = clause.prev.take(),
                Err(_) => break,
            }
        }
    }
}

/// An ordered sequence of rendered clauses plus their parameters.
#[derive(Clone, Default)]
pub struct Statement {
    last: Option<Arc<Clause>>,
    len: usize,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append raw clause text with its parameters.
    ///
    /// Every other clause method is built on this one.
    pub fn custom(&self, text: impl Into<String>, params: ParamMap) -> Statement {
        Statement {
            last: Some(Arc::new(Clause {
                text: text.into(),
                params,
                prev: self.last.clone(),
            })),
            len: self.len + 1,
        }
    }

    // ── Pattern clauses ──────────────────────────────────────────

    pub fn match_(&self, pattern: &impl Pattern) -> Statement {
        self.primary("MATCH", pattern)
    }

    pub fn create(&self, pattern: &impl Pattern) -> Statement {
        self.primary("CREATE", pattern)
    }

    pub fn merge(&self, pattern: &impl Pattern) -> Statement {
        self.primary("MERGE", pattern)
    }

    pub fn on_create(&self) -> Statement {
        self.keyword("ON CREATE")
    }

    pub fn on_match(&self) -> Statement {
        self.keyword("ON MATCH")
    }

    pub fn optional(&self) -> Statement {
        self.keyword("OPTIONAL")
    }

    // ── Updating clauses ─────────────────────────────────────────

    /// `SET e.a = $e_a, e.b = $e_b` in sorted field order.
    ///
    /// A missing entity or an empty value map leaves the statement unchanged.
    pub fn set<E: HasProperties>(&self, entity: Option<&E>, values: &ParamMap) -> Statement {
        let Some(entity) = entity else {
            tracing::trace!("SET skipped: no entity");
            return self.clone();
        };
        let assignments = values
            .iter()
            .map(|(field, value)| entity.property(field).is_equal(value.clone()));
        match Expression::chain(assignments) {
            Some(chain) => {
                let (text, params) = chain.eval();
                self.custom(format!("SET {text}"), params)
            }
            None => {
                tracing::trace!(entity = entity.entity_id(), "SET skipped: no properties");
                self.clone()
            }
        }
    }

    pub fn delete<I, S>(&self, ids: I) -> Statement
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keyword(&format!("DELETE {}", join_ids(ids)))
    }

    pub fn detach_delete<I, S>(&self, ids: I) -> Statement
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keyword(&format!("DETACH DELETE {}", join_ids(ids)))
    }

    // ── Filtering and projection ─────────────────────────────────

    pub fn where_(&self, condition: &Expression) -> Statement {
        let (text, params) = condition.eval();
        self.custom(format!("WHERE {text}"), params)
    }

    pub fn with<I, S>(&self, ids: I) -> Statement
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keyword(&format!("WITH {}", join_ids(ids)))
    }

    /// `RETURN a.x, b.y`. An empty list leaves the statement unchanged.
    pub fn return_<I>(&self, properties: I) -> Statement
    where
        I: IntoIterator,
        I::Item: Borrow<Property>,
    {
        self.references("RETURN", properties)
    }

    /// `ORDER BY a.x, b.y`. An empty list leaves the statement unchanged.
    pub fn order_by<I>(&self, properties: I) -> Statement
    where
        I: IntoIterator,
        I::Item: Borrow<Property>,
    {
        self.references("ORDER BY", properties)
    }

    pub fn desc(&self) -> Statement {
        self.keyword("DESC")
    }

    pub fn limit(&self, limit: u64) -> Statement {
        self.keyword(&format!("LIMIT {limit}"))
    }

    pub fn skip(&self, skip: u64) -> Statement {
        self.keyword(&format!("SKIP {skip}"))
    }

    // ── Rendering ────────────────────────────────────────────────

    /// Join all clauses with single spaces and fold their parameters in
    /// clause order (later clauses win on alias collisions).
    pub fn eval(&self) -> (String, ParamMap) {
        let mut clauses = Vec::with_capacity(self.len);
        let mut cursor = self.last.as_deref();
        while let Some(clause) = cursor {
            clauses.push(clause);
            cursor = clause.prev.as_deref();
        }
        clauses.reverse();

        let text = clauses
            .iter()
            .map(|clause| clause.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let params = clauses
            .into_iter()
            .fold(ParamMap::new(), |acc, clause| acc.merge(clause.params.clone()));
        (text, params)
    }

    fn primary(&self, keyword: &str, pattern: &impl Pattern) -> Statement {
        let (text, params) = pattern.render();
        self.custom(format!("{keyword} {text}"), params)
    }

    fn keyword(&self, text: &str) -> Statement {
        self.custom(text, ParamMap::new())
    }

    fn references<I>(&self, keyword: &str, properties: I) -> Statement
    where
        I: IntoIterator,
        I::Item: Borrow<Property>,
    {
        let references = properties.into_iter().map(|prop| prop.borrow().get());
        match Expression::chain(references) {
            Some(chain) => self.keyword(&format!("{keyword} {chain}")),
            None => self.clone(),
        }
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (text, params) = self.eval();
        f.debug_struct("Statement")
            .field("len", &self.len)
            .field("text", &text)
            .field("params", &params)
            .finish()
    }
}

/// `[Query] <text>` and `[Params] <params>` on separate lines.
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (text, params) = self.eval();
        writeln!(f, "[Query] {text}")?;
        writeln!(f, "[Params] {params}")
    }
}

fn join_ids<I, S>(ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ids.into_iter()
        .map(|id| id.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::not;
    use crate::pattern::{Direction, Node, Path, Relationship};
    use trellis_core::Value;

    #[test]
    fn test_empty_statement() {
        let statement = Statement::new();
        assert!(statement.is_empty());
        assert_eq!(statement.eval(), (String::new(), ParamMap::new()));
    }

    #[test]
    fn test_clauses_joined_in_order() {
        let user = Node::new("user").with_label("User").with_prop("id", "000");
        let statement = Statement::new()
            .match_(&user)
            .return_(user.properties(&["id"]));
        assert_eq!(statement.len(), 2);
        assert_eq!(
            statement.eval(),
            (
                "MATCH (user:User{id: $user_id}) RETURN user.id".to_string(),
                ParamMap::new().with("user_id", "000"),
            )
        );
    }

    #[test]
    fn test_statement_is_immutable() {
        let user = Node::new("user").with_prop("name", "John");
        let s1 = Statement::new().match_(&user);
        let before = s1.eval();

        let s2 = s1.match_(&Node::new("product").with_prop("id", 1));
        let s3 = s1.return_([user.property("name")]);

        assert_eq!(s1.eval(), before);
        assert_eq!(
            s2.eval().0,
            "MATCH (user{name: $user_name}) MATCH (product{id: $product_id})"
        );
        assert_eq!(s3.eval().0, "MATCH (user{name: $user_name}) RETURN user.name");
        assert!(!s3.eval().1.contains_key("product_id"));
    }

    #[test]
    fn test_where_with_negated_property() {
        let user = Node::new("user").with_label("User");
        let condition = not(user.property("banned")).and(user.property("name").is_equal("John"));
        let (text, params) = Statement::new().match_(&user).where_(&condition).eval();
        assert_eq!(
            text,
            "MATCH (user:User) WHERE NOT user.banned AND user.name = $user_name"
        );
        assert_eq!(params.get("user_name"), Some(&Value::from("John")));
    }

    #[test]
    fn test_set_sorted_and_comma_separated() {
        let user = Node::new("user");
        let values = ParamMap::new().with("name", "John").with("age", 21);
        let (text, params) = Statement::new().set(Some(&user), &values).eval();
        assert_eq!(text, "SET user.age = $user_age, user.name = $user_name");
        assert_eq!(params, ParamMap::new().with("user_age", 21).with("user_name", "John"));
    }

    #[test]
    fn test_set_noop_cases() {
        let base = Statement::new().match_(&Node::new("user"));
        let unchanged = base.set(Some(&Node::new("user")), &ParamMap::new());
        assert_eq!(unchanged.eval(), base.eval());
        assert_eq!(unchanged.len(), base.len());

        let missing = base.set(None::<&Relationship>, &ParamMap::new().with("x", 1));
        assert_eq!(missing.eval(), base.eval());
    }

    #[test]
    fn test_empty_projection_is_noop() {
        let base = Statement::new().match_(&Node::new("n"));
        let no_props: Vec<Property> = Vec::new();
        assert_eq!(base.return_(&no_props).len(), 1);
        assert_eq!(base.order_by(no_props).len(), 1);
    }

    #[test]
    fn test_keyword_clauses() {
        let user = Node::new("user");
        let (text, params) = Statement::new()
            .match_(&user)
            .with(["user"])
            .order_by([user.property("age")])
            .desc()
            .skip(10)
            .limit(5)
            .delete(vec!["owns".to_string(), "product".to_string()])
            .detach_delete(["user"])
            .eval();
        assert_eq!(
            text,
            "MATCH (user) WITH user ORDER BY user.age DESC SKIP 10 LIMIT 5 \
             DELETE owns, product DETACH DELETE user"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_optional_and_merge_actions() {
        let owns = Relationship::new("owns")
            .with_type("OWNS")
            .with_direction(Direction::OriginToDestination);
        let path = Path::between(Node::new("user"), owns.clone(), Node::new("product"));
        let (text, params) = Statement::new()
            .optional()
            .match_(&path)
            .merge(&path)
            .on_create()
            .set(Some(&owns), &ParamMap::new().with("created", "TODAY"))
            .on_match()
            .set(Some(&owns), &ParamMap::new().with("updated", "TODAY"))
            .eval();
        assert_eq!(
            text,
            "OPTIONAL MATCH (user)-[owns:OWNS]->(product) \
             MERGE (user)-[owns:OWNS]->(product) \
             ON CREATE SET owns.created = $owns_created \
             ON MATCH SET owns.updated = $owns_updated"
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_later_clause_wins_alias_collision() {
        let (_, params) = Statement::new()
            .custom("MATCH (n{id: $n_id})", ParamMap::new().with("n_id", 1))
            .custom("SET n.id = $n_id", ParamMap::new().with("n_id", 2))
            .eval();
        assert_eq!(params, ParamMap::new().with("n_id", 2));
    }

    #[test]
    fn test_display_format() {
        let statement = Statement::new().match_(&Node::new("user").with_prop("name", "John"));
        assert_eq!(
            statement.to_string(),
            "[Query] MATCH (user{name: $user_name})\n[Params] {user_name: \"John\"}\n"
        );
    }

    #[test]
    fn test_long_statement_drops_cleanly() {
        let mut statement = Statement::new();
        for i in 0..100_000u64 {
            statement = statement.limit(i);
        }
        assert_eq!(statement.len(), 100_000);
        drop(statement);
    }

    #[test]
    fn test_long_statement_debug_format() {
        let mut statement = Statement::new();
        for i in 0..100_000u64 {
            statement = statement.limit(i);
        }
        let formatted = format!("{statement:?}");
        assert!(formatted.starts_with("Statement { len: 100000, text: \"LIMIT 0 LIMIT 1 "));
        assert!(formatted.contains("LIMIT 99999\""));
    }
}
