//! Entity-agnostic query restriction tree

use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::Identifier;

/// Column of an aliased table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub alias: String,
    pub column: String,
}

impl FieldRef {
    pub fn new(alias: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.column)
    }
}

/// Literal compared against a column
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Str(String),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<&Identifier> for Value {
    fn from(identifier: &Identifier) -> Self {
        match identifier {
            Identifier::Int(value) => Value::Int(*value),
            Identifier::Str(value) => Value::Str(value.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Str(value) => write!(f, "'{}'", value.replace('\'', "''")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq(Value),
    In(Vec<Value>),
    IsNull,
    IsNotNull,
}

/// Leaf comparison `field <op> value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub field: FieldRef,
    pub op: Operator,
}

impl Comparison {
    pub fn eq(field: FieldRef, value: impl Into<Value>) -> Self {
        Self {
            field,
            op: Operator::Eq(value.into()),
        }
    }

    pub fn is_in(field: FieldRef, values: Vec<Value>) -> Self {
        Self {
            field,
            op: Operator::In(values),
        }
    }

    pub fn is_null(field: FieldRef) -> Self {
        Self {
            field,
            op: Operator::IsNull,
        }
    }

    pub fn is_not_null(field: FieldRef) -> Self {
        Self {
            field,
            op: Operator::IsNotNull,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            Operator::Eq(value) => write!(f, "{} = {}", self.field, value),
            Operator::In(values) => {
                let list: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{} IN ({})", self.field, list.join(", "))
            }
            Operator::IsNull => write!(f, "{} IS NULL", self.field),
            Operator::IsNotNull => write!(f, "{} IS NOT NULL", self.field),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    fn as_str(&self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub conjunction: Conjunction,
    pub conditions: Vec<Condition>,
}

/// Restriction a query executor ANDs into its WHERE clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Matches nothing
    AlwaysFalse,
    Compare(Comparison),
    Group(ConditionGroup),
}

impl Condition {
    /// Conjunction of `conditions`, in canonical form
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::group(Conjunction::And, conditions)
    }

    /// Disjunction of `conditions`, in canonical form; empty is [`Condition::AlwaysFalse`]
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::group(Conjunction::Or, conditions)
    }

    pub fn is_always_false(&self) -> bool {
        matches!(self, Condition::AlwaysFalse)
    }

    /// Nested groups of the same conjunction are flattened and single
    /// children are collapsed. `AlwaysFalse` is absorbing in AND and neutral in OR.
    fn group(conjunction: Conjunction, conditions: impl IntoIterator<Item = Condition>) -> Self {
        let mut flat = Vec::new();
        for condition in conditions {
            match condition {
                Condition::AlwaysFalse => match conjunction {
                    Conjunction::And => return Condition::AlwaysFalse,
                    Conjunction::Or => continue,
                },
                Condition::Group(group) if group.conjunction == conjunction => flat.extend(group.conditions),
                other => flat.push(other),
            }
        }

        match (flat.len(), conjunction) {
            (0, Conjunction::Or) => Condition::AlwaysFalse,
            (1, _) => flat.remove(0),
            _ => Condition::Group(ConditionGroup {
                conjunction,
                conditions: flat,
            }),
        }
    }
}

impl From<Comparison> for Condition {
    fn from(comparison: Comparison) -> Self {
        Condition::Compare(comparison)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::AlwaysFalse => f.write_str("1 = 0"),
            Condition::Compare(comparison) => write!(f, "{}", comparison),
            Condition::Group(group) => {
                let parts: Vec<String> = group.conditions.iter().map(ToString::to_string).collect();
                write!(f, "({})", parts.join(&format!(" {} ", group.conjunction.as_str())))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Inner,
    Left,
}

/// Table the restricted query must join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub alias: String,
    /// Pairs of (joined column, column it equals)
    pub on: Vec<(FieldRef, FieldRef)>,
    /// Extra predicates on the joined table
    pub filter: Vec<Comparison>,
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
        };
        let predicates: Vec<String> = self
            .on
            .iter()
            .map(|(left, right)| format!("{} = {}", left, right))
            .chain(self.filter.iter().map(ToString::to_string))
            .collect();
        write!(
            f,
            "{} JOIN {} {} ON {}",
            kind,
            self.table,
            self.alias,
            predicates.join(" AND ")
        )
    }
}

/// Condition plus the joins it needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRestriction {
    pub condition: Condition,
    pub joins: Vec<Join>,
}

impl QueryRestriction {
    /// Restriction matching nothing
    pub fn deny_all() -> Self {
        Self {
            condition: Condition::AlwaysFalse,
            joins: Vec::new(),
        }
    }

    pub fn is_deny_all(&self) -> bool {
        self.condition.is_always_false()
    }

    /// Join with the given alias, if required
    pub fn join(&self, alias: &str) -> Option<&Join> {
        self.joins.iter().find(|join| join.alias == alias)
    }
}
