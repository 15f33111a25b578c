//! Turns calculated permissions into a query restriction
//!
//! Every scope contributes branches keyed by (cell, identifier), where a cell
//! is admin, any or own for a status branch. Identifiers sharing a cell are
//! folded into one `IN` list so the tree stays small for accounts in many
//! groups. Everything is a pure function of the inputs.

use std::collections::BTreeMap;
use tracing::debug;
use warden_core::{scope, Account, CalculatedPermissions, Ownership, PermissionItem, PermissionName};

use crate::condition::{Comparison, Condition, FieldRef, Join, JoinKind, QueryRestriction, Value};
use crate::meta::{EntityAccessMeta, Operation, QueryLayout};

/// Alias of the group relationship join
pub const RELATIONSHIP_ALIAS: &str = "rel";

/// Alias of the account membership lookup join
pub const MEMBERSHIP_ALIAS: &str = "mem";

/// Alias of the entity data table join
pub const DATA_ALIAS: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Status {
    Published,
    Unpublished,
}

impl Status {
    fn flag(self) -> i64 {
        match self {
            Status::Published => 1,
            Status::Unpublished => 0,
        }
    }
}

/// One independently evaluated (status x ownership) cell of a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Cell {
    Admin,
    Any(Option<Status>),
    Own(Option<Status>),
}

/// Joins the branches built so far rely on
#[derive(Debug, Default)]
struct Needs {
    membership: bool,
    data: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AccessConditionBuilder {
    layout: QueryLayout,
}

impl AccessConditionBuilder {
    pub fn new(layout: QueryLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &QueryLayout {
        &self.layout
    }

    /// Restrict a query on `meta.kind` to what `account` may `operation`.
    ///
    /// `permissions` should hold the individual, insider and outsider items
    /// of the account. Anything not granted is denied, including operations
    /// the kind does not support.
    pub fn build<P>(
        &self,
        permissions: &P,
        meta: &EntityAccessMeta,
        operation: &Operation,
        account: &Account,
    ) -> QueryRestriction
    where
        P: CalculatedPermissions + ?Sized,
    {
        if !meta.supports(operation) {
            debug!("Operation '{}' is not supported for '{}'", operation, meta.kind);
            return QueryRestriction::deny_all();
        }

        let mut needs = Needs::default();
        let mut branches = Vec::new();
        for scope in scope::ALL {
            branches.extend(self.scope_branches(permissions, meta, operation, account, scope, &mut needs));
        }

        let condition = Condition::any(branches);
        if condition.is_always_false() {
            debug!("No scope grants '{}' on '{}' to {}", operation, meta.kind, account.id);
            return QueryRestriction::deny_all();
        }

        QueryRestriction {
            condition,
            joins: self.joins(meta, account, &needs),
        }
    }

    fn scope_branches<P>(
        &self,
        permissions: &P,
        meta: &EntityAccessMeta,
        operation: &Operation,
        account: &Account,
        scope: &str,
        needs: &mut Needs,
    ) -> Vec<Condition>
    where
        P: CalculatedPermissions + ?Sized,
    {
        let mut cells: BTreeMap<Cell, Vec<Value>> = BTreeMap::new();
        for item in permissions.items_by_scope(scope) {
            for cell in cells_for(item, meta, operation) {
                cells.entry(cell).or_default().push(Value::from(item.identifier()));
            }
        }

        cells
            .into_iter()
            .map(|(cell, identifiers)| {
                let mut parts = self.scope_match(scope, identifiers, account, needs);
                match cell {
                    Cell::Admin => {}
                    Cell::Any(status) => parts.extend(self.status_check(meta, status, needs)),
                    Cell::Own(status) => {
                        let owner = self.owner_check(meta, account, needs);
                        if owner.as_ref().is_some_and(Condition::is_always_false) {
                            return Condition::AlwaysFalse;
                        }
                        parts.extend(owner);
                        parts.extend(self.status_check(meta, status, needs));
                    }
                }
                Condition::all(parts)
            })
            .collect()
    }

    /// Restrict to the scope's groups: group ids for individual, group
    /// types with or without a membership for insider and outsider.
    ///
    /// An account whose id no stored row can hold is a member of nothing.
    fn scope_match(&self, scope: &str, identifiers: Vec<Value>, account: &Account, needs: &mut Needs) -> Vec<Condition> {
        let layout = &self.layout;
        let relationship = |column: &str| FieldRef::new(RELATIONSHIP_ALIAS, column);
        let member = FieldRef::new(MEMBERSHIP_ALIAS, layout.entity_id_column.as_str());

        if account_value(account).is_none() {
            return match scope {
                scope::INSIDER => vec![Condition::AlwaysFalse],
                scope::OUTSIDER => {
                    vec![Comparison::is_in(relationship(layout.group_type_column.as_str()), identifiers).into()]
                }
                _ => vec![Comparison::is_in(relationship(layout.group_id_column.as_str()), identifiers).into()],
            };
        }

        match scope {
            scope::INSIDER => {
                needs.membership = true;
                vec![
                    Comparison::is_in(relationship(layout.group_type_column.as_str()), identifiers).into(),
                    Comparison::is_not_null(member).into(),
                ]
            }
            scope::OUTSIDER => {
                needs.membership = true;
                vec![
                    Comparison::is_in(relationship(layout.group_type_column.as_str()), identifiers).into(),
                    Comparison::is_null(member).into(),
                ]
            }
            _ => vec![Comparison::is_in(relationship(layout.group_id_column.as_str()), identifiers).into()],
        }
    }

    fn owner_check(&self, meta: &EntityAccessMeta, account: &Account, needs: &mut Needs) -> Option<Condition> {
        let column = meta.owner_column.as_deref()?;
        let Some(owner) = account_value(account) else {
            return Some(Condition::AlwaysFalse);
        };
        needs.data = true;
        Some(Comparison::eq(FieldRef::new(DATA_ALIAS, column), owner).into())
    }

    fn status_check(&self, meta: &EntityAccessMeta, status: Option<Status>, needs: &mut Needs) -> Option<Condition> {
        let status = status?;
        let column = meta.status_column.as_deref()?;
        needs.data = true;
        Some(Comparison::eq(FieldRef::new(DATA_ALIAS, column), status.flag()).into())
    }

    fn joins(&self, meta: &EntityAccessMeta, account: &Account, needs: &Needs) -> Vec<Join> {
        let layout = &self.layout;
        let base_id = FieldRef::new(layout.base_alias.as_str(), meta.id_column.as_str());

        let mut relationship_filter = Vec::new();
        if !meta.relationship_plugins.is_empty() {
            relationship_filter.push(Comparison::is_in(
                FieldRef::new(RELATIONSHIP_ALIAS, layout.plugin_id_column.as_str()),
                meta.relationship_plugins.iter().map(|id| Value::from(id.as_str())).collect(),
            ));
        }

        let mut joins = vec![Join {
            kind: JoinKind::Left,
            table: layout.relationship_table.clone(),
            alias: RELATIONSHIP_ALIAS.to_string(),
            on: vec![(
                FieldRef::new(RELATIONSHIP_ALIAS, layout.entity_id_column.as_str()),
                base_id.clone(),
            )],
            filter: relationship_filter,
        }];

        if let Some(member) = account_value(account).filter(|_| needs.membership) {
            joins.push(Join {
                kind: JoinKind::Left,
                table: layout.relationship_table.clone(),
                alias: MEMBERSHIP_ALIAS.to_string(),
                on: vec![(
                    FieldRef::new(MEMBERSHIP_ALIAS, layout.group_id_column.as_str()),
                    FieldRef::new(RELATIONSHIP_ALIAS, layout.group_id_column.as_str()),
                )],
                filter: vec![
                    Comparison::eq(
                        FieldRef::new(MEMBERSHIP_ALIAS, layout.plugin_id_column.as_str()),
                        layout.membership_plugin.as_str(),
                    ),
                    Comparison::eq(
                        FieldRef::new(MEMBERSHIP_ALIAS, layout.entity_id_column.as_str()),
                        member,
                    ),
                ],
            });
        }

        if needs.data {
            joins.push(Join {
                kind: JoinKind::Inner,
                table: meta.data_table.clone(),
                alias: DATA_ALIAS.to_string(),
                on: vec![(FieldRef::new(DATA_ALIAS, meta.id_column.as_str()), base_id)],
                filter: Vec::new(),
            });
        }

        joins
    }
}

/// Account id as a column value; `None` when it exceeds the signed id range
fn account_value(account: &Account) -> Option<Value> {
    i64::try_from(account.id.0).ok().map(Value::Int)
}

fn is_admin(item: &PermissionItem, meta: &EntityAccessMeta) -> bool {
    item.is_admin()
        || (meta.admin_permission
            && item.has_permission(&PermissionName::administer(meta.kind.as_str()).to_string()))
}

/// Cells an item grants; admin short-circuits everything else and an any
/// grant covers own for the same status branch
fn cells_for(item: &PermissionItem, meta: &EntityAccessMeta, operation: &Operation) -> Vec<Cell> {
    if is_admin(item, meta) {
        return vec![Cell::Admin];
    }

    let statuses: &[Option<Status>] = if meta.is_publishable() && *operation == Operation::View {
        &[Some(Status::Published), Some(Status::Unpublished)]
    } else {
        &[None]
    };

    let grants = |ownership: Ownership, unpublished: bool| {
        let name = PermissionName::entity(operation.as_str(), ownership, unpublished, meta.kind.as_str());
        item.has_permission(&name.to_string())
    };

    statuses
        .iter()
        .filter_map(|&status| {
            let unpublished = status == Some(Status::Unpublished);
            if grants(Ownership::Any, unpublished) {
                Some(Cell::Any(status))
            } else if meta.is_ownable() && grants(Ownership::Own, unpublished) {
                Some(Cell::Own(status))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{ConditionGroup, Conjunction};
    use warden_core::{PermissionItem, PermissionsBuilder, PermissionsCollection};

    fn page() -> EntityAccessMeta {
        EntityAccessMeta::new("page", "node_field_data")
            .ownable("uid")
            .publishable("status")
            .with_admin_permission()
            .with_relationship_plugin("group_node:page")
    }

    fn collection(items: Vec<PermissionItem>) -> PermissionsCollection {
        items
            .into_iter()
            .fold(PermissionsBuilder::new(), |builder, item| builder.with_item(item))
            .seal()
            .freeze()
    }

    fn field(alias: &str, column: &str) -> FieldRef {
        FieldRef::new(alias, column)
    }

    fn and(conditions: Vec<Condition>) -> Condition {
        Condition::Group(ConditionGroup {
            conjunction: Conjunction::And,
            conditions,
        })
    }

    fn or(conditions: Vec<Condition>) -> Condition {
        Condition::Group(ConditionGroup {
            conjunction: Conjunction::Or,
            conditions,
        })
    }

    fn build(items: Vec<PermissionItem>, operation: Operation) -> QueryRestriction {
        AccessConditionBuilder::default().build(&collection(items), &page(), &operation, &Account::new(42))
    }

    #[test]
    fn test_unsupported_operation_denies() {
        let items = vec![PermissionItem::admin(scope::INDIVIDUAL, 1)];
        let restriction = build(items, Operation::Other("publish".to_string()));
        assert_eq!(restriction, QueryRestriction::deny_all());
    }

    #[test]
    fn test_no_grants_deny_without_joins() {
        let items = vec![PermissionItem::new(scope::INDIVIDUAL, 1, ["view group"], false)];
        let restriction = build(items, Operation::View);
        assert!(restriction.is_deny_all());
        assert!(restriction.joins.is_empty());
    }

    #[test]
    fn test_admin_flag_short_circuits_scope() {
        let restriction = build(vec![PermissionItem::admin(scope::INDIVIDUAL, 1)], Operation::View);

        assert_eq!(
            restriction.condition,
            Comparison::is_in(field("rel", "gid"), vec![Value::Int(1)]).into()
        );
        assert_eq!(restriction.joins.len(), 1);
        assert!(restriction.join(DATA_ALIAS).is_none());
    }

    #[test]
    fn test_administer_permission_counts_as_admin() {
        let item = PermissionItem::new(
            scope::INSIDER,
            "club",
            ["administer page", "view any page entity", "view own unpublished page entity"],
            false,
        );
        let restriction = build(vec![item], Operation::View);

        assert_eq!(
            restriction.condition,
            and(vec![
                Comparison::is_in(field("rel", "group_type"), vec![Value::from("club")]).into(),
                Comparison::is_not_null(field("mem", "entity_id")).into(),
            ])
        );
        assert!(restriction.join(MEMBERSHIP_ALIAS).is_some());
        assert!(restriction.join(DATA_ALIAS).is_none());
    }

    #[test]
    fn test_administer_ignored_without_admin_permission() {
        let meta = EntityAccessMeta::new("page", "node_field_data").with_relationship_plugin("group_node:page");
        let items = collection(vec![PermissionItem::new(scope::INDIVIDUAL, 1, ["administer page"], false)]);
        let restriction = AccessConditionBuilder::default().build(&items, &meta, &Operation::View, &Account::new(42));
        assert!(restriction.is_deny_all());
    }

    #[test]
    fn test_own_unpublished_and_outsider_any() {
        let items = vec![
            PermissionItem::new(scope::INDIVIDUAL, 7, ["view own unpublished page entity"], false),
            PermissionItem::new(scope::OUTSIDER, "club", ["view any page entity"], false),
        ];
        let restriction = build(items, Operation::View);

        let expected = or(vec![
            and(vec![
                Comparison::is_in(field("rel", "gid"), vec![Value::Int(7)]).into(),
                Comparison::eq(field("data", "uid"), 42).into(),
                Comparison::eq(field("data", "status"), 0).into(),
            ]),
            and(vec![
                Comparison::is_in(field("rel", "group_type"), vec![Value::from("club")]).into(),
                Comparison::is_null(field("mem", "entity_id")).into(),
                Comparison::eq(field("data", "status"), 1).into(),
            ]),
        ]);
        assert_eq!(restriction.condition, expected);

        let aliases: Vec<&str> = restriction.joins.iter().map(|join| join.alias.as_str()).collect();
        assert_eq!(aliases, vec!["rel", "mem", "data"]);

        let membership = restriction.join(MEMBERSHIP_ALIAS).unwrap();
        assert_eq!(membership.kind, JoinKind::Left);
        assert_eq!(
            membership.filter,
            vec![
                Comparison::eq(field("mem", "plugin_id"), "group_membership"),
                Comparison::eq(field("mem", "entity_id"), 42),
            ]
        );
    }

    #[test]
    fn test_any_subsumes_own_in_same_branch() {
        let items = vec![PermissionItem::new(
            scope::INDIVIDUAL,
            1,
            ["view any page entity", "view own page entity"],
            false,
        )];
        let restriction = build(items, Operation::View);

        assert_eq!(
            restriction.condition,
            and(vec![
                Comparison::is_in(field("rel", "gid"), vec![Value::Int(1)]).into(),
                Comparison::eq(field("data", "status"), 1).into(),
            ])
        );
    }

    #[test]
    fn test_identifiers_sharing_a_cell_are_bucketed() {
        let items = vec![
            PermissionItem::new(scope::INDIVIDUAL, 2, ["update any page entity"], false),
            PermissionItem::new(scope::INDIVIDUAL, 1, ["update any page entity"], false),
            PermissionItem::new(scope::INDIVIDUAL, 3, ["update own page entity"], false),
        ];
        let restriction = build(items, Operation::Update);

        assert_eq!(
            restriction.condition,
            or(vec![
                Comparison::is_in(field("rel", "gid"), vec![Value::Int(1), Value::Int(2)]).into(),
                and(vec![
                    Comparison::is_in(field("rel", "gid"), vec![Value::Int(3)]).into(),
                    Comparison::eq(field("data", "uid"), 42).into(),
                ]),
            ])
        );
    }

    #[test]
    fn test_non_view_operation_skips_status_and_data_join() {
        let items = vec![PermissionItem::new(scope::INDIVIDUAL, 1, ["delete any page entity"], false)];
        let restriction = build(items, Operation::Delete);

        assert_eq!(
            restriction.condition,
            Comparison::is_in(field("rel", "gid"), vec![Value::Int(1)]).into()
        );
        assert_eq!(restriction.joins.len(), 1);
        assert_eq!(
            restriction.joins[0].filter,
            vec![Comparison::is_in(field("rel", "plugin_id"), vec![Value::from("group_node:page")])]
        );
    }

    #[test]
    fn test_own_ignored_for_unownable_kind() {
        let meta = EntityAccessMeta::new("media", "media_field_data").with_relationship_plugin("group_media");
        let items = collection(vec![PermissionItem::new(scope::INDIVIDUAL, 1, ["view own media entity"], false)]);
        let restriction = AccessConditionBuilder::default().build(&items, &meta, &Operation::View, &Account::new(42));
        assert!(restriction.is_deny_all());
    }

    #[test]
    fn test_account_beyond_id_range_owns_and_joins_nothing() {
        let items = collection(vec![
            PermissionItem::new(scope::INDIVIDUAL, 7, ["view own unpublished page entity"], false),
            PermissionItem::new(scope::INSIDER, "club", ["view any page entity"], false),
            PermissionItem::new(scope::OUTSIDER, "club", ["view any page entity"], false),
        ]);
        let restriction =
            AccessConditionBuilder::default().build(&items, &page(), &Operation::View, &Account::new(u64::MAX));

        assert_eq!(
            restriction.condition,
            and(vec![
                Comparison::is_in(field("rel", "group_type"), vec![Value::from("club")]).into(),
                Comparison::eq(field("data", "status"), 1).into(),
            ])
        );
        let aliases: Vec<&str> = restriction.joins.iter().map(|join| join.alias.as_str()).collect();
        assert_eq!(aliases, vec!["rel", "data"]);
    }

    #[test]
    fn test_account_beyond_id_range_with_only_own_grants_is_denied() {
        let items = collection(vec![PermissionItem::new(scope::INDIVIDUAL, 7, ["update own page entity"], false)]);
        let restriction =
            AccessConditionBuilder::default().build(&items, &page(), &Operation::Update, &Account::new(u64::MAX));
        assert!(restriction.is_deny_all());
    }

    #[test]
    fn test_build_is_deterministic() {
        let items = vec![
            PermissionItem::new(scope::INSIDER, "club", ["view own page entity"], false),
            PermissionItem::new(scope::OUTSIDER, "team", ["view any unpublished page entity"], false),
        ];
        let first = build(items.clone(), Operation::View);
        let second = build(items, Operation::View);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
