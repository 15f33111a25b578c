//! Permission commands run against a group fixture

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;
use warden_access::{AccessConditionBuilder, Operation, QueryRestriction};
use warden_config::WardenConfig;
use warden_core::{scope, Account, PermissionsCollection};
use warden_group::GroupPermissionChecker;

use crate::cli::AccountArgs;
use crate::fixture::{Fixture, Runtime};
use crate::settings::{cache_settings, query_layout};

fn account(args: &AccountArgs) -> Account {
    args.roles
        .iter()
        .fold(Account::new(args.account), |account, role| account.with_role(role.as_str()))
}

fn runtime(config: &WardenConfig, fixture: &Fixture) -> Result<Runtime> {
    Runtime::new(fixture, &cache_settings(&config.cache)?)
}

/// Permissions of an account in one scope, or all of them merged
pub async fn resolve(
    config: &WardenConfig,
    fixture_path: &Path,
    args: &AccountArgs,
    only_scope: Option<&str>,
) -> Result<PermissionsCollection> {
    let fixture = Fixture::load(fixture_path)?;
    let runtime = runtime(config, &fixture)?;
    let account = account(args);

    let collection = match only_scope {
        Some(requested) => {
            let known = scope::ALL
                .iter()
                .find(|candidate| **candidate == requested)
                .ok_or_else(|| anyhow::anyhow!("Unknown scope '{}'", requested))?;
            runtime.chain.resolve(&account, known).await?
        }
        None => runtime.chain.resolve_scopes(&account, &scope::ALL).await?,
    };

    info!("Resolved permissions for account {}", account.id);
    Ok(collection)
}

/// Query restriction for `operation` on an entity kind
pub async fn restrict(
    config: &WardenConfig,
    fixture_path: &Path,
    args: &AccountArgs,
    entity: &str,
    operation: &str,
) -> Result<QueryRestriction> {
    let fixture = Fixture::load(fixture_path)?;
    let meta = fixture.entity(entity)?;
    meta.validate()?;
    let operation: Operation = operation.parse()?;

    let runtime = runtime(config, &fixture)?;
    let account = account(args);
    let permissions = runtime.chain.resolve_scopes(&account, &scope::ALL).await?;

    let builder = AccessConditionBuilder::new(query_layout(&config.access));
    Ok(builder.build(&permissions, meta, &operation, &account))
}

/// Whether the account holds `permission` in `group_id`
pub async fn check(
    config: &WardenConfig,
    fixture_path: &Path,
    args: &AccountArgs,
    group_id: i64,
    permission: &str,
) -> Result<bool> {
    let fixture = Fixture::load(fixture_path)?;
    let runtime = runtime(config, &fixture)?;
    let checker = GroupPermissionChecker::new(runtime.chain.clone(), runtime.store.clone());

    checker
        .has_permission(&account(args), group_id, permission)
        .await
        .context("Permission check failed")
}
