use std::path::Path;
use std::sync::Arc;

use cachepg_cli::aws;
use cachepg_cli::config::Settings;
use cachepg_core::{ParameterDiff, ParameterSet};
use cachepg_provisioner::plan::has_changes;
use cachepg_provisioner::{
    orchestrate, Action, Cause, ElastiCacheApi, FieldDrift, Manifest, ParameterGroupApi,
    PlanEntry, ProvisionerState, RetryPolicy, StatePersistence,
};
use eyre::Result;

/// Everything a command needs: the API client, the state file and the
/// retry ceilings.
pub struct Context {
    api: Arc<dyn ParameterGroupApi>,
    persistence: StatePersistence,
    retry: RetryPolicy,
    region: Option<String>,
}

impl Context {
    pub async fn connect(settings: Settings) -> Self {
        let sdk_config =
            aws::build_aws_config(settings.region.as_deref(), &settings.credentials).await;
        let region = sdk_config.region().map(|r| r.to_string());
        tracing::debug!(
            region = region.as_deref().unwrap_or("<unset>"),
            credentials = %settings.credentials.describe(),
            state = %settings.state_path.display(),
            "aws configured"
        );

        Self {
            api: Arc::new(ElastiCacheApi::from_conf(&sdk_config)),
            persistence: StatePersistence::new(settings.state_path),
            retry: settings.retry,
            region,
        }
    }

    /// Load state, refusing state that was recorded in another region.
    async fn load_state(&self) -> Result<ProvisionerState> {
        let mut state = self.persistence.load().await?;
        if let Some(region) = &self.region {
            if state.region.is_empty() {
                state.region = region.clone();
            } else if &state.region != region {
                eyre::bail!(
                    "state file {} belongs to region {}, not {region}",
                    self.persistence.local_path.display(),
                    state.region
                );
            }
        }
        Ok(state)
    }
}

pub async fn plan(ctx: &Context, manifest_path: &Path, json: bool) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let state = ctx.load_state().await?;
    let syncers = manifest.syncers(Arc::clone(&ctx.api), ctx.retry);
    let entries = orchestrate::plan(&syncers, &state).await?;
    print_plan(&entries, json)
}

pub async fn apply(ctx: &Context, manifest_path: &Path, json: bool) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let state = ctx.load_state().await?;
    ctx.persistence.flush(&state).await?;

    let entries =
        cachepg_provisioner::provision(Arc::clone(&ctx.api), &manifest, ctx.retry, &ctx.persistence)
            .await?;
    print_plan(&entries, json)
}

pub async fn destroy(ctx: &Context, yes: bool) -> Result<()> {
    let state = ctx.load_state().await?;
    if !yes {
        let names: Vec<_> = state.resources.keys().map(String::as_str).collect();
        eyre::bail!(
            "refusing to delete {} parameter group(s) without --yes: {}",
            names.len(),
            names.join(", ")
        );
    }
    cachepg_provisioner::destroy(ctx.api.as_ref(), ctx.retry, &ctx.persistence).await?;
    println!("destroyed {} parameter group(s)", state.resources.len());
    Ok(())
}

pub async fn import(ctx: &Context, name: &str) -> Result<()> {
    let mut state = ctx.load_state().await?;
    let snapshot =
        orchestrate::import(ctx.api.as_ref(), name, &mut state, &ctx.persistence).await?;
    println!(
        "imported {} ({}, {} parameter(s))",
        snapshot.name,
        snapshot.family,
        snapshot.parameters.len()
    );
    Ok(())
}

pub async fn show(ctx: &Context) -> Result<()> {
    let state = ctx.persistence.load().await?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn print_plan(entries: &[PlanEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }

    for entry in entries {
        println!(
            "{} {} ({})",
            symbol(entry.action),
            entry.name,
            cause_label(entry.cause)
        );
        for drift in &entry.drift {
            print_drift(drift);
        }
    }

    if !has_changes(entries) {
        println!("no changes");
        return Ok(());
    }
    let count = |action: Action| entries.iter().filter(|e| e.action == action).count();
    println!(
        "{} to create, {} to replace, {} to modify, {} to delete",
        count(Action::Create),
        count(Action::Replace),
        count(Action::Modify),
        count(Action::Delete)
    );
    Ok(())
}

fn print_drift(drift: &FieldDrift) {
    let sets = (
        serde_json::from_value::<ParameterSet>(drift.actual.clone()),
        serde_json::from_value::<ParameterSet>(drift.expected.clone()),
    );
    if let ("parameters", (Ok(actual), Ok(expected))) = (drift.field.as_str(), sets) {
        let diff = ParameterDiff::between(&actual, &expected);
        for p in &diff.to_remove {
            println!("    - {p}");
        }
        for p in &diff.to_add {
            println!("    + {p}");
        }
        return;
    }

    let replace = if drift.requires_replacement {
        " (forces replacement)"
    } else {
        ""
    };
    println!(
        "    {}: {} -> {}{replace}",
        drift.label, drift.actual, drift.expected
    );
}

fn symbol(action: Action) -> &'static str {
    match action {
        Action::Ok => "  ",
        Action::Create => "+ ",
        Action::Modify => "~ ",
        Action::Replace => "-/+",
        Action::Delete => "- ",
    }
}

fn cause_label(cause: Cause) -> &'static str {
    match cause {
        Cause::InSync => "in sync",
        Cause::FirstProvision => "new",
        Cause::Missing => "missing from AWS",
        Cause::Untracked => "exists, not yet tracked",
        Cause::Drift => "drifted",
        Cause::Orphaned => "no longer declared",
    }
}
