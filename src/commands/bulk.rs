//! Action commands: list, select, confirm, dispatch, report

use super::{resource_def, warn_listing_failures, Context};
use crate::cli::Target;
use crate::operation::{ActionInvoker, BulkDispatcher, ResourceAction};
use crate::resource::sdk_dispatch::validate_label;
use crate::resource::{
    fetch_across_projects, ActionDef, GcpExecutor, ListedResource, ResourceDef, ResourceFilter,
    ResourceRef,
};
use crate::ui::confirm::confirm;
use crate::ui::progress::{ConsoleProgress, DetailLevel};
use crate::ui::select::multi_select;
use anyhow::{Context as _, Result};
use std::future::Future;
use tokio::sync::watch;

/// Resources listed before a confirmation prompt
const CONFIRM_PREVIEW_LIMIT: usize = 10;

/// Exit status after a second Ctrl-C (128 + SIGINT)
const FORCE_QUIT_EXIT_CODE: i32 = 130;

pub async fn run(ctx: &Context, action: ResourceAction, target: &Target) -> Result<u8> {
    if ctx.readonly {
        anyhow::bail!(
            "Read-only mode: '{}' is a write operation and is blocked",
            action.key()
        );
    }

    let def = resource_def(&target.kind)?;
    let action_def = supported_action(def, &target.kind, &action)?;
    validate_action(&action)?;

    if !target.is_non_interactive() && !ctx.interactive {
        anyhow::bail!("No terminal available for the selection prompt. Use --all or --name to select resources");
    }

    let client = ctx.client().await?;
    let projects = ctx.resolve_projects(&client).await?;

    let listed = fetch_across_projects(&target.kind, &client, &projects).await?;
    warn_listing_failures(&listed);

    let filter = ResourceFilter::new(target.names.clone(), target.state.clone());
    let candidates = filter.apply(listed.items);
    if candidates.is_empty() {
        println!("No matching {} found", def.display_name);
        return Ok(0);
    }

    let selected = if target.is_non_interactive() {
        candidates.into_iter().map(|l| l.resource).collect()
    } else {
        let title = format!("{} {}", action.display_name(), def.display_name);
        match multi_select(&title, selection_rows(&candidates))? {
            Some(indices) => pick(candidates, &indices),
            None => {
                println!("Cancelled");
                return Ok(0);
            },
        }
    };

    if selected.is_empty() {
        println!("Nothing selected");
        return Ok(0);
    }

    if !target.yes && !confirmed(ctx, def, action_def, &selected)? {
        println!("Aborted");
        return Ok(0);
    }

    let detail = target
        .detail
        .or_else(|| ctx.config.detail_level.as_deref().and_then(DetailLevel::parse))
        .unwrap_or_default();
    let concurrency = ctx
        .config
        .effective_concurrency(target.concurrency.map(usize::from));
    let policy = ctx.config.exit_policy(target.strict);

    // Ctrl-C stops new actions from starting; in-flight ones finish.
    // A second Ctrl-C quits without waiting for them.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let ctrl_c = tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, cancel_tx).await {
            std::process::exit(FORCE_QUIT_EXIT_CODE);
        }
    });

    let dispatcher = BulkDispatcher::new(concurrency).with_cancellation(cancel_rx);
    let invoker = ActionInvoker::new(GcpExecutor::new(client));
    let progress = ConsoleProgress::stdout(action.clone(), detail, ctx.color);

    let invoker = &invoker;
    let action_ref = &action;
    let report = dispatcher
        .dispatch(
            selected,
            move |resource| async move { invoker.invoke(action_ref, Some(&resource)).await },
            &progress,
        )
        .await;

    ctrl_c.abort();
    progress.summary(&report);

    Ok(report.exit_code(policy))
}

/// Wait for interrupts: the first sets the cancel flag, the second returns `true`
async fn watch_interrupts<F, Fut>(mut next_signal: F, cancel: watch::Sender<bool>) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if next_signal().await.is_err() {
        return false;
    }
    eprintln!("Interrupted: no new actions will start, waiting for running ones (Ctrl-C again to quit)");
    let _ = cancel.send(true);

    if next_signal().await.is_err() {
        return false;
    }
    eprintln!("Interrupted again: quitting without waiting for running actions");
    tracing::warn!("Forced quit during bulk action");
    true
}

fn supported_action<'a>(
    def: &'a ResourceDef,
    kind: &str,
    action: &ResourceAction,
) -> Result<&'a ActionDef> {
    def.action(action.key()).with_context(|| {
        format!(
            "{} ({}) does not support '{}'. Supported: {}",
            def.display_name,
            kind,
            action.key(),
            def.action_keys().join(", ")
        )
    })
}

fn validate_action(action: &ResourceAction) -> Result<()> {
    match action {
        ResourceAction::ApplyTag { key, value } => validate_label(key, Some(value.as_str())),
        ResourceAction::RemoveTag { key } => validate_label(key, None),
        _ => Ok(()),
    }
}

fn selection_rows(candidates: &[ListedResource]) -> Vec<String> {
    let width = candidates
        .iter()
        .map(|l| l.resource.label().chars().count())
        .max()
        .unwrap_or(0);
    candidates
        .iter()
        .map(|l| format!("{:<width$}  {}", l.resource.label(), l.resource.state, width = width))
        .collect()
}

fn pick(candidates: Vec<ListedResource>, indices: &[usize]) -> Vec<ResourceRef> {
    candidates
        .into_iter()
        .enumerate()
        .filter(|(i, _)| indices.contains(i))
        .map(|(_, l)| l.resource)
        .collect()
}

/// Ask for confirmation when the registry requires it
fn confirmed(
    ctx: &Context,
    def: &ResourceDef,
    action_def: &ActionDef,
    selected: &[ResourceRef],
) -> Result<bool> {
    let Some(config) = action_def.get_confirm_config() else {
        return Ok(true);
    };

    if !ctx.interactive {
        anyhow::bail!(
            "'{}' requires confirmation; pass --yes to run it without a terminal",
            action_def.key
        );
    }

    for resource in selected.iter().take(CONFIRM_PREVIEW_LIMIT) {
        eprintln!("  {}", resource.label());
    }
    if selected.len() > CONFIRM_PREVIEW_LIMIT {
        eprintln!("  ... and {} more", selected.len() - CONFIRM_PREVIEW_LIMIT);
    }

    let question = format!(
        "{} ({} {})",
        config
            .message
            .as_deref()
            .unwrap_or("Run this action on the selected resources?"),
        selected.len(),
        def.display_name
    );
    confirm(&question, &config, ctx.color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{get_resource, Location};
    use serde_json::json;

    fn listed(name: &str) -> ListedResource {
        ListedResource {
            resource: ResourceRef::new(
                "compute-instances",
                "proj-a",
                name,
                Location::Zone("us-central1-a".into()),
            )
            .with_state("RUNNING"),
            item: json!({ "name": name }),
        }
    }

    #[test]
    fn test_pick_keeps_listing_order() {
        let candidates = vec![listed("a"), listed("b"), listed("c")];
        let picked = pick(candidates, &[2, 0]);
        let names: Vec<_> = picked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_unsupported_action_is_rejected() {
        let def = get_resource("storage-buckets").unwrap();
        let err = supported_action(def, "storage-buckets", &ResourceAction::Start)
            .unwrap_err()
            .to_string();
        assert!(err.contains("does not support 'start'"));
        assert!(err.contains("delete"));
    }

    #[test]
    fn test_invalid_label_rejected_before_listing() {
        let action = ResourceAction::ApplyTag {
            key: "Env".into(),
            value: "prod".into(),
        };
        assert!(validate_action(&action).is_err());
        assert!(validate_action(&ResourceAction::Stop).is_ok());
    }

    #[test]
    fn test_selection_rows_align_state() {
        let rows = selection_rows(&[listed("web-1"), listed("api-server-1")]);
        assert_eq!(rows[0].find("RUNNING"), rows[1].find("RUNNING"));
    }

    #[tokio::test]
    async fn test_first_interrupt_cancels_second_quits() {
        let (tx, rx) = watch::channel(false);
        let forced = watch_interrupts(|| async { Ok(()) }, tx).await;
        assert!(forced);
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn test_single_interrupt_only_cancels() {
        let (tx, rx) = watch::channel(false);
        let mut calls = 0;
        let forced = watch_interrupts(
            || {
                calls += 1;
                let outcome = if calls == 1 {
                    Ok(())
                } else {
                    Err(std::io::Error::other("signal stream closed"))
                };
                async move { outcome }
            },
            tx,
        )
        .await;
        assert!(!forced);
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn test_no_interrupt_leaves_flag_clear() {
        let (tx, rx) = watch::channel(false);
        let forced = watch_interrupts(
            || async { Err(std::io::Error::other("no signal handler")) },
            tx,
        )
        .await;
        assert!(!forced);
        assert!(!*rx.borrow());
    }
}
