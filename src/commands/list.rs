//! Read-only commands: `kinds`, `projects`, `list`

use super::{resource_def, warn_listing_failures, Context};
use crate::gcp::projects::list_projects;
use crate::resource::{fetch_across_projects, get_all_resource_keys, get_resource, ResourceFilter};
use crate::ui::table::{plain_table, render_table};
use anyhow::Result;

/// CLI verb for a registry action key
pub(crate) fn verb_for(action_key: &str) -> &str {
    match action_key {
        "apply-tag" => "tag",
        "remove-tag" => "untag",
        "create-snapshot" => "snapshot",
        "apply-lock" => "lock",
        "remove-lock" => "unlock",
        other => other,
    }
}

pub fn kinds(ctx: &Context) -> Result<u8> {
    let mut table = plain_table(["KIND", "NAME", "ACTIONS"], ctx.color);
    for key in get_all_resource_keys() {
        let Some(def) = get_resource(key) else {
            continue;
        };
        let mut verbs: Vec<&str> = Vec::new();
        for action in def.action_keys() {
            let verb = verb_for(action);
            if !verbs.contains(&verb) {
                verbs.push(verb);
            }
        }
        table.add_row(vec![key.to_string(), def.display_name.clone(), verbs.join(", ")]);
    }
    println!("{table}");
    Ok(0)
}

pub async fn projects(ctx: &Context) -> Result<u8> {
    let client = ctx.client().await?;
    let projects = list_projects(&client).await?;

    if projects.is_empty() {
        println!("No accessible projects");
        return Ok(0);
    }

    let mut table = plain_table(["PROJECT ID", "NAME", "NUMBER"], ctx.color);
    for p in &projects {
        table.add_row(vec![p.project_id.clone(), p.name.clone(), p.project_number.clone()]);
    }
    println!("{table}");
    Ok(0)
}

pub async fn list(
    ctx: &Context,
    kind: &str,
    names: Vec<String>,
    state: Option<String>,
) -> Result<u8> {
    let def = resource_def(kind)?;
    let client = ctx.client().await?;
    let projects = ctx.resolve_projects(&client).await?;

    let listed = fetch_across_projects(kind, &client, &projects).await?;
    warn_listing_failures(&listed);

    let rows = ResourceFilter::new(names, state).apply(listed.items);
    if rows.is_empty() {
        println!(
            "No {} found in {} project(s)",
            def.display_name,
            projects.len()
        );
        return Ok(0);
    }

    print!("{}", render_table(&def.columns, &rows, ctx.color));
    println!("\n{} {}", rows.len(), def.display_name);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbs_match_cli_commands() {
        assert_eq!(verb_for("apply-tag"), "tag");
        assert_eq!(verb_for("remove-lock"), "unlock");
        assert_eq!(verb_for("reimage"), "reimage");
    }
}
