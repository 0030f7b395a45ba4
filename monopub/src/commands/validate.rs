use anyhow::Result;
use monopub_core::DependencyGraph;
use serde_json::json;

use crate::formatting::{print_section_header, print_success, print_warning};

use super::{GlobalArgs, Session};

/// Ignore overrides naming an edge that does not exist in the workspace.
fn unused_overrides(session: &Session, graph: &DependencyGraph) -> Vec<String> {
    let mut unused: Vec<String> = session
        .ctx
        .ignore_dependencies()
        .iter()
        .flat_map(|(package, dependencies)| {
            let declared = graph.get_package(package);
            dependencies.iter().filter_map(move |dependency| {
                let exists = declared
                    .is_some_and(|p| p.depends_on.iter().any(|edge| &edge.name == dependency));
                (!exists).then(|| format!("{} -> {}", package, dependency))
            })
        })
        .collect();
    unused.sort_unstable();
    unused
}

pub async fn cmd_validate(args: &GlobalArgs, json: bool) -> Result<()> {
    let session = Session::open(args, &[])?;
    let graph = session.graph().await?;
    graph.execution_order(session.ctx.ignore_dependencies())?;
    let unused = unused_overrides(&session, &graph);

    if json {
        let output = json!({
            "valid": true,
            "packages": graph.len(),
            "unused_overrides": unused,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_section_header("Validation");
    print_success("Configuration is valid");
    print_success(&format!("Found {} packages", graph.len()));
    print_success("No circular dependencies detected");
    for edge in &unused {
        print_warning(&format!("Ignored dependency {} is not declared", edge));
    }
    println!();

    Ok(())
}
