use anyhow::Result;
use serde_json::json;

use crate::config::IgnoreDep;
use crate::formatting::{
    print_batches_table, print_key_value, print_name_list, print_section_header, print_warning,
};

use super::{GlobalArgs, Session};

pub async fn cmd_plan(
    args: &GlobalArgs,
    ignore: &[IgnoreDep],
    batches: bool,
    json: bool,
) -> Result<()> {
    let session = Session::open(args, ignore)?;
    let graph = session.graph().await?;
    let overrides = session.ctx.ignore_dependencies();

    let names: Vec<Vec<&str>> = graph
        .execution_batches(overrides)?
        .into_iter()
        .map(|batch| batch.into_iter().map(|p| p.name()).collect())
        .collect();

    if json {
        let output = if batches {
            json!({ "batches": names })
        } else {
            json!({ "order": names.concat() })
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_section_header("Release Order");
    if graph.is_empty() {
        print_warning("No packages found");
        println!();
        return Ok(());
    }

    print_key_value("Packages", &graph.len().to_string());
    println!();
    if batches {
        print_batches_table(&names);
    } else {
        print_name_list(&names.concat());
    }
    println!();

    Ok(())
}
