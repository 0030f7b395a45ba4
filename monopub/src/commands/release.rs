use anyhow::Result;
use monopub_core::{Error, ReleaseEngine, ReleaseOptions, ReleaseReport};

use crate::config::IgnoreDep;
use crate::formatting::{
    print_key_value, print_release_table, print_section_header, print_success, print_warning,
};

use super::{GlobalArgs, Session};

pub async fn cmd_release(
    args: &GlobalArgs,
    ignore: &[IgnoreDep],
    options: ReleaseOptions,
    json: bool,
) -> Result<()> {
    let session = Session::open(args, ignore)?;
    let engine = ReleaseEngine::new(session.workspace(), session.config.plugins()?)
        .with_options(options);

    let result = engine.run(&session.ctx).await;
    match &result {
        Ok(report) => print_report(report, json)?,
        Err(Error::PartialRelease { report }) => print_report(report, json)?,
        Err(_) => {}
    }
    result?;

    Ok(())
}

fn print_report(report: &ReleaseReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let title = if report.dry_run {
        "Release Plan (Dry Run)"
    } else {
        "Release Summary"
    };
    print_section_header(title);

    let changed = report.plan.changed().count();
    if changed == 0 {
        print_success("No packages need a release");
        println!();
        return Ok(());
    }

    print_key_value("Packages to release", &changed.to_string());
    println!();
    print_release_table(report);
    println!();

    if report.dry_run {
        return Ok(());
    }

    print_success(&format!("Published {} packages", report.published.len()));
    for (label, names) in [
        ("Failed to publish", &report.failed),
        ("Skipped because a dependency failed", &report.skipped),
        ("Post-publish failed", &report.post_publish_failed),
    ] {
        if !names.is_empty() {
            print_warning(&format!("{}: {}", label, names.join(", ")));
        }
    }
    println!();

    Ok(())
}
