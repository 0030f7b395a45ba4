use std::collections::{HashMap, HashSet};

use monopub_core::graph::{resolve_dependencies, DependencyGraph, IgnoreOverrides};
use monopub_core::package::{DependencyKind, PackageManifest};
use monopub_core::Error;

fn create_test_manifests() -> Vec<PackageManifest> {
    vec![
        PackageManifest::new("pkg1", "packages/pkg1"),
        PackageManifest::new("pkg2", "packages/pkg2").with_dependency("pkg1", "^1.0.0"),
        PackageManifest::new("pkg3", "packages/pkg3")
            .with_dependency("pkg1", "^1.0.0")
            .with_dev_dependency("pkg2", "workspace:*"),
        PackageManifest::new("pkg4", "packages/pkg4"),
    ]
}

/// `pkg{k}` depends on `pkg{k+1}`, wrapping around at `count`.
fn create_cycle(count: usize) -> Vec<PackageManifest> {
    (1..=count)
        .map(|k| {
            let next = k % count + 1;
            PackageManifest::new(format!("pkg{}", k), format!("packages/pkg{}", k))
                .with_dependency(format!("pkg{}", next), "^1.0.0")
        })
        .collect()
}

fn names<'a>(packages: impl IntoIterator<Item = &'a monopub_core::PackageWithDependencies>) -> Vec<&'a str> {
    packages.into_iter().map(|p| p.name()).collect()
}

fn ignore(package: &str, dependency: &str) -> IgnoreOverrides {
    HashMap::from([(
        package.to_string(),
        HashSet::from([dependency.to_string()]),
    )])
}

#[test]
fn test_execution_order() {
    let graph = DependencyGraph::from_manifests(&create_test_manifests());
    let order = graph.execution_order(&IgnoreOverrides::new()).unwrap();

    assert_eq!(names(order), vec!["pkg1", "pkg4", "pkg2", "pkg3"]);
}

#[test]
fn test_execution_batches() {
    let graph = DependencyGraph::from_manifests(&create_test_manifests());
    let batches = graph.execution_batches(&IgnoreOverrides::new()).unwrap();

    let batches: Vec<Vec<&str>> = batches.into_iter().map(names).collect();
    assert_eq!(
        batches,
        vec![vec!["pkg1", "pkg4"], vec!["pkg2"], vec!["pkg3"]]
    );
}

#[test]
fn test_dev_dependencies_order_releases() {
    let manifests = vec![
        PackageManifest::new("app", "app").with_dev_dependency("tooling", "^1.0.0"),
        PackageManifest::new("tooling", "tooling"),
    ];
    let graph = DependencyGraph::from_manifests(&manifests);
    let order = graph.execution_order(&IgnoreOverrides::new()).unwrap();

    assert_eq!(names(order), vec!["tooling", "app"]);
}

#[test]
fn test_unknown_dependencies_are_dropped() {
    let manifests = vec![
        PackageManifest::new("pkg-a", "pkg-a")
            .with_dependency("lodash", "^4.17.21")
            .with_dependency("pkg-b", "^1.0.0"),
        PackageManifest::new("pkg-b", "pkg-b").with_dev_dependency("typescript", "^5.0.0"),
    ];

    let resolved = resolve_dependencies(&manifests);
    assert_eq!(resolved[0].depends_on.len(), 1);
    assert_eq!(resolved[0].depends_on[0].name, "pkg-b");
    assert_eq!(resolved[0].depends_on[0].kind, DependencyKind::Runtime);
    assert_eq!(resolved[0].depends_on[0].declared_range, "^1.0.0");
    assert!(resolved[1].depends_on.is_empty());

    let graph = DependencyGraph::new(resolved);
    let order = graph.execution_order(&IgnoreOverrides::new()).unwrap();
    assert_eq!(names(order), vec!["pkg-b", "pkg-a"]);
}

#[test]
fn test_runtime_edges_precede_dev_edges() {
    let manifests = vec![
        PackageManifest::new("pkg-a", "pkg-a")
            .with_dev_dependency("pkg-b", "*")
            .with_dependency("pkg-c", "^1.0.0"),
        PackageManifest::new("pkg-b", "pkg-b"),
        PackageManifest::new("pkg-c", "pkg-c"),
    ];

    let resolved = resolve_dependencies(&manifests);
    let edges: Vec<(&str, DependencyKind)> = resolved[0]
        .depends_on
        .iter()
        .map(|edge| (edge.name.as_str(), edge.kind))
        .collect();
    assert_eq!(
        edges,
        vec![
            ("pkg-c", DependencyKind::Runtime),
            ("pkg-b", DependencyKind::Dev)
        ]
    );
}

#[test]
fn test_cycle_is_reported() {
    let graph = DependencyGraph::from_manifests(&create_cycle(3));
    let err = graph.execution_order(&IgnoreOverrides::new()).unwrap_err();

    match err {
        Error::CyclicDependency(stuck) => {
            assert!(stuck.contains("pkg1"));
            assert!(stuck.contains("pkg2"));
            assert!(stuck.contains("pkg3"));
        }
        other => panic!("Expected CyclicDependency, got {:?}", other),
    }
}

#[test]
fn test_cycle_reports_only_stuck_packages() {
    let mut manifests = create_cycle(2);
    manifests.push(PackageManifest::new("standalone", "standalone"));
    let graph = DependencyGraph::from_manifests(&manifests);

    let err = graph.execution_batches(&IgnoreOverrides::new()).unwrap_err();
    let Error::CyclicDependency(stuck) = err else {
        panic!("Expected CyclicDependency");
    };
    assert_eq!(stuck, "pkg1, pkg2");
}

#[test]
fn test_override_breaks_cycle_at_any_package() {
    let count = 6;
    let graph = DependencyGraph::from_manifests(&create_cycle(count));

    for k in 1..=count {
        let package = format!("pkg{}", k);
        let dependency = format!("pkg{}", k % count + 1);
        let overrides = ignore(&package, &dependency);

        let order = graph.execution_order(&overrides).unwrap();
        let order = names(order);
        assert_eq!(order.len(), count);
        assert_eq!(order[0], package, "overrides: {:?}", overrides);

        // Walking backwards along the cycle from the freed package.
        let expected: Vec<String> = (0..count)
            .map(|step| format!("pkg{}", (k + count - 1 - step) % count + 1))
            .collect();
        assert_eq!(order, expected);
    }
}

#[test]
fn test_alternating_overrides_give_two_batches() {
    let count = 6;
    let graph = DependencyGraph::from_manifests(&create_cycle(count));

    let overrides: IgnoreOverrides = (1..=count)
        .step_by(2)
        .map(|k| {
            (
                format!("pkg{}", k),
                HashSet::from([format!("pkg{}", k % count + 1)]),
            )
        })
        .collect();

    let batches = graph.execution_batches(&overrides).unwrap();
    let batches: Vec<Vec<&str>> = batches.into_iter().map(names).collect();
    assert_eq!(
        batches,
        vec![vec!["pkg1", "pkg3", "pkg5"], vec!["pkg2", "pkg4", "pkg6"]]
    );
}

#[test]
fn test_override_on_unrelated_edge_keeps_cycle() {
    let graph = DependencyGraph::from_manifests(&create_cycle(3));
    let overrides = ignore("pkg1", "pkg3");

    assert!(matches!(
        graph.execution_order(&overrides),
        Err(Error::CyclicDependency(_))
    ));
}

#[test]
fn test_dependencies_and_dependents() {
    let graph = DependencyGraph::from_manifests(&create_test_manifests());

    assert_eq!(graph.dependencies("pkg3").unwrap(), vec!["pkg1", "pkg2"]);
    assert!(graph.dependencies("pkg1").unwrap().is_empty());
    assert_eq!(graph.dependents("pkg1").unwrap(), vec!["pkg2", "pkg3"]);
    assert!(graph.dependents("pkg4").unwrap().is_empty());
}

#[test]
fn test_duplicate_edges_collapse() {
    let manifests = vec![
        PackageManifest::new("pkg-a", "pkg-a")
            .with_dependency("pkg-b", "^1.0.0")
            .with_dev_dependency("pkg-b", "^1.0.0"),
        PackageManifest::new("pkg-b", "pkg-b"),
    ];
    let graph = DependencyGraph::from_manifests(&manifests);

    assert_eq!(graph.dependencies("pkg-a").unwrap(), vec!["pkg-b"]);
    assert_eq!(graph.dependents("pkg-b").unwrap(), vec!["pkg-a"]);
}

#[test]
fn test_unknown_package_lookup() {
    let graph = DependencyGraph::from_manifests(&create_test_manifests());

    assert!(graph.get_package("missing").is_none());
    assert!(matches!(
        graph.dependencies("missing"),
        Err(Error::PackageNotFound { .. })
    ));
}

#[test]
fn test_empty_graph() {
    let graph = DependencyGraph::new(Vec::new());

    assert!(graph.is_empty());
    assert!(graph.execution_batches(&IgnoreOverrides::new()).unwrap().is_empty());
}
