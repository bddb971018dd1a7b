//! Target dependency inference.
//!
//! The cmake server code model carries no target-to-target edges, only the
//! raw linker line of every target. Edges are recovered by looking for the
//! artifact names of library targets in that line. This is lossy: a
//! coincidental substring creates a false edge, and an import library with
//! an unrelated name hides a real one.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::cmake::CodeModel;
use crate::core::error::BauerError;

const LIBRARY_EXTENSIONS: [&str; 5] = ["so", "a", "dylib", "lib", "dll"];

/// Target name to the names of the targets it links against.
pub type TargetDependencies = BTreeMap<String, Vec<String>>;

/// Infer link dependencies between the targets of a single-configuration
/// code model.
pub fn calculate_dependencies(model: &CodeModel) -> Result<TargetDependencies, BauerError> {
    let configuration = model.single_configuration()?;
    let targets: Vec<_> = configuration
        .projects
        .iter()
        .flat_map(|p| p.targets.iter())
        .collect();

    let artifacts: BTreeMap<&str, Vec<&str>> = targets
        .iter()
        .filter(|t| t.target_type.is_linkable_library())
        .map(|t| (t.name.as_str(), t.artifact_basenames().collect()))
        .collect();

    let mut dependencies = TargetDependencies::new();
    for target in &targets {
        let link_line = target.link_libraries.as_str();
        let mut deps = BTreeSet::new();

        if !link_line.is_empty() {
            for (&library, basenames) in &artifacts {
                if library == target.name {
                    continue;
                }
                if basenames.iter().any(|b| links_against(link_line, b)) {
                    deps.insert(library.to_string());
                }
            }
        }

        dependencies
            .entry(target.name.clone())
            .or_default()
            .extend(deps);
    }

    for deps in dependencies.values_mut() {
        deps.sort();
        deps.dedup();
    }

    Ok(dependencies)
}

/// Whether a linker line references a library file, either verbatim or as
/// `-l<name>`.
fn links_against(link_line: &str, basename: &str) -> bool {
    if link_line.contains(basename) {
        return true;
    }
    let Some(stem) = library_stem(basename) else {
        return false;
    };
    let flag = format!("-l{}", stem);
    link_line.split_whitespace().any(|token| token == flag)
}

/// `libcore.so` -> `core`
fn library_stem(basename: &str) -> Option<&str> {
    let path = Path::new(basename);
    let ext = path.extension().and_then(|e| e.to_str())?;
    if !LIBRARY_EXTENSIONS.contains(&ext) {
        return None;
    }
    let stem = path.file_stem().and_then(|s| s.to_str())?;
    let stem = stem.strip_prefix("lib").unwrap_or(stem);
    (!stem.is_empty()).then_some(stem)
}

/// Targets ordered so that every target comes after the targets it links
/// against. A cycle falls back to name order.
pub fn module_order(dependencies: &TargetDependencies) -> Vec<String> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

    for name in dependencies.keys() {
        nodes.insert(name.as_str(), graph.add_node(name.as_str()));
    }

    // Edges point from a target to what it links against.
    for (name, deps) in dependencies {
        for dep in deps {
            if let (Some(&from), Some(&to)) = (nodes.get(name.as_str()), nodes.get(dep.as_str())) {
                if !graph.contains_edge(from, to) {
                    graph.add_edge(from, to, ());
                }
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => order
            .into_iter()
            .rev()
            .map(|node| graph[node].to_string())
            .collect(),
        Err(cycle) => {
            tracing::warn!(
                "Target dependencies form a cycle through {}; writing modules in name order",
                graph[cycle.node_id()]
            );
            dependencies.keys().cloned().collect()
        }
    }
}
