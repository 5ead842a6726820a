use std::collections::HashSet;

use proptest::prelude::*;
use taskgraph::TaskGraph;
use taskgraph_test_utils::builders::TaskGraphBuilder;

/// Generates a valid acyclic dependency list for `num_tasks` tasks: task `i`
/// may only depend on tasks with a lower index, so any generated graph is
/// guaranteed acyclic by construction.
fn acyclic_deps_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        )
    })
}

fn build_graph(raw_deps: &[Vec<usize>]) -> TaskGraph {
    let mut builder = TaskGraphBuilder::new();
    for i in 0..raw_deps.len() {
        builder = builder.task(&format!("task_{i}"));
    }
    for (i, potential_deps) in raw_deps.iter().enumerate() {
        if i == 0 {
            continue;
        }
        let mut valid: HashSet<usize> = HashSet::new();
        for &dep_idx in potential_deps {
            valid.insert(dep_idx % i);
        }
        for dep_idx in valid {
            builder = builder.depends_on(&format!("task_{i}"), [format!("task_{dep_idx}").as_str()]);
        }
    }
    let (graph, _runner) = builder.build();
    graph
}

proptest! {
    #[test]
    fn topological_order_is_always_a_valid_permutation(raw_deps in acyclic_deps_strategy(15)) {
        let graph = build_graph(&raw_deps);
        let order = graph.topological_order().unwrap();

        prop_assert_eq!(order.len(), graph.len());
        let unique: HashSet<_> = order.iter().collect();
        prop_assert_eq!(unique.len(), order.len());

        for id in graph.all_tasks() {
            let pos_id = order.iter().position(|x| x == id).unwrap();
            for dep in graph.deps(id).unwrap() {
                let pos_dep = order.iter().position(|x| x == dep).unwrap();
                prop_assert!(pos_dep < pos_id, "prerequisite {dep:?} must precede {id:?}");
            }
        }
    }

    #[test]
    fn deps_and_rdeps_stay_mutual_inverses(raw_deps in acyclic_deps_strategy(15)) {
        let graph = build_graph(&raw_deps);
        for id in graph.all_tasks() {
            for dep in graph.deps(id).unwrap() {
                prop_assert!(graph.rdeps(dep).unwrap().contains(id));
            }
            for dependent in graph.rdeps(id).unwrap() {
                prop_assert!(graph.deps(dependent).unwrap().contains(id));
            }
        }
    }

    #[test]
    fn ready_tasks_always_have_every_dependency_completed(raw_deps in acyclic_deps_strategy(15)) {
        let mut graph = build_graph(&raw_deps);
        let mut completed = 0;
        while completed < graph.len() {
            let ready = graph.ready_tasks();
            prop_assert!(!ready.is_empty(), "a DAG with remaining tasks must always have a ready task");
            for id in &ready {
                for dep in graph.deps(id).unwrap() {
                    prop_assert!(graph.is_completed(dep));
                }
            }
            for id in ready {
                graph.mark_completed(id).unwrap();
                completed += 1;
            }
        }
        prop_assert!(graph.is_complete());
    }
}

#[test]
fn self_dependency_and_unknown_dependency_are_rejected() {
    let mut graph = TaskGraphBuilder::new().task("a").build().0;
    assert!(graph.add_dependency("a", ["a"]).is_err());
    assert!(graph.add_dependency("a", ["ghost"]).is_err());
}
