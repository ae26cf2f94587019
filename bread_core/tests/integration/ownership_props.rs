//! Property tests: the ownership protocol against a reference model, and
//! dependency closure over random acyclic graphs.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use proptest::prelude::*;

use bread_common::diagnostics::Diagnostics;
use bread_core::prelude::*;

const CONTEXTS: usize = 4;

#[derive(Debug, Clone)]
enum Op {
    /// `None` requests on behalf of nobody.
    Acquire(Option<usize>, bool),
    Release(usize),
    Terminate(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (proptest::option::of(0..CONTEXTS), any::<bool>())
            .prop_map(|(ctx, force)| Op::Acquire(ctx, force)),
        3 => (0..CONTEXTS).prop_map(Op::Release),
        1 => (0..CONTEXTS).prop_map(Op::Terminate),
    ]
}

/// Reference model of a single guard.
#[derive(Debug, Default)]
struct Model {
    owner: Option<usize>,
    dead: [bool; CONTEXTS],
}

impl Model {
    fn live_owner(&self) -> Option<usize> {
        self.owner.filter(|&i| !self.dead[i])
    }

    fn acquire(&mut self, requester: Option<usize>, force: bool) -> bool {
        if requester.is_some_and(|i| self.dead[i]) {
            return false;
        }
        let current = self.live_owner();
        if current == requester {
            true
        } else if current.is_none() || force {
            self.owner = requester;
            true
        } else {
            false
        }
    }

    fn release(&mut self, requester: usize) -> bool {
        if self.dead[requester] {
            return false;
        }
        if self.live_owner() == Some(requester) {
            self.owner = None;
        }
        true
    }
}

/// Node `i` depends on the listed nodes, all with a lower index.
#[derive(Debug, Clone)]
struct Dag {
    edges: Vec<Vec<usize>>,
    ownable: Vec<bool>,
}

fn dag() -> impl Strategy<Value = Dag> {
    (1usize..10)
        .prop_flat_map(|n| {
            let edges = (0..n)
                .map(|i| proptest::sample::subsequence((0..i).collect::<Vec<_>>(), 0..=i))
                .collect::<Vec<_>>();
            (edges, proptest::collection::vec(any::<bool>(), n))
        })
        .prop_map(|(edges, ownable)| Dag { edges, ownable })
}

fn build(dag: &Dag) -> Vec<Arc<dyn Unit>> {
    let mut nodes: Vec<Arc<dyn Unit>> = Vec::with_capacity(dag.edges.len());
    for (i, deps) in dag.edges.iter().enumerate() {
        let name = format!("n{i}");
        let links: Vec<UnitRef> = deps.iter().map(|&j| UnitRef::plain(nodes[j].clone())).collect();
        let unit: Arc<dyn Unit> = if dag.ownable[i] {
            let base = OwnableUnit::new(name)
                .unwrap()
                .with_diagnostics(Diagnostics::null());
            Arc::new(links.into_iter().fold(base, OwnableUnit::with_dependency))
        } else {
            let base = SimpleUnit::new(name).unwrap();
            Arc::new(links.into_iter().fold(base, SimpleUnit::with_dependency))
        };
        nodes.push(unit);
    }
    nodes
}

fn reachable(dag: &Dag, from: usize) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut queue: VecDeque<usize> = dag.edges[from].iter().copied().collect();
    while let Some(i) = queue.pop_front() {
        if seen.insert(i) {
            queue.extend(dag.edges[i].iter().copied());
        }
    }
    seen.into_iter().map(|i| format!("n{i}")).collect()
}

proptest! {
    #[test]
    fn guard_matches_model(ops in proptest::collection::vec(op(), 1..60)) {
        let guard = OwnershipGuard::new("unit", Diagnostics::null());
        let contexts: Vec<_> = (0..CONTEXTS)
            .map(|i| ExecutionContext::new(format!("ctx{i}")))
            .collect();
        let mut model = Model::default();

        for op in ops {
            match op {
                Op::Acquire(requester, force) => {
                    let got = guard.acquire(requester.map(|i| &contexts[i]), force);
                    prop_assert_eq!(got, model.acquire(requester, force));
                }
                Op::Release(i) => {
                    let ok = guard.release(Some(&contexts[i])).is_ok();
                    prop_assert_eq!(ok, model.release(i));
                }
                Op::Terminate(i) => {
                    contexts[i].terminate();
                    model.dead[i] = true;
                }
            }

            let expected = model.live_owner().map(|i| contexts[i].id());
            prop_assert_eq!(guard.owner(), expected);
            for (i, ctx) in contexts.iter().enumerate() {
                prop_assert_eq!(guard.is_owned_by(Some(ctx)), model.live_owner() == Some(i));
                prop_assert_eq!(
                    guard.check_access(ctx).is_ok(),
                    expected.is_none() || expected == Some(ctx.id())
                );
            }
        }
    }

    #[test]
    fn closure_is_reachability(dag in dag()) {
        let nodes = build(&dag);
        for (i, node) in nodes.iter().enumerate() {
            let closure = node.extended_dependencies().unwrap();
            let names: BTreeSet<String> = closure.names().map(str::to_string).collect();
            prop_assert_eq!(&names, &reachable(&dag, i));

            let again: BTreeSet<String> = node
                .extended_dependencies()
                .unwrap()
                .names()
                .map(str::to_string)
                .collect();
            prop_assert_eq!(&names, &again);

            let ownables: BTreeSet<&str> = closure.ownables().map(UnitRef::name).collect();
            let expected: BTreeSet<&str> = names
                .iter()
                .filter(|n| dag.ownable[n[1..].parse::<usize>().unwrap()])
                .map(String::as_str)
                .collect();
            prop_assert_eq!(ownables, expected);
        }
    }

    #[test]
    fn handoff_takes_and_returns_the_whole_closure(dag in dag()) {
        let nodes = build(&dag);
        let top = nodes.last().unwrap();
        let ctx = ExecutionContext::new("main");

        let closure = top.extended_dependencies().unwrap();
        let guards: Vec<&OwnershipGuard> = closure
            .ownables()
            .filter_map(UnitRef::ownership)
            .chain(top.ownership())
            .collect();

        let acquisition = acquire_all(&**top, &ctx, false).unwrap();
        prop_assert!(acquisition.is_complete());
        for guard in &guards {
            prop_assert!(guard.is_owned_by(Some(&ctx)));
        }

        release_all(&**top, &ctx).unwrap();
        for guard in &guards {
            prop_assert!(guard.is_owned_by(None));
        }
    }
}
