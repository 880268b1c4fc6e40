#![allow(dead_code)]

//! Ready-made graphs shared by the integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use branchflow::dag::{Graph, GraphBuilder, TaskId};

/// Names of bodies in the order they executed.
#[derive(Debug, Clone, Default)]
pub struct BodyLog(Arc<Mutex<Vec<String>>>);

impl BodyLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|n| *n == name).count()
    }
}

/// Add a static task whose body only records its name.
pub fn logged_static(b: &mut GraphBuilder, name: &str, log: &BodyLog) -> TaskId {
    let log = log.clone();
    let label = name.to_string();
    b.add_static(name, move || {
        log.push(&label);
        Ok(())
    })
    .unwrap()
}

/// Add a condition task that records its name and returns the values of
/// `script` in turn, repeating the last one once the script runs out.
pub fn scripted_condition(
    b: &mut GraphBuilder,
    name: &str,
    script: Vec<i64>,
    log: &BodyLog,
) -> TaskId {
    assert!(!script.is_empty(), "condition script must not be empty");
    let log = log.clone();
    let label = name.to_string();
    let calls = AtomicUsize::new(0);
    b.add_condition(name, move || {
        log.push(&label);
        let n = calls.fetch_add(1, Ordering::SeqCst);
        Ok(script[n.min(script.len() - 1)])
    })
    .unwrap()
}

/// Task ids of the feedback-loop graph.
#[derive(Debug, Clone, Copy)]
pub struct LoopIds {
    pub init: TaskId,
    pub cond: TaskId,
    pub stop: TaskId,
}

/// `init -> cond`, `cond -> [cond, stop]`.
///
/// `cond` takes branch 0 (itself) `loops` times, then branch 1 (`stop`).
pub fn feedback_loop(loops: usize, log: &BodyLog) -> (Arc<Graph>, LoopIds) {
    let mut b = GraphBuilder::new();
    let init = logged_static(&mut b, "init", log);
    let mut script = vec![0; loops];
    script.push(1);
    let cond = scripted_condition(&mut b, "cond", script, log);
    let stop = logged_static(&mut b, "stop", log);

    b.precede(init, cond).unwrap();
    b.precede_all(cond, &[cond, stop]).unwrap();

    let graph = b.build().unwrap();
    (Arc::new(graph), LoopIds { init, cond, stop })
}

/// The mixed strong/weak graph:
///
/// ```text
/// A -> {B, F}     B -> C -> D -> cond1     cond1 -> {B, E}
/// F -> cond2      cond2 -> {G, H}          H -> I -> cond3
/// cond3 -> {cond3, L}                      L -> M     E -> K
/// ```
///
/// `cond1` loops back to `B` once, `cond2` picks `H`, `cond3` loops on
/// itself twice.
pub fn mixed_graph(log: &BodyLog) -> Arc<Graph> {
    let mut b = GraphBuilder::new();

    let a = logged_static(&mut b, "A", log);
    let bb = logged_static(&mut b, "B", log);
    let c = logged_static(&mut b, "C", log);
    let d = logged_static(&mut b, "D", log);
    let cond1 = scripted_condition(&mut b, "cond1", vec![0, 1], log);
    let e = logged_static(&mut b, "E", log);
    let f = logged_static(&mut b, "F", log);
    let cond2 = scripted_condition(&mut b, "cond2", vec![1], log);
    let g = logged_static(&mut b, "G", log);
    let h = logged_static(&mut b, "H", log);
    let i = logged_static(&mut b, "I", log);
    let cond3 = scripted_condition(&mut b, "cond3", vec![0, 0, 1], log);
    let k = logged_static(&mut b, "K", log);
    let l = logged_static(&mut b, "L", log);
    let m = logged_static(&mut b, "M", log);

    b.precede_all(a, &[bb, f]).unwrap();
    b.precede(bb, c).unwrap();
    b.precede(c, d).unwrap();
    b.precede(d, cond1).unwrap();
    b.precede_all(cond1, &[bb, e]).unwrap();
    b.precede(f, cond2).unwrap();
    b.precede_all(cond2, &[g, h]).unwrap();
    b.precede(h, i).unwrap();
    b.precede(i, cond3).unwrap();
    b.precede_all(cond3, &[cond3, l]).unwrap();
    b.precede(l, m).unwrap();
    b.precede(e, k).unwrap();

    Arc::new(b.build().unwrap())
}
