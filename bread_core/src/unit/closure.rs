//! Transitive dependency closure.
//!
//! Direct dependencies are added first, then each one is explored in name
//! order. A name already on the current traversal path is a cycle; a name
//! that was fully explored before is skipped, so diamonds stay legal.

use std::collections::HashSet;

use super::{Unit, UnitMap};
use crate::error::GraphError;

/// Compute the extended dependencies of `unit`.
pub fn extended_dependencies<U: Unit + ?Sized>(unit: &U) -> Result<UnitMap, GraphError> {
    let mut walk = Walk {
        path: vec![unit.name().to_string()],
        explored: HashSet::new(),
        out: UnitMap::new(),
    };
    walk.visit(&unit.dependencies())?;
    Ok(walk.out)
}

struct Walk {
    path: Vec<String>,
    explored: HashSet<String>,
    out: UnitMap,
}

impl Walk {
    fn visit(&mut self, direct: &UnitMap) -> Result<(), GraphError> {
        for dep in direct.values() {
            self.out.insert_if_absent(dep.clone());
        }

        for dep in direct.values() {
            let name = dep.name();
            if self.path.iter().any(|p| p == name) {
                let mut path = self.path.clone();
                path.push(name.to_string());
                return Err(GraphError::CyclicDependency {
                    unit: name.to_string(),
                    path,
                });
            }
            if self.explored.contains(name) {
                continue;
            }

            self.path.push(name.to_string());
            self.visit(&dep.dependencies())?;
            self.path.pop();
            self.explored.insert(name.to_string());
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
