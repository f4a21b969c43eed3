//! Parent to children index over a process table.
//!
//! Built from one scan of `(pid, ppid)` pairs. Descendants are collected
//! with an explicit stack and a visited set, so a corrupt table with a
//! cycle cannot loop and a deep tree cannot overflow the call stack.

use ahash::{AHashMap as HashMap, AHashSet as HashSet};

#[derive(Debug, Default, Clone)]
pub struct ProcessTree {
    children: HashMap<u32, Vec<u32>>,
}

impl ProcessTree {
    /// Builds the index from `(pid, parent_pid)` pairs in any order.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
        for (pid, ppid) in pairs {
            if pid == ppid {
                continue;
            }
            children.entry(ppid).or_default().push(pid);
        }
        // Sorted so traversal order does not depend on scan order.
        for list in children.values_mut() {
            list.sort_unstable();
            list.dedup();
        }
        Self { children }
    }

    pub fn children_of(&self, pid: u32) -> &[u32] {
        self.children.get(&pid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every pid reachable below `root`, depth first, each exactly once.
    ///
    /// The root itself is never part of the result.
    pub fn descendants(&self, root: u32) -> Vec<u32> {
        let mut visited: HashSet<u32> = HashSet::new();
        visited.insert(root);

        let mut out = Vec::new();
        let mut stack: Vec<u32> = self.children_of(root).iter().rev().copied().collect();
        while let Some(pid) = stack.pop() {
            if !visited.insert(pid) {
                continue;
            }
            out.push(pid);
            stack.extend(self.children_of(pid).iter().rev().copied());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.children.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
