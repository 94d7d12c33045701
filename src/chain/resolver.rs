// Height resolution for headers arriving out of order

use std::collections::{HashMap, VecDeque};

use crate::core::{BlockHeader, Hash256};

/// Assigns chain heights to headers in arrival order.
///
/// The first header admitted is the root (height 0). A header whose parent
/// is unknown is parked as an orphan until the parent is resolved, at which
/// point it and all of its parked descendants are resolved together.
#[derive(Debug, Default)]
pub struct HeightResolver {
    heights: HashMap<Hash256, u32>,
    /// Parked headers by their own hash
    orphans: HashMap<Hash256, BlockHeader>,
    /// Parent hash -> hashes of parked children, in arrival order
    children: HashMap<Hash256, Vec<Hash256>>,
    genesis_assigned: bool,
    best_height: Option<u32>,
}

impl HeightResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a header. Returns every header resolved by this call, in
    /// resolution order: nothing if the header was parked, otherwise the
    /// header itself followed by any orphans it released.
    pub fn admit(&mut self, mut header: BlockHeader) -> Vec<BlockHeader> {
        if self.heights.contains_key(&header.hash) || self.orphans.contains_key(&header.hash) {
            log::warn!("Ignoring duplicate block header {}", header.hash);
            return Vec::new();
        }

        if !self.genesis_assigned {
            self.genesis_assigned = true;
            self.assign(&mut header, 0);
            return vec![header];
        }

        let Some(parent_height) = self.heights.get(&header.prev_block_hash).copied() else {
            log::debug!(
                "Block {} parked, parent {} not seen yet",
                header.hash,
                header.prev_block_hash
            );
            self.children
                .entry(header.prev_block_hash)
                .or_default()
                .push(header.hash);
            self.orphans.insert(header.hash, header);
            return Vec::new();
        };

        self.assign(&mut header, parent_height + 1);
        let root = header.hash;
        let mut resolved = vec![header];
        self.resolve_descendants(root, &mut resolved);
        resolved
    }

    /// Breadth-first release of parked headers below `root`
    fn resolve_descendants(&mut self, root: Hash256, resolved: &mut Vec<BlockHeader>) {
        let mut queue = VecDeque::from([root]);

        while let Some(parent) = queue.pop_front() {
            let Some(children) = self.children.remove(&parent) else {
                continue;
            };
            let Some(parent_height) = self.heights.get(&parent).copied() else {
                continue;
            };

            for child in children {
                let Some(mut header) = self.orphans.remove(&child) else {
                    continue;
                };
                log::debug!("Orphan {} resolved at height {}", child, parent_height + 1);
                self.assign(&mut header, parent_height + 1);
                resolved.push(header);
                queue.push_back(child);
            }
        }
    }

    fn assign(&mut self, header: &mut BlockHeader, height: u32) {
        header.height = Some(height);
        self.heights.insert(header.hash, height);
        if self.best_height.is_none_or(|best| height > best) {
            self.best_height = Some(height);
        }
    }

    pub fn height_of(&self, hash: &Hash256) -> Option<u32> {
        self.heights.get(hash).copied()
    }

    /// Number of headers with an assigned height
    pub fn resolved_count(&self) -> usize {
        self.heights.len()
    }

    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    pub fn is_orphan(&self, hash: &Hash256) -> bool {
        self.orphans.contains_key(hash)
    }

    /// Highest height assigned so far
    pub fn best_height(&self) -> Option<u32> {
        self.best_height
    }

    /// Headers still waiting for their parent
    pub fn orphans(&self) -> impl Iterator<Item = &BlockHeader> {
        self.orphans.values()
    }
}
