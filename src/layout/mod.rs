// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Automatic node placement for dialogue graphs.
//!
//! A strategy turns the graph's topology into positions; collision resolution then pushes any
//! overlapping node rectangles apart. Strategies are looked up by name in a registry the caller
//! supplies, and only positions change: topology is never touched.

pub mod collision;
pub mod grid;
pub mod hierarchical;
pub mod options;

use indexmap::IndexMap;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{DialogueTree, NodeId, Position};

pub use collision::{resolve_collisions, CollisionReport, Rect};
pub use grid::GridStrategy;
pub use hierarchical::HierarchicalStrategy;
pub use options::{CollisionOptions, Direction, LayoutOptions, Size};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("unknown layout strategy '{name}' (available: {})", available.join(", "))]
    UnknownStrategy { name: String, available: Vec<String> },
    #[error("invalid layout option {option}: {reason}")]
    InvalidOption { option: &'static str, reason: String },
}

/// Node topology as seen by layout: nodes in tree order, edges as deduplicated index lists.
///
/// Self-jumps and jumps to missing nodes carry no placement information and are dropped.
#[derive(Debug, Clone)]
pub struct LayoutGraph {
    nodes: IndexMap<NodeId, Size>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
}

impl LayoutGraph {
    pub fn from_tree(tree: &DialogueTree, options: &LayoutOptions) -> Self {
        let nodes = tree
            .nodes()
            .keys()
            .map(|node_id| (node_id.clone(), options.size_of(node_id)))
            .collect::<IndexMap<_, _>>();
        let mut successors = vec![Vec::<usize>::new(); nodes.len()];
        let mut predecessors = vec![Vec::<usize>::new(); nodes.len()];
        for (from, node) in tree.nodes().values().enumerate() {
            for next in node.next_references() {
                let Some(to) = nodes.get_index_of(next) else {
                    continue;
                };
                if to == from || successors[from].contains(&to) {
                    continue;
                }
                successors[from].push(to);
                predecessors[to].push(from);
            }
        }
        Self { nodes, successors, predecessors }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_id(&self, idx: usize) -> Option<&NodeId> {
        self.nodes.get_index(idx).map(|(node_id, _)| node_id)
    }

    pub fn index_of(&self, node_id: &NodeId) -> Option<usize> {
        self.nodes.get_index_of(node_id)
    }

    pub fn size(&self, idx: usize) -> Size {
        self.nodes.get_index(idx).map_or(Size::new(0.0, 0.0), |(_, size)| *size)
    }

    pub fn successors(&self, idx: usize) -> &[usize] {
        self.successors.get(idx).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn predecessors(&self, idx: usize) -> &[usize] {
        self.predecessors.get(idx).map(Vec::as_slice).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodePlacement {
    pub node_id: NodeId,
    pub position: Position,
    /// Hierarchical depth, or grid row.
    pub rank: usize,
    /// Index within the rank, or grid column.
    pub order: usize,
}

/// A placement algorithm. Implementations return one placement per graph node, in graph order.
pub trait LayoutStrategy {
    fn name(&self) -> &str;

    fn place(&self, graph: &LayoutGraph, options: &LayoutOptions) -> Vec<NodePlacement>;
}

/// Strategy name → implementation, owned by the caller.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: IndexMap<String, Box<dyn LayoutStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `hierarchical` and `grid`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(HierarchicalStrategy));
        registry.register(Box::new(GridStrategy));
        registry
    }

    /// Register a strategy under its name, replacing any previous one.
    pub fn register(&mut self, strategy: Box<dyn LayoutStrategy>) {
        self.strategies.insert(strategy.name().to_owned(), strategy);
    }

    pub fn get(&self, name: &str) -> Option<&dyn LayoutStrategy> {
        self.strategies.get(name).map(Box::as_ref)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DialogueLayout {
    pub strategy: String,
    pub placements: IndexMap<NodeId, NodePlacement>,
    /// Absent when collision resolution is disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collision: Option<CollisionReport>,
}

impl DialogueLayout {
    pub fn position(&self, node_id: &NodeId) -> Option<Position> {
        self.placements.get(node_id).map(|placement| placement.position)
    }

    /// Write positions into `tree`; nodes without a placement keep theirs.
    pub fn apply_to(&self, tree: &mut DialogueTree) {
        for (node_id, placement) in &self.placements {
            if let Some(node) = tree.node_mut(node_id) {
                node.set_position(placement.position);
            }
        }
    }
}

/// Compute a layout for `tree` with the named strategy.
///
/// Fails only on caller mistakes: an unregistered strategy or invalid options. Cycles,
/// disconnected nodes, and collision non-convergence all produce a layout.
pub fn layout_dialogue(
    tree: &DialogueTree,
    registry: &StrategyRegistry,
    strategy: &str,
    options: &LayoutOptions,
) -> Result<DialogueLayout, LayoutError> {
    options.validate()?;
    let Some(implementation) = registry.get(strategy) else {
        return Err(LayoutError::UnknownStrategy {
            name: strategy.to_owned(),
            available: registry.names().map(str::to_owned).collect(),
        });
    };

    let graph = LayoutGraph::from_tree(tree, options);
    let mut placements = implementation.place(&graph, options);

    let collision = options.collision.enabled.then(|| {
        let mut rects = placements
            .iter()
            .map(|placement| {
                let size = options.size_of(&placement.node_id);
                Rect::new(placement.position.x, placement.position.y, size.width, size.height)
            })
            .collect::<Vec<_>>();
        let report = resolve_collisions(&mut rects, &options.collision);
        for (placement, rect) in placements.iter_mut().zip(&rects) {
            placement.position = Position::new(rect.x, rect.y);
        }
        report
    });

    debug!("layout '{strategy}': placed {} nodes", placements.len());
    Ok(DialogueLayout {
        strategy: strategy.to_owned(),
        placements: placements
            .into_iter()
            .map(|placement| (placement.node_id.clone(), placement))
            .collect(),
        collision,
    })
}

/// [`layout_dialogue`], returning a copy of `tree` with updated positions.
pub fn apply_layout(
    tree: &DialogueTree,
    registry: &StrategyRegistry,
    strategy: &str,
    options: &LayoutOptions,
) -> Result<DialogueTree, LayoutError> {
    let layout = layout_dialogue(tree, registry, strategy, options)?;
    let mut positioned = tree.clone();
    layout.apply_to(&mut positioned);
    Ok(positioned)
}
