// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use log::debug;

use super::options::{Direction, LayoutOptions};
use super::{LayoutGraph, LayoutStrategy, NodePlacement};
use crate::model::Position;

/// Layered placement: ranks by longest path from the start nodes, barycenter order within ranks.
///
/// Cycles are broken by dropping DFS back edges. Nodes unreachable from the starts are ranked
/// after the deepest reachable rank, so every node is placed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalStrategy;

impl LayoutStrategy for HierarchicalStrategy {
    fn name(&self) -> &str {
        "hierarchical"
    }

    fn place(&self, graph: &LayoutGraph, options: &LayoutOptions) -> Vec<NodePlacement> {
        if graph.is_empty() {
            return Vec::new();
        }
        let ranking = Ranking::compute(graph, options);
        let layers = build_layers(graph, &ranking);
        let coordinates = assign_coordinates(graph, &layers, options);

        let mut placements = Vec::with_capacity(graph.len());
        for idx in 0..graph.len() {
            let Some(node_id) = graph.node_id(idx) else {
                continue;
            };
            let (rank, order, position) = coordinates[idx];
            placements.push(NodePlacement { node_id: node_id.clone(), position, rank, order });
        }
        placements
    }
}

#[derive(Debug, Clone)]
struct Ranking {
    ranks: Vec<usize>,
    back_edges: BTreeSet<(usize, usize)>,
    reachable: Vec<bool>,
}

impl Ranking {
    fn compute(graph: &LayoutGraph, options: &LayoutOptions) -> Self {
        let starts = start_nodes(graph, options);
        let search = depth_first(graph, &starts);

        // Reverse postorder is a topological order once back edges are dropped.
        let topo = search.postorder.iter().rev().copied().collect::<Vec<_>>();
        let back_edges = &search.back_edges;
        let forward = |from: usize| {
            graph
                .successors(from)
                .iter()
                .copied()
                .filter(move |&to| !back_edges.contains(&(from, to)))
        };

        let mut ranks = vec![0usize; graph.len()];
        for &from in topo.iter().filter(|&&idx| search.reachable[idx]) {
            for to in forward(from) {
                ranks[to] = ranks[to].max(ranks[from] + 1);
            }
        }

        let base = (0..graph.len())
            .filter(|&idx| search.reachable[idx])
            .map(|idx| ranks[idx] + 1)
            .max()
            .unwrap_or(0);
        for idx in (0..graph.len()).filter(|&idx| !search.reachable[idx]) {
            ranks[idx] = base;
        }
        for &from in topo.iter().filter(|&&idx| !search.reachable[idx]) {
            for to in forward(from).filter(|&to| !search.reachable[to]) {
                ranks[to] = ranks[to].max(ranks[from] + 1);
            }
        }

        let ranking = Self { ranks, back_edges: search.back_edges, reachable: search.reachable };
        debug!(
            "hierarchical ranks: {} starts, {} back edges, {} unreachable",
            starts.len(),
            ranking.back_edges.len(),
            ranking.reachable.iter().filter(|reachable| !**reachable).count()
        );
        ranking
    }
}

/// Configured starts that exist; otherwise nodes nothing jumps to; otherwise the first node.
fn start_nodes(graph: &LayoutGraph, options: &LayoutOptions) -> Vec<usize> {
    let mut starts = Vec::new();
    for node_id in &options.start_nodes {
        match graph.index_of(node_id) {
            Some(idx) if !starts.contains(&idx) => starts.push(idx),
            Some(_) => {}
            None => debug!("ignoring unknown start node '{node_id}'"),
        }
    }
    if starts.is_empty() {
        starts = (0..graph.len()).filter(|&idx| graph.predecessors(idx).is_empty()).collect();
    }
    if starts.is_empty() && !graph.is_empty() {
        starts.push(0);
    }
    starts
}

struct DepthFirst {
    postorder: Vec<usize>,
    back_edges: BTreeSet<(usize, usize)>,
    reachable: Vec<bool>,
}

/// Iterative DFS from `starts`, then from every still-unvisited node in graph order.
fn depth_first(graph: &LayoutGraph, starts: &[usize]) -> DepthFirst {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; graph.len()];
    let mut postorder = Vec::with_capacity(graph.len());
    let mut back_edges = BTreeSet::new();
    let mut reachable = vec![false; graph.len()];

    let roots = starts.iter().copied().chain(0..graph.len()).collect::<Vec<_>>();
    for (root_idx, root) in roots.into_iter().enumerate() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        let from_start = root_idx < starts.len();
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::OnStack;
        reachable[root] = from_start;

        while let Some(frame) = stack.last_mut() {
            let (node, next_child) = *frame;
            let Some(&child) = graph.successors(node).get(next_child) else {
                marks[node] = Mark::Done;
                postorder.push(node);
                stack.pop();
                continue;
            };
            frame.1 += 1;
            match marks[child] {
                Mark::Unvisited => {
                    marks[child] = Mark::OnStack;
                    reachable[child] = from_start;
                    stack.push((child, 0));
                }
                Mark::OnStack => {
                    back_edges.insert((node, child));
                }
                Mark::Done => {}
            }
        }
    }

    DepthFirst { postorder, back_edges, reachable }
}

/// Group nodes by rank, then order each rank by the mean position of its predecessors in the
/// rank above. Ties and predecessor-less nodes keep graph order.
fn build_layers(graph: &LayoutGraph, ranking: &Ranking) -> Vec<Vec<usize>> {
    let max_rank = ranking.ranks.iter().copied().max().unwrap_or(0);
    let mut layers = vec![Vec::<usize>::new(); max_rank + 1];
    for (idx, &rank) in ranking.ranks.iter().enumerate() {
        layers[rank].push(idx);
    }

    let mut prev_positions = vec![None::<usize>; graph.len()];
    for layer_idx in 0..layers.len() {
        if layer_idx > 0 {
            sort_layer_by_barycenter(&mut layers[layer_idx], &prev_positions, graph);
        }
        prev_positions.iter_mut().for_each(|slot| *slot = None);
        for (pos, &idx) in layers[layer_idx].iter().enumerate() {
            prev_positions[idx] = Some(pos);
        }
    }
    layers
}

fn sort_layer_by_barycenter(
    layer: &mut [usize],
    prev_positions: &[Option<usize>],
    graph: &LayoutGraph,
) {
    let barycenter = |idx: usize| {
        let (sum, count) = graph
            .predecessors(idx)
            .iter()
            .filter_map(|&pred| prev_positions[pred])
            .fold((0usize, 0usize), |(sum, count), pos| (sum + pos, count + 1));
        (count > 0).then_some((sum, count))
    };
    layer.sort_by(|&a, &b| match (barycenter(a), barycenter(b)) {
        (None, None) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (Some((sum_a, count_a)), Some((sum_b, count_b))) => {
            // sum_a/count_a vs sum_b/count_b without floats.
            let left = (sum_a as u128) * (count_b as u128);
            let right = (sum_b as u128) * (count_a as u128);
            left.cmp(&right).then_with(|| a.cmp(&b))
        }
    });
}

/// Per node: (rank, order within rank, top-left position).
fn assign_coordinates(
    graph: &LayoutGraph,
    layers: &[Vec<usize>],
    options: &LayoutOptions,
) -> Vec<(usize, usize, Position)> {
    let along_rank = |idx: usize| {
        let size = graph.size(idx);
        match options.direction {
            Direction::TopToBottom => size.height,
            Direction::LeftToRight => size.width,
        }
    };
    let across_rank = |idx: usize| {
        let size = graph.size(idx);
        match options.direction {
            Direction::TopToBottom => size.width,
            Direction::LeftToRight => size.height,
        }
    };

    let breadth = |layer: &[usize]| {
        let extent = layer.iter().map(|&idx| across_rank(idx)).sum::<f64>();
        extent + options.node_spacing * layer.len().saturating_sub(1) as f64
    };
    let widest = layers.iter().map(|layer| breadth(layer)).fold(0.0f64, f64::max);

    let mut coordinates = vec![(0usize, 0usize, Position::default()); graph.len()];
    let mut rank_offset = 0.0f64;
    for (rank, layer) in layers.iter().enumerate() {
        let mut cross = (widest - breadth(layer)) / 2.0;
        for (order, &idx) in layer.iter().enumerate() {
            let position = match options.direction {
                Direction::TopToBottom => Position::new(cross, rank_offset),
                Direction::LeftToRight => Position::new(rank_offset, cross),
            };
            coordinates[idx] = (rank, order, position);
            cross += across_rank(idx) + options.node_spacing;
        }
        let thickness = layer.iter().map(|&idx| along_rank(idx)).fold(0.0f64, f64::max);
        rank_offset += thickness + options.rank_spacing;
    }
    coordinates
}
