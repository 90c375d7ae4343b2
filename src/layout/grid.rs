// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::options::LayoutOptions;
use super::{LayoutGraph, LayoutStrategy, NodePlacement};
use crate::model::Position;

/// Row-major cells in graph order. Edges and direction are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridStrategy;

impl LayoutStrategy for GridStrategy {
    fn name(&self) -> &str {
        "grid"
    }

    fn place(&self, graph: &LayoutGraph, options: &LayoutOptions) -> Vec<NodePlacement> {
        let columns = options.grid_columns.unwrap_or_else(|| ceil_sqrt(graph.len())).max(1);
        (0..graph.len())
            .filter_map(|idx| {
                let node_id = graph.node_id(idx)?;
                let (row, column) = (idx / columns, idx % columns);
                Some(NodePlacement {
                    node_id: node_id.clone(),
                    position: Position::new(
                        column as f64 * options.grid_cell_width,
                        row as f64 * options.grid_cell_height,
                    ),
                    rank: row,
                    order: column,
                })
            })
            .collect()
    }
}

fn ceil_sqrt(n: usize) -> usize {
    let mut root = 0usize;
    while root * root < n {
        root += 1;
    }
    root
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ceil_sqrt, GridStrategy};
    use crate::layout::{LayoutGraph, LayoutOptions, LayoutStrategy};
    use crate::model::fixtures::tavern_tree;
    use crate::model::Position;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(4, 2)]
    #[case(5, 3)]
    #[case(10, 4)]
    fn ceil_sqrt_rounds_up(#[case] n: usize, #[case] expected: usize) {
        assert_eq!(ceil_sqrt(n), expected);
    }

    #[test]
    fn fills_rows_in_insertion_order() {
        let options = LayoutOptions::default();
        let graph = LayoutGraph::from_tree(&tavern_tree(), &options);
        let placements = GridStrategy.place(&graph, &options);

        let cells = placements
            .iter()
            .map(|placement| (placement.node_id.as_str(), placement.rank, placement.order))
            .collect::<Vec<_>>();
        assert_eq!(
            cells,
            vec![("start", 0, 0), ("gate", 0, 1), ("inside", 0, 2), ("outside", 1, 0), ("end", 1, 1)]
        );
        assert_eq!(placements[4].position, Position::new(260.0, 160.0));
    }

    #[test]
    fn explicit_column_count_wins() {
        let options = LayoutOptions { grid_columns: Some(1), ..LayoutOptions::default() };
        let graph = LayoutGraph::from_tree(&tavern_tree(), &options);
        let placements = GridStrategy.place(&graph, &options);
        assert!(placements.iter().all(|placement| placement.position.x == 0.0));
        assert_eq!(placements[3].position.y, 3.0 * 160.0);
    }
}
