// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::LayoutError;
use crate::model::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Ranks stack downward; siblings spread along x.
    #[default]
    TopToBottom,
    /// Ranks stack rightward; siblings spread along y.
    LeftToRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CollisionOptions {
    pub enabled: bool,
    /// Pairs whose overlap ratio (intersection area / smaller area) exceeds this are separated.
    pub overlap_threshold: f64,
    /// Extra gap added to every separation.
    pub margin: f64,
    pub max_iterations: usize,
}

impl Default for CollisionOptions {
    fn default() -> Self {
        Self { enabled: true, overlap_threshold: 0.0, margin: 20.0, max_iterations: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LayoutOptions {
    pub direction: Direction,
    pub node_width: f64,
    pub node_height: f64,
    /// Per-node sizes reported by the editor; other nodes use `node_width`×`node_height`.
    pub node_sizes: IndexMap<NodeId, Size>,
    /// Gap between consecutive ranks.
    pub rank_spacing: f64,
    /// Gap between neighbours within a rank.
    pub node_spacing: f64,
    /// Hierarchical roots; empty means "nodes nothing jumps to".
    pub start_nodes: Vec<NodeId>,
    pub grid_cell_width: f64,
    pub grid_cell_height: f64,
    /// Defaults to `ceil(sqrt(n))`.
    pub grid_columns: Option<usize>,
    pub collision: CollisionOptions,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: Direction::TopToBottom,
            node_width: 200.0,
            node_height: 100.0,
            node_sizes: IndexMap::new(),
            rank_spacing: 80.0,
            node_spacing: 40.0,
            start_nodes: Vec::new(),
            grid_cell_width: 260.0,
            grid_cell_height: 160.0,
            grid_columns: None,
            collision: CollisionOptions::default(),
        }
    }
}

impl LayoutOptions {
    pub fn size_of(&self, node_id: &NodeId) -> Size {
        self.node_sizes
            .get(node_id)
            .copied()
            .unwrap_or(Size::new(self.node_width, self.node_height))
    }

    /// Reject options no layout could honour.
    pub fn validate(&self) -> Result<(), LayoutError> {
        positive("node_width", self.node_width)?;
        positive("node_height", self.node_height)?;
        for (node_id, size) in &self.node_sizes {
            if !(size.width.is_finite() && size.width > 0.0)
                || !(size.height.is_finite() && size.height > 0.0)
            {
                return Err(LayoutError::InvalidOption {
                    option: "node_sizes",
                    reason: format!("size of '{node_id}' must be positive"),
                });
            }
        }
        non_negative("rank_spacing", self.rank_spacing)?;
        non_negative("node_spacing", self.node_spacing)?;
        positive("grid_cell_width", self.grid_cell_width)?;
        positive("grid_cell_height", self.grid_cell_height)?;
        if self.grid_columns == Some(0) {
            return Err(LayoutError::InvalidOption {
                option: "grid_columns",
                reason: "must be at least 1".to_owned(),
            });
        }

        let collision = &self.collision;
        if !(0.0..=1.0).contains(&collision.overlap_threshold) {
            return Err(LayoutError::InvalidOption {
                option: "collision.overlap_threshold",
                reason: format!("{} is outside [0, 1]", collision.overlap_threshold),
            });
        }
        non_negative("collision.margin", collision.margin)?;
        if collision.enabled && collision.max_iterations == 0 {
            return Err(LayoutError::InvalidOption {
                option: "collision.max_iterations",
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

fn positive(option: &'static str, value: f64) -> Result<(), LayoutError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LayoutError::InvalidOption { option, reason: format!("{value} must be positive") })
    }
}

fn non_negative(option: &'static str, value: f64) -> Result<(), LayoutError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LayoutError::InvalidOption { option, reason: format!("{value} must not be negative") })
    }
}
