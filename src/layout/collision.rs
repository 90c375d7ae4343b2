// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::options::CollisionOptions;

/// Overlaps thinner than this are rounding noise from earlier separations.
const EPSILON: f64 = 1e-6;

/// Axis-aligned node rectangle; `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Overlap extent along x and y; `None` unless the interiors intersect.
    fn overlap(&self, other: &Rect) -> Option<(f64, f64)> {
        let dx = self.right().min(other.right()) - self.x.max(other.x);
        let dy = self.bottom().min(other.bottom()) - self.y.max(other.y);
        (dx > EPSILON && dy > EPSILON).then_some((dx, dy))
    }

    /// Intersection area over the smaller rectangle's area, in `[0, 1]`.
    pub fn overlap_ratio(&self, other: &Rect) -> f64 {
        let Some((dx, dy)) = self.overlap(other) else {
            return 0.0;
        };
        let smaller = self.area().min(other.area());
        if smaller <= 0.0 {
            return 0.0;
        }
        (dx * dy / smaller).min(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct CollisionReport {
    /// Passes that moved at least one rectangle.
    pub iterations: usize,
    pub converged: bool,
    /// Pairs still above the threshold when resolution stopped.
    pub remaining_overlaps: usize,
}

/// Push overlapping rectangles apart until no pair exceeds the threshold or the pass cap is hit.
///
/// Each offending pair is separated along the axis of least overlap by the overlap plus the
/// margin, half applied to each rectangle. Afterwards the whole set is shifted back so its
/// top-left bound is not above or left of where it started. Hitting the cap is not an error:
/// the partially resolved placement is kept and reported as not converged.
pub fn resolve_collisions(rects: &mut [Rect], options: &CollisionOptions) -> CollisionReport {
    let Some(original_min) = min_corner(rects) else {
        return CollisionReport { iterations: 0, converged: true, remaining_overlaps: 0 };
    };

    let mut iterations = 0usize;
    let mut converged = false;
    while iterations < options.max_iterations {
        if !separation_pass(rects, options) {
            converged = true;
            break;
        }
        iterations += 1;
    }

    let remaining_overlaps = if converged { 0 } else { count_overlaps(rects, options) };
    let converged = remaining_overlaps == 0;

    if let Some(new_min) = min_corner(rects) {
        let shift_x = (original_min.0 - new_min.0).max(0.0);
        let shift_y = (original_min.1 - new_min.1).max(0.0);
        if shift_x > 0.0 || shift_y > 0.0 {
            for rect in rects.iter_mut() {
                rect.x += shift_x;
                rect.y += shift_y;
            }
        }
    }

    if converged {
        debug!("collision resolution converged after {iterations} passes");
    } else {
        warn!(
            "collision resolution stopped after {iterations} passes with {remaining_overlaps} overlapping pairs"
        );
    }
    CollisionReport { iterations, converged, remaining_overlaps }
}

/// One sweep over all pairs; returns whether anything moved.
fn separation_pass(rects: &mut [Rect], options: &CollisionOptions) -> bool {
    let mut moved = false;
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            let (a, b) = (rects[i], rects[j]);
            if a.overlap_ratio(&b) <= options.overlap_threshold {
                continue;
            }
            let Some((dx, dy)) = a.overlap(&b) else {
                continue;
            };
            let (a_center, b_center) = (a.center(), b.center());
            if dx <= dy {
                let half = (dx + options.margin) / 2.0;
                let sign = if a_center.0 <= b_center.0 { 1.0 } else { -1.0 };
                rects[i].x -= sign * half;
                rects[j].x += sign * half;
            } else {
                let half = (dy + options.margin) / 2.0;
                let sign = if a_center.1 <= b_center.1 { 1.0 } else { -1.0 };
                rects[i].y -= sign * half;
                rects[j].y += sign * half;
            }
            moved = true;
        }
    }
    moved
}

fn count_overlaps(rects: &[Rect], options: &CollisionOptions) -> usize {
    let mut count = 0usize;
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if rects[i].overlap_ratio(&rects[j]) > options.overlap_threshold {
                count += 1;
            }
        }
    }
    count
}

fn min_corner(rects: &[Rect]) -> Option<(f64, f64)> {
    rects.iter().fold(None, |acc, rect| match acc {
        None => Some((rect.x, rect.y)),
        Some((x, y)) => Some((x.min(rect.x), y.min(rect.y))),
    })
}
