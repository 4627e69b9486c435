//! Nearest-neighbour construction refined by 2-opt

use heapless::Vec;

use crate::geometry::{Location, Point2};
use crate::model::MAX_PLACEMENTS;

/// Maximum number of points a single ordering can hold
pub const MAX_TRAVEL_POINTS: usize = MAX_PLACEMENTS;

/// Default 2-opt pass budget
pub const DEFAULT_MAX_PASSES: u16 = 32;

/// A 2-opt move must shorten the path by more than this (mm) to count
const IMPROVEMENT_EPSILON_MM: f64 = 1e-9;

/// Ordering failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TravelError {
    /// More than `MAX_TRAVEL_POINTS` items
    TooManyPoints,
}

impl core::fmt::Display for TravelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TravelError::TooManyPoints => {
                write!(f, "more than {} points to order", MAX_TRAVEL_POINTS)
            }
        }
    }
}

/// Result of an ordering run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TravelSummary {
    /// Path length of the input order, start to end
    pub initial_length_mm: f64,
    /// Path length of the returned order, start to end
    pub final_length_mm: f64,
    /// 2-opt passes performed
    pub passes: u16,
}

/// Heuristic open-path travel optimizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TravelOptimizer {
    pub max_passes: u16,
}

impl Default for TravelOptimizer {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

type Order = Vec<usize, MAX_TRAVEL_POINTS>;

impl TravelOptimizer {
    pub const fn new(max_passes: u16) -> Self {
        Self { max_passes }
    }

    /// Reorder `items` in place
    ///
    /// The path runs from `start` through every item to `end`; both anchors
    /// stay fixed. The returned order is never longer than the input order.
    /// Identical inputs always give identical orders.
    pub fn solve<T, F>(
        &self,
        items: &mut [T],
        locate: F,
        start: Location,
        end: Location,
    ) -> Result<TravelSummary, TravelError>
    where
        F: Fn(&T) -> Location,
    {
        let n = items.len();
        if n > MAX_TRAVEL_POINTS {
            return Err(TravelError::TooManyPoints);
        }

        let mut points: Vec<Point2, MAX_TRAVEL_POINTS> = Vec::new();
        for item in items.iter() {
            points
                .push(locate(item).xy_mm())
                .map_err(|_| TravelError::TooManyPoints)?;
        }
        let (start, end) = (start.xy_mm(), end.xy_mm());

        let initial_length_mm = path_length(start, points.iter().copied(), end);
        if n < 2 {
            return Ok(TravelSummary {
                initial_length_mm,
                final_length_mm: initial_length_mm,
                passes: 0,
            });
        }

        let mut order = nearest_neighbour(&points, start);
        let passes = self.two_opt(&mut order, &points, start, end);

        let final_length_mm = route_length(&order, &points, start, end);
        if final_length_mm > initial_length_mm {
            return Ok(TravelSummary {
                initial_length_mm,
                final_length_mm: initial_length_mm,
                passes,
            });
        }

        apply_permutation(items, &order);
        Ok(TravelSummary {
            initial_length_mm,
            final_length_mm,
            passes,
        })
    }

    /// Segment reversal until no move improves or the pass budget runs out
    fn two_opt(&self, order: &mut Order, points: &[Point2], start: Point2, end: Point2) -> u16 {
        let n = order.len();
        let mut passes = 0;

        while passes < self.max_passes {
            passes += 1;
            let mut improved = false;

            for i in 0..n - 1 {
                for k in i + 1..n {
                    let before = if i == 0 { start } else { points[order[i - 1]] };
                    let after = if k == n - 1 { end } else { points[order[k + 1]] };
                    let first = points[order[i]];
                    let last = points[order[k]];

                    let delta = before.distance_to(&last) + first.distance_to(&after)
                        - before.distance_to(&first)
                        - last.distance_to(&after);
                    if delta < -IMPROVEMENT_EPSILON_MM {
                        order[i..=k].reverse();
                        improved = true;
                    }
                }
            }

            if !improved {
                break;
            }
        }
        passes
    }
}

/// Greedy order from `start`; ties go to the lowest index
fn nearest_neighbour(points: &[Point2], start: Point2) -> Order {
    let mut order = Order::new();
    let mut visited = [false; MAX_TRAVEL_POINTS];
    let mut current = start;

    for _ in 0..points.len() {
        let mut best: Option<(usize, f64)> = None;
        for (j, p) in points.iter().enumerate() {
            if visited[j] {
                continue;
            }
            let d = current.distance_to(p);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((j, d)),
            }
        }
        if let Some((j, _)) = best {
            visited[j] = true;
            current = points[j];
            // Capacity matches `points`, which is already bounded
            let _ = order.push(j);
        }
    }
    order
}

fn route_length(order: &[usize], points: &[Point2], start: Point2, end: Point2) -> f64 {
    path_length(start, order.iter().map(|&i| points[i]), end)
}

/// Total XY length of `start -> points... -> end`, in millimetres
pub fn path_length<I>(start: Point2, points: I, end: Point2) -> f64
where
    I: IntoIterator<Item = Point2>,
{
    let mut total = 0.0;
    let mut current = start;
    for p in points {
        total += current.distance_to(&p);
        current = p;
    }
    total + current.distance_to(&end)
}

/// Rearrange so `items[i]` becomes the old `items[order[i]]`
fn apply_permutation<T>(items: &mut [T], order: &[usize]) {
    for i in 0..order.len() {
        let mut j = order[i];
        while j < i {
            j = order[j];
        }
        items.swap(i, j);
    }
}
