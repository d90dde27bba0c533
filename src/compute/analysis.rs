//! Geometric metrics over discrete routes.
//!
//! Every function is pure. Routes are read front to back; functions taking a
//! chromosome start the walk at the origin.

use std::f64::consts::TAU;

pub use crate::schema::MIN_TREASURE_DISTANCE;
use crate::schema::{DiscreteChromosome, DiscretePoint, RouteError};

/// Slack allowed when comparing a visit distance with a treasure distance.
pub const DISCOVERY_TOLERANCE: f64 = 1e-9;

/// Offset past a visit at which the adversary hides the next treasure.
pub const WORST_CASE_EPSILON: f64 = 1e-6;

/// Sum of the distances between consecutive points.
pub fn trace_length(points: &[DiscretePoint]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// Trace length of `points` plus a final leg to `end`.
pub fn trace_length_to(points: &[DiscretePoint], end: &DiscretePoint) -> f64 {
    trace_length(points) + points.last().map_or(0.0, |last| last.distance_to(end))
}

/// Length of the full route, starting at the origin.
pub fn route_length(chromosome: &DiscreteChromosome) -> f64 {
    trace_length(&with_origin(&chromosome.points()))
}

/// `points` with the origin prepended. Empty input stays empty.
pub fn with_origin(points: &[DiscretePoint]) -> Vec<DiscretePoint> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let mut route = Vec::with_capacity(points.len() + 1);
    route.push(first.origin_like());
    route.extend_from_slice(points);
    route
}

/// Whether visiting `candidate` discovers a treasure at `target`.
///
/// Both must lie on the same ray and the visit must reach at least as far.
pub fn finds(target: &DiscretePoint, candidate: &DiscretePoint) -> bool {
    target.same_ray(candidate) && candidate.distance() + DISCOVERY_TOLERANCE >= target.distance()
}

/// Distance walked from the origin until `treasure` is discovered.
///
/// The final leg runs from the last visited point to the treasure itself.
/// Returns [`f64::INFINITY`] when the route never discovers it.
pub fn treasure_trace_length(chromosome: &DiscreteChromosome, treasure: &DiscretePoint) -> f64 {
    let route = with_origin(&chromosome.points());
    trace_until(&route, treasure.to_cartesian(), |p| finds(treasure, p))
}

/// Treasure trace length relative to the treasure's distance.
///
/// A treasure at the origin has no meaningful ratio and scores infinity.
pub fn competitive_ratio(chromosome: &DiscreteChromosome, treasure: &DiscretePoint) -> f64 {
    if treasure.distance() <= 0.0 {
        return f64::INFINITY;
    }
    treasure_trace_length(chromosome, treasure) / treasure.distance()
}

fn trace_until<F>(points: &[DiscretePoint], target: (f64, f64), found: F) -> f64
where
    F: Fn(&DiscretePoint) -> bool,
{
    let mut iter = points.iter();
    let Some(first) = iter.next() else {
        return f64::INFINITY;
    };

    let mut previous = first.to_cartesian();
    let mut length = 0.0;
    if found(first) {
        return leg(previous, target);
    }
    for point in iter {
        if found(point) {
            return length + leg(previous, target);
        }
        let here = point.to_cartesian();
        length += leg(previous, here);
        previous = here;
    }
    f64::INFINITY
}

#[inline]
fn leg(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Steps between two slots going the shorter way around.
fn circular_gap(a: usize, b: usize, positions: usize) -> usize {
    let forward = (b + positions - a) % positions;
    forward.min(positions - forward)
}

/// Waypoint halfway between `a` and `b`.
///
/// The slot is the midpoint along the shorter arc (ties go towards increasing
/// indices); the distance is the mean of both distances.
pub fn in_between(a: &DiscretePoint, b: &DiscretePoint) -> Result<DiscretePoint, RouteError> {
    let positions = a.positions();
    if b.positions() != positions {
        return Err(RouteError::slot_mismatch(positions, b.positions()));
    }

    let forward = (b.position() + positions - a.position()) % positions;
    let backward = positions - forward;
    let position = if forward <= backward {
        (a.position() + forward / 2) % positions
    } else {
        (a.position() + positions - backward / 2) % positions
    };

    DiscretePoint::new(position, positions, (a.distance() + b.distance()) / 2.0)
}

/// The route with `in_between` waypoints inserted until consecutive points
/// sit on identical or adjacent slots, preceded by the origin.
///
/// The radial leg from the origin is left as is.
pub fn fill(chromosome: &DiscreteChromosome) -> Result<Vec<DiscretePoint>, RouteError> {
    let points = chromosome.points();
    let Some(first) = points.first() else {
        return Ok(Vec::new());
    };

    let mut filled = vec![first.origin_like(), *first];
    for pair in points.windows(2) {
        fill_between(&pair[0], &pair[1], &mut filled)?;
        filled.push(pair[1]);
    }
    Ok(filled)
}

fn fill_between(
    a: &DiscretePoint,
    b: &DiscretePoint,
    out: &mut Vec<DiscretePoint>,
) -> Result<(), RouteError> {
    if a.positions() != b.positions() {
        return Err(RouteError::slot_mismatch(a.positions(), b.positions()));
    }
    if circular_gap(a.position(), b.position(), a.positions()) <= 1 {
        return Ok(());
    }
    let mid = in_between(a, b)?;
    fill_between(a, &mid, out)?;
    out.push(mid);
    fill_between(&mid, b, out)
}

/// Area enclosed by the polygon through `points` (shoelace formula).
///
/// Fewer than three points enclose nothing.
pub fn area_covered(points: &[DiscretePoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let vertices: Vec<(f64, f64)> = points.iter().map(DiscretePoint::to_cartesian).collect();
    let twice_area: f64 = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(&(x1, y1), &(x2, y2))| x1 * y2 - x2 * y1)
        .sum();
    twice_area.abs() / 2.0
}

/// Area of a circular sector of radius `distance`.
///
/// The opening `angle` is capped at the width of one of `sector_count` equal
/// sectors. A sector count of zero is treated as one.
pub fn area_in_sector(angle: f64, distance: f64, sector_count: usize) -> f64 {
    let width = TAU / sector_count.max(1) as f64;
    (0.5 * distance * distance * angle.min(width)).max(0.0)
}

/// How closely the route follows an outward spiral, in `(0, 1]`.
///
/// The route is compared with the two ideal spirals that start at its first
/// slot and step one slot per gene, clockwise or counter-clockwise, through
/// the route's own distances in ascending order. The score is
/// `1 / (1 + deviation)` for the closer spiral, where deviation sums the
/// point-to-point distances. An empty route scores 0.
pub fn spiral_likeness(chromosome: &DiscreteChromosome) -> f64 {
    let points = chromosome.points();
    let Some(first) = points.first() else {
        return 0.0;
    };

    let positions = first.positions();
    let start = first.position();
    let mut distances: Vec<f64> = points.iter().map(DiscretePoint::distance).collect();
    distances.sort_by(f64::total_cmp);

    let mut counter_clockwise = 0.0;
    let mut clockwise = 0.0;
    for (i, (point, &distance)) in points.iter().zip(&distances).enumerate() {
        let step = i % positions;
        let actual = point.to_cartesian();
        counter_clockwise += leg(actual, polar((start + step) % positions, positions, distance));
        clockwise += leg(
            actual,
            polar((start + positions - step) % positions, positions, distance),
        );
    }

    1.0 / (1.0 + f64::min(counter_clockwise, clockwise))
}

fn polar(position: usize, positions: usize, distance: f64) -> (f64, f64) {
    let angle = TAU * position as f64 / positions as f64;
    (distance * angle.cos(), distance * angle.sin())
}

/// Worst competitive ratio of each sector against an adversarial treasure.
///
/// For every ray the adversary tries a treasure at [`MIN_TREASURE_DISTANCE`]
/// and just past each visit on that ray, as long as a farther visit on the ray
/// still covers it. Each placement costs its trace length divided by its
/// distance, with undiscovered placements costing infinity. Rays are grouped
/// into `sector_count` contiguous sectors, clamped to `[1, positions]`.
pub fn worst_case_by_sector(points: &[DiscretePoint], sector_count: usize) -> Vec<f64> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let positions = first.positions();
    let sectors = sector_count.clamp(1, positions);
    let mut worst = vec![0.0f64; sectors];

    for ray in 0..positions {
        let on_ray = |p: &DiscretePoint| p.positions() == positions && p.position() == ray;
        let farthest = points
            .iter()
            .filter(|p| on_ray(*p))
            .map(DiscretePoint::distance)
            .fold(0.0, f64::max);

        let placements = std::iter::once(MIN_TREASURE_DISTANCE).chain(
            points
                .iter()
                .filter(|p| on_ray(*p) && p.distance() > 0.0)
                .map(|p| p.distance() + WORST_CASE_EPSILON)
                .filter(|&d| d <= farthest + DISCOVERY_TOLERANCE),
        );

        let sector = ray * sectors / positions;
        for distance in placements {
            let target = polar(ray, positions, distance);
            let cost = trace_until(points, target, |p| {
                on_ray(p) && p.distance() + DISCOVERY_TOLERANCE >= distance
            }) / distance;
            worst[sector] = worst[sector].max(cost);
        }
    }

    worst
}

/// Largest entry of [`worst_case_by_sector`]; infinity for an empty route.
pub fn worst_case(points: &[DiscretePoint], sector_count: usize) -> f64 {
    worst_case_by_sector(points, sector_count)
        .into_iter()
        .reduce(f64::max)
        .unwrap_or(f64::INFINITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::GeneConstraints;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn point(position: usize, positions: usize, distance: f64) -> DiscretePoint {
        DiscretePoint::new(position, positions, distance).unwrap()
    }

    fn route(positions: usize, genes: &[(usize, f64)]) -> DiscreteChromosome {
        let constraints = Arc::new(GeneConstraints::new(positions, (0.0, 100.0)).unwrap());
        let points: Vec<_> = genes
            .iter()
            .map(|&(p, d)| point(p, positions, d))
            .collect();
        DiscreteChromosome::from_points(constraints, &points)
    }

    #[test]
    fn test_trace_length_collinear() {
        // (1, 0) -> (0, 0) -> (-1, 0) on a 2-ray grid
        let points = [point(0, 2, 1.0), point(0, 2, 0.0), point(1, 2, 1.0)];
        assert!((trace_length(&points) - 2.0).abs() < 1e-12);
        assert_eq!(trace_length(&points[..1]), 0.0);
        assert_eq!(trace_length(&[]), 0.0);
    }

    #[test]
    fn test_trace_length_to_end() {
        let points = [point(0, 4, 1.0), point(1, 4, 1.0)];
        let end = point(2, 4, 1.0);
        let expected = 2.0f64.sqrt() * 2.0;
        assert!((trace_length_to(&points, &end) - expected).abs() < 1e-12);
        assert_eq!(trace_length_to(&[], &end), 0.0);
    }

    #[test]
    fn test_unit_square_area() {
        let r = 2.0f64.sqrt() / 2.0;
        // corners of the unit square centred on the origin, rotated 45 degrees
        let square = [
            point(0, 4, r),
            point(1, 4, r),
            point(2, 4, r),
            point(3, 4, r),
        ];
        assert!((area_covered(&square) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_axis_aligned_unit_square_area() {
        // (0, 0), (1, 0), (1, 1), (0, 1) on an 8-ray grid
        let square = [
            point(0, 8, 0.0),
            point(0, 8, 1.0),
            point(1, 8, 2.0f64.sqrt()),
            point(2, 8, 1.0),
        ];
        assert!((area_covered(&square) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_area() {
        assert_eq!(area_covered(&[]), 0.0);
        assert_eq!(area_covered(&[point(0, 4, 1.0), point(1, 4, 1.0)]), 0.0);
        let collinear = [point(0, 2, 1.0), point(0, 2, 2.0), point(1, 2, 3.0)];
        assert!(area_covered(&collinear).abs() < 1e-12);
    }

    #[test]
    fn test_finds() {
        let treasure = point(1, 4, 3.0);
        assert!(finds(&treasure, &point(1, 4, 3.0)));
        assert!(finds(&treasure, &point(1, 4, 5.0)));
        assert!(finds(&treasure, &point(2, 8, 5.0)));
        assert!(!finds(&treasure, &point(1, 4, 2.5)));
        assert!(!finds(&treasure, &point(2, 4, 9.0)));
    }

    #[test]
    fn test_treasure_trace() {
        let chromosome = route(4, &[(0, 2.0), (1, 4.0), (2, 1.0), (3, 1.0)]);
        let treasure = point(1, 4, 3.0);
        // origin -> (2, 0), then straight to the treasure at (0, 3)
        let expected = 2.0 + 13.0f64.sqrt();
        assert!((treasure_trace_length(&chromosome, &treasure) - expected).abs() < 1e-12);
        assert!((competitive_ratio(&chromosome, &treasure) - expected / 3.0).abs() < 1e-12);

        let hidden = point(2, 4, 5.0);
        assert_eq!(treasure_trace_length(&chromosome, &hidden), f64::INFINITY);
    }

    #[test]
    fn test_in_between() {
        let mid = in_between(&point(0, 8, 2.0), &point(4, 8, 4.0)).unwrap();
        assert_eq!(mid.position(), 2);
        assert_eq!(mid.distance(), 3.0);

        // wraps around the shorter way
        let mid = in_between(&point(7, 8, 1.0), &point(1, 8, 1.0)).unwrap();
        assert_eq!(mid.position(), 0);

        let mid = in_between(&point(5, 8, 1.0), &point(1, 8, 1.0)).unwrap();
        assert_eq!(mid.position(), 7);

        assert!(matches!(
            in_between(&point(0, 4, 1.0), &point(0, 8, 1.0)),
            Err(RouteError::ConfigurationMismatch(_))
        ));
    }

    #[test]
    fn test_fill_inserts_waypoints() {
        let chromosome = route(8, &[(0, 2.0), (4, 2.0)]);
        let filled = fill(&chromosome).unwrap();
        let positions: Vec<_> = filled.iter().map(DiscretePoint::position).collect();
        assert_eq!(positions, vec![0, 0, 1, 2, 3, 4]);
        assert_eq!(filled[0].distance(), 0.0);
        for pair in filled[1..].windows(2) {
            assert!(circular_gap(pair[0].position(), pair[1].position(), 8) <= 1);
        }
    }

    #[test]
    fn test_area_in_sector() {
        let full = area_in_sector(TAU, 2.0, 1);
        assert!((full - std::f64::consts::PI * 4.0).abs() < 1e-12);

        let capped = area_in_sector(TAU, 2.0, 4);
        assert!((capped - full / 4.0).abs() < 1e-12);

        assert_eq!(area_in_sector(-1.0, 2.0, 1), 0.0);
        assert_eq!(area_in_sector(1.0, 2.0, 0), area_in_sector(1.0, 2.0, 1));
    }

    #[test]
    fn test_spiral_likeness_ordering() {
        let best = route(4, &[(0, 1.0), (1, 2.0), (2, 3.0), (3, 4.0)]);
        let better = route(4, &[(0, 1.0), (1, 2.0), (2, 4.0), (3, 3.0)]);
        let worst = route(4, &[(0, 4.0), (2, 1.0), (0, 3.0), (2, 2.0)]);

        let best = spiral_likeness(&best);
        let better = spiral_likeness(&better);
        let worst = spiral_likeness(&worst);

        assert!((best - 1.0).abs() < 1e-12);
        assert!(worst < better);
        assert!(better < best);
    }

    #[test]
    fn test_spiral_clockwise_counts() {
        let clockwise = route(4, &[(0, 1.0), (3, 2.0), (2, 3.0), (1, 4.0)]);
        assert!((spiral_likeness(&clockwise) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_spiral_empty() {
        let empty = route(4, &[]);
        assert_eq!(spiral_likeness(&empty), 0.0);
    }

    #[test]
    fn test_worst_case_single_sweep() {
        // one visit per ray at distance 1 on a 2-ray grid
        let chromosome = route(2, &[(0, 1.0), (1, 1.0)]);
        let points = with_origin(&chromosome.points());
        // ray 0 costs 1; ray 1 walks out 1 then across 2
        assert!((worst_case(&points, 1) - 3.0).abs() < 1e-9);

        let by_sector = worst_case_by_sector(&points, 2);
        assert_eq!(by_sector.len(), 2);
        assert!((by_sector[0] - 1.0).abs() < 1e-9);
        assert!((by_sector[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_worst_case_uncovered_ray() {
        let chromosome = route(3, &[(0, 2.0), (1, 2.0), (1, 4.0)]);
        let points = with_origin(&chromosome.points());
        assert_eq!(worst_case(&points, 1), f64::INFINITY);
        assert_eq!(worst_case(&[], 1), f64::INFINITY);
    }

    #[test]
    fn test_worst_case_sector_clamp() {
        let chromosome = route(2, &[(0, 1.0), (1, 1.0)]);
        let points = with_origin(&chromosome.points());
        assert_eq!(worst_case_by_sector(&points, 0).len(), 1);
        assert_eq!(worst_case_by_sector(&points, 10).len(), 2);
    }

    fn arb_route() -> impl Strategy<Value = DiscreteChromosome> {
        (2usize..12).prop_flat_map(|positions| {
            proptest::collection::vec((0..positions, 0.5f64..20.0), positions)
                .prop_map(move |genes| route(positions, &genes))
        })
    }

    proptest! {
        #[test]
        fn prop_trace_non_negative(chromosome in arb_route()) {
            let points = chromosome.points();
            prop_assert!(trace_length(&points) >= 0.0);
            prop_assert!(route_length(&chromosome) >= trace_length(&points) - 1e-9);
        }

        #[test]
        fn prop_area_non_negative(chromosome in arb_route()) {
            prop_assert!(area_covered(&with_origin(&chromosome.points())) >= 0.0);
        }

        #[test]
        fn prop_spiral_rotation_invariant(chromosome in arb_route(), shift in 0usize..12) {
            let positions = chromosome.slot_count();
            let rotated: Vec<(usize, f64)> = chromosome
                .points()
                .iter()
                .map(|p| ((p.position() + shift) % positions, p.distance()))
                .collect();
            let a = spiral_likeness(&chromosome);
            let b = spiral_likeness(&route(positions, &rotated));
            prop_assert!((a - b).abs() < 1e-9);
            prop_assert!(a > 0.0 && a <= 1.0);
        }

        #[test]
        fn prop_fill_keeps_route(chromosome in arb_route()) {
            let filled = fill(&chromosome).unwrap();
            prop_assert!(filled.len() > chromosome.len());
            prop_assert!(filled.ends_with(&chromosome.points()[chromosome.len() - 1..]));
        }
    }
}
