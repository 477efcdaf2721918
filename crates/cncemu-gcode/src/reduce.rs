//! Path simplification
//!
//! Merges runs of contiguous, nearly collinear line segments into single
//! lines. Arcs, dwells and tool changes break a run and pass through.

use glam::DVec3;
use tracing::debug;

use crate::path::{Path, Segment};

const JOIN_EPSILON: f64 = 1e-9;

/// Merge line runs whose interior vertices all lie within `tolerance` of
/// the merged segment. Merged paths keep the timing of the run they replace.
pub fn reduce_paths(paths: &[Path], tolerance: f64) -> Vec<Path> {
    let mut reduced = Vec::with_capacity(paths.len());
    let mut run: Vec<&Path> = Vec::new();

    for path in paths {
        if !matches!(path.segment, Segment::Line { .. }) {
            flush(&mut run, &mut reduced);
            reduced.push(path.clone());
            continue;
        }

        if !run.is_empty() && !can_extend(&run, path, tolerance) {
            flush(&mut run, &mut reduced);
        }
        run.push(path);
    }
    flush(&mut run, &mut reduced);

    debug!(
        "Reduced {} paths to {} (tolerance {})",
        paths.len(),
        reduced.len(),
        tolerance
    );
    reduced
}

fn line_points(path: &Path) -> Option<(DVec3, DVec3, bool)> {
    match path.segment {
        Segment::Line { start, end, rapid } => Some((start, end, rapid)),
        _ => None,
    }
}

fn can_extend(run: &[&Path], next: &Path, tolerance: f64) -> bool {
    let (Some(first), Some(last)) = (run.first(), run.last()) else {
        return false;
    };
    let (Some((start, _, rapid)), Some((_, last_end, _)), Some((next_start, next_end, next_rapid))) =
        (line_points(first), line_points(last), line_points(next))
    else {
        return false;
    };

    if rapid != next_rapid
        || first.spindle_on != next.spindle_on
        || (first.feed_rate - next.feed_rate).abs() > JOIN_EPSILON
        || last_end.distance(next_start) > JOIN_EPSILON
    {
        return false;
    }

    run.iter()
        .filter_map(|p| p.end_point())
        .all(|vertex| distance_to_segment(vertex, start, next_end) <= tolerance)
}

fn flush(run: &mut Vec<&Path>, out: &mut Vec<Path>) {
    match run.as_slice() {
        [] => {}
        [single] => out.push((*single).clone()),
        [first, .., last] => {
            let mut merged = (*first).clone();
            if let (Some((start, _, rapid)), Some(end)) = (line_points(first), last.end_point()) {
                merged.segment = Segment::Line { start, end, rapid };
            }
            merged.length = run.iter().map(|p| p.length).sum();
            merged.duration = run.iter().map(|p| p.duration).sum();
            out.push(merged);
        }
    }
    run.clear();
}

/// Shortest distance from `point` to the segment `a`-`b`
pub fn distance_to_segment(point: DVec3, a: DVec3, b: DVec3) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < JOIN_EPSILON * JOIN_EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(start: DVec3, end: DVec3, statement: usize) -> Path {
        let length = start.distance(end);
        Path {
            segment: Segment::Line {
                start,
                end,
                rapid: false,
            },
            statement,
            line_number: statement + 1,
            spindle_on: true,
            feed_rate: 10.0,
            length,
            start_time: statement as f64,
            duration: length / 10.0,
        }
    }

    #[test]
    fn test_collinear_lines_merge() {
        let paths = vec![
            line(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0), 0),
            line(DVec3::new(1.0, 0.0, 0.0), DVec3::new(2.0, 0.0005, 0.0), 1),
            line(DVec3::new(2.0, 0.0005, 0.0), DVec3::new(3.0, 0.0, 0.0), 2),
        ];
        let reduced = reduce_paths(&paths, 0.001);
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].start_point(), Some(DVec3::ZERO));
        assert_eq!(reduced[0].end_point(), Some(DVec3::new(3.0, 0.0, 0.0)));
        let total: f64 = paths.iter().map(|p| p.duration).sum();
        assert!((reduced[0].duration - total).abs() < 1e-12);
    }

    #[test]
    fn test_corner_breaks_run() {
        let paths = vec![
            line(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0), 0),
            line(DVec3::new(1.0, 0.0, 0.0), DVec3::new(1.0, 1.0, 0.0), 1),
        ];
        let reduced = reduce_paths(&paths, 0.01);
        assert_eq!(reduced, paths);
    }

    #[test]
    fn test_non_lines_pass_through() {
        let mut dwell = line(DVec3::ZERO, DVec3::ZERO, 1);
        dwell.segment = Segment::Dwell { seconds: 1.0 };
        let paths = vec![
            line(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0), 0),
            dwell.clone(),
            line(DVec3::new(1.0, 0.0, 0.0), DVec3::new(2.0, 0.0, 0.0), 2),
        ];
        let reduced = reduce_paths(&paths, 0.01);
        assert_eq!(reduced.len(), 3);
        assert_eq!(reduced[1], dwell);
    }

    #[test]
    fn test_distance_to_segment() {
        let a = DVec3::ZERO;
        let b = DVec3::new(2.0, 0.0, 0.0);
        assert_eq!(distance_to_segment(DVec3::new(1.0, 1.0, 0.0), a, b), 1.0);
        assert_eq!(distance_to_segment(DVec3::new(3.0, 0.0, 0.0), a, b), 1.0);
        assert_eq!(distance_to_segment(DVec3::new(0.0, 0.0, 2.0), a, a), 2.0);
    }
}
