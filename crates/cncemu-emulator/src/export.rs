//! SVG and JSON output of a traced scene

use std::fmt::Write;
use std::path::Path;

use cncemu_core::{Bounds, Error, Result};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::emulator::VirtualCnc;
use crate::scene::{Keyframe, SceneRecorder};

/// Margin around the drawing, as a share of its larger side
const SVG_MARGIN: f64 = 0.05;

fn bounds_of(points: &[DVec3]) -> Option<Bounds> {
    let mut bounds = Bounds::new();
    for p in points {
        bounds.update(p.x, p.y, p.z);
    }
    bounds.is_valid().then_some(bounds)
}

/// Top view of a polyline as a standalone SVG document.
///
/// SVG's Y axis points down, so Y is negated to keep the drawing upright.
pub fn polyline_to_svg(points: &[DVec3]) -> String {
    let (min_x, min_y, width, height) = match bounds_of(points) {
        Some(b) => {
            let (w, h, _) = b.size().unwrap_or((0.0, 0.0, 0.0));
            let margin = (w.max(h) * SVG_MARGIN).max(1e-6);
            (
                b.min_x - margin,
                -b.max_y - margin,
                w + 2.0 * margin,
                h + 2.0 * margin,
            )
        }
        None => (0.0, 0.0, 1.0, 1.0),
    };
    let stroke = (width.max(height) / 500.0).max(1e-6);

    let mut data = String::new();
    for (i, p) in points.iter().enumerate() {
        let command = if i == 0 { 'M' } else { 'L' };
        let _ = write!(data, "{} {:.4} {:.4} ", command, p.x, 0.0 - p.y);
    }

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{:.4} {:.4} {:.4} {:.4}">"#,
        min_x, min_y, width, height
    );
    if !data.is_empty() {
        let _ = writeln!(
            svg,
            r#"  <path d="{}" fill="none" stroke="black" stroke-width="{:.6}"/>"#,
            data.trim_end(),
            stroke
        );
    }
    svg.push_str("</svg>\n");
    svg
}

/// Everything a traced scene holds, for dumping as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    /// Name of the marker object the keyframes belong to
    pub marker: String,
    pub polyline: Vec<DVec3>,
    pub keyframes: Vec<Keyframe>,
    /// Extent of the polyline and keyframe locations
    pub bounds: Option<Bounds>,
    pub offset: DVec3,
    pub message: String,
    /// Share of stock left, when stock simulation is enabled
    pub remaining_stock: Option<f64>,
}

impl SceneSnapshot {
    pub fn capture(cnc: &VirtualCnc<SceneRecorder>) -> Self {
        let scene = cnc.scene();
        let polyline = scene.polyline().to_vec();
        let keyframes = scene.keyframes().to_vec();

        let locations: Vec<DVec3> = keyframes.iter().map(|k| k.location).collect();
        let bounds = match (bounds_of(&polyline), bounds_of(&locations)) {
            (Some(mut drawn), Some(moved)) => {
                drawn.union(&moved);
                Some(drawn)
            }
            (drawn, moved) => drawn.or(moved),
        };

        Self {
            marker: scene.marker_name().to_string(),
            bounds,
            polyline,
            keyframes,
            offset: cnc.offset(),
            message: cnc.message().to_string(),
            remaining_stock: cnc.stock().map(|s| s.remaining_fraction()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::other(format!("Failed to serialize scene: {}", e)))
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        debug!("Wrote scene snapshot to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_flips_y() {
        let svg = polyline_to_svg(&[DVec3::ZERO, DVec3::new(1.0, 2.0, 0.0)]);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"d="M 0.0000 0.0000 L 1.0000 -2.0000""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_empty_svg_has_no_path() {
        let svg = polyline_to_svg(&[]);
        assert!(!svg.contains("<path"));
        assert!(svg.contains(r#"viewBox="0.0000 0.0000 1.0000 1.0000""#));
    }

    #[test]
    fn test_bounds_of() {
        assert!(bounds_of(&[]).is_none());
        let b = bounds_of(&[DVec3::new(-1.0, 0.0, 2.0), DVec3::new(3.0, 1.0, 0.0)]).unwrap();
        assert_eq!((b.min_x, b.max_x, b.min_z, b.max_z), (-1.0, 3.0, 0.0, 2.0));
    }
}
