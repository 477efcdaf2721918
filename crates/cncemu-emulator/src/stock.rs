//! Voxel stock carved by the cutter

use cncemu_core::EmulatorError;
use cncemu_settings::StockSettings;
use glam::DVec3;

const MATERIAL: u8 = 255;
const REMOVED: u8 = 0;
/// Refuse grids larger than this many voxels
const MAX_VOXELS: usize = 64 * 1024 * 1024;

/// A block of material as a voxel grid
///
/// Voxel `(x, y, z)` covers the cube starting at
/// `origin + (x, y, z) * resolution`.
#[derive(Debug, Clone)]
pub struct StockVolume {
    origin: DVec3,
    resolution: f64,
    width: usize,
    height: usize,
    depth: usize,
    voxels: Vec<u8>,
}

impl StockVolume {
    pub fn new(origin: DVec3, size: DVec3, resolution: f64) -> Result<Self, EmulatorError> {
        if resolution <= 0.0 || !resolution.is_finite() {
            return Err(EmulatorError::InvalidStock {
                reason: format!("resolution must be > 0, got {}", resolution),
            });
        }
        if size.min_element() <= 0.0 || !size.is_finite() {
            return Err(EmulatorError::InvalidStock {
                reason: format!("size must be positive, got {}", size),
            });
        }

        let cells = (size / resolution).ceil();
        let (w, h, d) = (cells.x as usize, cells.y as usize, cells.z as usize);
        let total = w
            .checked_mul(h)
            .and_then(|wh| wh.checked_mul(d))
            .filter(|&n| n <= MAX_VOXELS)
            .ok_or_else(|| EmulatorError::InvalidStock {
                reason: format!("{}x{}x{} voxels exceeds the limit of {}", w, h, d, MAX_VOXELS),
            })?;

        Ok(Self {
            origin,
            resolution,
            width: w,
            height: h,
            depth: d,
            voxels: vec![MATERIAL; total],
        })
    }

    pub fn from_settings(settings: &StockSettings) -> Result<Self, EmulatorError> {
        Self::new(
            DVec3::from_array(settings.origin),
            DVec3::from_array(settings.size),
            settings.resolution,
        )
    }

    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.width, self.height, self.depth)
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        z * self.width * self.height + y * self.width + x
    }

    pub fn has_material(&self, x: usize, y: usize, z: usize) -> bool {
        if x >= self.width || y >= self.height || z >= self.depth {
            return false;
        }
        self.voxels[self.index(x, y, z)] == MATERIAL
    }

    /// Restore every voxel
    pub fn refill(&mut self) {
        self.voxels.fill(MATERIAL);
    }

    /// Remove every voxel whose centre lies within `radius` of `center`.
    /// Returns the number of voxels removed.
    pub fn carve_sphere(&mut self, center: DVec3, radius: f64) -> usize {
        if radius <= 0.0 {
            return 0;
        }
        // Grid coordinates, with voxel centres at integer + 0.5
        let c = (center - self.origin) / self.resolution;
        let r = radius / self.resolution;
        let r_sq = r * r;

        let range = |c: f64, len: usize| -> Option<(usize, usize)> {
            let lo = (c - r - 0.5).ceil().max(0.0);
            let hi = (c + r - 0.5).floor().min(len as f64 - 1.0);
            (lo <= hi).then(|| (lo as usize, hi as usize))
        };
        let (Some((min_x, max_x)), Some((min_y, max_y)), Some((min_z, max_z))) = (
            range(c.x, self.width),
            range(c.y, self.height),
            range(c.z, self.depth),
        ) else {
            return 0;
        };

        let mut removed = 0;
        for z in min_z..=max_z {
            let dz = z as f64 + 0.5 - c.z;
            for y in min_y..=max_y {
                let dy = y as f64 + 0.5 - c.y;
                for x in min_x..=max_x {
                    let dx = x as f64 + 0.5 - c.x;
                    if dx * dx + dy * dy + dz * dz <= r_sq {
                        let idx = self.index(x, y, z);
                        if self.voxels[idx] == MATERIAL {
                            self.voxels[idx] = REMOVED;
                            removed += 1;
                        }
                    }
                }
            }
        }
        removed
    }

    /// Sweep a ball of `radius` from `from` to `to`
    pub fn carve_segment(&mut self, from: DVec3, to: DVec3, radius: f64) -> usize {
        let steps = (from.distance(to) / (self.resolution * 0.5)).ceil().max(1.0) as usize;
        (0..=steps)
            .map(|i| self.carve_sphere(from.lerp(to, i as f64 / steps as f64), radius))
            .sum()
    }

    /// Share of the original material still present, 0..=1
    pub fn remaining_fraction(&self) -> f64 {
        if self.voxels.is_empty() {
            return 0.0;
        }
        let present = self.voxels.iter().filter(|&&v| v == MATERIAL).count();
        present as f64 / self.voxels.len() as f64
    }

    /// Top of the material in the column containing `(x, y)`.
    ///
    /// Returns `None` outside the block and the block's bottom for a column
    /// that has been cut through.
    pub fn surface_height(&self, x: f64, y: f64) -> Option<f64> {
        let gx = ((x - self.origin.x) / self.resolution).floor();
        let gy = ((y - self.origin.y) / self.resolution).floor();
        if gx < 0.0 || gy < 0.0 || gx >= self.width as f64 || gy >= self.height as f64 {
            return None;
        }
        let (gx, gy) = (gx as usize, gy as usize);

        let top = (0..self.depth).rev().find(|&z| self.has_material(gx, gy, z));
        Some(match top {
            Some(z) => self.origin.z + (z + 1) as f64 * self.resolution,
            None => self.origin.z,
        })
    }
}
