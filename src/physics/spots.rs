// src/physics/spots.rs
// Rasterizes complex scattering amplitudes onto a 2D detector grid.

use super::error::{KSpaceError, Result};
use nalgebra::Vector3;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// How a single diffraction spot is drawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Spot {
    /// All intensity on the nearest pixel
    Delta,
    /// Intensity spread as exp(-r^2 / 2 sigma^2) out to 3 sigma
    Gaussian { sigma: f64 },
}

impl Default for Spot {
    fn default() -> Self {
        Spot::Delta
    }
}

/// Intensity image on a regular grid covering `[xmin, xmax] x [ymin, ymax]`
///
/// Pixel `(i, j)` sits at `(xmin + i dx, ymin + j dy)`; storage is x-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffractionImage {
    shape: (usize, usize),
    extent: [f64; 4],
    dx: f64,
    dy: f64,
    pixels: Vec<f64>,
}

impl DiffractionImage {
    pub fn new(shape: (usize, usize), extent: [f64; 4]) -> Result<Self> {
        let (nx, ny) = shape;
        if nx < 2 || ny < 2 {
            return Err(KSpaceError::DegenerateGeometry(format!(
                "image needs at least 2x2 pixels, got {}x{}",
                nx, ny
            )));
        }
        let width = extent[1] - extent[0];
        let height = extent[3] - extent[2];
        if !(width > 0.0 && height > 0.0) {
            return Err(KSpaceError::DegenerateGeometry(format!(
                "image extent {:?} has no area",
                extent
            )));
        }
        Ok(Self {
            shape,
            extent,
            dx: width / (nx - 1) as f64,
            dy: height / (ny - 1) as f64,
            pixels: vec![0.0; nx * ny],
        })
    }

    /// Draw one spot per K point at its (x, y) projection
    pub fn render(
        shape: (usize, usize),
        extent: [f64; 4],
        k_points: &[Vector3<f64>],
        amplitudes: &[Complex64],
        spot: Spot,
    ) -> Result<Self> {
        if k_points.len() != amplitudes.len() {
            return Err(KSpaceError::ShapeMismatch(format!(
                "{} K points but {} amplitudes",
                k_points.len(),
                amplitudes.len()
            )));
        }
        let mut image = Self::new(shape, extent)?;
        for (k, c) in k_points.iter().zip(amplitudes) {
            image.add_spot(k.x, k.y, *c, spot)?;
        }
        Ok(image)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn extent(&self) -> [f64; 4] {
        self.extent
    }

    pub fn pixels(&self) -> &[f64] {
        &self.pixels
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        (i < self.shape.0 && j < self.shape.1).then(|| self.pixels[i * self.shape.1 + j])
    }

    pub fn total(&self) -> f64 {
        self.pixels.iter().sum()
    }

    fn nearest(&self, x: f64, y: f64) -> (i64, i64) {
        (
            ((x - self.extent[0]) / self.dx).round() as i64,
            ((y - self.extent[2]) / self.dy).round() as i64,
        )
    }

    fn deposit(&mut self, i: i64, j: i64, value: f64) {
        let (nx, ny) = self.shape;
        if i >= 0 && j >= 0 && (i as usize) < nx && (j as usize) < ny {
            self.pixels[i as usize * ny + j as usize] += value;
        }
    }

    /// Add the intensity |c|^2 centered at (x, y)
    pub fn add_spot(&mut self, x: f64, y: f64, c: Complex64, spot: Spot) -> Result<()> {
        let intensity = c.norm_sqr();
        let (ci, cj) = self.nearest(x, y);
        match spot {
            Spot::Delta => self.deposit(ci, cj, intensity),
            Spot::Gaussian { sigma } => {
                if !(sigma > 0.0 && sigma.is_finite()) {
                    return Err(KSpaceError::DegenerateGeometry(format!(
                        "gaussian spot width {}",
                        sigma
                    )));
                }
                let hx = (3.0 * sigma / self.dx) as i64 + 1;
                let hy = (3.0 * sigma / self.dy) as i64 + 1;
                let two_s2 = 2.0 * sigma * sigma;
                for i in ci - hx..=ci + hx {
                    let px = self.extent[0] + i as f64 * self.dx;
                    for j in cj - hy..=cj + hy {
                        let py = self.extent[2] + j as f64 * self.dy;
                        let r2 = (px - x).powi(2) + (py - y).powi(2);
                        self.deposit(i, j, intensity * (-r2 / two_s2).exp());
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_spot_hits_nearest_pixel() {
        let mut img = DiffractionImage::new((5, 5), [-1.0, 1.0, -1.0, 1.0]).unwrap();
        img.add_spot(0.45, -0.05, Complex64::new(0.0, 2.0), Spot::Delta).unwrap();
        assert_eq!(img.get(3, 2), Some(4.0));
        assert_eq!(img.total(), 4.0);
    }

    #[test]
    fn test_spot_outside_extent_is_dropped() {
        let mut img = DiffractionImage::new((5, 5), [-1.0, 1.0, -1.0, 1.0]).unwrap();
        img.add_spot(3.0, 0.0, Complex64::new(1.0, 0.0), Spot::Delta).unwrap();
        assert_eq!(img.total(), 0.0);
    }

    #[test]
    fn test_gaussian_spot_is_symmetric_and_peaked() {
        let mut img = DiffractionImage::new((21, 21), [-1.0, 1.0, -1.0, 1.0]).unwrap();
        img.add_spot(0.0, 0.0, Complex64::new(1.0, 0.0), Spot::Gaussian { sigma: 0.2 }).unwrap();
        let center = img.get(10, 10).unwrap();
        assert!((center - 1.0).abs() < 1e-12);
        assert!((img.get(12, 10).unwrap() - img.get(8, 10).unwrap()).abs() < 1e-12);
        assert!((img.get(10, 13).unwrap() - img.get(13, 10).unwrap()).abs() < 1e-12);
        assert!(img.get(12, 10).unwrap() < center);
        // 3 sigma = 0.6 -> cutoff window of 7 pixels each side
        assert_eq!(img.get(0, 10), Some(0.0));
    }

    #[test]
    fn test_gaussian_clipped_at_edge() {
        let mut img = DiffractionImage::new((11, 11), [0.0, 1.0, 0.0, 1.0]).unwrap();
        img.add_spot(0.0, 0.0, Complex64::new(1.0, 0.0), Spot::Gaussian { sigma: 0.1 }).unwrap();
        assert!((img.get(0, 0).unwrap() - 1.0).abs() < 1e-12);
        assert!(img.total() > 1.0);
    }

    #[test]
    fn test_bad_inputs() {
        assert!(DiffractionImage::new((1, 5), [0.0, 1.0, 0.0, 1.0]).is_err());
        assert!(DiffractionImage::new((5, 5), [0.0, 0.0, 0.0, 1.0]).is_err());

        let mut img = DiffractionImage::new((5, 5), [0.0, 1.0, 0.0, 1.0]).unwrap();
        let bad = img.add_spot(0.5, 0.5, Complex64::new(1.0, 0.0), Spot::Gaussian { sigma: 0.0 });
        assert!(matches!(bad, Err(KSpaceError::DegenerateGeometry(_))));

        let mismatch = DiffractionImage::render(
            (5, 5),
            [0.0, 1.0, 0.0, 1.0],
            &[Vector3::zeros()],
            &[],
            Spot::Delta,
        );
        assert!(matches!(mismatch, Err(KSpaceError::ShapeMismatch(_))));
    }

    #[test]
    fn test_spot_json() {
        let s: Spot = serde_json::from_str(r#"{"kind":"Gaussian","sigma":0.5}"#).unwrap();
        assert_eq!(s, Spot::Gaussian { sigma: 0.5 });
    }
}
