// src/physics/form_factor/sphere.rs
use std::f64::consts::PI;

/// Below this value of qR the series expansion is used
const SMALL_QR: f64 = 1e-2;

/// Form factor of a uniform sphere of radius `radius` at wave number `q`
///
/// F(q) = 4pi (sin(qR) - qR cos(qR)) / q^3, with F(0) = 4/3 pi R^3.
pub fn sphere_form_factor(q: f64, radius: f64) -> f64 {
    let volume = 4.0 / 3.0 * PI * radius.powi(3);
    let x = q.abs() * radius;
    if x < SMALL_QR {
        // 3 (sin x - x cos x) / x^3 = 1 - x^2/10 + x^4/280 - ...
        let x2 = x * x;
        return volume * (1.0 - x2 / 10.0 + x2 * x2 / 280.0);
    }
    volume * 3.0 * (x.sin() - x * x.cos()) / x.powi(3)
}
