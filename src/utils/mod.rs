use std::f64::consts::PI;

/// Useful enumerations for selection and matching configuration.
pub mod enums;
/// Three- and four-vector types with the usual kinematic accessors.
pub mod vectors;

/// Wrap an azimuthal angle difference into the interval `(-π, π]`.
pub fn delta_phi(phi_a: f64, phi_b: f64) -> f64 {
    let mut dphi = phi_a - phi_b;
    while dphi > PI {
        dphi -= 2.0 * PI;
    }
    while dphi <= -PI {
        dphi += 2.0 * PI;
    }
    dphi
}

/// The angular distance `ΔR = sqrt(Δη² + Δφ²)` between two directions in
/// `(η, φ)` space, with `Δφ` wrapped into `(-π, π]`.
pub fn delta_r(eta_a: f64, phi_a: f64, eta_b: f64, phi_b: f64) -> f64 {
    let deta = eta_a - eta_b;
    let dphi = delta_phi(phi_a, phi_b);
    (deta * deta + dphi * dphi).sqrt()
}
