use auto_ops::{impl_op_ex, impl_op_ex_commutative};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn with_mass(&self, mass: f64) -> Vec4 {
        let e = (mass * mass + self.mag2()).sqrt();
        Vec4::new(self.x, self.y, self.z, e)
    }

    pub fn with_energy(&self, energy: f64) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, energy)
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn mag2(&self) -> f64 {
        self.dot(self)
    }

    pub fn mag(&self) -> f64 {
        self.mag2().sqrt()
    }

    pub fn costheta(&self) -> f64 {
        self.z / self.mag()
    }

    pub fn theta(&self) -> f64 {
        self.costheta().acos()
    }

    pub fn phi(&self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn pt(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Pseudorapidity, `η = asinh(z / pT)`. Diverges for momenta along the
    /// beam axis.
    pub fn eta(&self) -> f64 {
        (self.z / self.pt()).asinh()
    }

    pub fn unit(&self) -> Self {
        let mag = self.mag();
        Self::new(self.x / mag, self.y / mag, self.z / mag)
    }
}

impl_op_ex!(+ |a: &Vec3, b: &Vec3| -> Vec3 { Vec3::new(a.x + b.x, a.y + b.y, a.z + b.z) });
impl_op_ex!(-|a: &Vec3, b: &Vec3| -> Vec3 { Vec3::new(a.x - b.x, a.y - b.y, a.z - b.z) });
impl_op_ex!(-|a: &Vec3| -> Vec3 { Vec3::new(-a.x, -a.y, -a.z) });
impl_op_ex_commutative!(*|a: &Vec3, b: &f64| -> Vec3 { Vec3::new(a.x * b, a.y * b, a.z * b) });
impl_op_ex!(/ |a: &Vec3, b: &f64| -> Vec3 { Vec3::new(a.x / b, a.y / b, a.z / b) });

/// A four-momentum in `(px, py, pz, E)` with the metric `(-,-,-,+)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub e: f64,
}

impl Vec4 {
    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Build a four-momentum from collider coordinates `(pT, η, φ)` and an
    /// invariant mass.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        Vec3::new(pt * phi.cos(), pt * phi.sin(), pt * eta.sinh()).with_mass(mass)
    }

    pub fn vec3(&self) -> Vec3 {
        Vec3::new(self.px, self.py, self.pz)
    }

    pub fn beta(&self) -> Vec3 {
        self.vec3() / self.e
    }

    pub fn gamma(&self) -> f64 {
        let e2 = self.e * self.e;
        self.e / (e2 - self.vec3().mag2()).sqrt()
    }

    pub fn mag2(&self) -> f64 {
        self.e * self.e - self.vec3().mag2()
    }

    pub fn mag(&self) -> f64 {
        self.mag2().sqrt()
    }

    pub fn pt(&self) -> f64 {
        self.vec3().pt()
    }

    pub fn eta(&self) -> f64 {
        self.vec3().eta()
    }

    pub fn phi(&self) -> f64 {
        self.vec3().phi()
    }

    pub fn theta(&self) -> f64 {
        self.vec3().theta()
    }

    pub fn boost(&self, beta: &Vec3) -> Self {
        let b2 = beta.dot(beta);
        let gamma = 1.0 / (1.0 - b2).sqrt();
        let p3 = self.vec3()
            + beta * ((gamma - 1.0) * self.vec3().dot(beta) / b2 + gamma * self.e);
        Self::new(p3.x, p3.y, p3.z, gamma * (self.e + beta.dot(&self.vec3())))
    }
}

impl_op_ex!(+ |a: &Vec4, b: &Vec4| -> Vec4 {
    Vec4::new(a.px + b.px, a.py + b.py, a.pz + b.pz, a.e + b.e)
});
impl_op_ex!(-|a: &Vec4, b: &Vec4| -> Vec4 {
    Vec4::new(a.px - b.px, a.py - b.py, a.pz - b.pz, a.e - b.e)
});
impl_op_ex!(-|a: &Vec4| -> Vec4 { Vec4::new(-a.px, -a.py, -a.pz, -a.e) });

impl std::iter::Sum for Vec4 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Vec4::default(), |total, p4| total + p4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_three_to_four_momentum_conversion() {
        let p3 = Vec3::new(1.0, 2.0, 3.0);
        let target = Vec4::new(1.0, 2.0, 3.0, 10.0);
        let from_mass = p3.with_mass(target.mag());
        let from_energy = p3.with_energy(target.e);
        assert_relative_eq!(from_mass.e, target.e);
        assert_relative_eq!(from_energy.e, target.e);
        assert_relative_eq!(from_mass.px, target.px);
        assert_relative_eq!(from_mass.py, target.py);
        assert_relative_eq!(from_mass.pz, target.pz);
    }

    #[test]
    fn test_four_momentum_basics() {
        let p = Vec4::new(3.0, 4.0, 5.0, 10.0);
        assert_relative_eq!(p.mag2(), 50.0);
        assert_relative_eq!(p.mag(), 50.0_f64.sqrt());
        assert_relative_eq!(p.gamma(), 2.0_f64.sqrt());
        assert_relative_eq!(p.beta().x, 0.3);
        assert_relative_eq!(p.beta().y, 0.4);
        assert_relative_eq!(p.beta().z, 0.5);
        assert_relative_eq!(p.pt(), 5.0);
        assert_relative_eq!(p.phi(), 4.0_f64.atan2(3.0));
    }

    #[test]
    fn test_three_momentum_basics() {
        let p = Vec3::new(3.0, 4.0, 5.0);
        let q = Vec3::new(1.2, -3.4, 7.6);
        assert_relative_eq!(p.mag2(), 50.0);
        assert_relative_eq!(p.costheta(), 5.0 / 50.0_f64.sqrt());
        assert_relative_eq!(p.theta(), (5.0 / 50.0_f64.sqrt()).acos());
        let u = p.unit();
        assert_relative_eq!(u.mag(), 1.0);
        let c = p.cross(&q);
        assert_relative_eq!(c.x, 47.4);
        assert_relative_eq!(c.y, -16.8);
        assert_relative_eq!(c.z, -15.0);
    }

    #[test]
    fn test_collider_coordinates_roundtrip() {
        let p = Vec4::from_pt_eta_phi_m(25.0, -1.2, 2.5, 0.139);
        assert_relative_eq!(p.pt(), 25.0, epsilon = 1e-12);
        assert_relative_eq!(p.eta(), -1.2, epsilon = 1e-12);
        assert_relative_eq!(p.phi(), 2.5, epsilon = 1e-12);
        assert_relative_eq!(p.mag(), 0.139, epsilon = 1e-9);
    }

    #[test]
    fn test_eta_matches_log_form() {
        let p = Vec3::new(3.0, 4.0, 5.0);
        let expected = -((p.theta() / 2.0).tan().ln());
        assert_relative_eq!(p.eta(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_boost_com() {
        let p = Vec4::new(3.0, 4.0, 5.0, 10.0);
        let rest = p.boost(&(-p.beta()));
        assert_relative_eq!(rest.px, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rest.py, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rest.pz, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rest.e, p.mag(), epsilon = 1e-12);
    }

    #[test]
    fn test_boost() {
        let pa = Vec4::new(3.0, 4.0, 5.0, 10.0);
        let pb = Vec4::new(3.4, 2.3, 1.2, 9.0);
        let boosted = pa.boost(&(-pb.beta()));
        assert_relative_eq!(boosted.e, 8.157632144622882);
        assert_relative_eq!(boosted.px, -0.6489200627053444);
        assert_relative_eq!(boosted.py, 1.5316128987581492);
        assert_relative_eq!(boosted.pz, 3.712145860221643);
    }

    #[test]
    fn test_vec4_sum() {
        let total: Vec4 = [
            Vec4::new(1.0, 2.0, 3.0, 4.0),
            Vec4::new(0.5, -1.0, 2.0, 3.0),
        ]
        .into_iter()
        .sum();
        assert_relative_eq!(total.px, 1.5);
        assert_relative_eq!(total.py, 1.0);
        assert_relative_eq!(total.pz, 5.0);
        assert_relative_eq!(total.e, 7.0);
    }
}
