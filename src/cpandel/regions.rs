//! Closed form and asymptotic expressions of the Gauss Convoluted Pandel density.
//!
//! Each function evaluates the density in one region of the `(ksi, tres)` plane without
//! checking that the point belongs to it; region selection lives in the parent module.

use crate::constants::SQRT_2PI;

use super::special::{gamma, kummer_m};

/// Medium-dependent quantities shared by all regions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Kernel {
    /// Inverse characteristic time `1/tau + c_ice/labs` (1/ns)
    pub rho: f64,
    /// Gaussian time jitter (ns)
    pub sigma: f64,
}

impl Kernel {
    #[inline]
    fn eta(&self, tres: f64) -> f64 {
        self.rho * self.sigma - tres / self.sigma
    }

    #[inline]
    fn gauss_exponent(&self, tres: f64) -> f64 {
        -tres * tres / (2.0 * self.sigma * self.sigma)
    }

    /// Pure Gaussian of the time residual, used when the hit sits on the track.
    pub fn zero_distance(&self, tres: f64) -> f64 {
        self.gauss_exponent(tres).exp() / (self.sigma * SQRT_2PI)
    }

    /// Exact expression in terms of Kummer's confluent hypergeometric function.
    pub fn exact(&self, ksi: f64, tres: f64) -> f64 {
        let (rho, sigma) = (self.rho, self.sigma);
        let eta = self.eta(tres);
        let x = eta * eta / 2.0;

        let prefactor = rho.powf(ksi) * sigma.powf(ksi - 1.0) * self.gauss_exponent(tres).exp()
            / 2f64.powf(0.5 * (1.0 + ksi));
        let even = kummer_m(ksi / 2.0, 0.5, x) / gamma((ksi + 1.0) / 2.0);
        let odd = 2f64.sqrt() * eta * kummer_m((ksi + 1.0) / 2.0, 1.5, x) / gamma(ksi / 2.0);

        prefactor * (even - odd)
    }

    /// Large positive residuals at small distance: the Pandel function with a Gaussian smear factor.
    pub fn late_tail(&self, ksi: f64, tres: f64) -> f64 {
        let rho = self.rho;
        let pandel = rho.powf(ksi) * tres.powf(ksi - 1.0) * (-rho * tres).exp() / gamma(ksi);
        (rho * rho * self.sigma * self.sigma / 2.0).exp() * pandel
    }

    /// Large negative residuals at small distance.
    pub fn early_tail(&self, ksi: f64, tres: f64) -> f64 {
        let eta = self.eta(tres);
        (self.rho * self.sigma).powf(ksi) * eta.powf(-ksi) * self.gauss_exponent(tres).exp()
            / (self.sigma * SQRT_2PI)
    }

    /// Saddle point expansion for non-negative residuals.
    pub fn asymptotic_late(&self, ksi: f64, tres: f64) -> f64 {
        let (rho, sigma) = (self.rho, self.sigma);
        let eta = self.eta(tres);
        let two_ksi_m1 = 2.0 * ksi - 1.0;
        let z = -eta / (4.0 * ksi - 2.0).sqrt();
        let k = saddle_k(z);

        let alpha = self.gauss_exponent(tres) + eta * eta / 4.0 - ksi / 2.0
            + 0.25
            + k * two_ksi_m1
            - (1.0 + z * z).ln() / 4.0
            - ksi * 2f64.ln() / 2.0
            + (ksi - 1.0) * two_ksi_m1.ln() / 2.0
            + ksi * rho.ln()
            + (ksi - 1.0) * sigma.ln();

        let (n1, n2, n3) = correction_terms(saddle_beta(z));
        let phi = 1.0 - n1 / two_ksi_m1 + n2 / two_ksi_m1.powi(2) - n3 / two_ksi_m1.powi(3);

        alpha.exp() * phi / gamma(ksi)
    }

    /// Saddle point expansion for negative residuals.
    pub fn asymptotic_early(&self, ksi: f64, tres: f64) -> f64 {
        let (rho, sigma) = (self.rho, self.sigma);
        let eta = self.eta(tres);
        let two_ksi_m1 = 2.0 * ksi - 1.0;
        let z = eta / (4.0 * ksi - 2.0).sqrt();
        let k = saddle_k(z);

        let u = (ksi / 2.0 - 0.25).exp()
            * two_ksi_m1.powf(-ksi / 2.0)
            * 2f64.powf((ksi - 1.0) / 2.0);

        let (n1, n2, n3) = correction_terms(saddle_beta(z));
        let phi = 1.0 + n1 / two_ksi_m1 + n2 / two_ksi_m1.powi(2) + n3 / two_ksi_m1.powi(3);

        let v = rho.powf(ksi) * sigma.powf(ksi - 1.0)
            * (self.gauss_exponent(tres) + eta * eta / 4.0).exp()
            / SQRT_2PI;

        v * u * phi * (-k * two_ksi_m1).exp() * (1.0 + z * z).powf(-0.25)
    }
}

#[inline]
fn saddle_k(z: f64) -> f64 {
    0.5 * (z * (1.0 + z * z).sqrt() + z.asinh())
}

#[inline]
fn saddle_beta(z: f64) -> f64 {
    0.5 * (z / (1.0 + z * z).sqrt() - 1.0)
}

/// First three correction polynomials `(n1, n2, n3)` of the saddle point series.
pub(crate) fn correction_terms(beta: f64) -> (f64, f64, f64) {
    let b = beta;
    let n1 = b * (b * (20.0 * b + 30.0) + 9.0) / 12.0;
    let n2 = b * b
        * (b * (b * (b * (6160.0 * b + 18480.0) + 19404.0) + 8028.0) + 945.0)
        / 288.0;
    let n3 = b.powi(3)
        * (b * (b * (b * (b * (b * (27_227_200.0 * b + 122_522_400.0) + 220_540_320.0)
            + 200_166_120.0)
            + 94_064_328.0)
            + 20_546_550.0)
            + 1_403_325.0)
        / 51840.0;
    (n1, n2, n3)
}
