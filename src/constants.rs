//! # Constants and type definitions for pandelfit
//!
//! This module centralizes the **physical constants**, **fit defaults**, and **common type
//! aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Speed of light and refractive indices of the medium (phase and group)
//! - Default optical properties used by the Convoluted Pandel pdf
//! - Validity rectangle of the `(ksi, tres)` plane
//! - Unit aliases (meters, nanoseconds, radians, decibels) and identifiers
//!
//! All distances are in **meters** and all times in **nanoseconds**.

use std::f64::consts::PI;

// -------------------------------------------------------------------------------------------------
// Physical constants
// -------------------------------------------------------------------------------------------------

/// Speed of light in vacuum in meters per nanosecond
pub const C_VACUUM: f64 = 0.299792458;

/// Phase refractive index (c/v_phase) of ice
pub const N_PHASE: f64 = 1.31768387;

/// Group refractive index (c/v_group) of ice
pub const N_GROUP: f64 = 1.35075806;

/// Light speed in ice for the detected photons (group velocity), m/ns
pub const C_ICE: f64 = C_VACUUM / N_GROUP;

/// sqrt(2π)
pub const SQRT_2PI: f64 = 2.506_628_274_631_000_2;

/// π/2
pub const HALF_PI: f64 = PI / 2.0;

// -------------------------------------------------------------------------------------------------
// Medium and detector defaults
// -------------------------------------------------------------------------------------------------

/// Light scattering length in ice (m)
pub const SCATTERING_LENGTH: Meter = 33.3;

/// Light absorption length in ice (m)
pub const ABSORPTION_LENGTH: Meter = 98.0;

/// Pandel time scale parameter (ns)
pub const PANDEL_TAU: Nanosecond = 557.0;

/// Assumed PMT timing jitter (ns)
pub const TIME_JITTER: Nanosecond = 10.0;

/// Minimum number of hits needed to over-determine the 6 track parameters
pub const MIN_FIT_HITS: usize = 7;

/// Number of free track parameters (x, y, z, theta, phi, t0)
pub const N_TRACK_PARAMS: usize = 6;

// -------------------------------------------------------------------------------------------------
// Validity rectangle of the Convoluted Pandel evaluation
// -------------------------------------------------------------------------------------------------

/// Upper edge of the `ksi` axis
pub const KSI_MAX: f64 = 50.0;

/// Upper edge of the time residual axis (ns)
pub const TRES_MAX: Nanosecond = 3500.0;

/// Lower edge of the time residual axis, in units of the timing jitter
pub const TRES_MIN_SIGMAS: f64 = 25.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Distance in meters
pub type Meter = f64;
/// Time in nanoseconds
pub type Nanosecond = f64;
/// Angle in radians
pub type Radian = f64;
/// Plausibility value on a decibel scale
pub type Decibel = f64;

/// Index of a hit inside its event
pub type HitId = usize;
/// Identifier of a track inside its event
pub type TrackId = u32;
