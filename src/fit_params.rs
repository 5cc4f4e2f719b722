//! # Track fit configuration
//!
//! This module defines the [`FitParams`] configuration struct and its builder, which
//! control how the [`Chi2Fitter`](crate::chi2_fitter::Chi2Fitter) selects hits, which
//! first guess tracks it refines, what it minimizes and how the fitted tracks are scored.
//!
//! ## Purpose
//!
//! A single [`FitParams`] value is set up before a batch of events and is read-only while
//! fitting. It allows you to:
//!
//! - Choose the **hit selection mode** ([`HitSelection`]) used to build the candidate hit set,
//! - Switch the **group velocity correction** of the Cherenkov cone on or off,
//! - Set the **penalty** (dB) added to hits outside the Convoluted Pandel validity rectangle,
//! - Register the **first guess track classes** to refine ([`FitParamsBuilder::use_tracks`]),
//! - Name, charge and **objective** of the produced tracks,
//! - Tune the **medium** optical properties and the minimizer iteration limit and tolerance.
//!
//! ## Example
//!
//! ```rust
//! use pandelfit::fit_params::{FitParams, HitSelection};
//!
//! let params = FitParams::builder()
//!     .hit_selection(HitSelection::AssociatedOnly)
//!     .penalty(2.0)
//!     .use_tracks("IceDwalkI", None)
//!     .track_name("Chi2Refit")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(params.first_guess_selections().len(), 1);
//! ```
//!
//! ## See also
//!
//! * [`crate::chi2_fitter::Chi2Fitter`] – consumer of this configuration.
//! * [`crate::cpandel::MediumParams`] – optical properties of the medium.

use std::cmp::Ordering::Greater;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    constants::Decibel,
    cpandel::MediumParams,
    event::ProcessorRecord,
    minimizer::simplex::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE},
    pandelfit_errors::PandelFitError,
};

/// Name under which the fitter records its settings in each event.
pub const PROCESSOR_NAME: &str = "IceChi2";

/// First guess classes used when none has been registered.
pub const DEFAULT_FIRST_GUESS: [&str; 2] = ["IceDwalkA", "IceDwalkI"];

/// Which hits enter the fit of a first guess track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HitSelection {
    /// All good hits of the event
    All,
    /// Only the good hits associated with the first guess track
    AssociatedOnly,
    /// All good hits of the subsystems that contributed to the first guess track
    #[default]
    SubsystemMatched,
}

impl HitSelection {
    /// Numeric code of the mode (0, 1 or 2).
    pub fn as_mode(&self) -> i32 {
        match self {
            HitSelection::All => 0,
            HitSelection::AssociatedOnly => 1,
            HitSelection::SubsystemMatched => 2,
        }
    }
}

impl TryFrom<i32> for HitSelection {
    type Error = PandelFitError;

    fn try_from(mode: i32) -> Result<Self, Self::Error> {
        match mode {
            0 => Ok(HitSelection::All),
            1 => Ok(HitSelection::AssociatedOnly),
            2 => Ok(HitSelection::SubsystemMatched),
            other => Err(PandelFitError::InvalidFitParameter(format!(
                "unknown hit selection mode {other}"
            ))),
        }
    }
}

/// Quantity minimized during the fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObjectiveKind {
    /// Sum of squared normalized time residuals
    #[default]
    ChiSquare,
    /// Total Convoluted Pandel psi
    PandelPsi,
}

/// A registered first guess track class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstGuessSelection {
    pub name: String,
    /// Maximum number of tracks of this class to fit, `None` for all
    pub max: Option<usize>,
}

/// Configuration of the track fit.
///
/// Fields
/// -----------------
/// * `hit_selection` – how the candidate hits of a first guess track are gathered.
/// * `vgroup` – apply the phase/group velocity correction to the Cherenkov cone.
/// * `penalty` – psi (dB) added for each hit whose `(ksi, tres)` had to be clamped.
/// * `print_level` – minimizer verbosity: `−2` is silent, `≥ 1` logs every fit.
/// * `track_name` – base name of the fitted tracks, extended by a subsystem suffix.
/// * `charge` – charge assigned to the fitted tracks.
/// * `first_guess` – registered first guess classes, see [`FitParams::first_guess_selections`].
/// * `objective` – quantity minimized by the fit.
/// * `medium` – optical properties of the medium.
/// * `max_iterations`, `tolerance` – descent iteration limit and convergence tolerance.
///
/// Defaults
/// -----------------
/// * `hit_selection`: [`HitSelection::SubsystemMatched`]
/// * `vgroup`: true
/// * `penalty`: 0 dB
/// * `print_level`: −2
/// * `track_name`: `"IceChi2"`
/// * `charge`: 0
/// * `first_guess`: none registered (`IceDwalkA` and `IceDwalkI`, one track each)
/// * `objective`: [`ObjectiveKind::ChiSquare`]
/// * `medium`: [`MediumParams::default`]
/// * `max_iterations`: 5000, `tolerance`: 1e-8
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParams {
    pub hit_selection: HitSelection,
    pub vgroup: bool,
    pub penalty: Decibel,
    pub print_level: i32,
    pub track_name: String,
    pub charge: f64,
    pub first_guess: Vec<FirstGuessSelection>,
    pub objective: ObjectiveKind,
    pub medium: MediumParams,
    pub max_iterations: u64,
    pub tolerance: f64,
}

impl FitParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a [`FitParamsBuilder`] initialized with the default values.
    pub fn builder() -> FitParamsBuilder {
        FitParamsBuilder::new()
    }

    /// First guess classes to process, in registration order.
    ///
    /// Falls back to [`DEFAULT_FIRST_GUESS`] with one track each when no class was registered.
    pub fn first_guess_selections(&self) -> Vec<FirstGuessSelection> {
        if !self.first_guess.is_empty() {
            return self.first_guess.clone();
        }
        DEFAULT_FIRST_GUESS
            .iter()
            .map(|name| FirstGuessSelection {
                name: (*name).to_string(),
                max: Some(1),
            })
            .collect()
    }

    /// Settings record attached to every processed event.
    pub fn processor_record(&self) -> ProcessorRecord {
        ProcessorRecord::new(PROCESSOR_NAME)
            .with_slot("Selhits", self.hit_selection.as_mode() as f64)
            .with_slot("Penalty", self.penalty)
            .with_slot("Vgroup", if self.vgroup { 1.0 } else { 0.0 })
    }

    /// True if per-fit details should be logged.
    pub fn verbose(&self) -> bool {
        self.print_level >= 1
    }

    /// True if minimizer warnings should be reported.
    pub fn warnings(&self) -> bool {
        self.print_level > -2
    }
}

impl Default for FitParams {
    fn default() -> Self {
        FitParams {
            hit_selection: HitSelection::default(),
            vgroup: true,
            penalty: 0.0,
            print_level: -2,
            track_name: PROCESSOR_NAME.to_string(),
            charge: 0.0,
            first_guess: Vec::new(),
            objective: ObjectiveKind::default(),
            medium: MediumParams::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Builder for [`FitParams`], with validation.
#[derive(Debug, Clone)]
pub struct FitParamsBuilder {
    params: FitParams,
}

impl Default for FitParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FitParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: FitParams::default(),
        }
    }

    pub fn hit_selection(mut self, v: HitSelection) -> Self {
        self.params.hit_selection = v;
        self
    }
    pub fn vgroup(mut self, v: bool) -> Self {
        self.params.vgroup = v;
        self
    }
    pub fn penalty(mut self, v: Decibel) -> Self {
        self.params.penalty = v;
        self
    }
    pub fn print_level(mut self, v: i32) -> Self {
        self.params.print_level = v;
        self
    }
    pub fn track_name(mut self, v: impl Into<String>) -> Self {
        self.params.track_name = v.into();
        self
    }
    pub fn charge(mut self, v: f64) -> Self {
        self.params.charge = v;
        self
    }
    pub fn objective(mut self, v: ObjectiveKind) -> Self {
        self.params.objective = v;
        self
    }
    pub fn medium(mut self, v: MediumParams) -> Self {
        self.params.medium = v;
        self
    }
    pub fn max_iterations(mut self, v: u64) -> Self {
        self.params.max_iterations = v;
        self
    }
    pub fn tolerance(mut self, v: f64) -> Self {
        self.params.tolerance = v;
        self
    }

    /// Register a first guess track class.
    ///
    /// Arguments
    /// -----------------
    /// * `name`: track name of the class.
    /// * `max`: number of tracks of the class to fit per event, `None` for all of them.
    ///
    /// A class already registered is left unchanged.
    pub fn use_tracks(mut self, name: impl Into<String>, max: Option<usize>) -> Self {
        let name = name.into();
        if !self.params.first_guess.iter().any(|s| s.name == name) {
            self.params.first_guess.push(FirstGuessSelection { name, max });
        }
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `penalty` finite (negative values reward clamped hits).
    /// * `charge` finite.
    /// * `track_name` not empty.
    /// * `max_iterations >= 1`, `tolerance > 0`.
    /// * All medium parameters `> 0`.
    ///
    /// Returns
    /// -----------------
    /// * `Ok(FitParams)` if all values are valid.
    /// * `Err(PandelFitError::InvalidFitParameter)` otherwise.
    pub fn build(self) -> Result<FitParams, PandelFitError> {
        let p = &self.params;

        if !p.penalty.is_finite() {
            return Err(PandelFitError::InvalidFitParameter(
                "penalty must be finite".into(),
            ));
        }
        if !p.charge.is_finite() {
            return Err(PandelFitError::InvalidFitParameter(
                "charge must be finite".into(),
            ));
        }
        if p.track_name.is_empty() {
            return Err(PandelFitError::InvalidFitParameter(
                "track_name must not be empty".into(),
            ));
        }
        if p.max_iterations == 0 {
            return Err(PandelFitError::InvalidFitParameter(
                "max_iterations must be >= 1".into(),
            ));
        }
        if !Self::gt0(p.tolerance) {
            return Err(PandelFitError::InvalidFitParameter(
                "tolerance must be > 0".into(),
            ));
        }

        let m = &p.medium;
        let medium_ok = [m.scattering_length, m.absorption_length, m.tau, m.time_jitter]
            .into_iter()
            .all(Self::gt0);
        if !medium_ok {
            return Err(PandelFitError::InvalidFitParameter(
                "medium lengths, tau and time jitter must be > 0".into(),
            ));
        }

        Ok(self.params)
    }
}

impl fmt::Display for FitParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 44;
            writeln!(f, "Chi-squared track fit parameters")?;
            writeln!(f, "--------------------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            writeln!(f, "[Hit selection / output]")?;
            line!(
                "hit_selection  = {:?}",
                self.hit_selection,
                "Candidate hit gathering mode"
            )?;
            line!("track_name     = {}", self.track_name, "Base name of fitted tracks")?;
            line!("charge         = {:.1}", self.charge, "Charge of fitted tracks")?;
            for sel in self.first_guess_selections() {
                let max = sel.max.map_or("all".to_string(), |n| n.to_string());
                line!("first_guess    = {}", format!("{} ({max})", sel.name), "First guess class")?;
            }

            writeln!(f, "\n[Light model / scoring]")?;
            line!("vgroup         = {}", self.vgroup, "v_phase/v_group cone correction")?;
            line!("penalty        = {:.2} dB", self.penalty, "Psi penalty for clamped hits")?;
            line!(
                "lambda         = {:.1} m",
                self.medium.scattering_length,
                "Scattering length"
            )?;
            line!(
                "labs           = {:.1} m",
                self.medium.absorption_length,
                "Absorption length"
            )?;
            line!("tau            = {:.1} ns", self.medium.tau, "Pandel time scale")?;
            line!("sigma          = {:.1} ns", self.medium.time_jitter, "Time jitter")?;

            writeln!(f, "\n[Minimizer]")?;
            line!("objective      = {:?}", self.objective, "Minimized quantity")?;
            line!("max_iterations = {}", self.max_iterations, "Descent iteration limit")?;
            line!("tolerance      = {:.1e}", self.tolerance, "Convergence tolerance")?;
            line!("print_level    = {}", self.print_level, "Minimizer verbosity")?;

            Ok(())
        } else {
            write!(
                f,
                "FitParams(selhits={}, vgroup={}, penalty={:.2}dB, name={}, charge={:.1}, objective={:?})",
                self.hit_selection.as_mode(),
                self.vgroup,
                self.penalty,
                self.track_name,
                self.charge,
                self.objective,
            )
        }
    }
}

#[cfg(test)]
mod fit_params_tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = FitParams::default();
        assert_eq!(p.hit_selection, HitSelection::SubsystemMatched);
        assert!(p.vgroup);
        assert_eq!(p.penalty, 0.0);
        assert_eq!(p.print_level, -2);
        assert_eq!(p.track_name, "IceChi2");
        assert_eq!(p.charge, 0.0);
        assert!(!p.warnings());

        let fg = p.first_guess_selections();
        assert_eq!(
            fg,
            vec![
                FirstGuessSelection {
                    name: "IceDwalkA".into(),
                    max: Some(1)
                },
                FirstGuessSelection {
                    name: "IceDwalkI".into(),
                    max: Some(1)
                },
            ]
        );
    }

    #[test]
    fn test_use_tracks_ignores_repeats() {
        let p = FitParams::builder()
            .use_tracks("IceDwalkI", None)
            .use_tracks("IceLinefit", Some(3))
            .use_tracks("IceDwalkI", Some(1))
            .build()
            .unwrap();
        assert_eq!(p.first_guess.len(), 2);
        assert_eq!(p.first_guess[0].max, None);
        assert_eq!(p.first_guess_selections()[1].name, "IceLinefit");
    }

    #[test]
    fn test_hit_selection_modes() {
        for mode in 0..3 {
            assert_eq!(HitSelection::try_from(mode).unwrap().as_mode(), mode);
        }
        assert!(matches!(
            HitSelection::try_from(3),
            Err(PandelFitError::InvalidFitParameter(_))
        ));
    }

    #[test]
    fn test_validation() {
        assert_eq!(FitParams::builder().penalty(-1.5).build().unwrap().penalty, -1.5);
        assert!(FitParams::builder().penalty(f64::NAN).build().is_err());
        assert!(FitParams::builder().penalty(f64::INFINITY).build().is_err());
        assert!(FitParams::builder().tolerance(0.0).build().is_err());
        assert!(FitParams::builder().max_iterations(0).build().is_err());
        assert!(FitParams::builder().track_name("").build().is_err());
        let medium = MediumParams {
            tau: 0.0,
            ..MediumParams::default()
        };
        assert_eq!(
            FitParams::builder().medium(medium).build(),
            Err(PandelFitError::InvalidFitParameter(
                "medium lengths, tau and time jitter must be > 0".into()
            ))
        );
    }

    #[test]
    fn test_processor_record() {
        let rec = FitParams::builder()
            .hit_selection(HitSelection::All)
            .penalty(1.5)
            .vgroup(false)
            .build()
            .unwrap()
            .processor_record();
        assert_eq!(rec.name, "IceChi2");
        assert_eq!(rec.get("Selhits"), Some(0.0));
        assert_eq!(rec.get("Penalty"), Some(1.5));
        assert_eq!(rec.get("Vgroup"), Some(0.0));
    }

    #[test]
    fn test_display_forms() {
        let p = FitParams::default();
        let compact = format!("{p}");
        assert!(compact.starts_with("FitParams(selhits=2"));
        let table = format!("{p:#}");
        assert!(table.contains("IceDwalkA (1)"));
        assert!(table.contains("[Minimizer]"));
    }
}
