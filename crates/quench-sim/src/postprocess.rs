//! Spectral function from measured correlation functions.
//!
//! Every `spectral_function_t*` series is stacked into a grid `G(t_n, j)`
//! and transformed to
//!
//! ```text
//!   S(k, ω) = dt · Σ_n Σ_j  w(t_n) · e^{i ω t_n} · e^{-i k (j - x0)} · G(t_n, j)
//!
//!   w(t)  = exp(-½ (t / (σ · t_max))²)      (σ = gaussian_window, w = 1 if unset)
//!   k     = 2π n / L,  n = 0 … L-1
//! ```
//!
//! The result is stored under `post_processing["spectral_function<suffix>"]`
//! as `{k, omega, S}` with `S[k][ω]`.

use std::f64::consts::PI;

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::correlation::KEY_PREFIX;
use crate::error::{SimError, SimResult};
use crate::results::Results;

/// Options of [`SpectralFunctionProcessor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostProcessingParams {
    /// Width of the Gaussian time window relative to the largest time.
    #[serde(default)]
    pub gaussian_window: Option<f64>,
    /// Reference site of the spatial transform; defaults to the perturbed site.
    #[serde(default)]
    pub x0: Option<usize>,
    /// Lower end of the frequency grid; defaults to `-π/dt`.
    #[serde(default)]
    pub omega_min: Option<f64>,
    /// Upper end of the frequency grid; defaults to `π/dt`.
    #[serde(default)]
    pub omega_max: Option<f64>,
    /// Number of frequencies.
    #[serde(default = "default_n_omega")]
    pub n_omega: usize,
}

fn default_n_omega() -> usize {
    201
}

impl Default for PostProcessingParams {
    fn default() -> Self {
        Self {
            gaussian_window: None,
            x0: None,
            omega_min: None,
            omega_max: None,
            n_omega: default_n_omega(),
        }
    }
}

/// Spectral function on a `(k, ω)` grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralFunction {
    /// Momenta.
    pub k: Vec<f64>,
    /// Frequencies.
    pub omega: Vec<f64>,
    /// `S[k][ω]`.
    #[serde(rename = "S")]
    pub s: Vec<Vec<Complex64>>,
}

/// Fourier transforms measured correlation functions.
#[derive(Debug, Clone)]
pub struct SpectralFunctionProcessor {
    params: PostProcessingParams,
}

impl SpectralFunctionProcessor {
    /// Processor with explicit options.
    pub fn new(params: PostProcessingParams) -> SimResult<Self> {
        if let Some(sigma) = params.gaussian_window {
            if sigma.is_nan() || sigma <= 0.0 {
                return Err(SimError::Config(format!(
                    "gaussian_window must be positive, got {sigma}"
                )));
            }
        }
        if params.n_omega == 0 {
            return Err(SimError::Config("n_omega must be at least 1".into()));
        }
        Ok(Self { params })
    }

    /// Processor from the opaque `post_processing_params` option.
    pub fn from_value(value: &serde_json::Value) -> SimResult<Self> {
        let params = if value.is_null() {
            PostProcessingParams::default()
        } else {
            serde_json::from_value(value.clone())
                .map_err(|e| SimError::Config(format!("invalid post_processing_params: {e}")))?
        };
        Self::new(params)
    }

    /// Transform every correlation series in `results`.
    ///
    /// `default_x0` is used when no `x0` option is given.
    pub fn run(&self, results: &mut Results, default_x0: usize) -> SimResult<()> {
        let times: Vec<f64> = results
            .get("evolved_time")
            .unwrap_or_default()
            .iter()
            .filter_map(|m| m.as_scalar())
            .map(|t| t.re)
            .collect();
        if times.is_empty() {
            warn!("no measured times, skipping spectral function");
            return Ok(());
        }

        let x0 = self.params.x0.unwrap_or(default_x0);
        let keys: Vec<String> = results
            .measurements
            .keys()
            .filter(|k| k.starts_with(KEY_PREFIX))
            .cloned()
            .collect();
        for key in keys {
            let grid = correlation_grid(results, &key, times.len())?;
            let spectrum = self.transform(&grid, &times, x0);
            let out_key = format!("spectral_function{}", &key[KEY_PREFIX.len()..]);
            info!(key = %out_key, n_k = spectrum.k.len(), n_omega = spectrum.omega.len(), "computed spectral function");
            results
                .post_processing
                .insert(out_key, serde_json::to_value(&spectrum)?);
        }
        Ok(())
    }

    /// `S(k, ω)` of a `(n_t, L)` grid measured at `times`.
    pub fn transform(&self, grid: &Array2<Complex64>, times: &[f64], x0: usize) -> SpectralFunction {
        let (n_t, n_sites) = grid.dim();
        let dt = time_step(times);
        let t_max = times.iter().fold(0.0_f64, |m, t| m.max(t.abs()));

        let window: Vec<f64> = times
            .iter()
            .map(|t| match self.params.gaussian_window {
                Some(sigma) if t_max > 0.0 => (-0.5 * (t / (sigma * t_max)).powi(2)).exp(),
                _ => 1.0,
            })
            .collect();

        let k: Vec<f64> = (0..n_sites).map(|n| 2.0 * PI * n as f64 / n_sites as f64).collect();
        let omega = self.frequencies(dt);
        debug!(n_t, n_sites, dt, x0, "fourier transforming correlation grid");

        // Spatial transform first: G(t_n, k).
        let mut g_tk = Array2::<Complex64>::zeros((n_t, n_sites));
        for n in 0..n_t {
            for (ik, kv) in k.iter().enumerate() {
                let mut acc = Complex64::new(0.0, 0.0);
                for j in 0..n_sites {
                    let phase = Complex64::from_polar(1.0, -kv * (j as f64 - x0 as f64));
                    acc += phase * grid[(n, j)];
                }
                g_tk[(n, ik)] = acc * window[n];
            }
        }

        let s = (0..n_sites)
            .map(|ik| {
                omega
                    .iter()
                    .map(|w| {
                        let sum: Complex64 = (0..n_t)
                            .map(|n| Complex64::from_polar(1.0, w * times[n]) * g_tk[(n, ik)])
                            .sum();
                        sum * dt
                    })
                    .collect()
            })
            .collect();

        SpectralFunction { k, omega, s }
    }

    fn frequencies(&self, dt: f64) -> Vec<f64> {
        let bound = if dt > 0.0 { PI / dt } else { PI };
        let lo = self.params.omega_min.unwrap_or(-bound);
        let hi = self.params.omega_max.unwrap_or(bound);
        let n = self.params.n_omega;
        if n == 1 {
            return vec![lo];
        }
        (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
            .collect()
    }
}

fn time_step(times: &[f64]) -> f64 {
    match times {
        [t0, t1, ..] => t1 - t0,
        [t0] => *t0,
        [] => 0.0,
    }
}

fn correlation_grid(results: &Results, key: &str, n_times: usize) -> SimResult<Array2<Complex64>> {
    let rows: Vec<&[Complex64]> = results
        .get(key)
        .unwrap_or_default()
        .iter()
        .filter_map(|m| m.as_series())
        .collect();
    if rows.len() != n_times {
        return Err(SimError::Config(format!(
            "'{key}' has {} rows but {n_times} times were measured",
            rows.len()
        )));
    }
    let n_sites = rows.first().map_or(0, |r| r.len());
    let flat: Vec<Complex64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    Array2::from_shape_vec((n_times, n_sites), flat)
        .map_err(|e| SimError::Config(format!("'{key}' rows differ in length: {e}")))
}
