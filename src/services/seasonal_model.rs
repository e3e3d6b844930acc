//! Decomposable trend + seasonality regression model.
//!
//! `y(t) = trend(t) * (1 + seasonal(t))` in multiplicative mode, or
//! `y(t) = trend(t) + seasonal(t)` in additive mode, where the trend is
//! piecewise linear with automatically placed changepoints and each
//! seasonality is a truncated Fourier series. Coefficients are MAP
//! estimates under Gaussian priors, which reduces every fit step to a
//! penalised least-squares solve.

use chrono::{Datelike, NaiveDate};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp1, Normal, Poisson};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::{Dataset, ForecastRow, ModelConfig, SeasonalityMode};
use crate::services::linalg::solve_ridge;

const TREND_PRIOR_VARIANCE: f64 = 25.0;
const MIN_SIGMA: f64 = 1e-3;
const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone)]
struct SeasonalBlock {
    name: String,
    period_days: f64,
    fourier_order: usize,
    offset: usize,
}

#[derive(Debug, Clone)]
pub struct SeasonalModel {
    config: ModelConfig,
    start: NaiveDate,
    history_end: NaiveDate,
    t_scale_days: f64,
    y_scale: f64,
    changepoints_t: Vec<f64>,
    /// `[m, k, delta_1 .. delta_S]` in scaled units
    trend_params: Vec<f64>,
    blocks: Vec<SeasonalBlock>,
    beta: Vec<f64>,
    sigma: f64,
}

impl SeasonalModel {
    pub fn fit(dataset: &Dataset, config: &ModelConfig) -> Result<Self, AppError> {
        config.validate().map_err(AppError::Validation)?;

        let n = dataset.len();
        if n < 2 {
            return Err(AppError::InsufficientData { needed: 2, got: n });
        }
        let start = dataset.observations[0].ds;
        let history_end = dataset.observations[n - 1].ds;
        let t_scale_days = (history_end - start).num_days() as f64;
        if t_scale_days <= 0.0 {
            return Err(AppError::Model(
                "All observations share the same date; cannot fit a trend".to_string(),
            ));
        }

        let y_scale = dataset
            .observations
            .iter()
            .map(|o| o.y.abs())
            .fold(0.0_f64, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let t: Vec<f64> = dataset
            .observations
            .iter()
            .map(|o| (o.ds - start).num_days() as f64 / t_scale_days)
            .collect();
        let y = Array1::from_iter(dataset.observations.iter().map(|o| o.y / y_scale));

        let changepoints_t = place_changepoints(&t, config.n_changepoints, config.changepoint_range);

        let mut blocks = Vec::with_capacity(config.seasonalities.len());
        let mut offset = 0;
        for s in &config.seasonalities {
            blocks.push(SeasonalBlock {
                name: s.name.clone(),
                period_days: s.period_days,
                fourier_order: s.fourier_order,
                offset,
            });
            offset += 2 * s.fourier_order;
        }

        let dates = dataset.dates();
        let trend_x = trend_design(&t, &changepoints_t);
        let season_x = seasonal_design(&dates, &blocks);

        let trend_var = trend_prior_variances(changepoints_t.len(), config.changepoint_prior_scale);
        let season_var = Array1::from_iter(
            config
                .seasonalities
                .iter()
                .flat_map(|s| std::iter::repeat(s.prior_scale * s.prior_scale).take(2 * s.fourier_order)),
        );

        let (trend_params, beta, sigma, iterations) = match config.seasonality_mode {
            SeasonalityMode::Additive => fit_additive(&trend_x, &season_x, &y, &trend_var, &season_var)?,
            SeasonalityMode::Multiplicative => {
                fit_multiplicative(&trend_x, &season_x, &y, &trend_var, &season_var)?
            }
        };

        info!(
            "Fitted {:?} model on {} observations ({} changepoints, {} seasonal terms, {} iterations, sigma={:.5})",
            config.seasonality_mode,
            n,
            changepoints_t.len(),
            beta.len(),
            iterations,
            sigma
        );

        Ok(Self {
            config: config.clone(),
            start,
            history_end,
            t_scale_days,
            y_scale,
            changepoints_t,
            trend_params: trend_params.to_vec(),
            blocks,
            beta: beta.to_vec(),
            sigma,
        })
    }

    pub fn history_end(&self) -> NaiveDate {
        self.history_end
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn seasonality_names(&self) -> Vec<String> {
        self.blocks.iter().map(|b| b.name.clone()).collect()
    }

    /// Changepoint locations as calendar dates
    pub fn changepoints(&self) -> Vec<NaiveDate> {
        self.changepoints_t
            .iter()
            .map(|&s| self.start + chrono::Duration::days((s * self.t_scale_days).round() as i64))
            .collect()
    }

    /// Observation noise in FCFA per tonne
    pub fn sigma(&self) -> f64 {
        self.sigma * self.y_scale
    }

    fn scaled_t(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.t_scale_days
    }

    fn trend_scaled(&self, t: f64) -> f64 {
        let mut value = self.trend_params[0] + self.trend_params[1] * t;
        for (j, &s) in self.changepoints_t.iter().enumerate() {
            if t >= s {
                value += self.trend_params[2 + j] * (t - s);
            }
        }
        value
    }

    fn block_value(&self, block: &SeasonalBlock, date: NaiveDate) -> f64 {
        let features = fourier_features(days_since_epoch(date), block.period_days, block.fourier_order);
        features
            .iter()
            .zip(&self.beta[block.offset..block.offset + 2 * block.fourier_order])
            .map(|(x, b)| x * b)
            .sum()
    }

    /// Seasonal component values for `name`, in the units reported by `predict`.
    pub fn seasonal_profile(&self, name: &str, dates: &[NaiveDate]) -> Option<Vec<f64>> {
        let block = self.blocks.iter().find(|b| b.name == name)?;
        let unit = match self.config.seasonality_mode {
            SeasonalityMode::Multiplicative => 1.0,
            SeasonalityMode::Additive => self.y_scale,
        };
        Some(dates.iter().map(|&d| self.block_value(block, d) * unit).collect())
    }

    /// Point forecast and uncertainty bands for every date.
    pub fn predict(&self, dates: &[NaiveDate]) -> Vec<ForecastRow> {
        let mut rows: Vec<ForecastRow> = dates
            .iter()
            .map(|&ds| {
                let trend = self.trend_scaled(self.scaled_t(ds)) * self.y_scale;
                let raw: Vec<f64> = self.blocks.iter().map(|b| self.block_value(b, ds)).collect();
                let total: f64 = raw.iter().sum();
                let (seasonal, multiplicative_terms, additive_terms, yhat) = match self.config.seasonality_mode {
                    SeasonalityMode::Multiplicative => (raw, total, 0.0, trend * (1.0 + total)),
                    SeasonalityMode::Additive => {
                        let seasonal: Vec<f64> = raw.iter().map(|v| v * self.y_scale).collect();
                        let additive = total * self.y_scale;
                        (seasonal, 0.0, additive, trend + additive)
                    }
                };
                ForecastRow {
                    ds,
                    trend,
                    trend_lower: trend,
                    trend_upper: trend,
                    yhat_lower: yhat,
                    yhat_upper: yhat,
                    multiplicative_terms,
                    additive_terms,
                    seasonal,
                    yhat,
                }
            })
            .collect();

        if self.config.uncertainty_samples > 0 {
            self.add_uncertainty(&mut rows);
        }
        rows
    }

    /// Simulate future trend changes and observation noise, then take
    /// percentile bands of the simulated trajectories.
    fn add_uncertainty(&self, rows: &mut [ForecastRow]) {
        let n_samples = self.config.uncertainty_samples;
        let ts: Vec<f64> = rows.iter().map(|r| self.scaled_t(r.ds)).collect();
        let t_max = ts.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let n_cp = self.changepoints_t.len();
        let mean_abs_delta = if n_cp > 0 {
            self.trend_params[2..].iter().map(|d| d.abs()).sum::<f64>() / n_cp as f64
        } else {
            0.0
        };
        let laplace_scale = mean_abs_delta + 1e-8;
        let change_rate = n_cp as f64 * (t_max - 1.0);
        let poisson = if t_max > 1.0 && change_rate > 0.0 {
            Poisson::new(change_rate).ok()
        } else {
            None
        };
        let noise = Normal::new(0.0, self.sigma).ok();

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut trend_samples = vec![Vec::with_capacity(n_samples); rows.len()];
        let mut yhat_samples = vec![Vec::with_capacity(n_samples); rows.len()];

        for _ in 0..n_samples {
            let n_changes = poisson.as_ref().map(|p| p.sample(&mut rng) as usize).unwrap_or(0);
            let new_changes: Vec<(f64, f64)> = (0..n_changes)
                .map(|_| {
                    let at = rng.random_range(1.0..t_max);
                    let magnitude: f64 = rng.sample(Exp1);
                    let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
                    (at, sign * laplace_scale * magnitude)
                })
                .collect();

            for (i, row) in rows.iter().enumerate() {
                let t = ts[i];
                let mut trend = self.trend_scaled(t);
                for &(at, delta) in &new_changes {
                    if t >= at {
                        trend += delta * (t - at);
                    }
                }
                let trend = trend * self.y_scale;
                let eps = noise.as_ref().map(|d| d.sample(&mut rng)).unwrap_or(0.0) * self.y_scale;
                let yhat = match self.config.seasonality_mode {
                    SeasonalityMode::Multiplicative => trend * (1.0 + row.multiplicative_terms),
                    SeasonalityMode::Additive => trend + row.additive_terms,
                } + eps;
                trend_samples[i].push(trend);
                yhat_samples[i].push(yhat);
            }
        }

        let lower_q = (1.0 - self.config.interval_width) / 2.0;
        let upper_q = 1.0 - lower_q;
        for (i, row) in rows.iter_mut().enumerate() {
            row.trend_lower = percentile(&mut trend_samples[i], lower_q);
            row.trend_upper = percentile(&mut trend_samples[i], upper_q);
            row.yhat_lower = percentile(&mut yhat_samples[i], lower_q);
            row.yhat_upper = percentile(&mut yhat_samples[i], upper_q);
        }
        debug!("Simulated {} trajectories over {} dates", n_samples, rows.len());
    }
}

/// Changepoints are evenly spread over the first `range` share of the history.
fn place_changepoints(t: &[f64], requested: usize, range: f64) -> Vec<f64> {
    let hist_size = (t.len() as f64 * range).floor() as usize;
    let n_cp = requested.min(hist_size.saturating_sub(1));
    if n_cp == 0 {
        return Vec::new();
    }
    let last = (hist_size - 1) as f64;
    (1..=n_cp)
        .map(|i| {
            let idx = (i as f64 * last / n_cp as f64).round() as usize;
            t[idx]
        })
        .collect()
}

fn trend_design(t: &[f64], changepoints: &[f64]) -> Array2<f64> {
    let mut x = Array2::<f64>::zeros((t.len(), 2 + changepoints.len()));
    for (i, &ti) in t.iter().enumerate() {
        x[[i, 0]] = 1.0;
        x[[i, 1]] = ti;
        for (j, &s) in changepoints.iter().enumerate() {
            if ti >= s {
                x[[i, 2 + j]] = ti - s;
            }
        }
    }
    x
}

fn seasonal_design(dates: &[NaiveDate], blocks: &[SeasonalBlock]) -> Array2<f64> {
    let width: usize = blocks.iter().map(|b| 2 * b.fourier_order).sum();
    let mut x = Array2::<f64>::zeros((dates.len(), width));
    for (i, &d) in dates.iter().enumerate() {
        let day = days_since_epoch(d);
        for b in blocks {
            for (j, v) in fourier_features(day, b.period_days, b.fourier_order).into_iter().enumerate() {
                x[[i, b.offset + j]] = v;
            }
        }
    }
    x
}

fn trend_prior_variances(n_changepoints: usize, changepoint_prior_scale: f64) -> Array1<f64> {
    // Laplace(0, tau) has variance 2 tau^2
    let delta_var = 2.0 * changepoint_prior_scale * changepoint_prior_scale;
    let mut var = Array1::from_elem(2 + n_changepoints, delta_var);
    var[0] = TREND_PRIOR_VARIANCE;
    var[1] = TREND_PRIOR_VARIANCE;
    var
}

fn penalties(prior_var: &Array1<f64>, sigma2: f64) -> Array1<f64> {
    prior_var.mapv(|v| sigma2 / v)
}

fn scale_rows(x: &Array2<f64>, weights: &Array1<f64>) -> Array2<f64> {
    let mut scaled = x.clone();
    for (mut row, &w) in scaled.rows_mut().into_iter().zip(weights.iter()) {
        row *= w;
    }
    scaled
}

fn residual_variance(residuals: &Array1<f64>) -> f64 {
    let n = residuals.len().max(1) as f64;
    (residuals.mapv(|r| r * r).sum() / n).max(MIN_SIGMA * MIN_SIGMA)
}

type FitResult = (Array1<f64>, Array1<f64>, f64, usize);

fn fit_additive(
    trend_x: &Array2<f64>,
    season_x: &Array2<f64>,
    y: &Array1<f64>,
    trend_var: &Array1<f64>,
    season_var: &Array1<f64>,
) -> Result<FitResult, AppError> {
    let p_trend = trend_x.ncols();
    let x = ndarray::concatenate(ndarray::Axis(1), &[trend_x.view(), season_x.view()])
        .map_err(|e| AppError::Model(e.to_string()))?;
    let prior_var = ndarray::concatenate(ndarray::Axis(0), &[trend_var.view(), season_var.view()])
        .map_err(|e| AppError::Model(e.to_string()))?;

    let mut sigma2 = residual_variance(&(y - y.mean().unwrap_or(0.0)));
    let mut coef = Array1::<f64>::zeros(x.ncols());
    let mut iterations = 0;
    for _ in 0..MAX_ITERATIONS {
        iterations += 1;
        coef = solve_ridge(&x, y, &penalties(&prior_var, sigma2))?;
        let next = residual_variance(&(y - &x.dot(&coef)));
        let converged = (next - sigma2).abs() <= TOLERANCE * sigma2.max(1.0);
        sigma2 = next;
        if converged {
            break;
        }
    }

    let trend = coef.slice(ndarray::s![..p_trend]).to_owned();
    let beta = coef.slice(ndarray::s![p_trend..]).to_owned();
    Ok((trend, beta, sigma2.sqrt(), iterations))
}

/// Alternates between the trend given the seasonal multiplier and the
/// seasonal coefficients given the trend; each half-step is linear.
fn fit_multiplicative(
    trend_x: &Array2<f64>,
    season_x: &Array2<f64>,
    y: &Array1<f64>,
    trend_var: &Array1<f64>,
    season_var: &Array1<f64>,
) -> Result<FitResult, AppError> {
    let mut beta = Array1::<f64>::zeros(season_x.ncols());
    let mut sigma2 = residual_variance(&(y - y.mean().unwrap_or(0.0)));
    let mut theta = solve_ridge(trend_x, y, &penalties(trend_var, sigma2))?;
    let mut previous_sse = f64::INFINITY;
    let mut iterations = 0;

    for _ in 0..MAX_ITERATIONS {
        iterations += 1;

        let multiplier = season_x.dot(&beta) + 1.0;
        theta = solve_ridge(&scale_rows(trend_x, &multiplier), y, &penalties(trend_var, sigma2))?;

        let trend = trend_x.dot(&theta);
        if season_x.ncols() > 0 {
            let target = y - &trend;
            beta = solve_ridge(&scale_rows(season_x, &trend), &target, &penalties(season_var, sigma2))?;
        }

        let fitted = &trend * &(season_x.dot(&beta) + 1.0);
        let residuals = y - &fitted;
        let sse = residuals.mapv(|r| r * r).sum();
        sigma2 = residual_variance(&residuals);

        if (previous_sse - sse).abs() <= TOLERANCE * previous_sse.min(1e300).max(1e-12) {
            break;
        }
        previous_sse = sse;
    }

    Ok((theta, beta, sigma2.sqrt(), iterations))
}

/// 1970-01-01 counted from 0001-01-01 (day 1)
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn days_since_epoch(date: NaiveDate) -> f64 {
    (date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE) as f64
}

/// `[sin(2π·1·t/P), cos(2π·1·t/P), sin(2π·2·t/P), ...]`
fn fourier_features(day: f64, period: f64, order: usize) -> Vec<f64> {
    let mut features = Vec::with_capacity(2 * order);
    for n in 1..=order {
        let angle = 2.0 * std::f64::consts::PI * n as f64 * day / period;
        features.push(angle.sin());
        features.push(angle.cos());
    }
    features
}

/// Linear-interpolated percentile, `q` in [0, 1].
fn percentile(values: &mut [f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let pos = q.clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    values[lo] + (values[hi] - values[lo]) * (pos - lo as f64)
}
