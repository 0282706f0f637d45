//! Derivative-free minimisation used to fit the smoothing model.
//!
//! The search runs in unbounded space; callers map coordinates onto bounded
//! parameters with [`ParamBound::map_sigmoid`].

/// Min/max bounds for one parameter dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamBound {
    pub min: f64,
    pub max: f64,
}

impl ParamBound {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `min + (max - min) / (1 + exp(-raw))`
    pub fn map_sigmoid(&self, raw: f64) -> f64 {
        let sigmoid = 1.0 / (1.0 + (-raw).exp());
        self.min + (self.max - self.min) * sigmoid
    }

    /// Inverse of [`map_sigmoid`](Self::map_sigmoid), with the normalised value
    /// clamped to [0.001, 0.999] so the result stays finite.
    pub fn inv_sigmoid(&self, value: f64) -> f64 {
        let t = ((value - self.min) / (self.max - self.min)).clamp(0.001, 0.999);
        (t / (1.0 - t)).ln()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    /// Relative spread of objective values across the simplex.
    pub f_tol: f64,
    /// Largest coordinate distance from the best vertex.
    pub x_tol: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 2_000,
            f_tol: 1e-10,
            x_tol: 1e-6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    pub x: Vec<f64>,
    pub fx: f64,
    pub iterations: usize,
    pub converged: bool,
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimise `objective` starting from `x0`. Vertex `i + 1` of the initial
/// simplex is `x0` displaced by `steps[i]` along axis `i`. Non-finite
/// objective values are treated as `+inf`.
pub fn nelder_mead<F>(
    mut objective: F,
    x0: &[f64],
    steps: &[f64],
    cfg: NelderMeadConfig,
) -> NelderMeadResult
where
    F: FnMut(&[f64]) -> f64,
{
    let n = x0.len();
    let mut eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    if n == 0 {
        let fx = eval(x0);
        return NelderMeadResult {
            x: Vec::new(),
            fx,
            iterations: 0,
            converged: true,
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(x0.to_vec());
    for i in 0..n {
        let mut v = x0.to_vec();
        let step = steps.get(i).copied().unwrap_or(0.1);
        v[i] += if step.abs() > f64::EPSILON { step } else { 0.1 };
        simplex.push(v);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v.as_slice())).collect();

    let mut iterations = 0;
    let mut converged = false;
    while iterations < cfg.max_iter {
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let best = values[0];
        let worst = values[n];
        let f_spread = (worst - best).abs();
        let x_spread = simplex[1..]
            .iter()
            .flat_map(|v| v.iter().zip(&simplex[0]).map(|(a, b)| (a - b).abs()))
            .fold(0.0_f64, f64::max);
        if f_spread <= cfg.f_tol * (1.0 + best.abs()) && x_spread <= cfg.x_tol {
            converged = true;
            break;
        }
        iterations += 1;

        let mut centroid = vec![0.0; n];
        for v in &simplex[..n] {
            for (c, x) in centroid.iter_mut().zip(v) {
                *c += x / n as f64;
            }
        }
        let along = |from: &[f64], coeff: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(from)
                .map(|(c, x)| c + coeff * (x - c))
                .collect()
        };

        let reflected = along(simplex[n].as_slice(), -REFLECT);
        let f_reflected = eval(reflected.as_slice());

        if f_reflected < best {
            let expanded = along(simplex[n].as_slice(), -REFLECT * EXPAND);
            let f_expanded = eval(expanded.as_slice());
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
            continue;
        }
        if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
            continue;
        }

        let (contracted, accept_below) = if f_reflected < worst {
            (along(reflected.as_slice(), CONTRACT), f_reflected)
        } else {
            (along(simplex[n].as_slice(), CONTRACT), worst)
        };
        let f_contracted = eval(contracted.as_slice());
        if f_contracted < accept_below {
            simplex[n] = contracted;
            values[n] = f_contracted;
            continue;
        }

        let anchor = simplex[0].clone();
        for i in 1..=n {
            let shrunk: Vec<f64> = anchor
                .iter()
                .zip(&simplex[i])
                .map(|(b, x)| b + SHRINK * (x - b))
                .collect();
            values[i] = eval(shrunk.as_slice());
            simplex[i] = shrunk;
        }
    }

    let best_idx = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);
    NelderMeadResult {
        x: simplex[best_idx].clone(),
        fx: values[best_idx],
        iterations,
        converged,
    }
}
