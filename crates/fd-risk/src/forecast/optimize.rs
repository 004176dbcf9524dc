//! Derivative-free minimization (Nelder-Mead simplex).

/// Nelder-Mead settings.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NelderMead {
    pub(crate) max_iterations: usize,
    pub(crate) tolerance: f64,
    pub(crate) initial_step: f64,
}

/// Best point found.
#[derive(Debug, Clone)]
pub(crate) struct Minimum {
    pub(crate) point: Vec<f64>,
    pub(crate) value: f64,
    pub(crate) iterations: usize,
    pub(crate) converged: bool,
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

impl NelderMead {
    /// Minimize `f` starting from `start`. Non-finite objective values are
    /// treated as `+∞`.
    pub(crate) fn minimize<F>(&self, f: F, start: &[f64]) -> Minimum
    where
        F: Fn(&[f64]) -> f64,
    {
        let eval = |x: &[f64]| {
            let v = f(x);
            if v.is_finite() { v } else { f64::INFINITY }
        };

        let n = start.len();
        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
        simplex.push((start.to_vec(), eval(start)));
        for i in 0..n {
            let mut x = start.to_vec();
            x[i] += self.initial_step;
            let v = eval(&x);
            simplex.push((x, v));
        }

        let mut iterations = 0;
        let mut converged = false;
        while iterations < self.max_iterations {
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
            let best = simplex[0].1;
            let worst = simplex[n].1;
            if best.is_finite() && (worst - best).abs() <= self.tolerance * (1.0 + best.abs()) {
                converged = true;
                break;
            }
            iterations += 1;

            let centroid: Vec<f64> = (0..n)
                .map(|j| simplex[..n].iter().map(|(x, _)| x[j]).sum::<f64>() / n as f64)
                .collect();
            let toward = |from: &[f64], coef: f64| -> Vec<f64> {
                centroid
                    .iter()
                    .zip(from)
                    .map(|(c, x)| c + coef * (x - c))
                    .collect()
            };

            let reflected = toward(&simplex[n].0, -REFLECT);
            let f_reflected = eval(&reflected);

            if f_reflected < best {
                let expanded = toward(&simplex[n].0, -EXPAND);
                let f_expanded = eval(&expanded);
                simplex[n] = if f_expanded < f_reflected {
                    (expanded, f_expanded)
                } else {
                    (reflected, f_reflected)
                };
                continue;
            }
            if f_reflected < simplex[n - 1].1 {
                simplex[n] = (reflected, f_reflected);
                continue;
            }

            let (contracted, bound) = if f_reflected < worst {
                (toward(&reflected, CONTRACT), f_reflected)
            } else {
                (toward(&simplex[n].0, CONTRACT), worst)
            };
            let f_contracted = eval(&contracted);
            if f_contracted < bound {
                simplex[n] = (contracted, f_contracted);
                continue;
            }

            let anchor = simplex[0].0.clone();
            for (x, v) in simplex.iter_mut().skip(1) {
                for (xi, ai) in x.iter_mut().zip(&anchor) {
                    *xi = ai + SHRINK * (*xi - ai);
                }
                *v = eval(x.as_slice());
            }
        }

        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let (point, value) = simplex.swap_remove(0);
        Minimum {
            point,
            value,
            iterations,
            converged,
        }
    }
}
