//! BFGS quasi-Newton minimisation over three unbounded parameters.
//!
//! Step lengths come from a weak-Wolfe bracketing line search: the step doubles
//! until the curvature condition holds or sufficient decrease fails, then the
//! bracket is bisected. Unlike plain backtracking, this keeps `sᵀy > 0` on
//! objectives with gradient kinks, so the inverse-Hessian update stays usable
//! all the way into a cone-shaped minimum (Lewis & Overton, "Nonsmooth
//! optimization via quasi-Newton methods", 2013).
//!
//! The inverse-Hessian estimate is scaled by `sᵀy / yᵀy` before the first
//! update (Nocedal & Wright, eq. 6.20), and updates with non-positive curvature
//! are skipped.

use nalgebra::{Matrix3, Vector3};
use tracing::debug;

/// Sufficient-decrease constant.
const WOLFE_C1: f64 = 1e-4;
/// Curvature constant for the weak Wolfe condition.
const WOLFE_C2: f64 = 0.9;
/// Doublings plus bisections before a line search gives up.
const MAX_LINE_SEARCH_TRIALS: u32 = 60;

/// A scalar function of three parameters together with its gradient.
pub trait Objective {
    fn value(&self, x: &Vector3<f64>) -> f64;

    /// Gradient at `x`. Where the function has a kink, any one-sided or
    /// averaged slope is acceptable.
    fn gradient(&self, x: &Vector3<f64>) -> Vector3<f64>;
}

/// Why the minimiser stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Largest gradient component fell below the tolerance.
    GradientTolerance,
    /// Objective reached exactly zero; nothing left to improve.
    ExactFit,
    /// No step longer than the step tolerance decreases the objective, even
    /// along steepest descent. The iterate is a minimum to working precision;
    /// this is how kinked minima are detected.
    StepTolerance,
    /// Iteration budget exhausted.
    MaxIterations,
    /// The line search could not produce a finite, decreasing step.
    LineSearchFailed,
}

impl Termination {
    pub fn is_converged(self) -> bool {
        matches!(
            self,
            Termination::GradientTolerance | Termination::ExactFit | Termination::StepTolerance
        )
    }
}

/// Parameters controlling the minimiser.
#[derive(Debug, Clone)]
pub struct BfgsConfig {
    /// Stop when `max |∂f/∂xᵢ|` is at or below this. Default 1e-5.
    pub gradient_tolerance: f64,
    /// Maximum number of BFGS iterations. Default 600.
    pub max_iterations: u32,
    /// A line search that has narrowed its bracket to
    /// `step_tolerance * max(1, |x|∞)` without finding a decrease counts as
    /// converged. Default 1e-14.
    pub step_tolerance: f64,
}

impl Default for BfgsConfig {
    fn default() -> Self {
        Self {
            gradient_tolerance: 1e-5,
            max_iterations: 600,
            step_tolerance: 1e-14,
        }
    }
}

/// Outcome of a minimisation. Always returned, converged or not.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vector3<f64>,
    pub value: f64,
    pub gradient: Vector3<f64>,
    pub iterations: u32,
    /// Objective value evaluations.
    pub evaluations: u32,
    pub gradient_evaluations: u32,
    pub termination: Termination,
}

enum LineSearch {
    Accepted {
        x: Vector3<f64>,
        value: f64,
        gradient: Vector3<f64>,
    },
    /// Bracket collapsed below the step tolerance with finite values.
    Stalled,
    Failed,
}

/// Objective wrapper that counts evaluations.
struct Problem<'a, O: ?Sized> {
    objective: &'a O,
    step_tolerance: f64,
    evaluations: u32,
    gradient_evaluations: u32,
}

impl<O> Problem<'_, O>
where
    O: Objective + ?Sized,
{
    fn value(&mut self, x: &Vector3<f64>) -> f64 {
        self.evaluations += 1;
        self.objective.value(x)
    }

    fn gradient(&mut self, x: &Vector3<f64>) -> Vector3<f64> {
        self.gradient_evaluations += 1;
        self.objective.gradient(x)
    }

    /// Weak-Wolfe bracketing search along `dir`, starting at `initial_step`.
    fn line_search(
        &mut self,
        x: &Vector3<f64>,
        fx: f64,
        g: &Vector3<f64>,
        dir: &Vector3<f64>,
        initial_step: f64,
    ) -> LineSearch {
        let slope = g.dot(dir);
        if slope.is_nan() || slope >= 0.0 {
            return LineSearch::Failed;
        }

        let min_width = self.step_tolerance * x.amax().max(1.0);
        let dir_len = dir.amax();
        let mut lo = 0.0;
        let mut hi = f64::INFINITY;
        let mut alpha = initial_step;
        let mut last_finite = true;
        // Largest step seen that satisfies sufficient decrease but not curvature.
        let mut fallback = None;

        for _ in 0..MAX_LINE_SEARCH_TRIALS {
            let candidate = *x + *dir * alpha;
            let fc = self.value(&candidate);
            last_finite = fc.is_finite();

            if !last_finite || fc > fx + WOLFE_C1 * alpha * slope {
                hi = alpha;
            } else {
                let gc = self.gradient(&candidate);
                if gc.dot(dir) >= WOLFE_C2 * slope {
                    return LineSearch::Accepted {
                        x: candidate,
                        value: fc,
                        gradient: gc,
                    };
                }
                lo = alpha;
                fallback = Some((candidate, fc, gc));
            }

            if hi.is_finite() {
                if (hi - lo) * dir_len <= min_width {
                    break;
                }
                alpha = 0.5 * (lo + hi);
            } else {
                alpha *= 2.0;
            }
        }

        if let Some((x, value, gradient)) = fallback {
            return LineSearch::Accepted { x, value, gradient };
        }
        if hi.is_finite() && (hi - lo) * dir_len <= min_width && last_finite {
            LineSearch::Stalled
        } else {
            LineSearch::Failed
        }
    }
}

/// Minimise `objective` starting from `x0`.
pub fn minimize<O>(objective: &O, x0: Vector3<f64>, config: &BfgsConfig) -> Minimum
where
    O: Objective + ?Sized,
{
    let mut problem = Problem {
        objective,
        step_tolerance: config.step_tolerance,
        evaluations: 0,
        gradient_evaluations: 0,
    };

    let mut x = x0;
    let mut fx = problem.value(&x);
    let mut g = problem.gradient(&x);
    // `None` until the first accepted curvature pair fixes the scale.
    let mut h_inv: Option<Matrix3<f64>> = None;
    let mut iterations = 0u32;

    let termination = loop {
        if fx == 0.0 {
            break Termination::ExactFit;
        }
        if g.amax() <= config.gradient_tolerance {
            break Termination::GradientTolerance;
        }
        if iterations >= config.max_iterations {
            break Termination::MaxIterations;
        }
        iterations += 1;

        let steepest_step = (1.0 / g.norm()).min(1.0);
        let mut search = match &h_inv {
            Some(h) => problem.line_search(&x, fx, &g, &-(h * g), 1.0),
            None => problem.line_search(&x, fx, &g, &-g, steepest_step),
        };
        if h_inv.is_some() && !matches!(search, LineSearch::Accepted { .. }) {
            // Stale curvature information; retry once from steepest descent.
            debug!("BFGS iter {}: line search failed, resetting to steepest descent", iterations);
            h_inv = None;
            search = problem.line_search(&x, fx, &g, &-g, steepest_step);
        }
        let (x_new, f_new, g_new) = match search {
            LineSearch::Accepted { x, value, gradient } => (x, value, gradient),
            LineSearch::Stalled => break Termination::StepTolerance,
            LineSearch::Failed => break Termination::LineSearchFailed,
        };

        let s = x_new - x;
        let y = g_new - g;
        let ys = y.dot(&s);

        if ys > f64::EPSILON * s.norm() * y.norm() {
            let h = h_inv.unwrap_or_else(|| Matrix3::identity() * (ys / y.norm_squared()));
            let rho = 1.0 / ys;
            let left = Matrix3::identity() - s * y.transpose() * rho;
            let right = Matrix3::identity() - y * s.transpose() * rho;
            h_inv = Some(left * h * right + s * s.transpose() * rho);
        }

        debug!(
            "BFGS iter {}: f = {:.6e}, |g|∞ = {:.3e}, |step| = {:.3e}",
            iterations,
            f_new,
            g_new.amax(),
            s.norm()
        );

        x = x_new;
        fx = f_new;
        g = g_new;
    };

    Minimum {
        x,
        value: fx,
        gradient: g,
        iterations,
        evaluations: problem.evaluations,
        gradient_evaluations: problem.gradient_evaluations,
        termination,
    }
}
