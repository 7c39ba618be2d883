//! Linear encodings of the logical rules of the day model.

use good_lp::{constraint, Constraint, Expression, Variable};

use crate::domain::HysteresisBand;

/// Big-M encoding of a two-state overrule controller.
///
/// `flag[t]` is the controller's activation at slot `t`, `signal[t]` the
/// quantity it watches. The flag is pinned inactive at slot 0; from slot 1 on:
///
/// * activation: `M·δ[t] ≥ trigger(x[t])`
/// * memory (bands with `memory`): `M·δ[t] ≥ hold_gap(x[t]) + ε − M·(1 − δ[t−1])`
/// * deactivation: `M·(1 − δ[t]) ≥ release_margin(x[t])`, shifted by `ε` for
///   memory bands so that holding and releasing never overlap. Unshifted,
///   a held flag with `x` in `(release, release + ε]` would be both required
///   and forbidden, making the day infeasible.
///
/// `big_m` must dominate every gap between the signal and the band's
/// thresholds; see [`super::bounds::derive_big_m`].
pub fn hysteresis(
    band: &HysteresisBand,
    flag: &[Variable],
    signal: &[Expression],
    big_m: f64,
    epsilon: f64,
) -> Vec<Constraint> {
    debug_assert_eq!(flag.len(), signal.len());
    let s = band.sign();
    let release_shift = if band.memory { epsilon } else { 0.0 };

    let mut constraints = Vec::with_capacity(3 * flag.len());
    if let Some(&first) = flag.first() {
        constraints.push(constraint!(first == 0.0));
    }

    for t in 1..flag.len() {
        let x = &signal[t];

        constraints.push(constraint!(big_m * flag[t] >= s * (x.clone() - band.trip)));

        if band.memory {
            constraints.push(constraint!(
                big_m * flag[t] - big_m * flag[t - 1] >= s * (x.clone() - band.release) + epsilon - big_m
            ));
        }

        // M·(1 − δ) ≥ −s·(x − release) − shift, rearranged
        constraints.push(constraint!(
            big_m * flag[t] <= s * (x.clone() - band.release) + big_m + release_shift
        ));
    }

    constraints
}

/// Once switched on, the ventilation stays on for `min_up` consecutive slots.
///
/// A falling edge at `t` (`v[t−1] = 1, v[t] = 0`) needs the `min_up` slots
/// before `t` all on. Slots closer than `min_up` to the start cannot look back
/// far enough and may only switch on.
pub fn minimum_up_time(ventilation: &[Variable], min_up: usize) -> Vec<Constraint> {
    let window_len = min_up as f64;
    (1..ventilation.len())
        .map(|t| {
            if t >= min_up {
                let window: Expression = ventilation[t - min_up..t]
                    .iter()
                    .map(|&v| Expression::from(v))
                    .sum();
                constraint!(window >= window_len * (ventilation[t - 1] - ventilation[t]))
            } else {
                constraint!(ventilation[t] >= ventilation[t - 1])
            }
        })
        .collect()
}
