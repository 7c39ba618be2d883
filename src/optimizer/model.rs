//! Per-day MILP model: variables, dynamics, overrule controllers,
//! ventilation inertia and the cost objective.

use good_lp::{
    constraint, microlp, variable, Constraint, Expression, ProblemVariables, ResolutionError,
    Solution, SolverModel, Variable,
};
use tracing::{debug, warn};

use super::bounds::derive_big_m;
use super::constraints::{hysteresis, minimum_up_time};
use super::types::{BigM, ModelSettings};
use crate::domain::{
    DayResult, HourRecord, HysteresisBand, OverruleFlags, ParameterSet, PerRoom, Room,
    ScenarioInput,
};
use crate::error::ScheduleError;

/// Decision variables of one day, indexed `[room][slot]` or `[slot]`.
#[derive(Debug, Clone)]
pub struct DayVariables {
    pub heater: PerRoom<Vec<Variable>>,
    pub ventilation: Vec<Variable>,
    pub temperature: PerRoom<Vec<Variable>>,
    pub humidity: Vec<Variable>,
    pub delta_low: PerRoom<Vec<Variable>>,
    pub delta_high: PerRoom<Vec<Variable>>,
    pub delta_hum: Vec<Variable>,
}

/// A fully assembled day model, ready to hand to the solver.
pub struct DayModel {
    day: usize,
    problem: ProblemVariables,
    vars: DayVariables,
    objective: Expression,
    constraints: Vec<Constraint>,
    big_m: f64,
    ventilation_power: f64,
}

impl DayModel {
    pub fn build(
        params: &ParameterSet,
        scenario: &ScenarioInput,
        settings: &ModelSettings,
    ) -> Result<Self, ScheduleError> {
        scenario.check_shape(params.horizon)?;

        let h = params.horizon;
        let p_max = params.heating_max_power;
        let big_m = resolve_big_m(params, scenario, settings);

        let mut problem = ProblemVariables::new();
        let mut per_room = |def: good_lp::VariableDefinition| {
            PerRoom::new(problem.add_vector(def.clone(), h), problem.add_vector(def, h))
        };
        let heater = per_room(variable().min(0.0).max(p_max));
        let temperature = per_room(variable());
        let delta_low = per_room(variable().binary());
        let delta_high = per_room(variable().binary());
        let ventilation = problem.add_vector(variable().binary(), h);
        let humidity = problem.add_vector(variable().min(0.0), h);
        let delta_hum = problem.add_vector(variable().binary(), h);

        let vars = DayVariables {
            heater,
            ventilation,
            temperature,
            humidity,
            delta_low,
            delta_high,
            delta_hum,
        };

        let objective = (0..h)
            .map(|t| {
                scenario.price[t]
                    * (vars.heater[Room::One][t]
                        + vars.heater[Room::Two][t]
                        + params.ventilation_power * vars.ventilation[t])
            })
            .sum::<Expression>();

        let mut constraints = Vec::new();
        constraints.extend(dynamics(params, scenario, &vars));
        constraints.extend(overrule_controllers(params, &vars, big_m, settings.epsilon));
        constraints.extend(minimum_up_time(&vars.ventilation, params.vent_min_up_time));

        debug!(
            day = scenario.day,
            big_m,
            constraints = constraints.len(),
            "day model assembled"
        );

        Ok(Self {
            day: scenario.day,
            problem,
            vars,
            objective,
            constraints,
            big_m,
            ventilation_power: params.ventilation_power,
        })
    }

    pub fn big_m(&self) -> f64 {
        self.big_m
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn variables(&self) -> &DayVariables {
        &self.vars
    }

    /// Solve and read back the day's schedule. Blocks for the whole solve.
    pub fn solve(self, scenario: &ScenarioInput) -> Result<DayResult, ScheduleError> {
        let day = self.day;
        let mut model = self.problem.minimise(self.objective).using(microlp);
        for c in self.constraints {
            model = model.with(c);
        }

        let solution = model.solve().map_err(|e| match e {
            ResolutionError::Infeasible => ScheduleError::Infeasible { day },
            other => ScheduleError::SolverFailure {
                day,
                reason: other.to_string(),
            },
        })?;

        Ok(extract(&self.vars, &solution, scenario, self.ventilation_power, self.big_m))
    }
}

fn resolve_big_m(params: &ParameterSet, scenario: &ScenarioInput, settings: &ModelSettings) -> f64 {
    let derived = derive_big_m(params, scenario, settings.epsilon);
    match settings.big_m {
        BigM::Derived => derived,
        BigM::Fixed(m) => {
            if m < derived {
                warn!(
                    day = scenario.day,
                    configured = m,
                    derived,
                    "configured big-M is below the derived bound; the optimum may be wrong"
                );
            }
            m
        }
    }
}

/// Initial conditions and the affine state equations.
fn dynamics(params: &ParameterSet, scenario: &ScenarioInput, vars: &DayVariables) -> Vec<Constraint> {
    let h = params.horizon;
    let mut constraints = Vec::with_capacity(3 * h);

    for room in Room::ALL {
        constraints.push(constraint!(vars.temperature[room][0] == params.initial_temperature));
    }
    constraints.push(constraint!(vars.humidity[0] == params.initial_humidity));

    for t in 1..h {
        for room in Room::ALL {
            let prev = vars.temperature[room][t - 1];
            let neighbour = vars.temperature[room.other()][t - 1];
            let next = prev
                + params.heating_efficiency_coeff * vars.heater[room][t - 1]
                - params.thermal_loss_coeff * (prev - params.outdoor(t - 1))
                + params.heat_exchange_coeff * (neighbour - prev)
                - params.heat_vent_coeff * vars.ventilation[t - 1]
                + params.heat_occupancy_coeff * scenario.occupancy(room)[t - 1];
            constraints.push(constraint!(vars.temperature[room][t] == next));
        }

        let next = vars.humidity[t - 1]
            + params.humidity_occupancy_coeff * scenario.total_occupancy(t - 1)
            - params.humidity_vent_coeff * vars.ventilation[t - 1];
        constraints.push(constraint!(vars.humidity[t] == next));
    }

    constraints
}

/// The three overrule controllers, their effect on the controls, and the
/// exclusion of the two temperature controllers.
fn overrule_controllers(
    params: &ParameterSet,
    vars: &DayVariables,
    big_m: f64,
    epsilon: f64,
) -> Vec<Constraint> {
    let p_max = params.heating_max_power;
    let low = HysteresisBand::low_temperature(params);
    let high = HysteresisBand::high_temperature(params);
    let humid = HysteresisBand::humidity(params);
    let as_signal = |vs: &[Variable]| vs.iter().map(|&v| Expression::from(v)).collect::<Vec<_>>();

    let mut constraints = Vec::new();

    for room in Room::ALL {
        let temp = as_signal(&vars.temperature[room]);
        constraints.extend(hysteresis(&low, &vars.delta_low[room], &temp, big_m, epsilon));
        constraints.extend(hysteresis(&high, &vars.delta_high[room], &temp, big_m, epsilon));

        for t in 0..params.horizon {
            let p = vars.heater[room][t];
            let d_low = vars.delta_low[room][t];
            let d_high = vars.delta_high[room][t];
            constraints.push(constraint!(p >= p_max * d_low));
            constraints.push(constraint!(p + p_max * d_high <= p_max));
            constraints.push(constraint!(d_low + d_high <= 1.0));
        }
    }

    let hum = as_signal(&vars.humidity);
    constraints.extend(hysteresis(&humid, &vars.delta_hum, &hum, big_m, epsilon));
    for t in 0..params.horizon {
        constraints.push(constraint!(vars.ventilation[t] >= vars.delta_hum[t]));
    }

    constraints
}

fn extract(
    vars: &DayVariables,
    solution: &impl Solution,
    scenario: &ScenarioInput,
    ventilation_power: f64,
    big_m: f64,
) -> DayResult {
    let per_room = |vs: &PerRoom<Vec<Variable>>, t: usize| {
        PerRoom::new(solution.value(vs[Room::One][t]), solution.value(vs[Room::Two][t]))
    };
    let flag = |v: Variable| solution.value(v) > 0.5;

    let hours: Vec<HourRecord> = (0..scenario.price.len())
        .map(|t| HourRecord {
            hour: t,
            price: scenario.price[t],
            occupancy: PerRoom::new(
                scenario.occupancy(Room::One)[t],
                scenario.occupancy(Room::Two)[t],
            ),
            temperature: per_room(&vars.temperature, t),
            heater_power: per_room(&vars.heater, t),
            ventilation: solution.value(vars.ventilation[t]),
            humidity: solution.value(vars.humidity[t]),
            overrule: OverruleFlags {
                low_temperature: PerRoom::new(
                    flag(vars.delta_low[Room::One][t]),
                    flag(vars.delta_low[Room::Two][t]),
                ),
                high_temperature: PerRoom::new(
                    flag(vars.delta_high[Room::One][t]),
                    flag(vars.delta_high[Room::Two][t]),
                ),
                humidity: flag(vars.delta_hum[t]),
            },
        })
        .collect();

    // objective evaluated on the solved values
    let total_cost = hours
        .iter()
        .zip(&scenario.price)
        .map(|(h, price)| {
            price
                * (h.heater_power[Room::One]
                    + h.heater_power[Room::Two]
                    + ventilation_power * h.ventilation)
        })
        .sum();

    DayResult {
        day: scenario.day,
        total_cost,
        big_m,
        hours,
    }
}
