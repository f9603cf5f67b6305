//! Project cash flow and capital cost.
//!
//! Costs are binned into 730 hour months. OPEX and revenue follow the
//! number of turbines on energized strings in each month.

use crate::error::{BosError, BosResult};
use crate::manager::ProjectRun;
use crate::progress::EnergizePoints;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use wt_core::digitize;
use wt_core::units::constants::HOURS_PER_MONTH;
use wt_project::EconomicParams;

/// Month number (from 1) to amount in USD.
pub type Monthly = BTreeMap<usize, f64>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapexBreakdown {
    pub bos: f64,
    pub installation: f64,
    pub turbine: f64,
    pub commissioning: f64,
    pub decommissioning: f64,
    pub total: f64,
    pub overnight: f64,
    pub bos_per_kw: Option<f64>,
    pub installation_per_kw: Option<f64>,
    /// Configured turbine CAPEX ($/kW)
    pub turbine_per_kw: f64,
    pub commissioning_per_kw: Option<f64>,
    pub decommissioning_per_kw: Option<f64>,
    pub total_per_kw: Option<f64>,
    pub overnight_per_kw: Option<f64>,
}

pub struct FinancialAggregator<'a> {
    run: &'a ProjectRun,
    params: EconomicParams,
    bins: Vec<f64>,
    energize: Option<EnergizePoints>,
}

impl<'a> FinancialAggregator<'a> {
    pub fn new(run: &'a ProjectRun) -> BosResult<Self> {
        let params = run.config.economics()?;
        let energize = match run.progress().energize_points() {
            Ok(points) => Some(points),
            Err(e) => {
                debug!(error = %e, "no energize points, OPEX and revenue are zero");
                None
            }
        };
        Ok(Self {
            run,
            params,
            bins: run.month_bins(),
            energize,
        })
    }

    pub fn params(&self) -> &EconomicParams {
        &self.params
    }

    pub fn energize_points(&self) -> Option<&EnergizePoints> {
        self.energize.as_ref()
    }

    fn months(&self) -> std::ops::Range<usize> {
        1..self.params.project_lifetime as usize * 12
    }

    fn rating(&self) -> f64 {
        self.run.config.turbine_rating().unwrap_or(0.0)
    }

    /// Turbines generating in `month`: the first strings (in completion
    /// order) whose energize month has been reached.
    fn generating_turbines(points: &EnergizePoints, bins: &[f64], month: usize) -> usize {
        let strings = points
            .times
            .iter()
            .filter(|t| month >= digitize(**t, bins))
            .count();
        points.turbines.iter().take(strings).sum()
    }

    pub fn monthly_opex(&self) -> Monthly {
        let Some(points) = &self.energize else {
            return self.months().map(|i| (i, 0.0)).collect();
        };
        let per_turbine = self.rating() * self.params.opex_rate * 1000.0 / 12.0;
        self.months()
            .map(|i| {
                let n = Self::generating_turbines(points, &self.bins, i);
                (i, n as f64 * per_turbine)
            })
            .collect()
    }

    /// Logged costs in each month plus OPEX.
    pub fn monthly_expenses(&self) -> Monthly {
        let opex = self.monthly_opex();
        let mut logged: Monthly = BTreeMap::new();
        for e in &self.run.logs {
            if let Some(cost) = e.cost {
                *logged.entry(digitize(e.time.trunc(), &self.bins)).or_default() += cost;
            }
        }
        self.months()
            .map(|i| {
                let spent = logged.get(&i).copied().unwrap_or(0.0);
                (i, spent + opex.get(&i).copied().unwrap_or(0.0))
            })
            .collect()
    }

    /// Empty when no string was ever energized.
    pub fn monthly_revenue(&self) -> Monthly {
        let Some(points) = &self.energize else {
            return Monthly::new();
        };
        let per_turbine_mwh = self.rating() * self.params.ncf * HOURS_PER_MONTH;
        self.months()
            .map(|i| {
                let n = Self::generating_turbines(points, &self.bins, i);
                (i, n as f64 * per_turbine_mwh * self.params.offtake_price)
            })
            .collect()
    }

    pub fn cash_flow(&self) -> Monthly {
        let revenue = self.monthly_revenue();
        let expenses = self.monthly_expenses();
        let last = revenue.keys().chain(expenses.keys()).copied().max().unwrap_or(0);
        (1..=last)
            .map(|i| {
                let r = revenue.get(&i).copied().unwrap_or(0.0);
                let x = expenses.get(&i).copied().unwrap_or(0.0);
                (i, r - x)
            })
            .collect()
    }

    /// Overnight CAPEX less the discounted monthly cash flow.
    pub fn npv(&self) -> BosResult<f64> {
        let cash_flow = self.cash_flow();
        if cash_flow.is_empty() {
            return Err(BosError::EmptyCashFlow);
        }
        let rate = (1.0 + self.params.discount_rate).powf(1.0 / 12.0) - 1.0;
        let discounted: f64 = cash_flow
            .iter()
            .map(|(i, cf)| cf / (1.0 + rate).powi(*i as i32))
            .sum();
        Ok(self.overnight_capex() - discounted)
    }

    /// Every completed phase.
    pub fn bos_capex(&self) -> f64 {
        self.run.phase_costs().iter().map(|(_, c)| c).sum()
    }

    pub fn installation_capex(&self) -> f64 {
        self.run.installation_cost()
    }

    pub fn turbine_capex(&self) -> f64 {
        match (self.run.config.num_turbines(), self.run.config.turbine_rating()) {
            (Some(n), Some(rating)) => self.params.turbine_capex * n * rating * 1000.0,
            _ => {
                warn!("turbine CAPEX needs plant.num_turbines and turbine.turbine_rating, using 0");
                0.0
            }
        }
    }

    pub fn commissioning(&self) -> f64 {
        self.params.commissioning * (self.bos_capex() + self.turbine_capex())
    }

    pub fn decommissioning(&self) -> f64 {
        self.params.decommissioning * self.installation_capex()
    }

    pub fn total_capex(&self) -> f64 {
        self.bos_capex() + self.turbine_capex() + self.commissioning() + self.decommissioning()
    }

    pub fn overnight_capex(&self) -> f64 {
        self.run.design_cost() + self.turbine_capex()
    }

    pub fn capex(&self) -> CapexBreakdown {
        let kw = self.run.capacity().map(|mw| mw * 1000.0);
        let per_kw = |v: f64| kw.map(|kw| v / kw);
        let (bos, installation, turbine) =
            (self.bos_capex(), self.installation_capex(), self.turbine_capex());
        let (commissioning, decommissioning) = (self.commissioning(), self.decommissioning());
        let total = self.total_capex();
        let overnight = self.overnight_capex();
        CapexBreakdown {
            bos,
            installation,
            turbine,
            commissioning,
            decommissioning,
            total,
            overnight,
            bos_per_kw: per_kw(bos),
            installation_per_kw: per_kw(installation),
            turbine_per_kw: self.params.turbine_capex,
            commissioning_per_kw: per_kw(commissioning),
            decommissioning_per_kw: per_kw(decommissioning),
            total_per_kw: per_kw(total),
            overnight_per_kw: per_kw(overnight),
        }
    }
}
