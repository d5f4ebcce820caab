//! Temporal trend analysis (spec.md §4.8 C8): period bucketing, the
//! per-period S/I/R (or mechanism-prevalence) series, an OLS linear model,
//! a logit-link GAM, and rolling-origin cross-validation of both.

pub mod cv;
pub mod diagnostics;
pub mod gam;
pub mod linalg;
pub mod linear;
pub mod period;
pub mod stats;

use chrono::NaiveDate;

use crate::aggregate;
use crate::entities::*;
use crate::error::{EngineError, EngineResult};
use crate::store::Store;

use period::{Grouping, Period};

/// What the series tracks: an antibiotic's %S+I, or a mechanism's (optional
/// subtype's) carriage prevalence among isolates (spec.md §4.8 "Antibiotic
/// *or* Mechanism" — the mechanism branch follows the original
/// implementation's prevalence-mode counting, see DESIGN.md).
#[derive(Debug, Clone, Copy)]
pub enum TrendTarget {
    Antibiotic(TenantAntibioticId),
    Mechanism { mechanism: ResistanceMechanismId, subtype: Option<MechanismSubtypeId> },
}

pub struct TrendRequest {
    pub tenant: TenantId,
    pub organism_tenant: TenantOrganismId,
    pub target: TrendTarget,
    pub eucast_version: EucastVersionId,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub grouping: Grouping,
}

#[derive(Debug, Clone)]
pub struct PeriodPoint {
    pub period: Period,
    pub numerator: usize,
    pub denominator: usize,
    pub percent: f64,
}

pub struct TrendReport {
    pub points: Vec<PeriodPoint>,
    pub forecast_label: String,
    pub linear: linear::LinearFit,
    pub gam: gam::GamFit,
    pub cv: EngineResult<cv::CvResult>,
}

const MIN_NON_EMPTY_PERIODS: usize = 3;

/// Runs the full pipeline for one (organism, target, filters) combination.
/// Fails outright below the 3-non-empty-period guard rail (spec.md §4.8
/// "Guard rails"); a subsequent CV failure (too few periods for even one
/// fold) is carried as `Err` in `TrendReport::cv` rather than aborting —
/// the two models have already been fit by that point (spec.md §7
/// "the other model is still attempted").
pub fn analyze(store: &impl Store, req: &TrendRequest) -> EngineResult<TrendReport> {
    let periods = period::bucket_periods(req.from, req.to, req.grouping);
    let points = per_period_series(store, req, &periods)?;

    let non_empty = points.iter().filter(|p| p.denominator > 0).count();
    if non_empty < MIN_NON_EMPTY_PERIODS {
        return Err(EngineError::Insufficient(format!("trend analysis needs at least {MIN_NON_EMPTY_PERIODS} non-empty periods, got {non_empty}")));
    }

    let series: Vec<f64> = points.iter().map(|p| p.percent).collect();
    let linear_fit = linear::fit(&series)?;
    let cv_result = cv::run(&series);
    let selected_lambda = cv_result.as_ref().map(|r| r.selected_lambda).unwrap_or(1.0);
    let gam_fit = gam::fit(&series, selected_lambda)?;

    let forecast_label = periods.last().map(|p| period::next_period_label(p, req.grouping)).unwrap_or_default();

    Ok(TrendReport { points, forecast_label, linear: linear_fit, gam: gam_fit, cv: cv_result })
}

fn per_period_series(store: &impl Store, req: &TrendRequest, periods: &[Period]) -> EngineResult<Vec<PeriodPoint>> {
    let (_, profile, isolates) = aggregate::scoped_isolates(store, req.tenant, req.organism_tenant, req.from, req.to)?;

    let tenant_antibiotic = match req.target {
        TrendTarget::Antibiotic(tenant_antibiotic) => {
            if !profile.entries.iter().any(|e| e.tenant_antibiotic == tenant_antibiotic && e.show_in_report) {
                return Err(EngineError::Domain("antibiotic is not visible in the organism's profile".into()));
            }
            Some(tenant_antibiotic)
        }
        TrendTarget::Mechanism { .. } => None,
    };

    let mut points = Vec::with_capacity(periods.len());
    for period in periods {
        let in_period: Vec<&Isolate> = isolates
            .iter()
            .filter(|isolate| store.get_record(isolate.record).map(|r| r.date >= period.start && r.date <= period.end).unwrap_or(false))
            .collect();

        let (numerator, denominator) = match (req.target, tenant_antibiotic) {
            (TrendTarget::Antibiotic(_), Some(ta)) => {
                let (mut susceptible_or_intermediate, mut total) = (0usize, 0usize);
                for isolate in &in_period {
                    if let Some(interpretation) = aggregate::resolved_interpretation(store, isolate, ta, req.eucast_version) {
                        match interpretation {
                            Interpretation::S | Interpretation::I => {
                                susceptible_or_intermediate += 1;
                                total += 1;
                            }
                            Interpretation::R => total += 1,
                            Interpretation::Nd | Interpretation::Na => {}
                        }
                    }
                }
                (susceptible_or_intermediate, total)
            }
            (TrendTarget::Mechanism { mechanism, subtype }, _) => {
                let carriers = in_period
                    .iter()
                    .filter(|isolate| isolate.mechanisms.contains(&mechanism) && subtype.is_none_or(|s| isolate.subtypes.contains(&s)))
                    .count();
                (carriers, in_period.len())
            }
            _ => (0, 0),
        };

        let percent = if denominator == 0 { 0.0 } else { (numerator as f64 / denominator as f64) * 100.0 };
        points.push(PeriodPoint { period: period.clone(), numerator, denominator, percent });
    }
    Ok(points)
}
