//! Candidate selection and trip assembly.
//!
//! An advisory hint is untrusted: it is used only when it names a valid
//! delivery with an eligible drone. Otherwise every delivery is evaluated as
//! the drone candidate and the lowest combined emission wins, ties going to
//! the earliest index.

use crate::error::{validate_inputs, PlanError};
use crate::evaluator::{evaluate_candidate, CandidateEvaluation, EvaluationOverrides, PlanningContext};
use crate::models::{DeliveryRequest, Drone, GeoPoint, PlanOutcome, SelectionSource, Trip};
use crate::rules::PlanningRules;

#[derive(Debug, Clone, Default)]
pub struct TripOptimizer {
    rules: PlanningRules,
}

impl TripOptimizer {
    pub fn new(rules: PlanningRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &PlanningRules {
        &self.rules
    }

    /// Plan a hybrid trip.
    ///
    /// Only malformed input is an error; no eligible drone for any delivery
    /// yields [`PlanOutcome::Infeasible`].
    pub fn plan(
        &self,
        depot: GeoPoint,
        deliveries: &[DeliveryRequest],
        fleet: &[Drone],
        advisory_index: Option<usize>,
    ) -> Result<PlanOutcome, PlanError> {
        validate_inputs(&depot, deliveries, fleet, &self.rules)?;
        let ctx = PlanningContext::new(depot, deliveries, fleet, &self.rules);

        if let Some(index) = advisory_index {
            if let Some(mut hinted) = evaluate_candidate(&ctx, index, &EvaluationOverrides::default())
            {
                hinted.trip.selection = SelectionSource::Advisory { index };
                return Ok(PlanOutcome::Planned(hinted.trip));
            }
        }

        Ok(select_best(&ctx))
    }

    /// Every feasible candidate in index order.
    pub fn evaluate_all(
        &self,
        depot: GeoPoint,
        deliveries: &[DeliveryRequest],
        fleet: &[Drone],
    ) -> Result<Vec<CandidateEvaluation>, PlanError> {
        validate_inputs(&depot, deliveries, fleet, &self.rules)?;
        let ctx = PlanningContext::new(depot, deliveries, fleet, &self.rules);
        Ok((0..deliveries.len())
            .filter_map(|index| evaluate_candidate(&ctx, index, &EvaluationOverrides::default()))
            .collect())
    }

    /// Evaluate one fixed candidate, optionally with external inputs.
    pub fn plan_candidate(
        &self,
        depot: GeoPoint,
        deliveries: &[DeliveryRequest],
        fleet: &[Drone],
        index: usize,
        overrides: &EvaluationOverrides<'_>,
    ) -> Result<PlanOutcome, PlanError> {
        validate_inputs(&depot, deliveries, fleet, &self.rules)?;
        let ctx = PlanningContext::new(depot, deliveries, fleet, &self.rules);
        Ok(evaluate_candidate(&ctx, index, overrides)
            .map(|eval| PlanOutcome::Planned(eval.trip))
            .unwrap_or(PlanOutcome::Infeasible))
    }

    /// Re-run the evaluation behind `trip` with road geometry or an oracle
    /// leg time. The result is a new trip carrying the original selection.
    pub fn refine(
        &self,
        trip: &Trip,
        deliveries: &[DeliveryRequest],
        fleet: &[Drone],
        overrides: &EvaluationOverrides<'_>,
    ) -> Result<PlanOutcome, PlanError> {
        let outcome = self.plan_candidate(
            trip.depot,
            deliveries,
            fleet,
            trip.drone_delivery_index,
            overrides,
        )?;
        Ok(match outcome {
            PlanOutcome::Planned(mut refined) => {
                refined.selection = trip.selection;
                PlanOutcome::Planned(refined)
            }
            PlanOutcome::Infeasible => PlanOutcome::Infeasible,
        })
    }
}

/// Plan with the default rules.
pub fn plan(
    depot: GeoPoint,
    deliveries: &[DeliveryRequest],
    fleet: &[Drone],
    advisory_index: Option<usize>,
) -> Result<PlanOutcome, PlanError> {
    TripOptimizer::default().plan(depot, deliveries, fleet, advisory_index)
}

fn select_best(ctx: &PlanningContext<'_>) -> PlanOutcome {
    let candidates = ctx.deliveries().len();
    let mut feasible = 0usize;
    let mut best: Option<CandidateEvaluation> = None;

    for index in 0..candidates {
        let Some(eval) = evaluate_candidate(ctx, index, &EvaluationOverrides::default()) else {
            continue;
        };
        feasible += 1;

        let better = match &best {
            Some(current) => eval.hybrid_carbon_kg < current.hybrid_carbon_kg,
            None => true,
        };
        if better {
            best = Some(eval);
        }
    }

    match best {
        Some(mut winner) => {
            winner.trip.selection = SelectionSource::Enumerated {
                candidates_evaluated: candidates,
                feasible_candidates: feasible,
            };
            PlanOutcome::Planned(winner.trip)
        }
        None => PlanOutcome::Infeasible,
    }
}
