//! Agent assignment: pick an agent for a lead by strategy.

use tracing::warn;

use crate::config::AssignStrategy;
use crate::error::AssignmentError;
use crate::traits::AgentMatcher;
use crate::types::{AgentCandidate, Contact};

/// Select an agent for the contact.
///
/// Candidates at capacity are filtered out first; an empty pool after
/// filtering is the reported `no_capacity` error.  The heuristic strategy
/// consults the external matcher and falls back to least-loaded on any
/// matcher failure — agent assignment must never raise past the capacity
/// check, or lead routing would stall.
pub async fn select_agent(
    strategy: AssignStrategy,
    fixed_agent_id: Option<&str>,
    candidates: &[AgentCandidate],
    contact: &Contact,
    matcher: Option<&dyn AgentMatcher>,
) -> Result<AgentCandidate, AssignmentError> {
    let eligible: Vec<&AgentCandidate> =
        candidates.iter().filter(|a| a.has_capacity()).collect();
    if eligible.is_empty() {
        return Err(AssignmentError::NoCapacity);
    }

    let picked = match strategy {
        AssignStrategy::LeastLoaded => least_loaded(&eligible),
        AssignStrategy::Fixed => fixed_agent_id
            .and_then(|id| eligible.iter().find(|a| a.id == id).copied())
            .unwrap_or(eligible[0]),
        AssignStrategy::Heuristic => heuristic(&eligible, contact, matcher).await,
    };

    Ok(picked.clone())
}

/// Ascending by current load; ties keep enumeration order.
fn least_loaded<'a>(eligible: &[&'a AgentCandidate]) -> &'a AgentCandidate {
    eligible
        .iter()
        .min_by_key(|a| a.active_lead_count)
        .copied()
        .unwrap_or(eligible[0])
}

async fn heuristic<'a>(
    eligible: &[&'a AgentCandidate],
    contact: &Contact,
    matcher: Option<&dyn AgentMatcher>,
) -> &'a AgentCandidate {
    let Some(matcher) = matcher else {
        warn!("heuristic assignment without a matcher, falling back to least-loaded");
        return least_loaded(eligible);
    };

    let pool: Vec<AgentCandidate> = eligible.iter().map(|a| (*a).clone()).collect();
    match matcher.score(contact, &pool).await {
        Ok(scores) if scores.len() == eligible.len() => {
            let mut best = 0;
            for (idx, score) in scores.iter().enumerate() {
                if *score > scores[best] {
                    best = idx;
                }
            }
            eligible[best]
        }
        Ok(scores) => {
            warn!(
                expected = eligible.len(),
                got = scores.len(),
                "matcher returned a malformed score vector, falling back to least-loaded"
            );
            least_loaded(eligible)
        }
        Err(e) => {
            warn!(error = %e, "matcher failed, falling back to least-loaded");
            least_loaded(eligible)
        }
    }
}
