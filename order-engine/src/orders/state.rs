//! Order status state machine
//!
//! ```text
//! PENDING ──accept──▶ PREPARING ──▶ READY ──▶ SERVED | COMPLETED
//!    │                    │            │
//!    └────────────────────┴────────────┴──▶ CANCELLED
//! ```
//!
//! Pure: decides whether a move is legal and which stock effect it carries.
//! The caller always passes the status read under the order lock.

use crate::core::{EngineError, EngineResult};
use shared::models::OrderStatus;

/// Stock side effect of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    None,
    /// Accept: validate then deduct the order's recipe requirements
    Deduct,
    /// Cancel after accept: return what the order holds, unless it was paid
    RestoreUnlessPaid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub effect: StockEffect,
}

/// Whether `from → to` is a legal move
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    effect_of(from, to).is_some()
}

fn effect_of(from: OrderStatus, to: OrderStatus) -> Option<StockEffect> {
    use OrderStatus::*;
    match (from, to) {
        (Pending, Preparing) => Some(StockEffect::Deduct),
        (Preparing, Ready) | (Ready, Served) | (Ready, Completed) => Some(StockEffect::None),
        (Pending, Cancelled) => Some(StockEffect::None),
        (Preparing, Cancelled) | (Ready, Cancelled) => Some(StockEffect::RestoreUnlessPaid),
        _ => None,
    }
}

pub fn plan_transition(
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
) -> EngineResult<TransitionPlan> {
    effect_of(from, to)
        .map(|effect| TransitionPlan { from, to, effect })
        .ok_or(EngineError::InvalidTransition { order_id, from, to })
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_legal_moves_and_effects() {
        let cases = [
            (Pending, Preparing, StockEffect::Deduct),
            (Preparing, Ready, StockEffect::None),
            (Ready, Served, StockEffect::None),
            (Ready, Completed, StockEffect::None),
            (Pending, Cancelled, StockEffect::None),
            (Preparing, Cancelled, StockEffect::RestoreUnlessPaid),
            (Ready, Cancelled, StockEffect::RestoreUnlessPaid),
        ];
        for (from, to, effect) in cases {
            let plan = plan_transition(1, from, to).unwrap();
            assert_eq!(plan.effect, effect, "{from} -> {to}");
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in [Served, Completed, Cancelled] {
            for to in OrderStatus::ALL {
                assert!(!can_transition(from, to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_no_skips_no_backwards_no_self() {
        assert!(!can_transition(Pending, Ready));
        assert!(!can_transition(Pending, Served));
        assert!(!can_transition(Preparing, Served));
        assert!(!can_transition(Ready, Preparing));
        assert!(!can_transition(Preparing, Pending));
        for status in OrderStatus::ALL {
            assert!(!can_transition(status, status));
        }
    }

    #[test]
    fn test_rejection_names_both_states() {
        let err = plan_transition(42, Cancelled, Preparing).unwrap_err();
        match err {
            EngineError::InvalidTransition { order_id, from, to } => {
                assert_eq!(order_id, 42);
                assert_eq!(from, Cancelled);
                assert_eq!(to, Preparing);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
