use serde::Serialize;

/// Governance action derived from projected usage against the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    Safe = 0,
    Monitor = 1,
    Caution = 2,
    Cleanup = 3,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Evaluation {
    pub action: Action,
    pub projected_pct: f64,
    pub amount_to_delete_mb: f64,
}

const MONITOR_PCT: f64 = 85.0;
const CAUTION_PCT: f64 = 90.0;
const CLEANUP_PCT: f64 = 95.0;

/// Fraction of the limit that cleanup tries to bring projected usage
/// back down to.
const RECOVERY_TARGET: f64 = 0.70;

/// Map predicted usage against the capacity limit to an action and the
/// amount to free. A non-positive limit disables governance entirely.
pub fn evaluate_threshold(predicted_mb: f64, limit_mb: f64) -> Evaluation {
    if limit_mb <= 0.0 {
        return Evaluation {
            action: Action::Safe,
            projected_pct: 0.0,
            amount_to_delete_mb: 0.0,
        };
    }

    let projected_pct = predicted_mb / limit_mb * 100.0;

    let (action, amount_to_delete_mb) = if projected_pct < MONITOR_PCT {
        (Action::Safe, 0.0)
    } else if projected_pct < CAUTION_PCT {
        (Action::Monitor, 0.0)
    } else if projected_pct < CLEANUP_PCT {
        (Action::Caution, 0.0)
    } else {
        let to_delete = (predicted_mb - limit_mb * RECOVERY_TARGET).max(0.0);
        (Action::Cleanup, to_delete)
    };

    Evaluation {
        action,
        projected_pct,
        amount_to_delete_mb,
    }
}
