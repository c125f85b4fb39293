//! Write conditions for the lock record
//!
//! A condition is evaluated by the store against the current record at write
//! time. Every identifier and timestamp travels as a bound value; the expression
//! text is a fixed constant so no caller data is ever spliced into it.

use dynalock_common::{ATTR_EXPIRATION_TIME, ATTR_HOLDER_IDENTIFIER};

use crate::model::LockItem;

/// Record may be claimed: no holder, an empty holder, the claimant itself, or a lapsed lease
pub const CLAIMABLE_EXPRESSION: &str =
    "attribute_not_exists(#holder) OR #holder = :empty OR #holder = :self OR #expires <= :now";

/// Record is still held by the given holder
pub const HELD_BY_EXPRESSION: &str = "#holder = :holder";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCondition {
    /// Unheld, already held by `holder`, or held under a lease that is over
    /// at `now` (Unix seconds)
    Claimable { now: i64, holder: String },
    /// Held by exactly this holder
    HeldBy { holder: String },
}

/// A bound expression value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundValue {
    S(String),
    N(i64),
}

/// Server-side rendering of a [`WriteCondition`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionExpression {
    pub expression: &'static str,
    /// `#placeholder` -> attribute name
    pub names: Vec<(&'static str, &'static str)>,
    /// `:placeholder` -> bound value
    pub values: Vec<(&'static str, BoundValue)>,
}

impl WriteCondition {
    pub fn claimable(now: i64, holder: impl Into<String>) -> Self {
        Self::Claimable {
            now,
            holder: holder.into(),
        }
    }

    pub fn held_by(holder: impl Into<String>) -> Self {
        Self::HeldBy {
            holder: holder.into(),
        }
    }

    /// Evaluate against the record as it exists right now.
    ///
    /// Store implementations that evaluate conditions themselves must call this
    /// while holding the item exclusively.
    pub fn is_satisfied_by(&self, current: Option<&LockItem>) -> bool {
        match self {
            Self::Claimable { now, holder } => match current {
                None => true,
                Some(item) => {
                    item.is_unheld()
                        || item.holder_identifier == *holder
                        || item.is_expired_at(*now)
                }
            },
            Self::HeldBy { holder } => {
                current.is_some_and(|item| item.holder_identifier == *holder)
            }
        }
    }

    pub fn to_expression(&self) -> ConditionExpression {
        match self {
            Self::Claimable { now, holder } => ConditionExpression {
                expression: CLAIMABLE_EXPRESSION,
                names: vec![
                    ("#holder", ATTR_HOLDER_IDENTIFIER),
                    ("#expires", ATTR_EXPIRATION_TIME),
                ],
                values: vec![
                    (":empty", BoundValue::S(String::new())),
                    (":self", BoundValue::S(holder.clone())),
                    (":now", BoundValue::N(*now)),
                ],
            },
            Self::HeldBy { holder } => ConditionExpression {
                expression: HELD_BY_EXPRESSION,
                names: vec![("#holder", ATTR_HOLDER_IDENTIFIER)],
                values: vec![(":holder", BoundValue::S(holder.clone()))],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claimable_on_missing_record() {
        assert!(WriteCondition::claimable(100, "holder-a").is_satisfied_by(None));
    }

    #[test]
    fn test_claimable_on_unheld_record() {
        let item = LockItem::new("k", "", 10_000);
        assert!(WriteCondition::claimable(100, "holder-a").is_satisfied_by(Some(&item)));
    }

    #[test]
    fn test_claimable_respects_live_lease() {
        let item = LockItem::new("k", "holder-a", 200);
        assert!(!WriteCondition::claimable(199, "holder-b").is_satisfied_by(Some(&item)));
        assert!(WriteCondition::claimable(200, "holder-b").is_satisfied_by(Some(&item)));
        assert!(WriteCondition::claimable(500, "holder-b").is_satisfied_by(Some(&item)));
    }

    #[test]
    fn test_claimable_by_current_holder() {
        // Re-claiming a live lease you already hold is allowed
        let item = LockItem::new("k", "holder-a", 200);
        assert!(WriteCondition::claimable(100, "holder-a").is_satisfied_by(Some(&item)));
        assert!(!WriteCondition::claimable(100, "holder-b").is_satisfied_by(Some(&item)));
    }

    #[test]
    fn test_held_by() {
        let item = LockItem::new("k", "holder-a", 200);
        assert!(WriteCondition::held_by("holder-a").is_satisfied_by(Some(&item)));
        assert!(!WriteCondition::held_by("holder-b").is_satisfied_by(Some(&item)));
        assert!(!WriteCondition::held_by("holder-a").is_satisfied_by(None));
    }

    #[test]
    fn test_held_by_ignores_expiry() {
        // Ownership checks do not look at the lease; an expired but unstolen
        // record can still be refreshed by its holder.
        let item = LockItem::new("k", "holder-a", 0);
        assert!(WriteCondition::held_by("holder-a").is_satisfied_by(Some(&item)));
    }

    #[test]
    fn test_expression_binds_holder_as_value() {
        let holder = "abc' OR '1'='1";
        let expr = WriteCondition::held_by(holder).to_expression();
        assert_eq!(expr.expression, HELD_BY_EXPRESSION);
        assert!(!expr.expression.contains(holder));
        assert_eq!(
            expr.values,
            vec![(":holder", BoundValue::S(holder.to_string()))]
        );
        assert_eq!(expr.names, vec![("#holder", "HolderIdentifier")]);
    }

    #[test]
    fn test_claimable_expression_placeholders() {
        let expr = WriteCondition::claimable(1_700_000_000, "holder-a").to_expression();
        for (placeholder, _) in &expr.names {
            assert!(expr.expression.contains(placeholder));
        }
        for (placeholder, _) in &expr.values {
            assert!(expr.expression.contains(placeholder));
        }
        assert!(!expr.expression.contains("1700000000"));
        assert!(!expr.expression.contains("holder-a"));
        assert!(expr.values.contains(&(":now", BoundValue::N(1_700_000_000))));
        assert!(
            expr.values
                .contains(&(":self", BoundValue::S("holder-a".to_string())))
        );
    }
}
