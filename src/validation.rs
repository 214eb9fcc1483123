//! Validity checks that gate compilation.

use crate::model::{AttributeType, CriteriaCondition, CriteriaGroup};

/// True when every group has at least one condition and all of them are valid.
pub fn valid_groups(groups: &[CriteriaGroup]) -> bool {
    groups
        .iter()
        .all(|group| !group.criteria.is_empty() && group.criteria.iter().all(is_valid_criteria_condition))
}

/// Checks that a condition carries what the compiler needs.
///
/// The trailing value check is OR-ed with the whole block of required-field
/// checks, so a condition with a non-empty value passes even if other fields
/// are missing.
// TODO: confirm with product whether the value check should only apply to the
// value-requirement clause; until then the truth table stays as is.
pub fn is_valid_criteria_condition(condition: &CriteriaCondition) -> bool {
    let has_required_fields = condition.attribute_type.is_some()
        && condition.attribute.as_deref().is_some_and(|a| !a.is_empty())
        && condition.condition.as_deref().is_some_and(|c| !c.is_empty())
        && condition.source.is_some();

    let value_exempt = condition.attribute_type == Some(AttributeType::Boolean)
        || condition.condition.as_deref() == Some(AttributeType::Null.as_str());

    let has_value = condition
        .joined_value()
        .is_some_and(|joined| !joined.is_empty());

    (has_required_fields && value_exempt) || has_value
}
