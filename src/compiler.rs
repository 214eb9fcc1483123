//! Criteria compiler that turns a criteria tree into a single filter string.
//!
//! ```text
//! convert_criteria_to_query(tree)            "(G1 OP G2 ...)"
//!   └─ convert_group_to_query(group)         "(C1 OP C2 ...)"
//!        └─ convert_condition_to_query(c)
//!             ├─ ConditionCompiler           leaf predicate
//!             └─ relatedTo non-empty?
//!                  ├─ build_related_fragments   condition-0 .. condition-n
//!                  └─ RelatedFilterCombiner     chain rooted at condition-0
//! ```
//!
//! The tree is exactly two levels deep. Callers are expected to check
//! [`valid_groups`](crate::validation::valid_groups) first; compiling an invalid
//! tree either fails with [`CompileError::IncompleteCondition`] or yields
//! whatever the collaborators make of the partial input.

use tracing::{debug, trace};

use crate::error::{CompileError, Result};
use crate::model::{
    AttributeFilter, CriteriaCondition, CriteriaGroup, CriteriaTree, FeatureTypeId, RelatedFilterFragment,
};
use crate::related_filter::RelatedLayerCombiner;
use crate::sql_compiler::SqlFilterCompiler;

/// Compiles one attribute/operator/value triple into backend filter text.
pub trait ConditionCompiler {
    fn compile(&self, filter: &AttributeFilter) -> Result<String>;
}

impl<F> ConditionCompiler for F
where
    F: Fn(&AttributeFilter) -> Result<String>,
{
    fn compile(&self, filter: &AttributeFilter) -> Result<String> {
        self(filter)
    }
}

/// Combines a root-to-leaf fragment chain into one filter rooted at `root_id`.
pub trait RelatedFilterCombiner {
    fn combine(&self, root_id: &str, fragments: &[RelatedFilterFragment]) -> Result<String>;
}

impl<F> RelatedFilterCombiner for F
where
    F: Fn(&str, &[RelatedFilterFragment]) -> Result<String>,
{
    fn combine(&self, root_id: &str, fragments: &[RelatedFilterFragment]) -> Result<String> {
        self(root_id, fragments)
    }
}

/// Criteria compiler with pluggable leaf and relation collaborators.
#[derive(Debug, Clone)]
pub struct CriteriaCompiler<C = SqlFilterCompiler, R = RelatedLayerCombiner> {
    condition_compiler: C,
    related_combiner: R,
}

impl CriteriaCompiler {
    pub fn new() -> Self {
        Self::with_collaborators(SqlFilterCompiler::new(), RelatedLayerCombiner)
    }
}

impl Default for CriteriaCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ConditionCompiler, R: RelatedFilterCombiner> CriteriaCompiler<C, R> {
    pub fn with_collaborators(condition_compiler: C, related_combiner: R) -> Self {
        Self {
            condition_compiler,
            related_combiner,
        }
    }

    /// Compile a whole tree. A missing tree or missing groups compile to `""`.
    pub fn convert_criteria_to_query(&self, criteria: Option<&CriteriaTree>) -> Result<String> {
        let Some(criteria) = criteria else {
            return Ok(String::new());
        };
        let Some(groups) = criteria.groups.as_ref() else {
            return Ok(String::new());
        };

        debug!(groups = groups.len(), operator = %criteria.operator, "Compiling criteria tree");

        let query = groups
            .iter()
            .map(|group| self.convert_group_to_query(group))
            .collect::<Result<Vec<_>>>()?
            .join(&format!(" {} ", criteria.operator));

        Ok(format!("({})", query))
    }

    pub fn convert_group_to_query(&self, group: &CriteriaGroup) -> Result<String> {
        let criteria = group
            .criteria
            .iter()
            .map(|condition| self.convert_condition_to_query(condition))
            .collect::<Result<Vec<_>>>()?
            .join(&format!(" {} ", group.operator));

        Ok(format!("({})", criteria))
    }

    /// Compile one condition, scoping it through its relation chain if it has one.
    pub fn convert_condition_to_query(&self, condition: &CriteriaCondition) -> Result<String> {
        let attribute_filter = attribute_filter(condition)?;
        let filter = self.condition_compiler.compile(&attribute_filter)?;

        match condition.related_to.as_deref() {
            Some(related_to) if !related_to.is_empty() => {
                self.get_related_filter(filter, related_to, attribute_filter.feature_type)
            }
            _ => Ok(filter),
        }
    }

    fn get_related_filter(&self, filter: String, related_to: &[FeatureTypeId], source: FeatureTypeId) -> Result<String> {
        let fragments = build_related_fragments(filter, related_to, source);
        debug!(fragments = fragments.len(), source, "Compiling related filter chain");

        // The fragment list always holds at least the leaf
        let root_id = &fragments[0].data_id;
        self.related_combiner.combine(root_id, &fragments)
    }
}

/// Build the descriptor handed to the single-condition compiler.
pub fn attribute_filter(condition: &CriteriaCondition) -> Result<AttributeFilter> {
    let missing = |field| CompileError::IncompleteCondition {
        id: condition.id.clone(),
        field,
    };

    let source = condition.source.ok_or_else(|| missing("source"))?;
    let attribute = condition.attribute.clone().ok_or_else(|| missing("attribute"))?;
    let operator = condition.condition.clone().ok_or_else(|| missing("condition"))?;

    Ok(AttributeFilter {
        data_id: format!("{}_{}_{}", source, attribute, operator),
        feature_type: source,
        attribute,
        condition: operator,
        value: condition.value.clone().unwrap_or_default(),
        attribute_type: condition.attribute_type,
    })
}

/// Lay out the relation chain from the top-most ancestor down to the leaf.
///
/// Ids are `condition-{n}` with `n` counting from zero within this call; only
/// the leaf fragment carries `filter`.
pub fn build_related_fragments(
    filter: String,
    related_to: &[FeatureTypeId],
    source: FeatureTypeId,
) -> Vec<RelatedFilterFragment> {
    let mut fragments = Vec::with_capacity(related_to.len() + 1);
    let mut parent: Option<(String, FeatureTypeId)> = None;

    for (index, &feature_type) in related_to.iter().enumerate() {
        let data_id = format!("condition-{}", index);
        fragments.push(RelatedFilterFragment {
            data_id: data_id.clone(),
            parent_id: parent.as_ref().map(|(id, _)| id.clone()),
            feature_type,
            parent_feature_type: parent.as_ref().map(|(_, ft)| *ft),
            filter: None,
        });
        parent = Some((data_id, feature_type));
    }

    let (parent_id, parent_feature_type) = parent.unzip();
    fragments.push(RelatedFilterFragment {
        data_id: format!("condition-{}", related_to.len()),
        parent_id,
        feature_type: source,
        parent_feature_type,
        filter: Some(filter),
    });

    trace!(?fragments, "Built related filter fragments");
    fragments
}
