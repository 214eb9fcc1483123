//! 数据源解析: 把根数据源的关联树展开成一个带缩进的可选列表
//!
//! ```text
//! Trees                      (根, 无 relatedTo)
//! Inspections                relatedTo = []
//! Parts                      relatedTo = []
//! ---- Bolts                 relatedTo = [Parts]
//! ---- Nuts                  relatedTo = [Parts]
//! ```
//!
//! 只有当一个关联的下级关联 **多于一个** 时才会继续展开。
//! 要素类型id已出现在根或祖先链中的关联 (包括自关联) 只列出, 不展开。

use std::collections::HashMap;
use tracing::warn;

use crate::model::{AnalysisSource, AttributeMetadata, AttributeSource, FeatureTypeId, Relation};

/// 每一层缩进的破折号数量
const INDENT_WIDTH: usize = 4;

/// 按要素类型名称查找表单标签
pub trait LabelLookup {
    fn label(&self, feature_type_name: &str) -> Option<String>;
}

impl LabelLookup for HashMap<String, String> {
    fn label(&self, feature_type_name: &str) -> Option<String> {
        self.get(feature_type_name).cloned()
    }
}

/// 返回可选数据源列表: 根数据源在前, 然后是前序展开的关联
///
/// 元数据尚未加载时返回空列表。
pub fn get_available_sources<L: LabelLookup + ?Sized>(
    selected: &AnalysisSource,
    metadata: Option<&AttributeMetadata>,
    labels: &L,
) -> Vec<AttributeSource> {
    let Some(metadata) = metadata else {
        return Vec::new();
    };

    let mut sources = vec![AttributeSource {
        feature_type: selected.feature_type,
        label: selected.label.clone(),
        related_to: None,
    }];
    sources.extend(get_relation_sources(
        &metadata.relations,
        labels,
        &[],
        selected.feature_type,
    ));
    sources
}

/// 递归展开一层关联, `related_to` 是到当前层为止的祖先链
fn get_relation_sources<L: LabelLookup + ?Sized>(
    relations: &[Relation],
    labels: &L,
    related_to: &[FeatureTypeId],
    root: FeatureTypeId,
) -> Vec<AttributeSource> {
    let indent = indent_for(related_to.len());
    let mut sources = Vec::new();

    for relation in relations {
        let name = labels
            .label(&relation.foreign_feature_type_name)
            .unwrap_or_else(|| relation.foreign_feature_type_name.clone());

        sources.push(AttributeSource {
            feature_type: relation.foreign_feature_type,
            label: format!("{}{}", indent, name),
            related_to: Some(related_to.to_vec()),
        });

        if relation.relations.len() <= 1 {
            continue;
        }

        // 按要素类型id判断重复: 要素类型已是根或已在祖先链中时只列出该节点, 不再深入。
        // 自关联 (例如树表关联到自身) 也因此不会展开, 即使元数据本身是有限的树
        if relation.foreign_feature_type == root || related_to.contains(&relation.foreign_feature_type) {
            warn!(
                feature_type = relation.foreign_feature_type,
                name = %relation.foreign_feature_type_name,
                "Feature type repeats in its ancestor chain, not expanding nested relations"
            );
            continue;
        }

        let mut chain = related_to.to_vec();
        chain.push(relation.foreign_feature_type);
        sources.extend(get_relation_sources(&relation.relations, labels, &chain, root));
    }

    sources
}

fn indent_for(depth: usize) -> String {
    if depth == 0 {
        String::new()
    } else {
        format!("{} ", "-".repeat(depth * INDENT_WIDTH))
    }
}
