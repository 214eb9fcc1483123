//! 条件树的数据模型: 条件树、条件组、单个条件, 以及数据源和关联元数据

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// 要素类型的标识符
pub type FeatureTypeId = i64;

/// 条件树的根节点, 用一个运算符组合所有条件组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaTree {
    #[serde(rename = "type", default)]
    pub criteria_type: CriteriaType,
    #[serde(default)]
    pub operator: CriteriaOperator,
    /// 条件组列表, 缺失时编译结果为空字符串
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<CriteriaGroup>>,
}

/// 条件树的类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriteriaType {
    #[default]
    Simple,
    Multiple,
}

/// 组合条件的逻辑运算符
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CriteriaOperator {
    #[default]
    And,
    Or,
}

impl fmt::Display for CriteriaOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriteriaOperator::And => write!(f, "AND"),
            CriteriaOperator::Or => write!(f, "OR"),
        }
    }
}

/// 一组条件, 用同一个运算符组合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaGroup {
    pub id: String,
    #[serde(default)]
    pub operator: CriteriaOperator,
    #[serde(default)]
    pub criteria: Vec<CriteriaCondition>,
}

/// 单个条件: 对某个要素类型的一个属性进行测试
///
/// 除 `id` 外所有字段都是可选的, 因为条件在界面上逐步填写。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaCondition {
    pub id: String,
    /// 只接受整数值 (包括 `3.0` 这样的整数浮点数), 其他值视为未设置
    #[serde(default, deserialize_with = "deserialize_source", skip_serializing_if = "Option::is_none")]
    pub source: Option<FeatureTypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<AttributeType>,
    /// 运算符标记, 例如 `=`、`like`、`null`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Vec<Option<ConditionValue>>>,
    /// 祖先要素类型链, 从最顶层的关联开始, 不包含 `source` 本身
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_to: Option<Vec<FeatureTypeId>>,
}

/// 非整数的 `source` 不让整个条件树解析失败, 只让该条件无效
fn deserialize_source<'de, D>(deserializer: D) -> Result<Option<FeatureTypeId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let source = match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as FeatureTypeId)
        }),
        _ => None,
    };
    Ok(source)
}

impl CriteriaCondition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// 值按文本拼接 (无分隔符), 缺失的元素视为空字符串
    pub fn joined_value(&self) -> Option<String> {
        self.value.as_ref().map(|values| {
            values
                .iter()
                .flatten()
                .map(ToString::to_string)
                .collect::<String>()
        })
    }
}

/// 属性类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Integer,
    Double,
    Boolean,
    Date,
    Timestamp,
    Geometry,
    /// 空值标记, 运算符等于它时表示 "值为空" 的测试
    Null,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Integer => "integer",
            AttributeType::Double => "double",
            AttributeType::Boolean => "boolean",
            AttributeType::Date => "date",
            AttributeType::Timestamp => "timestamp",
            AttributeType::Geometry => "geometry",
            AttributeType::Null => "null",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, AttributeType::Integer | AttributeType::Double)
    }
}

/// 条件值中的单个标量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionValue::Bool(b) => write!(f, "{}", b),
            // 整数值不带小数部分输出
            ConditionValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            ConditionValue::Number(n) => write!(f, "{}", n),
            ConditionValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        ConditionValue::Text(value.to_string())
    }
}

impl From<f64> for ConditionValue {
    fn from(value: f64) -> Self {
        ConditionValue::Number(value)
    }
}

impl From<bool> for ConditionValue {
    fn from(value: bool) -> Self {
        ConditionValue::Bool(value)
    }
}

/// 当前选中的根数据源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSource {
    pub feature_type: FeatureTypeId,
    pub label: String,
}

/// 可供选择的数据源, 由关联树展开得到
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSource {
    pub feature_type: FeatureTypeId,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_to: Option<Vec<FeatureTypeId>>,
}

/// 根要素类型的关联元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_type: Option<FeatureTypeId>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

/// 一条外键关联, 可以继续嵌套更深的关联
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub foreign_feature_type: FeatureTypeId,
    pub foreign_feature_type_name: String,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

/// 传给单条件编译器的描述符
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeFilter {
    /// `"{source}_{attribute}_{condition}"`
    pub data_id: String,
    pub feature_type: FeatureTypeId,
    pub attribute: String,
    pub condition: String,
    #[serde(default)]
    pub value: Vec<Option<ConditionValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<AttributeType>,
}

/// 关联链中的一个片段, 只有叶子片段携带 `filter`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedFilterFragment {
    pub data_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub feature_type: FeatureTypeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_feature_type: Option<FeatureTypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}
