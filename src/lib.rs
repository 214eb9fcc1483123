//! Compiles user-built criteria trees into filter text for a query backend.

pub mod compiler;
pub mod config;
pub mod error;
pub mod factory;
pub mod model;
pub mod related_filter;
pub mod source_resolver;
pub mod sql_compiler;
pub mod validation;

pub use compiler::{
    attribute_filter, build_related_fragments, ConditionCompiler, CriteriaCompiler, RelatedFilterCombiner,
};
pub use config::FormLabelConfig;
pub use error::{CompileError, ConfigError, Result};
pub use factory::{
    create_criteria, create_criteria_condition, create_criteria_group, IdGenerator, SequentialIdGenerator,
};
pub use related_filter::RelatedLayerCombiner;
pub use source_resolver::{get_available_sources, LabelLookup};
pub use sql_compiler::SqlFilterCompiler;
pub use validation::{is_valid_criteria_condition, valid_groups};
