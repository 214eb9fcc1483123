use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use criteria_compiler::model::{
    AnalysisSource, AttributeMetadata, AttributeType, ConditionValue, CriteriaCondition, CriteriaGroup,
    CriteriaOperator, CriteriaTree, CriteriaType, Relation,
};
use criteria_compiler::{build_related_fragments, get_available_sources, CriteriaCompiler};
use std::collections::HashMap;
use std::hint::black_box;

// 构造一个条件
fn condition(index: usize, related_to: Option<Vec<i64>>) -> CriteriaCondition {
    CriteriaCondition {
        id: format!("criteria-{}", index),
        source: Some(9),
        attribute: Some(format!("attribute_{}", index)),
        attribute_type: Some(AttributeType::Integer),
        condition: Some(">=".to_string()),
        value: Some(vec![Some(ConditionValue::Number(index as f64))]),
        related_to,
    }
}

// 构造 groups × per_group 个条件的条件树
fn criteria_tree(groups: usize, per_group: usize, related_to: Option<Vec<i64>>) -> CriteriaTree {
    let groups = (0..groups)
        .map(|g| CriteriaGroup {
            id: format!("criteria-group-{}", g),
            operator: CriteriaOperator::Or,
            criteria: (0..per_group).map(|c| condition(g * per_group + c, related_to.clone())).collect(),
        })
        .collect();

    CriteriaTree {
        criteria_type: CriteriaType::Multiple,
        operator: CriteriaOperator::And,
        groups: Some(groups),
    }
}

// 构造宽度为 width、深度为 depth 的关联树
fn relation_tree(width: usize, depth: usize, next_id: &mut i64) -> Vec<Relation> {
    (0..width)
        .map(|_| {
            *next_id += 1;
            let id = *next_id;
            Relation {
                foreign_feature_type: id,
                foreign_feature_type_name: format!("feature_type_{}", id),
                relations: if depth > 1 { relation_tree(width, depth - 1, next_id) } else { Vec::new() },
            }
        })
        .collect()
}

// 基准测试：条件树编译性能
fn benchmark_group_compiler(c: &mut Criterion) {
    let test_cases = vec![
        ("simple", criteria_tree(1, 1, None)),
        ("medium", criteria_tree(3, 4, None)),
        ("complex", criteria_tree(10, 10, None)),
    ];

    let compiler = CriteriaCompiler::new();
    let mut group = c.benchmark_group("group_compiler_performance");

    for (name, tree) in test_cases {
        group.bench_with_input(BenchmarkId::new("compile", name), &tree, |b, tree| {
            b.iter(|| compiler.convert_criteria_to_query(black_box(Some(tree))).expect("编译应该成功"))
        });
    }

    group.finish();
}

// 基准测试：关联链编译性能
fn benchmark_relation_chain(c: &mut Criterion) {
    let compiler = CriteriaCompiler::new();
    let mut group = c.benchmark_group("relation_chain_performance");

    for depth in [1usize, 3, 8] {
        let related_to: Vec<i64> = (1..=depth as i64).collect();

        group.bench_with_input(BenchmarkId::new("fragments", depth), &related_to, |b, related_to| {
            b.iter(|| build_related_fragments(black_box("\"a\" = 1".to_string()), related_to, 99))
        });

        let tree = criteria_tree(2, 5, Some(related_to.clone()));
        group.bench_with_input(BenchmarkId::new("compile", depth), &tree, |b, tree| {
            b.iter(|| compiler.convert_criteria_to_query(black_box(Some(tree))).expect("编译应该成功"))
        });
    }

    group.finish();
}

// 基准测试：数据源展开性能
fn benchmark_source_resolver(c: &mut Criterion) {
    let root = AnalysisSource {
        feature_type: 0,
        label: "root".to_string(),
    };
    let labels: HashMap<String, String> = HashMap::new();
    let mut group = c.benchmark_group("source_resolver_performance");

    for (name, width, depth) in [("flat", 10, 1), ("nested", 3, 4), ("wide", 6, 3)] {
        let mut next_id = 0;
        let metadata = AttributeMetadata {
            feature_type: Some(0),
            relations: relation_tree(width, depth, &mut next_id),
        };

        group.bench_with_input(BenchmarkId::new("available_sources", name), &metadata, |b, metadata| {
            b.iter(|| get_available_sources(black_box(&root), Some(metadata), &labels))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_group_compiler,
    benchmark_relation_chain,
    benchmark_source_resolver
);
criterion_main!(benches);
