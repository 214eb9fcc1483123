use anyhow::{bail, Context, Result};
use criteria_compiler::model::{AnalysisSource, AttributeMetadata, CriteriaTree};
use criteria_compiler::{get_available_sources, valid_groups, CriteriaCompiler, FormLabelConfig};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde::Deserialize;
use std::fs;
use tracing_subscriber::EnvFilter;

/// 图层文件: 选中的根数据源及其关联元数据
#[derive(Debug, Deserialize)]
struct LayerFile {
    source: AnalysisSource,
    #[serde(default)]
    metadata: Option<AttributeMetadata>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let labels = FormLabelConfig::load_or_default();
    let compiler = CriteriaCompiler::new();

    // 带文件参数时只编译该文件中的条件树
    if let Some(path) = std::env::args().nth(1) {
        let content = fs::read_to_string(&path).with_context(|| format!("无法读取条件文件 {}", path))?;
        println!("{}", compile_json(&compiler, &content)?);
        return Ok(());
    }

    run_repl(&compiler, &labels)
}

/// 解析、校验并编译一个条件树JSON
fn compile_json(compiler: &CriteriaCompiler, json: &str) -> Result<String> {
    let tree: CriteriaTree = serde_json::from_str(json).context("无法解析条件树JSON")?;

    if let Some(groups) = &tree.groups {
        if !valid_groups(groups) {
            bail!("条件树无效: 存在空的条件组或缺少必填字段的条件");
        }
    }

    Ok(compiler.convert_criteria_to_query(Some(&tree))?)
}

/// 打印图层文件的可选数据源
fn print_sources(path: &str, labels: &FormLabelConfig) -> Result<()> {
    let content = fs::read_to_string(path).with_context(|| format!("无法读取图层文件 {}", path))?;
    let layer: LayerFile =
        serde_json::from_str(&content).with_context(|| format!("无法解析图层文件 {}", path))?;

    let sources = get_available_sources(&layer.source, layer.metadata.as_ref(), labels);
    if sources.is_empty() {
        println!("⚠️ 元数据尚未加载, 没有可选数据源");
    }

    for source in &sources {
        match source.related_to.as_deref() {
            Some(chain) if !chain.is_empty() => {
                println!("{} [{}] relatedTo={:?}", source.label, source.feature_type, chain)
            }
            _ => println!("{} [{}]", source.label, source.feature_type),
        }
    }
    Ok(())
}

fn run_repl(compiler: &CriteriaCompiler, labels: &FormLabelConfig) -> Result<()> {
    println!("--- Criteria Compiler: 条件树到过滤查询 ---");
    println!("输入一行条件树JSON进行编译, `:sources <文件>` 列出数据源, `:quit` 退出");

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("criteria> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line)?;

                if line == ":quit" || line == ":q" {
                    break;
                }

                let result = match line.strip_prefix(":sources") {
                    Some(path) => print_sources(path.trim(), labels),
                    None => compile_json(compiler, line).map(|query| println!("{}", query)),
                };
                if let Err(e) = result {
                    println!("✗ {:#}", e);
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
