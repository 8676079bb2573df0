// ==========================================
// 审计交叉核对系统 - 键值聚合器
// ==========================================
// 输入: 各文件解析结果（按选择顺序）+ 键列/报告列配置
// 输出: 键值 → 来源文件集合（保首见顺序）
// 复杂度: 所有文件总行数的线性
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use crate::ingest::ParsedTable;
use std::collections::HashMap;

// ==========================================
// KeyOccurrence - 单个键值的聚合条目
// ==========================================
#[derive(Debug, Clone)]
pub struct KeyOccurrence {
    pub source_files: Vec<String>,         // 去重后的来源文件（按选择顺序）
    pub result_value: Option<String>,      // 报告列首个非空取值（文件顺序、行顺序）
    pub occurrences: HashMap<String, i64>, // 每文件出现行数
}

impl KeyOccurrence {
    fn new() -> Self {
        Self {
            source_files: Vec::new(),
            result_value: None,
            occurrences: HashMap::new(),
        }
    }

    /// 去重来源文件数
    pub fn distinct_file_count(&self) -> usize {
        self.source_files.len()
    }
}

// ==========================================
// AggregationOutput - 聚合结果
// ==========================================
// key_order 记录键值首次出现顺序，保证下游结果列表有序且确定
#[derive(Debug, Clone)]
pub struct AggregationOutput {
    key_order: Vec<String>,
    entries: HashMap<String, KeyOccurrence>,
}

impl AggregationOutput {
    pub fn len(&self) -> usize {
        self.key_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_order.is_empty()
    }

    pub fn get(&self, key_value: &str) -> Option<&KeyOccurrence> {
        self.entries.get(key_value)
    }

    /// 按首见顺序消费全部条目
    pub fn into_ordered(mut self) -> Vec<(String, KeyOccurrence)> {
        self.key_order
            .drain(..)
            .filter_map(|key| {
                let occurrence = self.entries.remove(&key)?;
                Some((key, occurrence))
            })
            .collect()
    }
}

// ==========================================
// KeyOccurrenceAggregator
// ==========================================
pub struct KeyOccurrenceAggregator {
    key_field: String,
    result_field: String,
}

impl KeyOccurrenceAggregator {
    pub fn new(key_field: String, result_field: String) -> Self {
        Self {
            key_field,
            result_field,
        }
    }

    /// 顺序合并所有文件的数据行
    ///
    /// # 规则
    /// - 键列取值非空的行: 其文件名加入该键值的来源集合
    /// - 键列取值缺失/为空的行: 静默排除，不产生任何结果条目
    /// - 键值比较为精确字符串相等，不做大小写/空白归一化
    ///
    /// # 错误
    /// - MissingKeyColumn: 某文件表头不含键列（配置错误，整次执行失败）
    /// - 报告列缺失仅告警，取值按空处理
    pub fn aggregate(&self, tables: &[ParsedTable]) -> EngineResult<AggregationOutput> {
        // 先做延迟 schema 校验，避免合并一半才失败
        for table in tables {
            if !table.sheet.has_column(&self.key_field) {
                return Err(EngineError::MissingKeyColumn {
                    file: table.display_name.clone(),
                    column: self.key_field.clone(),
                });
            }
            if !table.sheet.has_column(&self.result_field) {
                tracing::warn!(
                    file = %table.display_name,
                    column = %self.result_field,
                    "文件缺少报告列，取值按空处理"
                );
            }
        }

        let mut key_order: Vec<String> = Vec::new();
        let mut entries: HashMap<String, KeyOccurrence> = HashMap::new();
        let mut excluded_rows: usize = 0;

        for table in tables {
            for row in &table.sheet.rows {
                let key_value = match row.value(&self.key_field) {
                    Some(v) => v.to_string(),
                    None => {
                        excluded_rows += 1;
                        continue;
                    }
                };

                let occurrence = entries.entry(key_value.clone()).or_insert_with(|| {
                    key_order.push(key_value.clone());
                    KeyOccurrence::new()
                });

                if !occurrence
                    .source_files
                    .iter()
                    .any(|f| f == &table.display_name)
                {
                    occurrence.source_files.push(table.display_name.clone());
                }

                *occurrence
                    .occurrences
                    .entry(table.display_name.clone())
                    .or_insert(0) += 1;

                // 首个非空报告值胜出（文件选择顺序、行顺序）
                if occurrence.result_value.is_none() {
                    if let Some(value) = row.value(&self.result_field) {
                        occurrence.result_value = Some(value.to_string());
                    }
                }
            }
        }

        tracing::debug!(
            distinct_keys = key_order.len(),
            excluded_rows = excluded_rows,
            "聚合完成"
        );

        Ok(AggregationOutput { key_order, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{ParsedSheet, RawRecord};
    use std::collections::HashMap as Map;

    fn table(name: &str, headers: &[&str], rows: Vec<Vec<(&str, &str)>>) -> ParsedTable {
        ParsedTable {
            file_id: format!("F-{}", name),
            display_name: name.to_string(),
            original_name: name.to_string(),
            uploaded_at: chrono::Utc::now().naive_utc(),
            sheet: ParsedSheet {
                headers: headers.iter().map(|h| h.to_string()).collect(),
                rows: rows
                    .into_iter()
                    .enumerate()
                    .map(|(i, cells)| RawRecord {
                        row_number: i + 1,
                        values: cells
                            .into_iter()
                            .map(|(k, v)| (k.to_string(), v.to_string()))
                            .collect::<Map<_, _>>(),
                    })
                    .collect(),
            },
        }
    }

    fn aggregator() -> KeyOccurrenceAggregator {
        KeyOccurrenceAggregator::new("RUT".to_string(), "Tipo".to_string())
    }

    #[test]
    fn test_key_in_two_files() {
        let tables = vec![
            table("a.csv", &["RUT", "Tipo"], vec![vec![("RUT", "111"), ("Tipo", "Personal")]]),
            table("b.csv", &["RUT", "Tipo"], vec![vec![("RUT", "111"), ("Tipo", "Empresa")]]),
        ];

        let output = aggregator().aggregate(&tables).unwrap();
        assert_eq!(output.len(), 1);

        let occurrence = output.get("111").unwrap();
        assert_eq!(occurrence.source_files, vec!["a.csv", "b.csv"]);
        // 首文件胜出
        assert_eq!(occurrence.result_value.as_deref(), Some("Personal"));
    }

    #[test]
    fn test_empty_key_rows_silently_excluded() {
        let tables = vec![table(
            "a.csv",
            &["RUT", "Tipo"],
            vec![
                vec![("RUT", ""), ("Tipo", "X")],
                vec![("RUT", "444"), ("Tipo", "Y")],
            ],
        )];

        let output = aggregator().aggregate(&tables).unwrap();
        assert_eq!(output.len(), 1);
        assert!(output.get("444").is_some());
    }

    #[test]
    fn test_exact_equality_no_normalization() {
        let tables = vec![
            table("a.csv", &["RUT", "Tipo"], vec![vec![("RUT", "abc"), ("Tipo", "X")]]),
            table("b.csv", &["RUT", "Tipo"], vec![vec![("RUT", "ABC"), ("Tipo", "Y")]]),
        ];

        let output = aggregator().aggregate(&tables).unwrap();
        // 大小写不同视为两个键值
        assert_eq!(output.len(), 2);
    }

    #[test]
    fn test_missing_key_column_fails() {
        let tables = vec![table("a.csv", &["Nombre"], vec![vec![("Nombre", "X")]])];

        let result = aggregator().aggregate(&tables);
        assert!(matches!(
            result,
            Err(EngineError::MissingKeyColumn { .. })
        ));
    }

    #[test]
    fn test_missing_result_column_tolerated() {
        let tables = vec![table("a.csv", &["RUT"], vec![vec![("RUT", "111")]])];

        let output = aggregator().aggregate(&tables).unwrap();
        assert_eq!(output.get("111").unwrap().result_value, None);
    }

    #[test]
    fn test_first_seen_order_preserved() {
        let tables = vec![
            table(
                "a.csv",
                &["RUT", "Tipo"],
                vec![
                    vec![("RUT", "333"), ("Tipo", "X")],
                    vec![("RUT", "111"), ("Tipo", "Y")],
                ],
            ),
            table("b.csv", &["RUT", "Tipo"], vec![vec![("RUT", "222"), ("Tipo", "Z")]]),
        ];

        let output = aggregator().aggregate(&tables).unwrap();
        let keys: Vec<String> = output.into_ordered().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["333", "111", "222"]);
    }

    #[test]
    fn test_occurrence_counts_per_file() {
        let tables = vec![
            table(
                "a.csv",
                &["RUT", "Tipo"],
                vec![
                    vec![("RUT", "111"), ("Tipo", "X")],
                    vec![("RUT", "111"), ("Tipo", "Y")],
                ],
            ),
            table("b.csv", &["RUT", "Tipo"], vec![vec![("RUT", "111"), ("Tipo", "Z")]]),
        ];

        let output = aggregator().aggregate(&tables).unwrap();
        let occurrence = output.get("111").unwrap();
        assert_eq!(occurrence.occurrences.get("a.csv"), Some(&2));
        assert_eq!(occurrence.occurrences.get("b.csv"), Some(&1));
        // 同一文件多次出现不重复计入来源集合
        assert_eq!(occurrence.distinct_file_count(), 2);
    }
}
