// ==========================================
// 交叉核对引擎集成测试
// ==========================================
// 测试目标: 验证完整的摄取 → 聚合 → 分类 → 落库流程
// ==========================================


use audit_cross::app::AppState;
use audit_cross::domain::{CrossStatus, MatchStatus};
use audit_cross::engine::CrossRequest;
use audit_cross::logging;
use tempfile::TempDir;

/// 创建测试状态: 临时库 + 审计项目 + 文件目录
fn setup() -> (tempfile::NamedTempFile, TempDir, AppState) {
    logging::init_test();

    let (temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let files_dir = TempDir::new().expect("Failed to create files dir");

    let state = AppState::new(db_path.clone()).expect("Failed to create AppState");

    let conn = test_helpers::open_shared_connection(&db_path).expect("Failed to open db");
    test_helpers::seed_audit(conn, "A001", "AUD-2025-001", "年度审计").expect("Failed to seed audit");

    (temp_db, files_dir, state)
}

/// 写入 CSV 并登记，返回 file_id
async fn register_csv(state: &AppState, dir: &TempDir, name: &str, content: &str) -> String {
    let path = test_helpers::write_csv(dir.path(), name, content).expect("Failed to write csv");
    state
        .cross_api
        .register_file("A001", path.to_str().unwrap(), "tester")
        .await
        .expect("Failed to register file")
        .file_id
}

fn request(file_ids: Vec<String>) -> CrossRequest {
    CrossRequest {
        audit_id: "A001".to_string(),
        key_field: "RUT".to_string(),
        result_field: "Tipo".to_string(),
        file_ids,
        executed_by: "auditor".to_string(),
    }
}

// ==========================================
// 测试用例
// ==========================================

#[tokio::test]
async fn test_cross_match_two_files() {
    let (_db, dir, state) = setup();

    let file_a = register_csv(&state, &dir, "a.csv", "RUT,Tipo\n111,Personal\n").await;
    let file_b = register_csv(&state, &dir, "b.csv", "RUT,Tipo\n111,Empresa\n").await;

    let execution = state
        .cross_api
        .execute_cross(request(vec![file_a, file_b]))
        .await
        .expect("执行应该成功");

    assert_eq!(execution.status, CrossStatus::Completed);
    assert_eq!(execution.results.len(), 1);

    let result = &execution.results[0];
    assert_eq!(result.key_value, "111");
    assert_eq!(result.status, MatchStatus::Match);
    assert_eq!(result.source_files, vec!["a.csv", "b.csv"]);
    // 报告值: 首个非空值胜出（文件选择顺序）
    assert_eq!(result.result_value, "Personal");

    assert_eq!(execution.summary.total_records, 1);
    assert_eq!(execution.summary.matching_records, 1);
    assert_eq!(execution.summary.non_matching_records, 0);
    assert_eq!(execution.summary.match_percentage, 100);
}

#[tokio::test]
async fn test_cross_no_match_distinct_keys() {
    let (_db, dir, state) = setup();

    let file_a = register_csv(&state, &dir, "a.csv", "RUT,Tipo\n222,Personal\n").await;
    let file_b = register_csv(&state, &dir, "b.csv", "RUT,Tipo\n333,Empresa\n").await;

    let execution = state
        .cross_api
        .execute_cross(request(vec![file_a, file_b]))
        .await
        .expect("执行应该成功");

    assert_eq!(execution.results.len(), 2);
    assert!(execution
        .results
        .iter()
        .all(|r| r.status == MatchStatus::NoMatch));

    assert_eq!(execution.summary.total_records, 2);
    assert_eq!(execution.summary.matching_records, 0);
    assert_eq!(execution.summary.non_matching_records, 2);
    assert_eq!(execution.summary.match_percentage, 0);
}

#[tokio::test]
async fn test_empty_key_rows_excluded() {
    let (_db, dir, state) = setup();

    let file_a = register_csv(&state, &dir, "a.csv", "RUT,Tipo\n,X\n444,Y\n").await;
    let file_b = register_csv(&state, &dir, "b.csv", "RUT,Tipo\n555,Z\n").await;

    let execution = state
        .cross_api
        .execute_cross(request(vec![file_a, file_b]))
        .await
        .expect("执行应该成功");

    // 空键行静默排除，不产生结果条目
    let keys: Vec<&str> = execution.results.iter().map(|r| r.key_value.as_str()).collect();
    assert_eq!(keys, vec!["444", "555"]);
    assert_eq!(execution.summary.total_records, 2);
}

#[tokio::test]
async fn test_processed_files_follow_selection_order() {
    let (_db, dir, state) = setup();

    let file_a = register_csv(&state, &dir, "a.csv", "RUT,Tipo\n1,X\n2,Y\n").await;
    let file_b = register_csv(&state, &dir, "b.csv", "RUT,Tipo\n3,Z\n").await;

    // 逆序选择
    let execution = state
        .cross_api
        .execute_cross(request(vec![file_b, file_a]))
        .await
        .expect("执行应该成功");

    let names: Vec<&str> = execution
        .processed_files
        .iter()
        .map(|f| f.filename.as_str())
        .collect();
    assert_eq!(names, vec!["b.csv", "a.csv"]);
    assert_eq!(execution.processed_files[0].record_count, 1);
    assert_eq!(execution.processed_files[1].record_count, 2);
}

#[tokio::test]
async fn test_missing_key_column_persists_error_run() {
    let (_db, dir, state) = setup();

    let file_a = register_csv(&state, &dir, "a.csv", "RUT,Tipo\n111,X\n").await;
    // b.csv 没有键列 RUT
    let file_b = register_csv(&state, &dir, "b.csv", "Nombre,Tipo\nJuan,Y\n").await;

    let execution = state
        .cross_api
        .execute_cross(request(vec![file_a, file_b]))
        .await
        .expect("失败的执行也应作为记录落库");

    assert_eq!(execution.status, CrossStatus::Error);
    let error = execution.error_details.as_ref().expect("应有错误详情");
    assert!(error.message.contains("RUT"));
    assert!(!error.stack.is_empty());
    assert_eq!(execution.summary.total_records, 0);

    // 失败记录仍然可查询
    let detail = state
        .cross_api
        .get_cross_detail(&execution.cross_id)
        .await
        .expect("失败记录应可检索");
    assert_eq!(detail.status, CrossStatus::Error);
}

#[tokio::test]
async fn test_unreadable_file_persists_error_run() {
    let (_db, dir, state) = setup();

    let file_a = register_csv(&state, &dir, "a.csv", "RUT,Tipo\n111,X\n").await;
    let file_b = register_csv(&state, &dir, "b.csv", "RUT,Tipo\n111,Y\n").await;

    // 登记后删除物理文件，模拟存储层文件丢失
    std::fs::remove_file(dir.path().join("b.csv")).unwrap();

    let execution = state
        .cross_api
        .execute_cross(request(vec![file_a, file_b]))
        .await
        .expect("摄取失败应转为 Error 记录");

    assert_eq!(execution.status, CrossStatus::Error);
    assert!(execution.error_details.is_some());
}

#[tokio::test]
async fn test_summary_invariants_on_mixed_result() {
    let (_db, dir, state) = setup();

    let file_a = register_csv(
        &state,
        &dir,
        "a.csv",
        "RUT,Tipo\n111,X\n222,Y\n333,Z\n",
    )
    .await;
    let file_b = register_csv(&state, &dir, "b.csv", "RUT,Tipo\n111,W\n").await;

    let execution = state
        .cross_api
        .execute_cross(request(vec![file_a, file_b]))
        .await
        .expect("执行应该成功");

    let summary = &execution.summary;
    assert_eq!(summary.total_records, execution.results.len() as i64);
    assert_eq!(
        summary.total_records,
        summary.matching_records + summary.non_matching_records
    );
    // 1/3 → 33%
    assert_eq!(summary.matching_records, 1);
    assert_eq!(summary.match_percentage, 33);
}

#[tokio::test]
async fn test_file_usage_touched_after_completed_run() {
    let (_db, dir, state) = setup();

    let file_a = register_csv(&state, &dir, "a.csv", "RUT,Tipo\n111,X\n").await;
    let file_b = register_csv(&state, &dir, "b.csv", "RUT,Tipo\n111,Y\n").await;

    state
        .cross_api
        .execute_cross(request(vec![file_a.clone(), file_b]))
        .await
        .expect("执行应该成功");

    // 使用痕迹与执行记录同事务更新
    let conn = test_helpers::open_shared_connection(state.get_db_path()).unwrap();
    let repo = audit_cross::repository::FileRecordRepository::new(conn);
    let record = repo.find_by_id(&file_a).unwrap().expect("文件应已登记");
    assert_eq!(record.use_count, 1);
    assert_eq!(record.record_count, Some(1));
    assert!(record.last_used_at.is_some());
}
