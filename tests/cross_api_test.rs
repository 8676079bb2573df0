// ==========================================
// 交叉核对 API 集成测试
// ==========================================
// 测试目标: 请求校验、审计引用检查、删除事件、统计
// ==========================================


use audit_cross::api::ApiError;
use audit_cross::app::AppState;
use audit_cross::domain::{CrossExecutionPatch, CrossStatus, MatchStatus};
use audit_cross::engine::CrossRequest;
use audit_cross::logging;
use tempfile::TempDir;

fn setup() -> (tempfile::NamedTempFile, TempDir, AppState) {
    logging::init_test();

    let (temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let files_dir = TempDir::new().expect("Failed to create files dir");

    let state = AppState::new(db_path.clone()).expect("Failed to create AppState");

    let conn = test_helpers::open_shared_connection(&db_path).expect("Failed to open db");
    test_helpers::seed_audit(conn, "A001", "AUD-2025-001", "年度审计").expect("Failed to seed audit");

    (temp_db, files_dir, state)
}

async fn register_csv(state: &AppState, dir: &TempDir, name: &str, content: &str) -> String {
    let path = test_helpers::write_csv(dir.path(), name, content).expect("Failed to write csv");
    state
        .cross_api
        .register_file("A001", path.to_str().unwrap(), "tester")
        .await
        .expect("Failed to register file")
        .file_id
}

fn request(audit_id: &str, file_ids: Vec<String>) -> CrossRequest {
    CrossRequest {
        audit_id: audit_id.to_string(),
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
async fn test_single_file_rejected_without_persisting() {
    let (_db, dir, state) = setup();

    let file_a = register_csv(&state, &dir, "a.csv", "RUT,Tipo\n111,X\n").await;

    let result = state
        .cross_api
        .execute_cross(request("A001", vec![file_a]))
        .await;

    match result {
        Err(ApiError::ValidationError(msg)) => assert!(msg.contains("至少需要2个文件")),
        other => panic!("Expected ValidationError, got {:?}", other.map(|e| e.cross_id)),
    }

    // 校验失败发生在执行前，不产生任何落库记录
    let list = state.cross_api.list_crosses("A001", 10, 0).await.unwrap();
    assert_eq!(list.total, 0);
}

#[tokio::test]
async fn test_unknown_audit_rejected_without_persisting() {
    let (_db, dir, state) = setup();

    let file_a = register_csv(&state, &dir, "a.csv", "RUT,Tipo\n111,X\n").await;
    let file_b = register_csv(&state, &dir, "b.csv", "RUT,Tipo\n111,Y\n").await;

    let result = state
        .cross_api
        .execute_cross(request("A999", vec![file_a, file_b]))
        .await;

    match result {
        Err(ApiError::AuditNotFound(audit_id)) => assert_eq!(audit_id, "A999"),
        other => panic!("Expected AuditNotFound, got {:?}", other.map(|e| e.cross_id)),
    }

    let list = state.cross_api.list_crosses("A999", 10, 0).await.unwrap();
    assert_eq!(list.total, 0);
}

#[tokio::test]
async fn test_missing_key_field_rejected() {
    let (_db, dir, state) = setup();

    let file_a = register_csv(&state, &dir, "a.csv", "RUT,Tipo\n111,X\n").await;
    let file_b = register_csv(&state, &dir, "b.csv", "RUT,Tipo\n111,Y\n").await;

    let mut req = request("A001", vec![file_a, file_b]);
    req.key_field = "".to_string();

    let result = state.cross_api.execute_cross(req).await;
    assert!(matches!(result, Err(ApiError::ValidationError(_))));
}

#[tokio::test]
async fn test_list_pagination_clamped() {
    let (_db, _dir, state) = setup();

    // limit/offset 非法值被限幅，不报错
    let list = state.cross_api.list_crosses("A001", -5, -3).await.unwrap();
    assert_eq!(list.limit, 1);
    assert_eq!(list.offset, 0);
    assert!(list.executions.is_empty());
}

#[tokio::test]
async fn test_detail_unknown_id_not_found() {
    let (_db, _dir, state) = setup();

    let result = state.cross_api.get_cross_detail("CR-UNKNOWN").await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_update_empty_patch_rejected() {
    let (_db, _dir, state) = setup();

    let result = state
        .cross_api
        .update_cross("CR-ANY", CrossExecutionPatch::default(), None, "auditor")
        .await;
    assert!(matches!(result, Err(ApiError::ValidationError(_))));
}

#[tokio::test]
async fn test_update_status_writes_action_log() {
    let (_db, dir, state) = setup();

    let file_a = register_csv(&state, &dir, "a.csv", "RUT,Tipo\n111,X\n").await;
    let file_b = register_csv(&state, &dir, "b.csv", "RUT,Tipo\n111,Y\n").await;

    let execution = state
        .cross_api
        .execute_cross(request("A001", vec![file_a, file_b]))
        .await
        .unwrap();

    let patch = CrossExecutionPatch {
        status: Some(CrossStatus::Error),
        ..Default::default()
    };
    let updated = state
        .cross_api
        .update_cross(&execution.cross_id, patch, Some(0), "supervisor")
        .await
        .unwrap();
    assert_eq!(updated.status, CrossStatus::Error);
    assert_eq!(updated.revision, 1);

    let logs = state
        .action_log_repo
        .find_by_action_type("CrossUpdate", 10)
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].actor, "supervisor");
}

#[tokio::test]
async fn test_delete_emits_action_log_with_removed_count() {
    let (_db, dir, state) = setup();

    let file_a = register_csv(&state, &dir, "a.csv", "RUT,Tipo\n111,X\n222,Y\n").await;
    let file_b = register_csv(&state, &dir, "b.csv", "RUT,Tipo\n111,Z\n").await;

    let execution = state
        .cross_api
        .execute_cross(request("A001", vec![file_a, file_b]))
        .await
        .unwrap();
    assert_eq!(execution.results.len(), 2);

    let response = state
        .cross_api
        .delete_cross(&execution.cross_id, "supervisor")
        .await
        .unwrap();
    assert_eq!(response.removed_results, 2);

    // 删除后不可检索
    let result = state.cross_api.get_cross_detail(&execution.cross_id).await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
    let list = state.cross_api.list_crosses("A001", 10, 0).await.unwrap();
    assert_eq!(list.total, 0);

    // 删除事件包含 cross_id / 键列 / 报告列 / 删除条数
    let logs = state
        .action_log_repo
        .find_by_action_type("CrossDelete", 10)
        .unwrap();
    assert_eq!(logs.len(), 1);
    let new_json = logs[0].new_json.as_ref().expect("应有事件负载");
    assert_eq!(new_json["cross_id"], execution.cross_id.as_str());
    assert_eq!(new_json["key_field"], "RUT");
    assert_eq!(new_json["result_field"], "Tipo");
    assert_eq!(new_json["removed_results"], 2);
}

#[tokio::test]
async fn test_delete_unknown_id_not_found() {
    let (_db, _dir, state) = setup();

    let result = state.cross_api.delete_cross("CR-UNKNOWN", "auditor").await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_stats_through_api() {
    let (_db, dir, state) = setup();

    // 空审计项目 → 零值
    let stats = state.cross_api.get_cross_stats("A001").await.unwrap();
    assert_eq!(stats.total_crosses, 0);

    let file_a = register_csv(&state, &dir, "a.csv", "RUT,Tipo\n111,X\n").await;
    let file_b = register_csv(&state, &dir, "b.csv", "RUT,Tipo\n111,Y\n").await;

    let execution = state
        .cross_api
        .execute_cross(request("A001", vec![file_a, file_b]))
        .await
        .unwrap();
    assert_eq!(execution.results[0].status, MatchStatus::Match);

    let stats = state.cross_api.get_cross_stats("A001").await.unwrap();
    assert_eq!(stats.total_crosses, 1);
    assert_eq!(stats.total_records, 1);
    assert_eq!(stats.total_matches, 1);
    assert_eq!(stats.avg_match_percentage, 100.0);
    assert!(stats.last_execution.is_some());
}

#[tokio::test]
async fn test_register_file_validations() {
    let (_db, dir, state) = setup();

    // 未知审计项目
    let path = test_helpers::write_csv(dir.path(), "a.csv", "RUT\n1\n").unwrap();
    let result = state
        .cross_api
        .register_file("A999", path.to_str().unwrap(), "tester")
        .await;
    assert!(matches!(result, Err(ApiError::AuditNotFound(_))));

    // 本地文件不存在
    let result = state
        .cross_api
        .register_file("A001", "/no/such/file.csv", "tester")
        .await;
    assert!(matches!(result, Err(ApiError::ValidationError(_))));
}
