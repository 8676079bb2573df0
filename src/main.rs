// ==========================================
// 审计交叉核对系统 - CLI 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 用途: 操作员命令行 / 冒烟验证
// ==========================================

use audit_cross::api::ApiError;
use audit_cross::app::{get_default_db_path, AppState};
use audit_cross::domain::AuditRecord;
use audit_cross::engine::CrossRequest;
use audit_cross::i18n;

fn usage() -> ! {
    eprintln!("用法:");
    eprintln!("  audit-cross seed-audit <audit_id> <audit_code> <audit_name>");
    eprintln!("  audit-cross register <audit_id> <file_path> <actor>");
    eprintln!("  audit-cross execute <audit_id> <key_field> <result_field> <actor> <file_id>...");
    eprintln!("  audit-cross list <audit_id> [limit] [offset]");
    eprintln!("  audit-cross detail <cross_id>");
    eprintln!("  audit-cross stats <audit_id>");
    eprintln!("  audit-cross delete <cross_id> <actor>");
    std::process::exit(2);
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("序列化输出失败: {}", e),
    }
}

/// 用户可见失败统一以 {success:false, message, detail} 输出
fn fail(err: ApiError) -> ! {
    print_json(&err.to_payload());
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    // 初始化日志系统
    audit_cross::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", audit_cross::APP_NAME);
    tracing::info!("系统版本: {}", audit_cross::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("无法初始化AppState: {}", e);
            std::process::exit(1);
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(|s| s.as_str()).unwrap_or("");

    match command {
        "seed-audit" => {
            if args.len() != 4 {
                usage();
            }
            let audit = AuditRecord::new(args[1].clone(), args[2].clone(), args[3].clone());
            match state.audit_repo.insert(&audit) {
                Ok(audit_id) => {
                    println!("{}: audit_id={}", i18n::t("common.success"), audit_id);
                }
                Err(e) => fail(ApiError::from(e)),
            }
        }

        "register" => {
            if args.len() != 4 {
                usage();
            }
            match state
                .cross_api
                .register_file(&args[1], &args[2], &args[3])
                .await
            {
                Ok(record) => print_json(&record),
                Err(e) => fail(e),
            }
        }

        "execute" => {
            if args.len() < 6 {
                usage();
            }
            let request = CrossRequest {
                audit_id: args[1].clone(),
                key_field: args[2].clone(),
                result_field: args[3].clone(),
                executed_by: args[4].clone(),
                file_ids: args[5..].to_vec(),
            };
            match state.cross_api.execute_cross(request).await {
                Ok(execution) => {
                    println!("{}: cross_id={}", i18n::t("cross.executed"), execution.cross_id);
                    print_json(&execution.summary);
                }
                Err(e) => fail(e),
            }
        }

        "list" => {
            if args.len() < 2 || args.len() > 4 {
                usage();
            }
            let limit = args
                .get(2)
                .and_then(|s| s.parse::<i32>().ok())
                .unwrap_or(20);
            let offset = args
                .get(3)
                .and_then(|s| s.parse::<i32>().ok())
                .unwrap_or(0);
            match state.cross_api.list_crosses(&args[1], limit, offset).await {
                Ok(response) => print_json(&response),
                Err(e) => fail(e),
            }
        }

        "detail" => {
            if args.len() != 2 {
                usage();
            }
            match state.cross_api.get_cross_detail(&args[1]).await {
                Ok(execution) => print_json(&execution),
                Err(e) => fail(e),
            }
        }

        "stats" => {
            if args.len() != 2 {
                usage();
            }
            match state.cross_api.get_cross_stats(&args[1]).await {
                Ok(stats) => print_json(&stats),
                Err(e) => fail(e),
            }
        }

        "delete" => {
            if args.len() != 3 {
                usage();
            }
            match state.cross_api.delete_cross(&args[1], &args[2]).await {
                Ok(response) => print_json(&response),
                Err(e) => fail(e),
            }
        }

        _ => usage(),
    }
}
