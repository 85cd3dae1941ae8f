//! Clerk - 客服对话工作流引擎
//!
//! 入口：初始化日志、加载配置、装配存储与 NLU 后端，进入命令行会话循环。

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use uuid::Uuid;

use clerk::agent::workers::MockNotifier;
use clerk::config::{load_config, AppConfig};
use clerk::llm::{MockNlu, NluClient, OpenAiNlu};
use clerk::store::SqliteStore;
use clerk::{AgentGraph, AgentService};

/// 按配置选择 NLU 后端；provider=openai 但无 API Key 时退回 Mock
fn create_nlu_from_config(cfg: &AppConfig) -> Arc<dyn NluClient> {
    match cfg.llm.provider.as_str() {
        "openai" if std::env::var("OPENAI_API_KEY").is_ok() => Arc::new(OpenAiNlu::new(
            cfg.llm.base_url.as_deref(),
            &cfg.llm.model,
            None,
        )),
        "openai" => {
            tracing::warn!("OPENAI_API_KEY not set, falling back to mock NLU");
            Arc::new(MockNlu)
        }
        _ => Arc::new(MockNlu),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    clerk::observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    tracing::info!(provider = %cfg.llm.provider, db = %cfg.store.database_path.display(), "starting clerk");

    let store = Arc::new(
        SqliteStore::open(&cfg.store.database_path).context("Failed to open database")?,
    );
    let nlu = create_nlu_from_config(&cfg);
    let graph = AgentGraph::new(nlu, store.clone(), store.clone(), Arc::new(MockNotifier));
    let service = AgentService::new(
        graph,
        store,
        cfg.agent.max_steps_per_turn,
        cfg.agent.locale.clone(),
    );

    let session_id = Uuid::new_v4().to_string();
    println!("Clerk customer service (session {})", session_id);
    println!("Type your message, or 'quit' to exit.\n");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        print!("you> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case("quit") || text.eq_ignore_ascii_case("exit") {
            break;
        }

        match service.process_turn(&session_id, text).await {
            Ok(outcome) => {
                for msg in &outcome.assistant_messages {
                    println!("clerk> {}\n", msg);
                }
                if let Some(detail) = &outcome.error_detail {
                    tracing::warn!(%detail, "turn ended with user-visible error");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "turn failed");
                println!("clerk> Sorry, something went wrong on our side. Please try again.\n");
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
