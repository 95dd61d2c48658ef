use anyhow::Result;
use quiz_chain_solver::utils::logging;
use quiz_chain_solver::{server, Config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载 .env（不存在时忽略）
    let _ = dotenvy::dotenv();

    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    config.validate()?;
    log_startup(&config);

    server::serve(config).await?;

    Ok(())
}

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题目链解答服务");
    info!("📧 学生邮箱: {}", config.student_email);
    info!("🤖 模型: {} ({})", config.llm_model_name, config.llm_api_base_url);
    info!(
        "⏱️ 时间预算: {}s，重试边际: {}s",
        config.quiz_timeout_secs, config.retry_margin_secs
    );
    info!("📊 最大并发会话数: {}", config.max_concurrent_sessions);
    info!("{}", "=".repeat(60));
}
