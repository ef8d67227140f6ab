// ==========================================
// 库存覆盖分析引擎 - 命令行入口
// ==========================================
// 命令:
// - process: 两份文件 → 四张报表
// - download: 按名称输出报表
// - config show / set: 查看、写入 config_kv 配置
// ==========================================

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use stock_cover::app::{get_default_db_path, get_default_output_dir, AppState};
use stock_cover::config::{ConfigOverrides, EngineConfigReader};
use stock_cover::logging;

/// 库存覆盖分析引擎: 由销售流水与仓库库存生成补货/积压报表
#[derive(Parser)]
#[command(name = "stock-cover", version, about)]
struct Cli {
    /// 配置库路径（默认: STOCK_COVER_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    config_db: Option<String>,

    /// 报表输出目录（默认: STOCK_COVER_OUTPUT_DIR 或用户数据目录/outputs）
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 处理销售与库存文件,生成四张报表
    Process {
        /// 销售流水文件（.csv/.xlsx/.xls）
        #[arg(long)]
        sales: PathBuf,

        /// 仓库库存文件（.csv/.xlsx/.xls）
        #[arg(long)]
        stock: PathBuf,

        /// DRR 回看天数
        #[arg(long)]
        lookback_days: Option<i64>,

        /// 补货阈值（天）
        #[arg(long)]
        refill_days: Option<f64>,

        /// 积压阈值（天）
        #[arg(long)]
        excess_days: Option<f64>,

        /// 回看窗口结束日（YYYY-MM-DD）
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// DRR / 覆盖天数 小数位
        #[arg(long)]
        decimal_places: Option<usize>,

        /// 输出完整 JSON 响应（默认只输出概览）
        #[arg(long)]
        full: bool,
    },

    /// 输出指定报表（stock_cover_summary / warehouse_level_stock / refill_recommendations / excess_stock）
    Download {
        name: String,

        /// 写入文件（默认输出到 stdout）
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// 配置管理
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// 显示生效配置与已存储的键值
    Show,

    /// 写入配置键值
    Set { key: String, value: String },

    /// 删除配置键（恢复默认）
    Unset { key: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!(version = stock_cover::VERSION, "{}", stock_cover::APP_NAME);

    let db_path = cli.config_db.clone().unwrap_or_else(get_default_db_path);
    let output_dir = cli.out_dir.clone().unwrap_or_else(get_default_output_dir);

    match cli.command {
        Commands::Process {
            sales,
            stock,
            lookback_days,
            refill_days,
            excess_days,
            as_of,
            decimal_places,
            full,
        } => {
            let overrides = ConfigOverrides {
                lookback_days,
                refill_threshold_days: refill_days,
                excess_threshold_days: excess_days,
                decimal_places,
                as_of,
                top_refill_limit: None,
            };
            let state = AppState::new(db_path, output_dir, overrides)
                .context("无法初始化应用状态")?;

            match state.process_api.process_files(&sales, &stock).await {
                Ok(response) => {
                    let body = if full {
                        serde_json::to_string_pretty(&response)?
                    } else {
                        serde_json::to_string_pretty(&serde_json::json!({
                            "status": response.status,
                            "run_id": response.run_id,
                            "files": response.files,
                            "output_dir": state.output_dir.display().to_string(),
                            "overview": response.overview,
                            "diagnostics": response.diagnostics,
                        }))?
                    };
                    println!("{}", body);
                }
                Err(e) => {
                    println!("{}", serde_json::to_string_pretty(&e.to_response())?);
                    bail!(e);
                }
            }
        }

        Commands::Download { name, output } => {
            let state = AppState::new(db_path, output_dir, ConfigOverrides::default())
                .context("无法初始化应用状态")?;
            let report = state.process_api.download(&name).await?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, &report.content)
                        .await
                        .with_context(|| format!("写入失败: {}", path.display()))?;
                    tracing::info!(path = %path.display(), bytes = report.content.len(), "报表已写出");
                }
                None => {
                    std::io::stdout().write_all(&report.content)?;
                }
            }
        }

        Commands::Config { action } => {
            let state = AppState::new(db_path, output_dir, ConfigOverrides::default())
                .context("无法初始化应用状态")?;
            let manager = state.config_manager.clone();

            match action {
                ConfigAction::Show => {
                    let effective = manager.load_engine_config().await?;
                    let stored = manager.list_configs()?;
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({
                            "db_path": state.db_path,
                            "effective": effective,
                            "stored": stored,
                        }))?
                    );
                }
                ConfigAction::Set { key, value } => {
                    let previous = manager.get_config_value(&key)?;
                    manager.set_config_value(&key, &value)?;

                    // 写入后整体校验,不合法则回滚到原值
                    let validation = match manager.load_engine_config().await {
                        Ok(config) => config.validate(),
                        Err(e) => Err(e),
                    };
                    if let Err(e) = validation {
                        match previous {
                            Some(old) => manager.set_config_value(&key, &old)?,
                            None => {
                                manager.remove_config_value(&key)?;
                            }
                        }
                        bail!(e);
                    }
                    println!("{} = {}", key, value.trim());
                }
                ConfigAction::Unset { key } => {
                    if manager.remove_config_value(&key)? {
                        println!("{} 已恢复默认", key);
                    } else {
                        println!("{} 未设置", key);
                    }
                }
            }
        }
    }

    Ok(())
}
