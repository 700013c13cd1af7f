use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use fanya_crawler::services::StdConsole;
use fanya_crawler::utils::logging;
use fanya_crawler::{App, Config, ExportFormat, RunMode, RunOptions};

/// 学习通作业 / 资料抓取工具
#[derive(Parser)]
#[command(name = "fanya_crawler", version)]
#[command(about = "学习通作业爬取与课程资料下载工具")]
struct Cli {
    /// 登录手机号（也可用 FANYA_PHONE）
    #[arg(long)]
    phone: Option<String>,

    /// 登录密码（也可用 FANYA_PASSWORD）
    #[arg(long)]
    password: Option<String>,

    /// 运行模式
    #[arg(long, value_enum, default_value_t = RunMode::Homework)]
    mode: RunMode,

    /// 导出格式
    #[arg(long, value_enum, default_value_t = ExportFormat::All)]
    format: ExportFormat,

    /// 导出不带答案的版本
    #[arg(long)]
    no_answers: bool,

    /// 抓取完成后调用 AI 作答
    #[arg(long)]
    with_ai: bool,

    /// 配置文件路径
    #[arg(long, default_value = "fanya.toml")]
    config: PathBuf,

    /// 输出 debug 日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置：默认值 → 配置文件 → 环境变量 → 命令行
    let mut config = Config::load(Some(&cli.config))?;
    if let Some(phone) = cli.phone {
        config.phone = phone;
    }
    if let Some(password) = cli.password {
        config.password = password;
    }
    config.verbose_logging |= cli.verbose;

    // 初始化日志
    logging::init(&config.log_file, config.verbose_logging)?;

    let options = RunOptions {
        mode: cli.mode,
        format: cli.format,
        with_answers: !cli.no_answers,
        with_ai: cli.with_ai,
    };

    // 初始化并运行应用
    App::initialize(config, options)
        .await?
        .run(&mut StdConsole)
        .await?;

    Ok(())
}
