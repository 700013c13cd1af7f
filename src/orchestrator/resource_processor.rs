//! 资料模式处理器 - 编排层
//!
//! 交互式选出文件后，每个文件组装为 `{output_dir}/{课程名}/{文件名}.pdf`。
//! 导航中的网络或接口错误会中断；单个文件组装失败只计入失败数。

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::PageFetcher;
use crate::models::Course;
use crate::services::{OperatorConsole, PdfAssembler, ResourceNavigator};
use crate::utils::logging::log_section;
use crate::utils::sanitize_file_name;

/// 资料模式统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResourceStats {
    /// 选中的文件数
    pub documents: usize,
    pub assembled: usize,
    pub failed: usize,
    pub outputs: Vec<PathBuf>,
}

/// 资料模式处理器
pub struct ResourceProcessor {
    fetcher: Arc<dyn PageFetcher>,
    navigator: ResourceNavigator,
    concurrency: usize,
    output_dir: PathBuf,
}

impl ResourceProcessor {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &Config) -> Self {
        Self {
            navigator: ResourceNavigator::new(fetcher.clone(), config),
            fetcher,
            concurrency: config.download_concurrency,
            output_dir: PathBuf::from(&config.output_dir),
        }
    }

    pub async fn process(
        &self,
        course: &Course,
        console: &mut dyn OperatorConsole,
    ) -> AppResult<ResourceStats> {
        log_section(&format!("📂 资料模式: {}", course.display_name));

        let documents = self.navigator.navigate(course, console).await?;
        let mut stats = ResourceStats {
            documents: documents.len(),
            ..Default::default()
        };
        if documents.is_empty() {
            warn!("⚠️ 没有选中任何文件");
            return Ok(stats);
        }

        let assembler = PdfAssembler::new(
            self.fetcher.clone(),
            self.concurrency,
            self.output_dir.join(sanitize_file_name(&course.display_name)),
        );

        for (index, document) in documents.iter().enumerate() {
            info!("[{}/{}] 📄 {}", index + 1, documents.len(), document.name);
            match assembler.assemble(&document.pages, &document.name).await {
                Ok(report) => {
                    stats.assembled += 1;
                    stats.outputs.push(report.output);
                }
                Err(e) => {
                    error!("[{}/{}] ❌ {} 组装失败: {}", index + 1, documents.len(), document.name, e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }
}
