//! 导出层
//!
//! 把 (课程名, 作业列表) 写成外部文档。导出器只消费数据模型，
//! 不参与抓取，也不修改题目。

pub mod json;
pub mod markdown;
pub mod word;

use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::models::Assignment;

pub use json::JsonExporter;
pub use markdown::MarkdownExporter;
pub use word::WordExporter;

/// 文档导出器
pub trait DocumentExporter: Send + Sync {
    /// 导出格式名称（用于日志）
    fn format_name(&self) -> &'static str;

    /// 写出文档，返回文件路径
    fn export(&self, course_name: &str, assignments: &[Assignment]) -> AppResult<PathBuf>;
}

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Markdown,
    Word,
    Json,
    All,
}

/// 按格式创建导出器
///
/// 带答案导出时，Markdown 与 Word 都会额外生成一份不带答案的练习版。
pub fn exporters_for(
    format: ExportFormat,
    output_dir: &Path,
    with_answers: bool,
) -> Vec<Box<dyn DocumentExporter>> {
    let variants: &[bool] = if with_answers { &[true, false] } else { &[false] };
    let markdown = || {
        variants
            .iter()
            .map(|&answers| Box::new(MarkdownExporter::new(output_dir, answers)) as Box<dyn DocumentExporter>)
            .collect::<Vec<_>>()
    };
    let word = || {
        variants
            .iter()
            .map(|&answers| Box::new(WordExporter::new(output_dir, answers)) as Box<dyn DocumentExporter>)
            .collect::<Vec<_>>()
    };
    let json = || vec![Box::new(JsonExporter::new(output_dir)) as Box<dyn DocumentExporter>];

    match format {
        ExportFormat::Markdown => markdown(),
        ExportFormat::Word => word(),
        ExportFormat::Json => json(),
        ExportFormat::All => [markdown(), word(), json()].into_iter().flatten().collect(),
    }
}

/// 创建目录并写入文件
pub(crate) fn write_file(path: &Path, content: impl AsRef<[u8]>) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::write_failed(parent.display().to_string(), e))?;
    }
    std::fs::write(path, content).map_err(|e| AppError::write_failed(path.display().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exporters_for_format() {
        let dir = Path::new("out");
        let names = |format, with_answers| {
            exporters_for(format, dir, with_answers)
                .iter()
                .map(|e| e.format_name())
                .collect::<Vec<_>>()
        };

        assert_eq!(names(ExportFormat::Markdown, false), vec!["Markdown"]);
        assert_eq!(names(ExportFormat::Markdown, true), vec!["Markdown", "Markdown"]);
        assert_eq!(names(ExportFormat::Word, true), vec!["Word", "Word"]);
        assert_eq!(names(ExportFormat::Json, true), vec!["JSON"]);
        assert_eq!(
            names(ExportFormat::All, false),
            vec!["Markdown", "Word", "JSON"]
        );
    }

    #[test]
    fn test_answer_export_also_writes_practice_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let assignments = vec![Assignment {
            work_id: "w1".to_string(),
            name: "第一次作业".to_string(),
            status: "已完成".to_string(),
            listing_url: String::new(),
            course_id: "c1".to_string(),
            questions: vec![crate::models::Question::new(
                "栈是线性表",
                crate::models::QuestionBody::TrueFalse {
                    correct_answer: "对".to_string(),
                },
            )],
        }];

        let paths: Vec<PathBuf> = exporters_for(ExportFormat::All, dir.path(), true)
            .iter()
            .map(|e| e.export("数据结构", &assignments).unwrap())
            .collect();

        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "数据结构_习题_带答案.md",
                "数据结构_习题_不带答案.md",
                "数据结构_习题_带答案.docx",
                "数据结构_习题_不带答案.docx",
                "数据结构_习题_数据.json",
            ]
        );
        let practice = std::fs::read_to_string(&paths[1]).unwrap();
        assert!(practice.contains("答案: ____________________"));
        assert!(!practice.contains("正确答案"));
    }
}
