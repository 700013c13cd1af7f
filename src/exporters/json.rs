use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::{AppResult, FileError};
use crate::exporters::{write_file, DocumentExporter};
use crate::models::{Assignment, Question};
use crate::utils::sanitize_file_name;

#[derive(Serialize)]
struct CourseDocument<'a> {
    course_name: &'a str,
    export_time: String,
    assignments: Vec<AssignmentDocument<'a>>,
}

#[derive(Serialize)]
struct AssignmentDocument<'a> {
    work_id: &'a str,
    name: &'a str,
    status: &'a str,
    questions: &'a [Question],
}

/// JSON 数据备份（包含全部作业，供数据交换）
pub struct JsonExporter {
    output_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }
}

impl DocumentExporter for JsonExporter {
    fn format_name(&self) -> &'static str {
        "JSON"
    }

    fn export(&self, course_name: &str, assignments: &[Assignment]) -> AppResult<PathBuf> {
        let path = self
            .output_dir
            .join(format!("{}_习题_数据.json", sanitize_file_name(course_name)));

        let document = CourseDocument {
            course_name,
            export_time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            assignments: assignments
                .iter()
                .map(|a| AssignmentDocument {
                    work_id: &a.work_id,
                    name: &a.name,
                    status: &a.status,
                    questions: &a.questions,
                })
                .collect(),
        };

        let content = serde_json::to_string_pretty(&document).map_err(|e| FileError::SerializeFailed {
            path: path.display().to_string(),
            source: e,
        })?;

        write_file(&path, &content)?;
        info!("💾 JSON导出完成: {}", path.display());
        Ok(path)
    }
}
