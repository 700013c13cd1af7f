use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::AppResult;
use crate::exporters::{write_file, DocumentExporter};
use crate::models::{Assignment, Question};
use crate::utils::sanitize_file_name;

/// Markdown 习题集
pub struct MarkdownExporter {
    output_dir: PathBuf,
    with_answers: bool,
}

impl MarkdownExporter {
    pub fn new(output_dir: &Path, with_answers: bool) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            with_answers,
        }
    }

    /// 生成 Markdown 文本；没有题目的作业不输出
    pub fn render(&self, course_name: &str, assignments: &[Assignment]) -> String {
        let mut out = format!("# {} 习题集\n\n", course_name);

        for assignment in assignments.iter().filter(|a| !a.questions.is_empty()) {
            let _ = write!(out, "## {}\n\n", assignment.name);
            for question in &assignment.questions {
                self.render_question(&mut out, question);
            }
        }

        out
    }

    fn render_question(&self, out: &mut String, question: &Question) {
        let _ = write!(out, "### {}\n\n", question.title);

        let options = question.body.options();
        if !options.is_empty() {
            // 选项自带换行
            options.iter().for_each(|option| out.push_str(option));
            out.push('\n');
        }

        if self.with_answers {
            let _ = write!(out, "正确答案: {}\n\n", question.body.correct_answer_text());
            if let Some(ai) = &question.ai_answer {
                let mark = if ai.confirmed { " ✓" } else { "" };
                let _ = write!(out, "AI 答案{}: {}\n\n", mark, ai.text);
            }
        } else {
            out.push_str("答案: ____________________\n\n");
        }
    }
}

impl DocumentExporter for MarkdownExporter {
    fn format_name(&self) -> &'static str {
        "Markdown"
    }

    fn export(&self, course_name: &str, assignments: &[Assignment]) -> AppResult<PathBuf> {
        let suffix = if self.with_answers { "带答案" } else { "不带答案" };
        let path = self.output_dir.join(format!(
            "{}_习题_{}.md",
            sanitize_file_name(course_name),
            suffix
        ));

        write_file(&path, &self.render(course_name, assignments))?;
        info!("📝 Markdown导出完成: {}", path.display());
        Ok(path)
    }
}
