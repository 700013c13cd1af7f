use std::io::Cursor;
use std::path::{Path, PathBuf};

use docx_rs::{Docx, Paragraph, Run, RunFonts};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::exporters::{write_file, DocumentExporter};
use crate::models::{Assignment, Question};
use crate::utils::sanitize_file_name;

const BODY_FONT: &str = "宋体";
/// 字号以半磅计
const BODY_SIZE: usize = 24;
const TITLE_SIZE: usize = 44;
const HEADING_SIZE: usize = 32;
/// 选项左缩进 0.5 英寸（单位 twip）
const OPTION_INDENT: i32 = 720;

/// 文档中的一个段落
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordBlock {
    /// 文档标题
    Title(String),
    /// 作业标题
    Heading(String),
    /// 加粗的带序号题干
    Question(String),
    /// 缩进的选项
    Option(String),
    /// 加粗的答案行
    Answer(String),
    /// 普通文本行
    Text(String),
    /// 空行
    Blank,
}

/// Word 习题集
pub struct WordExporter {
    output_dir: PathBuf,
    with_answers: bool,
}

impl WordExporter {
    pub fn new(output_dir: &Path, with_answers: bool) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            with_answers,
        }
    }

    /// 文档段落序列，题号在每个作业内从 1 开始
    pub fn blocks(&self, course_name: &str, assignments: &[Assignment]) -> Vec<WordBlock> {
        let mut blocks = vec![WordBlock::Title(format!("{} 习题集", course_name))];

        for assignment in assignments.iter().filter(|a| !a.questions.is_empty()) {
            blocks.push(WordBlock::Heading(assignment.name.clone()));
            for (number, question) in assignment.questions.iter().enumerate() {
                self.question_blocks(&mut blocks, number + 1, question);
            }
        }

        blocks
    }

    fn question_blocks(&self, blocks: &mut Vec<WordBlock>, number: usize, question: &Question) {
        blocks.push(WordBlock::Question(format!("{}. {}", number, question.title)));
        blocks.extend(
            question
                .body
                .options()
                .iter()
                .map(|option| WordBlock::Option(format!("• {}", option.trim()))),
        );

        if self.with_answers {
            blocks.push(WordBlock::Answer(format!(
                "正确答案: {}",
                question.body.correct_answer_text()
            )));
            if let Some(ai) = &question.ai_answer {
                let mark = if ai.confirmed { " ✓" } else { "" };
                blocks.push(WordBlock::Text(format!("AI 答案{}: {}", mark, ai.text)));
            }
        } else {
            blocks.push(WordBlock::Text("答案: ____________________".to_string()));
        }
        blocks.push(WordBlock::Blank);
    }

    /// 打包为 docx 字节
    fn pack(blocks: Vec<WordBlock>) -> std::io::Result<Vec<u8>> {
        let fonts = RunFonts::new().ascii(BODY_FONT).east_asia(BODY_FONT);
        let docx = blocks.into_iter().fold(
            Docx::new().default_fonts(fonts).default_size(BODY_SIZE),
            |docx, block| docx.add_paragraph(paragraph(block)),
        );

        let mut buffer = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buffer)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        Ok(buffer.into_inner())
    }
}

fn paragraph(block: WordBlock) -> Paragraph {
    match block {
        WordBlock::Title(text) => {
            Paragraph::new().add_run(Run::new().add_text(text).bold().size(TITLE_SIZE))
        }
        WordBlock::Heading(text) => {
            Paragraph::new().add_run(Run::new().add_text(text).bold().size(HEADING_SIZE))
        }
        WordBlock::Question(text) | WordBlock::Answer(text) => {
            Paragraph::new().add_run(Run::new().add_text(text).bold())
        }
        WordBlock::Option(text) => Paragraph::new()
            .indent(Some(OPTION_INDENT), None, None, None)
            .add_run(Run::new().add_text(text)),
        WordBlock::Text(text) => Paragraph::new().add_run(Run::new().add_text(text)),
        WordBlock::Blank => Paragraph::new(),
    }
}

impl DocumentExporter for WordExporter {
    fn format_name(&self) -> &'static str {
        "Word"
    }

    fn export(&self, course_name: &str, assignments: &[Assignment]) -> AppResult<PathBuf> {
        let suffix = if self.with_answers { "带答案" } else { "不带答案" };
        let path = self.output_dir.join(format!(
            "{}_习题_{}.docx",
            sanitize_file_name(course_name),
            suffix
        ));

        let bytes = Self::pack(self.blocks(course_name, assignments))
            .map_err(|e| AppError::write_failed(path.display().to_string(), e))?;
        write_file(&path, bytes)?;
        info!("📘 Word导出完成: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AiAnswer, ChoiceAnswer, QuestionBody};

    fn assignments() -> Vec<Assignment> {
        let mut choice = Question::new(
            "栈的特点是 ( )",
            QuestionBody::SingleChoice(ChoiceAnswer {
                options: vec!["A. 先进先出\n".to_string(), "B. 后进先出\n".to_string()],
                correct_answer: "B".to_string(),
            }),
        );
        choice.ai_answer = Some(AiAnswer {
            text: "A".to_string(),
            confirmed: false,
        });
        let judge = Question::new(
            "队列是线性表",
            QuestionBody::TrueFalse {
                correct_answer: "对".to_string(),
            },
        );

        vec![
            Assignment {
                work_id: "w1".to_string(),
                name: "第一次作业".to_string(),
                status: "已完成".to_string(),
                listing_url: String::new(),
                course_id: "c1".to_string(),
                questions: vec![choice, judge],
            },
            Assignment {
                work_id: "w2".to_string(),
                name: "空作业".to_string(),
                status: "未交".to_string(),
                listing_url: String::new(),
                course_id: "c1".to_string(),
                questions: Vec::new(),
            },
        ]
    }

    #[test]
    fn test_blocks_with_answers() {
        let exporter = WordExporter::new(Path::new("out"), true);
        let blocks = exporter.blocks("数据结构", &assignments());

        assert_eq!(
            blocks,
            vec![
                WordBlock::Title("数据结构 习题集".to_string()),
                WordBlock::Heading("第一次作业".to_string()),
                WordBlock::Question("1. 栈的特点是 ( )".to_string()),
                WordBlock::Option("• A. 先进先出".to_string()),
                WordBlock::Option("• B. 后进先出".to_string()),
                WordBlock::Answer("正确答案: B".to_string()),
                WordBlock::Text("AI 答案: A".to_string()),
                WordBlock::Blank,
                WordBlock::Question("2. 队列是线性表".to_string()),
                WordBlock::Answer("正确答案: 对".to_string()),
                WordBlock::Blank,
            ]
        );
    }

    #[test]
    fn test_blocks_without_answers() {
        let exporter = WordExporter::new(Path::new("out"), false);
        let blocks = exporter.blocks("数据结构", &assignments());

        assert!(!blocks.iter().any(|b| matches!(b, WordBlock::Answer(_))));
        let blanks = blocks
            .iter()
            .filter(|b| **b == WordBlock::Text("答案: ____________________".to_string()))
            .count();
        assert_eq!(blanks, 2);
    }

    #[test]
    fn test_export_writes_docx_archive() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = WordExporter::new(dir.path(), true);

        let path = exporter.export("数据结构", &assignments()).unwrap();

        assert_eq!(path, dir.path().join("数据结构_习题_带答案.docx"));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
