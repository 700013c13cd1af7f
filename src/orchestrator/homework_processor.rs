//! 作业模式处理器 - 编排层
//!
//! ## 流程
//!
//! 1. **分页**：取得课程的全部作业
//! 2. **抓题**：逐个作业抓取题目，相邻两次请求之间等待 `request_delay`
//! 3. **AI 作答**：全部抓取结束后才开始，每道题最多一次，同样有间隔
//! 4. **导出**：交给所有导出器
//!
//! 单个作业抓题失败只记录日志并计入失败数，不影响其它作业；
//! 分页失败则中断整个课程。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::exporters::DocumentExporter;
use crate::infrastructure::PageFetcher;
use crate::models::{Assignment, Course};
use crate::services::{AnswerSolver, AssignmentPaginator, CourseService, QuestionService};
use crate::utils::logging::log_section;
use crate::utils::truncate_text;

/// 作业模式统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HomeworkStats {
    /// 列表中的作业数
    pub assignments: usize,
    /// 成功抓取题目的作业数
    pub fetched: usize,
    /// 抓取题目失败的作业数
    pub failed: usize,
    pub questions: usize,
    pub ai_answered: usize,
    pub exported: Vec<PathBuf>,
}

/// 作业模式处理器
pub struct HomeworkProcessor {
    courses: CourseService,
    paginator: AssignmentPaginator,
    questions: QuestionService,
    solver: Option<Arc<dyn AnswerSolver>>,
    exporters: Vec<Box<dyn DocumentExporter>>,
    delay: Duration,
}

impl HomeworkProcessor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        config: &Config,
        solver: Option<Arc<dyn AnswerSolver>>,
        exporters: Vec<Box<dyn DocumentExporter>>,
    ) -> Self {
        Self {
            courses: CourseService::new(fetcher.clone(), config),
            paginator: AssignmentPaginator::new(fetcher.clone(), config),
            questions: QuestionService::new(fetcher, config),
            solver,
            exporters,
            delay: config.request_delay(),
        }
    }

    /// 处理一门课程的全部作业
    pub async fn process(&self, course: &Course) -> AppResult<HomeworkStats> {
        log_section(&format!("📝 作业模式: {}", course.display_name));
        let mut stats = HomeworkStats::default();

        let listed = self.paginator.paginate(course, &self.courses).await?;
        stats.assignments = listed.len();
        if listed.is_empty() {
            warn!("⚠️ 课程 {} 没有可抓取的作业", course);
            return Ok(stats);
        }

        let total = listed.len();
        let mut assignments = Vec::with_capacity(total);
        for (index, assignment) in listed.into_iter().enumerate() {
            if index > 0 {
                pause(self.delay).await;
            }
            info!(
                "[{}/{}] 📄 {} ({})",
                index + 1,
                total,
                assignment.name,
                assignment.status
            );

            match self.questions.fetch_questions(&assignment).await {
                Ok(questions) => {
                    stats.fetched += 1;
                    stats.questions += questions.len();
                    assignments.push(assignment.with_questions(questions));
                }
                Err(e) => {
                    error!(
                        "[{}/{}] ❌ 获取题目失败 (workId#{}): {}",
                        index + 1,
                        total,
                        assignment.work_id,
                        e
                    );
                    stats.failed += 1;
                    assignments.push(assignment);
                }
            }
        }

        if let Some(solver) = &self.solver {
            log_section("🤖 AI 作答");
            stats.ai_answered = self.attach_ai_answers(solver.as_ref(), &mut assignments).await;
        }

        for exporter in &self.exporters {
            match exporter.export(&course.display_name, &assignments) {
                Ok(path) => stats.exported.push(path),
                Err(e) => error!("❌ {}导出失败: {}", exporter.format_name(), e),
            }
        }

        info!(
            "✓ 作业 {}/{}，题目 {} 道",
            stats.fetched, stats.assignments, stats.questions
        );
        Ok(stats)
    }

    /// 为每道题调用一次 AI，返回成功的数量
    async fn attach_ai_answers(&self, solver: &dyn AnswerSolver, assignments: &mut [Assignment]) -> usize {
        let mut answered = 0;
        let mut first = true;

        for question in assignments.iter_mut().flat_map(|a| a.questions.iter_mut()) {
            if !first {
                pause(self.delay).await;
            }
            first = false;

            match solver.solve(question).await {
                Ok(answer) => {
                    debug!(
                        "AI 作答: {} → {} (一致: {})",
                        truncate_text(&question.title, 30),
                        truncate_text(&answer.text, 30),
                        answer.confirmed
                    );
                    question.ai_answer = Some(answer);
                    answered += 1;
                }
                Err(e) => warn!(
                    "⚠️ AI 作答失败 ({}): {}",
                    truncate_text(&question.title, 30),
                    e
                ),
            }
        }

        answered
    }
}

/// 礼貌性等待，0 表示不等待
async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
