//! 作业题目服务 - 业务能力层
//!
//! 打开一份作业的查看页面，把其中所有题目块交给题目解析

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::PageFetcher;
use crate::models::{Assignment, Question};
use crate::services::question_extractor;
use crate::utils::query::{param, parse_query};

/// 作业题目服务
pub struct QuestionService {
    fetcher: Arc<dyn PageFetcher>,
    work_view_url: String,
}

impl QuestionService {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &Config) -> Self {
        Self {
            fetcher,
            work_view_url: config.work_view_url.clone(),
        }
    }

    /// 获取作业中的全部题目（按页面出现顺序）
    pub async fn fetch_questions(&self, assignment: &Assignment) -> AppResult<Vec<Question>> {
        let params = parse_query(&assignment.listing_url);
        let query = [
            ("courseId", param(&params, "courseId")),
            ("classId", param(&params, "classId")),
            ("cpi", param(&params, "cpi")),
            ("workId", param(&params, "workId")),
            ("answerId", param(&params, "answerId")),
            ("enc", param(&params, "enc")),
        ];

        let html = self.fetcher.fetch(&self.work_view_url, &query).await?;
        let questions = question_extractor::extract_page(&html);

        info!(
            "作业 {} 获取到 {} 道题目",
            assignment.name,
            questions.len()
        );
        Ok(questions)
    }
}
