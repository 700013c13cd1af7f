//! 作业列表分页抓取 - 业务能力层
//!
//! 页数来自第一页内嵌脚本里的 `pageNum: N`，只作参考：
//! 任何一页没有列表项就立即停止；脚本里找不到页数时按 1 页处理。

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{MarkupIndex, MarkupNode, PageFetcher};
use crate::models::{Assignment, Course};
use crate::services::course_service::CourseService;
use crate::utils::query::{param, parse_query};

const PAGE_COUNT_PATTERN: &str = r"pageNum\s*:\s*(\d+)";

/// 作业列表令牌（enc）的来源
#[async_trait]
pub trait ListingTokenSource: Send + Sync {
    async fn listing_token(&self, course: &Course) -> AppResult<Option<String>>;
}

#[async_trait]
impl ListingTokenSource for CourseService {
    async fn listing_token(&self, course: &Course) -> AppResult<Option<String>> {
        self.resolve_listing_token(course).await
    }
}

/// 单页解析结果
#[derive(Debug, Default)]
pub struct ListingPage {
    /// 脚本中声明的总页数（只在第一页读取）
    pub declared_total: Option<u32>,
    /// 页面上 `<li>` 的数量（包括被丢弃的条目）
    pub item_count: usize,
    pub assignments: Vec<Assignment>,
}

/// 作业列表分页抓取器
pub struct AssignmentPaginator {
    fetcher: Arc<dyn PageFetcher>,
    work_list_url: String,
}

impl AssignmentPaginator {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &Config) -> Self {
        Self {
            fetcher,
            work_list_url: config.work_list_url.clone(),
        }
    }

    /// 取得课程的全部作业
    ///
    /// 没有令牌时返回空列表；任何一页请求失败都会中断整个过程，不返回部分结果。
    pub async fn paginate(
        &self,
        course: &Course,
        tokens: &dyn ListingTokenSource,
    ) -> AppResult<Vec<Assignment>> {
        match tokens.listing_token(course).await? {
            Some(enc) => self.paginate_with_token(course, &enc).await,
            None => Ok(Vec::new()),
        }
    }

    /// 使用已知令牌逐页抓取
    pub async fn paginate_with_token(&self, course: &Course, enc: &str) -> AppResult<Vec<Assignment>> {
        let mut assignments = Vec::new();
        let mut page_num: u32 = 1;
        let mut total_pages: u32 = 1;

        loop {
            let query = [
                ("courseId", course.course_id.clone()),
                ("classId", course.class_id.clone()),
                ("cpi", course.cpi.clone()),
                ("ut", "s".to_string()),
                ("enc", enc.to_string()),
                ("pageNum", page_num.to_string()),
            ];
            let html = self.fetcher.fetch(&self.work_list_url, &query).await?;
            let page = parse_listing_page(&html, &course.course_id, page_num == 1);

            if page_num == 1 {
                total_pages = match page.declared_total {
                    Some(total) => total.max(1),
                    None => {
                        debug!("页面脚本中未声明总页数，按 1 页处理");
                        1
                    }
                };
                info!("📄 作业列表共 {} 页", total_pages);
            }

            if page.item_count == 0 {
                info!("第 {} 页没有列表项，停止翻页", page_num);
                break;
            }

            debug!(
                "第 {}/{} 页: {} 个列表项, {} 个作业",
                page_num,
                total_pages,
                page.item_count,
                page.assignments.len()
            );
            assignments.extend(page.assignments);

            if page_num >= total_pages {
                break;
            }
            page_num += 1;
        }

        info!("✓ 获取到 {} 个作业", assignments.len());
        Ok(assignments)
    }
}

/// 解析一页作业列表
pub fn parse_listing_page(html: &str, course_id: &str, read_total: bool) -> ListingPage {
    let index = MarkupIndex::parse(html);

    let declared_total = if read_total {
        index
            .select_first("body script")
            .and_then(|script| declared_page_count(&script.raw_text()))
    } else {
        None
    };

    let items = index.select_all("li");
    let mut assignments = Vec::new();

    for (position, li) in items.iter().enumerate() {
        let paragraphs = li.find_all("p");
        let name = paragraphs
            .first()
            .map(|p| p.trimmed_text())
            .unwrap_or_else(|| "未知作业".to_string());

        let Some(listing_url) = li.attr_value("data").filter(|d| !d.is_empty()) else {
            warn!("⚠️ 列表项 {} ('{}') 没有 data 属性，已跳过", position + 1, name);
            continue;
        };

        let work_id = param(&parse_query(&listing_url), "workId");
        if work_id.is_empty() {
            warn!(
                "⚠️ 列表项 {} ('{}') 无法取得 workId，已跳过: {}",
                position + 1,
                name,
                listing_url
            );
            continue;
        }

        let status = paragraphs
            .get(1)
            .map(|p| p.trimmed_text())
            .unwrap_or_else(|| "未知状态".to_string());

        assignments.push(Assignment {
            work_id,
            name,
            status,
            listing_url,
            course_id: course_id.to_string(),
            questions: Vec::new(),
        });
    }

    ListingPage {
        declared_total,
        item_count: items.len(),
        assignments,
    }
}

/// 从脚本文本中取出声明的总页数
pub fn declared_page_count(script: &str) -> Option<u32> {
    let re = Regex::new(PAGE_COUNT_PATTERN).ok()?;
    re.captures(script)?.get(1)?.as_str().parse().ok()
}
