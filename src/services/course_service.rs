//! 课程服务 - 业务能力层
//!
//! 负责"列出课程"和"取得作业列表令牌"两种能力

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{MarkupIndex, MarkupNode, PageFetcher};
use crate::models::Course;
use crate::utils::query::{param, parse_query};

/// 课程服务
pub struct CourseService {
    fetcher: Arc<dyn PageFetcher>,
    course_list_url: String,
    course_middle_url: String,
}

impl CourseService {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &Config) -> Self {
        Self {
            fetcher,
            course_list_url: config.course_list_url.clone(),
            course_middle_url: config.course_middle_url.clone(),
        }
    }

    /// 获取已加入的课程列表
    pub async fn list_courses(&self) -> AppResult<Vec<Course>> {
        let query = [
            ("courseType", "1".to_string()),
            ("courseFolderId", "0".to_string()),
            ("superstarClass", "0".to_string()),
        ];
        let html = self.fetcher.fetch(&self.course_list_url, &query).await?;
        let courses = parse_course_list(&html);
        info!("✓ 获取到 {} 门课程", courses.len());
        Ok(courses)
    }

    /// 取得作业列表接口需要的 enc 令牌
    ///
    /// 页面上没有令牌时返回 `None`
    pub async fn resolve_listing_token(&self, course: &Course) -> AppResult<Option<String>> {
        let query = [
            ("courseid", course.course_id.clone()),
            ("clazzid", course.class_id.clone()),
            ("cpi", course.cpi.clone()),
            ("ismooc2", "1".to_string()),
            ("v", chrono::Utc::now().timestamp_millis().to_string()),
            ("start", "0".to_string()),
            ("size", "500".to_string()),
            ("catalogId", "0".to_string()),
            ("superstarClass", "0".to_string()),
        ];
        let html = self.fetcher.fetch(&self.course_middle_url, &query).await?;
        let token = parse_work_enc(&html);
        match &token {
            Some(enc) => debug!("作业列表令牌: {}", enc),
            None => warn!("⚠️ 课程 {} 的页面中未找到作业列表令牌 (workEnc)", course),
        }
        Ok(token)
    }
}

/// 解析课程列表页面
pub fn parse_course_list(html: &str) -> Vec<Course> {
    let index = MarkupIndex::parse(html);
    let mut courses = Vec::new();

    for (position, info) in index.select_all("div.course-info").into_iter().enumerate() {
        let Some(link) = info.find("a.color1") else {
            warn!("⚠️ 第 {} 个课程条目缺少链接，已跳过", position + 1);
            continue;
        };
        let source_url = link.attr_value("href").unwrap_or_default();
        let display_name = info
            .find("span.course-name")
            .map(|span| span.trimmed_text())
            .unwrap_or_default();

        let params = parse_query(&source_url);
        let course = Course {
            course_id: param(&params, "courseid"),
            class_id: param(&params, "clazzid"),
            cpi: param(&params, "cpi"),
            display_name,
            source_url,
        };

        if course.course_id.is_empty() || course.class_id.is_empty() {
            warn!(
                "⚠️ 课程 '{}' 缺少 courseid/clazzid，已跳过: {}",
                course.display_name, course.source_url
            );
            continue;
        }
        courses.push(course);
    }

    courses
}

/// 从课程中间页取出 `input#workEnc` 的值
pub fn parse_work_enc(html: &str) -> Option<String> {
    MarkupIndex::parse(html)
        .select_first("input#workEnc")
        .and_then(|input| input.attr_value("value"))
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COURSE_LIST: &str = r#"
        <div class="course-info">
          <h3><a class="color1" href="https://mooc1.chaoxing.com/visit/stucoursemiddle?courseid=228&clazzid=9001&cpi=77&ismooc2=1">
            <span class="course-name overHidden2" title="数据结构">数据结构</span></a></h3>
        </div>
        <div class="course-info">
          <h3><a class="color1" href="https://mooc1.chaoxing.com/visit/stucoursemiddle?cpi=78">
            <span class="course-name overHidden2">缺少编号的课程</span></a></h3>
        </div>
        <div class="course-info"><p>没有链接</p></div>
    "#;

    #[test]
    fn test_parse_course_list_keeps_identified_courses() {
        let courses = parse_course_list(COURSE_LIST);
        assert_eq!(courses.len(), 1);
        let course = &courses[0];
        assert_eq!(course.identity(), ("228", "9001"));
        assert_eq!(course.cpi, "77");
        assert_eq!(course.display_name, "数据结构");
    }

    #[test]
    fn test_parse_work_enc() {
        let html = r#"<body><input type="hidden" id="workEnc" value="e7f3a9"/></body>"#;
        assert_eq!(parse_work_enc(html).as_deref(), Some("e7f3a9"));
        assert_eq!(parse_work_enc(r#"<input id="workEnc" value="">"#), None);
        assert_eq!(parse_work_enc("<body></body>"), None);
    }
}
