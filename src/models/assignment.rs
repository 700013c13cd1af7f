use serde::{Deserialize, Serialize};

use crate::models::question::Question;

/// 作业
///
/// 由作业列表解析得到；题目在单独请求后一次性挂上去。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub work_id: String,
    pub name: String,
    pub status: String,
    /// 列表项 `data` 属性中的原始链接，查看作业时从中取参数
    pub listing_url: String,
    pub course_id: String,
    /// 按在页面上出现的顺序排列
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Assignment {
    /// 挂上题目
    pub fn with_questions(mut self, questions: Vec<Question>) -> Self {
        self.questions = questions;
        self
    }
}
