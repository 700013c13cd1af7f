use serde::{Deserialize, Serialize};

/// 课程
///
/// 由课程列表解析得到，之后不再修改。身份为 (course_id, class_id)。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: String,
    pub class_id: String,
    /// 班级实例作用域标识，几乎所有接口都要求携带
    pub cpi: String,
    pub display_name: String,
    pub source_url: String,
}

impl Course {
    /// 课程 + 班级的组合标识
    pub fn identity(&self) -> (&str, &str) {
        (&self.course_id, &self.class_id)
    }
}

impl std::fmt::Display for Course {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [courseId#{} classId#{}]", self.display_name, self.course_id, self.class_id)
    }
}
