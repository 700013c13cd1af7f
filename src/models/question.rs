use serde::{Deserialize, Serialize};

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnswerType {
    /// 单选题
    SingleChoice,
    /// 多选题
    MultiChoice,
    /// 填空题
    FillBlank,
    /// 判断题
    TrueFalse,
    /// 思维导图
    MindMap,
    /// 名词解释
    TermDefinition,
    /// 简答题
    ShortAnswer,
    /// 其它
    Other,
}

impl AnswerType {
    /// 标准中文名称
    pub fn label(self) -> &'static str {
        match self {
            AnswerType::SingleChoice => "单选题",
            AnswerType::MultiChoice => "多选题",
            AnswerType::FillBlank => "填空题",
            AnswerType::TrueFalse => "判断题",
            AnswerType::MindMap => "思维导图",
            AnswerType::TermDefinition => "名词解释",
            AnswerType::ShortAnswer => "简答题",
            AnswerType::Other => "其它",
        }
    }
}

impl std::fmt::Display for AnswerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 选择题的选项与答案
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceAnswer {
    /// 规范化后的选项，每项以一个换行结尾
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// 按题型区分的题目内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "answer_type", rename_all = "kebab-case")]
pub enum QuestionBody {
    SingleChoice(ChoiceAnswer),
    MultiChoice(ChoiceAnswer),
    /// 每个空一个答案
    FillBlank { correct_answer: Vec<String> },
    TrueFalse { correct_answer: String },
    MindMap,
    TermDefinition { correct_answer: String },
    ShortAnswer { correct_answer: String },
    Other { correct_answer: String },
}

impl QuestionBody {
    pub fn answer_type(&self) -> AnswerType {
        match self {
            QuestionBody::SingleChoice(_) => AnswerType::SingleChoice,
            QuestionBody::MultiChoice(_) => AnswerType::MultiChoice,
            QuestionBody::FillBlank { .. } => AnswerType::FillBlank,
            QuestionBody::TrueFalse { .. } => AnswerType::TrueFalse,
            QuestionBody::MindMap => AnswerType::MindMap,
            QuestionBody::TermDefinition { .. } => AnswerType::TermDefinition,
            QuestionBody::ShortAnswer { .. } => AnswerType::ShortAnswer,
            QuestionBody::Other { .. } => AnswerType::Other,
        }
    }

    /// 选项（非选择题为空）
    pub fn options(&self) -> &[String] {
        match self {
            QuestionBody::SingleChoice(choice) | QuestionBody::MultiChoice(choice) => {
                &choice.options
            }
            _ => &[],
        }
    }

    /// 用于展示的正确答案，填空题各空以 ", " 连接
    pub fn correct_answer_text(&self) -> String {
        match self {
            QuestionBody::SingleChoice(choice) | QuestionBody::MultiChoice(choice) => {
                choice.correct_answer.clone()
            }
            QuestionBody::FillBlank { correct_answer } => correct_answer.join(", "),
            QuestionBody::TrueFalse { correct_answer }
            | QuestionBody::TermDefinition { correct_answer }
            | QuestionBody::ShortAnswer { correct_answer }
            | QuestionBody::Other { correct_answer } => correct_answer.clone(),
            QuestionBody::MindMap => String::new(),
        }
    }
}

/// AI 给出的答案，只由外部 AI 服务填写
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiAnswer {
    pub text: String,
    /// AI 答案与平台公布的答案一致
    pub confirmed: bool,
}

/// 题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// 规范化后的题干
    pub title: String,
    #[serde(flatten)]
    pub body: QuestionBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_answer: Option<AiAnswer>,
}

impl Question {
    pub fn new(title: impl Into<String>, body: QuestionBody) -> Self {
        Self {
            title: title.into(),
            body,
            ai_answer: None,
        }
    }

    pub fn answer_type(&self) -> AnswerType {
        self.body.answer_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_shape_is_tagged() {
        let question = Question::new(
            "1. 下列说法正确的是()",
            QuestionBody::SingleChoice(ChoiceAnswer {
                options: vec!["A. 甲\n".to_string(), "B. 乙\n".to_string()],
                correct_answer: "A".to_string(),
            }),
        );

        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "1. 下列说法正确的是()",
                "answer_type": "single-choice",
                "options": ["A. 甲\n", "B. 乙\n"],
                "correct_answer": "A"
            })
        );

        let back: Question = serde_json::from_value(value).unwrap();
        assert_eq!(back, question);
    }

    #[test]
    fn test_fill_blank_answer_text() {
        let body = QuestionBody::FillBlank {
            correct_answer: vec!["北京".to_string(), "上海".to_string()],
        };
        assert_eq!(body.answer_type(), AnswerType::FillBlank);
        assert_eq!(body.correct_answer_text(), "北京, 上海");
        assert!(body.options().is_empty());
    }

    #[test]
    fn test_mind_map_serializes_tag_only() {
        let question = Question::new("画出知识结构", QuestionBody::MindMap);
        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value, json!({"title": "画出知识结构", "answer_type": "mind-map"}));
    }
}
