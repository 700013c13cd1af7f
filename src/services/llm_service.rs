//! LLM 服务 - 业务能力层
//!
//! 只负责"给一道题生成答案"的能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppResult, LlmError};
use crate::models::{AiAnswer, Question};

const SYSTEM_PROMPT: &str = "你是一名认真的助教，请直接给出题目的答案。\
                             选择题只回答选项字母，判断题只回答“对”或“错”，\
                             其余题型给出简洁完整的作答。";

/// 为一道题生成答案
///
/// 每道题最多调用一次，且只在全部抓取结束之后调用。
#[async_trait]
pub trait AnswerSolver: Send + Sync {
    async fn solve(&self, question: &Question) -> AppResult<AiAnswer>;
}

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 生成单道题的答案
/// - 提供通用的 LLM 调用接口
/// - 不出现 Vec<Question>，不关心流程顺序
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 去掉首尾空白的响应内容
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.chars().count());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| LlmError::RequestBuild(e.to_string()))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| LlmError::RequestBuild(e.to_string()))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(1024u32)
            .build()
            .map_err(|e| LlmError::RequestBuild(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            LlmError::ApiCallFailed {
                model: self.model_name.clone(),
                message: e.to_string(),
            }
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl AnswerSolver for LlmService {
    async fn solve(&self, question: &Question) -> AppResult<AiAnswer> {
        let prompt = build_prompt(question);
        let text = self.send_to_llm(&prompt, Some(SYSTEM_PROMPT)).await?;
        let confirmed = is_confirmed(&text, &question.body.correct_answer_text());
        Ok(AiAnswer { text, confirmed })
    }
}

/// 构建单道题的提示词
pub fn build_prompt(question: &Question) -> String {
    let mut prompt = format!("【{}】\n{}\n", question.answer_type(), question.title);

    let options = question.body.options();
    if !options.is_empty() {
        prompt.push_str("\n选项：\n");
        for option in options {
            prompt.push_str(option);
        }
    }

    prompt.push_str("\n请给出答案。");
    prompt
}

/// AI 答案包含平台公布的答案时视为一致
///
/// 没有公布答案时永远不算一致。
pub fn is_confirmed(ai_text: &str, published: &str) -> bool {
    let published = published.trim();
    !published.is_empty() && ai_text.contains(published)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChoiceAnswer, QuestionBody};

    fn choice_question() -> Question {
        Question::new(
            "栈的特点是 ( )",
            QuestionBody::SingleChoice(ChoiceAnswer {
                options: vec!["A. 先进先出\n".to_string(), "B. 后进先出\n".to_string()],
                correct_answer: "B".to_string(),
            }),
        )
    }

    #[test]
    fn test_prompt_contains_type_title_and_options() {
        let prompt = build_prompt(&choice_question());

        assert!(prompt.starts_with("【单选题】\n栈的特点是 ( )\n"));
        assert!(prompt.contains("选项：\nA. 先进先出\nB. 后进先出\n"));
    }

    #[test]
    fn test_prompt_without_options() {
        let question = Question::new(
            "简述快速排序",
            QuestionBody::ShortAnswer {
                correct_answer: String::new(),
            },
        );
        let prompt = build_prompt(&question);

        assert!(prompt.contains("【简答题】"));
        assert!(!prompt.contains("选项"));
    }

    #[test]
    fn test_is_confirmed() {
        assert!(is_confirmed("答案：B", "B"));
        assert!(is_confirmed("B", " B "));
        assert!(!is_confirmed("答案：A", "B"));
        // 没有公布答案
        assert!(!is_confirmed("答案：A", ""));
    }

    /// 需要真实的 LLM 服务
    ///
    /// ```bash
    /// LLM_API_KEY=... cargo test test_solve_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_solve_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::default().with_env().unwrap();
        let service = LlmService::new(&config);

        let answer = service.solve(&choice_question()).await.unwrap();
        println!("LLM 答案: {} (一致: {})", answer.text, answer.confirmed);
        assert!(!answer.text.is_empty());
    }
}
