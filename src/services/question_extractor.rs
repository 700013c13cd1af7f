//! 题目解析 - 业务能力层
//!
//! 输入一个题目块（`div.mark_item`），按块标题判定题型，
//! 再对块内每个"题目详情"元素套用该题型的字段规则。
//!
//! 容错粒度：
//! - 字段缺失 → 该字段为空
//! - 单个详情元素无法解析 → 只跳过这一题
//! - 块标题无法识别 → 整块跳过
//!
//! 所有跳过都会记录 warn 日志。

use phf::phf_ordered_map;
use scraper::ElementRef;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::infrastructure::{MarkupIndex, MarkupNode};
use crate::models::{AnswerType, ChoiceAnswer, Question, QuestionBody};
use crate::utils::truncate_text;

/// 题型词表，按优先级排列：块标题中第一个被包含的词决定题型
static TYPE_PRIORITY: phf::OrderedMap<&'static str, AnswerType> = phf_ordered_map! {
    "单选题" => AnswerType::SingleChoice,
    "多选题" => AnswerType::MultiChoice,
    "填空题" => AnswerType::FillBlank,
    "判断题" => AnswerType::TrueFalse,
    "思维导图" => AnswerType::MindMap,
    "名词解释" => AnswerType::TermDefinition,
    "简答题" => AnswerType::ShortAnswer,
    "其它" => AnswerType::Other,
    "其他" => AnswerType::Other,
};

/// 页面中混入的不可见字符（零宽字符、方向控制符、不换行空格）
const INVISIBLE_CHARS: &[char] = &[
    '\u{200b}', '\u{200c}', '\u{200d}', '\u{200e}', '\u{200f}', '\u{2060}', '\u{feff}', '\u{a0}',
];

const BLOCK_SELECTOR: &str = "div.mark_item";
const BLOCK_HEADING_SELECTOR: &str = "h2.type_tit";
const DETAIL_SELECTOR: &str = r#"div[aria-label="题目详情"]"#;
const TITLE_SELECTOR: &str = "h3.mark_name";
const OPTIONS_SELECTOR: &str = "ul.mark_letter";
const ANSWER_AREA_SELECTOR: &str = "div.mark_answer";
const RIGHT_ANSWER_SELECTOR: &str = "span.rightAnswerContent";
const TEXT_RIGHT_ANSWER_SELECTOR: &str = ".rightAnswerContent";
const OWN_ANSWER_SELECTOR: &str = ".stuAnswerContent";
const FILL_ANSWER_SELECTOR: &str = "dl.mark_fill.colorGreen dd";

/// 单个详情元素被跳过的原因
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetailSkip {
    #[error("缺少题干 (h3.mark_name)")]
    MissingTitle,
    #[error("题干为空")]
    EmptyTitle,
}

/// 解析整个作业查看页面中的所有题目块
pub fn extract_page(html: &str) -> Vec<Question> {
    let index = MarkupIndex::parse(html);
    index
        .select_all(BLOCK_SELECTOR)
        .into_iter()
        .flat_map(extract_block)
        .collect()
}

/// 解析一个题目块
pub fn extract_block(block: ElementRef<'_>) -> Vec<Question> {
    let Some(heading) = block.find(BLOCK_HEADING_SELECTOR) else {
        warn!("⚠️ 题目块缺少标题 ({})，整块跳过", BLOCK_HEADING_SELECTOR);
        return Vec::new();
    };
    let heading_text = heading.trimmed_text();

    let Some(answer_type) = classify(&heading_text) else {
        warn!("⚠️ 未知题目类型: '{}'，整块跳过", heading_text);
        return Vec::new();
    };
    info!("解析题目类型: {} ({})", heading_text, answer_type);

    let details = block.find_all(DETAIL_SELECTOR);
    let mut questions = Vec::with_capacity(details.len());

    for (position, detail) in details.into_iter().enumerate() {
        match extract_detail(detail, answer_type) {
            Ok(question) => {
                debug!("  ✓ {}", truncate_text(&question.title, 40));
                questions.push(question);
            }
            Err(reason) => warn!(
                "⚠️ '{}' 第 {} 题解析失败: {}，已跳过",
                heading_text,
                position + 1,
                reason
            ),
        }
    }

    questions
}

/// 按词表优先级判定题型
pub fn classify(heading: &str) -> Option<AnswerType> {
    TYPE_PRIORITY
        .entries()
        .find(|(keyword, _)| heading.contains(**keyword))
        .map(|(_, answer_type)| *answer_type)
}

/// 解析单个题目详情
pub fn extract_detail(detail: ElementRef<'_>, answer_type: AnswerType) -> Result<Question, DetailSkip> {
    let title_tag = detail.find(TITLE_SELECTOR).ok_or(DetailSkip::MissingTitle)?;
    let title = normalize_title(&title_tag.raw_text());
    if title.is_empty() {
        return Err(DetailSkip::EmptyTitle);
    }

    let body = match answer_type {
        AnswerType::SingleChoice => QuestionBody::SingleChoice(choice_fields(detail)),
        AnswerType::MultiChoice => QuestionBody::MultiChoice(choice_fields(detail)),
        AnswerType::FillBlank => QuestionBody::FillBlank {
            correct_answer: fill_blank_answers(detail),
        },
        AnswerType::TrueFalse => QuestionBody::TrueFalse {
            correct_answer: text_answer(detail),
        },
        AnswerType::MindMap => QuestionBody::MindMap,
        AnswerType::TermDefinition => QuestionBody::TermDefinition {
            correct_answer: text_answer(detail),
        },
        AnswerType::ShortAnswer => QuestionBody::ShortAnswer {
            correct_answer: text_answer(detail),
        },
        AnswerType::Other => QuestionBody::Other {
            correct_answer: text_answer(detail),
        },
    };

    Ok(Question::new(title, body))
}

/// 规范化题干：去除不可见字符，全角括号换成半角，去掉首尾空白
pub fn normalize_title(title: &str) -> String {
    let visible: String = title
        .chars()
        .filter(|c| !INVISIBLE_CHARS.contains(c))
        .map(|c| match c {
            '（' => '(',
            '）' => ')',
            other => other,
        })
        .collect();
    visible.trim().to_string()
}

/// 规范化选项：按行拆分，丢弃空行，每项以一个换行结尾
pub fn normalize_answers(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("{}\n", line))
        .collect()
}

fn choice_fields(detail: ElementRef<'_>) -> ChoiceAnswer {
    let options = detail
        .find(OPTIONS_SELECTOR)
        .map(|ul| normalize_answers(&option_text(ul)))
        .unwrap_or_default();

    let correct_answer = detail
        .find(ANSWER_AREA_SELECTOR)
        .and_then(|area| area.find(RIGHT_ANSWER_SELECTOR))
        .map(|span| span.trimmed_text())
        .unwrap_or_default();

    ChoiceAnswer {
        options,
        correct_answer,
    }
}

/// 选项列表的原始文本，每个 `li` 至少占一行
fn option_text(list: ElementRef<'_>) -> String {
    let items = list.find_all("li");
    if items.is_empty() {
        list.raw_text()
    } else {
        items
            .iter()
            .map(|li| li.raw_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn fill_blank_answers(detail: ElementRef<'_>) -> Vec<String> {
    detail
        .find_all(FILL_ANSWER_SELECTOR)
        .iter()
        .map(|dd| dd.trimmed_text())
        .collect()
}

/// 文本类答案：优先取公布的正确答案，没有时退回作答者自己的答案
fn text_answer(detail: ElementRef<'_>) -> String {
    let published = detail
        .find(ANSWER_AREA_SELECTOR)
        .and_then(|area| area.find(TEXT_RIGHT_ANSWER_SELECTOR))
        .map(|el| el.trimmed_text())
        .filter(|text| !text.is_empty());

    if let Some(answer) = published {
        return answer;
    }

    let own = detail
        .find(OWN_ANSWER_SELECTOR)
        .map(|el| el.trimmed_text())
        .unwrap_or_default();
    if !own.is_empty() {
        debug!("未公布正确答案，使用作答者答案");
    }
    own
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_block(html: &str) -> Vec<Question> {
        let index = MarkupIndex::parse(html);
        let block = index.select_first(BLOCK_SELECTOR).unwrap();
        extract_block(block)
    }

    const SINGLE_CHOICE_BLOCK: &str = r#"
        <div class="mark_item">
          <h2 class="type_tit">一. 单选题（共1题，100分）</h2>
          <div class="questionLi" aria-label="题目详情">
            <h3 class="mark_name colorDeep">1. <span class="colorShallow">(单选题)</span> 下列哪个是质数（\u{200e}）</h3>
            <ul class="mark_letter colorDeep qtDetail">
              <li>A. 4</li>
              <li>B. 6</li>
              <li>C. 7</li>
              <li>D. 9</li>
            </ul>
            <div class="mark_answer">
              <div class="mark_key clearfix">
                <span class="colorDeep">我的答案: C</span>
                <span class="colorGreen">正确答案: <span class="rightAnswerContent workTextWrap"> C </span></span>
              </div>
            </div>
          </div>
        </div>
    "#;

    #[test]
    fn test_single_choice_block() {
        let html = SINGLE_CHOICE_BLOCK.replace("\\u{200e}", "\u{200e}");
        let questions = first_block(&html);
        assert_eq!(questions.len(), 1);

        let question = &questions[0];
        assert_eq!(question.answer_type(), AnswerType::SingleChoice);
        assert_eq!(question.title, "1. (单选题) 下列哪个是质数()");
        match &question.body {
            QuestionBody::SingleChoice(choice) => {
                assert_eq!(choice.options, vec!["A. 4\n", "B. 6\n", "C. 7\n", "D. 9\n"]);
                assert_eq!(choice.correct_answer, "C");
            }
            other => panic!("unexpected body: {:?}", other),
        }
        assert!(question.ai_answer.is_none());
    }

    #[test]
    fn test_unknown_block_type_is_dropped() {
        let html = r#"
            <div class="mark_item">
              <h2 class="type_tit">三. 连线题</h2>
              <div aria-label="题目详情"><h3 class="mark_name">1. 连线</h3></div>
            </div>
        "#;
        assert!(first_block(html).is_empty());
    }

    #[test]
    fn test_block_without_heading_is_dropped() {
        let html = r#"<div class="mark_item"><div aria-label="题目详情"><h3 class="mark_name">1</h3></div></div>"#;
        assert!(first_block(html).is_empty());
    }

    #[test]
    fn test_malformed_detail_skips_only_that_question() {
        let html = r#"
            <div class="mark_item">
              <h2 class="type_tit">二. 判断题</h2>
              <div aria-label="题目详情">
                <h3 class="mark_name colorDeep">1. 地球是圆的</h3>
                <div class="mark_answer"><span class="rightAnswerContent">对</span></div>
              </div>
              <div aria-label="题目详情"><p>题干丢失</p></div>
              <div aria-label="题目详情">
                <h3 class="mark_name colorDeep">3. 太阳绕地球转</h3>
                <div class="mark_answer"><span class="stuAnswerContent">错</span></div>
                <span class="stuAnswerContent">错</span>
              </div>
            </div>
        "#;
        let questions = first_block(html);
        assert_eq!(questions.len(), 2);
        assert_eq!(
            questions[0].body,
            QuestionBody::TrueFalse {
                correct_answer: "对".to_string()
            }
        );
        // 未公布答案时退回作答者答案
        assert_eq!(questions[1].title, "3. 太阳绕地球转");
        assert_eq!(questions[1].body.correct_answer_text(), "错");
    }

    #[test]
    fn test_fill_blank_answers_in_order() {
        let html = r#"
            <div class="mark_item">
              <h2 class="type_tit">填空题</h2>
              <div aria-label="题目详情">
                <h3 class="mark_name">1. 中国的首都是____，最大的城市是____</h3>
                <dl class="mark_fill colorDeep"><dt>我的答案</dt><dd>北京</dd><dd>重庆</dd></dl>
                <dl class="mark_fill colorGreen"><dt>正确答案</dt><dd> 北京 </dd><dd>上海</dd></dl>
              </div>
              <div aria-label="题目详情"><h3 class="mark_name">2. 没有公布答案</h3></div>
            </div>
        "#;
        let questions = first_block(html);
        assert_eq!(questions.len(), 2);
        assert_eq!(
            questions[0].body,
            QuestionBody::FillBlank {
                correct_answer: vec!["北京".to_string(), "上海".to_string()]
            }
        );
        assert_eq!(
            questions[1].body,
            QuestionBody::FillBlank {
                correct_answer: Vec::new()
            }
        );
    }

    #[test]
    fn test_choice_with_missing_fields_is_blank_not_dropped() {
        let html = r#"
            <div class="mark_item">
              <h2 class="type_tit">多选题</h2>
              <div aria-label="题目详情"><h3 class="mark_name">1. 选出所有偶数</h3></div>
            </div>
        "#;
        let questions = first_block(html);
        assert_eq!(questions.len(), 1);
        assert_eq!(
            questions[0].body,
            QuestionBody::MultiChoice(ChoiceAnswer::default())
        );
    }

    #[test]
    fn test_classify_priority() {
        assert_eq!(classify("一. 单选题（共10题）"), Some(AnswerType::SingleChoice));
        assert_eq!(classify("多选题"), Some(AnswerType::MultiChoice));
        assert_eq!(classify("四. 思维导图"), Some(AnswerType::MindMap));
        assert_eq!(classify("五. 名词解释"), Some(AnswerType::TermDefinition));
        assert_eq!(classify("六. 简答题"), Some(AnswerType::ShortAnswer));
        assert_eq!(classify("七. 其他"), Some(AnswerType::Other));
        // 同时包含多个题型词时按词表顺序取第一个
        assert_eq!(classify("判断题与单选题"), Some(AnswerType::SingleChoice));
        assert_eq!(classify("论述题"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_normalize_title_is_idempotent() {
        let samples = [
            "  1. 下列说法（  ）正确\u{200e} ",
            "\u{200e} 题目",
            "\u{a0}\u{a0}（多选题）\u{200c}\u{200d}\u{200f}内容",
            "\u{feff}\u{200b}",
            "plain",
            "",
            "   ",
        ];
        for sample in samples {
            let once = normalize_title(sample);
            assert_eq!(normalize_title(&once), once, "sample: {:?}", sample);
            assert!(!once.contains('（') && !once.contains('）'));
            assert!(!once.chars().any(|c| INVISIBLE_CHARS.contains(&c)));
        }
        assert_eq!(normalize_title("\u{200e} 题目"), "题目");
        assert_eq!(normalize_title("  1. 下列说法（  ）正确\u{200e} "), "1. 下列说法(  )正确");
    }

    #[test]
    fn test_normalize_answers_terminators() {
        let samples = [
            "A. 甲\nB. 乙\n\n  \nC. 丙",
            "\n\n",
            "A.\r\n  第一项  \r\nB. 第二项",
            "",
        ];
        for sample in samples {
            for option in normalize_answers(sample) {
                assert!(option.ends_with('\n'));
                assert!(!option[..option.len() - 1].ends_with('\n'));
                assert!(!option.trim().is_empty());
            }
        }
        assert_eq!(
            normalize_answers("A. 甲\nB. 乙\n\n  \nC. 丙"),
            vec!["A. 甲\n", "B. 乙\n", "C. 丙\n"]
        );
        assert!(normalize_answers("\n \n").is_empty());
    }

    #[test]
    fn test_extract_page_keeps_discovery_order() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            r#"<div class="mark_item"><h2 class="type_tit">简答题</h2>
                 <div aria-label="题目详情"><h3 class="mark_name">1. 简述</h3>
                 <div class="mark_answer"><div class="rightAnswerContent">要点</div></div></div></div>"#,
            r#"<div class="mark_item"><h2 class="type_tit">名词解释</h2>
                 <div aria-label="题目详情"><h3 class="mark_name">2. 解释</h3></div></div>"#
        );
        let questions = extract_page(&html);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].answer_type(), AnswerType::ShortAnswer);
        assert_eq!(questions[0].body.correct_answer_text(), "要点");
        assert_eq!(questions[1].answer_type(), AnswerType::TermDefinition);
        assert_eq!(questions[1].body.correct_answer_text(), "");
    }
}
