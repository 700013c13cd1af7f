//! 标记索引 - 基础设施层
//!
//! 把原始 HTML 包装成可按标签 / 属性 / 文本查询的树。
//! 选择器写错或元素缺失都只会得到空结果，由调用方决定如何降级。

use scraper::{ElementRef, Html, Selector};
use tracing::error;

/// 可查询的 HTML 文档
pub struct MarkupIndex {
    document: Html,
}

impl MarkupIndex {
    /// 解析完整页面
    pub fn parse(raw: &str) -> Self {
        Self {
            document: Html::parse_document(raw),
        }
    }

    /// 解析 HTML 片段（例如 JSON 中内嵌的预览列表）
    pub fn parse_fragment(raw: &str) -> Self {
        Self {
            document: Html::parse_fragment(raw),
        }
    }

    /// 文档根元素
    pub fn root(&self) -> ElementRef<'_> {
        self.document.root_element()
    }

    /// 选出所有匹配元素（文档顺序）
    pub fn select_all(&self, css: &str) -> Vec<ElementRef<'_>> {
        match selector(css) {
            Some(sel) => self.document.select(&sel).collect(),
            None => Vec::new(),
        }
    }

    /// 选出第一个匹配元素
    pub fn select_first(&self, css: &str) -> Option<ElementRef<'_>> {
        let sel = selector(css)?;
        self.document.select(&sel).next()
    }
}

/// 元素上的查询能力
pub trait MarkupNode<'a> {
    /// 后代中第一个匹配元素
    fn find(&self, css: &str) -> Option<ElementRef<'a>>;
    /// 后代中所有匹配元素
    fn find_all(&self, css: &str) -> Vec<ElementRef<'a>>;
    /// 拼接后的全部文本（不做任何裁剪）
    fn raw_text(&self) -> String;
    /// 去掉首尾空白的文本
    fn trimmed_text(&self) -> String;
    /// 属性值
    fn attr_value(&self, name: &str) -> Option<String>;
}

impl<'a> MarkupNode<'a> for ElementRef<'a> {
    fn find(&self, css: &str) -> Option<ElementRef<'a>> {
        let sel = selector(css)?;
        self.select(&sel).next()
    }

    fn find_all(&self, css: &str) -> Vec<ElementRef<'a>> {
        match selector(css) {
            Some(sel) => self.select(&sel).collect(),
            None => Vec::new(),
        }
    }

    fn raw_text(&self) -> String {
        self.text().collect()
    }

    fn trimmed_text(&self) -> String {
        self.raw_text().trim().to_string()
    }

    fn attr_value(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }
}

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            error!("无效的选择器 '{}': {:?}", css, e);
            None
        }
    }
}
