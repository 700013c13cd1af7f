//! 资料目录导航 - 业务能力层
//!
//! 逐层列出课程资料，由操作者选择：
//! - 单选文件夹时进入该文件夹（用它的 id 重新查询，不在内存中建树）
//! - 选中一个或多个受支持的文件时，依次走"阅读计数 → 预览"两步，得到页码 → 图片 URL
//!
//! 任何一次阅读计数或预览失败都会立即中止，不继续处理剩余文件。

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppResult, ResourceError, SelectionError};
use crate::infrastructure::{fetch_json, MarkupIndex, MarkupNode, PageFetcher};
use crate::models::{Course, PageImageMap, PreviewDocument, Resource, ResourceKind};
use crate::services::selection::{OperatorConsole, Selection};

/// 资料根目录的 scope
pub const ROOT_SCOPE: &str = "0";

const ENTRY_SELECTOR: &str = "div.dataBody_td";

/// 阅读计数接口的响应
#[derive(Debug, Deserialize)]
struct ReadCountReply {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    msg: Option<String>,
}

/// 预览接口的响应
#[derive(Debug, Deserialize)]
struct PreviewReply {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

/// 资料目录导航器
pub struct ResourceNavigator {
    fetcher: Arc<dyn PageFetcher>,
    list_url: String,
    read_count_url: String,
    preview_url: String,
}

impl ResourceNavigator {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &Config) -> Self {
        Self {
            fetcher,
            list_url: config.resource_list_url.clone(),
            read_count_url: config.resource_read_count_url.clone(),
            preview_url: config.resource_preview_url.clone(),
        }
    }

    /// 列出某个目录下的条目
    pub async fn list(&self, course: &Course, scope: &str) -> AppResult<Vec<Resource>> {
        let query = [
            ("courseid", course.course_id.clone()),
            ("clazzid", course.class_id.clone()),
            ("cpi", course.cpi.clone()),
            ("ut", "s".to_string()),
            ("dataId", scope.to_string()),
        ];
        let html = self.fetcher.fetch(&self.list_url, &query).await?;
        let entries = parse_resource_listing(&html);
        debug!("目录 {} 下有 {} 个条目", scope, entries.len());
        Ok(entries)
    }

    /// 交互式导航，返回所选文件的页面图片
    ///
    /// 输入源关闭时返回 `SelectionError::Aborted`。
    pub async fn navigate(
        &self,
        course: &Course,
        console: &mut dyn OperatorConsole,
    ) -> AppResult<Vec<PreviewDocument>> {
        // 从根目录到当前目录的 scope 栈
        let mut scopes = vec![ROOT_SCOPE.to_string()];

        loop {
            let scope = scopes.last().map(String::as_str).unwrap_or(ROOT_SCOPE);
            let entries = self.list(course, scope).await?;

            if entries.is_empty() {
                if scopes.len() == 1 {
                    console.report("课程资料为空");
                    return Ok(Vec::new());
                }
                console.report("该文件夹为空，返回上一级");
                scopes.pop();
                continue;
            }

            let lines: Vec<String> = entries.iter().map(ToString::to_string).collect();
            console.show_listing(&lines);
            let picked = read_valid_selection(console, &entries)?;

            if let [only] = picked.as_slice() {
                if only.is_folder() {
                    info!("📁 进入文件夹: {}", only.display_name);
                    scopes.push(only.opaque_id.clone());
                    continue;
                }
            }

            let mut documents = Vec::with_capacity(picked.len());
            for resource in picked {
                documents.push(self.resolve_file(course, &resource).await?);
            }
            return Ok(documents);
        }
    }

    /// 对一个文件执行"阅读计数 → 预览"，得到页码 → 图片 URL
    pub async fn resolve_file(
        &self,
        course: &Course,
        resource: &Resource,
    ) -> AppResult<PreviewDocument> {
        let query = [
            ("dataId", resource.opaque_id.clone()),
            ("courseid", course.course_id.clone()),
            ("clazzid", course.class_id.clone()),
            ("cpi", course.cpi.clone()),
        ];

        let reply: ReadCountReply =
            fetch_json(self.fetcher.as_ref(), &self.read_count_url, &query).await?;
        if !reply.status {
            return Err(ResourceError::ReadCountRejected {
                name: resource.display_name.clone(),
                message: reply.msg.unwrap_or_default(),
            }
            .into());
        }

        let reply: PreviewReply =
            fetch_json(self.fetcher.as_ref(), &self.preview_url, &query).await?;
        if !reply.status {
            return Err(ResourceError::PreviewRejected {
                name: resource.display_name.clone(),
                message: reply.msg.unwrap_or_default(),
            }
            .into());
        }

        let pages = parse_preview_pages(reply.html.as_deref().unwrap_or_default());
        if pages.is_empty() {
            warn!("⚠️ {} 的预览中没有任何页面", resource.display_name);
        } else {
            info!("📄 {}: 共 {} 页", resource.display_name, pages.len());
        }

        Ok(PreviewDocument {
            name: resource.display_name.clone(),
            pages,
        })
    }
}

/// 反复读取直到得到一个合法的选择
///
/// 返回被选中的条目：要么是单个文件夹，要么是一个或多个受支持的文件。
fn read_valid_selection(
    console: &mut dyn OperatorConsole,
    entries: &[Resource],
) -> AppResult<Vec<Resource>> {
    let prompt = format!("请选择 (1-{}，支持 2 / 1-3 / 1,3,5): ", entries.len());

    loop {
        let Some(line) = console.read_selection(&prompt) else {
            return Err(SelectionError::Aborted.into());
        };

        match resolve_selection(&line, entries) {
            Ok(picked) => return Ok(picked),
            Err(e) => {
                warn!("⚠️ 选择无效: {}", e);
                console.report(&e.to_string());
            }
        }
    }
}

/// 把一行输入解析为被选中的条目
pub fn resolve_selection(line: &str, entries: &[Resource]) -> Result<Vec<Resource>, SelectionError> {
    let selection = Selection::parse(line)?;
    selection.check_bounds(entries.len())?;

    let indices = selection.indices();
    if selection.is_multi() {
        if let Some(&index) = indices.iter().find(|&&i| entries[i - 1].is_folder()) {
            return Err(SelectionError::FolderInMultiSelect {
                index,
                name: entries[index - 1].display_name.clone(),
            });
        }
    } else if entries[indices[0] - 1].is_folder() {
        return Ok(vec![entries[indices[0] - 1].clone()]);
    }

    let mut files = Vec::with_capacity(indices.len());
    for index in indices {
        let entry = &entries[index - 1];
        match entry.kind() {
            ResourceKind::SupportedFile => files.push(entry.clone()),
            _ => warn!(
                "⚠️ 跳过不支持的资源类型: {} [{}]",
                entry.display_name, entry.type_tag
            ),
        }
    }

    if files.is_empty() {
        return Err(SelectionError::NoSupportedFile);
    }
    Ok(files)
}

/// 解析资料目录列表
pub fn parse_resource_listing(html: &str) -> Vec<Resource> {
    let index = MarkupIndex::parse(html);
    let mut entries = Vec::new();

    for (position, node) in index.select_all(ENTRY_SELECTOR).into_iter().enumerate() {
        let opaque_id = node
            .attr_value("id")
            .or_else(|| node.attr_value("data-id"))
            .filter(|id| !id.trim().is_empty());
        let display_name = node
            .find(".name")
            .map(|name| name.trimmed_text())
            .filter(|name| !name.is_empty())
            .or_else(|| node.attr_value("title"))
            .unwrap_or_default();

        let Some(opaque_id) = opaque_id else {
            warn!(
                "⚠️ 第 {} 个资料条目缺少 id，已跳过 (名称: '{}')",
                position + 1,
                display_name
            );
            continue;
        };

        entries.push(Resource {
            display_name,
            type_tag: node.attr_value("type").unwrap_or_default(),
            opaque_id: opaque_id.trim().to_string(),
        });
    }

    entries
}

/// 解析预览 HTML 中的页码与图片 URL
pub fn parse_preview_pages(html: &str) -> PageImageMap {
    let index = MarkupIndex::parse_fragment(html);
    let mut pages = PageImageMap::new();

    for (position, item) in index.select_all("li").into_iter().enumerate() {
        let page = item
            .attr_value("page")
            .or_else(|| item.attr_value("data-page"))
            .and_then(|p| p.trim().parse::<u32>().ok());
        let url = item.find("img").and_then(|img| {
            ["src", "data-original", "data-src"]
                .iter()
                .filter_map(|attr| img.attr_value(attr))
                .find(|url| !url.trim().is_empty())
        });

        match (page, url) {
            (Some(page), Some(url)) => {
                pages.insert(page, url.trim().to_string());
            }
            (page, url) => warn!(
                "⚠️ 第 {} 个预览条目缺少页码或图片，已跳过 (页码: {:?}, 图片: {:?})",
                position + 1,
                page,
                url
            ),
        }
    }

    pages
}
