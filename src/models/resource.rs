use phf::phf_set;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 列表中代表文件夹的类型标记
pub const FOLDER_TAG: &str = "afolder";

/// 可以取得预览图的文件类型
static SUPPORTED_FILE_TAGS: phf::Set<&'static str> = phf_set! {
    "pdf", "ppt", "pptx", "doc", "docx",
};

/// 页码（从 1 开始）→ 图片 URL，按页码有序
pub type PageImageMap = BTreeMap<u32, String>;

/// 资源节点的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Folder,
    SupportedFile,
    Unsupported,
}

/// 课程资料中的一个条目（文件夹或文件）
///
/// 只在当前目录列表中存在，不在内存中构建整棵树；
/// 进入子目录时用 `opaque_id` 重新查询。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub display_name: String,
    pub type_tag: String,
    pub opaque_id: String,
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        let tag = self.type_tag.trim().to_ascii_lowercase();
        if tag == FOLDER_TAG {
            ResourceKind::Folder
        } else if SUPPORTED_FILE_TAGS.contains(tag.as_str()) {
            ResourceKind::SupportedFile
        } else {
            ResourceKind::Unsupported
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind() == ResourceKind::Folder
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            ResourceKind::Folder => write!(f, "📁 {}", self.display_name),
            _ => write!(f, "📄 {} [{}]", self.display_name, self.type_tag),
        }
    }
}

/// 一份已解析出页面图片的文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewDocument {
    pub name: String,
    pub pages: PageImageMap,
}
