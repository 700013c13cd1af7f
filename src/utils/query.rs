//! 查询字符串解析
//!
//! 平台把大部分标识符（courseid、workId、enc…）藏在链接的查询字符串里，
//! 链接可能是绝对地址、相对地址，甚至只有 `?a=b` 部分。

use std::collections::HashMap;

/// 解析链接中的查询参数，同名参数只保留第一次出现的值
pub fn parse_query(link: &str) -> HashMap<String, String> {
    let query = match link.split_once('?') {
        Some((_, rest)) => rest,
        None if link.contains('=') => link,
        None => return HashMap::new(),
    };
    let query = query.split('#').next().unwrap_or_default();

    let mut params = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}

/// 取查询参数，缺失时返回空字符串
pub fn param(params: &HashMap<String, String>, key: &str) -> String {
    params.get(key).cloned().unwrap_or_default()
}
