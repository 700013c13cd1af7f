//! 选择表达式与操作者交互
//!
//! 每一层目录接受三种写法之一：
//! - 单个序号 `2`
//! - 闭区间 `1-3`
//! - 逗号列表 `1,3,5`
//!
//! 序号从 1 开始，与列表显示顺序一致；`-` 与 `,` 不能混用。

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::error::SelectionError;

/// 解析后的选择
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Single(usize),
    Range { start: usize, end: usize },
    List(Vec<usize>),
}

impl Selection {
    /// 解析操作者输入
    pub fn parse(input: &str) -> Result<Self, SelectionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SelectionError::Empty);
        }

        let has_dash = input.contains('-');
        let has_comma = input.contains(',');

        match (has_dash, has_comma) {
            (true, true) => Err(SelectionError::MixedForms(input.to_string())),
            (true, false) => {
                let (start, end) = input
                    .split_once('-')
                    .ok_or_else(|| SelectionError::Malformed(input.to_string()))?;
                let start = parse_index(start, input)?;
                let end = parse_index(end, input)?;
                if start > end {
                    return Err(SelectionError::InvalidRange { start, end });
                }
                Ok(Selection::Range { start, end })
            }
            (false, true) => {
                let mut indices = Vec::new();
                for part in input.split(',') {
                    let index = parse_index(part, input)?;
                    if !indices.contains(&index) {
                        indices.push(index);
                    }
                }
                Ok(Selection::List(indices))
            }
            (false, false) => Ok(Selection::Single(parse_index(input, input)?)),
        }
    }

    /// 展开为序号列表（从 1 开始，保持输入顺序）
    pub fn indices(&self) -> Vec<usize> {
        match self {
            Selection::Single(index) => vec![*index],
            Selection::Range { start, end } => (*start..=*end).collect(),
            Selection::List(indices) => indices.clone(),
        }
    }

    /// 区间与列表都视为多选
    pub fn is_multi(&self) -> bool {
        !matches!(self, Selection::Single(_))
    }

    /// 检查所有序号都落在 `[1, len]` 内
    ///
    /// 区间只比较右端点，不展开。
    pub fn check_bounds(&self, len: usize) -> Result<(), SelectionError> {
        let beyond = match self {
            Selection::Single(index) => Some(*index).filter(|index| *index > len),
            Selection::Range { end, .. } => Some(*end).filter(|end| *end > len),
            Selection::List(indices) => indices.iter().copied().find(|index| *index > len),
        };
        match beyond {
            Some(index) => Err(SelectionError::IndexOutOfRange { index, max: len }),
            None => Ok(()),
        }
    }
}

fn parse_index(part: &str, input: &str) -> Result<usize, SelectionError> {
    let part = part.trim();
    // 序号从 1 开始，0 与非数字一样视为无法解析
    match part.parse::<usize>() {
        Ok(index) if index > 0 => Ok(index),
        _ => Err(SelectionError::Malformed(input.to_string())),
    }
}

/// 与操作者交互的同步边界
///
/// 导航器只通过它展示列表、读取选择、报告问题，测试时可以换成脚本输入。
pub trait OperatorConsole: Send {
    /// 展示一份带序号的列表（课程或当前目录）
    fn show_listing(&mut self, lines: &[String]);
    /// 读取一行选择，输入结束时返回 None
    fn read_selection(&mut self, prompt: &str) -> Option<String>;
    /// 向操作者报告问题
    fn report(&mut self, message: &str);
}

/// 标准输入 / 输出终端
pub struct StdConsole;

impl OperatorConsole for StdConsole {
    fn show_listing(&mut self, lines: &[String]) {
        println!();
        for (i, line) in lines.iter().enumerate() {
            println!("{:>3}. {}", i + 1, line);
        }
    }

    fn read_selection(&mut self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        std::io::stdout().flush().ok()?;

        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }

    fn report(&mut self, message: &str) {
        println!("❌ {}", message);
    }
}

/// 预先写好输入的终端
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    inputs: VecDeque<String>,
    /// 每次展示的列表
    pub listings: Vec<Vec<String>>,
    /// 报告过的问题
    pub reports: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            listings: Vec::new(),
            reports: Vec::new(),
        }
    }
}

impl OperatorConsole for ScriptedConsole {
    fn show_listing(&mut self, lines: &[String]) {
        self.listings.push(lines.to_vec());
    }

    fn read_selection(&mut self, _prompt: &str) -> Option<String> {
        self.inputs.pop_front()
    }

    fn report(&mut self, message: &str) {
        self.reports.push(message.to_string());
    }
}
