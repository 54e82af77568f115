//! 排序策略
//!
//! 默认策略：优先排序层级在前，其余按排序值升序，排序值越小优先级越高。

use crate::extension::{Extension, OrderTier};
use std::cmp::Ordering;

/// 最高优先级
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// 最低优先级
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// 扩展比较器 trait
pub trait OrderComparator: Send + Sync {
    /// 比较两个扩展的先后顺序
    fn compare(&self, a: &Extension, b: &Extension) -> Ordering;
}

/// 默认的排序元数据比较器
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOrderComparator;

impl OrderComparator for DefaultOrderComparator {
    fn compare(&self, a: &Extension, b: &Extension) -> Ordering {
        let a_priority = a.tier() == OrderTier::Priority;
        let b_priority = b.tier() == OrderTier::Priority;
        match (a_priority, b_priority) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => a.effective_order().cmp(&b.effective_order()),
        }
    }
}
