//! 扩展排序解析器

use di_abstractions::{ConfigurableComponentFactory, DefaultOrderComparator, Extension, OrderComparator};
use std::fmt;
use std::sync::Arc;

/// 扩展排序解析器
///
/// 工厂提供了依赖感知比较器时使用工厂的比较器，否则使用注入的默认比较器。
/// 排序是稳定的，排序键相同的扩展保持原有顺序。
#[derive(Clone)]
pub struct OrderingResolver {
    default_comparator: Arc<dyn OrderComparator>,
}

impl OrderingResolver {
    /// 使用指定的默认比较器创建解析器
    pub fn new(default_comparator: Arc<dyn OrderComparator>) -> Self {
        Self { default_comparator }
    }

    /// 对扩展原地排序
    pub fn sort(&self, extensions: &mut [Extension], factory: &dyn ConfigurableComponentFactory) {
        if extensions.len() <= 1 {
            return;
        }
        let comparator = factory
            .dependency_comparator()
            .unwrap_or_else(|| Arc::clone(&self.default_comparator));
        extensions.sort_by(|a, b| comparator.compare(a, b));
    }
}

impl Default for OrderingResolver {
    fn default() -> Self {
        Self::new(Arc::new(DefaultOrderComparator))
    }
}

impl fmt::Debug for OrderingResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderingResolver").finish_non_exhaustive()
    }
}
