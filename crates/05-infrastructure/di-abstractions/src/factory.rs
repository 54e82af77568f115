//! 组件工厂抽象接口
//!
//! 编排层通过这些接口访问外部的组件工厂：按能力查找名称、不实例化的类型匹配、
//! 物化扩展、追加生命周期钩子以及清理派生元数据缓存。

use crate::extension::{Capabilities, ComponentInstance, Extension, RegisteredHook};
use crate::ordering::OrderComparator;
use crate::registry::DefinitionRegistry;
use infrastructure_common::DependencyError;
use std::sync::Arc;

/// 组件提供者 trait
pub trait ComponentProvider {
    /// 按名称获取组件，必要时创建
    fn get_component(&mut self, name: &str) -> Result<ComponentInstance, DependencyError>;

    /// 是否存在指定名称的组件或组件定义
    fn contains_component(&self, name: &str) -> bool;
}

/// 类型匹配标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeMarker {
    /// 属于优先排序层级
    PriorityOrdered,
    /// 参与排序（包括优先排序层级）
    Ordered,
    /// 具备指定能力
    Capability(Capabilities),
}

/// 可配置的组件工厂 trait
pub trait ConfigurableComponentFactory: ComponentProvider {
    /// 按声明的能力查找组件名称，结果保持注册顺序
    ///
    /// - `include_non_singletons`: 是否包含非单例组件
    /// - `allow_eager_init`: 是否允许为了类型判断而提前初始化组件
    fn names_for_capability(
        &self,
        capability: Capabilities,
        include_non_singletons: bool,
        allow_eager_init: bool,
    ) -> Vec<String>;

    /// 在不实例化的情况下检查组件是否匹配指定标记
    fn is_type_match(&self, name: &str, marker: TypeMarker) -> Result<bool, DependencyError>;

    /// 物化指定名称的扩展并校验其具备所需能力
    fn get_extension(
        &mut self,
        name: &str,
        required: Capabilities,
    ) -> Result<Extension, DependencyError> {
        let instance = self.get_component(name)?;
        let actual = instance.capabilities();
        if !actual.contains(required) {
            return Err(DependencyError::TypeMismatch {
                name: name.to_string(),
                expected: format!("{required:?}"),
                actual: format!("{actual:?}"),
            });
        }
        Ok(Extension::new(name, instance))
    }

    /// 追加生命周期钩子；同名钩子已存在时移动到链尾
    fn add_lifecycle_hook(&mut self, hook: RegisteredHook);

    /// 当前钩子数量
    fn lifecycle_hook_count(&self) -> usize;

    /// 按链中顺序获取钩子名称
    fn lifecycle_hook_names(&self) -> Vec<String>;

    /// 清理派生的组件定义元数据缓存
    fn clear_metadata_cache(&mut self);

    /// 工厂提供的依赖感知比较器
    fn dependency_comparator(&self) -> Option<Arc<dyn OrderComparator>>;

    /// 以注册表视图访问工厂，工厂不支持修改注册表时返回 `None`
    fn as_registry_mut(&mut self) -> Option<&mut dyn DefinitionRegistry>;

    /// 注册一个已创建好的单例
    fn register_singleton(
        &mut self,
        name: &str,
        instance: ComponentInstance,
    ) -> Result<(), DependencyError>;
}
