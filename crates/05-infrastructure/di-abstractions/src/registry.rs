//! 组件定义注册表抽象接口

use crate::definition::ComponentDefinition;
use infrastructure_common::DependencyError;

/// 组件定义注册表 trait
///
/// 按注册顺序保存组件名称到组件定义的映射，只在注册表后置处理阶段被修改。
pub trait DefinitionRegistry {
    /// 注册组件定义
    fn register_definition(
        &mut self,
        name: &str,
        definition: ComponentDefinition,
    ) -> Result<(), DependencyError>;

    /// 移除组件定义
    fn remove_definition(&mut self, name: &str) -> Result<ComponentDefinition, DependencyError>;

    /// 获取原始组件定义
    fn get_definition(&self, name: &str) -> Option<&ComponentDefinition>;

    /// 获取可修改的原始组件定义
    ///
    /// 直接修改不会重置已缓存的合并定义，需要由后续的元数据缓存清理生效。
    fn get_definition_mut(&mut self, name: &str) -> Option<&mut ComponentDefinition>;

    /// 检查是否包含组件定义
    fn contains_definition(&self, name: &str) -> bool;

    /// 按注册顺序获取所有组件定义名称
    fn definition_names(&self) -> Vec<String>;

    /// 组件定义数量
    fn definition_count(&self) -> usize;
}
