//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义容器启动期扩展编排所依赖的协作者接口。
//!
//! ## 核心接口
//!
//! - [`DefinitionRegistry`] - 组件定义注册表接口
//! - [`ConfigurableComponentFactory`] - 组件工厂接口
//! - [`RegistryPostProcessor`] / [`FactoryPostProcessor`] - 启动期后置处理器
//! - [`LifecycleHook`] / [`MergedDefinitionHook`] - 组件生命周期钩子
//! - [`OrderComparator`] - 扩展排序策略

pub mod definition;
pub mod extension;
pub mod factory;
pub mod ordering;
pub mod registry;

pub use definition::*;
pub use extension::*;
pub use factory::*;
pub use ordering::*;
pub use registry::*;
