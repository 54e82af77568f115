//! 扩展点抽象
//!
//! 容器启动期间参与编排的扩展分为三类能力：
//!
//! - 改写组件定义注册表（[`RegistryPostProcessor`]）
//! - 对定型后的组件工厂做后置处理（[`FactoryPostProcessor`]）
//! - 拦截每个组件的构造与初始化（[`LifecycleHook`] / [`MergedDefinitionHook`]）
//!
//! 每个实例在物化时被一次性归类为 [`Capabilities`] 标志集合，编排逻辑只根据标志分派，
//! 不做运行时类型探测。

use crate::definition::ComponentDefinition;
use crate::factory::ConfigurableComponentFactory;
use crate::ordering::LOWEST_PRECEDENCE;
use crate::registry::DefinitionRegistry;
use bitflags::bitflags;
use chrono::{DateTime, Utc};
use infrastructure_common::{DependencyError, Role, TypeInfo};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

bitflags! {
    /// 组件在容器启动过程中具备的扩展能力
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// 可以增删改组件定义
        const REGISTRY_POST_PROCESSOR = 1;
        /// 可以对定型后的组件工厂做后置处理
        const FACTORY_POST_PROCESSOR = 1 << 1;
        /// 可以拦截组件的构造与初始化
        const LIFECYCLE_HOOK = 1 << 2;
        /// 可以处理合并后的组件定义
        const MERGED_DEFINITION_HOOK = 1 << 3;
        /// 接收容器事件
        const APPLICATION_LISTENER = 1 << 4;
    }
}

impl Capabilities {
    /// 注册表后置处理器的完整能力（同时具备工厂后置处理能力）
    pub const fn registry_post_processor() -> Self {
        Self::REGISTRY_POST_PROCESSOR.union(Self::FACTORY_POST_PROCESSOR)
    }

    /// 合并定义钩子的完整能力（同时是生命周期钩子）
    pub const fn merged_definition_hook() -> Self {
        Self::MERGED_DEFINITION_HOOK.union(Self::LIFECYCLE_HOOK)
    }

    /// 补全隐含的能力：注册表后置处理器同时是工厂后置处理器，合并定义钩子同时是生命周期钩子
    pub const fn normalized(self) -> Self {
        let mut capabilities = self;
        if self.contains(Self::REGISTRY_POST_PROCESSOR) {
            capabilities = capabilities.union(Self::FACTORY_POST_PROCESSOR);
        }
        if self.contains(Self::MERGED_DEFINITION_HOOK) {
            capabilities = capabilities.union(Self::LIFECYCLE_HOOK);
        }
        capabilities
    }
}

/// 排序层级
///
/// 跨层级时 `Priority` 总是先于 `Ordered`，`Ordered` 总是先于 `Unordered`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum OrderTier {
    /// 优先排序
    Priority,
    /// 普通排序
    Ordered,
    /// 不参与排序
    #[default]
    Unordered,
}

/// 工厂后置处理器
///
/// 在所有组件定义加载完成后、任何组件实例化之前调用。
pub trait FactoryPostProcessor: Send + Sync {
    /// 处理定型后的组件工厂
    fn post_process_factory(
        &self,
        factory: &mut dyn ConfigurableComponentFactory,
    ) -> Result<(), DependencyError>;
}

/// 注册表后置处理器
///
/// 可以继续注册新的组件定义，包括新的注册表后置处理器。
pub trait RegistryPostProcessor: FactoryPostProcessor {
    /// 改写组件定义注册表
    fn post_process_registry(
        &self,
        registry: &mut dyn DefinitionRegistry,
    ) -> Result<(), DependencyError>;
}

/// 生命周期钩子
///
/// 默认实现原样返回组件，钩子可以返回包装后的新实例。
pub trait LifecycleHook: Send + Sync {
    /// 初始化之前调用
    fn before_initialization(
        &self,
        component: ComponentInstance,
        _name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<ComponentInstance, DependencyError> {
        Ok(component)
    }

    /// 初始化之后调用
    fn after_initialization(
        &self,
        component: ComponentInstance,
        _name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<ComponentInstance, DependencyError> {
        Ok(component)
    }

    /// 单例销毁之前调用
    fn before_destruction(&self, _component: &ComponentInstance, _name: &str) {}
}

/// 合并定义钩子
pub trait MergedDefinitionHook: LifecycleHook {
    /// 处理组件的合并定义，每个合并定义只处理一次
    fn post_process_merged_definition(
        &self,
        definition: &mut ComponentDefinition,
        name: &str,
    ) -> Result<(), DependencyError>;

    /// 组件定义被重置时的通知
    fn reset_definition(&self, _name: &str) {}
}

/// 容器事件监听器
pub trait ApplicationListener: Send + Sync {
    /// 处理容器事件
    fn on_event(&self, event: &ContextEvent);
}

/// 容器事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextEvent {
    /// 容器刷新完成
    Refreshed {
        context_id: String,
        timestamp: DateTime<Utc>,
    },
    /// 容器已关闭
    Closed {
        context_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl ContextEvent {
    /// 触发事件的容器ID
    pub fn context_id(&self) -> &str {
        match self {
            Self::Refreshed { context_id, .. } | Self::Closed { context_id, .. } => context_id,
        }
    }
}

/// 钩子调用上下文
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    /// 工厂当前的钩子数量
    pub hook_count: usize,
    /// 正在处理的组件的合并定义，手动注册的单例没有定义
    pub definition: Option<&'a ComponentDefinition>,
}

impl<'a> HookContext<'a> {
    /// 创建新的钩子调用上下文
    pub fn new(hook_count: usize, definition: Option<&'a ComponentDefinition>) -> Self {
        Self {
            hook_count,
            definition,
        }
    }

    /// 组件角色，没有定义时视为应用组件
    pub fn role(&self) -> Role {
        self.definition.map(|d| d.role).unwrap_or_default()
    }
}

/// 物化后的组件实例
///
/// 持有具体对象以及它暴露的各个扩展能力视图。
#[derive(Clone)]
pub struct ComponentInstance {
    object: Arc<dyn Any + Send + Sync>,
    type_info: TypeInfo,
    tier: OrderTier,
    order: Option<i32>,
    registry_post_processor: Option<Arc<dyn RegistryPostProcessor>>,
    factory_post_processor: Option<Arc<dyn FactoryPostProcessor>>,
    lifecycle_hook: Option<Arc<dyn LifecycleHook>>,
    merged_definition_hook: Option<Arc<dyn MergedDefinitionHook>>,
    application_listener: Option<Arc<dyn ApplicationListener>>,
}

impl ComponentInstance {
    /// 包装一个普通组件对象
    pub fn new<T: Send + Sync + 'static>(object: Arc<T>) -> Self {
        Self {
            object,
            type_info: TypeInfo::of::<T>(),
            tier: OrderTier::Unordered,
            order: None,
            registry_post_processor: None,
            factory_post_processor: None,
            lifecycle_hook: None,
            merged_definition_hook: None,
            application_listener: None,
        }
    }

    /// 设置排序元数据
    pub fn with_order(mut self, tier: OrderTier, order: Option<i32>) -> Self {
        self.tier = tier;
        self.order = order;
        self
    }

    /// 暴露注册表后置处理能力（同时暴露工厂后置处理能力）
    pub fn with_registry_post_processor<P>(mut self, processor: Arc<P>) -> Self
    where
        P: RegistryPostProcessor + 'static,
    {
        self.factory_post_processor = Some(processor.clone());
        self.registry_post_processor = Some(processor);
        self
    }

    /// 暴露工厂后置处理能力
    pub fn with_factory_post_processor<P>(mut self, processor: Arc<P>) -> Self
    where
        P: FactoryPostProcessor + 'static,
    {
        self.factory_post_processor = Some(processor);
        self
    }

    /// 暴露生命周期钩子能力
    pub fn with_lifecycle_hook<H>(mut self, hook: Arc<H>) -> Self
    where
        H: LifecycleHook + 'static,
    {
        self.lifecycle_hook = Some(hook);
        self
    }

    /// 暴露合并定义钩子能力（同时暴露生命周期钩子能力）
    pub fn with_merged_definition_hook<H>(mut self, hook: Arc<H>) -> Self
    where
        H: MergedDefinitionHook + 'static,
    {
        self.lifecycle_hook = Some(hook.clone());
        self.merged_definition_hook = Some(hook);
        self
    }

    /// 暴露事件监听能力
    pub fn with_application_listener<L>(mut self, listener: Arc<L>) -> Self
    where
        L: ApplicationListener + 'static,
    {
        self.application_listener = Some(listener);
        self
    }

    /// 根据暴露的能力视图计算能力标志
    pub fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::empty();
        capabilities.set(
            Capabilities::REGISTRY_POST_PROCESSOR,
            self.registry_post_processor.is_some(),
        );
        capabilities.set(
            Capabilities::FACTORY_POST_PROCESSOR,
            self.factory_post_processor.is_some(),
        );
        capabilities.set(Capabilities::LIFECYCLE_HOOK, self.lifecycle_hook.is_some());
        capabilities.set(
            Capabilities::MERGED_DEFINITION_HOOK,
            self.merged_definition_hook.is_some(),
        );
        capabilities.set(
            Capabilities::APPLICATION_LISTENER,
            self.application_listener.is_some(),
        );
        capabilities
    }

    /// 排序层级
    pub fn tier(&self) -> OrderTier {
        self.tier
    }

    /// 显式声明的排序值
    pub fn order(&self) -> Option<i32> {
        self.order
    }

    /// 参与比较的排序值，未排序或未声明时为最低优先级
    pub fn effective_order(&self) -> i32 {
        match self.tier {
            OrderTier::Unordered => LOWEST_PRECEDENCE,
            OrderTier::Priority | OrderTier::Ordered => self.order.unwrap_or(LOWEST_PRECEDENCE),
        }
    }

    /// 具体类型信息
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 具体对象
    pub fn object(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.object
    }

    /// 转换为具体类型
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.object.clone().downcast::<T>().ok()
    }

    /// 是否持有同一个对象
    pub fn same_object(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }

    pub fn registry_post_processor(&self) -> Option<&Arc<dyn RegistryPostProcessor>> {
        self.registry_post_processor.as_ref()
    }

    pub fn factory_post_processor(&self) -> Option<&Arc<dyn FactoryPostProcessor>> {
        self.factory_post_processor.as_ref()
    }

    pub fn lifecycle_hook(&self) -> Option<&Arc<dyn LifecycleHook>> {
        self.lifecycle_hook.as_ref()
    }

    pub fn merged_definition_hook(&self) -> Option<&Arc<dyn MergedDefinitionHook>> {
        self.merged_definition_hook.as_ref()
    }

    pub fn application_listener(&self) -> Option<&Arc<dyn ApplicationListener>> {
        self.application_listener.as_ref()
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("type", &self.type_info.full_name())
            .field("capabilities", &self.capabilities())
            .field("tier", &self.tier)
            .field("order", &self.order)
            .finish()
    }
}

/// 具名扩展实例
#[derive(Clone, Debug)]
pub struct Extension {
    name: String,
    instance: ComponentInstance,
}

impl Extension {
    /// 创建具名扩展
    pub fn new(name: impl Into<String>, instance: ComponentInstance) -> Self {
        Self {
            name: name.into(),
            instance,
        }
    }

    /// 扩展名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 扩展实例
    pub fn instance(&self) -> &ComponentInstance {
        &self.instance
    }

    /// 能力标志
    pub fn capabilities(&self) -> Capabilities {
        self.instance.capabilities()
    }

    /// 排序层级
    pub fn tier(&self) -> OrderTier {
        self.instance.tier()
    }

    /// 参与比较的排序值
    pub fn effective_order(&self) -> i32 {
        self.instance.effective_order()
    }
}

/// 钩子链中的一项
#[derive(Clone)]
pub struct RegisteredHook {
    name: String,
    hook: Arc<dyn LifecycleHook>,
    merged: Option<Arc<dyn MergedDefinitionHook>>,
}

impl RegisteredHook {
    /// 创建普通生命周期钩子项
    pub fn new<H: LifecycleHook + 'static>(name: impl Into<String>, hook: Arc<H>) -> Self {
        Self {
            name: name.into(),
            hook,
            merged: None,
        }
    }

    /// 创建合并定义钩子项
    pub fn merged<H: MergedDefinitionHook + 'static>(name: impl Into<String>, hook: Arc<H>) -> Self {
        Self {
            name: name.into(),
            hook: hook.clone(),
            merged: Some(hook),
        }
    }

    /// 从扩展实例创建钩子项，扩展不具备钩子能力时返回 `None`
    pub fn from_extension(extension: &Extension) -> Option<Self> {
        let instance = extension.instance();
        let hook = instance.lifecycle_hook()?.clone();
        Some(Self {
            name: extension.name().to_string(),
            hook,
            merged: instance.merged_definition_hook().cloned(),
        })
    }

    /// 钩子名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 生命周期钩子
    pub fn hook(&self) -> &Arc<dyn LifecycleHook> {
        &self.hook
    }

    /// 合并定义钩子视图
    pub fn merged_hook(&self) -> Option<&Arc<dyn MergedDefinitionHook>> {
        self.merged.as_ref()
    }

    /// 是否为合并定义钩子
    pub fn is_merged_definition_hook(&self) -> bool {
        self.merged.is_some()
    }
}

impl fmt::Debug for RegisteredHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredHook")
            .field("name", &self.name)
            .field("merged", &self.merged.is_some())
            .finish()
    }
}
