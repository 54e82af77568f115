//! 应用容器
//!
//! 持有组件工厂和外部提供的后置处理器，负责启动（刷新）和关闭流程。

use crate::builder::ApplicationContextBuilder;
use chrono::{DateTime, Utc};
use di_abstractions::{
    ComponentDefinition, ComponentInstance, ComponentProvider, ConfigurableComponentFactory,
    ContextEvent, DefinitionRegistry, Extension, RegisteredHook,
};
use di_impl::{
    ApplicationListenerDetector, DefaultComponentFactory, ListenerRegistry, PostProcessorDelegate,
    LISTENER_DETECTOR_NAME,
};
use infrastructure_common::{
    DependencyError, DependencyResult, InfrastructureError, InfrastructureResult, LifecycleState,
    TypeInfo,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 应用容器
pub struct ApplicationContext {
    id: String,
    display_name: String,
    startup_date: Option<DateTime<Utc>>,
    state: LifecycleState,
    factory: DefaultComponentFactory,
    post_processors: Vec<Extension>,
    listeners: ListenerRegistry,
    delegate: PostProcessorDelegate,
    preinstantiate_singletons: bool,
}

impl ApplicationContext {
    /// 创建应用容器构建器
    pub fn builder() -> ApplicationContextBuilder {
        ApplicationContextBuilder::new()
    }

    pub(crate) fn new(
        display_name: String,
        factory: DefaultComponentFactory,
        post_processors: Vec<Extension>,
        delegate: PostProcessorDelegate,
        preinstantiate_singletons: bool,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            display_name,
            startup_date: None,
            state: LifecycleState::Uninitialized,
            factory,
            post_processors,
            listeners: ListenerRegistry::new(),
            delegate,
            preinstantiate_singletons,
        }
    }

    /// 容器ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 容器显示名称
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// 启动时间，刷新之前为 `None`
    pub fn startup_date(&self) -> Option<DateTime<Utc>> {
        self.startup_date
    }

    /// 当前状态
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// 是否处于运行中
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// 组件工厂
    pub fn factory(&self) -> &DefaultComponentFactory {
        &self.factory
    }

    /// 容器事件监听器
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// 外部提供的工厂后置处理器
    pub fn post_processors(&self) -> &[Extension] {
        &self.post_processors
    }

    /// 添加工厂后置处理器，刷新时按添加顺序调用
    pub fn add_post_processor(&mut self, extension: Extension) {
        self.post_processors.push(extension);
    }

    /// 注册组件定义
    pub fn register_definition(
        &mut self,
        name: &str,
        definition: ComponentDefinition,
    ) -> InfrastructureResult<()> {
        self.factory.register_definition(name, definition)?;
        Ok(())
    }

    /// 刷新容器
    ///
    /// 依次执行工厂后置处理、生命周期钩子注册和单例预创建，完成后发布
    /// [`ContextEvent::Refreshed`]。任何一步失败都会销毁已创建的单例，
    /// 并将扩展返回的错误原样包装后返回。
    pub fn refresh(&mut self) -> InfrastructureResult<()> {
        if !self.state.can_start() {
            return Err(InfrastructureError::BootstrapFailed {
                message: format!(
                    "容器 {} 不能重复刷新，当前状态: {:?}",
                    self.display_name, self.state
                ),
            });
        }

        info!("刷新容器: {} ({})", self.display_name, self.id);
        self.state = LifecycleState::Initializing;
        self.startup_date = Some(Utc::now());

        if let Err(e) = self.refresh_factory() {
            error!("容器 {} 刷新失败: {}", self.display_name, e);
            self.factory.destroy_singletons();
            self.state = LifecycleState::Error;
            return Err(e.into());
        }

        self.state = LifecycleState::Running;
        self.listeners.publish(&ContextEvent::Refreshed {
            context_id: self.id.clone(),
            timestamp: Utc::now(),
        });
        info!(
            "容器 {} 刷新完成，共 {} 个组件定义、{} 个生命周期钩子",
            self.display_name,
            self.factory.definition_count(),
            self.factory.lifecycle_hook_count()
        );
        Ok(())
    }

    fn refresh_factory(&mut self) -> DependencyResult<()> {
        self.prepare_factory();
        self.delegate
            .invoke_factory_post_processors(&mut self.factory, &self.post_processors)?;
        self.delegate
            .register_lifecycle_hooks(&mut self.factory, &self.listeners)?;
        if self.preinstantiate_singletons {
            self.factory.preinstantiate_singletons()?;
        }
        Ok(())
    }

    /// 提前安装监听器探测钩子，使后置处理阶段创建的监听器也能被登记
    fn prepare_factory(&mut self) {
        self.factory.add_lifecycle_hook(RegisteredHook::merged(
            LISTENER_DETECTOR_NAME,
            Arc::new(ApplicationListenerDetector::new(self.listeners.clone())),
        ));
    }

    /// 关闭容器
    pub fn close(&mut self) -> InfrastructureResult<()> {
        if !self.state.is_running() {
            warn!("容器 {} 未在运行，忽略关闭请求，当前状态: {:?}", self.display_name, self.state);
            return Ok(());
        }

        info!("关闭容器: {}", self.display_name);
        self.state = LifecycleState::Stopping;
        self.listeners.publish(&ContextEvent::Closed {
            context_id: self.id.clone(),
            timestamp: Utc::now(),
        });
        self.factory.destroy_singletons();
        self.state = LifecycleState::Stopped;
        info!("容器 {} 已关闭", self.display_name);
        Ok(())
    }

    /// 按名称获取组件
    pub fn get_component(&mut self, name: &str) -> InfrastructureResult<ComponentInstance> {
        self.ensure_running()?;
        Ok(self.factory.get_component(name)?)
    }

    /// 按名称获取具体类型的组件
    pub fn get<T: Send + Sync + 'static>(&mut self, name: &str) -> InfrastructureResult<Arc<T>> {
        let instance = self.get_component(name)?;
        instance.downcast::<T>().ok_or_else(|| {
            DependencyError::TypeMismatch {
                name: name.to_string(),
                expected: TypeInfo::of::<T>().full_name().to_string(),
                actual: instance.type_info().full_name().to_string(),
            }
            .into()
        })
    }

    /// 是否包含指定名称的组件
    pub fn contains_component(&self, name: &str) -> bool {
        self.factory.contains_component(name)
    }

    fn ensure_running(&self) -> DependencyResult<()> {
        if self.state.is_running() {
            return Ok(());
        }
        Err(DependencyError::LifecycleError {
            message: format!(
                "容器 {} 未在运行，当前状态: {:?}",
                self.display_name, self.state
            ),
        })
    }
}

impl std::fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("state", &self.state)
            .field("startup_date", &self.startup_date)
            .field("post_processors", &self.post_processors.iter().map(Extension::name).collect::<Vec<_>>())
            .field("listeners", &self.listeners)
            .finish()
    }
}
