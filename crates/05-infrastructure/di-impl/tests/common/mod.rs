//! 测试用的记录型扩展与组件定义辅助函数

#![allow(dead_code)]

use di_abstractions::{
    ApplicationListener, Capabilities, ComponentDefinition, ComponentInstance,
    ConfigurableComponentFactory, ContextEvent, DefinitionRegistry, FactoryPostProcessor,
    HookContext, LifecycleHook, MergedDefinitionHook, OrderTier, RegistryPostProcessor,
};
use infrastructure_common::DependencyError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 按发生顺序记录扩展调用
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// 以指定前缀开头的记录，去掉前缀
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter_map(|entry| entry.strip_prefix(prefix).map(str::to_string))
            .collect()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == entry).count()
    }
}

pub type RegistryAction =
    Arc<dyn Fn(&mut dyn DefinitionRegistry) -> Result<(), DependencyError> + Send + Sync>;

/// 记录调用的注册表后置处理器
pub struct RecordingRegistryProcessor {
    label: String,
    journal: Journal,
    action: Option<RegistryAction>,
}

impl RecordingRegistryProcessor {
    pub fn new(label: &str, journal: &Journal) -> Self {
        Self {
            label: label.to_string(),
            journal: journal.clone(),
            action: None,
        }
    }

    pub fn with_action(mut self, action: RegistryAction) -> Self {
        self.action = Some(action);
        self
    }
}

impl FactoryPostProcessor for RecordingRegistryProcessor {
    fn post_process_factory(
        &self,
        _factory: &mut dyn ConfigurableComponentFactory,
    ) -> Result<(), DependencyError> {
        self.journal.record(format!("factory:{}", self.label));
        Ok(())
    }
}

impl RegistryPostProcessor for RecordingRegistryProcessor {
    fn post_process_registry(
        &self,
        registry: &mut dyn DefinitionRegistry,
    ) -> Result<(), DependencyError> {
        self.journal.record(format!("registry:{}", self.label));
        match &self.action {
            Some(action) => action(registry),
            None => Ok(()),
        }
    }
}

impl LifecycleHook for RecordingRegistryProcessor {
    fn after_initialization(
        &self,
        component: ComponentInstance,
        name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<ComponentInstance, DependencyError> {
        self.journal.record(format!("hook:{}:{}", self.label, name));
        Ok(component)
    }
}

/// 记录调用的工厂后置处理器
pub struct RecordingFactoryProcessor {
    label: String,
    journal: Journal,
}

impl RecordingFactoryProcessor {
    pub fn new(label: &str, journal: &Journal) -> Self {
        Self {
            label: label.to_string(),
            journal: journal.clone(),
        }
    }
}

impl FactoryPostProcessor for RecordingFactoryProcessor {
    fn post_process_factory(
        &self,
        _factory: &mut dyn ConfigurableComponentFactory,
    ) -> Result<(), DependencyError> {
        self.journal.record(format!("factory:{}", self.label));
        Ok(())
    }
}

/// 总是失败的工厂后置处理器
pub struct FailingFactoryProcessor;

impl FactoryPostProcessor for FailingFactoryProcessor {
    fn post_process_factory(
        &self,
        _factory: &mut dyn ConfigurableComponentFactory,
    ) -> Result<(), DependencyError> {
        Err(DependencyError::extension_failed("failing", "处理失败"))
    }
}

/// 记录调用的生命周期钩子
pub struct RecordingHook {
    label: String,
    journal: Journal,
}

impl RecordingHook {
    pub fn new(label: &str, journal: &Journal) -> Self {
        Self {
            label: label.to_string(),
            journal: journal.clone(),
        }
    }
}

impl LifecycleHook for RecordingHook {
    fn after_initialization(
        &self,
        component: ComponentInstance,
        name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<ComponentInstance, DependencyError> {
        self.journal.record(format!("hook:{}:{}", self.label, name));
        Ok(component)
    }
}

/// 记录调用的合并定义钩子
pub struct RecordingMergedHook {
    label: String,
    journal: Journal,
}

impl RecordingMergedHook {
    pub fn new(label: &str, journal: &Journal) -> Self {
        Self {
            label: label.to_string(),
            journal: journal.clone(),
        }
    }
}

impl LifecycleHook for RecordingMergedHook {
    fn after_initialization(
        &self,
        component: ComponentInstance,
        name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<ComponentInstance, DependencyError> {
        self.journal.record(format!("hook:{}:{}", self.label, name));
        Ok(component)
    }
}

impl MergedDefinitionHook for RecordingMergedHook {
    fn post_process_merged_definition(
        &self,
        _definition: &mut ComponentDefinition,
        name: &str,
    ) -> Result<(), DependencyError> {
        self.journal.record(format!("merged:{}:{}", self.label, name));
        Ok(())
    }
}

/// 注册表后置处理器的组件定义
pub fn registry_processor(
    label: &str,
    tier: OrderTier,
    order: Option<i32>,
    journal: &Journal,
    action: Option<RegistryAction>,
) -> ComponentDefinition {
    let label = label.to_string();
    let journal = journal.clone();
    ComponentDefinition::new(format!("RegistryProcessor[{label}]"))
        .with_capabilities(Capabilities::registry_post_processor())
        .with_tier(tier)
        .with_supplier(move |_, _| {
            let mut processor = RecordingRegistryProcessor::new(&label, &journal);
            if let Some(action) = &action {
                processor = processor.with_action(action.clone());
            }
            let processor = Arc::new(processor);
            journal.record(format!("created:{label}"));
            Ok(ComponentInstance::new(processor.clone())
                .with_order(tier, order)
                .with_registry_post_processor(processor))
        })
}

/// 同时是注册表后置处理器和生命周期钩子的组件定义
pub fn processor_hook(label: &str, journal: &Journal) -> ComponentDefinition {
    let label = label.to_string();
    let journal = journal.clone();
    ComponentDefinition::new(format!("ProcessorHook[{label}]"))
        .with_capabilities(Capabilities::registry_post_processor() | Capabilities::LIFECYCLE_HOOK)
        .with_supplier(move |_, _| {
            let processor = Arc::new(RecordingRegistryProcessor::new(&label, &journal));
            journal.record(format!("created:{label}"));
            Ok(ComponentInstance::new(processor.clone())
                .with_registry_post_processor(processor.clone())
                .with_lifecycle_hook(processor))
        })
}

/// 工厂后置处理器的组件定义
pub fn factory_processor(
    label: &str,
    tier: OrderTier,
    order: Option<i32>,
    journal: &Journal,
) -> ComponentDefinition {
    let label = label.to_string();
    let journal = journal.clone();
    ComponentDefinition::new(format!("FactoryProcessor[{label}]"))
        .with_capabilities(Capabilities::FACTORY_POST_PROCESSOR)
        .with_tier(tier)
        .with_supplier(move |_, _| {
            let processor = Arc::new(RecordingFactoryProcessor::new(&label, &journal));
            journal.record(format!("created:{label}"));
            Ok(ComponentInstance::new(processor.clone())
                .with_order(tier, order)
                .with_factory_post_processor(processor))
        })
}

/// 生命周期钩子的组件定义
pub fn lifecycle_hook(
    label: &str,
    tier: OrderTier,
    order: Option<i32>,
    journal: &Journal,
) -> ComponentDefinition {
    let label = label.to_string();
    let journal = journal.clone();
    ComponentDefinition::new(format!("Hook[{label}]"))
        .with_capabilities(Capabilities::LIFECYCLE_HOOK)
        .with_tier(tier)
        .with_supplier(move |_, _| {
            let hook = Arc::new(RecordingHook::new(&label, &journal));
            journal.record(format!("created:{label}"));
            Ok(ComponentInstance::new(hook.clone())
                .with_order(tier, order)
                .with_lifecycle_hook(hook))
        })
}

/// 合并定义钩子的组件定义
pub fn merged_hook(
    label: &str,
    tier: OrderTier,
    order: Option<i32>,
    journal: &Journal,
) -> ComponentDefinition {
    let label = label.to_string();
    let journal = journal.clone();
    ComponentDefinition::new(format!("MergedHook[{label}]"))
        .with_capabilities(Capabilities::merged_definition_hook())
        .with_tier(tier)
        .with_supplier(move |_, _| {
            let hook = Arc::new(RecordingMergedHook::new(&label, &journal));
            journal.record(format!("created:{label}"));
            Ok(ComponentInstance::new(hook.clone())
                .with_order(tier, order)
                .with_merged_definition_hook(hook))
        })
}

/// 普通组件的组件定义，每次创建时计数
pub fn counted_component(created: &Arc<AtomicUsize>) -> ComponentDefinition {
    let created = created.clone();
    ComponentDefinition::new("PlainComponent").with_supplier(move |definition, _| {
        created.fetch_add(1, Ordering::SeqCst);
        Ok(ComponentInstance::new(Arc::new(definition.type_name.clone())))
    })
}

/// 注册一个新定义的注册表动作
pub fn registers(name: &str, definition: ComponentDefinition) -> RegistryAction {
    let name = name.to_string();
    Arc::new(move |registry: &mut dyn DefinitionRegistry| {
        registry.register_definition(&name, definition.clone())
    })
}

pub type FactoryAction =
    Arc<dyn Fn(&mut dyn ConfigurableComponentFactory) -> Result<(), DependencyError> + Send + Sync>;

/// 执行指定动作的工厂后置处理器
pub struct ActionFactoryProcessor {
    action: FactoryAction,
}

impl FactoryPostProcessor for ActionFactoryProcessor {
    fn post_process_factory(
        &self,
        factory: &mut dyn ConfigurableComponentFactory,
    ) -> Result<(), DependencyError> {
        (self.action)(factory)
    }
}

/// 执行指定动作的工厂后置处理器的组件定义
pub fn factory_action(tier: OrderTier, order: Option<i32>, action: FactoryAction) -> ComponentDefinition {
    ComponentDefinition::new("ActionFactoryProcessor")
        .with_capabilities(Capabilities::FACTORY_POST_PROCESSOR)
        .with_tier(tier)
        .with_supplier(move |_, _| {
            let processor = Arc::new(ActionFactoryProcessor {
                action: action.clone(),
            });
            Ok(ComponentInstance::new(processor.clone())
                .with_order(tier, order)
                .with_factory_post_processor(processor))
        })
}

/// 记录收到事件的监听器
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ContextEvent>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<ContextEvent> {
        self.events.lock().clone()
    }
}

impl ApplicationListener for RecordingListener {
    fn on_event(&self, event: &ContextEvent) {
        self.events.lock().push(event.clone());
    }
}

/// 事件监听器的组件定义，所有实例共享同一个监听器对象
pub fn listener_component(listener: &Arc<RecordingListener>) -> ComponentDefinition {
    let listener = listener.clone();
    ComponentDefinition::new("RecordingListener")
        .with_capabilities(Capabilities::APPLICATION_LISTENER)
        .with_supplier(move |_, _| {
            Ok(ComponentInstance::new(listener.clone()).with_application_listener(listener.clone()))
        })
}

/// 收集日志输出的 writer
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// 在收集日志的订阅者下执行闭包
    pub fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
