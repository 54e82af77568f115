//! 事件监听器注册表与监听器探测钩子

use dashmap::DashMap;
use di_abstractions::{
    ApplicationListener, Capabilities, ComponentDefinition, ComponentInstance, ContextEvent,
    HookContext, LifecycleHook, MergedDefinitionHook,
};
use infrastructure_common::DependencyError;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// 监听器探测钩子在钩子链中的名称
pub const LISTENER_DETECTOR_NAME: &str = "applicationListenerDetector";

/// 容器持有的事件监听器注册表
///
/// 克隆后共享同一份监听器列表。
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: Arc<RwLock<Vec<(String, Arc<dyn ApplicationListener>)>>>,
}

impl ListenerRegistry {
    /// 创建空的监听器注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加监听器，同名监听器会被替换
    pub fn add(&self, name: impl Into<String>, listener: Arc<dyn ApplicationListener>) {
        let name = name.into();
        let mut listeners = self.listeners.write();
        if let Some(existing) = listeners.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = listener;
        } else {
            listeners.push((name, listener));
        }
    }

    /// 移除监听器
    pub fn remove(&self, name: &str) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(n, _)| n != name);
        listeners.len() != before
    }

    /// 是否包含指定名称的监听器
    pub fn contains(&self, name: &str) -> bool {
        self.listeners.read().iter().any(|(n, _)| n == name)
    }

    /// 按注册顺序获取监听器名称
    pub fn names(&self) -> Vec<String> {
        self.listeners.read().iter().map(|(n, _)| n.clone()).collect()
    }

    /// 监听器数量
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// 向所有监听器发布事件
    pub fn publish(&self, event: &ContextEvent) {
        let listeners: Vec<Arc<dyn ApplicationListener>> =
            self.listeners.read().iter().map(|(_, l)| l.clone()).collect();
        debug!("发布容器事件给 {} 个监听器: {:?}", listeners.len(), event);
        for listener in listeners {
            listener.on_event(event);
        }
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.names())
            .finish()
    }
}

/// 事件监听器探测钩子
///
/// 记录声明了监听能力的组件是否为单例，初始化完成后把单例监听器登记到所属容器，
/// 销毁前再将其移除。
pub struct ApplicationListenerDetector {
    listeners: ListenerRegistry,
    singleton_names: DashMap<String, bool>,
}

impl ApplicationListenerDetector {
    /// 创建绑定到指定监听器注册表的探测钩子
    pub fn new(listeners: ListenerRegistry) -> Self {
        Self {
            listeners,
            singleton_names: DashMap::new(),
        }
    }
}

impl fmt::Debug for ApplicationListenerDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationListenerDetector")
            .field("listeners", &self.listeners)
            .field("tracked", &self.singleton_names.len())
            .finish()
    }
}

impl LifecycleHook for ApplicationListenerDetector {
    fn after_initialization(
        &self,
        component: ComponentInstance,
        name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<ComponentInstance, DependencyError> {
        let Some(listener) = component.application_listener() else {
            return Ok(component);
        };

        let singleton = self.singleton_names.get(name).map(|entry| *entry.value());
        match singleton {
            Some(true) => {
                debug!("登记事件监听器: {}", name);
                self.listeners.add(name, listener.clone());
            }
            Some(false) => {
                warn!(
                    "组件 '{}' 实现了事件监听但不是单例，无法可靠地接收容器事件",
                    name
                );
                self.singleton_names.remove(name);
            }
            None => {}
        }
        Ok(component)
    }

    fn before_destruction(&self, component: &ComponentInstance, name: &str) {
        if component.application_listener().is_some() && self.listeners.remove(name) {
            debug!("移除事件监听器: {}", name);
        }
    }
}

impl MergedDefinitionHook for ApplicationListenerDetector {
    fn post_process_merged_definition(
        &self,
        definition: &mut ComponentDefinition,
        name: &str,
    ) -> Result<(), DependencyError> {
        if definition.capabilities.contains(Capabilities::APPLICATION_LISTENER) {
            self.singleton_names
                .insert(name.to_string(), definition.lifetime.is_singleton());
        }
        Ok(())
    }

    fn reset_definition(&self, name: &str) {
        self.singleton_names.remove(name);
    }
}
