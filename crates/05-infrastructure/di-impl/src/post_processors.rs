//! 后置处理器编排
//!
//! 容器启动时按固定顺序执行三个阶段：
//!
//! 1. 注册表后置处理：反复发现并调用注册表后置处理器，直到不再出现新的处理器
//! 2. 工厂后置处理：按层级调用工厂后置处理器，每个处理器只调用一次
//! 3. 生命周期钩子注册：按层级物化并追加生命周期钩子，之后创建的每个组件都会经过这些钩子

use crate::guard::{ComponentEligibilityGuard, ELIGIBILITY_GUARD_NAME};
use crate::listener::{ApplicationListenerDetector, ListenerRegistry, LISTENER_DETECTOR_NAME};
use crate::ordering::OrderingResolver;
use di_abstractions::{
    Capabilities, ConfigurableComponentFactory, Extension, RegisteredHook, TypeMarker,
};
use infrastructure_common::DependencyError;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 后置处理器编排器
#[derive(Debug, Clone, Default)]
pub struct PostProcessorDelegate {
    resolver: OrderingResolver,
}

impl PostProcessorDelegate {
    /// 使用指定的排序解析器创建编排器
    pub fn new(resolver: OrderingResolver) -> Self {
        Self { resolver }
    }

    /// 排序解析器
    pub fn resolver(&self) -> &OrderingResolver {
        &self.resolver
    }

    /// 调用所有工厂后置处理器
    ///
    /// `external` 是调用方直接提供的扩展，按给定顺序调用且不参与排序。
    /// 任何处理器返回的错误都原样向上传播，并中止剩余的启动流程。
    pub fn invoke_factory_post_processors(
        &self,
        factory: &mut dyn ConfigurableComponentFactory,
        external: &[Extension],
    ) -> Result<(), DependencyError> {
        let mut processed: HashSet<String> = HashSet::new();
        for extension in external {
            processed.insert(extension.name().to_string());
        }

        if factory.as_registry_mut().is_some() {
            self.invoke_registry_phase(factory, external, &mut processed)?;
        } else {
            info!("组件工厂不支持修改注册表，直接调用 {} 个外部工厂后置处理器", external.len());
            invoke_factory_callbacks(factory, external)?;
        }

        self.invoke_factory_phase(factory, &processed)?;

        // 处理器可能改写了原始定义（例如占位符），合并定义需要重新计算
        factory.clear_metadata_cache();
        Ok(())
    }

    fn invoke_registry_phase(
        &self,
        factory: &mut dyn ConfigurableComponentFactory,
        external: &[Extension],
        processed: &mut HashSet<String>,
    ) -> Result<(), DependencyError> {
        let mut registry_processors: Vec<Extension> = Vec::new();
        let mut regular_processors: Vec<Extension> = Vec::new();

        for extension in external {
            if extension.capabilities().contains(Capabilities::REGISTRY_POST_PROCESSOR) {
                invoke_registry_callbacks(factory, std::slice::from_ref(extension))?;
                registry_processors.push(extension.clone());
            } else {
                regular_processors.push(extension.clone());
            }
        }

        info!("开始注册表后置处理阶段");

        let mut current = self.discover_registry_processors(factory, processed, Some(TypeMarker::PriorityOrdered))?;
        self.resolver.sort(&mut current, factory);
        invoke_registry_callbacks(factory, &current)?;
        registry_processors.append(&mut current);

        let mut current = self.discover_registry_processors(factory, processed, Some(TypeMarker::Ordered))?;
        self.resolver.sort(&mut current, factory);
        invoke_registry_callbacks(factory, &current)?;
        registry_processors.append(&mut current);

        let mut pass = 0;
        loop {
            let mut current = self.discover_registry_processors(factory, processed, None)?;
            if current.is_empty() {
                break;
            }
            pass += 1;
            debug!("第 {} 轮发现 {} 个新的注册表后置处理器", pass, current.len());
            self.resolver.sort(&mut current, factory);
            invoke_registry_callbacks(factory, &current)?;
            registry_processors.append(&mut current);
        }

        info!(
            "注册表后置处理阶段完成，共 {} 个注册表后置处理器",
            registry_processors.len()
        );

        invoke_factory_callbacks(factory, &registry_processors)?;
        invoke_factory_callbacks(factory, &regular_processors)?;
        Ok(())
    }

    /// 发现尚未处理的注册表后置处理器，物化后标记为已处理
    ///
    /// 先按名称排除已处理的扩展，再做类型匹配，避免重复物化。
    fn discover_registry_processors(
        &self,
        factory: &mut dyn ConfigurableComponentFactory,
        processed: &mut HashSet<String>,
        marker: Option<TypeMarker>,
    ) -> Result<Vec<Extension>, DependencyError> {
        let names = factory.names_for_capability(Capabilities::REGISTRY_POST_PROCESSOR, true, false);
        let mut discovered = Vec::new();

        for name in names {
            if processed.contains(&name) {
                continue;
            }
            if let Some(marker) = marker {
                if !factory.is_type_match(&name, marker)? {
                    continue;
                }
            }
            discovered.push(factory.get_extension(&name, Capabilities::registry_post_processor())?);
            processed.insert(name);
        }
        Ok(discovered)
    }

    fn invoke_factory_phase(
        &self,
        factory: &mut dyn ConfigurableComponentFactory,
        processed: &HashSet<String>,
    ) -> Result<(), DependencyError> {
        let names = factory.names_for_capability(Capabilities::FACTORY_POST_PROCESSOR, true, false);

        let mut priority_processors = Vec::new();
        let mut ordered_names = Vec::new();
        let mut unordered_names = Vec::new();
        for name in names {
            if processed.contains(&name) {
                continue;
            }
            if factory.is_type_match(&name, TypeMarker::PriorityOrdered)? {
                priority_processors.push(factory.get_extension(&name, Capabilities::FACTORY_POST_PROCESSOR)?);
            } else if factory.is_type_match(&name, TypeMarker::Ordered)? {
                ordered_names.push(name);
            } else {
                unordered_names.push(name);
            }
        }

        info!(
            "开始工厂后置处理阶段: 优先 {} 个，排序 {} 个，普通 {} 个",
            priority_processors.len(),
            ordered_names.len(),
            unordered_names.len()
        );

        self.resolver.sort(&mut priority_processors, factory);
        invoke_factory_callbacks(factory, &priority_processors)?;

        let mut ordered_processors = materialize(factory, &ordered_names, Capabilities::FACTORY_POST_PROCESSOR)?;
        self.resolver.sort(&mut ordered_processors, factory);
        invoke_factory_callbacks(factory, &ordered_processors)?;

        let unordered_processors = materialize(factory, &unordered_names, Capabilities::FACTORY_POST_PROCESSOR)?;
        invoke_factory_callbacks(factory, &unordered_processors)?;
        Ok(())
    }

    /// 注册生命周期钩子
    ///
    /// 钩子链最终的顺序为：资格检查钩子、优先层级钩子、排序层级钩子、普通钩子、
    /// 合并定义钩子（重新追加到链尾），最后是监听器探测钩子。
    pub fn register_lifecycle_hooks(
        &self,
        factory: &mut dyn ConfigurableComponentFactory,
        listeners: &ListenerRegistry,
    ) -> Result<(), DependencyError> {
        let names = factory.names_for_capability(Capabilities::LIFECYCLE_HOOK, true, false);

        // 资格检查钩子本身也计入目标数量
        let target_hook_count = factory.lifecycle_hook_count() + 1 + names.len();
        factory.add_lifecycle_hook(RegisteredHook::new(
            ELIGIBILITY_GUARD_NAME,
            Arc::new(ComponentEligibilityGuard::new(target_hook_count)),
        ));

        let mut priority_hooks = Vec::new();
        let mut internal_hooks = Vec::new();
        let mut ordered_names = Vec::new();
        let mut unordered_names = Vec::new();
        for name in names {
            if factory.is_type_match(&name, TypeMarker::PriorityOrdered)? {
                let extension = factory.get_extension(&name, Capabilities::LIFECYCLE_HOOK)?;
                if is_merged_definition_hook(&extension) {
                    internal_hooks.push(extension.clone());
                }
                priority_hooks.push(extension);
            } else if factory.is_type_match(&name, TypeMarker::Ordered)? {
                ordered_names.push(name);
            } else {
                unordered_names.push(name);
            }
        }

        info!(
            "注册生命周期钩子: 优先 {} 个，排序 {} 个，普通 {} 个，目标数量 {}",
            priority_hooks.len(),
            ordered_names.len(),
            unordered_names.len(),
            target_hook_count
        );

        self.resolver.sort(&mut priority_hooks, factory);
        register_hooks(factory, &priority_hooks);

        let mut ordered_hooks = materialize(factory, &ordered_names, Capabilities::LIFECYCLE_HOOK)?;
        internal_hooks.extend(ordered_hooks.iter().filter(|e| is_merged_definition_hook(e)).cloned());
        self.resolver.sort(&mut ordered_hooks, factory);
        register_hooks(factory, &ordered_hooks);

        let unordered_hooks = materialize(factory, &unordered_names, Capabilities::LIFECYCLE_HOOK)?;
        internal_hooks.extend(unordered_hooks.iter().filter(|e| is_merged_definition_hook(e)).cloned());
        register_hooks(factory, &unordered_hooks);

        self.resolver.sort(&mut internal_hooks, factory);
        register_hooks(factory, &internal_hooks);

        factory.add_lifecycle_hook(RegisteredHook::merged(
            LISTENER_DETECTOR_NAME,
            Arc::new(ApplicationListenerDetector::new(listeners.clone())),
        ));

        debug!("生命周期钩子链: {:?}", factory.lifecycle_hook_names());
        Ok(())
    }
}

fn is_merged_definition_hook(extension: &Extension) -> bool {
    extension.capabilities().contains(Capabilities::MERGED_DEFINITION_HOOK)
}

fn materialize(
    factory: &mut dyn ConfigurableComponentFactory,
    names: &[String],
    required: Capabilities,
) -> Result<Vec<Extension>, DependencyError> {
    names
        .iter()
        .map(|name| factory.get_extension(name, required))
        .collect()
}

fn invoke_registry_callbacks(
    factory: &mut dyn ConfigurableComponentFactory,
    extensions: &[Extension],
) -> Result<(), DependencyError> {
    for extension in extensions {
        let Some(processor) = extension.instance().registry_post_processor().cloned() else {
            warn!("扩展 {} 不是注册表后置处理器，跳过", extension.name());
            continue;
        };
        let Some(registry) = factory.as_registry_mut() else {
            return Ok(());
        };
        debug!("调用注册表后置处理器: {}", extension.name());
        processor.post_process_registry(registry)?;
    }
    Ok(())
}

fn invoke_factory_callbacks(
    factory: &mut dyn ConfigurableComponentFactory,
    extensions: &[Extension],
) -> Result<(), DependencyError> {
    for extension in extensions {
        let Some(processor) = extension.instance().factory_post_processor().cloned() else {
            warn!("扩展 {} 不是工厂后置处理器，跳过", extension.name());
            continue;
        };
        debug!("调用工厂后置处理器: {}", extension.name());
        processor.post_process_factory(factory)?;
    }
    Ok(())
}

fn register_hooks(factory: &mut dyn ConfigurableComponentFactory, extensions: &[Extension]) {
    for extension in extensions {
        match RegisteredHook::from_extension(extension) {
            Some(hook) => factory.add_lifecycle_hook(hook),
            None => warn!("扩展 {} 不是生命周期钩子，跳过", extension.name()),
        }
    }
}
