//! 通过应用容器驱动的端到端启动场景

use di_abstractions::{
    Capabilities, ComponentDefinition, ComponentInstance, ConfigurableComponentFactory,
    DefinitionRegistry, Extension, FactoryPostProcessor, HookContext, LifecycleHook,
    MergedDefinitionHook, OrderComparator, OrderTier, RegistryPostProcessor,
};
use di_impl::{ELIGIBILITY_GUARD_NAME, LISTENER_DETECTOR_NAME};
use infrastructure_common::DependencyError;
use infrastructure_composition::ApplicationContext;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::sync::Arc;

type Journal = Arc<Mutex<Vec<String>>>;

/// 由闭包实现的注册表后置处理器
struct FnRegistryProcessor<F> {
    label: &'static str,
    journal: Journal,
    action: F,
}

impl<F> FactoryPostProcessor for FnRegistryProcessor<F>
where
    F: Fn(&mut dyn DefinitionRegistry) -> Result<(), DependencyError> + Send + Sync,
{
    fn post_process_factory(
        &self,
        _factory: &mut dyn ConfigurableComponentFactory,
    ) -> Result<(), DependencyError> {
        self.journal.lock().push(format!("factory:{}", self.label));
        Ok(())
    }
}

impl<F> RegistryPostProcessor for FnRegistryProcessor<F>
where
    F: Fn(&mut dyn DefinitionRegistry) -> Result<(), DependencyError> + Send + Sync,
{
    fn post_process_registry(
        &self,
        registry: &mut dyn DefinitionRegistry,
    ) -> Result<(), DependencyError> {
        self.journal.lock().push(format!("registry:{}", self.label));
        (self.action)(registry)
    }
}

fn registry_processor_definition<F>(
    label: &'static str,
    tier: OrderTier,
    journal: &Journal,
    action: F,
) -> ComponentDefinition
where
    F: Fn(&mut dyn DefinitionRegistry) -> Result<(), DependencyError> + Clone + Send + Sync + 'static,
{
    let journal = journal.clone();
    ComponentDefinition::new(label)
        .with_capabilities(Capabilities::registry_post_processor())
        .with_tier(tier)
        .with_supplier(move |_, _| {
            let processor = Arc::new(FnRegistryProcessor {
                label,
                journal: journal.clone(),
                action: action.clone(),
            });
            Ok(ComponentInstance::new(processor.clone())
                .with_order(tier, None)
                .with_registry_post_processor(processor))
        })
}

/// 记录处理过的组件的钩子
struct TracingHook {
    label: &'static str,
    journal: Journal,
}

impl LifecycleHook for TracingHook {
    fn after_initialization(
        &self,
        component: ComponentInstance,
        name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<ComponentInstance, DependencyError> {
        self.journal.lock().push(format!("hook:{}:{}", self.label, name));
        Ok(component)
    }
}

impl MergedDefinitionHook for TracingHook {
    fn post_process_merged_definition(
        &self,
        _definition: &mut ComponentDefinition,
        _name: &str,
    ) -> Result<(), DependencyError> {
        Ok(())
    }
}

fn hook_definition(
    label: &'static str,
    order: i32,
    merged: bool,
    journal: &Journal,
) -> ComponentDefinition {
    let journal = journal.clone();
    let capabilities = if merged {
        Capabilities::merged_definition_hook()
    } else {
        Capabilities::LIFECYCLE_HOOK
    };
    ComponentDefinition::new(label)
        .with_capabilities(capabilities)
        .with_tier(OrderTier::Ordered)
        .with_supplier(move |_, _| {
            let hook = Arc::new(TracingHook {
                label,
                journal: journal.clone(),
            });
            let instance = ComponentInstance::new(hook.clone()).with_order(OrderTier::Ordered, Some(order));
            Ok(if merged {
                instance.with_merged_definition_hook(hook)
            } else {
                instance.with_lifecycle_hook(hook)
            })
        })
}

fn service_definition(value: &'static str) -> ComponentDefinition {
    ComponentDefinition::new("Service")
        .with_supplier(move |_, _| Ok(ComponentInstance::new(Arc::new(value.to_string()))))
}

#[test]
fn test_empty_context_bootstrap() -> anyhow::Result<()> {
    let mut context = ApplicationContext::builder().build()?;

    context.refresh()?;

    assert_eq!(
        context.factory().lifecycle_hook_names(),
        vec![ELIGIBILITY_GUARD_NAME, LISTENER_DETECTOR_NAME]
    );
    assert_eq!(context.factory().definition_count(), 0);
    context.close()?;
    Ok(())
}

#[test]
fn test_merged_hook_follows_plain_hooks_in_context() -> anyhow::Result<()> {
    let journal: Journal = Arc::default();
    let mut context = ApplicationContext::builder()
        .register_definition("plainA", hook_definition("plainA", 1, false, &journal))
        .register_definition("merged", hook_definition("merged", 0, true, &journal))
        .register_definition("plainB", hook_definition("plainB", 2, false, &journal))
        .register_definition("service", service_definition("ok"))
        .build()?;

    context.refresh()?;

    assert_eq!(
        context.factory().lifecycle_hook_names(),
        vec![ELIGIBILITY_GUARD_NAME, "plainA", "plainB", "merged", LISTENER_DETECTOR_NAME]
    );
    // 预创建的普通组件经过全部钩子，顺序与钩子链一致
    let service_hooks: Vec<String> = journal
        .lock()
        .iter()
        .filter(|entry| entry.ends_with(":service"))
        .cloned()
        .collect();
    assert_eq!(
        service_hooks,
        vec!["hook:plainA:service", "hook:plainB:service", "hook:merged:service"]
    );
    Ok(())
}

#[test]
fn test_registry_processor_chain_registers_components() -> anyhow::Result<()> {
    let journal: Journal = Arc::default();
    let inner_journal = journal.clone();
    let configuration = FnRegistryProcessor {
        label: "configuration",
        journal: journal.clone(),
        action: move |registry: &mut dyn DefinitionRegistry| {
            // 配置类处理器发现并注册另一个处理器，后者再注册业务组件
            registry.register_definition(
                "scanner",
                registry_processor_definition("scanner", OrderTier::Unordered, &inner_journal, |registry| {
                    registry.register_definition("instanceA", service_definition("InstanceA"))
                }),
            )
        },
    };
    let configuration = Arc::new(configuration);
    let mut context = ApplicationContext::builder()
        .add_post_processor(Extension::new(
            "configurationProcessor",
            ComponentInstance::new(configuration.clone()).with_registry_post_processor(configuration),
        ))
        .build()?;

    context.refresh()?;

    assert_eq!(
        journal.lock().clone(),
        vec![
            "registry:configuration",
            "registry:scanner",
            "factory:configuration",
            "factory:scanner",
        ]
    );
    assert_eq!(context.get::<String>("instanceA")?.as_str(), "InstanceA");
    Ok(())
}

/// 按名称倒序的依赖感知比较器
struct ReverseNameComparator;

impl OrderComparator for ReverseNameComparator {
    fn compare(&self, a: &Extension, b: &Extension) -> Ordering {
        b.name().cmp(a.name())
    }
}

#[test]
fn test_dependency_comparator_overrides_order_metadata() -> anyhow::Result<()> {
    let journal: Journal = Arc::default();
    let mut context = ApplicationContext::builder()
        .with_dependency_comparator(Arc::new(ReverseNameComparator))
        .register_definition("alpha", hook_definition("alpha", 1, false, &journal))
        .register_definition("beta", hook_definition("beta", 2, false, &journal))
        .build()?;

    context.refresh()?;

    assert_eq!(
        context.factory().lifecycle_hook_names(),
        vec![ELIGIBILITY_GUARD_NAME, "beta", "alpha", LISTENER_DETECTOR_NAME]
    );
    Ok(())
}

#[test]
fn test_processor_failure_stops_bootstrap() -> anyhow::Result<()> {
    let journal: Journal = Arc::default();
    let mut context = ApplicationContext::builder()
        .register_definition(
            "broken",
            registry_processor_definition("broken", OrderTier::Priority, &journal, |_| {
                Err(DependencyError::extension_failed("broken", "定义无效"))
            }),
        )
        .register_definition(
            "never",
            registry_processor_definition("never", OrderTier::Unordered, &journal, |_| Ok(())),
        )
        .build()?;

    let result = context.refresh();

    assert!(result.is_err());
    assert_eq!(journal.lock().clone(), vec!["registry:broken"]);
    assert!(!context.is_running());
    Ok(())
}
