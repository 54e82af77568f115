//! # 启动编排演示
//!
//! 演示注册表后置处理器注册新组件、工厂后置处理器改写组件定义，
//! 以及生命周期钩子在组件创建时的调用顺序。

use clap::Parser;
use di_abstractions::{
    Capabilities, ComponentDefinition, ComponentInstance, ConfigurableComponentFactory,
    DefinitionRegistry, Extension, FactoryPostProcessor, HookContext, LifecycleHook, OrderTier,
    RegistryPostProcessor,
};
use infrastructure_common::DependencyError;
use infrastructure_composition::{ApplicationContext, LoggingConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "bootstrap-demo")]
#[command(about = "应用容器启动编排演示")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 问候语，替换组件定义中的占位符
    #[arg(long, default_value = "你好")]
    greeting: String,
}

/// 问候服务
struct Greeter {
    message: String,
}

impl Greeter {
    fn greet(&self, name: &str) -> String {
        format!("{}, {}!", self.message, name)
    }
}

/// 配置类处理器，注册业务组件和占位符处理器
struct DemoConfiguration;

impl FactoryPostProcessor for DemoConfiguration {
    fn post_process_factory(
        &self,
        _factory: &mut dyn ConfigurableComponentFactory,
    ) -> Result<(), DependencyError> {
        Ok(())
    }
}

impl RegistryPostProcessor for DemoConfiguration {
    fn post_process_registry(
        &self,
        registry: &mut dyn DefinitionRegistry,
    ) -> Result<(), DependencyError> {
        info!("配置类处理器注册业务组件");
        registry.register_definition(
            "greeter",
            ComponentDefinition::of::<Greeter>()
                .with_property("message", "${greeting}")
                .with_supplier(|definition, _| {
                    let message = definition.string_property("message").unwrap_or("hello");
                    Ok(ComponentInstance::new(Arc::new(Greeter {
                        message: message.to_string(),
                    })))
                }),
        )?;
        registry.register_definition("loggingHook", logging_hook_definition())
    }
}

/// 替换组件定义属性中占位符的工厂后置处理器
struct PlaceholderResolver {
    greeting: String,
}

impl FactoryPostProcessor for PlaceholderResolver {
    fn post_process_factory(
        &self,
        factory: &mut dyn ConfigurableComponentFactory,
    ) -> Result<(), DependencyError> {
        let Some(registry) = factory.as_registry_mut() else {
            return Ok(());
        };
        for name in registry.definition_names() {
            let Some(definition) = registry.get_definition_mut(&name) else {
                continue;
            };
            for value in definition.properties.values_mut() {
                if value.as_str() == Some("${greeting}") {
                    info!("替换组件 '{}' 的占位符", name);
                    *value = serde_json::Value::from(self.greeting.clone());
                }
            }
        }
        Ok(())
    }
}

/// 记录组件创建的生命周期钩子
struct LoggingHook;

impl LifecycleHook for LoggingHook {
    fn after_initialization(
        &self,
        component: ComponentInstance,
        name: &str,
        ctx: &HookContext<'_>,
    ) -> Result<ComponentInstance, DependencyError> {
        info!("组件 '{}' 创建完成，当前钩子数量: {}", name, ctx.hook_count);
        Ok(component)
    }
}

fn logging_hook_definition() -> ComponentDefinition {
    ComponentDefinition::of::<LoggingHook>()
        .with_capabilities(Capabilities::LIFECYCLE_HOOK)
        .with_supplier(|_, _| {
            let hook = Arc::new(LoggingHook);
            Ok(ComponentInstance::new(hook.clone()).with_lifecycle_hook(hook))
        })
}

fn placeholder_definition(greeting: String) -> ComponentDefinition {
    ComponentDefinition::of::<PlaceholderResolver>()
        .with_capabilities(Capabilities::FACTORY_POST_PROCESSOR)
        .with_tier(OrderTier::Priority)
        .with_supplier(move |_, _| {
            let processor = Arc::new(PlaceholderResolver {
                greeting: greeting.clone(),
            });
            Ok(ComponentInstance::new(processor.clone())
                .with_order(OrderTier::Priority, None)
                .with_factory_post_processor(processor))
        })
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    LoggingConfig::development().init()?;
    info!("启动编排演示");

    let configuration = Arc::new(DemoConfiguration);
    let mut context = ApplicationContext::builder()
        .load_config(args.config.as_deref())?
        .register_definition("placeholderResolver", placeholder_definition(args.greeting))
        .add_post_processor(Extension::new(
            "demoConfiguration",
            ComponentInstance::new(configuration.clone()).with_registry_post_processor(configuration),
        ))
        .build()?;

    context.refresh()?;
    info!("生命周期钩子: {:?}", context.factory().lifecycle_hook_names());

    let greeter = context.get::<Greeter>("greeter")?;
    info!("{}", greeter.greet("Lorn"));

    context.close()?;
    Ok(())
}
