//! 默认组件工厂
//!
//! 同时扮演组件定义注册表和组件工厂两个角色：保存组件定义、缓存合并定义和单例、
//! 维护生命周期钩子链，并在创建每个组件时依次调用钩子。

use di_abstractions::{
    Capabilities, ComponentDefinition, ComponentInstance, ComponentProvider,
    ConfigurableComponentFactory, DefinitionRegistry, HookContext, MergedDefinitionHook,
    OrderComparator, OrderTier, RegisteredHook, TypeMarker,
};
use indexmap::IndexMap;
use infrastructure_common::DependencyError;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 缓存的合并定义
#[derive(Debug, Clone)]
struct MergedDefinition {
    definition: ComponentDefinition,
    /// 合并定义钩子是否已经处理过
    hooks_applied: bool,
}

/// 默认组件工厂
pub struct DefaultComponentFactory {
    /// 原始组件定义，保持注册顺序
    definitions: IndexMap<String, ComponentDefinition>,
    /// 合并定义缓存
    merged_definitions: HashMap<String, MergedDefinition>,
    /// 单例缓存，保持创建顺序
    singletons: IndexMap<String, ComponentInstance>,
    /// 正在创建中的组件
    in_creation: Vec<String>,
    /// 生命周期钩子链
    hooks: Vec<RegisteredHook>,
    /// 依赖感知比较器
    dependency_comparator: Option<Arc<dyn OrderComparator>>,
    /// 是否允许覆盖组件定义
    allow_definition_overriding: bool,
}

impl DefaultComponentFactory {
    /// 创建新的组件工厂
    pub fn new() -> Self {
        Self {
            definitions: IndexMap::new(),
            merged_definitions: HashMap::new(),
            singletons: IndexMap::new(),
            in_creation: Vec::new(),
            hooks: Vec::new(),
            dependency_comparator: None,
            allow_definition_overriding: true,
        }
    }

    /// 设置依赖感知比较器
    pub fn with_dependency_comparator(mut self, comparator: Arc<dyn OrderComparator>) -> Self {
        self.dependency_comparator = Some(comparator);
        self
    }

    /// 设置是否允许覆盖组件定义
    pub fn set_allow_definition_overriding(&mut self, allow: bool) {
        self.allow_definition_overriding = allow;
    }

    /// 是否允许覆盖组件定义
    pub fn allow_definition_overriding(&self) -> bool {
        self.allow_definition_overriding
    }

    /// 单例是否已创建
    pub fn contains_singleton(&self, name: &str) -> bool {
        self.singletons.contains_key(name)
    }

    /// 按创建顺序获取已创建的单例名称
    pub fn singleton_names(&self) -> Vec<String> {
        self.singletons.keys().cloned().collect()
    }

    /// 合并定义是否已缓存
    pub fn has_merged_definition(&self, name: &str) -> bool {
        self.merged_definitions.contains_key(name)
    }

    /// 获取合并后的组件定义（不写入缓存）
    pub fn merged_definition(&self, name: &str) -> Result<ComponentDefinition, DependencyError> {
        self.resolve_merged(name, 0)
    }

    /// 预先创建所有非延迟、非抽象的单例
    pub fn preinstantiate_singletons(&mut self) -> Result<(), DependencyError> {
        let names: Vec<String> = self.definitions.keys().cloned().collect();
        debug!("预先创建单例，共 {} 个组件定义", names.len());

        for name in names {
            let definition = self.merged_definition(&name)?;
            if definition.is_abstract || definition.lazy_init || !definition.lifetime.is_singleton() {
                continue;
            }
            self.get_component(&name)?;
        }
        Ok(())
    }

    /// 按创建的逆序销毁所有单例
    pub fn destroy_singletons(&mut self) {
        let hooks = self.hooks.clone();
        let singletons: Vec<(String, ComponentInstance)> = self.singletons.drain(..).collect();
        info!("销毁 {} 个单例", singletons.len());

        for (name, instance) in singletons.iter().rev() {
            for hook in &hooks {
                hook.hook().before_destruction(instance, name);
            }
        }
        self.in_creation.clear();
    }

    fn resolve_merged(&self, name: &str, depth: usize) -> Result<ComponentDefinition, DependencyError> {
        if let Some(merged) = self.merged_definitions.get(name) {
            return Ok(merged.definition.clone());
        }

        let raw = self
            .definitions
            .get(name)
            .ok_or_else(|| DependencyError::not_registered(name))?;

        match &raw.parent {
            None => Ok(raw.clone()),
            Some(parent) if depth >= self.definitions.len() => Err(DependencyError::invalid_definition(
                name,
                format!("父定义链存在循环: {parent}"),
            )),
            Some(parent) => {
                let parent_definition = self.resolve_merged(parent, depth + 1)?;
                Ok(raw.merged_over(&parent_definition))
            }
        }
    }

    fn cached_merged_definition(&mut self, name: &str) -> Result<ComponentDefinition, DependencyError> {
        if let Some(merged) = self.merged_definitions.get(name) {
            return Ok(merged.definition.clone());
        }

        let definition = self.resolve_merged(name, 0)?;
        self.merged_definitions.insert(
            name.to_string(),
            MergedDefinition {
                definition: definition.clone(),
                hooks_applied: false,
            },
        );
        Ok(definition)
    }

    fn apply_merged_definition_hooks(&mut self, name: &str) -> Result<(), DependencyError> {
        let hooks: Vec<Arc<dyn MergedDefinitionHook>> = self
            .hooks
            .iter()
            .filter_map(|hook| hook.merged_hook().cloned())
            .collect();

        let Some(entry) = self.merged_definitions.get_mut(name) else {
            return Ok(());
        };
        if entry.hooks_applied {
            return Ok(());
        }

        for hook in &hooks {
            hook.post_process_merged_definition(&mut entry.definition, name)?;
        }
        entry.hooks_applied = true;
        Ok(())
    }

    fn create_component(&mut self, name: &str) -> Result<ComponentInstance, DependencyError> {
        let definition = self.cached_merged_definition(name)?;
        if definition.is_abstract {
            return Err(DependencyError::invalid_definition(name, "抽象定义不能实例化"));
        }

        for dependency in &definition.depends_on {
            self.get_component(dependency)?;
        }

        self.apply_merged_definition_hooks(name)?;
        let definition = self.cached_merged_definition(name)?;
        let supplier = definition
            .supplier()
            .cloned()
            .ok_or_else(|| DependencyError::invalid_definition(name, "缺少组件提供函数"))?;

        debug!("创建组件: {} ({})", name, definition.type_name);
        let mut instance = supplier(&definition, self)?;

        let hooks = self.hooks.clone();
        let ctx = HookContext::new(self.hooks.len(), Some(&definition));
        for hook in &hooks {
            instance = hook.hook().before_initialization(instance, name, &ctx)?;
        }
        for hook in &hooks {
            instance = hook.hook().after_initialization(instance, name, &ctx)?;
        }
        Ok(instance)
    }

    /// 重置组件定义相关的缓存，并递归重置子定义
    ///
    /// 父定义链可能存在循环，每个名称只重置一次。
    fn reset_definition(&mut self, name: &str) {
        let mut visited: HashSet<String> = HashSet::new();
        let mut pending = vec![name.to_string()];

        while let Some(current) = pending.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            self.merged_definitions.remove(&current);
            if self.singletons.shift_remove(&current).is_some() {
                debug!("移除已创建的单例: {}", current);
            }
            for hook in &self.hooks {
                if let Some(merged) = hook.merged_hook() {
                    merged.reset_definition(&current);
                }
            }

            pending.extend(
                self.definitions
                    .iter()
                    .filter(|(child, definition)| {
                        definition.parent.as_deref() == Some(current.as_str()) && !visited.contains(*child)
                    })
                    .map(|(child, _)| child.clone()),
            );
        }
    }

    fn matches_marker(capabilities: Capabilities, tier: OrderTier, marker: TypeMarker) -> bool {
        match marker {
            TypeMarker::PriorityOrdered => tier == OrderTier::Priority,
            TypeMarker::Ordered => matches!(tier, OrderTier::Priority | OrderTier::Ordered),
            TypeMarker::Capability(required) => capabilities.contains(required),
        }
    }
}

impl Default for DefaultComponentFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DefaultComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultComponentFactory")
            .field("definitions", &self.definitions.keys().collect::<Vec<_>>())
            .field("singletons", &self.singletons.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks)
            .field("allow_definition_overriding", &self.allow_definition_overriding)
            .finish()
    }
}

impl DefinitionRegistry for DefaultComponentFactory {
    fn register_definition(
        &mut self,
        name: &str,
        definition: ComponentDefinition,
    ) -> Result<(), DependencyError> {
        if name.is_empty() {
            return Err(DependencyError::invalid_definition(name, "组件名称不能为空"));
        }
        if !definition.has_supplier() && definition.parent.is_none() && !definition.is_abstract {
            return Err(DependencyError::invalid_definition(
                name,
                "组件定义必须提供组件提供函数或父定义",
            ));
        }

        if self.definitions.contains_key(name) {
            if !self.allow_definition_overriding {
                return Err(DependencyError::DefinitionOverrideNotAllowed {
                    name: name.to_string(),
                });
            }
            info!("覆盖组件定义: {} ({})", name, definition.type_name);
            self.definitions.insert(name.to_string(), definition);
            self.reset_definition(name);
        } else {
            debug!("注册组件定义: {} ({})", name, definition.type_name);
            self.definitions.insert(name.to_string(), definition);
        }
        Ok(())
    }

    fn remove_definition(&mut self, name: &str) -> Result<ComponentDefinition, DependencyError> {
        let definition = self
            .definitions
            .shift_remove(name)
            .ok_or_else(|| DependencyError::not_registered(name))?;
        debug!("移除组件定义: {}", name);
        self.reset_definition(name);
        Ok(definition)
    }

    fn get_definition(&self, name: &str) -> Option<&ComponentDefinition> {
        self.definitions.get(name)
    }

    fn get_definition_mut(&mut self, name: &str) -> Option<&mut ComponentDefinition> {
        self.definitions.get_mut(name)
    }

    fn contains_definition(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    fn definition_names(&self) -> Vec<String> {
        self.definitions.keys().cloned().collect()
    }

    fn definition_count(&self) -> usize {
        self.definitions.len()
    }
}

impl ComponentProvider for DefaultComponentFactory {
    fn get_component(&mut self, name: &str) -> Result<ComponentInstance, DependencyError> {
        if let Some(instance) = self.singletons.get(name) {
            return Ok(instance.clone());
        }

        if self.in_creation.iter().any(|creating| creating == name) {
            return Err(DependencyError::CircularDependency {
                dependency_chain: format!("{} -> {}", self.in_creation.join(" -> "), name),
            });
        }

        self.in_creation.push(name.to_string());
        let created = self.create_component(name);
        self.in_creation.pop();
        let instance = created?;

        if self.merged_definition(name)?.lifetime.is_singleton() {
            self.singletons.insert(name.to_string(), instance.clone());
        }
        Ok(instance)
    }

    fn contains_component(&self, name: &str) -> bool {
        self.definitions.contains_key(name) || self.singletons.contains_key(name)
    }
}

impl ConfigurableComponentFactory for DefaultComponentFactory {
    /// 默认工厂从不为了类型判断而实例化组件，`allow_eager_init` 只作为契约的一部分被接受
    fn names_for_capability(
        &self,
        capability: Capabilities,
        include_non_singletons: bool,
        _allow_eager_init: bool,
    ) -> Vec<String> {
        let mut names = Vec::new();

        for name in self.definitions.keys() {
            let definition = match self.resolve_merged(name, 0) {
                Ok(definition) => definition,
                Err(e) => {
                    warn!("跳过无法合并的组件定义 {}: {}", name, e);
                    continue;
                }
            };
            if definition.is_abstract {
                continue;
            }
            if !include_non_singletons && !definition.lifetime.is_singleton() {
                continue;
            }
            if definition.capabilities.contains(capability) {
                names.push(name.clone());
            }
        }

        for (name, instance) in &self.singletons {
            if !self.definitions.contains_key(name) && instance.capabilities().contains(capability) {
                names.push(name.clone());
            }
        }
        names
    }

    fn is_type_match(&self, name: &str, marker: TypeMarker) -> Result<bool, DependencyError> {
        if self.definitions.contains_key(name) {
            let definition = self.resolve_merged(name, 0)?;
            return Ok(Self::matches_marker(definition.capabilities, definition.tier, marker));
        }
        if let Some(instance) = self.singletons.get(name) {
            return Ok(Self::matches_marker(instance.capabilities(), instance.tier(), marker));
        }
        Err(DependencyError::not_registered(name))
    }

    fn add_lifecycle_hook(&mut self, hook: RegisteredHook) {
        if let Some(position) = self.hooks.iter().position(|h| h.name() == hook.name()) {
            debug!("生命周期钩子 {} 已存在，移动到链尾", hook.name());
            self.hooks.remove(position);
        } else {
            debug!("追加生命周期钩子: {}", hook.name());
        }
        self.hooks.push(hook);
    }

    fn lifecycle_hook_count(&self) -> usize {
        self.hooks.len()
    }

    fn lifecycle_hook_names(&self) -> Vec<String> {
        self.hooks.iter().map(|hook| hook.name().to_string()).collect()
    }

    fn clear_metadata_cache(&mut self) {
        let singletons = &self.singletons;
        let before = self.merged_definitions.len();
        self.merged_definitions
            .retain(|name, _| singletons.contains_key(name));
        debug!(
            "清理合并定义缓存: {} -> {}",
            before,
            self.merged_definitions.len()
        );
    }

    fn dependency_comparator(&self) -> Option<Arc<dyn OrderComparator>> {
        self.dependency_comparator.clone()
    }

    fn as_registry_mut(&mut self) -> Option<&mut dyn DefinitionRegistry> {
        Some(self)
    }

    fn register_singleton(
        &mut self,
        name: &str,
        instance: ComponentInstance,
    ) -> Result<(), DependencyError> {
        if self.singletons.contains_key(name) {
            return Err(DependencyError::invalid_definition(name, "单例已存在"));
        }
        debug!("注册单例: {} ({})", name, instance.type_info().full_name());
        self.singletons.insert(name.to_string(), instance);
        Ok(())
    }
}
