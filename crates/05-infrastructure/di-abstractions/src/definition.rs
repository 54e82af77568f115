//! 组件定义
//!
//! 描述如何构造一个组件：身份、角色、生命周期、声明的扩展能力以及属性元数据。

use crate::extension::{Capabilities, ComponentInstance, OrderTier};
use crate::factory::ComponentProvider;
use indexmap::IndexMap;
use infrastructure_common::{DependencyError, Lifetime, Role, TypeInfo};
use std::fmt;
use std::sync::Arc;

/// 组件提供函数
///
/// 接收合并后的组件定义和组件提供者（用于解析依赖），返回物化后的实例。
pub type ComponentSupplier = Arc<
    dyn Fn(&ComponentDefinition, &mut dyn ComponentProvider) -> Result<ComponentInstance, DependencyError>
        + Send
        + Sync,
>;

/// 组件定义
#[derive(Clone, Default)]
pub struct ComponentDefinition {
    /// 声明的组件类型名称
    pub type_name: String,
    /// 组件角色
    pub role: Role,
    /// 组件生命周期
    pub lifetime: Lifetime,
    /// 是否延迟初始化
    pub lazy_init: bool,
    /// 是否为抽象定义（只作为父定义使用，不能实例化）
    pub is_abstract: bool,
    /// 声明的扩展能力，用于在不实例化的情况下做类型匹配
    pub capabilities: Capabilities,
    /// 声明的排序层级
    pub tier: OrderTier,
    /// 父定义名称
    pub parent: Option<String>,
    /// 创建前必须先创建的组件
    pub depends_on: Vec<String>,
    /// 组件描述
    pub description: Option<String>,
    /// 属性元数据
    pub properties: IndexMap<String, serde_json::Value>,
    supplier: Option<ComponentSupplier>,
}

impl ComponentDefinition {
    /// 创建新的组件定义
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// 以具体类型的名称创建组件定义
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeInfo::of::<T>().full_name())
    }

    /// 创建只用于继承的子定义
    pub fn child_of(parent: impl Into<String>) -> Self {
        Self {
            parent: Some(parent.into()),
            ..Self::default()
        }
    }

    /// 设置组件提供函数
    pub fn with_supplier<F>(mut self, supplier: F) -> Self
    where
        F: Fn(&ComponentDefinition, &mut dyn ComponentProvider) -> Result<ComponentInstance, DependencyError>
            + Send
            + Sync
            + 'static,
    {
        self.supplier = Some(Arc::new(supplier));
        self
    }

    /// 设置角色
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// 设置生命周期
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// 设置延迟初始化
    pub fn lazy(mut self) -> Self {
        self.lazy_init = true;
        self
    }

    /// 标记为抽象定义
    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// 声明扩展能力，隐含的能力会自动补全
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities.normalized();
        self
    }

    /// 声明排序层级
    pub fn with_tier(mut self, tier: OrderTier) -> Self {
        self.tier = tier;
        self
    }

    /// 添加依赖
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    /// 设置描述
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 添加属性
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// 获取属性
    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    /// 获取字符串属性
    pub fn string_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(serde_json::Value::as_str)
    }

    /// 组件提供函数
    pub fn supplier(&self) -> Option<&ComponentSupplier> {
        self.supplier.as_ref()
    }

    /// 是否设置了组件提供函数
    pub fn has_supplier(&self) -> bool {
        self.supplier.is_some()
    }

    /// 将当前定义叠加到已合并的父定义之上
    ///
    /// 子定义没有提供函数时继承父定义的类型、提供函数、能力和排序层级；
    /// 属性取并集，同名属性以子定义为准。
    pub fn merged_over(&self, parent: &ComponentDefinition) -> ComponentDefinition {
        let mut merged = parent.clone();
        if self.supplier.is_some() {
            merged.type_name = self.type_name.clone();
            merged.supplier = self.supplier.clone();
            merged.capabilities = self.capabilities;
            merged.tier = self.tier;
        } else if !self.type_name.is_empty() {
            merged.type_name = self.type_name.clone();
        }
        merged.role = self.role;
        merged.lifetime = self.lifetime;
        merged.lazy_init = self.lazy_init;
        merged.is_abstract = self.is_abstract;
        merged.parent = None;
        for dependency in &self.depends_on {
            if !merged.depends_on.contains(dependency) {
                merged.depends_on.push(dependency.clone());
            }
        }
        if self.description.is_some() {
            merged.description = self.description.clone();
        }
        for (key, value) in &self.properties {
            merged.properties.insert(key.clone(), value.clone());
        }
        merged
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("type_name", &self.type_name)
            .field("role", &self.role)
            .field("lifetime", &self.lifetime)
            .field("lazy_init", &self.lazy_init)
            .field("is_abstract", &self.is_abstract)
            .field("capabilities", &self.capabilities)
            .field("tier", &self.tier)
            .field("parent", &self.parent)
            .field("depends_on", &self.depends_on)
            .field("properties", &self.properties)
            .field("supplier", &self.supplier.as_ref().map(|_| "<function>"))
            .finish()
    }
}
