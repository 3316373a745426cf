use std::any::TypeId;
use std::collections::HashMap;

use crate::bean::Bean;
use crate::error::{ContainerError, ContainerResult};

/// Bean 注册表
///
/// 名称到 Bean 的映射，外加按具体类型建立的二级索引。
/// 注册表本身不加锁，由 `Container` 负责并发控制。
#[derive(Debug, Default)]
pub(crate) struct BeanRegistry {
    beans: HashMap<String, Bean>,
    by_type: HashMap<TypeId, Vec<String>>,
}

impl BeanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 Bean，同名 Bean 已存在时返回错误且不修改任何状态
    pub fn provide(&mut self, bean: Bean) -> ContainerResult<()> {
        if self.beans.contains_key(bean.name()) {
            return Err(ContainerError::BeanAlreadyExists(bean.name().to_string()));
        }

        self.by_type
            .entry(bean.type_key().id())
            .or_default()
            .push(bean.name().to_string());
        self.beans.insert(bean.name().to_string(), bean);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Bean> {
        self.beans.get(name)
    }

    /// 按类型查找
    ///
    /// 先查具体类型索引，再扫描声明了对应能力的 Bean。
    /// 多个 Bean 满足条件时返回哪一个是任意的，调用方不应依赖。
    pub fn get_by_type(&self, type_id: TypeId) -> Option<&Bean> {
        self.by_type
            .get(&type_id)
            .and_then(|names| names.iter().find_map(|name| self.beans.get(name)))
            .or_else(|| self.beans.values().find(|bean| bean.satisfies(type_id)))
    }

    /// 所有等于或可以被看作该类型的 Bean，无序
    pub fn beans_by_type(&self, type_id: TypeId) -> Vec<&Bean> {
        self.beans
            .values()
            .filter(|bean| bean.satisfies(type_id))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.beans.keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.beans.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.beans.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bean> {
        self.beans.values()
    }

    /// 清空注册表，先释放已装配的字段，相互注入的 Bean 才能被回收
    pub fn clear(&mut self) {
        self.unwire_all();
        self.beans.clear();
        self.by_type.clear();
    }

    fn unwire_all(&self) {
        for bean in self.beans.values() {
            if let Some(wiring) = bean.wiring() {
                wiring.unwire(bean);
            }
        }
    }
}

impl Drop for BeanRegistry {
    fn drop(&mut self) {
        self.unwire_all();
    }
}
