use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ContainerError, ContainerResult};

/// 可注入字段
///
/// 在 `#[derive(Component)]` 的结构体中配合 `#[inject]` 使用。`populate` 之前为空，
/// 装配成功后持有依赖的共享实例；未能装配时保持为空，使用时由 `require` 报错。
///
/// # 示例
///
/// ```ignore
/// #[derive(Component)]
/// struct UserService {
///     #[inject("config")]
///     config: Autowired<AppConfig>,
///
///     #[inject]
///     store: Autowired<dyn Datastore>,
/// }
/// ```
pub struct Autowired<D: ?Sized> {
    slot: RwLock<Option<Arc<D>>>,
    pinned: bool,
}

impl<D: ?Sized> Autowired<D> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
            pinned: false,
        }
    }

    /// 由所有者固定的值，`populate` 不会覆盖它
    pub fn pinned(dependency: Arc<D>) -> Self {
        Self {
            slot: RwLock::new(Some(dependency)),
            pinned: true,
        }
    }

    pub fn get(&self) -> Option<Arc<D>> {
        self.slot.read().clone()
    }

    /// 获取依赖，未装配时返回 `DependencyNotWired`
    pub fn require(&self) -> ContainerResult<Arc<D>> {
        self.get()
            .ok_or(ContainerError::DependencyNotWired(type_name::<D>()))
    }

    pub fn is_wired(&self) -> bool {
        self.slot.read().is_some()
    }

    pub fn is_settable(&self) -> bool {
        !self.pinned
    }

    pub(crate) fn set(&self, dependency: Arc<D>) {
        *self.slot.write() = Some(dependency);
    }

    /// 释放装配得到的依赖，固定值保留
    pub(crate) fn reset(&self) {
        if !self.pinned {
            self.slot.write().take();
        }
    }
}

impl<D: ?Sized> Default for Autowired<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: ?Sized> Clone for Autowired<D> {
    fn clone(&self) -> Self {
        Self {
            slot: RwLock::new(self.get()),
            pinned: self.pinned,
        }
    }
}

impl<D: ?Sized> fmt::Debug for Autowired<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autowired")
            .field("type_name", &type_name::<D>())
            .field("wired", &self.is_wired())
            .field("pinned", &self.pinned)
            .finish()
    }
}
