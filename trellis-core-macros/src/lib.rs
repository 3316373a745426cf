mod attribute_helpers;
mod component_impl;

use proc_macro::TokenStream;
use proc_macro_error::proc_macro_error;

/// Component 派生宏
///
/// 为结构体实现 `trellis_core::Component`，为每个 `#[inject]` 字段生成一个注入点。
/// 被标记的字段必须声明为 `Autowired<T>`，`T` 可以是具体类型或 `dyn Trait`。
///
/// 用法：
/// ```ignore
/// #[derive(Component)]
/// #[component("userService")]        // 可选：指定 bean 名称（简写形式）
/// // 或
/// #[component(name = "userService")] // 可选：指定 bean 名称（完整形式）
/// #[lifecycle("prototype")]          // 可选：singleton（默认）/ prototype / session / request
/// struct UserService {
///     #[inject("config")]            // 按名称注入
///     config: Autowired<AppConfig>,
///
///     #[inject]                      // 按类型注入，找不到时按类型名查找
///     store: Autowired<dyn Datastore>,
///
///     cache_size: usize,             // 未标记的字段不参与装配
/// }
/// ```
#[proc_macro_derive(Component, attributes(component, lifecycle, inject))]
#[proc_macro_error]
pub fn derive_component(input: TokenStream) -> TokenStream {
    component_impl::derive_component_impl(input)
}
