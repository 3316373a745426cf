use proc_macro2::TokenStream as TokenStream2;
use proc_macro_error::abort;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Attribute, Expr, Lit, LitStr, Meta};

/// 从 `#[component("name")]` 或 `#[component(name = "name")]` 中提取 bean 名称
pub(crate) fn get_bean_name(attrs: &[Attribute]) -> Option<String> {
    for attr in attrs {
        if !attr.path().is_ident("component") {
            continue;
        }

        if let Ok(name_lit) = attr.parse_args::<LitStr>() {
            return Some(name_lit.value());
        }

        if let Ok(Meta::NameValue(nv)) = attr.parse_args::<Meta>() {
            if nv.path.is_ident("name") {
                if let Expr::Lit(expr_lit) = &nv.value {
                    if let Lit::Str(name_lit) = &expr_lit.lit {
                        return Some(name_lit.value());
                    }
                }
            }
        }

        abort!(
            attr.span(),
            "expected #[component(\"name\")] or #[component(name = \"name\")]"
        );
    }
    None
}

/// 从 `#[lifecycle("...")]` 中提取生命周期，默认单例
pub(crate) fn get_lifecycle(attrs: &[Attribute]) -> TokenStream2 {
    for attr in attrs {
        if !attr.path().is_ident("lifecycle") {
            continue;
        }

        let lit = match attr.parse_args::<LitStr>() {
            Ok(lit) => lit,
            Err(_) => abort!(attr.span(), "expected #[lifecycle(\"singleton|prototype|session|request\")]"),
        };

        return match lit.value().trim().to_lowercase().as_str() {
            "singleton" => quote! { ::trellis_core::Lifecycle::Singleton },
            "prototype" => quote! { ::trellis_core::Lifecycle::Prototype },
            "session" => quote! { ::trellis_core::Lifecycle::Session },
            "request" => quote! { ::trellis_core::Lifecycle::Request },
            other => abort!(
                lit.span(),
                "unknown lifecycle '{}'", other;
                help = "use one of: singleton, prototype, session, request"
            ),
        };
    }
    quote! { ::trellis_core::Lifecycle::Singleton }
}

/// 注入标记
///
/// 返回 `None` 表示字段没有 `#[inject]`；`Some(None)` 表示没有限定名；
/// `#[inject("")]` 也视为没有限定名。
pub(crate) fn get_inject_qualifier(attrs: &[Attribute]) -> Option<Option<String>> {
    let attr = attrs.iter().find(|attr| attr.path().is_ident("inject"))?;

    match &attr.meta {
        Meta::Path(_) => Some(None),
        Meta::List(_) => match attr.parse_args::<LitStr>() {
            Ok(lit) if lit.value().is_empty() => Some(None),
            Ok(lit) => Some(Some(lit.value())),
            Err(_) => abort!(attr.span(), "expected #[inject] or #[inject(\"bean_name\")]"),
        },
        Meta::NameValue(_) => abort!(attr.span(), "expected #[inject] or #[inject(\"bean_name\")]"),
    }
}
