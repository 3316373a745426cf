use proc_macro::TokenStream;
use proc_macro_error::abort;
use quote::quote;
use syn::spanned::Spanned;
use syn::{parse_macro_input, Data, DeriveInput, Fields, GenericArgument, PathArguments, Type};

use crate::attribute_helpers::{get_bean_name, get_inject_qualifier, get_lifecycle};

pub(crate) fn derive_component_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => abort!(
                name.span(),
                "Component can only be derived for structs with named fields"
            ),
        },
        _ => abort!(name.span(), "Component can only be derived for structs"),
    };

    // 未指定名称时使用 Component 的默认实现（完整类型名）
    let bean_name_fn = get_bean_name(&input.attrs).map(|bean_name| {
        quote! {
            fn bean_name() -> &'static str {
                #bean_name
            }
        }
    });

    let lifecycle = get_lifecycle(&input.attrs);

    // 只为带 #[inject] 的字段生成注入点
    let injection_points = fields.iter().filter_map(|field| {
        let qualifier = get_inject_qualifier(&field.attrs)?;
        let ident = field.ident.as_ref()?;
        let field_name = ident.to_string();
        let dependency = extract_autowired_type(&field.ty).unwrap_or_else(|| {
            abort!(
                field.ty.span(),
                "#[inject] field '{}' must be declared as Autowired<T>", field_name;
                help = "wrap the dependency type, e.g. Autowired<MyService> or Autowired<dyn MyTrait>"
            )
        });

        let qualifier = match qualifier {
            Some(q) => quote! { ::core::option::Option::Some(#q) },
            None => quote! { ::core::option::Option::None },
        };

        Some(quote! {
            ::trellis_core::InjectionPoint::<Self>::new::<#dependency>(
                #field_name,
                #qualifier,
                |owner| &owner.#ident,
            )
        })
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::trellis_core::Component for #name #ty_generics #where_clause {
            #bean_name_fn

            fn lifecycle() -> ::trellis_core::Lifecycle {
                #lifecycle
            }

            fn injection_points() -> ::std::vec::Vec<::trellis_core::InjectionPoint<Self>> {
                ::std::vec![#(#injection_points),*]
            }
        }
    };

    TokenStream::from(expanded)
}

/// 提取 `Autowired<T>` 中的 `T`
fn extract_autowired_type(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Autowired" {
        return None;
    }

    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}
