use proc_macro::TokenStream;
use quote::quote;
use syn::{
    DeriveInput, Ident, LitStr, Token,
    parse::{Parse, ParseStream},
    parse_macro_input,
};

/// Arguments of `#[notification(...)]`.
#[derive(Default)]
struct NotificationArgs {
    strategy: Option<Ident>,
}

impl Parse for NotificationArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = NotificationArgs::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "strategy" => {
                    let lit: LitStr = input.parse()?;
                    let variant = strategy_variant(&lit.value()).ok_or_else(|| {
                        syn::Error::new(
                            lit.span(),
                            "unknown strategy, expected one of: \
                             sequential, fail_fast, parallel, fire_and_forget",
                        )
                    })?;
                    args.strategy = Some(Ident::new(variant, lit.span()));
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {}", other),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

fn strategy_variant(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().replace('-', "_").as_str() {
        "sequential" => Some("Sequential"),
        "fail_fast" | "failfast" => Some("FailFast"),
        "parallel" => Some("Parallel"),
        "fire_and_forget" | "fireandforget" => Some("FireAndForget"),
        _ => None,
    }
}

pub fn derive_notification_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut args = NotificationArgs::default();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("notification")) {
        match attr.parse_args::<NotificationArgs>() {
            Ok(parsed) => {
                if parsed.strategy.is_some() {
                    args.strategy = parsed.strategy;
                }
            }
            Err(e) => return e.to_compile_error().into(),
        }
    }

    let strategy = match args.strategy {
        Some(variant) => quote! {
            const STRATEGY: ::core::option::Option<::courier::FanOut> =
                ::core::option::Option::Some(::courier::FanOut::#variant);
        },
        None => quote! {},
    };

    let expanded = quote! {
        impl #impl_generics ::courier::Notification for #name #ty_generics #where_clause {
            #strategy
        }
    };

    TokenStream::from(expanded)
}
