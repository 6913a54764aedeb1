use proc_macro::TokenStream;
use quote::quote;
use syn::{
    DeriveInput, Ident, LitInt, LitStr, Token, Type,
    parse::{Parse, ParseStream},
    parse_macro_input,
};

/// Arguments of `#[request(...)]`.
#[derive(Default)]
struct RequestArgs {
    response: Option<Type>,
    auditable: bool,
    authorizable: bool,
    cacheable: bool,
    resource: Option<LitStr>,
    resource_id: Option<Ident>,
    cache_key: Option<Ident>,
    cache_expiration_secs: Option<u64>,
}

impl RequestArgs {
    fn merge(&mut self, other: RequestArgs) {
        if other.response.is_some() {
            self.response = other.response;
        }
        self.auditable |= other.auditable;
        self.authorizable |= other.authorizable;
        self.cacheable |= other.cacheable;
        if other.resource.is_some() {
            self.resource = other.resource;
        }
        if other.resource_id.is_some() {
            self.resource_id = other.resource_id;
        }
        if other.cache_key.is_some() {
            self.cache_key = other.cache_key;
        }
        if other.cache_expiration_secs.is_some() {
            self.cache_expiration_secs = other.cache_expiration_secs;
        }
    }
}

impl Parse for RequestArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = RequestArgs::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;

            match ident.to_string().as_str() {
                "auditable" => args.auditable = true,
                "authorizable" => args.authorizable = true,
                "cacheable" => args.cacheable = true,
                "response" => {
                    input.parse::<Token![=]>()?;
                    args.response = Some(input.parse()?);
                }
                "resource" => {
                    input.parse::<Token![=]>()?;
                    args.resource = Some(input.parse()?);
                }
                "resource_id" => {
                    input.parse::<Token![=]>()?;
                    args.resource_id = Some(input.parse()?);
                }
                "cache_key" => {
                    input.parse::<Token![=]>()?;
                    args.cache_key = Some(input.parse()?);
                }
                "cache_expiration_secs" => {
                    input.parse::<Token![=]>()?;
                    let lit: LitInt = input.parse()?;
                    args.cache_expiration_secs = Some(lit.base10_parse()?);
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

pub fn derive_request_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut args = RequestArgs::default();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("request")) {
        match attr.parse_args::<RequestArgs>() {
            Ok(parsed) => args.merge(parsed),
            Err(e) => return e.to_compile_error().into(),
        }
    }

    let response = match &args.response {
        Some(ty) => quote! { #ty },
        None => quote! { () },
    };

    let mut flags = Vec::new();
    if args.auditable {
        flags.push(quote! { ::courier::Capabilities::AUDITABLE });
    }
    if args.authorizable {
        flags.push(quote! { ::courier::Capabilities::AUTHORIZABLE });
    }
    if args.cacheable {
        flags.push(quote! { ::courier::Capabilities::CACHEABLE });
    }
    let capabilities = quote! {
        ::courier::Capabilities::empty()#(.union(#flags))*
    };

    let resource = if args.resource.is_some() || args.resource_id.is_some() {
        let base = match &args.resource {
            Some(kind) => quote! { ::courier::Resource::new(#kind) },
            None => quote! { ::courier::Resource::of::<Self>() },
        };
        let with_id = args.resource_id.as_ref().map(|field| {
            quote! { .with_id(::std::string::ToString::to_string(&self.#field)) }
        });
        quote! {
            fn resource(&self) -> ::courier::Resource {
                #base #with_id
            }
        }
    } else {
        quote! {}
    };

    let cache_key = args.cache_key.as_ref().map(|field| {
        quote! {
            fn cache_key(&self) -> ::core::option::Option<::std::string::String> {
                ::core::option::Option::Some(::std::string::ToString::to_string(&self.#field))
            }
        }
    });

    let cache_expiration = args.cache_expiration_secs.map(|secs| {
        quote! {
            fn cache_expiration(&self) -> ::core::option::Option<::std::time::Duration> {
                ::core::option::Option::Some(::std::time::Duration::from_secs(#secs))
            }
        }
    });

    let expanded = quote! {
        impl #impl_generics ::courier::Request for #name #ty_generics #where_clause {
            type Response = #response;

            const CAPABILITIES: ::courier::Capabilities = #capabilities;

            #resource
            #cache_key
            #cache_expiration
        }
    };

    TokenStream::from(expanded)
}
