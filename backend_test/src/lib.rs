use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one and inject
/// dependencies.
///
/// Each test gets its own Rocket instance over a fresh in-memory poll store
/// and its own runtime. Injectable dependencies are
/// [`rocket::local::asynchronous::Client`] and, when the attribute names a
/// role (`#[backend_test(admin)]` or `#[backend_test(voter)]`), a
/// [`rocket::http::Cookie`] carrying an auth token for that role.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);
    let role = parse_macro_input!(args as Option<Ident>);

    // Extract type information and reject invalid function signatures.
    let (test_args, wants_cookie) = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Mint an auth cookie for the requested role.
    let user_type = match role.as_ref().map(Ident::to_string).as_deref() {
        Some("admin") => Some(quote! { crate::model::api::auth::Admin }),
        Some("voter") => Some(quote! { crate::model::api::auth::Voter }),
        Some(_) => {
            return syn::Error::new(role.span(), "Expected `admin` or `voter`")
                .into_compile_error()
                .into();
        }
        None => None,
    };
    let maybe_cookie = match (user_type, wants_cookie) {
        (Some(user_type), _) => quote! {
            #[allow(unused_variables)]
            let auth_cookie = {
                let config = rocket_client
                    .rocket()
                    .state::<crate::config::Config>()
                    .unwrap();
                crate::model::api::auth::AuthToken::<#user_type>::example().into_cookie(config)
            };
        },
        (None, true) => {
            return syn::Error::new(
                item_fn.sig.span(),
                "A `Cookie` can only be injected with `#[backend_test(admin)]` or `#[backend_test(voter)]`",
            )
            .into_compile_error()
            .into();
        }
        (None, false) => TokenStream2::new(),
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            log4rs_test_utils::test_logging::init_logging_once_for(["tally_backend"], None, None);

            /// The test itself.
            #item_fn

            let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            // Panics inside `block_on` propagate out of the test as usual.
            runtime.block_on(async {
                let rocket_client = rocket::local::asynchronous::Client::tracked(
                    crate::rocket_for_test(crate::store::PollStore::in_memory()),
                )
                .await
                .unwrap();

                #maybe_cookie

                #new_name(#(#test_args),*).await;
            });
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<(Vec<TokenStream2>, bool), syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_cookie = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(_) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    let last = type_path.path.segments.last().map(|s| &s.ident);
                    if let Some(type_ident) = last {
                        if type_ident == "Client" {
                            if has_client {
                                return Err(syn::Error::new(
                                    input.span(),
                                    "Test cannot accept more than one `rocket::local::asynchronous::Client`",
                                ));
                            }
                            has_client = true;
                            args.push(quote! { rocket_client });
                            continue;
                        } else if type_ident == "Cookie" {
                            if has_cookie {
                                return Err(syn::Error::new(
                                    input.span(),
                                    "Test cannot accept more than one `rocket::http::Cookie`",
                                ));
                            }
                            has_cookie = true;
                            args.push(quote! { auth_cookie.clone() });
                            continue;
                        }
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client` or `cookie_ident: Cookie<'static>`",
        ));
    }

    Ok((args, has_cookie))
}
