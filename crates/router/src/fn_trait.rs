use std::future::Future;

/// An async function called with its arguments packed in a tuple.
///
/// Implemented for every `Fn(A, B, ..) -> impl Future + Send` of up to eight arguments, which
/// lets [`handler_fn`](crate::handler_fn) extract the whole tuple at once and spread it.
pub trait FnTrait<Args>: Send + Sync {
    type Output;
    fn call(&self, args: Args) -> impl Future<Output = Self::Output> + Send;
}

macro_rules! impl_fn_trait {
    ($($arg:ident),*) => {
        impl<Func, Fut, $($arg,)*> FnTrait<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Fut + Send + Sync,
            Fut: Future + Send,
        {
            type Output = Fut::Output;

            #[inline]
            #[allow(non_snake_case, reason = "tuple fields are bound to their type parameter names")]
            fn call(&self, ($($arg,)*): ($($arg,)*)) -> impl Future<Output = Self::Output> + Send {
                (self)($($arg),*)
            }
        }
    };
}

impl_fn_trait!();
impl_fn_trait!(A1);
impl_fn_trait!(A1, A2);
impl_fn_trait!(A1, A2, A3);
impl_fn_trait!(A1, A2, A3, A4);
impl_fn_trait!(A1, A2, A3, A4, A5);
impl_fn_trait!(A1, A2, A3, A4, A5, A6);
impl_fn_trait!(A1, A2, A3, A4, A5, A6, A7);
impl_fn_trait!(A1, A2, A3, A4, A5, A6, A7, A8);
