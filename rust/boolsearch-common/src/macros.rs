/// Unwraps a `Result` inside a function returning `Option<Result<T, E>>`.
///
/// `Ok(t)` yields `t`; `Err(e)` makes the enclosing function return
/// `Some(Err(e))`. Used by fallible iterators such as the posting list
/// decoder, whose `next()` must surface corruption as an item instead of
/// silently ending the iteration.
#[macro_export]
macro_rules! try_or_ret_some_err {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => {
                return Some(Err(err));
            }
        }
    };
}
