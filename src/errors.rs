//! Inspecting error chains.
//!
//! Both helpers walk `err` and its [`Error::source`] chain. Assertions
//! written with them get dedicated explanations:
//!
//! ```text
//! assert(&t, errors::is(&err, &ParseError::Empty));
//! // Error: ParseError::Empty is not in the error tree of err
//! ```

use std::error::Error;
use std::iter;

fn chain<'a>(err: &'a (dyn Error + 'static)) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    iter::successors(Some(err), |&err| err.source())
}

/// Whether an error equal to `target` appears in the chain.
pub fn is<T>(err: &(dyn Error + 'static), target: &T) -> bool
where
    T: Error + PartialEq + 'static,
{
    chain(err).any(|err| err.downcast_ref::<T>() == Some(target))
}

/// Whether an error of type `T` appears in the chain.
pub fn is_type<T: Error + 'static>(err: &(dyn Error + 'static)) -> bool {
    chain(err).any(|err| err.is::<T>())
}
