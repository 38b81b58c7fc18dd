pub mod admin;
pub mod auth;
pub mod flight;
pub mod history;
pub mod home;

use std::future::Future;

use crate::error::BookingError;

/// Runs `mutation` to completion and only then `reload`, so a list shown
/// after a write always comes from the server state that includes it. The
/// reload is skipped when the mutation fails.
pub async fn mutate_then_reload<T, U, M, R, RF>(mutation: M, reload: R) -> Result<U, BookingError>
where
    M: Future<Output = Result<T, BookingError>>,
    R: FnOnce() -> RF,
    RF: Future<Output = Result<U, BookingError>>,
{
    mutation.await?;
    reload().await
}

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}
