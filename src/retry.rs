//! Bounded-attempt execution.
//!
//! Both helpers re-run the whole operation from the top on failure; nothing
//! done by a failed attempt is rolled back.

use std::future::Future;

use crate::error::{Result, describe};

/// Runs `op` up to `max_tries` times, logging and swallowing the final error.
///
/// Returns `None` if `max_tries` is zero or every attempt failed.
pub async fn attempt<T, F, Fut>(max_tries: u32, mut op: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if max_tries < 1 {
        return None;
    }

    let mut tries = 0;
    loop {
        match op().await {
            Ok(value) => return Some(value),
            Err(e) => {
                tries += 1;
                if tries >= max_tries {
                    log::error!("{}", describe(&e, None, false));
                    return None;
                }
                log::debug!("Attempt {tries}/{max_tries} failed: {e}");
            }
        }
    }
}

/// Runs `op` up to `max_tries` times, returning the last error once every
/// attempt has failed.
///
/// Returns `Ok(None)` without running `op` if `max_tries` is zero.
///
/// # Errors
///
/// Returns the error of the final attempt, unchanged.
pub async fn attempt_or_raise<T, F, Fut>(max_tries: u32, mut op: F) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if max_tries < 1 {
        return Ok(None);
    }

    let mut tries = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(Some(value)),
            Err(e) => {
                tries += 1;
                if tries >= max_tries {
                    return Err(e);
                }
                log::debug!("Attempt {tries}/{max_tries} failed: {e}");
            }
        }
    }
}
