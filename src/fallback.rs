use std::fmt;
use std::future::Future;

/// Every attempt in a fallback chain failed.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: usize,
    pub last: Option<E>,
}

impl<E: fmt::Display> fmt::Display for Exhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last {
            Some(last) => write!(
                f,
                "all {} attempts failed; last failure: {last}",
                self.attempts
            ),
            None => f.write_str("no attempts were configured"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for Exhausted<E> {}

/// Runs `attempts` in order and returns the first success.
///
/// Each attempt is only started after the previous one failed; its error is
/// handed to `on_failure` and otherwise dropped. Only the last error is kept.
pub async fn first_success<I, F, Fut, T, E>(
    attempts: I,
    mut on_failure: impl FnMut(usize, &E),
) -> Result<T, Exhausted<E>>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut tried = 0;
    let mut last = None;

    for attempt in attempts {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                on_failure(tried, &err);
                tried += 1;
                last = Some(err);
            }
        }
    }

    Err(Exhausted {
        attempts: tried,
        last,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[tokio::test]
    async fn stops_at_first_success() {
        let started = RefCell::new(Vec::new());
        let outcomes = [Err("one"), Ok(2), Ok(3)];

        let result = first_success(
            outcomes.iter().enumerate().map(|(index, outcome)| {
                let started = &started;
                move || async move {
                    started.borrow_mut().push(index);
                    *outcome
                }
            }),
            |_, _| {},
        )
        .await;

        assert_eq!(result.ok(), Some(2));
        assert_eq!(*started.borrow(), vec![0, 1]);
    }

    #[tokio::test]
    async fn exhaustion_keeps_last_error() {
        let mut seen = Vec::new();
        let outcomes: [Result<u8, &str>; 3] = [Err("first"), Err("second"), Err("third")];

        let result = first_success(
            outcomes.iter().map(|outcome| move || async move { *outcome }),
            |index, err: &&str| seen.push((index, err.to_string())),
        )
        .await;

        let exhausted = result.expect_err("chain should be exhausted");
        assert_eq!(exhausted.attempts, 3);
        assert_eq!(exhausted.last, Some("third"));
        assert_eq!(
            exhausted.to_string(),
            "all 3 attempts failed; last failure: third"
        );
        assert_eq!(
            seen,
            vec![
                (0, "first".to_string()),
                (1, "second".to_string()),
                (2, "third".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn empty_chain_is_exhausted() {
        let attempts: Vec<fn() -> std::future::Ready<Result<(), String>>> = Vec::new();
        let exhausted = first_success(attempts, |_, _| {})
            .await
            .expect_err("nothing to try");
        assert_eq!(exhausted.attempts, 0);
        assert!(exhausted.last.is_none());
        assert_eq!(exhausted.to_string(), "no attempts were configured");
    }
}
