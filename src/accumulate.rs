//! Error-accumulating helpers on top of `std::result::Result`.
//!
//! `map`, `and_then`, `map_err` and `unwrap_or_else` already cover the usual
//! success/failure plumbing. What std does not provide is a collect that keeps
//! *every* failure instead of stopping at the first one, which the compiler
//! needs when it resolves a node's inputs and parameters.

/// Collect a sequence of results.
///
/// Returns all successes in order when every element is `Ok`. Otherwise returns
/// the concatenation of every element's error list, in order, and drops the
/// successes.
pub fn flatten_all<T, E, I>(results: I) -> Result<Vec<T>, Vec<E>>
where
    I: IntoIterator<Item = Result<T, Vec<E>>>,
{
    let mut values = Vec::new();
    let mut errors: Option<Vec<E>> = None;

    for item in results {
        match (item, errors.as_mut()) {
            (Ok(v), None) => values.push(v),
            (Ok(_), Some(_)) => {}
            (Err(e), Some(acc)) => acc.extend(e),
            (Err(e), None) => errors = Some(e),
        }
    }

    match errors {
        Some(e) => Err(e),
        None => Ok(values),
    }
}

/// Same as [`flatten_all`] for results that carry a single error each.
pub fn flatten_each<T, E, I>(results: I) -> Result<Vec<T>, Vec<E>>
where
    I: IntoIterator<Item = Result<T, E>>,
{
    flatten_all(results.into_iter().map(|r| r.map_err(|e| vec![e])))
}

/// Merge two independent outcomes, keeping the errors of both sides.
pub fn combine<A, B, E>(a: Result<A, Vec<E>>, b: Result<B, Vec<E>>) -> Result<(A, B), Vec<E>> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
        (Err(mut ea), Err(eb)) => {
            ea.extend(eb);
            Err(ea)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_all_collects_successes_in_order() {
        let items: Vec<Result<i32, Vec<&str>>> = vec![Ok(1), Ok(2), Ok(3)];
        assert_eq!(flatten_all(items), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn flatten_all_keeps_every_error_list() {
        let items: Vec<Result<i32, Vec<&str>>> =
            vec![Err(vec!["a", "b"]), Ok(1), Err(vec!["c"]), Ok(2), Err(vec![])];
        assert_eq!(flatten_all(items), Err(vec!["a", "b", "c"]));
    }

    #[test]
    fn flatten_all_failure_with_only_empty_error_lists_is_still_a_failure() {
        let items: Vec<Result<i32, Vec<&str>>> = vec![Ok(1), Err(vec![])];
        assert_eq!(flatten_all(items), Err(vec![]));
    }

    #[test]
    fn flatten_all_of_nothing_is_ok() {
        let items: Vec<Result<i32, Vec<&str>>> = Vec::new();
        assert_eq!(flatten_all(items), Ok(vec![]));
    }

    #[test]
    fn flatten_each_wraps_single_errors() {
        let items: Vec<Result<i32, &str>> = vec![Err("x"), Ok(4), Err("y")];
        assert_eq!(flatten_each(items), Err(vec!["x", "y"]));
    }

    #[test]
    fn combine_merges_both_error_sides() {
        let a: Result<i32, Vec<&str>> = Err(vec!["a"]);
        let b: Result<i32, Vec<&str>> = Err(vec!["b"]);
        assert_eq!(combine(a, b), Err(vec!["a", "b"]));

        let ok: Result<(i32, &str), Vec<&str>> = combine(Ok(1), Ok("one"));
        assert_eq!(ok, Ok((1, "one")));
    }
}
