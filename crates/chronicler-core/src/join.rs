/// Drop every item equal to the immediately preceding kept item.
///
/// Non-consecutive repeats survive: `opened, closed, reopened, closed` is a
/// real oscillation, not noise. Idempotent.
pub fn collapse_consecutive<T: PartialEq + Clone>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if out.last() != Some(item) {
            out.push(item.clone());
        }
    }
    out
}

/// Natural-language list join: one item stands alone, two are joined with
/// "and", three or more take an oxford comma before the final item.
pub fn oxford_join<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [first, second] => format!("{} and {}", first.as_ref(), second.as_ref()),
        [head @ .., last] => {
            let head = head
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<&str>>()
                .join(", ");
            format!("{}, and {}", head, last.as_ref())
        }
    }
}
