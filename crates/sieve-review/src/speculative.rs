//! Optional removal of hedged findings.

use sieve_core::CommentBatch;

/// Drops comments that only speculate ("potential ...") without proposing
/// anything ("consider ..."). Matching is case-insensitive.
///
/// # Examples
///
/// ```
/// use sieve_core::LineComment;
/// use sieve_review::speculative::SpeculativeFilter;
///
/// let batch = vec![
///     LineComment::unanchored("Potential race here."),
///     LineComment::unanchored("Potential race; consider a mutex."),
/// ];
/// let kept = SpeculativeFilter::new(true).apply(batch);
/// assert_eq!(kept.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeculativeFilter {
    enabled: bool,
}

impl SpeculativeFilter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn apply(&self, batch: CommentBatch) -> CommentBatch {
        if !self.enabled {
            return batch;
        }
        batch
            .into_iter()
            .filter(|c| {
                let body = c.body.to_lowercase();
                let keep = !body.contains("potential") || body.contains("consider");
                if !keep {
                    tracing::debug!(line = c.line, "dropping speculative comment");
                }
                keep
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use sieve_core::LineComment;

    use super::*;

    fn batch() -> CommentBatch {
        vec![
            LineComment::unanchored("POTENTIAL overflow."),
            LineComment::unanchored("Null dereference."),
            LineComment::unanchored("Potential leak, Consider closing the file."),
        ]
    }

    #[test]
    fn disabled_keeps_everything() {
        assert_eq!(SpeculativeFilter::default().apply(batch()).len(), 3);
    }

    #[test]
    fn enabled_drops_pure_speculation() {
        let kept = SpeculativeFilter::new(true).apply(batch());
        let bodies: Vec<&str> = kept.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(
            bodies,
            vec!["Null dereference.", "Potential leak, Consider closing the file."]
        );
    }
}
