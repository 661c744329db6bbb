use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project::pin_project;

/// A future which resolves with whichever of two futures completes first.
///
/// This `struct` is created by the [`first`] method on [`SingleResult`]. See
/// its documentation for more.
///
/// [`first`]: crate::single::SingleResult::first
/// [`SingleResult`]: crate::single::SingleResult
#[pin_project]
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct First<A, B> {
    #[pin]
    a: A,
    #[pin]
    b: B,
    done: bool,
}

impl<A, B> First<A, B> {
    pub(crate) fn new(a: A, b: B) -> Self {
        Self { a, b, done: false }
    }
}

impl<T, A, B> Future for First<A, B>
where
    A: Future<Output = T>,
    B: Future<Output = T>,
{
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        assert!(!*this.done, "`First` polled after completing");

        // Start from a random side so that two always-ready futures both get
        // a chance to win.
        let a_first: bool = rand::random();
        for turn in 0..2 {
            let output = if (turn == 0) == a_first {
                this.a.as_mut().poll(cx)
            } else {
                this.b.as_mut().poll(cx)
            };
            if let Poll::Ready(output) = output {
                *this.done = true;
                return Poll::Ready(output);
            }
        }
        Poll::Pending
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use futures_lite::future::{block_on, pending, ready};

    #[test]
    fn ready_side_wins() {
        block_on(async {
            assert_eq!(First::new(pending::<u8>(), ready(2)).await, 2);
            assert_eq!(First::new(ready(1), pending::<u8>()).await, 1);
        });
    }

    #[test]
    fn either_side_may_win_when_both_are_ready() {
        let winners: Vec<_> = (0..64)
            .map(|_| block_on(First::new(ready('a'), ready('b'))))
            .collect();
        assert!(winners.contains(&'a'));
        assert!(winners.contains(&'b'));
    }
}
