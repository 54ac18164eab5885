//! Thread adapter port: moving mapped objects between execution contexts.
//!
//! Mapping runs on a background thread. A type whose values are tied to the
//! context that produced them ([`crate::Mappable::THREAD_CONFINED`]) cannot
//! simply be handed to the caller; a [`ThreadAdapter`] converts the objects
//! into sendable representations on the mapping thread and resolves them back
//! into objects on the destination context.
//!
//! The two halves together are one adaptation. The client runs them at most
//! once per completed fetch, after mapping succeeds and before `did_finish`.

use std::marker::PhantomData;

use crate::{Mappable, ThreadAdapterError};

/// Converts mapped objects into a form that may cross execution contexts.
pub trait ThreadAdapter: Send + Sync + 'static {
    /// The mapped type this adapter handles.
    type BaseType: Mappable;

    /// Context-independent handle to a [`ThreadAdapter::BaseType`].
    type Representation: Send + 'static;

    /// `true` for adapters that hand objects over unchanged. An identity
    /// adapter does not satisfy a
    /// [`THREAD_CONFINED`](crate::Mappable::THREAD_CONFINED) type.
    const IS_IDENTITY: bool = false;

    /// Runs on the mapping context. Must return one representation per object,
    /// in the same order.
    fn thread_safe_representations(
        &self,
        objects: Vec<Self::BaseType>,
    ) -> Result<Vec<Self::Representation>, ThreadAdapterError>;

    /// Runs on the destination context. Must return one object per
    /// representation, in the same order.
    fn retrieve_objects(
        &self,
        representations: Vec<Self::Representation>,
    ) -> Result<Vec<Self::BaseType>, ThreadAdapterError>;
}

/// Identity adapter for requests that never supply an adapter.
///
/// Used as a request's `ThreadAdapter` associated type; the request's
/// `thread_adapter()` then returns `None`. Supplying it for a thread-confined
/// type is a configuration error.
#[derive(Debug)]
pub struct NoThreadAdapter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for NoThreadAdapter<T> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: Mappable> ThreadAdapter for NoThreadAdapter<T> {
    type BaseType = T;
    type Representation = T;

    const IS_IDENTITY: bool = true;

    fn thread_safe_representations(&self, objects: Vec<T>) -> Result<Vec<T>, ThreadAdapterError> {
        Ok(objects)
    }

    fn retrieve_objects(&self, representations: Vec<T>) -> Result<Vec<T>, ThreadAdapterError> {
        Ok(representations)
    }
}

/// Mapped objects on their way from the mapping context to the destination.
///
/// Produced on the mapping thread by [`Handoff::prepare`] and consumed on the
/// destination by [`Handoff::receive`]. Always `Send`.
#[derive(Debug)]
pub enum Handoff<T, R> {
    /// No adapter was supplied; the objects move as they are.
    Direct(Vec<T>),
    /// The objects were converted to adapter representations.
    Adapted(Vec<R>),
}

impl<T: Mappable, R: Send + 'static> Handoff<T, R> {
    /// Prepares `objects` for the hand-off. Runs on the mapping thread.
    pub fn prepare<A>(adapter: Option<&A>, objects: Vec<T>) -> Result<Self, ThreadAdapterError>
    where
        A: ThreadAdapter<BaseType = T, Representation = R>,
    {
        match adapter {
            None => Ok(Handoff::Direct(objects)),
            Some(adapter) => {
                let expected = objects.len();
                let representations = adapter.thread_safe_representations(objects)?;
                Ok(Handoff::Adapted(ensure_count(expected, representations)?))
            }
        }
    }

    /// Resolves the objects on the destination context.
    pub fn receive<A>(self, adapter: Option<&A>) -> Result<Vec<T>, ThreadAdapterError>
    where
        A: ThreadAdapter<BaseType = T, Representation = R>,
    {
        match (self, adapter) {
            (Handoff::Direct(objects), _) => Ok(objects),
            (Handoff::Adapted(representations), Some(adapter)) => {
                let expected = representations.len();
                ensure_count(expected, adapter.retrieve_objects(representations)?)
            }
            (Handoff::Adapted(_), None) => Err(ThreadAdapterError::Unresolvable {
                message: "adapted objects received without their adapter".to_owned(),
            }),
        }
    }
}

fn ensure_count<T>(expected: usize, items: Vec<T>) -> Result<Vec<T>, ThreadAdapterError> {
    if items.len() == expected {
        Ok(items)
    } else {
        Err(ThreadAdapterError::CountMismatch {
            expected,
            actual: items.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_thread_adapter_is_identity() {
        let adapter = NoThreadAdapter::<i64>::default();
        let reps = adapter.thread_safe_representations(vec![1, 2, 3]).unwrap();
        assert_eq!(adapter.retrieve_objects(reps).unwrap(), vec![1, 2, 3]);
    }

    struct Truncating;

    impl ThreadAdapter for Truncating {
        type BaseType = i64;
        type Representation = String;

        fn thread_safe_representations(
            &self,
            objects: Vec<i64>,
        ) -> Result<Vec<String>, ThreadAdapterError> {
            Ok(objects.iter().skip(1).map(|o| o.to_string()).collect())
        }

        fn retrieve_objects(&self, representations: Vec<String>) -> Result<Vec<i64>, ThreadAdapterError> {
            Ok(representations.iter().filter_map(|r| r.parse().ok()).collect())
        }
    }

    #[test]
    fn test_handoff_without_adapter_moves_objects() {
        let handoff = Handoff::prepare(None::<&NoThreadAdapter<i64>>, vec![4, 5]).unwrap();
        assert!(matches!(handoff, Handoff::Direct(_)));
        assert_eq!(handoff.receive(None::<&NoThreadAdapter<i64>>).unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_handoff_detects_dropped_objects() {
        let adapter = Truncating;
        assert!(matches!(
            Handoff::prepare(Some(&adapter), vec![1, 2]),
            Err(ThreadAdapterError::CountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_adapted_handoff_requires_adapter() {
        let handoff: Handoff<i64, String> = Handoff::Adapted(vec!["1".to_owned()]);
        assert!(handoff.receive(None::<&Truncating>).is_err());
        let handoff: Handoff<i64, String> = Handoff::Adapted(vec!["1".to_owned()]);
        assert_eq!(handoff.receive(Some(&Truncating)).unwrap(), vec![1]);
    }

    #[test]
    fn test_ensure_count() {
        assert_eq!(ensure_count(2, vec![1, 2]).unwrap(), vec![1, 2]);
        assert!(matches!(
            ensure_count(2, vec![1]),
            Err(ThreadAdapterError::CountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }
}
