//! Construction probe - turns a raw resource string into a live adapter
//!
//! Adapters share no constructor signature. Instead, each factory is offered
//! a fixed, ordered sequence of construction inputs and answers each with a
//! [`Construction`] outcome. The distinction between "this shape does not
//! apply" and "this shape applies but the value is bad" is a data value here,
//! never an error-kind guessing game.

use crate::adapter::{Adapter, AdapterFactory};
use crate::uri::{QueryMap, ResourceUri};
use crate::{Error, Result};

/// The recognized construction shapes, offered in exactly this order.
#[derive(Debug)]
pub enum ConstructInput<'a> {
    /// 1. No arguments at all (ambient resources: environment, PATH)
    NoArgs,
    /// 2. Resource string plus parsed query
    ResourceAndQuery {
        resource: &'a str,
        query: &'a QueryMap,
    },
    /// 3. Keyword form: the resource as a base path, plus parsed query
    BasePath {
        base_path: &'a str,
        query: &'a QueryMap,
    },
    /// 4. Resource string alone
    ResourceOnly { resource: &'a str },
    /// 5. The reassembled full URI, `scheme://resource`
    FullUri { uri: &'a str },
}

/// Outcome of offering one construction input to a factory.
pub enum Construction {
    /// The shape applied and the adapter is live. Probing stops.
    Ready(Box<dyn Adapter>),
    /// The shape does not apply to this adapter. The probe advances.
    Mismatch,
    /// The shape applied but the supplied value is invalid. Probing stops and
    /// the message surfaces verbatim as a user-facing error.
    ///
    /// Factory authors: never answer `Mismatch` for a bad value - it silently
    /// advances the probe past the real problem.
    Invalid(String),
    /// The adapter misbehaved, or a required external dependency is missing.
    /// Probing stops.
    Failed(Error),
}

impl std::fmt::Debug for Construction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Construction::Ready(_) => write!(f, "Ready(..)"),
            Construction::Mismatch => write!(f, "Mismatch"),
            Construction::Invalid(msg) => write!(f, "Invalid({msg:?})"),
            Construction::Failed(err) => write!(f, "Failed({err:?})"),
        }
    }
}

/// Offer the five construction shapes to `factory` in order.
///
/// Stops at the first `Ready`, `Invalid` or `Failed` outcome. A
/// `MissingDependency` failure passes through untouched (it is expected, not
/// a defect, and carries installation guidance); any other failure is wrapped
/// as an internal adapter error. Five mismatches exhaust the probe.
pub fn probe(
    scheme: &str,
    factory: &dyn AdapterFactory,
    uri: &ResourceUri,
) -> Result<Box<dyn Adapter>> {
    let resource = uri.resource();
    let full_uri = format!("{scheme}://{resource}");
    let candidates = [
        ConstructInput::NoArgs,
        ConstructInput::ResourceAndQuery {
            resource,
            query: &uri.query,
        },
        ConstructInput::BasePath {
            base_path: resource,
            query: &uri.query,
        },
        ConstructInput::ResourceOnly { resource },
        ConstructInput::FullUri { uri: &full_uri },
    ];

    for input in &candidates {
        tracing::trace!(scheme, ?input, "offering construction shape");
        match factory.construct(input) {
            Construction::Ready(adapter) => return Ok(adapter),
            Construction::Mismatch => continue,
            Construction::Invalid(message) => return Err(Error::AdapterValidation(message)),
            Construction::Failed(err @ Error::MissingDependency { .. }) => return Err(err),
            Construction::Failed(err) => return Err(Error::AdapterInternal(err.to_string())),
        }
    }

    Err(Error::ConstructionExhausted {
        scheme: scheme.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ResultRecord;
    use std::cell::RefCell;

    struct NullAdapter;

    impl Adapter for NullAdapter {
        fn structure(&self) -> Result<ResultRecord> {
            Ok(ResultRecord::new("null", "test://"))
        }
    }

    /// Answers `Mismatch` until the nth shape, then a fixed outcome; records
    /// how many shapes it was offered.
    struct ScriptedFactory {
        accept_at: usize,
        outcome: fn() -> Construction,
        offered: RefCell<usize>,
    }

    impl ScriptedFactory {
        fn new(accept_at: usize, outcome: fn() -> Construction) -> Self {
            Self {
                accept_at,
                outcome,
                offered: RefCell::new(0),
            }
        }
    }

    impl AdapterFactory for ScriptedFactory {
        fn construct(&self, _input: &ConstructInput) -> Construction {
            let mut offered = self.offered.borrow_mut();
            *offered += 1;
            if *offered == self.accept_at {
                (self.outcome)()
            } else {
                Construction::Mismatch
            }
        }
    }

    fn uri() -> ResourceUri {
        ResourceUri::parse("test://thing?x=1", None, None).unwrap()
    }

    #[test]
    fn test_first_ready_wins() {
        let factory = ScriptedFactory::new(1, || Construction::Ready(Box::new(NullAdapter)));
        assert!(probe("test", &factory, &uri()).is_ok());
        assert_eq!(*factory.offered.borrow(), 1);
    }

    #[test]
    fn test_mismatch_advances_to_later_shape() {
        let factory = ScriptedFactory::new(4, || Construction::Ready(Box::new(NullAdapter)));
        assert!(probe("test", &factory, &uri()).is_ok());
        assert_eq!(*factory.offered.borrow(), 4);
    }

    #[test]
    fn test_invalid_stops_probing() {
        let factory = ScriptedFactory::new(2, || Construction::Invalid("bad path".to_string()));
        let err = probe("test", &factory, &uri()).unwrap_err();
        assert!(matches!(err, Error::AdapterValidation(ref m) if m == "bad path"));
        // shapes 3-5 were never offered
        assert_eq!(*factory.offered.borrow(), 2);
    }

    #[test]
    fn test_failure_stops_probing_and_is_internal() {
        let factory = ScriptedFactory::new(2, || {
            Construction::Failed(Error::Adapter("backend exploded".to_string()))
        });
        let err = probe("test", &factory, &uri()).unwrap_err();
        assert!(matches!(err, Error::AdapterInternal(_)));
        assert_eq!(*factory.offered.borrow(), 2);
    }

    #[test]
    fn test_missing_dependency_passes_through() {
        let factory = ScriptedFactory::new(1, || {
            Construction::Failed(Error::MissingDependency {
                name: "git".to_string(),
                install: "install git".to_string(),
            })
        });
        let err = probe("test", &factory, &uri()).unwrap_err();
        assert!(matches!(err, Error::MissingDependency { .. }));
    }

    #[test]
    fn test_all_mismatch_exhausts() {
        let factory = ScriptedFactory::new(9, || Construction::Mismatch);
        let err = probe("test", &factory, &uri()).unwrap_err();
        assert!(matches!(err, Error::ConstructionExhausted { ref scheme } if scheme == "test"));
        // all five shapes were offered
        assert_eq!(*factory.offered.borrow(), 5);
    }

    #[test]
    fn test_shapes_arrive_in_contract_order() {
        struct OrderCheck(RefCell<Vec<&'static str>>);

        impl AdapterFactory for OrderCheck {
            fn construct(&self, input: &ConstructInput) -> Construction {
                self.0.borrow_mut().push(match input {
                    ConstructInput::NoArgs => "no_args",
                    ConstructInput::ResourceAndQuery { .. } => "resource_and_query",
                    ConstructInput::BasePath { .. } => "base_path",
                    ConstructInput::ResourceOnly { .. } => "resource_only",
                    ConstructInput::FullUri { .. } => "full_uri",
                });
                Construction::Mismatch
            }
        }

        let factory = OrderCheck(RefCell::new(Vec::new()));
        let _ = probe("test", &factory, &uri());
        assert_eq!(
            *factory.0.borrow(),
            vec![
                "no_args",
                "resource_and_query",
                "base_path",
                "resource_only",
                "full_uri"
            ]
        );
    }

    #[test]
    fn test_full_uri_shape_reassembles_scheme() {
        struct WantFull;

        impl AdapterFactory for WantFull {
            fn construct(&self, input: &ConstructInput) -> Construction {
                match input {
                    ConstructInput::FullUri { uri } => {
                        assert_eq!(*uri, "test://thing");
                        Construction::Ready(Box::new(NullAdapter))
                    }
                    _ => Construction::Mismatch,
                }
            }
        }

        assert!(probe("test", &WantFull, &uri()).is_ok());
    }
}
