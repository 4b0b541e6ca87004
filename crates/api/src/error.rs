//! Zkvote error types.

use std::sync::Arc;

/// A clonable trait-object inner error.
#[derive(Clone, Default)]
pub struct DynInnerError(
    pub Option<Arc<dyn std::error::Error + 'static + Send + Sync>>,
);

impl std::fmt::Debug for DynInnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for DynInnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.as_ref() {
            None => f.write_str("None"),
            Some(s) => s.fmt(f),
        }
    }
}

impl std::error::Error for DynInnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.as_ref().map(|s| {
            let out: &(dyn std::error::Error + 'static) = &**s;
            out
        })
    }
}

impl DynInnerError {
    /// Construct a new DynInnerError from a source error.
    pub fn new<E: std::error::Error + 'static + Send + Sync>(e: E) -> Self {
        Self(Some(Arc::new(e)))
    }
}

fn ctx<C: std::fmt::Display>(c: C) -> Arc<str> {
    c.to_string().into_boxed_str().into()
}

/// The core zkvote error type. This type is used in all external
/// zkvote apis as well as internally by the background tasks.
///
/// This type is required to implement `Clone` so that a single failure
/// can be reported to several waiting callers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ZkvError {
    /// A stream, connection or subscription failed.
    #[error("transport: {ctx} (src: {src})")]
    Transport {
        /// Any context associated with this error.
        ctx: Arc<str>,

        /// The inner error (if any).
        #[source]
        src: DynInnerError,
    },

    /// Data received from the network or a caller could not be decoded.
    #[error("decode: {ctx} (src: {src})")]
    Decode {
        /// Any context associated with this error.
        ctx: Arc<str>,

        /// The inner error (if any).
        #[source]
        src: DynInnerError,
    },

    /// An operation was attempted before its precondition held.
    #[error("not ready: {0}")]
    NotReady(Arc<str>),

    /// A bounded operation did not complete in time.
    #[error("timed out: {0}")]
    Timeout(Arc<str>),

    /// Generic zkvote internal error.
    #[error("{ctx} (src: {src})")]
    Other {
        /// Any context associated with this error.
        ctx: Arc<str>,

        /// The inner error (if any).
        #[source]
        src: DynInnerError,
    },
}

impl ZkvError {
    /// Construct an "other" error with an inner source error.
    pub fn other_src<
        C: std::fmt::Display,
        S: std::error::Error + 'static + Send + Sync,
    >(
        ctx: C,
        src: S,
    ) -> Self {
        Self::Other {
            ctx: self::ctx(ctx),
            src: DynInnerError::new(src),
        }
    }

    /// Construct an "other" error.
    pub fn other<C: std::fmt::Display>(ctx: C) -> Self {
        Self::Other {
            ctx: self::ctx(ctx),
            src: DynInnerError::default(),
        }
    }

    /// Construct a transport error.
    pub fn transport<C: std::fmt::Display>(ctx: C) -> Self {
        Self::Transport {
            ctx: self::ctx(ctx),
            src: DynInnerError::default(),
        }
    }

    /// Construct a transport error with an inner source error.
    pub fn transport_src<
        C: std::fmt::Display,
        S: std::error::Error + 'static + Send + Sync,
    >(
        ctx: C,
        src: S,
    ) -> Self {
        Self::Transport {
            ctx: self::ctx(ctx),
            src: DynInnerError::new(src),
        }
    }

    /// Construct a decode error.
    pub fn decode<C: std::fmt::Display>(ctx: C) -> Self {
        Self::Decode {
            ctx: self::ctx(ctx),
            src: DynInnerError::default(),
        }
    }

    /// Construct a decode error with an inner source error.
    pub fn decode_src<
        C: std::fmt::Display,
        S: std::error::Error + 'static + Send + Sync,
    >(
        ctx: C,
        src: S,
    ) -> Self {
        Self::Decode {
            ctx: self::ctx(ctx),
            src: DynInnerError::new(src),
        }
    }

    /// Construct a precondition failure.
    pub fn not_ready<C: std::fmt::Display>(ctx: C) -> Self {
        Self::NotReady(self::ctx(ctx))
    }

    /// Construct a timeout error.
    pub fn timeout<C: std::fmt::Display>(ctx: C) -> Self {
        Self::Timeout(self::ctx(ctx))
    }
}

/// The core zkvote result type.
pub type ZkvResult<T> = Result<T, ZkvError>;
