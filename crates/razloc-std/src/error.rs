//! Error handling utilities for the `razloc` crates.

use core::fmt;

use ecow::EcoString;

/// All kinds of errors that can occur while localizing a project.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ErrKind {
    /// No message.
    None,
    /// A string message.
    Msg(EcoString),
    /// The run was rejected before touching any file, e.g. a missing project
    /// file or an unknown language code.
    Config(EcoString),
    /// An inner error.
    Inner(Error),
}

/// A trait to convert an error into an error kind.
pub trait ErrKindExt {
    /// Convert the error into an error kind.
    fn to_error_kind(self) -> ErrKind;
}

impl ErrKindExt for ErrKind {
    fn to_error_kind(self) -> Self {
        self
    }
}

impl ErrKindExt for std::io::Error {
    fn to_error_kind(self) -> ErrKind {
        ErrKind::Msg(self.to_string().into())
    }
}

impl ErrKindExt for String {
    fn to_error_kind(self) -> ErrKind {
        ErrKind::Msg(self.into())
    }
}

impl ErrKindExt for &str {
    fn to_error_kind(self) -> ErrKind {
        ErrKind::Msg(self.into())
    }
}

impl ErrKindExt for EcoString {
    fn to_error_kind(self) -> ErrKind {
        ErrKind::Msg(self)
    }
}

impl ErrKindExt for serde_json::Error {
    fn to_error_kind(self) -> ErrKind {
        ErrKind::Msg(self.to_string().into())
    }
}

impl ErrKindExt for toml::de::Error {
    fn to_error_kind(self) -> ErrKind {
        ErrKind::Msg(self.to_string().into())
    }
}

impl ErrKindExt for Error {
    fn to_error_kind(self) -> ErrKind {
        ErrKind::Inner(self)
    }
}

/// The internal error implementation.
#[derive(Debug, Clone)]
pub struct ErrorImpl {
    /// A static error identifier.
    loc: &'static str,
    /// The kind of error.
    kind: ErrKind,
    /// Additional extractable arguments for the error.
    args: Option<Box<[(&'static str, String)]>>,
}

/// This type represents all possible errors that can occur in razloc.
#[derive(Debug, Clone)]
pub struct Error {
    /// Keeps `Result<T, Error>` one pointer wide.
    err: Box<ErrorImpl>,
}

impl Error {
    /// Creates a new error.
    pub fn new(
        loc: &'static str,
        kind: ErrKind,
        args: Option<Box<[(&'static str, String)]>>,
    ) -> Self {
        Self {
            err: Box::new(ErrorImpl { loc, kind, args }),
        }
    }

    /// Creates a configuration error.
    pub fn config(loc: &'static str, msg: impl Into<EcoString>) -> Self {
        Self::new(loc, ErrKind::Config(msg.into()), None)
    }

    /// Returns the location of the error.
    pub fn loc(&self) -> &'static str {
        self.err.loc
    }

    /// Returns the kind of the error.
    pub fn kind(&self) -> &ErrKind {
        &self.err.kind
    }

    /// Returns the arguments of the error.
    pub fn arguments(&self) -> &[(&'static str, String)] {
        self.err.args.as_deref().unwrap_or_default()
    }

    /// Whether the error (or an error it wraps) is a configuration error.
    pub fn is_config(&self) -> bool {
        match &self.err.kind {
            ErrKind::Config(..) => true,
            ErrKind::Inner(inner) => inner.is_config(),
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let err = &self.err;

        if !err.loc.is_empty() {
            write!(f, "{}: ", err.loc)?;
        }

        match &err.kind {
            ErrKind::Msg(msg) => write!(f, "{msg}")?,
            ErrKind::Config(msg) => write!(f, "invalid configuration: {msg}")?,
            ErrKind::Inner(e) => write!(f, "{e}")?,
            ErrKind::None => write!(f, "error")?,
        }

        if let Some(args) = err.args.as_deref().filter(|args| !args.is_empty()) {
            write!(f, " (")?;
            for (idx, (key, value)) in args.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}: {value}")?;
            }
            write!(f, ")")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

/// The result type used in the `razloc` crates.
pub type Result<T, Err = Error> = std::result::Result<T, Err>;

/// A trait to add context to a result.
pub trait WithContext<T>: Sized {
    /// Add a context to the result.
    fn context(self, loc: &'static str) -> Result<T>;
}

impl<T, E: ErrKindExt> WithContext<T> for Result<T, E> {
    fn context(self, loc: &'static str) -> Result<T> {
        self.map_err(|e| Error::new(loc, e.to_error_kind(), None))
    }
}

impl<T> WithContext<T> for Option<T> {
    fn context(self, loc: &'static str) -> Result<T> {
        self.ok_or_else(|| Error::new(loc, ErrKind::None, None))
    }
}

/// A trait to add context to a result without a specific error type.
pub trait WithContextUntyped<T>: Sized {
    /// Add a context to the result.
    fn context_ut(self, loc: &'static str) -> Result<T>;
}

impl<T, E: std::fmt::Display> WithContextUntyped<T> for Result<T, E> {
    fn context_ut(self, loc: &'static str) -> Result<T> {
        self.map_err(|e| Error::new(loc, ErrKind::Msg(ecow::eco_format!("{e}")), None))
    }
}

/// The error prelude.
pub mod prelude {
    #![allow(missing_docs)]

    use ecow::EcoString;

    use super::ErrKindExt;
    use crate::Error;

    pub use super::{WithContext, WithContextUntyped};
    pub use crate::Result;

    pub fn map_err<T: ErrKindExt>(loc: &'static str) -> impl Fn(T) -> Error {
        move |e| Error::new(loc, e.to_error_kind(), None)
    }

    pub fn wrap_err(loc: &'static str) -> impl Fn(Error) -> Error {
        move |e| Error::new(loc, crate::ErrKind::Inner(e), None)
    }

    pub fn map_err_with_args<T: ErrKindExt, Args: IntoIterator<Item = (&'static str, String)>>(
        loc: &'static str,
        args: Args,
    ) -> impl FnOnce(T) -> Error {
        move |e| {
            Error::new(
                loc,
                e.to_error_kind(),
                Some(args.into_iter().collect::<Vec<_>>().into_boxed_slice()),
            )
        }
    }

    pub fn _msg(loc: &'static str, msg: EcoString) -> Error {
        Error::new(loc, crate::ErrKind::Msg(msg), None)
    }

    pub fn _config(loc: &'static str, msg: EcoString) -> Error {
        Error::new(loc, crate::ErrKind::Config(msg), None)
    }

    pub use ecow::eco_format as _eco_format;

    /// Returns early with a message error located at the current file.
    #[macro_export]
    macro_rules! bail {
        ($($arg:tt)+) => {{
            let args = $crate::error::prelude::_eco_format!($($arg)+);
            return Err($crate::error::prelude::_msg(file!(), args))
        }};
    }

    /// Returns early with a configuration error.
    #[macro_export]
    macro_rules! bail_config {
        ($loc:expr, $($arg:tt)+) => {{
            let args = $crate::error::prelude::_eco_format!($($arg)+);
            return Err($crate::error::prelude::_config($loc, args))
        }};
    }

    /// Maps an error into a located error carrying named arguments.
    #[macro_export]
    macro_rules! error_once_map {
        ($loc:expr, $($arg_key:ident: $arg:expr),+ $(,)?) => {
            $crate::error::prelude::map_err_with_args($loc, [$((stringify!($arg_key), $arg.to_string())),+])
        };
        ($loc:expr $(,)?) => {
            $crate::error::prelude::map_err($loc)
        };
    }

    pub use bail;
    pub use bail_config;
    pub use error_once_map;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use super::*;

    #[test]
    fn test_send() {
        fn is_send<T: Send + Sync>() {}
        is_send::<Error>();
    }

    #[test]
    fn display_with_args() {
        let res: Result<()> = Err(std::io::Error::other("denied"))
            .map_err(error_once_map!("write file", path: "a/b.razor"));
        let err = res.unwrap_err();
        assert_eq!(err.to_string(), "write file: denied (path: a/b.razor)");
        assert!(!err.is_config());
    }

    #[test]
    fn config_errors_survive_wrapping() {
        let inner = Error::config("resolve project", "no .csproj file found");
        let outer = wrap_err("localize")(inner);
        assert!(outer.is_config());
        assert_eq!(
            outer.to_string(),
            "localize: resolve project: invalid configuration: no .csproj file found"
        );
    }

    #[test]
    fn option_context() {
        let err = None::<u8>.context("missing value").unwrap_err();
        assert_eq!(err.to_string(), "missing value: error");
    }
}
