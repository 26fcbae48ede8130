//! Helper macro for declaring port error enums.
//!
//! Every variant becomes a `thiserror` variant with the given message and a
//! snake_case constructor. Constructor parameters take `impl Into<Field>`, so
//! adapters can write `IdentityRepositoryError::storage(err.to_string())` or
//! pass a `&str`. Unit variants get a constructor with no parameters.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@constructor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };

    (@constructor $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Build a [`Self::", stringify!($variant), "`] error.")]
            #[must_use]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@constructor $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            #[doc = concat!(
                "Build a [`Self::", stringify!($variant), "`] error from `",
                stringify!($($field),*), "`."
            )]
            #[must_use]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant {
                    $($field: $field.into()),*
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    define_port_error! {
        /// Error used only to exercise the macro.
        pub enum SamplePortError {
            /// No fields.
            Unavailable => "store unavailable",
            Storage { message: String } => "storage failed: {message}",
            Attempts { count: u32 } => "gave up after {count} attempts",
            Mixed { message: String, count: u32, } => "{message} ({count})",
        }
    }

    #[rstest]
    #[case::unit(SamplePortError::unavailable(), "store unavailable")]
    #[case::string_from_str(SamplePortError::storage("disk full"), "storage failed: disk full")]
    #[case::string_from_owned(
        SamplePortError::storage(String::from("quota")),
        "storage failed: quota"
    )]
    #[case::non_string(SamplePortError::attempts(8_u32), "gave up after 8 attempts")]
    #[case::mixed(SamplePortError::mixed("rename failed", 2_u32), "rename failed (2)")]
    fn constructors_render_their_messages(#[case] error: SamplePortError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    fn unit_constructor_builds_the_bare_variant() {
        let error = SamplePortError::unavailable();
        assert_eq!(error, SamplePortError::Unavailable);
        assert_eq!(error.clone(), error);
    }

    #[rstest]
    fn field_constructors_convert_into_field_types() {
        let error = SamplePortError::mixed("partial write", 3_u8);
        assert_eq!(
            error,
            SamplePortError::Mixed {
                message: "partial write".to_owned(),
                count: 3,
            }
        );
    }
}
