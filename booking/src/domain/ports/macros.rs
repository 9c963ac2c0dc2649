//! Helper macro for declaring port error enums.
//!
//! Each variant gets a snake_case constructor whose fields accept
//! `impl Into<T>`, so adapters can write `SlotRepositoryError::query(msg)`.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Build [`Self::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            #[doc = concat!("Build [`Self::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
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
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    define_port_error! {
        pub enum ExampleTableError {
            Unreachable => "backend unreachable",
            Query { message: String } => "query failed: {message}",
            Status { code: u16 } => "status {code}",
            Row { message: String, index: usize } => "row {index}: {message}",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(
            ExampleTableError::unreachable().to_string(),
            "backend unreachable"
        );
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = ExampleTableError::query("timeout");
        assert_eq!(err.to_string(), "query failed: timeout");
    }

    #[test]
    fn constructors_preserve_non_string_types() {
        let err = ExampleTableError::status(503_u16);
        assert_eq!(err.to_string(), "status 503");
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = ExampleTableError::row("bad date", 2_usize);
        assert_eq!(err.to_string(), "row 2: bad date");
    }
}
