//! Declarative macro generating [`QueryTarget`](crate::QueryTarget) implementations.

/// Declares a struct whose `#[query("Name")]` fields receive the statement
/// called `Name`.
///
/// Tagged fields must implement [`QueryField`](crate::QueryField); untagged
/// fields are ignored by the binder. Fields may carry any other attributes,
/// doc comments included, before or after `#[query]`; they are copied onto
/// the generated field. Generic structs are not supported.
///
/// # Examples
///
/// ```
/// sqload::query_struct! {
///     /// Queries on the `user` table.
///     #[derive(Debug, Default)]
///     pub struct UserQueries {
///         /// Looks a user up.
///         #[query("FindUserById")]
///         pub find_user_by_id: String,
///         #[query("DeleteUserById")]
///         /// Removes a user.
///         pub delete_user_by_id: String,
///         /// When the queries were read.
///         pub loaded_at: Option<u64>,
///     }
/// }
///
/// let queries: UserQueries = sqload::load_from_str(
///     "-- query: FindUserById\nSELECT * FROM user WHERE id = :id;\n\
///      -- query: DeleteUserById\nDELETE FROM user WHERE id = :id;",
/// )
/// .unwrap();
/// assert_eq!(queries.find_user_by_id, "SELECT * FROM user WHERE id = :id;");
/// assert_eq!(queries.delete_user_by_id, "DELETE FROM user WHERE id = :id;");
/// assert_eq!(queries.loaded_at, None);
/// ```
#[macro_export]
macro_rules! query_struct {
    // Every field consumed: emit the struct and its bindings.
    (@fields $name:ident [$($header:tt)*] [$($fields:tt)*] [$(($bound:ident $tag:tt))*] [] []) => {
        $($header)* {
            $($fields)*
        }

        impl $crate::QueryTarget for $name {
            #[allow(unused_mut)]
            fn bindings(&mut self) -> ::std::vec::Vec<$crate::Binding<'_>> {
                let mut bindings = ::std::vec::Vec::new();
                $(
                    bindings.push($crate::Binding::text(
                        ::core::stringify!($bound),
                        $tag,
                        &mut self.$bound,
                    ));
                )*
                bindings
            }
        }
    };
    (@fields $name:ident $header:tt $fields:tt $bindings:tt $attrs:tt $previous:tt
        #[query($tag:literal)] $($rest:tt)*
    ) => {
        $crate::query_struct!(@fields $name $header $fields $bindings $attrs [$tag] $($rest)*);
    };
    (@fields $name:ident $header:tt $fields:tt $bindings:tt [$($attrs:tt)*] $tag:tt
        #[$($attr:tt)*] $($rest:tt)*
    ) => {
        $crate::query_struct!(
            @fields $name $header $fields $bindings [$($attrs)* #[$($attr)*]] $tag $($rest)*
        );
    };
    (@fields $name:ident $header:tt [$($fields:tt)*] [$($bindings:tt)*] [$($attrs:tt)*] [$($tag:tt)?]
        $field_vis:vis $field:ident : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::query_struct!(
            @fields $name $header
            [$($fields)* $($attrs)* $field_vis $field: $ty,]
            [$($bindings)* $(($field $tag))?]
            [] []
            $($($rest)*)?
        );
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident { $($body:tt)* }
    ) => {
        $crate::query_struct!(@fields $name [$(#[$meta])* $vis struct $name] [] [] [] [] $($body)*);
    };
}
