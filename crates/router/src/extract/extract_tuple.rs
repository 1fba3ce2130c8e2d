use crate::extract::{ExtractError, FromArguments};
use crate::params::Arguments;
use crate::RequestContext;

macro_rules! impl_from_arguments_for_tuple {
    ($($param:ident)*) => {
        impl<$($param,)*> FromArguments for ($($param,)*)
        where
            $($param: FromArguments,)*
        {
            #[inline]
            #[allow(unused_variables)]
            fn from_arguments(req: &RequestContext, args: &Arguments) -> Result<Self, ExtractError> {
                Ok(($($param::from_arguments(req, args)?,)*))
            }
        }
    }
}

impl_from_arguments_for_tuple! {}
impl_from_arguments_for_tuple! { A }
impl_from_arguments_for_tuple! { A B }
impl_from_arguments_for_tuple! { A B C }
impl_from_arguments_for_tuple! { A B C D }
impl_from_arguments_for_tuple! { A B C D E }
impl_from_arguments_for_tuple! { A B C D E F }
impl_from_arguments_for_tuple! { A B C D E F G }
impl_from_arguments_for_tuple! { A B C D E F G H }
impl_from_arguments_for_tuple! { A B C D E F G H I }
impl_from_arguments_for_tuple! { A B C D E F G H I J }
impl_from_arguments_for_tuple! { A B C D E F G H I J K }
impl_from_arguments_for_tuple! { A B C D E F G H I J K L }
