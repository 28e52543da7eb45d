//! Non-owning containers: [`VPtr`], [`VRef`] and [`VMut`].
//!
//! These borrow a member stored elsewhere, like `Option<&T>`, `&T` and
//! `&mut T` would for a single type. They are two words wide: the tagged
//! index of the active member and its address.
//!
//! [`VPtr`]: crate::VPtr
//! [`VRef`]: crate::VRef
//! [`VMut`]: crate::VMut

pub(crate) mod mut_;
pub(crate) mod ptr;
pub(crate) mod ref_;
