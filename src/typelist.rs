//! Type-level building blocks of type sets, and a runtime catalog of them.
//!
//! Most code never names the traits here directly: [`types!`] builds the
//! sets, and the position witnesses in the `I` parameters of container
//! methods are always inferred.
//!
//! [`TypeCatalog`] is the runtime view of a set of `'static` types: member
//! positions by [`TypeId`], member names, and the types listed more than once.

use alloc::vec::Vec;
use core::{any::TypeId, fmt};

use hashbrown::HashMap;
use indexmap::IndexMap;
pub use vari_internals::{
    CloneSet, DebugSet, EqSet, HashableSet, OrdSet, PartialEqSet, PartialOrdSet,
    typelist::{
        CAPACITY, Here, InA, InB, InC, InD, Leaf, Member, Nil, Node, Quad, Quarter, Remap, Subset,
        TypeAt, TypeIds, TypeSet,
    },
};

/// Runtime lookup table of the members of a type set.
///
/// # Examples
///
/// ```
/// use core::any::TypeId;
///
/// use vari::{typelist::TypeCatalog, types};
///
/// type Tokens = types![u64, char, String];
///
/// let catalog = TypeCatalog::of::<Tokens>();
/// assert_eq!(catalog.len(), 3);
/// assert_eq!(catalog.position_of(TypeId::of::<char>()), Some(1));
/// assert_eq!(catalog.position::<f32>(), None);
/// assert_eq!(catalog.name_at(0), Some("u64"));
/// assert!(catalog.is_unique());
/// ```
#[derive(Clone)]
pub struct TypeCatalog {
    /// Members in set order.
    members: Vec<(TypeId, &'static str)>,
    /// First position of each distinct member.
    positions: HashMap<TypeId, usize, rustc_hash::FxBuildHasher>,
}

impl TypeCatalog {
    /// Builds the catalog of `S`.
    pub fn of<S: TypeIds>() -> Self {
        let mut members = Vec::with_capacity(S::LEN);
        let mut positions = HashMap::with_capacity_and_hasher(S::LEN, rustc_hash::FxBuildHasher);
        for index in 0..S::LEN {
            let (Some(id), Some(name)) = (S::type_id_at(index), S::type_name_at(index)) else {
                continue;
            };
            members.push((id, name));
            positions.entry(id).or_insert(index);
        }
        Self { members, positions }
    }

    /// Returns the number of members, counting repeated types once per
    /// listing.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` for the empty set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the position of the member with the given [`TypeId`].
    ///
    /// For a type listed more than once, this is its first position.
    #[inline]
    pub fn position_of(&self, id: TypeId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Returns the position of `T`, if it is a member.
    #[inline]
    pub fn position<T: 'static>(&self) -> Option<usize> {
        self.position_of(TypeId::of::<T>())
    }

    /// Returns `true` if `T` is a member.
    #[inline]
    pub fn contains<T: 'static>(&self) -> bool {
        self.position::<T>().is_some()
    }

    /// Returns the [`TypeId`] of the member at `index`.
    #[inline]
    pub fn type_id_at(&self, index: usize) -> Option<TypeId> {
        self.members.get(index).map(|&(id, _)| id)
    }

    /// Returns the type name of the member at `index`.
    #[inline]
    pub fn name_at(&self, index: usize) -> Option<&'static str> {
        self.members.get(index).map(|&(_, name)| name)
    }

    /// Returns `true` if no type is listed twice.
    #[inline]
    pub fn is_unique(&self) -> bool {
        self.positions.len() == self.members.len()
    }

    /// Returns every type listed more than once, with all of its positions,
    /// in order of first appearance.
    ///
    /// # Examples
    ///
    /// ```
    /// use vari::{typelist::TypeCatalog, types};
    ///
    /// type Ints = types![i32, i64];
    /// type Numbers = types![f64, ..Ints, i32];
    ///
    /// let duplicates = TypeCatalog::of::<Numbers>().duplicates();
    /// assert_eq!(duplicates.len(), 1);
    /// assert_eq!(duplicates.get("i32").map(Vec::as_slice), Some(&[1, 3][..]));
    /// ```
    pub fn duplicates(&self) -> IndexMap<&'static str, Vec<usize>, rustc_hash::FxBuildHasher> {
        if self.is_unique() {
            return IndexMap::default();
        }
        let mut by_id: IndexMap<TypeId, (&'static str, Vec<usize>), rustc_hash::FxBuildHasher> =
            IndexMap::default();
        for (index, &(id, name)) in self.members.iter().enumerate() {
            by_id
                .entry(id)
                .or_insert_with(|| (name, Vec::new()))
                .1
                .push(index);
        }
        by_id
            .into_values()
            .filter(|(_, positions)| positions.len() > 1)
            .collect()
    }
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.members.iter().map(|&(_, name)| name))
            .finish()
    }
}
